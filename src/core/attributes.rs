//! XML Attribute Parsing
//!
//! Parses the attribute section of a start tag into raw name/value pairs.
//! Namespace declarations are ordinary attributes at this level; the reader
//! separates them out.

use super::entities::decode_attribute;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed attribute as written in the tag
#[derive(Debug, Clone)]
pub struct RawAttribute<'a> {
    /// Qualified name as written (may include a prefix)
    pub name: &'a [u8],
    /// Value with whitespace normalized and references decoded
    pub value: Cow<'a, [u8]>,
}

impl<'a> RawAttribute<'a> {
    pub fn new(name: &'a [u8], value: Cow<'a, [u8]>) -> Self {
        RawAttribute { name, value }
    }

    /// Prefix before the first colon, if any
    pub fn prefix(&self) -> Option<&'a [u8]> {
        split_name(self.name).0
    }

    /// Name without its prefix
    pub fn local_name(&self) -> &'a [u8] {
        split_name(self.name).1
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name).ok()
    }

    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }
}

/// Split a qualified name into prefix and local part at the first colon
#[inline]
pub fn split_name(name: &[u8]) -> (Option<&[u8]>, &[u8]) {
    match memchr(b':', name) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Parse attributes leniently, skipping anything that does not look like one
pub fn parse_attributes(input: &[u8]) -> Vec<RawAttribute<'_>> {
    match parse_attributes_with_validation(input, false) {
        Ok(attrs) => attrs,
        Err((attrs, _)) => attrs,
    }
}

/// Parse attributes, failing on the first well-formedness violation
pub fn parse_attributes_strict(input: &[u8]) -> Result<Vec<RawAttribute<'_>>, &'static str> {
    parse_attributes_with_validation(input, true).map_err(|(_, msg)| msg)
}

type Partial<'a> = (Vec<RawAttribute<'a>>, &'static str);

fn parse_attributes_with_validation(input: &[u8], strict: bool) -> Result<Vec<RawAttribute<'_>>, Partial<'_>> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    loop {
        let before_ws = pos;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        if !is_name_start_char(input[pos]) {
            if strict {
                return Err((attrs, "Attribute name must start with letter, underscore, or colon"));
            }
            pos += 1;
            continue;
        }
        if strict && before_ws == pos && !attrs.is_empty() {
            return Err((attrs, "Attributes must be separated by whitespace"));
        }

        let name_start = pos;
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] != b'=' {
            if strict {
                return Err((attrs, "Attribute value required"));
            }
            attrs.push(RawAttribute::new(name, Cow::Borrowed(b"")));
            continue;
        }
        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            if strict {
                return Err((attrs, "Attribute value required"));
            }
            break;
        }

        let quote = input[pos];
        if quote != b'"' && quote != b'\'' {
            if strict {
                return Err((attrs, "Attribute value must be quoted"));
            }
            let value_start = pos;
            while pos < input.len() && !is_whitespace(input[pos]) {
                pos += 1;
            }
            let raw = &input[value_start..pos];
            attrs.push(RawAttribute::new(name, decode_attribute(raw, false).unwrap_or(Cow::Borrowed(raw))));
            continue;
        }

        pos += 1;
        let value_start = pos;
        let value_end = match memchr(quote, &input[pos..]) {
            Some(i) => pos + i,
            None if strict => return Err((attrs, "Attribute value has mismatched quotes")),
            None => input.len(),
        };
        let raw = &input[value_start..value_end];
        pos = (value_end + 1).min(input.len());

        if strict && memchr(b'<', raw).is_some() {
            return Err((attrs, "Attribute value cannot contain '<'"));
        }
        let value = match decode_attribute(raw, strict) {
            Ok(v) => v,
            Err(msg) => return Err((attrs, msg)),
        };
        attrs.push(RawAttribute::new(name, value));
    }

    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(b" id=\"test\" class=\"foo\"");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name_str(), Some("id"));
        assert_eq!(attrs[0].value_str(), Some("test"));
        assert_eq!(attrs[1].name_str(), Some("class"));
        assert_eq!(attrs[1].value_str(), Some("foo"));
    }

    #[test]
    fn test_single_quoted() {
        let attrs = parse_attributes(b" id='a \"b\"'");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value_str(), Some("a \"b\""));
    }

    #[test]
    fn test_namespaced_attribute() {
        let attrs = parse_attributes(b" xmlns:xlink=\"http://www.w3.org/1999/xlink\"");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].prefix(), Some(b"xmlns" as &[u8]));
        assert_eq!(attrs[0].local_name(), b"xlink");
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(b" title=\"&lt;hello&gt;\"");
        assert_eq!(attrs[0].value_str(), Some("<hello>"));
    }

    #[test]
    fn test_value_whitespace_normalized_before_references() {
        let attrs = parse_attributes_strict(b" v=\"1\n\t2\" w=\"a\r\nb&#10;\"").unwrap();
        assert_eq!(attrs[0].value_str(), Some("1  2"));
        assert_eq!(attrs[1].value_str(), Some("a b\n"));
    }

    #[test]
    fn test_whitespace_around_equals() {
        let attrs = parse_attributes(b"  id  =  \"test\"  ");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name_str(), Some("id"));
        assert_eq!(attrs[0].value_str(), Some("test"));
    }

    #[test]
    fn test_strict_rejects_unquoted() {
        assert_eq!(parse_attributes_strict(b" id=test").unwrap_err(), "Attribute value must be quoted");
    }

    #[test]
    fn test_strict_rejects_missing_value() {
        assert_eq!(parse_attributes_strict(b" checked").unwrap_err(), "Attribute value required");
    }

    #[test]
    fn test_strict_rejects_lt_in_value() {
        assert_eq!(parse_attributes_strict(b" a=\"x<y\"").unwrap_err(), "Attribute value cannot contain '<'");
    }

    #[test]
    fn test_strict_rejects_missing_separator() {
        assert_eq!(
            parse_attributes_strict(b" a=\"1\"b=\"2\"").unwrap_err(),
            "Attributes must be separated by whitespace"
        );
    }

    #[test]
    fn test_lenient_boolean_attribute() {
        let attrs = parse_attributes(b" checked");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value_str(), Some(""));
    }
}
