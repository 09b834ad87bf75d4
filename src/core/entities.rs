//! XML Entity Decoding
//!
//! Only what every XML tokenizer must understand without a DTD:
//! - Predefined entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Line endings are normalized before references are decoded, so `&#13;`
//! survives as a carriage return. Attribute values additionally turn each
//! literal tab, CR or LF into a space.
//!
//! Uses Cow for zero-copy when nothing needs rewriting.

use memchr::{memchr, memchr3};
use std::borrow::Cow;

/// Decode references leniently: anything unknown is kept verbatim
#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    match decode_references(input, false) {
        Ok(decoded) => Cow::Owned(decoded),
        // Lenient decoding never reports errors
        Err(_) => Cow::Borrowed(input),
    }
}

/// Decode references strictly.
///
/// Unknown entities, unterminated references and character references that
/// do not name an XML character are errors.
pub fn decode_text_strict(input: &[u8]) -> Result<Cow<'_, [u8]>, &'static str> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_references(input, true).map(Cow::Owned)
}

/// Normalize line endings then decode references, for text and CDATA content
pub fn decode_content(input: &[u8], strict: bool) -> Result<Cow<'_, [u8]>, &'static str> {
    decode_normalized(normalize_line_endings(input), strict)
}

/// Normalize attribute whitespace then decode references
pub fn decode_attribute(input: &[u8], strict: bool) -> Result<Cow<'_, [u8]>, &'static str> {
    decode_normalized(normalize_attribute_whitespace(input), strict)
}

/// `\r\n` and a lone `\r` become `\n`
pub fn normalize_line_endings(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'\r', input).is_none() {
        return Cow::Borrowed(input);
    }
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' {
            bytes.next_if_eq(&b'\n');
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}

/// Each literal tab, line feed, carriage return or CRLF pair becomes one space
pub fn normalize_attribute_whitespace(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr3(b'\t', b'\n', b'\r', input).is_none() {
        return Cow::Borrowed(input);
    }
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        match b {
            b'\r' => {
                bytes.next_if_eq(&b'\n');
                out.push(b' ');
            }
            b'\t' | b'\n' => out.push(b' '),
            _ => out.push(b),
        }
    }
    Cow::Owned(out)
}

fn decode_normalized(normalized: Cow<'_, [u8]>, strict: bool) -> Result<Cow<'_, [u8]>, &'static str> {
    match normalized {
        Cow::Borrowed(raw) if strict => decode_text_strict(raw),
        Cow::Borrowed(raw) => Ok(decode_text(raw)),
        Cow::Owned(raw) if memchr(b'&', &raw).is_none() => Ok(Cow::Owned(raw)),
        Cow::Owned(raw) => match decode_references(&raw, strict) {
            Ok(decoded) => Ok(Cow::Owned(decoded)),
            Err(_) if !strict => Ok(Cow::Owned(raw)),
            Err(msg) => Err(msg),
        },
    }
}

fn decode_references(input: &[u8], strict: bool) -> Result<Vec<u8>, &'static str> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp]);
        pos += amp;

        let Some(semi) = memchr(b';', &input[pos..]) else {
            if strict {
                return Err("Unterminated entity reference");
            }
            result.push(b'&');
            pos += 1;
            continue;
        };

        let reference = &input[pos + 1..pos + semi];
        match decode_reference(reference) {
            Some(ch) => {
                let mut buf = [0u8; 4];
                result.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                pos += semi + 1;
            }
            None if strict => {
                return Err(if reference.first() == Some(&b'#') {
                    "Invalid character reference"
                } else {
                    "Reference to undeclared entity"
                });
            }
            None => {
                result.push(b'&');
                pos += 1;
            }
        }
    }

    result.extend_from_slice(&input[pos..]);
    Ok(result)
}

/// Decode one reference body (the part between '&' and ';')
fn decode_reference(reference: &[u8]) -> Option<char> {
    match reference {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', b'x' | b'X', hex @ ..] => parse_codepoint(hex, 16),
        [b'#', dec @ ..] => parse_codepoint(dec, 10),
        _ => None,
    }
}

fn parse_codepoint(digits: &[u8], radix: u32) -> Option<char> {
    if digits.is_empty() {
        return None;
    }
    let text = std::str::from_utf8(digits).ok()?;
    let value = u32::from_str_radix(text, radix).ok()?;
    char::from_u32(value).filter(|&c| is_xml_char(c))
}

/// XML 1.0 Char production
#[inline]
fn is_xml_char(c: char) -> bool {
    matches!(c, '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
