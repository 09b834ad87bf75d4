//! Token to event translation shared by the readers
//!
//! Turns borrowed tokenizer output into owned [`XmlEvent`]s: splits tag names
//! into prefix and local part, separates `xmlns` declarations from ordinary
//! attributes, reads the XML declaration, and skips comments, processing
//! instructions and DOCTYPE.

use super::events::{Attribute, EndElement, NamespaceDecl, QName, StartElement, XmlEvent};
use crate::core::attributes::{parse_attributes, parse_attributes_strict, RawAttribute};
use crate::core::tokenizer::{Token, TokenKind};
use crate::error::StreamError;
use std::collections::VecDeque;

#[derive(Debug)]
pub(crate) struct EventTranslator {
    strict: bool,
    started: bool,
    pending: VecDeque<XmlEvent>,
}

impl EventTranslator {
    pub(crate) fn new(strict: bool) -> Self {
        EventTranslator {
            strict,
            started: false,
            pending: VecDeque::new(),
        }
    }

    pub(crate) fn pop(&mut self) -> Option<XmlEvent> {
        self.pending.pop_front()
    }

    /// Make sure `StartDocument` went out, even for an empty input
    pub(crate) fn finish(&mut self) {
        self.start_document(None, None, false);
    }

    /// Translate one token. `input` is the slice the tokenizer ran over and
    /// `offset` its absolute position, used for error reporting.
    pub(crate) fn push_token(&mut self, token: &Token<'_>, input: &[u8], offset: usize) -> Result<(), StreamError> {
        let position = offset + token.span.0;
        match token.kind {
            TokenKind::XmlDeclaration => self.declaration(token, position),
            TokenKind::StartTag | TokenKind::EmptyTag => {
                self.finish();
                let start = self.start_element(token, input, position)?;
                let end = EndElement::new(start.name.clone());
                self.pending.push_back(XmlEvent::StartElement(start));
                if token.kind == TokenKind::EmptyTag {
                    self.pending.push_back(XmlEvent::EndElement(end));
                }
                Ok(())
            }
            TokenKind::EndTag => {
                self.finish();
                let name = qname(token.name.unwrap_or_default(), position)?;
                self.pending.push_back(XmlEvent::EndElement(EndElement::new(name)));
                Ok(())
            }
            TokenKind::Text | TokenKind::CData => {
                self.finish();
                let content = token.content.as_deref().unwrap_or_default();
                if content.is_empty() {
                    return Ok(());
                }
                let text = utf8(content, position)?.to_string();
                self.pending.push_back(if token.kind == TokenKind::Text {
                    XmlEvent::Text(text)
                } else {
                    XmlEvent::CData(text)
                });
                Ok(())
            }
            TokenKind::Comment | TokenKind::ProcessingInstruction | TokenKind::DocType => {
                self.finish();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
        }
    }

    fn start_document(&mut self, version: Option<String>, encoding: Option<String>, standalone: bool) {
        if self.started {
            return;
        }
        self.started = true;
        self.pending.push_back(XmlEvent::StartDocument {
            version,
            encoding,
            standalone,
        });
    }

    fn declaration(&mut self, token: &Token<'_>, position: usize) -> Result<(), StreamError> {
        if self.started {
            if self.strict {
                return Err(StreamError::malformed(
                    "XML declaration allowed only at the start of the document",
                    position,
                ));
            }
            return Ok(());
        }

        let content = token.content.as_deref().unwrap_or_default();
        let attrs = self.attributes(content, position)?;
        let mut version = None;
        let mut encoding = None;
        let mut standalone = false;
        for attr in &attrs {
            let value = utf8(&attr.value, position)?;
            match attr.name {
                b"version" => version = Some(value.to_string()),
                b"encoding" => encoding = Some(value.to_string()),
                b"standalone" => standalone = value == "yes",
                _ if self.strict => {
                    return Err(StreamError::malformed("Unknown pseudo-attribute in XML declaration", position));
                }
                _ => {}
            }
        }
        if self.strict && version.is_none() {
            return Err(StreamError::malformed("XML declaration requires a version", position));
        }

        self.start_document(version, encoding, standalone);
        Ok(())
    }

    fn start_element(&self, token: &Token<'_>, input: &[u8], position: usize) -> Result<StartElement, StreamError> {
        let raw_name = token.name.unwrap_or_default();
        let (start, end) = token.span;
        // attribute section sits between the name and the closing '>' or '/>'
        let attrs_start = (start + 1 + raw_name.len()).min(end);
        let attrs_end = if token.kind == TokenKind::EmptyTag { end.saturating_sub(2) } else { end.saturating_sub(1) };
        let section = input.get(attrs_start..attrs_end.max(attrs_start)).unwrap_or_default();

        let mut element = StartElement::new(qname(raw_name, position)?);
        let attrs = self.attributes(section, position)?;
        if self.strict {
            check_duplicates(&attrs, position)?;
        }

        for attr in attrs {
            let value = utf8(&attr.value, position)?;
            if attr.name == b"xmlns" {
                element.namespaces.push(NamespaceDecl::new("", value));
            } else if attr.prefix() == Some(&b"xmlns"[..]) {
                if self.strict && value.is_empty() {
                    return Err(StreamError::malformed("Namespace prefix cannot be bound to an empty URI", position));
                }
                element.namespaces.push(NamespaceDecl::new(utf8(attr.local_name(), position)?, value));
            } else {
                element.attributes.push(Attribute {
                    name: qname(attr.name, position)?,
                    value: value.to_string(),
                });
            }
        }
        Ok(element)
    }

    fn attributes<'b>(&self, section: &'b [u8], position: usize) -> Result<Vec<RawAttribute<'b>>, StreamError> {
        if self.strict {
            parse_attributes_strict(section).map_err(|msg| StreamError::malformed(msg, position))
        } else {
            Ok(parse_attributes(section))
        }
    }
}

fn check_duplicates(attrs: &[RawAttribute<'_>], position: usize) -> Result<(), StreamError> {
    for (i, attr) in attrs.iter().enumerate() {
        if attrs[..i].iter().any(|earlier| earlier.name == attr.name) {
            return Err(StreamError::malformed("Duplicate attribute", position));
        }
    }
    Ok(())
}

fn utf8(bytes: &[u8], position: usize) -> Result<&str, StreamError> {
    std::str::from_utf8(bytes).map_err(|e| StreamError::InvalidUtf8 {
        position: position + e.valid_up_to(),
    })
}

fn qname(raw: &[u8], position: usize) -> Result<QName, StreamError> {
    Ok(QName::parse(utf8(raw, position)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tokenizer::Tokenizer;

    fn translate(input: &[u8], strict: bool) -> Result<Vec<XmlEvent>, StreamError> {
        let mut translator = EventTranslator::new(strict);
        let mut tokenizer = if strict { Tokenizer::new_strict(input) } else { Tokenizer::new(input) };
        while let Some(token) = tokenizer.next_token() {
            translator.push_token(&token, input, 0)?;
        }
        if let Some(err) = tokenizer.error() {
            return Err(StreamError::Malformed(err.clone()));
        }
        translator.finish();
        Ok(std::iter::from_fn(|| translator.pop()).collect())
    }

    #[test]
    fn test_declaration_becomes_start_document() {
        let events = translate(b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?><r/>", true).unwrap();
        assert_eq!(
            events[0],
            XmlEvent::StartDocument {
                version: Some("1.0".into()),
                encoding: Some("UTF-8".into()),
                standalone: true,
            }
        );
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_default_start_document() {
        let events = translate(b"<r/>", true).unwrap();
        assert_eq!(
            events,
            vec![
                XmlEvent::StartDocument {
                    version: None,
                    encoding: None,
                    standalone: false,
                },
                XmlEvent::start_element("r"),
                XmlEvent::end_element("r"),
            ]
        );
    }

    #[test]
    fn test_namespace_declarations_split_from_attributes() {
        let events = translate(b"<p:a xmlns=\"urn:d\" xmlns:p=\"urn:p\" p:id=\"1\" x=\"2\"></p:a>", true).unwrap();
        let start = events[1].as_start_element().unwrap();
        assert_eq!(start.name, QName::new(Some("p"), "a"));
        assert_eq!(
            start.namespaces,
            vec![NamespaceDecl::new("", "urn:d"), NamespaceDecl::new("p", "urn:p")]
        );
        assert_eq!(start.attributes.len(), 2);
        assert_eq!(start.attributes[0].name, QName::new(Some("p"), "id"));
        assert_eq!(start.attribute_value("x"), Some("2"));
    }

    #[test]
    fn test_comments_and_pis_skipped() {
        let events = translate(b"<!-- c --><?pi data?><r><![CDATA[x]]></r>", true).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[2], XmlEvent::CData("x".into()));
    }

    #[test]
    fn test_late_declaration_rejected_in_strict_mode() {
        let err = translate(b"<r/><?xml version=\"1.0\"?>", true).unwrap_err();
        assert!(err.to_string().contains("XML declaration allowed only at the start"));
        assert!(translate(b"<r/><?xml version=\"1.0\"?>", false).is_ok());
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        assert!(translate(b"<r a=\"1\" a=\"2\"/>", true).is_err());
        assert!(translate(b"<r a=\"1\" a=\"2\"/>", false).is_ok());
    }

    #[test]
    fn test_invalid_utf8_name() {
        let err = translate(b"<r\xff/>", false).unwrap_err();
        assert!(matches!(err, StreamError::InvalidUtf8 { .. }));
    }
}
