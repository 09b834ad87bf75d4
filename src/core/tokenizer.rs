//! XML Tokenizer - pull-style token extraction
//!
//! Produces one token per markup construct or text run:
//! - Element start/end/empty tags
//! - Text content (line endings normalized, references decoded)
//! - CDATA sections
//! - Comments and processing instructions
//! - XML declaration and DOCTYPE
//!
//! In strict mode the first well-formedness violation is recorded as a
//! [`ParseError`] and tokenization stops. Lenient mode stops quietly.

use super::entities::{decode_content, normalize_line_endings};
use super::scanner::{is_whitespace, Scanner};
use std::borrow::Cow;
use thiserror::Error;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<element ...>`
    StartTag,
    /// `</element>`
    EndTag,
    /// `<element .../>`
    EmptyTag,
    Text,
    /// `<![CDATA[...]]>`
    CData,
    /// `<!--...-->`
    Comment,
    /// `<?target ...?>`
    ProcessingInstruction,
    /// `<?xml ...?>`
    XmlDeclaration,
    DocType,
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// Tag or PI target name
    pub name: Option<&'a [u8]>,
    /// Text, CDATA or comment content
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>) -> Self {
        self.content = Some(content);
        self
    }
}

/// Well-formedness violation found in strict mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// Pull tokenizer over a UTF-8 byte slice
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    strict: bool,
    done: bool,
    error: Option<ParseError>,
}

impl<'a> Tokenizer<'a> {
    /// Create a lenient tokenizer
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            strict: false,
            done: false,
            error: None,
        }
    }

    /// Create a tokenizer that stops at the first well-formedness violation
    pub fn new_strict(input: &'a [u8]) -> Self {
        Tokenizer {
            strict: true,
            ..Tokenizer::new(input)
        }
    }

    /// The recorded error, if tokenization stopped on one
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Record an error (strict mode only) and stop
    fn fail(&mut self, message: &'static str, position: usize) -> Option<Token<'a>> {
        if self.strict && self.error.is_none() {
            self.error = Some(ParseError::new(message, position));
        }
        self.done = true;
        None
    }

    /// Get the next token; `None` after `Eof` or after an error
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        if self.done {
            return None;
        }
        match self.scanner.peek() {
            Some(b'<') => self.parse_markup(),
            Some(_) => self.parse_text(),
            None => {
                self.done = true;
                let pos = self.scanner.position();
                Some(Token::new(TokenKind::Eof, (pos, pos)))
            }
        }
    }

    fn parse_markup(&mut self) -> Option<Token<'a>> {
        let start = self.scanner.position();
        self.scanner.advance(1);

        if self.scanner.starts_with(b"/") {
            self.parse_end_tag(start)
        } else if self.scanner.starts_with(b"!--") {
            self.parse_comment(start)
        } else if self.scanner.starts_with(b"![CDATA[") {
            self.parse_cdata(start)
        } else if self.scanner.starts_with(b"!DOCTYPE") {
            self.parse_doctype(start)
        } else if self.scanner.starts_with(b"!") {
            self.fail("Invalid declaration - expected comment, CDATA, or DOCTYPE", start)
        } else if self.scanner.starts_with(b"?") {
            self.parse_pi(start)
        } else {
            self.parse_start_tag(start)
        }
    }

    fn parse_start_tag(&mut self, start: usize) -> Option<Token<'a>> {
        let Some(name) = self.scanner.read_name() else {
            return self.fail("Invalid element name: must start with letter, underscore, or colon", start);
        };
        if self.strict && !is_valid_qname(name) {
            return self.fail("Invalid qualified name", start);
        }

        let Some(end) = self.scanner.find_tag_end_quoted() else {
            return self.fail("Unterminated start tag", start);
        };
        if self.strict {
            match self.scanner.peek() {
                Some(b'>') | Some(b'/') => {}
                Some(b) if is_whitespace(b) => {}
                _ => return self.fail("Invalid character in element name", start),
            }
        }

        let is_empty = end > start && self.scanner.slice(end - 1, end) == b"/";
        self.scanner.set_position(end + 1);

        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Some(Token::new(kind, (start, end + 1)).with_name(name))
    }

    fn parse_end_tag(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1);

        let Some(name) = self.scanner.read_name() else {
            return self.fail("Invalid element name in end tag", start);
        };
        self.scanner.skip_whitespace();
        let end = match self.scanner.find_tag_end() {
            Some(end) if !self.strict || end == self.scanner.position() => end,
            _ => return self.fail("Unterminated end tag", start),
        };
        self.scanner.set_position(end + 1);
        Some(Token::new(TokenKind::EndTag, (start, end + 1)).with_name(name))
    }

    fn parse_comment(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(3);
        let content_start = self.scanner.position();

        let Some(end) = self.scanner.find_sequence(b"--") else {
            return self.fail("Unterminated comment", start);
        };
        if !self.scanner.slice(end, self.scanner_len()).starts_with(b"-->") {
            // '--' inside a comment is only legal as part of the terminator
            if self.strict {
                return self.fail("Comment cannot contain '--'", end);
            }
            self.scanner.set_position(content_start);
            let Some(close) = self.scanner.find_sequence(b"-->") else {
                return self.fail("Unterminated comment", start);
            };
            return Some(self.finish_comment(start, content_start, close));
        }
        Some(self.finish_comment(start, content_start, end))
    }

    fn finish_comment(&mut self, start: usize, content_start: usize, close: usize) -> Token<'a> {
        let content = self.scanner.slice(content_start, close);
        self.scanner.set_position(close + 3);
        Token::new(TokenKind::Comment, (start, close + 3)).with_content(Cow::Borrowed(content))
    }

    fn parse_cdata(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(8);
        let content_start = self.scanner.position();

        let Some(end) = self.scanner.find_sequence(b"]]>") else {
            return self.fail("Unterminated CDATA section", start);
        };
        let content = normalize_line_endings(self.scanner.slice(content_start, end));
        self.scanner.set_position(end + 3);
        Some(Token::new(TokenKind::CData, (start, end + 3)).with_content(content))
    }

    fn parse_doctype(&mut self, start: usize) -> Option<Token<'a>> {
        let Some(end) = self.scanner.find_doctype_end() else {
            return self.fail("Unterminated DOCTYPE declaration", start);
        };
        self.scanner.set_position(end + 1);
        Some(Token::new(TokenKind::DocType, (start, end + 1)))
    }

    fn parse_pi(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1);

        let Some(name) = self.scanner.read_name() else {
            return self.fail("Invalid processing instruction target", start);
        };
        let Some(end) = self.scanner.find_sequence(b"?>") else {
            return self.fail("Unterminated processing instruction", start);
        };

        let is_xml_decl = name == b"xml";
        if self.strict && !is_xml_decl && name.eq_ignore_ascii_case(b"xml") {
            return self.fail("Processing instruction target 'xml' is reserved", start);
        }

        let content = self.scanner.slice(self.scanner.position(), end);
        self.scanner.set_position(end + 2);

        let kind = if is_xml_decl {
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };
        Some(Token::new(kind, (start, end + 2)).with_name(name).with_content(Cow::Borrowed(content)))
    }

    fn parse_text(&mut self) -> Option<Token<'a>> {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner_len());
        let content = self.scanner.slice(start, end);

        if self.strict && memchr::memmem::find(content, b"]]>").is_some() {
            return self.fail("Text cannot contain ']]>'", start);
        }
        let decoded = match decode_content(content, self.strict) {
            Ok(v) => v,
            Err(msg) => return self.fail(msg, start),
        };

        self.scanner.set_position(end);
        Some(Token::new(TokenKind::Text, (start, end)).with_content(decoded))
    }

    #[inline]
    fn scanner_len(&self) -> usize {
        self.scanner.position() + self.scanner.remaining().len()
    }
}

/// A qualified name has at most one colon, not at either end
fn is_valid_qname(name: &[u8]) -> bool {
    let colons = memchr::memchr_iter(b':', name).count();
    colons == 0 || (colons == 1 && name.first() != Some(&b':') && name.last() != Some(&b':'))
}

/// Iterator adapter for tokenizer
impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().filter(|token| token.kind != TokenKind::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &[u8]) -> Vec<TokenKind> {
        Tokenizer::new_strict(input).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_element() {
        let mut tok = Tokenizer::new(b"<root>content</root>");

        let t1 = tok.next_token().unwrap();
        assert_eq!(t1.kind, TokenKind::StartTag);
        assert_eq!(t1.name, Some(b"root" as &[u8]));

        let t2 = tok.next_token().unwrap();
        assert_eq!(t2.kind, TokenKind::Text);
        assert_eq!(t2.content.as_deref(), Some(b"content" as &[u8]));

        let t3 = tok.next_token().unwrap();
        assert_eq!(t3.kind, TokenKind::EndTag);
        assert_eq!(t3.name, Some(b"root" as &[u8]));

        assert_eq!(tok.next_token().map(|t| t.kind), Some(TokenKind::Eof));
        assert!(tok.next_token().is_none());
    }

    #[test]
    fn test_empty_element() {
        let mut tok = Tokenizer::new(b"<br/>");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::EmptyTag);
        assert_eq!(t.name, Some(b"br" as &[u8]));
    }

    #[test]
    fn test_cdata_keeps_markup() {
        let mut tok = Tokenizer::new(b"<![CDATA[<script>a]b</script>]]>");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::CData);
        assert_eq!(t.content.as_deref(), Some(b"<script>a]b</script>" as &[u8]));
    }

    #[test]
    fn test_comment() {
        let mut tok = Tokenizer::new(b"<!-- comment -->");
        let t = tok.next_token().unwrap();
        assert_eq!(t.kind, TokenKind::Comment);
        assert_eq!(t.content.as_deref(), Some(b" comment " as &[u8]));
    }

    #[test]
    fn test_declaration_and_doctype() {
        assert_eq!(
            kinds(b"<?xml version=\"1.0\"?><!DOCTYPE r [<!ELEMENT r ANY>]><?pi x?><r/>"),
            vec![
                TokenKind::XmlDeclaration,
                TokenKind::DocType,
                TokenKind::ProcessingInstruction,
                TokenKind::EmptyTag
            ]
        );
    }

    #[test]
    fn test_text_references_decoded() {
        let mut tok = Tokenizer::new_strict(b"a &lt; b");
        let t = tok.next_token().unwrap();
        assert_eq!(t.content.as_deref(), Some(b"a < b" as &[u8]));
    }

    #[test]
    fn test_line_endings_normalized_in_text_and_cdata() {
        let tokens: Vec<_> = Tokenizer::new_strict(b"<r>x\r\ny\rz<![CDATA[a\r\nb]]></r>").collect();
        assert_eq!(tokens[1].content.as_deref(), Some(b"x\ny\nz" as &[u8]));
        assert_eq!(tokens[2].content.as_deref(), Some(b"a\nb" as &[u8]));
    }

    #[test]
    fn test_strict_unterminated_tag() {
        let mut tok = Tokenizer::new_strict(b"<root attr=\"1\"");
        assert!(tok.next_token().is_none());
        assert_eq!(tok.error().map(|e| e.message.as_str()), Some("Unterminated start tag"));
    }

    #[test]
    fn test_lenient_unterminated_tag_stops_quietly() {
        let mut tok = Tokenizer::new(b"<root attr=\"1\"");
        assert!(tok.next_token().is_none());
        assert!(tok.error().is_none());
    }

    #[test]
    fn test_strict_double_dash_in_comment() {
        let mut tok = Tokenizer::new_strict(b"<!-- a -- b -->");
        assert!(tok.next_token().is_none());
        assert_eq!(tok.error().map(|e| e.position), Some(7));
    }

    #[test]
    fn test_strict_invalid_qname() {
        let mut tok = Tokenizer::new_strict(b"<a:b:c/>");
        assert!(tok.next_token().is_none());
        assert!(tok.error().is_some());
    }

    #[test]
    fn test_strict_cdata_end_in_text() {
        let mut tok = Tokenizer::new_strict(b"a ]]> b");
        assert!(tok.next_token().is_none());
        assert_eq!(tok.error().map(|e| e.message.as_str()), Some("Text cannot contain ']]>'"));
    }
}
