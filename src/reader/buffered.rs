//! Streaming XML Reader
//!
//! Reads XML from any source implementing `Read` in fixed-size chunks. Only
//! the prefix of the buffer that ends on a complete construct is tokenized;
//! the tail waits for the next chunk. Memory stays bounded by the chunk size
//! plus the largest single construct (tag, comment, CDATA section or text run).

use super::events::XmlEvent;
use super::translate::EventTranslator;
use super::{TokenSource, MEMORY_RESOURCE};
use crate::core::encoding::{self, TextDecoder};
use crate::core::scanner::{find_doctype_gt, find_unquoted_gt};
use crate::core::tokenizer::{TokenKind, Tokenizer};
use crate::error::StreamError;
use memchr::{memchr, memmem};
use encoding_rs::{Encoding, UTF_8};
use std::io::{ErrorKind, Read};

/// Buffer size for reading chunks
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Declarations that must be seen in full before their end can be searched
const MARKUP_OPENERS: [&[u8]; 3] = [b"<!--", b"<![CDATA[", b"<!DOCTYPE"];

/// Chunked XML token source
pub struct StreamReader<R: Read> {
    reader: R,
    chunk: Vec<u8>,
    /// UTF-8 bytes not yet tokenized
    buffer: Vec<u8>,
    /// Absolute offset of `buffer[0]`
    consumed: usize,
    /// Raw bytes held back until the encoding is known
    head: Vec<u8>,
    encoding: Option<&'static Encoding>,
    /// Set for every encoding but UTF-8
    decoder: Option<TextDecoder>,
    eof: bool,
    done: bool,
    strict: bool,
    translator: EventTranslator,
    resource: String,
}

impl<R: Read> StreamReader<R> {
    /// Create a lenient streaming reader
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE, false)
    }

    /// Create a streaming reader that fails on the first well-formedness violation
    pub fn new_strict(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE, true)
    }

    /// Create a streaming reader with the given chunk size
    pub fn with_capacity(reader: R, capacity: usize, strict: bool) -> Self {
        let capacity = capacity.max(1);
        StreamReader {
            reader,
            chunk: vec![0u8; capacity],
            buffer: Vec::with_capacity(capacity),
            consumed: 0,
            head: Vec::new(),
            encoding: None,
            decoder: None,
            eof: false,
            done: false,
            strict,
            translator: EventTranslator::new(strict),
            resource: MEMORY_RESOURCE.to_string(),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Encoding detected from the start of the stream, once known
    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.encoding
    }

    /// Bytes currently buffered and waiting for the rest of their construct
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Read the next chunk and decode it into the buffer
    fn fill(&mut self) -> Result<(), StreamError> {
        let n = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        if n == 0 {
            self.eof = true;
            let head = std::mem::take(&mut self.head);
            if !head.is_empty() {
                self.decode(&head)?;
            }
            if let Some(decoder) = self.decoder.as_mut() {
                let tail = decoder.feed(&[], true).map_err(StreamError::Encoding)?;
                self.buffer.extend_from_slice(&tail);
            }
            return Ok(());
        }

        let chunk = std::mem::take(&mut self.chunk);
        let result = if self.encoding.is_none() {
            self.head.extend_from_slice(&chunk[..n]);
            if encoding::needs_more(&self.head) {
                Ok(())
            } else {
                let head = std::mem::take(&mut self.head);
                self.decode(&head)
            }
        } else {
            self.decode(&chunk[..n])
        };
        self.chunk = chunk;
        result
    }

    fn decode(&mut self, mut bytes: &[u8]) -> Result<(), StreamError> {
        if self.encoding.is_none() {
            let (detected, bom) = encoding::detect(bytes).map_err(StreamError::Encoding)?;
            bytes = &bytes[bom..];
            if detected != UTF_8 {
                self.decoder = Some(TextDecoder::new(detected));
            }
            self.encoding = Some(detected);
        }
        match self.decoder.as_mut() {
            Some(decoder) => {
                let decoded = decoder.feed(bytes, false).map_err(StreamError::Encoding)?;
                self.buffer.extend_from_slice(&decoded);
            }
            None => self.buffer.extend_from_slice(bytes),
        }
        Ok(())
    }

    /// Tokenize `buffer[..limit]` and drop it from the buffer
    fn process(&mut self, limit: usize) -> Result<(), StreamError> {
        let slice = &self.buffer[..limit];
        let mut tokenizer = if self.strict { Tokenizer::new_strict(slice) } else { Tokenizer::new(slice) };
        let mut reached = 0;

        while let Some(token) = tokenizer.next_token() {
            if token.kind == TokenKind::Eof {
                reached = limit;
                break;
            }
            self.translator.push_token(&token, slice, self.consumed)?;
            reached = token.span.1;
        }

        if let Some(err) = tokenizer.error() {
            self.done = true;
            return Err(StreamError::malformed(err.message.clone(), self.consumed + err.position));
        }
        if reached < limit {
            // lenient mode stops at the first construct it cannot read
            self.done = true;
            self.translator.finish();
        }

        self.buffer.drain(..limit);
        self.consumed += limit;
        Ok(())
    }
}

impl<R: Read> TokenSource for StreamReader<R> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, StreamError> {
        loop {
            if let Some(event) = self.translator.pop() {
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }

            let boundary = if self.eof {
                self.buffer.len()
            } else {
                find_safe_boundary(&self.buffer)
            };

            if boundary > 0 {
                self.process(boundary)?;
            } else if self.eof {
                self.done = true;
                self.translator.finish();
            } else {
                self.fill()?;
            }
        }
    }

    fn resource(&self) -> &str {
        &self.resource
    }
}

impl<R: Read> Iterator for StreamReader<R> {
    type Item = Result<XmlEvent, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

/// Offset just past the last complete construct in `buf`.
///
/// Text counts as complete only once the `<` that ends it is buffered.
/// Tags are closed by the first `>` outside quotes; comments, CDATA,
/// processing instructions and DOCTYPE by their own terminators.
pub fn find_safe_boundary(buf: &[u8]) -> usize {
    let mut pos = 0;
    loop {
        let rest = &buf[pos..];
        if rest.is_empty() {
            return pos;
        }
        if rest[0] != b'<' {
            match memchr(b'<', rest) {
                Some(i) => {
                    pos += i;
                    continue;
                }
                None => return pos,
            }
        }

        let end = if rest.starts_with(b"<!--") {
            memmem::find(&rest[4..], b"-->").map(|i| 4 + i + 3)
        } else if rest.starts_with(b"<![CDATA[") {
            memmem::find(&rest[9..], b"]]>").map(|i| 9 + i + 3)
        } else if rest.starts_with(b"<!DOCTYPE") {
            find_doctype_gt(rest).map(|i| i + 1)
        } else if rest.starts_with(b"<?") {
            memmem::find(&rest[2..], b"?>").map(|i| 2 + i + 2)
        } else if MARKUP_OPENERS.iter().any(|opener| opener.len() > rest.len() && opener.starts_with(rest)) {
            None
        } else {
            find_unquoted_gt(rest).map(|i| i + 1)
        };

        match end {
            Some(end) => pos += end,
            None => return pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn events(input: &[u8], capacity: usize) -> Vec<XmlEvent> {
        StreamReader::with_capacity(Cursor::new(input.to_vec()), capacity, true)
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_safe_boundary_text_waits_for_tag() {
        assert_eq!(find_safe_boundary(b"<a>hel"), 3);
        assert_eq!(find_safe_boundary(b"<a>hello<"), 8);
        assert_eq!(find_safe_boundary(b"<a>hello</a>"), 12);
    }

    #[test]
    fn test_safe_boundary_quoted_gt() {
        assert_eq!(find_safe_boundary(b"<a x=\"1>2\""), 0);
        assert_eq!(find_safe_boundary(b"<a x=\"1>2\">"), 11);
    }

    #[test]
    fn test_safe_boundary_partial_openers() {
        assert_eq!(find_safe_boundary(b"<r><!"), 3);
        assert_eq!(find_safe_boundary(b"<r><![CD"), 3);
        assert_eq!(find_safe_boundary(b"<r><!-- a > b"), 3);
        assert_eq!(find_safe_boundary(b"<r><![CDATA[a>b]]>"), 18);
    }

    #[test]
    fn test_same_events_for_any_chunk_size() {
        let input = b"<?xml version=\"1.0\"?><!DOCTYPE r [<!ENTITY x \"y\">]><r a=\"1>\"><!-- c --><b>t&amp;u</b><![CDATA[ <x> ]]></r>";
        let expected = events(input, 8192);
        assert_eq!(expected.len(), 7);
        for capacity in 1..16 {
            assert_eq!(events(input, capacity), expected, "chunk size {}", capacity);
        }
    }

    #[test]
    fn test_utf16_stream() {
        let mut input = vec![0xFE, 0xFF];
        for unit in "<r>\u{1F600}</r>".encode_utf16() {
            input.extend_from_slice(&unit.to_be_bytes());
        }
        let events = events(&input, 3);
        assert_eq!(events[2], XmlEvent::Text("\u{1F600}".into()));
    }

    #[test]
    fn test_declared_windows_1252_stream() {
        let input = b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><r>\x80 caf\xe9</r>";
        let mut reader = StreamReader::with_capacity(Cursor::new(input.to_vec()), 7, true);
        let events: Vec<_> = reader.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(events[2], XmlEvent::Text("\u{20AC} caf\u{e9}".into()));
        assert_eq!(reader.encoding(), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(reader.buffered_len(), 0);
    }

    #[test]
    fn test_text_waits_in_buffer_for_its_end() {
        let mut reader = StreamReader::with_capacity(Cursor::new(b"<r>some text</r>".to_vec()), 8, true);
        assert!(matches!(reader.next_event(), Ok(Some(XmlEvent::StartDocument { .. }))));
        assert!(matches!(reader.next_event(), Ok(Some(XmlEvent::StartElement(_)))));
        assert_eq!(reader.encoding(), Some(UTF_8));
        assert_eq!(reader.buffered_len(), 5);
    }

    #[test]
    fn test_error_position_is_absolute() {
        let mut reader = StreamReader::with_capacity(Cursor::new(b"<a>text</a><b x=1>".to_vec()), 4, true);
        let err = loop {
            match reader.next_event() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected an error"),
                Err(err) => break err,
            }
        };
        match err {
            StreamError::Malformed(err) => assert_eq!(err.position, 11),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_tag_at_eof() {
        let result: Result<Vec<_>, _> = StreamReader::new_strict(Cursor::new(b"<a><b".to_vec())).collect();
        assert!(result.is_err());
    }

    #[test]
    fn test_io_error_surfaces() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }
        let mut reader = StreamReader::new(Broken);
        assert!(matches!(reader.next_event(), Err(StreamError::Io(_))));
    }
}
