//! Slice Reader
//!
//! Token source over an input held entirely in memory. UTF-8 input is
//! tokenized in place; UTF-16 and declared legacy encodings are converted
//! once up front.

use super::events::XmlEvent;
use super::translate::EventTranslator;
use super::{TokenSource, MEMORY_RESOURCE};
use crate::core::encoding::convert_to_utf8;
use crate::core::tokenizer::{TokenKind, Tokenizer};
use crate::error::StreamError;
use std::borrow::Cow;

/// XML token source reading from a byte slice
pub struct SliceReader<'a> {
    input: Cow<'a, [u8]>,
    pos: usize,
    strict: bool,
    done: bool,
    translator: EventTranslator,
    /// Decoding failure reported on the first pull
    failure: Option<StreamError>,
    resource: Cow<'a, str>,
}

impl<'a> SliceReader<'a> {
    /// Create a lenient slice reader
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_mode(input, false)
    }

    /// Create a slice reader that fails on the first well-formedness violation
    pub fn new_strict(input: &'a [u8]) -> Self {
        Self::with_mode(input, true)
    }

    pub fn with_mode(input: &'a [u8], strict: bool) -> Self {
        let (input, failure) = match convert_to_utf8(input) {
            Ok(converted) => (converted, None),
            Err(msg) => (Cow::Borrowed(&[][..]), Some(StreamError::Encoding(msg))),
        };
        SliceReader {
            input,
            pos: 0,
            strict,
            done: false,
            translator: EventTranslator::new(strict),
            failure,
            resource: Cow::Borrowed(MEMORY_RESOURCE),
        }
    }

    /// Name the resource this input came from
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Byte offset of the next token in the (UTF-8) input
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Tokenize one construct and queue the events it produces
    fn advance(&mut self) -> Result<(), StreamError> {
        let rest = &self.input[self.pos..];
        let mut tokenizer = if self.strict { Tokenizer::new_strict(rest) } else { Tokenizer::new(rest) };

        match tokenizer.next_token() {
            Some(token) if token.kind == TokenKind::Eof => {
                self.done = true;
                self.translator.finish();
            }
            Some(token) => {
                self.translator.push_token(&token, rest, self.pos)?;
                self.pos += token.span.1;
            }
            None => {
                if let Some(err) = tokenizer.error() {
                    self.done = true;
                    return Err(StreamError::malformed(err.message.clone(), self.pos + err.position));
                }
                // lenient mode stops at the first construct it cannot read
                self.done = true;
                self.translator.finish();
            }
        }
        Ok(())
    }
}

impl TokenSource for SliceReader<'_> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, StreamError> {
        if let Some(err) = self.failure.take() {
            self.done = true;
            return Err(err);
        }
        loop {
            if let Some(event) = self.translator.pop() {
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }
            self.advance()?;
        }
    }

    fn resource(&self) -> &str {
        &self.resource
    }
}

impl Iterator for SliceReader<'_> {
    type Item = Result<XmlEvent, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
