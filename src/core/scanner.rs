//! Byte-level cursor over XML input
//!
//! Delimiter searches go through memchr so that long text runs and
//! attribute-heavy tags are skipped with SIMD where the target supports it.

use memchr::{memchr, memchr3, memmem};

/// Cursor over a byte slice with XML-aware search helpers
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.input[start..end]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.remaining().starts_with(needle)
    }

    /// Skip XML whitespace (S production: space, tab, CR, LF)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Absolute offset of the next '<', if any
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', self.remaining()).map(|i| self.pos + i)
    }

    /// Absolute offset of the next '>', ignoring quoting
    #[inline]
    pub fn find_tag_end(&self) -> Option<usize> {
        memchr(b'>', self.remaining()).map(|i| self.pos + i)
    }

    /// Absolute offset of the '>' that closes the current tag.
    ///
    /// A '>' inside a single- or double-quoted attribute value does not
    /// terminate the tag.
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        find_unquoted_gt(self.remaining()).map(|i| self.pos + i)
    }

    /// Absolute offset of the next occurrence of `needle`
    #[inline]
    pub fn find_sequence(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.remaining(), needle).map(|i| self.pos + i)
    }

    /// Absolute offset of the '>' closing a DOCTYPE declaration.
    ///
    /// Skips over an internal subset in brackets and quoted literals.
    pub fn find_doctype_end(&self) -> Option<usize> {
        find_doctype_gt(self.remaining()).map(|i| self.pos + i)
    }

    /// Read an XML name at the cursor and advance past it
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        match self.peek() {
            Some(b) if is_name_start_char(b) => self.pos += 1,
            _ => return None,
        }
        while let Some(b) = self.peek() {
            if !is_name_char(b) {
                break;
            }
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }
}

/// Offset of the first '>' outside quotes
pub(crate) fn find_unquoted_gt(input: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while let Some(i) = memchr3(b'>', b'"', b'\'', &input[pos..]) {
        let at = pos + i;
        match input[at] {
            b'>' => return Some(at),
            quote => {
                let close = memchr(quote, &input[at + 1..])?;
                pos = at + 1 + close + 1;
            }
        }
    }
    None
}

/// Offset of the '>' ending a DOCTYPE, honouring `[...]` and quotes
pub(crate) fn find_doctype_gt(input: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in input.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Some(i),
                _ => {}
            },
        }
    }
    None
}

#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Name start byte: ASCII letter, '_' or ':'; non-ASCII bytes are accepted
/// as parts of UTF-8 encoded letters
#[inline]
pub(crate) fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

#[inline]
pub(crate) fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}
