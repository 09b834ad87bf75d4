//! XML Encoding Detection and Conversion
//!
//! The tokenizer works on UTF-8. The input encoding comes from, in order:
//! a byte order mark, the UTF-16 pattern of a leading `<`, the `encoding`
//! pseudo-attribute of the XML declaration, and finally the UTF-8 default.
//! Anything other than UTF-8 is transcoded with `encoding_rs`, in one go for
//! slices or chunk by chunk for streams.

use super::attributes::parse_attributes;
use super::scanner::is_whitespace;
use encoding_rs::{DecoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8};
use memchr::memmem;
use std::borrow::Cow;

/// Bytes needed to recognize a byte order mark or a UTF-16 `<`
pub const SNIFF_LEN: usize = 4;

/// Longest XML declaration waited for before giving up on it
pub const MAX_DECLARATION_LEN: usize = 1024;

/// Detect the encoding of a document from its first bytes.
///
/// Returns the encoding and the length of the byte order mark to skip. A
/// declared label that names no known encoding is an error.
pub fn detect(head: &[u8]) -> Result<(&'static Encoding, usize), String> {
    if let Some(found) = Encoding::for_bom(head) {
        return Ok(found);
    }
    match head {
        [b'<', 0x00, ..] => return Ok((UTF_16LE, 0)),
        [0x00, b'<', ..] => return Ok((UTF_16BE, 0)),
        _ => {}
    }
    let Some(label) = declared_label(head) else {
        return Ok((UTF_8, 0));
    };
    match Encoding::for_label(&label) {
        // bytes read as ASCII already, so a UTF-16 label cannot be right
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => Ok((UTF_8, 0)),
        Some(encoding) => Ok((encoding, 0)),
        None => Err(format!("Unsupported encoding '{}'", String::from_utf8_lossy(&label))),
    }
}

/// Whether a stream's first bytes are still too short to call [`detect`]
pub fn needs_more(head: &[u8]) -> bool {
    if head.len() < SNIFF_LEN {
        return true;
    }
    if Encoding::for_bom(head).is_some() || head.len() >= MAX_DECLARATION_LEN {
        return false;
    }
    head.starts_with(b"<?xml") && memmem::find(head, b"?>").is_none()
}

/// Value of the `encoding` pseudo-attribute of a leading XML declaration
fn declared_label(head: &[u8]) -> Option<Vec<u8>> {
    let rest = head.strip_prefix(b"<?xml")?;
    if !rest.first().is_some_and(|&b| is_whitespace(b)) {
        return None;
    }
    let end = memmem::find(rest, b"?>")?;
    parse_attributes(&rest[..end])
        .into_iter()
        .find(|attr| attr.name == b"encoding")
        .map(|attr| attr.value.into_owned())
}

/// Convert a complete input to UTF-8, dropping any byte order mark
pub fn convert_to_utf8(input: &[u8]) -> Result<Cow<'_, [u8]>, String> {
    let (encoding, bom) = detect(input)?;
    let body = &input[bom..];
    if encoding == UTF_8 {
        return Ok(Cow::Borrowed(body));
    }
    let mut decoder = TextDecoder::new(encoding);
    let mut out = decoder.feed(body, true)?;
    out.shrink_to_fit();
    Ok(Cow::Owned(out))
}

/// Incremental decoder from any supported encoding to UTF-8.
///
/// Chunks may split a multi-byte sequence or a surrogate pair; the decoder
/// carries the partial input into the next call.
pub struct TextDecoder {
    decoder: encoding_rs::Decoder,
}

impl TextDecoder {
    /// The caller has already skipped any byte order mark
    pub fn new(encoding: &'static Encoding) -> Self {
        TextDecoder {
            decoder: encoding.new_decoder_without_bom_handling(),
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.decoder.encoding()
    }

    /// Decode a chunk, returning the UTF-8 bytes completed by it. `last`
    /// marks the end of input: an incomplete trailing sequence is then an error.
    pub fn feed(&mut self, chunk: &[u8], last: bool) -> Result<Vec<u8>, String> {
        let capacity = self
            .decoder
            .max_utf8_buffer_length_without_replacement(chunk.len())
            .unwrap_or(chunk.len() * 3 + 16);
        let mut out = vec![0u8; capacity];
        let mut written = 0;
        let mut src = chunk;

        loop {
            let (result, read, wrote) = self.decoder.decode_to_utf8_without_replacement(src, &mut out[written..], last);
            src = &src[read..];
            written += wrote;
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => out.resize(out.len() * 2 + 16, 0),
                DecoderResult::Malformed(_, _) => {
                    return Err(format!("Invalid {} byte sequence", self.encoding().name()));
                }
            }
        }
        out.truncate(written);
        Ok(out)
    }
}

impl std::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDecoder").field("encoding", &self.encoding().name()).finish()
    }
}
