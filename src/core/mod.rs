//! Core XML parsing primitives
//!
//! - Scanner: memchr-accelerated delimiter search
//! - Tokenizer: pull tokenizer for tags, text, CDATA and declarations
//! - Entities: predefined entity and character reference decoding
//! - Attributes: attribute section parsing
//! - Encoding: BOM sniffing, declared encodings and transcoding to UTF-8

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
