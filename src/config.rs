//! Scan configuration

use crate::reader::buffered::DEFAULT_BUFFER_SIZE;
use std::path::Path;

/// Options controlling how documents are read and which files are accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Fail on the first well-formedness violation instead of stopping quietly
    pub strict: bool,
    /// Chunk size used when reading from a stream
    pub buffer_size: usize,
    /// File suffixes accepted by [`ScanOptions::accepts`], without the dot
    pub extensions: Vec<String>,
    /// Trim CDATA content like character data; when off, CDATA is kept
    /// verbatim and dropped only when empty
    pub trim_cdata: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            strict: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
            extensions: vec!["xml".to_string(), "xsd".to_string()],
            trim_cdata: true,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient reading: malformed trailing markup ends the stream quietly
    pub fn lenient() -> Self {
        Self::default().strict(false)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn trim_cdata(mut self, trim: bool) -> Self {
        self.trim_cdata = trim;
        self
    }

    /// Whether a file should be scanned, by case-insensitive suffix
    pub fn accepts(&self, path: impl AsRef<Path>) -> bool {
        let Some(name) = path.as_ref().file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let name = name.to_ascii_lowercase();
        self.extensions.iter().any(|ext| {
            name.strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.ends_with('.') && stem.len() > 1)
        })
    }
}
