//! Error types
//!
//! A scan either completes with a fully linked document or fails with exactly
//! one [`ScanError`] naming the resource and the underlying cause.

use crate::core::tokenizer::ParseError;
use crate::graph::StoreError;
use crate::reader::QName;
use thiserror::Error;

/// Failure of the token source: unreadable or malformed input
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("malformed markup: {0}")]
    Malformed(#[from] ParseError),

    #[error("invalid UTF-8 at byte {position}")]
    InvalidUtf8 { position: usize },

    #[error("cannot decode input: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    pub(crate) fn malformed(message: impl Into<String>, position: usize) -> Self {
        StreamError::Malformed(ParseError::new(message, position))
    }
}

/// Event sequence that does not describe a well-nested tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("end tag </{name}> without an open element")]
    UnexpectedEnd { name: QName },

    #[error("element <{expected}> closed by </{found}>")]
    MismatchedEnd { expected: QName, found: QName },

    #[error("element <{name}> is never closed")]
    UnclosedElement { name: QName },

    #[error("prefix '{prefix}' of <{name}> is not declared in scope")]
    UndeclaredPrefix { prefix: String, name: QName },

    #[error("element <{name}> before the start of the document")]
    MissingDocumentStart { name: QName },

    #[error("stream ended before the document started")]
    MissingDocument,

    #[error("document started twice")]
    DuplicateDocumentStart,

    #[error("second root element <{name}>")]
    MultipleRoots { name: QName },

    #[error("character data outside the root element")]
    TextOutsideRoot,
}

/// Error surfaced by a scan, tagged with the resource being scanned
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read document {resource}")]
    Stream {
        resource: String,
        #[source]
        source: StreamError,
    },

    #[error("ill-formed document structure in {resource}")]
    Structural {
        resource: String,
        #[source]
        source: StructuralError,
    },

    #[error("graph store failed while scanning {resource}")]
    Store {
        resource: String,
        #[source]
        source: StoreError,
    },
}

impl ScanError {
    /// Identity of the resource whose scan failed
    pub fn resource(&self) -> &str {
        match self {
            ScanError::Stream { resource, .. }
            | ScanError::Structural { resource, .. }
            | ScanError::Store { resource, .. } => resource,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, ScanError::Structural { .. })
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, ScanError::Stream { .. })
    }
}

/// Failure inside one scan before the resource name is attached
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StepError {
    pub fn with_resource(self, resource: &str) -> ScanError {
        let resource = resource.to_string();
        match self {
            StepError::Stream(source) => ScanError::Stream { resource, source },
            StepError::Structural(source) => ScanError::Structural { resource, source },
            StepError::Store(source) => ScanError::Store { resource, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_messages() {
        let err = StructuralError::MismatchedEnd {
            expected: QName::new(None, "b"),
            found: QName::new(None, "a"),
        };
        assert_eq!(err.to_string(), "element <b> closed by </a>");

        let err = StructuralError::UndeclaredPrefix {
            prefix: "p".into(),
            name: QName::new(Some("p"), "x"),
        };
        assert_eq!(err.to_string(), "prefix 'p' of <p:x> is not declared in scope");
    }

    #[test]
    fn test_scan_error_keeps_source() {
        use std::error::Error as _;

        let err = StepError::from(StreamError::malformed("Unterminated start tag", 4)).with_resource("pom.xml");
        assert_eq!(err.resource(), "pom.xml");
        assert!(err.is_stream());
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("malformed markup: Unterminated start tag at byte 4".to_string())
        );
    }
}
