//! Graph node representation
//!
//! Each node kind has its own compact identifier (index into the owning
//! store's arena) so a handle of one kind cannot be passed where another is
//! expected. Names and URIs are interned in the store's string pool.

use super::strings::Symbol;
use std::fmt;

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

node_id!(
    /// Handle of a Document node
    DocumentId,
    "document"
);
node_id!(
    /// Handle of an Element node
    ElementId,
    "element"
);
node_id!(
    /// Handle of an Attribute node
    AttributeId,
    "attribute"
);
node_id!(
    /// Handle of a Namespace Binding node
    NamespaceId,
    "namespace"
);
node_id!(
    /// Handle of a Text node
    TextId,
    "text"
);

/// Provenance of a text node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Plain character data
    Characters,
    /// Content of a CDATA section
    CData,
}

/// Whole parsed unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    pub version: Option<String>,
    pub encoding: Option<String>,
    pub standalone: bool,
    /// Absent until the first element, and for documents without one
    pub root: Option<ElementId>,
}

/// Markup element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    pub local_name: Symbol,
    pub namespace: Option<NamespaceId>,
    /// Absent only for the root
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub attributes: Vec<AttributeId>,
    pub texts: Vec<TextId>,
    /// Bindings declared directly on this element
    pub declared_namespaces: Vec<NamespaceId>,
}

/// Name/value pair on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNode {
    pub local_name: Symbol,
    pub namespace: Option<NamespaceId>,
    pub value: String,
    pub owner: Option<ElementId>,
}

/// Prefix to URI declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceNode {
    /// Empty symbol for the default namespace
    pub prefix: Symbol,
    pub uri: Symbol,
    pub declared_by: Option<ElementId>,
}

impl NamespaceNode {
    pub fn is_default(&self) -> bool {
        self.prefix == Symbol::EMPTY
    }
}

/// Literal content between tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub kind: TextKind,
    pub value: String,
    pub owner: Option<ElementId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(ElementId(3).to_string(), "element#3");
        assert_eq!(NamespaceId(0).to_string(), "namespace#0");
        assert_eq!(TextId(7).index(), 7);
    }
}
