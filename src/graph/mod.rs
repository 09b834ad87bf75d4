//! Typed document graph
//!
//! - Node: typed handles and node records
//! - Store: the create-and-attach capability the scanner writes through
//! - Memory: arena-backed store with read accessors
//! - Strings: interning pool for names and URIs

pub mod memory;
pub mod node;
pub mod store;
pub mod strings;

pub use memory::MemoryGraph;
pub use node::{
    AttributeId, AttributeNode, DocumentId, DocumentNode, ElementId, ElementNode, NamespaceId, NamespaceNode, TextId,
    TextKind, TextNode,
};
pub use store::{GraphStore, StoreError};
pub use strings::{StringPool, Symbol};
