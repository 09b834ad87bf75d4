//! Event-driven graph construction
//!
//! - Scope: live namespace bindings per open element
//! - Builder: one graph operation per lexical event
//! - Assembler: drives a token source through the builder

pub mod assembler;
pub mod builder;
pub mod scope;

pub use assembler::DocumentAssembler;
pub use builder::{trim_xml_whitespace, BuildStats, GraphBuilder};
pub use scope::NamespaceScope;
