//! Graph store capability
//!
//! The scanner only creates nodes and appends relationships; it never
//! deletes or updates. Implementations decide how (and whether) the calls are
//! persisted, but must keep their order within one scan.

use super::node::{AttributeId, DocumentId, ElementId, NamespaceId, TextId, TextKind};
use thiserror::Error;

/// Failure raised by a graph store
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// A handle that does not name a node of this store
    pub fn unknown(handle: impl std::fmt::Display) -> Self {
        StoreError::new(format!("unknown node {}", handle))
    }
}

/// Create-and-attach capability consumed by the scanner
pub trait GraphStore {
    fn create_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: bool,
    ) -> Result<DocumentId, StoreError>;

    fn create_namespace(&mut self, prefix: &str, uri: &str) -> Result<NamespaceId, StoreError>;

    fn create_element(&mut self, local_name: &str, namespace: Option<NamespaceId>) -> Result<ElementId, StoreError>;

    fn create_attribute(
        &mut self,
        local_name: &str,
        namespace: Option<NamespaceId>,
        value: &str,
    ) -> Result<AttributeId, StoreError>;

    fn create_text(&mut self, kind: TextKind, value: &str) -> Result<TextId, StoreError>;

    fn set_root(&mut self, document: DocumentId, root: ElementId) -> Result<(), StoreError>;

    /// Append `child` to `parent`'s child sequence and record the back-reference
    fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), StoreError>;

    fn append_attribute(&mut self, element: ElementId, attribute: AttributeId) -> Result<(), StoreError>;

    fn append_text(&mut self, element: ElementId, text: TextId) -> Result<(), StoreError>;

    fn declare_namespace(&mut self, element: ElementId, namespace: NamespaceId) -> Result<(), StoreError>;

    /// Parent of an element; `None` for the root or a detached element
    fn parent(&self, element: ElementId) -> Result<Option<ElementId>, StoreError>;
}

impl<G: GraphStore + ?Sized> GraphStore for &mut G {
    fn create_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: bool,
    ) -> Result<DocumentId, StoreError> {
        (**self).create_document(version, encoding, standalone)
    }

    fn create_namespace(&mut self, prefix: &str, uri: &str) -> Result<NamespaceId, StoreError> {
        (**self).create_namespace(prefix, uri)
    }

    fn create_element(&mut self, local_name: &str, namespace: Option<NamespaceId>) -> Result<ElementId, StoreError> {
        (**self).create_element(local_name, namespace)
    }

    fn create_attribute(
        &mut self,
        local_name: &str,
        namespace: Option<NamespaceId>,
        value: &str,
    ) -> Result<AttributeId, StoreError> {
        (**self).create_attribute(local_name, namespace, value)
    }

    fn create_text(&mut self, kind: TextKind, value: &str) -> Result<TextId, StoreError> {
        (**self).create_text(kind, value)
    }

    fn set_root(&mut self, document: DocumentId, root: ElementId) -> Result<(), StoreError> {
        (**self).set_root(document, root)
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), StoreError> {
        (**self).append_child(parent, child)
    }

    fn append_attribute(&mut self, element: ElementId, attribute: AttributeId) -> Result<(), StoreError> {
        (**self).append_attribute(element, attribute)
    }

    fn append_text(&mut self, element: ElementId, text: TextId) -> Result<(), StoreError> {
        (**self).append_text(element, text)
    }

    fn declare_namespace(&mut self, element: ElementId, namespace: NamespaceId) -> Result<(), StoreError> {
        (**self).declare_namespace(element, namespace)
    }

    fn parent(&self, element: ElementId) -> Result<Option<ElementId>, StoreError> {
        (**self).parent(element)
    }
}
