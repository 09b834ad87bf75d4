//! In-memory graph store
//!
//! Arena-based storage: every node kind lives in its own `Vec`, handles are
//! indices into it, and names are interned in a shared [`StringPool`].
//! Several documents may be scanned into the same graph one after another.

use super::node::{
    AttributeId, AttributeNode, DocumentId, DocumentNode, ElementId, ElementNode, NamespaceId, NamespaceNode, TextId,
    TextKind, TextNode,
};
use super::store::{GraphStore, StoreError};
use super::strings::{StringPool, Symbol};

/// Arena-backed [`GraphStore`]
#[derive(Debug, Default)]
pub struct MemoryGraph {
    documents: Vec<DocumentNode>,
    elements: Vec<ElementNode>,
    attributes: Vec<AttributeNode>,
    namespaces: Vec<NamespaceNode>,
    texts: Vec<TextNode>,
    strings: StringPool,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, id: DocumentId) -> Option<&DocumentNode> {
        self.documents.get(id.index())
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementNode> {
        self.elements.get(id.index())
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&AttributeNode> {
        self.attributes.get(id.index())
    }

    pub fn namespace(&self, id: NamespaceId) -> Option<&NamespaceNode> {
        self.namespaces.get(id.index())
    }

    pub fn text(&self, id: TextId) -> Option<&TextNode> {
        self.texts.get(id.index())
    }

    /// Root element of a document
    pub fn root(&self, id: DocumentId) -> Option<ElementId> {
        self.document(id)?.root
    }

    /// Child elements in document order
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.element(id).map(|e| e.children.as_slice()).unwrap_or_default()
    }

    /// Attributes in the order they appeared on the tag
    pub fn attributes(&self, id: ElementId) -> &[AttributeId] {
        self.element(id).map(|e| e.attributes.as_slice()).unwrap_or_default()
    }

    /// Text nodes in document order
    pub fn texts(&self, id: ElementId) -> &[TextId] {
        self.element(id).map(|e| e.texts.as_slice()).unwrap_or_default()
    }

    /// Bindings declared directly on an element
    pub fn declared_namespaces(&self, id: ElementId) -> &[NamespaceId] {
        self.element(id).map(|e| e.declared_namespaces.as_slice()).unwrap_or_default()
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id)?.parent
    }

    /// Parent, grandparent, ... up to the root
    pub fn ancestors(&self, id: ElementId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.parent(id),
        }
    }

    /// Elements below `id` in document order (pre-order), excluding `id`
    pub fn descendants(&self, id: ElementId) -> Descendants<'_> {
        let mut stack: Vec<ElementId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { graph: self, stack }
    }

    /// Total number of nodes of all kinds
    pub fn node_count(&self) -> usize {
        self.documents.len() + self.elements.len() + self.attributes.len() + self.namespaces.len() + self.texts.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    /// Resolve an interned name
    pub fn str(&self, symbol: Symbol) -> &str {
        self.strings.resolve(symbol)
    }

    /// Local name of an element
    pub fn local_name(&self, id: ElementId) -> Option<&str> {
        self.element(id).map(|e| self.str(e.local_name))
    }

    pub fn attribute_name(&self, id: AttributeId) -> Option<&str> {
        self.attribute(id).map(|a| self.str(a.local_name))
    }

    pub fn prefix(&self, id: NamespaceId) -> Option<&str> {
        self.namespace(id).map(|n| self.str(n.prefix))
    }

    pub fn uri(&self, id: NamespaceId) -> Option<&str> {
        self.namespace(id).map(|n| self.str(n.uri))
    }

    /// Namespace URI of an element's resolved name
    pub fn namespace_uri(&self, id: ElementId) -> Option<&str> {
        self.uri(self.element(id)?.namespace?)
    }

    /// Value of the first attribute with the given local name
    pub fn attribute_value(&self, element: ElementId, local_name: &str) -> Option<&str> {
        let symbol = self.strings.get(local_name)?;
        self.attributes(element)
            .iter()
            .filter_map(|&id| self.attribute(id))
            .find(|a| a.local_name == symbol)
            .map(|a| a.value.as_str())
    }

    /// First child element with the given local name
    pub fn child_named(&self, element: ElementId, local_name: &str) -> Option<ElementId> {
        let symbol = self.strings.get(local_name)?;
        self.children(element)
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some_and(|e| e.local_name == symbol))
    }

    /// Values of an element's text nodes, in order
    pub fn text_values(&self, element: ElementId) -> Vec<&str> {
        self.texts(element)
            .iter()
            .filter_map(|&id| self.text(id))
            .map(|t| t.value.as_str())
            .collect()
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut ElementNode, StoreError> {
        self.elements.get_mut(id.index()).ok_or_else(|| StoreError::unknown(id))
    }

    fn next_id(len: usize) -> Result<u32, StoreError> {
        u32::try_from(len).map_err(|_| StoreError::new("graph is full"))
    }
}

impl GraphStore for MemoryGraph {
    fn create_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: bool,
    ) -> Result<DocumentId, StoreError> {
        let id = DocumentId(Self::next_id(self.documents.len())?);
        self.documents.push(DocumentNode {
            version: version.map(str::to_string),
            encoding: encoding.map(str::to_string),
            standalone,
            root: None,
        });
        Ok(id)
    }

    fn create_namespace(&mut self, prefix: &str, uri: &str) -> Result<NamespaceId, StoreError> {
        let id = NamespaceId(Self::next_id(self.namespaces.len())?);
        let node = NamespaceNode {
            prefix: self.strings.intern(prefix),
            uri: self.strings.intern(uri),
            declared_by: None,
        };
        self.namespaces.push(node);
        Ok(id)
    }

    fn create_element(&mut self, local_name: &str, namespace: Option<NamespaceId>) -> Result<ElementId, StoreError> {
        if let Some(ns) = namespace {
            self.namespace(ns).ok_or_else(|| StoreError::unknown(ns))?;
        }
        let id = ElementId(Self::next_id(self.elements.len())?);
        let node = ElementNode {
            local_name: self.strings.intern(local_name),
            namespace,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            texts: Vec::new(),
            declared_namespaces: Vec::new(),
        };
        self.elements.push(node);
        Ok(id)
    }

    fn create_attribute(
        &mut self,
        local_name: &str,
        namespace: Option<NamespaceId>,
        value: &str,
    ) -> Result<AttributeId, StoreError> {
        if let Some(ns) = namespace {
            self.namespace(ns).ok_or_else(|| StoreError::unknown(ns))?;
        }
        let id = AttributeId(Self::next_id(self.attributes.len())?);
        let node = AttributeNode {
            local_name: self.strings.intern(local_name),
            namespace,
            value: value.to_string(),
            owner: None,
        };
        self.attributes.push(node);
        Ok(id)
    }

    fn create_text(&mut self, kind: TextKind, value: &str) -> Result<TextId, StoreError> {
        let id = TextId(Self::next_id(self.texts.len())?);
        self.texts.push(TextNode {
            kind,
            value: value.to_string(),
            owner: None,
        });
        Ok(id)
    }

    fn set_root(&mut self, document: DocumentId, root: ElementId) -> Result<(), StoreError> {
        self.element(root).ok_or_else(|| StoreError::unknown(root))?;
        let doc = self
            .documents
            .get_mut(document.index())
            .ok_or_else(|| StoreError::unknown(document))?;
        if doc.root.is_some() {
            return Err(StoreError::new(format!("{} already has a root", document)));
        }
        doc.root = Some(root);
        Ok(())
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), StoreError> {
        if parent == child {
            return Err(StoreError::new(format!("{} cannot contain itself", child)));
        }
        self.element(parent).ok_or_else(|| StoreError::unknown(parent))?;
        let node = self.element_mut(child)?;
        if node.parent.is_some() {
            return Err(StoreError::new(format!("{} is already attached", child)));
        }
        node.parent = Some(parent);
        self.element_mut(parent)?.children.push(child);
        Ok(())
    }

    fn append_attribute(&mut self, element: ElementId, attribute: AttributeId) -> Result<(), StoreError> {
        let attr = self
            .attributes
            .get_mut(attribute.index())
            .ok_or_else(|| StoreError::unknown(attribute))?;
        if attr.owner.is_some() {
            return Err(StoreError::new(format!("{} is already attached", attribute)));
        }
        self.element_mut(element)?.attributes.push(attribute);
        self.attributes[attribute.index()].owner = Some(element);
        Ok(())
    }

    fn append_text(&mut self, element: ElementId, text: TextId) -> Result<(), StoreError> {
        let node = self.texts.get(text.index()).ok_or_else(|| StoreError::unknown(text))?;
        if node.owner.is_some() {
            return Err(StoreError::new(format!("{} is already attached", text)));
        }
        self.element_mut(element)?.texts.push(text);
        self.texts[text.index()].owner = Some(element);
        Ok(())
    }

    fn declare_namespace(&mut self, element: ElementId, namespace: NamespaceId) -> Result<(), StoreError> {
        let node = self
            .namespaces
            .get(namespace.index())
            .ok_or_else(|| StoreError::unknown(namespace))?;
        if node.declared_by.is_some() {
            return Err(StoreError::new(format!("{} is already declared", namespace)));
        }
        self.element_mut(element)?.declared_namespaces.push(namespace);
        self.namespaces[namespace.index()].declared_by = Some(element);
        Ok(())
    }

    fn parent(&self, element: ElementId) -> Result<Option<ElementId>, StoreError> {
        self.element(element)
            .map(|e| e.parent)
            .ok_or_else(|| StoreError::unknown(element))
    }
}

/// Iterator over the ancestors of an element
pub struct Ancestors<'g> {
    graph: &'g MemoryGraph,
    next: Option<ElementId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let current = self.next?;
        self.next = self.graph.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over the descendants of an element
pub struct Descendants<'g> {
    graph: &'g MemoryGraph,
    stack: Vec<ElementId>,
}

impl Iterator for Descendants<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let current = self.stack.pop()?;
        self.stack.extend(self.graph.children(current).iter().rev());
        Some(current)
    }
}
