//! Graph Builder
//!
//! Turns one lexical event at a time into graph nodes, resolving names
//! through the [`NamespaceScope`] and linking each node under the current
//! open element.

use super::scope::NamespaceScope;
use crate::error::{StepError, StructuralError};
use crate::graph::{DocumentId, ElementId, GraphStore, TextId, TextKind};
use crate::reader::{EndElement, StartElement};
use tracing::trace;

/// Counts of nodes created during one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub elements: usize,
    pub attributes: usize,
    pub namespaces: usize,
    pub texts: usize,
}

/// Event-to-node translation for one document
pub struct GraphBuilder<G: GraphStore> {
    store: G,
    scope: NamespaceScope,
    document: Option<DocumentId>,
    has_root: bool,
    trim_cdata: bool,
    stats: BuildStats,
}

impl<G: GraphStore> GraphBuilder<G> {
    pub fn new(store: G) -> Self {
        GraphBuilder {
            store,
            scope: NamespaceScope::new(),
            document: None,
            has_root: false,
            trim_cdata: true,
            stats: BuildStats::default(),
        }
    }

    /// Keep CDATA content verbatim instead of trimming it
    pub fn trim_cdata(mut self, trim: bool) -> Self {
        self.trim_cdata = trim;
        self
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn scope(&self) -> &NamespaceScope {
        &self.scope
    }

    pub fn into_store(self) -> G {
        self.store
    }

    /// Create the Document node with the declaration values copied verbatim
    pub fn on_document_start(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: bool,
    ) -> Result<DocumentId, StepError> {
        if self.document.is_some() {
            return Err(StructuralError::DuplicateDocumentStart.into());
        }
        let document = self.store.create_document(version, encoding, standalone)?;
        self.document = Some(document);
        Ok(document)
    }

    /// Create an element with its namespace bindings and attributes and link
    /// it under `parent`, or as the root when there is none. Returns the new
    /// cursor.
    pub fn on_element_start(
        &mut self,
        start: &StartElement,
        parent: Option<ElementId>,
    ) -> Result<ElementId, StepError> {
        let Some(document) = self.document else {
            return Err(StructuralError::MissingDocumentStart {
                name: start.name.clone(),
            }
            .into());
        };
        if parent.is_none() && self.has_root {
            return Err(StructuralError::MultipleRoots {
                name: start.name.clone(),
            }
            .into());
        }

        // declarations on this tag are in force for its own name
        self.scope.enter(start.name.clone());
        let mut declared = Vec::with_capacity(start.namespaces.len());
        for decl in &start.namespaces {
            let namespace = self.store.create_namespace(&decl.prefix, &decl.uri)?;
            self.scope.bind(&decl.prefix, namespace);
            declared.push(namespace);
        }

        let namespace = self.scope.resolve_name(&start.name)?;
        let element = self.store.create_element(&start.name.local_name, namespace)?;
        for &ns in &declared {
            self.store.declare_namespace(element, ns)?;
        }

        for attr in &start.attributes {
            let namespace = self.scope.resolve_name(&attr.name)?;
            let attribute = self.store.create_attribute(&attr.name.local_name, namespace, &attr.value)?;
            self.store.append_attribute(element, attribute)?;
        }

        match parent {
            Some(parent) => self.store.append_child(parent, element)?,
            None => {
                self.store.set_root(document, element)?;
                self.has_root = true;
            }
        }

        self.stats.elements += 1;
        self.stats.namespaces += declared.len();
        self.stats.attributes += start.attributes.len();
        trace!(%element, name = %start.name, depth = self.scope.depth(), "element created");
        Ok(element)
    }

    /// Close `current`, dropping the bindings it declared. Returns the parent
    /// as the new cursor.
    pub fn on_element_end(
        &mut self,
        current: Option<ElementId>,
        end: &EndElement,
    ) -> Result<Option<ElementId>, StepError> {
        self.scope.leave(&end.name)?;
        let Some(current) = current else {
            return Err(StructuralError::UnexpectedEnd { name: end.name.clone() }.into());
        };
        Ok(self.store.parent(current)?)
    }

    /// Attach character data to the current element. Whitespace-only content
    /// produces nothing.
    pub fn on_character_data(
        &mut self,
        raw: &str,
        kind: TextKind,
        current: Option<ElementId>,
    ) -> Result<Option<TextId>, StepError> {
        let value = match kind {
            TextKind::CData if !self.trim_cdata => raw,
            _ => trim_xml_whitespace(raw),
        };
        if value.is_empty() {
            return Ok(None);
        }
        let Some(element) = current else {
            return Err(StructuralError::TextOutsideRoot.into());
        };

        let text = self.store.create_text(kind, value)?;
        self.store.append_text(element, text)?;
        self.stats.texts += 1;
        Ok(Some(text))
    }

    /// Check that the stream ended on a complete document
    pub fn finish(&self) -> Result<DocumentId, StepError> {
        if let Some(open) = self.scope.innermost() {
            return Err(StructuralError::UnclosedElement { name: open.clone() }.into());
        }
        self.document.ok_or_else(|| StructuralError::MissingDocument.into())
    }
}

/// Trim XML whitespace (space, tab, CR, LF) from both ends
pub fn trim_xml_whitespace(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
