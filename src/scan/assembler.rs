//! Document Assembler
//!
//! Drives a token source to exhaustion, feeding each event to the
//! [`GraphBuilder`] and keeping the single open-element cursor. The first
//! failure aborts the pass.

use super::builder::{BuildStats, GraphBuilder};
use crate::error::{ScanError, StepError};
use crate::graph::{DocumentId, ElementId, GraphStore, TextKind};
use crate::reader::{TokenSource, XmlEvent};
use tracing::{debug, trace};

/// Single-pass conversion of one document
pub struct DocumentAssembler<S: TokenSource, G: GraphStore> {
    source: S,
    builder: GraphBuilder<G>,
    cursor: Option<ElementId>,
}

impl<S: TokenSource, G: GraphStore> DocumentAssembler<S, G> {
    pub fn new(source: S, store: G) -> Self {
        DocumentAssembler {
            source,
            builder: GraphBuilder::new(store),
            cursor: None,
        }
    }

    pub fn trim_cdata(mut self, trim: bool) -> Self {
        self.builder = self.builder.trim_cdata(trim);
        self
    }

    pub fn stats(&self) -> BuildStats {
        self.builder.stats()
    }

    /// Run the pass; on failure the error names the source's resource
    pub fn run(&mut self) -> Result<DocumentId, ScanError> {
        self.drive().map_err(|err| err.with_resource(self.source.resource()))
    }

    /// Run the pass and hand the store back
    pub fn finish(mut self) -> (Result<DocumentId, ScanError>, G) {
        let result = self.run();
        (result, self.builder.into_store())
    }

    fn drive(&mut self) -> Result<DocumentId, StepError> {
        while let Some(event) = self.source.next_event()? {
            self.dispatch(event)?;
        }
        let document = self.builder.finish()?;
        let stats = self.builder.stats();
        debug!(
            resource = self.source.resource(),
            %document,
            elements = stats.elements,
            attributes = stats.attributes,
            namespaces = stats.namespaces,
            texts = stats.texts,
            "document assembled"
        );
        Ok(document)
    }

    fn dispatch(&mut self, event: XmlEvent) -> Result<(), StepError> {
        trace!(?event, cursor = ?self.cursor, "event");
        match event {
            XmlEvent::StartDocument {
                version,
                encoding,
                standalone,
            } => {
                let document =
                    self.builder
                        .on_document_start(version.as_deref(), encoding.as_deref(), standalone)?;
                debug!(
                    resource = self.source.resource(),
                    %document,
                    version = version.as_deref(),
                    encoding = encoding.as_deref(),
                    standalone,
                    "document started"
                );
            }
            XmlEvent::StartElement(start) => {
                self.cursor = Some(self.builder.on_element_start(&start, self.cursor)?);
            }
            XmlEvent::EndElement(end) => {
                self.cursor = self.builder.on_element_end(self.cursor, &end)?;
            }
            XmlEvent::Text(text) => {
                self.builder.on_character_data(&text, TextKind::Characters, self.cursor)?;
            }
            XmlEvent::CData(text) => {
                self.builder.on_character_data(&text, TextKind::CData, self.cursor)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralError;
    use crate::graph::MemoryGraph;
    use crate::reader::{EventList, QName, StartElement};

    fn start_document() -> XmlEvent {
        XmlEvent::StartDocument {
            version: None,
            encoding: None,
            standalone: false,
        }
    }

    fn assemble(events: Vec<XmlEvent>) -> (Result<DocumentId, ScanError>, MemoryGraph) {
        DocumentAssembler::new(EventList::new(events).with_resource("test.xml"), MemoryGraph::new()).finish()
    }

    fn structural(result: Result<DocumentId, ScanError>) -> StructuralError {
        match result {
            Err(ScanError::Structural { resource, source }) => {
                assert_eq!(resource, "test.xml");
                source
            }
            other => panic!("expected a structural error, got {:?}", other),
        }
    }

    #[test]
    fn test_document_without_elements() {
        let (result, graph) = assemble(vec![start_document()]);
        let doc = result.unwrap();
        assert_eq!(graph.root(doc), None);
    }

    #[test]
    fn test_cursor_follows_nesting() {
        let (result, graph) = assemble(vec![
            start_document(),
            XmlEvent::start_element("a"),
            XmlEvent::start_element("b"),
            XmlEvent::end_element("b"),
            XmlEvent::start_element("c"),
            XmlEvent::Text("in c".into()),
            XmlEvent::end_element("c"),
            XmlEvent::Text("in a".into()),
            XmlEvent::end_element("a"),
        ]);
        let a = graph.root(result.unwrap()).unwrap();
        assert_eq!(graph.children(a).len(), 2);
        let c = graph.child_named(a, "c").unwrap();
        assert_eq!(graph.text_values(c), vec!["in c"]);
        assert_eq!(graph.text_values(a), vec!["in a"]);
    }

    #[test]
    fn test_end_without_open_element() {
        let (result, _) = assemble(vec![start_document(), XmlEvent::end_element("a")]);
        assert_eq!(
            structural(result),
            StructuralError::UnexpectedEnd {
                name: QName::parse("a")
            }
        );
    }

    #[test]
    fn test_mismatched_end() {
        let (result, _) = assemble(vec![
            start_document(),
            XmlEvent::start_element("a"),
            XmlEvent::start_element("b"),
            XmlEvent::end_element("a"),
        ]);
        assert!(matches!(structural(result), StructuralError::MismatchedEnd { .. }));
    }

    #[test]
    fn test_stream_ends_inside_element() {
        let (result, _) = assemble(vec![start_document(), XmlEvent::start_element("a")]);
        assert!(matches!(structural(result), StructuralError::UnclosedElement { .. }));
    }

    #[test]
    fn test_empty_stream() {
        let (result, _) = assemble(Vec::new());
        assert_eq!(structural(result), StructuralError::MissingDocument);
    }

    #[test]
    fn test_duplicate_document_start() {
        let (result, _) = assemble(vec![start_document(), start_document()]);
        assert_eq!(structural(result), StructuralError::DuplicateDocumentStart);
    }

    #[test]
    fn test_prefix_out_of_scope_after_close() {
        let (result, _) = assemble(vec![
            start_document(),
            XmlEvent::start_element("r"),
            XmlEvent::StartElement(StartElement::new(QName::parse("p:a")).with_namespace("p", "urn:x")),
            XmlEvent::end_element("p:a"),
            XmlEvent::start_element("p:b"),
        ]);
        assert!(matches!(structural(result), StructuralError::UndeclaredPrefix { .. }));
    }

    #[test]
    fn test_stats() {
        let mut assembler = DocumentAssembler::new(
            EventList::new(vec![
                start_document(),
                XmlEvent::StartElement(
                    StartElement::new(QName::parse("a"))
                        .with_namespace("p", "urn:x")
                        .with_attribute(QName::parse("p:k"), "v"),
                ),
                XmlEvent::CData("data".into()),
                XmlEvent::end_element("a"),
            ]),
            MemoryGraph::new(),
        );
        assembler.run().unwrap();
        assert_eq!(
            assembler.stats(),
            BuildStats {
                elements: 1,
                attributes: 1,
                namespaces: 1,
                texts: 1,
            }
        );
    }
}
