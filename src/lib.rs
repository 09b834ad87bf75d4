//! xmlgraph - single-pass XML to typed graph conversion
//!
//! A document is read once, as a stream of lexical events, and turned into a
//! graph of elements, attributes, text and namespace bindings with every
//! prefix resolved against the bindings in scope where it is used.
//!
//! Layers:
//! - core: memchr-accelerated tokenizer (tags, text, CDATA, declarations)
//! - reader: token sources over slices and `Read` streams
//! - scan: namespace scope tracking, graph building, document assembly
//! - graph: store capability plus an in-memory arena implementation
//! - parallel: rayon batch scanning of independent files
//!
//! ```
//! use xmlgraph::{scan_bytes, MemoryGraph, ScanOptions};
//!
//! let mut graph = MemoryGraph::new();
//! let doc = scan_bytes(br#"<p:a xmlns:p="urn:x"><p:b/></p:a>"#, &mut graph, &ScanOptions::default()).unwrap();
//! let root = graph.root(doc).unwrap();
//! assert_eq!(graph.namespace_uri(root), Some("urn:x"));
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod graph;
pub mod parallel;
pub mod reader;
pub mod scan;

pub use config::ScanOptions;
pub use error::{ScanError, StreamError, StructuralError};
pub use graph::{DocumentId, ElementId, GraphStore, MemoryGraph, StoreError, TextKind};
pub use reader::{SliceReader, StreamReader, TokenSource, XmlEvent};
pub use scan::DocumentAssembler;

use error::StepError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::instrument;

/// Convert one document from `source` into `store` with default options
pub fn scan<S, G>(source: S, store: G) -> Result<DocumentId, ScanError>
where
    S: TokenSource,
    G: GraphStore,
{
    scan_with_options(source, store, &ScanOptions::default())
}

/// Convert one document from `source` into `store`
#[instrument(level = "debug", skip_all, fields(resource = source.resource()))]
pub fn scan_with_options<S, G>(source: S, store: G, options: &ScanOptions) -> Result<DocumentId, ScanError>
where
    S: TokenSource,
    G: GraphStore,
{
    DocumentAssembler::new(source, store).trim_cdata(options.trim_cdata).run()
}

/// Convert a document held in memory
pub fn scan_bytes<G: GraphStore>(input: &[u8], store: G, options: &ScanOptions) -> Result<DocumentId, ScanError> {
    scan_with_options(SliceReader::with_mode(input, options.strict), store, options)
}

/// Convert a document read from `reader` in `options.buffer_size` chunks
pub fn scan_reader<R: Read, G: GraphStore>(
    reader: R,
    resource: &str,
    store: G,
    options: &ScanOptions,
) -> Result<DocumentId, ScanError> {
    let source = StreamReader::with_capacity(reader, options.buffer_size, options.strict).with_resource(resource);
    scan_with_options(source, store, options)
}

/// Convert the document stored at `path`. The file is open only for the
/// duration of the call.
pub fn scan_file<G: GraphStore>(path: impl AsRef<Path>, store: G, options: &ScanOptions) -> Result<DocumentId, ScanError> {
    let path = path.as_ref();
    let resource = path.display().to_string();
    let file = File::open(path).map_err(|err| StepError::from(StreamError::from(err)).with_resource(&resource))?;
    scan_reader(file, &resource, store, options)
}
