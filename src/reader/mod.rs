//! XML Reader Module
//!
//! Pull-style token sources feeding the scanner:
//! - SliceReader: whole input held in memory
//! - StreamReader: chunked input from any `Read`, bounded buffering
//! - EventList: replay of an already built event sequence
//! - Events: owned, namespace-aware event types

pub mod buffered;
pub mod events;
pub mod slice;
mod translate;

pub use buffered::StreamReader;
pub use events::{Attribute, EndElement, NamespaceDecl, QName, StartElement, XmlEvent};
pub use slice::SliceReader;

use crate::error::StreamError;
use std::collections::VecDeque;

/// Resource name reported for sources that are not backed by a file
pub const MEMORY_RESOURCE: &str = "<memory>";

/// Pull interface over lexical events in document order.
///
/// A source must start with `StartDocument` and never seeks backward.
/// `Ok(None)` marks the end of the stream.
pub trait TokenSource {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, StreamError>;

    /// Identity of the underlying resource, for error reports
    fn resource(&self) -> &str {
        MEMORY_RESOURCE
    }
}

impl<S: TokenSource + ?Sized> TokenSource for &mut S {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, StreamError> {
        (**self).next_event()
    }

    fn resource(&self) -> &str {
        (**self).resource()
    }
}

/// Token source replaying a fixed list of events
#[derive(Debug, Clone, Default)]
pub struct EventList {
    events: VecDeque<XmlEvent>,
    resource: Option<String>,
}

impl EventList {
    pub fn new(events: impl IntoIterator<Item = XmlEvent>) -> Self {
        EventList {
            events: events.into_iter().collect(),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

impl TokenSource for EventList {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, StreamError> {
        Ok(self.events.pop_front())
    }

    fn resource(&self) -> &str {
        self.resource.as_deref().unwrap_or(MEMORY_RESOURCE)
    }
}
