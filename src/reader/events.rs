//! XML Event Types
//!
//! Owned, namespace-aware events delivered by a token source. Names are
//! split into prefix and local part; `xmlns` attributes are reported as
//! namespace declarations rather than attributes.

use std::fmt;

/// Lexical event in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Always the first event; carries the XML declaration if present
    StartDocument {
        version: Option<String>,
        encoding: Option<String>,
        standalone: bool,
    },
    StartElement(StartElement),
    /// Also emitted right after the start of an empty-element tag
    EndElement(EndElement),
    /// Character data with references decoded
    Text(String),
    /// CDATA section content, verbatim
    CData(String),
}

/// Element or attribute name as written: optional prefix plus local part
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local_name: String,
}

impl QName {
    pub fn new(prefix: Option<&str>, local_name: &str) -> Self {
        QName {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
        }
    }

    /// Split `prefix:local` at the first colon
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((prefix, local)) => QName::new(Some(prefix), local),
            None => QName::new(None, name),
        }
    }

    /// Prefix if present and non-empty
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix() {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// `xmlns` or `xmlns:prefix` declaration on a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Empty for the default namespace
    pub prefix: String,
    pub uri: String,
}

impl NamespaceDecl {
    pub fn new(prefix: &str, uri: &str) -> Self {
        NamespaceDecl {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.prefix.is_empty()
    }
}

/// Attribute other than a namespace declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// Start element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub name: QName,
    /// Declarations in the order they appear on the tag
    pub namespaces: Vec<NamespaceDecl>,
    /// Attributes in the order they appear on the tag
    pub attributes: Vec<Attribute>,
}

impl StartElement {
    pub fn new(name: QName) -> Self {
        StartElement {
            name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.namespaces.push(NamespaceDecl::new(prefix, uri));
        self
    }

    pub fn with_attribute(mut self, name: QName, value: &str) -> Self {
        self.attributes.push(Attribute {
            name,
            value: value.to_string(),
        });
        self
    }

    /// Get an attribute value by its name as written
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.to_string() == name)
            .map(|a| a.value.as_str())
    }
}

/// End element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: QName,
}

impl EndElement {
    pub fn new(name: QName) -> Self {
        EndElement { name }
    }
}

impl XmlEvent {
    pub fn start_element(name: &str) -> Self {
        XmlEvent::StartElement(StartElement::new(QName::parse(name)))
    }

    pub fn end_element(name: &str) -> Self {
        XmlEvent::EndElement(EndElement::new(QName::parse(name)))
    }

    pub fn as_start_element(&self) -> Option<&StartElement> {
        match self {
            XmlEvent::StartElement(e) => Some(e),
            _ => None,
        }
    }

    /// Text or CDATA content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlEvent::Text(t) | XmlEvent::CData(t) => Some(t),
            _ => None,
        }
    }
}
