//! Namespace Scope Tracking
//!
//! Live prefix -> binding map with one frame per open element. A frame
//! remembers what each prefix it (re)bound was mapped to before, so closing
//! the element restores the enclosing bindings exactly.

use crate::error::StructuralError;
use crate::graph::NamespaceId;
use crate::reader::QName;
use std::collections::HashMap;

/// Prefix that is bound implicitly and never declared
pub const XML_PREFIX: &str = "xml";

/// Bindings introduced by one open element
#[derive(Debug)]
struct Frame {
    owner: QName,
    /// (prefix, binding it shadowed) in bind order
    shadowed: Vec<(String, Option<NamespaceId>)>,
}

/// Stack-scoped namespace resolver
#[derive(Debug, Default)]
pub struct NamespaceScope {
    bindings: HashMap<String, NamespaceId>,
    frames: Vec<Frame>,
}

impl NamespaceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame for an element
    pub fn enter(&mut self, owner: QName) {
        self.frames.push(Frame {
            owner,
            shadowed: Vec::new(),
        });
    }

    /// Bind `prefix` until the innermost open element closes. The default
    /// namespace uses the empty prefix.
    pub fn bind(&mut self, prefix: &str, namespace: NamespaceId) {
        let previous = self.bindings.insert(prefix.to_string(), namespace);
        // bindings made outside any element stay for the whole scan
        if let Some(frame) = self.frames.last_mut() {
            frame.shadowed.push((prefix.to_string(), previous));
        }
    }

    /// Remove the most recent binding of `prefix` made by the innermost
    /// frame, restoring whatever it shadowed
    pub fn unbind(&mut self, prefix: &str) {
        let Some(frame) = self.frames.last_mut() else {
            self.bindings.remove(prefix);
            return;
        };
        let Some(pos) = frame.shadowed.iter().rposition(|(p, _)| p == prefix) else {
            return;
        };
        let (prefix, previous) = frame.shadowed.remove(pos);
        restore(&mut self.bindings, prefix, previous);
    }

    /// Binding currently in force for `prefix`
    pub fn resolve(&self, prefix: &str) -> Option<NamespaceId> {
        self.bindings.get(prefix).copied()
    }

    /// Close the innermost frame, which must belong to `closing`
    pub fn leave(&mut self, closing: &QName) -> Result<(), StructuralError> {
        let Some(frame) = self.frames.last() else {
            return Err(StructuralError::UnexpectedEnd { name: closing.clone() });
        };
        if frame.owner != *closing {
            return Err(StructuralError::MismatchedEnd {
                expected: frame.owner.clone(),
                found: closing.clone(),
            });
        }
        if let Some(frame) = self.frames.pop() {
            for (prefix, previous) in frame.shadowed.into_iter().rev() {
                restore(&mut self.bindings, prefix, previous);
            }
        }
        Ok(())
    }

    /// Resolve the namespace of an element or attribute name.
    ///
    /// Unprefixed names have no namespace reference; the default namespace is
    /// tracked but not applied. The reserved `xml` prefix resolves to none.
    pub fn resolve_name(&self, name: &QName) -> Result<Option<NamespaceId>, StructuralError> {
        match name.prefix() {
            None => Ok(None),
            Some(prefix) => match self.resolve(prefix) {
                Some(ns) => Ok(Some(ns)),
                None if prefix == XML_PREFIX => Ok(None),
                None => Err(StructuralError::UndeclaredPrefix {
                    prefix: prefix.to_string(),
                    name: name.clone(),
                }),
            },
        }
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Name of the innermost open element
    pub fn innermost(&self) -> Option<&QName> {
        self.frames.last().map(|f| &f.owner)
    }
}

fn restore(bindings: &mut HashMap<String, NamespaceId>, prefix: String, previous: Option<NamespaceId>) {
    match previous {
        Some(ns) => {
            bindings.insert(prefix, ns);
        }
        None => {
            bindings.remove(&prefix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> QName {
        QName::parse(s)
    }

    #[test]
    fn test_bind_and_resolve() {
        let mut scope = NamespaceScope::new();
        scope.enter(name("a"));
        scope.bind("p", NamespaceId(0));
        assert_eq!(scope.resolve("p"), Some(NamespaceId(0)));
        assert_eq!(scope.resolve("q"), None);
        scope.leave(&name("a")).unwrap();
        assert_eq!(scope.resolve("p"), None);
    }

    #[test]
    fn test_redeclaration_shadows_and_restores() {
        let mut scope = NamespaceScope::new();
        scope.enter(name("outer"));
        scope.bind("p", NamespaceId(0));
        scope.enter(name("inner"));
        scope.bind("p", NamespaceId(1));
        assert_eq!(scope.resolve("p"), Some(NamespaceId(1)));
        scope.leave(&name("inner")).unwrap();
        assert_eq!(scope.resolve("p"), Some(NamespaceId(0)));
    }

    #[test]
    fn test_unbind_restores_shadowed() {
        let mut scope = NamespaceScope::new();
        scope.enter(name("a"));
        scope.bind("p", NamespaceId(0));
        scope.enter(name("b"));
        scope.bind("p", NamespaceId(1));
        scope.unbind("p");
        assert_eq!(scope.resolve("p"), Some(NamespaceId(0)));
        scope.leave(&name("b")).unwrap();
        assert_eq!(scope.resolve("p"), Some(NamespaceId(0)));
    }

    #[test]
    fn test_leave_without_open_element() {
        let mut scope = NamespaceScope::new();
        assert_eq!(
            scope.leave(&name("a")),
            Err(StructuralError::UnexpectedEnd { name: name("a") })
        );
    }

    #[test]
    fn test_mismatched_leave_keeps_frame() {
        let mut scope = NamespaceScope::new();
        scope.enter(name("a"));
        scope.enter(name("b"));
        let err = scope.leave(&name("a")).unwrap_err();
        assert_eq!(
            err,
            StructuralError::MismatchedEnd {
                expected: name("b"),
                found: name("a"),
            }
        );
        assert_eq!(scope.depth(), 2);
        assert_eq!(scope.innermost(), Some(&name("b")));
    }

    #[test]
    fn test_resolve_name() {
        let mut scope = NamespaceScope::new();
        scope.enter(name("a"));
        scope.bind("", NamespaceId(0));
        scope.bind("p", NamespaceId(1));
        assert_eq!(scope.resolve_name(&name("x")), Ok(None));
        assert_eq!(scope.resolve_name(&name("p:x")), Ok(Some(NamespaceId(1))));
        assert_eq!(scope.resolve_name(&name("xml:lang")), Ok(None));
        assert!(matches!(
            scope.resolve_name(&name("q:x")),
            Err(StructuralError::UndeclaredPrefix { .. })
        ));
    }

    #[test]
    fn test_same_prefix_twice_on_one_element() {
        let mut scope = NamespaceScope::new();
        scope.enter(name("a"));
        scope.bind("p", NamespaceId(0));
        scope.bind("p", NamespaceId(1));
        assert_eq!(scope.resolve("p"), Some(NamespaceId(1)));
        scope.leave(&name("a")).unwrap();
        assert_eq!(scope.resolve("p"), None);
    }
}
