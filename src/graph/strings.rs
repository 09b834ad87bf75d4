//! String Interning Pool
//!
//! Deduplicated storage for element and attribute names, namespace prefixes
//! and URIs, which repeat heavily across a document. Strings live in one
//! shared buffer; a hash index maps content to the symbols holding it.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Interned string handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Always the empty string
    pub const EMPTY: Symbol = Symbol(0);
}

/// String interning pool
///
/// Memory layout:
/// - `entries`: (offset, len) into `data` for each symbol
/// - `data`: concatenated string bytes
/// - `hash_index`: hash -> symbols with that hash (handles rare collisions)
#[derive(Debug)]
pub struct StringPool {
    entries: Vec<(u32, u32)>,
    data: String,
    hash_index: HashMap<u64, Vec<Symbol>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        StringPool {
            // Entry 0 is reserved for the empty string
            entries: vec![(0, 0)],
            data: String::with_capacity(1024),
            hash_index: HashMap::new(),
        }
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning the existing symbol if already present
    pub fn intern(&mut self, s: &str) -> Symbol {
        if s.is_empty() {
            return Symbol::EMPTY;
        }

        let hash = Self::compute_hash(s);
        if let Some(symbols) = self.hash_index.get(&hash) {
            for &symbol in symbols {
                if self.resolve(symbol) == s {
                    return symbol;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);
        let symbol = Symbol(self.entries.len() as u32);
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(symbol);
        symbol
    }

    /// Look up a string without interning it
    pub fn get(&self, s: &str) -> Option<Symbol> {
        if s.is_empty() {
            return Some(Symbol::EMPTY);
        }
        self.hash_index
            .get(&Self::compute_hash(s))?
            .iter()
            .copied()
            .find(|&symbol| self.resolve(symbol) == s)
    }

    /// String for a symbol; unknown symbols resolve to ""
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.entries
            .get(symbol.0 as usize)
            .and_then(|&(offset, len)| self.data.get(offset as usize..(offset + len) as usize))
            .unwrap_or("")
    }

    /// Number of distinct strings, including the empty string
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}
