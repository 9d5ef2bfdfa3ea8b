//! Cross-reference interning
//!
//! Maps the opaque textual identifiers of the record stream (`I12`, `F3`) to
//! small sequential ids. The first mention of an xref allocates, whether it is
//! the record's own declaration or a forward reference from another record;
//! every later mention resolves to the same id.
//!
//! Individuals and families use separate tables, so ids are only unique
//! within one table.

use std::collections::HashMap;
use std::fmt;

/// An id that can be allocated by an [`XrefTable`].
///
/// Ids are 1-based; `index` is the 0-based slot used by the graph arena.
pub trait RecordId: Copy + Eq + fmt::Debug {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interned<Id> {
    pub id: Id,
    /// True when this call allocated the id.
    pub fresh: bool,
}

/// Bounded xref-to-id table.
#[derive(Debug, Clone)]
pub struct XrefTable<Id> {
    ids: HashMap<String, Id>,
    xrefs: Vec<String>,
    capacity: usize,
}

impl<Id: RecordId> XrefTable<Id> {
    /// Create an empty table that can hold `capacity` distinct xrefs.
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: HashMap::new(),
            xrefs: Vec::new(),
            capacity,
        }
    }

    /// Resolve `xref`, allocating the next id on first use.
    ///
    /// Returns `None` once capacity is exhausted and `xref` is not already
    /// known. Known xrefs keep resolving after the table is full.
    pub fn resolve(&mut self, xref: &str) -> Option<Interned<Id>> {
        if let Some(&id) = self.ids.get(xref) {
            return Some(Interned { id, fresh: false });
        }

        if self.xrefs.len() >= self.capacity {
            return None;
        }

        let id = Id::from_index(self.xrefs.len());
        self.xrefs.push(xref.to_string());
        self.ids.insert(xref.to_string(), id);
        Some(Interned { id, fresh: true })
    }

    /// Look up an xref without allocating.
    pub fn get(&self, xref: &str) -> Option<Id> {
        self.ids.get(xref).copied()
    }

    /// The xref an id was allocated for.
    pub fn xref(&self, id: Id) -> Option<&str> {
        self.xrefs.get(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.xrefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xrefs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
