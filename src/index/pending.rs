//! Buffered deletes for one flush generation.
//!
//! Not internally synchronized: every mutator must run under the lock the
//! flush coordinator holds for this instance.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::slice;

use ahash::AHashMap;

use crate::index::config::{DeletesConfig, TermOrder};
use crate::index::query::QueryKey;
use crate::index::term::Term;
use crate::index::{DocId, Generation};

/// Delete-by-term map honoring a [`TermOrder`] policy.
#[derive(Debug, Clone)]
pub struct TermMap {
    entries: TermEntries,
}

#[derive(Debug, Clone)]
enum TermEntries {
    Insertion(InsertionTermMap),
    Sorted(BTreeMap<Term, Generation>),
}

// Entries are never removed individually, so slot indexes stay valid until
// the whole map is cleared.
#[derive(Debug, Clone, Default)]
struct InsertionTermMap {
    slots: AHashMap<Term, usize>,
    entries: Vec<(Term, Generation)>,
}

impl InsertionTermMap {
    fn get(&self, term: &Term) -> Option<Generation> {
        self.slots.get(term).map(|&slot| self.entries[slot].1)
    }

    fn insert(&mut self, term: Term, generation: Generation) -> Option<Generation> {
        match self.slots.get(&term) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, generation)),
            None => {
                self.slots.insert(term.clone(), self.entries.len());
                self.entries.push((term, generation));
                None
            }
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.entries.clear();
    }
}

impl TermMap {
    /// Create an empty map with the given ordering policy.
    pub fn new(order: TermOrder) -> Self {
        let entries = match order {
            TermOrder::Insertion => TermEntries::Insertion(InsertionTermMap::default()),
            TermOrder::Sorted => TermEntries::Sorted(BTreeMap::new()),
        };
        TermMap { entries }
    }

    /// Get the ordering policy.
    pub fn order(&self) -> TermOrder {
        match &self.entries {
            TermEntries::Insertion(_) => TermOrder::Insertion,
            TermEntries::Sorted(_) => TermOrder::Sorted,
        }
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        match &self.entries {
            TermEntries::Insertion(map) => map.entries.len(),
            TermEntries::Sorted(map) => map.len(),
        }
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the stored generation of a term.
    pub fn get(&self, term: &Term) -> Option<Generation> {
        match &self.entries {
            TermEntries::Insertion(map) => map.get(term),
            TermEntries::Sorted(map) => map.get(term).copied(),
        }
    }

    /// Store a generation, overwriting any previous value.
    pub fn insert(&mut self, term: Term, generation: Generation) -> Option<Generation> {
        match &mut self.entries {
            TermEntries::Insertion(map) => map.insert(term, generation),
            TermEntries::Sorted(map) => map.insert(term, generation),
        }
    }

    /// Remove every entry, keeping the ordering policy.
    pub fn clear(&mut self) {
        match &mut self.entries {
            TermEntries::Insertion(map) => map.clear(),
            TermEntries::Sorted(map) => map.clear(),
        }
    }

    /// Move every entry into `dest`, overwriting on conflict, and leave this
    /// map empty with its policy intact.
    pub(crate) fn drain_into(&mut self, dest: &mut TermMap) {
        match &mut self.entries {
            TermEntries::Insertion(map) => {
                map.slots.clear();
                for (term, generation) in map.entries.drain(..) {
                    dest.insert(term, generation);
                }
            }
            TermEntries::Sorted(map) => {
                for (term, generation) in std::mem::take(map) {
                    dest.insert(term, generation);
                }
            }
        }
    }

    /// Iterate over `(term, generation)` pairs in policy order.
    pub fn iter(&self) -> TermMapIter<'_> {
        let inner = match &self.entries {
            TermEntries::Insertion(map) => TermIterInner::Insertion(map.entries.iter()),
            TermEntries::Sorted(map) => TermIterInner::Sorted(map.iter()),
        };
        TermMapIter { inner }
    }
}

/// Iterator over a [`TermMap`], created by [`TermMap::iter`].
pub struct TermMapIter<'a> {
    inner: TermIterInner<'a>,
}

enum TermIterInner<'a> {
    Insertion(slice::Iter<'a, (Term, Generation)>),
    Sorted(btree_map::Iter<'a, Term, Generation>),
}

impl<'a> Iterator for TermMapIter<'a> {
    type Item = (&'a Term, Generation);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            TermIterInner::Insertion(iter) => iter.next().map(|(term, generation)| (term, *generation)),
            TermIterInner::Sorted(iter) => iter.next().map(|(term, generation)| (term, *generation)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            TermIterInner::Insertion(iter) => iter.size_hint(),
            TermIterInner::Sorted(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for TermMapIter<'_> {}

/// Deletes buffered against one generation, by term, by query and by
/// document ordinal.
#[derive(Debug, Clone)]
pub struct PendingDeletes {
    /// Term -> highest generation recorded for it.
    pub(crate) terms: TermMap,

    /// Query -> generation of the last recording.
    pub(crate) queries: AHashMap<QueryKey, Generation>,

    /// Document ordinals, in insertion order, duplicates kept.
    pub(crate) doc_ids: Vec<DocId>,

    /// Every delete-by-term call, including ones re-targeting a term.
    pub(crate) num_term_deletes: u64,

    /// Caller-maintained RAM estimate.
    pub(crate) bytes_used: i64,
}

impl Default for PendingDeletes {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingDeletes {
    /// Create an empty instance iterating terms in insertion order.
    pub fn new() -> Self {
        Self::with_term_order(TermOrder::Insertion)
    }

    /// Create an empty instance with the given term ordering policy.
    pub fn with_term_order(order: TermOrder) -> Self {
        PendingDeletes {
            terms: TermMap::new(order),
            queries: AHashMap::new(),
            doc_ids: Vec::new(),
            num_term_deletes: 0,
            bytes_used: 0,
        }
    }

    /// Create an empty instance following the configured term order.
    pub fn from_config(config: &DeletesConfig) -> Self {
        Self::with_term_order(config.term_order)
    }

    /// Buffer a delete of every document matching `term` below `generation`.
    ///
    /// The stored generation only ever grows: a later call carrying a lower
    /// generation leaves it unchanged. The call is counted either way.
    pub fn delete_by_term(&mut self, term: Term, generation: Generation) {
        match self.terms.get(&term) {
            Some(current) if current >= generation => {}
            _ => {
                self.terms.insert(term, generation);
            }
        }
        self.num_term_deletes += 1;
    }

    /// Buffer a delete of every document matching `query` below `generation`.
    ///
    /// Last write wins, even when the new generation is lower.
    pub fn delete_by_query(&mut self, query: impl Into<QueryKey>, generation: Generation) {
        self.queries.insert(query.into(), generation);
    }

    /// Buffer a delete of one document ordinal. Duplicates are kept.
    pub fn delete_by_doc_id(&mut self, doc_id: DocId) {
        self.doc_ids.push(doc_id);
    }

    /// Flush-threshold signal: term delete calls plus queries plus docIDs.
    pub fn size(&self) -> usize {
        self.num_term_deletes as usize + self.queries.len() + self.doc_ids.len()
    }

    /// Check whether anything is buffered.
    pub fn any(&self) -> bool {
        !self.terms.is_empty() || !self.queries.is_empty() || !self.doc_ids.is_empty()
    }

    /// Adjust the RAM estimate. Negative deltas are allowed.
    pub fn add_bytes_used(&mut self, delta: i64) {
        self.bytes_used += delta;
    }

    /// Get the RAM estimate.
    pub fn bytes_used(&self) -> i64 {
        self.bytes_used
    }

    /// Number of delete-by-term calls since the last clear.
    pub fn num_term_deletes(&self) -> u64 {
        self.num_term_deletes
    }

    /// Get the term ordering policy.
    pub fn term_order(&self) -> TermOrder {
        self.terms.order()
    }

    /// Get the buffered term deletes.
    pub fn terms(&self) -> &TermMap {
        &self.terms
    }

    /// Get the generation stored for a term.
    pub fn term_generation(&self, term: &Term) -> Option<Generation> {
        self.terms.get(term)
    }

    /// Get the buffered query deletes.
    pub fn queries(&self) -> &AHashMap<QueryKey, Generation> {
        &self.queries
    }

    /// Get the generation stored for a query.
    pub fn query_generation(&self, query: &QueryKey) -> Option<Generation> {
        self.queries.get(query).copied()
    }

    /// Get the buffered document ordinals.
    pub fn doc_ids(&self) -> &[DocId] {
        &self.doc_ids
    }

    /// Empty every collection and reset both counters.
    ///
    /// The instance keeps its allocations and term ordering policy.
    pub fn clear(&mut self) {
        self.terms.clear();
        self.queries.clear();
        self.doc_ids.clear();
        self.num_term_deletes = 0;
        self.bytes_used = 0;
    }
}
