//! The segment collaborator buffered deletes are applied to.

use std::collections::BTreeSet;

use ahash::AHashMap;

use crate::error::{Result, SegdelError};
use crate::index::DocId;
use crate::index::term::Term;

/// A segment that can look up postings and mark documents deleted.
///
/// Implemented by the segment/reader layer; this crate only consumes it.
pub trait DeletableSegment {
    /// The segment name, for diagnostics.
    fn name(&self) -> &str;

    /// Number of document ordinals in the segment, deleted or not.
    fn max_doc(&self) -> DocId;

    /// Local ordinals of the documents containing `term`, ascending.
    fn term_docs(&self, term: &Term) -> Result<Vec<DocId>>;

    /// Mark a local document ordinal deleted.
    fn delete_document(&mut self, doc: DocId) -> Result<()>;
}

/// A segment held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySegment {
    name: String,
    postings: AHashMap<Term, Vec<DocId>>,
    max_doc: DocId,
    deleted: BTreeSet<DocId>,
}

impl MemorySegment {
    /// Create an empty segment.
    pub fn new<S: Into<String>>(name: S) -> Self {
        MemorySegment {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a document holding `terms`, returning its local ordinal.
    pub fn add_document<I>(&mut self, terms: I) -> DocId
    where
        I: IntoIterator<Item = Term>,
    {
        let doc = self.max_doc;
        for term in terms {
            let docs = self.postings.entry(term).or_default();
            if docs.last() != Some(&doc) {
                docs.push(doc);
            }
        }
        self.max_doc += 1;
        doc
    }

    /// Check whether a local ordinal is deleted.
    pub fn is_deleted(&self, doc: DocId) -> bool {
        self.deleted.contains(&doc)
    }

    /// Local ordinals marked deleted, ascending.
    pub fn deleted_docs(&self) -> Vec<DocId> {
        self.deleted.iter().copied().collect()
    }

    /// Number of live documents.
    pub fn num_docs(&self) -> DocId {
        self.max_doc - self.deleted.len() as DocId
    }
}

impl DeletableSegment for MemorySegment {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_doc(&self) -> DocId {
        self.max_doc
    }

    fn term_docs(&self, term: &Term) -> Result<Vec<DocId>> {
        Ok(self.postings.get(term).cloned().unwrap_or_default())
    }

    fn delete_document(&mut self, doc: DocId) -> Result<()> {
        if doc < 0 || doc >= self.max_doc {
            return Err(SegdelError::index(format!(
                "Document ID {doc} out of range for segment {}",
                self.name
            )));
        }
        self.deleted.insert(doc);
        Ok(())
    }
}
