//! Flush-side bookkeeping of buffered deletes.
//!
//! Writers buffer deletes into the in-RAM generation. When a segment is
//! flushed, those deletes are pushed into the flushed generation, which is
//! applied to the on-disk segments later. Both generations are remapped
//! whenever a merge completes.

use log::debug;
use parking_lot::Mutex;

use crate::error::Result;
use crate::index::accumulator::DeleteSetAccumulator;
use crate::index::apply::apply_deletes;
use crate::index::config::DeletesConfig;
use crate::index::pending::PendingDeletes;
use crate::index::query::QueryKey;
use crate::index::remap::{MergeDocIdRemapper, MergeRemapCoordinator};
use crate::index::segment::DeletableSegment;
use crate::index::term::Term;
use crate::index::{BYTES_PER_DEL_DOCID, BYTES_PER_DEL_QUERY, BYTES_PER_DEL_TERM, DocId};

#[derive(Debug)]
struct BufferState {
    /// Deletes buffered since the last flush.
    in_ram: PendingDeletes,
    /// Deletes pushed by earlier flushes, not yet applied.
    flushed: PendingDeletes,
    /// Documents already flushed to segments.
    flushed_doc_count: DocId,
}

/// Both delete generations of one index writer, behind one lock.
#[derive(Debug)]
pub struct DeleteBuffer {
    config: DeletesConfig,
    coordinator: MergeRemapCoordinator,
    state: Mutex<BufferState>,
}

impl DeleteBuffer {
    /// Create an empty buffer.
    pub fn new(config: DeletesConfig) -> Self {
        DeleteBuffer {
            coordinator: MergeRemapCoordinator::new(&config),
            state: Mutex::new(BufferState {
                in_ram: PendingDeletes::from_config(&config),
                flushed: PendingDeletes::from_config(&config),
                flushed_doc_count: 0,
            }),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &DeletesConfig {
        &self.config
    }

    /// Buffer a delete-by-term covering every flushed document plus the
    /// first `num_docs_in_ram` unflushed ones.
    ///
    /// Returns whether the buffered delete count reached the flush trigger.
    pub fn delete_term(&self, term: Term, num_docs_in_ram: DocId) -> bool {
        let mut state = self.state.lock();
        let limit = state.flushed_doc_count + num_docs_in_ram;
        if state.in_ram.term_generation(&term).is_none() {
            let bytes = BYTES_PER_DEL_TERM + term.heap_size();
            state.in_ram.add_bytes_used(bytes as i64);
        }
        state.in_ram.delete_by_term(term, limit);
        self.is_full(&state.in_ram)
    }

    /// Buffer a delete-by-query with the same limit rule as
    /// [`delete_term`](Self::delete_term).
    pub fn delete_query(&self, query: impl Into<QueryKey>, num_docs_in_ram: DocId) -> bool {
        let mut state = self.state.lock();
        let limit = state.flushed_doc_count + num_docs_in_ram;
        state.in_ram.delete_by_query(query, limit);
        state.in_ram.add_bytes_used(BYTES_PER_DEL_QUERY as i64);
        self.is_full(&state.in_ram)
    }

    /// Buffer a delete of one unflushed document.
    pub fn delete_doc_id(&self, doc_id: DocId) {
        let mut state = self.state.lock();
        let global = state.flushed_doc_count + doc_id;
        state.in_ram.delete_by_doc_id(global);
        state.in_ram.add_bytes_used(BYTES_PER_DEL_DOCID as i64);
    }

    /// Check whether the in-RAM generation reached the flush trigger.
    pub fn deletes_full(&self) -> bool {
        self.is_full(&self.state.lock().in_ram)
    }

    fn is_full(&self, pending: &PendingDeletes) -> bool {
        match self.config.max_buffered_delete_terms {
            Some(max) => pending.size() >= max,
            None => false,
        }
    }

    /// Number of delete-by-term calls buffered since the last push.
    pub fn num_buffered_delete_terms(&self) -> u64 {
        self.state.lock().in_ram.num_term_deletes()
    }

    /// Check whether anything is buffered in RAM.
    pub fn has_buffered_deletes(&self) -> bool {
        self.state.lock().in_ram.any()
    }

    /// Check whether flushed deletes are waiting to be applied.
    pub fn has_deletes(&self) -> bool {
        self.state.lock().flushed.any()
    }

    /// RAM estimate of both generations.
    pub fn bytes_used(&self) -> i64 {
        let state = self.state.lock();
        state.in_ram.bytes_used() + state.flushed.bytes_used()
    }

    /// Documents already flushed to segments.
    pub fn flushed_doc_count(&self) -> DocId {
        self.state.lock().flushed_doc_count
    }

    /// Record that `num_docs` more documents reached a flushed segment.
    pub fn add_flushed_docs(&self, num_docs: DocId) {
        self.state.lock().flushed_doc_count += num_docs;
    }

    /// Move the in-RAM generation into the flushed one.
    pub fn push_deletes(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.flushed.merge(&mut state.in_ram);
    }

    /// Read the in-RAM generation.
    pub fn with_in_ram<R>(&self, f: impl FnOnce(&PendingDeletes) -> R) -> R {
        f(&self.state.lock().in_ram)
    }

    /// Read the flushed generation, e.g. to serialize it.
    pub fn with_flushed<R>(&self, f: impl FnOnce(&PendingDeletes) -> R) -> R {
        f(&self.state.lock().flushed)
    }

    /// Translate both generations after a merge completed.
    pub fn remap_deletes(&self, remapper: &MergeDocIdRemapper) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.coordinator.remap(&mut state.in_ram, remapper);
        self.coordinator.remap(&mut state.flushed, remapper);
        state.flushed_doc_count -= remapper.doc_shift();
        debug!(
            "remapped buffered deletes, flushed doc count now {}",
            state.flushed_doc_count
        );
    }

    /// Apply the flushed generation to `segments` and clear it.
    ///
    /// On error the flushed generation is kept for a retry.
    pub fn apply_deletes(&self, segments: &mut [&mut dyn DeletableSegment]) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.flushed.any() {
            return Ok(false);
        }
        let any = apply_deletes(&state.flushed, segments)?;
        state.flushed.clear();
        Ok(any)
    }
}

impl Default for DeleteBuffer {
    fn default() -> Self {
        Self::new(DeletesConfig::default())
    }
}
