//! Folding one generation of buffered deletes into another.

use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::error::{Result, SegdelError};
use crate::index::pending::PendingDeletes;

/// A buffered delete set that can absorb another one.
pub trait DeleteSetAccumulator {
    /// Move everything buffered in `source` into `self`, then clear `source`.
    ///
    /// On conflicting keys the source value wins unconditionally; the caller
    /// guarantees `source` is the later generation. Counters add up. The
    /// caller must hold exclusive access to both sides.
    fn merge(&mut self, source: &mut Self);
}

impl DeleteSetAccumulator for PendingDeletes {
    fn merge(&mut self, source: &mut Self) {
        debug!(
            "merging {} term deletes ({} distinct), {} query deletes and {} docIDs",
            source.num_term_deletes,
            source.terms.len(),
            source.queries.len(),
            source.doc_ids.len()
        );

        source.terms.drain_into(&mut self.terms);
        for (query, generation) in source.queries.drain() {
            self.queries.insert(query, generation);
        }
        self.doc_ids.append(&mut source.doc_ids);

        self.num_term_deletes += source.num_term_deletes;
        self.bytes_used += source.bytes_used;

        source.clear();
    }
}

/// A delete set shared between the flush coordinator and its writers.
pub type SharedPendingDeletes = Arc<Mutex<PendingDeletes>>;

/// Merge one shared delete set into another.
///
/// Both locks are taken in address order. Merging a set into itself is
/// rejected with [`SegdelError::InvalidOperation`] and leaves it untouched.
pub fn merge_shared(dest: &SharedPendingDeletes, source: &SharedPendingDeletes) -> Result<()> {
    if Arc::ptr_eq(dest, source) {
        return Err(SegdelError::invalid_operation(
            "cannot merge a pending delete set into itself",
        ));
    }

    let (mut dest_guard, mut source_guard) = if Arc::as_ptr(dest) < Arc::as_ptr(source) {
        let d = dest.lock();
        let s = source.lock();
        (d, s)
    } else {
        let s = source.lock();
        let d = dest.lock();
        (d, s)
    };

    dest_guard.merge(&mut *source_guard);
    Ok(())
}
