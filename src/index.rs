//! Buffered delete tracking for segment-based indexes.
//!
//! Deletes arrive by term, by query or by document ordinal and are held in
//! a [`pending::PendingDeletes`] until the flush coordinator applies them.
//! Generations are folded together with
//! [`accumulator::DeleteSetAccumulator`], rewritten after a segment merge by
//! [`remap::MergeRemapCoordinator`], and finally applied to segments through
//! [`apply::apply_deletes`].

use std::mem;

pub mod accumulator;
pub mod apply;
pub mod buffer;
pub mod config;
pub mod pending;
pub mod query;
pub mod remap;
pub mod segment;
pub mod term;

/// A document ordinal, either segment-local or index-global.
pub type DocId = i64;

/// The limit stamped on a buffered delete.
///
/// In practice this is the number of documents the writer had seen when the
/// delete was recorded: the delete applies to documents whose global
/// ordinal is strictly below it.
pub type Generation = i64;

/// Remap result for a document that no longer exists after a merge.
pub const DELETED: DocId = -1;

/// Estimated RAM charged for one buffered docID (vector slot plus slack).
pub const BYTES_PER_DEL_DOCID: usize = 2 * mem::size_of::<DocId>();

/// Estimated RAM charged for one buffered term, excluding its bytes.
pub const BYTES_PER_DEL_TERM: usize = 6 * mem::size_of::<usize>();

/// Estimated RAM charged for one buffered query.
pub const BYTES_PER_DEL_QUERY: usize = 4 * mem::size_of::<usize>() + 24;
