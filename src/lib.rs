//! # Segdel
//!
//! Mutation bookkeeping for a segment-based full-text index.
//!
//! ## Features
//!
//! - Buffered deletes by term, by query and by document ordinal
//! - Folding one delete generation into another
//! - Remapping buffered deletes after a segment merge
//! - Applying flushed deletes to segments
//! - Bounded LRU caches for terms, filters and parsed queries

pub mod cache;
pub mod error;
pub mod index;

pub mod prelude {
    pub use crate::cache::lru::LruCache;
    pub use crate::cache::map::MapCache;
    pub use crate::cache::synchronized::SynchronizedCache;
    pub use crate::cache::{Cache, CacheStats};
    pub use crate::error::{Result, SegdelError};
    pub use crate::index::accumulator::DeleteSetAccumulator;
    pub use crate::index::buffer::DeleteBuffer;
    pub use crate::index::config::{DeletesConfig, TermOrder};
    pub use crate::index::pending::PendingDeletes;
    pub use crate::index::query::{DeleteQuery, QueryIdentity, QueryKey, TermDeleteQuery};
    pub use crate::index::remap::{DocIdRemap, MergeDocIdRemapper, MergeRemapCoordinator};
    pub use crate::index::segment::DeletableSegment;
    pub use crate::index::term::Term;
    pub use crate::index::{DELETED, DocId, Generation};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
