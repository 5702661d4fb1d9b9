//! Rewriting buffered deletes after a segment merge.
//!
//! A merge compacts the ordinals of the merged segments, so every buffered
//! docID and every buffered term/query limit that lands inside or after the
//! merged range has to be translated into the new ordinal space before the
//! old segments go away.

use ahash::AHashMap;
use log::debug;

use crate::error::{Result, SegdelError};
use crate::index::config::DeletesConfig;
use crate::index::pending::{PendingDeletes, TermMap};
use crate::index::query::QueryKey;
use crate::index::{DELETED, DocId, Generation};

/// Old-ordinal to new-ordinal translation produced by a merge.
///
/// Must be total: every input yields an ordinal or [`DELETED`].
pub trait DocIdRemap: Sync {
    /// Translate an old global ordinal.
    fn remap(&self, old: DocId) -> DocId;
}

impl<F> DocIdRemap for F
where
    F: Fn(DocId) -> DocId + Sync,
{
    fn remap(&self, old: DocId) -> DocId {
        self(old)
    }
}

/// Remap table for one completed merge of contiguous segments.
///
/// Ordinals before the merged range are unchanged, ordinals after it shift
/// down by the number of documents the merge dropped, and ordinals inside it
/// go through the per-segment doc maps.
#[derive(Debug, Clone)]
pub struct MergeDocIdRemapper {
    /// Old global start of each merged segment.
    starts: Vec<DocId>,
    /// New global start of each merged segment.
    new_starts: Vec<DocId>,
    /// Old local -> new local, `None` when the segment had no deletions.
    doc_maps: Vec<Option<Vec<DocId>>>,
    min_doc_id: DocId,
    max_doc_id: DocId,
    doc_shift: DocId,
}

impl MergeDocIdRemapper {
    /// Build the remapper.
    ///
    /// * `segment_doc_counts` - doc count of every segment, in index order.
    /// * `first_merged` - index of the first merged segment.
    /// * `doc_maps` - one entry per merged segment; a map holds the new
    ///   segment-relative ordinal of each old local ordinal, or [`DELETED`].
    /// * `del_counts` - deleted documents per merged segment.
    /// * `merged_doc_count` - doc count of the resulting segment.
    pub fn new(
        segment_doc_counts: &[DocId],
        first_merged: usize,
        doc_maps: Vec<Option<Vec<DocId>>>,
        del_counts: &[DocId],
        merged_doc_count: DocId,
    ) -> Result<Self> {
        let merged = doc_maps.len();
        if merged == 0 {
            return Err(SegdelError::invalid_argument("merge has no segments"));
        }
        if del_counts.len() != merged {
            return Err(SegdelError::invalid_argument(format!(
                "{} doc maps but {} delete counts",
                merged,
                del_counts.len()
            )));
        }
        if first_merged + merged > segment_doc_counts.len() {
            return Err(SegdelError::invalid_argument(format!(
                "merged range {}..{} exceeds {} segments",
                first_merged,
                first_merged + merged,
                segment_doc_counts.len()
            )));
        }

        if let Some((i, &count)) = segment_doc_counts.iter().enumerate().find(|(_, c)| **c < 0) {
            return Err(SegdelError::invalid_argument(format!(
                "segment {i} has negative doc count {count}"
            )));
        }

        let counts = &segment_doc_counts[first_merged..first_merged + merged];
        for (i, map) in doc_maps.iter().enumerate() {
            let (count, del_count) = (counts[i], del_counts[i]);
            if del_count < 0 || del_count > count {
                return Err(SegdelError::invalid_argument(format!(
                    "merged segment {i} has {del_count} deletions for {count} documents"
                )));
            }
            match map {
                Some(map) => {
                    if map.len() as DocId != count {
                        return Err(SegdelError::invalid_argument(format!(
                            "doc map {} has {} entries for {} documents",
                            i,
                            map.len(),
                            count
                        )));
                    }
                    let dropped = map.iter().filter(|&&doc| doc == DELETED).count() as DocId;
                    if dropped != del_count {
                        return Err(SegdelError::invalid_argument(format!(
                            "doc map {i} drops {dropped} documents but {del_count} were deleted"
                        )));
                    }
                }
                None if del_count != 0 => {
                    return Err(SegdelError::invalid_argument(format!(
                        "merged segment {i} has {del_count} deletions but no doc map"
                    )));
                }
                None => {}
            }
        }

        let min_doc_id: DocId = segment_doc_counts[..first_merged].iter().sum();
        let num_docs: DocId = counts.iter().sum();
        let max_doc_id = min_doc_id + num_docs;

        let mut starts = Vec::with_capacity(merged);
        let mut new_starts = Vec::with_capacity(merged);
        starts.push(min_doc_id);
        new_starts.push(min_doc_id);
        for i in 1..merged {
            starts.push(starts[i - 1] + counts[i - 1]);
            new_starts.push(new_starts[i - 1] + counts[i - 1] - del_counts[i - 1]);
        }

        let live_docs = num_docs - del_counts.iter().sum::<DocId>();
        if live_docs != merged_doc_count {
            return Err(SegdelError::invalid_argument(format!(
                "merged segment has {merged_doc_count} documents, expected {live_docs}"
            )));
        }

        Ok(MergeDocIdRemapper {
            starts,
            new_starts,
            doc_maps,
            min_doc_id,
            max_doc_id,
            doc_shift: num_docs - merged_doc_count,
        })
    }

    /// Number of ordinals the merge removed.
    pub fn doc_shift(&self) -> DocId {
        self.doc_shift
    }

    /// Old global ordinal range covered by the merged segments.
    pub fn merged_range(&self) -> std::ops::Range<DocId> {
        self.min_doc_id..self.max_doc_id
    }

    fn segment_of(&self, old: DocId) -> usize {
        match self.starts.binary_search(&old) {
            // Empty segments share a start with their successor; the
            // document belongs to the last one.
            Ok(mut i) => {
                while i + 1 < self.starts.len() && self.starts[i + 1] == old {
                    i += 1;
                }
                i
            }
            Err(i) => i - 1,
        }
    }
}

impl DocIdRemap for MergeDocIdRemapper {
    fn remap(&self, old: DocId) -> DocId {
        if old < self.min_doc_id {
            return old;
        }
        if old >= self.max_doc_id {
            return old - self.doc_shift;
        }

        let segment = self.segment_of(old);
        let local = old - self.starts[segment];
        match &self.doc_maps[segment] {
            Some(map) => match map[local as usize] {
                DELETED => DELETED,
                mapped => self.new_starts[segment] + mapped,
            },
            None => self.new_starts[segment] + local,
        }
    }
}

/// Translates every buffered delete of a [`PendingDeletes`] through a
/// [`DocIdRemap`].
///
/// The term map, the docID list and the query map are each rebuilt in full
/// and then swapped in, so none of them is ever observed half-translated.
/// The caller holds exclusive access to the instance for the whole call,
/// which also makes the three swaps one critical section.
#[derive(Debug, Clone)]
pub struct MergeRemapCoordinator {
    parallel_threshold: usize,
}

impl Default for MergeRemapCoordinator {
    fn default() -> Self {
        Self::new(&DeletesConfig::default())
    }
}

impl MergeRemapCoordinator {
    /// Create a coordinator from the delete configuration.
    pub fn new(config: &DeletesConfig) -> Self {
        MergeRemapCoordinator {
            parallel_threshold: config.parallel_remap_threshold,
        }
    }

    /// Remap `pending` in place.
    ///
    /// NOTE: term and query generations go through the same function as
    /// docIDs. They are document-count limits living in the global ordinal
    /// space, so the merge shifts them like ordinals. A limit that maps to
    /// [`DELETED`] is stored as `DELETED`; interpreting it is up to whoever
    /// applies the deletes.
    pub fn remap<R>(&self, pending: &mut PendingDeletes, table: &R)
    where
        R: DocIdRemap + ?Sized,
    {
        let total = pending.terms.len() + pending.queries.len() + pending.doc_ids.len();
        if total == 0 {
            return;
        }

        let parallel = total >= self.parallel_threshold;
        let (terms, (doc_ids, queries)) = {
            let snapshot: &PendingDeletes = pending;
            if parallel {
                rayon::join(
                    || remap_terms(&snapshot.terms, table),
                    || {
                        rayon::join(
                            || remap_doc_ids(&snapshot.doc_ids, table),
                            || remap_queries(&snapshot.queries, table),
                        )
                    },
                )
            } else {
                (
                    remap_terms(&snapshot.terms, table),
                    (
                        remap_doc_ids(&snapshot.doc_ids, table),
                        remap_queries(&snapshot.queries, table),
                    ),
                )
            }
        };

        if let Some(terms) = terms {
            pending.terms = terms;
        }
        if let Some(doc_ids) = doc_ids {
            pending.doc_ids = doc_ids;
        }
        if let Some(queries) = queries {
            pending.queries = queries;
        }

        debug!(
            "remapped {} terms, {} queries and {} docIDs after merge (parallel: {})",
            pending.terms.len(),
            pending.queries.len(),
            pending.doc_ids.len(),
            parallel
        );
    }
}

fn remap_terms<R: DocIdRemap + ?Sized>(terms: &TermMap, table: &R) -> Option<TermMap> {
    if terms.is_empty() {
        return None;
    }
    let mut rebuilt = TermMap::new(terms.order());
    for (term, generation) in terms.iter() {
        rebuilt.insert(term.clone(), table.remap(generation));
    }
    Some(rebuilt)
}

fn remap_doc_ids<R: DocIdRemap + ?Sized>(doc_ids: &[DocId], table: &R) -> Option<Vec<DocId>> {
    if doc_ids.is_empty() {
        return None;
    }
    Some(doc_ids.iter().map(|&doc| table.remap(doc)).collect())
}

fn remap_queries<R: DocIdRemap + ?Sized>(
    queries: &AHashMap<QueryKey, Generation>,
    table: &R,
) -> Option<AHashMap<QueryKey, Generation>> {
    if queries.is_empty() {
        return None;
    }
    let mut rebuilt = AHashMap::with_capacity(queries.len());
    for (query, &generation) in queries {
        rebuilt.insert(query.clone(), table.remap(generation));
    }
    Some(rebuilt)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::index::config::TermOrder;
    use crate::index::query::TermDeleteQuery;
    use crate::index::term::Term;

    fn term(text: &str) -> Term {
        Term::from_text("body", text)
    }

    fn double(x: DocId) -> DocId {
        x * 2
    }

    #[test]
    fn test_remap_translates_all_collections() {
        let key = QueryKey::from(Arc::new(TermDeleteQuery::new(term("q"))));
        let mut pending = PendingDeletes::new();
        pending.delete_by_term(term("a"), 10);
        pending.delete_by_term(term("b"), 20);
        pending.delete_by_doc_id(3);
        pending.delete_by_doc_id(7);
        pending.delete_by_query(key.clone(), 5);

        MergeRemapCoordinator::default().remap(&mut pending, &double);

        assert_eq!(pending.term_generation(&term("a")), Some(20));
        assert_eq!(pending.term_generation(&term("b")), Some(40));
        assert_eq!(pending.doc_ids(), &[6, 14]);
        assert_eq!(pending.query_generation(&key), Some(10));
        assert_eq!(pending.terms().len(), 2);
        assert_eq!(pending.queries().len(), 1);
    }

    #[test]
    fn test_remap_keeps_sentinel_verbatim() {
        let mut pending = PendingDeletes::new();
        pending.delete_by_term(term("gone"), 20);
        pending.delete_by_term(term("kept"), 4);

        let table = |x: DocId| if x == 20 { DELETED } else { x };
        MergeRemapCoordinator::default().remap(&mut pending, &table);

        assert_eq!(pending.term_generation(&term("gone")), Some(DELETED));
        assert_eq!(pending.term_generation(&term("kept")), Some(4));
        assert_eq!(pending.terms().len(), 2);
    }

    #[test]
    fn test_remap_preserves_term_order_and_counters() {
        let mut pending = PendingDeletes::with_term_order(TermOrder::Sorted);
        pending.delete_by_term(term("z"), 1);
        pending.delete_by_term(term("a"), 2);
        pending.delete_by_term(term("a"), 2);
        pending.add_bytes_used(99);

        MergeRemapCoordinator::default().remap(&mut pending, &double);

        assert_eq!(pending.term_order(), TermOrder::Sorted);
        let order: Vec<_> = pending.terms().iter().map(|(t, g)| (t.clone(), g)).collect();
        assert_eq!(order, vec![(term("a"), 4), (term("z"), 2)]);
        assert_eq!(pending.num_term_deletes(), 3);
        assert_eq!(pending.bytes_used(), 99);
    }

    #[test]
    fn test_parallel_remap_matches_serial() {
        let build = || {
            let mut pending = PendingDeletes::new();
            for i in 0..200 {
                pending.delete_by_term(Term::from_text("id", i.to_string()), i);
                pending.delete_by_doc_id(i);
            }
            pending
        };

        let mut serial = build();
        let mut parallel = build();
        let serial_config = DeletesConfig::default().with_parallel_remap_threshold(usize::MAX);
        let parallel_config = DeletesConfig::default().with_parallel_remap_threshold(1);

        MergeRemapCoordinator::new(&serial_config).remap(&mut serial, &double);
        MergeRemapCoordinator::new(&parallel_config).remap(&mut parallel, &double);

        assert_eq!(serial.doc_ids(), parallel.doc_ids());
        let a: Vec<_> = serial.terms().iter().map(|(t, g)| (t.clone(), g)).collect();
        let b: Vec<_> = parallel.terms().iter().map(|(t, g)| (t.clone(), g)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_remap_empty_is_noop() {
        let mut pending = PendingDeletes::new();
        MergeRemapCoordinator::default().remap(&mut pending, &double);
        assert!(!pending.any());
    }

    #[test]
    fn test_merge_remapper() {
        // Segments: [0..4) [4..10) [10..13) [13..15); merge the middle two.
        // Segment 1 drops local docs 1 and 4; segment 2 has no deletions.
        let doc_maps = vec![Some(vec![0, DELETED, 1, 2, DELETED, 3]), None];
        let remapper = MergeDocIdRemapper::new(&[4, 6, 3, 2], 1, doc_maps, &[2, 0], 7).unwrap();

        assert_eq!(remapper.doc_shift(), 2);
        assert_eq!(remapper.merged_range(), 4..13);

        // Before the merge: unchanged.
        assert_eq!(remapper.remap(0), 0);
        assert_eq!(remapper.remap(3), 3);

        // Inside segment 1.
        assert_eq!(remapper.remap(4), 4);
        assert_eq!(remapper.remap(5), DELETED);
        assert_eq!(remapper.remap(6), 5);
        assert_eq!(remapper.remap(9), 7);

        // Inside segment 2, shifted by segment 1's deletions.
        assert_eq!(remapper.remap(10), 8);
        assert_eq!(remapper.remap(12), 10);

        // After the merge: shifted.
        assert_eq!(remapper.remap(13), 11);
        assert_eq!(remapper.remap(14), 12);

        // The sentinel itself passes through.
        assert_eq!(remapper.remap(DELETED), DELETED);
    }

    #[test]
    fn test_merge_remapper_skips_empty_segments() {
        let doc_maps = vec![None, Some(vec![DELETED, 0, 1])];
        let remapper = MergeDocIdRemapper::new(&[0, 3], 0, doc_maps, &[0, 1], 2).unwrap();

        assert_eq!(remapper.remap(0), DELETED);
        assert_eq!(remapper.remap(1), 0);
        assert_eq!(remapper.remap(2), 1);
        assert_eq!(remapper.remap(3), 2);
    }

    #[test]
    fn test_merge_remapper_rejects_bad_input() {
        assert!(MergeDocIdRemapper::new(&[2], 0, vec![], &[], 0).is_err());
        assert!(MergeDocIdRemapper::new(&[2], 0, vec![None], &[0, 0], 2).is_err());
        assert!(MergeDocIdRemapper::new(&[2], 1, vec![None], &[0], 2).is_err());
        assert!(MergeDocIdRemapper::new(&[2], 0, vec![Some(vec![0])], &[0], 2).is_err());
        assert!(MergeDocIdRemapper::new(&[2], 0, vec![None], &[1], 2).is_err());
    }

    #[test]
    fn test_merge_remapper_rejects_inconsistent_segments() {
        let invalid = |result: Result<MergeDocIdRemapper>| {
            matches!(result, Err(SegdelError::InvalidArgument(_)))
        };

        // Negative doc count, inside and outside the merged range.
        assert!(invalid(MergeDocIdRemapper::new(&[-1, 3], 1, vec![None], &[0], 3)));
        assert!(invalid(MergeDocIdRemapper::new(&[3, -2, 5], 0, vec![None, None], &[0, 0], 1)));

        // More deletions than documents, even when the totals add up.
        assert!(invalid(MergeDocIdRemapper::new(
            &[1, 3],
            0,
            vec![Some(vec![DELETED]), Some(vec![0, 1, 2])],
            &[2, -1],
            2
        )));

        // Deletions without a doc map.
        assert!(invalid(MergeDocIdRemapper::new(&[2, 2], 0, vec![None, None], &[1, 0], 3)));

        // Doc map disagreeing with its delete count.
        assert!(invalid(MergeDocIdRemapper::new(
            &[3],
            0,
            vec![Some(vec![0, DELETED, 1])],
            &[2],
            1
        )));
    }
}
