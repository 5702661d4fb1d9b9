//! Applying flushed deletes to segments.

use log::debug;

use crate::error::{Result, SegdelError};
use crate::index::pending::PendingDeletes;
use crate::index::segment::DeletableSegment;
use crate::index::{DocId, Generation};

/// Apply every buffered delete in `pending` to `segments`.
///
/// Segments are visited in index order; each one occupies the global ordinal
/// range following its predecessor. Term and query deletes only reach
/// documents whose global ordinal is below the recorded limit, so a limit of
/// [`DELETED`](crate::index::DELETED) deletes nothing. `pending` is left
/// untouched; clearing it is the caller's decision.
///
/// Returns whether at least one document was deleted.
pub fn apply_deletes(
    pending: &PendingDeletes,
    segments: &mut [&mut dyn DeletableSegment],
) -> Result<bool> {
    if !pending.any() {
        return Ok(false);
    }

    debug!(
        "apply {} buffered deleted terms and {} deleted docIDs and {} deleted queries on {} segments",
        pending.terms().len(),
        pending.doc_ids().len(),
        pending.queries().len(),
        segments.len()
    );

    let mut doc_start: DocId = 0;
    let mut any = false;
    for segment in segments.iter_mut() {
        any |= apply_to_segment(pending, &mut **segment, doc_start)?;
        doc_start += segment.max_doc();
    }

    Ok(any)
}

fn apply_to_segment(
    pending: &PendingDeletes,
    segment: &mut dyn DeletableSegment,
    doc_start: DocId,
) -> Result<bool> {
    let doc_end = doc_start + segment.max_doc();
    let mut any = false;

    for (term, limit) in pending.terms().iter() {
        let docs = segment.term_docs(term)?;
        any |= delete_below(segment, &docs, doc_start, limit)?;
    }

    for &doc in pending.doc_ids() {
        if doc >= doc_start && doc < doc_end {
            segment.delete_document(doc - doc_start)?;
            any = true;
        }
    }

    for (query, &limit) in pending.queries() {
        let docs = query.query().matching_docs(&*segment).map_err(|e| {
            SegdelError::query(format!(
                "{:?} failed on segment {}: {e}",
                query.query(),
                segment.name()
            ))
        })?;
        any |= delete_below(segment, &docs, doc_start, limit)?;
    }

    Ok(any)
}

// `docs` is ascending, so the first document past the limit ends the scan.
fn delete_below(
    segment: &mut dyn DeletableSegment,
    docs: &[DocId],
    doc_start: DocId,
    limit: Generation,
) -> Result<bool> {
    let mut any = false;
    for &doc in docs {
        if doc_start + doc >= limit {
            break;
        }
        segment.delete_document(doc)?;
        any = true;
    }
    Ok(any)
}
