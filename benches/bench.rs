//! Criterion benchmarks for segdel.
//!
//! Covers the hot paths of buffered delete handling:
//! - LRU cache lookups under eviction pressure
//! - Recording deletes into a pending set
//! - Merging pending sets and remapping them after a segment merge

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use segdel::cache::Cache;
use segdel::cache::lru::LruCache;
use segdel::index::DocId;
use segdel::index::accumulator::DeleteSetAccumulator;
use segdel::index::config::{DeletesConfig, TermOrder};
use segdel::index::pending::PendingDeletes;
use segdel::index::remap::{MergeDocIdRemapper, MergeRemapCoordinator};
use segdel::index::term::Term;
use std::hint::black_box;

/// Generate distinct delete terms.
fn generate_terms(count: usize) -> Vec<Term> {
    (0..count)
        .map(|i| Term::from_text("id", format!("doc-{i:08}")))
        .collect()
}

/// Build a pending set holding `count` term deletes and as many docID deletes.
fn build_pending(count: usize, order: TermOrder) -> PendingDeletes {
    let mut pending = PendingDeletes::with_term_order(order);
    for (i, term) in generate_terms(count).into_iter().enumerate() {
        pending.delete_by_term(term, i as DocId);
        pending.delete_by_doc_id(i as DocId);
    }
    pending
}

fn bench_lru_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_cache");

    group.throughput(Throughput::Elements(10_000));
    group.bench_function("put_with_eviction", |b| {
        b.iter(|| {
            let mut cache = LruCache::new(1_000).unwrap();
            for i in 0..10_000u64 {
                cache.put(black_box(i), i);
            }
            black_box(cache.len())
        })
    });

    let mut cache = LruCache::new(1_000).unwrap();
    for i in 0..1_000u64 {
        cache.put(i, i);
    }
    group.bench_function("get_hit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = (i + 7) % 1_000;
            black_box(cache.get(black_box(&i)))
        })
    });

    group.finish();
}

fn bench_record_deletes(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_deletes");
    let terms = generate_terms(10_000);

    for order in [TermOrder::Insertion, TermOrder::Sorted] {
        group.throughput(Throughput::Elements(terms.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("delete_by_term", format!("{order:?}")),
            &order,
            |b, &order| {
                b.iter(|| {
                    let mut pending = PendingDeletes::with_term_order(order);
                    for (i, term) in terms.iter().enumerate() {
                        pending.delete_by_term(term.clone(), i as DocId);
                    }
                    black_box(pending.size())
                })
            },
        );
    }

    group.finish();
}

fn bench_merge_and_remap(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_and_remap");
    group.sample_size(20);

    group.bench_function("merge_10k", |b| {
        b.iter_batched(
            || (PendingDeletes::new(), build_pending(10_000, TermOrder::Insertion)),
            |(mut dest, mut source)| {
                dest.merge(&mut source);
                black_box(dest.size())
            },
            criterion::BatchSize::LargeInput,
        )
    });

    // One segment of 20k docs merged away with every other doc deleted.
    let doc_map: Vec<DocId> = (0..20_000)
        .map(|i| if i % 2 == 0 { i / 2 } else { -1 })
        .collect();
    let remapper =
        MergeDocIdRemapper::new(&[20_000, 20_000], 0, vec![Some(doc_map)], &[10_000], 10_000)
            .unwrap();

    for threshold in [usize::MAX, 0] {
        let coordinator = MergeRemapCoordinator::new(
            &DeletesConfig::default().with_parallel_remap_threshold(threshold),
        );
        let name = if threshold == 0 { "parallel" } else { "serial" };
        group.bench_function(BenchmarkId::new("remap_10k", name), |b| {
            b.iter_batched(
                || build_pending(10_000, TermOrder::Insertion),
                |mut pending| {
                    coordinator.remap(&mut pending, &remapper);
                    black_box(pending.size())
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lru_cache,
    bench_record_deletes,
    bench_merge_and_remap
);
criterion_main!(benches);
