//! History merge and ranking cost as the stored history grows
//!
//! A run upserts one result per item and ranks the whole history after each
//! item, so both scale with history size.

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use sell_through_lib::domain::history::HistoryCollection;
use sell_through_lib::domain::search::SearchResult;

fn history_of(size: usize) -> HistoryCollection {
    (0..size)
        .map(|i| SearchResult::new(&format!("Car{i}"), "bumper", (i % 97) as u64, 100, Utc::now()))
        .collect()
}

fn upsert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("history upsert");
    for size in [10, 100, 1_000] {
        let history = history_of(size);
        let replacement = SearchResult::new(&format!("Car{}", size / 2), "bumper", 5, 10, Utc::now());
        let fresh = SearchResult::new("New Car", "bumper", 5, 10, Utc::now());

        group.bench_with_input(BenchmarkId::new("replace", size), &history, |b, history| {
            b.iter(|| black_box(history.clone().with_upserted(replacement.clone())));
        });
        group.bench_with_input(BenchmarkId::new("insert", size), &history, |b, history| {
            b.iter(|| black_box(history.clone().with_upserted(fresh.clone())));
        });
    }
    group.finish();
}

fn ranking_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("history ranking");
    for size in [10, 100, 1_000] {
        let history = history_of(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &history, |b, history| {
            b.iter(|| black_box((history.sorted_by_sell_through_desc(), history.average_percentage())));
        });
    }
    group.finish();
}

criterion_group!(benches, upsert_benchmark, ranking_benchmark);
criterion_main!(benches);
