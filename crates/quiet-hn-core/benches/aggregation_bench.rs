use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use quiet_hn_core::fixture::{comment, story, FixtureItems};
use quiet_hn_core::{
    story_link_predicate, AggregationConfig, FetchCoordinator, ItemProvider, OrderAssembler,
    RankedIdentifierList, RankedItem, SharedItemCache,
};

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => panic!("failed to build benchmark runtime: {err}"),
    }
}

fn fixture_items() -> Arc<dyn ItemProvider> {
    let records = (1..=500).map(|id| if id % 5 == 0 { comment(id) } else { story(id) });
    FixtureItems::new().with_records(records).into_shared()
}

fn bench_warm_cache(c: &mut Criterion) {
    let runtime = runtime();
    let coordinator =
        FetchCoordinator::new(SharedItemCache::new(), fixture_items(), AggregationConfig::default());
    let ranked = RankedIdentifierList::from_iter(1..=500);
    runtime.block_on(coordinator.aggregate(&ranked, story_link_predicate()));

    c.bench_function("aggregate_30_stories_warm_cache", |b| {
        b.iter(|| {
            let result = runtime.block_on(coordinator.aggregate(&ranked, story_link_predicate()));
            if result.len() != 30 {
                panic!("warm-cache benchmark expected 30 stories, got {}", result.len());
            }
        });
    });
}

fn bench_cold_cache(c: &mut Criterion) {
    let runtime = runtime();
    let items = fixture_items();
    let ranked = RankedIdentifierList::from_iter(1..=500);

    c.bench_function("aggregate_30_stories_cold_cache", |b| {
        b.iter(|| {
            let coordinator = FetchCoordinator::new(
                SharedItemCache::new(),
                Arc::clone(&items),
                AggregationConfig::default(),
            );
            let result = runtime.block_on(coordinator.aggregate(&ranked, story_link_predicate()));
            if result.is_empty() {
                panic!("cold-cache benchmark produced no stories");
            }
        });
    });
}

fn bench_order(c: &mut Criterion) {
    let arrived = (0..1_000usize)
        .rev()
        .map(|rank_index| RankedItem { record: story(rank_index as u64 + 1), rank_index })
        .collect::<Vec<_>>();
    let assembler = OrderAssembler::new(30);

    c.bench_function("order_1000_arrivals", |b| {
        b.iter(|| assembler.order(arrived.clone()));
    });
}

criterion_group!(aggregation_benches, bench_warm_cache, bench_cold_cache, bench_order);
criterion_main!(aggregation_benches);
