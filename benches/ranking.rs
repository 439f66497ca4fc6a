use action_suggest::ranking::{RankingPipeline, StrategyKind};
use action_suggest::records::synthetic;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const ALL_STRATEGIES: [StrategyKind; 4] = [
    StrategyKind::SampledReward,
    StrategyKind::SoftmaxPriority,
    StrategyKind::AggregateReward,
    StrategyKind::PosteriorBlend,
];

/// Full four-stage chain over synthetic histories of increasing size
fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_pipeline");
    let pipeline = RankingPipeline::from_kinds(&ALL_STRATEGIES, 10).with_seed(42);

    for record_count in [100, 1_000, 10_000].iter() {
        let records = synthetic::generate(*record_count, 7);

        group.bench_with_input(
            BenchmarkId::from_parameter(record_count),
            &records,
            |b, records| b.iter(|| pipeline.rank(black_box(records.clone()))),
        );
    }

    group.finish();
}

/// Each strategy alone, to spot the expensive stage
fn bench_single_strategy(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_single_strategy");
    let records = synthetic::generate(1_000, 7);

    for kind in ALL_STRATEGIES.iter() {
        let pipeline = RankingPipeline::from_kinds(&[*kind], 10).with_seed(42);

        group.bench_with_input(BenchmarkId::from_parameter(kind), &records, |b, records| {
            b.iter(|| pipeline.rank(black_box(records.clone())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_pipeline, bench_single_strategy);
criterion_main!(benches);
