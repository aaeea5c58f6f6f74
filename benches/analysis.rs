//! Benchmarks for the statistical routines and the table stages

use api_paradigm_experiment::{
    analysis::{tables, Dataset},
    models::{Measurement, ResultSet},
    stats::{mann_whitney_less, shapiro_wilk, two_way_anova},
    types::{ApiType, Metric, QueryType},
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::time::Duration;

/// Deterministic latency-like sample with ties
fn sample(n: usize, offset: f64) -> Vec<f64> {
    (0..n).map(|i| offset + ((i * 7919) % 97) as f64 * 1.5).collect()
}

fn create_results(repetitions: usize) -> ResultSet {
    let mut results = ResultSet::new();
    for query in QueryType::ALL {
        for i in 0..repetitions {
            let base = 80 + (i * 31 % 50) as u64;
            results.push(Measurement::success(ApiType::Rest, query, query.operation_name(), Duration::from_millis(base + 20), 4000 + i * 3));
            if i % 10 == 0 {
                results.push(Measurement::failure(ApiType::GraphQl, query, query.operation_name(), "HTTP 502"));
            } else {
                results.push(Measurement::success(ApiType::GraphQl, query, query.operation_name(), Duration::from_millis(base), 1500 + i));
            }
        }
    }
    results
}

fn bench_tests(c: &mut Criterion) {
    let mut group = c.benchmark_group("tests");
    for n in [30, 300, 3000] {
        let a = sample(n, 100.0);
        let b = sample(n, 90.0);
        group.bench_with_input(BenchmarkId::new("shapiro_wilk", n), &a, |bench, a| {
            bench.iter(|| shapiro_wilk(black_box(a)))
        });
        group.bench_with_input(BenchmarkId::new("mann_whitney", n), &(a.clone(), b), |bench, (a, b)| {
            bench.iter(|| mann_whitney_less(black_box(b), black_box(a)))
        });
    }
    group.finish();
}

fn bench_anova(c: &mut Criterion) {
    let dataset = Dataset::from_results("bench.csv", &create_results(30));
    let observations = dataset.observations(Metric::ResponseTime);
    c.bench_function("two_way_anova_240", |bench| {
        bench.iter(|| two_way_anova(black_box(&observations), "api_type", "query_type"))
    });
}

fn bench_stages(c: &mut Criterion) {
    let dataset = Dataset::from_results("bench.csv", &create_results(30));
    c.bench_function("descriptive_stage", |bench| bench.iter(|| tables::descriptive(black_box(&dataset))));
    c.bench_function("rq1_stage", |bench| {
        bench.iter(|| tables::research_question(black_box(&dataset), Metric::ResponseTime, 0.05))
    });
}

criterion_group!(benches, bench_tests, bench_anova, bench_stages);
criterion_main!(benches);
