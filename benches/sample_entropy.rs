//! Benchmarks for rolling entropy features.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use regime_features::core::Series;
use regime_features::features::{
    rolling_permutation_entropy, rolling_sample_entropy, rolling_shannon_entropy,
};

fn generate_returns(n: usize) -> Series {
    let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let index = (0..n).map(|i| base + Duration::days(i as i64)).collect();
    let values = (0..n)
        .map(|i| {
            0.01 * (2.0 * std::f64::consts::PI * i as f64 / 17.0).sin()
                + 0.005 * ((i * 7919 % 101) as f64 / 101.0 - 0.5)
        })
        .collect();
    Series::new(index, values).unwrap()
}

fn bench_sample_entropy(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_sample_entropy");
    let series = generate_returns(1000);

    for window in [25, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(window), window, |b, &w| {
            b.iter(|| rolling_sample_entropy(black_box(&series), w, 2, 0.2))
        });
    }

    group.finish();
}

fn bench_fast_entropies(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_entropy");

    for size in [500, 2000, 8000].iter() {
        let series = generate_returns(*size);

        group.bench_with_input(BenchmarkId::new("shannon", size), size, |b, _| {
            b.iter(|| rolling_shannon_entropy(black_box(&series), 21, 10))
        });

        group.bench_with_input(BenchmarkId::new("permutation", size), size, |b, _| {
            b.iter(|| rolling_permutation_entropy(black_box(&series), 21, 3))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sample_entropy, bench_fast_entropies);
criterion_main!(benches);
