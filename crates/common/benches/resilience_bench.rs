//! Backoff calculation benchmarks
//!
//! Run with: `cargo bench --bench resilience_bench -p waitline-common
//! --features runtime`

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use waitline_common::resilience::{BackoffStrategy, Jitter, PacedBackoff};

fn bench_backoff_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("backoff_calculate_delay");

    let strategies = [
        ("fixed", BackoffStrategy::Fixed(Duration::from_secs(15))),
        (
            "linear",
            BackoffStrategy::Linear {
                initial_delay: Duration::from_secs(1),
                increment: Duration::from_secs(2),
            },
        ),
        (
            "exponential",
            BackoffStrategy::Exponential {
                initial_delay: Duration::from_millis(500),
                base: 2.0,
                max_delay: Duration::from_secs(120),
            },
        ),
    ];

    for (name, strategy) in strategies {
        group.bench_with_input(BenchmarkId::from_parameter(name), &strategy, |b, strategy| {
            b.iter(|| {
                for step in 0..40 {
                    black_box(strategy.calculate_delay(black_box(step)));
                }
            });
        });
    }

    group.finish();
}

fn bench_jitter(c: &mut Criterion) {
    let mut group = c.benchmark_group("jitter_apply");
    let delay = Duration::from_secs(8);

    for jitter in [Jitter::None, Jitter::Full, Jitter::Equal] {
        let label = format!("{jitter:?}");
        group.bench_function(label, |b| b.iter(|| black_box(jitter.apply(black_box(delay)))));
    }

    group.finish();
}

fn bench_paced_backoff(c: &mut Criterion) {
    let backoff = PacedBackoff::builder()
        .exponential(Duration::from_secs(1), 2.0, Duration::from_secs(60))
        .equal_jitter()
        .build()
        .expect("valid backoff for benchmarks");

    c.bench_function("paced_backoff_delay_for_attempt", |b| {
        b.iter(|| {
            for attempt in 1..=25 {
                black_box(backoff.delay_for_attempt(black_box(attempt)));
            }
        });
    });
}

criterion_group!(benches, bench_backoff_strategies, bench_jitter, bench_paced_backoff);
criterion_main!(benches);
