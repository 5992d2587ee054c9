//! Posterior estimation benchmarks
//!
//! Toyota Way: Genchi Genbutsu (measure, don't guess)
//!
//! Run with: cargo bench --bench posterior_benchmarks

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use trueno_ab::batch::BatchRunner;
use trueno_ab::config::ExperimentConfig;
use trueno_ab::experiment::{
    ArmCounts, CumulativeCounts, PosteriorEstimator, PriorParameters, SequentialRunner,
};
use trueno_ab::synthetic::SyntheticExperiment;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Benchmark one day's estimation at several Monte Carlo budgets
fn bench_daily_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_estimate");
    let totals = CumulativeCounts {
        control: ArmCounts::new(300, 3000),
        treatment: ArmCounts::new(320, 3000),
    };
    let prior = PriorParameters::default();

    for samples in [1_000, 4_000, 16_000] {
        let config = ExperimentConfig::builder()
            .samples_per_day(samples)
            .build()
            .unwrap();
        let estimator = PosteriorEstimator::from_config(&config);
        group.bench_with_input(BenchmarkId::new("beta_draws", samples), &samples, |b, _| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| {
                estimator
                    .estimate(black_box(&totals), black_box(&prior), &mut rng)
                    .unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark a full 30-day run versus a 10-run parallel batch
fn bench_sequential_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_run");
    group.sample_size(10);

    let sim = SyntheticExperiment::null_effect(0.10, 100, start()).with_seed(1);
    let observations = sim.generate().unwrap();
    let config = ExperimentConfig::default();

    group.bench_function("single_30_days", |b| {
        let runner = SequentialRunner::new(config.clone()).unwrap();
        b.iter(|| runner.run(black_box(&observations)).unwrap());
    });

    group.bench_function("batch_10_runs", |b| {
        let runner = BatchRunner::new(config.clone()).unwrap();
        b.iter(|| runner.simulate(black_box(&sim), 10));
    });

    group.finish();
}

criterion_group!(benches, bench_daily_estimate, bench_sequential_run);
criterion_main!(benches);
