//! Batch Sigma Benchmarks
//!
//! Measures batch throughput of the orchestrator at different worker counts
//! to check that pooling actually pays for itself.
//!
//! Run with: cargo bench -p optsnr-core --bench sigma_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use std::sync::Arc;

use optsnr_core::prelude::*;

fn config(workers: usize) -> BatchConfig {
    let mut config = BatchConfig {
        low_frequency_cutoff: 2.0,
        segment_length: 32.0,
        sample_rate: 1024.0,
        worker_count: workers,
        ..BatchConfig::default()
    };
    config
        .sensor_output_columns
        .insert("h1".to_string(), "snr_h1".to_string());
    config
        .sensor_output_columns
        .insert("l1".to_string(), "snr_l1".to_string());
    config
}

fn orchestrator(workers: usize) -> BatchOrchestrator {
    let config = config(workers);
    let shape = config.spectrum_shape();
    let providers: BTreeMap<String, SpectrumProvider> = config
        .sensor_output_columns
        .keys()
        .map(|sensor| {
            (
                sensor.clone(),
                SpectrumProvider::constant(
                    Spectrum::from_raw(vec![3.0e-46; shape.length], shape.delta_f, 0.0),
                    &shape,
                ),
            )
        })
        .collect();
    BatchOrchestrator::new(config, providers, Arc::new(RingdownGenerator::new()))
}

fn injections(n: usize) -> Vec<InjectionRecord> {
    (0..n)
        .map(|i| {
            InjectionRecord::new(i as u64, 1_000_000.0 + i as f64 * 10.0)
                .with_param("frequency", 50.0 + i as f64)
                .with_param("quality", 20.0)
                .with_param("amplitude", 1e-21)
        })
        .collect()
}

/// Benchmark batch sigma: one worker vs a pool
fn bench_batch_sigma(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_sigma");

    for batch_size in [8, 32, 128].iter() {
        let records = injections(*batch_size);
        group.throughput(Throughput::Elements(*batch_size as u64));

        for workers in [1, 4] {
            let orchestrator = orchestrator(workers);
            group.bench_with_input(
                BenchmarkId::new(format!("workers_{workers}"), batch_size),
                &records,
                |b, records| b.iter(|| orchestrator.run(black_box(records)).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_batch_sigma);
criterion_main!(benches);
