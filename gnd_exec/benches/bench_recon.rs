//! # Trajectory Reconstruction Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gnd_lib::recon::{reconstruct, Params};
use line_if::tick_log::LogRecord;

fn recon_benchmark(c: &mut Criterion) {
    // ---- Build a dummy log ----

    // Ten minutes of ticks at 20 Hz, weaving about the line with a marker every 2000 ticks
    let records: Vec<LogRecord> = (0..12_000u32)
        .map(|i| {
            let t = i as f64 * 0.05;
            let turn = 5.0 * (t * 2.0).sin();

            LogRecord {
                timestamp_s: t,
                reflection: 30.0 - 2.0 * turn,
                left_speed: 15.0 + turn,
                right_speed: 15.0 - turn,
                marker_count: i / 2000,
            }
        })
        .collect();

    let params = Params::default();

    c.bench_function("reconstruct", |b| {
        b.iter(|| reconstruct(black_box(&records), black_box(&params)))
    });
}

criterion_group!(benches, recon_benchmark);
criterion_main!(benches);
