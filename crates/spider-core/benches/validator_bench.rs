//! Criterion benchmarks for command classification.
//!
//! Measures the per-message cost of canonicalize + validate + acknowledgment
//! formatting, which runs once for every message a session receives.
//!
//! Run with:
//! ```bash
//! cargo bench --package spider-core --bench validator_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spider_core::{acknowledgment, canonicalize, validate_command};

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_command");
    for input in ["forward", "BACKWARD", "jump", ""] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{input:?}")), input, |b, s| {
            b.iter(|| validate_command(black_box(s)))
        });
    }
    group.finish();
}

fn bench_full_message_path(c: &mut Criterion) {
    c.bench_function("canonicalize_validate_ack", |b| {
        b.iter(|| {
            let candidate = canonicalize(black_box("  FoRwArD\r\n"));
            acknowledgment(&validate_command(&candidate))
        })
    });
}

criterion_group!(benches, bench_validate, bench_full_message_path);
criterion_main!(benches);
