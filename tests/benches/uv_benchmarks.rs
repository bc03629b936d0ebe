//! # Universal Validator Benchmarks
//!
//! | Component | Operation | Target |
//! |-----------|-----------|--------|
//! | uv-03 Coordinator | election over 100 validators | < 50µs |
//! | uv-05 State Sync | candidate heights | < 1µs |
//! | uv-01 Transport | frame write + read, 64 KiB | < 100µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::executor::block_on;
use futures::io::Cursor;
use shared_types::{UniversalValidator, UvStatus};
use std::time::Duration;

use uv_01_transport::{read_frame, write_frame};
use uv_03_coordinator::select_coordinator;
use uv_05_state_sync::candidate_heights;

fn validator_set(size: usize) -> Vec<UniversalValidator> {
    (0..size)
        .map(|i| {
            let status = if i % 5 == 0 {
                UvStatus::PendingLeave
            } else {
                UvStatus::Active
            };
            UniversalValidator::new(format!("pushvaloper1{:040}", i), status)
        })
        .collect()
}

fn bench_coordinator_election(c: &mut Criterion) {
    let mut group = c.benchmark_group("uv-03-coordinator");
    group.measurement_time(Duration::from_secs(5));

    for size in [10usize, 100, 1000] {
        let validators = validator_set(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("select_coordinator", size), &validators, |b, v| {
            let mut block = 0i64;
            b.iter(|| {
                block += 100;
                black_box(select_coordinator(block, v, 100).is_ok())
            })
        });
    }
    group.finish();
}

fn bench_candidate_heights(c: &mut Criterion) {
    c.bench_function("uv-05-candidate-heights", |b| {
        b.iter(|| black_box(candidate_heights(black_box(12_345_678), 1000, 10)))
    });
}

fn bench_frame_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("uv-01-frame-codec");
    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let payload = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("write_read", size), &payload, |b, p| {
            b.iter(|| {
                let mut buf = Cursor::new(Vec::with_capacity(p.len() + 4));
                block_on(write_frame(&mut buf, p)).unwrap();
                let mut reader = Cursor::new(buf.into_inner());
                black_box(block_on(read_frame(&mut reader)).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_coordinator_election,
    bench_candidate_heights,
    bench_frame_codec
);
criterion_main!(benches);
