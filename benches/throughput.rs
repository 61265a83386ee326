//! Sink write throughput benchmarks
//!
//! Run with: `cargo bench --bench throughput`
//!
//! # What we measure
//!
//! - Exclusive-access wrapper overhead on an in-memory device
//! - Buffered writes (record accepted into memory, flushed in bulk)
//! - Fan-out to several in-memory devices
//! - Full `open` composition writing to real files

use std::hint::black_box;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quantum_sink::sinks::{add_sync, buffer, lock, new_multi_write_syncer, open, SharedWriteSyncer};
use quantum_sink::{BufferConfig, OutputConfig, SinkConfig, WriteSyncer};
use tempfile::TempDir;

const RECORD_SIZES: [usize; 3] = [64, 256, 1024];

fn record(size: usize) -> Vec<u8> {
    let mut record = vec![b'x'; size];
    if let Some(last) = record.last_mut() {
        *last = b'\n';
    }
    record
}

/// 丢弃所有字节的设备
fn discard() -> SharedWriteSyncer {
    Arc::new(add_sync(io::sink()))
}

fn bench_locked(c: &mut Criterion) {
    let mut group = c.benchmark_group("locked_write");

    for size in RECORD_SIZES {
        let data = record(size);
        let sink = lock(discard());

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| sink.write(black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_buffered(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffered_write");

    for size in RECORD_SIZES {
        let data = record(size);
        let (sink, closer) = buffer(discard(), 0, Duration::from_secs(60)).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| sink.write(black_box(data)).unwrap());
        });

        closer.close().unwrap();
    }

    group.finish();
}

fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout_write");
    let data = record(256);

    for destinations in [2usize, 4, 8] {
        let sink = new_multi_write_syncer((0..destinations).map(|_| lock(discard())));

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(destinations),
            &data,
            |b, data| {
                b.iter(|| sink.write(black_box(data)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_opened_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("opened_file_write");
    let data = record(256);
    let dir = TempDir::new().unwrap();

    for buffered in [false, true] {
        let config = SinkConfig {
            outputs: vec![OutputConfig::File {
                path: dir.path().join(format!("bench-{}.log", buffered)),
                create_dirs: true,
            }],
            lock: true,
            buffer: buffered.then(BufferConfig::default),
        };
        let opened = open(&config).unwrap();
        let sink = opened.sink();

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("buffered", buffered),
            &data,
            |b, data| {
                b.iter(|| sink.write(black_box(data)).unwrap());
            },
        );

        opened.close().unwrap();
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_locked,
    bench_buffered,
    bench_fanout,
    bench_opened_files
);
criterion_main!(benches);
