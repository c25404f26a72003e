use cloudpelican::clock::SystemClock;
use cloudpelican::compressor;
use cloudpelican::transport::serialize_fields;
use cloudpelican::{Config, Event, ManualTimer, Mode, NullDispatcher, Pipeline};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::Duration;

const BATCH_SIZE: usize = 20;

fn sample_batch() -> Vec<Event> {
    (0..BATCH_SIZE)
        .map(|i| {
            [
                ("msg", format!("Request {i} failed: upstream timeout after 3000ms (GET /api/orders)")),
                ("host", "shop.example.org".to_owned()),
                ("dt", (1_700_000_000_000u64 + i as u64).to_string()),
                ("error", "1".to_owned()),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

fn bench_compression(c: &mut Criterion) {
    let fields = serialize_fields(&sample_batch(), Mode::Bulk);
    let lzw = compressor::encode(&fields);
    let lz4 = lz4_flex::compress_prepend_size(fields.as_bytes());
    println!(
        "\nPayload {} bytes, LZW token stream {} bytes, lz4 {} bytes (binary, not URL-safe)",
        fields.len(),
        lzw.len(),
        lz4.len()
    );

    let mut group = c.benchmark_group("Compression");
    group.bench_function("lzw_encode", |b| {
        b.iter(|| compressor::encode(black_box(&fields)))
    });
    group.bench_function("lz4_flex_compress", |b| {
        b.iter(|| lz4_flex::compress_prepend_size(black_box(fields.as_bytes())))
    });
    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let batch = sample_batch();
    c.bench_function("serialize_bulk_batch", |b| {
        b.iter(|| serialize_fields(black_box(&batch), Mode::Bulk))
    });
}

fn bench_logging(c: &mut Criterion) {
    let timer = Arc::new(ManualTimer::new());
    let pipeline = Pipeline::with_runtime(
        Config::new("bench").with_deduplication(false),
        Arc::new(NullDispatcher),
        timer.clone(),
        Arc::new(SystemClock),
    )
    .unwrap();

    c.bench_function("log_and_flush_window", |b| {
        b.iter(|| {
            for i in 0..BATCH_SIZE {
                pipeline.log("Test perf: iteration", false, [("i", i)]);
            }
            timer.advance(Duration::from_millis(200));
        })
    });
}

criterion_group!(benches, bench_compression, bench_serialization, bench_logging);
criterion_main!(benches);
