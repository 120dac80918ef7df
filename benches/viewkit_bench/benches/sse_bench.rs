//! SSE formatting benchmarks
//!
//! Measures event framing and the write path into an in-memory sink.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures_util::stream;
use serde::Serialize;
use std::convert::Infallible;
use viewkit_core::sse::strip_line_breaks;
use viewkit_core::{CancellationToken, MemorySink, SseEvent, SseWriter};

#[derive(Serialize)]
struct Row {
    id: u32,
    name: String,
    done: bool,
}

fn html_block(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("<li class=\"item\">Item {}</li>", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_strip_line_breaks(c: &mut Criterion) {
    let mut group = c.benchmark_group("strip_line_breaks");

    let clean = "<div class=\"toast\">Saved</div>".repeat(20);
    group.bench_function("no_breaks", |b| {
        b.iter(|| strip_line_breaks(black_box(&clean)).len())
    });

    let multiline = html_block(40);
    group.bench_function("multiline", |b| {
        b.iter(|| strip_line_breaks(black_box(&multiline)).len())
    });

    group.finish();
}

fn bench_event_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_format");

    for lines in [1usize, 10, 100] {
        let html = html_block(lines);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::new("html", lines), &html, |b, html| {
            b.iter(|| SseEvent::html("update", html.as_str()).to_sse_string())
        });
    }

    let rows: Vec<Row> = (0..50)
        .map(|id| Row {
            id,
            name: format!("row {}", id),
            done: id % 2 == 0,
        })
        .collect();
    group.bench_function("json_chunks_50", |b| {
        b.iter(|| {
            SseEvent::json_chunks("rows", black_box(&rows))
                .map(|event| event.to_sse_string())
                .unwrap_or_default()
        })
    });

    group.finish();
}

fn bench_writer(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");
    let mut group = c.benchmark_group("writer");

    for count in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("events", count), &count, |b, &count| {
            b.iter(|| {
                runtime.block_on(async {
                    let events = stream::iter(
                        (0..count).map(|i| Ok::<_, Infallible>(SseEvent::new("tick", i.to_string()))),
                    );
                    let mut writer = SseWriter::new(MemorySink::new());
                    let _ = writer.stream(events, &CancellationToken::new()).await;
                    writer.events_written()
                })
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_strip_line_breaks,
    bench_event_format,
    bench_writer
);
criterion_main!(benches);
