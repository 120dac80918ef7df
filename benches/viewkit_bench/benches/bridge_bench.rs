//! Push-to-pull bridge benchmarks
//!
//! Measures the cost of moving values from a synchronous producer through
//! the bridge buffer to an async consumer.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures_util::StreamExt;
use std::convert::Infallible;
use viewkit_core::bridge::{from_fn, Observer};
use viewkit_core::{BufferPolicy, CancellationToken, Notifier, PushSourceExt};

fn bench_single_producer(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .expect("failed to build runtime");
    let mut group = c.benchmark_group("bridge_single_producer");

    for count in [100usize, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        for (label, policy) in [
            ("unbounded", BufferPolicy::Unbounded),
            ("drop_oldest_1024", BufferPolicy::DropOldest(1024)),
        ] {
            group.bench_with_input(BenchmarkId::new(label, count), &count, |b, &count| {
                b.iter(|| {
                    runtime.block_on(async {
                        let source = from_fn(move |observer: Observer<usize, Infallible>| {
                            std::thread::spawn(move || {
                                for i in 0..count {
                                    observer.next(i);
                                }
                                observer.complete();
                            });
                            || {}
                        });
                        source
                            .into_stream_with(policy, CancellationToken::new())
                            .fold(0usize, |n, _| async move { n + 1 })
                            .await
                    })
                })
            });
        }
    }

    group.finish();
}

fn bench_notifier_fan_out(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .expect("failed to build runtime");
    let mut group = c.benchmark_group("notifier_fan_out");

    for subscribers in [1usize, 8, 64] {
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, &subscribers| {
                b.iter(|| {
                    runtime.block_on(async {
                        let notifier: Notifier<u32> = Notifier::new();
                        let consumers: Vec<_> = (0..subscribers)
                            .map(|_| {
                                let stream = notifier.clone().into_stream(CancellationToken::new());
                                tokio::spawn(stream.count())
                            })
                            .collect();
                        while notifier.subscriber_count() < subscribers {
                            tokio::task::yield_now().await;
                        }
                        for i in 0..100 {
                            notifier.emit(i);
                        }
                        notifier.complete();
                        for consumer in consumers {
                            let _ = consumer.await;
                        }
                    })
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_single_producer, bench_notifier_fan_out);
criterion_main!(benches);
