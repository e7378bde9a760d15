//! Benchmarks for the host-to-render input queue

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec2;
use lumora_bridge::InputQueue;
use lumora_core::InputEvent;

fn pointer(i: usize) -> InputEvent {
    InputEvent::PointerMoved {
        position: Vec2::new(i as f32, 0.0),
    }
}

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("input_queue_push");

    for count in [64, 256, 1024] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("within_capacity", count), &count, |b, &count| {
            let queue = InputQueue::new(count);
            b.iter(|| {
                for i in 0..count {
                    queue.push(black_box(pointer(i)));
                }
                queue.drain()
            });
        });

        // Every push past the first 16 evicts the oldest event
        group.bench_with_input(BenchmarkId::new("overflowing", count), &count, |b, &count| {
            let queue = InputQueue::new(16);
            b.iter(|| {
                for i in 0..count {
                    queue.push(black_box(pointer(i)));
                }
                queue.drain()
            });
        });
    }

    group.finish();
}

fn bench_contended_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("input_queue_contended");
    let per_thread = 1_000;

    for threads in [2, 4] {
        group.throughput(Throughput::Elements((threads * per_thread) as u64));

        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            let queue = InputQueue::new(256);
            b.iter(|| {
                std::thread::scope(|scope| {
                    for _ in 0..threads {
                        scope.spawn(|| {
                            for i in 0..per_thread {
                                queue.push(pointer(i));
                            }
                        });
                    }
                    scope.spawn(|| {
                        for _ in 0..per_thread / 10 {
                            black_box(queue.drain());
                        }
                    });
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_push, bench_contended_push);
criterion_main!(benches);
