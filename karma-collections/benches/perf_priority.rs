//! Benchmarks for priority and container operations.
//!
//! The sorted view is recomputed per access, so these track how far the
//! lazy-sort approach carries before a heap would be warranted.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use karma_collections::{Container, PriorityCollection, PriorityVec};

fn bench_sorted_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_view");

    for size in [16usize, 128, 1024] {
        group.bench_with_input(BenchmarkId::new("priority_vec", size), &size, |b, &size| {
            let mut q: PriorityVec<u64> = PriorityVec::with_capacity(size);
            for i in 0..size as u64 {
                q.add_with(i, ((i * 7 + 13) % size as u64) as f64);
            }
            b.iter(|| black_box(q.sorted_collect().len()));
        });
    }

    group.finish();
}

fn bench_cursor_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor_drain");

    for size in [16usize, 128] {
        group.bench_with_input(BenchmarkId::new("priority_vec", size), &size, |b, &size| {
            b.iter(|| {
                let mut q: PriorityVec<u64> = PriorityVec::with_capacity(size);
                for i in 0..size as u64 {
                    q.add_with(i, ((i * 7 + 13) % size as u64) as f64);
                }
                while q.next().is_some() {
                    black_box(q.consume());
                }
            });
        });
    }

    group.finish();
}

fn bench_container(c: &mut Criterion) {
    let mut group = c.benchmark_group("container");

    group.bench_function("insert_remove/64", |b| {
        b.iter(|| {
            let mut set: Container<u64> = Container::new(64);
            for i in 0..64u64 {
                set.try_insert(black_box(i)).unwrap();
            }
            for i in 0..64u64 {
                black_box(set.remove(&i));
            }
        });
    });

    group.bench_function("merge/64x64", |b| {
        b.iter(|| {
            let mut a: Container<u64> = Container::new(64);
            let mut b_side: Container<u64> = Container::new(64);
            for i in 0..64u64 {
                a.try_insert(i).unwrap();
                b_side.try_insert(i + 32).unwrap();
            }
            black_box(a.merge(b_side).len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_sorted_view, bench_cursor_drain, bench_container);
criterion_main!(benches);
