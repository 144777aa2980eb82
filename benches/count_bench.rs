//! Counting and mapping benchmarks

use std::rc::Rc;

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion,
};
use iterkit::*;

fn entries(len: usize) -> Vec<(Key, u64)> {
    (0..len).map(|i| (Key::from(i), i as u64)).collect()
}

fn wrapped(leaf: Rc<dyn Fn() -> Source<u64>>, depth: usize) -> Source<u64> {
    if depth == 0 {
        return leaf();
    }
    aggregate(move || wrapped(Rc::clone(&leaf), depth - 1))
}

fn benchmark_count_strategies(c: &mut Criterion) {
    let counter = Counter::new(IterableConfig::default());
    let mut group = c.benchmark_group("count");

    for len in [1_000usize, 100_000] {
        group.bench_with_input(BenchmarkId::new("native", len), &len, |b, &len| {
            b.iter_batched(
                || Source::from(Structure::from_entries(entries(len))),
                |mut source| black_box(counter.count(&mut source)),
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("resolved", len), &len, |b, &len| {
            b.iter(|| {
                let leaf: Rc<dyn Fn() -> Source<u64>> =
                    Rc::new(move || Source::iterator(ArrayIterator::new(entries(len))));
                let mut source = wrapped(leaf, 8);
                black_box(counter.count(&mut source))
            });
        });

        group.bench_with_input(BenchmarkId::new("traversal", len), &len, |b, &len| {
            b.iter(|| {
                let leaf: Rc<dyn Fn() -> Source<u64>> =
                    Rc::new(move || Source::lazy((0..len).map(|i| (Key::from(i), i as u64))));
                let mut source = wrapped(leaf, 8);
                black_box(counter.count(&mut source))
            });
        });
    }
    group.finish();
}

fn benchmark_window(c: &mut Criterion) {
    let mapper = WindowedMapper::new(IterableConfig::default());

    c.bench_function("map_window_tail_of_100000", |b| {
        b.iter(|| {
            let source = Source::lazy((0..100_000usize).map(|i| (Key::from(i), i as u64)));
            black_box(mapper.map_window(
                source,
                |value, _, _| Ok(value * 2),
                Window::new(99_000, 0),
            ))
        });
    });
}

criterion_group!(benches, benchmark_count_strategies, benchmark_window);
criterion_main!(benches);
