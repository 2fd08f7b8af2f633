//! Benchmarks for 2D nesting operations.
//!
//! Measures Minkowski differences, NFP queries against filled containers,
//! and full nesting runs at various scales.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polynest_d2::{
    find_nfp, minkowski_difference, Container, ContainerSize, MinkowskiCache, Packing, Placement,
    Polygon, SortStrategy, Strategy,
};

fn bench_minkowski(c: &mut Criterion) {
    let mut group = c.benchmark_group("minkowski_difference");

    let square = Polygon::square(10.0);
    let rect = Polygon::rectangle(20.0, 5.0);
    let l = Polygon::l_shape(20.0, 20.0, 8.0, 8.0);

    group.bench_function("convex", |b| {
        b.iter(|| minkowski_difference(black_box(&square), black_box(&rect)))
    });
    group.bench_function("non_convex", |b| {
        b.iter(|| minkowski_difference(black_box(&l), black_box(&l)))
    });
    group.finish();
}

fn bench_find_nfp(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_nfp");
    let size = ContainerSize::new(200.0, 200.0).unwrap();
    let candidate = Polygon::rectangle(15.0, 10.0);

    for &n in &[4, 16, 36] {
        let side = (n as f64).sqrt() as usize;
        let placements: Vec<Placement> = (0..n)
            .map(|i| {
                let sq = Polygon::square(20.0);
                let x = (i % side) as f64 * 20.0;
                let y = (i / side) as f64 * 20.0;
                Placement::new(sq.clone(), sq, (x, y))
            })
            .collect();
        let container = Container::with_placements(placements);

        group.bench_with_input(BenchmarkId::new("squares", n), &container, |b, container| {
            // warm cache: union and clip dominate
            let cache = MinkowskiCache::new();
            b.iter(|| find_nfp(black_box(container), size, black_box(&candidate), &cache))
        });
    }
    group.finish();
}

fn bench_nest_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("nest_all");
    group.sample_size(10);

    for &n in &[5, 10, 20] {
        let demand: Vec<(Polygon, usize)> = (0..n)
            .map(|i| {
                let w = 2.0 + (i * 3 % 7) as f64;
                let h = 1.0 + (i * 5 % 4) as f64;
                (Polygon::rectangle(w, h), 1)
            })
            .collect();
        let size = ContainerSize::new(20.0, 20.0).unwrap();

        for strategy in [Strategy::Initial, Strategy::Greedy] {
            group.bench_with_input(
                BenchmarkId::new(strategy.name(), n),
                &demand,
                |b, demand| {
                    b.iter(|| {
                        let mut packing = Packing::new(size, demand.clone()).unwrap();
                        let summary =
                            packing.nest_all(strategy, SortStrategy::DecreasingArea, None);
                        black_box(summary)
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_minkowski, bench_find_nfp, bench_nest_all);
criterion_main!(benches);
