//! Benchmarks for tree construction and k-nn search

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vptree::{BuildConfig, MetricSpace, VPTree};

#[derive(Clone)]
struct Point(Vec<f32>);

impl MetricSpace for Point {
    type Distance = f32;
    type Context = ();

    fn distance(&self, other: &Self, _: &()) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

fn create_random_points(n: usize, dim: usize) -> Vec<Point> {
    (0..n)
        .map(|_| Point((0..dim).map(|_| rand::random::<f32>()).collect()))
        .collect()
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for size in [1000, 10000].iter() {
        let points = create_random_points(*size, 8);

        for &parallel in &[false, true] {
            let id = format!("{}/{}", if parallel { "parallel" } else { "serial" }, size);
            group.bench_function(BenchmarkId::from_parameter(id), |b| {
                b.iter(|| {
                    let config = BuildConfig::default().seed(1);
                    if parallel {
                        VPTree::build_parallel(black_box(&points), &(), config).unwrap()
                    } else {
                        VPTree::build(black_box(&points), &(), config).unwrap()
                    }
                });
            });
        }
    }

    group.finish();
}

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in [1000, 10000, 100000].iter() {
        let points = create_random_points(*size, 8);
        let tree = VPTree::build(&points, &(), BuildConfig::default().seed(1).leaf_size(4)).unwrap();
        let query = Point(vec![0.5; 8]);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| tree.find_nearest_k(black_box(&query), black_box(10)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_build, benchmark_search);
criterion_main!(benches);
