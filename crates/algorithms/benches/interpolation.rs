//! Benchmarks for neighbour search, variograms and kriging

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use windmesh_algorithms::interpolation::{
    knn, ordinary_kriging, semivariogram, ModelFamily, NeighborSearch, SamplePoint, VariogramFit,
};

fn create_samples(side: usize) -> Vec<SamplePoint> {
    let mut points = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let x = col as f64 * 100.0;
            let y = row as f64 * 100.0;
            let variation = ((row * 7 + col * 13) % 100) as f64 / 50.0;
            points.push(SamplePoint::new(x, y, (x / 900.0).sin() + (y / 700.0).cos() + variation));
        }
    }
    points
}

fn bench_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn");

    for side in [32, 64, 128].iter() {
        let samples = create_samples(*side);
        let coords: Vec<(f64, f64)> = samples.iter().map(|p| (p.x, p.y)).collect();
        let queries: Vec<(f64, f64)> = coords.iter().map(|&(x, y)| (x + 50.0, y + 50.0)).collect();

        group.bench_with_input(BenchmarkId::from_parameter(side), side, |b, _| {
            b.iter(|| knn(black_box(&coords), black_box(&queries), 16).unwrap())
        });
    }

    group.finish();
}

fn bench_semivariogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("semivariogram");

    for side in [16, 32, 48].iter() {
        let samples = create_samples(*side);

        group.bench_with_input(BenchmarkId::from_parameter(side), side, |b, _| {
            b.iter(|| semivariogram(black_box(&samples), 1500.0, 100.0).unwrap())
        });
    }

    group.finish();
}

fn bench_ordinary_kriging(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordinary_kriging");
    let fit = VariogramFit::new(ModelFamily::Exponential, 0.05, 1.0, 1200.0);
    let search = NeighborSearch::new(Some(16), None);

    for side in [16, 32, 64].iter() {
        let samples = create_samples(*side);
        let targets: Vec<(f64, f64)> = samples.iter().map(|p| (p.x + 50.0, p.y + 50.0)).collect();

        group.bench_with_input(BenchmarkId::from_parameter(side), side, |b, _| {
            b.iter(|| ordinary_kriging(black_box(&samples), black_box(&targets), &fit, &search).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_knn,
    bench_semivariogram,
    bench_ordinary_kriging
);
criterion_main!(benches);
