//! Benchmarks for index computation and compositing

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cropsense_algorithms::imagery::{composite, median_composite, ndvi, CompositeParams};
use cropsense_core::{BandSet, GeoTransform, ImageStack, Observation, Raster};

fn create_band(size: usize, base: f64) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64 * 10.0, 10.0, -10.0));
    for row in 0..size {
        for col in 0..size {
            let v = base + ((row * 7 + col * 13) % 200) as f64;
            r.set(row, col, v).unwrap();
        }
    }
    r
}

fn bench_ndvi(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/ndvi");
    for size in [256, 512, 1024, 2048] {
        let nir = create_band(size, 300.0);
        let red = create_band(size, 100.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| ndvi(black_box(&nir), black_box(&red)).unwrap())
        });
    }
    group.finish();
}

fn bench_median(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/median_composite");
    for size in [256, 512, 1024] {
        let dates: Vec<Raster<f64>> = (0..12).map(|i| create_band(size, i as f64 * 17.0)).collect();
        let refs: Vec<&Raster<f64>> = dates.iter().collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| median_composite(black_box(&refs)).unwrap())
        });
    }
    group.finish();
}

fn bench_composite(c: &mut Criterion) {
    let size = 512;
    let observations: Vec<Observation> = (0..8)
        .map(|i| {
            let bands = ["B2", "B3", "B4", "B8", "B11", "B12"]
                .iter()
                .enumerate()
                .map(|(b, name)| (*name, create_band(size, (i * 11 + b * 50) as f64)))
                .collect();
            Observation {
                id: format!("obs{}", i),
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
                cloud_cover: (i * 3) as f64,
                bands: BandSet::new(bands).unwrap(),
            }
        })
        .collect();
    let stack = ImageStack::from_observations(observations).unwrap();
    let params = CompositeParams::default();

    c.bench_function("imagery/composite_4_indices_512", |b| {
        b.iter(|| composite(black_box(&stack), black_box(&params)).unwrap())
    });
}

criterion_group!(benches, bench_ndvi, bench_median, bench_composite);
criterion_main!(benches);
