// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_index::{Aabb2D, Backend, PointIndex, QuadTree, UniformGrid};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Points in the unit square.
fn gen_uniform_points(count: usize, seed: u64) -> Vec<(f64, f64)> {
    let mut rng = Rng::new(seed);
    (0..count).map(|_| (rng.next_f64(), rng.next_f64())).collect()
}

/// Tight hot spots inside the unit square, like city centers on a world map.
fn gen_hotspot_points(n_spots: usize, per_spot: usize, spread: f64) -> Vec<(f64, f64)> {
    let mut rng = Rng::new(0xC0FFEE);
    let mut out = Vec::with_capacity(n_spots * per_spot);
    for _ in 0..n_spots {
        let cx = rng.next_f64();
        let cy = rng.next_f64();
        for _ in 0..per_spot {
            let x = (cx + (rng.next_f64() - 0.5) * spread).clamp(0.0, 1.0);
            let y = (cy + (rng.next_f64() - 0.5) * spread).clamp(0.0, 1.0);
            out.push((x, y));
        }
    }
    out
}

fn fill<B: Backend>(idx: &mut PointIndex<u32, B>, points: &[(f64, f64)]) {
    idx.reserve(points.len());
    for (i, &(x, y)) in points.iter().enumerate() {
        idx.insert(x, y, i as u32);
    }
}

/// Query a square of side `span` around every point, summing hit counts.
fn query_all<B: Backend>(idx: &PointIndex<u32, B>, points: &[(f64, f64)], span: f64) -> usize {
    let half = span / 2.0;
    points
        .iter()
        .map(|&(x, y)| idx.query_rect(Aabb2D::around(x, y, half, half)).count())
        .sum()
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");
    for &n in &[1_000_usize, 10_000, 50_000] {
        let points = gen_uniform_points(n, 42);
        let span = 0.01;
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("build_n{n}"), |b| {
            b.iter_batched(
                || PointIndex::<u32, UniformGrid>::with_uniform_grid(span),
                |mut idx| {
                    fill(&mut idx, &points);
                    black_box(idx.len())
                },
                BatchSize::SmallInput,
            );
        });
        let mut idx = PointIndex::<u32, UniformGrid>::with_uniform_grid(span);
        fill(&mut idx, &points);
        group.bench_function(format!("query_each_n{n}"), |b| {
            b.iter(|| black_box(query_all(&idx, &points, span)));
        });
    }
    group.finish();
}

fn bench_quadtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree");
    let world = Aabb2D::new(0.0, 0.0, 1.0, 1.0);
    for &n in &[1_000_usize, 10_000, 50_000] {
        let points = gen_uniform_points(n, 42);
        let span = 0.01;
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("build_n{n}"), |b| {
            b.iter_batched(
                || PointIndex::<u32, QuadTree>::with_quadtree(world),
                |mut idx| {
                    fill(&mut idx, &points);
                    black_box(idx.len())
                },
                BatchSize::SmallInput,
            );
        });
        let mut idx = PointIndex::<u32, QuadTree>::with_quadtree(world);
        fill(&mut idx, &points);
        group.bench_function(format!("query_each_n{n}"), |b| {
            b.iter(|| black_box(query_all(&idx, &points, span)));
        });
    }
    group.finish();
}

fn bench_hotspots(c: &mut Criterion) {
    let mut group = c.benchmark_group("hotspots");
    let points = gen_hotspot_points(20, 500, 0.002);
    let span = 0.0005;
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("grid_build_query", |b| {
        b.iter(|| {
            let mut idx = PointIndex::<u32, UniformGrid>::with_uniform_grid(span);
            fill(&mut idx, &points);
            black_box(query_all(&idx, &points, span))
        });
    });
    let world = Aabb2D::new(0.0, 0.0, 1.0, 1.0);
    group.bench_function("quadtree_build_query", |b| {
        b.iter(|| {
            let mut idx = PointIndex::<u32, QuadTree>::with_quadtree(world);
            fill(&mut idx, &points);
            black_box(query_all(&idx, &points, span))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_grid, bench_quadtree, bench_hotspots);
criterion_main!(benches);
