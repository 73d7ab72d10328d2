// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_cluster::{
    Algorithm, CachingAlgorithm, ClusterConfig, DistanceBasedAlgorithm, IndexStrategy, LatLng,
};

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

/// Items scattered around a handful of "cities".
fn gen_items(count: usize) -> Vec<LatLng> {
    let mut rng = Rng::new(7);
    let cities = [
        (48.85, 2.35),
        (51.51, -0.13),
        (40.71, -74.01),
        (35.68, 139.69),
        (-33.87, 151.21),
    ];
    (0..count)
        .map(|i| {
            let (lat, lng) = cities[i % cities.len()];
            let lat = lat + (rng.next_f64() - 0.5) * 2.0;
            let lng = lng + (rng.next_f64() - 0.5) * 2.0;
            LatLng::new(lat, lng).expect("generated positions are in range")
        })
        .collect()
}

fn algorithm(index: IndexStrategy, items: &[LatLng]) -> DistanceBasedAlgorithm<LatLng> {
    let mut alg = DistanceBasedAlgorithm::with_config(&ClusterConfig {
        index,
        ..ClusterConfig::default()
    });
    alg.add_items(items.to_vec());
    alg
}

fn bench_strategies(c: &mut Criterion) {
    for (name, index) in [("grid", IndexStrategy::Grid), ("quadtree", IndexStrategy::QuadTree)] {
        let mut group = c.benchmark_group(format!("clusters_{name}"));
        for &n in &[1_000_usize, 10_000] {
            let alg = algorithm(index, &gen_items(n));
            group.throughput(Throughput::Elements(n as u64));
            for zoom in [3.0, 8.0, 14.0] {
                group.bench_function(format!("n{n}_z{zoom}"), |b| {
                    b.iter(|| black_box(alg.clusters(black_box(zoom)).len()));
                });
            }
        }
        group.finish();
    }
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    let items = gen_items(10_000);
    let cached = CachingAlgorithm::<LatLng, _>::new(algorithm(IndexStrategy::Grid, &items));
    cached.clusters(8.0);
    group.bench_function("hit_n10000", |b| {
        b.iter(|| black_box(cached.clusters(black_box(8.4)).len()));
    });
    group.finish();
}

criterion_group!(benches, bench_strategies, bench_cache);
criterion_main!(benches);
