// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clustering without a manager.
//!
//! Cluster a handful of points of interest at several zoom levels, once per
//! index strategy, and print what each zoom level shows.
//!
//! Run:
//! - `cargo run -p understory_demos --example basic_clustering`
//! - `RUST_LOG=understory_cluster=trace cargo run -p understory_demos --example basic_clustering`

use tracing_subscriber::EnvFilter;
use understory_cluster::{
    Algorithm, CachingAlgorithm, ClusterConfig, ClusterError, ClusterItem, DistanceBasedAlgorithm,
    IndexStrategy, LatLng,
};

#[derive(Clone, Debug, PartialEq)]
struct Poi {
    name: &'static str,
    at: LatLng,
}

impl ClusterItem for Poi {
    fn position(&self) -> LatLng {
        self.at
    }
}

fn pois() -> Result<Vec<Poi>, ClusterError> {
    let raw = [
        ("Louvre", 48.8606, 2.3376),
        ("Notre-Dame", 48.8530, 2.3499),
        ("Eiffel Tower", 48.8584, 2.2945),
        ("Versailles", 48.8049, 2.1204),
        ("Big Ben", 51.5007, -0.1246),
        ("Tower Bridge", 51.5055, -0.0754),
    ];
    raw.into_iter()
        .map(|(name, lat, lng)| LatLng::new(lat, lng).map(|at| Poi { name, at }))
        .collect()
}

fn main() -> Result<(), ClusterError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let items = pois()?;
    for index in [IndexStrategy::Grid, IndexStrategy::QuadTree] {
        let config = ClusterConfig {
            index,
            ..ClusterConfig::default()
        };
        config.validate()?;
        let inner = DistanceBasedAlgorithm::with_config(&config);
        let mut alg = CachingAlgorithm::<Poi, _>::new(inner);
        alg.add_items(items.clone());

        println!("== {index:?} ==");
        for zoom in [2.0, 8.0, 11.0, 14.0, 8.5] {
            let set = alg.clusters(zoom);
            println!("zoom {zoom:>4}: {} cluster(s)", set.len());
            for cluster in set.iter() {
                let names: Vec<_> = cluster.items().iter().map(|p| p.name).collect();
                println!("  {} {names:?}", cluster.position());
            }
        }
        let stats = alg.stats();
        println!("cache: {} hit(s), {} miss(es)\n", stats.hits, stats.misses);
    }
    Ok(())
}
