// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cluster manager driven by a simulated camera.
//!
//! A printing renderer receives clusters from the background worker while the
//! "user" zooms in step by step, pans without zooming, and zooms back out.
//! Rapid zoom changes supersede each other; only the newest result is shown.
//!
//! Run:
//! - `cargo run -p understory_demos --example manager_zoom`
//! - `RUST_LOG=understory_cluster=debug cargo run -p understory_demos --example manager_zoom`

use std::sync::{Arc, mpsc};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_cluster::{
    CameraPosition, CameraSource, ClusterError, ClusterManager, ClusterRenderer, ClusterSet,
    LatLng,
};

/// Camera the demo moves by hand.
struct SimCamera(Mutex<CameraPosition>);

impl SimCamera {
    fn move_to(&self, position: CameraPosition) {
        *self.0.lock() = position;
    }
}

impl CameraSource for SimCamera {
    fn camera_position(&self) -> CameraPosition {
        *self.0.lock()
    }
}

/// Prints each delivery and signals the main thread.
struct PrintRenderer(mpsc::Sender<f64>);

impl ClusterRenderer<LatLng> for PrintRenderer {
    fn on_clusters_changed(&mut self, clusters: Arc<ClusterSet<LatLng>>) {
        let largest = clusters.iter().map(|c| c.size()).max().unwrap_or(0);
        println!(
            "zoom {:>4}: {} cluster(s), largest holds {largest}",
            clusters.zoom(),
            clusters.len()
        );
        let _ = self.0.send(clusters.zoom());
    }

    fn on_add(&mut self) {
        println!("renderer attached");
    }

    fn on_remove(&mut self) {
        println!("renderer detached");
    }
}

/// A loose ring of points around `center`.
fn ring(center: (f64, f64), count: usize, radius: f64) -> Result<Vec<LatLng>, ClusterError> {
    (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * std::f64::consts::TAU;
            LatLng::new(center.0 + radius * angle.sin(), center.1 + radius * angle.cos())
        })
        .collect()
}

fn main() -> Result<(), ClusterError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let home = LatLng::new(47.37, 8.54)?;
    let camera = Arc::new(SimCamera(Mutex::new(CameraPosition::new(home, 3.0))));
    let (tx, rx) = mpsc::channel();
    let manager = ClusterManager::builder(Arc::clone(&camera), PrintRenderer(tx)).build()?;

    manager.add_items(ring((47.37, 8.54), 40, 0.05)?);
    manager.add_items(ring((46.20, 6.14), 25, 0.03)?);
    manager.on_camera_change(&camera.camera_position())?;
    let _ = rx.recv_timeout(Duration::from_secs(5));

    info!("zooming in");
    for zoom in [6.0, 9.0, 12.0, 15.0] {
        let position = CameraPosition::new(home, zoom);
        camera.move_to(position);
        manager.on_camera_change(&position)?;
        let _ = rx.recv_timeout(Duration::from_secs(5));
    }

    info!("panning without zooming");
    let panned = CameraPosition {
        target: LatLng::new(47.40, 8.60)?,
        ..camera.camera_position()
    };
    camera.move_to(panned);
    if manager.on_camera_change(&panned)?.is_none() {
        println!("pan ignored: zoom unchanged");
    }

    info!("rapid zoom out");
    for zoom in [11.0, 7.0, 4.0] {
        let position = CameraPosition::new(home, zoom);
        camera.move_to(position);
        manager.on_camera_change(&position)?;
    }
    while let Ok(zoom) = rx.recv_timeout(Duration::from_millis(500)) {
        if zoom == 4.0 {
            break;
        }
    }

    let stats = manager.cache_stats();
    println!(
        "cache: {} hit(s), {} miss(es), {} level(s) held",
        stats.hits, stats.misses, stats.entries
    );
    Ok(())
}
