// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_cluster --heading-base-level=0

//! Understory Cluster: zoom-aware clustering of geo-positioned items.
//!
//! Given many items with a latitude/longitude, this crate groups the ones that
//! would overlap on screen at a given map zoom into clusters, and keeps a
//! renderer supplied with fresh clusters as the zoom changes.
//!
//! - [`DistanceBasedAlgorithm`]: greedy single-pass clustering over a spatial index from
//!   [`understory_index`]. Near O(n) per zoom level.
//! - [`CachingAlgorithm`]: memoizes results per whole zoom level and drops them on any mutation.
//! - [`ClusterManager`]: owns the algorithm behind a reader/writer lock, computes on a
//!   background thread, and delivers only the newest result to a [`ClusterRenderer`].
//!
//! ## Using an algorithm directly
//!
//! ```rust
//! use understory_cluster::{Algorithm, DistanceBasedAlgorithm, LatLng};
//!
//! let mut alg = DistanceBasedAlgorithm::new();
//! alg.add_items(vec![
//!     LatLng::new(0.0, 0.0).unwrap(),
//!     LatLng::new(0.0, 0.0001).unwrap(),
//!     LatLng::new(10.0, 10.0).unwrap(),
//! ]);
//!
//! // Zoomed out, the two nearby points merge.
//! assert_eq!(alg.clusters(10.0).len(), 2);
//! // Zoomed in, everything stands alone.
//! assert_eq!(alg.clusters(20.0).len(), 3);
//! ```
//!
//! ## Driving a renderer
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::mpsc;
//!
//! use understory_cluster::{
//!     CameraPosition, CameraSource, ClusterManager, ClusterRenderer, ClusterSet, LatLng,
//! };
//!
//! struct FixedCamera;
//!
//! impl CameraSource for FixedCamera {
//!     fn camera_position(&self) -> CameraPosition {
//!         CameraPosition::new(LatLng::new(0.0, 0.0).unwrap(), 4.0)
//!     }
//! }
//!
//! struct Forward(mpsc::Sender<usize>);
//!
//! impl ClusterRenderer<LatLng> for Forward {
//!     fn on_clusters_changed(&mut self, clusters: Arc<ClusterSet<LatLng>>) {
//!         let _ = self.0.send(clusters.item_count());
//!     }
//! }
//!
//! let (tx, rx) = mpsc::channel();
//! let manager = ClusterManager::builder(FixedCamera, Forward(tx)).build().unwrap();
//! manager.add_item(LatLng::new(48.85, 2.35).unwrap());
//! manager.cluster().unwrap();
//! assert_eq!(rx.recv().unwrap(), 1);
//! ```
//!
//! ## Concurrency
//!
//! Mutations take the algorithm's write lock; computations take its read lock
//! on the manager's single worker thread. Every [`ClusterManager::cluster`] call
//! starts a new [`Generation`] and cancels the previous one. A result is handed
//! to the renderer only if its generation is still the newest at that moment,
//! so a slow, superseded computation can never overwrite a newer result.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (cache hits and invalidations, computation
//! and delivery, discarded results, worker lifecycle) and never installs a subscriber.

mod algorithm;
mod cluster;
mod config;
mod error;
mod geo;
mod manager;
pub mod projection;

pub use algorithm::{
    Algorithm, CacheStats, CachingAlgorithm, CancelToken, DistanceBasedAlgorithm, Generations,
};
pub use cluster::{Cluster, ClusterSet};
pub use config::{ClusterConfig, IndexStrategy};
pub use error::{Cancelled, ClusterError};
pub use geo::{ClusterItem, LatLng};
pub use manager::{
    CameraPosition, CameraSource, ClusterClickFn, ClusterInfoWindowClickFn, ClusterManager,
    ClusterManagerBuilder, ClusterRenderer, Generation, ItemClickFn, ItemInfoWindowClickFn,
    Listeners, MarkerId, MarkerManager,
};
