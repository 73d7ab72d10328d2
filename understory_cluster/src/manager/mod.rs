// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cluster coordinator.
//!
//! [`ClusterManager`] owns the algorithm behind a reader/writer lock and runs
//! every computation on one background thread. Each [`cluster`] call starts a
//! new generation; anything computed for an older generation is dropped before
//! it reaches the renderer.
//!
//! [`cluster`]: ClusterManager::cluster

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::algorithm::{Algorithm, CacheStats, CachingAlgorithm, DistanceBasedAlgorithm};
use crate::cluster::Cluster;
use crate::config::ClusterConfig;
use crate::error::{Cancelled, ClusterError};
use crate::geo::ClusterItem;

mod collaborators;
mod scheduler;

pub use collaborators::{
    CameraPosition, CameraSource, ClusterClickFn, ClusterInfoWindowClickFn, ClusterRenderer,
    ItemClickFn, ItemInfoWindowClickFn, Listeners, MarkerId, MarkerManager,
};
pub use scheduler::Generation;

use scheduler::{Job, Scheduler};

/// State reachable from both the manager and its worker.
struct Shared<T: ClusterItem> {
    algorithm: RwLock<CachingAlgorithm<T>>,
    renderer: Mutex<Box<dyn ClusterRenderer<T>>>,
    scheduler: Scheduler,
    precache: bool,
}

impl<T: ClusterItem> Shared<T> {
    fn run(&self) {
        debug!("cluster worker started");
        while let Some(job) = self.scheduler.next_job() {
            self.process(&job);
        }
        debug!("cluster worker stopped");
    }

    fn process(&self, job: &Job) {
        let generation = job.generation().get();
        if job.token.is_cancelled() {
            trace!(generation, "skipping superseded cluster job");
            return;
        }
        trace!(generation, zoom = job.zoom, "computing clusters");
        let result = self
            .algorithm
            .read()
            .clusters_cancellable(job.zoom, &job.token);
        let clusters = match result {
            Ok(clusters) => clusters,
            Err(Cancelled) => {
                debug!(generation, "cluster computation cancelled");
                return;
            }
        };

        let precache = {
            let state = self.scheduler.lock();
            if job.token.is_cancelled() || state.is_shutdown() {
                debug!(generation, "discarding superseded cluster result");
                return;
            }
            debug!(
                generation,
                zoom = job.zoom,
                clusters = clusters.len(),
                items = clusters.item_count(),
                "delivering clusters"
            );
            self.renderer.lock().on_clusters_changed(clusters);
            if !self.precache || state.has_pending() {
                return;
            }
            self.scheduler.precache_token()
        };

        // One read lock per level, so a writer waits for at most one computation.
        for level in <CachingAlgorithm<T>>::neighbor_levels(job.zoom) {
            if precache.is_cancelled()
                || !self.algorithm.read().precache_level(level, &precache)
            {
                trace!(generation, "precache interrupted");
                return;
            }
        }
    }
}

/// Groups items into clusters for the current zoom and keeps a renderer up to date.
///
/// Mutations go straight to the algorithm under its write lock and do not
/// re-cluster by themselves; call [`cluster`](Self::cluster) afterwards.
/// Computation runs on a background thread, one request at a time, and only
/// the result of the newest request is ever delivered.
///
/// Dropping the manager stops and joins the worker.
pub struct ClusterManager<T: ClusterItem> {
    shared: Arc<Shared<T>>,
    camera: Box<dyn CameraSource>,
    marker_manager: Option<Box<dyn MarkerManager>>,
    listeners: Mutex<Listeners<T>>,
    previous_zoom: Mutex<Option<f64>>,
    cache_capacity: usize,
    worker: Option<JoinHandle<()>>,
}

impl<T: ClusterItem> fmt::Debug for ClusterManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterManager")
            .field("items", &self.shared.algorithm.read().items().len())
            .field("latest", &self.shared.scheduler.latest())
            .field("listeners", &*self.listeners.lock())
            .finish_non_exhaustive()
    }
}

impl<T: ClusterItem> ClusterManager<T> {
    /// Start building a manager around a camera and a renderer.
    pub fn builder(
        camera: impl CameraSource,
        renderer: impl ClusterRenderer<T>,
    ) -> ClusterManagerBuilder<T> {
        ClusterManagerBuilder {
            camera: Box::new(camera),
            renderer: Box::new(renderer),
            config: ClusterConfig::default(),
            algorithm: None,
            marker_manager: None,
        }
    }

    /// Add one item.
    pub fn add_item(&self, item: T) {
        self.shared.scheduler.cancel_precache();
        self.shared.algorithm.write().add_item(item);
    }

    /// Add many items.
    pub fn add_items(&self, items: impl IntoIterator<Item = T>) {
        let items: Vec<T> = items.into_iter().collect();
        self.shared.scheduler.cancel_precache();
        self.shared.algorithm.write().add_items(items);
    }

    /// Remove one item equal to `item`, if present.
    pub fn remove_item(&self, item: &T) {
        self.shared.scheduler.cancel_precache();
        self.shared.algorithm.write().remove_item(item);
    }

    /// Remove every item.
    pub fn clear_items(&self) {
        self.shared.scheduler.cancel_precache();
        self.shared.algorithm.write().clear_items();
    }

    /// Snapshot of the current items.
    pub fn items(&self) -> Vec<T> {
        self.shared.algorithm.read().items()
    }

    /// Counters of the result cache in front of the current algorithm.
    pub fn cache_stats(&self) -> CacheStats {
        self.shared.algorithm.read().stats()
    }

    /// Generation of the most recent [`cluster`](Self::cluster) request.
    pub fn latest_generation(&self) -> Generation {
        self.shared.scheduler.latest()
    }

    /// Recompute clusters at the camera's current zoom.
    ///
    /// Cancels any computation in flight and replaces any request still
    /// waiting. Returns the new request's generation.
    pub fn cluster(&self) -> Result<Generation, ClusterError> {
        let zoom = self.camera.camera_position().zoom;
        if !zoom.is_finite() {
            return Err(ClusterError::InvalidZoom(zoom));
        }
        let generation = self.shared.scheduler.submit(zoom);
        trace!(generation = generation.get(), zoom, "cluster requested");
        Ok(generation)
    }

    /// Replace the algorithm, moving every current item into `algorithm`, then re-cluster.
    ///
    /// Items `algorithm` already holds are kept alongside the moved ones.
    pub fn set_algorithm(
        &self,
        algorithm: impl Algorithm<T> + 'static,
    ) -> Result<Generation, ClusterError> {
        self.shared.scheduler.cancel_precache();
        {
            let mut current = self.shared.algorithm.write();
            let mut next: Box<dyn Algorithm<T>> = Box::new(algorithm);
            let items = current.items();
            debug!(items = items.len(), "replacing cluster algorithm");
            next.add_items(items);
            *current = CachingAlgorithm::with_capacity(next, self.cache_capacity);
        }
        self.cluster()
    }

    /// Detach the current renderer, attach `renderer`, then re-cluster.
    pub fn set_renderer(
        &self,
        renderer: impl ClusterRenderer<T>,
    ) -> Result<Generation, ClusterError> {
        let listeners = self.listeners.lock().clone();
        {
            let mut current = self.shared.renderer.lock();
            current.set_listeners(Listeners::default());
            current.on_remove();
            *current = Box::new(renderer);
            current.on_add();
            current.set_listeners(listeners);
        }
        self.cluster()
    }

    /// Camera moved. Re-clusters only when the zoom changed since the last call.
    ///
    /// Returns the new generation, or `None` for a pan, tilt, or rotation.
    pub fn on_camera_change(
        &self,
        position: &CameraPosition,
    ) -> Result<Option<Generation>, ClusterError> {
        self.shared.renderer.lock().on_camera_change(position);
        let zoom = self.camera.camera_position().zoom;
        {
            let mut previous = self.previous_zoom.lock();
            if *previous == Some(zoom) {
                trace!(zoom, "camera moved without zoom change");
                return Ok(None);
            }
            *previous = Some(zoom);
        }
        self.cluster().map(Some)
    }

    /// Camera gesture finished. Only forwarded to the renderer.
    pub fn on_camera_change_finish(&self, position: &CameraPosition) {
        self.shared.renderer.lock().on_camera_change_finish(position);
    }

    /// Route a marker click. `false` when no marker manager is attached.
    pub fn on_marker_click(&self, marker: MarkerId) -> bool {
        self.marker_manager
            .as_ref()
            .is_some_and(|m| m.on_marker_click(marker))
    }

    /// Route an info window click.
    pub fn on_info_window_click(&self, marker: MarkerId) {
        if let Some(m) = &self.marker_manager {
            m.on_info_window_click(marker);
        }
    }

    /// Called when a cluster is clicked.
    pub fn set_on_cluster_click(&self, f: impl Fn(&Cluster<T>) -> bool + Send + Sync + 'static) {
        self.update_listeners(|l| l.cluster_click = Some(Arc::new(f)));
    }

    /// Called when a cluster's info window is clicked.
    pub fn set_on_cluster_info_window_click(
        &self,
        f: impl Fn(&Cluster<T>) + Send + Sync + 'static,
    ) {
        self.update_listeners(|l| l.cluster_info_window_click = Some(Arc::new(f)));
    }

    /// Called when a single item is clicked.
    pub fn set_on_item_click(&self, f: impl Fn(&T) -> bool + Send + Sync + 'static) {
        self.update_listeners(|l| l.item_click = Some(Arc::new(f)));
    }

    /// Called when a single item's info window is clicked.
    pub fn set_on_item_info_window_click(&self, f: impl Fn(&T) + Send + Sync + 'static) {
        self.update_listeners(|l| l.item_info_window_click = Some(Arc::new(f)));
    }

    fn update_listeners(&self, update: impl FnOnce(&mut Listeners<T>)) {
        let snapshot = {
            let mut listeners = self.listeners.lock();
            update(&mut listeners);
            listeners.clone()
        };
        self.shared.renderer.lock().set_listeners(snapshot);
    }
}

impl<T: ClusterItem> Drop for ClusterManager<T> {
    fn drop(&mut self) {
        self.shared.scheduler.shutdown();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("cluster worker panicked");
            }
        }
    }
}

/// Configures and starts a [`ClusterManager`].
pub struct ClusterManagerBuilder<T: ClusterItem> {
    camera: Box<dyn CameraSource>,
    renderer: Box<dyn ClusterRenderer<T>>,
    config: ClusterConfig,
    algorithm: Option<Box<dyn Algorithm<T>>>,
    marker_manager: Option<Box<dyn MarkerManager>>,
}

impl<T: ClusterItem> fmt::Debug for ClusterManagerBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterManagerBuilder")
            .field("config", &self.config)
            .field("custom_algorithm", &self.algorithm.is_some())
            .field("marker_manager", &self.marker_manager.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: ClusterItem> ClusterManagerBuilder<T> {
    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `algorithm` instead of a [`DistanceBasedAlgorithm`] built from the config.
    pub fn algorithm(mut self, algorithm: impl Algorithm<T> + 'static) -> Self {
        self.algorithm = Some(Box::new(algorithm));
        self
    }

    /// Route marker clicks to `marker_manager`.
    pub fn marker_manager(mut self, marker_manager: impl MarkerManager) -> Self {
        self.marker_manager = Some(Box::new(marker_manager));
        self
    }

    /// Validate the config, attach the renderer, and start the worker thread.
    pub fn build(self) -> Result<ClusterManager<T>, ClusterError> {
        let Self {
            camera,
            mut renderer,
            config,
            algorithm,
            marker_manager,
        } = self;
        config.validate()?;

        let algorithm = algorithm
            .unwrap_or_else(|| Box::new(DistanceBasedAlgorithm::with_config(&config)));
        renderer.on_add();
        let shared = Arc::new(Shared {
            algorithm: RwLock::new(CachingAlgorithm::with_capacity(
                algorithm,
                config.cache_capacity,
            )),
            renderer: Mutex::new(renderer),
            scheduler: Scheduler::default(),
            precache: config.precache_neighbors,
        });

        let worker = thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn({
                let shared = Arc::clone(&shared);
                move || shared.run()
            })
            .map_err(ClusterError::WorkerSpawn)?;

        Ok(ClusterManager {
            shared,
            camera,
            marker_manager,
            listeners: Mutex::new(Listeners::default()),
            previous_zoom: Mutex::new(None),
            cache_capacity: config.cache_capacity,
            worker: Some(worker),
        })
    }
}
