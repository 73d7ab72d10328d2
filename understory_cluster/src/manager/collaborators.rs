// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interfaces the manager consumes: renderer, camera, and marker routing.

use std::fmt;
use std::sync::Arc;

use crate::cluster::{Cluster, ClusterSet};
use crate::geo::{ClusterItem, LatLng};

/// Snapshot of the map camera.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraPosition {
    /// Point the camera looks at.
    pub target: LatLng,
    /// Zoom level; clustering is driven by this alone.
    pub zoom: f64,
    /// Tilt in degrees.
    pub tilt: f64,
    /// Bearing in degrees clockwise from north.
    pub bearing: f64,
}

impl CameraPosition {
    /// An untilted, north-up camera.
    pub fn new(target: LatLng, zoom: f64) -> Self {
        Self {
            target,
            zoom,
            tilt: 0.0,
            bearing: 0.0,
        }
    }
}

/// Opaque handle of a marker owned by the host toolkit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Callback for a click on a cluster. Returns `true` if the click was consumed.
pub type ClusterClickFn<T> = Arc<dyn Fn(&Cluster<T>) -> bool + Send + Sync>;
/// Callback for a click on a cluster's info window.
pub type ClusterInfoWindowClickFn<T> = Arc<dyn Fn(&Cluster<T>) + Send + Sync>;
/// Callback for a click on a single item. Returns `true` if the click was consumed.
pub type ItemClickFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
/// Callback for a click on a single item's info window.
pub type ItemInfoWindowClickFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// The click callbacks registered on a manager.
///
/// The manager owns the bundle and hands a copy to its renderer whenever it
/// changes, and again when the renderer is replaced. Renderers call the
/// dispatch helpers when the host toolkit reports a click.
pub struct Listeners<T> {
    /// Cluster clicked.
    pub cluster_click: Option<ClusterClickFn<T>>,
    /// Cluster info window clicked.
    pub cluster_info_window_click: Option<ClusterInfoWindowClickFn<T>>,
    /// Item clicked.
    pub item_click: Option<ItemClickFn<T>>,
    /// Item info window clicked.
    pub item_info_window_click: Option<ItemInfoWindowClickFn<T>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            cluster_click: None,
            cluster_info_window_click: None,
            item_click: None,
            item_info_window_click: None,
        }
    }
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            cluster_click: self.cluster_click.clone(),
            cluster_info_window_click: self.cluster_info_window_click.clone(),
            item_click: self.item_click.clone(),
            item_info_window_click: self.item_info_window_click.clone(),
        }
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("cluster_click", &self.cluster_click.is_some())
            .field(
                "cluster_info_window_click",
                &self.cluster_info_window_click.is_some(),
            )
            .field("item_click", &self.item_click.is_some())
            .field(
                "item_info_window_click",
                &self.item_info_window_click.is_some(),
            )
            .finish()
    }
}

impl<T> Listeners<T> {
    /// Dispatch a cluster click. `false` when no callback is set.
    pub fn click_cluster(&self, cluster: &Cluster<T>) -> bool {
        self.cluster_click.as_ref().is_some_and(|f| f(cluster))
    }

    /// Dispatch a cluster info window click.
    pub fn click_cluster_info_window(&self, cluster: &Cluster<T>) {
        if let Some(f) = &self.cluster_info_window_click {
            f(cluster);
        }
    }

    /// Dispatch an item click. `false` when no callback is set.
    pub fn click_item(&self, item: &T) -> bool {
        self.item_click.as_ref().is_some_and(|f| f(item))
    }

    /// Dispatch an item info window click.
    pub fn click_item_info_window(&self, item: &T) {
        if let Some(f) = &self.item_info_window_click {
            f(item);
        }
    }
}

/// Displays cluster results.
///
/// Only [`on_clusters_changed`](Self::on_clusters_changed) is required. It is
/// called from the manager's worker thread while the manager's scheduling lock
/// is held, so it must not call back into the manager.
pub trait ClusterRenderer<T: ClusterItem>: Send + 'static {
    /// Replace whatever is displayed with `clusters`.
    fn on_clusters_changed(&mut self, clusters: Arc<ClusterSet<T>>);

    /// The renderer was attached to a manager.
    fn on_add(&mut self) {}

    /// The renderer was detached from its manager.
    fn on_remove(&mut self) {}

    /// The camera moved.
    fn on_camera_change(&mut self, _position: &CameraPosition) {}

    /// A camera gesture finished.
    fn on_camera_change_finish(&mut self, _position: &CameraPosition) {}

    /// Click callbacks changed.
    fn set_listeners(&mut self, _listeners: Listeners<T>) {}
}

/// Source of the current camera. Queried synchronously.
pub trait CameraSource: Send + Sync + 'static {
    /// The camera right now.
    fn camera_position(&self) -> CameraPosition;
}

impl<C: CameraSource + ?Sized> CameraSource for Arc<C> {
    fn camera_position(&self) -> CameraPosition {
        (**self).camera_position()
    }
}

/// Receives marker clicks from the host toolkit.
pub trait MarkerManager: Send + Sync + 'static {
    /// A marker was clicked. Returns `true` if the click was consumed.
    fn on_marker_click(&self, marker: MarkerId) -> bool;

    /// A marker's info window was clicked.
    fn on_info_window_click(&self, marker: MarkerId);
}

impl<M: MarkerManager + ?Sized> MarkerManager for Arc<M> {
    fn on_marker_click(&self, marker: MarkerId) -> bool {
        (**self).on_marker_click(marker)
    }

    fn on_info_window_click(&self, marker: MarkerId) {
        (**self).on_info_window_click(marker);
    }
}
