// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable clustering results.

use std::sync::Arc;

use kurbo::Point;

use crate::geo::{ClusterItem, LatLng};
use crate::projection::{project, unproject};

/// Mean of projected points. Returns the origin for an empty input.
pub(crate) fn centroid(points: impl Iterator<Item = Point>) -> Point {
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0_u32);
    for p in points {
        sx += p.x;
        sy += p.y;
        n += 1;
    }
    if n == 0 {
        return Point::ORIGIN;
    }
    let n = f64::from(n);
    Point::new(sx / n, sy / n)
}

/// A group of nearby items shown as one unit.
///
/// Built once per computation and never modified afterwards. Always holds at
/// least one item.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster<T> {
    position: LatLng,
    items: Vec<T>,
}

impl<T: ClusterItem> Cluster<T> {
    /// A cluster with an explicit representative position. `None` if `items` is empty.
    pub fn new(position: LatLng, items: Vec<T>) -> Option<Self> {
        (!items.is_empty()).then_some(Self { position, items })
    }

    /// A cluster positioned on the projected centroid of its items. `None` if `items` is empty.
    pub fn from_items(items: Vec<T>) -> Option<Self> {
        let position = match items.as_slice() {
            [] => return None,
            [only] => only.position(),
            _ => unproject(centroid(items.iter().map(|i| project(i.position())))),
        };
        Some(Self { position, items })
    }

    pub(crate) fn from_parts(position: LatLng, items: Vec<T>) -> Self {
        debug_assert!(!items.is_empty(), "clusters are never empty");
        Self { position, items }
    }

    /// A cluster holding one item, positioned on it.
    pub fn singleton(item: T) -> Self {
        Self {
            position: item.position(),
            items: vec![item],
        }
    }
}

impl<T> Cluster<T> {
    /// Representative position: the centroid of the members in projected space.
    pub fn position(&self) -> LatLng {
        self.position
    }

    /// Member items.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of member items.
    pub fn size(&self) -> usize {
        self.items.len()
    }
}

/// The clusters computed for one zoom level.
///
/// Every item of the algorithm's live set at computation time appears in
/// exactly one cluster. The clusters are shared, so cloning a set or
/// restamping its zoom does not copy them.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterSet<T> {
    zoom: f64,
    clusters: Arc<[Cluster<T>]>,
}

impl<T> ClusterSet<T> {
    /// Wrap computed clusters for the given zoom.
    pub fn new(zoom: f64, clusters: Vec<Cluster<T>>) -> Self {
        Self {
            zoom,
            clusters: clusters.into(),
        }
    }

    /// The same clusters, labelled with another zoom in the same whole level.
    pub fn with_zoom(&self, zoom: f64) -> Self {
        Self {
            zoom,
            clusters: Arc::clone(&self.clusters),
        }
    }

    /// An empty result, as produced for an empty item set.
    pub fn empty(zoom: f64) -> Self {
        Self::new(zoom, Vec::new())
    }

    /// Zoom level this set was requested at.
    ///
    /// Clustering itself depends only on the whole zoom level, so sets for
    /// 10.2 and 10.9 hold the same clusters with different labels.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether there are no clusters (the item set was empty).
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of items across all clusters.
    pub fn item_count(&self) -> usize {
        self.clusters.iter().map(Cluster::size).sum()
    }

    /// Iterate the clusters.
    pub fn iter(&self) -> core::slice::Iter<'_, Cluster<T>> {
        self.clusters.iter()
    }

    /// Clusters as a slice.
    pub fn as_slice(&self) -> &[Cluster<T>] {
        &self.clusters
    }
}

impl<'a, T> IntoIterator for &'a ClusterSet<T> {
    type Item = &'a Cluster<T>;
    type IntoIter = core::slice::Iter<'a, Cluster<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}
