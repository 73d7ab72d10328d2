// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Greedy, non-hierarchical distance-based clustering.
//!
//! Items are projected onto the unit world square once, at insert. A pass then
//!
//! 1. derives the search span for the zoom (`max_distance_px` screen pixels
//!    expressed in world units),
//! 2. builds a point index over the projected items,
//! 3. walks items in insertion order; every item not yet visited seeds a new
//!    cluster made of everything inside the span-sized square around it.
//!
//! An item already claimed by an earlier cluster changes owner only when it is
//! strictly closer to the new seed. Seeds are at distance zero from their own
//! cluster, so they never move and no cluster ends up empty.

use std::fmt;
use std::sync::Arc;

use kurbo::Point;
use tracing::{debug, trace};
use understory_index::{Aabb2D, Backend, PointIndex};

use super::{Algorithm, CancelToken};
use crate::cluster::{Cluster, ClusterSet, centroid};
use crate::config::{ClusterConfig, IndexStrategy};
use crate::error::Cancelled;
use crate::geo::ClusterItem;
use crate::projection::{project, unproject, world_span};

/// Seeds processed between cancellation polls.
const CANCEL_POLL_INTERVAL: usize = 256;

const WORLD: Aabb2D<f64> = Aabb2D::new(0.0, 0.0, 1.0, 1.0);

#[derive(Clone)]
struct Entry<T> {
    item: T,
    point: Point,
}

/// Distance-based grid clustering.
///
/// Near O(n) per pass with the default grid index: the grid's cell size equals
/// the search span, so each neighbor query touches at most four cells.
#[derive(Clone)]
pub struct DistanceBasedAlgorithm<T> {
    entries: Vec<Entry<T>>,
    max_distance_px: f64,
    tile_size: f64,
    index: IndexStrategy,
}

impl<T: ClusterItem> Default for DistanceBasedAlgorithm<T> {
    fn default() -> Self {
        Self::with_config(&ClusterConfig::default())
    }
}

impl<T> fmt::Debug for DistanceBasedAlgorithm<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistanceBasedAlgorithm")
            .field("items", &self.entries.len())
            .field("max_distance_px", &self.max_distance_px)
            .field("tile_size", &self.tile_size)
            .field("index", &self.index)
            .finish()
    }
}

impl<T: ClusterItem> DistanceBasedAlgorithm<T> {
    /// Highest whole zoom level the span is computed for; larger zooms clamp to it.
    pub const MAX_ZOOM: u32 = 30;

    /// Create an empty algorithm with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty algorithm using the distance, tile size, and index from `config`.
    pub fn with_config(config: &ClusterConfig) -> Self {
        Self {
            entries: Vec::new(),
            max_distance_px: config.max_distance_px,
            tile_size: config.tile_size,
            index: config.index,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whole zoom level used for the span. Non-finite and negative zooms map to 0.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Clamped to MAX_ZOOM before the cast."
    )]
    pub fn discrete_zoom(zoom: f64) -> u32 {
        if !zoom.is_finite() || zoom <= 0.0 {
            return 0;
        }
        zoom.floor().min(f64::from(Self::MAX_ZOOM)) as u32
    }

    /// Side of the search square, in world units, at `zoom`.
    pub fn search_span(&self, zoom: f64) -> f64 {
        world_span(
            self.max_distance_px,
            self.tile_size,
            Self::discrete_zoom(zoom),
        )
    }

    fn compute(&self, zoom: f64, cancel: &CancelToken) -> Result<ClusterSet<T>, Cancelled> {
        if self.entries.is_empty() {
            return Ok(ClusterSet::empty(zoom));
        }
        let span = self.search_span(zoom);
        trace!(zoom, span, items = self.entries.len(), "clustering pass");
        match self.index {
            IndexStrategy::Grid => {
                let points: Vec<Point> = self.entries.iter().map(|e| e.point).collect();
                let index = build(PointIndex::with_uniform_grid(span), &points);
                cancel.check()?;
                self.greedy(&index, &points, span, zoom, cancel)
            }
            IndexStrategy::QuadTree => {
                // The tree clamps out-of-world points; query with the same clamped points.
                let points: Vec<Point> = self
                    .entries
                    .iter()
                    .map(|e| {
                        let (x, y) = WORLD.clamp_point(e.point.x, e.point.y);
                        Point::new(x, y)
                    })
                    .collect();
                let index = build(PointIndex::with_quadtree(WORLD), &points);
                cancel.check()?;
                self.greedy(&index, &points, span, zoom, cancel)
            }
        }
    }

    fn greedy<B: Backend>(
        &self,
        index: &PointIndex<usize, B>,
        points: &[Point],
        span: f64,
        zoom: f64,
        cancel: &CancelToken,
    ) -> Result<ClusterSet<T>, Cancelled> {
        let half = span / 2.0;
        let n = points.len();
        // Owning cluster and squared distance to that cluster's seed.
        let mut owner: Vec<Option<(usize, f64)>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut cluster_count = 0;

        for (i, &seed) in points.iter().enumerate() {
            if i % CANCEL_POLL_INTERVAL == 0 {
                cancel.check()?;
            }
            if visited[i] {
                continue;
            }
            let id = cluster_count;
            cluster_count += 1;
            visited[i] = true;
            owner[i] = Some((id, 0.0));

            let rect = Aabb2D::around(seed.x, seed.y, half, half);
            for (_, j) in index.query_rect(rect) {
                if j == i {
                    continue;
                }
                visited[j] = true;
                let d = points[j].distance_squared(seed);
                if owner[j].is_none_or(|(_, prev)| d < prev) {
                    owner[j] = Some((id, d));
                }
            }
        }

        cancel.check()?;
        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
        for (j, o) in owner.iter().enumerate() {
            if let Some((id, _)) = o {
                groups[*id].push(j);
            }
        }
        let clusters: Vec<Cluster<T>> = groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|g| self.assemble(&g))
            .collect();
        debug!(
            zoom,
            items = n,
            clusters = clusters.len(),
            "clustering pass finished"
        );
        Ok(ClusterSet::new(zoom, clusters))
    }

    fn assemble(&self, members: &[usize]) -> Cluster<T> {
        if let [only] = members {
            return Cluster::singleton(self.entries[*only].item.clone());
        }
        let center = centroid(members.iter().map(|&j| self.entries[j].point));
        let items = members
            .iter()
            .map(|&j| self.entries[j].item.clone())
            .collect();
        Cluster::from_parts(unproject(center), items)
    }
}

fn build<B: Backend>(mut index: PointIndex<usize, B>, points: &[Point]) -> PointIndex<usize, B> {
    index.reserve(points.len());
    for (i, p) in points.iter().enumerate() {
        index.insert(p.x, p.y, i);
    }
    index
}

impl<T: ClusterItem> Algorithm<T> for DistanceBasedAlgorithm<T> {
    fn add_item(&mut self, item: T) {
        let point = project(item.position());
        self.entries.push(Entry { item, point });
    }

    fn add_items(&mut self, items: Vec<T>) {
        self.entries.reserve(items.len());
        for item in items {
            self.add_item(item);
        }
    }

    fn remove_item(&mut self, item: &T) {
        if let Some(pos) = self.entries.iter().position(|e| e.item == *item) {
            self.entries.remove(pos);
        }
    }

    fn clear_items(&mut self) {
        self.entries.clear();
    }

    fn items(&self) -> Vec<T> {
        self.entries.iter().map(|e| e.item.clone()).collect()
    }

    fn clusters(&self, zoom: f64) -> Arc<ClusterSet<T>> {
        let never = CancelToken::never();
        match self.compute(zoom, &never) {
            Ok(set) => Arc::new(set),
            // A never-cancelled token cannot fire.
            Err(Cancelled) => Arc::new(ClusterSet::empty(zoom)),
        }
    }

    fn clusters_cancellable(
        &self,
        zoom: f64,
        cancel: &CancelToken,
    ) -> Result<Arc<ClusterSet<T>>, Cancelled> {
        cancel.check()?;
        self.compute(zoom, cancel).map(Arc::new)
    }
}
