// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clustering algorithms.
//!
//! An [`Algorithm`] owns the live item set and partitions it into clusters
//! for a zoom level. Implementations:
//!
//! - [`DistanceBasedAlgorithm`]: greedy, non-hierarchical, grid or quad-tree indexed.
//! - [`CachingAlgorithm`]: wraps any algorithm and memoizes results per whole zoom level.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cluster::ClusterSet;
use crate::error::Cancelled;
use crate::geo::ClusterItem;

mod caching;
mod distance;

pub use caching::{CacheStats, CachingAlgorithm};
pub use distance::DistanceBasedAlgorithm;

/// Logic for computing clusters.
///
/// Mutations take `&mut self` and are total: removing an absent item or
/// clearing an empty set does nothing. Computation takes `&self` and never
/// changes the live set, so a cancelled computation can simply be abandoned.
pub trait Algorithm<T: ClusterItem>: Send + Sync {
    /// Add one entry. Duplicates are kept as separate entries.
    fn add_item(&mut self, item: T);

    /// Add many entries.
    fn add_items(&mut self, items: Vec<T>) {
        for item in items {
            self.add_item(item);
        }
    }

    /// Remove one entry equal to `item`, if any.
    fn remove_item(&mut self, item: &T);

    /// Remove every entry.
    fn clear_items(&mut self);

    /// Snapshot of the live set.
    fn items(&self) -> Vec<T>;

    /// Compute clusters for `zoom`.
    fn clusters(&self, zoom: f64) -> Arc<ClusterSet<T>>;

    /// Compute clusters for `zoom`, giving up early once `cancel` fires.
    ///
    /// The default polls only before starting; implementations with a
    /// natural split point should poll between stages too.
    fn clusters_cancellable(
        &self,
        zoom: f64,
        cancel: &CancelToken,
    ) -> Result<Arc<ClusterSet<T>>, Cancelled> {
        cancel.check()?;
        Ok(self.clusters(zoom))
    }

    /// Opportunistically warm up state for zoom levels near `zoom`.
    ///
    /// Called from the background worker when it has nothing better to do.
    fn precache(&self, _zoom: f64, _cancel: &CancelToken) {}
}

impl<T: ClusterItem> Algorithm<T> for Box<dyn Algorithm<T>> {
    fn add_item(&mut self, item: T) {
        (**self).add_item(item);
    }

    fn add_items(&mut self, items: Vec<T>) {
        (**self).add_items(items);
    }

    fn remove_item(&mut self, item: &T) {
        (**self).remove_item(item);
    }

    fn clear_items(&mut self) {
        (**self).clear_items();
    }

    fn items(&self) -> Vec<T> {
        (**self).items()
    }

    fn clusters(&self, zoom: f64) -> Arc<ClusterSet<T>> {
        (**self).clusters(zoom)
    }

    fn clusters_cancellable(
        &self,
        zoom: f64,
        cancel: &CancelToken,
    ) -> Result<Arc<ClusterSet<T>>, Cancelled> {
        (**self).clusters_cancellable(zoom, cancel)
    }

    fn precache(&self, zoom: f64, cancel: &CancelToken) {
        (**self).precache(zoom, cancel);
    }
}

/// Monotonic request counter shared between a scheduler and its tokens.
#[derive(Clone, Debug, Default)]
pub struct Generations(Arc<AtomicU64>);

impl Generations {
    /// Start a new generation, cancelling every token issued so far.
    pub fn advance(&self) -> CancelToken {
        let generation = self.0.fetch_add(1, Ordering::AcqRel) + 1;
        CancelToken {
            current: Arc::clone(&self.0),
            generation,
        }
    }

    /// The most recently started generation.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Cooperative cancellation flag for one computation.
///
/// A token is cancelled as soon as its [`Generations`] counter moves past the
/// generation it was issued for.
#[derive(Clone, Debug)]
pub struct CancelToken {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Generations::default().advance()
    }

    /// Generation this token was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a newer generation has started.
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.generation
    }

    /// `Err(Cancelled)` once a newer generation has started.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
