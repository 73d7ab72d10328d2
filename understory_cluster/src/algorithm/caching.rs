// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Result cache in front of another [`Algorithm`].

use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{Algorithm, CancelToken};
use crate::cluster::ClusterSet;
use crate::error::Cancelled;
use crate::geo::ClusterItem;

/// Counters describing cache effectiveness.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran the wrapped algorithm.
    pub misses: u64,
    /// Times a mutation wiped the cache.
    pub invalidations: u64,
    /// Zoom levels currently cached.
    pub entries: usize,
}

/// Least-recently-used map from whole zoom level to result, front = most recent.
struct Lru<T> {
    capacity: usize,
    entries: VecDeque<(i32, Arc<ClusterSet<T>>)>,
}

impl<T> Lru<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    fn get(&mut self, key: i32) -> Option<Arc<ClusterSet<T>>> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        let entry = self.entries.remove(pos)?;
        let value = Arc::clone(&entry.1);
        self.entries.push_front(entry);
        Some(value)
    }

    fn contains(&self, key: i32) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    fn put(&mut self, key: i32, value: Arc<ClusterSet<T>>) {
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push_front((key, value));
        self.entries.truncate(self.capacity);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Wraps an algorithm and memoizes its results per whole zoom level.
///
/// Zoom is floored to an integer before lookup, so every zoom in `[z, z + 1)`
/// shares one entry. A hit comes back stamped with the requested zoom. Any
/// mutation forwards to the wrapped algorithm and then drops every entry,
/// since a membership change can alter clustering at any zoom.
pub struct CachingAlgorithm<T, A = Box<dyn Algorithm<T>>> {
    inner: A,
    cache: Mutex<Lru<T>>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
    _items: PhantomData<fn() -> T>,
}

impl<T, A: fmt::Debug> fmt::Debug for CachingAlgorithm<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingAlgorithm")
            .field("inner", &self.inner)
            .field("cached", &self.cache.lock().entries.len())
            .finish_non_exhaustive()
    }
}

impl<T: ClusterItem, A: Algorithm<T>> CachingAlgorithm<T, A> {
    /// Default number of cached zoom levels.
    pub const DEFAULT_CAPACITY: usize = 5;

    /// Wrap `inner` with the default capacity.
    pub fn new(inner: A) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    /// Wrap `inner`, keeping at most `capacity` zoom levels (at least one).
    pub fn with_capacity(inner: A, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(Lru::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            _items: PhantomData,
        }
    }

    /// Cache key for a zoom level.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Clamped to the i32 range before the cast."
    )]
    pub fn cache_key(zoom: f64) -> i32 {
        if !zoom.is_finite() {
            return 0;
        }
        zoom.floor().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    }

    /// The wrapped algorithm.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Unwrap, discarding cached results.
    pub fn into_inner(self) -> A {
        self.inner
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entries: self.cache.lock().entries.len(),
        }
    }

    /// Whether a result for `zoom`'s key is cached.
    pub fn is_cached(&self, zoom: f64) -> bool {
        self.cache.lock().contains(Self::cache_key(zoom))
    }

    /// Whole zoom levels [`precache`](Algorithm::precache) fills around `zoom`.
    ///
    /// Levels below zero are left out.
    pub fn neighbor_levels(zoom: f64) -> impl Iterator<Item = i32> {
        let key = Self::cache_key(zoom);
        [key.saturating_add(1), key.saturating_sub(1)]
            .into_iter()
            .filter(|level| *level >= 0)
    }

    /// Compute and store one whole zoom level unless it is already cached.
    ///
    /// Returns `false` if `cancel` fired before the level was stored.
    pub fn precache_level(&self, level: i32, cancel: &CancelToken) -> bool {
        if self.cache.lock().contains(level) {
            return true;
        }
        match self.inner.clusters_cancellable(f64::from(level), cancel) {
            Ok(result) => {
                trace!(key = level, "precached cluster level");
                self.cache.lock().put(level, result);
                true
            }
            Err(Cancelled) => false,
        }
    }

    /// Cached result for `zoom`'s key, stamped with `zoom` itself.
    fn lookup(&self, zoom: f64) -> Option<Arc<ClusterSet<T>>> {
        let key = Self::cache_key(zoom);
        let Some(hit) = self.cache.lock().get(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key, "cluster cache miss");
            return None;
        };
        self.hits.fetch_add(1, Ordering::Relaxed);
        trace!(key, "cluster cache hit");
        if hit.zoom() == zoom {
            Some(hit)
        } else {
            Some(Arc::new(hit.with_zoom(zoom)))
        }
    }

    fn invalidate(&self) {
        let mut cache = self.cache.lock();
        if !cache.entries.is_empty() {
            debug!(dropped = cache.entries.len(), "cluster cache invalidated");
        }
        cache.clear();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }
}

impl<T: ClusterItem, A: Algorithm<T>> Algorithm<T> for CachingAlgorithm<T, A> {
    fn add_item(&mut self, item: T) {
        self.inner.add_item(item);
        self.invalidate();
    }

    fn add_items(&mut self, items: Vec<T>) {
        self.inner.add_items(items);
        self.invalidate();
    }

    fn remove_item(&mut self, item: &T) {
        self.inner.remove_item(item);
        self.invalidate();
    }

    fn clear_items(&mut self) {
        self.inner.clear_items();
        self.invalidate();
    }

    fn items(&self) -> Vec<T> {
        self.inner.items()
    }

    fn clusters(&self, zoom: f64) -> Arc<ClusterSet<T>> {
        if let Some(hit) = self.lookup(zoom) {
            return hit;
        }
        let result = self.inner.clusters(zoom);
        self.cache.lock().put(Self::cache_key(zoom), Arc::clone(&result));
        result
    }

    fn clusters_cancellable(
        &self,
        zoom: f64,
        cancel: &CancelToken,
    ) -> Result<Arc<ClusterSet<T>>, Cancelled> {
        if let Some(hit) = self.lookup(zoom) {
            return Ok(hit);
        }
        let result = self.inner.clusters_cancellable(zoom, cancel)?;
        self.cache.lock().put(Self::cache_key(zoom), Arc::clone(&result));
        Ok(result)
    }

    /// Fill the zoom levels just above and below `zoom`, skipping cached ones.
    fn precache(&self, zoom: f64, cancel: &CancelToken) {
        for level in Self::neighbor_levels(zoom) {
            if !self.precache_level(level, cancel) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::algorithm::{DistanceBasedAlgorithm, Generations};
    use crate::geo::LatLng;

    /// Counts how often clusters are actually computed.
    #[derive(Default)]
    struct Counting {
        inner: DistanceBasedAlgorithm<LatLng>,
        calls: Arc<AtomicUsize>,
    }

    impl Algorithm<LatLng> for Counting {
        fn add_item(&mut self, item: LatLng) {
            self.inner.add_item(item);
        }

        fn remove_item(&mut self, item: &LatLng) {
            self.inner.remove_item(item);
        }

        fn clear_items(&mut self) {
            self.inner.clear_items();
        }

        fn items(&self) -> Vec<LatLng> {
            self.inner.items()
        }

        fn clusters(&self, zoom: f64) -> Arc<ClusterSet<LatLng>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.clusters(zoom)
        }

        fn clusters_cancellable(
            &self,
            zoom: f64,
            cancel: &CancelToken,
        ) -> Result<Arc<ClusterSet<LatLng>>, Cancelled> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.clusters_cancellable(zoom, cancel)
        }
    }

    fn ll(lat: f64, lng: f64) -> LatLng {
        LatLng::new(lat, lng).unwrap()
    }

    fn cached(capacity: usize) -> (CachingAlgorithm<LatLng, Counting>, Arc<AtomicUsize>) {
        let counting = Counting::default();
        let calls = Arc::clone(&counting.calls);
        let mut alg = CachingAlgorithm::with_capacity(counting, capacity);
        alg.add_items(vec![ll(0.0, 0.0), ll(0.0, 0.0001), ll(10.0, 10.0)]);
        (alg, calls)
    }

    #[test]
    fn repeated_zoom_is_served_from_cache() {
        let (alg, calls) = cached(5);
        let first = alg.clusters(10.0);
        let second = alg.clusters(10.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        let stats = alg.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn fractional_zooms_share_a_key() {
        let (alg, calls) = cached(5);
        let first = alg.clusters(10.2);
        let second = alg.clusters(10.9);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.zoom(), 10.2);
        assert_eq!(second.zoom(), 10.9, "a hit carries the requested zoom");
        assert_eq!(first.as_slice(), second.as_slice());
        alg.clusters(11.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(CachingAlgorithm::<LatLng, Counting>::cache_key(-0.5), -1);
        assert_eq!(CachingAlgorithm::<LatLng, Counting>::cache_key(f64::NAN), 0);
    }

    #[test]
    fn every_mutation_invalidates() {
        let (mut alg, calls) = cached(5);
        alg.clusters(10.0);
        for step in 0..4 {
            match step {
                0 => alg.add_item(ll(1.0, 1.0)),
                1 => alg.add_items(vec![ll(2.0, 2.0)]),
                2 => alg.remove_item(&ll(1.0, 1.0)),
                _ => alg.clear_items(),
            }
            assert!(!alg.is_cached(10.0), "step {step} left a stale entry");
            alg.clusters(10.0);
            assert_eq!(calls.load(Ordering::SeqCst), step + 2);
        }
        assert_eq!(alg.stats().invalidations, 5);
        assert!(alg.clusters(10.0).is_empty(), "cleared set clusters to nothing");
    }

    #[test]
    fn removing_absent_item_still_invalidates() {
        let (mut alg, calls) = cached(5);
        alg.clusters(4.0);
        alg.remove_item(&ll(-5.0, -5.0));
        alg.clusters(4.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(alg.items().len(), 3);
    }

    #[test]
    fn least_recently_used_level_is_evicted() {
        let (alg, calls) = cached(2);
        alg.clusters(1.0);
        alg.clusters(2.0);
        alg.clusters(1.0); // refresh 1; 2 is now oldest
        alg.clusters(3.0); // evicts 2
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(alg.is_cached(1.0) && alg.is_cached(3.0));
        assert!(!alg.is_cached(2.0));
        assert_eq!(alg.stats().entries, 2);
    }

    #[test]
    fn precache_fills_both_neighbors_once() {
        let (alg, calls) = cached(5);
        let token = CancelToken::never();
        alg.clusters(10.0);
        alg.precache(10.0, &token);
        assert!(alg.is_cached(9.0) && alg.is_cached(11.0));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        alg.precache(10.0, &token);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(alg.clusters(11.0).zoom(), 11.0);
    }

    #[test]
    fn precache_level_reports_cancellation() {
        let (alg, calls) = cached(5);
        let gens = Generations::default();
        let live = gens.advance();
        assert!(alg.precache_level(4, &live));
        assert!(alg.precache_level(4, &live), "cached level is a no-op");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        gens.advance();
        assert!(!alg.precache_level(5, &live));
        assert!(!alg.is_cached(5.0));
        let levels: Vec<i32> =
            CachingAlgorithm::<LatLng, Counting>::neighbor_levels(0.7).collect();
        assert_eq!(levels, [1]);
    }

    #[test]
    fn precache_skips_negative_levels() {
        let (alg, _) = cached(5);
        alg.precache(0.0, &CancelToken::never());
        assert!(alg.is_cached(1.0));
        assert!(!alg.is_cached(-1.0));
    }

    #[test]
    fn cancelled_results_are_not_cached() {
        let (alg, _) = cached(5);
        let gens = Generations::default();
        let stale = gens.advance();
        gens.advance();
        assert_eq!(alg.clusters_cancellable(6.0, &stale), Err(Cancelled));
        assert!(!alg.is_cached(6.0));
        alg.precache(6.0, &stale);
        assert_eq!(alg.stats().entries, 0);
    }
}
