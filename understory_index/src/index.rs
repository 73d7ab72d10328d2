// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public [`PointIndex`] API, generic over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::backends::{QuadTree, UniformGrid};
use crate::types::Aabb2D;

/// Generational handle for entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<P> {
    generation: u32,
    x: f64,
    y: f64,
    payload: P,
}

/// A 2D point index parameterized by a spatial backend.
///
/// Payloads are stored beside their position; the backend only ever sees slot
/// numbers. Removing an entry frees its slot for reuse and bumps the slot's
/// generation, so keys handed out earlier stop resolving.
#[derive(Debug)]
pub struct PointIndex<P: Copy + Debug, B: Backend> {
    entries: Vec<Option<Entry<P>>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    backend: B,
}

impl<P: Copy + Debug, B: Backend> PointIndex<P, B> {
    /// Create an empty index over the given backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            backend,
        }
    }

    /// Reserve space for at least `n` more entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
        self.generations.reserve(n);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Insert a point with payload. Returns a stable handle [`Key`].
    pub fn insert(&mut self, x: f64, y: f64, payload: P) -> Key {
        debug_assert!(!x.is_nan() && !y.is_nan(), "NaN coordinates are not indexable");
        let idx = match self.free_list.pop() {
            Some(idx) => idx,
            None => {
                self.entries.push(None);
                self.generations.push(0);
                self.entries.len() - 1
            }
        };
        let generation = self.generations[idx].wrapping_add(1);
        self.generations[idx] = generation;
        self.entries[idx] = Some(Entry {
            generation,
            x,
            y,
            payload,
        });
        self.backend.insert(idx, x, y);
        Key::new(idx, generation)
    }

    /// Remove an entry, returning its payload. Stale or unknown keys return `None`.
    pub fn remove(&mut self, key: Key) -> Option<P> {
        self.entry(key)?;
        let entry = self.entries[key.idx()].take()?;
        self.backend.remove(key.idx());
        self.free_list.push(key.idx());
        Some(entry.payload)
    }

    /// Look up an entry's position and payload.
    pub fn get(&self, key: Key) -> Option<(f64, f64, P)> {
        self.entry(key).map(|e| (e.x, e.y, e.payload))
    }

    /// Clear the index. Outstanding keys stop resolving.
    pub fn clear(&mut self) {
        for (idx, slot) in self.entries.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(idx);
            }
        }
        self.backend.clear();
    }

    /// Query for entries whose point lies inside the rectangle (inclusive bounds).
    pub fn query_rect(&self, rect: Aabb2D<f64>) -> impl Iterator<Item = (Key, P)> + '_ {
        self.backend.query_rect(rect).filter_map(move |i| {
            let e = self.entries.get(i)?.as_ref()?;
            Some((Key::new(i, e.generation), e.payload))
        })
    }

    /// Borrow the backend, e.g. for its `Debug` output or tuning accessors.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn entry(&self, key: Key) -> Option<&Entry<P>> {
        let e = self.entries.get(key.idx())?.as_ref()?;
        (e.generation == key.1).then_some(e)
    }
}

impl<P: Copy + Debug> PointIndex<P, UniformGrid> {
    /// Create a grid-backed index with square cells anchored at the origin.
    pub fn with_uniform_grid(cell: f64) -> Self {
        Self::with_backend(UniformGrid::new(cell, cell, 0.0, 0.0))
    }
}

impl<P: Copy + Debug> PointIndex<P, QuadTree> {
    /// Create a quad-tree-backed index covering `bounds`.
    pub fn with_quadtree(bounds: Aabb2D<f64>) -> Self {
        Self::with_backend(QuadTree::new(bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn insert_query_remove() {
        let mut idx: PointIndex<u32, UniformGrid> = PointIndex::with_uniform_grid(10.0);
        let k1 = idx.insert(1.0, 1.0, 1);
        let _k2 = idx.insert(25.0, 25.0, 2);
        let hits: Vec<_> = idx.query_rect(Aabb2D::new(0.0, 0.0, 5.0, 5.0)).collect();
        assert_eq!(hits, vec![(k1, 1)]);

        assert_eq!(idx.remove(k1), Some(1));
        assert_eq!(idx.remove(k1), None, "second remove is a no-op");
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.query_rect(Aabb2D::new(0.0, 0.0, 5.0, 5.0)).count(), 0);
    }

    #[test]
    fn reused_slot_invalidates_old_key() {
        let mut idx: PointIndex<u32, UniformGrid> = PointIndex::with_uniform_grid(1.0);
        let old = idx.insert(0.5, 0.5, 1);
        idx.remove(old);
        let new = idx.insert(0.5, 0.5, 2);
        assert_ne!(old, new);
        assert_eq!(idx.get(old), None);
        assert_eq!(idx.get(new), Some((0.5, 0.5, 2)));
    }

    #[test]
    fn clear_frees_everything() {
        let mut idx: PointIndex<u32, QuadTree> =
            PointIndex::with_quadtree(Aabb2D::new(0.0, 0.0, 1.0, 1.0));
        let k = idx.insert(0.25, 0.75, 9);
        idx.insert(0.5, 0.5, 10);
        idx.clear();
        assert!(idx.is_empty());
        assert_eq!(idx.get(k), None);
        idx.insert(0.1, 0.1, 11);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn backends_agree_on_queries() {
        let mut grid: PointIndex<usize, UniformGrid> = PointIndex::with_uniform_grid(0.05);
        let mut tree: PointIndex<usize, QuadTree> =
            PointIndex::with_quadtree(Aabb2D::new(0.0, 0.0, 1.0, 1.0));
        let mut s = 0x9E37_79B9_u64;
        for i in 0..500 {
            s ^= s << 13;
            s ^= s >> 7;
            s ^= s << 17;
            let x = (s % 10_000) as f64 / 10_000.0;
            let y = ((s >> 20) % 10_000) as f64 / 10_000.0;
            grid.insert(x, y, i);
            tree.insert(x, y, i);
        }
        let q = Aabb2D::around(0.5, 0.5, 0.12, 0.07);
        let mut a: Vec<_> = grid.query_rect(q).map(|(_, p)| p).collect();
        let mut b: Vec<_> = tree.query_rect(q).map(|(_, p)| p).collect();
        a.sort_unstable();
        b.sort_unstable();
        assert!(!a.is_empty(), "query should hit something");
        assert_eq!(a, b);
    }
}
