// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use alloc::boxed::Box;

use crate::types::Aabb2D;

/// Spatial backend abstraction used by [`PointIndex`](crate::PointIndex).
///
/// Backends only track slot numbers and coordinates; payloads and key
/// generations stay in the index.
pub trait Backend {
    /// Insert a point for `slot`. A slot is never inserted twice without a `remove` in between.
    fn insert(&mut self, slot: usize, x: f64, y: f64);

    /// Remove a slot. Unknown slots are ignored.
    fn remove(&mut self, slot: usize);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Number of live points.
    fn len(&self) -> usize;

    /// Whether the backend holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query slots whose point lies inside the rectangle (inclusive bounds).
    fn query_rect<'a>(&'a self, rect: Aabb2D<f64>) -> Box<dyn Iterator<Item = usize> + 'a>;
}
