// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform grid backend. Buckets points into fixed-size cells.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::Aabb2D;

/// Uniform grid backend.
///
/// Each point lives in exactly one cell, found by floor-division of
/// `(x - origin_x) / cell_w` and `(y - origin_y) / cell_h`, so negative
/// coordinates are fine. A rectangle query visits the covered cells and then
/// filters by exact containment. Pick a cell size close to your typical query
/// size: a query then touches at most four cells.
pub struct UniformGrid {
    cell_w: f64,
    cell_h: f64,
    origin_x: f64,
    origin_y: f64,
    entries: Vec<Option<(f64, f64)>>,
    cells: BTreeMap<(i64, i64), Vec<usize>>,
    len: usize,
}

impl UniformGrid {
    /// Create a grid backend with the given cell size and origin offset.
    ///
    /// # Panics
    ///
    /// Panics if either cell dimension is not a positive finite number.
    pub fn new(cell_w: f64, cell_h: f64, origin_x: f64, origin_y: f64) -> Self {
        assert!(
            cell_w > 0.0 && cell_h > 0.0 && cell_w.is_finite() && cell_h.is_finite(),
            "cell sizes must be positive and finite"
        );
        Self {
            cell_w,
            cell_h,
            origin_x,
            origin_y,
            entries: Vec::new(),
            cells: BTreeMap::new(),
            len: 0,
        }
    }

    /// Cell dimensions `(w, h)`.
    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_w, self.cell_h)
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn floor_to_i64(v: f64) -> i64 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Cell indices saturate at the i64 range; callers keep coordinates bounded."
        )]
        let i = v as i64;
        if (i as f64) > v { i - 1 } else { i }
    }

    fn key_for(&self, x: f64, y: f64) -> (i64, i64) {
        let cx = Self::floor_to_i64((x - self.origin_x) / self.cell_w);
        let cy = Self::floor_to_i64((y - self.origin_y) / self.cell_h);
        (cx, cy)
    }

    fn unlink(&mut self, slot: usize, x: f64, y: f64) {
        let key = self.key_for(x, y);
        if let Some(slots) = self.cells.get_mut(&key) {
            if let Some(pos) = slots.iter().position(|&s| s == slot) {
                slots.swap_remove(pos);
            }
            if slots.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    fn push_matches(&self, slots: &[usize], rect: &Aabb2D<f64>, out: &mut Vec<usize>) {
        for &s in slots {
            if let Some(Some((x, y))) = self.entries.get(s)
                && rect.contains_point(*x, *y)
            {
                out.push(s);
            }
        }
    }
}

impl Backend for UniformGrid {
    fn insert(&mut self, slot: usize, x: f64, y: f64) {
        if self.entries.len() <= slot {
            self.entries.resize_with(slot + 1, || None);
        }
        match self.entries[slot].replace((x, y)) {
            // Re-insert of a live slot: drop the stale cell membership first.
            Some((ox, oy)) => self.unlink(slot, ox, oy),
            None => self.len += 1,
        }
        let key = self.key_for(x, y);
        self.cells.entry(key).or_default().push(slot);
    }

    fn remove(&mut self, slot: usize) {
        let Some((x, y)) = self.entries.get_mut(slot).and_then(Option::take) else {
            return;
        };
        self.len -= 1;
        self.unlink(slot, x, y);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<f64>) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        if rect.is_empty() {
            return Box::new(out.into_iter());
        }
        let (minx, miny) = self.key_for(rect.min_x, rect.min_y);
        let (maxx, maxy) = self.key_for(rect.max_x, rect.max_y);
        let covered = (i128::from(maxx) - i128::from(minx) + 1)
            * (i128::from(maxy) - i128::from(miny) + 1);
        if covered > self.cells.len() as i128 {
            // The rect spans more cells than exist; walk the occupied ones instead.
            for (&(cx, cy), slots) in &self.cells {
                if (minx..=maxx).contains(&cx) && (miny..=maxy).contains(&cy) {
                    self.push_matches(slots, &rect, &mut out);
                }
            }
        } else {
            for cy in miny..=maxy {
                for cx in minx..=maxx {
                    if let Some(slots) = self.cells.get(&(cx, cy)) {
                        self.push_matches(slots, &rect, &mut out);
                    }
                }
            }
        }
        out.sort_unstable();
        Box::new(out.into_iter())
    }
}

impl Debug for UniformGrid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UniformGrid")
            .field("cell_w", &self.cell_w)
            .field("cell_h", &self.cell_h)
            .field("origin_x", &self.origin_x)
            .field("origin_y", &self.origin_y)
            .field("alive", &self.len)
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}
