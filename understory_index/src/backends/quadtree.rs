// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point quad-tree backend over fixed bounds.
//!
//! Leaves hold up to [`QuadTree::MAX_ELEMENTS`] points before splitting into
//! four equal children; splitting stops at [`QuadTree::MAX_DEPTH`] so that
//! many coincident points cannot recurse forever.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::Aabb2D;

#[derive(Clone, Debug)]
struct Node {
    bounds: Aabb2D<f64>,
    depth: u32,
    points: Vec<(usize, f64, f64)>,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    fn leaf(bounds: Aabb2D<f64>, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            points: Vec::new(),
            children: None,
        }
    }

    /// Child index for a point: 0 = NW, 1 = NE, 2 = SW, 3 = SE (y grows downward).
    fn quadrant(&self, x: f64, y: f64) -> usize {
        let (cx, cy) = self.bounds.center();
        match (x < cx, y < cy) {
            (true, true) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (false, false) => 3,
        }
    }

    fn insert(&mut self, slot: usize, x: f64, y: f64) {
        let q = self.quadrant(x, y);
        if let Some(children) = self.children.as_mut() {
            children[q].insert(slot, x, y);
            return;
        }
        self.points.push((slot, x, y));
        if self.points.len() > QuadTree::MAX_ELEMENTS && self.depth < QuadTree::MAX_DEPTH {
            self.split();
        }
    }

    fn split(&mut self) {
        let b = self.bounds;
        let (cx, cy) = b.center();
        let d = self.depth + 1;
        let mut children = Box::new([
            Self::leaf(Aabb2D::new(b.min_x, b.min_y, cx, cy), d),
            Self::leaf(Aabb2D::new(cx, b.min_y, b.max_x, cy), d),
            Self::leaf(Aabb2D::new(b.min_x, cy, cx, b.max_y), d),
            Self::leaf(Aabb2D::new(cx, cy, b.max_x, b.max_y), d),
        ]);
        for (slot, x, y) in core::mem::take(&mut self.points) {
            let q = self.quadrant(x, y);
            children[q].insert(slot, x, y);
        }
        self.children = Some(children);
    }

    fn remove(&mut self, slot: usize, x: f64, y: f64) -> bool {
        let q = self.quadrant(x, y);
        if let Some(children) = self.children.as_mut() {
            return children[q].remove(slot, x, y);
        }
        match self.points.iter().position(|&(s, _, _)| s == slot) {
            Some(pos) => {
                self.points.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    fn search(&self, rect: &Aabb2D<f64>, out: &mut Vec<usize>) {
        if !self.bounds.intersects(rect) {
            return;
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.search(rect, out);
            }
            return;
        }
        for &(slot, x, y) in &self.points {
            if rect.contains_point(x, y) {
                out.push(slot);
            }
        }
    }
}

/// Point quad-tree backend.
///
/// Points outside the tree bounds are clamped onto the boundary at insert, so
/// they are still found by queries that cover the clamped position.
pub struct QuadTree {
    root: Node,
    positions: Vec<Option<(f64, f64)>>,
    len: usize,
}

impl QuadTree {
    /// Points a leaf may hold before it splits.
    pub const MAX_ELEMENTS: usize = 50;
    /// Deepest level a leaf may split to.
    pub const MAX_DEPTH: u32 = 40;

    /// Create an empty tree covering `bounds`.
    pub fn new(bounds: Aabb2D<f64>) -> Self {
        Self {
            root: Node::leaf(bounds, 0),
            positions: Vec::new(),
            len: 0,
        }
    }

    /// Bounds covered by the root node.
    pub fn bounds(&self) -> Aabb2D<f64> {
        self.root.bounds
    }

    /// Depth of the deepest node; a tree that never split has depth 0.
    pub fn depth(&self) -> u32 {
        fn walk(n: &Node) -> u32 {
            match n.children.as_ref() {
                Some(c) => c.iter().map(walk).max().unwrap_or(n.depth),
                None => n.depth,
            }
        }
        walk(&self.root)
    }
}

impl Backend for QuadTree {
    fn insert(&mut self, slot: usize, x: f64, y: f64) {
        if self.positions.len() <= slot {
            self.positions.resize_with(slot + 1, || None);
        }
        let (x, y) = self.root.bounds.clamp_point(x, y);
        match self.positions[slot].replace((x, y)) {
            Some((ox, oy)) => {
                self.root.remove(slot, ox, oy);
            }
            None => self.len += 1,
        }
        self.root.insert(slot, x, y);
    }

    fn remove(&mut self, slot: usize) {
        let Some((x, y)) = self.positions.get_mut(slot).and_then(Option::take) else {
            return;
        };
        let removed = self.root.remove(slot, x, y);
        debug_assert!(removed, "position table and tree disagree for slot {slot}");
        self.len -= 1;
    }

    fn clear(&mut self) {
        self.root = Node::leaf(self.root.bounds, 0);
        self.positions.clear();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn query_rect<'a>(&'a self, rect: Aabb2D<f64>) -> Box<dyn Iterator<Item = usize> + 'a> {
        let mut out = Vec::new();
        if !rect.is_empty() {
            self.root.search(&rect, &mut out);
        }
        out.sort_unstable();
        Box::new(out.into_iter())
    }
}

impl Debug for QuadTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.root.bounds)
            .field("alive", &self.len)
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn unit() -> QuadTree {
        QuadTree::new(Aabb2D::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn splits_past_capacity_and_still_finds_everything() {
        let mut t = unit();
        let n = 200;
        for i in 0..n {
            let f = i as f64 / n as f64;
            t.insert(i, f, 1.0 - f);
        }
        assert!(t.depth() > 0, "tree should have split");
        assert_eq!(t.query_rect(t.bounds()).count(), n);
        let hits: Vec<_> = t.query_rect(Aabb2D::new(0.0, 0.89, 0.1025, 1.0)).collect();
        assert_eq!(hits.len(), 21);
    }

    #[test]
    fn coincident_points_stop_at_max_depth() {
        let mut t = unit();
        for i in 0..(QuadTree::MAX_ELEMENTS * 3) {
            t.insert(i, 0.3, 0.3);
        }
        assert!(t.depth() <= QuadTree::MAX_DEPTH);
        let hits = t.query_rect(Aabb2D::around(0.3, 0.3, 0.0, 0.0)).count();
        assert_eq!(hits, QuadTree::MAX_ELEMENTS * 3);
    }

    #[test]
    fn out_of_bounds_points_are_clamped() {
        let mut t = unit();
        t.insert(0, -5.0, 0.5);
        let hits: Vec<_> = t.query_rect(Aabb2D::around(0.0, 0.5, 0.01, 0.01)).collect();
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn remove_and_clear() {
        let mut t = unit();
        t.insert(0, 0.1, 0.1);
        t.insert(1, 0.2, 0.2);
        t.remove(0);
        t.remove(7);
        assert_eq!(t.len(), 1);
        let hits: Vec<_> = t.query_rect(t.bounds()).collect();
        assert_eq!(hits, vec![1]);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.query_rect(t.bounds()).count(), 0);
    }
}
