// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point index basics.
//!
//! Insert a few points into both backends, query a neighborhood, and remove one.
//!
//! Run:
//! - `cargo run -p understory_demos --example index_basics`

use understory_index::{Aabb2D, Backend, PointIndex, QuadTree};

fn show<B: Backend>(name: &str, mut idx: PointIndex<&'static str, B>) {
    let cafe = idx.insert(0.20, 0.20, "cafe");
    idx.insert(0.21, 0.19, "bakery");
    idx.insert(0.80, 0.75, "harbor");

    let near = Aabb2D::around(0.2, 0.2, 0.05, 0.05);
    let hits: Vec<_> = idx.query_rect(near).map(|(_, name)| name).collect();
    println!("{name}: near (0.2, 0.2) -> {hits:?}");

    idx.remove(cafe);
    let hits: Vec<_> = idx.query_rect(near).map(|(_, name)| name).collect();
    println!("{name}: after removing cafe -> {hits:?}");
    assert_eq!(idx.get(cafe), None, "stale keys stop resolving");
}

fn main() {
    show("grid", PointIndex::with_uniform_grid(0.1));
    show(
        "quadtree",
        PointIndex::<_, QuadTree>::with_quadtree(Aabb2D::new(0.0, 0.0, 1.0, 1.0)),
    );
}
