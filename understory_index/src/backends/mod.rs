// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `grid`: uniform grid with floor-divided cells. Cheapest to build, and
//!   queries are O(1) expected when the cell size matches the query size.
//! - `quadtree`: point quad-tree over fixed bounds. Adapts to uneven density
//!   and does not need a query-size hint up front.

pub mod grid;
pub mod quadtree;

pub use grid::UniformGrid;
pub use quadtree::QuadTree;
