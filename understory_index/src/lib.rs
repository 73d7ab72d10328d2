// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_index --heading-base-level=0

//! Understory Index: a 2D point index for neighborhood queries.
//!
//! Understory Index is the spatial building block behind `understory_cluster`.
//!
//! - Insert and remove points with small `Copy` payloads.
//! - Query every point inside a rectangle.
//! - Generational [`Key`]s, so a handle to a removed entry never aliases a new one.
//!
//! It works on plain `f64` coordinates and does not depend on any geometry crate.
//! Higher layers project their data (for example latitude/longitude onto a Mercator
//! plane) and feed the projected points here.
//!
//! Backends are pluggable via the [`Backend`] trait so you can swap the spatial strategy
//! without API churn.
//!
//! # Example
//!
//! ```rust
//! use understory_index::{Aabb2D, PointIndex, UniformGrid};
//!
//! // A grid with 10×10 cells.
//! let mut idx: PointIndex<u32, UniformGrid> = PointIndex::with_uniform_grid(10.0);
//! let k1 = idx.insert(1.0, 1.0, 1);
//! let _k2 = idx.insert(42.0, 7.0, 2);
//!
//! // Everything within 3 units of (0, 0).
//! let hits: Vec<_> = idx.query_rect(Aabb2D::around(0.0, 0.0, 3.0, 3.0)).collect();
//! assert_eq!(hits, vec![(k1, 1)]);
//!
//! idx.remove(k1);
//! assert_eq!(idx.len(), 1);
//! ```
//!
//! ## Choosing a backend
//!
//! - [`UniformGrid`]: floor-divided square cells with an origin offset, so negative
//!   coordinates work. Choose the cell size close to your query size and each query
//!   touches at most four cells. Cheapest to build from scratch.
//! - [`QuadTree`]: point quad-tree over fixed bounds. Handles very uneven density
//!   without tuning; points outside the bounds are clamped onto them.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for coordinates. Debug builds assert on insert.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod index;
pub mod types;

pub use backend::Backend;
pub use backends::{QuadTree, UniformGrid};
pub use index::{Key, PointIndex};
pub use types::Aabb2D;
