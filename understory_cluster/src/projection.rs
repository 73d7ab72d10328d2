// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spherical Mercator projection onto a unit world square.
//!
//! `x` grows eastward from 0 at longitude -180 to 1 at +180; `y` grows
//! southward from 0 near the north pole to 1 near the south pole. At zoom
//! `z` the world is `tile_size * 2^z` pixels wide, so one world unit maps to
//! that many screen pixels.

use core::f64::consts::PI;

use kurbo::Point;

use crate::geo::LatLng;

/// Web Mercator latitude limit; beyond it `y` leaves the unit square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Project a position onto the unit world square.
pub fn project(p: LatLng) -> Point {
    let x = p.lng() / 360.0 + 0.5;
    let lat = p.lat().clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let sin = lat.to_radians().sin();
    let y = 0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI);
    // Rounding at the clamped latitude can land a hair outside.
    Point::new(x, y.clamp(0.0, 1.0))
}

/// Inverse of [`project`].
pub fn unproject(p: Point) -> LatLng {
    let lng = (p.x - 0.5) * 360.0;
    let lat = 90.0 - (((p.y - 0.5) * 2.0 * PI).exp().atan().to_degrees() * 2.0);
    LatLng::from_raw(lat.clamp(-90.0, 90.0), lng)
}

/// Side length, in world units, of `pixels` screen pixels at a whole zoom level.
pub fn world_span(pixels: f64, tile_size: f64, zoom: u32) -> f64 {
    let scale = f64::from(1_u32 << zoom.min(31));
    pixels / scale / tile_size
}
