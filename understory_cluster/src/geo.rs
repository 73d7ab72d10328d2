// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geographic positions and the item trait.

use core::fmt;

use crate::error::ClusterError;

/// A WGS84-style latitude/longitude pair in degrees.
///
/// Always finite, with latitude in `[-90, 90]`. Longitude is not wrapped; the
/// projection handles values outside `[-180, 180]` linearly.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    /// Create a position, rejecting non-finite values and latitudes beyond the poles.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ClusterError> {
        if !lat.is_finite() || !lng.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ClusterError::InvalidPosition { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }

    // Callers guarantee the range; used by unprojection, which is range-safe.
    pub(crate) fn from_raw(lat: f64, lng: f64) -> Self {
        debug_assert!(lat.is_finite() && lng.is_finite(), "raw position must be finite");
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Something with a position that can be clustered.
///
/// Identity, as far as [`Algorithm::remove_item`](crate::Algorithm::remove_item)
/// is concerned, is `PartialEq`. The engine never deduplicates: adding the same
/// item twice yields two entries.
pub trait ClusterItem: Clone + PartialEq + Send + Sync + 'static {
    /// Position of the item. Must not change while the item is in an algorithm.
    fn position(&self) -> LatLng;
}

impl ClusterItem for LatLng {
    fn position(&self) -> LatLng {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_positions() {
        assert!(LatLng::new(f64::NAN, 0.0).is_err());
        assert!(LatLng::new(0.0, f64::INFINITY).is_err());
        assert!(matches!(
            LatLng::new(90.5, 10.0),
            Err(ClusterError::InvalidPosition { lat, .. }) if lat == 90.5
        ));
    }

    #[test]
    fn accepts_poles_and_unwrapped_longitude() {
        let p = LatLng::new(-90.0, 540.0).unwrap();
        assert_eq!(p.lat(), -90.0);
        assert_eq!(p.lng(), 540.0);
        assert_eq!(p.position(), p);
    }

    #[test]
    fn display_is_fixed_precision() {
        let p = LatLng::new(1.5, -2.25).unwrap();
        assert_eq!(p.to_string(), "(1.500000, -2.250000)");
    }
}
