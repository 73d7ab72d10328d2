// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clustering configuration.

use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

/// Spatial index used for neighbor queries during a clustering pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStrategy {
    /// Uniform grid whose cell size equals the search span at the requested zoom.
    #[default]
    Grid,
    /// Point quad-tree over the unit world square.
    QuadTree,
}

/// Tunables for the algorithm, the cache, and the manager's worker.
///
/// Every field has a default, so a partial document deserializes fine:
///
/// ```rust
/// use understory_cluster::ClusterConfig;
///
/// let cfg: ClusterConfig = serde_json::from_str(r#"{ "max_distance_px": 60.0 }"#).unwrap();
/// assert_eq!(cfg.max_distance_px, 60.0);
/// assert_eq!(cfg.cache_capacity, 5);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Items closer than this many screen pixels at the current zoom are grouped.
    pub max_distance_px: f64,
    /// Pixel width of one map tile; the world is `tile_size * 2^zoom` pixels wide.
    pub tile_size: f64,
    /// Spatial index used by the distance-based algorithm.
    pub index: IndexStrategy,
    /// Number of zoom levels kept by the result cache.
    pub cache_capacity: usize,
    /// Compute the neighboring zoom levels in the background after each delivery.
    pub precache_neighbors: bool,
    /// Name of the manager's background thread.
    pub worker_name: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_distance_px: 100.0,
            tile_size: 256.0,
            index: IndexStrategy::Grid,
            cache_capacity: 5,
            precache_neighbors: true,
            worker_name: "cluster-worker".to_owned(),
        }
    }
}

impl ClusterConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !(self.max_distance_px.is_finite() && self.max_distance_px > 0.0) {
            return Err(ClusterError::InvalidConfig(format!(
                "max_distance_px must be positive, got {}",
                self.max_distance_px
            )));
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(ClusterError::InvalidConfig(format!(
                "tile_size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.cache_capacity == 0 {
            return Err(ClusterError::InvalidConfig(
                "cache_capacity must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ClusterConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            ClusterConfig {
                max_distance_px: 0.0,
                ..ClusterConfig::default()
            },
            ClusterConfig {
                tile_size: f64::NAN,
                ..ClusterConfig::default()
            },
            ClusterConfig {
                cache_capacity: 0,
                ..ClusterConfig::default()
            },
        ];
        for cfg in bad {
            assert!(
                matches!(cfg.validate(), Err(ClusterError::InvalidConfig(_))),
                "{cfg:?} should be rejected"
            );
        }
    }

    #[test]
    fn parses_index_strategy() {
        let cfg: ClusterConfig =
            serde_json::from_str(r#"{ "index": "quad_tree", "precache_neighbors": false }"#)
                .unwrap();
        assert_eq!(cfg.index, IndexStrategy::QuadTree);
        assert!(!cfg.precache_neighbors);
        assert_eq!(cfg.tile_size, 256.0);
    }
}
