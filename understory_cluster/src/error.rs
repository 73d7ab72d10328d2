// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for the clustering engine.

use std::io;

use thiserror::Error;

/// Errors surfaced by the public clustering API.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A latitude/longitude pair that is non-finite or out of range.
    #[error("invalid position: lat={lat}, lng={lng}")]
    InvalidPosition {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },

    /// The camera reported a zoom level that cannot be clustered at.
    #[error("invalid zoom level: {0}")]
    InvalidZoom(f64),

    /// A configuration value failed validation.
    #[error("invalid cluster configuration: {0}")]
    InvalidConfig(String),

    /// The background worker thread could not be started.
    #[error("failed to spawn cluster worker: {0}")]
    WorkerSpawn(#[source] io::Error),
}

/// A computation was superseded by a newer request before it finished.
///
/// This never escapes [`ClusterManager`](crate::ClusterManager): a cancelled
/// result is dropped, not reported.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("cluster computation superseded")]
pub struct Cancelled;
