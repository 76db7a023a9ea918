// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for kernel, overlay and composition operations

use thiserror::Error;

/// Errors raised by mesh operations.
///
/// None of these are recoverable: operators do not roll back, so a mesh that
/// produced an error may be partially mutated and should be discarded.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A topological precondition was violated by the caller
    #[error("Invalid topology operation in {op}: {reason}")]
    InvalidTopologyOperation { op: &'static str, reason: String },

    /// Imported geometry uses one directed edge in more than one face
    #[error("Non-manifold geometry: directed edge {from} -> {to} is used by more than one face")]
    NonManifoldGeometry { from: usize, to: usize },

    /// A space warp produced a degenerate local Jacobian
    #[error("Singular transform (determinant {determinant:e})")]
    SingularTransform { determinant: f64 },

    /// Boundary segment counts disagree across a seam or face
    #[error("Boundary segment count mismatch: expected {expected}, found {found}")]
    SegmentCountMismatch { expected: usize, found: usize },

    /// The half-edge graph no longer satisfies its invariants
    #[error("Corrupt topology: {0}")]
    CorruptTopology(String),

    /// A handle refers to a removed element
    #[error("Stale {0} handle")]
    StaleHandle(&'static str),
}

impl MeshError {
    /// Creates an invalid topology operation error.
    pub fn invalid(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTopologyOperation {
            op,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the kernel
pub type Result<T> = std::result::Result<T, MeshError>;
