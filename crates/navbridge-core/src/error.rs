// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the navigation bridge.

use thiserror::Error;

/// Top-level error type for all bridge operations.
///
/// Every variant ends up as exactly one rejected bridge call; see
/// [`crate::rejection`] for the code/message pair the application layer sees.
#[derive(Debug, Error)]
pub enum NavBridgeError {
    // -- Input --
    #[error("invalid waypoints: {0}")]
    InvalidWaypoints(String),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    // -- Routing --
    #[error("no routes found")]
    NoRoutesFound,

    #[error("route {index} has no geometry")]
    MissingGeometry { index: usize },

    #[error("routing failed: {0}")]
    RouterFailure(String),

    #[error("request canceled")]
    Canceled,

    #[error("polyline decoding failed: {0}")]
    Polyline(String),

    // -- Geocoding / offline search --
    #[error("geocoding failed: {0}")]
    Geocoding(String),

    #[error("offline region '{region_id}' failed to load: {reason}")]
    OfflineRegion { region_id: String, reason: String },

    #[error("offline index error: {0}")]
    OfflineIndex(String),

    // -- Engines / credentials --
    #[error("access credential unavailable: {0}")]
    Credential(String),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("request dispatch failed: {0}")]
    Dispatch(String),

    #[error("provider HTTP error: {0}")]
    Http(String),

    // -- Call lifecycle --
    #[error("call {0} was already settled")]
    AlreadySettled(String),

    #[error("call {0} was abandoned before settling")]
    CallAbandoned(String),

    #[error("call timed out after {0:?}")]
    Timeout(std::time::Duration),

    // -- Platform / persistence --
    #[error("feature not available on this platform")]
    PlatformUnavailable,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NavBridgeError>;
