// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// navbridge: Core types, GeoJSON model and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod geojson;
pub mod polyline;
pub mod rejection;
pub mod types;

pub use config::BridgeConfig;
pub use error::NavBridgeError;
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use types::*;
