// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Waypoint shapes accepted from the application layer.

use serde::{Deserialize, Serialize};

use navbridge_core::types::Coordinate;

/// GeoJSON `"type": "Point"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointTag {
    Point,
}

/// One waypoint as the application hands it over.
///
/// Accepts `[lon, lat]`, `{"longitude": .., "latitude": ..}` or a GeoJSON
/// Point geometry. All normalize to a longitude-first pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaypointInput {
    Pair([f64; 2]),
    Named { longitude: f64, latitude: f64 },
    Point {
        #[serde(rename = "type")]
        kind: PointTag,
        coordinates: [f64; 2],
    },
}

impl WaypointInput {
    pub fn lon_lat(longitude: f64, latitude: f64) -> Self {
        Self::Named {
            longitude,
            latitude,
        }
    }

    /// `[longitude, latitude]`.
    pub fn to_pair(&self) -> [f64; 2] {
        match *self {
            Self::Pair(pair) => pair,
            Self::Named {
                longitude,
                latitude,
            } => [longitude, latitude],
            Self::Point { coordinates, .. } => coordinates,
        }
    }
}

impl From<[f64; 2]> for WaypointInput {
    fn from(pair: [f64; 2]) -> Self {
        Self::Pair(pair)
    }
}

impl From<Coordinate> for WaypointInput {
    fn from(c: Coordinate) -> Self {
        Self::lon_lat(c.longitude, c.latitude)
    }
}
