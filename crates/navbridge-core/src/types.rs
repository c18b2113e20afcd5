// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the navigation bridge.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NavBridgeError, Result};
use crate::geojson::FeatureCollection;

/// A longitude/latitude pair.
///
/// Always handed to providers longitude first. Range checks are left to the
/// provider; only non-finite values are refused here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(NavBridgeError::InvalidCoordinate(format!(
                "non-finite value in ({longitude}, {latitude})"
            )));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Build from a `[longitude, latitude]` pair.
    pub fn from_pair(pair: [f64; 2]) -> Result<Self> {
        Self::new(pair[0], pair[1])
    }

    /// `[longitude, latitude]`, the GeoJSON position order.
    pub fn to_pair(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

impl FromStr for Coordinate {
    type Err = NavBridgeError;

    /// Parse `"lon,lat"`.
    fn from_str(s: &str) -> Result<Self> {
        let (lon, lat) = s.split_once(',').ok_or_else(|| {
            NavBridgeError::InvalidCoordinate(format!("expected 'lon,lat', got '{s}'"))
        })?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| NavBridgeError::InvalidCoordinate(format!("'{v}': {e}")))
        };
        Self::new(parse(lon)?, parse(lat)?)
    }
}

/// Ordered route waypoints. At least two; order defines leg order.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoints(Vec<Coordinate>);

impl Waypoints {
    pub const MIN_LEN: usize = 2;

    pub fn new(points: Vec<Coordinate>) -> Result<Self> {
        if points.len() < Self::MIN_LEN {
            return Err(NavBridgeError::InvalidWaypoints(format!(
                "need at least {} waypoints, got {}",
                Self::MIN_LEN,
                points.len()
            )));
        }
        Ok(Self(points))
    }

    /// Build from raw `[longitude, latitude]` pairs as they cross the bridge.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Result<Self> {
        let points = pairs
            .iter()
            .map(|p| Coordinate::from_pair(*p))
            .collect::<Result<Vec<_>>>()?;
        Self::new(points)
    }

    pub fn as_slice(&self) -> &[Coordinate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Travel profile requested from the routing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelProfile {
    #[default]
    Walking,
    Cycling,
    Driving,
    DrivingTraffic,
}

impl TravelProfile {
    /// Profile identifier in the provider's `mapbox/<profile>` namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Cycling => "cycling",
            Self::Driving => "driving",
            Self::DrivingTraffic => "driving-traffic",
        }
    }
}

impl FromStr for TravelProfile {
    type Err = NavBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "walking" => Ok(Self::Walking),
            "cycling" => Ok(Self::Cycling),
            "driving" => Ok(Self::Driving),
            "driving-traffic" => Ok(Self::DrivingTraffic),
            other => Err(NavBridgeError::Config(format!("unknown travel profile '{other}'"))),
        }
    }
}

/// Tile data domains that each carry their own access credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileDataDomain {
    Maps,
    Navigation,
    Search,
}

/// Host platform of the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Android,
    Ios,
    Web,
    Desktop,
}

impl Platform {
    /// Platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(target_arch = "wasm32") {
            Self::Web
        } else {
            Self::Desktop
        }
    }

    /// Only the Android host ships the navigation bridge module.
    pub fn hosts_navigation_bridge(&self) -> bool {
        matches!(self, Self::Android)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
            Self::Desktop => "desktop",
        }
    }
}

/// Unique identifier for a bridge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a single bridge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallState {
    /// Created, request not yet accepted by the provider.
    Idle,
    /// Provider accepted the request; waiting for its callback.
    Dispatched,
    Resolved,
    Rejected,
}

impl CallState {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

/// Point-in-time view of a call, used for logging and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub id: CallId,
    pub state: CallState,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Value a resolved bridge call carries across the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgePayload {
    #[serde(rename = "geoJson")]
    pub geo_json: String,
}

impl BridgePayload {
    pub fn from_collection(collection: &FeatureCollection) -> Result<Self> {
        Ok(Self {
            geo_json: collection.to_json()?,
        })
    }

    /// Parse the carried GeoJSON text back into a collection.
    pub fn parse(&self) -> Result<FeatureCollection> {
        FeatureCollection::from_json(&self.geo_json)
    }
}

/// A place matched by a geocoding or offline search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub place_name: String,
    pub text: String,
    pub address: Option<String>,
    pub coordinate: Coordinate,
}
