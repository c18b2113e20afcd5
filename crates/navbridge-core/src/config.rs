// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NavBridgeError, Result};
use crate::types::{Coordinate, TravelProfile};

/// Environment variable consulted when no token is configured.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// How `geocoding` calls are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocodingStrategy {
    /// Network reverse geocoding against the provider's places API.
    #[default]
    Online,
    /// Reverse geocoding against a downloaded tile region.
    Offline,
}

/// Tile region downloaded for offline search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineRegionConfig {
    pub region_id: String,
    /// Point geometry the region is built around.
    pub geometry: Coordinate,
    /// Keep using tiles past their expiry date.
    pub accept_expired: bool,
}

impl Default for OfflineRegionConfig {
    fn default() -> Self {
        Self {
            region_id: "hk-offline-search-map".into(),
            geometry: Coordinate {
                longitude: 136.0339911055176,
                latitude: 37.899920004207516,
            },
            accept_expired: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub strategy: GeocodingStrategy,
    /// Place type filter for online lookups.
    pub poi_category: String,
    pub offline_region: OfflineRegionConfig,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            strategy: GeocodingStrategy::Online,
            poi_category: "poi.landmark".into(),
            offline_region: OfflineRegionConfig::default(),
        }
    }
}

/// Persistent bridge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Provider access token. Falls back to `MAPBOX_ACCESS_TOKEN` when unset.
    pub access_token: Option<String>,
    /// Profile for every route request (walking unless overridden).
    pub travel_profile: TravelProfile,
    pub geocoding: GeocodingConfig,
    /// Base URL of the provider's HTTP API.
    pub api_base_url: String,
    /// Upper bound on a single bridge call. `None` waits indefinitely.
    pub call_timeout_secs: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            travel_profile: TravelProfile::Walking,
            geocoding: GeocodingConfig::default(),
            api_base_url: "https://api.mapbox.com".into(),
            call_timeout_secs: None,
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            NavBridgeError::Config(format!("{}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(NavBridgeError::Config("api_base_url is empty".into()));
        }
        if self.geocoding.offline_region.region_id.trim().is_empty() {
            return Err(NavBridgeError::Config("offline region id is empty".into()));
        }
        if self.call_timeout_secs == Some(0) {
            return Err(NavBridgeError::Config("call_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }

    /// Copy safe to print: the token keeps only its scope prefix.
    pub fn redacted(&self) -> Self {
        Self {
            access_token: self.access_token.as_deref().map(mask_token),
            ..self.clone()
        }
    }

    /// Offline search needs the search tile domain credential as well.
    pub fn offline_search_enabled(&self) -> bool {
        self.geocoding.strategy == GeocodingStrategy::Offline
    }
}

/// `pk.eyJ1...` becomes `pk.****`; tokens without a scope prefix are fully
/// hidden.
fn mask_token(token: &str) -> String {
    match token.split_once('.') {
        Some((scope, _)) if !scope.is_empty() && scope.len() <= 3 => format!("{scope}.****"),
        _ => "****".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_walking_online() {
        let config = BridgeConfig::default();
        assert_eq!(config.travel_profile, TravelProfile::Walking);
        assert_eq!(config.geocoding.strategy, GeocodingStrategy::Online);
        assert_eq!(config.geocoding.poi_category, "poi.landmark");
        assert!(config.call_timeout().is_none());
        assert!(!config.offline_search_enabled());
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"geocoding":{"strategy":"offline"},"call_timeout_secs":30}"#)
            .unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert!(config.offline_search_enabled());
        assert_eq!(config.geocoding.offline_region.region_id, "hk-offline-search-map");
        assert_eq!(config.call_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.api_base_url, "https://api.mapbox.com");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = BridgeConfig {
            access_token: Some("pk.test".into()),
            travel_profile: TravelProfile::Cycling,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(BridgeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"call_timeout_secs":0}"#).unwrap();
        assert!(matches!(BridgeConfig::load(&path), Err(NavBridgeError::Config(_))));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(BridgeConfig::load(&path), Err(NavBridgeError::Config(_))));
    }

    #[test]
    fn redacted_copy_hides_the_token() {
        let config = BridgeConfig {
            access_token: Some("pk.eyJ1Ijoic2VjcmV0In0.c2lnbmF0dXJl".into()),
            ..Default::default()
        };
        let shown = serde_json::to_string_pretty(&config.redacted()).unwrap();
        assert!(shown.contains("pk.****"));
        assert!(!shown.contains("eyJ1"));
        assert!(config.access_token.as_deref().is_some_and(|t| t.starts_with("pk.eyJ1")));

        assert_eq!(mask_token("opaque-secret"), "****");
        assert_eq!(mask_token("verylongscope.secret"), "****");
        assert_eq!(BridgeConfig::default().redacted().access_token, None);
    }
}
