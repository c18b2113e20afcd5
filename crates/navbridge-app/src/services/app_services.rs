// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer. Loads the config, builds the navigation module over
// the HTTP providers and runs one bridge call per command.
//
// The command line is its own host: it drives `NavigationModule` directly
// instead of going through the Android-only manager guard.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use navbridge_bridge::{EngineFactory, NavigationModule};
use navbridge_core::config::BridgeConfig;
use navbridge_core::error::Result;
use navbridge_core::types::{BridgePayload, Coordinate};
use navbridge_mapbox::MapboxEngineFactory;

pub struct AppServices {
    config_path: PathBuf,
    config: BridgeConfig,
    module: Arc<NavigationModule>,
}

impl AppServices {
    /// Build services for `config`. Must run inside a Tokio runtime.
    pub fn start(config_path: PathBuf, config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        let factory: Arc<dyn EngineFactory> = Arc::new(MapboxEngineFactory::new(&config)?);
        let module = Arc::new(NavigationModule::with_factory(config.clone(), factory));
        info!(
            profile = config.travel_profile.as_str(),
            strategy = ?config.geocoding.strategy,
            "app services initialised"
        );
        Ok(Self {
            config_path,
            config,
            module,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub async fn route(&self, waypoints: &[Coordinate]) -> Result<BridgePayload> {
        let pairs = waypoints.iter().map(|c| c.to_pair()).collect();
        self.module
            .calculate_route(pairs)
            .wait_timeout(self.config.call_timeout())
            .await
    }

    pub async fn geocode(&self, point: Coordinate, language: &str) -> Result<BridgePayload> {
        self.module
            .geocoding(point.to_pair(), language)
            .wait_timeout(self.config.call_timeout())
            .await
    }

    /// Cancel outstanding provider work and drop the engines.
    pub fn shutdown(&self) {
        self.module.shutdown();
    }
}

// -- Config file persistence -------------------------------------------------

/// Config at `path`, or defaults when the file does not exist yet.
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "no config file, using defaults");
        return Ok(BridgeConfig::default());
    }
    BridgeConfig::load(path)
}

pub fn persist_config(path: &Path, config: &BridgeConfig) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use navbridge_core::config::GeocodingStrategy;
    use navbridge_core::error::NavBridgeError;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn persisted_config_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = BridgeConfig::default();
        config.geocoding.strategy = GeocodingStrategy::Offline;
        config.call_timeout_secs = Some(20);

        persist_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn invalid_config_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = BridgeConfig {
            call_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(persist_config(&path, &config), Err(NavBridgeError::Config(_))));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn single_waypoint_rejects_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig {
            access_token: Some("pk.test".into()),
            ..Default::default()
        };
        let services = AppServices::start(dir.path().join("config.json"), config).unwrap();

        let result = services.route(&[Coordinate::new(114.19, 22.35).unwrap()]).await;
        assert!(matches!(result, Err(NavBridgeError::InvalidWaypoints(_))));
        services.shutdown();
    }
}
