// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine factory for the HTTP providers.
//
// Routing and online geocoding go over HTTP. Tile region downloads and the
// offline search index only exist in the native SDK, so this factory keeps
// the tile store credentials but refuses region loads and offline search.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use reqwest::Client;
use tokio::runtime::Handle;
use tracing::{info, warn};

use navbridge_bridge::traits::{
    Cancelable, EngineFactory, OfflineSearchEngine, OnlineGeocoder, RoutingEngine,
    TileCompletionCallback, TileProgressCallback, TileRegionLoadOptions, TileStore,
};
use navbridge_core::config::BridgeConfig;
use navbridge_core::error::{NavBridgeError, Result};
use navbridge_core::types::TileDataDomain;

use crate::directions::DirectionsClient;
use crate::geocoding::GeocodingClient;
use crate::http::{Finished, build_client};

pub struct MapboxEngineFactory {
    http: Client,
    base_url: String,
    runtime: Handle,
}

impl MapboxEngineFactory {
    /// Must be called from inside a Tokio runtime; requests are spawned on it.
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| NavBridgeError::EngineUnavailable(format!("no Tokio runtime: {e}")))?;
        Ok(Self::with_runtime(config, build_client()?, runtime))
    }

    pub fn with_runtime(config: &BridgeConfig, http: Client, runtime: Handle) -> Self {
        Self {
            http,
            base_url: config.api_base_url.clone(),
            runtime,
        }
    }
}

impl EngineFactory for MapboxEngineFactory {
    fn tile_store(&self) -> Result<Arc<dyn TileStore>> {
        Ok(Arc::new(OnlineTileStore::default()))
    }

    fn navigation(
        &self,
        access_token: &str,
        _tile_store: Arc<dyn TileStore>,
    ) -> Result<Arc<dyn RoutingEngine>> {
        info!(base_url = %self.base_url, "directions client ready");
        Ok(Arc::new(DirectionsClient::new(
            self.http.clone(),
            self.base_url.clone(),
            access_token,
            self.runtime.clone(),
        )))
    }

    fn geocoder(&self, access_token: &str) -> Result<Arc<dyn OnlineGeocoder>> {
        info!(base_url = %self.base_url, "geocoding client ready");
        Ok(Arc::new(GeocodingClient::new(
            self.http.clone(),
            self.base_url.clone(),
            access_token,
            self.runtime.clone(),
        )))
    }

    fn offline_search(
        &self,
        _access_token: &str,
        _tile_store: Arc<dyn TileStore>,
    ) -> Result<Arc<dyn OfflineSearchEngine>> {
        Err(NavBridgeError::EngineUnavailable(
            "offline search requires the native search SDK".into(),
        ))
    }
}

/// Tile store without local storage. Keeps per-domain tokens only.
#[derive(Default)]
pub struct OnlineTileStore {
    tokens: Mutex<HashMap<TileDataDomain, String>>,
}

impl OnlineTileStore {
    pub fn has_token(&self, domain: TileDataDomain) -> bool {
        self.tokens
            .lock()
            .map(|t| t.contains_key(&domain))
            .unwrap_or(false)
    }
}

impl TileStore for OnlineTileStore {
    fn set_access_token(&self, domain: TileDataDomain, token: &str) {
        match self.tokens.lock() {
            Ok(mut tokens) => {
                tokens.insert(domain, token.to_owned());
            }
            Err(_) => warn!(?domain, "tile store token map poisoned"),
        }
    }

    fn load_tile_region(
        &self,
        region_id: &str,
        _options: TileRegionLoadOptions,
        _on_progress: TileProgressCallback,
        on_complete: TileCompletionCallback,
    ) -> Box<dyn Cancelable> {
        warn!(region = region_id, "tile region requested from online-only tile store");
        on_complete(Err(NavBridgeError::EngineUnavailable(
            "tile regions require the native tile store".into(),
        )));
        Box::new(Finished)
    }
}
