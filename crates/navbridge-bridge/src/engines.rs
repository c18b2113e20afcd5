// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine handle context.
//
// One `EngineHandles` is owned by the application (usually inside a
// `NavigationModule`) and hands out the navigation engine, tile store and
// search engines. Each handle is built on first use by the injected
// `EngineFactory`; all construction happens under one mutex so concurrent
// first calls build a handle once. A failed construction is not cached.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use navbridge_core::error::{NavBridgeError, Result};
use navbridge_core::types::TileDataDomain;

use crate::traits::{
    CredentialProvider, EngineFactory, OfflineSearchEngine, OnlineGeocoder, RoutingEngine,
    TileStore,
};

#[derive(Default)]
struct Slots {
    access_token: Option<String>,
    tile_store: Option<Arc<dyn TileStore>>,
    navigation: Option<Arc<dyn RoutingEngine>>,
    geocoder: Option<Arc<dyn OnlineGeocoder>>,
    offline_search: Option<Arc<dyn OfflineSearchEngine>>,
}

impl Slots {
    fn any(&self) -> bool {
        self.tile_store.is_some()
            || self.navigation.is_some()
            || self.geocoder.is_some()
            || self.offline_search.is_some()
    }
}

pub struct EngineHandles {
    factory: Arc<dyn EngineFactory>,
    credentials: Arc<dyn CredentialProvider>,
    /// Domains the tile store gets the access token for.
    domains: Vec<TileDataDomain>,
    slots: Mutex<Slots>,
}

impl EngineHandles {
    /// `offline_search` adds the search domain to the tile store credentials.
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        credentials: Arc<dyn CredentialProvider>,
        offline_search: bool,
    ) -> Self {
        let mut domains = vec![TileDataDomain::Maps, TileDataDomain::Navigation];
        if offline_search {
            domains.push(TileDataDomain::Search);
        }
        Self {
            factory,
            credentials,
            domains,
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn tile_domains(&self) -> &[TileDataDomain] {
        &self.domains
    }

    pub fn tile_store(&self) -> Result<Arc<dyn TileStore>> {
        let mut slots = self.lock();
        self.tile_store_locked(&mut slots)
    }

    pub fn navigation(&self) -> Result<Arc<dyn RoutingEngine>> {
        let mut slots = self.lock();
        if let Some(engine) = &slots.navigation {
            return Ok(Arc::clone(engine));
        }
        let token = self.token_locked(&mut slots)?;
        let tile_store = self.tile_store_locked(&mut slots)?;
        let engine = self.factory.navigation(&token, tile_store)?;
        info!("navigation engine constructed");
        slots.navigation = Some(Arc::clone(&engine));
        Ok(engine)
    }

    pub fn geocoder(&self) -> Result<Arc<dyn OnlineGeocoder>> {
        let mut slots = self.lock();
        if let Some(geocoder) = &slots.geocoder {
            return Ok(Arc::clone(geocoder));
        }
        let token = self.token_locked(&mut slots)?;
        let geocoder = self.factory.geocoder(&token)?;
        info!("online geocoder constructed");
        slots.geocoder = Some(Arc::clone(&geocoder));
        Ok(geocoder)
    }

    pub fn offline_search(&self) -> Result<Arc<dyn OfflineSearchEngine>> {
        let mut slots = self.lock();
        if let Some(engine) = &slots.offline_search {
            return Ok(Arc::clone(engine));
        }
        let token = self.token_locked(&mut slots)?;
        let tile_store = self.tile_store_locked(&mut slots)?;
        let engine = self.factory.offline_search(&token, tile_store)?;
        info!("offline search engine constructed");
        slots.offline_search = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Whether any handle has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.lock().any()
    }

    /// Drop every handle and the cached token. The next call rebuilds them.
    pub fn release(&self) {
        let mut slots = self.lock();
        if slots.any() {
            info!("releasing engine handles");
        }
        *slots = Slots::default();
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn token_locked(&self, slots: &mut Slots) -> Result<String> {
        if let Some(token) = &slots.access_token {
            return Ok(token.clone());
        }
        let token = self.credentials.access_token()?;
        if token.trim().is_empty() {
            return Err(NavBridgeError::Credential("access token is empty".into()));
        }
        slots.access_token = Some(token.clone());
        Ok(token)
    }

    fn tile_store_locked(&self, slots: &mut Slots) -> Result<Arc<dyn TileStore>> {
        if let Some(store) = &slots.tile_store {
            return Ok(Arc::clone(store));
        }
        let token = self.token_locked(slots)?;
        let store = self.factory.tile_store()?;
        for domain in &self.domains {
            store.set_access_token(*domain, &token);
            debug!(?domain, "tile store credential set");
        }
        info!(domains = self.domains.len(), "tile store constructed");
        slots.tile_store = Some(Arc::clone(&store));
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFactory, FakeTileStore};
    use crate::credentials::StaticCredential;

    fn handles(factory: &Arc<FakeFactory>, offline: bool) -> EngineHandles {
        EngineHandles::new(
            Arc::clone(factory) as Arc<dyn EngineFactory>,
            Arc::new(StaticCredential::new("pk.test")),
            offline,
        )
    }

    #[test]
    fn nothing_built_until_first_use() {
        let factory = Arc::new(FakeFactory::default());
        let engines = handles(&factory, false);
        assert!(!engines.is_initialized());
        assert_eq!(factory.constructions(), 0);
    }

    #[test]
    fn navigation_builds_tile_store_once() {
        let factory = Arc::new(FakeFactory::default());
        let engines = handles(&factory, false);

        engines.navigation().unwrap();
        engines.navigation().unwrap();
        engines.tile_store().unwrap();

        assert_eq!(factory.tile_stores_built(), 1);
        assert_eq!(factory.navigations_built(), 1);
        assert!(engines.is_initialized());
    }

    #[test]
    fn tile_store_gets_token_per_domain() {
        let factory = Arc::new(FakeFactory::default());
        let online = handles(&factory, false);
        online.tile_store().unwrap();
        let store: Arc<FakeTileStore> = factory.last_tile_store().unwrap();
        assert_eq!(
            store.tokens(),
            vec![
                (TileDataDomain::Maps, "pk.test".to_string()),
                (TileDataDomain::Navigation, "pk.test".to_string()),
            ]
        );

        let factory = Arc::new(FakeFactory::default());
        let offline = handles(&factory, true);
        offline.offline_search().unwrap();
        let store = factory.last_tile_store().unwrap();
        assert!(store.tokens().contains(&(TileDataDomain::Search, "pk.test".to_string())));
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        let factory = Arc::new(FakeFactory::default());
        let engines = Arc::new(handles(&factory, false));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let engines = Arc::clone(&engines);
                std::thread::spawn(move || engines.navigation().map(|_| ()))
            })
            .collect();
        for t in threads {
            t.join().unwrap().unwrap();
        }

        assert_eq!(factory.navigations_built(), 1);
        assert_eq!(factory.tile_stores_built(), 1);
    }

    #[test]
    fn failed_construction_is_retried() {
        let factory = Arc::new(FakeFactory::default());
        factory.fail_next_navigation();
        let engines = handles(&factory, false);

        assert!(matches!(engines.navigation(), Err(NavBridgeError::EngineUnavailable(_))));
        engines.navigation().unwrap();
        assert_eq!(factory.navigations_built(), 1);
    }

    #[test]
    fn empty_token_is_credential_error() {
        let factory = Arc::new(FakeFactory::default());
        let engines = EngineHandles::new(
            Arc::clone(&factory) as Arc<dyn EngineFactory>,
            Arc::new(StaticCredential::new("  ")),
            false,
        );
        assert!(matches!(engines.geocoder(), Err(NavBridgeError::Credential(_))));
        assert_eq!(factory.constructions(), 0);
    }

    #[test]
    fn release_drops_handles() {
        let factory = Arc::new(FakeFactory::default());
        let engines = handles(&factory, false);
        engines.geocoder().unwrap();
        engines.release();
        assert!(!engines.is_initialized());
        engines.geocoder().unwrap();
        assert_eq!(factory.geocoders_built(), 2);
    }
}
