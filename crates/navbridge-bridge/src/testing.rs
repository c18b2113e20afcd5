// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory providers for exercising the bridge without a native SDK.
//
// Every fake records what it was asked and answers from a script set by the
// test. Callbacks are invoked synchronously unless the script says `Hold`.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use navbridge_core::error::{NavBridgeError, Result};
use navbridge_core::types::{Coordinate, Place, TileDataDomain};

use crate::traits::*;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Build a [`Place`] at `[longitude, latitude]`.
pub fn place(text: &str, place_name: &str, address: Option<&str>, center: [f64; 2]) -> Place {
    Place {
        place_name: place_name.to_owned(),
        text: text.to_owned(),
        address: address.map(str::to_owned),
        coordinate: Coordinate {
            longitude: center[0],
            latitude: center[1],
        },
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Cancelable whose flag can be inspected through any clone.
#[derive(Clone, Default)]
pub struct FakeTask {
    canceled: Arc<AtomicBool>,
    on_cancel: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl FakeTask {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_hook(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            canceled: Arc::new(AtomicBool::new(false)),
            on_cancel: Some(Arc::new(hook)),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

impl Cancelable for FakeTask {
    fn cancel(&self) {
        if !self.canceled.swap(true, Ordering::SeqCst) {
            if let Some(hook) = &self.on_cancel {
                hook();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum RouterScript {
    /// Answer every request with this outcome.
    Respond(RouterOutcome),
    /// Answer with a failure carrying these reasons.
    Fail(Vec<String>),
    /// Answer with an engine-side cancellation.
    Cancel,
    /// Keep the callback until [`FakeRouter::complete_held`].
    Hold,
    /// Refuse to submit the request.
    Refuse(String),
}

impl RouterScript {
    /// Online routes with the given encoded geometries, best first.
    pub fn routes(geometries: Vec<Option<String>>) -> Self {
        let routes = geometries
            .into_iter()
            .map(|geometry| NavigationRoute {
                geometry,
                distance_m: 0.0,
                duration_s: 0.0,
            })
            .collect();
        RouterScript::Respond(RouterOutcome::Ready {
            routes,
            origin: RouterOrigin::Online,
        })
    }
}

type HeldRoutes = Arc<Mutex<Vec<(u64, RouterCallback)>>>;

pub struct FakeRouter {
    script: Mutex<RouterScript>,
    requests: Mutex<Vec<RouteOptions>>,
    held: HeldRoutes,
    tasks: Mutex<Vec<FakeTask>>,
    next_id: AtomicU64,
}

impl Default for FakeRouter {
    fn default() -> Self {
        Self {
            script: Mutex::new(RouterScript::routes(Vec::new())),
            requests: Mutex::new(Vec::new()),
            held: Arc::new(Mutex::new(Vec::new())),
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl FakeRouter {
    pub fn script(&self, script: RouterScript) {
        *lock(&self.script) = script;
    }

    pub fn requests(&self) -> Vec<RouteOptions> {
        lock(&self.requests).clone()
    }

    /// Cancel handles returned for each request, oldest first.
    pub fn tasks(&self) -> Vec<FakeTask> {
        lock(&self.tasks).clone()
    }

    pub fn held_count(&self) -> usize {
        lock(&self.held).len()
    }

    /// Deliver `outcome` to the oldest held request. Returns false if none.
    pub fn complete_held(&self, outcome: RouterOutcome) -> bool {
        let callback = {
            let mut held = lock(&self.held);
            if held.is_empty() {
                None
            } else {
                Some(held.remove(0).1)
            }
        };
        match callback {
            Some(callback) => {
                callback(outcome);
                true
            }
            None => false,
        }
    }
}

impl RoutingEngine for FakeRouter {
    fn request_routes(
        &self,
        options: RouteOptions,
        callback: RouterCallback,
    ) -> Result<RouteRequest> {
        let script = lock(&self.script).clone();
        if let RouterScript::Refuse(reason) = script {
            return Err(NavBridgeError::Dispatch(reason));
        }
        lock(&self.requests).push(options);
        let key = self.next_id.fetch_add(1, Ordering::SeqCst);

        // Cancelling drops the held callback, as an engine would.
        let held = Arc::clone(&self.held);
        let task = FakeTask::with_hook(move || lock(&held).retain(|(k, _)| *k != key));
        lock(&self.tasks).push(task.clone());

        match script {
            RouterScript::Respond(outcome) => callback(outcome),
            RouterScript::Fail(reasons) => callback(RouterOutcome::Failure(
                reasons
                    .into_iter()
                    .map(|message| RouterFailure {
                        message,
                        code: None,
                    })
                    .collect(),
            )),
            RouterScript::Cancel => callback(RouterOutcome::Canceled {
                origin: RouterOrigin::Online,
            }),
            RouterScript::Hold => lock(&self.held).push((key, callback)),
            RouterScript::Refuse(_) => unreachable!("refused above"),
        }
        Ok(RouteRequest {
            id: RequestId(key),
            task: Box::new(task),
        })
    }
}

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

pub struct FakeGeocoder {
    result: Mutex<std::result::Result<Vec<Place>, String>>,
    queries: Mutex<Vec<ReverseGeocodeQuery>>,
}

impl Default for FakeGeocoder {
    fn default() -> Self {
        Self {
            result: Mutex::new(Ok(Vec::new())),
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGeocoder {
    /// Answer every query with `result`; `Err` becomes a geocoding error.
    pub fn respond(&self, result: std::result::Result<Vec<Place>, String>) {
        *lock(&self.result) = result;
    }

    pub fn queries(&self) -> Vec<ReverseGeocodeQuery> {
        lock(&self.queries).clone()
    }
}

impl OnlineGeocoder for FakeGeocoder {
    fn reverse_geocode(
        &self,
        query: ReverseGeocodeQuery,
        callback: SearchCallback,
    ) -> Result<Box<dyn Cancelable>> {
        lock(&self.queries).push(query);
        let result = lock(&self.result).clone();
        callback(result.map_err(NavBridgeError::Geocoding));
        Ok(Box::new(FakeTask::new()))
    }
}

// ---------------------------------------------------------------------------
// Tile store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
enum LoadScript {
    #[default]
    Hold,
    Complete,
    Fail(String),
}

#[derive(Default)]
pub struct FakeTileStore {
    tokens: Mutex<Vec<(TileDataDomain, String)>>,
    loads: Mutex<Vec<(String, TileRegionLoadOptions)>>,
    tasks: Mutex<Vec<FakeTask>>,
    script: Mutex<LoadScript>,
    held: Mutex<Vec<(String, TileCompletionCallback)>>,
}

impl FakeTileStore {
    /// Tokens in the order they were set.
    pub fn tokens(&self) -> Vec<(TileDataDomain, String)> {
        lock(&self.tokens).clone()
    }

    pub fn loads(&self) -> Vec<(String, TileRegionLoadOptions)> {
        lock(&self.loads).clone()
    }

    pub fn tasks(&self) -> Vec<FakeTask> {
        lock(&self.tasks).clone()
    }

    /// Complete later loads immediately.
    pub fn complete_loads(&self) {
        *lock(&self.script) = LoadScript::Complete;
    }

    /// Fail later loads immediately with `reason`.
    pub fn fail_loads(&self, reason: &str) {
        *lock(&self.script) = LoadScript::Fail(reason.to_owned());
    }

    /// Finish every held load successfully.
    pub fn finish_held(&self) {
        let held: Vec<_> = lock(&self.held).drain(..).collect();
        for (region_id, on_complete) in held {
            on_complete(Ok(loaded(region_id)));
        }
    }
}

fn loaded(region_id: String) -> TileRegion {
    TileRegion {
        id: region_id,
        completed_resource_count: 1,
        completed_resource_size: 1024,
    }
}

impl TileStore for FakeTileStore {
    fn set_access_token(&self, domain: TileDataDomain, token: &str) {
        lock(&self.tokens).push((domain, token.to_owned()));
    }

    fn load_tile_region(
        &self,
        region_id: &str,
        options: TileRegionLoadOptions,
        on_progress: TileProgressCallback,
        on_complete: TileCompletionCallback,
    ) -> Box<dyn Cancelable> {
        lock(&self.loads).push((region_id.to_owned(), options));
        let task = FakeTask::new();
        lock(&self.tasks).push(task.clone());

        on_progress(TileRegionProgress {
            completed_resources: 0,
            required_resources: 1,
        });
        let script = lock(&self.script).clone();
        match script {
            LoadScript::Hold => lock(&self.held).push((region_id.to_owned(), on_complete)),
            LoadScript::Complete => on_complete(Ok(loaded(region_id.to_owned()))),
            LoadScript::Fail(reason) => on_complete(Err(NavBridgeError::EngineUnavailable(reason))),
        }
        Box::new(task)
    }
}

// ---------------------------------------------------------------------------
// Offline search
// ---------------------------------------------------------------------------

type Listeners = Arc<Mutex<Vec<(u64, IndexListener)>>>;

pub struct FakeOfflineSearch {
    listeners: Listeners,
    listener_tasks: Mutex<Vec<FakeTask>>,
    next_listener: AtomicU64,
    result: Mutex<std::result::Result<Vec<Place>, String>>,
    searches: Mutex<Vec<OfflineReverseGeoOptions>>,
}

impl Default for FakeOfflineSearch {
    fn default() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            listener_tasks: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            result: Mutex::new(Ok(Vec::new())),
            searches: Mutex::new(Vec::new()),
        }
    }
}

impl FakeOfflineSearch {
    pub fn respond(&self, result: std::result::Result<Vec<Place>, String>) {
        *lock(&self.result) = result;
    }

    /// Deliver `event` to every registered listener.
    pub fn emit(&self, event: IndexEvent) {
        let listeners: Vec<IndexListener> = lock(&self.listeners)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn listener_tasks(&self) -> Vec<FakeTask> {
        lock(&self.listener_tasks).clone()
    }

    pub fn searches(&self) -> Vec<OfflineReverseGeoOptions> {
        lock(&self.searches).clone()
    }
}

impl OfflineSearchEngine for FakeOfflineSearch {
    fn tileset_descriptor(&self) -> TilesetDescriptor {
        TilesetDescriptor("mbx-search-fake".into())
    }

    fn add_index_change_listener(&self, listener: IndexListener) -> Box<dyn Cancelable> {
        let key = self.next_listener.fetch_add(1, Ordering::SeqCst);
        lock(&self.listeners).push((key, listener));

        let listeners = Arc::clone(&self.listeners);
        let task = FakeTask::with_hook(move || lock(&listeners).retain(|(k, _)| *k != key));
        lock(&self.listener_tasks).push(task.clone());
        Box::new(task)
    }

    fn reverse_geocoding(
        &self,
        options: OfflineReverseGeoOptions,
        callback: SearchCallback,
    ) -> Box<dyn Cancelable> {
        lock(&self.searches).push(options);
        let result = lock(&self.result).clone();
        callback(result.map_err(NavBridgeError::Geocoding));
        Box::new(FakeTask::new())
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Hands out one shared instance of each fake and counts constructions.
#[derive(Default)]
pub struct FakeFactory {
    router: Arc<FakeRouter>,
    geocoder: Arc<FakeGeocoder>,
    search: Arc<FakeOfflineSearch>,
    tile_store: Arc<FakeTileStore>,
    tile_stores_built: AtomicUsize,
    navigations_built: AtomicUsize,
    geocoders_built: AtomicUsize,
    searches_built: AtomicUsize,
    fail_navigation: AtomicBool,
}

impl FakeFactory {
    pub fn router(&self) -> &Arc<FakeRouter> {
        &self.router
    }

    pub fn geocoder(&self) -> &Arc<FakeGeocoder> {
        &self.geocoder
    }

    pub fn search(&self) -> &Arc<FakeOfflineSearch> {
        &self.search
    }

    pub fn tile_store(&self) -> &Arc<FakeTileStore> {
        &self.tile_store
    }

    /// The tile store, once the factory has built it.
    pub fn last_tile_store(&self) -> Option<Arc<FakeTileStore>> {
        (self.tile_stores_built() > 0).then(|| Arc::clone(&self.tile_store))
    }

    pub fn fail_next_navigation(&self) {
        self.fail_navigation.store(true, Ordering::SeqCst);
    }

    pub fn tile_stores_built(&self) -> usize {
        self.tile_stores_built.load(Ordering::SeqCst)
    }

    pub fn navigations_built(&self) -> usize {
        self.navigations_built.load(Ordering::SeqCst)
    }

    pub fn geocoders_built(&self) -> usize {
        self.geocoders_built.load(Ordering::SeqCst)
    }

    pub fn searches_built(&self) -> usize {
        self.searches_built.load(Ordering::SeqCst)
    }

    /// Successful constructions of any kind.
    pub fn constructions(&self) -> usize {
        self.tile_stores_built()
            + self.navigations_built()
            + self.geocoders_built()
            + self.searches_built()
    }
}

impl EngineFactory for FakeFactory {
    fn tile_store(&self) -> Result<Arc<dyn TileStore>> {
        self.tile_stores_built.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.tile_store) as Arc<dyn TileStore>)
    }

    fn navigation(
        &self,
        _access_token: &str,
        _tile_store: Arc<dyn TileStore>,
    ) -> Result<Arc<dyn RoutingEngine>> {
        if self.fail_navigation.swap(false, Ordering::SeqCst) {
            return Err(NavBridgeError::EngineUnavailable(
                "navigation engine refused to start".into(),
            ));
        }
        self.navigations_built.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.router) as Arc<dyn RoutingEngine>)
    }

    fn geocoder(&self, _access_token: &str) -> Result<Arc<dyn OnlineGeocoder>> {
        self.geocoders_built.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.geocoder) as Arc<dyn OnlineGeocoder>)
    }

    fn offline_search(
        &self,
        _access_token: &str,
        _tile_store: Arc<dyn TileStore>,
    ) -> Result<Arc<dyn OfflineSearchEngine>> {
        self.searches_built.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.search) as Arc<dyn OfflineSearchEngine>)
    }
}
