// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits at both edges of the bridge.
//
// `NativeNavigation` is what the client-facing manager calls. Everything else
// describes the external provider (routing engine, tile store, search
// engines, credentials) the bridge module drives. Providers report back
// through boxed callbacks, matching how the native SDKs are shaped.

use std::sync::Arc;

use navbridge_core::error::Result;
use navbridge_core::polyline::ROUTE_GEOMETRY_PRECISION;
use navbridge_core::types::{Coordinate, Place, TileDataDomain, TravelProfile, Waypoints};

use crate::pending::PendingCall;

/// Entry points the application layer reaches through the bridge.
///
/// Both calls return immediately; the returned [`PendingCall`] is settled
/// exactly once by the provider callback (or by a dispatch fault).
pub trait NativeNavigation: Send + Sync {
    /// Human-readable host name (e.g. "android", "Desktop (stub)").
    fn platform_name(&self) -> &str;

    /// Request a route through `waypoints`, each `[longitude, latitude]`.
    fn calculate_route(&self, waypoints: Vec<[f64; 2]>) -> PendingCall;

    /// Look up places around `point` (`[longitude, latitude]`).
    fn geocoding(&self, point: [f64; 2], language: &str) -> PendingCall;
}

/// Handle to provider work that can be stopped.
pub trait Cancelable: Send + Sync {
    fn cancel(&self);
}

/// Provider-assigned identifier of a route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// A submitted route request. Cancelling `task` stops the request; its
/// callback is then dropped without running.
pub struct RouteRequest {
    pub id: RequestId,
    pub task: Box<dyn Cancelable>,
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Route request handed to the routing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOptions {
    pub profile: TravelProfile,
    /// Longitude-first, in leg order.
    pub coordinates: Vec<Coordinate>,
    pub alternatives: bool,
    pub full_overview: bool,
    pub steps: bool,
    pub geometry_precision: u32,
}

impl RouteOptions {
    /// The engine's default navigation options for `profile`.
    pub fn with_defaults(profile: TravelProfile, waypoints: &Waypoints) -> Self {
        Self {
            profile,
            coordinates: waypoints.as_slice().to_vec(),
            alternatives: true,
            full_overview: true,
            steps: true,
            geometry_precision: ROUTE_GEOMETRY_PRECISION,
        }
    }
}

/// One ranked route candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationRoute {
    /// Encoded polyline at `RouteOptions::geometry_precision`.
    pub geometry: Option<String>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Where the engine computed the routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterOrigin {
    Online,
    Onboard,
    Custom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouterFailure {
    pub message: String,
    pub code: Option<String>,
}

impl std::fmt::Display for RouterFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Single answer of the routing engine to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterOutcome {
    Ready {
        routes: Vec<NavigationRoute>,
        origin: RouterOrigin,
    },
    Failure(Vec<RouterFailure>),
    Canceled {
        origin: RouterOrigin,
    },
}

pub type RouterCallback = Box<dyn FnOnce(RouterOutcome) + Send + 'static>;

pub trait RoutingEngine: Send + Sync {
    /// Submit a route request. An `Err` means nothing was submitted and the
    /// callback will not run.
    fn request_routes(&self, options: RouteOptions, callback: RouterCallback)
    -> Result<RouteRequest>;
}

// ---------------------------------------------------------------------------
// Tile store
// ---------------------------------------------------------------------------

/// Opaque tileset descriptor produced by a search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetDescriptor(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct TileRegionLoadOptions {
    pub geometry: Coordinate,
    pub descriptors: Vec<TilesetDescriptor>,
    pub accept_expired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegionProgress {
    pub completed_resources: u64,
    pub required_resources: u64,
}

/// A region that finished loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRegion {
    pub id: String,
    pub completed_resource_count: u64,
    pub completed_resource_size: u64,
}

pub type TileProgressCallback = Box<dyn Fn(TileRegionProgress) + Send + Sync + 'static>;
pub type TileCompletionCallback = Box<dyn FnOnce(Result<TileRegion>) + Send + 'static>;

pub trait TileStore: Send + Sync {
    fn set_access_token(&self, domain: TileDataDomain, token: &str);

    /// Start (or refresh) a region download. Progress may be reported any
    /// number of times; completion exactly once.
    fn load_tile_region(
        &self,
        region_id: &str,
        options: TileRegionLoadOptions,
        on_progress: TileProgressCallback,
        on_complete: TileCompletionCallback,
    ) -> Box<dyn Cancelable>;
}

// ---------------------------------------------------------------------------
// Search / geocoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEventType {
    Add,
    Update,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    Changed {
        region_id: String,
        event_type: IndexEventType,
    },
    Error {
        region_id: String,
        message: String,
    },
}

pub type IndexListener = Arc<dyn Fn(IndexEvent) + Send + Sync + 'static>;
pub type SearchCallback = Box<dyn FnOnce(Result<Vec<Place>>) + Send + 'static>;

#[derive(Debug, Clone, PartialEq)]
pub struct OfflineReverseGeoOptions {
    pub center: Coordinate,
    pub language: Option<String>,
}

/// Search engine answering from downloaded tile regions.
pub trait OfflineSearchEngine: Send + Sync {
    fn tileset_descriptor(&self) -> TilesetDescriptor;

    /// Listener stays registered until the returned handle is cancelled.
    fn add_index_change_listener(&self, listener: IndexListener) -> Box<dyn Cancelable>;

    fn reverse_geocoding(
        &self,
        options: OfflineReverseGeoOptions,
        callback: SearchCallback,
    ) -> Box<dyn Cancelable>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReverseGeocodeQuery {
    pub point: Coordinate,
    /// Place type filters, e.g. `poi.landmark`.
    pub types: Vec<String>,
    pub language: String,
}

/// Network geocoder.
pub trait OnlineGeocoder: Send + Sync {
    fn reverse_geocode(
        &self,
        query: ReverseGeocodeQuery,
        callback: SearchCallback,
    ) -> Result<Box<dyn Cancelable>>;
}

// ---------------------------------------------------------------------------
// Credentials and construction
// ---------------------------------------------------------------------------

/// Supplies the single access token every engine is configured with.
pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> Result<String>;
}

/// Builds engine handles. Called at most once per handle by
/// [`crate::engines::EngineHandles`] unless a construction fails.
pub trait EngineFactory: Send + Sync {
    fn tile_store(&self) -> Result<Arc<dyn TileStore>>;

    fn navigation(
        &self,
        access_token: &str,
        tile_store: Arc<dyn TileStore>,
    ) -> Result<Arc<dyn RoutingEngine>>;

    fn geocoder(&self, access_token: &str) -> Result<Arc<dyn OnlineGeocoder>>;

    fn offline_search(
        &self,
        access_token: &str,
        tile_store: Arc<dyn TileStore>,
    ) -> Result<Arc<dyn OfflineSearchEngine>>;
}
