// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Navigation bridge module.
//
// Turns one bridge call into one provider request and the provider's single
// answer into one settlement of the call:
//
//   calculate_route  -> RoutingEngine::request_routes -> first route as a
//                       LineString FeatureCollection
//   geocoding        -> OnlineGeocoder::reverse_geocode, or for the offline
//                       strategy: tile region load + index listener, then
//                       OfflineSearchEngine::reverse_geocoding on the first
//                       of load completion or index event
//
// Faults raised while building or submitting a request reject the call
// directly; nothing is retried.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use navbridge_core::config::{BridgeConfig, GeocodingStrategy};
use navbridge_core::error::{NavBridgeError, Result};
use navbridge_core::geojson::{Feature, FeatureCollection, Geometry};
use navbridge_core::polyline;
use navbridge_core::types::{BridgePayload, Coordinate, Place, Platform, Waypoints};

use crate::credentials::credential_from_config;
use crate::engines::EngineHandles;
use crate::pending::{PendingCall, Promise, pending_call};
use crate::tasks::TaskRegistry;
use crate::traits::{
    EngineFactory, IndexEvent, IndexEventType, IndexListener, NativeNavigation,
    NavigationRoute, OfflineReverseGeoOptions, ReverseGeocodeQuery, RouteOptions, RouterOutcome,
    TileRegionLoadOptions,
};

pub struct NavigationModule {
    config: BridgeConfig,
    engines: Arc<EngineHandles>,
    tasks: Arc<TaskRegistry>,
}

impl NavigationModule {
    pub fn new(config: BridgeConfig, engines: Arc<EngineHandles>) -> Self {
        Self {
            config,
            engines,
            tasks: Arc::new(TaskRegistry::new()),
        }
    }

    /// Build the engine context from `factory` and the configured credential.
    pub fn with_factory(config: BridgeConfig, factory: Arc<dyn EngineFactory>) -> Self {
        let engines = EngineHandles::new(
            factory,
            credential_from_config(&config),
            config.offline_search_enabled(),
        );
        Self::new(config, Arc::new(engines))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn engines(&self) -> &Arc<EngineHandles> {
        &self.engines
    }

    /// Calls that still have provider work attached.
    pub fn active_calls(&self) -> usize {
        self.tasks.active_calls()
    }

    /// Cancel all outstanding provider work; affected calls reject with
    /// `Canceled`.
    pub fn cancel_all(&self) -> usize {
        let canceled = self.tasks.cancel_all();
        if canceled > 0 {
            info!(canceled, "outstanding bridge calls canceled");
        }
        canceled
    }

    /// Cancel outstanding work and drop every engine handle.
    pub fn shutdown(&self) {
        self.cancel_all();
        self.engines.release();
    }

    pub fn calculate_route(&self, waypoints: Vec<[f64; 2]>) -> PendingCall {
        let (promise, call) = self.open_call();
        if let Err(e) = self.dispatch_route(&waypoints, &promise) {
            warn!(call = %promise.id(), error = %e, "route request not dispatched");
            settle(&promise, Err(e));
        }
        call
    }

    pub fn geocoding(&self, point: [f64; 2], language: &str) -> PendingCall {
        let (promise, call) = self.open_call();
        let dispatched = match self.config.geocoding.strategy {
            GeocodingStrategy::Online => self.dispatch_online_geocoding(point, language, &promise),
            GeocodingStrategy::Offline => {
                self.dispatch_offline_geocoding(point, language, &promise)
            }
        };
        if let Err(e) = dispatched {
            warn!(call = %promise.id(), error = %e, "geocoding request not dispatched");
            settle(&promise, Err(e));
            self.tasks.release(promise.id());
        }
        call
    }

    /// A fresh call whose provider work is released if the caller stops
    /// waiting for it.
    fn open_call(&self) -> (Promise, PendingCall) {
        let (promise, call) = pending_call();
        let tasks = Arc::downgrade(&self.tasks);
        let call = call.on_abandon(move |id| {
            if let Some(tasks) = tasks.upgrade() {
                tasks.abandon(id);
            }
        });
        (promise, call)
    }

    fn dispatch_route(&self, waypoints: &[[f64; 2]], promise: &Promise) -> Result<()> {
        let waypoints = Waypoints::from_pairs(waypoints)?;
        let options = RouteOptions::with_defaults(self.config.travel_profile, &waypoints);
        let router = self.engines.navigation()?;

        let completion = promise.clone();
        let tasks = Arc::clone(&self.tasks);
        let request = router.request_routes(
            options,
            Box::new(move |outcome| {
                settle(&completion, route_outcome(outcome));
                tasks.release(completion.id());
            }),
        )?;
        promise.mark_dispatched();
        self.tasks.track(promise, request.task);
        debug!(
            call = %promise.id(),
            request = request.id.0,
            waypoints = waypoints.len(),
            profile = self.config.travel_profile.as_str(),
            "route request dispatched"
        );
        Ok(())
    }

    fn dispatch_online_geocoding(
        &self,
        point: [f64; 2],
        language: &str,
        promise: &Promise,
    ) -> Result<()> {
        let center = Coordinate::from_pair(point)?;
        let geocoder = self.engines.geocoder()?;
        let query = ReverseGeocodeQuery {
            point: center,
            types: vec![self.config.geocoding.poi_category.clone()],
            language: language.to_owned(),
        };

        let completion = promise.clone();
        let tasks = Arc::clone(&self.tasks);
        let task = geocoder.reverse_geocode(
            query,
            Box::new(move |result| {
                settle(&completion, result.and_then(|places| places_payload(&places)));
                tasks.release(completion.id());
            }),
        )?;
        promise.mark_dispatched();
        self.tasks.track(promise, task);
        debug!(call = %promise.id(), %center, language, "geocoding request dispatched");
        Ok(())
    }

    /// Load the configured tile region, then reverse geocode `point` against
    /// it once the load completes or the search index reports the region.
    fn dispatch_offline_geocoding(
        &self,
        point: [f64; 2],
        language: &str,
        promise: &Promise,
    ) -> Result<()> {
        let center = Coordinate::from_pair(point)?;
        let region = self.config.geocoding.offline_region.clone();
        let tile_store = self.engines.tile_store()?;
        let search = self.engines.offline_search()?;

        // Runs at most once, from whichever of index event or load
        // completion reports the region ready first.
        let queried = Arc::new(AtomicBool::new(false));
        let query: Arc<dyn Fn() + Send + Sync> = {
            let completion = promise.clone();
            let tasks = Arc::clone(&self.tasks);
            let search = Arc::clone(&search);
            let language = language.to_owned();

            Arc::new(move || {
                if queried.swap(true, Ordering::SeqCst) || completion.is_settled() {
                    return;
                }
                let done = completion.clone();
                let done_tasks = Arc::clone(&tasks);
                let task = search.reverse_geocoding(
                    OfflineReverseGeoOptions {
                        center,
                        language: Some(language.clone()),
                    },
                    Box::new(move |result| {
                        settle(&done, result.and_then(|places| places_payload(&places)));
                        done_tasks.release(done.id());
                    }),
                );
                tasks.track(&completion, task);
            })
        };

        let listener: IndexListener = {
            let completion = promise.clone();
            let tasks = Arc::clone(&self.tasks);
            let region_id = region.region_id.clone();
            let query = Arc::clone(&query);

            Arc::new(move |event: IndexEvent| match event {
                IndexEvent::Changed {
                    region_id: changed,
                    event_type: IndexEventType::Add | IndexEventType::Update,
                } if changed == region_id => {
                    info!(call = %completion.id(), region = %region_id, "offline region indexed");
                    query();
                }
                IndexEvent::Error {
                    region_id: failed,
                    message,
                } if failed == region_id => {
                    settle(&completion, Err(NavBridgeError::OfflineIndex(message)));
                    tasks.release(completion.id());
                }
                other => debug!(?other, "ignoring index event"),
            })
        };
        let listener_task = search.add_index_change_listener(listener);
        self.tasks.track(promise, listener_task);

        let options = TileRegionLoadOptions {
            geometry: region.geometry,
            descriptors: vec![search.tileset_descriptor()],
            accept_expired: region.accept_expired,
        };
        let progress_region = region.region_id.clone();
        let completion = promise.clone();
        let tasks = Arc::clone(&self.tasks);
        let failed_region = region.region_id.clone();
        let load_task = tile_store.load_tile_region(
            &region.region_id,
            options,
            Box::new(move |progress| {
                debug!(
                    region = %progress_region,
                    completed = progress.completed_resources,
                    required = progress.required_resources,
                    "tile region loading"
                );
            }),
            Box::new(move |result| match result {
                Ok(loaded) => {
                    info!(
                        region = %loaded.id,
                        resources = loaded.completed_resource_count,
                        bytes = loaded.completed_resource_size,
                        "tile region loaded"
                    );
                    // An already indexed region sends no further index event.
                    query();
                }
                Err(e) => {
                    settle(
                        &completion,
                        Err(NavBridgeError::OfflineRegion {
                            region_id: failed_region,
                            reason: e.to_string(),
                        }),
                    );
                    tasks.release(completion.id());
                }
            }),
        );
        promise.mark_dispatched();
        self.tasks.track(promise, load_task);
        debug!(call = %promise.id(), region = %region.region_id, "offline geocoding dispatched");
        Ok(())
    }
}

impl NativeNavigation for NavigationModule {
    fn platform_name(&self) -> &str {
        Platform::current().as_str()
    }

    fn calculate_route(&self, waypoints: Vec<[f64; 2]>) -> PendingCall {
        NavigationModule::calculate_route(self, waypoints)
    }

    fn geocoding(&self, point: [f64; 2], language: &str) -> PendingCall {
        NavigationModule::geocoding(self, point, language)
    }
}

/// Settle `promise`, logging instead of failing when it already settled.
fn settle(promise: &Promise, outcome: Result<BridgePayload>) {
    let resolved = outcome.is_ok();
    match promise.settle(outcome) {
        Ok(()) if resolved => info!(call = %promise.id(), "bridge call resolved"),
        Ok(()) => info!(call = %promise.id(), "bridge call rejected"),
        Err(e) => warn!(error = %e, "duplicate completion ignored"),
    }
}

fn route_outcome(outcome: RouterOutcome) -> Result<BridgePayload> {
    match outcome {
        RouterOutcome::Ready { routes, origin } => {
            debug!(routes = routes.len(), ?origin, "routes ready");
            let first = routes.first().ok_or(NavBridgeError::NoRoutesFound)?;
            BridgePayload::from_collection(&route_collection(first)?)
        }
        RouterOutcome::Failure(reasons) => {
            let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
            Err(NavBridgeError::RouterFailure(if reasons.is_empty() {
                "unspecified failure".into()
            } else {
                reasons.join("; ")
            }))
        }
        RouterOutcome::Canceled { origin } => {
            debug!(?origin, "route request canceled by engine");
            Err(NavBridgeError::Canceled)
        }
    }
}

/// Highest-ranked route as a single LineString feature.
pub fn route_collection(route: &NavigationRoute) -> Result<FeatureCollection> {
    let encoded = route
        .geometry
        .as_deref()
        .ok_or(NavBridgeError::MissingGeometry { index: 0 })?;
    let path = polyline::decode(encoded, polyline::ROUTE_GEOMETRY_PRECISION)?;
    if path.len() < 2 {
        return Err(NavBridgeError::Polyline(format!(
            "route geometry has {} position(s)",
            path.len()
        )));
    }
    Ok(FeatureCollection::single(Feature::new(
        Geometry::line_string(&path),
    )))
}

/// Zero places is a valid, empty result.
fn places_payload(places: &[Place]) -> Result<BridgePayload> {
    debug!(places = places.len(), "places matched");
    BridgePayload::from_collection(&FeatureCollection::from_places(places))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFactory, RouterScript, place};
    use crate::traits::OfflineSearchEngine;
    use navbridge_core::config::OfflineRegionConfig;
    use navbridge_core::types::CallState;

    fn module_with(factory: &Arc<FakeFactory>, config: BridgeConfig) -> NavigationModule {
        let config = BridgeConfig {
            access_token: Some("pk.test".into()),
            ..config
        };
        NavigationModule::with_factory(config, Arc::clone(factory) as Arc<dyn EngineFactory>)
    }

    fn offline_config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.geocoding.strategy = GeocodingStrategy::Offline;
        config.geocoding.offline_region = OfflineRegionConfig {
            region_id: "test-region".into(),
            ..Default::default()
        };
        config
    }

    const SCENARIO: [[f64; 2]; 2] = [[114.1869509, 22.3528619], [114.1893649, 22.3522368]];

    fn encoded(path: &[[f64; 2]]) -> String {
        let coords: Vec<Coordinate> = path.iter().map(|p| Coordinate::from_pair(*p).unwrap()).collect();
        polyline::encode(&coords, 6).unwrap()
    }

    #[tokio::test]
    async fn first_route_becomes_single_line_string() {
        let factory = Arc::new(FakeFactory::default());
        let route_path = [[114.186951, 22.352862], [114.18801, 22.3526], [114.189365, 22.352237]];
        factory.router().script(RouterScript::routes(vec![
            Some(encoded(&route_path)),
            Some(encoded(&[[0.0, 0.0], [1.0, 1.0]])),
        ]));
        let module = module_with(&factory, BridgeConfig::default());

        let payload = module.calculate_route(SCENARIO.to_vec()).wait().await.unwrap();
        let fc = payload.parse().unwrap();

        assert_eq!(fc.len(), 1);
        assert_eq!(
            fc.features[0].geometry,
            Geometry::LineString {
                coordinates: route_path.to_vec()
            }
        );
    }

    #[tokio::test]
    async fn router_receives_longitude_first_walking_request() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::routes(vec![Some(encoded(&SCENARIO))]));
        let module = module_with(&factory, BridgeConfig::default());

        module.calculate_route(SCENARIO.to_vec()).wait().await.unwrap();

        let requests = factory.router().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].profile.as_str(), "walking");
        assert_eq!(requests[0].coordinates[0].longitude, 114.1869509);
        assert_eq!(requests[0].coordinates[0].latitude, 22.3528619);
        assert_eq!(requests[0].geometry_precision, 6);
    }

    #[tokio::test]
    async fn zero_routes_rejects() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::routes(vec![]));
        let module = module_with(&factory, BridgeConfig::default());

        let result = module.calculate_route(SCENARIO.to_vec()).wait().await;
        assert!(matches!(result, Err(NavBridgeError::NoRoutesFound)));
    }

    #[tokio::test]
    async fn missing_geometry_rejects() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::routes(vec![None]));
        let module = module_with(&factory, BridgeConfig::default());

        let result = module.calculate_route(SCENARIO.to_vec()).wait().await;
        assert!(matches!(result, Err(NavBridgeError::MissingGeometry { index: 0 })));
    }

    #[tokio::test]
    async fn router_failure_and_cancel_reject() {
        let factory = Arc::new(FakeFactory::default());
        let module = module_with(&factory, BridgeConfig::default());

        factory.router().script(RouterScript::Fail(vec!["NoSegment".into()]));
        let failed = module.calculate_route(SCENARIO.to_vec()).wait().await;
        match failed {
            Err(NavBridgeError::RouterFailure(msg)) => assert!(msg.contains("NoSegment")),
            other => panic!("expected router failure, got {other:?}"),
        }

        factory.router().script(RouterScript::Cancel);
        let canceled = module.calculate_route(SCENARIO.to_vec()).wait().await;
        assert!(matches!(canceled, Err(NavBridgeError::Canceled)));
    }

    #[tokio::test]
    async fn too_few_waypoints_rejects_without_engine() {
        let factory = Arc::new(FakeFactory::default());
        let module = module_with(&factory, BridgeConfig::default());

        let one = module.calculate_route(vec![[114.18, 22.35]]).wait().await;
        assert!(matches!(one, Err(NavBridgeError::InvalidWaypoints(_))));
        let none = module.calculate_route(vec![]).wait().await;
        assert!(matches!(none, Err(NavBridgeError::InvalidWaypoints(_))));
        assert_eq!(factory.constructions(), 0);
    }

    #[tokio::test]
    async fn dispatch_fault_rejects_with_its_message() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::Refuse("engine offline".into()));
        let module = module_with(&factory, BridgeConfig::default());

        let call = module.calculate_route(SCENARIO.to_vec());
        assert_eq!(call.state(), CallState::Rejected);
        match call.wait().await {
            Err(e) => assert!(e.to_string().contains("engine offline")),
            Ok(_) => panic!("dispatch fault must reject"),
        }
    }

    #[tokio::test]
    async fn held_route_stays_dispatched_until_engine_answers() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::Hold);
        let module = module_with(&factory, BridgeConfig::default());

        let call = module.calculate_route(SCENARIO.to_vec());
        assert_eq!(call.state(), CallState::Dispatched);

        factory.router().complete_held(RouterOutcome::Ready {
            routes: vec![NavigationRoute {
                geometry: Some(encoded(&SCENARIO)),
                distance_m: 250.0,
                duration_s: 180.0,
            }],
            origin: crate::traits::RouterOrigin::Online,
        });
        assert!(call.wait().await.is_ok());
    }

    #[tokio::test]
    async fn engines_reused_across_calls() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::routes(vec![Some(encoded(&SCENARIO))]));
        let module = module_with(&factory, BridgeConfig::default());

        for _ in 0..3 {
            module.calculate_route(SCENARIO.to_vec()).wait().await.unwrap();
        }
        assert_eq!(factory.navigations_built(), 1);
        assert_eq!(factory.tile_stores_built(), 1);
    }

    #[tokio::test]
    async fn online_geocoding_maps_places() {
        let factory = Arc::new(FakeFactory::default());
        factory.geocoder().respond(Ok(vec![
            place("Lion Rock", "Lion Rock, Kowloon, Hong Kong", Some("Lion Rock Trail"), [114.18, 22.35]),
            place("Amah Rock", "Amah Rock, Sha Tin, Hong Kong", None, [114.18, 22.37]),
        ]));
        let module = module_with(&factory, BridgeConfig::default());

        let fc = module
            .geocoding([114.19, 22.35], "zh")
            .wait()
            .await
            .unwrap()
            .parse()
            .unwrap();

        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].property_str("text"), Some("Lion Rock"));
        assert_eq!(fc.features[0].property_str("address"), Some("Lion Rock Trail"));
        assert_eq!(fc.features[1].property_str("address"), Some(""));

        let queries = factory.geocoder().queries();
        assert_eq!(queries[0].types, vec!["poi.landmark".to_string()]);
        assert_eq!(queries[0].language, "zh");
        assert_eq!(queries[0].point.to_pair(), [114.19, 22.35]);
        assert_eq!(module.active_calls(), 0);
    }

    #[tokio::test]
    async fn zero_places_resolves_empty() {
        let factory = Arc::new(FakeFactory::default());
        factory.geocoder().respond(Ok(vec![]));
        let module = module_with(&factory, BridgeConfig::default());

        let fc = module.geocoding([0.0, 0.0], "en").wait().await.unwrap().parse().unwrap();
        assert!(fc.is_empty());
    }

    #[tokio::test]
    async fn geocoding_failure_rejects() {
        let factory = Arc::new(FakeFactory::default());
        factory.geocoder().respond(Err("HTTP 401".into()));
        let module = module_with(&factory, BridgeConfig::default());

        let result = module.geocoding([114.19, 22.35], "en").wait().await;
        assert!(matches!(result, Err(NavBridgeError::Geocoding(_))));
    }

    #[tokio::test]
    async fn offline_geocoding_resolves_once_region_indexed() {
        let factory = Arc::new(FakeFactory::default());
        factory.search().respond(Ok(vec![place("Tai Wai", "Tai Wai, Sha Tin", None, [114.17, 22.37])]));
        let module = module_with(&factory, offline_config());

        let call = module.geocoding([114.17, 22.37], "en");
        assert_eq!(call.state(), CallState::Dispatched);

        let loads = factory.tile_store().loads();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].0, "test-region");
        assert!(loads[0].1.accept_expired);
        assert_eq!(loads[0].1.descriptors, vec![factory.search().tileset_descriptor()]);

        // Events for other regions are ignored.
        factory.search().emit(IndexEvent::Changed {
            region_id: "elsewhere".into(),
            event_type: IndexEventType::Add,
        });
        assert_eq!(call.state(), CallState::Dispatched);

        factory.search().emit(IndexEvent::Changed {
            region_id: "test-region".into(),
            event_type: IndexEventType::Add,
        });
        // A second update must not trigger a second query.
        factory.search().emit(IndexEvent::Changed {
            region_id: "test-region".into(),
            event_type: IndexEventType::Update,
        });

        let fc = call.wait().await.unwrap().parse().unwrap();
        assert_eq!(fc.features[0].property_str("text"), Some("Tai Wai"));

        let searches = factory.search().searches();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].center.to_pair(), [114.17, 22.37]);

        // Listener and load task are released with the call.
        assert_eq!(module.active_calls(), 0);
        assert!(factory.search().listener_tasks().iter().all(|t| t.is_canceled()));
        assert!(factory.tile_store().tasks().iter().all(|t| t.is_canceled()));
    }

    #[tokio::test]
    async fn offline_geocoding_resolves_when_region_already_loaded() {
        let factory = Arc::new(FakeFactory::default());
        factory.search().respond(Ok(vec![place("Tai Wai", "Tai Wai, Sha Tin", None, [114.17, 22.37])]));
        let module = module_with(&factory, offline_config());

        // The first call is answered by the index event.
        let first = module.geocoding([114.17, 22.37], "en");
        factory.search().emit(IndexEvent::Changed {
            region_id: "test-region".into(),
            event_type: IndexEventType::Add,
        });
        assert!(first.wait().await.is_ok());

        // The region is now loaded and indexed: no further event arrives.
        factory.tile_store().complete_loads();
        let second = module.geocoding([114.17, 22.37], "en");
        let fc = second.wait().await.unwrap().parse().unwrap();
        assert_eq!(fc.features[0].property_str("text"), Some("Tai Wai"));

        assert_eq!(factory.search().searches().len(), 2);
        assert_eq!(factory.search().listener_count(), 0);
        assert_eq!(module.active_calls(), 0);
    }

    #[tokio::test]
    async fn late_load_completion_does_not_query_twice() {
        let factory = Arc::new(FakeFactory::default());
        let module = module_with(&factory, offline_config());

        let call = module.geocoding([114.17, 22.37], "en");
        factory.search().emit(IndexEvent::Changed {
            region_id: "test-region".into(),
            event_type: IndexEventType::Add,
        });
        assert!(call.wait().await.is_ok());

        factory.tile_store().finish_held();
        assert_eq!(factory.search().searches().len(), 1);
    }

    #[tokio::test]
    async fn held_load_finishing_resolves_the_call() {
        let factory = Arc::new(FakeFactory::default());
        let module = module_with(&factory, offline_config());

        let call = module.geocoding([114.17, 22.37], "en");
        assert_eq!(factory.search().listener_count(), 1);
        assert_eq!(call.state(), CallState::Dispatched);

        factory.tile_store().finish_held();
        assert!(call.wait().await.unwrap().parse().unwrap().is_empty());
        assert_eq!(factory.search().listener_count(), 0);
    }

    #[tokio::test]
    async fn timed_out_offline_call_releases_its_work() {
        let factory = Arc::new(FakeFactory::default());
        let module = module_with(&factory, offline_config());

        for _ in 0..3 {
            let result = module
                .geocoding([114.17, 22.37], "en")
                .wait_timeout(Some(std::time::Duration::from_millis(5)))
                .await;
            assert!(matches!(result, Err(NavBridgeError::Timeout(_))));
        }

        assert_eq!(module.active_calls(), 0);
        assert_eq!(factory.search().listener_count(), 0);
        assert!(factory.tile_store().tasks().iter().all(|t| t.is_canceled()));

        // Loads finishing after the waiters left start no search.
        factory.tile_store().finish_held();
        assert!(factory.search().searches().is_empty());
    }

    #[tokio::test]
    async fn dropped_route_call_cancels_engine_request() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::Hold);
        let module = module_with(&factory, BridgeConfig::default());

        let call = module.calculate_route(SCENARIO.to_vec());
        assert_eq!(module.active_calls(), 1);
        drop(call);

        assert_eq!(module.active_calls(), 0);
        assert_eq!(factory.router().held_count(), 0);
        assert!(factory.router().tasks()[0].is_canceled());
    }

    #[tokio::test]
    async fn cancel_all_rejects_held_route() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::Hold);
        let module = module_with(&factory, BridgeConfig::default());

        let call = module.calculate_route(SCENARIO.to_vec());
        assert_eq!(module.cancel_all(), 1);
        assert!(matches!(call.wait().await, Err(NavBridgeError::Canceled)));
        assert_eq!(factory.router().held_count(), 0);
        assert!(factory.router().tasks()[0].is_canceled());
    }

    #[tokio::test]
    async fn answered_route_leaves_nothing_tracked() {
        let factory = Arc::new(FakeFactory::default());
        factory.router().script(RouterScript::routes(vec![Some(encoded(&SCENARIO))]));
        let module = module_with(&factory, BridgeConfig::default());

        module.calculate_route(SCENARIO.to_vec()).wait().await.unwrap();
        assert_eq!(module.active_calls(), 0);
        assert!(factory.router().tasks()[0].is_canceled());
    }

    #[tokio::test]
    async fn offline_tile_failure_rejects() {
        let factory = Arc::new(FakeFactory::default());
        factory.tile_store().fail_loads("quota exceeded");
        let module = module_with(&factory, offline_config());

        match module.geocoding([114.17, 22.37], "en").wait().await {
            Err(NavBridgeError::OfflineRegion { region_id, reason }) => {
                assert_eq!(region_id, "test-region");
                assert!(reason.contains("quota exceeded"));
            }
            other => panic!("expected offline region error, got {other:?}"),
        }
        assert_eq!(module.active_calls(), 0);
    }

    #[tokio::test]
    async fn offline_index_error_rejects() {
        let factory = Arc::new(FakeFactory::default());
        let module = module_with(&factory, offline_config());

        let call = module.geocoding([114.17, 22.37], "en");
        factory.search().emit(IndexEvent::Error {
            region_id: "test-region".into(),
            message: "corrupt index".into(),
        });
        assert!(matches!(call.wait().await, Err(NavBridgeError::OfflineIndex(_))));
    }

    #[tokio::test]
    async fn cancel_all_rejects_pending_offline_call() {
        let factory = Arc::new(FakeFactory::default());
        let module = module_with(&factory, offline_config());

        let call = module.geocoding([114.17, 22.37], "en");
        assert_eq!(module.active_calls(), 1);
        assert_eq!(module.cancel_all(), 1);
        assert!(matches!(call.wait().await, Err(NavBridgeError::Canceled)));
        assert!(factory.tile_store().tasks().iter().all(|t| t.is_canceled()));
    }

    #[tokio::test]
    async fn offline_strategy_adds_search_domain() {
        let factory = Arc::new(FakeFactory::default());
        let module = module_with(&factory, offline_config());
        let _call = module.geocoding([114.17, 22.37], "en");

        let domains: Vec<_> = factory.tile_store().tokens().into_iter().map(|(d, _)| d).collect();
        assert!(domains.contains(&navbridge_core::types::TileDataDomain::Search));
        module.shutdown();
        assert!(!module.engines().is_initialized());
    }

    #[test]
    fn route_collection_refuses_single_point() {
        let route = NavigationRoute {
            geometry: Some(encoded(&[[1.0, 1.0]])),
            distance_m: 0.0,
            duration_s: 0.0,
        };
        assert!(matches!(route_collection(&route), Err(NavBridgeError::Polyline(_))));
    }
}
