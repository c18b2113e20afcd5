// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Navigation manager.
//
// The single entry point the application layer uses. On hosts without the
// native module every call logs a warning and returns `Ok(None)` without
// touching the bridge. Elsewhere a call normalizes its input, awaits exactly
// one bridge call and parses the returned GeoJSON. Bridge rejections are
// returned unchanged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use navbridge_bridge::NativeNavigation;
use navbridge_core::config::BridgeConfig;
use navbridge_core::error::Result;
use navbridge_core::geojson::FeatureCollection;
use navbridge_core::types::Platform;

use crate::waypoint::WaypointInput;

pub struct NavigationManager {
    platform: Platform,
    bridge: Arc<dyn NativeNavigation>,
    initialized: AtomicBool,
    call_timeout: Option<Duration>,
}

impl NavigationManager {
    /// Manager for the platform this binary was built for.
    pub fn new(bridge: Arc<dyn NativeNavigation>, config: &BridgeConfig) -> Self {
        Self::for_platform(Platform::current(), bridge, config.call_timeout())
    }

    pub fn for_platform(
        platform: Platform,
        bridge: Arc<dyn NativeNavigation>,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            platform,
            bridge,
            initialized: AtomicBool::new(false),
            call_timeout,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_supported(&self) -> bool {
        self.platform.hosts_navigation_bridge()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// One-time setup. Repeated calls are no-ops.
    pub fn initialize(&self) {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!(
                platform = self.platform.as_str(),
                bridge = self.bridge.platform_name(),
                "navigation manager initialized"
            );
        }
    }

    /// Route through `waypoints` in order.
    pub async fn calculate_route(
        &self,
        waypoints: &[WaypointInput],
    ) -> Result<Option<FeatureCollection>> {
        if !self.guard("calculate_route") {
            return Ok(None);
        }
        self.initialize();

        let pairs: Vec<[f64; 2]> = waypoints.iter().map(WaypointInput::to_pair).collect();
        debug!(waypoints = pairs.len(), "calculating route");
        let payload = self
            .bridge
            .calculate_route(pairs)
            .wait_timeout(self.call_timeout)
            .await?;
        payload.parse().map(Some)
    }

    /// Route from `origin` straight to `destination`.
    pub async fn calculate_route_between(
        &self,
        origin: WaypointInput,
        destination: WaypointInput,
    ) -> Result<Option<FeatureCollection>> {
        self.calculate_route(&[origin, destination]).await
    }

    /// Places around `point` (`[longitude, latitude]`), labelled in `language`.
    pub async fn geocoding(
        &self,
        point: [f64; 2],
        language: &str,
    ) -> Result<Option<FeatureCollection>> {
        if !self.guard("geocoding") {
            return Ok(None);
        }
        self.initialize();

        debug!(?point, language, "geocoding");
        let payload = self
            .bridge
            .geocoding(point, language)
            .wait_timeout(self.call_timeout)
            .await?;
        payload.parse().map(Some)
    }

    fn guard(&self, operation: &str) -> bool {
        if self.is_supported() {
            return true;
        }
        warn!(
            operation,
            platform = self.platform.as_str(),
            "navigation bridge is not available on this platform"
        );
        false
    }
}
