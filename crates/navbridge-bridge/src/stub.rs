// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for hosts that do not ship the navigation module.
//
// Every call comes back already rejected with `PlatformUnavailable`.

use navbridge_core::error::NavBridgeError;

use crate::pending::{PendingCall, rejected_call};
use crate::traits::NativeNavigation;

/// Bridge returned on non-Android hosts.
pub struct StubNavigation;

impl NativeNavigation for StubNavigation {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn calculate_route(&self, _waypoints: Vec<[f64; 2]>) -> PendingCall {
        tracing::warn!("NativeNavigation::calculate_route called on stub bridge");
        rejected_call(NavBridgeError::PlatformUnavailable)
    }

    fn geocoding(&self, _point: [f64; 2], _language: &str) -> PendingCall {
        tracing::warn!("NativeNavigation::geocoding called on stub bridge");
        rejected_call(NavBridgeError::PlatformUnavailable)
    }
}
