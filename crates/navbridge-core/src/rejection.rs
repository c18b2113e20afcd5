// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rejection shape handed to the application layer.
//
// A failed bridge call surfaces as `reject(code, message)`. Codes are stable
// identifiers the JS side can switch on; messages are the error's display
// text.

use serde::{Deserialize, Serialize};

use crate::error::NavBridgeError;

pub const CODE_NO_ROUTES: &str = "NO_ROUTES";
pub const CODE_DISPATCH: &str = "DISPATCH_FAILED";
pub const CODE_ROUTER: &str = "ROUTER_FAILED";
pub const CODE_GEOCODING: &str = "GEOCODING_FAILED";
pub const CODE_OFFLINE: &str = "OFFLINE_FAILED";
pub const CODE_CANCELED: &str = "CANCELED";
pub const CODE_LIFECYCLE: &str = "CALL_LIFECYCLE";
pub const CODE_UNSUPPORTED: &str = "UNSUPPORTED_PLATFORM";

/// Where in the call lifecycle the failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionKind {
    /// Routing engine answered with zero candidates.
    NoRouteFound,
    /// Building or submitting the request failed.
    DispatchFault,
    /// The provider reported failure in its callback.
    ResponseFault,
    /// The call itself misbehaved (double settle, abandoned, timed out).
    Lifecycle,
    PlatformUnsupported,
}

/// Code/message pair of a rejected bridge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub code: String,
    pub message: String,
    pub kind: RejectionKind,
}

impl Rejection {
    fn new(code: &str, kind: RejectionKind, err: &NavBridgeError) -> Self {
        Self {
            code: code.to_owned(),
            message: err.to_string(),
            kind,
        }
    }
}

impl From<&NavBridgeError> for Rejection {
    fn from(err: &NavBridgeError) -> Self {
        use RejectionKind::*;

        match err {
            NavBridgeError::NoRoutesFound => Rejection::new(CODE_NO_ROUTES, NoRouteFound, err),

            NavBridgeError::InvalidWaypoints(_)
            | NavBridgeError::InvalidCoordinate(_)
            | NavBridgeError::Credential(_)
            | NavBridgeError::EngineUnavailable(_)
            | NavBridgeError::Dispatch(_)
            | NavBridgeError::Config(_)
            | NavBridgeError::Io(_)
            | NavBridgeError::Serialization(_) => Rejection::new(CODE_DISPATCH, DispatchFault, err),

            NavBridgeError::RouterFailure(_)
            | NavBridgeError::MissingGeometry { .. }
            | NavBridgeError::Polyline(_) => Rejection::new(CODE_ROUTER, ResponseFault, err),

            NavBridgeError::Geocoding(_) | NavBridgeError::Http(_) => {
                Rejection::new(CODE_GEOCODING, ResponseFault, err)
            }

            NavBridgeError::OfflineRegion { .. } | NavBridgeError::OfflineIndex(_) => {
                Rejection::new(CODE_OFFLINE, ResponseFault, err)
            }

            NavBridgeError::Canceled => Rejection::new(CODE_CANCELED, Lifecycle, err),

            NavBridgeError::AlreadySettled(_)
            | NavBridgeError::CallAbandoned(_)
            | NavBridgeError::Timeout(_) => Rejection::new(CODE_LIFECYCLE, Lifecycle, err),

            NavBridgeError::PlatformUnavailable => {
                Rejection::new(CODE_UNSUPPORTED, PlatformUnsupported, err)
            }
        }
    }
}
