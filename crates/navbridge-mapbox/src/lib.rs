// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// navbridge: Mapbox HTTP providers.
//
// Implements the bridge's routing and online geocoding traits on top of the
// Directions v5 and Geocoding v5 web APIs. Offline tile regions and offline
// search need the native SDK and are reported as unavailable.

pub mod directions;
pub mod factory;
pub mod geocoding;
pub mod http;

pub use directions::DirectionsClient;
pub use factory::MapboxEngineFactory;
pub use geocoding::GeocodingClient;
