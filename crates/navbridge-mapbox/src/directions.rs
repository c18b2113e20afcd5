// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Directions v5 routing engine.
//
//   GET {base}/directions/v5/mapbox/{profile}/{lon,lat;lon,lat...}
//       ?alternatives=true&geometries=polyline6&overview=full&steps=true
//
// Response `code` "Ok" yields the ranked routes, "NoRoute" an empty list,
// anything else a routing failure. Each request runs on the captured runtime
// and answers through its callback exactly once unless it is aborted first.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::Deserialize;
use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

use navbridge_bridge::traits::{
    NavigationRoute, RequestId, RouteOptions, RouteRequest, RouterCallback, RouterFailure,
    RouterOrigin, RouterOutcome, RoutingEngine,
};
use navbridge_core::error::Result;

use crate::http::{HttpTask, http_error, redact};

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    /// Absent on authentication and rate-limit errors.
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    geometry: Option<String>,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Clone)]
struct Endpoint {
    http: Client,
    base_url: String,
    access_token: String,
}

impl Endpoint {
    #[instrument(skip(self, options), fields(profile = options.profile.as_str(), waypoints = options.coordinates.len()))]
    async fn fetch(self, options: RouteOptions) -> RouterOutcome {
        let url = route_url(&self.base_url, &options);
        let response = self
            .http
            .get(&url)
            .query(&route_query(&options, &self.access_token))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return transport_failure(http_error(e).to_string()),
        };
        let status = response.status();
        debug!(url = %redact(response.url()), %status, "directions response");
        match response.text().await {
            Ok(body) => outcome_from_body(status.as_u16(), &body),
            Err(e) => transport_failure(http_error(e).to_string()),
        }
    }
}

/// Routing engine backed by the Directions HTTP API.
pub struct DirectionsClient {
    endpoint: Endpoint,
    runtime: Handle,
    next_id: AtomicU64,
}

impl DirectionsClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        runtime: Handle,
    ) -> Self {
        Self {
            endpoint: Endpoint {
                http,
                base_url: base_url.into(),
                access_token: access_token.into(),
            },
            runtime,
            next_id: AtomicU64::new(1),
        }
    }
}

impl RoutingEngine for DirectionsClient {
    fn request_routes(
        &self,
        options: RouteOptions,
        callback: RouterCallback,
    ) -> Result<RouteRequest> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let endpoint = self.endpoint.clone();
        let handle = self.runtime.spawn(async move {
            callback(endpoint.fetch(options).await);
        });
        Ok(RouteRequest {
            id,
            task: Box::new(HttpTask(handle.abort_handle())),
        })
    }
}

pub fn route_url(base_url: &str, options: &RouteOptions) -> String {
    let coordinates: Vec<String> = options.coordinates.iter().map(ToString::to_string).collect();
    format!(
        "{}/directions/v5/mapbox/{}/{}",
        base_url.trim_end_matches('/'),
        options.profile.as_str(),
        coordinates.join(";")
    )
}

pub fn route_query(options: &RouteOptions, access_token: &str) -> Vec<(&'static str, String)> {
    let geometries = if options.geometry_precision == 5 {
        "polyline"
    } else {
        "polyline6"
    };
    vec![
        ("alternatives", options.alternatives.to_string()),
        ("geometries", geometries.to_owned()),
        (
            "overview",
            if options.full_overview { "full" } else { "simplified" }.to_owned(),
        ),
        ("steps", options.steps.to_string()),
        ("access_token", access_token.to_owned()),
    ]
}

fn transport_failure(message: String) -> RouterOutcome {
    warn!(%message, "directions request failed");
    RouterOutcome::Failure(vec![RouterFailure {
        message,
        code: None,
    }])
}

/// Map a Directions response body to the engine's single answer.
pub fn outcome_from_body(status: u16, body: &str) -> RouterOutcome {
    let parsed: DirectionsResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            return RouterOutcome::Failure(vec![RouterFailure {
                message: format!("HTTP {status}: unreadable directions response ({e})"),
                code: None,
            }]);
        }
    };

    match parsed.code.as_str() {
        "Ok" => RouterOutcome::Ready {
            routes: parsed
                .routes
                .into_iter()
                .map(|r| NavigationRoute {
                    geometry: r.geometry,
                    distance_m: r.distance,
                    duration_s: r.duration,
                })
                .collect(),
            origin: RouterOrigin::Online,
        },
        "NoRoute" => RouterOutcome::Ready {
            routes: Vec::new(),
            origin: RouterOrigin::Online,
        },
        "" => RouterOutcome::Failure(vec![RouterFailure {
            message: format!(
                "HTTP {status}: {}",
                parsed.message.as_deref().unwrap_or("request refused")
            ),
            code: None,
        }]),
        _ => RouterOutcome::Failure(vec![RouterFailure {
            message: parsed
                .message
                .unwrap_or_else(|| format!("HTTP {status}")),
            code: Some(parsed.code),
        }]),
    }
}
