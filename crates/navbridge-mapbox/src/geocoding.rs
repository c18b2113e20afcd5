// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geocoding v5 reverse lookup.
//
//   GET {base}/geocoding/v5/mapbox.places/{lon},{lat}.json?types=..&language=..

use reqwest::Client;
use serde::Deserialize;
use tokio::runtime::Handle;
use tracing::{debug, instrument};

use navbridge_bridge::traits::{Cancelable, OnlineGeocoder, ReverseGeocodeQuery, SearchCallback};
use navbridge_core::error::{NavBridgeError, Result};
use navbridge_core::types::{Coordinate, Place};

use crate::http::{HttpTask, http_error, redact};

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<ApiFeature>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFeature {
    #[serde(default)]
    text: String,
    #[serde(default)]
    place_name: String,
    center: [f64; 2],
    /// House number on address features.
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    properties: ApiProperties,
}

#[derive(Debug, Default, Deserialize)]
struct ApiProperties {
    #[serde(default)]
    address: Option<String>,
}

#[derive(Clone)]
struct Endpoint {
    http: Client,
    base_url: String,
    access_token: String,
}

impl Endpoint {
    #[instrument(skip(self, query), fields(point = %query.point, language = %query.language))]
    async fn fetch(self, query: ReverseGeocodeQuery) -> Result<Vec<Place>> {
        let response = self
            .http
            .get(geocode_url(&self.base_url, &query))
            .query(&geocode_query(&query, &self.access_token))
            .send()
            .await
            .map_err(http_error)?;
        let status = response.status();
        debug!(url = %redact(response.url()), %status, "geocoding response");
        let body = response.text().await.map_err(http_error)?;
        places_from_body(status.as_u16(), &body)
    }
}

/// Online geocoder backed by the Geocoding HTTP API.
pub struct GeocodingClient {
    endpoint: Endpoint,
    runtime: Handle,
}

impl GeocodingClient {
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
        }
    }
}

impl OnlineGeocoder for GeocodingClient {
    fn reverse_geocode(
        &self,
        query: ReverseGeocodeQuery,
        callback: SearchCallback,
    ) -> Result<Box<dyn Cancelable>> {
        let endpoint = self.endpoint.clone();
        let handle = self.runtime.spawn(async move {
            callback(endpoint.fetch(query).await);
        });
        Ok(Box::new(HttpTask(handle.abort_handle())))
    }
}

pub fn geocode_url(base_url: &str, query: &ReverseGeocodeQuery) -> String {
    format!(
        "{}/geocoding/v5/mapbox.places/{}.json",
        base_url.trim_end_matches('/'),
        query.point
    )
}

pub fn geocode_query(query: &ReverseGeocodeQuery, access_token: &str) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(3);
    if !query.types.is_empty() {
        params.push(("types", query.types.join(",")));
    }
    if !query.language.is_empty() {
        params.push(("language", query.language.clone()));
    }
    params.push(("access_token", access_token.to_owned()));
    params
}

/// Places in the order the API ranked them. Zero features is not an error.
pub fn places_from_body(status: u16, body: &str) -> Result<Vec<Place>> {
    let parsed: GeocodingResponse = serde_json::from_str(body).map_err(|e| {
        NavBridgeError::Geocoding(format!("HTTP {status}: unreadable geocoding response ({e})"))
    })?;
    if !(200..300).contains(&status) {
        let message = parsed.message.unwrap_or_else(|| "request refused".into());
        return Err(NavBridgeError::Geocoding(format!("HTTP {status}: {message}")));
    }

    parsed
        .features
        .into_iter()
        .map(|f| {
            Ok(Place {
                coordinate: Coordinate::from_pair(f.center)?,
                address: f.properties.address.or(f.address),
                place_name: f.place_name,
                text: f.text,
            })
        })
        .collect()
}
