// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Url};
use tokio::task::AbortHandle;

use navbridge_bridge::traits::Cancelable;
use navbridge_core::error::{NavBridgeError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_client() -> Result<Client> {
    ClientBuilder::new()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("navbridge/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| NavBridgeError::EngineUnavailable(format!("HTTP client: {e}")))
}

pub fn http_error(err: reqwest::Error) -> NavBridgeError {
    if err.is_connect() || err.is_timeout() {
        NavBridgeError::Http(format!("network: {err}"))
    } else {
        NavBridgeError::Http(err.to_string())
    }
}

/// Strip the token from a URL before it is logged.
pub fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == "access_token") {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "access_token" {
                "REDACTED".to_owned()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut clean = url.clone();
    clean.query_pairs_mut().clear().extend_pairs(pairs);
    clean.to_string()
}

/// In-flight request spawned on the runtime. Cancel aborts it; the callback
/// is then dropped without running.
pub struct HttpTask(pub AbortHandle);

impl Cancelable for HttpTask {
    fn cancel(&self) {
        self.0.abort();
    }
}

/// Work that already finished; cancelling it has no effect.
pub struct Finished;

impl Cancelable for Finished {
    fn cancel(&self) {}
}
