// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Access credential providers.

use std::sync::Arc;

use navbridge_core::config::{ACCESS_TOKEN_ENV, BridgeConfig};
use navbridge_core::error::{NavBridgeError, Result};

use crate::traits::CredentialProvider;

/// A token fixed at construction (config file, host app).
pub struct StaticCredential {
    token: String,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for StaticCredential {
    fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable at first engine use.
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(ACCESS_TOKEN_ENV)
    }
}

impl CredentialProvider for EnvCredential {
    fn access_token(&self) -> Result<String> {
        std::env::var(&self.var)
            .map_err(|e| NavBridgeError::Credential(format!("{}: {e}", self.var)))
    }
}

/// Configured token if present, otherwise `MAPBOX_ACCESS_TOKEN`.
pub fn credential_from_config(config: &BridgeConfig) -> Arc<dyn CredentialProvider> {
    match &config.access_token {
        Some(token) => Arc::new(StaticCredential::new(token.clone())),
        None => Arc::new(EnvCredential::default()),
    }
}
