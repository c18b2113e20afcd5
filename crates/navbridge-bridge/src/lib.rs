// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// navbridge: Native navigation bridge.
//
// Defines the capability traits on both sides of the bridge, the single-shot
// call completion, lazy engine construction and the navigation module that
// ties a route or geocoding call to one provider request. On hosts without
// the native module, `platform_bridge` hands out a stub that rejects every
// call.

pub mod credentials;
pub mod engines;
pub mod module;
pub mod pending;
pub mod stub;
pub mod tasks;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use std::sync::Arc;

use navbridge_core::config::BridgeConfig;

pub use credentials::{EnvCredential, StaticCredential, credential_from_config};
pub use engines::EngineHandles;
pub use module::NavigationModule;
pub use pending::{PendingCall, Promise, pending_call, rejected_call};
pub use traits::{EngineFactory, NativeNavigation};

/// Bridge implementation for the host this binary targets.
///
/// Android gets the real [`NavigationModule`] driving `factory`; every other
/// host gets [`stub::StubNavigation`].
pub fn platform_bridge(
    config: BridgeConfig,
    factory: Arc<dyn EngineFactory>,
) -> Arc<dyn NativeNavigation> {
    #[cfg(target_os = "android")]
    {
        Arc::new(NavigationModule::with_factory(config, factory))
    }
    #[cfg(not(target_os = "android"))]
    {
        let _ = (config, factory);
        Arc::new(stub::StubNavigation)
    }
}
