// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// navbridge: Application-facing navigation manager.

pub mod manager;
pub mod waypoint;

pub use manager::NavigationManager;
pub use waypoint::WaypointInput;
