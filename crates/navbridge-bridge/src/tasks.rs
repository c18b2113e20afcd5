// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Registry of provider work still attached to unsettled calls.
//
// Route requests, tile loads, index listeners and search requests are
// tracked per call. They are cancelled as soon as that call settles or its
// waiter gives up, or all at once on shutdown.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use navbridge_core::error::NavBridgeError;
use navbridge_core::types::CallId;

use crate::pending::{Promise, WeakPromise};
use crate::traits::Cancelable;

struct Tracked {
    promise: WeakPromise,
    tasks: Vec<Box<dyn Cancelable>>,
}

#[derive(Default)]
pub struct TaskRegistry {
    calls: Mutex<HashMap<CallId, Tracked>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `task` to the call. If the call already settled the task is
    /// cancelled right away.
    pub fn track(&self, promise: &Promise, task: Box<dyn Cancelable>) {
        {
            let mut calls = self.lock();
            if !promise.is_settled() {
                calls
                    .entry(promise.id())
                    .or_insert_with(|| Tracked {
                        promise: promise.downgrade(),
                        tasks: Vec::new(),
                    })
                    .tasks
                    .push(task);
                return;
            }
        }
        task.cancel();
    }

    /// Cancel and forget everything attached to `id`.
    pub fn release(&self, id: CallId) {
        let tracked = self.lock().remove(&id);
        if let Some(tracked) = tracked {
            debug!(call = %id, tasks = tracked.tasks.len(), "releasing provider tasks");
            for task in tracked.tasks {
                task.cancel();
            }
        }
    }

    /// The waiter for `id` stopped listening. Cancel its work and close the
    /// call so tasks tracked later are cancelled on arrival.
    pub fn abandon(&self, id: CallId) {
        let tracked = self.lock().remove(&id);
        let Some(tracked) = tracked else {
            return;
        };
        let promise = tracked.promise.upgrade();
        debug!(call = %id, tasks = tracked.tasks.len(), "abandoning provider tasks");
        for task in tracked.tasks {
            task.cancel();
        }
        if let Some(promise) = promise {
            let _ = promise.reject(NavBridgeError::CallAbandoned(id.to_string()));
        }
    }

    /// Cancel all tracked work and reject the calls it belonged to.
    /// Returns how many calls were still unsettled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(CallId, Tracked)> = self.lock().drain().collect();
        let mut rejected = 0;
        for (id, tracked) in drained {
            // Upgrade before cancelling: cancelled tasks may drop the last
            // strong reference held by provider callbacks.
            let promise = tracked.promise.upgrade();
            for task in tracked.tasks {
                task.cancel();
            }
            if let Some(promise) = promise {
                if promise.reject(NavBridgeError::Canceled).is_ok() {
                    debug!(call = %id, "call canceled");
                    rejected += 1;
                }
            }
        }
        rejected
    }

    /// Number of calls with attached work.
    pub fn active_calls(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CallId, Tracked>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
