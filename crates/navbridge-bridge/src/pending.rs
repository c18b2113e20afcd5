// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-shot completion for bridge calls.
//
// `pending_call()` splits a call into a `Promise` (kept by the bridge and
// cloned into provider callbacks) and a `PendingCall` (returned to the
// caller). The first settle wins; later attempts get `AlreadySettled`. When
// every `Promise` clone is dropped without settling, the waiter fails with
// `CallAbandoned` instead of hanging. In the other direction, a waiter that
// times out or is dropped before settlement runs its abandon hook so the
// bridge can release the provider work behind it.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::debug;

use navbridge_core::error::{NavBridgeError, Result};
use navbridge_core::types::{BridgePayload, CallId, CallSnapshot, CallState};

type Outcome = Result<BridgePayload>;
type AbandonHook = Box<dyn FnOnce(CallId) + Send + Sync>;

/// State shared by both halves. Holds no sender, so the waiting half never
/// keeps a call artificially alive.
#[derive(Debug)]
struct Record {
    state: CallState,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

struct Inner {
    id: CallId,
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
    record: Arc<Mutex<Record>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Create a fresh call in the `Idle` state.
pub fn pending_call() -> (Promise, PendingCall) {
    let (tx, rx) = oneshot::channel();
    let id = CallId::new();
    let record = Arc::new(Mutex::new(Record {
        state: CallState::Idle,
        created_at: Utc::now(),
        settled_at: None,
    }));

    let promise = Promise {
        inner: Arc::new(Inner {
            id,
            sender: Mutex::new(Some(tx)),
            record: Arc::clone(&record),
        }),
    };
    let call = PendingCall {
        id,
        record: Arc::clone(&record),
        receiver: rx,
        guard: AbandonGuard {
            id,
            record,
            hook: None,
        },
    };
    (promise, call)
}

/// A call that is already rejected, for hosts without a bridge.
pub fn rejected_call(err: NavBridgeError) -> PendingCall {
    let (promise, call) = pending_call();
    // Fresh promise: the first settle cannot fail.
    let _ = promise.reject(err);
    call
}

/// Completing half of a bridge call.
#[derive(Clone)]
pub struct Promise {
    inner: Arc<Inner>,
}

impl Promise {
    pub fn id(&self) -> CallId {
        self.inner.id
    }

    pub fn state(&self) -> CallState {
        lock(&self.inner.record).state
    }

    pub fn is_settled(&self) -> bool {
        self.state().is_settled()
    }

    /// `Idle -> Dispatched`. No effect once dispatched or settled.
    pub fn mark_dispatched(&self) {
        let mut record = lock(&self.inner.record);
        if record.state == CallState::Idle {
            record.state = CallState::Dispatched;
        }
    }

    pub fn resolve(&self, payload: BridgePayload) -> Result<()> {
        self.settle(Ok(payload))
    }

    pub fn reject(&self, err: NavBridgeError) -> Result<()> {
        self.settle(Err(err))
    }

    /// Settle the call. Only the first settle is delivered.
    pub fn settle(&self, outcome: Outcome) -> Result<()> {
        let sender = {
            let mut record = lock(&self.inner.record);
            if record.state.is_settled() {
                return Err(NavBridgeError::AlreadySettled(self.inner.id.to_string()));
            }
            record.state = if outcome.is_ok() {
                CallState::Resolved
            } else {
                CallState::Rejected
            };
            record.settled_at = Some(Utc::now());
            lock(&self.inner.sender).take()
        };

        if let Some(tx) = sender {
            if tx.send(outcome).is_err() {
                debug!(call = %self.inner.id, "caller stopped waiting before settlement");
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> CallSnapshot {
        snapshot(self.inner.id, &self.inner.record)
    }

    /// Reference that does not keep the call alive.
    pub fn downgrade(&self) -> WeakPromise {
        WeakPromise {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning reference to a [`Promise`].
#[derive(Clone)]
pub struct WeakPromise {
    id: CallId,
    inner: Weak<Inner>,
}

impl WeakPromise {
    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Promise> {
        self.inner.upgrade().map(|inner| Promise { inner })
    }
}

/// Runs the abandon hook if the waiting half goes away while the call is
/// still open.
struct AbandonGuard {
    id: CallId,
    record: Arc<Mutex<Record>>,
    hook: Option<AbandonHook>,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        let Some(hook) = self.hook.take() else {
            return;
        };
        let settled = lock(&self.record).state.is_settled();
        if !settled {
            debug!(call = %self.id, "waiter gone before settlement");
            hook(self.id);
        }
    }
}

/// Waiting half of a bridge call.
pub struct PendingCall {
    id: CallId,
    record: Arc<Mutex<Record>>,
    receiver: oneshot::Receiver<Outcome>,
    guard: AbandonGuard,
}

impl PendingCall {
    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn state(&self) -> CallState {
        lock(&self.record).state
    }

    pub fn snapshot(&self) -> CallSnapshot {
        snapshot(self.id, &self.record)
    }

    /// Run `hook` with the call id if this half is dropped, or its wait
    /// times out, before the call settles.
    pub fn on_abandon(mut self, hook: impl FnOnce(CallId) + Send + Sync + 'static) -> Self {
        self.guard.hook = Some(Box::new(hook));
        self
    }

    /// Wait for the call to settle.
    pub async fn wait(self) -> Result<BridgePayload> {
        let PendingCall {
            id, receiver, guard, ..
        } = self;
        let received = receiver.await;
        drop(guard);
        match received {
            Ok(outcome) => outcome,
            Err(_) => Err(NavBridgeError::CallAbandoned(id.to_string())),
        }
    }

    /// Wait with an optional upper bound; `None` waits indefinitely.
    pub async fn wait_timeout(self, limit: Option<Duration>) -> Result<BridgePayload> {
        match limit {
            None => self.wait().await,
            Some(limit) => match tokio::time::timeout(limit, self.wait()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(NavBridgeError::Timeout(limit)),
            },
        }
    }
}

fn snapshot(id: CallId, record: &Mutex<Record>) -> CallSnapshot {
    let record = lock(record);
    CallSnapshot {
        id,
        state: record.state,
        created_at: record.created_at,
        settled_at: record.settled_at,
    }
}
