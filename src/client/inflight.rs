//! Registry of in-flight cacheable requests
//!
//! Each entry holds a shared handle to the one network operation serving a
//! [`CacheKey`], plus a waiter count. Callers hold a [`WaiterGuard`] while they
//! wait; when the last guard is dropped before settlement the operation's
//! cancellation token fires.

use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use super::ApiError;
use crate::cache::CacheKey;

/// Shared handle to a pending operation; every clone observes the same result
pub(crate) type SharedResponse = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

struct InflightEntry {
    id: u64,
    response: SharedResponse,
    waiters: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

/// What a caller got back from [`InflightRequests::join_or_register`]
pub(crate) enum Slot {
    /// An operation for the key is already pending
    Joined(SharedResponse, WaiterGuard),
    /// The caller registered a new operation and must start it
    Registered(Registration),
}

/// A freshly registered operation, already started by `make`
pub(crate) struct Registration {
    pub guard: WaiterGuard,
    pub response: SharedResponse,
}

/// Counts one waiting caller; cancels the operation when the last one leaves
pub(crate) struct WaiterGuard {
    waiters: Arc<AtomicUsize>,
    cancel: CancellationToken,
}

impl WaiterGuard {
    fn new(waiters: Arc<AtomicUsize>, cancel: CancellationToken) -> Self {
        waiters.fetch_add(1, Ordering::AcqRel);
        Self { waiters, cancel }
    }

    /// Adds a waiter only while at least one is still counted.
    ///
    /// A count of zero means the last waiter has left (or is leaving) and the
    /// operation is cancelled or about to be.
    fn join(waiters: &Arc<AtomicUsize>, cancel: &CancellationToken) -> Option<Self> {
        waiters
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n > 0).then_some(n + 1)
            })
            .ok()?;
        Some(Self {
            waiters: Arc::clone(waiters),
            cancel: cancel.clone(),
        })
    }
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        if self.waiters.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.cancel.cancel();
        }
    }
}

#[derive(Default)]
pub(crate) struct InflightRequests {
    entries: Mutex<HashMap<CacheKey, InflightEntry>>,
    next_id: AtomicU64,
}

impl InflightRequests {
    /// Joins the pending operation for `key`, or registers a new one built by
    /// `make` from the operation's id and cancellation token.
    ///
    /// An entry whose every waiter has already left is treated as gone and
    /// replaced, even when its token has not fired yet.
    pub fn join_or_register<F>(&self, key: &CacheKey, make: F) -> Slot
    where
        F: FnOnce(u64, CancellationToken) -> SharedResponse,
    {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(entry) = entries.get(key) {
            if let Some(guard) = WaiterGuard::join(&entry.waiters, &entry.cancel) {
                return Slot::Joined(entry.response.clone(), guard);
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let waiters = Arc::new(AtomicUsize::new(0));
        let response = make(id, cancel.clone());
        let guard = WaiterGuard::new(waiters.clone(), cancel.clone());

        entries.insert(
            key.clone(),
            InflightEntry {
                id,
                response: response.clone(),
                waiters,
                cancel,
            },
        );

        Slot::Registered(Registration { guard, response })
    }

    /// Removes the entry for `key` if it still belongs to operation `id`
    pub fn remove(&self, key: &CacheKey, id: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if entries.get(key).map(|e| e.id) == Some(id) {
            entries.remove(key);
        }
    }

    #[cfg(test)]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}
