//! Realtime document store abstraction.
//!
//! Defines the [`DocumentStore`] trait the task board reads and writes
//! through. The store is a tree of JSON values addressed by
//! [`StorePath`]. Concrete implementations include:
//! - [`memory::MemoryStore`]: in-process tree with subscriber fan-out

pub mod memory;

use std::fmt;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use timetable_proto::{PathError, RecordId, Snapshot, StorePath};

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The caller may not read or write this path.
    #[error("permission denied at {0}")]
    PermissionDenied(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The path could not be built.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// The subscription was closed by the store.
    #[error("subscription closed")]
    Closed,
}

/// Identifier of one live subscription, unique per store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What a subscription delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The watched node changed (or this is the initial value).
    Snapshot(Snapshot),
    /// The subscription failed; no further snapshots will follow.
    Error(StoreError),
}

/// Handle to a live subscription.
///
/// Events arrive in the order the store emitted them. Dropping the handle
/// or calling [`close`](Self::close) unregisters it from the store.
pub struct Subscription {
    id: SubscriptionId,
    path: StorePath,
    events: mpsc::UnboundedReceiver<StoreEvent>,
    closer: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Assemble a handle. `closer` runs exactly once, on close or drop.
    pub fn new(
        id: SubscriptionId,
        path: StorePath,
        events: mpsc::UnboundedReceiver<StoreEvent>,
        closer: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            path,
            events,
            closer: Some(Box::new(closer)),
        }
    }

    /// Id assigned by the store.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Path being watched.
    #[must_use]
    pub const fn path(&self) -> &StorePath {
        &self.path
    }

    /// Wait for the next event. `None` once the store side has gone away.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        self.events.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_next(&mut self) -> Option<StoreEvent> {
        self.events.try_recv().ok()
    }

    /// Unregister from the store.
    pub fn close(mut self) {
        self.run_closer();
    }

    fn run_closer(&mut self) {
        if let Some(closer) = self.closer.take() {
            closer();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_closer();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Async hierarchical key-value store with live subscriptions.
///
/// # Invariant
///
/// Every successful write is eventually followed by a snapshot on every
/// subscription whose path overlaps the written path. Writes never wait
/// for that snapshot to be delivered.
pub trait DocumentStore: Send + Sync {
    /// Store `value` under a fresh, store-generated key below `parent`.
    fn create(
        &self,
        parent: &StorePath,
        value: Value,
    ) -> impl std::future::Future<Output = Result<RecordId, StoreError>> + Send;

    /// Replace the value at `path`.
    fn set(
        &self,
        path: &StorePath,
        value: Value,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Merge `fields` into the object at `path`, leaving other fields alone.
    fn update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove the value at `path`. Removing nothing succeeds.
    fn delete(
        &self,
        path: &StorePath,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Read the current value at `path` once.
    fn read_once(
        &self,
        path: &StorePath,
    ) -> impl std::future::Future<Output = Result<Snapshot, StoreError>> + Send;

    /// Watch `path`. The current value is delivered as the first event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the subscription cannot be registered.
    fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError>;
}
