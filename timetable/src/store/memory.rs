//! In-process document store for tests and the offline demo.
//!
//! Holds one JSON tree behind a [`parking_lot::Mutex`] and fans every
//! write out to the subscriptions whose paths overlap it. Object keys keep
//! insertion order, so children come back in the order they were created.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use timetable_proto::{RecordId, Snapshot, StorePath};

use super::{DocumentStore, StoreError, StoreEvent, Subscription, SubscriptionId};

struct Subscriber {
    id: SubscriptionId,
    path: StorePath,
    tx: mpsc::UnboundedSender<StoreEvent>,
}

#[derive(Default)]
struct Faults {
    offline: bool,
    failing_writes: u32,
    failing_reads: u32,
}

#[derive(Default)]
struct Inner {
    root: Map<String, Value>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
    faults: Faults,
    writes: u64,
}

impl Inner {
    fn check_write(&mut self) -> Result<(), StoreError> {
        if self.faults.offline {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        if self.faults.failing_writes > 0 {
            self.faults.failing_writes -= 1;
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        self.writes += 1;
        Ok(())
    }

    fn check_read(&mut self) -> Result<(), StoreError> {
        if self.faults.offline {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        if self.faults.failing_reads > 0 {
            self.faults.failing_reads -= 1;
            return Err(StoreError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }

    fn get(&self, path: &StorePath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        rest.iter()
            .try_fold(self.root.get(first)?, |node, seg| node.as_object()?.get(seg))
    }

    fn snapshot(&self, path: &StorePath) -> Snapshot {
        Snapshot::new(path.clone(), self.get(path).cloned())
    }

    /// Write `value` at `path`; `None` removes the node. Empty parent
    /// objects left behind by a removal are pruned. Returns whether the
    /// tree changed.
    fn put(&mut self, path: &StorePath, value: Option<Value>) -> bool {
        let value = value.filter(|v| !v.is_null());
        let changed = put_in(&mut self.root, path.segments(), value);
        if changed {
            self.notify(path);
        }
        changed
    }

    fn notify(&mut self, written: &StorePath) {
        let snapshots: Vec<(usize, Snapshot)> = self
            .subscribers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.path.overlaps(written))
            .map(|(i, s)| (i, self.snapshot(&s.path)))
            .collect();
        let mut dead = Vec::new();
        for (i, snap) in snapshots {
            if self.subscribers[i].tx.send(StoreEvent::Snapshot(snap)).is_err() {
                dead.push(self.subscribers[i].id);
            }
        }
        self.subscribers.retain(|s| !dead.contains(&s.id));
    }
}

/// Recursive helper for [`Inner::put`].
fn put_in(map: &mut Map<String, Value>, segments: &[String], value: Option<Value>) -> bool {
    let Some((key, rest)) = segments.split_first() else {
        return false;
    };
    if rest.is_empty() {
        return match value {
            Some(v) => map.insert(key.clone(), v.clone()).as_ref() != Some(&v),
            None => map.shift_remove(key).is_some(),
        };
    }
    if value.is_none() && !map.get(key).is_some_and(Value::is_object) {
        return false;
    }
    let child = map
        .entry(key.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    let Value::Object(child_map) = child else {
        return false;
    };
    let changed = put_in(child_map, rest, value);
    if child_map.is_empty() {
        map.shift_remove(key);
    }
    changed
}

/// Shared, cloneable handle to an in-memory tree.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `Unavailable` while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().faults.offline = offline;
    }

    /// Make the next `n` writes fail.
    pub fn fail_next_writes(&self, n: u32) {
        self.inner.lock().faults.failing_writes = n;
    }

    /// Make the next `n` one-shot reads fail.
    pub fn fail_next_reads(&self, n: u32) {
        self.inner.lock().faults.failing_reads = n;
    }

    /// Cancel every subscription overlapping `path` with `error`, as a
    /// hosted store does when security rules start rejecting a listener.
    pub fn revoke(&self, path: &StorePath, error: &StoreError) {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|s| {
            if s.path.overlaps(path) {
                let _ = s.tx.send(StoreEvent::Error(error.clone()));
                false
            } else {
                true
            }
        });
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Number of live subscriptions watching exactly `path`.
    #[must_use]
    pub fn subscribers_at(&self, path: &StorePath) -> usize {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|s| &s.path == path)
            .count()
    }

    /// Number of writes that reached the tree.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.inner.lock().writes
    }

    /// Current value at `path`, bypassing fault injection.
    #[must_use]
    pub fn peek(&self, path: &StorePath) -> Option<Value> {
        self.inner.lock().get(path).cloned()
    }

    fn unsubscribe(inner: &Weak<Mutex<Inner>>, id: SubscriptionId) {
        if let Some(inner) = inner.upgrade() {
            inner.lock().subscribers.retain(|s| s.id != id);
            tracing::debug!(subscription = %id, "subscription closed");
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn create(&self, parent: &StorePath, value: Value) -> Result<RecordId, StoreError> {
        let key = Uuid::now_v7().simple().to_string();
        let path = parent.child(&key)?;
        let mut inner = self.inner.lock();
        inner.check_write()?;
        inner.put(&path, Some(value));
        drop(inner);
        Ok(RecordId::new(key))
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.check_write()?;
        inner.put(path, Some(value));
        Ok(())
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError> {
        for key in fields.keys() {
            path.child(key)?;
        }
        let mut inner = self.inner.lock();
        inner.check_write()?;
        // Merged into one write so subscribers see a single snapshot.
        let mut merged = inner
            .get(path)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (key, value) in fields {
            if value.is_null() {
                merged.shift_remove(&key);
            } else {
                merged.insert(key, value);
            }
        }
        let merged = (!merged.is_empty()).then_some(Value::Object(merged));
        inner.put(path, merged);
        Ok(())
    }

    async fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.check_write()?;
        inner.put(path, None);
        Ok(())
    }

    async fn read_once(&self, path: &StorePath) -> Result<Snapshot, StoreError> {
        let mut inner = self.inner.lock();
        inner.check_read()?;
        Ok(inner.snapshot(path))
    }

    fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError> {
        let mut inner = self.inner.lock();
        if inner.faults.offline {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        inner.next_subscription += 1;
        let id = SubscriptionId::new(inner.next_subscription);
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(StoreEvent::Snapshot(inner.snapshot(path)));
        inner.subscribers.push(Subscriber {
            id,
            path: path.clone(),
            tx,
        });
        drop(inner);

        tracing::debug!(subscription = %id, path = %path, "subscription opened");
        let weak = Arc::downgrade(&self.inner);
        Ok(Subscription::new(id, path.clone(), rx, move || {
            Self::unsubscribe(&weak, id);
        }))
    }
}
