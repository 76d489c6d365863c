//! Process-lifetime storage of extracted bundles, keyed by file id.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;
use wrapped_core::AnalyticsBundle;

/// Storage seam for assembled bundles.
///
/// Bundles are immutable once stored; readers share them through `Arc`.
pub trait BundleStore: Send + Sync {
    /// Stores `bundle` under `file_id`, replacing any previous entry.
    fn put(&self, file_id: Uuid, bundle: AnalyticsBundle);

    fn get(&self, file_id: Uuid) -> Option<Arc<AnalyticsBundle>>;

    /// Removes the bundle, returning whether one was stored.
    fn remove(&self, file_id: Uuid) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct Entries {
    bundles: HashMap<Uuid, Arc<AnalyticsBundle>>,
    order: VecDeque<Uuid>,
}

/// In-memory store that evicts the oldest bundle once `capacity` is reached.
///
/// A capacity of 0 means unbounded.
#[derive(Debug, Default)]
pub struct InMemoryBundleStore {
    capacity: usize,
    entries: RwLock<Entries>,
}

impl InMemoryBundleStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::default(),
        }
    }
}

impl BundleStore for InMemoryBundleStore {
    fn put(&self, file_id: Uuid, bundle: AnalyticsBundle) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if entries.bundles.insert(file_id, Arc::new(bundle)).is_some() {
            entries.order.retain(|id| *id != file_id);
        }
        entries.order.push_back(file_id);

        while self.capacity > 0 && entries.order.len() > self.capacity {
            let Some(evicted) = entries.order.pop_front() else {
                break;
            };
            entries.bundles.remove(&evicted);
            tracing::info!(file_id = %evicted, capacity = self.capacity, "evicted oldest bundle");
        }
    }

    fn get(&self, file_id: Uuid) -> Option<Arc<AnalyticsBundle>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .bundles
            .get(&file_id)
            .cloned()
    }

    fn remove(&self, file_id: Uuid) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let removed = entries.bundles.remove(&file_id).is_some();
        if removed {
            entries.order.retain(|id| *id != file_id);
        }
        removed
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .bundles
            .len()
    }
}
