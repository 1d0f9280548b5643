//! Store lookup by id.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TreeStore;
use crate::config::TreeConfig;
use crate::node::NodeId;

/// Opaque identifier of one tree view's store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(Uuid);

impl StoreId {
    /// Create a new unique store ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for StoreId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A store shared between its view and anyone else holding the id.
pub type SharedStore<K> = Arc<RwLock<TreeStore<K>>>;

/// Concurrent map of live stores.
///
/// Stores are created lazily on first lookup and live until removed.
///
/// # Example
///
/// ```
/// use arbor::store::{StoreId, StoreRegistry};
///
/// let registry = StoreRegistry::<String>::new();
/// let id = StoreId::new();
/// let store = registry.get_or_create(id);
/// assert!(std::sync::Arc::ptr_eq(&store, &registry.get_or_create(id)));
/// ```
#[derive(Debug)]
pub struct StoreRegistry<K: NodeId> {
    stores: DashMap<StoreId, SharedStore<K>>,
    config: TreeConfig,
}

impl<K: NodeId> Default for StoreRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeId> StoreRegistry<K> {
    /// Creates an empty registry whose stores use the default config.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Creates an empty registry whose stores use `config`.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            stores: DashMap::new(),
            config,
        }
    }

    /// The config new stores are created with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Get the store for `id`, creating an empty one if there is none.
    pub fn get_or_create(&self, id: StoreId) -> SharedStore<K> {
        let entry = self.stores.entry(id).or_insert_with(|| {
            log::debug!("Creating tree store {id}");
            Arc::new(RwLock::new(TreeStore::new(self.config.clone())))
        });
        Arc::clone(entry.value())
    }

    /// Register a fresh store under a new id.
    pub fn create(&self) -> (StoreId, SharedStore<K>) {
        let id = StoreId::new();
        (id, self.get_or_create(id))
    }

    /// Get an existing store.
    pub fn get(&self, id: StoreId) -> Option<SharedStore<K>> {
        self.stores.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a store. Handles already given out stay usable.
    pub fn remove(&self, id: StoreId) -> Option<SharedStore<K>> {
        let removed = self.stores.remove(&id).map(|(_, store)| store);
        if removed.is_some() {
            log::debug!("Removed tree store {id}");
        }
        removed
    }

    pub fn contains(&self, id: StoreId) -> bool {
        self.stores.contains_key(&id)
    }

    /// Returns the number of live stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Returns `true` if no store is registered.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
