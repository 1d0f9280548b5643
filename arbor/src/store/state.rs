//! Snapshot and derived-data types held by a store.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::node::{FlatNode, NodeId, TreeNode};
use crate::search::SearchQuery;

/// Data computed from the tree, the search and the expanded set.
///
/// Each entry is `None` until requested and dropped when one of its inputs
/// changes. The filtered tree and innermost ids depend on the tree and the
/// search; the flattened list also depends on the expanded set.
#[derive(Debug)]
pub(crate) struct Derived<K> {
    pub(crate) filtered: Option<Arc<[Arc<TreeNode<K>>]>>,
    pub(crate) flattened: Option<Arc<[FlatNode<K>]>>,
    pub(crate) innermost: Option<Arc<[K]>>,
}

impl<K> Default for Derived<K> {
    fn default() -> Self {
        Self {
            filtered: None,
            flattened: None,
            innermost: None,
        }
    }
}

impl<K> Derived<K> {
    /// Drop everything.
    pub(crate) fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// Drop only what depends on the expanded set.
    pub(crate) fn invalidate_flattened(&mut self) {
        self.flattened = None;
    }
}

/// Point-in-time copy of a store's mutable state, for host diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSnapshot<K: NodeId> {
    pub checked: HashSet<K>,
    pub indeterminate: HashSet<K>,
    pub expanded: HashSet<K>,
    pub search: SearchQuery,
    pub node_count: usize,
}

impl<K: NodeId + Serialize> StoreSnapshot<K> {
    /// Render the snapshot as JSON.
    pub fn to_json(&self) -> Result<String, crate::error::TreeError> {
        Ok(serde_json::to_string(self)?)
    }
}
