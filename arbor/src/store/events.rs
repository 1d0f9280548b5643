//! Store change notifications.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::node::NodeId;
use crate::search::SearchQuery;
use crate::selection::CheckState;

/// A change published by a [`TreeStore`](super::TreeStore).
///
/// Every event carries the new snapshot, which is never mutated afterwards.
#[derive(Debug, Clone)]
pub enum StoreEvent<K: NodeId> {
    /// New data was loaded.
    Initialized { nodes: usize },
    /// The checked or indeterminate set changed.
    Checked(Arc<CheckState<K>>),
    /// The expanded set changed.
    Expanded(Arc<HashSet<K>>),
    /// The search text or keys changed.
    Search(Arc<SearchQuery>),
    /// The store was torn down.
    Reset,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// A store change callback.
///
/// Runs while the store is being mutated, so it must not call back into the
/// same store.
pub type Listener<K> = Box<dyn FnMut(&StoreEvent<K>) + Send + Sync>;

/// Registered listeners, notified in subscription order.
pub(crate) struct Listeners<K: NodeId> {
    entries: Vec<(ListenerId, Listener<K>)>,
    next_id: u64,
}

impl<K: NodeId> Default for Listeners<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<K: NodeId> fmt::Debug for Listeners<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl<K: NodeId> Listeners<K> {
    pub(crate) fn subscribe(&mut self, listener: Listener<K>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn emit(&mut self, event: &StoreEvent<K>) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
