//! The tree view facade.
//!
//! [`TreeView`] ties a [`TreeStore`] to a scroll coordinator and a host list.
//! Hosts call the command methods in response to user input and call
//! [`TreeView::render`] once per frame to get the rows to draw.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{InitOptions, TreeConfig};
use crate::error::TreeError;
use crate::node::{FlatNode, NodeId, TreeNode};
use crate::scroll::{InitialScroll, NoScroll, ScrollCoordinator, ScrollOutcome, ScrollTarget, ScrollToNodeParams};
use crate::search::SearchFields;
use crate::selection::CheckboxValue;
use crate::store::{ListenerId, SharedStore, StoreEvent, StoreId, StoreRegistry, StoreSnapshot, TreeStore};

/// A tree view bound to its store.
///
/// # Example
///
/// ```
/// use arbor::{InitOptions, TreeNode, TreeView};
///
/// let mut view = TreeView::detached();
/// view.initialize(
///     vec![TreeNode::branch("1", "Fruits", [TreeNode::leaf("1.1", "Apple")])],
///     InitOptions::default(),
/// )
/// .unwrap();
///
/// view.expand_all();
/// let rows = view.render();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].level, 1);
/// ```
pub struct TreeView<K: NodeId, S: ScrollTarget = NoScroll> {
    id: StoreId,
    store: SharedStore<K>,
    registry: Option<Arc<StoreRegistry<K>>>,
    coordinator: ScrollCoordinator<K>,
    initial_scroll: InitialScroll<K>,
    target: S,
    last_flattened: Option<Arc<[FlatNode<K>]>>,
}

impl<K: NodeId, S: ScrollTarget> std::fmt::Debug for TreeView<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeView")
            .field("id", &self.id)
            .field("scroll", &self.coordinator.phase())
            .field("initial_scroll", &self.initial_scroll.index())
            .finish_non_exhaustive()
    }
}

impl<K: NodeId> TreeView<K, NoScroll> {
    /// A view with its own store and no host list.
    pub fn detached() -> Self {
        Self::new(TreeConfig::default(), NoScroll)
    }
}

impl<K: NodeId, S: ScrollTarget> TreeView<K, S> {
    /// A view with its own store, not registered anywhere.
    pub fn new(config: TreeConfig, target: S) -> Self {
        Self::from_parts(
            StoreId::new(),
            Arc::new(RwLock::new(TreeStore::new(config))),
            None,
            target,
        )
    }

    /// A view backed by the registry's store for `id`, created if missing.
    ///
    /// [`teardown`](Self::teardown) also removes the store from the registry.
    pub fn attach(registry: &Arc<StoreRegistry<K>>, id: StoreId, target: S) -> Self {
        let store = registry.get_or_create(id);
        Self::from_parts(id, store, Some(Arc::clone(registry)), target)
    }

    fn from_parts(
        id: StoreId,
        store: SharedStore<K>,
        registry: Option<Arc<StoreRegistry<K>>>,
        target: S,
    ) -> Self {
        Self {
            id,
            store,
            registry,
            coordinator: ScrollCoordinator::new(),
            initial_scroll: InitialScroll::default(),
            target,
            last_flattened: None,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// The backing store.
    pub fn store(&self) -> SharedStore<K> {
        Arc::clone(&self.store)
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut S {
        &mut self.target
    }

    fn read(&self) -> RwLockReadGuard<'_, TreeStore<K>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeStore<K>> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Load a tree. Resets selection, expansion and any pending scroll.
    ///
    /// The initial scroll index is computed once per mount: after it has
    /// been found, later loads keep it and ignore their
    /// `initial_scroll_node_id`. [`TreeView::teardown`] clears it.
    pub fn initialize(
        &mut self,
        tree: impl IntoIterator<Item = TreeNode<K>>,
        options: InitOptions<K>,
    ) -> Result<(), TreeError> {
        let initial = options.initial_scroll_node_id.clone();
        self.write().initialize(tree, options)?;
        self.coordinator.reset();
        if !self.initial_scroll.is_resolved() {
            self.initial_scroll = InitialScroll::new(initial);
        }
        self.last_flattened = None;
        Ok(())
    }

    /// Clear all state and, for attached views, drop the store from its
    /// registry.
    pub fn teardown(&mut self) {
        self.write().teardown();
        self.coordinator.reset();
        self.initial_scroll = InitialScroll::default();
        self.last_flattened = None;
        if let Some(registry) = &self.registry {
            registry.remove(self.id);
        }
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn toggle(&self, ids: &[K], force: Option<bool>) {
        self.write().toggle(ids, force);
    }

    pub fn select_nodes(&self, ids: &[K]) {
        self.write().select_nodes(ids);
    }

    pub fn unselect_nodes(&self, ids: &[K]) {
        self.write().unselect_nodes(ids);
    }

    pub fn select_all(&self) {
        self.write().select_all();
    }

    pub fn unselect_all(&self) {
        self.write().unselect_all();
    }

    pub fn select_all_filtered(&self) {
        self.write().select_all_filtered();
    }

    pub fn unselect_all_filtered(&self) {
        self.write().unselect_all_filtered();
    }

    pub fn checked(&self) -> HashSet<K> {
        self.read().checks().checked().clone()
    }

    pub fn indeterminate(&self) -> HashSet<K> {
        self.read().checks().indeterminate().clone()
    }

    pub fn checkbox_value(&self, id: &K) -> CheckboxValue {
        self.read().checkbox_value(id)
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    pub fn toggle_expand(&self, id: &K) {
        self.write().toggle_expand(id);
    }

    pub fn expand_all(&self) {
        self.write().expand_all();
    }

    pub fn collapse_all(&self) {
        self.write().collapse_all();
    }

    pub fn expand_nodes(&self, ids: &[K], ancestors_only: bool) {
        self.write().expand_nodes(ids, ancestors_only);
    }

    pub fn collapse_nodes(&self, ids: &[K]) {
        self.write().collapse_nodes(ids);
    }

    pub fn expanded(&self) -> HashSet<K> {
        (*self.read().expanded()).clone()
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    pub fn set_search(&self, text: &str, keys: Option<&[&str]>) -> Result<(), TreeError> {
        self.write().set_search(text, keys)
    }

    pub fn set_search_fields(&self, fields: SearchFields<K>) -> Result<(), TreeError> {
        self.write().set_search_fields(fields)
    }

    // -------------------------------------------------------------------------
    // Scrolling
    // -------------------------------------------------------------------------

    /// Expand the path to a node and scroll to it on a following render.
    pub fn scroll_to_node_id(&mut self, params: ScrollToNodeParams<K>) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        self.coordinator.scroll_to_node(&mut store, params);
    }

    /// Row of the initial scroll node, once a render has found it.
    pub fn initial_scroll_index(&self) -> Option<usize> {
        self.initial_scroll.index()
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Produce the rows to draw and advance any pending scroll.
    pub fn render(&mut self) -> Arc<[FlatNode<K>]> {
        self.render_with_outcome().0
    }

    /// Like [`render`](Self::render), also reporting what the scroll
    /// coordinator did.
    pub fn render_with_outcome(&mut self) -> (Arc<[FlatNode<K>]>, ScrollOutcome) {
        let (flattened, expanded, registry) = {
            let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
            (store.flattened(), store.expanded(), store.registry())
        };

        let is_new = self
            .last_flattened
            .as_ref()
            .is_none_or(|last| !Arc::ptr_eq(last, &flattened));
        if is_new {
            self.coordinator.on_flattened(&flattened);
            self.initial_scroll.observe(&flattened);
            self.last_flattened = Some(Arc::clone(&flattened));
        }

        let outcome = self.coordinator.on_render(&expanded, &registry, &mut self.target);
        (flattened, outcome)
    }

    // -------------------------------------------------------------------------
    // Queries and callbacks
    // -------------------------------------------------------------------------

    pub fn child_to_parent_map(&self) -> HashMap<K, K> {
        self.read().child_to_parent_map()
    }

    pub fn snapshot(&self) -> StoreSnapshot<K> {
        self.read().snapshot()
    }

    /// Call `callback(checked, indeterminate)` whenever the selection changes.
    pub fn on_check(
        &self,
        mut callback: impl FnMut(&HashSet<K>, &HashSet<K>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.write().subscribe(move |event| {
            if let StoreEvent::Checked(checks) = event {
                callback(checks.checked(), checks.indeterminate());
            }
        })
    }

    /// Call `callback(expanded)` whenever the expanded set changes.
    pub fn on_expand(
        &self,
        mut callback: impl FnMut(&HashSet<K>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.write().subscribe(move |event| {
            if let StoreEvent::Expanded(expanded) = event {
                callback(expanded);
            }
        })
    }

    /// Subscribe to every store event.
    pub fn subscribe(
        &self,
        listener: impl FnMut(&StoreEvent<K>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.write().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.write().unsubscribe(id)
    }
}
