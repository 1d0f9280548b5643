//! Per-view state container.
//!
//! A [`TreeStore`] owns the loaded tree, its [`NodeRegistry`], the selection,
//! expansion and search state, and a cache of derived data. State sets are
//! held behind [`Arc`] and replaced wholesale on change, so a snapshot handed
//! to a listener or a renderer never changes underneath it.

mod events;
mod registry;
mod state;

pub use events::{Listener, ListenerId, StoreEvent};
pub use registry::{SharedStore, StoreId, StoreRegistry};
pub use state::StoreSnapshot;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use events::Listeners;
use state::Derived;

use crate::config::{InitOptions, TreeConfig};
use crate::error::TreeError;
use crate::expansion;
use crate::flatten::{flatten_tree, innermost_children_ids};
use crate::node::{FlatNode, NodeId, TreeNode};
use crate::registry::NodeRegistry;
use crate::search::{SearchFields, SearchQuery, filter_tree};
use crate::selection::{self, CheckState, CheckboxValue, Propagation};

/// State of one tree view.
///
/// # Example
///
/// ```
/// use arbor::TreeNode;
/// use arbor::config::{InitOptions, TreeConfig};
/// use arbor::store::TreeStore;
///
/// let mut store = TreeStore::new(TreeConfig::default());
/// store
///     .initialize(
///         vec![TreeNode::branch("1", "Fruits", [TreeNode::leaf("1.1", "Apple")])],
///         InitOptions::new().with_preselected(["1.1"]),
///     )
///     .unwrap();
///
/// assert!(store.checks().is_checked(&"1"));
/// assert_eq!(store.flattened().len(), 1);
/// ```
pub struct TreeStore<K: NodeId> {
    config: TreeConfig,
    fields: SearchFields<K>,
    propagation: Propagation,

    roots: Arc<[Arc<TreeNode<K>>]>,
    registry: Arc<NodeRegistry<K>>,
    checks: Arc<CheckState<K>>,
    expanded: Arc<HashSet<K>>,
    search: Arc<SearchQuery>,

    derived: Derived<K>,
    listeners: Listeners<K>,
    dirty: bool,
}

impl<K: NodeId> std::fmt::Debug for TreeStore<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore")
            .field("roots", &self.roots.len())
            .field("nodes", &self.registry.len())
            .field("checked", &self.checks.checked().len())
            .field("expanded", &self.expanded.len())
            .field("search", &self.search)
            .field("listeners", &self.listeners.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl<K: NodeId> Default for TreeStore<K> {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl<K: NodeId> TreeStore<K> {
    /// Create an empty store.
    pub fn new(config: TreeConfig) -> Self {
        let search = SearchQuery {
            text: String::new(),
            keys: config.search_keys.clone(),
        };
        Self {
            propagation: config.selection_propagation.resolve(),
            fields: SearchFields::default(),
            config,
            roots: Arc::from(Vec::new()),
            registry: Arc::new(NodeRegistry::default()),
            checks: Arc::new(CheckState::new()),
            expanded: Arc::new(HashSet::new()),
            search: Arc::new(search),
            derived: Derived::default(),
            listeners: Listeners::default(),
            dirty: false,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The loaded root nodes.
    pub fn roots(&self) -> Arc<[Arc<TreeNode<K>>]> {
        Arc::clone(&self.roots)
    }

    pub fn registry(&self) -> Arc<NodeRegistry<K>> {
        Arc::clone(&self.registry)
    }

    pub fn checks(&self) -> Arc<CheckState<K>> {
        Arc::clone(&self.checks)
    }

    pub fn expanded(&self) -> Arc<HashSet<K>> {
        Arc::clone(&self.expanded)
    }

    pub fn search(&self) -> Arc<SearchQuery> {
        Arc::clone(&self.search)
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    pub fn search_fields(&self) -> &SearchFields<K> {
        &self.fields
    }

    /// Checkbox value of one node.
    pub fn checkbox_value(&self, id: &K) -> CheckboxValue {
        self.checks.value(id)
    }

    /// Copy of the child → parent map.
    pub fn child_to_parent_map(&self) -> HashMap<K, K> {
        self.registry.child_to_parent().clone()
    }

    /// Copy of the mutable state.
    pub fn snapshot(&self) -> StoreSnapshot<K> {
        StoreSnapshot {
            checked: self.checks.checked().clone(),
            indeterminate: self.checks.indeterminate().clone(),
            expanded: (*self.expanded).clone(),
            search: (*self.search).clone(),
            node_count: self.registry.len(),
        }
    }

    /// Check if any state changed since the last [`clear_dirty`](Self::clear_dirty).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Load a tree, resetting selection and expansion.
    ///
    /// Preselected ids are checked with propagation, pre-expanded ids are
    /// opened along with their ancestors. The search query is kept. With
    /// `strict_ids`, a tree with repeated ids is rejected and the store is
    /// left as it was.
    pub fn initialize(
        &mut self,
        tree: impl IntoIterator<Item = TreeNode<K>>,
        options: InitOptions<K>,
    ) -> Result<(), TreeError> {
        let roots: Arc<[Arc<TreeNode<K>>]> = tree.into_iter().map(Arc::new).collect();
        let registry = if self.config.strict_ids {
            NodeRegistry::build_strict(&roots)?
        } else {
            NodeRegistry::build(&roots)
        };

        self.propagation = options
            .selection_propagation
            .unwrap_or(self.config.selection_propagation)
            .resolve();

        let mut checks = CheckState::new();
        selection::toggle_checkboxes(
            &registry,
            &mut checks,
            self.propagation,
            &options.preselected_ids,
            Some(true),
        );
        let mut expanded = HashSet::new();
        expansion::expand_nodes(&registry, &mut expanded, &options.pre_expanded_ids, false);

        log::debug!(
            "Initialized tree store: {} nodes, {} checked, {} expanded",
            registry.len(),
            checks.checked().len(),
            expanded.len()
        );

        let nodes = registry.len();
        self.roots = roots;
        self.registry = Arc::new(registry);
        self.checks = Arc::new(checks);
        self.expanded = Arc::new(expanded);
        self.derived.invalidate();
        self.dirty = true;

        self.listeners.emit(&StoreEvent::Initialized { nodes });
        self.listeners.emit(&StoreEvent::Checked(Arc::clone(&self.checks)));
        self.listeners.emit(&StoreEvent::Expanded(Arc::clone(&self.expanded)));
        Ok(())
    }

    /// Reset every set and map to empty. Listeners stay subscribed.
    pub fn teardown(&mut self) {
        log::debug!("Tearing down tree store ({} nodes)", self.registry.len());
        self.roots = Arc::from(Vec::new());
        self.registry = Arc::new(NodeRegistry::default());
        self.checks = Arc::new(CheckState::new());
        self.expanded = Arc::new(HashSet::new());
        self.search = Arc::new(SearchQuery {
            text: String::new(),
            keys: self.config.search_keys.clone(),
        });
        self.propagation = self.config.selection_propagation.resolve();
        self.derived.invalidate();
        self.dirty = true;
        self.listeners.emit(&StoreEvent::Reset);
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Toggle nodes, or force them to a value.
    pub fn toggle(&mut self, ids: &[K], force: Option<bool>) {
        let propagation = self.propagation;
        self.update_checks(|registry, checks| {
            selection::toggle_checkboxes(registry, checks, propagation, ids, force);
        });
    }

    pub fn select_nodes(&mut self, ids: &[K]) {
        self.toggle(ids, Some(true));
    }

    pub fn unselect_nodes(&mut self, ids: &[K]) {
        self.toggle(ids, Some(false));
    }

    pub fn select_all(&mut self) {
        self.update_checks(selection::select_all);
    }

    pub fn unselect_all(&mut self) {
        self.update_checks(|_, checks| selection::unselect_all(checks));
    }

    /// Check every leaf visible under the current search.
    ///
    /// Without an active search this is [`select_all`](Self::select_all).
    pub fn select_all_filtered(&mut self) {
        if self.search.is_active() {
            let ids = self.innermost_ids();
            self.toggle(&ids, Some(true));
        } else {
            self.select_all();
        }
    }

    /// Uncheck every leaf visible under the current search.
    pub fn unselect_all_filtered(&mut self) {
        if self.search.is_active() {
            let ids = self.innermost_ids();
            self.toggle(&ids, Some(false));
        } else {
            self.unselect_all();
        }
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    pub fn toggle_expand(&mut self, id: &K) {
        self.update_expanded(|registry, expanded| expansion::toggle_expand(registry, expanded, id));
    }

    pub fn expand_all(&mut self) {
        self.update_expanded(expansion::expand_all);
    }

    pub fn collapse_all(&mut self) {
        self.update_expanded(|_, expanded| expansion::collapse_all(expanded));
    }

    pub fn expand_nodes(&mut self, ids: &[K], ancestors_only: bool) {
        self.update_expanded(|registry, expanded| {
            expansion::expand_nodes(registry, expanded, ids, ancestors_only)
        });
    }

    pub fn collapse_nodes(&mut self, ids: &[K]) {
        self.update_expanded(|registry, expanded| expansion::collapse_nodes(registry, expanded, ids));
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Set the search text and the fields it runs against.
    ///
    /// `None` for `keys` means the configured default keys
    /// ([`TreeConfig::search_keys`]). Keys are validated first; on error
    /// nothing changes. When the text
    /// changes and `expand_on_search` is set, a non-empty search expands
    /// every node and an empty one collapses every node.
    pub fn set_search(&mut self, text: &str, keys: Option<&[&str]>) -> Result<(), TreeError> {
        let keys = match keys {
            Some(keys) => {
                self.fields.validate(keys)?;
                keys.iter().map(|key| key.to_string()).collect()
            }
            None => self.config.search_keys.clone(),
        };

        let text_changed = self.search.text != text;
        if !text_changed && self.search.keys == keys {
            return Ok(());
        }

        log::debug!("Search set to '{text}' over {keys:?}");
        self.search = Arc::new(SearchQuery {
            text: text.to_string(),
            keys,
        });
        self.derived.invalidate();
        self.dirty = true;
        self.listeners.emit(&StoreEvent::Search(Arc::clone(&self.search)));

        if text_changed && self.config.expand_on_search {
            if self.search.is_active() {
                self.expand_all();
            } else {
                self.collapse_all();
            }
        }
        Ok(())
    }

    /// Replace the searchable field table.
    ///
    /// Fails if a key of the current search is not in `fields`.
    pub fn set_search_fields(&mut self, fields: SearchFields<K>) -> Result<(), TreeError> {
        fields.validate(&self.search.keys)?;
        self.fields = fields;
        self.derived.invalidate();
        self.dirty = true;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Derived data
    // -------------------------------------------------------------------------

    /// The tree with the current search applied.
    pub fn filtered(&mut self) -> Arc<[Arc<TreeNode<K>>]> {
        if let Some(filtered) = &self.derived.filtered {
            return Arc::clone(filtered);
        }
        let filtered: Arc<[Arc<TreeNode<K>>]> = if self.search.is_active() {
            filter_tree(&self.roots, &self.search.term(), &self.search.keys, &self.fields).into()
        } else {
            Arc::clone(&self.roots)
        };
        self.derived.filtered = Some(Arc::clone(&filtered));
        filtered
    }

    /// Render rows for the filtered tree and the current expansion.
    pub fn flattened(&mut self) -> Arc<[FlatNode<K>]> {
        if let Some(flattened) = &self.derived.flattened {
            return Arc::clone(flattened);
        }
        let filtered = self.filtered();
        let flattened: Arc<[FlatNode<K>]> = flatten_tree(&filtered, &self.expanded).into();
        log::trace!("Flattened tree into {} rows", flattened.len());
        self.derived.flattened = Some(Arc::clone(&flattened));
        flattened
    }

    /// Leaf ids of the filtered tree.
    pub fn innermost_ids(&mut self) -> Arc<[K]> {
        if let Some(innermost) = &self.derived.innermost {
            return Arc::clone(innermost);
        }
        let filtered = self.filtered();
        let innermost: Arc<[K]> = innermost_children_ids(&filtered).into();
        self.derived.innermost = Some(Arc::clone(&innermost));
        innermost
    }

    /// Force the next [`flattened`](Self::flattened) call to build a new list.
    pub fn invalidate_flattened(&mut self) {
        self.derived.invalidate_flattened();
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Register a change callback.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StoreEvent<K>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(Box::new(listener))
    }

    /// Remove a change callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // -------------------------------------------------------------------------
    // Copy-on-write updates
    // -------------------------------------------------------------------------

    fn update_checks(&mut self, update: impl FnOnce(&NodeRegistry<K>, &mut CheckState<K>)) {
        let mut next = (*self.checks).clone();
        update(&self.registry, &mut next);
        if next == *self.checks {
            return;
        }
        self.checks = Arc::new(next);
        self.dirty = true;
        self.listeners.emit(&StoreEvent::Checked(Arc::clone(&self.checks)));
    }

    fn update_expanded(&mut self, update: impl FnOnce(&NodeRegistry<K>, &mut HashSet<K>)) {
        let mut next = (*self.expanded).clone();
        update(&self.registry, &mut next);
        if next == *self.expanded {
            return;
        }
        self.expanded = Arc::new(next);
        self.derived.invalidate_flattened();
        self.dirty = true;
        self.listeners.emit(&StoreEvent::Expanded(Arc::clone(&self.expanded)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn tree() -> Vec<TreeNode<&'static str>> {
        vec![
            TreeNode::branch(
                "1",
                "Fruits",
                [
                    TreeNode::branch(
                        "1.1",
                        "Apples",
                        [TreeNode::leaf("1.1.1", "Gala"), TreeNode::leaf("1.1.2", "Fuji")],
                    ),
                    TreeNode::leaf("1.2", "Pear"),
                ],
            ),
            TreeNode::branch("2", "Vegetables", [TreeNode::leaf("2.1", "Leek")]),
        ]
    }

    fn store() -> TreeStore<&'static str> {
        let mut store = TreeStore::default();
        store.initialize(tree(), InitOptions::default()).unwrap();
        store
    }

    fn set(ids: &[&'static str]) -> HashSet<&'static str> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_initialize_applies_options() {
        let mut store = TreeStore::default();
        store
            .initialize(
                tree(),
                InitOptions::new()
                    .with_preselected(["1.1.1", "1.1.2"])
                    .with_pre_expanded(["1.1"]),
            )
            .unwrap();

        assert_eq!(store.checks().checked(), &set(&["1.1", "1.1.1", "1.1.2"]));
        assert_eq!(store.checks().indeterminate(), &set(&["1"]));
        assert_eq!(*store.expanded(), set(&["1", "1.1"]));
        assert_eq!(store.child_to_parent_map().get("1.2"), Some(&"1"));
    }

    #[test]
    fn test_initialize_resets_but_keeps_search() {
        let mut store = store();
        store.select_all();
        store.set_search("gala", None).unwrap();

        store.initialize(tree(), InitOptions::default()).unwrap();

        assert!(store.checks().checked().is_empty());
        assert!(store.expanded().is_empty());
        assert_eq!(store.search().text, "gala");
    }

    #[test]
    fn test_strict_ids_rejects_and_keeps_state() {
        let mut store = TreeStore::new(TreeConfig::default().with_strict_ids(true));
        store.initialize(tree(), InitOptions::default()).unwrap();

        let result = store.initialize(
            vec![TreeNode::leaf("x", "a"), TreeNode::leaf("x", "b")],
            InitOptions::default(),
        );

        assert!(matches!(result, Err(TreeError::DuplicateId(_))));
        assert_eq!(store.registry().len(), 7);
    }

    #[test]
    fn test_propagation_override() {
        let mut store = TreeStore::default();
        store
            .initialize(
                tree(),
                InitOptions::new()
                    .with_selection_propagation(crate::selection::SelectionPropagation::none()),
            )
            .unwrap();

        store.toggle(&["1"], None);

        assert_eq!(store.checks().checked(), &set(&["1"]));
        assert!(store.checks().indeterminate().is_empty());
    }

    #[test]
    fn test_snapshots_are_replaced_not_mutated() {
        let mut store = store();
        let before = store.checks();

        store.select_nodes(&["2.1"]);

        assert!(before.checked().is_empty());
        assert_eq!(store.checks().checked(), &set(&["2", "2.1"]));
        assert!(!Arc::ptr_eq(&before, &store.checks()));
    }

    #[test]
    fn test_noop_keeps_snapshot() {
        let mut store = store();
        let before = store.checks();
        store.clear_dirty();

        store.unselect_nodes(&["2.1"]);
        store.toggle(&["missing"], None);

        assert!(Arc::ptr_eq(&before, &store.checks()));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_select_all_filtered_without_search() {
        let mut store = store();
        store.select_all_filtered();
        assert_eq!(store.checks().checked().len(), 7);

        store.unselect_all_filtered();
        assert!(store.checks().checked().is_empty());
    }

    #[test]
    fn test_select_all_filtered_with_search() {
        let mut store = store();
        store.set_search("apple", None).unwrap();

        store.select_all_filtered();

        assert_eq!(store.checks().checked(), &set(&["1.1", "1.1.1", "1.1.2"]));
        assert_eq!(store.checks().indeterminate(), &set(&["1"]));
    }

    #[test]
    fn test_search_expands_and_collapses() {
        let mut store = store();

        store.set_search("leek", None).unwrap();
        assert_eq!(store.expanded().len(), 7);
        let rows: Vec<_> = store.flattened().iter().map(|row| *row.id()).collect();
        assert_eq!(rows, vec!["2", "2.1"]);

        store.set_search("", None).unwrap();
        assert!(store.expanded().is_empty());
        assert_eq!(store.flattened().len(), 2);
    }

    #[test]
    fn test_search_without_auto_expand() {
        let mut store = TreeStore::new(TreeConfig::default().with_expand_on_search(false));
        store.initialize(tree(), InitOptions::default()).unwrap();

        store.set_search("leek", None).unwrap();

        assert!(store.expanded().is_empty());
        assert_eq!(store.flattened().len(), 1);
    }

    #[test]
    fn test_set_search_unknown_key_leaves_state() {
        let mut store = store();

        let result = store.set_search("x", Some(&["color"]));

        assert!(matches!(result, Err(TreeError::UnknownSearchKey(key)) if key == "color"));
        assert_eq!(*store.search(), SearchQuery::default());
    }

    #[test]
    fn test_custom_search_fields() {
        let mut store = store();
        let fields = SearchFields::default().with("shout", |node: &TreeNode<&'static str>| {
            Some(node.name.to_uppercase())
        });
        store.set_search_fields(fields).unwrap();

        store.set_search("FUJI", Some(&["shout"])).unwrap();

        assert_eq!(&*store.innermost_ids(), &["1.1.2"]);
    }

    #[test]
    fn test_search_without_keys_uses_default_keys() {
        let mut store = TreeStore::default();
        store
            .initialize(
                vec![TreeNode::leaf("1", "Apple"), TreeNode::leaf("2", "Pear")],
                InitOptions::default(),
            )
            .unwrap();

        store.set_search("1", Some(&["id"])).unwrap();
        let rows: Vec<_> = store.flattened().iter().map(|row| *row.id()).collect();
        assert_eq!(rows, vec!["1"]);

        store.set_search("pear", None).unwrap();
        assert_eq!(store.search().keys, vec!["name".to_string()]);
        let rows: Vec<_> = store.flattened().iter().map(|row| *row.id()).collect();
        assert_eq!(rows, vec!["2"]);
    }

    #[test]
    fn test_debug_prints_counts_for_deep_trees() {
        let mut node = TreeNode::leaf(0u32, "leaf");
        for id in 1..100_000u32 {
            node = TreeNode::branch(id, "n", [node]);
        }
        let mut store = TreeStore::default();
        store.initialize([node], InitOptions::default()).unwrap();
        store.expand_all();

        let debug = format!("{store:?}");
        assert!(debug.contains("nodes: 100000"), "{debug}");
        assert!(debug.contains("expanded: 100000"), "{debug}");
    }

    #[test]
    fn test_flattened_is_cached_until_expansion_changes() {
        let mut store = store();
        let first = store.flattened();
        assert!(Arc::ptr_eq(&first, &store.flattened()));

        store.toggle_expand(&"1");
        let second = store.flattened();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 4);

        store.invalidate_flattened();
        assert!(!Arc::ptr_eq(&second, &store.flattened()));
    }

    #[test]
    fn test_listeners_see_changes() {
        let mut store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |event| {
            let tag = match event {
                StoreEvent::Checked(checks) => format!("checked:{}", checks.checked().len()),
                StoreEvent::Expanded(expanded) => format!("expanded:{}", expanded.len()),
                StoreEvent::Search(query) => format!("search:{}", query.text),
                StoreEvent::Initialized { nodes } => format!("init:{nodes}"),
                StoreEvent::Reset => "reset".to_string(),
            };
            sink.lock().unwrap().push(tag);
        });

        store.select_nodes(&["2.1"]);
        store.select_nodes(&["2.1"]);
        store.expand_nodes(&["2.1"], true);
        store.teardown();
        assert!(store.unsubscribe(id));
        store.select_all();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["checked:2", "expanded:1", "reset"]
        );
    }

    #[test]
    fn test_teardown_clears_everything() {
        let mut store = store();
        store.select_all();
        store.expand_all();
        store.set_search("gala", None).unwrap();

        store.teardown();

        assert!(store.roots().is_empty());
        assert!(store.registry().is_empty());
        assert!(store.checks().checked().is_empty());
        assert!(store.expanded().is_empty());
        assert!(store.flattened().is_empty());
        assert_eq!(store.search().text, "");
    }

    #[test]
    fn test_snapshot() {
        let mut store = store();
        store.select_nodes(&["1.2"]);

        let snapshot = store.snapshot();

        assert_eq!(snapshot.checked, set(&["1.2"]));
        assert_eq!(snapshot.indeterminate, set(&["1"]));
        assert_eq!(snapshot.node_count, 7);
    }
}
