//! Tri-state checkbox selection.
//!
//! A node is either checked, indeterminate, or neither. Toggling a node can
//! push its new state down to every descendant and recompute every ancestor
//! from its immediate children, depending on [`Propagation`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::registry::NodeRegistry;

// =============================================================================
// Propagation
// =============================================================================

/// Propagation settings as supplied by the host.
///
/// Missing fields default to `true`, so `{}` means "propagate both ways".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPropagation {
    /// Apply a toggle to every descendant.
    #[serde(default, alias = "toChildren")]
    pub to_children: Option<bool>,
    /// Recompute every ancestor after a toggle.
    #[serde(default, alias = "toParents")]
    pub to_parents: Option<bool>,
}

impl SelectionPropagation {
    /// Propagation in both directions.
    pub fn both() -> Self {
        Self::default()
    }

    /// No propagation: a toggle only affects the toggled node.
    pub fn none() -> Self {
        Self {
            to_children: Some(false),
            to_parents: Some(false),
        }
    }

    pub fn with_to_children(mut self, enabled: bool) -> Self {
        self.to_children = Some(enabled);
        self
    }

    pub fn with_to_parents(mut self, enabled: bool) -> Self {
        self.to_parents = Some(enabled);
        self
    }

    /// Fill in the defaults.
    pub fn resolve(self) -> Propagation {
        Propagation {
            to_children: self.to_children.unwrap_or(true),
            to_parents: self.to_parents.unwrap_or(true),
        }
    }
}

/// Resolved propagation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Propagation {
    pub to_children: bool,
    pub to_parents: bool,
}

impl Default for Propagation {
    fn default() -> Self {
        Self {
            to_children: true,
            to_parents: true,
        }
    }
}

// =============================================================================
// CheckState
// =============================================================================

/// What a single checkbox should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckboxValue {
    Checked,
    Unchecked,
    Indeterminate,
}

/// The checked and indeterminate id sets.
///
/// The two sets are always disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckState<K: NodeId> {
    checked: HashSet<K>,
    indeterminate: HashSet<K>,
}

impl<K: NodeId> Default for CheckState<K> {
    fn default() -> Self {
        Self {
            checked: HashSet::new(),
            indeterminate: HashSet::new(),
        }
    }
}

impl<K: NodeId> CheckState<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of checked nodes.
    pub fn checked(&self) -> &HashSet<K> {
        &self.checked
    }

    /// Ids of partially selected nodes.
    pub fn indeterminate(&self) -> &HashSet<K> {
        &self.indeterminate
    }

    pub fn is_checked(&self, id: &K) -> bool {
        self.checked.contains(id)
    }

    pub fn is_indeterminate(&self, id: &K) -> bool {
        self.indeterminate.contains(id)
    }

    /// Checkbox value for a node. Unknown ids are unchecked.
    pub fn value(&self, id: &K) -> CheckboxValue {
        if self.checked.contains(id) {
            CheckboxValue::Checked
        } else if self.indeterminate.contains(id) {
            CheckboxValue::Indeterminate
        } else {
            CheckboxValue::Unchecked
        }
    }

    /// Clear both sets.
    pub fn clear(&mut self) {
        self.checked.clear();
        self.indeterminate.clear();
    }

    fn set(&mut self, id: &K, checked: bool) {
        self.indeterminate.remove(id);
        if checked {
            self.checked.insert(id.clone());
        } else {
            self.checked.remove(id);
        }
    }

    fn set_value(&mut self, id: &K, value: CheckboxValue) {
        match value {
            CheckboxValue::Checked => {
                self.indeterminate.remove(id);
                self.checked.insert(id.clone());
            }
            CheckboxValue::Indeterminate => {
                self.checked.remove(id);
                self.indeterminate.insert(id.clone());
            }
            CheckboxValue::Unchecked => {
                self.checked.remove(id);
                self.indeterminate.remove(id);
            }
        }
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Toggle the given nodes.
///
/// With `force`, every node is set to that value; otherwise each node flips
/// relative to its state before this call. Repeated and unknown ids are
/// skipped.
pub fn toggle_checkboxes<K: NodeId>(
    registry: &NodeRegistry<K>,
    state: &mut CheckState<K>,
    propagation: Propagation,
    ids: &[K],
    force: Option<bool>,
) {
    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            continue;
        }
        if !registry.contains(id) {
            log::trace!("Ignoring toggle of unknown node {id}");
            continue;
        }
        let value = force.unwrap_or_else(|| !state.is_checked(id));
        targets.push((id, value));
    }

    for &(id, value) in &targets {
        state.set(id, value);
        if propagation.to_children {
            for descendant in registry.descendants(id) {
                state.set(descendant, value);
            }
        }
    }

    if propagation.to_parents {
        recompute_ancestors(registry, state, targets.iter().map(|(id, _)| *id));
    }

    log::trace!(
        "Toggled {} nodes: {} checked, {} indeterminate",
        targets.len(),
        state.checked.len(),
        state.indeterminate.len()
    );
}

/// Recompute every ancestor of `ids` from its immediate children, deepest
/// first, so each parent sees its children's final state.
fn recompute_ancestors<'a, K: NodeId>(
    registry: &NodeRegistry<K>,
    state: &mut CheckState<K>,
    ids: impl Iterator<Item = &'a K>,
) {
    let mut ancestors = HashSet::new();
    for id in ids {
        for ancestor in registry.ancestors(id) {
            // Already collected, and so is everything above it.
            if !ancestors.insert(ancestor) {
                break;
            }
        }
    }

    let mut by_depth: BTreeMap<usize, Vec<&K>> = BTreeMap::new();
    for ancestor in ancestors {
        let depth = registry.depth(ancestor).unwrap_or_default();
        by_depth.entry(depth).or_default().push(ancestor);
    }

    for ancestor in by_depth.into_values().rev().flatten() {
        let Some(node) = registry.get(ancestor) else {
            continue;
        };
        let children = &node.children;
        let value = if !children.is_empty() && children.iter().all(|c| state.is_checked(&c.id)) {
            CheckboxValue::Checked
        } else if children
            .iter()
            .any(|c| state.is_checked(&c.id) || state.is_indeterminate(&c.id))
        {
            CheckboxValue::Indeterminate
        } else {
            CheckboxValue::Unchecked
        };
        state.set_value(ancestor, value);
    }
}

/// Check every node.
pub fn select_all<K: NodeId>(registry: &NodeRegistry<K>, state: &mut CheckState<K>) {
    state.checked = registry.ids().cloned().collect();
    state.indeterminate.clear();
}

/// Uncheck every node.
pub fn unselect_all<K: NodeId>(state: &mut CheckState<K>) {
    state.clear();
}
