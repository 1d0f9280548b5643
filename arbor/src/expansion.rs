//! Expanded-node bookkeeping.

use std::collections::HashSet;

use crate::node::NodeId;
use crate::registry::NodeRegistry;

/// Expand a collapsed node, or collapse an expanded one together with its
/// whole subtree.
pub fn toggle_expand<K: NodeId>(registry: &NodeRegistry<K>, expanded: &mut HashSet<K>, id: &K) {
    if expanded.remove(id) {
        for descendant in registry.descendants(id) {
            expanded.remove(descendant);
        }
    } else if registry.contains(id) {
        expanded.insert(id.clone());
    } else {
        log::trace!("Ignoring expand toggle of unknown node {id}");
    }
}

/// Expand every node.
pub fn expand_all<K: NodeId>(registry: &NodeRegistry<K>, expanded: &mut HashSet<K>) {
    *expanded = registry.ids().cloned().collect();
}

/// Collapse every node.
pub fn collapse_all<K: NodeId>(expanded: &mut HashSet<K>) {
    expanded.clear();
}

/// Expand the given nodes and all of their ancestors.
///
/// With `ancestors_only`, the nodes themselves are left alone and only the
/// path down to them is opened. Each ancestor chain is walked until it meets
/// a node already opened by this call.
pub fn expand_nodes<K: NodeId>(
    registry: &NodeRegistry<K>,
    expanded: &mut HashSet<K>,
    ids: &[K],
    ancestors_only: bool,
) {
    let mut visited: HashSet<&K> = HashSet::new();
    for id in ids {
        if !registry.contains(id) {
            log::trace!("Ignoring expand of unknown node {id}");
            continue;
        }
        if !ancestors_only {
            if !visited.insert(id) {
                continue;
            }
            expanded.insert(id.clone());
        }
        for ancestor in registry.ancestors(id) {
            if !visited.insert(ancestor) {
                break;
            }
            expanded.insert(ancestor.clone());
        }
    }
}

/// Collapse the given nodes and everything below them. Ancestors stay open.
pub fn collapse_nodes<K: NodeId>(registry: &NodeRegistry<K>, expanded: &mut HashSet<K>, ids: &[K]) {
    for id in ids {
        expanded.remove(id);
        for descendant in registry.descendants(id) {
            expanded.remove(descendant);
        }
    }
}
