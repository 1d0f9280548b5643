//! Id lookups derived from the input tree.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TreeError;
use crate::node::{NodeId, Preorder, TreeNode};

/// Id → node and child → parent lookups for one tree.
///
/// Rebuilt from scratch whenever new data is loaded. Every key of the parent
/// map is also a key of the node map; root ids never have a parent entry.
#[derive(Debug, Clone)]
pub struct NodeRegistry<K: NodeId> {
    /// Every node, any depth.
    nodes: HashMap<K, Arc<TreeNode<K>>>,
    /// Parent id of every non-root node.
    parents: HashMap<K, K>,
    /// Depth of every node (0 = root level).
    depths: HashMap<K, usize>,
}

impl<K: NodeId> Default for NodeRegistry<K> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            parents: HashMap::new(),
            depths: HashMap::new(),
        }
    }
}

impl<K: NodeId> NodeRegistry<K> {
    /// Build the registry for a tree.
    ///
    /// Duplicate ids are not rejected: the node visited last in pre-order
    /// wins, along with its parent and depth.
    pub fn build(roots: &[Arc<TreeNode<K>>]) -> Self {
        let mut registry = Self::default();
        for visit in Preorder::new(roots) {
            registry.insert(visit.node, visit.parent, visit.level);
        }
        log::debug!(
            "Built node registry: {} nodes, {} parent links",
            registry.nodes.len(),
            registry.parents.len()
        );
        registry
    }

    /// Build the registry, failing on the first repeated id.
    pub fn build_strict(roots: &[Arc<TreeNode<K>>]) -> Result<Self, TreeError> {
        let mut registry = Self::default();
        for visit in Preorder::new(roots) {
            if registry.nodes.contains_key(&visit.node.id) {
                return Err(TreeError::DuplicateId(visit.node.id.to_string()));
            }
            registry.insert(visit.node, visit.parent, visit.level);
        }
        Ok(registry)
    }

    fn insert(&mut self, node: &Arc<TreeNode<K>>, parent: Option<&K>, level: usize) {
        let id = node.id.clone();
        match parent {
            Some(parent) => {
                self.parents.insert(id.clone(), parent.clone());
            }
            None => {
                self.parents.remove(&id);
            }
        }
        self.depths.insert(id.clone(), level);
        self.nodes.insert(id, Arc::clone(node));
    }

    /// Look up a node by id.
    pub fn get(&self, id: &K) -> Option<&Arc<TreeNode<K>>> {
        self.nodes.get(id)
    }

    /// Check if a node with this id exists.
    pub fn contains(&self, id: &K) -> bool {
        self.nodes.contains_key(id)
    }

    /// Parent id of a node, `None` for roots and unknown ids.
    pub fn parent(&self, id: &K) -> Option<&K> {
        self.parents.get(id)
    }

    /// Depth of a node (0 = root level).
    pub fn depth(&self, id: &K) -> Option<usize> {
        self.depths.get(id).copied()
    }

    /// All node ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &K> {
        self.nodes.keys()
    }

    /// The id → node map.
    pub fn nodes(&self) -> &HashMap<K, Arc<TreeNode<K>>> {
        &self.nodes
    }

    /// The child id → parent id map.
    pub fn child_to_parent(&self) -> &HashMap<K, K> {
        &self.parents
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk parent links upward from `id`, nearest ancestor first.
    ///
    /// Bounded by the node count, so a parent cycle created by duplicate ids
    /// cannot loop forever.
    pub fn ancestors<'a>(&'a self, id: &'a K) -> impl Iterator<Item = &'a K> + 'a {
        let mut current = self.parents.get(id);
        let mut remaining = self.nodes.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let ancestor = current?;
            current = self.parents.get(ancestor);
            Some(ancestor)
        })
    }

    /// Every descendant id of `id` in pre-order, excluding `id` itself.
    ///
    /// Empty for leaves and unknown ids.
    pub fn descendants<'a>(&'a self, id: &K) -> impl Iterator<Item = &'a K> + use<'a, K> {
        let children: &'a [Arc<TreeNode<K>>] = self
            .nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[]);
        Preorder::new(children).map(|visit| &visit.node.id)
    }
}
