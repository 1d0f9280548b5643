//! Tree node types.
//!
//! A tree is a slice of root [`TreeNode`]s. Children are shared through
//! [`Arc`] so the registry, the search filter and the flattened list can all
//! point at the caller's nodes without copying them.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::TreeError;

/// Identifier type usable as a node id.
///
/// Blanket-implemented for every comparable, hashable, printable type, so
/// `String`, `&'static str`, integers and `Uuid` all work out of the box.
pub trait NodeId: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> NodeId for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// A node in the input tree.
///
/// Any JSON field other than `id`, `name` and `children` is kept in
/// [`TreeNode::extra`] and can be made searchable through
/// [`SearchFields::with_extra`](crate::search::SearchFields::with_extra).
///
/// # Example
///
/// ```
/// use arbor::TreeNode;
///
/// let tree = vec![TreeNode::branch(
///     "1",
///     "Fruits",
///     [TreeNode::leaf("1.1", "Apple"), TreeNode::leaf("1.2", "Pear")],
/// )];
/// assert_eq!(tree[0].children.len(), 2);
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de>"))]
pub struct TreeNode<K> {
    /// Unique, stable identifier.
    pub id: K,
    /// Display name.
    pub name: String,
    /// Child nodes. Empty for leaves.
    #[serde(
        default,
        deserialize_with = "nullable_children",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Arc<TreeNode<K>>>,
    /// Remaining caller-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<K> TreeNode<K> {
    /// Create a leaf node (no children).
    pub fn leaf(id: K, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Create a branch node with children.
    pub fn branch(
        id: K,
        name: impl Into<String>,
        children: impl IntoIterator<Item = TreeNode<K>>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            children: children.into_iter().map(Arc::new).collect(),
            extra: Map::new(),
        }
    }

    /// Attach an extra field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Get an extra field by key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Check if this node has children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl<K: Clone> TreeNode<K> {
    /// A copy of this node with its children replaced.
    ///
    /// Used by the search filter to build pruned views; the original node is
    /// left untouched.
    pub(crate) fn with_children(&self, children: Vec<Arc<TreeNode<K>>>) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            children,
            extra: self.extra.clone(),
        }
    }
}

impl<K: DeserializeOwned> TreeNode<K> {
    /// Parse a JSON array of root nodes.
    pub fn from_json(json: &str) -> Result<Vec<Self>, TreeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Prints the direct child count rather than the subtree.
impl<K: fmt::Debug> fmt::Debug for TreeNode<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("children", &self.children.len())
            .field("extra", &self.extra)
            .finish()
    }
}

/// Tears the subtree down with an explicit stack.
///
/// Nodes still shared elsewhere are only released; their own drop runs when
/// the last handle goes.
impl<K> Drop for TreeNode<K> {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(child) = stack.pop() {
            if let Some(mut node) = Arc::into_inner(child) {
                stack.append(&mut node.children);
            }
        }
    }
}

/// `children: null` and a missing `children` both mean "leaf".
fn nullable_children<'de, D, K>(deserializer: D) -> Result<Vec<Arc<TreeNode<K>>>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de>,
{
    Option::<Vec<Arc<TreeNode<K>>>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Wrap caller-owned roots for sharing.
pub fn into_shared<K>(roots: impl IntoIterator<Item = TreeNode<K>>) -> Vec<Arc<TreeNode<K>>> {
    roots.into_iter().map(Arc::new).collect()
}

// =============================================================================
// FlatNode
// =============================================================================

/// A row of the flattened tree, in render order.
#[derive(Debug, Clone)]
pub struct FlatNode<K> {
    /// The node as it appears in the (possibly filtered) tree.
    pub node: Arc<TreeNode<K>>,
    /// Depth in the tree (0 = root level).
    pub level: usize,
}

impl<K> FlatNode<K> {
    /// The node's id.
    pub fn id(&self) -> &K {
        &self.node.id
    }

    /// Whether the node has children in the current view.
    pub fn has_children(&self) -> bool {
        self.node.has_children()
    }
}

// =============================================================================
// Pre-order traversal
// =============================================================================

/// A node visited by [`Preorder`].
#[derive(Debug)]
pub struct Visit<'a, K> {
    /// The visited node.
    pub node: &'a Arc<TreeNode<K>>,
    /// Id of the parent, `None` for roots.
    pub parent: Option<&'a K>,
    /// Depth (0 = root level).
    pub level: usize,
}

/// Stack-based pre-order iterator over a whole tree.
///
/// Never recurses, so arbitrarily deep input cannot exhaust the call stack.
#[derive(Debug)]
pub struct Preorder<'a, K> {
    stack: Vec<Visit<'a, K>>,
}

impl<'a, K> Preorder<'a, K> {
    /// Start a traversal at the given roots.
    pub fn new(roots: &'a [Arc<TreeNode<K>>]) -> Self {
        let stack = roots
            .iter()
            .rev()
            .map(|node| Visit {
                node,
                parent: None,
                level: 0,
            })
            .collect();
        Self { stack }
    }
}

impl<'a, K> Iterator for Preorder<'a, K> {
    type Item = Visit<'a, K>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;
        let node: &'a Arc<TreeNode<K>> = visit.node;
        self.stack.extend(node.children.iter().rev().map(|child| Visit {
            node: child,
            parent: Some(&node.id),
            level: visit.level + 1,
        }));
        Some(visit)
    }
}
