//! Search filtering.
//!
//! A search keeps every node that matches the term plus the ancestors of
//! matches. Which node fields are searchable is decided by a
//! [`SearchFields`] table, so an unknown key is caught when the search is
//! configured rather than silently matching nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TreeError;
use crate::node::{NodeId, TreeNode};

/// Reads one searchable field from a node. `None` never matches.
pub type FieldExtractor<K> = Arc<dyn Fn(&TreeNode<K>) -> Option<String> + Send + Sync>;

// =============================================================================
// SearchFields
// =============================================================================

/// Searchable field names and how to read them.
///
/// `id` and `name` are always registered.
///
/// # Example
///
/// ```
/// use arbor::search::SearchFields;
///
/// let fields = SearchFields::<String>::default().with_extra("color");
/// assert!(fields.validate(&["name", "color"]).is_ok());
/// assert!(fields.validate(&["weight"]).is_err());
/// ```
pub struct SearchFields<K> {
    extractors: HashMap<String, FieldExtractor<K>>,
}

impl<K> Clone for SearchFields<K> {
    fn clone(&self) -> Self {
        Self {
            extractors: self.extractors.clone(),
        }
    }
}

impl<K> fmt::Debug for SearchFields<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.extractors.keys().collect();
        keys.sort();
        f.debug_struct("SearchFields").field("keys", &keys).finish()
    }
}

impl<K: NodeId> Default for SearchFields<K> {
    fn default() -> Self {
        Self {
            extractors: HashMap::new(),
        }
        .with("id", |node: &TreeNode<K>| Some(node.id.to_string()))
        .with("name", |node: &TreeNode<K>| Some(node.name.clone()))
    }
}

impl<K: NodeId> SearchFields<K> {
    /// Register a field with a custom extractor, replacing any previous one.
    pub fn with(
        mut self,
        key: impl Into<String>,
        extractor: impl Fn(&TreeNode<K>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.extractors.insert(key.into(), Arc::new(extractor));
        self
    }

    /// Register a field read from [`TreeNode::extra`].
    ///
    /// Strings match on their contents, other JSON values on their JSON text.
    /// A missing or `null` value never matches.
    pub fn with_extra(self, key: impl Into<String>) -> Self {
        let key = key.into();
        let field = key.clone();
        self.with(key, move |node: &TreeNode<K>| match node.field(&field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.extractors.contains_key(key)
    }

    /// Check that every key is registered.
    pub fn validate<S: AsRef<str>>(&self, keys: &[S]) -> Result<(), TreeError> {
        match keys.iter().find(|key| !self.contains(key.as_ref())) {
            Some(key) => Err(TreeError::UnknownSearchKey(key.as_ref().to_string())),
            None => Ok(()),
        }
    }

    /// Read a field. `None` for unknown keys and empty values.
    pub fn read(&self, key: &str, node: &TreeNode<K>) -> Option<String> {
        self.extractors.get(key).and_then(|extract| extract(node))
    }

    /// Whether any of `keys` contains `term`, case-insensitively.
    ///
    /// `term` must already be lowercased.
    pub fn matches<S: AsRef<str>>(&self, node: &TreeNode<K>, keys: &[S], term: &str) -> bool {
        keys.iter().any(|key| {
            self.read(key.as_ref(), node)
                .is_some_and(|value| value.to_lowercase().contains(term))
        })
    }
}

// =============================================================================
// SearchQuery
// =============================================================================

/// The current search text and the fields it runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub keys: Vec<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            keys: vec!["name".to_string()],
        }
    }
}

impl SearchQuery {
    /// The normalized term: trimmed and lowercased.
    pub fn term(&self) -> String {
        self.text.trim().to_lowercase()
    }

    /// Whether the query filters anything.
    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

// =============================================================================
// Filtering
// =============================================================================

enum Frame<'a, K> {
    Enter(&'a Arc<TreeNode<K>>),
    /// All children have been processed; their kept copies start at the
    /// given offset of the result stack.
    Exit(&'a Arc<TreeNode<K>>, usize),
}

/// Filter a tree by a normalized search term.
///
/// A matching node is kept with its original children. A non-matching node
/// is kept, with only its kept children, when any descendant matches.
/// Sibling order is preserved. An empty term returns the input unchanged.
pub fn filter_tree<K: NodeId, S: AsRef<str>>(
    roots: &[Arc<TreeNode<K>>],
    term: &str,
    keys: &[S],
    fields: &SearchFields<K>,
) -> Vec<Arc<TreeNode<K>>> {
    if term.is_empty() {
        return roots.to_vec();
    }

    let mut stack: Vec<Frame<'_, K>> = roots.iter().rev().map(Frame::Enter).collect();
    let mut kept: Vec<Arc<TreeNode<K>>> = Vec::new();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(node) => {
                if fields.matches(node, keys, term) {
                    kept.push(Arc::clone(node));
                } else if node.has_children() {
                    stack.push(Frame::Exit(node, kept.len()));
                    stack.extend(node.children.iter().rev().map(Frame::Enter));
                }
            }
            Frame::Exit(node, mark) => {
                let children = kept.split_off(mark);
                if !children.is_empty() {
                    kept.push(Arc::new(node.with_children(children)));
                }
            }
        }
    }

    log::trace!("Search '{term}' kept {} root nodes", kept.len());
    kept
}
