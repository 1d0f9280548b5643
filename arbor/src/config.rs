//! Store configuration

use serde::Deserialize;

use crate::node::NodeId;
use crate::selection::SelectionPropagation;

/// Settings shared by every store created from them.
///
/// # Example
///
/// ```
/// use arbor::config::TreeConfig;
/// use arbor::selection::SelectionPropagation;
///
/// let config = TreeConfig::default()
///     .with_search_keys(["name", "id"])
///     .with_selection_propagation(SelectionPropagation::none())
///     .with_strict_ids(true);
/// assert!(config.expand_on_search);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Propagation used when `initialize` is not given one.
    ///
    /// Default: both directions
    pub selection_propagation: SelectionPropagation,

    /// Fields searched when a search does not name its own.
    ///
    /// Default: `["name"]`
    pub search_keys: Vec<String>,

    /// Expand every node when a search starts, collapse every node when it
    /// is cleared.
    ///
    /// Default: true
    pub expand_on_search: bool,

    /// Reject trees with repeated ids instead of keeping the last one.
    ///
    /// Default: false
    pub strict_ids: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            selection_propagation: SelectionPropagation::default(),
            search_keys: vec!["name".to_string()],
            expand_on_search: true,
            strict_ids: false,
        }
    }
}

impl TreeConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, crate::error::TreeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_selection_propagation(mut self, propagation: SelectionPropagation) -> Self {
        self.selection_propagation = propagation;
        self
    }

    pub fn with_search_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expand_on_search(mut self, enabled: bool) -> Self {
        self.expand_on_search = enabled;
        self
    }

    pub fn with_strict_ids(mut self, strict: bool) -> Self {
        self.strict_ids = strict;
        self
    }
}

/// Per-load options for [`TreeStore::initialize`](crate::store::TreeStore::initialize).
#[derive(Debug, Clone)]
pub struct InitOptions<K: NodeId> {
    /// Nodes checked right after loading, with propagation applied.
    pub preselected_ids: Vec<K>,
    /// Nodes expanded right after loading, together with their ancestors.
    pub pre_expanded_ids: Vec<K>,
    /// Overrides [`TreeConfig::selection_propagation`].
    pub selection_propagation: Option<SelectionPropagation>,
    /// Node the host list should start scrolled to.
    pub initial_scroll_node_id: Option<K>,
}

impl<K: NodeId> Default for InitOptions<K> {
    fn default() -> Self {
        Self {
            preselected_ids: Vec::new(),
            pre_expanded_ids: Vec::new(),
            selection_propagation: None,
            initial_scroll_node_id: None,
        }
    }
}

impl<K: NodeId> InitOptions<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preselected(mut self, ids: impl IntoIterator<Item = K>) -> Self {
        self.preselected_ids = ids.into_iter().collect();
        self
    }

    pub fn with_pre_expanded(mut self, ids: impl IntoIterator<Item = K>) -> Self {
        self.pre_expanded_ids = ids.into_iter().collect();
        self
    }

    pub fn with_selection_propagation(mut self, propagation: SelectionPropagation) -> Self {
        self.selection_propagation = Some(propagation);
        self
    }

    pub fn with_initial_scroll(mut self, id: K) -> Self {
        self.initial_scroll_node_id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;

    #[test]
    fn test_defaults() {
        let config = TreeConfig::new();
        assert_eq!(config.search_keys, vec!["name"]);
        assert!(config.expand_on_search);
        assert!(!config.strict_ids);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = TreeConfig::from_json(
            r#"{"strict_ids": true, "selection_propagation": {"toChildren": false}}"#,
        )
        .unwrap();

        assert!(config.strict_ids);
        assert!(config.expand_on_search);
        assert_eq!(config.selection_propagation.to_children, Some(false));
        assert_eq!(config.selection_propagation.to_parents, None);
        assert_eq!(config.search_keys, vec!["name"]);
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        let result = TreeConfig::from_json(r#"{"expand_on_search": "yes"}"#);
        assert!(matches!(result, Err(TreeError::Deserialize(_))));
    }
}
