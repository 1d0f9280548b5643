//! State engine for hierarchical multi-select tree views.
//!
//! Tracks checked, indeterminate and expanded nodes of an arbitrarily deep
//! tree, and produces the flat, searchable row list a virtualized list
//! renders. Drawing is left to the host.

pub mod config;
pub mod error;
pub mod expansion;
pub mod flatten;
pub mod node;
pub mod registry;
pub mod scroll;
pub mod search;
pub mod selection;
pub mod store;

mod view;

pub use config::{InitOptions, TreeConfig};
pub use error::TreeError;
pub use node::{FlatNode, NodeId, TreeNode};
pub use view::TreeView;

pub mod prelude {
    pub use crate::config::{InitOptions, TreeConfig};
    pub use crate::error::TreeError;
    pub use crate::node::{FlatNode, NodeId, TreeNode};
    pub use crate::registry::NodeRegistry;
    pub use crate::scroll::{NoScroll, ScrollOutcome, ScrollTarget, ScrollToIndex, ScrollToNodeParams};
    pub use crate::search::{SearchFields, SearchQuery};
    pub use crate::selection::{CheckState, CheckboxValue, Propagation, SelectionPropagation};
    pub use crate::store::{StoreEvent, StoreId, StoreRegistry, TreeStore};
    pub use crate::view::TreeView;
}
