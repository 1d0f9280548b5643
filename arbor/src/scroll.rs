//! Expand-then-scroll coordination.
//!
//! Scrolling to a node that sits inside collapsed parents takes two render
//! passes: the parents are expanded first, and the scroll can only be issued
//! once the flattened list containing the node has been produced. The
//! [`ScrollCoordinator`] tracks which of those milestones has been reached.

use std::collections::HashSet;
use std::sync::Arc;

use crate::node::{FlatNode, NodeId};
use crate::registry::NodeRegistry;
use crate::store::TreeStore;

// =============================================================================
// Requests
// =============================================================================

/// A request to bring a node into view.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollToNodeParams<K> {
    pub node_id: K,
    /// Also expand the node itself, not only its ancestors.
    pub expand_scrolled_node: bool,
    pub animated: Option<bool>,
    /// Pixel offset applied after positioning.
    pub view_offset: Option<f32>,
    /// Where the row lands in the viewport: 0 top, 0.5 middle, 1 bottom.
    pub view_position: Option<f32>,
}

impl<K> ScrollToNodeParams<K> {
    pub fn new(node_id: K) -> Self {
        Self {
            node_id,
            expand_scrolled_node: false,
            animated: None,
            view_offset: None,
            view_position: None,
        }
    }

    pub fn with_expand_scrolled_node(mut self, expand: bool) -> Self {
        self.expand_scrolled_node = expand;
        self
    }

    pub fn with_animated(mut self, animated: bool) -> Self {
        self.animated = Some(animated);
        self
    }

    pub fn with_view_offset(mut self, offset: f32) -> Self {
        self.view_offset = Some(offset);
        self
    }

    pub fn with_view_position(mut self, position: f32) -> Self {
        self.view_position = Some(position);
        self
    }
}

/// What the host list is asked to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollToIndex {
    pub index: usize,
    pub animated: Option<bool>,
    pub view_offset: Option<f32>,
    pub view_position: Option<f32>,
}

/// The host's virtualized list.
pub trait ScrollTarget {
    fn scroll_to_index(&mut self, request: ScrollToIndex);
}

impl<F: FnMut(ScrollToIndex)> ScrollTarget for F {
    fn scroll_to_index(&mut self, request: ScrollToIndex) {
        self(request)
    }
}

/// A target that ignores every request, for hosts without a list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScroll;

impl ScrollTarget for NoScroll {
    fn scroll_to_index(&mut self, _request: ScrollToIndex) {}
}

// =============================================================================
// ScrollCoordinator
// =============================================================================

/// Milestone reached by a pending scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollPhase {
    #[default]
    Idle,
    /// Expansion was requested; waiting for a flattened list built after it.
    AwaitingExpand,
    /// A fresh flattened list exists; waiting for the render pass.
    AwaitingRender,
}

/// Result of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Nothing was pending.
    Idle,
    /// A scroll is pending but its preconditions are not met yet.
    Pending,
    /// The target was asked to scroll to this row.
    Scrolled(usize),
    /// The node is not in the list; the request was dropped.
    NotFound,
}

#[derive(Debug)]
pub struct ScrollCoordinator<K: NodeId> {
    phase: ScrollPhase,
    request: Option<ScrollToNodeParams<K>>,
    latest: Option<Arc<[FlatNode<K>]>>,
}

impl<K: NodeId> Default for ScrollCoordinator<K> {
    fn default() -> Self {
        Self {
            phase: ScrollPhase::Idle,
            request: None,
            latest: None,
        }
    }
}

impl<K: NodeId> ScrollCoordinator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    /// The pending request, if any.
    pub fn request(&self) -> Option<&ScrollToNodeParams<K>> {
        self.request.as_ref()
    }

    /// Start a scroll, replacing any pending one.
    ///
    /// Expands the path to the node (and the node itself when asked) and
    /// drops the store's flattened list so the next render produces a new
    /// one even if nothing had to be expanded.
    pub fn scroll_to_node(&mut self, store: &mut TreeStore<K>, params: ScrollToNodeParams<K>) {
        log::debug!(
            "Scroll to node {} requested (expand node: {})",
            params.node_id,
            params.expand_scrolled_node
        );
        store.expand_nodes(std::slice::from_ref(&params.node_id), !params.expand_scrolled_node);
        store.invalidate_flattened();
        self.request = Some(params);
        self.latest = None;
        self.phase = ScrollPhase::AwaitingExpand;
    }

    /// Observe a newly built flattened list.
    pub fn on_flattened(&mut self, list: &Arc<[FlatNode<K>]>) {
        match self.phase {
            ScrollPhase::AwaitingExpand => {
                self.latest = Some(Arc::clone(list));
                self.phase = ScrollPhase::AwaitingRender;
            }
            ScrollPhase::AwaitingRender => {
                self.latest = Some(Arc::clone(list));
            }
            ScrollPhase::Idle => {}
        }
    }

    /// Issue the pending scroll once the path to the node is expanded.
    pub fn on_render(
        &mut self,
        expanded: &HashSet<K>,
        registry: &NodeRegistry<K>,
        target: &mut impl ScrollTarget,
    ) -> ScrollOutcome {
        match self.phase {
            ScrollPhase::Idle => return ScrollOutcome::Idle,
            ScrollPhase::AwaitingExpand => return ScrollOutcome::Pending,
            ScrollPhase::AwaitingRender => {}
        }
        let Some(request) = &self.request else {
            self.reset();
            return ScrollOutcome::Idle;
        };

        let id = &request.node_id;
        if registry.contains(id) {
            let ready = if request.expand_scrolled_node {
                expanded.contains(id)
            } else {
                registry.parent(id).is_none_or(|parent| expanded.contains(parent))
            };
            if !ready {
                return ScrollOutcome::Pending;
            }
        }

        let index = self
            .latest
            .as_ref()
            .and_then(|list| list.iter().position(|row| row.id() == id));
        let outcome = match index {
            Some(index) => {
                log::debug!("Scrolling to node {id} at row {index}");
                target.scroll_to_index(ScrollToIndex {
                    index,
                    animated: request.animated,
                    view_offset: request.view_offset,
                    view_position: request.view_position,
                });
                ScrollOutcome::Scrolled(index)
            }
            None => {
                log::info!("Cannot scroll to node {id}: not found in the rendered tree");
                ScrollOutcome::NotFound
            }
        };
        self.reset();
        outcome
    }

    /// Drop any pending request.
    pub fn reset(&mut self) {
        self.phase = ScrollPhase::Idle;
        self.request = None;
        self.latest = None;
    }
}

// =============================================================================
// InitialScroll
// =============================================================================

/// Finds the row of the node a view should start scrolled to.
///
/// Searches each new flattened list until the node is found, then keeps
/// that index for good.
#[derive(Debug, Clone)]
pub struct InitialScroll<K> {
    node_id: Option<K>,
    index: Option<usize>,
}

impl<K> Default for InitialScroll<K> {
    fn default() -> Self {
        Self {
            node_id: None,
            index: None,
        }
    }
}

impl<K: NodeId> InitialScroll<K> {
    pub fn new(node_id: Option<K>) -> Self {
        Self {
            node_id,
            index: None,
        }
    }

    /// Look for the node in `list` unless it was already found.
    pub fn observe(&mut self, list: &[FlatNode<K>]) -> Option<usize> {
        if self.index.is_none()
            && let Some(id) = &self.node_id
        {
            self.index = list.iter().position(|row| row.id() == id);
            if let Some(index) = self.index {
                log::debug!("Initial scroll node {id} found at row {index}");
            }
        }
        self.index
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_resolved(&self) -> bool {
        self.index.is_some()
    }
}
