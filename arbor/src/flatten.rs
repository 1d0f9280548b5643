//! Flattening a tree into render rows.

use std::collections::HashSet;
use std::sync::Arc;

use crate::node::{FlatNode, NodeId, Preorder, TreeNode};

/// Flatten a tree in pre-order, descending only into expanded nodes.
pub fn flatten_tree<K: NodeId>(roots: &[Arc<TreeNode<K>>], expanded: &HashSet<K>) -> Vec<FlatNode<K>> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&Arc<TreeNode<K>>, usize)> = roots.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, level)) = stack.pop() {
        rows.push(FlatNode {
            node: Arc::clone(node),
            level,
        });
        if node.has_children() && expanded.contains(&node.id) {
            stack.extend(node.children.iter().rev().map(|child| (child, level + 1)));
        }
    }

    rows
}

/// Ids of every leaf in the tree, in pre-order.
pub fn innermost_children_ids<K: NodeId>(roots: &[Arc<TreeNode<K>>]) -> Vec<K> {
    Preorder::new(roots)
        .filter(|visit| !visit.node.has_children())
        .map(|visit| visit.node.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::into_shared;

    fn tree() -> Vec<Arc<TreeNode<u32>>> {
        into_shared([
            TreeNode::branch(
                1,
                "one",
                [
                    TreeNode::branch(11, "a", [TreeNode::leaf(111, "x")]),
                    TreeNode::leaf(12, "b"),
                ],
            ),
            TreeNode::branch(2, "two", Vec::new()),
        ])
    }

    fn rows(flat: &[FlatNode<u32>]) -> Vec<(u32, usize)> {
        flat.iter().map(|row| (*row.id(), row.level)).collect()
    }

    #[test]
    fn test_collapsed_tree_shows_roots() {
        let flat = flatten_tree(&tree(), &HashSet::new());
        assert_eq!(rows(&flat), vec![(1, 0), (2, 0)]);
        assert!(flat[0].has_children());
        assert!(!flat[1].has_children());
    }

    #[test]
    fn test_descends_only_into_expanded() {
        let expanded: HashSet<u32> = [1].into_iter().collect();
        let flat = flatten_tree(&tree(), &expanded);
        assert_eq!(rows(&flat), vec![(1, 0), (11, 1), (12, 1), (2, 0)]);

        // 111's parent is open but 1 is not: nothing below 1 shows.
        let expanded: HashSet<u32> = [11].into_iter().collect();
        let flat = flatten_tree(&tree(), &expanded);
        assert_eq!(rows(&flat), vec![(1, 0), (2, 0)]);
    }

    #[test]
    fn test_innermost_ids() {
        assert_eq!(innermost_children_ids(&tree()), vec![111, 12, 2]);
    }
}
