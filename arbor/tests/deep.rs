//! Pathologically deep and wide trees through the public view API.
//!
//! Every step from loading to teardown, including dropping the trees, must
//! run without exhausting the call stack.

use arbor::prelude::*;

const DEPTH: usize = 100_000;

/// A single chain `n0 -> n1 -> ... -> n{DEPTH - 1}`; only the leaf is named
/// "needle".
fn chain() -> TreeNode<String> {
    let mut node = TreeNode::leaf(format!("n{}", DEPTH - 1), "needle");
    for i in (0..DEPTH - 1).rev() {
        node = TreeNode::branch(format!("n{i}"), "link", [node]);
    }
    node
}

#[test]
fn test_deep_chain_full_lifecycle() {
    let leaf = format!("n{}", DEPTH - 1);
    let mut view = TreeView::detached();
    view.initialize([chain()], InitOptions::default()).unwrap();

    view.toggle(std::slice::from_ref(&leaf), Some(true));
    assert_eq!(view.checked().len(), DEPTH);
    assert!(view.indeterminate().is_empty());
    assert_eq!(view.checkbox_value(&"n0".to_string()), CheckboxValue::Checked);

    view.expand_all();
    assert_eq!(view.render().len(), DEPTH);

    view.set_search("needle", None).unwrap();
    let rows = view.render();
    assert_eq!(rows.len(), DEPTH);
    assert_eq!(rows[DEPTH - 1].id(), &leaf);
    assert_eq!(rows[DEPTH - 1].level, DEPTH - 1);
    let innermost = view.store().write().unwrap().innermost_ids().to_vec();
    assert_eq!(innermost, vec![leaf.clone()]);

    view.collapse_nodes(&["n1".to_string()]);
    assert_eq!(view.render().len(), 2);

    view.toggle(std::slice::from_ref(&leaf), Some(false));
    assert!(view.checked().is_empty());

    // Re-loading replaces the old chain and its cached filtered copy. The
    // search survives but expansion starts over.
    view.initialize([chain()], InitOptions::default()).unwrap();
    assert_eq!(view.render().len(), 1);

    view.teardown();
    assert!(view.render().is_empty());
    drop(rows);
}

#[test]
fn test_deep_chain_dropped_without_teardown() {
    let mut view = TreeView::detached();
    view.initialize(
        [chain()],
        InitOptions::new().with_initial_scroll(format!("n{}", DEPTH - 1)),
    )
    .unwrap();
    view.set_search("needle", None).unwrap();
    assert_eq!(view.render().len(), DEPTH);
    assert_eq!(view.initial_scroll_index(), Some(DEPTH - 1));
    assert!(format!("{view:?}").starts_with("TreeView"));
}

#[test]
fn test_wide_tree() {
    let leaves = (0..DEPTH).map(|i| TreeNode::leaf(i, format!("leaf {i}")));
    let mut view = TreeView::detached();
    view.initialize([TreeNode::branch(DEPTH, "root", leaves)], InitOptions::default())
        .unwrap();

    view.select_all();
    assert_eq!(view.checked().len(), DEPTH + 1);

    view.set_search("leaf 99999", None).unwrap();
    let rows = view.render();
    assert_eq!(rows.len(), 2);
    assert_eq!(*rows[1].id(), 99_999);

    view.unselect_all_filtered();
    assert_eq!(view.checked().len(), DEPTH - 1);
    assert_eq!(view.checkbox_value(&DEPTH), CheckboxValue::Indeterminate);

    view.teardown();
}
