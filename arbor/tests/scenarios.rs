use std::collections::HashSet;

use arbor::prelude::*;

fn tree() -> Vec<TreeNode<String>> {
    let node = |id: &str| TreeNode::leaf(id.to_string(), format!("Node {id}"));
    vec![
        TreeNode::branch(
            "1".to_string(),
            "Node 1",
            [
                TreeNode::branch("1.1".to_string(), "Node 1.1", [node("1.1.1"), node("1.1.2")]),
                TreeNode::branch("1.2".to_string(), "Node 1.2", [node("1.2.1"), node("1.2.2")]),
            ],
        ),
        TreeNode::branch("2".to_string(), "Node 2", [node("2.1"), node("2.2")]),
    ]
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn set(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn view() -> TreeView<String> {
    let mut view = TreeView::detached();
    view.initialize(tree(), InitOptions::default()).unwrap();
    view
}

#[test]
fn test_toggle_leaf_then_sibling() {
    let view = view();

    view.toggle(&ids(&["1.1.1"]), Some(true));
    assert_eq!(view.checked(), set(&["1.1.1"]));
    assert_eq!(view.indeterminate(), set(&["1.1", "1"]));

    view.toggle(&ids(&["1.1.2"]), Some(true));
    assert_eq!(view.checked(), set(&["1.1", "1.1.1", "1.1.2"]));
    assert_eq!(view.indeterminate(), set(&["1"]));
}

#[test]
fn test_select_all_checks_every_node() {
    let view = view();
    view.toggle(&ids(&["1.2.1"]), None);

    view.select_all();

    assert_eq!(view.checked().len(), 10);
    assert!(view.indeterminate().is_empty());
}

#[test]
fn test_select_all_filtered_by_id() {
    let mut view = view();
    view.set_search("1.1", Some(&["id"])).unwrap();

    let rows: Vec<String> = view.render().iter().map(|row| row.id().clone()).collect();
    assert_eq!(rows, ids(&["1", "1.1", "1.1.1", "1.1.2"]));

    view.select_all_filtered();

    assert_eq!(view.checked(), set(&["1.1", "1.1.1", "1.1.2"]));
    assert_eq!(view.indeterminate(), set(&["1"]));
    assert_eq!(view.checkbox_value(&"2".to_string()), CheckboxValue::Unchecked);
}

#[test]
fn test_expand_then_collapse_parent() {
    let view = view();

    view.expand_nodes(&ids(&["2.2"]), false);
    assert!(view.expanded().is_superset(&set(&["2", "2.2"])));

    view.collapse_nodes(&ids(&["2"]));
    let expanded = view.expanded();
    assert!(!expanded.contains("2"));
    assert!(!expanded.contains("2.2"));
}

#[test]
fn test_scroll_to_node_expands_ancestor_first() {
    let mut requests = Vec::new();
    {
        let mut view = TreeView::new(TreeConfig::default(), |request: ScrollToIndex| {
            requests.push(request)
        });
        view.initialize(tree(), InitOptions::default()).unwrap();
        let expanded_log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&expanded_log);
        view.on_expand(move |expanded| sink.lock().unwrap().push(expanded.clone()));

        view.scroll_to_node_id(ScrollToNodeParams::new("2.1".to_string()));

        // "2" is open before any render, "2.1" itself is not.
        let expanded = view.expanded();
        assert!(expanded.contains("2"));
        assert!(!expanded.contains("2.1"));
        assert_eq!(expanded_log.lock().unwrap().len(), 1);

        let rows = view.render();
        let index = rows.iter().position(|row| row.id() == "2.1").unwrap();
        assert_eq!(index, 2);
    }
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].index, 2);
}

#[test]
fn test_parents_only_and_children_only_propagation() {
    let mut view = TreeView::detached();
    view.initialize(
        tree(),
        InitOptions::new()
            .with_selection_propagation(SelectionPropagation::default().with_to_children(false)),
    )
    .unwrap();
    view.toggle(&ids(&["1.1"]), Some(true));
    assert_eq!(view.checked(), set(&["1.1"]));
    assert_eq!(view.indeterminate(), set(&["1"]));

    view.initialize(
        tree(),
        InitOptions::new()
            .with_selection_propagation(SelectionPropagation::default().with_to_parents(false)),
    )
    .unwrap();
    view.toggle(&ids(&["1.1"]), Some(true));
    assert_eq!(view.checked(), set(&["1.1", "1.1.1", "1.1.2"]));
    assert!(view.indeterminate().is_empty());
}

#[test]
fn test_json_input() {
    let json = r#"[
        {"id": "a", "name": "Alpha", "children": [
            {"id": "a.1", "name": "One", "tag": "hot"},
            {"id": "a.2", "name": "Two", "tag": "cold", "children": null}
        ]},
        {"id": "b", "name": "Beta", "children": []}
    ]"#;
    let mut view: TreeView<String> = TreeView::detached();
    view.initialize(TreeNode::from_json(json).unwrap(), InitOptions::default())
        .unwrap();
    view.set_search_fields(SearchFields::default().with_extra("tag"))
        .unwrap();

    view.set_search("COLD", Some(&["tag"])).unwrap();
    let rows: Vec<(String, usize, bool)> = view
        .render()
        .iter()
        .map(|row| (row.id().clone(), row.level, row.has_children()))
        .collect();

    assert_eq!(
        rows,
        vec![("a".to_string(), 0, true), ("a.2".to_string(), 1, false)]
    );
}
