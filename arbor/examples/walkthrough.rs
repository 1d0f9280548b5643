use std::fs::File;
use std::sync::Arc;

use arbor::prelude::*;
use simplelog::{Config, LevelFilter, WriteLogger};

const TREE: &str = r#"[
    {"id": "fruits", "name": "Fruits", "children": [
        {"id": "apples", "name": "Apples", "children": [
            {"id": "gala", "name": "Gala", "origin": "New Zealand"},
            {"id": "fuji", "name": "Fuji", "origin": "Japan"}
        ]},
        {"id": "pear", "name": "Pear", "origin": "China"}
    ]},
    {"id": "vegetables", "name": "Vegetables", "children": [
        {"id": "leek", "name": "Leek", "origin": "Egypt"},
        {"id": "kale", "name": "Kale", "origin": null}
    ]}
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up file logging
    let log_file = File::create("walkthrough.log")?;
    WriteLogger::init(LevelFilter::Trace, Config::default(), log_file)?;

    let registry = Arc::new(StoreRegistry::new());
    let mut view = TreeView::attach(&registry, StoreId::new(), |request: ScrollToIndex| {
        println!("-> host list scrolls to row {}", request.index);
    });

    view.on_check(|checked, indeterminate| {
        println!("   checked: {}, indeterminate: {}", checked.len(), indeterminate.len());
    });

    view.initialize(
        TreeNode::<String>::from_json(TREE)?,
        InitOptions::new()
            .with_preselected(["gala".to_string()])
            .with_pre_expanded(["apples".to_string()])
            .with_initial_scroll("pear".to_string()),
    )?;
    view.set_search_fields(SearchFields::default().with_extra("origin"))?;

    print_rows("initial", &mut view);
    println!("initial scroll row: {:?}", view.initial_scroll_index());

    view.toggle(&["fuji".to_string()], None);
    print_rows("after checking fuji", &mut view);

    view.set_search("an", Some(&["origin"]))?;
    print_rows("search 'an' in origin", &mut view);
    view.select_all_filtered();

    view.set_search("", None)?;
    view.scroll_to_node_id(ScrollToNodeParams::new("leek".to_string()).with_animated(true));
    print_rows("after scrolling to leek", &mut view);

    println!("snapshot: {}", view.snapshot().to_json()?);
    view.teardown();
    Ok(())
}

fn print_rows<S: ScrollTarget>(title: &str, view: &mut TreeView<String, S>) {
    println!("== {title}");
    let rows = view.render();
    let expanded = view.expanded();
    for row in rows.iter() {
        let mark = match view.checkbox_value(row.id()) {
            CheckboxValue::Checked => "[x]",
            CheckboxValue::Indeterminate => "[-]",
            CheckboxValue::Unchecked => "[ ]",
        };
        let arrow = if !row.has_children() {
            " "
        } else if expanded.contains(row.id()) {
            "v"
        } else {
            ">"
        };
        println!("{}{arrow} {mark} {}", "  ".repeat(row.level), row.node.name);
    }
}
