//! Integration tests for tc-dom
//!
//! Tree mutation, traversal and selector behavior as used by the editor.

use tc_dom::*;

fn sample(tree: &mut DomTree) -> NodeId {
    let form = El::new("div")
        .attr("id", "net")
        .attr("data-edit-target", "api:net:update")
        .class("editable")
        .child(
            El::new("div")
                .attr("data-edit-type", "string")
                .attr("data-edit-name", "name")
                .text("Example"),
        )
        .child(
            El::new("div")
                .attr("data-edit-component", "list")
                .child(El::new("div").attr("data-edit-type", "number").attr("data-edit-name", "speed")),
        );
    tree.build_into(tree.root(), form).unwrap()
}

// ============================================================================
// STRUCTURE TESTS
// ============================================================================

#[test]
fn test_get_element_by_id() {
    let mut tree = DomTree::new();
    let form = sample(&mut tree);
    assert_eq!(tree.get_element_by_id("net"), Some(form));
    assert_eq!(tree.get_element_by_id("missing"), None);
}

#[test]
fn test_detached_not_found_by_id() {
    let mut tree = DomTree::new();
    let form = sample(&mut tree);
    tree.detach(form).unwrap();
    assert_eq!(tree.get_element_by_id("net"), None);
}

#[test]
fn test_insert_before_and_after() {
    let mut tree = DomTree::new();
    let parent = tree.build_into(tree.root(), El::new("ul")).unwrap();
    let b = tree.build_into(parent, El::new("li").text("b")).unwrap();
    let a = tree.build(El::new("li").text("a"));
    let c = tree.build(El::new("li").text("c"));
    tree.insert_before(b, a).unwrap();
    tree.insert_after(b, c).unwrap();
    assert_eq!(tree.children(parent), [a, b, c]);
    assert_eq!(tree.text_content(parent), "abc");
}

#[test]
fn test_prepend_moves_node() {
    let mut tree = DomTree::new();
    let parent = tree.build_into(tree.root(), El::new("ul")).unwrap();
    let a = tree.build_into(parent, El::new("li")).unwrap();
    let b = tree.build_into(parent, El::new("li")).unwrap();
    tree.prepend_child(parent, b).unwrap();
    assert_eq!(tree.children(parent), [b, a]);
}

#[test]
fn test_ancestors_and_closest() {
    let mut tree = DomTree::new();
    let form = sample(&mut tree);
    let speed = tree.select("[data-edit-name=\"speed\"]").unwrap()[0];
    let ancestors = tree.ancestors(speed);
    assert_eq!(ancestors.len(), 3);
    assert_eq!(ancestors[1], form);
    assert_eq!(tree.closest(speed, |e| e.attrs.has("data-edit-target")), Some(form));
    assert_eq!(tree.closest(speed, |e| e.tag == "table"), None);
}

// ============================================================================
// SELECTOR TESTS
// ============================================================================

#[test]
fn test_query_in_document_order() {
    let mut tree = DomTree::new();
    let form = sample(&mut tree);
    let inputs = tree.query(form, &Selector::has_attr("data-edit-type"));
    let names: Vec<_> = inputs.iter().map(|n| tree.attr(*n, "data-edit-name").unwrap()).collect();
    assert_eq!(names, ["name", "speed"]);
}

#[test]
fn test_class_attribute_maps_to_class_list() {
    let mut tree = DomTree::new();
    let form = sample(&mut tree);
    tree.set_attr(form, "class", "editable popin").unwrap();
    assert!(tree.has_class(form, "popin"));
    assert!(tree.matches(form, &Selector::parse(".editable.popin").unwrap()));
    tree.remove_class(form, "popin").unwrap();
    assert!(!tree.has_class(form, "popin"));
}

// ============================================================================
// STATE TESTS
// ============================================================================

#[test]
fn test_visibility() {
    let mut tree = DomTree::new();
    let form = sample(&mut tree);
    assert!(tree.is_shown(form));
    tree.hide(form).unwrap();
    assert!(!tree.is_shown(form));
    tree.show(form).unwrap();
    assert!(tree.is_shown(form));
}

#[test]
fn test_multiple_select() {
    let mut tree = DomTree::new();
    let select = tree.build(
        El::new("select")
            .attr("multiple", "multiple")
            .child(El::new("option").value("1"))
            .child(El::new("option").value("2"))
            .child(El::new("option").value("3")),
    );
    tree.select_value(select, &["1", "3"]).unwrap();
    assert_eq!(tree.selected_values(select), ["1", "3"]);
}

#[test]
fn test_text_node_is_not_element() {
    let mut tree = DomTree::new();
    let t = tree.create_text("hi");
    assert!(matches!(tree.add_class(t, "x"), Err(DomError::NotAnElement(_))));
    assert_eq!(tree.text_content(t), "hi");
}

#[test]
fn test_markup_escapes_text() {
    let mut tree = DomTree::new();
    let p = tree.build(El::new("p").text("<b>&"));
    assert_eq!(tree.outer_markup(p), "<p>&lt;b&gt;&amp;</p>");
}
