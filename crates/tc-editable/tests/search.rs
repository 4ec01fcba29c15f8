//! Integration tests for the advanced search target

use serde_json::json;
use tc_dom::{DomTree, El, NodeId, Selector};
use tc_editable::*;
use tc_net::{Method, MockTransport};

fn add(dom: &mut DomTree, parent: NodeId, el: El) -> NodeId {
    dom.build_into(parent, el).unwrap()
}

struct SearchPage {
    dom: DomTree,
    form: NodeId,
    name: NodeId,
    submit: NodeId,
    results: NodeId,
    empty: NodeId,
}

fn search_page() -> SearchPage {
    let mut dom = DomTree::new();
    let root = dom.root();
    add(
        &mut dom,
        root,
        El::new("div").attr("id", "editable-templates").child(
            El::new("div")
                .attr("id", "advanced-search-net-item")
                .child(
                    El::new("a")
                        .class("name")
                        .attr("data-edit-name", "name")
                        .attr("href", "/net/$id"),
                )
                .child(El::new("span").attr("data-edit-name", "ix_count")),
        ),
    );
    let form = add(
        &mut dom,
        root,
        El::new("div")
            .class("always")
            .attr("data-edit-target", "advanced_search:net"),
    );
    let name = add(
        &mut dom,
        form,
        El::new("div")
            .attr("data-edit-type", "string")
            .attr("data-edit-name", "name"),
    );
    let submit = add(&mut dom, form, El::new("a").attr("data-edit-action", "submit"));
    let results = add(&mut dom, form, El::new("div").class("results"));
    let empty = add(&mut dom, form, El::new("div").class("results-empty").hidden());
    SearchPage {
        dom,
        form,
        name,
        submit,
        results,
        empty,
    }
}

fn start(dom: DomTree) -> (Editor, MockTransport) {
    let mock = MockTransport::new();
    let mut ed = Editor::with_transport(dom, EditorConfig::default(), mock.clone()).unwrap();
    ed.init().unwrap();
    (ed, mock)
}

#[test]
fn test_submit_navigates_to_query() {
    let page = search_page();
    let (mut ed, mock) = start(page.dom);
    assert_eq!(ed.mode(page.form), Mode::Edit);

    ed.set_value(page.name, "Example Net").unwrap();
    ed.click(page.submit).unwrap();

    assert_eq!(mock.request_count(), 0);
    assert!(ed.take_events().contains(&Event::Navigate {
        url: "?name=Example+Net&reftag=net".into()
    }));
    assert_eq!(ed.mode(page.form), Mode::Edit);
}

#[test]
fn test_search_renders_rows() {
    let page = search_page();
    let (mut ed, mock) = start(page.dom);
    ed.set_value(page.name, "Example").unwrap();
    ed.search(page.form).unwrap();

    let (ticket, req) = mock.find("/api/net").unwrap();
    assert_eq!(req.method, Method::Get);
    assert_eq!(req.query_param("name"), Some("Example"));
    assert_eq!(req.query_param("limit"), Some("250"));
    assert_eq!(req.query_param("depth"), Some("1"));

    mock.respond_json(
        ticket,
        200,
        json!({"data": [{"id": 5, "name": "Example Net", "netixlan_set": [1, 2], "netfac_set": []}]}),
    );
    ed.pump().unwrap();

    assert!(ed.take_events().contains(&Event::SearchResults {
        container: page.form,
        reftag: "net".into(),
        count: 1,
    }));
    let rows = ed.dom().element_children(page.results);
    assert_eq!(rows.len(), 1);
    let link = ed.dom().query_first(rows[0], &Selector::parse("a.name").unwrap()).unwrap();
    assert_eq!(ed.dom().text_content(link), "Example Net");
    assert_eq!(ed.dom().attr(link, "href"), Some("/net/5"));
    let count = ed
        .dom()
        .query_first(rows[0], &Selector::attr_eq("data-edit-name", "ix_count"))
        .unwrap();
    assert_eq!(ed.dom().text_content(count), "2");
    assert!(!ed.dom().is_shown(page.empty));
}

#[test]
fn test_search_without_rows() {
    let page = search_page();
    let (mut ed, mock) = start(page.dom);
    ed.search(page.form).unwrap();

    let (ticket, _) = mock.find("/api/net").unwrap();
    mock.respond_json(ticket, 200, json!({"data": []}));
    ed.pump().unwrap();

    assert!(ed.dom().element_children(page.results).is_empty());
    assert!(ed.dom().is_shown(page.empty));
}

#[test]
fn test_search_failure_signals_error() {
    let page = search_page();
    let (mut ed, mock) = start(page.dom);
    ed.search(page.form).unwrap();

    let (ticket, _) = mock.find("/api/net").unwrap();
    mock.fail(ticket, "connection reset");
    ed.pump().unwrap();

    let events = ed.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::ActionError { action, error, .. } if action == "search" && error.reason == "HTTPError"
    )));
}

#[test]
fn test_search_unsupported_target() {
    let mut dom = DomTree::new();
    let root = dom.root();
    let net = add(&mut dom, root, El::new("div").attr("data-edit-target", "api:net:update"));
    let (mut ed, _) = start(dom);
    assert_eq!(
        ed.search(net),
        Err(EditError::SearchUnsupported("api".into()))
    );
}
