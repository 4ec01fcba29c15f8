//! Integration tests for the editor runtime
//!
//! Pages are built with the element builder and every request is answered
//! through the in-memory transport, so completion order is chosen by the
//! test.

use serde_json::json;
use std::time::Duration;
use tc_dom::{DomTree, El, NodeId, Selector};
use tc_editable::*;
use tc_net::MockTransport;

fn add(dom: &mut DomTree, parent: NodeId, el: El) -> NodeId {
    dom.build_into(parent, el).unwrap()
}

fn start(dom: DomTree) -> (Editor, MockTransport) {
    let mock = MockTransport::new();
    let mut ed = Editor::with_transport(dom, EditorConfig::default(), mock.clone()).unwrap();
    ed.init().unwrap();
    (ed, mock)
}

fn string_field(dom: &mut DomTree, parent: NodeId, name: &str, text: &str) -> NodeId {
    add(
        dom,
        parent,
        El::new("div")
            .attr("data-edit-type", "string")
            .attr("data-edit-name", name)
            .text(text),
    )
}

/// `#net` container with a name field and toggle / submit triggers
struct NetPage {
    dom: DomTree,
    container: NodeId,
    name: NodeId,
    toggle: NodeId,
    submit: NodeId,
}

fn net_page() -> NetPage {
    let mut dom = DomTree::new();
    let root = dom.root();
    let container = add(
        &mut dom,
        root,
        El::new("div")
            .attr("id", "net")
            .attr("data-edit-target", "api:net:update")
            .attr("data-edit-id", "12"),
    );
    let name = string_field(&mut dom, container, "name", "Example");
    let toggle = add(&mut dom, container, El::new("a").attr("data-edit-action", "toggle-edit"));
    let submit = add(&mut dom, container, El::new("a").attr("data-edit-action", "submit"));
    NetPage {
        dom,
        container,
        name,
        toggle,
        submit,
    }
}

fn popin(ed: &Editor, container: NodeId) -> NodeId {
    ed.dom()
        .query_first(container, &Selector::parse(".editable.popin").unwrap())
        .unwrap()
}

fn shim(ed: &Editor, container: NodeId) -> NodeId {
    ed.dom()
        .query_first(container, &Selector::parse(".editable.loading-shim").unwrap())
        .unwrap()
}

fn errors(events: &[Event]) -> Vec<Signal> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ActionError { error, .. } => Some(error.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// VIEW / EDIT
// ============================================================================

#[test]
fn test_init_wires_container() {
    let page = net_page();
    let (ed, _) = start(page.dom);
    assert_eq!(ed.mode(page.container), Mode::View);
    assert_eq!(ed.trigger_container(page.toggle), Some(page.container));
    assert_eq!(ed.trigger_container(page.submit), Some(page.container));
    assert!(!ed.dom().is_shown(popin(&ed, page.container)));
    assert!(!ed.dom().is_shown(shim(&ed, page.container)));
}

#[test]
fn test_toggle_creates_inputs() {
    let page = net_page();
    let (mut ed, _) = start(page.dom);
    ed.click(page.toggle).unwrap();

    assert_eq!(ed.mode(page.container), Mode::Edit);
    assert_eq!(ed.mode(page.name), Mode::Edit);
    assert!(ed.dom().has_class(page.container, "mode-edit"));
    let input = ed.input(page.name).unwrap();
    assert_eq!(input.kind(), "string");
    assert_eq!(ed.dom().value(input.element), "Example");

    let events = ed.take_events();
    assert!(events.contains(&Event::Toggle {
        node: page.container,
        mode: Mode::Edit
    }));
    assert!(events.contains(&Event::Action {
        trigger: page.toggle,
        action: "toggle-edit".into()
    }));
}

#[test]
fn test_cancel_restores_display() {
    let page = net_page();
    let (mut ed, _) = start(page.dom);
    let before = ed.dom().children(page.name).to_vec();

    ed.click(page.toggle).unwrap();
    ed.set_value(page.name, "Changed").unwrap();
    ed.click(page.toggle).unwrap();

    assert_eq!(ed.mode(page.container), Mode::View);
    assert_eq!(ed.dom().children(page.name), before.as_slice());
    assert_eq!(ed.dom().text_content(page.name), "Example");
    assert!(ed.input(page.name).is_none());
    assert!(
        ed.take_events()
            .contains(&Event::EditCancel { container: page.container })
    );
}

#[test]
fn test_changed_detection() {
    let page = net_page();
    let (mut ed, _) = start(page.dom);
    ed.click(page.toggle).unwrap();
    assert!(ed.changed_fields(page.container).is_empty());

    ed.set_value(page.name, "Changed").unwrap();
    assert_eq!(ed.changed_fields(page.container), [page.name]);

    ed.set_value(page.name, "Example").unwrap();
    assert!(ed.changed_fields(page.container).is_empty());
}

#[test]
fn test_unit_only_change_counts() {
    let mut dom = DomTree::new();
    let root = dom.root();
    let container = add(&mut dom, root, El::new("div").attr("data-edit-target", "api:ix:update"));
    let speed = add(
        &mut dom,
        container,
        El::new("div")
            .attr("data-edit-type", "traffic_capacity")
            .attr("data-edit-name", "speed")
            .text("10 Gbps"),
    );
    let (mut ed, _) = start(dom);
    ed.toggle(container, None).unwrap();
    assert!(ed.changed_fields(container).is_empty());
    assert_eq!(ed.export_data(container).unwrap()["speed"], json!(10_000));

    ed.select_unit(speed, "Tbps").unwrap();
    assert_eq!(ed.changed_fields(container), [speed]);
    assert_eq!(ed.export_data(container).unwrap()["speed"], json!(10_000_000));

    ed.select_unit(speed, "Gbps").unwrap();
    assert!(ed.changed_fields(container).is_empty());
}

#[test]
fn test_export_requires_edit_mode() {
    let page = net_page();
    let (mut ed, _) = start(page.dom);
    assert_eq!(
        ed.export_data(page.container),
        Err(EditError::NotEditing(page.container))
    );
}

#[test]
fn test_reset_action_restores_baseline() {
    let mut page = net_page();
    let reset = add(&mut page.dom, page.container, El::new("a").attr("data-edit-action", "reset"));
    let (mut ed, _) = start(page.dom);
    ed.click(page.toggle).unwrap();
    ed.set_value(page.name, "Changed").unwrap();

    ed.click(reset).unwrap();
    let input = ed.input(page.name).unwrap();
    assert_eq!(ed.dom().value(input.element), "Example");
    assert_eq!(ed.mode(page.container), Mode::Edit);
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_required_fields_fail_together() {
    let mut dom = DomTree::new();
    let root = dom.root();
    let container = add(&mut dom, root, El::new("div").attr("data-edit-target", "api:net:create"));
    let name = add(
        &mut dom,
        container,
        El::new("div")
            .attr("data-edit-type", "string")
            .attr("data-edit-name", "name")
            .attr("data-edit-required", "yes"),
    );
    add(
        &mut dom,
        container,
        El::new("div")
            .attr("data-edit-type", "number")
            .attr("data-edit-name", "asn")
            .attr("data-edit-required", "yes"),
    );
    let submit = add(&mut dom, container, El::new("a").attr("data-edit-action", "submit"));
    let (mut ed, mock) = start(dom);
    ed.toggle(container, None).unwrap();
    ed.take_events();

    ed.click(submit).unwrap();

    assert_eq!(mock.request_count(), 0);
    let errors = errors(&ed.take_events());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "ValidationErrors");
    let failed = errors[0].data["_validationErrors"].as_object().unwrap();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed["name"], "Input required");
    assert_eq!(errors[0].data["_valid"], false);

    let input = ed.input(name).unwrap();
    assert_eq!(input.note(ed.dom()).as_deref(), Some("Input required"));
    assert!(ed.dom().has_class(input.element, "validation-error"));

    let popin = popin(&ed, container);
    assert!(ed.dom().is_shown(popin));
    assert_eq!(ed.dom().text_content(popin), humanize("ValidationErrors"));
    assert!(!ed.dom().is_shown(shim(&ed, container)));
    assert_eq!(ed.mode(container), Mode::Edit);
}

#[test]
fn test_blank_number_fails_validation() {
    let mut dom = DomTree::new();
    let root = dom.root();
    let container = add(&mut dom, root, El::new("div").attr("data-edit-target", "api:net:create"));
    let asn = add(
        &mut dom,
        container,
        El::new("div")
            .attr("data-edit-type", "number")
            .attr("data-edit-name", "asn"),
    );
    let (mut ed, _) = start(dom);
    ed.toggle(container, None).unwrap();

    match ed.export_data(container) {
        Err(EditError::Validations { data }) => {
            assert_eq!(data["_validationErrors"]["asn"], json!("Needs to be a number"));
        }
        other => panic!("blank number accepted: {other:?}"),
    }

    ed.set_value(asn, "63311").unwrap();
    assert_eq!(ed.export_data(container).unwrap()["asn"], json!("63311"));
}

#[test]
fn test_focus_clears_validation_error() {
    let mut dom = DomTree::new();
    let root = dom.root();
    let container = add(&mut dom, root, El::new("div").attr("data-edit-target", "api:net:create"));
    let email = add(
        &mut dom,
        container,
        El::new("div")
            .attr("data-edit-type", "email")
            .attr("data-edit-name", "email")
            .attr("data-edit-required", "yes"),
    );
    let (mut ed, _) = start(dom);
    ed.toggle(container, None).unwrap();
    assert!(ed.export_data(container).is_err());
    assert!(ed.input(email).unwrap().note(ed.dom()).is_some());

    ed.focus(email).unwrap();
    let input = ed.input(email).unwrap();
    assert!(input.note(ed.dom()).is_none());
    assert!(!ed.dom().has_class(input.element, "validation-error"));
}

// ============================================================================
// SUBMIT
// ============================================================================

#[test]
fn test_submit_applies_accepted_values() {
    let page = net_page();
    let (mut ed, mock) = start(page.dom);
    ed.click(page.toggle).unwrap();
    ed.set_value(page.name, "New Name").unwrap();
    ed.click(page.submit).unwrap();

    assert!(ed.dom().is_shown(shim(&ed, page.container)));
    let (ticket, req) = mock.find("/api/net/12").unwrap();
    assert_eq!(req.method.as_str(), "PUT");
    let body = req.json().unwrap();
    assert_eq!(body["name"], "New Name");
    assert_eq!(body["_id"], 12);

    mock.respond_json(ticket, 200, json!({"data": [{"id": 12, "name": "New Name"}]}));
    assert_eq!(ed.pump().unwrap(), 1);

    assert_eq!(ed.mode(page.container), Mode::View);
    assert_eq!(ed.dom().text_content(page.name), "New Name");
    assert_eq!(ed.dom().attr(page.name, "data-edit-value"), Some("New Name"));
    assert!(!ed.dom().is_shown(shim(&ed, page.container)));

    let events = ed.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::ActionSuccess { action, payload, .. } if action == "submit" && payload["id"] == 12
    )));
    assert!(!events.iter().any(|e| matches!(e, Event::EditCancel { .. })));
    assert!(ed.is_idle());
}

#[test]
fn test_unchanged_submit_skips_request() {
    let page = net_page();
    let (mut ed, mock) = start(page.dom);
    ed.click(page.toggle).unwrap();
    ed.click(page.submit).unwrap();

    assert_eq!(mock.request_count(), 0);
    assert_eq!(ed.mode(page.container), Mode::View);
}

#[test]
fn test_marked_container_submits_unchanged() {
    let page = net_page();
    let (mut ed, mock) = start(page.dom);
    ed.click(page.toggle).unwrap();
    ed.mark_changed(page.container);
    ed.click(page.submit).unwrap();
    assert_eq!(mock.request_count(), 1);
}

/// `#net` plus a sibling container grouped into it
fn grouped_page() -> (NetPage, NodeId, NodeId) {
    let mut page = net_page();
    let root = page.dom.root();
    let poc = add(
        &mut page.dom,
        root,
        El::new("div")
            .attr("data-edit-target", "api:poc:update")
            .attr("data-edit-group", "#net")
            .attr("data-edit-id", "5"),
    );
    let role = string_field(&mut page.dom, poc, "role", "Abuse");
    (page, poc, role)
}

#[test]
fn test_grouped_submit_waits_for_every_part() {
    let (page, poc, role) = grouped_page();
    let (mut ed, mock) = start(page.dom);
    ed.click(page.toggle).unwrap();
    assert_eq!(ed.mode(poc), Mode::Edit);

    ed.set_value(page.name, "New Name").unwrap();
    ed.set_value(role, "Technical").unwrap();
    ed.click(page.submit).unwrap();
    assert_eq!(ed.pending_requests(), 2);

    // grouped part answers first
    let (poc_ticket, _) = mock.find("/api/poc/5").unwrap();
    mock.respond_json(poc_ticket, 200, json!({"data": [{"id": 5, "role": "Technical"}]}));
    ed.pump().unwrap();
    assert_eq!(ed.mode(page.container), Mode::Edit);
    assert_eq!(ed.mode(poc), Mode::Edit);

    let (net_ticket, _) = mock.find("/api/net/12").unwrap();
    mock.respond_json(net_ticket, 200, json!({"data": [{"id": 12}]}));
    ed.pump().unwrap();

    assert_eq!(ed.mode(page.container), Mode::View);
    assert_eq!(ed.mode(poc), Mode::View);
    assert_eq!(ed.dom().text_content(page.name), "New Name");
    assert_eq!(ed.dom().text_content(role), "Technical");
    assert!(ed.is_idle());
}

#[test]
fn test_grouped_submit_main_first() {
    let (page, poc, role) = grouped_page();
    let (mut ed, mock) = start(page.dom);
    ed.click(page.toggle).unwrap();
    ed.set_value(page.name, "New Name").unwrap();
    ed.set_value(role, "Technical").unwrap();
    ed.click(page.submit).unwrap();

    let (net_ticket, _) = mock.find("/api/net/12").unwrap();
    mock.respond_json(net_ticket, 200, json!({"data": [{"id": 12}]}));
    ed.pump().unwrap();
    assert_eq!(ed.mode(page.container), Mode::Edit);

    let (poc_ticket, _) = mock.find("/api/poc/5").unwrap();
    mock.respond_json(poc_ticket, 200, json!({"data": [{"id": 5}]}));
    ed.pump().unwrap();
    assert_eq!(ed.mode(page.container), Mode::View);
    assert_eq!(ed.mode(poc), Mode::View);
}

#[test]
fn test_failed_part_keeps_edit_mode() {
    let (page, poc, role) = grouped_page();
    let (mut ed, mock) = start(page.dom);
    ed.click(page.toggle).unwrap();
    ed.set_value(page.name, "New Name").unwrap();
    ed.set_value(role, "Technical").unwrap();
    ed.click(page.submit).unwrap();
    ed.take_events();

    let (poc_ticket, _) = mock.find("/api/poc/5").unwrap();
    mock.respond_json(poc_ticket, 503, json!({"meta": {"error": "Down for maintenance"}}));
    let (net_ticket, _) = mock.find("/api/net/12").unwrap();
    mock.respond_json(net_ticket, 200, json!({"data": [{"id": 12}]}));
    ed.pump().unwrap();

    assert_eq!(ed.mode(page.container), Mode::Edit);
    assert_eq!(ed.mode(poc), Mode::Edit);
    let errors = errors(&ed.take_events());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "Http503");
    assert_eq!(errors[0].info, "Down for maintenance");
    assert!(!ed.dom().is_shown(shim(&ed, page.container)));
    assert!(ed.is_idle());
}

/// `#net` with a grouped `poc` sibling and a nested api listing holding
/// rows 7 and 8
struct BarrierPage {
    net: NetPage,
    poc: NodeId,
    role: NodeId,
    facilities: NodeId,
    rows: [NodeId; 2],
}

fn barrier_page() -> BarrierPage {
    let (mut net, poc, role) = grouped_page();
    let root = net.dom.root();
    add(
        &mut net.dom,
        root,
        El::new("div").attr("id", "editable-templates").child(
            El::new("div")
                .attr("id", "fac-row")
                .child(El::new("div").attr("data-edit-type", "string").attr("data-edit-name", "name")),
        ),
    );
    let facilities = add(
        &mut net.dom,
        net.container,
        El::new("div")
            .attr("data-edit-target", "api:netfac")
            .attr("data-edit-module", "api_listing"),
    );
    let list = add(
        &mut net.dom,
        facilities,
        El::new("div")
            .attr("data-edit-component", "list")
            .attr("data-edit-template", "fac-row"),
    );
    let mut rows = [list; 2];
    for (slot, id) in rows.iter_mut().zip(["7", "8"]) {
        let row = add(&mut net.dom, list, El::new("div").attr("data-edit-id", id));
        *slot = string_field(&mut net.dom, row, "name", &format!("Fac {id}"));
    }
    BarrierPage {
        net,
        poc,
        role,
        facilities,
        rows,
    }
}

/// Change every part of the barrier page and submit it
fn submit_barrier() -> (Editor, MockTransport, NodeId) {
    let page = barrier_page();
    let container = page.net.container;
    let (mut ed, mock) = start(page.net.dom);
    ed.click(page.net.toggle).unwrap();
    ed.toggle(page.facilities, None).unwrap();
    ed.set_value(page.net.name, "New Name").unwrap();
    ed.set_value(page.role, "Technical").unwrap();
    for row in page.rows {
        ed.set_value(row, "Fac Renamed").unwrap();
    }
    ed.click(page.net.submit).unwrap();
    assert_eq!(mock.pending().len(), 4);
    assert_eq!(ed.mode(page.poc), Mode::Edit);
    (ed, mock, container)
}

fn net_state(ed: &Editor, container: NodeId) -> (Mode, bool) {
    (ed.mode(container), ed.dom().is_shown(shim(ed, container)))
}

/// Answer the four parts in `order`; `failing` gets a 503 instead
fn complete_barrier(order: [&str; 4], failing: Option<&str>) -> (Mode, bool) {
    let (mut ed, mock, container) = submit_barrier();
    assert_eq!(net_state(&ed, container), (Mode::Edit, true));
    for (i, path) in order.iter().enumerate() {
        let (ticket, _) = mock.find(path).unwrap();
        if failing == Some(*path) {
            mock.respond_json(ticket, 503, json!({"meta": {"error": "Down for maintenance"}}));
        } else {
            mock.respond_json(ticket, 200, json!({"data": [{"id": 1}]}));
        }
        ed.pump().unwrap();
        if i + 1 < order.len() {
            assert_eq!(net_state(&ed, container), (Mode::Edit, true), "after {path}");
        }
    }
    assert!(ed.is_idle());
    net_state(&ed, container)
}

#[test]
fn test_submit_barrier_any_completion_order() {
    for order in [
        ["/api/netfac/7", "/api/poc/5", "/api/netfac/8", "/api/net/12"],
        ["/api/net/12", "/api/netfac/8", "/api/poc/5", "/api/netfac/7"],
        ["/api/poc/5", "/api/net/12", "/api/netfac/7", "/api/netfac/8"],
    ] {
        assert_eq!(complete_barrier(order, None), (Mode::View, false), "order {order:?}");
    }
}

#[test]
fn test_submit_barrier_failed_row_keeps_edit_mode() {
    let order = ["/api/netfac/7", "/api/poc/5", "/api/netfac/8", "/api/net/12"];
    assert_eq!(complete_barrier(order, Some("/api/netfac/8")), (Mode::Edit, false));

    let order = ["/api/netfac/8", "/api/net/12", "/api/poc/5", "/api/netfac/7"];
    assert_eq!(complete_barrier(order, Some("/api/netfac/8")), (Mode::Edit, false));
}

#[test]
fn test_enter_runs_container_action_after_delay() {
    let mut page = net_page();
    page.dom.set_attr(page.container, "data-edit-enter-action", "submit").unwrap();
    let (mut ed, mock) = start(page.dom);
    ed.click(page.toggle).unwrap();
    ed.set_value(page.name, "New Name").unwrap();

    ed.press_enter(page.name).unwrap();
    ed.advance(Duration::from_millis(99)).unwrap();
    assert_eq!(mock.request_count(), 0);
    ed.advance(Duration::from_millis(1)).unwrap();
    assert!(mock.find("/api/net/12").is_some());
}

// ============================================================================
// API ERRORS
// ============================================================================

/// Editor with a changed name submitted and the request in flight;
/// returns the container and the name field
fn submit_changed() -> (Editor, MockTransport, NodeId, NodeId) {
    let NetPage {
        dom,
        container,
        name,
        toggle,
        submit,
    } = net_page();
    let (mut ed, mock) = start(dom);
    ed.click(toggle).unwrap();
    ed.set_value(name, "New Name").unwrap();
    ed.click(submit).unwrap();
    ed.take_events();
    (ed, mock, container, name)
}

#[test]
fn test_api_400_annotates_fields() {
    let (mut ed, mock, container, name) = submit_changed();
    let (ticket, _) = mock.find("/api/net/12").unwrap();
    mock.respond_json(ticket, 400, json!({"name": ["Too short"], "non_field_errors": ["Duplicate"]}));
    ed.pump().unwrap();

    let errors = errors(&ed.take_events());
    assert_eq!(errors[0].reason, "HTTPError");
    assert_eq!(errors[0].info, "The server rejected your data<br />Duplicate");
    let input = ed.input(name).unwrap();
    assert_eq!(input.note(ed.dom()).as_deref(), Some("Too short"));
    assert_eq!(ed.mode(container), Mode::Edit);

    let popin = popin(&ed, container);
    assert!(ed.dom().is_shown(popin));
}

#[test]
fn test_api_403_without_message() {
    let (mut ed, mock, _, _) = submit_changed();
    let (ticket, _) = mock.find("/api/net/12").unwrap();
    mock.respond_json(ticket, 403, json!({}));
    ed.pump().unwrap();

    let errors = errors(&ed.take_events());
    assert_eq!(errors[0].reason, "Http403");
    assert_eq!(errors[0].info, "You do not have permissions to perform this action");
}

#[test]
fn test_ignored_field_error_hides_popin() {
    let (mut ed, mock, container, _) = submit_changed();
    let (ticket, _) = mock.find("/api/net/12").unwrap();
    mock.respond_json(ticket, 400, json!({"meta": {"ignore_field_error": true, "error": "x"}}));
    ed.pump().unwrap();

    let errors = errors(&ed.take_events());
    assert_eq!(errors[0].reason, "IgnoreError");
    assert!(!ed.dom().is_shown(popin(&ed, container)));
    assert_eq!(ed.mode(container), Mode::Edit);
}

#[test]
fn test_connection_failure_is_http_error() {
    let (mut ed, mock, _, _) = submit_changed();
    let (ticket, _) = mock.find("/api/net/12").unwrap();
    mock.fail(ticket, "connection reset");
    ed.pump().unwrap();

    let errors = errors(&ed.take_events());
    assert_eq!(errors[0].reason, "HTTPError");
    assert!(errors[0].info.contains("connection reset"));
}

#[test]
fn test_refused_confirmation_sends_nothing() {
    let mut page = net_page();
    page.dom.set_attr(page.submit, "data-confirm", "Save changes?").unwrap();
    let (mut ed, mock) = start(page.dom);
    let asked = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let log = asked.clone();
    ed.set_confirm(move |q| {
        log.borrow_mut().push(q.to_string());
        false
    });
    ed.click(page.toggle).unwrap();
    ed.set_value(page.name, "New Name").unwrap();
    ed.click(page.submit).unwrap();

    assert_eq!(*asked.borrow(), ["Save changes?"]);
    assert_eq!(mock.request_count(), 0);
    assert!(!ed.dom().is_shown(shim(&ed, page.container)));
    assert_eq!(ed.mode(page.container), Mode::Edit);
    assert!(ed.is_idle());
}

#[test]
fn test_unknown_request_type_propagates() {
    let mut page = net_page();
    page.dom.set_attr(page.container, "data-edit-target", "api:net:patch").unwrap();
    let (mut ed, _) = start(page.dom);
    ed.click(page.toggle).unwrap();
    ed.set_value(page.name, "New Name").unwrap();
    assert_eq!(
        ed.click(page.submit),
        Err(EditError::UnknownRequestType("patch".into()))
    );
}

// ============================================================================
// XHRPost
// ============================================================================

#[test]
fn test_unregistered_target_posts_to_url() {
    let mut dom = DomTree::new();
    let root = dom.root();
    let container = add(
        &mut dom,
        root,
        El::new("div")
            .attr("data-edit-target", "/account/profile")
            .attr("data-edit-redirect-on-success", "/account"),
    );
    let name = string_field(&mut dom, container, "name", "");
    let submit = add(&mut dom, container, El::new("a").attr("data-edit-action", "submit"));
    let (mut ed, mock) = start(dom);
    ed.toggle(container, None).unwrap();
    ed.set_value(name, "Jo").unwrap();
    ed.click(submit).unwrap();

    let (ticket, req) = mock.find("/account/profile").unwrap();
    assert_eq!(req.method.as_str(), "POST");
    assert_eq!(req.json(), Some(&json!({"name": "Jo"})));
    mock.respond_json(ticket, 200, json!({"status": "ok"}));
    ed.pump().unwrap();

    let events = ed.take_events();
    assert!(events.contains(&Event::Navigate { url: "/account".into() }));
    assert_eq!(ed.mode(container), Mode::View);
    assert_eq!(ed.dom().text_content(name), "Jo");
}
