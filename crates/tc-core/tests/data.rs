//! Integration tests for the data store
//!
//! Loads run against the in-memory transport so completion order is
//! controlled by the test.

use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;
use tc_core::data::LoaderConfig;
use tc_core::*;
use tc_net::{Client, MockTransport, Response};

fn setup() -> (DataStore, Client, MockTransport) {
    let mock = MockTransport::new();
    let client = Client::builder().build(mock.clone()).unwrap();
    let mut store = DataStore::default();
    store.loaders_mut().assign("countries", "data").unwrap();
    store.loaders_mut().assign("enum/regions", "data").unwrap();
    (store, client, mock)
}

fn recorder() -> (Rc<RefCell<Vec<Value>>>, impl Fn() -> Box<dyn FnOnce(&Payload)>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let make = move || {
        let s = s.clone();
        Box::new(move |p: &Payload| s.borrow_mut().push(p.data.clone())) as Box<dyn FnOnce(&Payload)>
    };
    (seen, make)
}

fn opts(cb: Box<dyn FnOnce(&Payload)>) -> LoadOptions {
    LoadOptions {
        callback: Some(cb),
        ..Default::default()
    }
}

// ============================================================================
// SINGLE FLIGHT
// ============================================================================

#[test]
fn test_concurrent_loads_share_one_request() {
    let (mut store, mut client, mock) = setup();
    let (seen, cb) = recorder();

    let first = store.load(&mut client, "countries", opts(cb())).unwrap();
    let second = store.load(&mut client, "countries", opts(cb())).unwrap();
    let LoadStatus::Dispatched(ticket) = first else {
        panic!("expected dispatch, got {:?}", first);
    };
    assert_eq!(second, LoadStatus::Queued);
    assert_eq!(mock.request_count(), 1);
    assert!(store.is_loading("countries"));
    assert!(store.loading_since("countries").is_some());

    mock.respond_json(ticket, 200, json!({"countries": [{"id": "US", "name": "United States"}]}));
    let (t, result) = client.poll().remove(0);
    let event = store.complete(t, result).unwrap();

    assert!(event.all_done());
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(seen.borrow()[0], seen.borrow()[1]);
    assert_eq!(store.get("countries")[0]["id"], "US");
    assert!(!store.is_loading("countries"));
}

#[test]
fn test_cached_load_is_synchronous() {
    let (mut store, mut client, mock) = setup();
    store.set("countries", json!([1]));
    let (seen, cb) = recorder();

    assert_eq!(store.load(&mut client, "countries", opts(cb())).unwrap(), LoadStatus::Cached);
    assert_eq!(seen.borrow().as_slice(), [json!([1])]);
    assert_eq!(mock.request_count(), 0);

    let reload = LoadOptions { reload: true, ..opts(cb()) };
    assert!(matches!(store.load(&mut client, "countries", reload).unwrap(), LoadStatus::Dispatched(_)));
    assert_eq!(mock.request_count(), 1);
}

#[test]
fn test_unassigned_id_fails() {
    let (mut store, mut client, mock) = setup();
    let err = store.load(&mut client, "unknown", LoadOptions::new()).unwrap_err();
    assert_eq!(err, DataError::Unassigned("unknown".into()));
    assert_eq!(mock.request_count(), 0);
    assert!(!store.is_loading("unknown"));
}

#[test]
fn test_loader_config_reaches_request() {
    let (mut store, mut client, mock) = setup();
    store.loaders_mut().assign("netixlan", "network_data").unwrap();
    let opts = LoadOptions::new().config(LoaderConfig::default().with_param("id", "42"));
    store.load(&mut client, "netixlan", opts).unwrap();
    let req = &mock.requests()[0];
    assert!(req.url.ends_with("/data/netixlan"));
    assert_eq!(req.query_param("id"), Some("42"));
}

// ============================================================================
// COMPLETION
// ============================================================================

#[test]
fn test_done_waits_for_all_loads() {
    let (mut store, mut client, mock) = setup();
    let fired = Rc::new(RefCell::new(0));

    let LoadStatus::Dispatched(a) = store.load(&mut client, "countries", LoadOptions::new()).unwrap() else {
        panic!("expected dispatch");
    };
    let LoadStatus::Dispatched(b) = store.load(&mut client, "enum/regions", LoadOptions::new()).unwrap() else {
        panic!("expected dispatch");
    };
    let f = fired.clone();
    assert!(!store.done(move || *f.borrow_mut() += 1));

    mock.respond_json(b, 200, json!({"enum/regions": []}));
    let (t, r) = client.poll().remove(0);
    assert!(!store.complete(t, r).unwrap().all_done());
    assert_eq!(*fired.borrow(), 0);

    mock.respond_json(a, 200, json!({"countries": []}));
    let (t, r) = client.poll().remove(0);
    assert!(store.complete(t, r).unwrap().all_done());
    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn test_failed_load_clears_marker() {
    let (mut store, mut client, mock) = setup();
    let (seen, cb) = recorder();
    let LoadStatus::Dispatched(t) = store.load(&mut client, "countries", opts(cb())).unwrap() else {
        panic!("expected dispatch");
    };
    mock.respond(t, Response::new(500, b"oops".to_vec()));
    let (t, r) = client.poll().remove(0);
    let event = store.complete(t, r).unwrap();

    assert!(matches!(event, LoadEvent::Failed { .. }));
    assert!(event.all_done());
    assert!(seen.borrow().is_empty());
    assert!(!store.is_loading("countries"));
    assert!(!store.has("countries"));

    // a later load tries again
    assert!(matches!(store.load(&mut client, "countries", opts(cb())).unwrap(), LoadStatus::Dispatched(_)));
}

#[test]
fn test_foreign_ticket_ignored() {
    let (mut store, mut client, mock) = setup();
    let t = client.send(tc_net::Request::get("/other")).unwrap();
    assert!(!store.owns(t));
    mock.respond_json(t, 200, json!({}));
    let (t, r) = client.poll().remove(0);
    assert!(store.complete(t, r).is_none());
}
