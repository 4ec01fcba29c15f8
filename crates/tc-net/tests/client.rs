//! Integration tests for tc-net
//!
//! Client behavior against the in-memory transport.

use serde_json::json;
use tc_net::*;

fn client() -> (Client, MockTransport) {
    let mock = MockTransport::new();
    let client = Client::builder()
        .base_url("http://localhost:8000")
        .csrf_token("secret")
        .default_header("Accept", "application/json")
        .build(mock.clone())
        .unwrap();
    (client, mock)
}

// ============================================================================
// DISPATCH TESTS
// ============================================================================

#[test]
fn test_tickets_are_unique() {
    let (mut client, mock) = client();
    let a = client.send(Request::get("/data/countries")).unwrap();
    let b = client.send(Request::get("/data/countries")).unwrap();
    assert_ne!(a, b);
    assert_eq!(mock.request_count(), 2);
}

#[test]
fn test_csrf_only_on_unsafe_methods() {
    let (mut client, mock) = client();
    client.send(Request::get("/data/x")).unwrap();
    client.send(Request::post("/api/net").with_json(json!({}))).unwrap();
    let reqs = mock.requests();
    assert!(reqs[0].headers.get("X-CSRFToken").is_none());
    assert_eq!(reqs[1].headers.get("X-CSRFToken").unwrap(), "secret");
    assert_eq!(reqs[0].headers.get("Accept").unwrap(), "application/json");
}

#[test]
fn test_urls_resolved_before_dispatch() {
    let (mut client, mock) = client();
    client.send(Request::delete("/api/poc/3")).unwrap();
    assert_eq!(mock.requests()[0].url, "http://localhost:8000/api/poc/3");
    assert!(mock.find("/api/poc/3").is_some());
}

// ============================================================================
// COMPLETION TESTS
// ============================================================================

#[test]
fn test_completion_round_trip() {
    let (mut client, mock) = client();
    let t = client.send(Request::get("/data/countries")).unwrap();
    assert!(client.poll().is_empty());

    mock.respond_json(t, 200, json!({"countries": [{"id": "US", "name": "United States"}]}));
    let (ticket, result) = client.wait().unwrap();
    assert_eq!(ticket, t);
    let body = result.unwrap().json().unwrap();
    assert_eq!(body["countries"][0]["id"], "US");
    assert!(client.wait().is_none());
}

#[test]
fn test_connection_failure() {
    let (mut client, mock) = client();
    let t = client.send(Request::get("/data/countries")).unwrap();
    mock.fail(t, "connection refused");
    let done = client.poll();
    assert_eq!(done.len(), 1);
    assert!(matches!(done[0].1, Err(NetError::Network(_))));
}
