//! Requests and responses

use crate::NetError;
use serde_json::Value;
use std::collections::HashMap;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }

    /// Methods that never need a CSRF token
    pub fn is_safe(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Options)
    }
}

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    /// Single file part of a multipart form
    Multipart {
        field: String,
        filename: String,
        bytes: Vec<u8>,
    },
}

/// Request configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Absolute URL or a path relative to the client's base URL
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: Option<Body>,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: &str) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: &str) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_json(self, json: Value) -> Self {
        let mut req = self.with_header("Content-Type", "application/json");
        req.body = Some(Body::Json(json));
        req
    }

    pub fn with_file(mut self, field: &str, filename: &str, bytes: Vec<u8>) -> Self {
        self.body = Some(Body::Multipart {
            field: field.to_string(),
            filename: filename.to_string(),
            bytes,
        });
        self
    }

    /// Query parameter lookup (first match)
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// JSON body, if any
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Some(Body::Json(v)) => Some(v),
            _ => None,
        }
    }
}

/// HTTP Response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    /// JSON response with the matching content type
    pub fn json_body(status: u16, value: &Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".into(), "application/json".into())],
            body: value.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Canonical reason phrase of the status code (`Not Found`), empty if unknown
    pub fn status_text(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
    }

    /// Parse the body as JSON; an empty body parses as `null`
    pub fn json(&self) -> Result<Value, NetError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let req = Request::get("/data/countries").with_query("id", 12);
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.query_param("id"), Some("12"));
        assert!(req.body.is_none());
    }

    #[test]
    fn test_json_request() {
        let req = Request::put("/api/net/1").with_json(json!({"name": "x"}));
        assert_eq!(req.headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(req.json().unwrap()["name"], "x");
    }

    #[test]
    fn test_method_safety() {
        assert!(Method::Get.is_safe());
        assert!(!Method::Post.is_safe());
        assert!(!Method::Delete.is_safe());
        assert_eq!(Method::Put.as_str(), "PUT");
    }

    #[test]
    fn test_response_json() {
        let resp = Response::json_body(400, &json!({"name": ["required"]}));
        assert!(!resp.is_success());
        assert_eq!(resp.json().unwrap()["name"][0], "required");
        assert_eq!(Response::new(204, vec![]).json().unwrap(), Value::Null);
        assert!(Response::new(200, b"<html>".to_vec()).json().is_err());
    }

    #[test]
    fn test_status_text() {
        assert_eq!(Response::new(404, vec![]).status_text(), "Not Found");
        assert_eq!(Response::new(599, vec![]).status_text(), "");
    }
}
