//! tc Networking
//!
//! Requests are dispatched through a `Transport` and complete later,
//! identified by a `Ticket`. Nothing here blocks the caller except
//! `Client::wait`.

mod client;
mod http;
mod mock;
mod request;
mod transport;

pub use client::{Client, ClientConfig, ClientBuilder};
pub use http::HttpTransport;
pub use mock::MockTransport;
pub use request::{Body, Method, Request, Response};
pub use transport::{Completion, Ticket, Transport};
pub use url::Url;

/// Network error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for NetError {
    fn from(e: serde_json::Error) -> Self {
        NetError::Json(e.to_string())
    }
}
