//! HTTP Client
//!
//! Resolves relative paths against the configured base URL, attaches the
//! CSRF token to unsafe methods and hands requests to the transport.

use crate::{Completion, HttpTransport, NetError, Request, Ticket, Transport};
use std::time::Duration;
use url::Url;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Prefix for relative request paths
    pub base_url: String,
    /// User agent string
    pub user_agent: String,
    /// Request timeout (reqwest transport)
    pub request_timeout: Duration,
    /// Sent as `X-CSRFToken` on non-safe methods
    pub csrf_token: Option<String>,
    /// Default headers
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".into(),
            user_agent: concat!("tc-editable/", env!("CARGO_PKG_VERSION")).into(),
            request_timeout: Duration::from_secs(30),
            csrf_token: None,
            default_headers: Vec::new(),
        }
    }
}

/// HTTP client builder
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.config.base_url = url.to_string();
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.config.user_agent = ua.to_string();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn csrf_token(mut self, token: &str) -> Self {
        self.config.csrf_token = Some(token.to_string());
        self
    }

    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        self.config.default_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a client over an explicit transport
    pub fn build(self, transport: impl Transport + 'static) -> Result<Client, NetError> {
        Client::with_transport(self.config, transport)
    }

    /// Build a client over the reqwest transport
    pub fn build_http(self) -> Result<Client, NetError> {
        let transport = HttpTransport::new(&self.config)?;
        Client::with_transport(self.config, transport)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client
pub struct Client {
    config: ClientConfig,
    base: Url,
    transport: Box<dyn Transport>,
    next_ticket: u64,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self, NetError> {
        let base = Url::parse(&config.base_url).map_err(|e| NetError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        Ok(Self {
            config,
            base,
            transport: Box::new(transport),
            next_ticket: 1,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for a path or URL
    pub fn resolve(&self, url: &str) -> Result<Url, NetError> {
        match Url::parse(url) {
            Ok(u) => Ok(u),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .join(url)
                .map_err(|e| NetError::InvalidUrl(format!("{}: {}", url, e))),
            Err(e) => Err(NetError::InvalidUrl(format!("{}: {}", url, e))),
        }
    }

    /// Dispatch a request; the result arrives later under the returned ticket
    pub fn send(&mut self, mut req: Request) -> Result<Ticket, NetError> {
        req.url = self.resolve(&req.url)?.to_string();
        for (k, v) in &self.config.default_headers {
            req.headers.entry(k.clone()).or_insert_with(|| v.clone());
        }
        if !req.method.is_safe() {
            if let Some(token) = &self.config.csrf_token {
                req.headers.insert("X-CSRFToken".into(), token.clone());
            }
        }

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        tracing::info!("HTTP {} {} ({})", req.method.as_str(), req.url, ticket);
        self.transport.dispatch(ticket, req);
        Ok(ticket)
    }

    /// Completions available right now
    pub fn poll(&mut self) -> Vec<Completion> {
        self.transport.poll()
    }

    /// Block until the next completion
    pub fn wait(&mut self) -> Option<Completion> {
        self.transport.wait()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockTransport;

    #[test]
    fn test_relative_url_resolution() {
        let client = Client::builder().base_url("https://www.example.com").build(MockTransport::new()).unwrap();
        assert_eq!(client.resolve("/api/net/1").unwrap().as_str(), "https://www.example.com/api/net/1");
        assert_eq!(client.resolve("http://other.test/x").unwrap().as_str(), "http://other.test/x");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            Client::builder().base_url("not a url").build(MockTransport::new()),
            Err(NetError::InvalidUrl(_))
        ));
    }
}
