//! Editor Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tc_net::ClientConfig;

/// Editor configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Prefix for every relative request path
    pub base_url: String,

    /// Sent as `X-CSRFToken` on non-safe methods
    pub csrf_token: Option<String>,

    /// User agent string
    pub user_agent: String,

    /// Transport request timeout
    pub request_timeout: Duration,

    /// Delay between Enter in an input and the container's enter action
    pub enter_action_delay: Duration,

    /// Autocomplete debounce
    pub autocomplete_delay: Duration,

    /// Characters needed before autocomplete queries
    pub autocomplete_min_chars: usize,

    /// Result page size of advanced search
    pub search_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            base_url: client.base_url,
            csrf_token: None,
            user_agent: client.user_agent,
            request_timeout: client.request_timeout,
            enter_action_delay: Duration::from_millis(100),
            autocomplete_delay: Duration::from_millis(250),
            autocomplete_min_chars: 2,
            search_limit: 250,
        }
    }
}

impl EditorConfig {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn csrf_token(mut self, token: &str) -> Self {
        self.csrf_token = Some(token.to_string());
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = ua.to_string();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn enter_action_delay(mut self, delay: Duration) -> Self {
        self.enter_action_delay = delay;
        self
    }

    pub fn autocomplete_delay(mut self, delay: Duration) -> Self {
        self.autocomplete_delay = delay;
        self
    }

    pub fn autocomplete_min_chars(mut self, n: usize) -> Self {
        self.autocomplete_min_chars = n;
        self
    }

    pub fn search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// HTTP client settings derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            request_timeout: self.request_timeout,
            csrf_token: self.csrf_token.clone(),
            ..ClientConfig::default()
        }
    }
}
