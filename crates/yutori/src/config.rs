//! Client configuration with sensible defaults.
//!
//! [`ClientConfig`] carries everything needed to build a
//! [`YutoriClient`](crate::client::YutoriClient) or an
//! [`N1Client`](crate::n1::client::N1Client).

use std::time::Duration;

/// Base URL of the Yutori API.
pub const DEFAULT_BASE_URL: &str = "https://api.yutori.com/v1";

/// Timeout for REST calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for n1 chat completions. Screenshot-heavy requests are slow.
pub const DEFAULT_N1_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "YUTORI_API_KEY";

/// Strip trailing slashes so paths can be appended with `format!("{base}/...")`.
pub fn sanitize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Configuration for the Yutori clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Explicit API key. When `None`, the key is resolved from the
    /// environment and the local credential file.
    pub api_key: Option<String>,
    /// API base URL. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,
    /// Request timeout for REST calls. Default: 30 s.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = sanitize_base_url(url.as_ref());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
