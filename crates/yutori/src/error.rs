//! Error type shared by the REST client, the n1 client, and credential storage.
//!
//! The payload fitter in [`n1::payload`](crate::n1::payload) never fails and
//! does not use this type.

use thiserror::Error;

/// Errors returned by the Yutori SDK.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum YutoriError {
    /// The API key is missing, or the server rejected it (HTTP 401).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The API answered with a non-successful status.
    #[error("Yutori API HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local configuration problem (bad base URL, no home directory, ...).
    #[error("configuration error: {0}")]
    Config(String),
}

impl YutoriError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            YutoriError::Api { status, .. } => Some(*status),
            YutoriError::Authentication(_) => None,
            YutoriError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Rate limits, gateway errors, timeouts and dropped connections are
    /// transient. Bad requests and auth failures never are.
    pub fn is_transient(&self) -> bool {
        match self {
            YutoriError::Api { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            YutoriError::Http(e) => {
                if let Some(status) = e.status() {
                    return matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504);
                }
                e.is_timeout() || e.is_connect() || e.is_body()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, YutoriError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_and_rate_limit_statuses_are_transient() {
        for status in [429, 500, 502, 503, 504] {
            let err = YutoriError::Api {
                status,
                message: "busy".into(),
            };
            assert!(err.is_transient(), "HTTP {status} should be transient");
        }
    }

    #[test]
    fn client_errors_are_permanent() {
        for status in [400, 403, 404, 422] {
            let err = YutoriError::Api {
                status,
                message: "nope".into(),
            };
            assert!(!err.is_transient(), "HTTP {status} should not be retried");
        }
        assert!(!YutoriError::Authentication("bad key".into()).is_transient());
        assert!(!YutoriError::Config("no home".into()).is_transient());
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = YutoriError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "Yutori API HTTP 503: overloaded");
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn builder_errors_are_permanent() {
        let err: YutoriError = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err()
            .into();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn refused_connection_is_transient() {
        // Nothing listens on the discard port.
        let err: YutoriError = reqwest::Client::new()
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .unwrap_err()
            .into();
        assert!(err.is_transient());
    }
}
