//! REST client for the Yutori API and the response mapping shared with
//! [`N1Client`].

use std::time::Instant;

use reqwest::StatusCode;
use tracing::debug;

use crate::auth::{CredentialStore, resolve_api_key};
use crate::config::{ClientConfig, sanitize_base_url};
use crate::error::{Result, YutoriError};
use crate::n1::N1Client;

const USER_AGENT: &str = concat!("yutori-rs/", env!("CARGO_PKG_VERSION"));

/// Map an HTTP response to JSON or a [`YutoriError`].
///
/// 401 becomes [`YutoriError::Authentication`], any other status ≥ 400
/// becomes [`YutoriError::Api`] with the body as message. An empty
/// successful body yields `{}`.
pub async fn handle_response(resp: reqwest::Response) -> Result<serde_json::Value> {
    let status = resp.status();
    let text = resp.text().await?;
    check_status(status, &text)?;
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    Ok(serde_json::from_str(&text)?)
}

pub(crate) fn check_status(status: StatusCode, body: &str) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(YutoriError::Authentication(
            "Invalid or missing API key".to_string(),
        ));
    }
    if status.is_client_error() || status.is_server_error() {
        let message = if body.is_empty() {
            "Yutori API call failed".to_string()
        } else {
            body.to_string()
        };
        return Err(YutoriError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(())
}

/// Client for the Yutori REST API.
pub struct YutoriClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YutoriClient {
    /// Build a client, resolving the API key from `config`, the
    /// `YUTORI_API_KEY` environment variable, or `~/.yutori/config.json`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let store = CredentialStore::default_location().ok();
        let api_key = resolve_api_key(config.api_key.as_deref(), store.as_ref()).ok_or_else(|| {
            YutoriError::Authentication(
                "No API key provided. Pass api_key or set the YUTORI_API_KEY environment variable."
                    .to_string(),
            )
        })?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: sanitize_base_url(&config.base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// An [`N1Client`] sharing this client's base URL and API key.
    pub fn n1(&self) -> Result<N1Client> {
        N1Client::new(&self.base_url, &self.api_key)
    }

    async fn get(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");
        let start = Instant::now();
        let resp = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        debug!(
            "GET {path}: HTTP {} in {:.1}s",
            resp.status(),
            start.elapsed().as_secs_f64()
        );
        handle_response(resp).await
    }

    /// Usage statistics for the current API key (`GET /usage`).
    pub async fn usage(&self) -> Result<serde_json::Value> {
        self.get("/usage").await
    }
}
