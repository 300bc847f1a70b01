//! Authentication status reporting.

use std::fmt;

use crate::auth::credentials::{CredentialStore, is_real_key};
use crate::config::API_KEY_ENV;

/// Where the active API key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    EnvVar,
    ConfigFile,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::EnvVar => write!(f, "env_var"),
            KeySource::ConfigFile => write!(f, "config_file"),
        }
    }
}

/// Current authentication status. Never contains the full key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub masked_key: Option<String>,
    pub source: Option<KeySource>,
    pub config_path: String,
}

/// Mask an API key for display.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(4).collect();
    if chars.len() >= 16 {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else if chars.len() >= 8 {
        format!("{head}...")
    } else {
        "***".to_string()
    }
}

/// Authentication status, reading `YUTORI_API_KEY` from the environment.
///
/// Precedence matches [`resolve_api_key`](super::resolve_api_key): the
/// environment variable wins over the config file.
pub fn auth_status(store: &CredentialStore) -> AuthStatus {
    auth_status_from(std::env::var(API_KEY_ENV).ok(), store)
}

/// [`auth_status`] with the environment value passed in.
pub fn auth_status_from(env_key: Option<String>, store: &CredentialStore) -> AuthStatus {
    let config_path = store.path().display().to_string();

    if let Some(key) = env_key.filter(|k| is_real_key(Some(k.as_str()))) {
        return AuthStatus {
            authenticated: true,
            masked_key: Some(mask_key(&key)),
            source: Some(KeySource::EnvVar),
            config_path,
        };
    }

    if let Some(key) = store.api_key() {
        return AuthStatus {
            authenticated: true,
            masked_key: Some(mask_key(&key)),
            source: Some(KeySource::ConfigFile),
            config_path,
        };
    }

    AuthStatus {
        authenticated: false,
        masked_key: None,
        source: None,
        config_path,
    }
}
