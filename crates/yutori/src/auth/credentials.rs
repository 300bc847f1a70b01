//! Credential file handling.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::API_KEY_ENV;
use crate::error::{Result, YutoriError};

/// Directory under `$HOME` holding the config file.
pub const CONFIG_DIR: &str = ".yutori";

/// Config file name.
pub const CONFIG_FILE: &str = "config.json";

/// Values treated as "no key" even though they are non-empty.
const PLACEHOLDER_KEYS: &[&str] = &["YOUR_API_KEY"];

/// Contents of the config file. Unknown fields are preserved on rewrite.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Location of the config file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store backed by an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.yutori/config.json`.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| YutoriError::Config("cannot determine home directory".into()))?;
        Ok(Self::new(home.join(CONFIG_DIR).join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config file.
    ///
    /// A missing, unreadable, corrupt or non-object file yields `None`.
    pub fn load(&self) -> Option<StoredConfig> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {e}", self.path.display());
                }
                return None;
            }
        };
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value @ serde_json::Value::Object(_)) => serde_json::from_value(value).ok(),
            Ok(_) => {
                debug!("Ignoring {}: not a JSON object", self.path.display());
                None
            }
            Err(e) => {
                debug!("Ignoring {}: {e}", self.path.display());
                None
            }
        }
    }

    /// The stored key, if it is a real one.
    pub fn api_key(&self) -> Option<String> {
        self.load()
            .and_then(|c| c.api_key)
            .filter(|k| is_real_key(Some(k.as_str())))
    }

    /// Write `api_key` to the config file, keeping any other fields.
    ///
    /// The directory is created owner-only (0700) and the file is written
    /// to a temp file in the same directory, restricted to 0600, then
    /// renamed over the target so readers never see a partial file.
    pub fn save(&self, api_key: &str) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| YutoriError::Config("config path has no parent directory".into()))?;
        fs::create_dir_all(dir)?;
        set_mode(dir, 0o700)?;

        let mut config = self.load().unwrap_or_default();
        config.api_key = Some(api_key.to_string());
        let content = serde_json::to_string_pretty(&config)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".config_")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        set_mode(tmp.path(), 0o600)?;
        tmp.persist(&self.path).map_err(|e| YutoriError::Io(e.error))?;

        debug!("Saved API key to {}", self.path.display());
        Ok(())
    }

    /// Delete the config file. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Whether `key` looks like an actual API key.
///
/// Empty, whitespace-only, and placeholder values count as missing.
pub fn is_real_key(key: Option<&str>) -> bool {
    match key.map(str::trim) {
        Some(k) => !k.is_empty() && !PLACEHOLDER_KEYS.contains(&k),
        None => false,
    }
}

/// Resolve the API key: explicit argument, then `YUTORI_API_KEY`, then the
/// config file in `store`.
pub fn resolve_api_key(explicit: Option<&str>, store: Option<&CredentialStore>) -> Option<String> {
    resolve_api_key_from(explicit, std::env::var(API_KEY_ENV).ok(), store)
}

/// [`resolve_api_key`] with the environment value passed in.
pub fn resolve_api_key_from(
    explicit: Option<&str>,
    env_key: Option<String>,
    store: Option<&CredentialStore>,
) -> Option<String> {
    if is_real_key(explicit) {
        return explicit.map(str::to_string);
    }
    if is_real_key(env_key.as_deref()) {
        return env_key;
    }
    store.and_then(CredentialStore::api_key)
}
