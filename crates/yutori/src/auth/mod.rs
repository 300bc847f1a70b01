//! Local API key storage and resolution.
//!
//! Keys live in `~/.yutori/config.json` (owner-only permissions). A key is
//! resolved in this order: explicit argument, the `YUTORI_API_KEY`
//! environment variable, then the config file. Browser-based login is not
//! provided here; `yutori auth set-key` stores a key obtained elsewhere.

pub mod credentials;
pub mod status;

pub use credentials::{
    CONFIG_DIR, CONFIG_FILE, CredentialStore, StoredConfig, is_real_key, resolve_api_key,
    resolve_api_key_from,
};
pub use status::{AuthStatus, KeySource, auth_status, auth_status_from, mask_key};
