//! Convenience re-exports for common `yutori` types.
//!
//! ```ignore
//! use yutori::prelude::*;
//! ```
//!
//! Pulls in the clients, message constructors, and the n1 agent-loop
//! helpers. Credential internals and retry tuning live in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{
    ChatCompletion, ChatRequest, ContentPart, DEFAULT_N1_MODEL, ImageUrl, Message,
    MessageContent, MessageRole, Result, ToolCall, YutoriError,
};

// ── Clients ─────────────────────────────────────────────────────────
pub use crate::client::YutoriClient;
pub use crate::config::ClientConfig;
pub use crate::n1::N1Client;

// ── n1 agent-loop helpers ───────────────────────────────────────────
pub use crate::n1::{
    TrimConfig, TrimOutcome, attach_screenshot, estimate_size, redact_for_log, trim_to_fit,
};
