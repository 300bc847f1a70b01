//! Helpers for building agent loops on the n1 pixels-to-actions model.
//!
//! - [`payload`]: keeps the growing conversation under the request-size
//!   ceiling by dropping old screenshots, oldest first.
//! - [`screenshot`]: builds screenshot parts and log-safe message copies.
//! - [`client`]: [`N1Client`] for OpenAI-compatible chat completions, with
//!   retry and automatic payload fitting per step.

pub mod client;
pub mod payload;
pub mod screenshot;

pub use client::N1Client;
pub use payload::{
    DEFAULT_KEEP_RECENT_SCREENSHOTS, DEFAULT_MAX_REQUEST_BYTES, SCREENSHOT_OMITTED, TrimConfig,
    TrimOutcome, estimate_size, has_image, locate_image_indices, strip_one_image, trim_to_fit,
};
pub use screenshot::{attach_screenshot, clip_image_url, redact_for_log};
