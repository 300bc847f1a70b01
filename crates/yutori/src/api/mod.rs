//! Request plumbing shared by the REST and n1 clients.
//!
//! - [`retry`]: transient error detection (429, 5xx, timeouts, dropped
//!   connections) with capped exponential backoff. Never retries 400/401.

pub mod retry;

pub use retry::{RetryConfig, with_retry};
