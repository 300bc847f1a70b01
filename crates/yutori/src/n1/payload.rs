//! Payload fitting: drop old screenshots until a request fits the size limit.
//!
//! Every step of an n1 agent loop appends a tool result carrying a fresh
//! screenshot, so the request body grows by a few hundred kilobytes per
//! step until the API rejects it. [`trim_to_fit`] removes screenshots
//! oldest-first, in place, until the serialized history is under
//! [`TrimConfig::max_bytes`]:
//!
//! 1. **Age-ordered pass.** Images outside the `keep_recent` most recent
//!    image-bearing messages are stripped, oldest first.
//! 2. **Emergency pass.** If that was not enough, every image except the
//!    one in the most recent image-bearing message is eligible.
//!
//! The latest screenshot is never removed, so the model always sees the
//! current page. Messages are never added, removed or reordered; only the
//! content parts of image-bearing messages change.

use std::io;

use crate::{ContentPart, Message, MessageContent};

/// Default request-size ceiling, just under the API's 10 MB limit.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 9_500_000;

/// Default number of recent screenshots protected during the first pass.
pub const DEFAULT_KEEP_RECENT_SCREENSHOTS: usize = 6;

/// Text left behind when a message loses its only content.
pub const SCREENSHOT_OMITTED: &str = "Screenshot omitted to stay under request size limit.";

/// Configuration for [`trim_to_fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimConfig {
    /// Target ceiling on the serialized size, in bytes.
    pub max_bytes: usize,
    /// Number of most recent image-bearing messages protected in the
    /// age-ordered pass. Values below 1 are treated as 1.
    pub keep_recent: usize,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_REQUEST_BYTES,
            keep_recent: DEFAULT_KEEP_RECENT_SCREENSHOTS,
        }
    }
}

impl TrimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_keep_recent(mut self, keep_recent: usize) -> Self {
        self.keep_recent = keep_recent;
        self
    }
}

/// Result of a [`trim_to_fit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimOutcome {
    /// Serialized size of the history after trimming. May still exceed
    /// `max_bytes` when the remaining content is too large on its own.
    pub size_bytes: usize,
    /// Number of image parts removed across both passes.
    pub images_removed: usize,
}

impl TrimOutcome {
    pub fn trimmed(&self) -> bool {
        self.images_removed > 0
    }

    pub fn fits(&self, max_bytes: usize) -> bool {
        self.size_bytes <= max_bytes
    }

    pub fn into_tuple(self) -> (usize, usize) {
        (self.size_bytes, self.images_removed)
    }
}

impl std::fmt::Display for TrimOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "trimmed {} screenshot(s); payload ~{:.2} MB",
            self.images_removed,
            self.size_bytes as f64 / (1024.0 * 1024.0)
        )
    }
}

// ── Size estimation ────────────────────────────────────────────────

/// `io::Write` sink that only counts bytes.
#[derive(Default)]
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn serialized_len<T: serde::Serialize + ?Sized>(value: &T) -> usize {
    let mut counter = ByteCounter::default();
    // Writing to ByteCounter cannot fail, and these types have no
    // non-string map keys, so serialization always completes.
    let _ = serde_json::to_writer(&mut counter, value);
    counter.0
}

/// Byte length of the compact JSON encoding of `messages`, exactly as it
/// is sent in the request body. An empty list is 2 bytes (`[]`).
pub fn estimate_size(messages: &[Message]) -> usize {
    serialized_len(messages)
}

// ── Image location ─────────────────────────────────────────────────

/// Whether the message body is a part list containing a part tagged
/// `image_url`.
///
/// String bodies, missing bodies and empty part lists return `false`.
pub fn has_image(message: &Message) -> bool {
    message
        .parts()
        .is_some_and(|parts| parts.iter().any(ContentPart::is_image))
}

/// Indices of all image-bearing messages, oldest first.
pub fn locate_image_indices(messages: &[Message]) -> Vec<usize> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| has_image(m))
        .map(|(i, _)| i)
        .collect()
}

// ── Stripping ──────────────────────────────────────────────────────

/// Remove the first image part of `message` in place.
///
/// If no text part remains afterwards, a single [`SCREENSHOT_OMITTED`]
/// text part is appended so the message stays a valid turn. Returns
/// `false` without touching the message when the body is not a part list
/// or holds no image.
pub fn strip_one_image(message: &mut Message) -> bool {
    let Some(MessageContent::Parts(parts)) = &mut message.content else {
        return false;
    };
    let Some(pos) = parts.iter().position(ContentPart::is_image) else {
        return false;
    };

    parts.remove(pos);
    if !parts.iter().any(ContentPart::is_text) {
        parts.push(ContentPart::text(SCREENSHOT_OMITTED));
    }
    true
}

// ── Orchestration ──────────────────────────────────────────────────

/// Running size of a message list, updated one message at a time.
///
/// The list encodes as `[` + elements joined by `,` + `]`, so replacing
/// one element changes the total by exactly the change in that element's
/// encoding.
struct SizeTracker {
    total: usize,
}

impl SizeTracker {
    fn strip(&mut self, message: &mut Message) -> bool {
        let before = serialized_len(message);
        if !strip_one_image(message) {
            return false;
        }
        let after = serialized_len(message);
        self.total = self.total - before + after;
        true
    }
}

/// Strip screenshots from `messages` until the payload fits `config.max_bytes`.
///
/// Returns the final size and the number of images removed. If the
/// history already fits, or contains no images, nothing is changed. The
/// image in the most recent image-bearing message always survives, so the
/// result can still be over budget; the caller decides what to do then.
pub fn trim_to_fit(messages: &mut [Message], config: &TrimConfig) -> TrimOutcome {
    let max_bytes = config.max_bytes;
    let mut size = SizeTracker {
        total: estimate_size(messages),
    };
    if size.total <= max_bytes {
        return TrimOutcome {
            size_bytes: size.total,
            images_removed: 0,
        };
    }

    let image_indices = locate_image_indices(messages);
    let Some((_latest, older)) = image_indices.split_last() else {
        return TrimOutcome {
            size_bytes: size.total,
            images_removed: 0,
        };
    };

    let keep_recent = config.keep_recent.max(1);
    let unprotected = &image_indices[..image_indices.len().saturating_sub(keep_recent)];
    let mut removed = 0;

    // Age-ordered pass: images outside the protected window.
    for &idx in unprotected {
        if size.total <= max_bytes {
            break;
        }
        if size.strip(&mut messages[idx]) {
            removed += 1;
        }
    }

    // Emergency pass: everything except the latest screenshot.
    if size.total > max_bytes {
        for &idx in older {
            if size.total <= max_bytes {
                break;
            }
            if size.strip(&mut messages[idx]) {
                removed += 1;
            }
        }
    }

    TrimOutcome {
        size_bytes: size.total,
        images_removed: removed,
    }
}
