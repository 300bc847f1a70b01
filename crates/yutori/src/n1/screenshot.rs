//! Screenshot helpers for n1 agent loops.
//!
//! The agent attaches a screenshot of the current page to the latest
//! message before every model call. These helpers build that part and
//! produce log-friendly copies of messages with the base64 payload clipped.

use crate::{ContentPart, ImageUrl, Message, MessageContent};

/// Detail hint sent with screenshots.
pub const SCREENSHOT_DETAIL: &str = "high";

/// Default maximum length of an image URL in log output.
pub const LOG_URL_MAX_LEN: usize = 50;

impl ContentPart {
    /// An `image_url` part holding a base64-encoded WebP screenshot.
    pub fn screenshot_webp(base64: &str) -> Self {
        ContentPart::image_url_with_detail(
            format!("data:image/webp;base64,{base64}"),
            SCREENSHOT_DETAIL,
        )
    }
}

/// Append a screenshot to `message`.
///
/// A message with no body yet (or an empty part list) first gets a
/// `Current URL: ...` text part so the model knows where it is. A plain
/// string body becomes the first text part.
pub fn attach_screenshot(message: &mut Message, base64: &str, current_url: &str) {
    let mut parts = match message.content.take() {
        Some(MessageContent::Parts(parts)) => parts,
        Some(MessageContent::Text(text)) => vec![ContentPart::text(text)],
        Some(MessageContent::Other(value)) => vec![ContentPart::Other(value)],
        None => Vec::new(),
    };
    if parts.is_empty() {
        parts.push(ContentPart::text(format!("Current URL: {current_url}")));
    }
    parts.push(ContentPart::screenshot_webp(base64));
    message.content = Some(MessageContent::Parts(parts));
}

/// Shorten an image URL for logging.
///
/// Data URIs keep their `data:...;base64,` prefix plus 20 characters of
/// payload; other URLs are cut at `max_len`.
pub fn clip_image_url(url: &str, max_len: usize) -> String {
    if url.starts_with("data:image")
        && let Some(comma) = url.find(',')
    {
        let prefix_end = comma + 1;
        if url.len() > prefix_end + max_len {
            let keep: String = url.chars().take(prefix_end + 20).collect();
            return format!("{keep}...[clipped]");
        }
    }
    if url.chars().count() <= max_len {
        url.to_string()
    } else {
        let keep: String = url.chars().take(max_len).collect();
        format!("{keep}...")
    }
}

/// Copy of `message` with every image URL clipped, for log output.
pub fn redact_for_log(message: &Message) -> Message {
    let mut copy = message.clone();
    if let Some(MessageContent::Parts(parts)) = &mut copy.content {
        for part in parts.iter_mut() {
            match part {
                ContentPart::Image(ImageUrl { url, .. }) => {
                    *url = clip_image_url(url, LOG_URL_MAX_LEN);
                }
                ContentPart::Other(value) => {
                    if let Some(serde_json::Value::String(url)) =
                        value.pointer_mut("/image_url/url")
                    {
                        *url = clip_image_url(url, LOG_URL_MAX_LEN);
                    }
                }
                ContentPart::Text { .. } => {}
            }
        }
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screenshot_part_is_high_detail_webp() {
        let part = ContentPart::screenshot_webp("QUJD");
        assert_eq!(
            part,
            ContentPart::Image(ImageUrl {
                url: "data:image/webp;base64,QUJD".into(),
                detail: Some("high".into()),
            })
        );
    }

    #[test]
    fn attach_to_empty_message_adds_current_url() {
        let mut msg = Message::tool_parts("call_1", vec![]);
        attach_screenshot(&mut msg, "QUJD", "https://www.yutori.com");
        let parts = msg.parts().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].as_text(), Some("Current URL: https://www.yutori.com"));
        assert!(parts[1].is_image());
    }

    #[test]
    fn attach_keeps_existing_text() {
        let mut msg = Message::user("List the team member names");
        attach_screenshot(&mut msg, "QUJD", "https://www.yutori.com");
        let parts = msg.parts().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].as_text(), Some("List the team member names"));
        assert!(msg.has_image());
    }

    #[test]
    fn clip_data_uri() {
        let url = format!("data:image/webp;base64,{}", "A".repeat(200));
        let clipped = clip_image_url(&url, 50);
        assert_eq!(
            clipped,
            format!("data:image/webp;base64,{}...[clipped]", "A".repeat(20))
        );
    }

    #[test]
    fn short_urls_are_untouched() {
        assert_eq!(clip_image_url("https://a.b/c.png", 50), "https://a.b/c.png");
        let short_data = "data:image/png;base64,AAAA";
        assert_eq!(clip_image_url(short_data, 50), short_data);
    }

    #[test]
    fn long_remote_url_is_cut() {
        let url = format!("https://example.com/{}", "x".repeat(100));
        let clipped = clip_image_url(&url, 50);
        assert!(clipped.ends_with("..."));
        assert_eq!(clipped.len(), 53);
    }

    #[test]
    fn redact_leaves_original_intact() {
        let mut msg = Message::user("go");
        attach_screenshot(&mut msg, &"Z".repeat(500), "https://x.y");
        let redacted = redact_for_log(&msg);
        assert!(serde_json::to_string(&redacted).unwrap().contains("[clipped]"));
        assert!(!serde_json::to_string(&msg).unwrap().contains("[clipped]"));
    }

    #[test]
    fn redact_clips_images_with_extra_keys() {
        let url = format!("data:image/webp;base64,{}", "Q".repeat(300));
        let part: ContentPart = serde_json::from_value(serde_json::json!({
            "type": "image_url",
            "image_url": {"url": url, "format": "image/webp"},
        }))
        .unwrap();
        let redacted = redact_for_log(&Message::user_parts(vec![part]));
        let encoded = serde_json::to_string(&redacted).unwrap();
        assert!(encoded.contains("[clipped]"));
        assert!(encoded.contains("\"format\":\"image/webp\""));
    }

    #[test]
    fn attach_to_odd_content_keeps_it() {
        let mut msg: Message =
            serde_json::from_value(serde_json::json!({"role": "user", "content": 7})).unwrap();
        attach_screenshot(&mut msg, "QUJD", "https://x.y");
        let parts = msg.parts().unwrap();
        assert_eq!(parts[0], ContentPart::Other(serde_json::json!(7)));
        assert!(parts[1].is_image());
    }
}
