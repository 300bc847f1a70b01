//! Rust SDK for the [Yutori](https://yutori.com) API.
//!
//! The crate has two halves:
//!
//! - A thin REST client ([`client::YutoriClient`]) plus local credential
//!   handling ([`auth`]) and configuration ([`config`]).
//! - Helpers for building **n1** agent loops: an OpenAI-compatible chat
//!   client ([`n1::client::N1Client`]), screenshot utilities
//!   ([`n1::screenshot`]), and the payload fitter ([`n1::payload`]) that
//!   keeps a screenshot-heavy conversation under the API's request-size
//!   ceiling.
//!
//! # Getting started
//!
//! ```ignore
//! use yutori::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> yutori::Result<()> {
//!     let client = YutoriClient::new(ClientConfig::default())?;
//!     let n1 = client.n1()?;
//!
//!     let mut messages = vec![Message::user("List the team member names")];
//!     attach_screenshot(&mut messages[0], &screenshot_b64, "https://www.yutori.com");
//!
//!     // Drops old screenshots if needed, then sends the request.
//!     let completion = n1.step(&mut messages, DEFAULT_N1_MODEL, Some(0.3)).await?;
//!     messages.push(completion.to_message());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`n1`] | Payload fitting, screenshot helpers, n1 chat client |
//! | [`client`] | REST client and shared response handling |
//! | [`auth`] | Credential file, API key resolution, auth status |
//! | [`api`] | Retry with backoff |
//! | [`config`] | Base URL, timeouts, [`ClientConfig`](config::ClientConfig) |

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod n1;
pub mod prelude;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

pub use error::{Result, YutoriError};

// ── Constants ──────────────────────────────────────────────────────

/// Default n1 model.
pub const DEFAULT_N1_MODEL: &str = "n1-latest";

/// Wire tag of text content parts.
pub const TEXT_PART_TYPE: &str = "text";

/// Wire tag of image content parts.
pub const IMAGE_PART_TYPE: &str = "image_url";

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body (OpenAI-compatible).
#[derive(Serialize, Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
///
/// Roles the SDK does not know about are kept verbatim in `Other`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
            MessageRole::Other(role) => write!(f, "{role}"),
        }
    }
}

/// Image reference carried by an `image_url` content part.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImageUrl {
    /// A `data:` URI or a remote URL.
    pub url: String,
    /// Quality hint (`"low"`, `"high"`, `"auto"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One element of a multi-part message body.
///
/// Parts with exactly the fields the SDK models are decoded into `Text` or
/// `Image`. Anything else, including a `text`/`image_url` part carrying
/// extra keys, is kept as raw JSON in [`ContentPart::Other`] and serialized
/// back unchanged. Classification goes by the `type` tag alone, so a raw
/// part tagged `image_url` still counts as an image.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentPart {
    Text { text: String },
    Image(ImageUrl),
    Other(serde_json::Value),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::Image(ImageUrl {
            url: url.into(),
            detail: None,
        })
    }

    pub fn image_url_with_detail(url: impl Into<String>, detail: impl Into<String>) -> Self {
        ContentPart::Image(ImageUrl {
            url: url.into(),
            detail: Some(detail.into()),
        })
    }

    /// The part's `type` tag.
    pub fn part_type(&self) -> Option<&str> {
        match self {
            ContentPart::Text { .. } => Some(TEXT_PART_TYPE),
            ContentPart::Image(_) => Some(IMAGE_PART_TYPE),
            ContentPart::Other(value) => value.get("type").and_then(|t| t.as_str()),
        }
    }

    pub fn is_text(&self) -> bool {
        self.part_type() == Some(TEXT_PART_TYPE)
    }

    pub fn is_image(&self) -> bool {
        self.part_type() == Some(IMAGE_PART_TYPE)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            ContentPart::Other(value) if self.is_text() => {
                value.get("text").and_then(|t| t.as_str())
            }
            _ => None,
        }
    }
}

impl Serialize for ContentPart {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ContentPart::Text { text } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", TEXT_PART_TYPE)?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            ContentPart::Image(image) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", IMAGE_PART_TYPE)?;
                map.serialize_entry("image_url", image)?;
                map.end()
            }
            ContentPart::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ContentPart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(ContentPart::from_value(value))
    }
}

impl ContentPart {
    fn from_value(value: serde_json::Value) -> Self {
        let Some(obj) = value.as_object() else {
            return ContentPart::Other(value);
        };
        // Parts with fields beyond the ones we model stay raw so they
        // serialize back with every key intact.
        match obj.get("type").and_then(|t| t.as_str()) {
            Some(TEXT_PART_TYPE) if obj.len() == 2 => match obj.get("text") {
                Some(serde_json::Value::String(text)) => ContentPart::Text { text: text.clone() },
                _ => ContentPart::Other(value),
            },
            Some(IMAGE_PART_TYPE) if obj.len() == 2 => {
                match obj
                    .get("image_url")
                    .cloned()
                    .map(serde_json::from_value::<ImageUrl>)
                {
                    Some(Ok(image)) => ContentPart::Image(image),
                    _ => ContentPart::Other(value),
                }
            }
            _ => ContentPart::Other(value),
        }
    }
}

/// Message body: a plain string, or an ordered list of parts.
///
/// Any other JSON value is kept in `Other` and never trimmed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Other(serde_json::Value),
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Fields not modeled above (`name`, provider extensions), passed
    /// through as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    fn with_content(role: MessageRole, content: MessageContent) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_content(MessageRole::System, MessageContent::Text(content.into()))
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_content(MessageRole::User, MessageContent::Text(content.into()))
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::with_content(MessageRole::User, MessageContent::Parts(parts))
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::with_content(MessageRole::Assistant, MessageContent::Text(content.into()))
    }

    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::with_content(MessageRole::Tool, MessageContent::Text(content.into()))
        }
    }

    /// Tool result carrying a part list, typically text plus a screenshot.
    pub fn tool_parts(call_id: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::with_content(MessageRole::Tool, MessageContent::Parts(parts))
        }
    }

    /// The part list, if the body is in list form.
    pub fn parts(&self) -> Option<&[ContentPart]> {
        match &self.content {
            Some(MessageContent::Parts(parts)) => Some(parts),
            _ => None,
        }
    }

    /// Whether the body is a part list containing at least one image.
    pub fn has_image(&self) -> bool {
        n1::payload::has_image(self)
    }
}

// ── Tool call types ────────────────────────────────────────────────

/// The type of a tool call. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum CallType {
    #[serde(rename = "function")]
    Function,
}

/// A tool call returned by the model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub function: FunctionCallData,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionCallData {
    pub name: String,
    /// JSON-encoded arguments, as sent by the model.
    pub arguments: String,
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
pub(crate) struct RawChatResponse {
    pub(crate) choices: Option<Vec<RawChoice>>,
    #[serde(default)]
    pub(crate) usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RawChoice {
    pub(crate) message: RawResponseMessage,
    pub(crate) finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RawResponseMessage {
    pub(crate) content: Option<String>,
    pub(crate) tool_calls: Option<Vec<ToolCall>>,
}

/// Clean return type from [`N1Client::chat`](n1::client::N1Client::chat).
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// The assistant turn to append to the history before executing tools.
    pub fn to_message(&self) -> Message {
        Message {
            role: MessageRole::Assistant,
            content: self.content.clone().map(MessageContent::Text),
            tool_calls: if self.tool_calls.is_empty() {
                None
            } else {
                Some(self.tool_calls.clone())
            },
            tool_call_id: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl From<RawChatResponse> for ChatCompletion {
    fn from(raw: RawChatResponse) -> Self {
        match raw.choices.and_then(|c| c.into_iter().next()) {
            Some(choice) => ChatCompletion {
                content: choice.message.content,
                tool_calls: choice.message.tool_calls.unwrap_or_default(),
                usage: raw.usage,
                finish_reason: choice.finish_reason,
            },
            None => ChatCompletion {
                usage: raw.usage,
                ..Default::default()
            },
        }
    }
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, Some(MessageContent::Text("hello".into())));

        let user = Message::user_parts(vec![ContentPart::text("look")]);
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.parts().map(|p| p.len()), Some(1));

        let tool = Message::tool_result("call-1", "result");
        assert_eq!(tool.role, MessageRole::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call-1"));
        assert!(tool.parts().is_none());
    }

    #[test]
    fn content_parts_use_openai_wire_format() {
        let msg = Message::user_parts(vec![
            ContentPart::text("caption"),
            ContentPart::image_url_with_detail("data:image/webp;base64,AAAA", "high"),
        ]);
        let encoded = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            encoded,
            r#"{"role":"user","content":[{"type":"text","text":"caption"},{"type":"image_url","image_url":{"url":"data:image/webp;base64,AAAA","detail":"high"}}]}"#
        );
    }

    #[test]
    fn unknown_parts_pass_through_unchanged() {
        let raw = json!({
            "role": "tool",
            "tool_call_id": "c1",
            "content": [
                {"type": "input_audio", "input_audio": {"data": "xyz", "format": "wav"}},
                {"type": "text", "text": "ok"},
            ]
        });
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();
        let parts = msg.parts().unwrap();
        assert!(matches!(parts[0], ContentPart::Other(_)));
        assert_eq!(parts[1].as_text(), Some("ok"));
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn image_tag_alone_decides_image() {
        let raw = json!({"role": "user", "content": [
            {
                "type": "image_url",
                "image_url": {"url": "data:x"},
                "cache_control": {"type": "ephemeral"}
            },
            {"type": "image_url", "image_url": {"url": "data:y", "format": "image/webp"}},
            {"type": "image_url", "image_url": 42},
        ]});
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();
        let parts = msg.parts().unwrap();
        assert!(parts.iter().all(|p| matches!(p, ContentPart::Other(_))));
        assert!(parts.iter().all(ContentPart::is_image));
        assert!(msg.has_image());
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn text_part_with_extra_keys_is_text() {
        let part: ContentPart = serde_json::from_value(json!({
            "type": "text",
            "text": "step 3",
            "cache_control": {"type": "ephemeral"}
        }))
        .unwrap();
        assert!(matches!(part, ContentPart::Other(_)));
        assert!(part.is_text());
        assert!(!part.is_image());
        assert_eq!(part.as_text(), Some("step 3"));
        assert_eq!(part.part_type(), Some("text"));
    }

    #[test]
    fn unmodeled_message_fields_pass_through() {
        let raw = r#"[{"role":"user","name":"alice","content":"hi"}]"#;
        let msgs: Vec<Message> = serde_json::from_str(raw).unwrap();
        assert_eq!(msgs[0].extra["name"], "alice");
        assert_eq!(serde_json::to_vec(&msgs).unwrap().len(), raw.len());
        assert_eq!(
            serde_json::to_value(&msgs).unwrap(),
            serde_json::from_str::<serde_json::Value>(raw).unwrap()
        );
    }

    #[test]
    fn odd_content_does_not_fail_the_list() {
        let raw = json!([
            {"role": "user", "content": 42},
            {"role": "user", "content": {"unexpected": true}},
            {"role": "user", "content": "ok"},
        ]);
        let msgs: Vec<Message> = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msgs[0].content, Some(MessageContent::Other(json!(42))));
        assert!(msgs[1].parts().is_none());
        assert!(!msgs[1].has_image());
        assert_eq!(msgs[2].content, Some(MessageContent::Text("ok".into())));
        assert_eq!(serde_json::to_value(&msgs).unwrap(), raw);
    }

    #[test]
    fn unknown_role_round_trips() {
        let raw = json!({"role": "developer", "content": "be brief"});
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.role, MessageRole::Other("developer".into()));
        assert_eq!(msg.role.to_string(), "developer");
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn chat_request_skips_unset_fields() {
        let req = ChatRequest::new(DEFAULT_N1_MODEL, vec![Message::user("hi")]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "n1-latest");
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn completion_to_message_carries_tool_calls() {
        let raw: RawChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "left_click", "arguments": "{\"coordinates\":[10,20]}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();
        let completion = ChatCompletion::from(raw);
        let msg = completion.to_message();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(msg.content.is_none());
        assert_eq!(msg.tool_calls.unwrap()[0].function.name, "left_click");
    }
}
