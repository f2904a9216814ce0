//! Message and prompt types.

use serde::{Deserialize, Serialize};

/// Provider/model pair used when prompting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelRef {
    /// Provider ID (e.g. `anthropic`, `openai`).
    #[serde(rename = "providerID")]
    pub provider_id: String,
    /// Model ID (e.g. `claude-3-5-sonnet-20241022`).
    #[serde(rename = "modelID")]
    pub model_id: String,
}

impl ModelRef {
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
        }
    }
}

/// One input part of a prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptPart {
    /// Plain text.
    Text { text: String },
}

/// Request body for `POST /session/{id}/message` and `prompt_async`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptRequest {
    pub parts: Vec<PromptPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelRef>,
    /// Client-chosen message ID.
    #[serde(rename = "messageID", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Record the message without asking the model for a reply.
    #[serde(rename = "noReply", default, skip_serializing_if = "Option::is_none")]
    pub no_reply: Option<bool>,
}

impl PromptRequest {
    /// Single text part, no model override.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![PromptPart::Text { text: text.into() }],
            model: None,
            message_id: None,
            no_reply: None,
        }
    }

    pub fn with_model(mut self, model: ModelRef) -> Self {
        self.model = Some(model);
        self
    }
}

/// Message timestamps in Unix milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<i64>,
}

/// Message metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageInfo {
    pub id: String,
    #[serde(rename = "sessionID", alias = "sessionId")]
    pub session_id: String,
    /// `user` or `assistant`.
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<MessageTime>,
}

/// One output part of a message.
///
/// Only `type` and `text` are interpreted; other fields are kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Part {
    /// Text content for `text` parts.
    pub fn as_text(&self) -> Option<&str> {
        if self.kind == "text" {
            self.text.as_deref()
        } else {
            None
        }
    }
}

/// A message together with its parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageWithParts {
    pub info: MessageInfo,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Response of the synchronous prompt endpoint.
pub type PromptResponse = MessageWithParts;

impl MessageWithParts {
    pub fn role(&self) -> &str {
        &self.info.role
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_request_serialize() {
        let req = PromptRequest::text("hi").with_model(ModelRef::new("anthropic", "claude"));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({
                "parts": [{"type": "text", "text": "hi"}],
                "model": {"providerID": "anthropic", "modelID": "claude"}
            })
        );
    }

    #[test]
    fn test_message_with_parts_text() {
        let json = r#"{
            "info": {"id": "msg_1", "sessionID": "ses_1", "role": "assistant", "time": {"created": 1}},
            "parts": [
                {"type": "step-start", "id": "p0"},
                {"type": "text", "text": "Hello ", "id": "p1"},
                {"type": "text", "text": "world", "id": "p2"}
            ]
        }"#;
        let msg: MessageWithParts = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role(), "assistant");
        assert_eq!(msg.text(), "Hello world");
        assert_eq!(msg.parts[0].extra.get("id"), Some(&serde_json::json!("p0")));
    }
}
