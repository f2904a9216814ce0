//! Request bodies for the TUI remote-control endpoints.

use serde::{Deserialize, Serialize};

/// Body for `POST /tui/append-prompt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppendPromptRequest {
    pub text: String,
}

/// Body for `POST /tui/execute-command`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecuteCommandRequest {
    /// Command name, e.g. `session_new` or `agent_cycle`.
    pub command: String,
}

/// Toast severity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Body for `POST /tui/show-toast`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowToastRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub variant: ToastVariant,
}

impl ShowToastRequest {
    /// Info toast with the given message.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            title: None,
            variant: ToastVariant::Info,
        }
    }

    pub fn with_variant(mut self, variant: ToastVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_toast_serialize() {
        let body = ShowToastRequest::info("done").with_variant(ToastVariant::Success);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"message": "done", "variant": "success"})
        );
    }
}
