//! Events pushed by the `/global/event` stream.
//!
//! The stream delivers [`GlobalEvent`] envelopes. The inner
//! [`OpenCodeEvent`] keeps its `type` as a free-form string and its data as
//! raw JSON so that event kinds added by newer servers pass through
//! untouched. Typed views of the well-known kinds are available through
//! [`OpenCodeEvent::data_as`].

use crate::types::message::MessageInfo;
use crate::types::todo::Todo;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Envelope for one pushed event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalEvent {
    /// Working directory the event pertains to.
    pub directory: String,
    pub payload: OpenCodeEvent,
}

/// A single server event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenCodeEvent {
    /// Discriminator such as `session.status` or `message.updated`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Type-specific data. Servers that send `properties` instead of `data`
    /// are accepted too.
    #[serde(default, alias = "properties")]
    pub data: serde_json::Value,
}

/// Well-known event kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    SessionStatus,
    SessionUpdated,
    SessionDeleted,
    SessionIdle,
    SessionError,
    MessageUpdated,
    MessagePartUpdated,
    MessageRemoved,
    TodoUpdated,
    FileEdited,
    ServerConnected,
    Other(String),
}

impl EventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "session.status" => Self::SessionStatus,
            "session.updated" => Self::SessionUpdated,
            "session.deleted" => Self::SessionDeleted,
            "session.idle" => Self::SessionIdle,
            "session.error" => Self::SessionError,
            "message.updated" => Self::MessageUpdated,
            "message.part.updated" => Self::MessagePartUpdated,
            "message.removed" => Self::MessageRemoved,
            "todo.updated" => Self::TodoUpdated,
            "file.edited" => Self::FileEdited,
            "server.connected" => Self::ServerConnected,
            other => Self::Other(other.to_string()),
        }
    }
}

impl OpenCodeEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }

    /// Decode the event data into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the data does not match `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data)
    }

    /// Session the event belongs to, when the data carries one.
    pub fn session_id(&self) -> Option<&str> {
        self.data
            .get("sessionID")
            .or_else(|| self.data.get("sessionId"))
            .and_then(serde_json::Value::as_str)
    }
}

/// Data of `session.status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionStatusData {
    #[serde(rename = "sessionID", alias = "sessionId")]
    pub session_id: String,
    /// Either a bare string (`"idle"`) or an object with a `type` field.
    pub status: serde_json::Value,
}

impl SessionStatusData {
    /// Status name regardless of which shape the server used.
    pub fn status_name(&self) -> Option<&str> {
        self.status
            .as_str()
            .or_else(|| self.status.get("type").and_then(serde_json::Value::as_str))
    }

    pub fn is_idle(&self) -> bool {
        self.status_name() == Some("idle")
    }
}

/// Data of `message.updated`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageUpdatedData {
    #[serde(rename = "sessionID", alias = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(rename = "messageID", alias = "messageId", default)]
    pub message_id: Option<String>,
    #[serde(alias = "info")]
    pub message: MessageInfo,
}

/// Data of `todo.updated`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoUpdatedData {
    #[serde(rename = "sessionID", alias = "sessionId")]
    pub session_id: String,
    pub todos: Vec<Todo>,
}

/// Data of `file.edited`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEditedData {
    #[serde(alias = "file")]
    pub path: String,
    /// Edit type, when the server reports one.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_event_with_data() {
        let json = r#"{"directory":"/p","payload":{"type":"session.status","data":{"sessionID":"ses_1","status":"idle"}}}"#;
        let ev: GlobalEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.directory, "/p");
        assert_eq!(ev.payload.kind(), EventKind::SessionStatus);
        assert_eq!(ev.payload.session_id(), Some("ses_1"));

        let status: SessionStatusData = ev.payload.data_as().unwrap();
        assert!(status.is_idle());
    }

    #[test]
    fn test_properties_alias_and_object_status() {
        let json = r#"{"directory":"/p","payload":{"type":"session.status","properties":{"sessionID":"ses_2","status":{"type":"busy"}}}}"#;
        let ev: GlobalEvent = serde_json::from_str(json).unwrap();
        let status: SessionStatusData = ev.payload.data_as().unwrap();
        assert_eq!(status.status_name(), Some("busy"));
        assert!(!status.is_idle());
    }

    #[test]
    fn test_unknown_type_and_missing_data() {
        let json = r#"{"directory":"/p","payload":{"type":"vendor.custom"}}"#;
        let ev: GlobalEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.payload.kind(), EventKind::Other("vendor.custom".to_string()));
        assert!(ev.payload.data.is_null());
        assert_eq!(ev.payload.session_id(), None);
    }

    #[test]
    fn test_typed_todo_and_file_views() {
        let todo = OpenCodeEvent {
            event_type: "todo.updated".to_string(),
            data: serde_json::json!({
                "sessionID": "ses_1",
                "todos": [{"id": "1", "content": "c", "status": "pending", "priority": "low"}]
            }),
        };
        let data: TodoUpdatedData = todo.data_as().unwrap();
        assert_eq!(data.todos.len(), 1);

        let file = OpenCodeEvent {
            event_type: "file.edited".to_string(),
            data: serde_json::json!({"file": "src/main.rs"}),
        };
        let data: FileEditedData = file.data_as().unwrap();
        assert_eq!(data.path, "src/main.rs");
        assert!(data.kind.is_none());
    }

    #[test]
    fn test_message_updated_accepts_info() {
        let ev = OpenCodeEvent {
            event_type: "message.updated".to_string(),
            data: serde_json::json!({
                "info": {"id": "msg_1", "sessionID": "ses_1", "role": "assistant"}
            }),
        };
        let data: MessageUpdatedData = ev.data_as().unwrap();
        assert_eq!(data.message.id, "msg_1");
        assert!(data.session_id.is_none());
    }
}
