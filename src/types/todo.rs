//! Todo list items attached to a session.

use serde::{Deserialize, Serialize};

/// A todo item tracked by the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    /// Brief description of the task.
    pub content: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    /// Status added by a newer server.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Todo {
    /// Whether the item is finished, either done or abandoned.
    pub fn is_closed(&self) -> bool {
        matches!(self.status, TodoStatus::Completed | TodoStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_deserialize() {
        let json = r#"[
            {"id": "1", "content": "write tests", "status": "in_progress", "priority": "high"},
            {"id": "2", "content": "ship", "status": "blocked", "priority": "urgent"}
        ]"#;
        let todos: Vec<Todo> = serde_json::from_str(json).unwrap();
        assert_eq!(todos[0].status, TodoStatus::InProgress);
        assert_eq!(todos[0].priority, TodoPriority::High);
        assert!(!todos[0].is_closed());
        assert_eq!(todos[1].status, TodoStatus::Unknown);
        assert_eq!(todos[1].priority, TodoPriority::Unknown);
    }
}
