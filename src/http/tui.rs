//! TUI remote-control API.
//!
//! Drives the prompt box and notifications of a running OpenCode terminal UI.

use crate::error::Result;
use crate::http::HttpClient;
use crate::types::tui::{AppendPromptRequest, ExecuteCommandRequest, ShowToastRequest};
use reqwest::Method;

/// TUI API client.
#[derive(Clone)]
pub struct TuiApi {
    http: HttpClient,
}

impl TuiApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Append text to the prompt box.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn append_prompt(&self, text: impl Into<String>) -> Result<bool> {
        let body = serde_json::to_value(AppendPromptRequest { text: text.into() })?;
        self.http
            .request_json(Method::POST, "/tui/append-prompt", Some(body))
            .await
    }

    /// Submit the current prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn submit_prompt(&self) -> Result<bool> {
        self.http
            .request_json(Method::POST, "/tui/submit-prompt", None)
            .await
    }

    /// Clear the prompt box.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn clear_prompt(&self) -> Result<bool> {
        self.http
            .request_json(Method::POST, "/tui/clear-prompt", None)
            .await
    }

    /// Run a TUI command such as `session_new`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn execute_command(&self, command: impl Into<String>) -> Result<bool> {
        let body = serde_json::to_value(ExecuteCommandRequest {
            command: command.into(),
        })?;
        self.http
            .request_json(Method::POST, "/tui/execute-command", Some(body))
            .await
    }

    /// Show a toast notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn show_toast(&self, req: &ShowToastRequest) -> Result<bool> {
        let body = serde_json::to_value(req)?;
        self.http
            .request_json(Method::POST, "/tui/show-toast", Some(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_client;
    use crate::types::tui::ToastVariant;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_prompt_controls() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tui/append-prompt"))
            .and(body_json(serde_json::json!({"text": "fix the build"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tui/submit-prompt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tui/clear-prompt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(false))
            .mount(&mock_server)
            .await;

        let tui = TuiApi::new(test_client(mock_server.uri()));
        assert!(tui.append_prompt("fix the build").await.unwrap());
        assert!(tui.submit_prompt().await.unwrap());
        assert!(!tui.clear_prompt().await.unwrap());
    }

    #[tokio::test]
    async fn test_execute_command_and_toast() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tui/execute-command"))
            .and(body_json(serde_json::json!({"command": "session_new"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tui/show-toast"))
            .and(body_json(serde_json::json!({
                "message": "Build failed",
                "title": "CI",
                "variant": "error"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .expect(1)
            .mount(&mock_server)
            .await;

        let tui = TuiApi::new(test_client(mock_server.uri()));
        assert!(tui.execute_command("session_new").await.unwrap());
        let toast = ShowToastRequest::info("Build failed")
            .with_title("CI")
            .with_variant(ToastVariant::Error);
        assert!(tui.show_toast(&toast).await.unwrap());
    }
}
