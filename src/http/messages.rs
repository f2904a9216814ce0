//! Messages API for OpenCode.
//!
//! Prompting (blocking and fire-and-forget) and message history.

use crate::error::Result;
use crate::http::{HttpClient, segment};
use crate::types::message::{MessageWithParts, ModelRef, PromptRequest, PromptResponse};
use reqwest::Method;

/// Messages API client.
#[derive(Clone)]
pub struct MessagesApi {
    http: HttpClient,
}

impl MessagesApi {
    /// Create a new Messages API client.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Send a prompt and wait for the assistant's reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn prompt(&self, session_id: &str, req: &PromptRequest) -> Result<PromptResponse> {
        let body = serde_json::to_value(req)?;
        self.http
            .request_json(
                Method::POST,
                &format!("/session/{}/message", segment(session_id)),
                Some(body),
            )
            .await
    }

    /// Send a prompt asynchronously (returns immediately).
    ///
    /// The reply arrives through the event stream. The server returns an
    /// empty body on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn prompt_async(&self, session_id: &str, req: &PromptRequest) -> Result<()> {
        let body = serde_json::to_value(req)?;
        self.http
            .request_empty(
                Method::POST,
                &format!("/session/{}/prompt_async", segment(session_id)),
                Some(body),
            )
            .await
    }

    /// Send plain text with the given model and wait for the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_text(
        &self,
        session_id: &str,
        text: impl Into<String>,
        model: ModelRef,
    ) -> Result<PromptResponse> {
        self.prompt(session_id, &PromptRequest::text(text).with_model(model))
            .await
    }

    /// Send plain text asynchronously with the given model.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_text_async(
        &self,
        session_id: &str,
        text: impl Into<String>,
        model: ModelRef,
    ) -> Result<()> {
        self.prompt_async(session_id, &PromptRequest::text(text).with_model(model))
            .await
    }

    /// List messages in a session, optionally only the most recent `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, session_id: &str, limit: Option<u32>) -> Result<Vec<MessageWithParts>> {
        let query: Vec<(&str, String)> = limit
            .map(|n| vec![("limit", n.to_string())])
            .unwrap_or_default();
        self.http
            .request_json_query(
                Method::GET,
                &format!("/session/{}/message", segment(session_id)),
                &query,
                None,
            )
            .await
    }
}
