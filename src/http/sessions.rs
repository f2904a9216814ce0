//! Sessions API for OpenCode.
//!
//! Session lifecycle plus the per-session abort and todo endpoints.

use crate::error::Result;
use crate::http::{HttpClient, segment};
use crate::types::session::{CreateSessionRequest, Session};
use crate::types::todo::Todo;
use reqwest::Method;

/// Sessions API client.
#[derive(Clone)]
pub struct SessionsApi {
    http: HttpClient,
}

impl SessionsApi {
    /// Create a new Sessions API client.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// List all sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self) -> Result<Vec<Session>> {
        self.http.request_json(Method::GET, "/session", None).await
    }

    /// Create a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create(&self, req: &CreateSessionRequest) -> Result<Session> {
        let body = serde_json::to_value(req)?;
        self.http
            .request_json(Method::POST, "/session", Some(body))
            .await
    }

    /// Get one session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, session_id: &str) -> Result<Session> {
        self.http
            .request_json(Method::GET, &format!("/session/{}", segment(session_id)), None)
            .await
    }

    /// Delete a session. Returns the server's acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, session_id: &str) -> Result<bool> {
        self.http
            .request_json(Method::DELETE, &format!("/session/{}", segment(session_id)), None)
            .await
    }

    /// Abort whatever the session is currently running.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn abort(&self, session_id: &str) -> Result<bool> {
        self.http
            .request_json(
                Method::POST,
                &format!("/session/{}/abort", segment(session_id)),
                None,
            )
            .await
    }

    /// Todo list of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn todos(&self, session_id: &str) -> Result<Vec<Todo>> {
        self.http
            .request_json(Method::GET, &format!("/session/{}/todo", segment(session_id)), None)
            .await
    }
}
