//! High-level client API for OpenCode.
//!
//! This module provides the ergonomic `Client` and `ClientBuilder` types.

use crate::error::{OpencodeError, Result};
use crate::http::messages::MessagesApi;
use crate::http::sessions::SessionsApi;
use crate::http::tui::TuiApi;
use crate::http::{HttpClient, HttpConfig};
use crate::types::message::{ModelRef, PromptResponse};
use crate::types::session::{CreateSessionRequest, Session};
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Server base URL.
    pub base_url: String,
    /// Directory context, sent as `x-opencode-directory`.
    pub directory: Option<String>,
    /// Whole-request timeout for REST calls.
    pub timeout: Duration,
    /// Provider used by the text convenience helpers.
    pub default_provider_id: String,
    /// Model used by the text convenience helpers.
    pub default_model_id: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4096".to_string(),
            directory: None,
            timeout: Duration::from_secs(300), // 5 min for long AI requests
            default_provider_id: "anthropic".to_string(),
            default_model_id: "claude-3-5-sonnet-20241022".to_string(),
        }
    }
}

impl ClientOptions {
    /// Presence checks only; the server is not contacted.
    ///
    /// # Errors
    ///
    /// Returns [`OpencodeError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(OpencodeError::InvalidConfig("base_url is empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(OpencodeError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got {base}"
            )));
        }
        if self.timeout.is_zero() {
            return Err(OpencodeError::InvalidConfig("timeout must be non-zero".into()));
        }
        if self.default_provider_id.trim().is_empty() {
            return Err(OpencodeError::InvalidConfig(
                "default_provider_id is empty".into(),
            ));
        }
        if self.default_model_id.trim().is_empty() {
            return Err(OpencodeError::InvalidConfig(
                "default_model_id is empty".into(),
            ));
        }
        Ok(())
    }
}

/// OpenCode client for interacting with the server.
#[derive(Clone, Debug)]
pub struct Client {
    http: HttpClient,
    options: ClientOptions,
}

/// Builder for creating a [`Client`].
#[derive(Clone, Debug, Default)]
pub struct ClientBuilder {
    options: ClientOptions,
}

impl ClientBuilder {
    /// Create a new client builder with default settings.
    ///
    /// Default settings:
    /// - Base URL: `http://127.0.0.1:4096`
    /// - Timeout: 300 seconds (5 minutes)
    /// - Model: `anthropic` / `claude-3-5-sonnet-20241022`
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a complete set of options.
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the base URL for the OpenCode server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = url.into();
        self
    }

    /// Set the directory context for requests.
    ///
    /// This sets the `x-opencode-directory` header on all requests,
    /// including the event stream.
    pub fn directory(mut self, dir: impl Into<String>) -> Self {
        self.options.directory = Some(dir.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    /// Set the model used by [`Client::send_text`] and friends.
    pub fn default_model(
        mut self,
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        self.options.default_provider_id = provider_id.into();
        self.options.default_model_id = model_id.into();
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`OpencodeError::InvalidConfig`] if an option is missing or
    /// malformed, or an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        self.options.validate()?;

        let http = HttpClient::new(HttpConfig {
            base_url: self.options.base_url.trim().to_string(),
            directory: self.options.directory.clone(),
            timeout: self.options.timeout,
        })?;

        tracing::debug!(
            "OpenCode client built base_url={} directory={:?}",
            http.base(),
            http.directory()
        );

        Ok(Client {
            http,
            options: self.options,
        })
    }
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The configured default model.
    pub fn default_model(&self) -> ModelRef {
        ModelRef::new(
            self.options.default_provider_id.clone(),
            self.options.default_model_id.clone(),
        )
    }

    /// Get the sessions API.
    pub fn sessions(&self) -> SessionsApi {
        SessionsApi::new(self.http.clone())
    }

    /// Get the messages API.
    pub fn messages(&self) -> MessagesApi {
        MessagesApi::new(self.http.clone())
    }

    /// Get the TUI control API.
    pub fn tui(&self) -> TuiApi {
        TuiApi::new(self.http.clone())
    }

    /// Create a session, optionally titled.
    ///
    /// # Errors
    ///
    /// Returns an error if session creation fails.
    pub async fn create_session(&self, title: Option<&str>) -> Result<Session> {
        let req = title.map(CreateSessionRequest::titled).unwrap_or_default();
        self.sessions().create(&req).await
    }

    /// Send plain text with the default model and wait for the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_text(
        &self,
        session_id: &str,
        text: impl Into<String>,
    ) -> Result<PromptResponse> {
        self.messages()
            .send_text(session_id, text, self.default_model())
            .await
    }

    /// Send plain text with the default model without waiting.
    ///
    /// The reply arrives through the event stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_text_async(&self, session_id: &str, text: impl Into<String>) -> Result<()> {
        self.messages()
            .send_text_async(session_id, text, self.default_model())
            .await
    }
}

#[cfg(feature = "sse")]
impl Client {
    /// A new event stream session for `/global/event` with default options.
    ///
    /// Each call returns an independent session with its own connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream transport cannot be built.
    pub fn event_stream(&self) -> Result<crate::sse::StreamSession> {
        self.event_stream_with(crate::sse::SseOptions::default())
    }

    /// Like [`Self::event_stream`] with explicit options.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream transport cannot be built.
    pub fn event_stream_with(
        &self,
        options: crate::sse::SseOptions,
    ) -> Result<crate::sse::StreamSession> {
        crate::sse::StreamSession::new(
            self.http.base(),
            self.http.directory().map(str::to_string),
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_builder_defaults() {
        let builder = ClientBuilder::new();
        assert_eq!(builder.options.base_url, "http://127.0.0.1:4096");
        assert_eq!(builder.options.timeout, Duration::from_secs(300));
        assert!(builder.options.directory.is_none());
        assert_eq!(builder.options.default_provider_id, "anthropic");
        assert_eq!(
            builder.options.default_model_id,
            "claude-3-5-sonnet-20241022"
        );
    }

    #[test]
    fn test_client_builder_customization() {
        let builder = ClientBuilder::new()
            .base_url("http://localhost:8080")
            .directory("/my/project")
            .timeout_secs(60)
            .default_model("openai", "gpt-4o");

        assert_eq!(builder.options.base_url, "http://localhost:8080");
        assert_eq!(builder.options.directory, Some("/my/project".to_string()));
        assert_eq!(builder.options.timeout, Duration::from_secs(60));
        assert_eq!(builder.options.default_provider_id, "openai");
        assert_eq!(builder.options.default_model_id, "gpt-4o");
    }

    #[test]
    fn test_client_build() {
        let client = ClientBuilder::new().build().unwrap();
        assert_eq!(
            client.default_model(),
            ModelRef::new("anthropic", "claude-3-5-sonnet-20241022")
        );
    }

    #[test]
    fn test_build_rejects_bad_options() {
        let cases = [
            ClientBuilder::new().base_url(""),
            ClientBuilder::new().base_url("localhost:4096"),
            ClientBuilder::new().timeout(Duration::ZERO),
            ClientBuilder::new().default_model("", "m"),
            ClientBuilder::new().default_model("p", " "),
        ];
        for builder in cases {
            assert!(matches!(
                builder.build(),
                Err(OpencodeError::InvalidConfig(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_create_session_and_send_text_use_defaults() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/session"))
            .and(header("x-opencode-directory", "/repo"))
            .and(body_json(serde_json::json!({"title": "demo"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "ses_1"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/ses_1/prompt_async"))
            .and(body_json(serde_json::json!({
                "parts": [{"type": "text", "text": "hi"}],
                "model": {"providerID": "anthropic", "modelID": "claude-3-5-sonnet-20241022"}
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Client::builder()
            .base_url(mock_server.uri())
            .directory("/repo")
            .build()
            .unwrap();
        let session = client.create_session(Some("demo")).await.unwrap();
        assert_eq!(session.id, "ses_1");
        client.send_text_async(&session.id, "hi").await.unwrap();
    }

    #[cfg(feature = "sse")]
    #[test]
    fn test_event_stream_inherits_base_url() {
        let client = Client::builder()
            .base_url("http://localhost:4096/")
            .build()
            .unwrap();
        let stream = client.event_stream().unwrap();
        assert_eq!(stream.endpoint(), "http://localhost:4096/global/event");
        assert_eq!(stream.state(), crate::sse::StreamState::Idle);
    }
}
