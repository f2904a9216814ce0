//! HTTP transport for the OpenCode REST API.
//!
//! [`HttpClient`] is a thin wrapper over `reqwest` that knows the server base
//! URL, the optional `x-opencode-directory` context and how to turn
//! responses into [`crate::error::OpencodeError`] values.

pub mod messages;
pub mod sessions;
pub mod tui;

use crate::error::{OpencodeError, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the working directory a request applies to.
pub const DIRECTORY_HEADER: &str = "x-opencode-directory";

/// Percent-encode an ID for use as one path segment.
pub(crate) fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

/// Configuration for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Directory sent as `x-opencode-directory`.
    pub directory: Option<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

/// Shared HTTP client used by all REST API groups.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: reqwest::Client,
    base: String,
    directory: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying `reqwest` client cannot be built.
    pub fn new(cfg: HttpConfig) -> Result<Self> {
        let inner = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            inner,
            base: cfg.base_url.trim_end_matches('/').to_string(),
            directory: cfg.directory,
        })
    }

    /// Server base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Directory context, if configured.
    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn build(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> RequestBuilder {
        let mut req = self.inner.request(method, self.url(path));
        if let Some(dir) = &self.directory {
            req = req.header(DIRECTORY_HEADER, dir);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        req
    }

    async fn send(&self, req: RequestBuilder, path: &str) -> Result<Response> {
        let url = self.url(path);
        let resp = req
            .send()
            .await
            .map_err(|e| OpencodeError::from_send(&url, e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(
            "Request failed endpoint={} directory={:?} status={}: {}",
            url,
            self.directory,
            status.as_u16(),
            body
        );
        Err(OpencodeError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Send a request and decode a JSON response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the body is not valid JSON for `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let resp = self.send(self.build(method, path, body), path).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like [`Self::request_json`] with extra query parameters.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request_json`].
    pub async fn request_json_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let req = self.build(method, path, body).query(query);
        let resp = self.send(req, path).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request whose successful response carries no meaningful body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status.
    pub async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<()> {
        self.send(self.build(method, path, body), path).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_client(base_url: String) -> HttpClient {
    HttpClient::new(HttpConfig {
        base_url,
        directory: None,
        timeout: Duration::from_secs(30),
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_segment_escapes_route_characters() {
        assert_eq!(segment("ses_01HX"), "ses_01HX");
        assert_eq!(segment("a/b?c#d"), "a%2Fb%3Fc%23d");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let http = test_client("http://localhost:4096/".to_string());
        assert_eq!(http.base(), "http://localhost:4096");
        assert_eq!(http.url("/session"), "http://localhost:4096/session");
    }

    #[tokio::test]
    async fn test_directory_header_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/session"))
            .and(header(DIRECTORY_HEADER, "/my/project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let http = HttpClient::new(HttpConfig {
            base_url: mock_server.uri(),
            directory: Some("/my/project".to_string()),
            timeout: Duration::from_secs(30),
        })
        .unwrap();

        let list: Vec<serde_json::Value> =
            http.request_json(Method::GET, "/session", None).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_becomes_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let http = test_client(mock_server.uri());
        let err = http
            .request_json::<serde_json::Value>(Method::GET, "/session", None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.body(), Some("boom"));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let http = test_client(format!("http://{}", addr));
        let err = http
            .request_empty(Method::GET, "/session", None)
            .await
            .unwrap_err();
        assert_eq!(
            err.connection_kind(),
            Some(crate::error::ConnectionErrorKind::Failed)
        );
    }
}
