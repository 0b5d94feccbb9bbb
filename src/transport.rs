//! HTTP transport.
//!
//! The [`Transport`] trait executes one exchange and hands back the raw
//! response. Authentication, connection pooling, compression and timeouts
//! live in the implementation; the engine only inspects status codes and the
//! pagination headers.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use crate::error::{GitHubError, Result};
use crate::request::Method;

const USER_AGENT: &str = concat!("ghapi/", env!("CARGO_PKG_VERSION"));
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// One outbound exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// A raw response as returned by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// Final URL of the exchange.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Response headers, keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Look up a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert non-success statuses into errors.
    ///
    /// No retry or back-off is attempted here; rate-limit responses are
    /// reported with the server's retry hint so the caller can decide.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        if self.status == 404 {
            return Err(GitHubError::NotFound {
                url: self.url.to_string(),
            });
        }

        let exhausted = self.header("x-ratelimit-remaining") == Some("0");
        if self.status == 429 || (self.status == 403 && exhausted) {
            let retry_after = self
                .header("retry-after")
                .and_then(|v| v.parse().ok());
            return Err(GitHubError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        Err(GitHubError::Api {
            message: self.error_message(),
            status_code: Some(self.status),
        })
    }

    /// Extract an error message from a failed response.
    fn error_message(&self) -> String {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
                return msg.to_string();
            }
            if let Some(err) = json.get("error").and_then(|m| m.as_str()) {
                return err.to_string();
            }
        }

        if self.body.is_empty() {
            return format!("HTTP {}", self.status);
        }
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes exchanges on behalf of the client.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Execute `request` once.
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse>;
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Production transport on top of `reqwest`.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
    token: Option<String>,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Create a transport, optionally authenticating with a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(GitHubError::Transport)?;

        Ok(Self {
            http,
            token: token.map(str::to_string),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse> {
        let mut builder = self
            .http
            .request(request.method.into(), request.url.clone());

        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(GitHubError::Transport)?;

        let url = response.url().clone();
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(GitHubError::Transport)?.to_vec();

        tracing::debug!(status, bytes = body.len(), "received response");

        Ok(RawResponse {
            url,
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> RawResponse {
        RawResponse {
            url: Url::parse("https://api.github.com/x").unwrap(),
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_transport_debug_hides_token() {
        let transport = ReqwestTransport::new(Some("secret-token")).unwrap();
        let debug = format!("{:?}", transport);
        assert!(debug.contains("ReqwestTransport"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_success_passes_through() {
        assert!(response(200, &[], "{}").error_for_status().is_ok());
        assert!(response(202, &[], "{}").error_for_status().is_ok());
    }

    #[test]
    fn test_not_found() {
        let err = response(404, &[], "").error_for_status().unwrap_err();
        assert!(matches!(err, GitHubError::NotFound { .. }));
    }

    #[test]
    fn test_rate_limited_with_retry_after() {
        let err = response(
            403,
            &[("x-ratelimit-remaining", "0"), ("retry-after", "30")],
            "{}",
        )
        .error_for_status()
        .unwrap_err();
        assert!(matches!(
            err,
            GitHubError::RateLimited {
                retry_after_secs: Some(30)
            }
        ));
    }

    #[test]
    fn test_forbidden_without_exhausted_quota_is_api_error() {
        let err = response(403, &[], r#"{"message": "Must have admin rights"}"#)
            .error_for_status()
            .unwrap_err();
        match err {
            GitHubError::Api {
                message,
                status_code,
            } => {
                assert_eq!(message, "Must have admin rights");
                assert_eq!(status_code, Some(403));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let r = response(200, &[("link", "<a>; rel=\"next\"")], "");
        assert_eq!(r.header("Link"), Some("<a>; rel=\"next\""));
    }
}
