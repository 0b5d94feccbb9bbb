//! In-memory transport for tests.
//!
//! Unlike wiremock, which mocks at the HTTP level, this transport never
//! opens a socket: responses are served from a table keyed by full URL and
//! every exchange is recorded for call-count assertions.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ghapi::mock_transport::{MockResponse, MockTransport};
//! use ghapi::GitHubClient;
//!
//! let transport = Arc::new(MockTransport::new());
//! transport.respond(
//!     "https://api.github.com/users/octocat",
//!     MockResponse::json(serde_json::json!({"login": "octocat", "id": 1})),
//! );
//! let client = GitHubClient::with_transport(transport.clone(), "https://api.github.com")?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::Result;
use crate::transport::{RawResponse, Transport, TransportRequest};

/// A canned response.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl MockResponse {
    /// A 200 response carrying `value` as JSON.
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: value.to_string().into_bytes(),
        }
    }

    /// Override the status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Add a `Link` header pointing at the next page.
    #[must_use]
    pub fn with_next_link(self, url: &str) -> Self {
        self.with_header("link", &format!("<{url}>; rel=\"next\""))
    }
}

/// Transport that serves canned responses and records requests.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, MockResponse>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    /// Create an empty transport. Unrouted URLs answer 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for every request to exactly `url`.
    pub fn respond(&self, url: &str, response: MockResponse) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), response);
    }

    /// All requests executed so far, in order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests executed so far.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.url.to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<RawResponse> {
        let url = request.url.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let routed = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url.as_str())
            .cloned();

        let response = routed.unwrap_or_else(|| {
            MockResponse::json(serde_json::json!({
                "message": format!("no fixture for {url}"),
            }))
            .with_status(404)
        });

        Ok(RawResponse {
            url,
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}
