//! GitHub API client.
//!
//! Owns the transport, the API root, the default page size, and the
//! session's intern cache. Requests are described with [`Requester`] and
//! dispatched through [`GitHubClient::send`].

use std::env;
use std::sync::Arc;

use url::Url;

use crate::error::{GitHubError, Result};
use crate::models::{Myself, Organization, Repository, User};
use crate::rehydrate::{InternCache, Rehydrator};
use crate::request::RequestSpec;
use crate::requester::Requester;
use crate::transport::{RawResponse, ReqwestTransport, Transport, TransportRequest};

const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub API client.
///
/// This struct is cheaply cloneable; clones share the transport and the
/// session's intern cache.
///
/// # Example
///
/// ```no_run
/// use ghapi::GitHubClient;
///
/// # fn example() -> ghapi::Result<()> {
/// // Create from environment variables
/// let client = GitHubClient::from_env()?;
///
/// // Or configure manually
/// let client = GitHubClient::new(Some("your-token"), "https://api.github.com")?
///     .with_default_page_size(50);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn Transport>,
    api_url: Arc<Url>,
    default_page_size: u32,
    interned: Arc<InternCache>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url.as_str())
            .field("default_page_size", &self.default_page_size)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a client from environment variables.
    ///
    /// Uses `GITHUB_TOKEN` for authentication (anonymous if unset),
    /// `GITHUB_API_URL` for the API root (defaults to
    /// `https://api.github.com`), and `GITHUB_PAGE_SIZE` for the default
    /// page size.
    ///
    /// # Errors
    ///
    /// Returns an error if `GITHUB_PAGE_SIZE` is not a number or the URL is
    /// invalid.
    pub fn from_env() -> Result<Self> {
        let token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        let api_url = env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let client = Self::new(token.as_deref(), &api_url)?;

        match env::var("GITHUB_PAGE_SIZE") {
            Ok(raw) => {
                let page_size = raw.parse().map_err(|_| {
                    GitHubError::Configuration(format!("GITHUB_PAGE_SIZE is not a number: {raw}"))
                })?;
                Ok(client.with_default_page_size(page_size))
            }
            Err(_) => Ok(client),
        }
    }

    /// Create a client talking to `api_url` over HTTP.
    ///
    /// # Arguments
    ///
    /// * `token` - GitHub token, or `None` for anonymous access
    /// * `api_url` - API root (e.g., `https://api.github.com`)
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is invalid.
    pub fn new(token: Option<&str>, api_url: &str) -> Result<Self> {
        let transport = ReqwestTransport::new(token)?;
        Self::with_transport(Arc::new(transport), api_url)
    }

    /// Create a client that sends every exchange through `transport`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is invalid.
    pub fn with_transport(transport: Arc<dyn Transport>, api_url: &str) -> Result<Self> {
        // Ensure the API root ends with / so relative paths join beneath it
        let api_url_str = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };

        Ok(Self {
            transport,
            api_url: Arc::new(Url::parse(&api_url_str)?),
            default_page_size: 0,
            interned: Arc::new(InternCache::new()),
        })
    }

    /// Set the page size used by sequences that do not request one.
    #[must_use]
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Get the API root.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Default page size (0 = server default).
    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// The session's cache of canonical entities.
    pub fn interned(&self) -> &InternCache {
        &self.interned
    }

    /// Discard every canonical entity interned by this session.
    pub fn end_session(&self) {
        self.interned.clear();
    }

    /// Start describing a request.
    pub fn create_request(&self) -> Requester {
        Requester::new(self.clone())
    }

    /// Execute `spec` and fail on non-success statuses.
    pub async fn send(&self, spec: &RequestSpec) -> Result<RawResponse> {
        self.send_to(spec, spec.url()).await
    }

    /// Execute `spec` against `url` instead of its own URL.
    pub(crate) async fn send_to(&self, spec: &RequestSpec, url: Url) -> Result<RawResponse> {
        self.send_unchecked(spec, url).await?.error_for_status()
    }

    /// Execute `spec` against `url`, returning any status as a response.
    pub(crate) async fn send_unchecked(&self, spec: &RequestSpec, url: Url) -> Result<RawResponse> {
        let request = TransportRequest {
            method: spec.method(),
            url,
            headers: spec.headers().clone(),
            body: spec.body()?,
        };
        self.transport.execute(request).await
    }

    /// Get a user by login, canonical for this session.
    ///
    /// A login already interned is returned without a request.
    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, login: &str) -> Result<Arc<User>> {
        if let Some(user) = self.interned.get::<User>(login) {
            return Ok(user);
        }

        let user: User = self
            .create_request()
            .with_url_path(format!("users/{}", urlencoding::encode(login)))
            .fetch()
            .await?;
        Ok(self.interned.intern(user))
    }

    /// Get an organization by login, canonical for this session.
    #[tracing::instrument(skip(self))]
    pub async fn get_organization(&self, login: &str) -> Result<Arc<Organization>> {
        if let Some(org) = self.interned.get::<Organization>(login) {
            return Ok(org);
        }

        let org: Organization = self
            .create_request()
            .with_url_path(format!("orgs/{}", urlencoding::encode(login)))
            .fetch()
            .await?;
        Ok(self.interned.intern(org))
    }

    /// Get the authenticated user.
    #[tracing::instrument(skip(self))]
    pub async fn get_myself(&self) -> Result<Myself> {
        let myself: Myself = self.create_request().with_url_path("user").fetch().await?;
        Rehydrator::attach(myself, self)
    }

    /// Get a repository by owner and name.
    #[tracing::instrument(skip(self))]
    pub async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository> {
        let repo: Repository = self
            .create_request()
            .with_url_path(format!(
                "repos/{}/{}",
                urlencoding::encode(owner),
                urlencoding::encode(name)
            ))
            .fetch()
            .await?;
        Rehydrator::attach(repo, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_transport::{MockResponse, MockTransport};

    #[test]
    fn test_client_debug() {
        let client = GitHubClient::new(Some("test-token"), "https://api.github.com").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("GitHubClient"));
        assert!(debug.contains("api_url"));
        // Token should not be in debug output
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let client1 = GitHubClient::new(None, "https://ghe.example.com/api/v3").unwrap();
        let client2 = GitHubClient::new(None, "https://ghe.example.com/api/v3/").unwrap();
        assert_eq!(client1.api_url().as_str(), client2.api_url().as_str());
    }

    #[test]
    fn test_invalid_api_url() {
        let result = GitHubClient::new(None, "not a url");
        assert!(matches!(result, Err(GitHubError::Url(_))));
    }

    #[tokio::test]
    async fn test_get_user_is_interned_per_session() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            "https://api.github.com/users/octocat",
            MockResponse::json(serde_json::json!({"login": "octocat", "id": 1})),
        );

        let client = GitHubClient::with_transport(transport.clone(), "https://api.github.com")
            .unwrap();
        let first = client.get_user("octocat").await.unwrap();
        let second = client.clone().get_user("octocat").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.request_count(), 1);

        let other_session =
            GitHubClient::with_transport(transport.clone(), "https://api.github.com").unwrap();
        let third = other_session.get_user("octocat").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_end_session_forgets_interned_entities() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            "https://api.github.com/users/octocat",
            MockResponse::json(serde_json::json!({"login": "octocat", "id": 1})),
        );
        let client = GitHubClient::with_transport(transport.clone(), "https://api.github.com")
            .unwrap();

        client.get_user("octocat").await.unwrap();
        client.end_session();
        assert!(client.interned().is_empty());

        client.get_user("octocat").await.unwrap();
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_get_repository_binds_client() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            "https://api.github.com/repos/octocat/hello-world",
            MockResponse::json(serde_json::json!({
                "id": 1296269,
                "name": "hello-world",
                "full_name": "octocat/hello-world",
                "owner": {"login": "octocat", "id": 1}
            })),
        );
        let client = GitHubClient::with_transport(transport, "https://api.github.com").unwrap();

        let repo = client.get_repository("octocat", "hello-world").await.unwrap();
        assert!(repo.root().is_ok());
        assert_eq!(repo.full_name, "octocat/hello-world");
    }

    #[tokio::test]
    async fn test_repository_owner_is_an_embedded_summary() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            "https://api.github.com/repos/octocat/hello-world",
            MockResponse::json(serde_json::json!({
                "id": 1296269,
                "name": "hello-world",
                "full_name": "octocat/hello-world",
                "owner": {"login": "octocat", "id": 1}
            })),
        );
        transport.respond(
            "https://api.github.com/users/octocat",
            MockResponse::json(serde_json::json!({"login": "octocat", "id": 1, "name": "The Octocat"})),
        );
        let client =
            GitHubClient::with_transport(transport.clone(), "https://api.github.com").unwrap();

        let repo = client.get_repository("octocat", "hello-world").await.unwrap();
        assert!(repo.owner.name.is_none());

        let owner = client.get_user(&repo.owner.login).await.unwrap();
        assert_eq!(owner.name.as_deref(), Some("The Octocat"));
        assert_eq!(transport.request_count(), 2);
    }
}
