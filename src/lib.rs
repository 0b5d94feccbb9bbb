//! GitHub API client library.
//!
//! A typed client for the GitHub REST and GraphQL APIs built around three
//! ideas: requests are immutable descriptions built fluently, collections
//! are lazy restartable sequences that fetch pages on demand, and decoded
//! entities are re-bound to the client (or repository) that produced them so
//! they can issue follow-up requests.
//!
//! # Quick Start
//!
//! ```no_run
//! use ghapi::{GitHubClient, IssueState};
//!
//! #[tokio::main]
//! async fn main() -> ghapi::Result<()> {
//!     // Create client from environment variables
//!     let client = GitHubClient::from_env()?;
//!
//!     let repo = client.get_repository("rust-lang", "rust").await?;
//!     println!("Repository: {}", repo.full_name);
//!
//!     // Nothing is fetched until the sequence is iterated
//!     let mut commits = repo.list_commits()?.iter();
//!     while commits.has_next().await? {
//!         if let Some(commit) = commits.next() {
//!             println!("{}", commit.sha);
//!         }
//!         if commits.pages_fetched() > 1 {
//!             break;
//!         }
//!     }
//!
//!     // Query issues
//!     let open = repo
//!         .query_issues()?
//!         .state(IssueState::Open)
//!         .label("bug")
//!         .list()?
//!         .to_list()
//!         .await?;
//!     println!("Found {} open bugs", open.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`RequestBuilder`] / [`RequestSpec`] describe a call.
//! - [`Requester`] binds a description to a [`GitHubClient`] and provides
//!   the terminal operations (`fetch`, `fetch_into`, `to_iterable`, ...).
//! - [`PagedIterable`] is a lazy sequence; every [`PagedIterable::iter`]
//!   starts again from the first page.
//! - [`Rehydrator`] binds decoded entities to their owner, and
//!   [`InternCache`] keeps one canonical instance per identity per session.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `GITHUB_TOKEN` (optional) - Personal access token; anonymous otherwise
//! - `GITHUB_API_URL` (optional) - Base URL (defaults to `https://api.github.com`)
//! - `GITHUB_PAGE_SIZE` (optional) - Default page size for listings

pub mod cli;
mod client;
mod decode;
mod error;
#[cfg(any(test, feature = "test-transport"))]
pub mod mock_transport;
mod models;
pub mod output;
mod pagination;
mod rehydrate;
mod request;
mod requester;
mod sequence;
mod traits;
mod transport;

// Re-export core types
pub use client::GitHubClient;
pub use error::{GitHubError, Result};
pub use request::{Method, ParamValue, RequestBuilder, RequestSpec};
pub use requester::Requester;
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportRequest};

// Decoding and pagination
pub use decode::{
    decode, decode_array_or_not_ready, decode_into, ArrayPage, ContextBindings, EmbeddedPage,
    PageDecoder,
};
pub use pagination::{Cursor, CursorStrategy, Page, PageCursor, RawPage};
pub use sequence::{ItemInitializer, PagedIterable, PagedIterator};

// Late binding
pub use rehydrate::{EntityState, InternCache, OwnerSlot, Rehydrator};

// Re-export traits
pub use traits::{Decodable, Internable, OwnedEntity, Refreshable};

// Re-export models
pub use models::{
    // Accounts
    Email,
    Myself,
    Organization,
    RepositoryListFilter,
    User,
    // Repository
    Repository,
    // Commit types
    Branch,
    Commit,
    CommitComment,
    CommitFile,
    CommitParent,
    CommitStats,
    GitCommit,
    GitTree,
    GitUser,
    ShortInfo,
    // Compare types
    CommitListing,
    Compare,
    CompareStatus,
    // Statistics types
    CodeFrequency,
    CommitActivity,
    ContributorStats,
    Participation,
    PunchCardItem,
    RepositoryStatistics,
    Week,
    // Deployment types
    Deployment,
    DeploymentStatus,
    // Content types
    Content,
    ContentUpdateResponse,
    // Issue types
    Direction,
    Issue,
    IssueQueryBuilder,
    IssueSort,
    IssueState,
    Label,
    PullRequest,
    // Payload types
    FromPrivacy,
    FromRepository,
    FromRepositoryPermissions,
    FromString,
    Privacy,
    Reaction,
    ReactionContent,
    RepositoryPermissions,
    TeamChanges,
};
