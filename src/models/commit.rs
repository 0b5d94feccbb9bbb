//! Commit model.
//!
//! Commits returned by listing endpoints are partial: they lack `files` and
//! `stats`. Accessors that need those fields populate the commit in place
//! from the single-commit endpoint the first time they are called.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decode::EmbeddedPage;
use crate::error::{GitHubError, Result};
use crate::models::{PullRequest, Repository, User};
use crate::rehydrate::{EntityState, OwnerSlot, Rehydrator};
use crate::request::Method;
use crate::sequence::{ItemInitializer, PagedIterable};
use crate::traits::{Decodable, OwnedEntity, Refreshable};

/// Number of files the single-commit endpoint returns per page.
const FILES_PER_PAGE: usize = 300;

/// A file touched by a commit or comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub filename: String,

    #[serde(default)]
    pub previous_filename: Option<String>,

    /// "added", "removed", "modified", "renamed", ...
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub additions: u32,

    #[serde(default)]
    pub deletions: u32,

    #[serde(default)]
    pub changes: u32,

    #[serde(default)]
    pub sha: Option<String>,

    #[serde(default)]
    pub blob_url: Option<String>,

    #[serde(default)]
    pub raw_url: Option<String>,

    /// Unified diff hunk; absent for binary or very large files.
    #[serde(default)]
    pub patch: Option<String>,
}

impl Decodable for CommitFile {}

/// Line counts of a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
}

/// Reference to a parent commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitParent {
    pub sha: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Git-level identity (name/email/date), independent of any account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Tree pointed at by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitTree {
    pub sha: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// The git commit object embedded in an API commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<GitUser>,
    #[serde(default)]
    pub committer: Option<GitUser>,
    #[serde(default)]
    pub tree: Option<GitTree>,
    #[serde(default)]
    pub comment_count: Option<u32>,
}

impl ShortInfo {
    /// When the change was authored.
    pub fn authored_date(&self) -> Option<DateTime<Utc>> {
        self.author.as_ref().and_then(|a| a.date)
    }

    /// When the commit was created.
    pub fn commit_date(&self) -> Option<DateTime<Utc>> {
        self.committer.as_ref().and_then(|c| c.date)
    }
}

/// A commit in a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,

    /// Commit message, on responses that carry it at the top level.
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub parents: Vec<CommitParent>,

    #[serde(default)]
    commit: Option<ShortInfo>,

    #[serde(default)]
    author: Option<User>,

    #[serde(default)]
    committer: Option<User>,

    #[serde(default)]
    files: Option<Vec<CommitFile>>,

    #[serde(default)]
    stats: Option<CommitStats>,

    #[serde(skip)]
    repository: OwnerSlot<Arc<Repository>>,
}

impl Decodable for Commit {}

impl Refreshable for Commit {
    fn carry_unserialized(&mut self, previous: Self) {
        self.repository = previous.repository;
    }
}

impl OwnedEntity for Commit {
    type Owner = Arc<Repository>;

    fn owner_slot(&self) -> &OwnerSlot<Arc<Repository>> {
        &self.repository
    }
}

impl Commit {
    /// The repository this commit belongs to.
    pub fn owner(&self) -> Result<&Arc<Repository>> {
        self.repository.require("commit")
    }

    /// Where this commit is in its lifecycle.
    pub fn state(&self) -> EntityState {
        if !self.repository.is_bound() {
            EntityState::Decoded
        } else if self.files.is_some() || self.stats.is_some() {
            EntityState::Populated
        } else {
            EntityState::Bound
        }
    }

    /// SHAs of the parent commits, without fetching anything.
    pub fn parent_shas(&self) -> Vec<&str> {
        self.parents.iter().map(|p| p.sha.as_str()).collect()
    }

    /// Fetch the full commit if only the partial listing form is present.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Design`] if the commit is not bound to a
    /// repository.
    pub async fn populate(&mut self) -> Result<()> {
        let repo = Arc::clone(self.owner()?);
        if self.state() == EntityState::Populated {
            return Ok(());
        }

        tracing::debug!(sha = %self.sha, "populating commit");
        repo.root()?
            .create_request()
            .with_url_path(repo.api_tail_url(&format!("commits/{}", self.sha)))
            .fetch_into(self)
            .await
    }

    /// The git commit object (message, author/committer identities, tree).
    pub async fn short_info(&mut self) -> Result<&ShortInfo> {
        if self.commit.is_none() {
            self.populate().await?;
        }
        self.commit.as_ref().ok_or_else(|| {
            GitHubError::InvalidContent(format!("commit {} has no commit object", self.sha))
        })
    }

    /// Lines added.
    pub async fn lines_added(&mut self) -> Result<u32> {
        Ok(self.stats().await?.additions)
    }

    /// Lines deleted.
    pub async fn lines_deleted(&mut self) -> Result<u32> {
        Ok(self.stats().await?.deletions)
    }

    /// Lines changed.
    pub async fn lines_changed(&mut self) -> Result<u32> {
        Ok(self.stats().await?.total)
    }

    async fn stats(&mut self) -> Result<CommitStats> {
        self.populate().await?;
        Ok(self.stats.unwrap_or_default())
    }

    /// The account that authored the change, canonical for the session.
    ///
    /// `None` when the author has no GitHub account.
    pub async fn author(&mut self) -> Result<Option<Arc<User>>> {
        self.populate().await?;
        self.resolve_user(self.author.as_ref().map(|u| u.login.clone()))
            .await
    }

    /// The account that created the commit, canonical for the session.
    pub async fn committer(&mut self) -> Result<Option<Arc<User>>> {
        self.populate().await?;
        self.resolve_user(self.committer.as_ref().map(|u| u.login.clone()))
            .await
    }

    /// The embedded account is a summary; the canonical one comes from the client.
    async fn resolve_user(&self, login: Option<String>) -> Result<Option<Arc<User>>> {
        let Some(login) = login else {
            return Ok(None);
        };
        let client = self.owner()?.root()?;
        client.get_user(&login).await.map(Some)
    }

    /// Fetch every parent commit.
    pub async fn parents(&mut self) -> Result<Vec<Commit>> {
        self.populate().await?;
        let repo = Arc::clone(self.owner()?);
        let mut parents = Vec::with_capacity(self.parents.len());
        for sha in self.parent_shas() {
            parents.push(repo.get_commit(sha).await?);
        }
        Ok(parents)
    }

    /// Files touched by this commit.
    ///
    /// The single-commit endpoint pages its file list; when the first page
    /// is full, the remaining pages are fetched lazily.
    pub async fn list_files(&mut self) -> Result<PagedIterable<CommitFile>> {
        self.populate().await?;
        let files = self.files.clone().unwrap_or_default();
        if files.len() < FILES_PER_PAGE {
            return Ok(PagedIterable::from_items(files));
        }

        let repo = self.owner()?;
        repo.root()?
            .create_request()
            .with_url_path(repo.api_tail_url(&format!("commits/{}", self.sha)))
            .to_iterable_with(
                EmbeddedPage::<Commit, _>::new(|c: Commit| c.files.unwrap_or_default()),
                None,
            )
    }

    /// Pull requests associated with this commit.
    pub fn list_pull_requests(&self) -> Result<PagedIterable<PullRequest>> {
        let repo = self.owner()?;
        repo.root()?
            .create_request()
            .with_url_path(repo.api_tail_url(&format!("commits/{}/pulls", self.sha)))
            .to_iterable()
    }

    /// Branches whose head is this commit.
    pub fn list_branches_where_head(&self) -> Result<PagedIterable<Branch>> {
        let repo = self.owner()?;
        repo.root()?
            .create_request()
            .with_url_path(repo.api_tail_url(&format!(
                "commits/{}/branches-where-head",
                self.sha
            )))
            .to_iterable()
    }

    /// Comment on this commit, optionally on a specific line of a file.
    #[tracing::instrument(skip(self, body), fields(sha = %self.sha))]
    pub async fn create_comment(
        &self,
        body: &str,
        path: Option<&str>,
        line: Option<u32>,
        position: Option<u32>,
    ) -> Result<CommitComment> {
        let repo = self.owner()?;
        repo.root()?
            .create_request()
            .method(Method::Post)
            .with("body", body)
            .with("path", path)
            .with("line", line)
            .with("position", position)
            .with_url_path(repo.api_tail_url(&format!("commits/{}/comments", self.sha)))
            .fetch()
            .await
    }
}

/// A bare git commit, as returned by the contents API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<GitUser>,
    #[serde(default)]
    pub committer: Option<GitUser>,
    #[serde(default)]
    pub tree: Option<GitTree>,
    #[serde(default)]
    pub parents: Vec<CommitParent>,
}

impl From<GitCommit> for Commit {
    fn from(git: GitCommit) -> Self {
        Self {
            sha: git.sha,
            url: git.url,
            html_url: git.html_url,
            message: Some(git.message.clone()),
            parents: git.parents,
            commit: Some(ShortInfo {
                message: git.message,
                author: git.author,
                committer: git.committer,
                tree: git.tree,
                comment_count: None,
            }),
            ..Self::default()
        }
    }
}

/// Item initializer attaching commits to `repo`.
pub(crate) fn attach_to(repo: Arc<Repository>) -> ItemInitializer<Commit> {
    Arc::new(move |commit: &mut Commit| Rehydrator::attach_ref(&*commit, &repo))
}

/// A branch name and the commit at its head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: CommitParent,
    #[serde(default)]
    pub protected: bool,
}

impl Decodable for Branch {}

/// A comment on a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitComment {
    pub id: u64,
    pub body: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Summary embedded in the response, not the session's canonical
    /// account; resolve with [`GitHubClient::get_user`](crate::GitHubClient::get_user).
    #[serde(default)]
    pub user: Option<User>,
}

impl Decodable for CommitComment {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GitHubClient;
    use crate::mock_transport::{MockResponse, MockTransport};
    use serde_json::json;

    const COMMIT_URL: &str = "https://api.github.com/repos/octocat/hello-world/commits/abc123";

    fn bound_repo(transport: &Arc<MockTransport>) -> Arc<Repository> {
        let client =
            GitHubClient::with_transport(transport.clone(), "https://api.github.com").unwrap();
        let repo: Repository = serde_json::from_value(json!({
            "id": 1,
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "owner": {"login": "octocat", "id": 1}
        }))
        .unwrap();
        Arc::new(Rehydrator::attach(repo, &client).unwrap())
    }

    fn listed_commit() -> Commit {
        serde_json::from_value(json!({
            "sha": "abc123",
            "commit": {"message": "Fix bug", "author": {"name": "Mona", "date": "2024-01-02T03:04:05Z"}},
            "author": {"login": "octocat", "id": 1},
            "parents": [{"sha": "p1"}, {"sha": "p2"}]
        }))
        .unwrap()
    }

    fn full_commit() -> serde_json::Value {
        json!({
            "sha": "abc123",
            "stats": {"total": 12, "additions": 10, "deletions": 2},
            "files": [{"filename": "src/main.rs", "status": "modified", "additions": 10, "deletions": 2, "changes": 12}]
        })
    }

    #[test]
    fn test_state_transitions_start_decoded() {
        let commit = listed_commit();
        assert_eq!(commit.state(), EntityState::Decoded);
        assert_eq!(commit.parent_shas(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_populated_accessor_on_decoded_commit_is_design_error() {
        let mut commit = listed_commit();
        let err = commit.lines_added().await.unwrap_err();
        assert!(matches!(err, GitHubError::Design(_)));
    }

    #[tokio::test]
    async fn test_populate_merges_into_existing_commit() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(COMMIT_URL, MockResponse::json(full_commit()));
        let repo = bound_repo(&transport);

        let mut commit = Rehydrator::attach(listed_commit(), &repo).unwrap();
        assert_eq!(commit.state(), EntityState::Bound);

        assert_eq!(commit.lines_added().await.unwrap(), 10);
        assert_eq!(commit.state(), EntityState::Populated);
        assert_eq!(commit.lines_changed().await.unwrap(), 12);
        assert_eq!(commit.lines_deleted().await.unwrap(), 2);
        assert_eq!(transport.request_count(), 1);

        // Fields only the listing carried survive the merge.
        let info = commit.short_info().await.unwrap();
        assert_eq!(info.message, "Fix bug");
        assert!(info.authored_date().is_some());
        assert!(commit.owner().is_ok());
    }

    #[tokio::test]
    async fn test_author_is_interned() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(COMMIT_URL, MockResponse::json(full_commit()));
        transport.respond(
            "https://api.github.com/users/octocat",
            MockResponse::json(json!({"login": "octocat", "id": 1, "name": "The Octocat"})),
        );
        let repo = bound_repo(&transport);

        let mut a = Rehydrator::attach(listed_commit(), &repo).unwrap();
        let mut b = Rehydrator::attach(listed_commit(), &repo).unwrap();
        let first = a.author().await.unwrap().unwrap();
        let second = b.author().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(a.committer().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_author_is_the_full_user_record() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(COMMIT_URL, MockResponse::json(full_commit()));
        transport.respond(
            "https://api.github.com/users/octocat",
            MockResponse::json(json!({"login": "octocat", "id": 1, "name": "The Octocat"})),
        );
        let repo = bound_repo(&transport);

        let mut commit = Rehydrator::attach(listed_commit(), &repo).unwrap();
        let author = commit.author().await.unwrap().unwrap();
        assert_eq!(author.name.as_deref(), Some("The Octocat"));

        let client = repo.root().unwrap();
        let user = client.get_user("octocat").await.unwrap();
        assert!(Arc::ptr_eq(&author, &user));
        assert_eq!(user.name.as_deref(), Some("The Octocat"));

        let user_requests = transport
            .requested_urls()
            .into_iter()
            .filter(|url| url.ends_with("/users/octocat"))
            .count();
        assert_eq!(user_requests, 1);
    }

    #[tokio::test]
    async fn test_list_files_uses_populated_files() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(COMMIT_URL, MockResponse::json(full_commit()));
        let repo = bound_repo(&transport);

        let mut commit = Rehydrator::attach(listed_commit(), &repo).unwrap();
        let files = commit.list_files().await.unwrap().to_list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "src/main.rs");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_create_comment_posts_body() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            "https://api.github.com/repos/octocat/hello-world/commits/abc123/comments",
            MockResponse::json(json!({"id": 7, "body": "LGTM", "line": 3})).with_status(201),
        );
        let repo = bound_repo(&transport);
        let commit = Rehydrator::attach(listed_commit(), &repo).unwrap();

        let comment = commit
            .create_comment("LGTM", Some("src/main.rs"), Some(3), None)
            .await
            .unwrap();
        assert_eq!(comment.id, 7);

        let request = &transport.requests()[0];
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"body": "LGTM", "path": "src/main.rs", "line": 3}));
    }
}
