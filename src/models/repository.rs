//! Repository model.
//!
//! A [`Repository`] is bound to the client that fetched it. Entities it hands
//! out (commits, comparisons, contents, deployments, issues) are bound to a
//! shared copy of the repository in turn.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::GitHubClient;
use crate::error::Result;
use crate::models::{
    Commit, Compare, Content, Deployment, IssueQueryBuilder, RepositoryStatistics, User,
};
use crate::rehydrate::{OwnerSlot, Rehydrator};
use crate::sequence::PagedIterable;
use crate::traits::{Decodable, OwnedEntity};

/// A GitHub repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,

    /// Short name (e.g., "hello-world").
    pub name: String,

    /// Owner and name (e.g., "octocat/hello-world").
    pub full_name: String,

    /// The owning account.
    ///
    /// Summary embedded in the response, not the session's canonical
    /// account; resolve with [`GitHubClient::get_user`](crate::GitHubClient::get_user).
    pub owner: User,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub fork: bool,

    #[serde(default)]
    pub default_branch: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(default)]
    pub stargazers_count: u32,

    #[serde(skip)]
    client: OwnerSlot<GitHubClient>,
}

impl Decodable for Repository {}

impl OwnedEntity for Repository {
    type Owner = GitHubClient;

    fn owner_slot(&self) -> &OwnerSlot<GitHubClient> {
        &self.client
    }
}

impl Repository {
    /// The client this repository was fetched through.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Design`](crate::GitHubError::Design) if the
    /// repository was decoded without being attached to a client.
    pub fn root(&self) -> Result<&GitHubClient> {
        self.client.require("repository")
    }

    /// Login of the owning account.
    pub fn owner_name(&self) -> &str {
        &self.owner.login
    }

    /// API path of `tail` below this repository.
    pub fn api_tail_url(&self, tail: &str) -> String {
        let tail = tail.trim_start_matches('/');
        if tail.is_empty() {
            format!("repos/{}/{}", self.owner.login, self.name)
        } else {
            format!("repos/{}/{}/{tail}", self.owner.login, self.name)
        }
    }

    fn shared(&self) -> Arc<Repository> {
        Arc::new(self.clone())
    }

    /// Get a single commit.
    #[tracing::instrument(skip(self), fields(repo = %self.full_name))]
    pub async fn get_commit(&self, sha: &str) -> Result<Commit> {
        let commit: Commit = self
            .root()?
            .create_request()
            .with_url_path(self.api_tail_url(&format!("commits/{sha}")))
            .fetch()
            .await?;
        Rehydrator::attach(commit, &self.shared())
    }

    /// List commits, newest first.
    pub fn list_commits(&self) -> Result<PagedIterable<Commit>> {
        let repo = self.shared();
        self.root()?
            .create_request()
            .with_url_path(self.api_tail_url("commits"))
            .to_iterable_init(move |commit: &mut Commit| Rehydrator::attach_ref(&*commit, &repo))
    }

    /// Compare two refs, listing commits from the response body.
    pub async fn get_compare(&self, base: &str, head: &str) -> Result<Compare> {
        self.get_compare_with(base, head, false).await
    }

    /// Compare two refs.
    ///
    /// With `paginated_commits` the comparison's commit listing pages through
    /// the compare endpoint instead of reading the commits embedded in this
    /// one response (which GitHub caps at 250).
    #[tracing::instrument(skip(self), fields(repo = %self.full_name))]
    pub async fn get_compare_with(
        &self,
        base: &str,
        head: &str,
        paginated_commits: bool,
    ) -> Result<Compare> {
        let compare: Compare = self
            .root()?
            .create_request()
            .inject_context(Compare::PAGINATED_COMMITS, paginated_commits)
            .with_url_path(self.api_tail_url(&format!(
                "compare/{}...{}",
                urlencoding::encode(base),
                urlencoding::encode(head)
            )))
            .fetch()
            .await?;
        Rehydrator::attach(compare, &self.shared())
    }

    /// Access the statistics endpoints.
    pub fn statistics(&self) -> RepositoryStatistics {
        RepositoryStatistics::new(self.shared())
    }

    /// List deployments.
    pub fn list_deployments(&self) -> Result<PagedIterable<Deployment>> {
        let repo = self.shared();
        self.root()?
            .create_request()
            .with_url_path(self.api_tail_url("deployments"))
            .to_iterable_init(move |d: &mut Deployment| Rehydrator::attach_ref(&*d, &repo))
    }

    /// Get a file's content, optionally at a given ref.
    #[tracing::instrument(skip(self), fields(repo = %self.full_name))]
    pub async fn get_file_content(&self, path: &str, git_ref: Option<&str>) -> Result<Content> {
        let content: Content = self
            .root()?
            .create_request()
            .with_url_path(Content::api_route(self, path))
            .with("ref", git_ref)
            .fetch()
            .await?;
        Rehydrator::attach(content, &self.shared())
    }

    /// List the entries of a directory, optionally at a given ref.
    #[tracing::instrument(skip(self), fields(repo = %self.full_name))]
    pub async fn get_directory_content(
        &self,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<Content>> {
        let entries: Vec<Content> = self
            .root()?
            .create_request()
            .with_url_path(Content::api_route(self, path))
            .with("ref", git_ref)
            .fetch()
            .await?;
        Rehydrator::attach_all(entries, &self.shared())
    }

    /// Start a query over this repository's issues.
    pub fn query_issues(&self) -> Result<IssueQueryBuilder> {
        IssueQueryBuilder::new(self.shared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, ContextBindings};
    use crate::GitHubError;
    use serde_json::json;

    fn repository() -> Repository {
        serde_json::from_value(json!({
            "id": 1296269,
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "owner": {"login": "octocat", "id": 1}
        }))
        .unwrap()
    }

    #[test]
    fn test_api_tail_url() {
        let repo = repository();
        assert_eq!(repo.api_tail_url("commits"), "repos/octocat/hello-world/commits");
        assert_eq!(
            repo.api_tail_url("/stats/punch_card"),
            "repos/octocat/hello-world/stats/punch_card"
        );
        assert_eq!(repo.api_tail_url(""), "repos/octocat/hello-world");
    }

    #[test]
    fn test_unattached_repository_cannot_reach_the_api() {
        let repo: Repository = decode(
            br#"{"id": 1, "name": "r", "full_name": "o/r", "owner": {"login": "o", "id": 2}}"#,
            &ContextBindings::new(),
        )
        .unwrap();
        assert!(matches!(repo.root(), Err(GitHubError::Design(_))));
        assert!(matches!(repo.list_commits(), Err(GitHubError::Design(_))));
    }

    #[test]
    fn test_owner_slot_is_not_serialized() {
        let client = GitHubClient::new(None, "https://api.github.com").unwrap();
        let repo = Rehydrator::attach(repository(), &client).unwrap();
        let value = serde_json::to_value(&repo).unwrap();
        assert!(value.get("client").is_none());
        assert_eq!(repo, repository());
    }
}
