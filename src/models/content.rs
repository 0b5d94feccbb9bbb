//! File and directory contents.
//!
//! Directory listings return entries without `content`; the encoded content
//! and download URL are fetched on first access by refreshing the entry from
//! its own URL.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{GitHubError, Result};
use crate::models::commit::GitCommit;
use crate::models::{Commit, Repository};
use crate::rehydrate::{OwnerSlot, Rehydrator};
use crate::request::Method;
use crate::sequence::PagedIterable;
use crate::traits::{Decodable, OwnedEntity, Refreshable};

/// A file, directory, symlink or submodule in a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub name: String,

    pub path: String,

    pub sha: String,

    #[serde(default)]
    pub size: u64,

    /// "file", "dir", "symlink" or "submodule".
    #[serde(rename = "type")]
    pub kind: String,

    /// API URL of this entry.
    pub url: String,

    #[serde(default)]
    pub html_url: Option<String>,

    /// Blob URL.
    #[serde(default)]
    pub git_url: Option<String>,

    /// Symlink target.
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub encoding: Option<String>,

    #[serde(default)]
    content: Option<String>,

    #[serde(default)]
    download_url: Option<String>,

    #[serde(skip)]
    repository: OwnerSlot<Arc<Repository>>,
}

impl Decodable for Content {}

impl Refreshable for Content {
    fn carry_unserialized(&mut self, previous: Self) {
        self.repository = previous.repository;
    }
}

impl OwnedEntity for Content {
    type Owner = Arc<Repository>;

    fn owner_slot(&self) -> &OwnerSlot<Arc<Repository>> {
        &self.repository
    }
}

impl Content {
    pub(crate) fn api_route(repo: &Repository, path: &str) -> String {
        match path.trim_matches('/') {
            "" => repo.api_tail_url("contents"),
            path => repo.api_tail_url(&format!("contents/{path}")),
        }
    }

    /// The repository this entry belongs to.
    pub fn owner(&self) -> Result<&Arc<Repository>> {
        self.repository.require("content")
    }

    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }

    pub fn is_directory(&self) -> bool {
        self.kind == "dir"
    }

    /// Re-fetch this entry from its own URL, merging the result in place.
    #[tracing::instrument(skip(self), fields(path = %self.path))]
    pub async fn refresh(&mut self) -> Result<()> {
        let repo = Arc::clone(self.owner()?);
        let url = self.url.clone();
        repo.root()?
            .create_request()
            .with_raw_url(url)
            .fetch_into(self)
            .await
    }

    /// Raw download URL, fetched on first access.
    pub async fn download_url(&mut self) -> Result<Option<&str>> {
        if self.download_url.is_none() {
            self.refresh().await?;
        }
        Ok(self.download_url.as_deref())
    }

    /// Encoded content as sent by the API, fetched on first access.
    pub async fn encoded_content(&mut self) -> Result<Option<&str>> {
        if self.content.is_none() {
            self.refresh().await?;
        }
        Ok(self.content.as_deref())
    }

    /// Decoded file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::InvalidContent`] if the entry has no content or
    /// an encoding other than base64.
    pub async fn read(&mut self) -> Result<Vec<u8>> {
        if self.content.is_none() {
            self.refresh().await?;
        }
        let Some(encoded) = &self.content else {
            return Err(GitHubError::InvalidContent(format!(
                "{} has no content",
                self.path
            )));
        };
        // The API wraps base64 at 60 columns.
        let compact: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        match self.encoding.as_deref() {
            Some("base64") => STANDARD.decode(compact).map_err(|e| {
                GitHubError::InvalidContent(format!("{}: invalid base64: {e}", self.path))
            }),
            other => Err(GitHubError::InvalidContent(format!(
                "{}: unrecognized encoding {:?}",
                self.path, other
            ))),
        }
    }

    /// Entries of this directory.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::State`] if this entry is not a directory.
    pub fn list_directory_content(&self) -> Result<PagedIterable<Content>> {
        if !self.is_directory() {
            return Err(GitHubError::State(format!(
                "{} is not a directory",
                self.path
            )));
        }
        let repo = Arc::clone(self.owner()?);
        repo.root()?
            .create_request()
            .with_raw_url(&self.url)
            .to_iterable_init(move |c: &mut Content| Rehydrator::attach_ref(&*c, &repo))
    }

    /// Commit new content for this file.
    #[tracing::instrument(skip(self, new_content), fields(path = %self.path))]
    pub async fn update(
        &mut self,
        new_content: &[u8],
        message: &str,
        branch: Option<&str>,
    ) -> Result<ContentUpdateResponse> {
        let repo = Arc::clone(self.owner()?);
        let encoded = STANDARD.encode(new_content);

        let response: ContentUpdateResponse = repo
            .root()?
            .create_request()
            .method(Method::Put)
            .with("path", &self.path)
            .with("message", message)
            .with("sha", &self.sha)
            .with("content", &encoded)
            .with("branch", branch)
            .with_url_path(Self::api_route(&repo, &self.path))
            .fetch()
            .await?;

        let response = response.attach(&repo)?;
        self.content = Some(encoded);
        Ok(response)
    }

    /// Delete this file in a new commit.
    #[tracing::instrument(skip(self), fields(path = %self.path))]
    pub async fn delete(&self, message: &str, branch: Option<&str>) -> Result<ContentUpdateResponse> {
        let repo = self.owner()?;
        let response: ContentUpdateResponse = repo
            .root()?
            .create_request()
            .method(Method::Delete)
            .with("path", &self.path)
            .with("message", message)
            .with("sha", &self.sha)
            .with("branch", branch)
            .with_url_path(Self::api_route(repo, &self.path))
            .fetch()
            .await?;
        response.attach(repo)
    }
}

#[derive(Deserialize)]
struct RawUpdateResponse {
    #[serde(default)]
    content: Option<Content>,
    commit: GitCommit,
}

/// Result of creating, updating or deleting a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawUpdateResponse")]
pub struct ContentUpdateResponse {
    /// The new content; `None` after a delete.
    pub content: Option<Content>,
    /// The commit that made the change.
    pub commit: Commit,
}

impl From<RawUpdateResponse> for ContentUpdateResponse {
    fn from(raw: RawUpdateResponse) -> Self {
        Self {
            content: raw.content,
            commit: raw.commit.into(),
        }
    }
}

impl Decodable for ContentUpdateResponse {}

impl ContentUpdateResponse {
    fn attach(self, repo: &Arc<Repository>) -> Result<Self> {
        if let Some(content) = &self.content {
            Rehydrator::attach_ref(content, repo)?;
        }
        Rehydrator::attach_ref(&self.commit, repo)?;
        Ok(self)
    }
}
