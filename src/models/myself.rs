//! The authenticated user.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::GitHubClient;
use crate::error::Result;
use crate::models::{Organization, Repository};
use crate::rehydrate::{OwnerSlot, Rehydrator};
use crate::request::ParamValue;
use crate::sequence::PagedIterable;
use crate::traits::{Decodable, OwnedEntity};

/// Which of the user's repositories to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepositoryListFilter {
    #[default]
    All,
    Owner,
    Member,
    Public,
    Private,
}

impl RepositoryListFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Owner => "owner",
            Self::Member => "member",
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl From<RepositoryListFilter> for ParamValue {
    fn from(v: RepositoryListFilter) -> Self {
        ParamValue::from(v.as_str())
    }
}

/// An email address of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub visibility: Option<String>,
}

impl Decodable for Email {}

/// The user the client is authenticated as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Myself {
    pub login: String,

    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(skip)]
    client: OwnerSlot<GitHubClient>,
}

impl Decodable for Myself {}

impl OwnedEntity for Myself {
    type Owner = GitHubClient;

    fn owner_slot(&self) -> &OwnerSlot<GitHubClient> {
        &self.client
    }
}

impl Myself {
    pub fn root(&self) -> Result<&GitHubClient> {
        self.client.require("authenticated user")
    }

    pub fn list_emails(&self) -> Result<PagedIterable<Email>> {
        self.root()?
            .create_request()
            .with_url_path("user/emails")
            .to_iterable()
    }

    /// Email addresses of the user.
    pub async fn emails(&self) -> Result<Vec<String>> {
        let emails = self.list_emails()?.to_list().await?;
        Ok(emails.into_iter().map(|e| e.email).collect())
    }

    /// Repositories visible to the user, filtered by affiliation.
    ///
    /// A `page_size` of 0 leaves the page size to the client default.
    pub fn list_repositories(
        &self,
        page_size: u32,
        filter: RepositoryListFilter,
    ) -> Result<PagedIterable<Repository>> {
        let client = self.root()?.clone();
        self.root()?
            .create_request()
            .with_url_path("user/repos")
            .with("type", filter)
            .page_size(page_size)
            .to_iterable_init(move |repo: &mut Repository| Rehydrator::attach_ref(&*repo, &client))
    }

    /// Every repository visible to the user, at the client's page size.
    pub fn repositories(&self) -> Result<PagedIterable<Repository>> {
        self.list_repositories(0, RepositoryListFilter::All)
    }

    /// Every repository visible to the user, keyed by name.
    ///
    /// Repositories from different owners sharing a name collapse to the
    /// last one listed.
    pub async fn all_repositories(&self) -> Result<BTreeMap<String, Repository>> {
        let repos = self.repositories()?.to_list().await?;
        Ok(repos
            .into_iter()
            .map(|repo| (repo.name.clone(), repo))
            .collect())
    }

    /// Organizations the user belongs to, one canonical instance per login.
    ///
    /// The listing only carries summaries, so each organization is resolved
    /// through [`GitHubClient::get_organization`].
    #[tracing::instrument(skip(self), fields(login = %self.login))]
    pub async fn organizations(&self) -> Result<Vec<Arc<Organization>>> {
        let client = self.root()?;
        let listed: Vec<Organization> = client
            .create_request()
            .with_url_path("user/orgs")
            .to_iterable()?
            .to_list()
            .await?;

        let mut seen = BTreeSet::new();
        let mut orgs = Vec::new();
        for org in listed {
            if seen.insert(org.login.clone()) {
                orgs.push(client.get_organization(&org.login).await?);
            }
        }
        Ok(orgs)
    }
}
