//! Comparison between two refs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decode::{ContextBindings, EmbeddedPage};
use crate::error::Result;
use crate::models::commit::attach_to;
use crate::models::{Commit, CommitFile, Repository};
use crate::rehydrate::{OwnerSlot, Rehydrator};
use crate::sequence::PagedIterable;
use crate::traits::{Decodable, OwnedEntity};

/// Page size the compare endpoint needs when commits are paginated.
const DEFAULT_COMMIT_PAGE_SIZE: u32 = 10;

/// Page size used when materializing every commit.
const MATERIALIZE_PAGE_SIZE: u32 = 100;

/// How `head` relates to `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareStatus {
    Ahead,
    Behind,
    Diverged,
    Identical,
}

/// Where a comparison reads its commit listing from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitListing {
    /// The commits array embedded in the comparison response.
    #[default]
    LegacyArray,
    /// Page through the compare endpoint itself.
    Paginated,
}

impl CommitListing {
    fn from_context(context: &ContextBindings) -> Self {
        match context.get_bool(Compare::PAGINATED_COMMITS) {
            Some(true) => Self::Paginated,
            _ => Self::LegacyArray,
        }
    }
}

/// The result of comparing two refs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compare {
    pub status: CompareStatus,

    #[serde(default)]
    pub ahead_by: u32,

    #[serde(default)]
    pub behind_by: u32,

    #[serde(default)]
    pub total_commits: u32,

    pub base_commit: Commit,

    pub merge_base_commit: Commit,

    #[serde(default)]
    commits: Vec<Commit>,

    #[serde(default)]
    pub files: Vec<CommitFile>,

    pub url: String,

    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(default)]
    pub permalink_url: Option<String>,

    #[serde(default)]
    pub diff_url: Option<String>,

    #[serde(default)]
    pub patch_url: Option<String>,

    #[serde(skip)]
    listing: CommitListing,

    #[serde(skip)]
    repository: OwnerSlot<Arc<Repository>>,
}

impl Compare {
    /// Context key selecting [`CommitListing::Paginated`].
    pub const PAGINATED_COMMITS: &'static str = "compare.paginated_commits";

    /// Which listing strategy this comparison was decoded with.
    pub fn listing(&self) -> CommitListing {
        self.listing
    }

    /// The repository the comparison was made in.
    pub fn owner(&self) -> Result<&Arc<Repository>> {
        self.repository.require("comparison")
    }

    /// Commits between the two refs, oldest first.
    ///
    /// In paginated mode the listing re-requests the comparison page by
    /// page (10 commits per page unless reconfigured); otherwise it serves
    /// the commits embedded in this response.
    pub fn list_commits(&self) -> Result<PagedIterable<Commit>> {
        match self.listing {
            CommitListing::LegacyArray => Ok(PagedIterable::from_items(self.commits.clone())),
            CommitListing::Paginated => {
                let repo = self.owner()?;
                repo.root()?
                    .create_request()
                    .inject_context(Self::PAGINATED_COMMITS, true)
                    .with_raw_url(&self.url)
                    .page_size(DEFAULT_COMMIT_PAGE_SIZE)
                    .to_iterable_with(
                        EmbeddedPage::<Compare, _>::new(|c: Compare| c.commits),
                        Some(attach_to(Arc::clone(repo))),
                    )
            }
        }
    }

    /// Every commit between the two refs.
    pub async fn commits(&self) -> Result<Vec<Commit>> {
        self.list_commits()?
            .with_page_size(MATERIALIZE_PAGE_SIZE)?
            .to_list()
            .await
    }
}

impl Decodable for Compare {
    fn bind_context(&mut self, context: &ContextBindings) {
        self.listing = CommitListing::from_context(context);
    }
}

impl OwnedEntity for Compare {
    type Owner = Arc<Repository>;

    fn owner_slot(&self) -> &OwnerSlot<Arc<Repository>> {
        &self.repository
    }

    fn attach_nested(&self, owner: &Arc<Repository>) -> Result<()> {
        Rehydrator::attach_ref(&self.base_commit, owner)?;
        Rehydrator::attach_ref(&self.merge_base_commit, owner)?;
        for commit in &self.commits {
            Rehydrator::attach_ref(commit, owner)?;
        }
        Ok(())
    }
}
