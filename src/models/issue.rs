//! Issues and the repository issue query.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Reaction, Repository, User};
use crate::rehydrate::{OwnerSlot, Rehydrator};
use crate::request::ParamValue;
use crate::requester::Requester;
use crate::sequence::PagedIterable;
use crate::traits::{Decodable, OwnedEntity};

/// Issue state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    /// Query-only: match both open and closed issues.
    All,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

impl From<IssueState> for ParamValue {
    fn from(v: IssueState) -> Self {
        ParamValue::from(v.as_str())
    }
}

/// Sort key for issue queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSort {
    Created,
    Updated,
    Comments,
}

impl IssueSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Comments => "comments",
        }
    }
}

impl From<IssueSort> for ParamValue {
    fn from(v: IssueSort) -> Self {
        ParamValue::from(v.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl From<Direction> for ParamValue {
    fn from(v: Direction) -> Self {
        ParamValue::from(v.as_str())
    }
}

/// An issue label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: bool,
}

/// An issue (or pull request, which the issues API also returns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,

    pub number: u64,

    pub title: String,

    pub state: IssueState,

    #[serde(default)]
    pub body: Option<String>,

    /// Summary embedded in the response, not the session's canonical
    /// account; resolve with [`GitHubClient::get_user`](crate::GitHubClient::get_user).
    #[serde(default)]
    pub user: Option<User>,

    #[serde(default)]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub comments: u32,

    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,

    /// Present when the issue is a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pull_request: Option<serde_json::Value>,

    #[serde(skip)]
    repository: OwnerSlot<Arc<Repository>>,
}

impl Decodable for Issue {}

impl OwnedEntity for Issue {
    type Owner = Arc<Repository>;

    fn owner_slot(&self) -> &OwnerSlot<Arc<Repository>> {
        &self.repository
    }
}

impl Issue {
    /// The repository this issue belongs to.
    pub fn owner(&self) -> Result<&Arc<Repository>> {
        self.repository.require("issue")
    }

    /// Returns true if this issue is a pull request.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// Label names, in API order.
    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(|l| l.name.as_str()).collect()
    }

    /// Reactions to this issue.
    pub fn list_reactions(&self) -> Result<PagedIterable<Reaction>> {
        let repo = self.owner()?;
        repo.root()?
            .create_request()
            .with_url_path(repo.api_tail_url(&format!("issues/{}/reactions", self.number)))
            .to_iterable()
    }
}

/// Query over a repository's issues.
///
/// # Example
///
/// ```ignore
/// let issues = repo
///     .query_issues()?
///     .state(IssueState::Open)
///     .label("bug")
///     .label("ui")
///     .sort(IssueSort::Updated)
///     .list()?
///     .to_list()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct IssueQueryBuilder {
    repo: Arc<Repository>,
    req: Requester,
}

impl IssueQueryBuilder {
    pub(crate) fn new(repo: Arc<Repository>) -> Result<Self> {
        let req = repo.root()?.create_request();
        Ok(Self { repo, req })
    }

    fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.req = self.req.with(name, value);
        self
    }

    #[must_use]
    pub fn state(self, state: IssueState) -> Self {
        self.with("state", state)
    }

    /// Require a label. Repeated calls accumulate; blank labels are ignored.
    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        if !label.trim().is_empty() {
            self.req = self.req.append("labels", label);
        }
        self
    }

    #[must_use]
    pub fn sort(self, sort: IssueSort) -> Self {
        self.with("sort", sort)
    }

    #[must_use]
    pub fn direction(self, direction: Direction) -> Self {
        self.with("direction", direction)
    }

    /// Only issues updated at or after `since`.
    #[must_use]
    pub fn since(self, since: DateTime<Utc>) -> Self {
        self.with("since", since)
    }

    /// Only issues mentioning `login`.
    #[must_use]
    pub fn mentioned(self, login: &str) -> Self {
        self.with("mentioned", login)
    }

    /// Milestone number, `"*"` (any) or `"none"`.
    #[must_use]
    pub fn milestone(self, milestone: &str) -> Self {
        self.with("milestone", milestone)
    }

    /// Login of the assignee, `"*"` or `"none"`.
    #[must_use]
    pub fn assignee(self, login: &str) -> Self {
        self.with("assignee", login)
    }

    #[must_use]
    pub fn creator(self, login: &str) -> Self {
        self.with("creator", login)
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.req = self.req.page_size(page_size);
        self
    }

    /// The matching issues, attached to the repository.
    pub fn list(self) -> Result<PagedIterable<Issue>> {
        let repo = self.repo;
        let path = repo.api_tail_url("issues");
        self.req
            .with_url_path(path)
            .to_iterable_init(move |issue: &mut Issue| Rehydrator::attach_ref(&*issue, &repo))
    }
}
