//! Repository statistics.
//!
//! GitHub computes these lazily. Until a result is cached the endpoints may
//! answer with an empty object instead of the expected array; for code
//! frequency that answer is reported as `None` rather than an error.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Repository, User};
use crate::sequence::PagedIterable;
use crate::traits::Decodable;

/// Weekly additions and deletions. Decoded from `[week, additions, deletions]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 3]")]
pub struct CodeFrequency {
    /// Unix timestamp of the start of the week.
    pub week: i64,
    pub additions: i64,
    /// Negative, as reported by the API.
    pub deletions: i64,
}

impl From<[i64; 3]> for CodeFrequency {
    fn from([week, additions, deletions]: [i64; 3]) -> Self {
        Self {
            week,
            additions,
            deletions,
        }
    }
}

impl fmt::Display for CodeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Week starting {} has {} additions and {} deletions",
            self.week,
            self.additions,
            self.deletions.abs()
        )
    }
}

impl Decodable for CodeFrequency {}

/// Commits per hour of the week. Decoded from `[day, hour, commits]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 3]")]
pub struct PunchCardItem {
    /// 0 = Sunday.
    pub day_of_week: u32,
    pub hour_of_day: u32,
    pub number_of_commits: u32,
}

impl From<[u32; 3]> for PunchCardItem {
    fn from([day_of_week, hour_of_day, number_of_commits]: [u32; 3]) -> Self {
        Self {
            day_of_week,
            hour_of_day,
            number_of_commits,
        }
    }
}

impl fmt::Display for PunchCardItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Day {} Hour {}: {} commits",
            self.day_of_week, self.hour_of_day, self.number_of_commits
        )
    }
}

impl Decodable for PunchCardItem {}

/// Commit counts for one week, per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivity {
    /// Commits per day, Sunday first.
    pub days: Vec<u32>,
    pub total: u32,
    /// Unix timestamp of the start of the week.
    pub week: i64,
}

impl Decodable for CommitActivity {}

/// One contributor's weekly activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorStats {
    /// Summary embedded in the response, not the session's canonical
    /// account; resolve with [`GitHubClient::get_user`](crate::GitHubClient::get_user).
    #[serde(default)]
    pub author: Option<User>,
    pub total: u32,
    #[serde(default)]
    pub weeks: Vec<Week>,
}

impl ContributorStats {
    /// The week starting at `timestamp`.
    pub fn week(&self, timestamp: i64) -> Option<&Week> {
        self.weeks.iter().find(|w| w.start == timestamp)
    }
}

impl fmt::Display for ContributorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let login = self.author.as_ref().map_or("(unknown)", |a| a.login.as_str());
        write!(
            f,
            "{login} made {} contributions over {} weeks",
            self.total,
            self.weeks.len()
        )
    }
}

impl Decodable for ContributorStats {}

/// A contributor's activity in one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    #[serde(rename = "w")]
    pub start: i64,
    #[serde(rename = "a")]
    pub additions: u32,
    #[serde(rename = "d")]
    pub deletions: u32,
    #[serde(rename = "c")]
    pub commits: u32,
}

/// Weekly commit counts for the last year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    /// Commits by everyone, oldest week first.
    pub all: Vec<u32>,
    /// Commits by the repository owner.
    pub owner: Vec<u32>,
}

impl Decodable for Participation {}

/// Access to `/repos/{owner}/{repo}/stats/*`.
#[derive(Debug, Clone)]
pub struct RepositoryStatistics {
    repo: Arc<Repository>,
}

impl RepositoryStatistics {
    pub(crate) fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    fn tail(&self, name: &str) -> String {
        self.repo.api_tail_url(&format!("stats/{name}"))
    }

    /// Weekly additions and deletions.
    ///
    /// Returns `None` while GitHub is still computing the data.
    #[tracing::instrument(skip(self), fields(repo = %self.repo.full_name))]
    pub async fn code_frequency(&self) -> Result<Option<Vec<CodeFrequency>>> {
        self.repo
            .root()?
            .create_request()
            .with_url_path(self.tail("code_frequency"))
            .fetch_array_or_not_ready()
            .await
    }

    /// Commit activity for the last year, one item per week.
    pub fn commit_activity(&self) -> Result<PagedIterable<CommitActivity>> {
        self.repo
            .root()?
            .create_request()
            .with_url_path(self.tail("commit_activity"))
            .to_iterable()
    }

    /// Per-contributor totals and weekly activity.
    pub fn contributor_stats(&self) -> Result<PagedIterable<ContributorStats>> {
        self.repo
            .root()?
            .create_request()
            .with_url_path(self.tail("contributors"))
            .to_iterable()
    }

    /// Weekly commit counts for everyone and for the owner.
    #[tracing::instrument(skip(self), fields(repo = %self.repo.full_name))]
    pub async fn participation(&self) -> Result<Participation> {
        self.repo
            .root()?
            .create_request()
            .with_url_path(self.tail("participation"))
            .fetch()
            .await
    }

    /// Commits per hour of each weekday.
    #[tracing::instrument(skip(self), fields(repo = %self.repo.full_name))]
    pub async fn punch_card(&self) -> Result<Vec<PunchCardItem>> {
        self.repo
            .root()?
            .create_request()
            .with_url_path(self.tail("punch_card"))
            .fetch()
            .await
    }
}
