//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the ghapi binary.

use clap::{Parser, Subcommand, ValueEnum};

use crate::IssueState;

/// GitHub API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "ghapi", about = "GitHub API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List commits of a repository, newest first.
    Commits {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Stop after this many commits.
        #[arg(long, default_value = "30")]
        limit: usize,
    },

    /// Compare two refs.
    Compare {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Base ref.
        base: String,

        /// Head ref.
        head: String,

        /// Page through the commits instead of reading them from the comparison.
        #[arg(long)]
        paginated: bool,
    },

    /// List issues of a repository.
    Issues {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Issue state.
        #[arg(long, value_enum, default_value = "open")]
        state: StateArg,

        /// Required label (repeatable).
        #[arg(long = "label")]
        labels: Vec<String>,

        /// Stop after this many issues.
        #[arg(long, default_value = "30")]
        limit: usize,
    },

    /// Show repository statistics.
    Stats {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Which statistic to show.
        #[arg(value_enum)]
        kind: StatKind,
    },
}

/// An `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl std::str::FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("expected owner/name, got '{s}'")),
        }
    }
}

/// Issue state filter.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateArg {
    Open,
    Closed,
    All,
}

impl From<StateArg> for IssueState {
    fn from(v: StateArg) -> Self {
        match v {
            StateArg::Open => IssueState::Open,
            StateArg::Closed => IssueState::Closed,
            StateArg::All => IssueState::All,
        }
    }
}

/// Repository statistics that can be shown.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatKind {
    /// Weekly additions and deletions.
    CodeFrequency,
    /// Weekly commit counts, everyone vs owner.
    Participation,
    /// Commits per hour of the week.
    PunchCard,
    /// Per-contributor totals.
    #[value(alias = "contributor-stats")]
    Contributors,
}
