//! GitHub API CLI binary.
//!
//! A command-line interface for browsing repositories through the GitHub API.

use chrono::DateTime;
use clap::Parser;
use ghapi::cli::{Cli, Command, RepoSlug, StatKind, StateArg};
use ghapi::output::PrettyPrint;
use ghapi::{Commit, GitHubClient, Issue, PagedIterable, Repository};
use serde::Serialize;
use std::process::ExitCode;
use tabled::{Table, Tabled};

/// Largest page the API serves.
const MAX_PAGE_SIZE: usize = 100;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match GitHubClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Check GITHUB_API_URL and GITHUB_PAGE_SIZE");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &GitHubClient, cli: Cli) -> ghapi::Result<()> {
    match cli.command {
        Command::Commits { repo, limit } => handle_commits(client, &repo, limit, cli.json).await,
        Command::Compare {
            repo,
            base,
            head,
            paginated,
        } => handle_compare(client, &repo, &base, &head, paginated, cli.json).await,
        Command::Issues {
            repo,
            state,
            labels,
            limit,
        } => handle_issues(client, &repo, state, &labels, limit, cli.json).await,
        Command::Stats { repo, kind } => handle_stats(client, &repo, kind, cli.json).await,
    }
}

async fn repository(client: &GitHubClient, slug: &RepoSlug) -> ghapi::Result<Repository> {
    client.get_repository(&slug.owner, &slug.name).await
}

/// Iterate `seq` lazily, stopping once `limit` items are collected.
async fn take<T>(seq: PagedIterable<T>, limit: usize) -> ghapi::Result<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let seq = seq.with_page_size(limit.clamp(1, MAX_PAGE_SIZE) as u32)?;
    let mut iter = seq.iter();
    let mut items = Vec::new();
    while items.len() < limit {
        match iter.try_next().await? {
            Some(item) => items.push(item),
            None => break,
        }
    }
    Ok(items)
}

async fn handle_commits(
    client: &GitHubClient,
    slug: &RepoSlug,
    limit: usize,
    json: bool,
) -> ghapi::Result<()> {
    let repo = repository(client, slug).await?;
    let mut commits = take(repo.list_commits()?, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&commits)?);
        return Ok(());
    }

    let mut rows = Vec::with_capacity(commits.len());
    for commit in &mut commits {
        rows.push(CommitRow::from_commit(commit).await?);
    }
    println!("{}", Table::new(rows));
    Ok(())
}

async fn handle_compare(
    client: &GitHubClient,
    slug: &RepoSlug,
    base: &str,
    head: &str,
    paginated: bool,
    json: bool,
) -> ghapi::Result<()> {
    let repo = repository(client, slug).await?;
    let compare = repo.get_compare_with(base, head, paginated).await?;
    let mut commits = compare.commits().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&compare)?);
        return Ok(());
    }

    println!("{}\n", compare.pretty_print());
    let mut rows = Vec::with_capacity(commits.len());
    for commit in &mut commits {
        rows.push(CommitRow::from_commit(commit).await?);
    }
    println!("{}", Table::new(rows));
    Ok(())
}

async fn handle_issues(
    client: &GitHubClient,
    slug: &RepoSlug,
    state: StateArg,
    labels: &[String],
    limit: usize,
    json: bool,
) -> ghapi::Result<()> {
    let repo = repository(client, slug).await?;
    let query = labels
        .iter()
        .fold(repo.query_issues()?.state(state.into()), |q, label| {
            q.label(label)
        });
    let issues = take(query.list()?, limit).await?;
    output_list(&issues, json, |i| IssueRow::from(i))
}

async fn handle_stats(
    client: &GitHubClient,
    slug: &RepoSlug,
    kind: StatKind,
    json: bool,
) -> ghapi::Result<()> {
    let repo = repository(client, slug).await?;
    let stats = repo.statistics();

    match kind {
        StatKind::CodeFrequency => match stats.code_frequency().await? {
            Some(weeks) => output_list(&weeks, json, |w| CodeFrequencyRow {
                week: format_week(w.week),
                additions: w.additions,
                deletions: w.deletions.abs(),
            })?,
            None => eprintln!("Statistics are still being computed; try again shortly"),
        },
        StatKind::Participation => {
            let participation = stats.participation().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&participation)?);
            } else {
                println!("{}", participation.pretty_print());
            }
        }
        StatKind::PunchCard => {
            let items = stats.punch_card().await?;
            let busy: Vec<_> = items.into_iter().filter(|i| i.number_of_commits > 0).collect();
            output_list(&busy, json, |i| PunchCardRow {
                day: DAYS.get(i.day_of_week as usize).copied().unwrap_or("?"),
                hour: i.hour_of_day,
                commits: i.number_of_commits,
            })?;
        }
        StatKind::Contributors => {
            let contributors = stats.contributor_stats()?.to_list().await?;
            output_list(&contributors, json, |c| ContributorRow {
                login: c
                    .author
                    .as_ref()
                    .map(|a| a.login.clone())
                    .unwrap_or_default(),
                commits: c.total,
                weeks: c.weeks.iter().filter(|w| w.commits > 0).count(),
            })?;
        }
    }
    Ok(())
}

fn output_list<T, R, F>(items: &[T], json: bool, to_row: F) -> ghapi::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        println!("\n{} items", items.len());
    }
    Ok(())
}

fn format_week(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

// Table row types for non-JSON output

#[derive(Tabled)]
struct CommitRow {
    sha: String,
    date: String,
    author: String,
    message: String,
}

impl CommitRow {
    async fn from_commit(commit: &mut Commit) -> ghapi::Result<Self> {
        let sha = commit.sha.chars().take(7).collect();
        let info = commit.short_info().await?;
        Ok(Self {
            sha,
            date: info
                .commit_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            author: info
                .author
                .as_ref()
                .and_then(|a| a.name.clone())
                .unwrap_or_default(),
            message: info.message.lines().next().unwrap_or_default().to_string(),
        })
    }
}

#[derive(Tabled)]
struct IssueRow {
    number: u64,
    state: String,
    title: String,
    labels: String,
}

impl From<&Issue> for IssueRow {
    fn from(i: &Issue) -> Self {
        Self {
            number: i.number,
            state: i.state.as_str().to_string(),
            title: i.title.clone(),
            labels: i.label_names().join(", "),
        }
    }
}

#[derive(Tabled)]
struct CodeFrequencyRow {
    week: String,
    additions: i64,
    deletions: i64,
}

#[derive(Tabled)]
struct PunchCardRow {
    day: &'static str,
    hour: u32,
    commits: u32,
}

#[derive(Tabled)]
struct ContributorRow {
    login: String,
    commits: u32,
    weeks: usize,
}
