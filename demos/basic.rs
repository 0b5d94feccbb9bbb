//! Basic example demonstrating the GitHub API client.
//!
//! Run with:
//! ```
//! GITHUB_TOKEN=your-token cargo run --example basic
//! ```

use ghapi::{GitHubClient, IssueSort, IssueState};

#[tokio::main]
async fn main() -> ghapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating GitHub client...");
    let client = GitHubClient::from_env()?;
    println!("Connected to: {}", client.api_url());

    let repo = client.get_repository("octocat", "Hello-World").await?;
    println!("\n--- Repository ---");
    println!("{} ({} stars)", repo.full_name, repo.stargazers_count);

    // First page of commits only; the rest is never requested
    println!("\n--- Recent Commits ---");
    let commits = repo.list_commits()?.with_page_size(5)?;
    let mut iter = commits.iter();
    if let Some(page) = iter.next_page().await? {
        for mut commit in page {
            let message = commit.short_info().await?.message.clone();
            println!("  - {} {}", commit.sha, message.lines().next().unwrap_or_default());
        }
    }

    // Populate a single commit on demand
    if let Some(mut latest) = commits.iter().try_next().await? {
        println!("\n--- Latest Commit ---");
        println!("  +{} -{}", latest.lines_added().await?, latest.lines_deleted().await?);
        if let Some(author) = latest.author().await? {
            println!("  Author: {}", author.login);
        }
    }

    println!("\n--- Open Issues ---");
    let issues = repo
        .query_issues()?
        .state(IssueState::Open)
        .sort(IssueSort::Updated)
        .page_size(10)
        .list()?;
    let mut iter = issues.iter();
    for _ in 0..10 {
        let Some(issue) = iter.try_next().await? else {
            break;
        };
        println!("  #{} {} [{}]", issue.number, issue.title, issue.label_names().join(", "));
    }

    println!("\n--- Code Frequency ---");
    match repo.statistics().code_frequency().await? {
        Some(weeks) => {
            for week in weeks.iter().rev().take(3) {
                println!("  {week}");
            }
        }
        None => println!("  (still being computed)"),
    }

    println!("\nDone!");
    Ok(())
}
