//! CLI argument parsing tests.

use clap::Parser;
use ghapi::cli::{Cli, Command, RepoSlug, StatKind, StateArg};

#[test]
fn test_cli_parses_commits_subcommand() {
    let cli = Cli::parse_from(["ghapi", "commits", "rust-lang/rust"]);

    assert!(!cli.json);
    match cli.command {
        Command::Commits { repo, limit } => {
            assert_eq!(repo.owner, "rust-lang");
            assert_eq!(repo.name, "rust");
            assert_eq!(limit, 30);
        }
        _ => panic!("Expected Commits command"),
    }
}

#[test]
fn test_cli_parses_compare_subcommand() {
    let cli = Cli::parse_from([
        "ghapi",
        "compare",
        "octocat/hello-world",
        "main",
        "feature",
        "--paginated",
    ]);

    match cli.command {
        Command::Compare {
            base,
            head,
            paginated,
            ..
        } => {
            assert_eq!(base, "main");
            assert_eq!(head, "feature");
            assert!(paginated);
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_issue_labels_accumulate() {
    let cli = Cli::parse_from([
        "ghapi",
        "issues",
        "o/r",
        "--state",
        "closed",
        "--label",
        "bug",
        "--label",
        "ui",
        "--limit",
        "5",
    ]);

    match cli.command {
        Command::Issues {
            state,
            labels,
            limit,
            ..
        } => {
            assert_eq!(state, StateArg::Closed);
            assert_eq!(labels, vec!["bug", "ui"]);
            assert_eq!(limit, 5);
        }
        _ => panic!("Expected Issues command"),
    }
}

#[test]
fn test_stats_kind_aliases() {
    let cli = Cli::parse_from(["ghapi", "stats", "o/r", "code-frequency"]);
    match cli.command {
        Command::Stats { kind, .. } => assert_eq!(kind, StatKind::CodeFrequency),
        _ => panic!("Expected Stats command"),
    }
}

#[test]
fn test_global_json_flag() {
    // --json before subcommand
    let cli = Cli::parse_from(["ghapi", "--json", "commits", "o/r"]);
    assert!(cli.json);

    // --json after subcommand (global flag)
    let cli = Cli::parse_from(["ghapi", "commits", "o/r", "--json"]);
    assert!(cli.json);
}

#[test]
fn test_invalid_repo_slug_is_rejected() {
    assert!("no-slash".parse::<RepoSlug>().is_err());
    assert!("a/b/c".parse::<RepoSlug>().is_err());
    assert!(Cli::try_parse_from(["ghapi", "commits", "/r"]).is_err());
}
