//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::{Compare, CompareStatus, Participation, Repository};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for Repository {
    fn pretty_print(&self) -> String {
        let divider = "─".repeat(self.full_name.len().max(30));

        let mut lines = vec![format!("Repository: {}", self.full_name), divider];

        if let Some(ref description) = self.description {
            lines.push(format!("Description:    {}", description));
        }

        if let Some(ref branch) = self.default_branch {
            lines.push(format!("Default Branch: {}", branch));
        }

        lines.push(format!("Stars:          {}", self.stargazers_count));
        lines.push(format!(
            "Visibility:     {}",
            if self.private { "private" } else { "public" }
        ));

        if self.fork {
            lines.push("Fork:           yes".to_string());
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Compare {
    fn pretty_print(&self) -> String {
        let header = format!(
            "Compare: {}...",
            self.merge_base_commit.sha.get(..7).unwrap_or(&self.merge_base_commit.sha)
        );
        let divider = "─".repeat(header.len().max(30));

        let status = match self.status {
            CompareStatus::Ahead => "ahead",
            CompareStatus::Behind => "behind",
            CompareStatus::Diverged => "diverged",
            CompareStatus::Identical => "identical",
        };

        let mut lines = vec![
            header,
            divider,
            format!("Status:         {}", status),
            format!(
                "Commits:        {} total ({} ahead, {} behind)",
                self.total_commits, self.ahead_by, self.behind_by
            ),
            format!("Files:          {}", self.files.len()),
        ];

        if let Some(ref url) = self.html_url {
            lines.push(format!("URL:            {}", url));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Participation {
    fn pretty_print(&self) -> String {
        let all: u32 = self.all.iter().sum();
        let owner: u32 = self.owner.iter().sum();

        let lines = [
            "Participation (last 52 weeks)".to_string(),
            "─".repeat(30),
            format!("All:            {} commits", all),
            format!("Owner:          {} commits", owner),
            format!("Others:         {} commits", all.saturating_sub(owner)),
        ];

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_pretty_print_format() {
        let repo: Repository = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "owner": {"login": "octocat", "id": 1},
            "default_branch": "main"
        }))
        .unwrap();

        let output = repo.pretty_print();
        assert!(output.starts_with("Repository:"));
        assert!(output.contains("Default Branch: main"));
        assert!(output.contains("Visibility:     public"));
    }

    #[test]
    fn test_participation_pretty_print_totals() {
        let participation = Participation {
            all: vec![3, 4, 5],
            owner: vec![1, 0, 2],
        };

        let output = participation.pretty_print();
        assert!(output.contains("All:            12 commits"));
        assert!(output.contains("Others:         9 commits"));
    }
}
