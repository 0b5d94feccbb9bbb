//! Reactions and team change payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;
use crate::traits::Decodable;

/// Emoji reaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionContent {
    #[serde(rename = "+1")]
    PlusOne,
    #[serde(rename = "-1")]
    MinusOne,
    #[serde(rename = "laugh")]
    Laugh,
    #[serde(rename = "confused")]
    Confused,
    #[serde(rename = "heart")]
    Heart,
    #[serde(rename = "hooray")]
    Hooray,
    #[serde(rename = "rocket")]
    Rocket,
    #[serde(rename = "eyes")]
    Eyes,
    #[serde(other)]
    Unknown,
}

/// A reaction to an issue, comment or release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: u64,
    pub content: ReactionContent,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Decodable for Reaction {}

/// Team visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Secret,
    Closed,
    #[serde(other)]
    Unknown,
}

/// Previous value of a changed string attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromString {
    #[serde(default)]
    pub from: Option<String>,
}

/// Previous team visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromPrivacy {
    #[serde(default)]
    from: Option<Privacy>,
}

impl FromPrivacy {
    /// The previous visibility; [`Privacy::Unknown`] when absent.
    pub fn from(&self) -> Privacy {
        self.from.unwrap_or(Privacy::Unknown)
    }
}

/// Repository permissions a team had before a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromRepositoryPermissions {
    #[serde(default)]
    from: Option<RepositoryPermissions>,
}

impl FromRepositoryPermissions {
    pub fn had_admin_access(&self) -> bool {
        self.from.is_some_and(|p| p.admin)
    }

    pub fn had_push_access(&self) -> bool {
        self.from.is_some_and(|p| p.push)
    }

    pub fn had_pull_access(&self) -> bool {
        self.from.is_some_and(|p| p.pull)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromRepository {
    #[serde(default)]
    pub permissions: Option<FromRepositoryPermissions>,
}

/// The `changes` object of a team webhook event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChanges {
    #[serde(default)]
    pub description: Option<FromString>,
    #[serde(default)]
    pub name: Option<FromString>,
    #[serde(default)]
    pub privacy: Option<FromPrivacy>,
    #[serde(default)]
    pub repository: Option<FromRepository>,
}

impl Decodable for TeamChanges {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, ContextBindings};

    #[test]
    fn test_unknown_reaction_content() {
        let reaction: Reaction = decode(
            br#"{"id": 1, "content": "thinking_face"}"#,
            &ContextBindings::new(),
        )
        .unwrap();
        assert_eq!(reaction.content, ReactionContent::Unknown);
    }

    #[test]
    fn test_team_changes() {
        let changes: TeamChanges = decode(
            br#"{
                "name": {"from": "Old Team"},
                "privacy": {"from": "secret"},
                "repository": {"permissions": {"from": {"admin": false, "push": true, "pull": true}}}
            }"#,
            &ContextBindings::new(),
        )
        .unwrap();

        assert_eq!(
            changes.name.and_then(|n| n.from).as_deref(),
            Some("Old Team")
        );
        assert_eq!(changes.privacy.map(|p| p.from()), Some(Privacy::Secret));
        let permissions = changes.repository.and_then(|r| r.permissions).unwrap();
        assert!(permissions.had_push_access());
        assert!(!permissions.had_admin_access());
        assert!(changes.description.is_none());
    }

    #[test]
    fn test_missing_privacy_reads_unknown() {
        let privacy: FromPrivacy = serde_json::from_str("{}").unwrap();
        assert_eq!(privacy.from(), Privacy::Unknown);
    }
}
