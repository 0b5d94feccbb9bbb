//! User and organization identities.
//!
//! Both are interned per session by login: every lookup of the same login
//! through one client yields the same [`Arc`](std::sync::Arc).

use serde::{Deserialize, Serialize};

use crate::traits::{Decodable, Internable};

/// A GitHub user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name; the identity key.
    pub login: String,

    /// Numeric account ID.
    pub id: u64,

    /// Display name (only on full user responses).
    #[serde(default)]
    pub name: Option<String>,

    /// Public email, if the user exposes one.
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,

    /// Account type ("User", "Bot", "Organization").
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub site_admin: bool,
}

impl User {
    /// Returns true for bot accounts.
    pub fn is_bot(&self) -> bool {
        self.kind.as_deref() == Some("Bot")
    }
}

impl Decodable for User {}

impl Internable for User {
    fn identity_key(&self) -> &str {
        &self.login
    }
}

/// A GitHub organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Login name; the identity key.
    pub login: String,

    pub id: u64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,

    /// Number of public repositories (only on full responses).
    #[serde(default)]
    pub public_repos: Option<u32>,
}

impl Decodable for Organization {}

impl Internable for Organization {
    fn identity_key(&self) -> &str {
        &self.login
    }
}
