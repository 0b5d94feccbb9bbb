//! Deployments and their statuses.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{Repository, User};
use crate::rehydrate::{OwnerSlot, Rehydrator};
use crate::sequence::PagedIterable;
use crate::traits::{Decodable, OwnedEntity};

/// A deployment of a ref to an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: u64,

    pub sha: String,

    #[serde(rename = "ref")]
    pub git_ref: String,

    #[serde(default)]
    pub task: Option<String>,

    #[serde(default)]
    pub environment: Option<String>,

    #[serde(default)]
    pub original_environment: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Free-form payload: a string or an object.
    #[serde(default)]
    pub payload: Value,

    #[serde(default)]
    pub transient_environment: bool,

    #[serde(default)]
    pub production_environment: bool,

    #[serde(default)]
    pub url: Option<String>,

    pub statuses_url: String,

    #[serde(default)]
    pub repository_url: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    creator: Option<User>,

    #[serde(skip)]
    repository: OwnerSlot<Arc<Repository>>,
}

impl Decodable for Deployment {}

impl OwnedEntity for Deployment {
    type Owner = Arc<Repository>;

    fn owner_slot(&self) -> &OwnerSlot<Arc<Repository>> {
        &self.repository
    }
}

impl Deployment {
    /// The repository this deployment belongs to.
    pub fn owner(&self) -> Result<&Arc<Repository>> {
        self.repository.require("deployment")
    }

    /// The account that created the deployment, canonical for the session.
    pub fn creator(&self) -> Result<Option<Arc<User>>> {
        let Some(creator) = &self.creator else {
            return Ok(None);
        };
        Ok(Some(self.owner()?.root()?.interned().intern(creator.clone())))
    }

    /// The payload when it was sent as a string.
    pub fn payload_str(&self) -> Option<&str> {
        self.payload.as_str()
    }

    /// The payload when it was sent as an object.
    pub fn payload_map(&self) -> Option<&Map<String, Value>> {
        self.payload.as_object()
    }

    /// Statuses reported for this deployment, newest first.
    pub fn list_statuses(&self) -> Result<PagedIterable<DeploymentStatus>> {
        let repo = Arc::clone(self.owner()?);
        repo.root()?
            .create_request()
            .with_raw_url(&self.statuses_url)
            .to_iterable_init(move |s: &mut DeploymentStatus| Rehydrator::attach_ref(&*s, &repo))
    }
}

/// A status update on a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub id: u64,

    /// "pending", "success", "failure", "error", "inactive", ...
    pub state: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub environment: Option<String>,

    #[serde(default)]
    pub target_url: Option<String>,

    #[serde(default)]
    pub log_url: Option<String>,

    #[serde(default)]
    pub environment_url: Option<String>,

    #[serde(default)]
    pub creator: Option<User>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip)]
    repository: OwnerSlot<Arc<Repository>>,
}

impl Decodable for DeploymentStatus {}

impl OwnedEntity for DeploymentStatus {
    type Owner = Arc<Repository>;

    fn owner_slot(&self) -> &OwnerSlot<Arc<Repository>> {
        &self.repository
    }
}

impl DeploymentStatus {
    /// The repository of the deployment.
    pub fn owner(&self) -> Result<&Arc<Repository>> {
        self.repository.require("deployment status")
    }
}
