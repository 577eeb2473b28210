// ABOUTME: Push webhook payload model and project identity.
// ABOUTME: Serde types for the fields slipway consumes; extra payload fields are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Project identity derived from `repository.full_name`.
///
/// Case-normalized `owner/repo`. The storage key replaces slashes with
/// dashes and is the join key across locks, deployments, and cached
/// webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(full_name: &str) -> Self {
        Self(full_name.trim().to_lowercase())
    }

    pub fn full_name(&self) -> &str {
        &self.0
    }

    /// Storage key: slashes replaced with dashes.
    pub fn key(&self) -> String {
        self.0.replace('/', "-")
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inbound push payload. Immutable once received; cached verbatim for replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub repository: Repository,

    #[serde(rename = "ref")]
    pub git_ref: String,

    #[serde(default)]
    pub commits: Vec<Commit>,

    /// Optional inline deployment config. Parsed lazily at config
    /// resolution so a bad value fails the attempt, not the webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub owner: Owner,
    pub ssh_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub author: Author,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

impl Webhook {
    pub fn project(&self) -> ProjectId {
        ProjectId::new(&self.repository.full_name)
    }

    /// Branch (or tag) name: the last path segment of the ref.
    pub fn branch(&self) -> &str {
        self.git_ref.rsplit('/').next().unwrap_or(&self.git_ref)
    }

    pub fn is_tag(&self) -> bool {
        self.git_ref.starts_with("refs/tags/")
    }

    /// Newest commit in the push, if any.
    pub fn head_commit(&self) -> Option<&Commit> {
        self.commits.last()
    }
}
