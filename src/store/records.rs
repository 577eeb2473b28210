// ABOUTME: Typed records persisted in the store.
// ABOUTME: Lock records and deployment history entries, serialized as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-project mutual-exclusion state.
///
/// `system_lock` is `Some(_)` only while `locked` is true. A lock written by
/// an operator carries `system_lock: Some(false)` and is never auto-released;
/// the pipeline acquires with `system_lock: Some(true)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub locked: bool,
    pub system_lock: Option<bool>,
}

impl LockRecord {
    /// Whether the pipeline is allowed to release this lock on completion.
    pub fn is_system_lock(&self) -> bool {
        self.locked && self.system_lock == Some(true)
    }
}

/// Terminal and in-flight deployment states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStatus {
    #[serde(rename = "In-Progress")]
    InProgress,
    Success,
    Failure,
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeploymentStatus::InProgress => "In-Progress",
            DeploymentStatus::Success => "Success",
            DeploymentStatus::Failure => "Failure",
        };
        write!(f, "{s}")
    }
}

/// One deployment attempt, keyed by `project@commit`.
///
/// Written with `In-Progress` status when the attempt starts and overwritten
/// with exactly one terminal status by the finalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Project storage key (`owner-repo`).
    pub project: String,
    /// Commit id the attempt deployed.
    pub commit: String,
    /// Accumulated tool output and finalization annotations.
    pub log: String,
    pub status: DeploymentStatus,
    pub timestamp: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Storage key for this record. Not unique across retries of the same
    /// commit; later writes overwrite.
    pub fn key(&self) -> String {
        format!("{}@{}", self.project, self.commit)
    }
}
