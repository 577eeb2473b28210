// ABOUTME: Error taxonomy for deployment attempts.
// ABOUTME: Every variant terminates the attempt through the finalizer.

use thiserror::Error;

use crate::external::ExternalError;
use crate::store::StoreError;

/// Errors that terminate a deployment attempt.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The project is already locked. The abort must not release the lock;
    /// it belongs to whoever set it.
    #[error("deployments are locked")]
    LockConflict,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("process failed with exit code {code}")]
    Process { code: i32 },

    #[error("process timed out after {0} seconds")]
    Timeout(u64),

    #[error("healthcheck failed for workload '{0}'")]
    Unhealthy(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<ExternalError> for DeployError {
    fn from(err: ExternalError) -> Self {
        match err {
            ExternalError::Timeout(secs) => DeployError::Timeout(secs),
            ExternalError::Process { code, .. } => DeployError::Process { code },
            ExternalError::Spawn(e) => DeployError::Config(format!("failed to run tool: {e}")),
        }
    }
}
