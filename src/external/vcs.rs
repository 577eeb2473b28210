// ABOUTME: Working-copy updates via the git CLI.
// ABOUTME: Clone when the destination is absent, pull when it already exists.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::{ExternalError, run_command};

/// Source-control operations consumed by the pipeline.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Bring the working copy at `dest` up to date with `ssh_url`, returning
    /// the tool output for the deployment log.
    async fn update_working_copy(&self, ssh_url: &str, dest: &Path)
    -> Result<String, ExternalError>;
}

/// Shells out to `git`.
pub struct GitCli {
    timeout: Duration,
}

impl GitCli {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn update_working_copy(
        &self,
        ssh_url: &str,
        dest: &Path,
    ) -> Result<String, ExternalError> {
        if dest.join(".git").exists() {
            tracing::debug!(dest = %dest.display(), "pulling working copy");
            let mut cmd = Command::new("git");
            cmd.arg("pull").current_dir(dest);
            run_command(cmd, self.timeout).await
        } else {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tracing::debug!(url = ssh_url, dest = %dest.display(), "cloning working copy");
            let mut cmd = Command::new("git");
            cmd.arg("clone").arg(ssh_url).arg(dest);
            run_command(cmd, self.timeout).await
        }
    }
}
