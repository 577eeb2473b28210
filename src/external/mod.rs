// ABOUTME: Trait seams for external collaborators: VCS, compose, notifications, workloads.
// ABOUTME: Production impls shell out or talk to the local container daemon.

mod compose;
mod notify;
mod vcs;
mod workload;

pub use compose::{Compose, ComposeDiscoveryError, DockerComposeCli, discover_compose_files};
pub use notify::{LogNotifier, Notifier};
pub use vcs::{GitCli, Vcs};
pub use workload::{DockerWorkloads, WorkloadError, WorkloadOps, WorkloadState};

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Errors from invoking an external tool.
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("command timed out after {0} seconds")]
    Timeout(u64),

    #[error("command failed with exit code {code}")]
    Process {
        code: i32,
        /// Combined stdout/stderr produced before the failure.
        output: String,
    },

    #[error("failed to run command: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Run a prepared command to completion under a timeout, capturing combined
/// stdout/stderr. The child is killed when the timeout fires.
pub(crate) async fn run_command(
    mut cmd: Command,
    timeout: Duration,
) -> Result<String, ExternalError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => return Err(ExternalError::Timeout(timeout.as_secs())),
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(text)
    } else {
        Err(ExternalError::Process {
            code: output.status.code().unwrap_or(-1),
            output: text,
        })
    }
}
