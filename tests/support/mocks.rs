// ABOUTME: Mock implementations of the external collaborator traits.
// ABOUTME: Deterministic stand-ins for git, compose, workloads, and notifications.

use async_trait::async_trait;
use slipway::external::{
    Compose, ExternalError, Notifier, Vcs, WorkloadError, WorkloadOps, WorkloadState,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Always succeeds with fixed output.
pub struct StubVcs {
    pub output: String,
}

impl StubVcs {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
        }
    }
}

#[async_trait]
impl Vcs for StubVcs {
    async fn update_working_copy(
        &self,
        _ssh_url: &str,
        _dest: &Path,
    ) -> Result<String, ExternalError> {
        Ok(self.output.clone())
    }
}

/// Always fails the way a broken remote does.
pub struct FailingVcs;

#[async_trait]
impl Vcs for FailingVcs {
    async fn update_working_copy(
        &self,
        _ssh_url: &str,
        _dest: &Path,
    ) -> Result<String, ExternalError> {
        Err(ExternalError::Process {
            code: 128,
            output: "fatal: could not read from remote repository".to_string(),
        })
    }
}

/// Succeeds with fixed output and counts invocations.
pub struct StubCompose {
    pub output: String,
    pub calls: AtomicUsize,
}

impl StubCompose {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Compose for StubCompose {
    async fn run_up(
        &self,
        _files: &[PathBuf],
        _project_dir: &Path,
    ) -> Result<String, ExternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Fails with a build error and captured output.
pub struct FailingCompose;

#[async_trait]
impl Compose for FailingCompose {
    async fn run_up(
        &self,
        _files: &[PathBuf],
        _project_dir: &Path,
    ) -> Result<String, ExternalError> {
        Err(ExternalError::Process {
            code: 1,
            output: "error during build: step 3/7 failed".to_string(),
        })
    }
}

/// Reports a fixed state forever and counts inspections.
pub struct FixedWorkloads {
    pub state: WorkloadState,
    pub inspections: AtomicUsize,
}

impl FixedWorkloads {
    pub fn new(state: WorkloadState) -> Self {
        Self {
            state,
            inspections: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WorkloadOps for FixedWorkloads {
    async fn workload_state(&self, _name: &str) -> Result<WorkloadState, WorkloadError> {
        self.inspections.fetch_add(1, Ordering::SeqCst);
        Ok(self.state)
    }
}

/// Reports `created` until `after` inspections have happened, then `running`.
pub struct EventuallyRunning {
    pub after: usize,
    pub inspections: AtomicUsize,
}

impl EventuallyRunning {
    pub fn new(after: usize) -> Self {
        Self {
            after,
            inspections: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WorkloadOps for EventuallyRunning {
    async fn workload_state(&self, _name: &str) -> Result<WorkloadState, WorkloadError> {
        let seen = self.inspections.fetch_add(1, Ordering::SeqCst);
        if seen >= self.after {
            Ok(WorkloadState::Running)
        } else {
            Ok(WorkloadState::Created)
        }
    }
}

/// Captures every notification sent.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}
