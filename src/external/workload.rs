// ABOUTME: Workload inspection for healthchecks.
// ABOUTME: Bollard-based implementation talking to the local Docker-compatible daemon.

use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::InspectContainerOptions;
use thiserror::Error;

/// Live state of a named workload, reduced to what healthchecks need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadState {
    Created,
    Running,
    Paused,
    Restarting,
    Exited,
    Dead,
}

impl WorkloadState {
    pub fn is_running(self) -> bool {
        self == WorkloadState::Running
    }
}

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("workload not found: {0}")]
    NotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Container-state inspection consumed by the healthcheck engine.
#[async_trait]
pub trait WorkloadOps: Send + Sync {
    async fn workload_state(&self, name: &str) -> Result<WorkloadState, WorkloadError>;
}

/// Inspects containers via the Docker-compatible API (Docker or Podman).
pub struct DockerWorkloads {
    client: Docker,
}

impl DockerWorkloads {
    /// Connect to the local daemon socket.
    pub fn connect() -> Result<Self, WorkloadError> {
        let client = Docker::connect_with_local_defaults()
            .map_err(|e| WorkloadError::Runtime(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WorkloadOps for DockerWorkloads {
    async fn workload_state(&self, name: &str) -> Result<WorkloadState, WorkloadError> {
        let details = self
            .client
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_inspect_error(e, name))?;

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(|s| match s {
                bollard::models::ContainerStateStatusEnum::CREATED => WorkloadState::Created,
                bollard::models::ContainerStateStatusEnum::RUNNING => WorkloadState::Running,
                bollard::models::ContainerStateStatusEnum::PAUSED => WorkloadState::Paused,
                bollard::models::ContainerStateStatusEnum::RESTARTING => WorkloadState::Restarting,
                bollard::models::ContainerStateStatusEnum::REMOVING => WorkloadState::Exited,
                bollard::models::ContainerStateStatusEnum::EXITED => WorkloadState::Exited,
                bollard::models::ContainerStateStatusEnum::DEAD => WorkloadState::Dead,
                _ => WorkloadState::Exited,
            })
            .unwrap_or(WorkloadState::Exited);

        Ok(state)
    }
}

fn map_inspect_error(e: bollard::errors::Error, name: &str) -> WorkloadError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            WorkloadError::NotFound(name.to_string())
        }
        _ => WorkloadError::Runtime(e.to_string()),
    }
}
