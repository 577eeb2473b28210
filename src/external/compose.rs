// ABOUTME: Compose execution via the docker CLI.
// ABOUTME: Discovers compose files and runs up/build/force-recreate under a timeout.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use super::{ExternalError, run_command};

pub const COMPOSE_FILE: &str = "docker-compose.yml";
pub const COMPOSE_FILE_ALT: &str = "docker-compose.yaml";
pub const PROD_COMPOSE_FILE: &str = "docker-compose.prod.yml";
pub const PROD_COMPOSE_FILE_ALT: &str = "docker-compose.prod.yaml";

#[derive(Debug, Error)]
pub enum ComposeDiscoveryError {
    #[error("no compose file ({COMPOSE_FILE} or {COMPOSE_FILE_ALT}) in {}", .0.display())]
    MissingComposeFile(PathBuf),

    #[error("prod compose requested but no {PROD_COMPOSE_FILE} or {PROD_COMPOSE_FILE_ALT} in {}", .0.display())]
    MissingProdOverride(PathBuf),
}

/// Locate the compose file(s) for a project, trying the `.yml` spelling
/// before `.yaml`. With `prod` the override file is required and layered
/// after the base file.
pub fn discover_compose_files(
    project_dir: &Path,
    prod: bool,
) -> Result<Vec<PathBuf>, ComposeDiscoveryError> {
    let base = [COMPOSE_FILE, COMPOSE_FILE_ALT]
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.exists())
        .ok_or_else(|| ComposeDiscoveryError::MissingComposeFile(project_dir.to_path_buf()))?;

    let mut files = vec![base];

    if prod {
        let override_file = [PROD_COMPOSE_FILE, PROD_COMPOSE_FILE_ALT]
            .iter()
            .map(|name| project_dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| {
                ComposeDiscoveryError::MissingProdOverride(project_dir.to_path_buf())
            })?;
        files.push(override_file);
    }

    Ok(files)
}

/// Compose operations consumed by the pipeline.
#[async_trait]
pub trait Compose: Send + Sync {
    /// Build and (re)start the stack described by `files`, returning the
    /// tool output for the deployment log.
    async fn run_up(&self, files: &[PathBuf], project_dir: &Path)
    -> Result<String, ExternalError>;
}

/// Shells out to `docker compose`.
pub struct DockerComposeCli {
    timeout: Duration,
}

impl DockerComposeCli {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Compose for DockerComposeCli {
    async fn run_up(
        &self,
        files: &[PathBuf],
        project_dir: &Path,
    ) -> Result<String, ExternalError> {
        let mut cmd = Command::new("docker");
        cmd.arg("compose");
        for file in files {
            cmd.arg("-f").arg(file);
        }
        cmd.args(["up", "-d", "--build", "--force-recreate"])
            .current_dir(project_dir);

        tracing::debug!(dir = %project_dir.display(), files = files.len(), "running compose up");
        run_command(cmd, self.timeout).await
    }
}
