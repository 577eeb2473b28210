// ABOUTME: State transition methods for the deployment pipeline.
// ABOUTME: Each method consumes self; on failure the context comes back for finalization.

use crate::config::{DeploymentType, Settings};
use crate::external::{Compose, ExternalError, Vcs, discover_compose_files};
use crate::health::HealthcheckEngine;
use crate::lock::{LockError, LockManager};
use crate::store::{DeploymentRecord, DeploymentStatus, RecordStore};

use super::Deployment;
use super::deployment::RunContext;
use super::error::DeployError;
use super::state::{Configured, Executed, Locked, Received, Updated, Verified};

/// Result type for transitions; failure hands the context to the finalizer.
pub type TransitionResult<T> = Result<Deployment<T>, (RunContext, DeployError)>;

// =============================================================================
// Received -> Locked
// =============================================================================

impl Deployment<Received> {
    /// Take the project lock and persist the initial In-Progress record.
    ///
    /// An existing held lock aborts the attempt with `LockConflict` before
    /// any state mutation; a missing lock record means unlocked.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::LockConflict` or a storage error.
    #[must_use = "deployment state must be used"]
    pub async fn acquire_lock(
        mut self,
        locks: &LockManager,
        store: &RecordStore,
    ) -> TransitionResult<Locked> {
        match locks.lookup(&self.ctx.project).await {
            Ok(record) if record.locked => {
                return Err((self.ctx, DeployError::LockConflict));
            }
            Ok(_) | Err(LockError::NotFound(_)) => {}
            Err(LockError::Store(e)) => return Err((self.ctx, e.into())),
        }

        if let Err(e) = locks.set(&self.ctx.project, true, true).await {
            let e = match e {
                LockError::Store(e) => DeployError::Store(e),
                LockError::NotFound(p) => DeployError::Config(format!("lock vanished for {p}")),
            };
            return Err((self.ctx, e));
        }

        let record = DeploymentRecord {
            project: self.ctx.project.key(),
            commit: self.ctx.commit(),
            log: String::new(),
            status: DeploymentStatus::InProgress,
            timestamp: self.ctx.started_at,
        };
        if let Err(e) = store.put_deployment(&record).await {
            return Err((self.ctx, e.into()));
        }

        let line = format!("→ deploying {} at {}", self.ctx.project, record.commit);
        self.ctx.append(&line);
        Ok(self.transition())
    }
}

// =============================================================================
// Locked -> Updated
// =============================================================================

impl Deployment<Locked> {
    /// Bring the project's working copy up to date (clone or pull).
    ///
    /// # Errors
    ///
    /// Returns a process or timeout error; captured output stays in the log.
    #[must_use = "deployment state must be used"]
    pub async fn update_sources(
        mut self,
        vcs: &dyn Vcs,
        settings: &Settings,
    ) -> TransitionResult<Updated> {
        let dest = settings.project_dir(&self.ctx.project);
        let url = self.ctx.webhook.repository.ssh_url.clone();

        match vcs.update_working_copy(&url, &dest).await {
            Ok(output) => {
                self.ctx.append(&output);
                Ok(self.transition())
            }
            Err(e) => {
                if let ExternalError::Process { output, .. } = &e {
                    self.ctx.append(output);
                }
                Err((self.ctx, e.into()))
            }
        }
    }
}

// =============================================================================
// Updated -> Configured
// =============================================================================

impl Deployment<Updated> {
    /// Resolve the attempt's deployment config: inline webhook data wins
    /// over the project-local config file.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Config` when no config resolves or the
    /// deployment type is unsupported.
    #[must_use = "deployment state must be used"]
    pub fn resolve_config(self, settings: &Settings) -> TransitionResult<Configured> {
        let dir = settings.project_dir(&self.ctx.project);
        match crate::config::DeployConfig::resolve(self.ctx.webhook.data.as_ref(), &dir) {
            Ok(config) => Ok(self.transition_with_config(config)),
            Err(e) => Err((self.ctx, DeployError::Config(e.to_string()))),
        }
    }
}

// =============================================================================
// Configured -> Executed
// =============================================================================

impl Deployment<Configured> {
    /// Run the compose stack for `deploy` attempts. `pull` attempts have
    /// nothing to execute; the Updated stage already did the work.
    ///
    /// # Errors
    ///
    /// Returns a config error when compose files are missing, or a process/
    /// timeout error from the compose run.
    #[must_use = "deployment state must be used"]
    pub async fn execute(
        mut self,
        compose: &dyn Compose,
        settings: &Settings,
    ) -> TransitionResult<Executed> {
        let config = self
            .config
            .clone()
            .expect("config resolved in Configured state");

        match config.deployment_type {
            DeploymentType::Pull => {
                self.ctx.append("pull deployment: working copy updated, nothing to build");
                Ok(self.transition())
            }
            DeploymentType::Deploy => {
                let dir = settings.project_dir(&self.ctx.project);
                let files = match discover_compose_files(&dir, config.prod_compose) {
                    Ok(files) => files,
                    Err(e) => return Err((self.ctx, DeployError::Config(e.to_string()))),
                };

                match compose.run_up(&files, &dir).await {
                    Ok(output) => {
                        self.ctx.append(&output);
                        Ok(self.transition())
                    }
                    Err(e) => {
                        if let ExternalError::Process { output, .. } = &e {
                            self.ctx.append(output);
                        }
                        Err((self.ctx, e.into()))
                    }
                }
            }
        }
    }
}

// =============================================================================
// Executed -> Verified
// =============================================================================

impl Deployment<Executed> {
    /// Check that the deployed workloads are running. All listed targets
    /// must pass; an absent target list passes automatically (health cannot
    /// be disproven, so the attempt is not penalized).
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Unhealthy` naming the first failing target.
    #[must_use = "deployment state must be used"]
    pub async fn verify(mut self, health: &HealthcheckEngine) -> TransitionResult<Verified> {
        let config = self
            .config
            .clone()
            .expect("config resolved in Configured state");

        let targets = match (&config.deployment_type, &config.healthcheck) {
            (DeploymentType::Deploy, Some(targets)) => targets.clone(),
            _ => {
                return Ok(self.transition());
            }
        };

        match health.check_all(&targets).await {
            Ok(()) => {
                self.ctx
                    .append(&format!("✓ {} workload(s) healthy", targets.len()));
                Ok(self.transition())
            }
            Err(unhealthy) => Err((self.ctx, DeployError::Unhealthy(unhealthy.0))),
        }
    }
}

// =============================================================================
// Verified - Terminal State
// =============================================================================

impl Deployment<Verified> {
    /// Consume the deployment and hand the context to the finalizer.
    pub fn finish(self) -> RunContext {
        self.ctx
    }
}
