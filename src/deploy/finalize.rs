// ABOUTME: Shared epilogue for deployment attempts.
// ABOUTME: Persists the terminal record, notifies, and releases locks per policy.

use std::sync::Arc;

use chrono::Utc;

use crate::config::Settings;
use crate::external::Notifier;
use crate::lock::{LockError, LockManager};
use crate::store::{DeploymentRecord, DeploymentStatus, RecordStore};

use super::deployment::RunContext;
use super::error::DeployError;

/// What to do with the project lock once the attempt is over.
enum ReleasePolicy {
    /// A successful system-run deployment always clears its own lock.
    Always,
    /// Release only a lock the pipeline itself acquired; an operator's
    /// freeze stays in place.
    SystemLockOnly,
    /// The lock belongs to someone else (lock-conflict abort); leave it.
    Never,
}

/// Runs exactly once per attempt, on success or failure.
pub struct Finalizer {
    store: RecordStore,
    locks: LockManager,
    notifier: Arc<dyn Notifier>,
    settings: Arc<Settings>,
}

impl Finalizer {
    pub fn new(
        store: RecordStore,
        locks: LockManager,
        notifier: Arc<dyn Notifier>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            store,
            locks,
            notifier,
            settings,
        }
    }

    pub async fn succeed(&self, ctx: RunContext) {
        let message = format!(
            "✓ {} deployed successfully ({:.1}s)",
            ctx.project,
            ctx.elapsed_secs()
        );
        tracing::info!(project = %ctx.project, "{message}");
        self.complete(ctx, message, DeploymentStatus::Success, ReleasePolicy::Always)
            .await;
    }

    pub async fn fail(&self, ctx: RunContext, error: &DeployError) {
        let message = format!("✗ {} deployment failed: {}", ctx.project, error);
        tracing::error!(project = %ctx.project, "{message}");

        let release = match error {
            DeployError::LockConflict => ReleasePolicy::Never,
            _ => ReleasePolicy::SystemLockOnly,
        };
        self.complete(ctx, message, DeploymentStatus::Failure, release)
            .await;
    }

    async fn complete(
        &self,
        mut ctx: RunContext,
        message: String,
        status: DeploymentStatus,
        release: ReleasePolicy,
    ) {
        if let Some(commit) = ctx.webhook.head_commit() {
            let line = format!(
                "commit {} by {}: {}",
                commit.id,
                commit.author.name,
                commit.message.trim()
            );
            ctx.append(&line);
        }
        let elapsed = format!("finished in {:.1}s", ctx.elapsed_secs());
        ctx.append(&elapsed);
        ctx.append(&strip_glyphs(&message));

        let record = DeploymentRecord {
            project: ctx.project.key(),
            commit: ctx.commit(),
            log: ctx.output.clone(),
            status,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.store.put_deployment(&record).await {
            // Nothing upstream observes this task; log and carry on so the
            // lock still gets released.
            tracing::error!(project = %ctx.project, error = %e, "failed to persist deployment record");
        }

        if self.settings.notifications {
            let host = gethostname::gethostname().to_string_lossy().into_owned();
            self.notifier
                .send(&format!("{message} [host: {host}]"))
                .await;
        }

        match release {
            ReleasePolicy::Always => self.release_lock(&ctx).await,
            ReleasePolicy::SystemLockOnly => match self.locks.lookup(&ctx.project).await {
                Ok(record) if record.is_system_lock() => self.release_lock(&ctx).await,
                Ok(_) | Err(LockError::NotFound(_)) => {
                    tracing::debug!(project = %ctx.project, "leaving non-system lock in place");
                }
                Err(e) => {
                    tracing::error!(project = %ctx.project, error = %e, "failed to inspect lock");
                }
            },
            ReleasePolicy::Never => {}
        }
    }

    async fn release_lock(&self, ctx: &RunContext) {
        if let Err(e) = self.locks.set(&ctx.project, false, true).await {
            tracing::error!(project = %ctx.project, error = %e, "failed to release lock");
        }
    }
}

/// Strip decorative outcome glyphs before persisting a message.
fn strip_glyphs(message: &str) -> String {
    message
        .chars()
        .filter(|c| !matches!(c, '✓' | '✗' | '→'))
        .collect::<String>()
        .trim()
        .to_string()
}
