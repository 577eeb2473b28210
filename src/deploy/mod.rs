// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct, and the pipeline runner.

mod deployment;
mod error;
mod finalize;
mod state;
mod transitions;

pub use deployment::{Deployment, RunContext};
pub use error::DeployError;
pub use finalize::Finalizer;
pub use state::{Configured, Executed, Locked, Received, Updated, Verified};
pub use transitions::TransitionResult;

use std::sync::Arc;

use crate::config::Settings;
use crate::external::{Compose, Notifier, Vcs};
use crate::health::HealthcheckEngine;
use crate::lock::LockManager;
use crate::store::RecordStore;
use crate::webhook::Webhook;

/// Everything one deployment attempt needs, bundled for cheap cloning into
/// the attempt's own task.
#[derive(Clone)]
pub struct PipelineEnv {
    pub settings: Arc<Settings>,
    pub store: RecordStore,
    pub locks: LockManager,
    pub vcs: Arc<dyn Vcs>,
    pub compose: Arc<dyn Compose>,
    pub health: HealthcheckEngine,
    pub notifier: Arc<dyn Notifier>,
}

/// Run one deployment attempt to completion.
///
/// This is the top of a detached task: every failure funnels into the
/// finalizer, which persists the outcome and releases resources. Nothing
/// propagates out, since nothing observes this task's result directly —
/// the persisted record is the observable outcome.
pub async fn run(env: &PipelineEnv, webhook: Webhook) {
    let finalizer = Finalizer::new(
        env.store.clone(),
        env.locks.clone(),
        env.notifier.clone(),
        env.settings.clone(),
    );

    let deployment = Deployment::new(webhook);
    tracing::info!(project = %deployment.context().project, "deployment attempt started");

    let deployment = match deployment.acquire_lock(&env.locks, &env.store).await {
        Ok(d) => d,
        Err((ctx, e)) => return finalizer.fail(ctx, &e).await,
    };

    let deployment = match deployment
        .update_sources(env.vcs.as_ref(), &env.settings)
        .await
    {
        Ok(d) => d,
        Err((ctx, e)) => return finalizer.fail(ctx, &e).await,
    };

    let deployment = match deployment.resolve_config(&env.settings) {
        Ok(d) => d,
        Err((ctx, e)) => return finalizer.fail(ctx, &e).await,
    };

    let deployment = match deployment
        .execute(env.compose.as_ref(), &env.settings)
        .await
    {
        Ok(d) => d,
        Err((ctx, e)) => return finalizer.fail(ctx, &e).await,
    };

    let deployment = match deployment.verify(&env.health).await {
        Ok(d) => d,
        Err((ctx, e)) => return finalizer.fail(ctx, &e).await,
    };

    finalizer.succeed(deployment.finish()).await;
}
