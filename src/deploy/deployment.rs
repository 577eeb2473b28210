// ABOUTME: Generic deployment struct parameterized by state marker, plus the run context.
// ABOUTME: The context accumulates the log that ends up in the persisted record.

use chrono::{DateTime, Utc};
use std::marker::PhantomData;
use std::time::Instant;

use crate::config::DeployConfig;
use crate::webhook::{ProjectId, Webhook};

use super::state::Received;

/// Ephemeral state of one deployment attempt. Owned exclusively by the task
/// running the attempt; never shared.
#[derive(Debug)]
pub struct RunContext {
    pub webhook: Webhook,
    pub project: ProjectId,
    pub started_at: DateTime<Utc>,
    started: Instant,
    pub output: String,
}

impl RunContext {
    pub fn new(webhook: Webhook) -> Self {
        let project = webhook.project();
        Self {
            webhook,
            project,
            started_at: Utc::now(),
            started: Instant::now(),
            output: String::new(),
        }
    }

    /// Append tool output or an annotation to the accumulated log.
    pub fn append(&mut self, text: &str) {
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            return;
        }
        if !self.output.is_empty() {
            self.output.push('\n');
        }
        self.output.push_str(trimmed);
    }

    /// Commit id this attempt deploys.
    pub fn commit(&self) -> String {
        self.webhook
            .head_commit()
            .map(|c| c.id.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// A deployment attempt in progress, parameterized by its current state.
///
/// Transitions consume `self` so a stage cannot run twice or out of order.
/// On failure a transition hands the context back so the accumulated log
/// reaches the finalizer.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) ctx: RunContext,
    pub(crate) config: Option<DeployConfig>,
    pub(crate) _state: PhantomData<S>,
}

impl Deployment<Received> {
    pub fn new(webhook: Webhook) -> Self {
        Deployment {
            ctx: RunContext::new(webhook),
            config: None,
            _state: PhantomData,
        }
    }
}

impl<S> Deployment<S> {
    /// Internal helper to transition to a new state.
    pub(crate) fn transition<T>(self) -> Deployment<T> {
        Deployment {
            ctx: self.ctx,
            config: self.config,
            _state: PhantomData,
        }
    }

    /// Internal helper to transition carrying the resolved config.
    pub(crate) fn transition_with_config<T>(self, config: DeployConfig) -> Deployment<T> {
        Deployment {
            ctx: self.ctx,
            config: Some(config),
            _state: PhantomData,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }
}
