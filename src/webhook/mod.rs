// ABOUTME: Webhook validation and the gateway the route layer calls into.
// ABOUTME: Validates, decides, caches the payload, and dispatches the pipeline task.

mod payload;
pub mod signature;

pub use payload::{Author, Commit, Owner, ProjectId, Repository, Webhook};

use serde::Serialize;

use crate::deploy::{self, PipelineEnv};
use crate::error::{Error, Result};
use crate::lock::{LockError, LockManager};
use crate::store::{DeploymentRecord, LockRecord, StoreError};

/// Synchronous answer to a webhook caller. Deployment progress is only
/// observable through the persisted record.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub status_code: u16,
}

impl WebhookResponse {
    fn dispatched(message: String) -> Self {
        Self {
            success: true,
            message,
            status_code: 200,
        }
    }

    fn rejected(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            status_code,
        }
    }
}

/// Ingress surface of the orchestrator.
///
/// The HTTP route layer (external) hands raw bodies and the signature
/// header here and relays the structured response. Operator endpoints map
/// onto the lock and history methods.
#[derive(Clone)]
pub struct Gateway {
    env: PipelineEnv,
}

impl Gateway {
    pub fn new(env: PipelineEnv) -> Self {
        Self { env }
    }

    /// Validate an inbound webhook and dispatch a deployment attempt.
    ///
    /// `signature` is the hex HMAC from the `X-Hub-Signature-256` header
    /// (with or without the `sha256=` prefix). Returns immediately after
    /// dispatch; the deployment runs on its own task.
    pub async fn accept_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> WebhookResponse {
        let webhook: Webhook = match serde_json::from_slice(raw_body) {
            Ok(webhook) => webhook,
            Err(_) => {
                return WebhookResponse::rejected("Malformed or missing JSON data", 422);
            }
        };

        if let Some(secret) = &self.env.settings.secret
            && !signature::verify(raw_body, signature, secret)
        {
            tracing::warn!("webhook signature mismatch");
            return WebhookResponse::rejected("signature mismatch", 403);
        }

        let branch = webhook.branch().to_string();
        let tag_triggered = webhook.is_tag() && self.env.settings.deploy_on_tag;
        if !self.env.settings.branch_allowed(&branch) && !tag_triggered {
            return WebhookResponse::rejected(
                format!("branch '{branch}' is not allowed to deploy"),
                422,
            );
        }

        let project = webhook.project();

        // Fast-fail while locked: the attempt would only burn a task to
        // record the conflict, and the caller gets a clear answer now.
        match self.env.locks.lookup(&project).await {
            Ok(record) if record.locked => {
                return WebhookResponse::rejected(
                    format!("deployments are locked for {project}"),
                    422,
                );
            }
            Ok(_) | Err(LockError::NotFound(_)) => {}
            Err(LockError::Store(e)) => {
                tracing::error!(error = %e, "store unavailable during webhook accept");
                return WebhookResponse::rejected("record store unavailable", 500);
            }
        }

        // Cache the payload verbatim so the project can be redeployed later.
        let raw_text = String::from_utf8_lossy(raw_body);
        if let Err(e) = self.env.store.cache_webhook(&project.key(), &raw_text).await {
            tracing::error!(error = %e, "store unavailable during webhook accept");
            return WebhookResponse::rejected("record store unavailable", 500);
        }

        let env = self.env.clone();
        tokio::spawn(async move {
            deploy::run(&env, webhook).await;
        });

        WebhookResponse::dispatched(format!("deployment dispatched for {project}"))
    }

    /// Operator lock lookup. `NotFound` means the project was never locked.
    pub async fn lookup_lock(&self, project: &ProjectId) -> std::result::Result<LockRecord, LockError> {
        self.locks().lookup(project).await
    }

    /// Operator freeze/unfreeze. Written as a user lock, which the pipeline
    /// never auto-releases.
    pub async fn set_lock(
        &self,
        project: &ProjectId,
        locked: bool,
    ) -> std::result::Result<bool, LockError> {
        self.locks().set(project, locked, false).await
    }

    /// Deployment history, newest first, with the total matching count.
    pub async fn list_deployments(
        &self,
        project: Option<&ProjectId>,
        page_size: usize,
    ) -> std::result::Result<(Vec<DeploymentRecord>, usize), StoreError> {
        let key = project.map(ProjectId::key);
        self.env.store.deployments(key.as_deref(), page_size).await
    }

    /// Replay the cached webhook for a project and run the attempt to
    /// completion. The outcome lands in the deployment record as usual.
    pub async fn redeploy(&self, project: &ProjectId) -> Result<()> {
        let raw = self
            .env
            .store
            .cached_webhook(&project.key())
            .await?
            .ok_or_else(|| Error::NoCachedWebhook(project.full_name().to_string()))?;

        let webhook: Webhook = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("cached webhook is not valid JSON: {e}")))?;

        deploy::run(&self.env, webhook).await;
        Ok(())
    }

    fn locks(&self) -> &LockManager {
        &self.env.locks
    }
}
