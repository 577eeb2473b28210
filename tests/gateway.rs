// ABOUTME: Integration tests for the webhook gateway.
// ABOUTME: Acceptance decisions, signature enforcement, dispatch, and redeploy.

mod support;

use slipway::config::Settings;
use slipway::deploy::PipelineEnv;
use slipway::external::WorkloadState;
use slipway::health::HealthcheckEngine;
use slipway::lock::LockManager;
use slipway::store::{DeploymentStatus, RecordStore};
use slipway::webhook::{Gateway, ProjectId, signature};
use std::sync::Arc;
use std::time::Duration;
use support::mocks::{FixedWorkloads, RecordingNotifier, StubCompose, StubVcs};

fn gateway_with(settings: Settings, store: &RecordStore) -> Gateway {
    let settings = Arc::new(settings);
    let env = PipelineEnv {
        health: HealthcheckEngine::new(
            Arc::new(FixedWorkloads::new(WorkloadState::Running)),
            settings.healthcheck_retries,
            settings.healthcheck_backoff,
        ),
        locks: LockManager::new(store.clone()),
        store: store.clone(),
        vcs: Arc::new(StubVcs::new("Already up to date.")),
        compose: Arc::new(StubCompose::new("unused")),
        notifier: Arc::new(RecordingNotifier::default()),
        settings,
    };
    Gateway::new(env)
}

fn test_settings(workspace: &std::path::Path) -> Settings {
    Settings {
        workspace: workspace.to_path_buf(),
        healthcheck_backoff: Duration::from_millis(1),
        ..Default::default()
    }
}

fn pull_body(git_ref: &str) -> Vec<u8> {
    serde_json::to_vec(&support::push_payload(
        "acme/webapp",
        git_ref,
        "deadbeef",
        Some(serde_json::json!({"deployment_type": "pull"})),
    ))
    .unwrap()
}

/// Poll until the deployment record reaches a terminal status.
async fn wait_for_terminal(store: &RecordStore, key: &str) -> DeploymentStatus {
    for _ in 0..200 {
        if let Some(record) = store.deployment(key).await.unwrap()
            && record.status != DeploymentStatus::InProgress
        {
            return record.status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("deployment for {key} never reached a terminal status");
}

#[tokio::test]
async fn malformed_json_is_rejected_422() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let gateway = gateway_with(test_settings(workspace.path()), &store);

    let response = gateway.accept_webhook(b"not json {", None).await;
    assert!(!response.success);
    assert_eq!(response.status_code, 422);
    assert_eq!(response.message, "Malformed or missing JSON data");
}

#[tokio::test]
async fn missing_signature_with_secret_is_rejected_403() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let mut settings = test_settings(workspace.path());
    settings.secret = Some("abc".to_string());
    let gateway = gateway_with(settings, &store);

    let response = gateway.accept_webhook(&pull_body("refs/heads/main"), None).await;
    assert!(!response.success);
    assert_eq!(response.status_code, 403);
    assert_eq!(response.message, "signature mismatch");
}

#[tokio::test]
async fn bad_signature_is_rejected_403() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let mut settings = test_settings(workspace.path());
    settings.secret = Some("abc".to_string());
    let gateway = gateway_with(settings, &store);

    let body = pull_body("refs/heads/main");
    let mut sig = signature::sign(&body, "abc");
    let last = sig.pop().unwrap();
    sig.push(if last == '0' { '1' } else { '0' });

    let response = gateway.accept_webhook(&body, Some(&sig)).await;
    assert_eq!(response.status_code, 403);
}

#[tokio::test]
async fn valid_signature_dispatches_and_deploys() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let mut settings = test_settings(workspace.path());
    settings.secret = Some("abc".to_string());
    let gateway = gateway_with(settings, &store);

    let body = pull_body("refs/heads/main");
    let sig = format!("sha256={}", signature::sign(&body, "abc"));

    let response = gateway.accept_webhook(&body, Some(&sig)).await;
    assert!(response.success);
    assert_eq!(response.status_code, 200);
    assert!(response.message.contains("acme/webapp"));

    let status = wait_for_terminal(&store, "acme-webapp@deadbeef").await;
    assert_eq!(status, DeploymentStatus::Success);
}

#[tokio::test]
async fn disallowed_branch_is_rejected_422() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let gateway = gateway_with(test_settings(workspace.path()), &store);

    let response = gateway
        .accept_webhook(&pull_body("refs/heads/feature-x"), None)
        .await;
    assert!(!response.success);
    assert_eq!(response.status_code, 422);
    assert!(response.message.contains("feature-x"));
}

#[tokio::test]
async fn tag_dispatches_only_when_enabled() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let gateway = gateway_with(test_settings(workspace.path()), &store);

    let response = gateway.accept_webhook(&pull_body("refs/tags/v1.0"), None).await;
    assert_eq!(response.status_code, 422);

    let mut settings = test_settings(workspace.path());
    settings.deploy_on_tag = true;
    let store = RecordStore::in_memory().unwrap();
    let gateway = gateway_with(settings, &store);

    let response = gateway.accept_webhook(&pull_body("refs/tags/v1.0"), None).await;
    assert_eq!(response.status_code, 200);
    wait_for_terminal(&store, "acme-webapp@deadbeef").await;
}

#[tokio::test]
async fn locked_project_is_rejected_without_touching_history() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let gateway = gateway_with(test_settings(workspace.path()), &store);
    let project = ProjectId::new("acme/webapp");

    gateway.set_lock(&project, true).await.unwrap();

    let response = gateway.accept_webhook(&pull_body("refs/heads/main"), None).await;
    assert!(!response.success);
    assert_eq!(response.status_code, 422);
    assert!(response.message.contains("locked"));

    // The rejection never mutates the deployment record.
    assert!(store.deployment("acme-webapp@deadbeef").await.unwrap().is_none());

    // And the operator lock is untouched.
    let lock = gateway.lookup_lock(&project).await.unwrap();
    assert!(lock.locked);
    assert_eq!(lock.system_lock, Some(false));
}

#[tokio::test]
async fn accepted_webhook_is_cached_for_redeploy() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let gateway = gateway_with(test_settings(workspace.path()), &store);
    let project = ProjectId::new("acme/webapp");

    let response = gateway.accept_webhook(&pull_body("refs/heads/main"), None).await;
    assert_eq!(response.status_code, 200);
    wait_for_terminal(&store, "acme-webapp@deadbeef").await;

    // Cached verbatim.
    let cached = store.cached_webhook(&project.key()).await.unwrap().unwrap();
    assert_eq!(cached.as_bytes(), pull_body("refs/heads/main").as_slice());

    // Replay runs a fresh attempt to completion.
    gateway.redeploy(&project).await.unwrap();
    let record = store.deployment("acme-webapp@deadbeef").await.unwrap().unwrap();
    assert_eq!(record.status, DeploymentStatus::Success);
}

#[tokio::test]
async fn redeploy_without_cached_webhook_errors() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let gateway = gateway_with(test_settings(workspace.path()), &store);

    let err = gateway
        .redeploy(&ProjectId::new("acme/unknown"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no cached webhook"));
}

#[tokio::test]
async fn list_deployments_orders_and_counts() {
    let workspace = tempfile::tempdir().unwrap();
    let store = RecordStore::in_memory().unwrap();
    let gateway = gateway_with(test_settings(workspace.path()), &store);

    let response = gateway.accept_webhook(&pull_body("refs/heads/main"), None).await;
    assert_eq!(response.status_code, 200);
    wait_for_terminal(&store, "acme-webapp@deadbeef").await;

    let project = ProjectId::new("acme/webapp");
    let (records, total) = gateway.list_deployments(Some(&project), 10).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(records[0].project, "acme-webapp");
    assert_eq!(records[0].commit, "deadbeef");

    let (none, total) = gateway
        .list_deployments(Some(&ProjectId::new("other/repo")), 10)
        .await
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(total, 0);
}
