// ABOUTME: Test support utilities.
// ABOUTME: Provides mock collaborators and payload builders for integration tests.

use std::sync::Once;

// Each test binary only uses some of these items, so allow dead_code.
#[allow(dead_code)]
pub mod mocks;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("slipway=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Build a push webhook payload as JSON.
#[allow(dead_code)]
pub fn push_payload(
    full_name: &str,
    git_ref: &str,
    commit: &str,
    data: Option<serde_json::Value>,
) -> serde_json::Value {
    let owner = full_name.split('/').next().unwrap_or(full_name);
    let mut payload = serde_json::json!({
        "repository": {
            "full_name": full_name,
            "owner": {"name": owner},
            "ssh_url": format!("git@example.com:{full_name}.git")
        },
        "ref": git_ref,
        "commits": [
            {
                "id": commit,
                "message": "update service",
                "author": {"name": "alice"}
            }
        ]
    });
    if let Some(data) = data {
        payload["data"] = data;
    }
    payload
}
