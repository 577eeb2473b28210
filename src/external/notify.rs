// ABOUTME: Outcome notification seam.
// ABOUTME: Delivery is best-effort; failures are logged, never fatal.

use async_trait::async_trait;

/// Best-effort notification sink for deployment outcomes.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str);
}

/// Writes notifications to the process log. Stands in for a chat
/// integration, which is wired in by the embedding server.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) {
        tracing::info!(target: "slipway::notify", "{text}");
    }
}
