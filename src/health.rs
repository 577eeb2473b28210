// ABOUTME: Bounded-retry healthcheck engine.
// ABOUTME: Sequential liveness probes with fixed backoff; aggregate is all-must-pass.

use nonempty::NonEmpty;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::external::WorkloadOps;

/// A workload that never reported `running` within the retry budget.
#[derive(Debug, Error)]
#[error("workload '{0}' failed its healthcheck")]
pub struct UnhealthyWorkload(pub String);

/// Verifies that deployed workloads are actually running.
///
/// One probe inspects the workload's live state; anything other than
/// `running` consumes a retry after the fixed backoff. Probes for a list of
/// targets run sequentially and all must pass.
#[derive(Clone)]
pub struct HealthcheckEngine {
    workloads: Arc<dyn WorkloadOps>,
    max_retries: u32,
    backoff: Duration,
}

impl HealthcheckEngine {
    pub fn new(workloads: Arc<dyn WorkloadOps>, max_retries: u32, backoff: Duration) -> Self {
        Self {
            workloads,
            max_retries,
            backoff,
        }
    }

    /// Probe one workload until it reports running or retries are exhausted.
    pub async fn check(&self, target: &str) -> bool {
        for attempt in 0..=self.max_retries {
            match self.workloads.workload_state(target).await {
                Ok(state) if state.is_running() => return true,
                Ok(state) => {
                    tracing::debug!(target, ?state, attempt, "workload not running yet");
                }
                Err(e) => {
                    tracing::debug!(target, error = %e, attempt, "workload inspection failed");
                }
            }
            if attempt < self.max_retries {
                tokio::time::sleep(self.backoff).await;
            }
        }
        false
    }

    /// Probe every target in order; the first unhealthy one fails the batch.
    pub async fn check_all(&self, targets: &NonEmpty<String>) -> Result<(), UnhealthyWorkload> {
        for target in targets.iter() {
            if !self.check(target).await {
                return Err(UnhealthyWorkload(target.clone()));
            }
        }
        Ok(())
    }
}
