// ABOUTME: Health gate: poll the target API container until it reports healthy.
// ABOUTME: Fixed-interval polling through the shared retry primitive; every reading is fresh.

use std::time::Duration;

use crate::retry::{Backoff, retry};
use crate::runtime::{ContainerOps, HealthStatus};
use crate::types::ContainerId;

/// The container never reported healthy within the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthTimeout {
    pub attempts: u32,
    pub waited: Duration,
    pub last: HealthStatus,
}

/// Read the container's self-reported health. Inspect failures (including
/// a container that does not exist yet) read as `Unknown`.
pub async fn read_health<R: ContainerOps>(runtime: &R, container: &ContainerId) -> HealthStatus {
    match runtime.inspect_container(container).await {
        Ok(info) => info.health,
        Err(e) => {
            tracing::debug!("inspect {} failed: {}", container, e);
            HealthStatus::Unknown
        }
    }
}

/// Poll until healthy. Returns the number of readings taken.
///
/// Starting, unhealthy and unknown readings all keep polling: compose may
/// still restart a container that failed its first checks.
pub async fn await_healthy<R: ContainerOps>(
    runtime: &R,
    container: &ContainerId,
    policy: &Backoff,
) -> Result<u32, HealthTimeout> {
    retry(policy, |attempt| async move {
        let status = read_health(runtime, container).await;
        tracing::debug!(attempt, %status, "health reading for {}", container);
        match status {
            HealthStatus::Healthy => Ok(attempt),
            HealthStatus::Unhealthy => {
                tracing::info!("{} reports unhealthy, still waiting", container);
                Err(status)
            }
            HealthStatus::Starting | HealthStatus::Unknown => Err(status),
        }
    })
    .await
    .map_err(|exhausted| HealthTimeout {
        attempts: exhausted.attempts,
        waited: policy.total_wait(),
        last: exhausted.last,
    })
}
