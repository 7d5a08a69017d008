// ABOUTME: Teardown of colors that are not serving traffic.
// ABOUTME: Compose down plus removal of stale containers left by interrupted runs.

use std::time::Duration;

use crate::config::Config;
use crate::runtime::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
use crate::stack::{StackOps, StackSpec};
use crate::types::{Color, ContainerId};

/// Containers whose name starts with `prefix`, running or not.
pub async fn find_leftovers<R: ContainerOps>(
    runtime: &R,
    prefix: &str,
) -> Result<Vec<ContainerSummary>, ContainerError> {
    // Name filters match substrings, so check the prefix ourselves.
    let containers = runtime
        .list_containers(&ContainerFilters::any_named(prefix))
        .await?;

    Ok(containers
        .into_iter()
        .filter(|c| c.name.trim_start_matches('/').starts_with(prefix))
        .collect())
}

#[derive(Debug)]
pub struct CleanupFailure {
    pub container_id: ContainerId,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct CleanupResult {
    pub removed: Vec<ContainerId>,
    pub failed: Vec<CleanupFailure>,
}

impl CleanupResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stop and force-remove each container. Best effort per container.
pub async fn remove_containers<R: ContainerOps>(
    runtime: &R,
    containers: &[ContainerId],
    stop_timeout: Duration,
) -> CleanupResult {
    let mut result = CleanupResult::default();

    for id in containers {
        let _ = runtime.stop_container(id, stop_timeout).await;

        match runtime.remove_container(id, true).await {
            Ok(()) | Err(ContainerError::NotFound(_)) => result.removed.push(id.clone()),
            Err(e) => result.failed.push(CleanupFailure {
                container_id: id.clone(),
                error: e.to_string(),
            }),
        }
    }

    result
}

/// Take a color's stack down and remove anything compose left behind.
///
/// Returns the problems encountered; an empty list means the color is gone.
pub async fn retire_color<R: ContainerOps, K: StackOps>(
    runtime: &R,
    stack: &K,
    config: &Config,
    color: Color,
) -> Vec<String> {
    let mut problems = Vec::new();

    if let Err(e) = stack.down(&StackSpec::app(config, color)).await {
        problems.push(format!("compose down {}: {}", color, e));
    }

    let prefix = config.app.color_prefix(color);
    match find_leftovers(runtime, &prefix).await {
        Ok(leftovers) if !leftovers.is_empty() => {
            tracing::info!("removing {} leftover {} container(s)", leftovers.len(), color);
            let ids: Vec<_> = leftovers.into_iter().map(|c| c.id).collect();
            let result = remove_containers(runtime, &ids, config.cleanup.stop_timeout).await;
            problems.extend(
                result
                    .failed
                    .into_iter()
                    .map(|f| format!("remove {}: {}", f.container_id, f.error)),
            );
        }
        Ok(_) => {}
        Err(e) => problems.push(format!("list {} containers: {}", color, e)),
    }

    problems
}
