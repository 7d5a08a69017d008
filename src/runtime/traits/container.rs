// ABOUTME: Container operations trait for container runtimes.
// ABOUTME: Inspect, list, stop, restart, and remove containers.

use super::sealed::Sealed;
use super::shared_types::ContainerInfo;
use crate::types::ContainerId;
use async_trait::async_trait;
use std::time::Duration;

/// Container lifecycle operations.
///
/// Containers are created by the compose CLI, so this trait only covers what
/// the orchestrator does to containers that already exist.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// Stop a running container, keeping it around.
    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError>;

    /// Restart a container (stop then start).
    async fn restart_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError>;

    /// Remove a container.
    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError>;

    /// Get detailed information about a container.
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;

    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by name (partial match, as the Docker API does).
    pub name: Option<String>,
    /// Include stopped containers.
    pub all: bool,
}

impl ContainerFilters {
    /// Running containers whose name contains `name`.
    pub fn running_named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Running and stopped containers whose name contains `name`.
    pub fn any_named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            all: true,
        }
    }
}

/// Summary information about a container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    /// Container ID.
    pub id: ContainerId,
    /// Container name, as the API reports it (leading `/` included).
    pub name: String,
    /// Lowercase state, e.g. `running` or `exited`.
    pub state: String,
    /// Human status line, e.g. `Up 2 hours (healthy)`.
    pub status: String,
}

impl ContainerSummary {
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("container in conflicting state: {0}")]
    Conflict(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
