// ABOUTME: Compose stack operations: bring projects up or down, pull images, prune.
// ABOUTME: Defines the StackOps seam and the per-project StackSpec it operates on.

mod compose;

pub use compose::ComposeCli;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::types::{Color, ServiceName};

/// One compose project: a file, a project name and optionally a subset of
/// its services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSpec {
    pub project: String,
    pub compose_file: PathBuf,
    /// Services to act on. Empty means every service in the file.
    pub services: Vec<ServiceName>,
    pub env_file: Option<PathBuf>,
}

impl StackSpec {
    /// The shared infrastructure tier.
    pub fn infra(config: &Config) -> Self {
        Self {
            project: config.infra.project.clone(),
            compose_file: config.infra.compose_file.clone(),
            services: config.infra.services.clone(),
            env_file: Some(config.env_file.clone()),
        }
    }

    /// The application tier of one color.
    pub fn app(config: &Config, color: Color) -> Self {
        Self {
            project: color.project().to_string(),
            compose_file: config.app.compose_file.clone(),
            services: Vec::new(),
            env_file: Some(config.env_file.clone()),
        }
    }
}

/// Whether `up` builds images first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPolicy {
    /// Compose's own default (build only what is missing).
    Default,
    /// `--build`: rebuild from local sources.
    Always,
    /// `--no-build`: use images already pulled.
    Never,
}

/// Compose-level operations on a project.
#[async_trait]
pub trait StackOps: Send + Sync {
    /// `up -d` the project.
    async fn up(&self, spec: &StackSpec, build: BuildPolicy) -> Result<(), StackError>;

    /// Pull every image the project references.
    async fn pull(&self, spec: &StackSpec) -> Result<(), StackError>;

    /// Stop and remove the project's containers and networks.
    async fn down(&self, spec: &StackSpec) -> Result<(), StackError>;

    /// Start a dangling-image prune older than `retention` and return without
    /// waiting for it.
    fn prune_images(&self, retention: Duration) -> Result<(), StackError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {output}")]
    Failed {
        command: String,
        status: String,
        output: String,
    },
}
