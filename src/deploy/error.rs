// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers launch, pull, health gate, maintenance, cutover, and lock failures.

use chrono::{DateTime, Utc};

use super::run::StepName;
use crate::proxy::TemplateError;
use crate::runtime::HealthStatus;

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The runtime could not be queried.
    #[error("runtime query failed: {0}")]
    RuntimeQuery(String),

    /// The shared infrastructure tier did not come up.
    #[error("failed to start infrastructure: {0}")]
    InfraLaunch(String),

    /// Every pull attempt failed.
    #[error("failed to pull images after {attempts} attempts: {last}")]
    PullExhausted { attempts: u32, last: String },

    /// The target color's stack did not come up.
    #[error("failed to start {project}: {message}")]
    Launch { project: String, message: String },

    /// The target API never reported healthy.
    #[error(
        "{container} not healthy after {attempts} checks ({waited_secs}s, last status {last_status}){}",
        log_suffix(.logs)
    )]
    HealthTimeout {
        container: String,
        attempts: u32,
        waited_secs: u64,
        last_status: HealthStatus,
        logs: Vec<String>,
    },

    /// A critical maintenance command exited non-zero.
    #[error("{step} exited with code {exit_code}{}", output_suffix(.output))]
    MaintenanceFailed {
        step: StepName,
        exit_code: i64,
        output: String,
    },

    /// A maintenance command could not be run at all.
    #[error("{step} could not run: {message}")]
    Exec { step: StepName, message: String },

    /// The proxy config could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The live proxy config could not be written.
    #[error("failed to write proxy config: {0}")]
    ConfigWrite(String),

    /// The proxy could not be reloaded; the previous config was put back.
    #[error("proxy reload failed: {0}")]
    Reload(String),

    /// Another deployment holds the lock.
    #[error("deploy lock held by {holder} (pid {pid}) since {started_at}; use --force-unlock to break it")]
    LockHeld {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    /// The lock file could not be managed.
    #[error("deploy lock error: {0}")]
    Lock(String),
}

impl DeployError {
    pub fn lock_held(holder: String, pid: u32, started_at: DateTime<Utc>) -> Self {
        DeployError::LockHeld {
            holder,
            pid,
            started_at,
        }
    }

    pub fn lock_error(message: impl Into<String>) -> Self {
        DeployError::Lock(message.into())
    }

    /// The step this error is attributed to in the run record.
    pub fn step(&self) -> Option<StepName> {
        match self {
            DeployError::RuntimeQuery(_) => Some(StepName::ResolveColors),
            DeployError::InfraLaunch(_) => Some(StepName::LaunchInfra),
            DeployError::PullExhausted { .. } => Some(StepName::PullImages),
            DeployError::Launch { .. } => Some(StepName::LaunchApp),
            DeployError::HealthTimeout { .. } => Some(StepName::HealthGate),
            DeployError::MaintenanceFailed { step, .. } | DeployError::Exec { step, .. } => {
                Some(*step)
            }
            DeployError::Template(_) => Some(StepName::RenderConfig),
            DeployError::ConfigWrite(_) => Some(StepName::SwapConfig),
            DeployError::Reload(_) => Some(StepName::ReloadProxy),
            DeployError::LockHeld { .. } | DeployError::Lock(_) => None,
        }
    }
}

fn log_suffix(logs: &[String]) -> String {
    if logs.is_empty() {
        String::new()
    } else {
        format!("\nlast log lines:\n{}", logs.join("\n"))
    }
}

fn output_suffix(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!("\n{}", output)
    }
}
