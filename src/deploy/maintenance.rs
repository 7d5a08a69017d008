// ABOUTME: Maintenance commands run inside containers, judged by exit status alone.
// ABOUTME: Also stops the previous color's worker so it stops consuming the shared queue.

use std::collections::HashMap;
use std::time::Duration;

use crate::runtime::{ContainerError, ContainerOps, ExecConfig, ExecError, ExecOps, ExecResult};
use crate::types::ContainerId;

/// Lines of command output kept when a step fails.
pub const FAILURE_OUTPUT_LINES: usize = 20;

/// Run `cmd` inside `container` and wait for it to exit.
pub async fn run_command<R: ExecOps>(
    runtime: &R,
    container: &ContainerId,
    cmd: &[String],
    env: &HashMap<String, String>,
) -> Result<ExecResult, ExecError> {
    tracing::debug!(container = %container, ?cmd, "running maintenance command");
    let config = ExecConfig::command(cmd.to_vec()).with_env(env);
    runtime.exec(container, &config).await
}

/// What happened to the previous worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiesce {
    Stopped,
    AlreadyStopped,
    Absent,
}

/// Stop, without removing, the previous color's worker.
pub async fn quiesce_worker<R: ContainerOps>(
    runtime: &R,
    worker: &ContainerId,
    timeout: Duration,
) -> Result<Quiesce, ContainerError> {
    match runtime.stop_container(worker, timeout).await {
        Ok(()) => Ok(Quiesce::Stopped),
        Err(ContainerError::NotRunning(_)) => Ok(Quiesce::AlreadyStopped),
        Err(ContainerError::NotFound(_)) => Ok(Quiesce::Absent),
        Err(e) => Err(e),
    }
}
