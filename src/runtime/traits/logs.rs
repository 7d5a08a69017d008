// ABOUTME: Log operations trait for container runtimes.
// ABOUTME: Stream container logs and collect the tail for failure diagnostics.

use super::sealed::Sealed;
use crate::types::ContainerId;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// Boxed stream of log lines.
pub type LogStreamBox = Pin<Box<dyn Stream<Item = Result<LogLine, LogError>> + Send>>;

/// Log streaming operations.
#[async_trait]
pub trait LogOps: Sealed + Send + Sync {
    /// Stream logs from a container.
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogStreamBox, LogError>;
}

/// Options for log streaming.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Include stdout.
    pub stdout: bool,
    /// Include stderr.
    pub stderr: bool,
    /// Show timestamps.
    pub timestamps: bool,
    /// Number of lines to show from end (None = all).
    pub tail: Option<u64>,
}

impl LogOptions {
    /// Create options for tailing the last N lines of both streams.
    pub fn tail(n: u64) -> Self {
        Self {
            stdout: true,
            stderr: true,
            timestamps: false,
            tail: Some(n),
        }
    }
}

/// A single log line from a container.
#[derive(Debug, Clone)]
pub struct LogLine {
    /// The log content.
    pub content: String,
    /// Whether this is from stdout or stderr.
    pub stream: LogStream,
}

/// Log stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Errors from log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Collect the last `n` log lines of a container.
///
/// Lines that fail mid-stream end the collection early; whatever was read so
/// far is still returned, since this only feeds diagnostics.
pub async fn tail_logs<R: LogOps + ?Sized>(
    runtime: &R,
    id: &ContainerId,
    n: u64,
) -> Result<Vec<String>, LogError> {
    let mut stream = runtime.container_logs(id, &LogOptions::tail(n)).await?;
    let mut lines = Vec::new();

    while let Some(item) = stream.next().await {
        match item {
            Ok(line) => lines.extend(
                line.content
                    .lines()
                    .map(str::to_string)
                    .filter(|l| !l.is_empty()),
            ),
            Err(e) => {
                tracing::debug!("log stream for {} ended early: {}", id, e);
                break;
            }
        }
    }

    let keep = n as usize;
    if lines.len() > keep {
        lines.drain(..lines.len() - keep);
    }
    Ok(lines)
}
