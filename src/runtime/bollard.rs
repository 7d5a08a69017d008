// ABOUTME: Bollard-backed runtime: inspect, stop, restart, remove, exec and logs.
// ABOUTME: Talks to Docker or Podman over the Docker-compatible API on a local socket.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult, HealthStatus, LogError, LogLine,
    LogOps, LogOptions, LogStream, LogStreamBox, RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::runtime::types::{DetectedRuntime, RuntimeType};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::{ContainerStateStatusEnum, HealthStatusEnum};
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptions, LogsOptions, RemoveContainerOptions,
    RestartContainerOptions, StopContainerOptions,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;

/// Seconds bollard waits on a single API request.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Ceiling for a detached exec. Migrations can run for a long time.
const DETACHED_EXEC_LIMIT: Duration = Duration::from_secs(30 * 60);
const DETACHED_EXEC_POLL: Duration = Duration::from_millis(250);

/// Podman can report states bollard does not know while a container shuts
/// down; listing is retried this many times on such errors.
const LIST_ATTEMPTS: u32 = 3;

// =============================================================================
// Error mapping
// =============================================================================

/// Status code and message of an error response from the daemon.
fn daemon_error(e: &bollard::errors::Error) -> Option<(u16, &str)> {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => Some((*status_code, message.as_str())),
        _ => None,
    }
}

fn container_error(e: bollard::errors::Error) -> ContainerError {
    match daemon_error(&e) {
        Some((404, msg)) => ContainerError::NotFound(msg.to_string()),
        Some((304, msg)) => ContainerError::NotRunning(msg.to_string()),
        Some((409, msg)) => ContainerError::Conflict(msg.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn exec_create_error(e: bollard::errors::Error) -> ExecError {
    match daemon_error(&e) {
        Some((404, msg)) => ExecError::ContainerNotFound(msg.to_string()),
        Some((409, msg)) => ExecError::ContainerNotRunning(msg.to_string()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn exec_error(e: bollard::errors::Error) -> ExecError {
    match daemon_error(&e) {
        Some((404, msg)) => ExecError::ExecNotFound(msg.to_string()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn connection_error(e: bollard::errors::Error) -> RuntimeInfoError {
    RuntimeInfoError::ConnectionFailed(e.to_string())
}

// =============================================================================
// Model conversion
// =============================================================================

fn container_state(status: Option<ContainerStateStatusEnum>) -> ContainerState {
    match status {
        Some(ContainerStateStatusEnum::CREATED) => ContainerState::Created,
        Some(ContainerStateStatusEnum::RUNNING) => ContainerState::Running,
        Some(ContainerStateStatusEnum::PAUSED) => ContainerState::Paused,
        Some(ContainerStateStatusEnum::RESTARTING) => ContainerState::Restarting,
        Some(ContainerStateStatusEnum::REMOVING) => ContainerState::Removing,
        Some(ContainerStateStatusEnum::DEAD) => ContainerState::Dead,
        _ => ContainerState::Exited,
    }
}

/// Containers without a healthcheck report no health at all.
fn health_status(status: Option<HealthStatusEnum>) -> HealthStatus {
    match status {
        Some(HealthStatusEnum::STARTING) => HealthStatus::Starting,
        Some(HealthStatusEnum::HEALTHY) => HealthStatus::Healthy,
        Some(HealthStatusEnum::UNHEALTHY) => HealthStatus::Unhealthy,
        _ => HealthStatus::Unknown,
    }
}

fn is_transient_list_error(message: &str) -> bool {
    message.contains("unknown variant `stopping`") || message.contains("unknown variant `stopped`")
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Runtime over the Docker-compatible API, for Docker and Podman alike.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to the socket found by `detect_runtime()`. Does not contact
    /// the daemon; call `ping` for that.
    pub fn connect(detected: &DetectedRuntime) -> Result<Self, RuntimeInfoError> {
        let client = Docker::connect_with_unix(
            &detected.socket_path,
            REQUEST_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(connection_error)?;
        Ok(Self::new(client, detected.runtime_type))
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    async fn create_exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let options = bollard::models::ExecConfig {
            cmd: Some(config.cmd.clone()),
            env: (!config.env.is_empty()).then(|| config.env.clone()),
            attach_stdout: Some(config.attach_stdout),
            attach_stderr: Some(config.attach_stderr),
            tty: Some(false),
            ..Default::default()
        };

        let created = self
            .client
            .create_exec(container.as_str(), options)
            .await
            .map_err(exec_create_error)?;
        Ok(ExecId::new(created.id))
    }

    /// Stream output until the exec ends, then read its exit code.
    async fn run_attached(&self, exec: &ExecId) -> Result<ExecResult, ExecError> {
        let started = self
            .client
            .start_exec(
                exec.as_str(),
                Some(StartExecOptions {
                    detach: false,
                    ..Default::default()
                }),
            )
            .await
            .map_err(exec_error)?;

        let mut result = ExecResult {
            exit_code: 0,
            stdout: Vec::new(),
            stderr: Vec::new(),
        };

        if let StartExecResults::Attached { mut output, .. } = started {
            while let Some(chunk) = output.next().await {
                match chunk.map_err(|e| ExecError::Failed(e.to_string()))? {
                    LogOutput::StdOut { message } => result.stdout.extend_from_slice(&message),
                    LogOutput::StdErr { message } => result.stderr.extend_from_slice(&message),
                    _ => {}
                }
            }
        }

        let (_, exit_code) = self.inspect_exec(exec).await?;
        result.exit_code = exit_code.unwrap_or(0);
        Ok(result)
    }

    /// Start detached and poll until the exec ends. Podman's attached
    /// streams do not always close, so output is not captured here.
    async fn run_detached(&self, exec: &ExecId) -> Result<ExecResult, ExecError> {
        self.client
            .start_exec(
                exec.as_str(),
                Some(StartExecOptions {
                    detach: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(exec_error)?;

        let deadline = tokio::time::Instant::now() + DETACHED_EXEC_LIMIT;
        loop {
            let (running, exit_code) = self.inspect_exec(exec).await?;
            if !running {
                return Ok(ExecResult {
                    exit_code: exit_code.unwrap_or(0),
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ExecError::Failed(format!(
                    "exec still running after {:?}",
                    DETACHED_EXEC_LIMIT
                )));
            }
            tokio::time::sleep(DETACHED_EXEC_POLL).await;
        }
    }

    async fn inspect_exec(&self, exec: &ExecId) -> Result<(bool, Option<i64>), ExecError> {
        let details = self
            .client
            .inspect_exec(exec.as_str())
            .await
            .map_err(exec_error)?;
        Ok((details.running.unwrap_or(false), details.exit_code))
    }
}

impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self.client.info().await.map_err(connection_error)?;
        let version = self.client.version().await.map_err(connection_error)?;

        Ok(RuntimeMetadata {
            name: self.runtime_type.to_string(),
            version: info.server_version.unwrap_or_default(),
            api_version: version.api_version.unwrap_or_default(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client.ping().await.map_err(connection_error)?;
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let options = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };
        self.client
            .stop_container(id.as_str(), Some(options))
            .await
            .map_err(container_error)
    }

    async fn restart_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let options = RestartContainerOptions {
            t: Some(timeout.as_secs() as i32),
            ..Default::default()
        };
        self.client
            .restart_container(id.as_str(), Some(options))
            .await
            .map_err(container_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.client
            .remove_container(id.as_str(), Some(options))
            .await
            .map_err(container_error)
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(container_error)?;

        let state = details.state.as_ref();
        Ok(ContainerInfo {
            id: ContainerId::new(details.id.clone().unwrap_or_else(|| id.to_string())),
            name: details
                .name
                .as_deref()
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            state: container_state(state.and_then(|s| s.status)),
            health: health_status(state.and_then(|s| s.health.as_ref()).and_then(|h| h.status)),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(name) = &filters.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }
        let options = ListContainersOptions {
            all: filters.all,
            filters: Some(filter_map),
            ..Default::default()
        };

        let mut attempt = 1;
        let containers = loop {
            match self.client.list_containers(Some(options.clone())).await {
                Ok(containers) => break containers,
                Err(e) if attempt < LIST_ATTEMPTS && is_transient_list_error(&e.to_string()) => {
                    tracing::debug!(attempt, "container list hit a transient state: {}", e);
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                Err(e) => return Err(ContainerError::Runtime(e.to_string())),
            }
        };

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: ContainerId::new(c.id.unwrap_or_default()),
                name: c
                    .names
                    .and_then(|names| names.into_iter().next())
                    .unwrap_or_default(),
                state: c
                    .state
                    .map(|s| format!("{s:?}").to_lowercase())
                    .unwrap_or_default(),
                status: c.status.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl ExecOps for BollardRuntime {
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let exec = self.create_exec(container, config).await?;
        tracing::debug!(container = %container, cmd = ?config.cmd, "exec started");

        match self.runtime_type {
            RuntimeType::Podman => self.run_detached(&exec).await,
            RuntimeType::Docker => self.run_attached(&exec).await,
        }
    }
}

#[async_trait]
impl LogOps for BollardRuntime {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogStreamBox, LogError> {
        let options = LogsOptions {
            stdout: opts.stdout,
            stderr: opts.stderr,
            follow: false,
            timestamps: opts.timestamps,
            tail: opts.tail.map_or_else(|| "all".to_string(), |n| n.to_string()),
            ..Default::default()
        };

        let lines = self.client.logs(id.as_str(), Some(options)).map(|chunk| {
            let (stream, bytes) = match chunk.map_err(|e| LogError::StreamError(e.to_string()))? {
                LogOutput::StdErr { message } => (LogStream::Stderr, message),
                LogOutput::StdOut { message }
                | LogOutput::StdIn { message }
                | LogOutput::Console { message } => (LogStream::Stdout, message),
            };
            Ok(LogLine {
                content: String::from_utf8_lossy(&bytes).into_owned(),
                stream,
            })
        });

        Ok(Box::pin(lines))
    }
}
