// ABOUTME: In-memory container host for tests, implementing the runtime traits and StackOps.
// ABOUTME: Records every call in order so tests can assert on sequencing and side effects.

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult, HealthStatus, LogError, LogLine,
    LogOps, LogOptions, LogStream, LogStreamBox, RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::stack::{BuildPolicy, StackError, StackOps, StackSpec};
use crate::types::{Color, ContainerId};

const APP_SERVICES: [&str; 3] = ["api", "frontend", "worker"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List,
    Inspect(String),
    Logs(String),
    Stop(String),
    Restart(String),
    Remove(String),
    Exec(ExecCall),
    Up { project: String, build: BuildPolicy },
    Pull(String),
    Down(String),
    Prune,
}

impl Call {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Call::List | Call::Inspect(_) | Call::Logs(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExecCall {
    pub container: String,
    pub cmd: Vec<String>,
    pub env: Vec<String>,
}

#[derive(Debug, Clone)]
struct FakeContainer {
    id: String,
    running: bool,
    script: VecDeque<HealthStatus>,
    steady: HealthStatus,
    compose: bool,
}

#[derive(Debug, Default)]
struct HostState {
    containers: BTreeMap<String, FakeContainer>,
    calls: Vec<Call>,
    pending_health: HashMap<String, Vec<HealthStatus>>,
    exit_codes: HashMap<String, i64>,
    logs: HashMap<String, Vec<String>>,
    pull_failures: u32,
    fail_list: bool,
    fail_restart: bool,
    fail_down: HashSet<String>,
    fail_up: HashSet<String>,
    proxy_mount: Option<PathBuf>,
    next_id: u32,
}

impl HostState {
    fn create(&mut self, name: &str, running: bool, compose: bool) {
        let script: VecDeque<HealthStatus> = self
            .pending_health
            .get(name)
            .cloned()
            .unwrap_or_default()
            .into();
        let steady = script.back().copied().unwrap_or(HealthStatus::Healthy);

        self.next_id += 1;
        let id = format!("{:012x}", self.next_id);
        let container = self
            .containers
            .entry(name.to_string())
            .or_insert(FakeContainer {
                id,
                running,
                script: VecDeque::new(),
                steady,
                compose,
            });
        container.running = running;
        container.compose = compose;
        container.script = script;
        container.steady = steady;
    }

    fn find_mut(&mut self, id: &ContainerId) -> Option<(&String, &mut FakeContainer)> {
        self.containers
            .iter_mut()
            .find(|(name, c)| name.as_str() == id.as_str() || c.id == id.as_str())
    }
}

/// A fake Docker host with compose, driven entirely from memory.
#[derive(Debug, Default)]
pub(crate) struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every app service of `color` running and healthy, as compose would
    /// leave it.
    pub fn with_running_color(mut self, color: Color) -> Self {
        let state = self.state.get_mut();
        for service in APP_SERVICES {
            state.create(&format!("{}-{}-1", color, service), true, true);
        }
        self
    }

    pub fn with_running_container(mut self, name: &str) -> Self {
        self.state.get_mut().create(name, true, true);
        self
    }

    pub fn with_stopped_container(mut self, name: &str) -> Self {
        self.state.get_mut().create(name, false, true);
        self
    }

    /// Health readings for `name`, in order; the last one repeats forever.
    /// Applies now and whenever compose (re)creates the container.
    pub fn with_health_script(
        mut self,
        name: &str,
        readings: impl IntoIterator<Item = HealthStatus>,
    ) -> Self {
        let readings: Vec<_> = readings.into_iter().collect();
        let state = self.state.get_mut();
        if let Some(container) = state.containers.get_mut(name) {
            container.script = readings.iter().copied().collect();
            container.steady = readings.last().copied().unwrap_or(HealthStatus::Healthy);
        }
        state.pending_health.insert(name.to_string(), readings);
        self
    }

    /// Exit code for any exec whose program is `program`.
    pub fn with_exit_code(mut self, program: &str, code: i64) -> Self {
        self.state
            .get_mut()
            .exit_codes
            .insert(program.to_string(), code);
        self
    }

    pub fn with_logs(mut self, name: &str, lines: &[&str]) -> Self {
        self.state.get_mut().logs.insert(
            name.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    /// File the proxy container sees when it `cat`s its config.
    pub fn with_proxy_mount(mut self, path: &Path) -> Self {
        self.state.get_mut().proxy_mount = Some(path.to_path_buf());
        self
    }

    /// Mark a container as not known to compose, so `down` leaves it behind.
    pub fn untracked_by_compose(mut self, name: &str) -> Self {
        if let Some(container) = self.state.get_mut().containers.get_mut(name) {
            container.compose = false;
        }
        self
    }

    pub fn failing_pulls(mut self, count: u32) -> Self {
        self.state.get_mut().pull_failures = count;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.state.get_mut().fail_list = true;
        self
    }

    pub fn failing_restart(mut self) -> Self {
        self.state.get_mut().fail_restart = true;
        self
    }

    pub fn failing_down(mut self, project: &str) -> Self {
        self.state.get_mut().fail_down.insert(project.to_string());
        self
    }

    pub fn failing_up(mut self, project: &str) -> Self {
        self.state.get_mut().fail_up.insert(project.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn execs(&self) -> Vec<ExecCall> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exec(exec) => Some(exec),
                _ => None,
            })
            .collect()
    }

    /// Programs run via exec, in order.
    pub fn exec_programs(&self) -> Vec<String> {
        self.execs()
            .into_iter()
            .filter_map(|e| e.cmd.first().cloned())
            .collect()
    }

    pub fn restarts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Restart(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn pulls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Pull(_)))
            .count()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.state.lock().containers.contains_key(name)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.state
            .lock()
            .containers
            .get(name)
            .is_some_and(|c| c.running)
    }

    /// Names of containers starting with `prefix`, with their running flag.
    pub fn containers_with_prefix(&self, prefix: &str) -> Vec<(String, bool)> {
        self.state
            .lock()
            .containers
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, c)| (name.clone(), c.running))
            .collect()
    }
}

impl Sealed for FakeHost {}

#[async_trait]
impl RuntimeInfo for FakeHost {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        Ok(RuntimeMetadata {
            name: "fake".to_string(),
            version: "0.0.0".to_string(),
            api_version: "1.47".to_string(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for FakeHost {
    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Stop(id.to_string()));
        let (_, container) = state
            .find_mut(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if !container.running {
            return Err(ContainerError::NotRunning(id.to_string()));
        }
        container.running = false;
        Ok(())
    }

    async fn restart_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Restart(id.to_string()));
        if state.fail_restart {
            return Err(ContainerError::Runtime("restart refused".to_string()));
        }
        let (_, container) = state
            .find_mut(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        container.running = true;
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, _force: bool) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Remove(id.to_string()));
        let name = state
            .find_mut(id)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        state.containers.remove(&name);
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Inspect(id.to_string()));
        let (name, container) = state
            .find_mut(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let health = container.script.pop_front().unwrap_or(container.steady);

        Ok(ContainerInfo {
            id: ContainerId::new(container.id.as_str()),
            name: name.clone(),
            state: if container.running {
                ContainerState::Running
            } else {
                ContainerState::Exited
            },
            health,
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::List);
        if state.fail_list {
            return Err(ContainerError::Runtime("daemon unavailable".to_string()));
        }

        Ok(state
            .containers
            .iter()
            .filter(|(name, c)| {
                filters.name.as_ref().is_none_or(|f| name.contains(f.as_str()))
                    && (filters.all || c.running)
            })
            .map(|(name, c)| ContainerSummary {
                id: ContainerId::new(c.id.as_str()),
                name: format!("/{}", name),
                state: if c.running { "running" } else { "exited" }.to_string(),
                status: if c.running { "Up" } else { "Exited (0)" }.to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl ExecOps for FakeHost {
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Exec(ExecCall {
            container: container.to_string(),
            cmd: config.cmd.clone(),
            env: config.env.clone(),
        }));

        let running = state
            .find_mut(container)
            .map(|(_, c)| c.running)
            .ok_or_else(|| ExecError::ContainerNotFound(container.to_string()))?;
        if !running {
            return Err(ExecError::ContainerNotRunning(container.to_string()));
        }

        let program = config.cmd.first().map(String::as_str).unwrap_or_default();
        if program == "cat"
            && let Some(mount) = &state.proxy_mount
        {
            return Ok(match std::fs::read(mount) {
                Ok(stdout) => ExecResult {
                    exit_code: 0,
                    stdout,
                    stderr: Vec::new(),
                },
                Err(e) => ExecResult {
                    exit_code: 1,
                    stdout: Vec::new(),
                    stderr: e.to_string().into_bytes(),
                },
            });
        }

        let exit_code = state.exit_codes.get(program).copied().unwrap_or(0);
        Ok(ExecResult {
            exit_code,
            stdout: format!("ran {}\n", program).into_bytes(),
            stderr: if exit_code == 0 {
                Vec::new()
            } else {
                format!("{} failed\n", program).into_bytes()
            },
        })
    }
}

#[async_trait]
impl LogOps for FakeHost {
    async fn container_logs(
        &self,
        id: &ContainerId,
        _opts: &LogOptions,
    ) -> Result<LogStreamBox, LogError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Logs(id.to_string()));
        let lines = state.logs.get(id.as_str()).cloned().unwrap_or_default();
        let items: Vec<Result<LogLine, LogError>> = lines
            .into_iter()
            .map(|content| {
                Ok(LogLine {
                    content,
                    stream: LogStream::Stdout,
                })
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

#[async_trait]
impl StackOps for FakeHost {
    async fn up(&self, spec: &StackSpec, build: BuildPolicy) -> Result<(), StackError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Up {
            project: spec.project.clone(),
            build,
        });
        if state.fail_up.contains(&spec.project) {
            return Err(failed("up", &spec.project));
        }

        let services: Vec<String> = if spec.services.is_empty() {
            APP_SERVICES.iter().map(|s| s.to_string()).collect()
        } else {
            spec.services.iter().map(|s| s.to_string()).collect()
        };
        for service in services {
            let name = format!("{}-{}-1", spec.project, service);
            let already_running = state.containers.get(&name).is_some_and(|c| c.running);
            if !already_running {
                state.create(&name, true, true);
            }
        }
        Ok(())
    }

    async fn pull(&self, spec: &StackSpec) -> Result<(), StackError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Pull(spec.project.clone()));
        if state.pull_failures > 0 {
            state.pull_failures -= 1;
            return Err(failed("pull", &spec.project));
        }
        Ok(())
    }

    async fn down(&self, spec: &StackSpec) -> Result<(), StackError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Down(spec.project.clone()));
        if state.fail_down.contains(&spec.project) {
            return Err(failed("down", &spec.project));
        }
        let prefix = format!("{}-", spec.project);
        state
            .containers
            .retain(|name, c| !(c.compose && name.starts_with(&prefix)));
        Ok(())
    }

    fn prune_images(&self, _retention: Duration) -> Result<(), StackError> {
        self.state.lock().calls.push(Call::Prune);
        Ok(())
    }
}

fn failed(action: &str, project: &str) -> StackError {
    StackError::Failed {
        command: format!("docker compose -p {} {}", project, action),
        status: "exit status: 1".to_string(),
        output: format!("{} failed", action),
    }
}
