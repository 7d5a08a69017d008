// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state; failures hand self back for abort.

use serde::Serialize;

use crate::diagnostics::{Warning, WarningKind};
use crate::proxy::{ProxyConfig, probe_version};
use crate::retry::retry;
use crate::runtime::{ContainerOps, ExecOps, LogOps, tail_logs};
use crate::stack::{BuildPolicy, StackOps, StackSpec};
use crate::types::{Color, ContainerId};

use super::Deployment;
use super::cleanup::retire_color;
use super::cutover::{self, Reloaded};
use super::deployment::LaunchMode;
use super::error::DeployError;
use super::health;
use super::maintenance::{FAILURE_OUTPUT_LINES, Quiesce, quiesce_worker, run_command};
use super::run::{DeploymentRun, Outcome, StepName};
use super::state::{Abortable, Completed, CutOver, Healthy, Launched, Maintained, Resolved};

/// Result type for transitions that may need abort on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

/// What a finished or aborted deployment leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub run: DeploymentRun,
    pub warnings: Vec<Warning>,
}

impl<S> Deployment<S> {
    /// Record `error` against its step and hand self back to the caller.
    fn fail<T>(mut self, error: DeployError) -> TransitionResult<T, S> {
        if let Some(step) = error.step() {
            self.run.failed(step, error.to_string());
        }
        Err((self, error))
    }

    fn report(self) -> DeploymentReport {
        DeploymentReport {
            run: self.run,
            warnings: self.diagnostics.warnings().to_vec(),
        }
    }
}

// =============================================================================
// Resolved -> Launched
// =============================================================================

impl Deployment<Resolved> {
    /// Start the infrastructure tier, then the target color's stack.
    #[must_use = "deployment state must be used"]
    pub async fn launch<K: StackOps>(mut self, stack: &K) -> TransitionResult<Launched, Resolved> {
        let infra = StackSpec::infra(self.config());
        if let Err(e) = stack.up(&infra, BuildPolicy::Default).await {
            return self.fail(DeployError::InfraLaunch(e.to_string()));
        }
        self.run.ok(StepName::LaunchInfra, format!("{} up", infra.project));

        let app = StackSpec::app(self.config(), self.target());
        let build = match self.options().mode {
            LaunchMode::PullPrebuilt => {
                let policy = self.config().pull.policy();
                let spec = &app;
                let pulled = retry(&policy, |attempt| async move {
                    tracing::info!(attempt, "pulling images for {}", spec.project);
                    stack.pull(spec).await
                })
                .await;

                match pulled {
                    Ok(()) => self
                        .run
                        .ok(StepName::PullImages, format!("pulled {}", app.project)),
                    Err(exhausted) => {
                        return self.fail(DeployError::PullExhausted {
                            attempts: exhausted.attempts,
                            last: exhausted.last.to_string(),
                        });
                    }
                }
                BuildPolicy::Never
            }
            LaunchMode::BuildLocal => {
                self.run.skipped(StepName::PullImages, "building locally");
                BuildPolicy::Always
            }
        };

        if let Err(e) = stack.up(&app, build).await {
            return self.fail(DeployError::Launch {
                project: app.project.clone(),
                message: e.to_string(),
            });
        }
        self.run.ok(StepName::LaunchApp, format!("{} up", app.project));

        Ok(self.transition::<Launched>())
    }
}

// =============================================================================
// Launched -> Healthy
// =============================================================================

impl Deployment<Launched> {
    /// Poll the target API until it reports healthy. On timeout the log tail
    /// travels with the error.
    #[must_use = "deployment state must be used"]
    pub async fn await_healthy<R: ContainerOps + LogOps>(
        mut self,
        runtime: &R,
    ) -> TransitionResult<Healthy, Launched> {
        let name = self.config().app.api_container(self.target());
        let container = ContainerId::new(name.as_str());
        let policy = self.config().health.policy();

        match health::await_healthy(runtime, &container, &policy).await {
            Ok(readings) => {
                self.run.ok(
                    StepName::HealthGate,
                    format!("{} healthy after {} reading(s)", name, readings),
                );
                Ok(self.transition::<Healthy>())
            }
            Err(timeout) => {
                let logs = tail_logs(runtime, &container, self.config().health.log_tail)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::debug!("could not read logs of {}: {}", name, e);
                        Vec::new()
                    });
                self.fail(DeployError::HealthTimeout {
                    container: name,
                    attempts: timeout.attempts,
                    waited_secs: timeout.waited.as_secs(),
                    last_status: timeout.last,
                    logs,
                })
            }
        }
    }
}

// =============================================================================
// Healthy -> Maintained
// =============================================================================

impl Deployment<Healthy> {
    /// Quiesce the previous worker, then migrate, re-encrypt and sync the
    /// version inside the target API container, in that order.
    #[must_use = "deployment state must be used"]
    pub async fn maintain<R: ContainerOps + ExecOps>(
        mut self,
        runtime: &R,
    ) -> TransitionResult<Maintained, Healthy> {
        self.quiesce_previous_worker(runtime).await;

        let api = ContainerId::new(self.config().app.api_container(self.target()));

        let migrate = self.config().maintenance.migrate.clone();
        if let Err(e) = self
            .critical_step(runtime, &api, StepName::Migrate, &migrate)
            .await
        {
            return Err((self, e));
        }

        if self.options().skip_reencrypt {
            self.run.skipped(StepName::Reencrypt, "skip requested");
        } else {
            let reencrypt = self
                .config()
                .maintenance
                .reencrypt_command(self.options().force_reencrypt);
            if let Err(e) = self
                .critical_step(runtime, &api, StepName::Reencrypt, &reencrypt)
                .await
            {
                return Err((self, e));
            }
        }

        match self.config().maintenance.sync_version.clone() {
            Some(cmd) => self.advisory_step(runtime, &api, &cmd).await,
            None => self.run.skipped(StepName::SyncVersion, "not configured"),
        }

        Ok(self.transition::<Maintained>())
    }

    async fn quiesce_previous_worker<R: ContainerOps>(&mut self, runtime: &R) {
        let Some(current) = self.current() else {
            self.run.skipped(StepName::QuiesceWorker, "first deployment");
            return;
        };
        let Some(worker) = self.config().app.worker_container(current) else {
            self.run.skipped(StepName::QuiesceWorker, "no worker service");
            return;
        };

        let id = ContainerId::new(worker.as_str());
        let timeout = self.config().maintenance.worker_stop_timeout;
        match quiesce_worker(runtime, &id, timeout).await {
            Ok(Quiesce::Stopped) => {
                self.quiesced = Some(id);
                self.run.ok(StepName::QuiesceWorker, format!("stopped {}", worker));
            }
            Ok(Quiesce::AlreadyStopped) => self
                .run
                .ok(StepName::QuiesceWorker, format!("{} already stopped", worker)),
            Ok(Quiesce::Absent) => self
                .run
                .skipped(StepName::QuiesceWorker, format!("{} not found", worker)),
            Err(e) => {
                let message = format!("could not stop {}: {}", worker, e);
                self.run.failed(StepName::QuiesceWorker, message.clone());
                self.warn(Warning::new(WarningKind::WorkerQuiesce, message));
            }
        }
    }

    async fn critical_step<R: ExecOps>(
        &mut self,
        runtime: &R,
        api: &ContainerId,
        step: StepName,
        cmd: &[String],
    ) -> Result<(), DeployError> {
        let outcome = run_command(runtime, api, cmd, &self.plan.maintenance_env).await;
        let error = match outcome {
            Ok(result) if result.success() => {
                self.run.ok(step, format!("`{}` exited 0", cmd.join(" ")));
                return Ok(());
            }
            Ok(result) => DeployError::MaintenanceFailed {
                step,
                exit_code: result.exit_code,
                output: result.output_tail(FAILURE_OUTPUT_LINES),
            },
            Err(e) => DeployError::Exec {
                step,
                message: e.to_string(),
            },
        };
        self.run.failed(step, error.to_string());
        Err(error)
    }

    async fn advisory_step<R: ExecOps>(&mut self, runtime: &R, api: &ContainerId, cmd: &[String]) {
        let step = StepName::SyncVersion;
        let outcome = run_command(runtime, api, cmd, &self.plan.maintenance_env).await;
        let problem = match outcome {
            Ok(result) if result.success() => {
                self.run.ok(step, format!("`{}` exited 0", cmd.join(" ")));
                return;
            }
            Ok(result) => format!(
                "version sync exited with code {}: {}",
                result.exit_code,
                result.output_tail(5)
            ),
            Err(e) => format!("version sync could not run: {}", e),
        };
        self.run.failed(step, problem.clone());
        self.warn(Warning::new(WarningKind::VersionSync, problem));
    }
}

// =============================================================================
// Maintained -> CutOver
// =============================================================================

impl Deployment<Maintained> {
    /// Render, atomically install and reload the proxy config for the target
    /// color, then run the advisory verifications.
    ///
    /// A reload that fails entirely puts the previous config back before
    /// returning the error, so abort still leaves traffic where it was.
    #[must_use = "deployment state must be used"]
    pub async fn cutover<R: ContainerOps + ExecOps>(
        mut self,
        runtime: &R,
    ) -> TransitionResult<CutOver, Maintained> {
        let proxy = ProxyConfig::for_color(
            &self.config().proxy,
            &self.config().app,
            self.target(),
            &self.plan.domain,
        );

        let rendered = match proxy.render() {
            Ok(rendered) => rendered,
            Err(e) => return self.fail(e.into()),
        };
        self.run.ok(
            StepName::RenderConfig,
            format!("upstream {}", proxy.upstream_api),
        );

        let snapshot = match cutover::install(&proxy, &rendered) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(e),
        };
        self.run.ok(
            StepName::SwapConfig,
            format!("wrote {}", proxy.rendered_path.display()),
        );

        match cutover::reload(runtime, &self.config().proxy).await {
            Ok(how) => {
                let detail = match how {
                    Reloaded::Restarted => "proxy restarted",
                    Reloaded::Signalled => "proxy reloaded",
                    Reloaded::RestartedAfterSignal => "reload command failed, proxy restarted",
                };
                self.run.ok(StepName::ReloadProxy, detail);
            }
            Err(reason) => {
                let detail = match cutover::restore(&proxy, &snapshot) {
                    Ok(()) if snapshot.is_empty() => format!("{}; new config removed", reason),
                    Ok(()) => {
                        // Best effort: the proxy may already be serving the old file.
                        if let Err(e) = cutover::reload(runtime, &self.config().proxy).await {
                            tracing::warn!("reload after restoring previous config failed: {}", e);
                        }
                        format!("{}; previous config restored", reason)
                    }
                    Err(e) => format!("{}; restoring previous config failed: {}", reason, e),
                };
                return self.fail(DeployError::Reload(detail));
            }
        }

        let mut deployment = self.transition::<CutOver>();
        deployment.verify(runtime, &proxy).await;
        Ok(deployment)
    }
}

// =============================================================================
// CutOver -> Completed
// =============================================================================

impl Deployment<CutOver> {
    /// Advisory checks after the settle delay; failures become warnings.
    async fn verify<R: ExecOps>(&mut self, runtime: &R, proxy: &ProxyConfig) {
        let settings = self.config().proxy.clone();
        tokio::time::sleep(settings.settle).await;

        match cutover::verify_in_proxy(runtime, &settings, &proxy.upstream_api).await {
            Ok(()) => self.run.ok(
                StepName::VerifyConfig,
                format!("{} routes to {}", settings.container, proxy.upstream_api),
            ),
            Err(problem) => {
                self.run.failed(StepName::VerifyConfig, problem.clone());
                self.warn(Warning::new(WarningKind::ConfigVerification, problem));
            }
        }

        let Some(url) = settings.verify_url.as_deref() else {
            self.run.skipped(StepName::VerifyHttp, "no verification URL");
            return;
        };
        match probe_version(url, Some(proxy.domain.as_str()), settings.verify_timeout).await {
            Ok(version) => self
                .run
                .ok(StepName::VerifyHttp, format!("{} reports version {}", url, version)),
            Err(e) => {
                let problem = format!("GET {}: {}", url, e);
                self.run.failed(StepName::VerifyHttp, problem.clone());
                self.warn(Warning::new(WarningKind::HttpVerification, problem));
            }
        }
    }

    /// Tear down every color except the active one, then start an image
    /// prune in the background. Never fails: traffic has already moved.
    pub async fn cleanup<R: ContainerOps, K: StackOps>(
        mut self,
        runtime: &R,
        stack: &K,
    ) -> Deployment<Completed> {
        let active = self.target();
        let mut problems = Vec::new();
        let retired: Vec<Color> = Color::ALL.into_iter().filter(|c| *c != active).collect();

        for color in &retired {
            problems.extend(retire_color(runtime, stack, self.config(), *color).await);
        }

        let names: Vec<&str> = retired.iter().map(|c| c.as_str()).collect();
        if problems.is_empty() {
            self.run.ok(StepName::Cleanup, format!("retired {}", names.join(", ")));
        } else {
            self.run.failed(StepName::Cleanup, problems.join("; "));
            for problem in problems {
                self.warn(Warning::new(WarningKind::Cleanup, problem));
            }
        }

        let cleanup = self.config().cleanup.clone();
        if !cleanup.prune {
            self.run.skipped(StepName::PruneImages, "disabled");
        } else {
            match stack.prune_images(cleanup.prune_retention) {
                Ok(()) => self
                    .run
                    .ok(StepName::PruneImages, "started in background"),
                Err(e) => {
                    let problem = format!("image prune: {}", e);
                    self.run.failed(StepName::PruneImages, problem.clone());
                    self.warn(Warning::new(WarningKind::Prune, problem));
                }
            }
        }

        self.transition::<Completed>()
    }
}

impl Deployment<Completed> {
    /// Close the run as succeeded.
    pub fn finish(mut self) -> DeploymentReport {
        self.run.finish(Outcome::Succeeded);
        self.report()
    }
}

// =============================================================================
// Abort (any state before cutover)
// =============================================================================

impl<S: Abortable> Deployment<S> {
    /// Tear down the target color and nothing else, restart the previous
    /// worker if this run stopped it, and close the run as failed.
    pub async fn abort<R: ContainerOps, K: StackOps>(
        mut self,
        runtime: &R,
        stack: &K,
        error: DeployError,
    ) -> (DeploymentReport, DeployError) {
        let target = self.target();
        let problems = retire_color(runtime, stack, self.config(), target).await;
        if problems.is_empty() {
            self.run.ok(StepName::Teardown, format!("removed {}", target));
        } else {
            self.run.failed(StepName::Teardown, problems.join("; "));
            for problem in problems {
                self.warn(Warning::new(WarningKind::Cleanup, problem));
            }
        }

        if let Some(worker) = self.quiesced.take() {
            let timeout = self.config().maintenance.worker_stop_timeout;
            match runtime.restart_container(&worker, timeout).await {
                Ok(()) => self
                    .run
                    .ok(StepName::ResumeWorker, format!("restarted {}", worker)),
                Err(e) => {
                    let problem = format!("could not restart {}: {}", worker, e);
                    self.run.failed(StepName::ResumeWorker, problem.clone());
                    self.warn(Warning::new(WarningKind::WorkerQuiesce, problem));
                }
            }
        }

        self.run.finish(Outcome::Failed);
        (self.report(), error)
    }
}
