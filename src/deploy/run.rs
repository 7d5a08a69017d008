// ABOUTME: Record of one deployment attempt: colors, ordered step results, outcome.
// ABOUTME: Steps are append-only; nothing outside this module can rewrite a recorded result.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::resolve::ColorPair;
use crate::types::Color;

/// Every step a run can record, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    ResolveColors,
    LaunchInfra,
    PullImages,
    LaunchApp,
    HealthGate,
    QuiesceWorker,
    Migrate,
    Reencrypt,
    SyncVersion,
    RenderConfig,
    SwapConfig,
    ReloadProxy,
    VerifyConfig,
    VerifyHttp,
    Cleanup,
    PruneImages,
    Teardown,
    ResumeWorker,
}

impl StepName {
    pub fn as_str(self) -> &'static str {
        match self {
            StepName::ResolveColors => "resolve-colors",
            StepName::LaunchInfra => "launch-infra",
            StepName::PullImages => "pull-images",
            StepName::LaunchApp => "launch-app",
            StepName::HealthGate => "health-gate",
            StepName::QuiesceWorker => "quiesce-worker",
            StepName::Migrate => "migrate",
            StepName::Reencrypt => "reencrypt",
            StepName::SyncVersion => "sync-version",
            StepName::RenderConfig => "render-config",
            StepName::SwapConfig => "swap-config",
            StepName::ReloadProxy => "reload-proxy",
            StepName::VerifyConfig => "verify-config",
            StepName::VerifyHttp => "verify-http",
            StepName::Cleanup => "cleanup",
            StepName::PruneImages => "prune-images",
            StepName::Teardown => "teardown",
            StepName::ResumeWorker => "resume-worker",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub name: StepName,
    pub status: StepStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pending,
    Succeeded,
    Failed,
}

/// One deployment attempt, created at start and discarded at exit.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentRun {
    current: Option<Color>,
    target: Color,
    started_at: DateTime<Utc>,
    steps: Vec<StepResult>,
    outcome: Outcome,
}

impl DeploymentRun {
    pub fn new(colors: ColorPair) -> Self {
        Self {
            current: colors.current,
            target: colors.target,
            started_at: Utc::now(),
            steps: Vec::new(),
            outcome: Outcome::Pending,
        }
    }

    pub fn current(&self) -> Option<Color> {
        self.current
    }

    pub fn target(&self) -> Color {
        self.target
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// Most recent result recorded for `name`.
    pub fn step(&self, name: StepName) -> Option<&StepResult> {
        self.steps.iter().rev().find(|s| s.name == name)
    }

    /// Index of the first result recorded for `name`.
    pub fn position(&self, name: StepName) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    pub fn record(&mut self, name: StepName, status: StepStatus, detail: impl Into<String>) {
        let detail = detail.into();
        match status {
            StepStatus::Failed => tracing::warn!(step = %name, "{}", detail),
            _ => tracing::info!(step = %name, ?status, "{}", detail),
        }
        self.steps.push(StepResult {
            name,
            status,
            detail,
        });
    }

    pub fn ok(&mut self, name: StepName, detail: impl Into<String>) {
        self.record(name, StepStatus::Ok, detail);
    }

    pub fn failed(&mut self, name: StepName, detail: impl Into<String>) {
        self.record(name, StepStatus::Failed, detail);
    }

    pub fn skipped(&mut self, name: StepName, detail: impl Into<String>) {
        self.record(name, StepStatus::Skipped, detail);
    }

    /// Set the final outcome. Later calls do not overwrite it.
    pub(crate) fn finish(&mut self, outcome: Outcome) {
        if self.outcome == Outcome::Pending {
            self.outcome = outcome;
        }
    }
}
