// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Advisory steps report here instead of failing the run; warnings are shown at the end.

use serde::Serialize;

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// The previous color's worker could not be stopped.
    WorkerQuiesce,
    /// The version sync command failed.
    VersionSync,
    /// The proxy's in-container config does not reference the new color.
    ConfigVerification,
    /// The HTTP request through the proxy did not return a version.
    HttpVerification,
    /// A retired color could not be torn down completely.
    Cleanup,
    /// The background image prune could not be started.
    Prune,
    /// A stale or forced deploy lock was broken.
    LockBroken,
    /// Failed to release the deploy lock (lock file may remain).
    LockRelease,
}
