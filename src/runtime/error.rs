// ABOUTME: Errors from finding and reaching the container runtime, SNAFU style.
// ABOUTME: Each error carries a hint telling the operator what to check next.

use snafu::Snafu;

use super::detection::DetectionError;
use super::traits::RuntimeInfoError;

/// The runtime could not be found or did not answer.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("runtime connection failed: {source}"))]
    Connection { source: RuntimeInfoError },
}

impl RuntimeError {
    /// What to check next, for the operator.
    pub fn hint(&self) -> &'static str {
        match self {
            RuntimeError::Detection {
                source: DetectionError::NoRuntimeFound,
            } => "start Docker or Podman, or set runtime.socket in switchyard.yml",
            RuntimeError::Detection {
                source: DetectionError::SocketMissing(_),
            } => "check runtime.socket in switchyard.yml",
            RuntimeError::Connection {
                source: RuntimeInfoError::ConnectionFailed(_),
            } => "is the daemon running, and can this user open its socket?",
            RuntimeError::Connection {
                source: RuntimeInfoError::Runtime(_),
            } => "the runtime answered with an error; check its logs",
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

impl From<RuntimeInfoError> for RuntimeError {
    fn from(source: RuntimeInfoError) -> Self {
        RuntimeError::Connection { source }
    }
}
