// ABOUTME: Container runtime access for the orchestrator.
// ABOUTME: Detection, the bollard-backed runtime, and the capability traits it implements.

mod bollard;
mod detection;
mod error;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_runtime};
pub use error::RuntimeError;
pub use traits::*;
pub use types::{DetectedRuntime, RuntimeConfig, RuntimeType};
