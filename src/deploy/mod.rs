// ABOUTME: Blue/green deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct and the end-to-end pipeline.

mod cleanup;
mod cutover;
mod deployment;
mod error;
mod health;
mod lock;
mod maintenance;
mod pipeline;
mod resolve;
mod run;
mod state;
mod status;
mod transitions;

pub use cleanup::{CleanupFailure, CleanupResult, find_leftovers, remove_containers};
pub use deployment::{DeployOptions, DeployPlan, Deployment, LaunchMode};
pub use error::DeployError;
pub use lock::{DeployLock, LockInfo};
pub use pipeline::{RunResult, execute};
pub use resolve::{ColorPair, resolve_colors};
pub use run::{DeploymentRun, Outcome, StepName, StepResult, StepStatus};
pub use state::{Abortable, Completed, CutOver, Healthy, Launched, Maintained, Resolved};
pub use status::{ContainerLine, RuntimeLine, StatusReport, collect_status};
pub use transitions::{DeploymentReport, TransitionResult};
