// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ContainerOps, ExecOps, LogOps, RuntimeInfo, and the FullRuntime bundle.

mod container;
mod exec;
mod logs;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use exec::{ExecError, ExecOps};
pub use logs::{LogError, LogLine, LogOps, LogOptions, LogStream, LogStreamBox, tail_logs};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Everything a deployment needs from a runtime.
///
/// Blanket-implemented, so any runtime with the individual capabilities
/// qualifies.
pub trait FullRuntime: ContainerOps + ExecOps + LogOps + RuntimeInfo {}

impl<T: ContainerOps + ExecOps + LogOps + RuntimeInfo> FullRuntime for T {}
