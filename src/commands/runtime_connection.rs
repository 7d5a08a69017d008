// ABOUTME: Shared helper for connecting to the local container runtime.
// ABOUTME: Used by the deploy and status commands.

use switchyard::error::Result;
use switchyard::output::Output;
use switchyard::runtime::{BollardRuntime, RuntimeConfig, RuntimeError, RuntimeInfo, detect_runtime};

/// Detect the runtime, connect to its socket and make sure it answers.
pub async fn connect_to_runtime(config: &RuntimeConfig, output: &Output) -> Result<BollardRuntime> {
    output.progress("  → Detecting runtime...");
    let detected = detect_runtime(config).map_err(RuntimeError::from)?;

    output.progress(&format!(
        "  → Found {} at {}",
        detected.runtime_type, detected.socket_path
    ));

    let runtime = BollardRuntime::connect(&detected).map_err(RuntimeError::from)?;
    runtime.ping().await.map_err(RuntimeError::from)?;

    Ok(runtime)
}
