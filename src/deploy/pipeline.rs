// ABOUTME: Runs a resolved deployment through every state to completion or abort.
// ABOUTME: Every failure before cutover funnels into the same target-only teardown.

use crate::output::Output;
use crate::runtime::FullRuntime;
use crate::stack::StackOps;

use super::Deployment;
use super::error::DeployError;
use super::state::{Abortable, Resolved};
use super::transitions::DeploymentReport;

/// Result of a full run: the report either way, plus the error on abort.
pub type RunResult = Result<DeploymentReport, (DeploymentReport, DeployError)>;

/// Drive `deployment` from launch through cleanup.
pub async fn execute<R: FullRuntime, K: StackOps>(
    runtime: &R,
    stack: &K,
    deployment: Deployment<Resolved>,
    output: &Output,
) -> RunResult {
    let target = deployment.target();

    output.progress(&format!("  → Launching {}...", target));
    let deployment = match deployment.launch(stack).await {
        Ok(d) => d,
        Err((d, e)) => return Err(abort(d, runtime, stack, e, output).await),
    };

    output.progress("  → Waiting for health check...");
    let deployment = match deployment.await_healthy(runtime).await {
        Ok(d) => d,
        Err((d, e)) => return Err(abort(d, runtime, stack, e, output).await),
    };

    output.progress("  → Running maintenance...");
    let deployment = match deployment.maintain(runtime).await {
        Ok(d) => d,
        Err((d, e)) => return Err(abort(d, runtime, stack, e, output).await),
    };

    output.progress("  → Cutting over traffic...");
    let deployment = match deployment.cutover(runtime).await {
        Ok(d) => d,
        Err((d, e)) => return Err(abort(d, runtime, stack, e, output).await),
    };

    output.progress("  → Cleaning up...");
    let deployment = deployment.cleanup(runtime, stack).await;

    Ok(deployment.finish())
}

async fn abort<S: Abortable, R: FullRuntime, K: StackOps>(
    deployment: Deployment<S>,
    runtime: &R,
    stack: &K,
    error: DeployError,
    output: &Output,
) -> (DeploymentReport, DeployError) {
    output.error(&error.to_string());
    output.progress(&format!("  → Tearing down {}...", deployment.target()));
    deployment.abort(runtime, stack, error).await
}
