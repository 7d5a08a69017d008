// ABOUTME: Deploy command implementation.
// ABOUTME: Pre-flight checks, deploy lock, color resolution and pipeline execution.

use super::runtime_connection::connect_to_runtime;
use switchyard::config::Config;
use switchyard::deploy::{
    DeployLock, DeployOptions, DeployPlan, Deployment, DeploymentReport, Outcome, execute,
    resolve_colors,
};
use switchyard::diagnostics::{Diagnostics, Warning, WarningKind};
use switchyard::error::{Error, Result};
use switchyard::output::Output;
use switchyard::runtime::BollardRuntime;
use switchyard::stack::ComposeCli;

/// Deploy the app to the inactive color and switch traffic to it.
pub async fn deploy(
    config: Config,
    options: DeployOptions,
    force_unlock: bool,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    // Everything that can be checked without touching containers.
    let plan = DeployPlan::prepare(config, options)?;

    output.progress("  → Acquiring deploy lock...");
    let lock = DeployLock::acquire(&plan.config.state_dir, force_unlock)?;
    if let Some(info) = lock.broken() {
        diag.warn(Warning::new(
            WarningKind::LockBroken,
            format!(
                "broke deploy lock held by {} (pid {}) since {}",
                info.holder, info.pid, info.started_at
            ),
        ));
    }

    let result = deploy_locked(plan, &output).await;

    if let Err(e) = lock.release() {
        diag.warn(Warning::new(
            WarningKind::LockRelease,
            format!("failed to release deploy lock: {}", e),
        ));
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            emit_warnings(&output, &diag, &[]);
            return Err(e);
        }
    };

    emit_warnings(&output, &diag, &report.warnings);
    output.report(&report);

    let run = &report.run;
    if run.outcome() == Outcome::Succeeded {
        output.success(&format!("Deployed {}", run.target()));
        Ok(())
    } else {
        Err(Error::Aborted {
            target: run.target(),
            current: run.current(),
        })
    }
}

/// Work done while holding the lock. An aborted run still yields its report;
/// the cause was printed when it happened.
async fn deploy_locked(plan: DeployPlan, output: &Output) -> Result<DeploymentReport> {
    let runtime: BollardRuntime = connect_to_runtime(&plan.config.runtime, output).await?;
    let stack = ComposeCli::new(runtime.runtime_type());

    let colors = resolve_colors(&runtime, &plan.config.app).await?;
    match colors.current {
        Some(current) => output.progress(&format!(
            "  → {} is serving; deploying {}",
            current, colors.target
        )),
        None => output.progress(&format!(
            "  → No color is serving (first deploy); deploying {}",
            colors.target
        )),
    }

    let deployment = Deployment::new(plan, colors);
    Ok(execute(&runtime, &stack, deployment, output)
        .await
        .unwrap_or_else(|(report, _)| report))
}

fn emit_warnings(output: &Output, diag: &Diagnostics, run_warnings: &[Warning]) {
    for warning in diag.warnings().iter().chain(run_warnings) {
        output.warning(&warning.message);
    }
}
