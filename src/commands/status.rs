// ABOUTME: Status command implementation.
// ABOUTME: Connects to the runtime and prints the deployment snapshot, or emits it as JSON.

use super::runtime_connection::connect_to_runtime;
use switchyard::config::Config;
use switchyard::deploy::collect_status;
use switchyard::error::Result;
use switchyard::output::{Output, OutputMode};

/// Show what is deployed. Read-only.
pub async fn status(config: Config, output: Output) -> Result<()> {
    let runtime = connect_to_runtime(&config.runtime, &output).await?;
    let report = collect_status(&runtime, &config).await?;

    if output.mode() == OutputMode::Json {
        output.report(&report);
        return Ok(());
    }

    for line in report.lines() {
        println!("{line}");
    }
    if let Some(mismatch) = report.proxy_mismatch() {
        output.warning(&mismatch);
    }
    Ok(())
}
