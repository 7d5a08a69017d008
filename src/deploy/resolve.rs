// ABOUTME: Active/target color resolution from what the runtime reports as running.
// ABOUTME: The running API container is the only record of which color serves traffic.

use serde::Serialize;

use super::error::DeployError;
use crate::config::AppConfig;
use crate::runtime::{ContainerFilters, ContainerOps};
use crate::types::Color;

/// The color serving now (if any) and the color about to be deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorPair {
    pub current: Option<Color>,
    pub target: Color,
}

impl ColorPair {
    pub fn is_first_deploy(&self) -> bool {
        self.current.is_none()
    }
}

/// Decide which color to deploy to.
///
/// Blue running wins; otherwise a running green makes blue the target;
/// otherwise this is a first deployment into blue. Read-only.
pub async fn resolve_colors<R: ContainerOps>(
    runtime: &R,
    app: &AppConfig,
) -> Result<ColorPair, DeployError> {
    for current in Color::ALL {
        if is_running(runtime, &app.api_container(current)).await? {
            return Ok(ColorPair {
                current: Some(current),
                target: current.other(),
            });
        }
    }

    Ok(ColorPair {
        current: None,
        target: Color::Blue,
    })
}

/// Whether a container with exactly this name is running.
pub(crate) async fn is_running<R: ContainerOps>(
    runtime: &R,
    name: &str,
) -> Result<bool, DeployError> {
    // The runtime's name filter matches substrings.
    let containers = runtime
        .list_containers(&ContainerFilters::running_named(name))
        .await
        .map_err(|e| DeployError::RuntimeQuery(format!("failed to list containers: {}", e)))?;

    Ok(containers
        .iter()
        .any(|c| c.name.trim_start_matches('/') == name && c.is_running()))
}
