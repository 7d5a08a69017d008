// ABOUTME: Read-only snapshot of what is deployed: colors, containers, proxy marker.
// ABOUTME: Backs the status command; never changes runtime or proxy state.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::proxy::RenderMarker;
use crate::runtime::{ContainerOps, RuntimeInfo};
use crate::types::Color;

use super::cleanup::find_leftovers;
use super::error::DeployError;
use super::resolve::resolve_colors;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub runtime: Option<RuntimeLine>,
    pub serving: Option<Color>,
    pub next_target: Color,
    pub proxy: Option<RenderMarker>,
    pub containers: BTreeMap<Color, Vec<ContainerLine>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeLine {
    pub name: String,
    pub version: String,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerLine {
    pub name: String,
    pub state: String,
    pub status: String,
}

impl StatusReport {
    /// The marker names a color other than the one serving.
    pub fn proxy_mismatch(&self) -> Option<String> {
        let marker = self.proxy.as_ref()?;
        if self.serving == Some(marker.color) {
            return None;
        }
        let serving = self
            .serving
            .map(|c| c.to_string())
            .unwrap_or_else(|| "nothing".to_string());
        Some(format!(
            "proxy config points at {} but {} is serving",
            marker.color, serving
        ))
    }

    /// Human-readable lines, in display order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(rt) = &self.runtime {
            lines.push(format!("Runtime: {} {} ({})", rt.name, rt.version, rt.platform));
        }
        lines.push(match self.serving {
            Some(color) => format!("Serving: {}", color),
            None => "Serving: nothing (next deploy is a first deploy)".to_string(),
        });
        lines.push(format!("Next deploy: {}", self.next_target));
        lines.push(match &self.proxy {
            Some(marker) => format!(
                "Proxy config: {} (rendered {} from {})",
                marker.color,
                marker.rendered_at.format("%Y-%m-%d %H:%M:%S UTC"),
                marker.template.display()
            ),
            None => "Proxy config: no render marker".to_string(),
        });
        for (color, containers) in &self.containers {
            lines.push(format!("{}:", color));
            if containers.is_empty() {
                lines.push("  (none)".to_string());
            }
            for c in containers {
                lines.push(format!("  {} ({}) {}", c.name, c.state, c.status));
            }
        }
        lines
    }
}

/// Query the runtime and the proxy marker. Runtime info is optional; a
/// failed container query is not.
pub async fn collect_status<R: ContainerOps + RuntimeInfo>(
    runtime: &R,
    config: &Config,
) -> Result<StatusReport, DeployError> {
    let colors = resolve_colors(runtime, &config.app).await?;

    let runtime_line = match runtime.info().await {
        Ok(meta) => Some(RuntimeLine {
            name: meta.name,
            version: meta.version,
            platform: format!("{}/{}", meta.os, meta.arch),
        }),
        Err(e) => {
            tracing::debug!("runtime info unavailable: {}", e);
            None
        }
    };

    let mut containers = BTreeMap::new();
    for color in Color::ALL {
        let found = find_leftovers(runtime, &config.app.color_prefix(color))
            .await
            .map_err(|e| DeployError::RuntimeQuery(e.to_string()))?;
        let mut lines: Vec<ContainerLine> = found
            .into_iter()
            .map(|c| ContainerLine {
                name: c.name.trim_start_matches('/').to_string(),
                state: c.state,
                status: c.status,
            })
            .collect();
        lines.sort_by(|a, b| a.name.cmp(&b.name));
        containers.insert(color, lines);
    }

    Ok(StatusReport {
        runtime: runtime_line,
        serving: colors.current,
        next_target: colors.target,
        proxy: RenderMarker::read(&config.proxy.live_config),
        containers,
    })
}
