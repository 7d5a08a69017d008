// ABOUTME: Reverse proxy config artifacts: rendering, atomic installation and verification.
// ABOUTME: ProxyConfig ties a color's upstreams to the template and the live file.

mod atomic;
mod probe;
mod template;

pub use atomic::{read_existing, sibling, write_atomic};
pub use probe::{ProbeError, probe_version};
pub use template::{Substitutions, TemplateError, load_template, render};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, ProxySettings};
use crate::types::Color;

/// The proxy config for one color, before or after it is written.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub color: Color,
    pub template_path: PathBuf,
    pub rendered_path: PathBuf,
    pub upstream_api: String,
    pub upstream_frontend: String,
    pub domain: String,
}

impl ProxyConfig {
    pub fn for_color(
        settings: &ProxySettings,
        app: &AppConfig,
        color: Color,
        domain: &str,
    ) -> Self {
        Self {
            color,
            template_path: settings.template.clone(),
            rendered_path: settings.live_config.clone(),
            upstream_api: app.upstream_api(color),
            upstream_frontend: app.upstream_frontend(color),
            domain: domain.to_string(),
        }
    }

    pub fn substitutions(&self) -> Substitutions {
        Substitutions {
            upstream_api: self.upstream_api.clone(),
            upstream_frontend: self.upstream_frontend.clone(),
            domain: self.domain.clone(),
        }
    }

    /// Load the template and render it for this color.
    pub fn render(&self) -> Result<String, TemplateError> {
        let template = load_template(&self.template_path)?;
        render(&template, &self.substitutions())
    }

    /// Marker file recording which color the live config was rendered for.
    pub fn marker_path(&self) -> PathBuf {
        sibling(&self.rendered_path, "rendered")
    }

    pub fn marker(&self) -> RenderMarker {
        RenderMarker {
            color: self.color,
            template: self.template_path.clone(),
            rendered_at: Utc::now(),
        }
    }
}

/// Contents of the marker file written next to the live config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderMarker {
    pub color: Color,
    pub template: PathBuf,
    pub rendered_at: DateTime<Utc>,
}

impl RenderMarker {
    /// Read the marker next to `live_config`, if there is a readable one.
    pub fn read(live_config: &Path) -> Option<Self> {
        let bytes = std::fs::read(sibling(live_config, "rendered")).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}
