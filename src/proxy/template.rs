// ABOUTME: Proxy config rendering from a versioned template.
// ABOUTME: Literal placeholder substitution; leftover placeholders are rejected.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::types::Color;

pub const UPSTREAM_API: &str = "{{UPSTREAM_API}}";
pub const UPSTREAM_FRONTEND: &str = "{{UPSTREAM_FRONTEND}}";
pub const DOMAIN: &str = "{{DOMAIN}}";

/// Values for the three placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitutions {
    pub upstream_api: String,
    pub upstream_frontend: String,
    pub domain: String,
}

impl Substitutions {
    /// Upstreams pointing at `color`'s containers.
    pub fn for_color(app: &AppConfig, color: Color, domain: &str) -> Self {
        Self {
            upstream_api: app.upstream_api(color),
            upstream_frontend: app.upstream_frontend(color),
            domain: domain.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("proxy template not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read proxy template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rendered proxy config is empty")]
    EmptyOutput,

    #[error("rendered proxy config still contains {0}")]
    Unresolved(String),
}

/// Read the template. A missing template is a configuration error.
pub fn load_template(path: &Path) -> Result<String, TemplateError> {
    if !path.is_file() {
        return Err(TemplateError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Substitute the placeholders and validate the result.
pub fn render(template: &str, subs: &Substitutions) -> Result<String, TemplateError> {
    let rendered = template
        .replace(UPSTREAM_API, &subs.upstream_api)
        .replace(UPSTREAM_FRONTEND, &subs.upstream_frontend)
        .replace(DOMAIN, &subs.domain);

    if rendered.trim().is_empty() {
        return Err(TemplateError::EmptyOutput);
    }
    if let Some(token) = find_unresolved(&rendered) {
        return Err(TemplateError::Unresolved(token.to_string()));
    }
    Ok(rendered)
}

/// First `{{...}}` token in `text`.
fn find_unresolved(text: &str) -> Option<&str> {
    let start = text.find("{{")?;
    let len = text[start..].find("}}")?;
    Some(&text[start..start + len + 2])
}
