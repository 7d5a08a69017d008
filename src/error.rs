// ABOUTME: Application-wide error types for switchyard.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::proxy::TemplateError;
use crate::runtime::RuntimeError;
use crate::types::Color;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("env file not found: {0}")]
    EnvFileNotFound(PathBuf),

    #[error("failed to parse env file {path}: {message}")]
    EnvFile { path: PathBuf, message: String },

    #[error("DOMAIN is not set in {0}")]
    MissingDomain(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("deployment aborted: {0}")]
    Deploy(#[from] DeployError),

    /// The run failed and was torn down; the cause was already reported.
    #[error("deployment of {target} aborted; {}", serving(.current))]
    Aborted { target: Color, current: Option<Color> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn serving(current: &Option<Color>) -> String {
    match current {
        Some(color) => format!("{} is still serving", color),
        None => "nothing was serving".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
