// ABOUTME: Configuration types and parsing for switchyard.yml.
// ABOUTME: Every section has defaults; discovery falls back to them when no file exists.

mod cleanup;
mod env_file;
mod env_value;
mod init;
mod maintenance;
mod proxy;
mod schedule;
mod stack;

pub use cleanup::CleanupConfig;
pub use env_file::{DOMAIN_KEY, EnvFile};
pub use env_value::{EnvValue, resolve_env_map};
pub use init::init_config;
pub use maintenance::MaintenanceConfig;
pub use proxy::{ProxySettings, ReloadStrategy};
pub use schedule::{HealthConfig, PullConfig};
pub use stack::{AppConfig, InfraConfig};

use crate::error::{Error, Result};
use crate::runtime::RuntimeConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "switchyard.yml";
pub const CONFIG_FILENAME_ALT: &str = "switchyard.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".switchyard/config.yml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Env file holding `DOMAIN`, also passed to compose.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    /// Directory for the deploy lock.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub infra: InfraConfig,

    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub proxy: ProxySettings,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub pull: PullConfig,

    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".switchyard")
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file is a valid config that takes every default.
        let config: Config = if yaml.trim().is_empty() {
            Config::defaults()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find a config file in `dir`, or use defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("using config {}", path.display());
                return Self::load(path);
            }
        }

        tracing::debug!("no config file in {}, using defaults", dir.display());
        Ok(Self::defaults())
    }

    /// Load from an explicit path, or discover in `dir`.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::discover(dir),
        }
    }

    /// Every section at its default.
    pub fn defaults() -> Self {
        Config {
            env_file: default_env_file(),
            state_dir: default_state_dir(),
            ..Default::default()
        }
    }

    /// Reject configurations that would fail midway through a deployment.
    pub fn validate(&self) -> Result<()> {
        if self.maintenance.migrate.is_empty() {
            return Err(Error::InvalidConfig(
                "maintenance.migrate must not be empty".to_string(),
            ));
        }
        if self.maintenance.reencrypt.is_empty() {
            return Err(Error::InvalidConfig(
                "maintenance.reencrypt must not be empty".to_string(),
            ));
        }
        if matches!(&self.maintenance.sync_version, Some(cmd) if cmd.is_empty()) {
            return Err(Error::InvalidConfig(
                "maintenance.sync_version must not be empty (omit it with null)".to_string(),
            ));
        }
        if matches!(&self.proxy.reload, ReloadStrategy::Signal(cmd) if cmd.is_empty()) {
            return Err(Error::InvalidConfig(
                "proxy.reload signal command must not be empty".to_string(),
            ));
        }
        if self.health.attempts == 0 || self.pull.attempts == 0 {
            return Err(Error::InvalidConfig(
                "health.attempts and pull.attempts must be at least 1".to_string(),
            ));
        }
        if self.infra.project == "blue" || self.infra.project == "green" {
            return Err(Error::InvalidConfig(format!(
                "infra.project '{}' collides with a deployment color",
                self.infra.project
            )));
        }
        if self.proxy.template == self.proxy.live_config {
            return Err(Error::InvalidConfig(
                "proxy.template and proxy.live_config must be different files".to_string(),
            ));
        }
        Ok(())
    }
}
