// ABOUTME: Commands run inside the new color's API container after it turns healthy.
// ABOUTME: Migration and re-encryption are fatal on failure; version sync is advisory.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::EnvValue;

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_migrate")]
    pub migrate: Vec<String>,

    #[serde(default = "default_reencrypt")]
    pub reencrypt: Vec<String>,

    /// Appended to `reencrypt` when re-encryption is forced.
    #[serde(default = "default_force_flag")]
    pub force_flag: String,

    /// `None` disables the step.
    #[serde(default = "default_sync_version")]
    pub sync_version: Option<Vec<String>>,

    /// Extra environment for every maintenance command.
    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    /// How long the previous worker gets to finish its current task.
    #[serde(default = "default_worker_stop_timeout", with = "humantime_serde")]
    pub worker_stop_timeout: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            migrate: default_migrate(),
            reencrypt: default_reencrypt(),
            force_flag: default_force_flag(),
            sync_version: default_sync_version(),
            env: HashMap::new(),
            worker_stop_timeout: default_worker_stop_timeout(),
        }
    }
}

impl MaintenanceConfig {
    /// The re-encryption command, with the force flag when requested.
    pub fn reencrypt_command(&self, force: bool) -> Vec<String> {
        let mut cmd = self.reencrypt.clone();
        if force {
            cmd.push(self.force_flag.clone());
        }
        cmd
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn default_migrate() -> Vec<String> {
    strings(&["/app/bin/migrate"])
}

fn default_reencrypt() -> Vec<String> {
    strings(&["/app/bin/reencrypt"])
}

fn default_force_flag() -> String {
    "--force".to_string()
}

fn default_sync_version() -> Option<Vec<String>> {
    Some(strings(&["/app/bin/sync-version"]))
}

fn default_worker_stop_timeout() -> Duration {
    Duration::from_secs(30)
}
