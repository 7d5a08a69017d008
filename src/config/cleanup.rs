// ABOUTME: Decommissioning settings for the color that lost traffic.
// ABOUTME: Stop timeout for leftovers and the retention window for image pruning.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    /// Prune dangling images after a successful deployment.
    #[serde(default = "default_prune")]
    pub prune: bool,

    /// Only dangling images older than this are pruned.
    #[serde(default = "default_prune_retention", with = "humantime_serde")]
    pub prune_retention: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        CleanupConfig {
            stop_timeout: default_stop_timeout(),
            prune: default_prune(),
            prune_retention: default_prune_retention(),
        }
    }
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_prune() -> bool {
    true
}

fn default_prune_retention() -> Duration {
    Duration::from_secs(168 * 60 * 60)
}
