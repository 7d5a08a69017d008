// ABOUTME: Polling and retry schedules for health gating and image pulls.
// ABOUTME: Converts configured counts and durations into Backoff policies.

use serde::Deserialize;
use std::time::Duration;

use crate::retry::Backoff;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_health_attempts")]
    pub attempts: u32,

    /// Log lines of the target API surfaced when a deployment aborts.
    #[serde(default = "default_log_tail")]
    pub log_tail: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval: default_health_interval(),
            attempts: default_health_attempts(),
            log_tail: default_log_tail(),
        }
    }
}

impl HealthConfig {
    pub fn policy(&self) -> Backoff {
        Backoff::fixed(self.attempts, self.interval)
    }
}

fn default_health_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_health_attempts() -> u32 {
    40
}

fn default_log_tail() -> u64 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullConfig {
    #[serde(default = "default_pull_attempts")]
    pub attempts: u32,

    #[serde(default = "default_pull_backoff", with = "humantime_serde")]
    pub initial_backoff: Duration,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            attempts: default_pull_attempts(),
            initial_backoff: default_pull_backoff(),
        }
    }
}

impl PullConfig {
    pub fn policy(&self) -> Backoff {
        Backoff::exponential(self.attempts, self.initial_backoff)
    }
}

fn default_pull_attempts() -> u32 {
    3
}

fn default_pull_backoff() -> Duration {
    Duration::from_secs(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_deadline_is_about_two_minutes() {
        assert_eq!(
            HealthConfig::default().policy().total_wait(),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn pull_policy_matches_defaults() {
        let policy = PullConfig::default().policy();
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.delay_after(0), Duration::from_secs(5));
        assert_eq!(policy.delay_after(2), Duration::from_secs(20));
    }
}
