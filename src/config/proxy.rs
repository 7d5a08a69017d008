// ABOUTME: Reverse proxy settings: template, live config paths, reload and verification.
// ABOUTME: The template is the source of truth; the live file is always regenerated from it.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ProxySettings {
    /// Name of the proxy container in the infrastructure tier.
    #[serde(default = "default_container")]
    pub container: String,

    /// Versioned template with `{{UPSTREAM_API}}`, `{{UPSTREAM_FRONTEND}}`
    /// and `{{DOMAIN}}` placeholders.
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Rendered config on the host, bind-mounted into the proxy.
    #[serde(default = "default_live_config")]
    pub live_config: PathBuf,

    /// Where the proxy sees the rendered config inside its own filesystem.
    #[serde(default = "default_container_config_path")]
    pub container_config_path: String,

    #[serde(default)]
    pub reload: ReloadStrategy,

    #[serde(default = "default_restart_timeout", with = "humantime_serde")]
    pub restart_timeout: Duration,

    /// Delay between reload and verification.
    #[serde(default = "default_settle", with = "humantime_serde")]
    pub settle: Duration,

    /// URL requested through the proxy after cutover. `null` skips the
    /// request.
    #[serde(default = "default_verify_url")]
    pub verify_url: Option<String>,

    #[serde(default = "default_verify_timeout", with = "humantime_serde")]
    pub verify_timeout: Duration,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            container: default_container(),
            template: default_template(),
            live_config: default_live_config(),
            container_config_path: default_container_config_path(),
            reload: ReloadStrategy::default(),
            restart_timeout: default_restart_timeout(),
            settle: default_settle(),
            verify_url: default_verify_url(),
            verify_timeout: default_verify_timeout(),
        }
    }
}

/// How the proxy picks up a new config.
///
/// Some proxies miss bind-mounted file changes on a soft reload, so a full
/// restart is the default. `signal` runs a command inside the proxy and
/// falls back to a restart when the command fails.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReloadStrategy {
    #[default]
    Restart,
    Signal(Vec<String>),
}

fn default_container() -> String {
    "infra-proxy-1".to_string()
}

fn default_template() -> PathBuf {
    PathBuf::from("proxy/nginx.conf.template")
}

fn default_live_config() -> PathBuf {
    PathBuf::from("proxy/nginx.conf")
}

fn default_container_config_path() -> String {
    "/etc/nginx/conf.d/default.conf".to_string()
}

fn default_restart_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_settle() -> Duration {
    Duration::from_secs(3)
}

fn default_verify_url() -> Option<String> {
    Some("http://127.0.0.1/api/".to_string())
}

fn default_verify_timeout() -> Duration {
    Duration::from_secs(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_reload_parses_from_yaml() {
        let settings: ProxySettings =
            serde_yaml::from_str("reload:\n  signal: [nginx, -s, reload]\nverify_url: null\n")
                .unwrap();
        assert_eq!(
            settings.reload,
            ReloadStrategy::Signal(vec![
                "nginx".to_string(),
                "-s".to_string(),
                "reload".to_string()
            ])
        );
        assert!(settings.verify_url.is_none());
        assert_eq!(settings.settle, Duration::from_secs(3));
    }

    #[test]
    fn restart_is_the_default_reload() {
        let settings: ProxySettings = serde_yaml::from_str("reload: restart\n").unwrap();
        assert_eq!(settings.reload, ReloadStrategy::Restart);
    }
}
