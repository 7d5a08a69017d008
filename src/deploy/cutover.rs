// ABOUTME: Traffic switch helpers: install the rendered proxy config, reload, verify.
// ABOUTME: The previous live config is snapshotted so a failed reload can put it back.

use std::path::Path;

use crate::config::{ProxySettings, ReloadStrategy};
use crate::proxy::{ProxyConfig, read_existing, write_atomic};
use crate::runtime::{ContainerOps, ExecConfig, ExecOps};
use crate::types::ContainerId;

use super::error::DeployError;

/// Live config and marker as they were before the swap.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    live: Option<Vec<u8>>,
    marker: Option<Vec<u8>>,
}

impl Snapshot {
    /// Nothing was live before (first deployment).
    pub fn is_empty(&self) -> bool {
        self.live.is_none()
    }
}

/// Atomically replace the live config with `rendered` and write the marker.
///
/// If the marker cannot be written the live config is put back before the
/// error is returned.
pub fn install(proxy: &ProxyConfig, rendered: &str) -> Result<Snapshot, DeployError> {
    let write_error = |path: &Path, e: std::io::Error| {
        DeployError::ConfigWrite(format!("{}: {}", path.display(), e))
    };

    let marker_path = proxy.marker_path();
    let snapshot = Snapshot {
        live: read_existing(&proxy.rendered_path)
            .map_err(|e| write_error(&proxy.rendered_path, e))?,
        marker: read_existing(&marker_path).map_err(|e| write_error(&marker_path, e))?,
    };

    write_atomic(&proxy.rendered_path, rendered.as_bytes())
        .map_err(|e| write_error(&proxy.rendered_path, e))?;

    let marker = serde_json::to_vec_pretty(&proxy.marker())
        .map_err(|e| DeployError::ConfigWrite(format!("marker: {}", e)))
        .and_then(|bytes| {
            write_atomic(&marker_path, &bytes).map_err(|e| write_error(&marker_path, e))
        });

    if let Err(e) = marker {
        // The live file must not name the target without its marker.
        if let Err(restore) = restore_file(&proxy.rendered_path, snapshot.live.as_deref()) {
            tracing::error!(
                "could not put back {}: {}",
                proxy.rendered_path.display(),
                restore
            );
        }
        return Err(e);
    }

    Ok(snapshot)
}

/// Put the snapshot back. Files that did not exist before are removed.
pub fn restore(proxy: &ProxyConfig, snapshot: &Snapshot) -> std::io::Result<()> {
    restore_file(&proxy.rendered_path, snapshot.live.as_deref())?;
    restore_file(&proxy.marker_path(), snapshot.marker.as_deref())
}

fn restore_file(path: &Path, previous: Option<&[u8]>) -> std::io::Result<()> {
    match previous {
        Some(bytes) => write_atomic(path, bytes),
        None => match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        },
    }
}

/// How the proxy ended up picking up the new config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reloaded {
    Restarted,
    Signalled,
    /// The signal command failed and a restart succeeded.
    RestartedAfterSignal,
}

/// Make the proxy pick up the live config.
pub async fn reload<R: ContainerOps + ExecOps>(
    runtime: &R,
    settings: &ProxySettings,
) -> Result<Reloaded, String> {
    let proxy = ContainerId::new(settings.container.as_str());

    if let ReloadStrategy::Signal(cmd) = &settings.reload {
        match runtime.exec(&proxy, &ExecConfig::command(cmd.clone())).await {
            Ok(result) if result.success() => return Ok(Reloaded::Signalled),
            Ok(result) => tracing::warn!(
                "proxy reload command exited with {}, restarting instead: {}",
                result.exit_code,
                result.output_tail(5)
            ),
            Err(e) => tracing::warn!("proxy reload command failed, restarting instead: {}", e),
        }
        return restart(runtime, &proxy, settings)
            .await
            .map(|()| Reloaded::RestartedAfterSignal);
    }

    restart(runtime, &proxy, settings)
        .await
        .map(|()| Reloaded::Restarted)
}

async fn restart<R: ContainerOps>(
    runtime: &R,
    proxy: &ContainerId,
    settings: &ProxySettings,
) -> Result<(), String> {
    runtime
        .restart_container(proxy, settings.restart_timeout)
        .await
        .map_err(|e| format!("restart of {} failed: {}", proxy, e))
}

/// Read the config as the proxy sees it and check it points at `upstream`.
pub async fn verify_in_proxy<R: ExecOps>(
    runtime: &R,
    settings: &ProxySettings,
    upstream: &str,
) -> Result<(), String> {
    let proxy = ContainerId::new(settings.container.as_str());
    let cmd = vec!["cat".to_string(), settings.container_config_path.clone()];

    let result = runtime
        .exec(&proxy, &ExecConfig::command(cmd))
        .await
        .map_err(|e| format!("could not read config inside {}: {}", proxy, e))?;

    if !result.success() {
        return Err(format!(
            "reading {} inside {} exited with {}",
            settings.container_config_path, proxy, result.exit_code
        ));
    }
    if !result.stdout_lossy().contains(upstream) {
        return Err(format!("config inside {} does not reference {}", proxy, upstream));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::testing::FakeHost;
    use crate::types::Color;

    fn proxy_config(dir: &Path) -> ProxyConfig {
        let settings = ProxySettings {
            template: dir.join("nginx.conf.template"),
            live_config: dir.join("nginx.conf"),
            ..Default::default()
        };
        ProxyConfig::for_color(&settings, &AppConfig::default(), Color::Green, "example.com")
    }

    #[test]
    fn install_then_restore_returns_previous_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let proxy = proxy_config(dir.path());
        std::fs::write(&proxy.rendered_path, "server blue-api-1:8000;").unwrap();

        let snapshot = install(&proxy, "server green-api-1:8000;").unwrap();
        assert_eq!(
            std::fs::read_to_string(&proxy.rendered_path).unwrap(),
            "server green-api-1:8000;"
        );
        assert!(proxy.marker_path().exists());

        restore(&proxy, &snapshot).unwrap();
        assert_eq!(
            std::fs::read_to_string(&proxy.rendered_path).unwrap(),
            "server blue-api-1:8000;"
        );
        assert!(!proxy.marker_path().exists());
    }

    #[test]
    fn first_install_has_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let proxy = proxy_config(dir.path());

        let snapshot = install(&proxy, "server green-api-1:8000;").unwrap();
        assert!(snapshot.is_empty());

        restore(&proxy, &snapshot).unwrap();
        assert!(!proxy.rendered_path.exists());
    }

    #[test]
    fn failed_marker_write_leaves_live_config_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let proxy = proxy_config(dir.path());
        std::fs::write(&proxy.rendered_path, "server blue-api-1:8000;").unwrap();
        std::fs::create_dir(crate::proxy::sibling(&proxy.marker_path(), "tmp")).unwrap();

        let err = install(&proxy, "server green-api-1:8000;").unwrap_err();

        assert!(matches!(err, DeployError::ConfigWrite(_)));
        assert_eq!(
            std::fs::read_to_string(&proxy.rendered_path).unwrap(),
            "server blue-api-1:8000;"
        );
    }

    #[test]
    fn failed_marker_write_on_first_deploy_removes_live_config() {
        let dir = tempfile::tempdir().unwrap();
        let proxy = proxy_config(dir.path());
        std::fs::create_dir(crate::proxy::sibling(&proxy.marker_path(), "tmp")).unwrap();

        assert!(install(&proxy, "server green-api-1:8000;").is_err());
        assert!(!proxy.rendered_path.exists());
    }

    #[tokio::test]
    async fn signal_failure_falls_back_to_restart() {
        let host = FakeHost::new()
            .with_running_container("infra-proxy-1")
            .with_exit_code("nginx", 1);
        let settings = ProxySettings {
            reload: ReloadStrategy::Signal(vec![
                "nginx".to_string(),
                "-s".to_string(),
                "reload".to_string(),
            ]),
            ..Default::default()
        };

        let outcome = reload(&host, &settings).await.unwrap();

        assert_eq!(outcome, Reloaded::RestartedAfterSignal);
        assert_eq!(host.restarts(), vec!["infra-proxy-1".to_string()]);
    }

    #[tokio::test]
    async fn successful_signal_does_not_restart() {
        let host = FakeHost::new().with_running_container("infra-proxy-1");
        let settings = ProxySettings {
            reload: ReloadStrategy::Signal(vec!["nginx".to_string()]),
            ..Default::default()
        };

        assert_eq!(reload(&host, &settings).await.unwrap(), Reloaded::Signalled);
        assert!(host.restarts().is_empty());
    }

    #[tokio::test]
    async fn restart_failure_is_reported() {
        let host = FakeHost::new()
            .with_running_container("infra-proxy-1")
            .failing_restart();
        let err = reload(&host, &ProxySettings::default()).await.unwrap_err();
        assert!(err.contains("infra-proxy-1"));
    }

    #[tokio::test]
    async fn verify_reads_bind_mounted_config() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("nginx.conf");
        std::fs::write(&live, "upstream api { server green-api-1:8000; }").unwrap();
        let host = FakeHost::new()
            .with_running_container("infra-proxy-1")
            .with_proxy_mount(&live);
        let settings = ProxySettings::default();

        verify_in_proxy(&host, &settings, "green-api-1:8000").await.unwrap();
        let err = verify_in_proxy(&host, &settings, "blue-api-1:8000")
            .await
            .unwrap_err();
        assert!(err.contains("does not reference blue-api-1:8000"));
    }
}
