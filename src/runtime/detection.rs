// ABOUTME: Runtime detection logic for the local host.
// ABOUTME: Honors explicit config, otherwise checks the Docker socket first, then Podman.

use super::types::{DetectedRuntime, RuntimeConfig, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("configured socket does not exist: {0}")]
    SocketMissing(String),
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Detect the container runtime to deploy with.
///
/// An explicit `runtime` in config wins (with its default socket unless
/// `socket` is also set). Otherwise detection order is:
/// 1. Docker socket (`/var/run/docker.sock`), honoring `DOCKER_HOST=unix://...`
/// 2. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 3. Rootful Podman socket (`/run/podman/podman.sock`)
pub fn detect_runtime(config: &RuntimeConfig) -> Result<DetectedRuntime, DetectionError> {
    if let Some(runtime_type) = config.runtime {
        let socket_path = config
            .socket
            .clone()
            .unwrap_or_else(|| default_socket_path(runtime_type));
        if !Path::new(&socket_path).exists() {
            return Err(DetectionError::SocketMissing(socket_path));
        }
        return Ok(DetectedRuntime {
            runtime_type,
            socket_path,
        });
    }

    if let Some(socket_path) = docker_host_socket().filter(|p| Path::new(p).exists()) {
        return Ok(DetectedRuntime {
            runtime_type: RuntimeType::Docker,
            socket_path,
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(DetectedRuntime {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(DetectedRuntime {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(DetectedRuntime {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

fn docker_host_socket() -> Option<String> {
    std::env::var("DOCKER_HOST")
        .ok()
        .and_then(|h| h.strip_prefix("unix://").map(str::to_string))
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        // Fall back to reading /proc/self/status
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(runtime: RuntimeType) -> String {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET.to_string(),
        RuntimeType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_runtime_with_missing_socket_is_an_error() {
        let config = RuntimeConfig {
            runtime: Some(RuntimeType::Podman),
            socket: Some("/nonexistent/podman.sock".to_string()),
        };
        let err = detect_runtime(&config).unwrap_err();
        assert!(matches!(err, DetectionError::SocketMissing(_)));
    }

    #[test]
    fn explicit_socket_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("docker.sock");
        std::fs::write(&socket, "").unwrap();

        let config = RuntimeConfig {
            runtime: Some(RuntimeType::Docker),
            socket: Some(socket.to_string_lossy().into_owned()),
        };
        let detected = detect_runtime(&config).unwrap();
        assert_eq!(detected.runtime_type, RuntimeType::Docker);
        assert_eq!(detected.socket_path, socket.to_string_lossy());
    }

    #[test]
    fn docker_host_unix_prefix_is_stripped() {
        temp_env::with_var("DOCKER_HOST", Some("unix:///tmp/custom.sock"), || {
            assert_eq!(docker_host_socket().as_deref(), Some("/tmp/custom.sock"));
        });
        temp_env::with_var("DOCKER_HOST", Some("tcp://10.0.0.1:2375"), || {
            assert_eq!(docker_host_socket(), None);
        });
    }
}
