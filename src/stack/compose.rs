// ABOUTME: StackOps backed by the `docker compose` / `podman compose` CLI.
// ABOUTME: Runs each invocation to completion and reports stderr on failure.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{BuildPolicy, StackError, StackOps, StackSpec};
use crate::runtime::RuntimeType;

/// Lines of compose output kept in error messages.
const OUTPUT_TAIL: usize = 20;

/// Drives compose through the runtime's CLI.
#[derive(Debug, Clone)]
pub struct ComposeCli {
    program: &'static str,
}

impl ComposeCli {
    pub fn new(runtime_type: RuntimeType) -> Self {
        Self {
            program: runtime_type.cli_program(),
        }
    }

    /// `compose -p <project> -f <file> [--env-file <path>]`.
    fn base_args(spec: &StackSpec) -> Vec<String> {
        let mut args = vec![
            "compose".to_string(),
            "-p".to_string(),
            spec.project.clone(),
            "-f".to_string(),
            spec.compose_file.display().to_string(),
        ];
        if let Some(env_file) = &spec.env_file {
            args.push("--env-file".to_string());
            args.push(env_file.display().to_string());
        }
        args
    }

    fn up_args(spec: &StackSpec, build: BuildPolicy) -> Vec<String> {
        let mut args = Self::base_args(spec);
        args.push("up".to_string());
        args.push("-d".to_string());
        match build {
            BuildPolicy::Default => {}
            BuildPolicy::Always => args.push("--build".to_string()),
            BuildPolicy::Never => args.push("--no-build".to_string()),
        }
        args.extend(spec.services.iter().map(|s| s.to_string()));
        args
    }

    fn pull_args(spec: &StackSpec) -> Vec<String> {
        let mut args = Self::base_args(spec);
        args.push("pull".to_string());
        args.extend(spec.services.iter().map(|s| s.to_string()));
        args
    }

    fn down_args(spec: &StackSpec) -> Vec<String> {
        let mut args = Self::base_args(spec);
        args.push("down".to_string());
        args.push("--remove-orphans".to_string());
        args
    }

    /// Dangling images only: tagged images stay for rollback.
    fn prune_args(retention: Duration) -> Vec<String> {
        vec![
            "image".to_string(),
            "prune".to_string(),
            "-f".to_string(),
            "--filter".to_string(),
            format!("until={}h", retention.as_secs() / 3600),
        ]
    }

    async fn run(&self, args: Vec<String>) -> Result<(), StackError> {
        let command = format!("{} {}", self.program, args.join(" "));
        tracing::debug!("running {}", command);

        let output = Command::new(self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| StackError::Spawn {
                program: self.program.to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout
            .lines()
            .chain(stderr.lines())
            .filter(|l| !l.trim().is_empty())
            .collect();
        let start = lines.len().saturating_sub(OUTPUT_TAIL);

        Err(StackError::Failed {
            command,
            status: output.status.to_string(),
            output: lines[start..].join("\n"),
        })
    }
}

#[async_trait]
impl StackOps for ComposeCli {
    async fn up(&self, spec: &StackSpec, build: BuildPolicy) -> Result<(), StackError> {
        self.run(Self::up_args(spec, build)).await
    }

    async fn pull(&self, spec: &StackSpec) -> Result<(), StackError> {
        self.run(Self::pull_args(spec)).await
    }

    async fn down(&self, spec: &StackSpec) -> Result<(), StackError> {
        self.run(Self::down_args(spec)).await
    }

    fn prune_images(&self, retention: Duration) -> Result<(), StackError> {
        let args = Self::prune_args(retention);
        tracing::debug!("spawning {} {}", self.program, args.join(" "));

        // Not awaited: the prune may outlive this process.
        Command::new(self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|source| StackError::Spawn {
                program: self.program.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceName;
    use std::path::PathBuf;

    fn spec() -> StackSpec {
        StackSpec {
            project: "blue".to_string(),
            compose_file: PathBuf::from("docker-compose.app.yml"),
            services: Vec::new(),
            env_file: Some(PathBuf::from(".env")),
        }
    }

    #[test]
    fn up_without_build_for_prebuilt_images() {
        let args = ComposeCli::up_args(&spec(), BuildPolicy::Never);
        assert_eq!(
            args,
            vec![
                "compose",
                "-p",
                "blue",
                "-f",
                "docker-compose.app.yml",
                "--env-file",
                ".env",
                "up",
                "-d",
                "--no-build"
            ]
        );
    }

    #[test]
    fn up_lists_selected_services_last() {
        let mut spec = spec();
        spec.services = vec![
            ServiceName::new("proxy").unwrap(),
            ServiceName::new("db").unwrap(),
        ];
        let args = ComposeCli::up_args(&spec, BuildPolicy::Default);
        assert_eq!(&args[args.len() - 4..], &["up", "-d", "proxy", "db"]);
    }

    #[test]
    fn build_flag_requests_rebuild() {
        let args = ComposeCli::up_args(&spec(), BuildPolicy::Always);
        assert_eq!(args.last().map(String::as_str), Some("--build"));
    }

    #[test]
    fn down_removes_orphans() {
        let args = ComposeCli::down_args(&spec());
        assert_eq!(&args[args.len() - 2..], &["down", "--remove-orphans"]);
    }

    #[test]
    fn prune_filters_by_retention_in_hours() {
        let args = ComposeCli::prune_args(Duration::from_secs(168 * 3600));
        assert_eq!(args, vec!["image", "prune", "-f", "--filter", "until=168h"]);
    }

    #[test]
    fn missing_env_file_is_omitted() {
        let mut spec = spec();
        spec.env_file = None;
        assert!(!ComposeCli::base_args(&spec).contains(&"--env-file".to_string()));
    }
}
