// ABOUTME: Compose stack configuration for the shared infrastructure and app tiers.
// ABOUTME: Derives well-known container names and upstream addresses per color.

use serde::Deserialize;
use std::path::PathBuf;

use crate::types::{Color, ServiceName};

/// Shared infrastructure tier (proxy and data services), run once for both
/// colors.
#[derive(Debug, Clone, Deserialize)]
pub struct InfraConfig {
    #[serde(default = "default_infra_compose_file")]
    pub compose_file: PathBuf,

    #[serde(default = "default_infra_project")]
    pub project: String,

    #[serde(default = "default_infra_services")]
    pub services: Vec<ServiceName>,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            compose_file: default_infra_compose_file(),
            project: default_infra_project(),
            services: default_infra_services(),
        }
    }
}

fn default_infra_compose_file() -> PathBuf {
    PathBuf::from("docker-compose.yml")
}

fn default_infra_project() -> String {
    "infra".to_string()
}

fn default_infra_services() -> Vec<ServiceName> {
    ["proxy", "db", "redis"]
        .iter()
        .filter_map(|s| ServiceName::new(s).ok())
        .collect()
}

/// Application tier, launched once per color under the color's project name.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_compose_file")]
    pub compose_file: PathBuf,

    #[serde(default = "default_api_service")]
    pub api_service: ServiceName,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_frontend_service")]
    pub frontend_service: ServiceName,

    #[serde(default = "default_frontend_port")]
    pub frontend_port: u16,

    /// Background worker consuming the shared queue. `None` when the app has
    /// no worker.
    #[serde(default = "default_worker_service")]
    pub worker_service: Option<ServiceName>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            compose_file: default_app_compose_file(),
            api_service: default_api_service(),
            api_port: default_api_port(),
            frontend_service: default_frontend_service(),
            frontend_port: default_frontend_port(),
            worker_service: default_worker_service(),
        }
    }
}

impl AppConfig {
    /// Compose's container name for the first replica of `service` in
    /// `color`'s project.
    pub fn container_name(&self, color: Color, service: &ServiceName) -> String {
        format!("{}-{}-1", color.project(), service)
    }

    pub fn api_container(&self, color: Color) -> String {
        self.container_name(color, &self.api_service)
    }

    pub fn worker_container(&self, color: Color) -> Option<String> {
        self.worker_service
            .as_ref()
            .map(|w| self.container_name(color, w))
    }

    /// Proxy upstream for the API of `color`.
    pub fn upstream_api(&self, color: Color) -> String {
        format!("{}:{}", self.api_container(color), self.api_port)
    }

    /// Proxy upstream for the frontend of `color`.
    pub fn upstream_frontend(&self, color: Color) -> String {
        format!(
            "{}:{}",
            self.container_name(color, &self.frontend_service),
            self.frontend_port
        )
    }

    /// Name prefix shared by every container of `color`'s project.
    pub fn color_prefix(&self, color: Color) -> String {
        format!("{}-", color.project())
    }
}

fn default_app_compose_file() -> PathBuf {
    PathBuf::from("docker-compose.app.yml")
}

fn default_service(name: &str) -> ServiceName {
    ServiceName::new(name).unwrap_or_else(|e| unreachable!("built-in service name {name}: {e}"))
}

fn default_api_service() -> ServiceName {
    default_service("api")
}

fn default_api_port() -> u16 {
    8000
}

fn default_frontend_service() -> ServiceName {
    default_service("frontend")
}

fn default_frontend_port() -> u16 {
    3000
}

fn default_worker_service() -> Option<ServiceName> {
    Some(default_service("worker"))
}
