// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a starter switchyard.yml and a proxy template when absent.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

const TEMPLATE_SKELETON: &str = r#"upstream api {
    server {{UPSTREAM_API}};
}

upstream frontend {
    server {{UPSTREAM_FRONTEND}};
}

server {
    listen 80;
    server_name {{DOMAIN}};

    location /api/ {
        proxy_pass http://api/;
        proxy_set_header Host $host;
    }

    location / {
        proxy_pass http://frontend;
        proxy_set_header Host $host;
    }
}
"#;

/// Write `switchyard.yml` into `dir`, plus the proxy template it points at if
/// that file does not exist yet.
pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let config = Config::defaults();
    std::fs::write(&config_path, generate_template_yaml(&config))?;

    let template_path = dir.join(&config.proxy.template);
    if !template_path.exists() {
        if let Some(parent) = template_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&template_path, TEMPLATE_SKELETON)?;
    }

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"env_file: {env_file}

infra:
  compose_file: {infra_file}
  services: [proxy, db, redis]

app:
  compose_file: {app_file}
  api_service: {api}
  api_port: {api_port}
  frontend_service: {frontend}
  frontend_port: {frontend_port}
  worker_service: worker

proxy:
  container: {proxy}
  template: {template}
  live_config: {live}
  reload: restart

maintenance:
  migrate: [{migrate}]
  reencrypt: [{reencrypt}]
"#,
        env_file = config.env_file.display(),
        infra_file = config.infra.compose_file.display(),
        app_file = config.app.compose_file.display(),
        api = config.app.api_service,
        api_port = config.app.api_port,
        frontend = config.app.frontend_service,
        frontend_port = config.app.frontend_port,
        proxy = config.proxy.container,
        template = config.proxy.template.display(),
        live = config.proxy.live_config.display(),
        migrate = config.maintenance.migrate.join(", "),
        reencrypt = config.maintenance.reencrypt.join(", "),
    )
}
