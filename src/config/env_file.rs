// ABOUTME: Deployment env file loading (KEY=VALUE lines, dotenv syntax).
// ABOUTME: Supplies the required public domain and is handed to compose as --env-file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Key holding the public domain in the env file.
pub const DOMAIN_KEY: &str = "DOMAIN";

/// Parsed env file.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    vars: HashMap<String, String>,
}

impl EnvFile {
    /// Load and parse the env file. A missing file is a pre-flight failure.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::EnvFileNotFound(path.to_path_buf()));
        }

        // The non-iterator loaders write into the process environment,
        // which compose would then inherit.
        #[allow(deprecated)]
        let iter = dotenv::from_path_iter(path).map_err(|e| Error::EnvFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| Error::EnvFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            vars.insert(key, value);
        }

        tracing::debug!("loaded {} variables from {}", vars.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            vars,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// The public domain. Required: an empty or missing value is fatal.
    pub fn domain(&self) -> Result<&str> {
        self.get(DOMAIN_KEY)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::MissingDomain(self.path.clone()))
    }
}
