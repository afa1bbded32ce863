//! Runtime configuration: optional YAML file plus environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "PRODEFF_CONFIG";
pub const BIND_ENV: &str = "PRODEFF_BIND";
pub const WORKERS_ENV: &str = "PRODEFF_WORKERS";
pub const DEFAULT_CONFIG_PATH: &str = "prodeff.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },
}

/// Efficiency thresholds for the above/near/below target bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Targets {
    pub above: f64,
    pub near: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            above: 1.0,
            near: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: String,
    /// Worker threads for batch parsing; 0 uses the rayon default.
    pub workers: usize,
    pub max_upload_bytes: usize,
    pub static_dir: PathBuf,
    pub log_filter: String,
    pub targets: Targets,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            workers: 0,
            max_upload_bytes: 16 * 1024 * 1024,
            static_dir: PathBuf::from("frontend/dist"),
            log_filter: "info".to_string(),
            targets: Targets::default(),
        }
    }
}

impl Config {
    /// Load from `PRODEFF_CONFIG` (or `prodeff.yaml`) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(|var| env::var(var).ok())?;
        Ok(config)
    }

    /// Missing file yields defaults; unreadable or malformed files are errors.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.bind_addr = bind.trim().to_string();
        }
        if let Some(raw) = lookup(WORKERS_ENV) {
            self.workers = raw.trim().parse().map_err(|_| ConfigError::Env {
                var: WORKERS_ENV,
                value: raw.clone(),
            })?;
        }
        Ok(())
    }
}
