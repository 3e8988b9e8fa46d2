//! Configuration management for credmount
//!
//! Settings are layered, later sources winning:
//! 1. Default values
//! 2. Configuration file (TOML format)
//! 3. `CREDMOUNT_*` environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::LoggingConfig;

/// Main configuration struct for credmount
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub kubernetes: KubernetesConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

/// Control-plane settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    /// Namespace holding the credential Secrets and their workloads
    pub namespace: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load configuration from the first config file found plus environment
    /// overrides. A file that exists but cannot be parsed is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("CREDMOUNT_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("/etc/credmount/config.toml")),
            Some(PathBuf::from("./config.toml")),
            Some(PathBuf::from("./credmount.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply overrides read through `lookup`, normally the process environment
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("CREDMOUNT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CREDMOUNT_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Parse(format!("CREDMOUNT_PORT is not a port: {}", port)))?;
        }

        // Kubernetes
        if let Some(namespace) = lookup("CREDMOUNT_NAMESPACE") {
            self.kubernetes.namespace = namespace;
        }

        // Logging
        if let Some(level) = lookup("CREDMOUNT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("CREDMOUNT_LOG_DIR") {
            self.logging.log_dir = dir;
        }
        if let Some(enabled) = lookup("CREDMOUNT_FILE_LOGGING") {
            self.logging.file_logging_enabled = enabled.parse().unwrap_or(false);
        }
        if let Some(json) = lookup("CREDMOUNT_LOG_JSON") {
            self.logging.json_format = json.parse().unwrap_or(false);
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("Port cannot be 0".to_string()));
        }

        if self.kubernetes.namespace.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Kubernetes namespace cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Failed to read configuration file
    FileRead(PathBuf, String),
    /// Failed to parse configuration
    Parse(String),
    /// Configuration validation failed
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, err) => {
                write!(f, "Failed to read config file {:?}: {}", path, err)
            }
            ConfigError::Parse(err) => write!(f, "Failed to parse config: {}", err),
            ConfigError::Validation(err) => write!(f, "Config validation failed: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}
