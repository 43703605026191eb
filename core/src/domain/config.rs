// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Client Configuration
//!
//! YAML configuration of the connection to an ABAP system and of the
//! activation behaviour.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements config discovery, environment overrides and validation
//!
//! # Example
//!
//! ```yaml
//! connection:
//!   ashost: vhcalnplci
//!   client: "001"
//!   port: 50001
//!   ssl: true
//!   verify: false
//!   user: DEVELOPER
//! activation:
//!   deleted_objects: skip
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::activation::DeletedObjectPolicy;

pub const CONFIG_PATH_ENV: &str = "SAPCLI_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SapConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub activation: ActivationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_ashost")]
    pub ashost: String,

    #[serde(default = "default_client")]
    pub client: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Use HTTPS
    #[serde(default = "default_true")]
    pub ssl: bool,

    /// Verify the server certificate
    #[serde(default = "default_true")]
    pub verify: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationConfig {
    #[serde(default)]
    pub deleted_objects: DeletedObjectPolicy,
}

fn default_ashost() -> String {
    "localhost".to_string()
}

fn default_client() -> String {
    "001".to_string()
}

fn default_port() -> u16 {
    443
}

fn default_true() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            ashost: default_ashost(),
            client: default_client(),
            port: default_port(),
            ssl: true,
            verify: true,
            user: None,
            password: None,
        }
    }
}

impl SapConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Discover configuration file using precedence order
    /// 1. SAPCLI_CONFIG_PATH environment variable
    /// 2. ./sapcli.yaml (working directory)
    /// 3. ~/.sapcli/config.yaml (user home)
    /// 4. /etc/sapcli/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./sapcli.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".sapcli").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/sapcli/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply SAP_* environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let connection = &mut self.connection;

        if let Some(val) = lookup("SAP_ASHOST") {
            connection.ashost = val;
        }

        if let Some(val) = lookup("SAP_CLIENT") {
            connection.client = val;
        }

        if let Some(val) = lookup("SAP_PORT") {
            match val.parse() {
                Ok(port) => connection.port = port,
                Err(_) => tracing::warn!("Invalid value for SAP_PORT: '{}'. Ignoring.", val),
            }
        }

        if let Some(val) = lookup("SAP_SSL") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => connection.ssl = true,
                "false" | "0" | "no" | "off" => connection.ssl = false,
                _ => tracing::warn!(
                    "Invalid value for SAP_SSL: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("SAP_USER") {
            connection.user = Some(val);
        }

        if let Some(val) = lookup("SAP_PASSWORD") {
            connection.password = Some(val);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let connection = &self.connection;

        if connection.ashost.trim().is_empty() {
            return Err(ConfigError::Invalid("connection.ashost cannot be empty".to_string()));
        }

        if connection.client.len() != 3 || !connection.client.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid(format!(
                "connection.client must be three digits, got '{}'",
                connection.client
            )));
        }

        if connection.port == 0 {
            return Err(ConfigError::Invalid("connection.port cannot be 0".to_string()));
        }

        Ok(())
    }
}
