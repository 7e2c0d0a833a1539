//! Configuration for the `barrister` server and client.
//!
//! Settings are read from TOML:
//!
//! ```toml
//! bind_address = "127.0.0.1:8080"
//! idl_path = "service.idl"
//! log_level = "info"
//!
//! [validation]
//! int_policy = "lenient"
//! require_namespace = false
//!
//! [client]
//! timeout_secs = 30
//! ```

pub mod error;

pub use error::{ConfigError, ConfigResult};

use crate::idl::ValidatorOptions;
use crate::logging::LoggingSystem;
use crate::rpc::DispatcherOptions;
use crate::validation::IntPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file for `barrister serve`.
pub const CONFIG_ENV_VAR: &str = "BARRISTER_CONFIG";

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Value validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub int_policy: IntPolicy,
    pub require_namespace: bool,
}

/// Settings for [`crate::rpc::HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP host listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// IDL file served by `barrister serve`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idl_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            idl_path: None,
            log_level: default_log_level(),
            validation: ValidationConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads and validates a TOML config file.
    ///
    /// A relative `idl_path` is resolved against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let (Some(idl_path), Some(dir)) = (&config.idl_path, path.parent()) {
            if idl_path.is_relative() {
                config.idl_path = Some(dir.join(idl_path));
            }
        }
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::invalid("bind_address must not be empty"));
        }
        LoggingSystem::parse_level(&self.log_level)
            .map_err(|e| ConfigError::invalid(e.to_string()))?;
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::invalid("client.timeout_secs must be positive"));
        }
        Ok(())
    }

    /// The IDL path, or an error when none is configured.
    pub fn require_idl_path(&self) -> ConfigResult<&Path> {
        self.idl_path
            .as_deref()
            .ok_or(ConfigError::MissingIdlPath)
    }

    pub fn with_bind_address(mut self, address: &str) -> Self {
        self.bind_address = address.to_string();
        self
    }

    /// Replaces the port of `bind_address`, keeping the host.
    pub fn with_port(mut self, port: u16) -> Self {
        let host = self
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| self.bind_address.clone());
        self.bind_address = format!("{}:{}", host, port);
        self
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            require_namespace: self.validation.require_namespace,
        }
    }

    pub fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            validator: self.validator_options(),
            int_policy: self.validation.int_policy,
        }
    }
}
