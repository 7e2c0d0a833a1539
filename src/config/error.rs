//! Errors raised while loading a server config.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render config as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    /// A setting parsed but holds an unusable value.
    #[error("invalid setting: {0}")]
    Invalid(String),

    /// `serve` needs an IDL and none was configured.
    #[error("idl_path is not set; add it to the config file")]
    MissingIdlPath,
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
