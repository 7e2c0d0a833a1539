//! Logging setup for the `barrister` binaries.
//!
//! Library code only uses the `log` facade. Binaries call
//! [`LoggingSystem::init`] once with the configured level; `RUST_LOG`, when
//! set, takes precedence.

use log::LevelFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log level '{0}' (expected TRACE, DEBUG, INFO, WARN or ERROR)")]
    InvalidLevel(String),

    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

pub struct LoggingSystem;

impl LoggingSystem {
    /// Maps a level name (case-insensitive) to a filter.
    pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
        match level.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LevelFilter::Trace),
            "DEBUG" => Ok(LevelFilter::Debug),
            "INFO" => Ok(LevelFilter::Info),
            "WARN" | "WARNING" => Ok(LevelFilter::Warn),
            "ERROR" => Ok(LevelFilter::Error),
            "OFF" => Ok(LevelFilter::Off),
            _ => Err(LoggingError::InvalidLevel(level.to_string())),
        }
    }

    /// Installs `env_logger` as the global logger.
    pub fn init(level: &str) -> Result<(), LoggingError> {
        let filter = Self::parse_level(level)?;
        let mut builder = env_logger::Builder::new();
        builder.filter_level(filter);
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        builder.try_init()?;
        log::debug!("Logging initialized at {}", filter);
        Ok(())
    }

    /// Logger for tests; repeated calls are ignored.
    pub fn init_for_tests() {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }
}
