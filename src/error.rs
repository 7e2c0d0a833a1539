use crate::config::ConfigError;
use crate::idl::{ImportError, SyntaxError, ValidationErrors};
use crate::logging::LoggingError;
use crate::rpc::RpcError;
use crate::validation::TypeError;
use std::fmt;
use std::io;

/// Unified error type for the crate.
///
/// Each component keeps its own precise error type; this enum collects them
/// so binaries and callers that mix components can propagate with `?`.
#[derive(Debug)]
pub enum BarristerError {
    /// Malformed IDL text
    Syntax(SyntaxError),

    /// Semantic errors in an otherwise well-formed IDL
    Validation(ValidationErrors),

    /// A value that does not match its declared type
    Type(TypeError),

    /// An error response, local or from a remote server
    Rpc(RpcError),

    /// Resolving `import` statements failed
    Import(ImportError),

    /// A handler was registered for an interface the IDL does not declare
    UnknownInterface(String),

    /// Errors related to configuration
    Config(ConfigError),

    /// Errors initialising logging
    Logging(LoggingError),

    /// Errors talking to a remote endpoint
    Transport(String),

    /// Errors related to IO operations
    Io(io::Error),

    /// Errors related to serialization/deserialization
    Serialization(String),
}

impl fmt::Display for BarristerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "Syntax error at {}", err),
            Self::Validation(errs) => write!(f, "Validation failed: {}", errs),
            Self::Type(err) => write!(f, "Type error: {}", err),
            Self::Rpc(err) => write!(f, "{}", err),
            Self::Import(err) => write!(f, "Import error: {}", err),
            Self::UnknownInterface(name) => {
                write!(f, "Interface '{}' is not declared in the IDL", name)
            }
            Self::Config(err) => write!(f, "Configuration error: {}", err),
            Self::Logging(err) => write!(f, "Logging error: {}", err),
            Self::Transport(msg) => write!(f, "Transport error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for BarristerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Validation(errs) => Some(errs),
            Self::Type(err) => Some(err),
            Self::Rpc(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UnknownInterface(_) | Self::Transport(_) | Self::Serialization(_) => None,
        }
    }
}

impl From<SyntaxError> for BarristerError {
    fn from(error: SyntaxError) -> Self {
        BarristerError::Syntax(error)
    }
}

impl From<ValidationErrors> for BarristerError {
    fn from(errors: ValidationErrors) -> Self {
        BarristerError::Validation(errors)
    }
}

impl From<TypeError> for BarristerError {
    fn from(error: TypeError) -> Self {
        BarristerError::Type(error)
    }
}

impl From<RpcError> for BarristerError {
    fn from(error: RpcError) -> Self {
        BarristerError::Rpc(error)
    }
}

impl From<ImportError> for BarristerError {
    fn from(error: ImportError) -> Self {
        BarristerError::Import(error)
    }
}

impl From<ConfigError> for BarristerError {
    fn from(error: ConfigError) -> Self {
        BarristerError::Config(error)
    }
}

impl From<LoggingError> for BarristerError {
    fn from(error: LoggingError) -> Self {
        BarristerError::Logging(error)
    }
}

impl From<io::Error> for BarristerError {
    fn from(error: io::Error) -> Self {
        BarristerError::Io(error)
    }
}

impl From<serde_json::Error> for BarristerError {
    fn from(error: serde_json::Error) -> Self {
        BarristerError::Serialization(error.to_string())
    }
}

impl From<reqwest::Error> for BarristerError {
    fn from(error: reqwest::Error) -> Self {
        BarristerError::Transport(error.to_string())
    }
}

/// Result type alias for operations that can result in a BarristerError
pub type BarristerResult<T> = Result<T, BarristerError>;
