//! Error types for runlog operations.

use thiserror::Error;

/// The main error type for runlog operations.
///
/// Only [`RunlogError::ConfigNotFound`], [`RunlogError::ConflictingConfig`]
/// and [`RunlogError::Validation`] abort configuration; directory-creation
/// failures and redirection recursion are reported on the process's real
/// stderr stream and never surface as errors. Backend rejections of an
/// already-resolved configuration propagate unchanged as
/// [`RunlogError::Backend`].
#[derive(Error, Debug)]
pub enum RunlogError {
    /// An explicit configuration file path does not exist
    #[error("Could not find the logging config file `{0}`")]
    ConfigNotFound(String),

    /// Shorthand options and an explicit config were supplied together
    #[error("Conflicting logging configuration: {0}")]
    ConflictingConfig(String),

    /// Malformed or inconsistent configuration input
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The logging backend rejected the resolved configuration
    #[error("Backend configuration error: {0}")]
    Backend(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for runlog operations.
pub type Result<T> = std::result::Result<T, RunlogError>;

/// Helper macro to bail out with a RunlogError
///
/// # Example
///
/// ```ignore
/// if names.len() != levels.len() {
///     bail!(Validation, "expected {} levels, got {}", names.len(), levels.len());
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::RunlogError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::RunlogError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::RunlogError::Config($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::RunlogError::Config(format!($fmt, $($arg)*)))
    };
}
