//! Log level enumeration.

use crate::errors::{Result, RunlogError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log level for loggers and handlers.
///
/// Ordering runs from most severe to least severe, so a handler with a
/// threshold of [`LogLevel::Error`] passes only error records while a
/// threshold of [`LogLevel::Trace`] passes everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Detailed trace messages
    Trace,
}

impl LogLevel {
    /// Whether a record at this level passes a handler or logger threshold.
    pub fn passes(self, threshold: LogLevel) -> bool {
        self <= threshold
    }
}

impl FromStr for LogLevel {
    type Err = RunlogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "ERROR" | "CRITICAL" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            _ => Err(RunlogError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Trace => write!(f, "TRACE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_threshold_ordering() {
        assert!(LogLevel::Error.passes(LogLevel::Info));
        assert!(LogLevel::Info.passes(LogLevel::Info));
        assert!(!LogLevel::Debug.passes(LogLevel::Info));
        assert!(!LogLevel::Info.passes(LogLevel::Error));
    }

    proptest::proptest! {
        #[test]
        fn prop_parsing_is_case_insensitive(s in "[a-zA-Z]{0,10}") {
            proptest::prop_assert_eq!(
                s.parse::<LogLevel>().ok(),
                s.to_uppercase().parse::<LogLevel>().ok()
            );
        }
    }
}
