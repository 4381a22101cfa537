//! Configuration input shapes and serializable snapshots.

use crate::level::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Sentinel file path selecting the bundled default configuration.
pub const DEFAULT_CONFIG: &str = "DEFAULT";

/// Prefix marking worker-process (multi-process) configuration entries.
pub const MULTIPROC_PREFIX: &str = "multiproc_";

/// Logging configuration as supplied by the caller.
///
/// Exactly one variant is given; the shape is decided once at this boundary
/// so the rest of the pipeline never inspects types at run time.
#[derive(Debug, Clone)]
pub enum LogConfigInput {
    /// Path to an ini-style configuration file, or [`DEFAULT_CONFIG`]
    FilePath(PathBuf),
    /// A structured configuration tree
    Tree(Value),
    /// Simplified shorthand options
    Shorthand(ShorthandOptions),
}

/// Simplified logging configuration: a folder, logger names, and levels.
///
/// When `log_levels` holds exactly one entry it is broadcast to every name;
/// otherwise the two lists must align positionally and a mismatch is
/// rejected during `check_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShorthandOptions {
    /// Folder all file handlers write beneath
    #[serde(default = "default_log_folder")]
    pub log_folder: String,
    /// Logger names to configure; an empty name addresses the root logger
    #[serde(default)]
    pub logger_names: Vec<String>,
    /// Levels aligned with `logger_names`, or a single broadcast level
    #[serde(default = "default_log_levels")]
    pub log_levels: Vec<LogLevel>,
}

fn default_log_folder() -> String {
    "logs".to_string()
}

fn default_log_levels() -> Vec<LogLevel> {
    vec![LogLevel::Info]
}

impl Default for ShorthandOptions {
    fn default() -> Self {
        Self {
            log_folder: default_log_folder(),
            logger_names: vec![String::new()],
            log_levels: default_log_levels(),
        }
    }
}

/// A normalized, backend-ready configuration snapshot.
///
/// Snapshots are plain value types: a live ini parser is always materialized
/// to its text output before becoming a snapshot, so snapshots transfer
/// safely to worker processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConfigSnapshot {
    /// A structured configuration tree for the dictionary-style entrypoint
    Tree(Value),
    /// Ini text for the file-style entrypoint
    IniText(String),
}

/// Progress-reporting shorthand as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressInput {
    /// `true` selects all defaults, `false` disables reporting
    Enabled(bool),
    /// Report every N percent with default logger and level
    Interval(u64),
    /// Report through this logger with default interval and level
    Logger(String),
    /// Interval and logger with default level
    Pair(u64, String),
    /// Fully explicit triple
    Full(u64, String, LogLevel),
}

/// Canonical progress-reporting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSpec {
    /// Reporting interval in percent of completed runs
    pub interval: u64,
    /// Logger the report is emitted through
    pub logger: String,
    /// Severity of the report records
    pub level: LogLevel,
}

impl ProgressSpec {
    /// Normalize a caller-supplied shorthand into the canonical triple.
    ///
    /// Returns `None` for `Enabled(false)`.
    pub fn normalize(input: &ProgressInput) -> Option<Self> {
        let defaults = Self {
            interval: 10,
            logger: "runlog".to_string(),
            level: LogLevel::Info,
        };
        match input {
            ProgressInput::Enabled(false) => None,
            ProgressInput::Enabled(true) => Some(defaults),
            ProgressInput::Interval(interval) => Some(Self {
                interval: *interval,
                ..defaults
            }),
            ProgressInput::Logger(logger) => Some(Self {
                logger: logger.clone(),
                ..defaults
            }),
            ProgressInput::Pair(interval, logger) => Some(Self {
                interval: *interval,
                logger: logger.clone(),
                ..defaults
            }),
            ProgressInput::Full(interval, logger, level) => Some(Self {
                interval: *interval,
                logger: logger.clone(),
                level: *level,
            }),
        }
    }
}

/// Stdout-redirection shorthand as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StdoutInput {
    /// `true` selects all defaults, `false` disables redirection
    Enabled(bool),
    /// Redirect into this logger at the default level
    Logger(String),
    /// Redirect into the default logger at this level
    Level(LogLevel),
    /// Fully explicit pair
    Full(String, LogLevel),
}

/// Canonical stdout-redirection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdoutSpec {
    /// Logger that captured lines are emitted through
    pub logger: String,
    /// Severity of the captured records
    pub level: LogLevel,
}

impl StdoutSpec {
    /// Normalize a caller-supplied shorthand into the canonical pair.
    ///
    /// Returns `None` for `Enabled(false)`.
    pub fn normalize(input: &StdoutInput) -> Option<Self> {
        let defaults = Self {
            logger: "STDOUT".to_string(),
            level: LogLevel::Info,
        };
        match input {
            StdoutInput::Enabled(false) => None,
            StdoutInput::Enabled(true) => Some(defaults),
            StdoutInput::Logger(logger) => Some(Self {
                logger: logger.clone(),
                ..defaults
            }),
            StdoutInput::Level(level) => Some(Self {
                level: *level,
                ..defaults
            }),
            StdoutInput::Full(logger, level) => Some(Self {
                logger: logger.clone(),
                level: *level,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_normalization() {
        assert_eq!(ProgressSpec::normalize(&ProgressInput::Enabled(false)), None);
        let spec = ProgressSpec::normalize(&ProgressInput::Enabled(true)).unwrap();
        assert_eq!(spec.interval, 10);
        assert_eq!(spec.logger, "runlog");
        assert_eq!(spec.level, LogLevel::Info);

        let spec = ProgressSpec::normalize(&ProgressInput::Pair(5, "sim".to_string())).unwrap();
        assert_eq!(spec.interval, 5);
        assert_eq!(spec.logger, "sim");
        assert_eq!(spec.level, LogLevel::Info);
    }

    #[test]
    fn test_stdout_normalization() {
        let spec = StdoutSpec::normalize(&StdoutInput::Enabled(true)).unwrap();
        assert_eq!(spec.logger, "STDOUT");
        assert_eq!(spec.level, LogLevel::Info);

        let spec = StdoutSpec::normalize(&StdoutInput::Level(LogLevel::Debug)).unwrap();
        assert_eq!(spec.logger, "STDOUT");
        assert_eq!(spec.level, LogLevel::Debug);
    }

    #[test]
    fn test_snapshot_round_trips_through_serde() {
        let snapshot = ConfigSnapshot::Tree(serde_json::json!({"version": 1}));
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ConfigSnapshot = serde_json::from_str(&json).unwrap();
        match back {
            ConfigSnapshot::Tree(tree) => assert_eq!(tree["version"], 1),
            _ => panic!("expected tree snapshot"),
        }
    }
}
