//! Built-in handler implementations.

use super::{Handler, Record};
use parking_lot::Mutex;
use runlog_types::{LogLevel, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;

/// Writes records to the real stderr stream.
///
/// Stderr rather than stdout, so a stream handler never feeds a record back
/// into an active stdout redirection.
pub struct StreamHandler {
    level: Option<LogLevel>,
}

impl StreamHandler {
    /// Create a stream handler with an optional severity threshold.
    pub fn new(level: Option<LogLevel>) -> Self {
        Self { level }
    }
}

impl Handler for StreamHandler {
    fn emit(&mut self, record: &Record) {
        eprintln!(
            "{:<10} {} {:<8} {}",
            record.process, record.logger, record.level, record.message
        );
    }

    fn level(&self) -> Option<LogLevel> {
        self.level
    }
}

/// Appends records to a file, one line per record.
pub struct FileHandler {
    file: File,
    level: Option<LogLevel>,
}

impl FileHandler {
    /// Open `filename` for appending; the file is created if missing.
    ///
    /// The path must already be placeholder-resolved. A failing open is a
    /// backend rejection of the configuration and surfaces to the caller.
    pub fn open(filename: &str, level: Option<LogLevel>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(filename)?;
        Ok(Self { file, level })
    }
}

impl Handler for FileHandler {
    fn emit(&mut self, record: &Record) {
        // A failing write on an already-open log file must not take the
        // experiment down with it.
        let _ = writeln!(
            self.file,
            "{} {} {:<8} {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.logger,
            record.level,
            record.message
        );
    }

    fn flush(&mut self) {
        let _ = self.file.flush();
    }

    fn level(&self) -> Option<LogLevel> {
        self.level
    }
}

/// Discards every record.
///
/// Attached to the root logger before real configuration is applied, so
/// early emissions do not trip "no handlers configured" diagnostics.
pub struct NullHandler;

impl Handler for NullHandler {
    fn emit(&mut self, _record: &Record) {}
}

/// Buffers records in memory.
///
/// Cloning yields another handle onto the same buffer, so a test can keep
/// one clone and hand the other to the registry.
#[derive(Clone)]
pub struct MemoryHandler {
    records: Arc<Mutex<Vec<(LogLevel, String)>>>,
    level: Option<LogLevel>,
}

impl MemoryHandler {
    /// Create an unfiltered memory handler.
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            level: None,
        }
    }

    /// Create a memory handler with a severity threshold.
    pub fn with_level(level: LogLevel) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            level: Some(level),
        }
    }

    /// Snapshot of the buffered messages.
    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|(_, msg)| msg.clone()).collect()
    }

    /// Snapshot of the buffered records with their levels.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }
}

impl Default for MemoryHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for MemoryHandler {
    fn emit(&mut self, record: &Record) {
        self.records.lock().push((record.level, record.message.clone()));
    }

    fn level(&self) -> Option<LogLevel> {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(level: LogLevel, message: &str) -> Record {
        Record {
            logger: "test".to_string(),
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
            process: "test_proc".to_string(),
        }
    }

    #[test]
    fn test_file_handler_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LOG.txt");
        let path_str = path.to_str().unwrap();

        let mut handler = FileHandler::open(path_str, None).unwrap();
        handler.emit(&record(LogLevel::Info, "first"));
        handler.emit(&record(LogLevel::Error, "second"));
        handler.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].contains("ERROR"));
    }

    #[test]
    fn test_file_handler_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("LOG.txt");
        assert!(FileHandler::open(path.to_str().unwrap(), None).is_err());
    }

    #[test]
    fn test_memory_handler_shares_buffer_across_clones() {
        let handler = MemoryHandler::new();
        let mut clone = handler.clone();
        clone.emit(&record(LogLevel::Info, "hello"));
        assert_eq!(handler.messages(), vec!["hello"]);
    }
}
