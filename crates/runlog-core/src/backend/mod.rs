//! The logging backend: a process-wide registry of named loggers and their
//! handlers, plus the dictionary-style and file-style configuration
//! entrypoints.
//!
//! The registry deliberately stays small: no queueing, no rotation, no
//! format templating. All mutation funnels through [`Registry`] so the
//! lifecycle manager has a single choke point for its invariants.

mod apply;
mod handlers;

pub use handlers::{FileHandler, MemoryHandler, NullHandler, StreamHandler};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use runlog_types::LogLevel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Name of the root logger.
pub const ROOT_LOGGER: &str = "";

/// A single log record as seen by handlers.
#[derive(Debug, Clone)]
pub struct Record {
    /// Name of the logger the record was emitted through
    pub logger: String,
    /// Severity
    pub level: LogLevel,
    /// Message text, one line
    pub message: String,
    /// Emission time
    pub timestamp: DateTime<Utc>,
    /// OS-reported process name
    pub process: String,
}

/// A sink for log records.
///
/// Handlers are owned by the registry and accessed under its lock, so they
/// only need to be `Send`.
pub trait Handler: Send {
    /// Write one record.
    fn emit(&mut self, record: &Record);

    /// Flush buffered output.
    fn flush(&mut self) {}

    /// Release resources; called once before detachment.
    fn close(&mut self) {}

    /// Severity threshold, if the handler filters on its own.
    fn level(&self) -> Option<LogLevel> {
        None
    }
}

/// Stable identifier of an attached handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct LoggerEntry {
    level: Option<LogLevel>,
    handlers: Vec<(HandlerId, Box<dyn Handler>)>,
}

impl LoggerEntry {
    fn new() -> Self {
        Self {
            level: None,
            handlers: Vec::new(),
        }
    }
}

struct RegistryInner {
    loggers: HashMap<String, LoggerEntry>,
    next_id: u64,
    disabled: u32,
}

/// Process-wide registry of named loggers and their attached handlers.
///
/// Production code uses [`Registry::global`]; tests construct private
/// instances so they do not interfere with one another.
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                loggers: HashMap::new(),
                next_id: 0,
                disabled: 0,
            }),
        }
    }

    /// The process-global registry instance.
    pub fn global() -> Arc<Registry> {
        static INSTANCE: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));
        INSTANCE.clone()
    }

    /// Emit a record through the named logger.
    ///
    /// The record passes if its level passes the effective level of the
    /// logger (the nearest ancestor with an explicit level, defaulting to
    /// INFO), and is then delivered to every handler along the dotted-name
    /// ancestry up to the root logger, subject to each handler's own
    /// threshold.
    pub fn emit(&self, logger: &str, level: LogLevel, message: &str) {
        let record = Record {
            logger: logger.to_string(),
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
            process: process_name(),
        };
        let mut inner = self.inner.lock();
        if inner.disabled > 0 {
            return;
        }

        let mut effective = None;
        for name in ancestry(logger) {
            if let Some(entry) = inner.loggers.get(name) {
                if let Some(entry_level) = entry.level {
                    effective = Some(entry_level);
                    break;
                }
            }
        }
        if !level.passes(effective.unwrap_or(LogLevel::Info)) {
            return;
        }

        for name in ancestry(logger) {
            if let Some(entry) = inner.loggers.get_mut(name) {
                for (_, handler) in entry.handlers.iter_mut() {
                    if handler.level().map_or(true, |threshold| level.passes(threshold)) {
                        handler.emit(&record);
                    }
                }
            }
        }
    }

    /// Set (or clear) the explicit level of a logger, creating it if needed.
    pub fn set_level(&self, logger: &str, level: Option<LogLevel>) {
        let mut inner = self.inner.lock();
        inner
            .loggers
            .entry(logger.to_string())
            .or_insert_with(LoggerEntry::new)
            .level = level;
    }

    /// Attach a handler to a logger, creating the logger if needed.
    pub fn attach_handler(&self, logger: &str, handler: Box<dyn Handler>) -> HandlerId {
        let mut inner = self.inner.lock();
        let id = HandlerId(inner.next_id);
        inner.next_id += 1;
        inner
            .loggers
            .entry(logger.to_string())
            .or_insert_with(LoggerEntry::new)
            .handlers
            .push((id, handler));
        id
    }

    /// Detach a handler previously attached to a logger.
    ///
    /// Returns `false` if the handler is no longer attached (for example
    /// after a [`Registry::tabula_rasa`]).
    pub fn detach_handler(&self, logger: &str, id: HandlerId) -> bool {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.loggers.get_mut(logger) {
            if let Some(pos) = entry.handlers.iter().position(|(hid, _)| *hid == id) {
                let (_, mut handler) = entry.handlers.remove(pos);
                handler.flush();
                handler.close();
                return true;
            }
        }
        false
    }

    /// Flush, close, and detach every handler on every logger, then clear
    /// the whole registry. Idempotent.
    pub fn tabula_rasa(&self) {
        let mut inner = self.inner.lock();
        for entry in inner.loggers.values_mut() {
            for (_, handler) in entry.handlers.iter_mut() {
                handler.flush();
                handler.close();
            }
            entry.handlers.clear();
        }
        inner.loggers.clear();
        debug!("Cleared all logging handlers");
    }

    /// Total number of handlers attached across all loggers.
    pub fn handler_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.loggers.values().map(|entry| entry.handlers.len()).sum()
    }

    /// Names of all known loggers.
    pub fn logger_names(&self) -> Vec<String> {
        let inner = self.inner.lock();
        inner.loggers.keys().cloned().collect()
    }

    /// Suppress all record delivery until the returned guard drops.
    ///
    /// Guards nest; delivery resumes once the last outstanding guard is
    /// gone. Handlers stay attached throughout.
    pub fn disable_logging(self: &Arc<Self>) -> DisabledLogging {
        self.inner.lock().disabled += 1;
        DisabledLogging {
            registry: self.clone(),
        }
    }
}

/// Guard that silences a registry for a scope.
///
/// Obtained from [`Registry::disable_logging`]; every record emitted while
/// at least one guard is alive is dropped.
pub struct DisabledLogging {
    registry: Arc<Registry>,
}

impl Drop for DisabledLogging {
    fn drop(&mut self) {
        let mut inner = self.registry.inner.lock();
        inner.disabled = inner.disabled.saturating_sub(1);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Dotted-name ancestry of a logger, from the logger itself up to the root.
///
/// `"a.b.c"` yields `["a.b.c", "a.b", "a", ""]`; the root logger yields
/// only itself.
fn ancestry(logger: &str) -> impl Iterator<Item = &str> {
    let mut current = Some(logger);
    std::iter::from_fn(move || {
        let name = current?;
        current = if name.is_empty() {
            None
        } else {
            Some(name.rfind('.').map_or(ROOT_LOGGER, |idx| &name[..idx]))
        };
        Some(name)
    })
}

fn process_name() -> String {
    static NAME: Lazy<String> = Lazy::new(runlog_types::context::current_process_name);
    NAME.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestry_walk() {
        let names: Vec<&str> = ancestry("a.b.c").collect();
        assert_eq!(names, vec!["a.b.c", "a.b", "a", ""]);
        let names: Vec<&str> = ancestry("").collect();
        assert_eq!(names, vec![""]);
    }

    #[test]
    fn test_emit_reaches_ancestors_and_root() {
        let registry = Registry::new();
        let leaf = MemoryHandler::new();
        let root = MemoryHandler::new();
        registry.attach_handler("sim.neurons", Box::new(leaf.clone()));
        registry.attach_handler(ROOT_LOGGER, Box::new(root.clone()));

        registry.emit("sim.neurons", LogLevel::Info, "spike");

        assert_eq!(leaf.messages(), vec!["spike"]);
        assert_eq!(root.messages(), vec!["spike"]);
    }

    #[test]
    fn test_effective_level_gates_records() {
        let registry = Registry::new();
        let sink = MemoryHandler::new();
        registry.attach_handler("sim", Box::new(sink.clone()));
        registry.set_level("sim", Some(LogLevel::Error));

        registry.emit("sim", LogLevel::Info, "ignored");
        registry.emit("sim", LogLevel::Error, "kept");

        assert_eq!(sink.messages(), vec!["kept"]);
    }

    #[test]
    fn test_tabula_rasa_is_idempotent_and_clears_everything() {
        let registry = Registry::new();
        registry.attach_handler("a", Box::new(NullHandler));
        registry.attach_handler(ROOT_LOGGER, Box::new(NullHandler));
        assert_eq!(registry.handler_count(), 2);

        registry.tabula_rasa();
        assert_eq!(registry.handler_count(), 0);
        assert!(registry.logger_names().is_empty());

        registry.tabula_rasa();
        assert_eq!(registry.handler_count(), 0);
    }

    #[test]
    fn test_handler_threshold_filters_independently() {
        let registry = Registry::new();
        let errors_only = MemoryHandler::with_level(LogLevel::Error);
        let everything = MemoryHandler::new();
        registry.attach_handler(ROOT_LOGGER, Box::new(errors_only.clone()));
        registry.attach_handler(ROOT_LOGGER, Box::new(everything.clone()));
        registry.set_level(ROOT_LOGGER, Some(LogLevel::Trace));

        registry.emit(ROOT_LOGGER, LogLevel::Info, "routine");
        registry.emit(ROOT_LOGGER, LogLevel::Error, "boom");

        assert_eq!(errors_only.messages(), vec!["boom"]);
        assert_eq!(everything.messages(), vec!["routine", "boom"]);
    }

    #[test]
    fn test_disable_logging_guard_suppresses_and_restores() {
        let registry = Arc::new(Registry::new());
        let sink = MemoryHandler::new();
        registry.attach_handler(ROOT_LOGGER, Box::new(sink.clone()));

        registry.emit(ROOT_LOGGER, LogLevel::Error, "before");
        {
            let _outer = registry.disable_logging();
            registry.emit(ROOT_LOGGER, LogLevel::Error, "silenced");
            {
                let _inner = registry.disable_logging();
            }
            // Dropping the nested guard keeps the outer suppression alive.
            registry.emit(ROOT_LOGGER, LogLevel::Error, "still silenced");
            assert_eq!(registry.handler_count(), 1);
        }
        registry.emit(ROOT_LOGGER, LogLevel::Error, "after");

        assert_eq!(sink.messages(), vec!["before", "after"]);
    }

    #[test]
    fn test_detach_after_teardown_is_safe() {
        let registry = Registry::new();
        let id = registry.attach_handler(ROOT_LOGGER, Box::new(NullHandler));
        registry.tabula_rasa();
        assert!(!registry.detach_handler(ROOT_LOGGER, id));
    }
}
