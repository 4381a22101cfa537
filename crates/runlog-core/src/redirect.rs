//! Redirection of the standard output stream into the logging registry.
//!
//! The crate routes its captured standard output through a process-global,
//! swappable target ([`stdout`]). By default the target is the real stdout;
//! while a [`StdoutRedirector`] is active, written lines become log records
//! instead. A recursion guard keeps a misconfigured handler that itself
//! prints from looping the redirection.

use crate::backend::Registry;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use runlog_types::LogLevel;
use std::cell::Cell;
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Clone)]
enum Target {
    Real,
    Logger {
        logger: String,
        level: LogLevel,
        registry: Arc<Registry>,
    },
}

static TARGET: Lazy<Mutex<Target>> = Lazy::new(|| Mutex::new(Target::Real));

thread_local! {
    static IN_REDIRECT: Cell<bool> = Cell::new(false);
}

/// A side-effecting facility installed by the lifecycle manager.
///
/// Tools are tracked in installation order and finalized before the
/// manager's own teardown completes.
pub trait InstalledTool: Send {
    /// Undo the tool's side effect; safe to call when already inactive.
    fn finalize(&mut self);

    /// Whether the tool's side effect is currently in place.
    fn is_active(&self) -> bool;
}

/// A write handle forwarding to the current global stdout target.
pub struct CapturedStdout;

/// The crate's capture point for standard output.
///
/// Writes go to the real stdout unless a redirection is active.
pub fn stdout() -> CapturedStdout {
    CapturedStdout
}

impl Write for CapturedStdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let target = TARGET.lock().clone();
        write_to(&target, &String::from_utf8_lossy(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn write_to(target: &Target, text: &str) -> io::Result<()> {
    match target {
        Target::Real => {
            let mut out = io::stdout();
            out.write_all(text.as_bytes())?;
            out.flush()
        }
        Target::Logger {
            logger,
            level,
            registry,
        } => {
            if IN_REDIRECT.with(Cell::get) {
                // A handler printed while we were logging a captured line;
                // report on the unredirected stderr instead of recursing.
                eprintln!("ERROR: Recursion in stream redirection!");
                return Ok(());
            }
            IN_REDIRECT.with(|flag| flag.set(true));
            for line in text.lines() {
                let line = line.trim_end();
                if !line.is_empty() {
                    registry.emit(logger, *level, line);
                }
            }
            IN_REDIRECT.with(|flag| flag.set(false));
            Ok(())
        }
    }
}

/// Reversible redirection of the global stdout target into a logger.
///
/// `start` swaps the global target to a logging sink; `finalize` restores
/// the previously recorded target. Both are idempotent, and starting while
/// another redirection is already installed performs no swap.
pub struct StdoutRedirector {
    logger: String,
    level: LogLevel,
    registry: Arc<Registry>,
    previous: Option<Target>,
    active: bool,
}

impl StdoutRedirector {
    /// Create an inactive redirector emitting through `logger` at `level`.
    pub fn new(logger: impl Into<String>, level: LogLevel, registry: Arc<Registry>) -> Self {
        Self {
            logger: logger.into(),
            level,
            registry,
            previous: None,
            active: false,
        }
    }

    /// Install the redirection unless one is already in place.
    ///
    /// A one-line confirmation goes through the original target.
    pub fn start(&mut self) {
        let mut target = TARGET.lock();
        if matches!(&*target, Target::Logger { .. }) {
            return;
        }
        let previous = std::mem::replace(
            &mut *target,
            Target::Logger {
                logger: self.logger.clone(),
                level: self.level,
                registry: self.registry.clone(),
            },
        );
        drop(target);
        let _ = write_to(&previous, "Established redirection of `stdout`.\n");
        self.previous = Some(previous);
        self.active = true;
    }
}

impl InstalledTool for StdoutRedirector {
    fn finalize(&mut self) {
        if !self.active {
            return;
        }
        let restored = self.previous.take().unwrap_or(Target::Real);
        *TARGET.lock() = restored.clone();
        self.active = false;
        let _ = write_to(&restored, "Disabled redirection of `stdout`.\n");
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Handler, MemoryHandler, Record};

    /// A handler that itself prints through the captured stdout, to provoke
    /// the recursion guard.
    #[derive(Clone)]
    struct PrintingHandler {
        inner: MemoryHandler,
    }

    impl Handler for PrintingHandler {
        fn emit(&mut self, record: &Record) {
            self.inner.emit(record);
            let _ = writeln!(stdout(), "echo: {}", record.message);
        }
    }

    // The global stdout target is process state, so the whole redirection
    // lifecycle runs inside one test.
    #[test]
    fn test_redirection_lifecycle() {
        let registry = Arc::new(Registry::new());
        let sink = MemoryHandler::new();
        registry.attach_handler("STDOUT", Box::new(sink.clone()));

        let mut redirector =
            StdoutRedirector::new("STDOUT", LogLevel::Info, registry.clone());
        assert!(!redirector.is_active());

        redirector.start();
        assert!(redirector.is_active());

        // Every captured line carries the redirector's fixed severity.
        writeln!(stdout(), "hello").unwrap();
        assert_eq!(sink.records(), vec![(LogLevel::Info, "hello".to_string())]);

        // Blank and whitespace-only lines are dropped, multi-line buffers
        // yield one record per non-empty line.
        write!(stdout(), "a  \n\n   \nb\n").unwrap();
        assert_eq!(sink.messages(), vec!["hello", "a", "b"]);

        // Double installation performs no swap; the second redirector
        // stays inactive and its finalize is a no-op.
        let mut second = StdoutRedirector::new("OTHER", LogLevel::Info, registry.clone());
        second.start();
        assert!(!second.is_active());
        second.finalize();
        writeln!(stdout(), "still captured").unwrap();
        assert_eq!(sink.messages().last().unwrap(), "still captured");

        // A handler printing during emission is caught by the recursion
        // guard instead of looping.
        let echo = PrintingHandler {
            inner: MemoryHandler::new(),
        };
        registry.attach_handler("STDOUT", Box::new(echo.clone()));
        writeln!(stdout(), "guarded").unwrap();
        assert_eq!(echo.inner.messages(), vec!["guarded"]);

        redirector.finalize();
        assert!(!redirector.is_active());

        // Output target fully restored, so further writes reach the real
        // stdout and no new records appear.
        let before = sink.messages().len();
        writeln!(stdout(), "after teardown").unwrap();
        assert_eq!(sink.messages().len(), before);

        // Finalizing again stays a no-op.
        redirector.finalize();
        assert!(!redirector.is_active());
    }
}
