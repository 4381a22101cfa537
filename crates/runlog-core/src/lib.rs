//! # Runlog Core
//!
//! Logging configuration and lifecycle management for long-running,
//! potentially multi-process experiment runners.
//!
//! This crate provides:
//!
//! - **Filename resolution**: run-time placeholder substitution
//!   (`$ENV$`, `$TRAJ$`, `$RUN$`, `$PROC$`) in path templates, with
//!   best-effort directory creation
//! - **Configuration normalization**: file-path, structured-tree, and
//!   shorthand inputs canonicalized into a primary snapshot plus a derived
//!   worker-process variant
//! - **Lifecycle management**: applying configuration per process or per
//!   worker, null-handler bookkeeping, and full teardown of all handlers
//! - **Stdout redirection**: a reversible, recursion-guarded capture of the
//!   standard output stream into the logging registry
//!
//! ## Example
//!
//! ```no_run
//! use runlog_core::LoggingManager;
//! use runlog_types::{LogConfigInput, RunContext, ShorthandOptions, StdoutInput};
//!
//! let ctx = RunContext::new("env_01", "traj_sim", None);
//! let mut manager = LoggingManager::new(ctx)
//!     .with_config(LogConfigInput::Shorthand(ShorthandOptions::default()))
//!     .with_stdout(StdoutInput::Enabled(true));
//!
//! manager.check_config()?;
//! manager.apply_config(false)?;
//! // ... run the experiment ...
//! manager.finalize(true);
//! # Ok::<(), runlog_types::RunlogError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod diag;
pub mod manager;
pub mod normalize;
pub mod redirect;
pub mod resolve;

// Re-export commonly used items
pub use backend::{DisabledLogging, Handler, HandlerId, Record, Registry};
pub use manager::{LoggingManager, ManagerSnapshot};
pub use redirect::{InstalledTool, StdoutRedirector};
pub use runlog_types::{Result, RunlogError};
