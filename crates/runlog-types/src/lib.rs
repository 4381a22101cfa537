//! # Runlog Types
//!
//! Core types shared across the runlog crates.
//!
//! Runlog manages structured logging for long-running, potentially
//! multi-process experiment runners. This crate provides the fundamental
//! building blocks:
//!
//! - The error taxonomy and result alias
//! - Log levels
//! - The [`RunContext`] snapshot used to resolve filename placeholders in a
//!   worker process without shipping the whole simulation state
//! - The configuration input shapes and the serializable configuration
//!   snapshots derived from them
//!
//! ## Example
//!
//! ```
//! use runlog_types::{RunContext, LogLevel};
//!
//! let ctx = RunContext::new("env_01", "traj_sim", Some("run_00000004"));
//! assert_eq!(ctx.environment_name, "env_01");
//! assert_eq!(ctx.run_name(), "run_00000004");
//!
//! let level: LogLevel = "INFO".parse().unwrap();
//! assert_eq!(level, LogLevel::Info);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod errors;
pub mod level;

// Re-export common types for convenience
pub use config::{ConfigSnapshot, LogConfigInput, ProgressInput, ProgressSpec, ShorthandOptions,
                 StdoutInput, StdoutSpec, DEFAULT_CONFIG, MULTIPROC_PREFIX};
pub use context::{RunContext, RunIdentity, ENV_MARKER, PROC_MARKER, RUN_ALL, RUN_MARKER,
                  TRAJ_MARKER};
pub use errors::{Result, RunlogError};
pub use level::LogLevel;
