//! Run context snapshots and filename placeholder markers.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the environment name.
pub const ENV_MARKER: &str = "$ENV$";
/// Placeholder replaced by the trajectory (result container) name.
pub const TRAJ_MARKER: &str = "$TRAJ$";
/// Placeholder replaced by the current run name.
pub const RUN_MARKER: &str = "$RUN$";
/// Placeholder replaced by the current process name.
pub const PROC_MARKER: &str = "$PROC$";

/// Fallback substituted for `$RUN$` when no run is currently set.
pub const RUN_ALL: &str = "run_ALL";

/// Read-only identity of a live simulation object.
///
/// This is the seam to the caller's trajectory/experiment state: the
/// resolver only ever needs these three fields, so a [`RunContext`] snapshot
/// is copied out of the live object instead of shipping the object itself
/// across a process boundary.
pub trait RunIdentity {
    /// Name of the environment the run executes in.
    fn environment_name(&self) -> &str;
    /// Name of the result container (trajectory).
    fn container_name(&self) -> &str;
    /// Name of the current run, if the container is set to one.
    fn current_run_name(&self) -> Option<&str>;
}

/// Immutable snapshot of the identifying fields needed to resolve filename
/// placeholders.
///
/// Created once per configuration pass and discarded after resolution. Being
/// a plain value type it transfers safely to worker processes.
///
/// # Example
///
/// ```
/// use runlog_types::RunContext;
///
/// let ctx = RunContext::new("env_01", "traj_sim", None);
/// assert_eq!(ctx.run_name(), "run_ALL");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// Environment name (`$ENV$`)
    pub environment_name: String,
    /// Trajectory / container name (`$TRAJ$`)
    pub container_name: String,
    /// Current run name (`$RUN$`), if any
    pub current_run_name: Option<String>,
    /// OS-reported process name (`$PROC$`)
    pub process_name: String,
}

impl RunContext {
    /// Create a context with the process name captured from the OS.
    pub fn new(
        environment_name: impl Into<String>,
        container_name: impl Into<String>,
        current_run_name: Option<&str>,
    ) -> Self {
        Self {
            environment_name: environment_name.into(),
            container_name: container_name.into(),
            current_run_name: current_run_name.map(str::to_string),
            process_name: current_process_name(),
        }
    }

    /// Copy the identifying fields out of a live simulation object.
    pub fn from_identity(identity: &impl RunIdentity) -> Self {
        Self::new(
            identity.environment_name(),
            identity.container_name(),
            identity.current_run_name(),
        )
    }

    /// The current run name, or [`RUN_ALL`] when no run is set.
    pub fn run_name(&self) -> &str {
        self.current_run_name.as_deref().unwrap_or(RUN_ALL)
    }
}

/// The OS-reported name of the current process.
///
/// Derived from the current executable's file stem; falls back to
/// `"process"` when the executable path cannot be determined.
pub fn current_process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "process".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTrajectory {
        env: String,
        name: String,
        run: Option<String>,
    }

    impl RunIdentity for FakeTrajectory {
        fn environment_name(&self) -> &str {
            &self.env
        }
        fn container_name(&self) -> &str {
            &self.name
        }
        fn current_run_name(&self) -> Option<&str> {
            self.run.as_deref()
        }
    }

    #[test]
    fn test_snapshot_copies_fields() {
        let traj = FakeTrajectory {
            env: "env_01".to_string(),
            name: "traj_sim".to_string(),
            run: Some("run_00000002".to_string()),
        };
        let ctx = RunContext::from_identity(&traj);
        assert_eq!(ctx.environment_name, "env_01");
        assert_eq!(ctx.container_name, "traj_sim");
        assert_eq!(ctx.run_name(), "run_00000002");
        assert!(!ctx.process_name.is_empty());
    }

    #[test]
    fn test_run_name_fallback() {
        let ctx = RunContext::new("e", "t", None);
        assert_eq!(ctx.run_name(), RUN_ALL);
    }

    #[test]
    fn test_context_round_trips_through_serde() {
        let ctx = RunContext::new("env", "traj", Some("run_00000001"));
        let json = serde_json::to_string(&ctx).unwrap();
        let back: RunContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
