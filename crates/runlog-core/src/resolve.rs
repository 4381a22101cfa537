//! Filename placeholder resolution and directory materialization.

use runlog_types::{RunContext, ENV_MARKER, PROC_MARKER, RUN_MARKER, TRAJ_MARKER};
use std::path::Path;

/// Substrings marking a string literal as a filename.
///
/// Used when scanning ini option values, where file paths are embedded in
/// free-form argument strings rather than sitting under a `filename` key.
pub const FILENAME_INDICATORS: [&str; 6] = [
    ENV_MARKER,
    PROC_MARKER,
    TRAJ_MARKER,
    RUN_MARKER,
    ".log",
    ".txt",
];

/// Substitute all run-time placeholders in `template`.
///
/// `$ENV$` becomes the environment name, `$TRAJ$` the trajectory name,
/// `$RUN$` the current run name (or `run_ALL` when no run is set), and
/// `$PROC$` the process name. The markers are disjoint, so substitution
/// order does not matter. Strings without markers are returned unchanged.
pub fn resolve(template: &str, ctx: &RunContext) -> String {
    let mut resolved = template.to_string();
    if resolved.contains(ENV_MARKER) {
        resolved = resolved.replace(ENV_MARKER, &ctx.environment_name);
    }
    if resolved.contains(TRAJ_MARKER) {
        resolved = resolved.replace(TRAJ_MARKER, &ctx.container_name);
    }
    if resolved.contains(RUN_MARKER) {
        resolved = resolved.replace(RUN_MARKER, ctx.run_name());
    }
    if resolved.contains(PROC_MARKER) {
        resolved = resolved.replace(PROC_MARKER, &ctx.process_name);
    }
    resolved
}

/// Whether a string literal looks like a log filename.
pub fn looks_like_filename(s: &str) -> bool {
    FILENAME_INDICATORS.iter().any(|marker| s.contains(marker))
}

/// Best-effort creation of all missing parent directories of `filename`.
///
/// Logging setup must never abort the host program: failures are reported
/// on the real stderr stream and swallowed. Racing creations across worker
/// processes are tolerated since `create_dir_all` treats an existing
/// directory as success.
pub fn ensure_directories(filename: &str) {
    let dirname = match Path::new(filename).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return,
    };
    if dirname.is_dir() {
        return;
    }
    if let Err(err) = std::fs::create_dir_all(dirname) {
        eprintln!(
            "ERROR during log config handling, could not create dirs for \
             filename `{}` because of: {}",
            filename, err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> RunContext {
        RunContext {
            environment_name: "env_02".to_string(),
            container_name: "traj_brunel".to_string(),
            current_run_name: Some("run_00000007".to_string()),
            process_name: "worker_3".to_string(),
        }
    }

    #[test]
    fn test_resolves_all_markers() {
        let resolved = resolve("$TRAJ$/$ENV$/$RUN$_$PROC$_LOG.txt", &ctx());
        assert_eq!(resolved, "traj_brunel/env_02/run_00000007_worker_3_LOG.txt");
        for marker in FILENAME_INDICATORS.iter().take(4) {
            assert!(!resolved.contains(marker));
        }
    }

    #[test]
    fn test_run_falls_back_when_unset() {
        let mut ctx = ctx();
        ctx.current_run_name = None;
        assert_eq!(resolve("$RUN$_LOG.txt", &ctx), "run_ALL_LOG.txt");
    }

    #[test]
    fn test_identity_without_markers() {
        let plain = "plain/path/file.out";
        assert_eq!(resolve(plain, &ctx()), plain);
    }

    #[test]
    fn test_filename_heuristic() {
        assert!(looks_like_filename("$TRAJ$/LOG.txt"));
        assert!(looks_like_filename("errors.log"));
        assert!(!looks_like_filename("a"));
        assert!(!looks_like_filename("('INFO',)"));
    }

    #[test]
    fn test_ensure_directories_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a").join("b").join("LOG.txt");
        ensure_directories(file.to_str().unwrap());
        assert!(file.parent().unwrap().is_dir());
    }

    #[test]
    fn test_ensure_directories_swallows_failure() {
        // Parent path collides with an existing file, so creation must fail
        // without panicking or returning an error.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let file = blocker.join("sub").join("LOG.txt");
        ensure_directories(file.to_str().unwrap());
        assert!(!file.parent().unwrap().exists());
    }

    proptest! {
        #[test]
        fn prop_resolve_is_identity_without_markers(s in "[a-zA-Z0-9_/.-]{0,64}") {
            prop_assume!(!s.contains('$'));
            prop_assert_eq!(resolve(&s, &ctx()), s);
        }
    }
}
