//! The logging lifecycle manager.
//!
//! Owns the normalized configuration snapshots and applies them to the
//! backend registry, per controlling process or per worker. Configuration
//! moves through three phases: `check_config` normalizes and snapshots,
//! `apply_config` resolves filenames and installs handlers (possibly many
//! times, once per worker), and `finalize` tears everything down.

use crate::backend::{HandlerId, NullHandler, Registry, ROOT_LOGGER};
use crate::normalize::{extract_string_literals, load_ini, normalize, write_ini};
use crate::redirect::{InstalledTool, StdoutRedirector};
use crate::resolve::{ensure_directories, looks_like_filename, resolve};
use runlog_types::{
    bail, ConfigSnapshot, LogConfigInput, ProgressInput, ProgressSpec, Result, RunContext,
    ShorthandOptions, StdoutInput, StdoutSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Whether the OS supports process forking.
///
/// On a fork-capable OS a freshly forked worker inherits the parent's
/// handler state (including its file handles), so by default the manager
/// wipes that state before reconfiguring the worker.
fn fork_supported() -> bool {
    cfg!(unix)
}

/// Manager taking care of all logging-related concerns of a run.
///
/// Built with `with_*` methods, then driven through
/// [`check_config`](LoggingManager::check_config) →
/// [`apply_config`](LoggingManager::apply_config) →
/// [`finalize`](LoggingManager::finalize).
pub struct LoggingManager {
    context: RunContext,
    log_config: Option<LogConfigInput>,
    shorthand: Option<ShorthandOptions>,
    stdout_input: Option<StdoutInput>,
    progress_input: Option<ProgressInput>,
    allow_fork: bool,
    registry: Arc<Registry>,
    canonical: Option<ConfigSnapshot>,
    worker: Option<ConfigSnapshot>,
    stdout_spec: Option<StdoutSpec>,
    progress_spec: Option<ProgressSpec>,
    checked: bool,
    tools: Vec<Box<dyn InstalledTool>>,
    null_handler: Option<HandlerId>,
}

impl LoggingManager {
    /// Create an unconfigured manager for the given run context, bound to
    /// the process-global registry.
    pub fn new(context: RunContext) -> Self {
        Self {
            context,
            log_config: None,
            shorthand: None,
            stdout_input: None,
            progress_input: None,
            allow_fork: false,
            registry: Registry::global(),
            canonical: None,
            worker: None,
            stdout_spec: None,
            progress_spec: None,
            checked: false,
            tools: Vec::new(),
            null_handler: None,
        }
    }

    /// Supply an explicit logging configuration.
    pub fn with_config(mut self, config: LogConfigInput) -> Self {
        self.log_config = Some(config);
        self
    }

    /// Supply the simplified shorthand configuration.
    ///
    /// Mutually exclusive with [`with_config`](LoggingManager::with_config);
    /// supplying both is rejected by `check_config` before any filesystem
    /// side effect.
    pub fn with_shorthand(mut self, opts: ShorthandOptions) -> Self {
        self.shorthand = Some(opts);
        self
    }

    /// Request redirection of standard output into the logging system.
    pub fn with_stdout(mut self, input: StdoutInput) -> Self {
        self.stdout_input = Some(input);
        self
    }

    /// Request progress reporting.
    pub fn with_progress(mut self, input: ProgressInput) -> Self {
        self.progress_input = Some(input);
        self
    }

    /// Permit forked workers to inherit the parent's handler state instead
    /// of tearing it down before reconfiguration.
    pub fn allow_fork(mut self, allow: bool) -> Self {
        self.allow_fork = allow;
        self
    }

    /// Bind the manager to a specific registry instead of the global one.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// The normalized progress-reporting settings, available after
    /// `check_config`.
    pub fn progress(&self) -> Option<&ProgressSpec> {
        self.progress_spec.as_ref()
    }

    /// The canonical configuration snapshot, available after `check_config`.
    pub fn canonical_config(&self) -> Option<&ConfigSnapshot> {
        self.canonical.as_ref()
    }

    /// The derived worker configuration snapshot, if the configuration
    /// carries worker-designated entries.
    pub fn worker_config(&self) -> Option<&ConfigSnapshot> {
        self.worker.as_ref()
    }

    /// Normalize and snapshot all supplied settings.
    ///
    /// Converts the progress and stdout shorthands into their canonical
    /// forms, rejects conflicting configuration inputs, and materializes
    /// the canonical and worker snapshots. File configs are read exactly
    /// once, here; worker spawns reuse the in-memory snapshot.
    pub fn check_config(&mut self) -> Result<()> {
        if self.shorthand.is_some() && self.log_config.is_some() {
            bail!(
                ConflictingConfig,
                "give either the shorthand logging options or an explicit log config, not both"
            );
        }

        self.progress_spec = self
            .progress_input
            .as_ref()
            .and_then(ProgressSpec::normalize);
        self.stdout_spec = self.stdout_input.as_ref().and_then(StdoutSpec::normalize);

        let input = self
            .log_config
            .clone()
            .or_else(|| self.shorthand.clone().map(LogConfigInput::Shorthand));
        if let Some(input) = &input {
            let (canonical, worker) = normalize(input)?;
            self.canonical = Some(canonical);
            self.worker = worker;
        }

        self.checked = true;
        debug!(
            has_worker_variant = self.worker.is_some(),
            "Checked logging configuration"
        );
        Ok(())
    }

    /// Apply the configuration to the backend registry.
    ///
    /// Selects the worker variant when `is_worker` and one exists, rewrites
    /// every filename in the selected snapshot through the resolver
    /// (creating directories as a side effect), and hands the result to the
    /// matching backend entrypoint. Installs the stdout redirector when
    /// requested, except inside forked workers where the parent's
    /// redirection is already in place. May be invoked once per worker.
    pub fn apply_config(&mut self, is_worker: bool) -> Result<()> {
        if !self.checked {
            bail!(Validation, "apply_config called before check_config");
        }

        let mut stdout_spec = self.stdout_spec.clone();
        if is_worker && fork_supported() {
            stdout_spec = None;
            if !self.allow_fork {
                // Inherited handlers hold the parent's file handles.
                self.registry.tabula_rasa();
            }
        }

        let snapshot = if is_worker {
            self.worker.as_ref().or(self.canonical.as_ref())
        } else {
            self.canonical.as_ref()
        };
        if let Some(snapshot) = snapshot.cloned() {
            match snapshot {
                ConfigSnapshot::Tree(tree) => {
                    let resolved = resolve_tree_filenames(&tree, &self.context);
                    self.registry.apply_tree(&resolved)?;
                }
                ConfigSnapshot::IniText(text) => {
                    let rewritten = resolve_ini_filenames(&text, &self.context)?;
                    self.registry.apply_file(&rewritten, false)?;
                }
            }
            debug!(is_worker, "Applied logging configuration");
        }

        if let Some(spec) = stdout_spec {
            let mut redirector =
                StdoutRedirector::new(spec.logger, spec.level, self.registry.clone());
            redirector.start();
            self.tools.push(Box::new(redirector));
        }

        Ok(())
    }

    /// Remove all handlers from all loggers and clear the registry.
    pub fn tabula_rasa(&self) {
        self.registry.tabula_rasa();
    }

    /// Attach a no-op handler to the root logger, silencing
    /// "no handlers configured" diagnostics before real configuration is
    /// applied.
    pub fn add_null_handler(&mut self) {
        if self.null_handler.is_none() {
            self.null_handler = Some(
                self.registry
                    .attach_handler(ROOT_LOGGER, Box::new(NullHandler)),
            );
        }
    }

    /// Detach the no-op handler from the root logger.
    pub fn remove_null_handler(&mut self) {
        if let Some(id) = self.null_handler.take() {
            self.registry.detach_handler(ROOT_LOGGER, id);
        }
    }

    /// Finalize all tracked tools in installation order, release the
    /// configuration snapshots, and, unless suppressed, tear down every
    /// handler.
    pub fn finalize(&mut self, remove_all_handlers: bool) {
        for tool in self.tools.iter_mut() {
            tool.finalize();
        }
        self.tools.clear();
        self.canonical = None;
        self.worker = None;
        self.checked = false;
        if remove_all_handlers {
            self.registry.tabula_rasa();
        }
    }

    /// The serializable subset of this manager, for transfer to a spawned
    /// worker process. Requires a prior `check_config`.
    pub fn snapshot(&self) -> Result<ManagerSnapshot> {
        if !self.checked {
            bail!(Validation, "snapshot requires a checked configuration");
        }
        Ok(ManagerSnapshot {
            context: self.context.clone(),
            allow_fork: self.allow_fork,
            stdout_spec: self.stdout_spec.clone(),
            progress_spec: self.progress_spec.clone(),
            canonical: self.canonical.clone(),
            worker: self.worker.clone(),
        })
    }

    /// Reconstruct a manager inside a worker process, bound to that
    /// process's global registry and already checked.
    pub fn from_snapshot(snapshot: ManagerSnapshot) -> Self {
        let mut manager = Self::new(snapshot.context);
        manager.allow_fork = snapshot.allow_fork;
        manager.stdout_spec = snapshot.stdout_spec;
        manager.progress_spec = snapshot.progress_spec;
        manager.canonical = snapshot.canonical;
        manager.worker = snapshot.worker;
        manager.checked = true;
        manager
    }
}

/// The fully copyable state of a checked [`LoggingManager`].
///
/// Everything here is a plain value type; live backend handles never cross
/// a process boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    /// Run context the filenames resolve against
    pub context: RunContext,
    /// Whether forked workers may inherit handler state
    pub allow_fork: bool,
    /// Canonical stdout-redirection settings, if requested
    pub stdout_spec: Option<StdoutSpec>,
    /// Canonical progress settings, if requested
    pub progress_spec: Option<ProgressSpec>,
    /// Primary configuration snapshot
    pub canonical: Option<ConfigSnapshot>,
    /// Derived worker configuration snapshot
    pub worker: Option<ConfigSnapshot>,
}

/// Recursively rewrite every `filename` leaf of a configuration tree,
/// creating the destination directories as a side effect.
fn resolve_tree_filenames(value: &Value, ctx: &RunContext) -> Value {
    match value {
        Value::Object(map) => {
            let mut resolved_map = serde_json::Map::with_capacity(map.len());
            for (key, inner) in map {
                let resolved = match inner {
                    Value::String(template) if key == "filename" => {
                        let filename = resolve(template, ctx);
                        ensure_directories(&filename);
                        Value::String(filename)
                    }
                    other => resolve_tree_filenames(other, ctx),
                };
                resolved_map.insert(key.clone(), resolved);
            }
            Value::Object(resolved_map)
        }
        other => other.clone(),
    }
}

/// Rewrite every path-like string literal inside `args` options of ini
/// text, creating the destination directories as a side effect.
fn resolve_ini_filenames(text: &str, ctx: &RunContext) -> Result<String> {
    let mut ini = load_ini(text)?;

    let mut updates = Vec::new();
    for (section, props) in ini.iter() {
        let section = match section {
            Some(name) => name,
            None => continue,
        };
        for (option, value) in props.iter() {
            if option != "args" {
                continue;
            }
            let mut rewritten = value.to_string();
            let mut replaced = false;
            for literal in extract_string_literals(value) {
                if looks_like_filename(&literal) {
                    let filename = resolve(&literal, ctx);
                    ensure_directories(&filename);
                    rewritten = rewritten.replace(&literal, &filename);
                    replaced = true;
                }
            }
            if replaced {
                updates.push((section.to_string(), option.to_string(), rewritten));
            }
        }
    }

    for (section, option, value) in updates {
        ini.with_section(Some(section)).set(option, value);
    }
    write_ini(&ini)
}
