//! Configuration normalization.
//!
//! Accepts one of the three input shapes (file path, structured tree,
//! shorthand options) and produces a canonical configuration snapshot plus
//! the derived worker-process variant. Ini files are parsed with quoting,
//! escaping, and interpolation disabled: option values may contain path
//! separators and placeholder markers that must be taken literally.

use ini::{EscapePolicy, Ini, ParseOption};
use runlog_types::{
    bail, ConfigSnapshot, LogConfigInput, Result, RunlogError, ShorthandOptions, DEFAULT_CONFIG,
    MULTIPROC_PREFIX,
};
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::debug;

/// The bundled default file-style configuration, selected by the
/// [`DEFAULT_CONFIG`] sentinel path.
pub const DEFAULT_INI: &str = include_str!("default.ini");

/// Normalize a caller-supplied configuration into a canonical snapshot and
/// an optional worker-process variant.
///
/// The worker variant is built from `multiproc_`-prefixed top-level tree
/// keys or ini sections, prefix stripped, inheriting the parent's schema
/// meta fields. When no prefixed entry exists the variant is absent and
/// worker processes reuse the primary configuration unmodified.
pub fn normalize(input: &LogConfigInput) -> Result<(ConfigSnapshot, Option<ConfigSnapshot>)> {
    match input {
        LogConfigInput::Shorthand(opts) => {
            let tree = shorthand_to_tree(opts)?;
            let worker = split_multiproc_tree(&tree);
            Ok((ConfigSnapshot::Tree(tree), worker.map(ConfigSnapshot::Tree)))
        }
        LogConfigInput::Tree(tree) => {
            let worker = split_multiproc_tree(tree);
            Ok((
                ConfigSnapshot::Tree(tree.clone()),
                worker.map(ConfigSnapshot::Tree),
            ))
        }
        LogConfigInput::FilePath(path) => {
            let text = if path.as_os_str() == DEFAULT_CONFIG {
                DEFAULT_INI.to_string()
            } else {
                if !path.is_file() {
                    return Err(RunlogError::ConfigNotFound(path.display().to_string()));
                }
                std::fs::read_to_string(path)?
            };
            // Parsers may hold open state; snapshots are always the
            // materialized text, never the live parser.
            let ini = load_ini(&text)?;
            let worker = split_multiproc_ini(&ini);
            Ok((
                ConfigSnapshot::IniText(write_ini(&ini)?),
                worker.map(|w| write_ini(&w)).transpose()?.map(ConfigSnapshot::IniText),
            ))
        }
    }
}

/// Parse ini text with quoting, escaping, and `%`-interpolation disabled.
pub fn load_ini(text: &str) -> Result<Ini> {
    Ini::load_from_str_opt(
        text,
        ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        },
    )
    .map_err(|err| RunlogError::Config(format!("Failed to parse ini config: {}", err)))
}

/// Serialize an ini document back to text, values untouched.
pub fn write_ini(ini: &Ini) -> Result<String> {
    let mut buffer = Vec::new();
    ini.write_to_policy(&mut buffer, EscapePolicy::Nothing)?;
    String::from_utf8(buffer)
        .map_err(|err| RunlogError::Config(format!("Ini text is not valid UTF-8: {}", err)))
}

/// Extract the quoted string literals embedded in an `args` option value.
///
/// Both single and double quotes delimit literals; nesting and escapes do
/// not occur in the argument tuples this format carries.
pub fn extract_string_literals(args: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut rest = args;
    while let Some(start) = rest.find(['\'', '"']) {
        let quote = rest.as_bytes()[start] as char;
        let after = &rest[start + 1..];
        match after.find(quote) {
            Some(end) => {
                literals.push(after[..end].to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    literals
}

/// Build the default structured tree for the shorthand configuration.
///
/// Two output channel sets: a console stream channel plus two file channels
/// (all levels, and error-and-above), mirrored by a `multiproc_` variant
/// whose file paths additionally embed the run and process markers.
fn default_tree() -> Value {
    json!({
        "version": 1,
        "disable_existing_loggers": false,
        "formatters": {
            "file": {"format": "%(asctime)s %(name)s %(levelname)-8s %(message)s"},
            "stream": {"format": "%(processName)-10s %(name)s %(levelname)-8s %(message)s"}
        },
        "handlers": {
            "stream": {
                "class": "StreamHandler",
                "formatter": "stream"
            },
            "file_main": {
                "class": "FileHandler",
                "formatter": "file",
                "filename": "$TRAJ$/$ENV$/LOG.txt"
            },
            "file_error": {
                "class": "FileHandler",
                "formatter": "file",
                "filename": "$TRAJ$/$ENV$/ERROR.txt",
                "level": "ERROR"
            }
        },
        "multiproc_formatters": {
            "file": {"format": "%(asctime)s %(name)s %(levelname)-8s %(message)s"}
        },
        "multiproc_handlers": {
            "file_main": {
                "class": "FileHandler",
                "formatter": "file",
                "filename": "$TRAJ$/$ENV$/$RUN$_$PROC$_LOG.txt"
            },
            "file_error": {
                "class": "FileHandler",
                "formatter": "file",
                "filename": "$TRAJ$/$ENV$/$RUN$_$PROC$_ERROR.txt",
                "level": "ERROR"
            }
        }
    })
}

/// Expand shorthand options into the default structured tree.
///
/// One level is broadcast to every logger name; any other length mismatch
/// between names and levels is rejected rather than truncated or cycled.
pub fn shorthand_to_tree(opts: &ShorthandOptions) -> Result<Value> {
    let names: Vec<String> = if opts.logger_names.is_empty() {
        vec![String::new()]
    } else {
        opts.logger_names.clone()
    };
    let levels = if opts.log_levels.len() == 1 {
        vec![opts.log_levels[0]; names.len()]
    } else {
        opts.log_levels.clone()
    };
    if levels.len() != names.len() {
        bail!(
            Validation,
            "expected one log level or {}, got {}",
            names.len(),
            levels.len()
        );
    }

    let mut tree = default_tree();

    // Attach every handler of each variant to every requested logger, with
    // file paths rooted at the log folder.
    for prefix in ["", MULTIPROC_PREFIX] {
        let handlers_key = format!("{}handlers", prefix);
        let mut handler_names = Vec::new();
        if let Some(handlers) = tree.get_mut(&handlers_key).and_then(Value::as_object_mut) {
            for (handler_name, spec) in handlers.iter_mut() {
                handler_names.push(handler_name.clone());
                if let Some(Value::String(filename)) = spec.get("filename") {
                    let joined = Path::new(&opts.log_folder)
                        .join(filename)
                        .to_string_lossy()
                        .into_owned();
                    spec["filename"] = Value::String(joined);
                }
            }
        }

        let mut loggers = Map::new();
        for (name, level) in names.iter().zip(levels.iter()) {
            loggers.insert(
                name.clone(),
                json!({
                    "level": level,
                    "handlers": handler_names,
                }),
            );
        }
        tree[format!("{}loggers", prefix)] = Value::Object(loggers);
    }

    Ok(tree)
}

/// Derive the worker-process variant of a structured tree.
///
/// Copies every `multiproc_`-prefixed top-level entry with the prefix
/// stripped and inherits `version` and `disable_existing_loggers` from the
/// parent so the derived tree is independently valid. Returns `None` when
/// the tree carries no prefixed entry.
pub fn split_multiproc_tree(tree: &Value) -> Option<Value> {
    let obj = tree.as_object()?;
    if !obj.keys().any(|key| key.starts_with(MULTIPROC_PREFIX)) {
        return None;
    }

    let mut worker = Map::new();
    for (key, value) in obj {
        if let Some(stripped) = key.strip_prefix(MULTIPROC_PREFIX) {
            worker.insert(stripped.to_string(), value.clone());
        }
    }
    if let Some(version) = obj.get("version") {
        worker.insert("version".to_string(), version.clone());
    }
    if let Some(flag) = obj.get("disable_existing_loggers") {
        worker.insert("disable_existing_loggers".to_string(), flag.clone());
    }

    debug!(entries = worker.len(), "Derived worker tree configuration");
    Some(Value::Object(worker))
}

/// Derive the worker-process variant of an ini document.
///
/// Copies every `multiproc_`-prefixed section into a fresh document with
/// the prefix stripped. Returns `None` when no such section exists.
pub fn split_multiproc_ini(ini: &Ini) -> Option<Ini> {
    let has_worker_sections = ini
        .iter()
        .any(|(section, _)| section.map_or(false, |name| name.starts_with(MULTIPROC_PREFIX)));
    if !has_worker_sections {
        return None;
    }

    let mut worker = Ini::new();
    for (section, props) in ini.iter() {
        let section = match section {
            Some(name) => name,
            None => continue,
        };
        if let Some(stripped) = section.strip_prefix(MULTIPROC_PREFIX) {
            for (key, value) in props.iter() {
                worker.set_to(Some(stripped), key.to_string(), value.to_string());
            }
        }
    }
    Some(worker)
}
