//! Configuration entrypoints of the backend.
//!
//! Two shapes are consumed: a structured tree (dictionary-style) and
//! ini text (file-style). Both expect filename values to be already
//! placeholder-resolved; any rejection here is a
//! [`RunlogError::Backend`](runlog_types::RunlogError::Backend) and
//! propagates to the caller unchanged.

use super::{FileHandler, Handler, NullHandler, Registry, StreamHandler, ROOT_LOGGER};
use crate::normalize::{extract_string_literals, load_ini};
use runlog_types::{LogLevel, Result, RunlogError, MULTIPROC_PREFIX};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

impl Registry {
    /// Dictionary-style entrypoint: apply a structured configuration tree.
    ///
    /// The tree must carry schema `version` 1 (the default when absent).
    /// `disable_existing_loggers` (default `true`) clears the registry
    /// before installation. Handler specs live under `handlers`, logger
    /// definitions under `loggers` and the optional `root` key; the
    /// `formatters` section is accepted but not interpreted.
    pub fn apply_tree(&self, tree: &Value) -> Result<()> {
        let obj = tree.as_object().ok_or_else(|| {
            RunlogError::Backend("configuration tree must be a mapping".to_string())
        })?;

        let version = obj.get("version").and_then(Value::as_u64).unwrap_or(1);
        if version != 1 {
            return Err(RunlogError::Backend(format!(
                "unsupported configuration schema version {}",
                version
            )));
        }

        let disable_existing = obj
            .get("disable_existing_loggers")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if disable_existing {
            self.tabula_rasa();
        }

        let mut handler_specs: HashMap<&str, &Value> = HashMap::new();
        if let Some(handlers) = obj.get("handlers") {
            let handlers = handlers.as_object().ok_or_else(|| {
                RunlogError::Backend("`handlers` must be a mapping".to_string())
            })?;
            for (name, spec) in handlers {
                handler_specs.insert(name, spec);
            }
        }

        let mut installed = 0;
        if let Some(loggers) = obj.get("loggers") {
            let loggers = loggers.as_object().ok_or_else(|| {
                RunlogError::Backend("`loggers` must be a mapping".to_string())
            })?;
            for (name, spec) in loggers {
                self.install_logger(name, spec, &handler_specs)?;
                installed += 1;
            }
        }
        if let Some(root) = obj.get("root") {
            self.install_logger(ROOT_LOGGER, root, &handler_specs)?;
            installed += 1;
        }

        debug!(loggers = installed, "Applied tree configuration");
        Ok(())
    }

    /// File-style entrypoint: apply ini text.
    ///
    /// Every section defines one logger named after the section (`root`
    /// addresses the root logger) with `level`, `class`, and either a
    /// `filename` option or an `args` tuple whose first quoted string is the
    /// filename. Sections still carrying the worker prefix are skipped;
    /// they are material for the derived worker configuration only.
    pub fn apply_file(&self, text: &str, disable_existing: bool) -> Result<()> {
        let ini = load_ini(text).map_err(|err| RunlogError::Backend(err.to_string()))?;
        if disable_existing {
            self.tabula_rasa();
        }

        let mut installed = 0;
        for (section, props) in ini.iter() {
            let section = match section {
                Some(name) if !name.starts_with(MULTIPROC_PREFIX) => name,
                _ => continue,
            };
            let logger = if section == "root" { ROOT_LOGGER } else { section };

            let level = match props.get("level") {
                Some(raw) => Some(LogLevel::from_str(raw).map_err(|err| {
                    RunlogError::Backend(format!("section `{}`: {}", section, err))
                })?),
                None => None,
            };
            let class = props.get("class").unwrap_or("StreamHandler");
            let filename = props.get("filename").map(str::to_string).or_else(|| {
                props
                    .get("args")
                    .and_then(|args| extract_string_literals(args).into_iter().next())
            });

            let handler = build_handler(class, level, filename.as_deref())?;
            self.set_level(logger, level);
            self.attach_handler(logger, handler);
            installed += 1;
        }

        debug!(loggers = installed, "Applied file configuration");
        Ok(())
    }

    fn install_logger(
        &self,
        name: &str,
        spec: &Value,
        handler_specs: &HashMap<&str, &Value>,
    ) -> Result<()> {
        let level = parse_level(spec.get("level"))?;
        self.set_level(name, level);

        if let Some(handler_names) = spec.get("handlers").and_then(Value::as_array) {
            for handler_name in handler_names {
                let handler_name = handler_name.as_str().ok_or_else(|| {
                    RunlogError::Backend(format!(
                        "logger `{}`: handler names must be strings",
                        name
                    ))
                })?;
                let handler_spec = handler_specs.get(handler_name).ok_or_else(|| {
                    RunlogError::Backend(format!(
                        "logger `{}` references unknown handler `{}`",
                        name, handler_name
                    ))
                })?;
                let handler = build_handler_from_spec(handler_name, handler_spec)?;
                self.attach_handler(name, handler);
            }
        }
        Ok(())
    }
}

fn parse_level(value: Option<&Value>) -> Result<Option<LogLevel>> {
    match value {
        None => Ok(None),
        Some(value) => {
            let raw = value.as_str().ok_or_else(|| {
                RunlogError::Backend(format!("`level` must be a string, got {}", value))
            })?;
            LogLevel::from_str(raw)
                .map(Some)
                .map_err(|err| RunlogError::Backend(err.to_string()))
        }
    }
}

fn build_handler_from_spec(name: &str, spec: &Value) -> Result<Box<dyn Handler>> {
    let class = spec
        .get("class")
        .and_then(Value::as_str)
        .ok_or_else(|| RunlogError::Backend(format!("handler `{}` lacks a class", name)))?;
    let level = parse_level(spec.get("level"))?;
    let filename = spec.get("filename").and_then(Value::as_str);
    build_handler(class, level, filename)
}

fn build_handler(
    class: &str,
    level: Option<LogLevel>,
    filename: Option<&str>,
) -> Result<Box<dyn Handler>> {
    // Accept the backend-qualified spelling too, e.g. `logging.FileHandler`.
    let class = class.rsplit('.').next().unwrap_or(class);
    match class {
        "StreamHandler" => Ok(Box::new(StreamHandler::new(level))),
        "FileHandler" => {
            let filename = filename.ok_or_else(|| {
                RunlogError::Backend("FileHandler requires a filename".to_string())
            })?;
            let handler = FileHandler::open(filename, level)
                .map_err(|err| RunlogError::Backend(format!("FileHandler `{}`: {}", filename, err)))?;
            Ok(Box::new(handler))
        }
        "NullHandler" => Ok(Box::new(NullHandler)),
        other => Err(RunlogError::Backend(format!("unknown handler class `{}`", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_tree_installs_loggers_and_handlers() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("LOG.txt");
        let registry = Registry::new();

        let tree = json!({
            "version": 1,
            "disable_existing_loggers": false,
            "handlers": {
                "stream": {"class": "StreamHandler"},
                "file_main": {"class": "FileHandler", "filename": log_path.to_str().unwrap()}
            },
            "loggers": {
                "sim": {"level": "INFO", "handlers": ["stream", "file_main"]}
            }
        });

        registry.apply_tree(&tree).unwrap();
        assert_eq!(registry.handler_count(), 2);

        registry.emit("sim", LogLevel::Info, "running");
        registry.tabula_rasa();
        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("running"));
    }

    #[test]
    fn test_apply_tree_rejects_unknown_version() {
        let registry = Registry::new();
        let err = registry.apply_tree(&json!({"version": 2})).unwrap_err();
        assert!(matches!(err, RunlogError::Backend(_)));
    }

    #[test]
    fn test_apply_tree_rejects_unknown_handler_reference() {
        let registry = Registry::new();
        let tree = json!({
            "version": 1,
            "loggers": {"sim": {"handlers": ["missing"]}}
        });
        let err = registry.apply_tree(&tree).unwrap_err();
        assert!(matches!(err, RunlogError::Backend(_)));
    }

    #[test]
    fn test_apply_tree_rejects_unknown_class() {
        let registry = Registry::new();
        let tree = json!({
            "version": 1,
            "handlers": {"h": {"class": "SocketHandler"}},
            "loggers": {"sim": {"handlers": ["h"]}}
        });
        let err = registry.apply_tree(&tree).unwrap_err();
        assert!(matches!(err, RunlogError::Backend(_)));
    }

    #[test]
    fn test_apply_file_skips_worker_sections() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("LOG.txt");
        let registry = Registry::new();

        let text = format!(
            "[main]\nlevel = INFO\nclass = FileHandler\nargs = ('{}', 'a')\n\n\
             [multiproc_main]\nlevel = INFO\nclass = FileHandler\nargs = ('other.txt', 'a')\n",
            log_path.to_str().unwrap()
        );

        registry.apply_file(&text, false).unwrap();
        assert_eq!(registry.handler_count(), 1);
        let mut names = registry.logger_names();
        names.sort();
        assert_eq!(names, vec!["main"]);
    }

    #[test]
    fn test_apply_file_maps_root_section() {
        let registry = Registry::new();
        registry
            .apply_file("[root]\nlevel = DEBUG\nclass = StreamHandler\n", false)
            .unwrap();
        assert_eq!(registry.logger_names(), vec![String::new()]);
    }
}
