//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// Name of the configuration file looked up in the workspace.
pub const CONFIG_FILE: &str = "uiml.config.json";

/// Extension of markup files when the configuration names none.
pub const DEFAULT_EXTENSION: &str = ".xmlui";

/// Configuration errors.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid configuration in {path}: {source}")]
    #[diagnostic(help("see the `extensions`, `exclude` and `compile` keys"))]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Checker configuration (`uiml.config.json`).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// File extensions to check.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns to exclude, relative to the workspace.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Compile options.
    #[serde(default)]
    pub compile: CompileConfig,
}

/// The `compile` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompileConfig {
    /// Parse event handlers and methods.
    #[serde(default = "default_true")]
    pub parse_events: bool,

    /// Fold constant subexpressions.
    #[serde(default)]
    pub simplify: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            parse_events: true,
            simplify: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, `uiml.config.json` in the
    /// workspace is used if present, and defaults otherwise.
    pub fn load(workspace: &Utf8Path, path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => {
                let path = workspace.join(CONFIG_FILE);
                if !path.exists() {
                    log::debug!("no {CONFIG_FILE} in {workspace}, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        log::debug!("loaded configuration from {path}");
        Ok(config)
    }

    /// Returns the file extensions to check.
    pub fn file_extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            vec![DEFAULT_EXTENSION]
        } else {
            self.extensions.iter().map(String::as_str).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_extensions() {
        let config = Config::default();
        assert_eq!(config.file_extensions(), vec![".xmlui"]);
        assert!(config.compile.parse_events);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let (_dir, root) = workspace();
        assert_eq!(Config::load(&root, None).unwrap(), Config::default());
    }

    #[test]
    fn test_load_workspace_config() {
        let (_dir, root) = workspace();
        fs::write(
            root.join(CONFIG_FILE),
            r#"{
                "extensions": [".xmlui", ".uiml"],
                "exclude": ["generated/**"],
                "compile": { "simplify": true }
            }"#,
        )
        .unwrap();

        let config = Config::load(&root, None).unwrap();
        assert_eq!(config.file_extensions(), vec![".xmlui", ".uiml"]);
        assert_eq!(config.exclude, vec!["generated/**"]);
        assert!(config.compile.simplify);
        assert!(config.compile.parse_events);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let (_dir, root) = workspace();
        let error = Config::load(&root, Some(&root.join("other.json"))).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let (_dir, root) = workspace();
        fs::write(root.join(CONFIG_FILE), r#"{ "extension": [".x"] }"#).unwrap();
        let error = Config::load(&root, None).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().starts_with("invalid configuration in"));
    }
}
