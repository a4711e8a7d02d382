//! Optional configuration file (`--config`), JSON or YAML.
//!
//! ```yaml
//! backend: "erp-mcp --db acme"
//! alias_file: aliases.yaml
//! alias_depth: 8
//! banner: true
//! ```
//!
//! Command-line flags override file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::console::DEFAULT_ALIAS_DEPTH;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Backend target: local MCP server command line.
    pub backend: Option<String>,
    /// Alias file for the in-process alias store.
    pub alias_file: Option<PathBuf>,
    pub alias_depth: usize,
    pub banner: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend: None,
            alias_file: None,
            alias_depth: DEFAULT_ALIAS_DEPTH,
            banner: true,
        }
    }
}

impl ConsoleConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&raw, is_yaml(path))
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn parse(raw: &str, yaml: bool) -> Result<Self> {
        if yaml {
            serde_yaml::from_str(raw).context("failed to parse YAML config")
        } else {
            serde_json::from_str(raw).context("failed to parse JSON config")
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_ascii_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_config() {
        let cfg = ConsoleConfig::parse("backend: erp-mcp --db acme\nalias_depth: 3\n", true).unwrap();
        assert_eq!(cfg.backend.as_deref(), Some("erp-mcp --db acme"));
        assert_eq!(cfg.alias_depth, 3);
        assert!(cfg.banner, "unset keys keep defaults");
    }

    #[test]
    fn json_config() {
        let cfg = ConsoleConfig::parse(r#"{"banner": false, "alias_file": "a.json"}"#, false).unwrap();
        assert!(!cfg.banner);
        assert_eq!(cfg.alias_file, Some(PathBuf::from("a.json")));
        assert_eq!(cfg.alias_depth, DEFAULT_ALIAS_DEPTH);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(ConsoleConfig::parse(r#"{"colour": true}"#, false).is_err());
    }

    #[test]
    fn missing_file_has_context() {
        let err = ConsoleConfig::load(Path::new("/nonexistent/console.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn extension_detection() {
        assert!(is_yaml(Path::new("c.YML")));
        assert!(!is_yaml(Path::new("c.json")));
    }
}
