//! Key/value configuration sources
//!
//! A stack file looks like:
//!
//! ```yaml
//! config:
//!   gcp-platform:env: dev
//!   gcp-platform:nodeCount: 3
//!   region: us-central1
//! ```
//!
//! Keys may carry a `<namespace>:` prefix; it is stripped on load. A key that
//! ends up set twice after stripping is rejected.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Anything that can answer "what is the value of key K"
pub trait ConfigSource {
    /// Raw value of a key, `None` if unset
    fn get(&self, key: &str) -> Option<String>;

    /// A key that must be present and non-blank
    fn require(&self, key: &str) -> Result<String> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingKey(key.to_string())),
        }
    }

    /// A required integer
    fn require_int(&self, key: &str) -> Result<i64> {
        let value = self.require(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
    }

    /// An optional key; absent resolves to the empty string
    fn get_or_default(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }

    /// An optional boolean
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => match value.trim() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                    reason: "expected 'true' or 'false'".to_string(),
                }),
            },
        }
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

#[derive(Debug, Deserialize)]
struct StackFile {
    #[serde(default)]
    config: BTreeMap<String, serde_yaml::Value>,
}

/// Configuration of one stack, loaded from its YAML file
#[derive(Debug, Clone, Default)]
pub struct StackConfig {
    values: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl StackConfig {
    /// Load from a file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content, &path.display().to_string())?;
        config.path = Some(path.to_path_buf());
        tracing::debug!(
            "Loaded {} configuration keys from {}",
            config.values.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        let file: StackFile = serde_yaml::from_str(content).map_err(|error| ConfigError::Yaml {
            path: origin.to_string(),
            error,
        })?;

        let mut values = BTreeMap::new();
        // Stripped key -> the raw key it came from
        let mut origins: BTreeMap<String, String> = BTreeMap::new();
        for (raw_key, value) in file.config {
            let key = match raw_key.split_once(':') {
                Some((_namespace, key)) => key.to_string(),
                None => raw_key.clone(),
            };

            let value = match value {
                serde_yaml::Value::Null => continue,
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: raw_key,
                        value: format!("{:?}", other),
                        reason: "configuration values must be scalars".to_string(),
                    });
                }
            };
            if let Some(first) = origins.get(&key) {
                return Err(ConfigError::DuplicateKey {
                    key,
                    first: first.clone(),
                    second: raw_key,
                });
            }
            origins.insert(key.clone(), raw_key);
            values.insert(key, value);
        }

        Ok(Self { values, path: None })
    }

    /// File the configuration was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl ConfigSource for StackConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_and_plain_keys() {
        let config = StackConfig::from_yaml(
            r#"
config:
  gcp-platform:env: dev
  gcp-platform:nodeCount: 3
  region: us-central1
  gcp-platform:attachServiceProject: true
"#,
        )
        .unwrap();

        assert_eq!(config.require("env").unwrap(), "dev");
        assert_eq!(config.require_int("nodeCount").unwrap(), 3);
        assert_eq!(config.require("region").unwrap(), "us-central1");
        assert_eq!(config.get_bool("attachServiceProject").unwrap(), Some(true));
    }

    #[test]
    fn test_key_set_both_namespaced_and_plain() {
        let result = StackConfig::from_yaml("config:\n  gcp-platform:env: dev\n  env: prod\n");

        let err = result.unwrap_err();
        match &err {
            ConfigError::DuplicateKey { key, first, second } => {
                assert_eq!(key, "env");
                assert_eq!(first, "env");
                assert_eq!(second, "gcp-platform:env");
            }
            other => panic!("expected DuplicateKey, got {:?}", other),
        }
        assert!(err.to_string().contains("'env' is set more than once"));
    }

    #[test]
    fn test_same_key_in_two_namespaces() {
        let result = StackConfig::from_yaml("config:\n  a:region: x\n  b:region: y\n");
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateKey { key, .. }) if key == "region"
        ));
    }

    #[test]
    fn test_missing_and_blank_keys() {
        let config = StackConfig::from_yaml("config:\n  app: \"  \"\n").unwrap();

        assert!(matches!(
            config.require("env"),
            Err(ConfigError::MissingKey(k)) if k == "env"
        ));
        assert!(matches!(config.require("app"), Err(ConfigError::MissingKey(_))));
        assert_eq!(config.get_or_default("tags"), "");
    }

    #[test]
    fn test_non_integer_is_invalid() {
        let mut config = StackConfig::default();
        config.set("nodeCount", "three");

        match config.require_int("nodeCount") {
            Err(ConfigError::InvalidValue { key, value, .. }) => {
                assert_eq!(key, "nodeCount");
                assert_eq!(value, "three");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_values_rejected() {
        let result = StackConfig::from_yaml("config:\n  ranges:\n    - a\n    - b\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_bad_bool() {
        let mut config = StackConfig::default();
        config.set("attachServiceProject", "yes");
        assert!(config.get_bool("attachServiceProject").is_err());
        assert_eq!(config.get_bool("unset").unwrap(), None);
    }

    #[test]
    fn test_load_records_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gkeflow.dev.yaml");
        std::fs::write(&path, "config:\n  env: dev\n").unwrap();

        let config = StackConfig::load(&path).unwrap();
        assert_eq!(config.path(), Some(path.as_path()));
        assert_eq!(config.get("env"), Some("dev".to_string()));
    }
}
