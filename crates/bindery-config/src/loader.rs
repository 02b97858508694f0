//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::{BinderyConfig, ConfigError};

/// Builds a [`BinderyConfig`] from layers, later layers overriding earlier
/// ones field by field:
///
/// 1. a preset (defaults, development or production)
/// 2. configuration files and strings (TOML or JSON)
/// 3. environment variables `PREFIX__SECTION__KEY`
///
/// ```
/// use bindery_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_development()
///     .with_string("[server]\nrequest_timeout_ms = 500", "toml")
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.server.http_addr, "127.0.0.1:8080");
/// assert_eq!(config.server.request_timeout_ms, 500);
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: BinderyConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from [`BinderyConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: BinderyConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = BinderyConfig::default();
        self
    }

    /// Resets to the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = BinderyConfig::development();
        self
    }

    /// Resets to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = BinderyConfig::production();
        self
    }

    /// Merges a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed, has an
    /// unsupported extension or names an unknown field.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        tracing::debug!(path = %path.display(), "loading configuration file");
        self.with_string(&content, format)
    }

    /// Merges a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) once the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merges configuration text in `format` (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Fails on malformed content, an unknown format or an unknown field.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Enables environment overrides named `PREFIX__SECTION__KEY`.
    ///
    /// With prefix `BINDERY`, `BINDERY__HOST__ENVIRONMENT=development` sets
    /// `host.environment`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads a `.env` file from the working directory, if there is one.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::Dotenv(e.to_string())),
        }
        Ok(self)
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails on an unusable environment variable or an invalid result.
    pub fn load(self) -> Result<BinderyConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    ///
    /// # Errors
    ///
    /// Fails on an unusable environment variable.
    pub fn load_unvalidated(mut self) -> Result<BinderyConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(key, _)| key.starts_with(&format!("{prefix}__")))
                .collect();
            self.apply_env_overrides(&prefix, vars)?;
        }
        Ok(self.config)
    }

    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        let mut tree = serde_json::to_value(&self.config)?;

        for (key, raw) in vars {
            let path: Vec<String> = key
                .strip_prefix(prefix)
                .and_then(|k| k.strip_prefix("__"))
                .ok_or_else(|| ConfigError::env_parse_error(&key, "invalid key format"))?
                .split("__")
                .map(str::to_ascii_lowercase)
                .collect();

            let slot = path
                .iter()
                .try_fold(&mut tree, |node, part| node.get_mut(part.as_str()))
                .ok_or_else(|| ConfigError::env_parse_error(&key, "unknown configuration key"))?;

            *slot = match &*slot {
                Value::Bool(_) => Value::Bool(
                    parse_bool(&raw)
                        .ok_or_else(|| ConfigError::env_parse_error(&key, "expected boolean"))?,
                ),
                Value::Number(_) => Value::Number(
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::env_parse_error(&key, "expected integer"))?
                        .into(),
                ),
                Value::String(_) => Value::String(raw),
                _ => {
                    return Err(ConfigError::env_parse_error(
                        &key,
                        "not a scalar configuration value",
                    ))
                }
            };
            tracing::debug!(var = %key, "applied environment override");
        }

        self.config = serde_json::from_value(tree)
            .map_err(|e| ConfigError::env_parse_error(prefix, e.to_string()))?;
        Ok(())
    }
}

/// Overlays `layer` onto `base`; tables merge recursively, everything else
/// is replaced.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => merge_maps(base, layer),
        (base, layer) => *base = layer,
    }
}

fn merge_maps(base: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        match base.get_mut(&key) {
            Some(existing) => merge(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_layers_keep_unset_fields() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string(r#"{"logging": {"format": "json"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.host.environment, "development");
    }

    #[test]
    fn test_unknown_field_in_layer_rejected() {
        let result = ConfigLoader::new().with_string("[server]\nport = 80", "toml");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_env_overrides_are_typed() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_overrides(
                "APP",
                vars(&[
                    ("APP__SERVER__REQUEST_TIMEOUT_MS", "250"),
                    ("APP__HOST__TRUST_REQUEST_ID", "yes"),
                    ("APP__HOST__ENVIRONMENT", "staging"),
                    ("APP__LOGGING__FORMAT", "pretty"),
                ]),
            )
            .unwrap();

        let config = loader.load_unvalidated().unwrap();
        assert_eq!(config.server.request_timeout_ms, 250);
        assert!(config.host.trust_request_id);
        assert_eq!(config.host.environment, "staging");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_env_override_errors() {
        let err = ConfigLoader::new()
            .apply_env_overrides("APP", vars(&[("APP__SERVER__REQUEST_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("expected integer"));

        let err = ConfigLoader::new()
            .apply_env_overrides("APP", vars(&[("APP__SERVER__PORT", "80")]))
            .unwrap_err();
        assert!(err.to_string().contains("unknown configuration key"));

        let err = ConfigLoader::new()
            .apply_env_overrides("APP", vars(&[("APP__HOST", "x")]))
            .unwrap_err();
        assert!(err.to_string().contains("not a scalar"));

        let err = ConfigLoader::new()
            .apply_env_overrides("APP", vars(&[("APP__LOGGING__FORMAT", "xml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
