//! The root configuration type.

use std::time::Duration;

use bindery_host::{Environment, ServerConfig};
use bindery_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, HostSection, LogFormat, LoggingSection, ServerSection};

/// Complete configuration of a Bindery service.
///
/// Load it with [`ConfigLoader`](crate::ConfigLoader), then hand the pieces
/// to the host and to logging with [`server_config`](Self::server_config),
/// [`environment`](Self::environment) and [`log_config`](Self::log_config).
///
/// ```
/// use bindery_config::BinderyConfig;
///
/// let config = BinderyConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.host.problem_details);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct BinderyConfig {
    /// Listener and timeouts.
    #[serde(default)]
    pub server: ServerSection,

    /// Application behavior.
    #[serde(default)]
    pub host: HostSection,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl BinderyConfig {
    /// Local development: pretty debug logs, request ids trusted.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection {
                http_addr: "127.0.0.1:8080".to_string(),
                ..ServerSection::default()
            },
            host: HostSection {
                environment: "development".to_string(),
                trust_request_id: true,
                problem_details: true,
            },
            logging: LoggingSection {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
            },
        }
    }

    /// Production: JSON logs at `info`, request ids always generated.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unparsable bind address,
    /// a zero timeout, an unknown environment or a bad log filter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        self.environment()?;

        if self.logging.enabled {
            bindery_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// The host environment named by `host.environment`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown name.
    pub fn environment(&self) -> Result<Environment, ConfigError> {
        self.host
            .environment
            .parse()
            .map_err(|e: bindery_host::UnknownEnvironment| {
                ConfigError::invalid_value("host.environment", e.to_string())
            })
    }

    /// Server settings for [`bindery_host::Server`].
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .http_addr(self.server.http_addr.clone())
            .request_timeout(Duration::from_millis(self.server.request_timeout_ms))
            .shutdown_timeout(Duration::from_secs(self.server.shutdown_timeout_secs))
            .max_body_bytes(usize::try_from(self.server.max_body_bytes).unwrap_or(usize::MAX))
            .build()
    }

    /// Logging settings for [`bindery_telemetry::init_logging`].
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let base = match self.logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            file_line_info: self.logging.include_location,
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(BinderyConfig::default().validate().is_ok());
        assert!(BinderyConfig::development().validate().is_ok());
        assert_eq!(BinderyConfig::production(), BinderyConfig::default());
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = BinderyConfig::default();
        config.server.http_addr = "localhost".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_unknown_environment() {
        let mut config = BinderyConfig::default();
        config.host.environment = "qa".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "host.environment"));
    }

    #[test]
    fn test_environment_mapping() {
        assert_eq!(
            BinderyConfig::development().environment().unwrap(),
            Environment::Development
        );
        assert_eq!(
            BinderyConfig::default().environment().unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn test_server_config_mapping() {
        let mut config = BinderyConfig::default();
        config.server.request_timeout_ms = 1500;
        config.server.shutdown_timeout_secs = 5;
        config.server.max_body_bytes = 4096;

        let server = config.server_config();
        assert_eq!(server.http_addr(), "0.0.0.0:8080");
        assert_eq!(server.request_timeout(), Duration::from_millis(1500));
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(server.max_body_bytes(), 4096);
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let mut config = BinderyConfig::default();
        config.server.max_body_bytes = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "server.max_body_bytes"));
    }

    #[test]
    fn test_log_config_mapping() {
        let log = BinderyConfig::development().log_config();
        assert!(!log.json_format);
        assert_eq!(log.level, "debug");
        assert!(log.file_line_info);

        let log = BinderyConfig::default().log_config();
        assert!(log.json_format);
        assert!(!log.file_line_info);
    }
}
