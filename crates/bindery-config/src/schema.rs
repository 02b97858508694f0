//! Configuration sections.
//!
//! Every section rejects unknown fields and fills missing ones from its
//! defaults, so a file only needs to name what it changes.

use serde::{Deserialize, Serialize};

/// `[server]`: listener and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address, e.g. `0.0.0.0:8080`.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    bindery_host::DEFAULT_HTTP_ADDR.to_string()
}

fn default_request_timeout_ms() -> u64 {
    bindery_host::DEFAULT_REQUEST_TIMEOUT_SECS * 1000
}

fn default_shutdown_timeout_secs() -> u64 {
    bindery_host::DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

fn default_max_body_bytes() -> u64 {
    bindery_host::DEFAULT_MAX_BODY_BYTES as u64
}

/// `[host]`: application behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    /// `development`, `staging` or `production`.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Reuse an incoming `x-request-id` header instead of generating one.
    #[serde(default)]
    pub trust_request_id: bool,

    /// Register the problem-details exception filter.
    #[serde(default = "default_true")]
    pub problem_details: bool,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            trust_request_id: false,
            problem_details: true,
        }
    }
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_true() -> bool {
    true
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line, human-readable.
    Pretty,
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Turn logging off entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line in each event.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
