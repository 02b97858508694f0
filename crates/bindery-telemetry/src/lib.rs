//! Structured logging for Bindery services.
//!
//! Binding failures, exception filter decisions and request completion are
//! all logged through `tracing`. This crate installs the subscriber that
//! turns those events into output:
//!
//! - **Development**: pretty, colored, `debug` level, with span events
//! - **Production**: JSON lines at `info`
//!
//! `RUST_LOG` overrides the configured level unless
//! [`LogConfig::env_override`] is turned off.
//!
//! # Example
//!
//! ```rust,no_run
//! use bindery_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), bindery_telemetry::TelemetryError> {
//!     init_logging(&LogConfig::production())?;
//!     tracing::info!("service started");
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/bindery-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
