//! Typed configuration for Bindery services.
//!
//! - TOML and JSON files, merged field by field over a preset
//! - `PREFIX__SECTION__KEY` environment overrides, typed by the field
//! - unknown fields rejected, values validated after loading
//!
//! ```no_run
//! use bindery_config::ConfigLoader;
//!
//! # fn main() -> Result<(), bindery_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("bindery.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("BINDERY")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_ms = 30000
//! shutdown_timeout_secs = 30
//! max_body_bytes = 2097152
//!
//! [host]
//! environment = "production"
//! trust_request_id = false
//! problem_details = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! include_location = false
//! ```

#![doc(html_root_url = "https://docs.rs/bindery-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::BinderyConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{HostSection, LogFormat, LoggingSection, ServerSection};
