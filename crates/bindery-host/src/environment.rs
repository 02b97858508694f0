//! Hosting environment.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The environment an application runs in.
///
/// Only [`Environment::Development`] renders the developer exception page;
/// every other environment answers unhandled errors with a bare status.
///
/// # Example
///
/// ```rust
/// use bindery_host::Environment;
///
/// let env: Environment = "Development".parse().unwrap();
/// assert!(env.is_development());
/// assert_eq!(env.to_string(), "development");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Local development.
    Development,
    /// Pre-production.
    Staging,
    /// Production.
    #[default]
    Production,
}

impl Environment {
    /// Returns `true` for [`Environment::Development`].
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown environment name.
#[derive(Debug, Clone, Error)]
#[error("unknown environment '{0}', expected development, staging or production")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}
