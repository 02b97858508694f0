//! Binding outcomes.

use http::StatusCode;
use std::fmt;

use crate::error::ExtractionError;

/// Why a parameter could not be bound, and the status to answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingFailure {
    status: StatusCode,
    reason: String,
}

impl BindingFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// The status code the request must be answered with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// A human readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for BindingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reason, self.status)
    }
}

/// Result of one binding attempt for one parameter of one request.
///
/// # Example
///
/// ```rust
/// use bindery_binding::Outcome;
/// use http::StatusCode;
///
/// let ok: Outcome<i32> = Outcome::Success(42);
/// assert_eq!(ok.status(), StatusCode::OK);
///
/// let failed: Outcome<i32> = Outcome::failure(StatusCode::BAD_REQUEST, "invalid id");
/// assert_eq!(failed.status(), StatusCode::BAD_REQUEST);
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The parameter was bound.
    Success(T),
    /// The parameter could not be bound.
    Failure(BindingFailure),
}

impl<T> Outcome<T> {
    /// Shorthand for a failure.
    pub fn failure(status: StatusCode, reason: impl Into<String>) -> Self {
        Self::Failure(BindingFailure::new(status, reason))
    }

    /// Returns `true` on success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns `true` on failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// `200 OK` on success, the failure's status otherwise.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::Failure(failure) => failure.status(),
        }
    }

    /// Maps the bound value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<T, BindingFailure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T, ExtractionError>> for Outcome<T> {
    fn from(result: Result<T, ExtractionError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err.into_failure()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionSource;

    #[test]
    fn test_map_preserves_failure() {
        let outcome: Outcome<i32> = Outcome::failure(StatusCode::UNPROCESSABLE_ENTITY, "nope");
        let mapped = outcome.map(|v| v * 2);

        assert!(mapped.is_failure());
        assert_eq!(mapped.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_from_extraction_result() {
        let outcome: Outcome<i32> =
            Err(ExtractionError::missing(ExtractionSource::Query, "id")).into();
        let failure = outcome.into_result().unwrap_err();

        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert!(failure.reason().contains("id"));
    }
}
