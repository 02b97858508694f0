//! Error taxonomy.
//!
//! - [`BadRequestError`]: the request itself is unusable (malformed or missing
//!   input). Carries the specific status to answer with.
//! - [`RequestError`]: anything that terminates a request before a response is
//!   produced. Keeps the originating error's type name, message, status and a
//!   captured backtrace for diagnostics.
//! - [`StartupError`]: misconfiguration detected while building the
//!   application. Fatal; no request is served.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// Non-standard status used when the client went away before a response.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// The request cannot be processed as sent.
///
/// # Example
///
/// ```rust
/// use bindery_core::BadRequestError;
/// use http::StatusCode;
///
/// let err = BadRequestError::new(StatusCode::BAD_REQUEST, "Bad request");
/// assert_eq!(err.status(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.to_string(), "Bad request");
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BadRequestError {
    status: StatusCode,
    message: String,
    reason: Option<String>,
}

impl BadRequestError {
    /// Creates an error answered with `status`.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            reason: None,
        }
    }

    /// Attaches the underlying reason (kept out of the display message).
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The status code the request must be answered with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The underlying reason, if one was attached.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// Marker error for requests aborted by the host.
#[derive(Debug, Clone, Copy, Error)]
#[error("the request was aborted")]
pub struct RequestAborted;

/// An error that terminates request processing.
///
/// Any `std::error::Error` converts into a `RequestError` with `?`, capturing
/// its type name and a backtrace. A [`BadRequestError`] keeps its status; every
/// other error maps to 500.
///
/// # Example
///
/// ```rust
/// use bindery_core::RequestError;
/// use http::StatusCode;
///
/// fn parse(raw: &str) -> Result<i32, RequestError> {
///     Ok(raw.parse::<i32>()?)
/// }
///
/// let err = parse("abc").unwrap_err();
/// assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(err.short_type_name(), "ParseIntError");
/// ```
pub struct RequestError {
    type_name: &'static str,
    message: String,
    status: StatusCode,
    bad_request: Option<BadRequestError>,
    aborted: bool,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl RequestError {
    /// Wraps an arbitrary error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let any: &dyn Any = &error;
        let bad_request = any.downcast_ref::<BadRequestError>().cloned();
        let aborted = any.is::<RequestAborted>();
        let status = match (&bad_request, aborted) {
            (Some(bad), _) => bad.status(),
            (None, true) => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::BAD_REQUEST),
            (None, false) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            type_name: std::any::type_name::<E>(),
            message: error.to_string(),
            status,
            bad_request,
            aborted,
            source: Some(Box::new(error)),
            backtrace: Backtrace::capture(),
        }
    }

    /// Wraps an `anyhow::Error`, keeping a [`BadRequestError`] status if the
    /// chain carries one.
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        let bad_request = error.downcast_ref::<BadRequestError>().cloned();
        let status = bad_request
            .as_ref()
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, BadRequestError::status);

        Self {
            type_name: std::any::type_name::<anyhow::Error>(),
            message: error.to_string(),
            status,
            bad_request,
            aborted: false,
            source: Some(error.into()),
            backtrace: Backtrace::capture(),
        }
    }

    /// A request that must be answered with `status`.
    pub fn bad_request(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(BadRequestError::new(status, message))
    }

    /// A request the host aborted.
    pub fn aborted() -> Self {
        Self::new(RequestAborted)
    }

    /// Fully qualified type name of the originating error.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Unqualified type name of the originating error.
    #[must_use]
    pub fn short_type_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    /// The originating error's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status code to answer with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The bad-request error this was built from, if any.
    #[must_use]
    pub fn as_bad_request(&self) -> Option<&BadRequestError> {
        self.bad_request.as_ref()
    }

    /// Returns `true` for requests aborted by the host.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// The originating error.
    #[must_use]
    pub fn source(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// The backtrace captured at construction, when capturing is enabled
    /// (`RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`).
    #[must_use]
    pub fn stack(&self) -> Option<String> {
        match self.backtrace.status() {
            BacktraceStatus::Captured => Some(self.backtrace.to_string()),
            _ => None,
        }
    }
}

impl<E> From<E> for RequestError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.short_type_name(), self.message)
    }
}

impl fmt::Debug for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestError")
            .field("type_name", &self.type_name)
            .field("message", &self.message)
            .field("status", &self.status)
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

/// Strips the module path and generic arguments from a type name.
///
/// ```rust
/// use bindery_core::short_type_name;
///
/// assert_eq!(short_type_name("core::num::error::ParseIntError"), "ParseIntError");
/// assert_eq!(short_type_name("alloc::vec::Vec<u8>"), "Vec");
/// ```
#[must_use]
pub fn short_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Misconfiguration detected while building an application.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Two parameter binders were registered for the same type.
    #[error("a parameter binder for {type_name} is already registered")]
    DuplicateBinder {
        /// The target type of the conflicting binders.
        type_name: &'static str,
    },

    /// Two services of the same type were registered.
    #[error("a service of type {type_name} is already registered")]
    DuplicateService {
        /// The conflicting service type.
        type_name: &'static str,
    },

    /// Two endpoints share a method and pattern.
    #[error("route {method} {pattern} is registered more than once")]
    DuplicateRoute {
        /// HTTP method.
        method: String,
        /// Route pattern.
        pattern: String,
    },

    /// A route pattern cannot be parsed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidRoutePattern {
        /// The offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An endpoint takes a parameter that only a custom binder can produce,
    /// and none is registered for its type.
    #[error("endpoint {endpoint} needs a parameter binder for {type_name}, but none is registered")]
    MissingBinder {
        /// Endpoint display name.
        endpoint: String,
        /// The type without a binder.
        type_name: &'static str,
    },

    /// An endpoint declares a different number of parameter descriptors than
    /// its handler takes.
    #[error("endpoint {endpoint} handler takes {expected} parameters but {actual} were described")]
    ParameterCountMismatch {
        /// Endpoint display name.
        endpoint: String,
        /// Parameters taken by the handler.
        expected: usize,
        /// Descriptors supplied.
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_keeps_status() {
        let err = RequestError::bad_request(StatusCode::BAD_REQUEST, "Bad request");

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Bad request");
        assert_eq!(err.short_type_name(), "BadRequestError");
        assert!(err.type_name().ends_with("::BadRequestError"));
        assert!(err.as_bad_request().is_some());
    }

    #[test]
    fn test_bad_request_reason_not_in_message() {
        let bad = BadRequestError::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Bad request")
            .with_reason("expected application/json");
        let err = RequestError::new(bad);

        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.message(), "Bad request");
        assert_eq!(
            err.as_bad_request().and_then(BadRequestError::reason),
            Some("expected application/json")
        );
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = RequestError::from(io);

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.short_type_name(), "Error");
        assert_eq!(err.to_string(), "Error: disk on fire");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_anyhow_finds_bad_request_in_chain() {
        let err = anyhow::Error::new(BadRequestError::new(StatusCode::NOT_FOUND, "gone"))
            .context("loading todo");
        let err = RequestError::from_anyhow(err);

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "loading todo");
    }

    #[test]
    fn test_aborted() {
        let err = RequestError::aborted();
        assert!(err.is_aborted());
        assert_eq!(err.status().as_u16(), 499);
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(short_type_name("a::b::C<d::E>"), "C");
    }

    #[test]
    fn test_startup_error_display() {
        let err = StartupError::DuplicateBinder { type_name: "app::Widget" };
        assert_eq!(
            err.to_string(),
            "a parameter binder for app::Widget is already registered"
        );
    }
}
