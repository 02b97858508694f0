//! Extraction error types.

use http::StatusCode;
use std::fmt;
use thiserror::Error;

use crate::outcome::BindingFailure;

/// Part of the request a value was being extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Route values.
    Route,
    /// Query string.
    Query,
    /// Request body.
    Body,
    /// Request headers.
    Header,
    /// The `Content-Type` header specifically.
    ContentType,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route => write!(f, "route"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::Header => write!(f, "header"),
            Self::ContentType => write!(f, "content-type"),
        }
    }
}

/// A default extraction convention could not produce a value.
///
/// # Example
///
/// ```rust
/// use bindery_binding::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::invalid_type(ExtractionSource::Query, "id", "invalid digit found in string");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert!(err.to_string().contains("'id'"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    Missing,
    InvalidType,
    DeserializationFailed,
    PayloadTooLarge,
    UnsupportedMediaType,
}

impl ExtractionError {
    /// A required value is absent.
    #[must_use]
    pub fn missing(source: ExtractionSource, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            message: format!("missing required {source} value: {field}"),
            field: Some(field),
        }
    }

    /// A value is present but does not parse as the target type.
    #[must_use]
    pub fn invalid_type(
        source: ExtractionSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::InvalidType,
            message: format!("invalid {source} value '{field}': {details}"),
            field: Some(field),
        }
    }

    /// A structured payload failed to deserialize.
    #[must_use]
    pub fn deserialization_failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to deserialize {source}: {error}"),
            field: None,
        }
    }

    /// The body exceeds the extraction limit.
    #[must_use]
    pub fn payload_too_large(max_size: usize, actual_size: usize) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {max_size} bytes, got {actual_size} bytes"),
            field: None,
        }
    }

    /// The body's content type is not one the convention reads.
    #[must_use]
    pub fn unsupported_media_type(expected: &str, actual: Option<&str>) -> Self {
        let actual = actual.unwrap_or("none");
        Self {
            extraction_source: ExtractionSource::ContentType,
            kind: ExtractionErrorKind::UnsupportedMediaType,
            message: format!("unsupported content type: expected '{expected}', got '{actual}'"),
            field: None,
        }
    }

    /// Where extraction was looking.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// The field name, if the error concerns one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns `true` when the value was absent rather than malformed.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.kind == ExtractionErrorKind::Missing
    }

    /// The status code a request failing this way is answered with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ExtractionErrorKind::Missing
            | ExtractionErrorKind::InvalidType
            | ExtractionErrorKind::DeserializationFailed => StatusCode::BAD_REQUEST,
            ExtractionErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ExtractionErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    /// Converts into a binding failure carrying the same status.
    #[must_use]
    pub fn into_failure(self) -> BindingFailure {
        BindingFailure::new(self.status_code(), self.message)
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}

/// A handler asked for a service that was never registered.
#[derive(Debug, Clone, Error)]
#[error("service {type_name} is not registered")]
pub struct MissingService {
    /// The requested service type.
    pub type_name: &'static str,
}

/// A [`Custom<T>`](crate::Custom) parameter found no binder for `T`.
#[derive(Debug, Clone, Error)]
#[error("no parameter binder is registered for {type_name}")]
pub struct MissingBinder {
    /// The parameter's target type.
    pub type_name: &'static str,
}
