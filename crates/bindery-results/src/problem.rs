//! RFC 7807 problem details.
//!
//! [`ProblemDetails`] is the wire shape; [`ProblemResult`] renders it with
//! defaults filled in, and [`problem`] builds one from loose parts.

use bindery_core::InvocationContext;
use http::header::HeaderValue;
use http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::{build_response, IntoResponse, Response};

/// `application/problem+json`
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Extension member carrying the request id.
pub const REQUEST_ID_EXTENSION: &str = "requestId";

const VALIDATION_TITLE: &str = "One or more validation errors occurred.";

/// Member names owned by the document itself. Extensions never use them.
pub const STANDARD_MEMBERS: [&str; 6] = ["type", "title", "status", "detail", "instance", "errors"];

fn is_standard_member(name: &str) -> bool {
    STANDARD_MEMBERS.contains(&name)
}

/// A problem details document.
///
/// Extension members are serialized at the top level, after the standard
/// members, in insertion order. Extensions named like a standard member
/// (see [`STANDARD_MEMBERS`]) are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_uri: Option<String>,

    /// Short summary of the problem type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTTP status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI reference identifying this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Field validation errors. Present only on validation problems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<IndexMap<String, Vec<String>>>,

    /// Extension members.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl ProblemDetails {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validation problem from field errors.
    #[must_use]
    pub fn validation(errors: IndexMap<String, Vec<String>>) -> Self {
        Self {
            title: Some(VALIDATION_TITLE.to_string()),
            errors: Some(errors),
            ..Self::default()
        }
    }

    /// Returns `true` for validation problems.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.errors.is_some()
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Adds an extension member, replacing any previous value.
    ///
    /// A name that belongs to a standard member is ignored.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if is_standard_member(&name) {
            tracing::debug!(extension = %name, "ignoring extension named like a standard member");
        } else {
            self.extensions.insert(name, value.into());
        }
        self
    }

    /// Fills in status, title, type and request id where they are unset.
    ///
    /// The status defaults to 400 for validation problems and 500 otherwise.
    /// Title and type come from the per-status defaults when one exists.
    pub fn apply_defaults(&mut self, request_id: impl FnOnce() -> String) {
        let status = *self.status.get_or_insert(if self.is_validation() {
            StatusCode::BAD_REQUEST.as_u16()
        } else {
            StatusCode::INTERNAL_SERVER_ERROR.as_u16()
        });

        if let Some(defaults) = ProblemDefaults::for_status(status) {
            self.title
                .get_or_insert_with(|| defaults.title.to_string());
            self.type_uri
                .get_or_insert_with(|| defaults.type_uri.to_string());
        }

        if !self.extensions.contains_key(REQUEST_ID_EXTENSION) {
            self.extensions
                .insert(REQUEST_ID_EXTENSION.to_string(), Value::String(request_id()));
        }
    }
}

/// Default title and type for a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemDefaults {
    /// Default `title`.
    pub title: &'static str,
    /// Default `type`.
    pub type_uri: &'static str,
}

impl ProblemDefaults {
    /// Looks up the defaults for `status`.
    #[must_use]
    pub const fn for_status(status: u16) -> Option<Self> {
        let (title, type_uri) = match status {
            400 => ("Bad Request", "https://tools.ietf.org/html/rfc7231#section-6.5.1"),
            401 => ("Unauthorized", "https://tools.ietf.org/html/rfc7235#section-3.1"),
            403 => ("Forbidden", "https://tools.ietf.org/html/rfc7231#section-6.5.3"),
            404 => ("Not Found", "https://tools.ietf.org/html/rfc7231#section-6.5.4"),
            405 => (
                "Method Not Allowed",
                "https://tools.ietf.org/html/rfc7231#section-6.5.5",
            ),
            406 => ("Not Acceptable", "https://tools.ietf.org/html/rfc7231#section-6.5.6"),
            409 => ("Conflict", "https://tools.ietf.org/html/rfc7231#section-6.5.8"),
            415 => (
                "Unsupported Media Type",
                "https://tools.ietf.org/html/rfc7231#section-6.5.13",
            ),
            422 => (
                "Unprocessable Entity",
                "https://tools.ietf.org/html/rfc4918#section-11.2",
            ),
            500 => (
                "An error occurred while processing your request.",
                "https://tools.ietf.org/html/rfc7231#section-6.6.1",
            ),
            _ => return None,
        };
        Some(Self { title, type_uri })
    }
}

/// Renders a [`ProblemDetails`] document as `application/problem+json`.
///
/// Unset members are defaulted with [`ProblemDetails::apply_defaults`],
/// using the request's id.
#[derive(Debug, Clone)]
pub struct ProblemResult {
    details: ProblemDetails,
}

impl ProblemResult {
    /// Wraps a document.
    #[must_use]
    pub fn new(details: ProblemDetails) -> Self {
        Self { details }
    }

    /// The document as it stands before defaults are applied.
    #[must_use]
    pub fn details(&self) -> &ProblemDetails {
        &self.details
    }
}

impl From<ProblemDetails> for ProblemResult {
    fn from(details: ProblemDetails) -> Self {
        Self::new(details)
    }
}

impl IntoResponse for ProblemResult {
    fn into_response(self, ctx: &InvocationContext) -> Response {
        let mut details = self.details;
        details.apply_defaults(|| ctx.request_id().to_string());
        write_problem(details)
    }
}

/// Serializes a finished document as `application/problem+json`.
pub(crate) fn write_problem(mut details: ProblemDetails) -> Response {
    details.extensions.retain(|name, _| !is_standard_member(name));

    let status = details
        .status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match serde_json::to_vec(&details) {
        Ok(body) => build_response(
            status,
            Some(HeaderValue::from_static(APPLICATION_PROBLEM_JSON)),
            body,
        ),
        Err(error) => {
            tracing::error!(%error, "failed to serialize problem details");
            crate::response::empty(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Builds a problem result from its parts.
///
/// Every part is optional; see [`ProblemDetails::apply_defaults`] for what
/// is filled in when the result renders.
///
/// # Example
///
/// ```rust
/// use bindery_results::{problem, IntoResponse};
/// use bindery_core::InvocationContextBuilder;
///
/// let ctx = InvocationContextBuilder::new().build();
/// let response = problem(Some("Todo 12 does not exist"), None, Some(404), None, None, None)
///     .into_response(&ctx);
///
/// assert_eq!(response.status(), 404);
/// let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
/// assert_eq!(body["title"], "Not Found");
/// assert!(body["requestId"].is_string());
/// ```
#[must_use]
pub fn problem(
    detail: Option<&str>,
    instance: Option<&str>,
    status: Option<u16>,
    title: Option<&str>,
    type_uri: Option<&str>,
    extensions: Option<IndexMap<String, String>>,
) -> ProblemResult {
    let details = ProblemDetails {
        type_uri: type_uri.map(str::to_string),
        title: title.map(str::to_string),
        status,
        detail: detail.map(str::to_string),
        instance: instance.map(str::to_string),
        errors: None,
        extensions: extensions
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    };
    ProblemResult::new(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::InvocationContextBuilder;
    use http::header::CONTENT_TYPE;

    fn render(result: ProblemResult) -> (Response, Value) {
        let ctx = InvocationContextBuilder::new().build();
        let response = result.into_response(&ctx);
        let body = serde_json::from_slice(response.body()).unwrap();
        (response, body)
    }

    #[test]
    fn test_defaults_to_500() {
        let (response, body) = render(problem(None, None, None, None, None, None));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_PROBLEM_JSON);
        assert_eq!(body["status"], 500);
        assert_eq!(body["title"], "An error occurred while processing your request.");
        assert_eq!(body["type"], "https://tools.ietf.org/html/rfc7231#section-6.6.1");
    }

    #[test]
    fn test_validation_defaults_to_400() {
        let mut errors = IndexMap::new();
        errors.insert("title".to_string(), vec!["required".to_string()]);

        let (response, body) = render(ProblemDetails::validation(errors).into());

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body["title"], VALIDATION_TITLE);
        assert_eq!(body["type"], "https://tools.ietf.org/html/rfc7231#section-6.5.1");
        assert_eq!(body["errors"]["title"][0], "required");
    }

    #[test]
    fn test_explicit_members_are_kept() {
        let (_, body) = render(problem(
            Some("nope"),
            Some("/todos/9"),
            Some(409),
            Some("Already done"),
            Some("urn:todo:done"),
            None,
        ));

        assert_eq!(body["title"], "Already done");
        assert_eq!(body["type"], "urn:todo:done");
        assert_eq!(body["instance"], "/todos/9");
        assert_eq!(body["detail"], "nope");
    }

    #[test]
    fn test_status_without_defaults() {
        let (response, body) = render(problem(None, None, Some(418), None, None, None));

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(body.get("title").is_none());
        assert!(body.get("type").is_none());
    }

    #[test]
    fn test_request_id_not_overwritten() {
        let mut extensions = IndexMap::new();
        extensions.insert(REQUEST_ID_EXTENSION.to_string(), "fixed".to_string());

        let (_, body) = render(problem(None, None, Some(400), None, None, Some(extensions)));
        assert_eq!(body[REQUEST_ID_EXTENSION], "fixed");
    }

    #[test]
    fn test_extensions_cannot_shadow_standard_members() {
        let extensions = IndexMap::from([
            ("status".to_string(), "teapot".to_string()),
            ("title".to_string(), "shadow".to_string()),
            ("hint".to_string(), "kept".to_string()),
        ]);

        let (response, body) = render(problem(None, None, Some(404), None, None, Some(extensions)));
        let text = std::str::from_utf8(response.body()).unwrap();

        assert_eq!(text.matches("\"status\"").count(), 1);
        assert_eq!(text.matches("\"title\"").count(), 1);
        assert_eq!(body["status"], 404);
        assert_eq!(body["title"], "Not Found");
        assert_eq!(body["hint"], "kept");
    }

    #[test]
    fn test_with_extension_ignores_standard_names() {
        let details = ProblemDetails::new()
            .with_extension("detail", "shadow")
            .with_extension("traceId", "abc");

        assert!(!details.extensions.contains_key("detail"));
        assert_eq!(details.extensions["traceId"], "abc");
    }

    #[test]
    fn test_request_id_added() {
        let ctx = InvocationContextBuilder::new().build();
        let expected = ctx.request_id().to_string();

        let response = problem(None, None, Some(404), None, None, None).into_response(&ctx);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body[REQUEST_ID_EXTENSION], expected.as_str());
    }
}
