//! JSON results.

use bindery_core::InvocationContext;
use http::header::HeaderValue;
use http::StatusCode;
use serde::Serialize;

use crate::response::{build_response, empty, IntoResponse, Response};

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";

/// Serializes a value as an `application/json` response.
///
/// # Example
///
/// ```rust
/// use bindery_results::{IntoResponse, JsonResult};
/// use bindery_core::InvocationContextBuilder;
///
/// let ctx = InvocationContextBuilder::new().build();
/// let response = JsonResult::new(vec![1, 2, 3]).into_response(&ctx);
///
/// assert_eq!(response.headers()["content-type"], "application/json");
/// assert_eq!(response.body().as_ref(), b"[1,2,3]");
/// ```
#[derive(Debug, Clone)]
pub struct JsonResult<T> {
    value: T,
    status: StatusCode,
}

impl<T: Serialize> JsonResult<T> {
    /// A `200 OK` result.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            status: StatusCode::OK,
        }
    }

    /// Overrides the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The status the result renders with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for JsonResult<T> {
    fn into_response(self, _ctx: &InvocationContext) -> Response {
        json_response(self.status, &self.value)
    }
}

/// Serializes `value` into an `application/json` response with `status`.
///
/// A value that fails to serialize renders as an empty 500.
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => build_response(
            status,
            Some(HeaderValue::from_static(APPLICATION_JSON)),
            body,
        ),
        Err(error) => {
            tracing::error!(%error, "failed to serialize JSON response");
            empty(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::InvocationContextBuilder;
    use std::collections::BTreeMap;

    #[test]
    fn test_with_status() {
        let ctx = InvocationContextBuilder::new().build();
        let mut map = BTreeMap::new();
        map.insert("ok", true);

        let response = JsonResult::new(map)
            .with_status(StatusCode::ACCEPTED)
            .into_response(&ctx);

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn test_unserializable_value_is_500() {
        // JSON object keys must be strings.
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1_u8], 1);

        let response = json_response(StatusCode::OK, &map);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());
    }
}
