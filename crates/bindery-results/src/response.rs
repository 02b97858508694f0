//! Response conversion.

use bindery_core::{InvocationContext, RequestError};
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::StatusCode;

/// The response type every result renders into.
pub type Response = http::Response<Bytes>;

/// `text/plain; charset=utf-8`
pub const TEXT_PLAIN_UTF_8: &str = "text/plain; charset=utf-8";

/// Renders a value as an HTTP response.
///
/// Results get the invocation context so they can read request data such as
/// the request id while rendering.
pub trait IntoResponse {
    /// Renders the response.
    fn into_response(self, ctx: &InvocationContext) -> Response;
}

/// What a handler may return.
///
/// Plain results render directly. `Result<R, E>` renders `R` on success and
/// hands `E` to the exception filters otherwise.
pub trait IntoHandlerResponse {
    /// Renders the response or surfaces the request error.
    fn into_handler_response(self, ctx: &InvocationContext) -> Result<Response, RequestError>;
}

impl<R: IntoResponse> IntoHandlerResponse for R {
    fn into_handler_response(self, ctx: &InvocationContext) -> Result<Response, RequestError> {
        Ok(self.into_response(ctx))
    }
}

impl<R, E> IntoHandlerResponse for Result<R, E>
where
    R: IntoResponse,
    E: Into<RequestError>,
{
    fn into_handler_response(self, ctx: &InvocationContext) -> Result<Response, RequestError> {
        self.map(|r| r.into_response(ctx)).map_err(Into::into)
    }
}

/// Builds a response with a status, an optional content type and a body.
///
/// `Content-Length` is set from the body.
pub fn build_response(
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: impl Into<Bytes>,
) -> Response {
    let body = body.into();
    let length = body.len();

    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    let headers = response.headers_mut();
    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE, content_type);
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    response
}

/// A response with `status` and no body.
pub fn empty(status: StatusCode) -> Response {
    build_response(status, None, Bytes::new())
}

impl IntoResponse for Response {
    fn into_response(self, _ctx: &InvocationContext) -> Response {
        self
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self, _ctx: &InvocationContext) -> Response {
        empty(self)
    }
}

impl IntoResponse for () {
    fn into_response(self, _ctx: &InvocationContext) -> Response {
        empty(StatusCode::OK)
    }
}

impl IntoResponse for String {
    fn into_response(self, _ctx: &InvocationContext) -> Response {
        build_response(
            StatusCode::OK,
            Some(HeaderValue::from_static(TEXT_PLAIN_UTF_8)),
            self,
        )
    }
}

impl IntoResponse for &'static str {
    fn into_response(self, _ctx: &InvocationContext) -> Response {
        build_response(
            StatusCode::OK,
            Some(HeaderValue::from_static(TEXT_PLAIN_UTF_8)),
            self,
        )
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self, ctx: &InvocationContext) -> Response {
        let mut response = self.1.into_response(ctx);
        *response.status_mut() = self.0;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::InvocationContextBuilder;

    #[test]
    fn test_string_response() {
        let ctx = InvocationContextBuilder::new().build();
        let response = String::from("hello").into_response(&ctx);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT_PLAIN_UTF_8);
        assert_eq!(response.headers()[CONTENT_LENGTH], "5");
        assert_eq!(response.body().as_ref(), b"hello");
    }

    #[test]
    fn test_status_override() {
        let ctx = InvocationContextBuilder::new().build();
        let response = (StatusCode::ACCEPTED, "queued").into_response(&ctx);

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.body().as_ref(), b"queued");
    }

    #[test]
    fn test_result_error_surfaces() {
        let ctx = InvocationContextBuilder::new().build();
        let result: Result<&'static str, std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));

        let err = result.into_handler_response(&ctx).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "disk on fire");
    }
}
