//! HTML results.

use bindery_core::InvocationContext;
use http::header::HeaderValue;
use http::StatusCode;

use crate::response::{build_response, IntoResponse, Response};

/// `text/html; charset=utf-8`
pub const TEXT_HTML_UTF_8: &str = "text/html; charset=utf-8";

/// Writes a string as a `text/html` response.
///
/// `Content-Length` is the UTF-8 byte count, not the character count.
///
/// ```rust
/// use bindery_results::{HtmlResult, IntoResponse};
/// use bindery_core::InvocationContextBuilder;
///
/// let ctx = InvocationContextBuilder::new().build();
/// let response = HtmlResult::new("<p>héllo</p>").into_response(&ctx);
/// assert_eq!(response.headers()["content-length"], "13");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlResult {
    html: String,
    status: StatusCode,
}

impl HtmlResult {
    /// A `200 OK` page.
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            status: StatusCode::OK,
        }
    }

    /// Overrides the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for HtmlResult {
    fn into_response(self, _ctx: &InvocationContext) -> Response {
        build_response(
            self.status,
            Some(HeaderValue::from_static(TEXT_HTML_UTF_8)),
            self.html,
        )
    }
}

/// Escapes text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::InvocationContextBuilder;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE};

    #[test]
    fn test_html_headers() {
        let ctx = InvocationContextBuilder::new().build();
        let response = HtmlResult::new("<h1>Todos ✓</h1>").into_response(&ctx);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT_HTML_UTF_8);
        // "✓" is three bytes in UTF-8.
        assert_eq!(response.headers()[CONTENT_LENGTH], "18");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }
}
