//! `201 Created` results with a caller-chosen content type.

use bindery_core::{short_type_name, InvocationContext};
use http::header::{HeaderValue, LOCATION};
use http::StatusCode;
use serde::Serialize;

use crate::response::{build_response, empty, IntoResponse, Response};
use crate::xml::to_xml_string;

/// `application/xml`
pub const APPLICATION_XML: &str = "application/xml";

/// Answers `201 Created` with the body in the requested content type.
///
/// An `application/xml` content type renders the value as an XML document
/// whose root element is named after `T`; any other content type renders
/// JSON. The `Content-Type` header is always the one given.
///
/// # Example
///
/// ```rust
/// use bindery_results::{CreatedWithContentType, IntoResponse};
/// use bindery_core::InvocationContextBuilder;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Todo {
///     id: u32,
///     title: String,
/// }
///
/// let ctx = InvocationContextBuilder::new().build();
/// let todo = Todo { id: 1, title: "ship".into() };
/// let response = CreatedWithContentType::new(todo, "application/xml").into_response(&ctx);
///
/// assert_eq!(response.status(), 201);
/// assert!(std::str::from_utf8(response.body()).unwrap().ends_with("<Todo><id>1</id><title>ship</title></Todo>"));
/// ```
#[derive(Debug, Clone)]
pub struct CreatedWithContentType<T> {
    value: T,
    content_type: String,
    location: Option<String>,
}

impl<T: Serialize> CreatedWithContentType<T> {
    /// Creates the result.
    #[must_use]
    pub fn new(value: T, content_type: impl Into<String>) -> Self {
        Self {
            value,
            content_type: content_type.into(),
            location: None,
        }
    }

    /// Sets the `Location` header.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    fn is_xml(&self) -> bool {
        self.content_type
            .parse::<mime::Mime>()
            .is_ok_and(|m| m.essence_str() == APPLICATION_XML)
    }

    fn render_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        if self.is_xml() {
            let root = short_type_name(std::any::type_name::<T>());
            to_xml_string(root, &self.value).map(String::into_bytes)
        } else {
            serde_json::to_vec(&self.value)
        }
    }
}

impl<T: Serialize> IntoResponse for CreatedWithContentType<T> {
    fn into_response(self, _ctx: &InvocationContext) -> Response {
        let content_type = match HeaderValue::try_from(self.content_type.as_str()) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(content_type = %self.content_type, %error, "invalid content type");
                return empty(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let body = match self.render_body() {
            Ok(body) => body,
            Err(error) => {
                tracing::error!(%error, "failed to serialize created result");
                return empty(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let mut response = build_response(StatusCode::CREATED, Some(content_type), body);
        if let Some(location) = self
            .location
            .as_deref()
            .and_then(|l| HeaderValue::try_from(l).ok())
        {
            response.headers_mut().insert(LOCATION, location);
        }
        response
    }
}
