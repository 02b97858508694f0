//! JSON body binding.

use std::ops::Deref;

use bindery_core::InvocationContext;
use serde::de::DeserializeOwned;

use crate::default::DefaultBindable;
use crate::descriptor::ParameterDescriptor;
use crate::error::{ExtractionError, ExtractionSource};

/// Largest body the JSON convention reads (1 MiB).
pub const MAX_JSON_BODY_SIZE: usize = 1024 * 1024;

/// A parameter bound from a JSON request body.
///
/// The body must be non-empty, at most [`MAX_JSON_BODY_SIZE`] bytes, and, if a
/// `Content-Type` is sent, it must be `application/json` or a `+json` type.
/// Use `Option<Json<T>>` to accept an empty body.
///
/// # Example
///
/// ```rust
/// use bindery_binding::{extract_default, Json, Outcome, ParameterDescriptor};
/// use bindery_core::InvocationContextBuilder;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct NewTodo {
///     title: String,
/// }
///
/// let ctx = InvocationContextBuilder::new()
///     .method(http::Method::POST)
///     .header("content-type", "application/json")
///     .body(r#"{"title":"write docs"}"#)
///     .build();
///
/// let outcome = extract_default::<Json<NewTodo>>(&ctx, &ParameterDescriptor::body("todo"));
/// let Outcome::Success(Json(todo)) = outcome else { panic!() };
/// assert_eq!(todo.title, "write docs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Returns the deserialized value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DefaultBindable for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn bind_default(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, ExtractionError> {
        let body = ctx.body();
        if body.is_empty() {
            return Err(ExtractionError::missing(
                ExtractionSource::Body,
                parameter.name(),
            ));
        }

        check_content_type(ctx.content_type())?;

        if body.len() > MAX_JSON_BODY_SIZE {
            return Err(ExtractionError::payload_too_large(
                MAX_JSON_BODY_SIZE,
                body.len(),
            ));
        }

        serde_json::from_slice(body).map(Json).map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string())
        })
    }
}

fn check_content_type(content_type: Option<&str>) -> Result<(), ExtractionError> {
    let Some(raw) = content_type else {
        return Ok(());
    };

    let is_json = raw.parse::<mime::Mime>().is_ok_and(|m| {
        (m.type_() == mime::APPLICATION && m.subtype() == mime::JSON)
            || m.suffix() == Some(mime::JSON)
    });

    if is_json {
        Ok(())
    } else {
        Err(ExtractionError::unsupported_media_type(
            mime::APPLICATION_JSON.as_ref(),
            Some(raw),
        ))
    }
}
