//! Whole-query-string binding.

use std::ops::Deref;

use bindery_core::InvocationContext;
use serde::de::DeserializeOwned;

use crate::default::DefaultBindable;
use crate::descriptor::ParameterDescriptor;
use crate::error::{ExtractionError, ExtractionSource};

/// A parameter bound from the whole query string.
///
/// Unlike scalar parameters, which read one named value, `Query<T>`
/// deserializes every pair into `T`. An absent query string deserializes
/// like an empty one, so all-optional structs always bind.
///
/// # Example
///
/// ```rust
/// use bindery_binding::{extract_default, Outcome, ParameterDescriptor, Query};
/// use bindery_core::InvocationContextBuilder;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Paging {
///     #[serde(default)]
///     limit: Option<u32>,
///     #[serde(default)]
///     offset: Option<u32>,
/// }
///
/// let ctx = InvocationContextBuilder::new().uri("/todos?limit=10").build();
/// let outcome = extract_default::<Query<Paging>>(&ctx, &ParameterDescriptor::query("paging"));
///
/// assert_eq!(outcome, Outcome::Success(Query(Paging { limit: Some(10), offset: None })));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    /// Returns the deserialized value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DefaultBindable for Query<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn bind_default(
        ctx: &InvocationContext,
        _parameter: &ParameterDescriptor,
    ) -> Result<Self, ExtractionError> {
        serde_urlencoded::from_str(ctx.query_string().unwrap_or_default())
            .map(Query)
            .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_default;
    use bindery_core::InvocationContextBuilder;
    use http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Search {
        q: String,
        #[serde(default)]
        page: Option<u32>,
    }

    #[test]
    fn test_query_struct() {
        let ctx = InvocationContextBuilder::new()
            .uri("/search?q=rust%20binding&page=2")
            .build();

        let Query(search) = extract_default::<Query<Search>>(&ctx, &ParameterDescriptor::query("s"))
            .into_result()
            .unwrap();
        assert_eq!(search.q, "rust binding");
        assert_eq!(search.page, Some(2));
    }

    #[test]
    fn test_query_missing_required_field() {
        let ctx = InvocationContextBuilder::new().uri("/search?page=2").build();

        let outcome = extract_default::<Query<Search>>(&ctx, &ParameterDescriptor::query("s"));
        assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_query_wrong_type() {
        let ctx = InvocationContextBuilder::new()
            .uri("/search?q=x&page=two")
            .build();

        let outcome = extract_default::<Query<Search>>(&ctx, &ParameterDescriptor::query("s"));
        assert!(outcome.is_failure());
    }
}
