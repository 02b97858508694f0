//! Default value extraction.
//!
//! When no custom binder is registered for a parameter type, the type's
//! [`DefaultBindable`] convention produces the value directly from the
//! request and reports failure as a typed [`ExtractionError`]. The result is
//! returned to the caller as an [`Outcome`]; nothing is stashed in the
//! request and no response state is inspected.
//!
//! Built-in conventions:
//!
//! | Type | Convention |
//! |------|------------|
//! | `String`, integers, floats, `bool`, `char`, `Uuid` | raw value for the parameter name, parsed with `FromStr` |
//! | `Option<T>` | `None` when the value is absent, otherwise `T`'s convention |
//! | [`Json<T>`](crate::Json) | JSON request body |
//! | [`Query<T>`](crate::Query) | whole query string into a struct |

use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use bindery_core::InvocationContext;

use crate::descriptor::{BindingSource, ParameterDescriptor};
use crate::error::{ExtractionError, ExtractionSource};
use crate::outcome::Outcome;

/// A type with a built-in extraction convention.
///
/// Implement this for your own types, or use [`impl_default_bindable!`]
/// for types that parse from a single string with `FromStr`.
///
/// [`impl_default_bindable!`]: crate::impl_default_bindable
pub trait DefaultBindable: Sized + Send + 'static {
    /// Extracts a value for `parameter` from the request.
    fn bind_default(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, ExtractionError>;
}

/// Runs the default convention for `T`.
///
/// # Example
///
/// ```rust
/// use bindery_binding::{extract_default, Outcome, ParameterDescriptor};
/// use bindery_core::InvocationContextBuilder;
/// use http::StatusCode;
///
/// let ctx = InvocationContextBuilder::new().uri("/items?id=42").build();
/// assert_eq!(extract_default::<i32>(&ctx, &ParameterDescriptor::query("id")), Outcome::Success(42));
///
/// let ctx = InvocationContextBuilder::new().uri("/items?id=abc").build();
/// let outcome = extract_default::<i32>(&ctx, &ParameterDescriptor::query("id"));
/// assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
/// ```
pub fn extract_default<T: DefaultBindable>(
    ctx: &InvocationContext,
    parameter: &ParameterDescriptor,
) -> Outcome<T> {
    T::bind_default(ctx, parameter).into()
}

/// Finds the raw string value for a parameter according to its source hint.
pub fn raw_value<'a>(
    ctx: &'a InvocationContext,
    parameter: &ParameterDescriptor,
) -> Result<(Cow<'a, str>, ExtractionSource), ExtractionError> {
    let name = parameter.name();
    let from_route = || {
        ctx.route_values()
            .get(name)
            .map(|v| (Cow::Borrowed(v), ExtractionSource::Route))
    };
    let from_query = || {
        ctx.query_value(name)
            .map(|v| (Cow::Owned(v), ExtractionSource::Query))
    };
    let from_header = || {
        ctx.header(name)
            .map(|v| (Cow::Borrowed(v), ExtractionSource::Header))
    };

    let (found, missing_source) = match parameter.source() {
        BindingSource::Route => (from_route(), ExtractionSource::Route),
        BindingSource::Query => (from_query(), ExtractionSource::Query),
        BindingSource::Header => (from_header(), ExtractionSource::Header),
        BindingSource::Body => {
            let value = std::str::from_utf8(ctx.body()).map_err(|e| {
                ExtractionError::invalid_type(ExtractionSource::Body, name, e.to_string())
            })?;
            let value = value.trim();
            let found = (!value.is_empty()).then(|| (Cow::Borrowed(value), ExtractionSource::Body));
            (found, ExtractionSource::Body)
        }
        BindingSource::Any => (
            from_route().or_else(from_query).or_else(from_header),
            ExtractionSource::Query,
        ),
    };

    found.ok_or_else(|| ExtractionError::missing(missing_source, name))
}

/// Parses the raw value for `parameter` with `FromStr`.
pub fn parse_scalar<T>(
    ctx: &InvocationContext,
    parameter: &ParameterDescriptor,
) -> Result<T, ExtractionError>
where
    T: FromStr,
    T::Err: Display,
{
    let (raw, source) = raw_value(ctx, parameter)?;
    raw.parse::<T>()
        .map_err(|e| ExtractionError::invalid_type(source, parameter.name(), e.to_string()))
}

/// Implements [`DefaultBindable`] for types that parse with `FromStr`.
///
/// ```rust
/// use bindery_binding::impl_default_bindable;
///
/// #[derive(Debug)]
/// struct Sku(String);
///
/// impl std::str::FromStr for Sku {
///     type Err = std::convert::Infallible;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         Ok(Self(s.to_uppercase()))
///     }
/// }
///
/// impl_default_bindable!(Sku);
/// ```
#[macro_export]
macro_rules! impl_default_bindable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::DefaultBindable for $ty {
                fn bind_default(
                    ctx: &$crate::__private::InvocationContext,
                    parameter: &$crate::ParameterDescriptor,
                ) -> ::std::result::Result<Self, $crate::ExtractionError> {
                    $crate::default::parse_scalar::<$ty>(ctx, parameter)
                }
            }
        )*
    };
}

impl_default_bindable!(
    String,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    uuid::Uuid,
);

impl<T: DefaultBindable> DefaultBindable for Option<T> {
    fn bind_default(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, ExtractionError> {
        match T::bind_default(ctx, parameter) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_missing() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::InvocationContextBuilder;
    use http::StatusCode;

    fn ctx(uri: &str) -> InvocationContext {
        InvocationContextBuilder::new().uri(uri).build()
    }

    #[test]
    fn test_query_integer_success() {
        let outcome = extract_default::<i32>(&ctx("/items?id=42"), &ParameterDescriptor::query("id"));
        assert_eq!(outcome, Outcome::Success(42));
    }

    #[test]
    fn test_query_integer_malformed_is_400() {
        let outcome = extract_default::<i32>(&ctx("/items?id=abc"), &ParameterDescriptor::query("id"));
        assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_query_missing_is_400() {
        let outcome = extract_default::<i32>(&ctx("/items"), &ParameterDescriptor::query("id"));
        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert!(failure.reason().contains("missing"));
    }

    #[test]
    fn test_option_missing_is_none() {
        let outcome =
            extract_default::<Option<i32>>(&ctx("/items"), &ParameterDescriptor::query("id"));
        assert_eq!(outcome, Outcome::Success(None));
    }

    #[test]
    fn test_option_malformed_still_fails() {
        let outcome =
            extract_default::<Option<i32>>(&ctx("/items?id=x"), &ParameterDescriptor::query("id"));
        assert!(outcome.is_failure());
    }

    #[test]
    fn test_route_source() {
        let ctx = InvocationContextBuilder::new()
            .uri("/todos/7?id=99")
            .route_value("id", "7")
            .build();

        let route = extract_default::<u64>(&ctx, &ParameterDescriptor::route("id"));
        let any = extract_default::<u64>(&ctx, &ParameterDescriptor::named("id"));
        let query = extract_default::<u64>(&ctx, &ParameterDescriptor::query("id"));

        assert_eq!(route, Outcome::Success(7));
        assert_eq!(any, Outcome::Success(7));
        assert_eq!(query, Outcome::Success(99));
    }

    #[test]
    fn test_header_source() {
        let ctx = InvocationContextBuilder::new()
            .header("x-tenant", "acme")
            .build();

        let outcome = extract_default::<String>(&ctx, &ParameterDescriptor::header("x-tenant"));
        assert_eq!(outcome, Outcome::Success("acme".to_string()));
    }

    #[test]
    fn test_body_scalar() {
        let ctx = InvocationContextBuilder::new().body(" true \n").build();
        let outcome = extract_default::<bool>(&ctx, &ParameterDescriptor::body("flag"));
        assert_eq!(outcome, Outcome::Success(true));
    }

    #[test]
    fn test_uuid() {
        let id = uuid::Uuid::now_v7();
        let ctx = ctx(&format!("/orders?order={id}"));
        let outcome = extract_default::<uuid::Uuid>(&ctx, &ParameterDescriptor::query("order"));
        assert_eq!(outcome, Outcome::Success(id));
    }
}
