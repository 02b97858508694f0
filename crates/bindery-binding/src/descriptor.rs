//! Bindable parameter descriptors.

use std::borrow::Cow;
use std::fmt;

/// Where the default convention looks for a parameter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingSource {
    /// Route values captured from `{name}` segments.
    Route,
    /// Query string.
    Query,
    /// A request header named after the parameter.
    Header,
    /// The request body.
    Body,
    /// Route values, then query string, then headers.
    #[default]
    Any,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route => write!(f, "route"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Body => write!(f, "body"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// Describes one handler parameter: its name, position, source hint and
/// target type.
///
/// Descriptors are built once when an endpoint is registered and shared by
/// every invocation of that endpoint.
///
/// # Example
///
/// ```rust
/// use bindery_binding::{BindingSource, ParameterDescriptor};
///
/// let id = ParameterDescriptor::query("id").with_position(0).with_type::<i32>();
///
/// assert_eq!(id.name(), "id");
/// assert_eq!(id.source(), BindingSource::Query);
/// assert_eq!(id.type_name(), "i32");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: Cow<'static, str>,
    position: usize,
    source: BindingSource,
    type_name: &'static str,
}

impl ParameterDescriptor {
    /// Creates a descriptor for `name` read from `source`.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, source: BindingSource) -> Self {
        Self {
            name: name.into(),
            position: 0,
            source,
            type_name: "_",
        }
    }

    /// A parameter read from route values.
    #[must_use]
    pub fn route(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, BindingSource::Route)
    }

    /// A parameter read from the query string.
    #[must_use]
    pub fn query(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, BindingSource::Query)
    }

    /// A parameter read from a request header.
    #[must_use]
    pub fn header(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, BindingSource::Header)
    }

    /// A parameter read from the request body.
    #[must_use]
    pub fn body(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, BindingSource::Body)
    }

    /// A parameter read from whichever of route, query or header has it.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, BindingSource::Any)
    }

    /// Sets the zero-based position in the handler signature.
    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Records the target type.
    #[must_use]
    pub fn with_type<T: ?Sized>(self) -> Self {
        self.with_type_name(std::any::type_name::<T>())
    }

    /// Records the target type by name.
    #[must_use]
    pub fn with_type_name(mut self, type_name: &'static str) -> Self {
        self.type_name = type_name;
        self
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The zero-based position in the handler signature.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The source hint.
    #[must_use]
    pub const fn source(&self) -> BindingSource {
        self.source
    }

    /// The target type name, `_` until recorded.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}
