//! Per-request invocation context.
//!
//! The [`InvocationContext`] is the single piece of request-scoped state that
//! binders and handlers see. It is built fresh for every request and passed
//! explicitly down the call chain, so concurrent requests never share it.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

use crate::abort::AbortSignal;
use crate::context::{RequestContext, RequestId};
use crate::di::Container;
use crate::endpoint::EndpointMetadata;
use crate::params::Params;

/// Everything known about one in-flight request.
///
/// # Example
///
/// ```rust
/// use bindery_core::InvocationContextBuilder;
/// use http::Method;
///
/// let ctx = InvocationContextBuilder::new()
///     .method(Method::GET)
///     .uri("/items?id=42")
///     .route_value("tenant", "acme")
///     .build();
///
/// assert_eq!(ctx.query_value("id").as_deref(), Some("42"));
/// assert_eq!(ctx.route_values().get("tenant"), Some("acme"));
/// ```
#[derive(Debug, Clone)]
pub struct InvocationContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    route_values: Params,
    request_context: RequestContext,
    endpoint: Option<Arc<EndpointMetadata>>,
    services: Arc<Container>,
    abort: AbortSignal,
}

impl InvocationContext {
    /// Creates a context with an empty service scope and a fresh request id.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            route_values: Params::new(),
            request_context: RequestContext::new(),
            endpoint: None,
            services: Arc::new(Container::new()),
            abort: AbortSignal::never(),
        }
    }

    /// Sets the route values captured by the router.
    #[must_use]
    pub fn with_route_values(mut self, route_values: Params) -> Self {
        self.route_values = route_values;
        self
    }

    /// Sets the request context.
    #[must_use]
    pub fn with_request_context(mut self, request_context: RequestContext) -> Self {
        self.request_context = request_context;
        self
    }

    /// Sets the matched endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Arc<EndpointMetadata>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the service scope.
    #[must_use]
    pub fn with_services(mut self, services: Arc<Container>) -> Self {
        self.services = services;
        self
    }

    /// Sets the abort signal.
    #[must_use]
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string, if any.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Decodes the query string into `(name, value)` pairs.
    ///
    /// A malformed query string decodes to no pairs.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query_string()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default()
    }

    /// Returns the first query value for `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Returns the collected request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the route values.
    #[must_use]
    pub fn route_values(&self) -> &Params {
        &self.route_values
    }

    /// Returns the request context.
    #[must_use]
    pub fn request_context(&self) -> &RequestContext {
        &self.request_context
    }

    /// Shorthand for the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_context.request_id()
    }

    /// Returns the matched endpoint, if routing succeeded.
    #[must_use]
    pub fn endpoint(&self) -> Option<&EndpointMetadata> {
        self.endpoint.as_deref()
    }

    /// Returns the service scope.
    #[must_use]
    pub fn services(&self) -> &Container {
        &self.services
    }

    /// Returns the abort signal.
    #[must_use]
    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }
}

/// Builder for [`InvocationContext`], mostly useful in tests.
///
/// Defaults to `GET /` with no headers and no body.
#[derive(Debug, Default)]
pub struct InvocationContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    route_values: Params,
    request_context: Option<RequestContext>,
    endpoint: Option<Arc<EndpointMetadata>>,
    services: Option<Arc<Container>>,
    abort: AbortSignal,
}

impl InvocationContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI. Unparsable URIs leave the default in place.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(uri) = uri.parse() {
            self.uri = Some(uri);
        }
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::try_from(name),
            http::HeaderValue::try_from(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a route value.
    #[must_use]
    pub fn route_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.push(name, value);
        self
    }

    /// Sets the request context.
    #[must_use]
    pub fn request_context(mut self, ctx: RequestContext) -> Self {
        self.request_context = Some(ctx);
        self
    }

    /// Sets the matched endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: EndpointMetadata) -> Self {
        self.endpoint = Some(Arc::new(endpoint));
        self
    }

    /// Sets the service scope.
    #[must_use]
    pub fn services(mut self, services: Arc<Container>) -> Self {
        self.services = Some(services);
        self
    }

    /// Sets the abort signal.
    #[must_use]
    pub fn abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> InvocationContext {
        InvocationContext {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            route_values: self.route_values,
            request_context: self.request_context.unwrap_or_default(),
            endpoint: self.endpoint,
            services: self.services.unwrap_or_default(),
            abort: self.abort,
        }
    }
}
