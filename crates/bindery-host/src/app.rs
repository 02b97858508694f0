//! Application builder and request pipeline.
//!
//! An [`Application`] is built once at startup from an [`ApplicationBuilder`].
//! Building freezes services, parameter binders, exception filters and
//! endpoints; afterwards the application is shared by every request and
//! nothing in it is mutated.
//!
//! # Request pipeline
//!
//! 1. assign a request id (trusted `x-request-id` header, or a new UUID v7)
//! 2. route the request (`404` / `405` with `Allow` when nothing matches,
//!    `400` when a path segment does not decode)
//! 3. build the request's [`InvocationContext`]
//! 4. bind the handler's parameters and run it
//! 5. on error, render the developer exception page (development) or answer
//!    with the bare status
//! 6. echo `x-request-id` on the response

use std::sync::Arc;

use bindery_binding::{BinderRegistry, BinderRegistryBuilder, ParameterBinder};
use bindery_core::{
    AbortSignal, Container, ContainerBuilder, InvocationContext, RequestContext, RequestError,
    RequestId, StartupError,
};
use bindery_results::{
    empty, DeveloperExceptionPage, ExceptionFilter, ProblemDetailsExceptionFilter, Response,
};
use bytes::Bytes;
use http::header::{HeaderValue, ALLOW};
use http::{Method, Request, StatusCode};
use tracing::Instrument;

use crate::endpoint::{Endpoint, EndpointBuilder};
use crate::environment::Environment;
use crate::handler::Handler;
use crate::router::{RouteMatch, Router};

/// Header carrying the request id, in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Collects everything an [`Application`] is made of.
///
/// Registration mistakes (duplicate services or binders, bad patterns) are
/// remembered and reported by [`ApplicationBuilder::build`], so registrations
/// can be chained.
///
/// # Example
///
/// ```rust
/// use bindery_host::{Application, Environment};
///
/// async fn hello() -> &'static str {
///     "hello"
/// }
///
/// let mut builder = Application::builder();
/// builder.environment(Environment::Development);
/// builder.map_get("/", hello);
///
/// let app = builder.build().unwrap();
/// assert_eq!(app.environment(), Environment::Development);
/// ```
#[derive(Default)]
pub struct ApplicationBuilder {
    environment: Environment,
    services: ContainerBuilder,
    binders: BinderRegistryBuilder,
    filters: Vec<Arc<dyn ExceptionFilter>>,
    endpoints: Vec<EndpointBuilder>,
    trust_request_id: bool,
    errors: Vec<StartupError>,
}

impl ApplicationBuilder {
    /// Creates an empty builder for the production environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hosting environment.
    pub fn environment(&mut self, environment: Environment) -> &mut Self {
        self.environment = environment;
        self
    }

    /// Registers a service, resolvable by handlers through
    /// [`Service<T>`](bindery_binding::Service).
    pub fn add_service<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        if let Err(error) = self.services.register(service) {
            self.errors.push(error);
        }
        self
    }

    /// Registers the custom binder for parameters of type `T`.
    ///
    /// At most one binder may be registered per type.
    pub fn add_parameter_binder<T, B>(&mut self, binder: B) -> &mut Self
    where
        T: Send + 'static,
        B: ParameterBinder<T>,
    {
        if let Err(error) = self.binders.register::<T, B>(binder) {
            self.errors.push(error);
        }
        self
    }

    /// Appends an exception filter to the developer exception page.
    ///
    /// Filters run in registration order.
    pub fn add_exception_filter(&mut self, filter: impl ExceptionFilter) -> &mut Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Appends the filter that answers JSON clients with problem details.
    pub fn add_problem_details_exception_filter(&mut self) -> &mut Self {
        self.add_exception_filter(ProblemDetailsExceptionFilter)
    }

    /// Trusts incoming `x-request-id` headers that hold a UUID.
    ///
    /// Off by default: every request gets a fresh id.
    pub fn trust_request_id_header(&mut self, trust: bool) -> &mut Self {
        self.trust_request_id = trust;
        self
    }

    /// Maps `GET pattern` to `handler`.
    pub fn map_get<H, Args>(&mut self, pattern: &str, handler: H) -> &mut EndpointBuilder
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(&[Method::GET], pattern, handler)
    }

    /// Maps `POST pattern` to `handler`.
    pub fn map_post<H, Args>(&mut self, pattern: &str, handler: H) -> &mut EndpointBuilder
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(&[Method::POST], pattern, handler)
    }

    /// Maps `PUT pattern` to `handler`.
    pub fn map_put<H, Args>(&mut self, pattern: &str, handler: H) -> &mut EndpointBuilder
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(&[Method::PUT], pattern, handler)
    }

    /// Maps `DELETE pattern` to `handler`.
    pub fn map_delete<H, Args>(&mut self, pattern: &str, handler: H) -> &mut EndpointBuilder
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.map(&[Method::DELETE], pattern, handler)
    }

    /// Maps `pattern` for each of `methods` to `handler`.
    pub fn map<H, Args>(
        &mut self,
        methods: &[Method],
        pattern: &str,
        handler: H,
    ) -> &mut EndpointBuilder
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let index = self.endpoints.len();
        self.endpoints.push(EndpointBuilder::new(
            methods.to_vec(),
            pattern.to_string(),
            handler,
        ));
        &mut self.endpoints[index]
    }

    /// Validates and freezes the application.
    ///
    /// # Errors
    ///
    /// Returns the first [`StartupError`] found: a duplicate service or
    /// binder, an invalid or duplicate route, an endpoint whose
    /// descriptors do not match its handler, or a
    /// [`Custom<T>`](bindery_binding::Custom) parameter without a binder.
    pub fn build(self) -> Result<Application, StartupError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let registry: BinderRegistry = self.binders.build();
        let binder_count = registry.len();

        let mut router = Router::new();
        let mut endpoints = Vec::with_capacity(self.endpoints.len());
        for (index, builder) in self.endpoints.into_iter().enumerate() {
            for method in builder.methods() {
                router.add_route(method.clone(), builder.pattern(), builder.order(), index)?;
            }
            endpoints.push(builder.build(&registry)?);
        }

        let mut services = self.services;
        services.register(Arc::new(registry))?;

        tracing::info!(
            environment = %self.environment,
            endpoints = endpoints.len(),
            routes = router.len(),
            binders = binder_count,
            exception_filters = self.filters.len(),
            "application built"
        );

        Ok(Application {
            inner: Arc::new(Inner {
                environment: self.environment,
                router,
                endpoints,
                services: Arc::new(services.build()),
                exception_page: DeveloperExceptionPage::new(self.filters),
                trust_request_id: self.trust_request_id,
            }),
        })
    }
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("environment", &self.environment)
            .field("endpoints", &self.endpoints.len())
            .field("exception_filters", &self.filters.len())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

struct Inner {
    environment: Environment,
    router: Router,
    endpoints: Vec<Endpoint>,
    services: Arc<Container>,
    exception_page: DeveloperExceptionPage,
    trust_request_id: bool,
}

/// A built application. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Application {
    inner: Arc<Inner>,
}

impl Application {
    /// Starts building an application.
    #[must_use]
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// The hosting environment.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.inner.environment
    }

    /// The frozen service container, including the binder registry.
    #[must_use]
    pub fn services(&self) -> &Container {
        &self.inner.services
    }

    /// Handles one request to completion.
    pub async fn handle(&self, request: Request<Bytes>) -> Response {
        self.handle_with_abort(request, AbortSignal::never()).await
    }

    /// Handles one request, stopping early when `abort` fires.
    ///
    /// An aborted request never reaches its handler and is answered with
    /// status 499 and no body.
    pub async fn handle_with_abort(&self, request: Request<Bytes>, abort: AbortSignal) -> Response {
        let request_id = self.request_id_for(&request);
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            http.method = %request.method(),
            http.path = %request.uri().path(),
        );

        let mut response = self.dispatch(request, request_id, abort).instrument(span).await;
        if let Ok(value) = HeaderValue::try_from(request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }

    fn request_id_for(&self, request: &Request<Bytes>) -> RequestId {
        if !self.inner.trust_request_id {
            return RequestId::new();
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(RequestId::new)
    }

    async fn dispatch(
        &self,
        request: Request<Bytes>,
        request_id: RequestId,
        abort: AbortSignal,
    ) -> Response {
        let request_context = RequestContext::with_request_id(request_id);
        let (parts, body) = request.into_parts();

        let (endpoint, route_values) =
            match self.inner.router.match_route(&parts.method, parts.uri.path()) {
                RouteMatch::Matched { endpoint, params } => {
                    match self.inner.endpoints.get(endpoint) {
                        Some(endpoint) => (endpoint, params),
                        None => return empty(StatusCode::NOT_FOUND),
                    }
                }
                RouteMatch::MethodNotAllowed { allowed } => {
                    tracing::debug!(status = 405, "method not allowed");
                    return method_not_allowed(&allowed);
                }
                RouteMatch::NotFound => {
                    tracing::debug!(status = 404, "no route matched");
                    return empty(StatusCode::NOT_FOUND);
                }
                RouteMatch::InvalidPath { segment } => {
                    tracing::debug!(status = 400, %segment, "path segment is not valid UTF-8");
                    return empty(StatusCode::BAD_REQUEST);
                }
            };

        let ctx = Arc::new(
            InvocationContext::new(parts.method, parts.uri, parts.headers, body)
                .with_route_values(route_values)
                .with_request_context(request_context)
                .with_endpoint(Arc::clone(&endpoint.metadata))
                .with_services(Arc::clone(&self.inner.services))
                .with_abort(abort),
        );

        tracing::debug!(endpoint = endpoint.metadata.display_name(), "endpoint matched");

        let response = match (endpoint.handler)(Arc::clone(&ctx), Arc::clone(&endpoint.parameters))
            .await
        {
            Ok(response) => response,
            Err(error) => self.handle_error(&ctx, error).await,
        };

        let elapsed = ctx.request_context().elapsed();
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
        response
    }

    async fn handle_error(&self, ctx: &InvocationContext, error: RequestError) -> Response {
        if error.is_aborted() {
            tracing::info!(status = error.status().as_u16(), "request aborted");
            return empty(error.status());
        }

        if error.status().is_server_error() {
            tracing::error!(error = %error, status = error.status().as_u16(), "unhandled request error");
        } else {
            tracing::debug!(error = %error, status = error.status().as_u16(), "request rejected");
        }

        if self.inner.environment.is_development() {
            self.inner.exception_page.render(ctx, &error).await
        } else {
            empty(error.status())
        }
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("environment", &self.inner.environment)
            .field("endpoints", &self.inner.endpoints.len())
            .field("services", &self.inner.services)
            .finish_non_exhaustive()
    }
}

fn method_not_allowed(allowed: &[Method]) -> Response {
    let mut response = empty(StatusCode::METHOD_NOT_ALLOWED);
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::try_from(allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}
