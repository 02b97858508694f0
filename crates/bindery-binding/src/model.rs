//! Binding orchestration.
//!
//! [`bind_parameter`] decides, per parameter and per request, which path
//! produces the value: a registered [`ParameterBinder<T>`] if there is one,
//! the default convention otherwise. [`Model<T>`] layers status propagation
//! and cancellation on top and is what handlers declare. [`Custom<T>`] does
//! the same for types that have no default convention at all.
//!
//! [`ParameterBinder<T>`]: crate::ParameterBinder

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use bindery_core::{BadRequestError, InvocationContext, RequestError, RequestId};

use crate::default::{extract_default, DefaultBindable};
use crate::descriptor::ParameterDescriptor;
use crate::error::{MissingBinder, MissingService};
use crate::outcome::Outcome;
use crate::registry::{lookup_binder, BinderRegistry};

/// Message carried by the error raised for a failed binding.
const BAD_REQUEST_MESSAGE: &str = "Bad request";

/// Binds one parameter of type `T` for the request in `ctx`.
///
/// The registry in the request's service scope is consulted first. When it
/// holds a binder for `T`, that binder's outcome is returned and the default
/// convention never runs; otherwise the default convention's outcome is
/// returned.
pub async fn bind_parameter<T: DefaultBindable>(
    ctx: &InvocationContext,
    parameter: &ParameterDescriptor,
) -> Outcome<T> {
    match lookup_binder::<T>(ctx.services()) {
        Some(binder) => binder.bind(ctx, parameter).await,
        None => extract_default(ctx, parameter),
    }
}

/// A handler parameter bound through the binder registry.
///
/// Declaring `Model<T>` means: use the custom binder registered for `T` if
/// there is one, else `T`'s default convention. A failed binding ends the
/// request with the failure's status code before the handler runs.
///
/// `T` must implement [`DefaultBindable`] even when a binder is always
/// registered for it; use [`Custom<T>`] for types that have no convention.
///
/// # Example
///
/// ```rust
/// use bindery_binding::{Model, ParameterDescriptor};
/// use bindery_core::InvocationContextBuilder;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let ctx = InvocationContextBuilder::new().uri("/items?id=42").build();
/// let Model(id) = Model::<i32>::bind(&ctx, &ParameterDescriptor::query("id")).await.unwrap();
/// assert_eq!(id, 42);
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model<T>(pub T);

impl<T> Model<T> {
    /// Returns the bound value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Model<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DefaultBindable> Model<T> {
    /// Binds the parameter, racing the binding against the request's abort
    /// signal.
    ///
    /// # Errors
    ///
    /// - a [`BadRequestError`] carrying the failure's status when binding
    ///   fails, e.g. 400 for a malformed value;
    /// - [`RequestError::aborted`] when the request is aborted first.
    pub async fn bind(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, RequestError> {
        settle(ctx, parameter, bind_parameter::<T>(ctx, parameter))
            .await
            .map(Self)
    }
}

/// A handler parameter bound only by the custom binder registered for `T`.
///
/// Unlike [`Model<T>`], `T` needs no default convention. An endpoint taking a
/// `Custom<T>` fails to build unless a binder for `T` is registered, so the
/// binder is always there at request time.
///
/// # Example
///
/// ```rust
/// use bindery_binding::{BinderRegistry, Custom, FnBinder, Outcome, ParameterDescriptor};
/// use bindery_core::{ContainerBuilder, InvocationContext, InvocationContextBuilder};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Tenant(&'static str);
///
/// let mut registry = BinderRegistry::builder();
/// registry
///     .register::<Tenant, _>(FnBinder::new(|_: &InvocationContext, _: &ParameterDescriptor| {
///         Outcome::Success(Tenant("acme"))
///     }))
///     .unwrap();
/// let mut services = ContainerBuilder::new();
/// services.register(Arc::new(registry.build())).unwrap();
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let ctx = InvocationContextBuilder::new()
///     .services(Arc::new(services.build()))
///     .build();
/// let tenant = Custom::<Tenant>::bind(&ctx, &ParameterDescriptor::named("tenant")).await.unwrap();
/// assert_eq!(*tenant, Tenant("acme"));
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Custom<T>(pub T);

impl<T> Custom<T> {
    /// Returns the bound value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Custom<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Send + 'static> Custom<T> {
    /// Binds the parameter through the registered binder, racing it against
    /// the request's abort signal.
    ///
    /// # Errors
    ///
    /// - a [`BadRequestError`] carrying the failure's status when the binder
    ///   fails;
    /// - [`MissingBinder`] (500) when the request's scope has no binder for
    ///   `T`;
    /// - [`RequestError::aborted`] when the request is aborted first.
    pub async fn bind(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, RequestError> {
        let Some(binder) = lookup_binder::<T>(ctx.services()) else {
            return Err(RequestError::new(MissingBinder {
                type_name: std::any::type_name::<T>(),
            }));
        };

        settle(ctx, parameter, binder.bind(ctx, parameter))
            .await
            .map(Self)
    }
}

/// Awaits `binding` unless the request is aborted first, turning a failed
/// outcome into a bad-request error with the failure's status.
async fn settle<T>(
    ctx: &InvocationContext,
    parameter: &ParameterDescriptor,
    binding: impl Future<Output = Outcome<T>>,
) -> Result<T, RequestError> {
    tokio::select! {
        biased;

        () = ctx.abort_signal().aborted() => {
            tracing::debug!(parameter = %parameter.name(), "binding aborted");
            Err(RequestError::aborted())
        }
        outcome = binding => match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(failure) => {
                tracing::debug!(
                    parameter = %parameter.name(),
                    status = failure.status().as_u16(),
                    reason = %failure.reason(),
                    "parameter binding failed"
                );
                Err(RequestError::new(
                    BadRequestError::new(failure.status(), BAD_REQUEST_MESSAGE)
                        .with_reason(failure.reason()),
                ))
            }
        },
    }
}

/// A custom binder an argument type cannot do without.
///
/// Reported by [`FromInvocation::required_binder`] and checked against the
/// registry when the application is built.
#[derive(Debug, Clone, Copy)]
pub struct RequiredBinder {
    type_name: &'static str,
    registered: fn(&BinderRegistry) -> bool,
}

impl RequiredBinder {
    /// The requirement of a binder for `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            registered: BinderRegistry::contains::<T>,
        }
    }

    /// Name of the type that needs the binder.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if `registry` satisfies the requirement.
    #[must_use]
    pub fn is_met(&self, registry: &BinderRegistry) -> bool {
        (self.registered)(registry)
    }
}

/// A handler argument that can be produced from the invocation context.
#[async_trait]
pub trait FromInvocation: Sized + Send {
    /// Name of the type the argument binds to, recorded on descriptors.
    fn target_type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The custom binder this argument needs registered, if any.
    fn required_binder() -> Option<RequiredBinder> {
        None
    }

    /// Produces the argument described by `parameter`.
    async fn from_invocation(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, RequestError>;
}

#[async_trait]
impl<T: DefaultBindable> FromInvocation for Model<T> {
    fn target_type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    async fn from_invocation(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, RequestError> {
        Self::bind(ctx, parameter).await
    }
}

#[async_trait]
impl<T: Send + 'static> FromInvocation for Custom<T> {
    fn target_type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn required_binder() -> Option<RequiredBinder> {
        Some(RequiredBinder::of::<T>())
    }

    async fn from_invocation(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, RequestError> {
        Self::bind(ctx, parameter).await
    }
}

/// A service resolved from the request's service scope.
///
/// Resolving a service that was never registered is a server error (500).
pub struct Service<T>(pub Arc<T>);

impl<T> Deref for Service<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Clone for Service<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Service<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Service").field(&self.0).finish()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> FromInvocation for Service<T> {
    fn target_type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    async fn from_invocation(
        ctx: &InvocationContext,
        _parameter: &ParameterDescriptor,
    ) -> Result<Self, RequestError> {
        ctx.services().resolve::<T>().map(Service).ok_or_else(|| {
            RequestError::new(MissingService {
                type_name: std::any::type_name::<T>(),
            })
        })
    }
}

#[async_trait]
impl FromInvocation for RequestId {
    async fn from_invocation(
        ctx: &InvocationContext,
        _parameter: &ParameterDescriptor,
    ) -> Result<Self, RequestError> {
        Ok(ctx.request_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinderRegistry, FnBinder};
    use bindery_core::{AbortSignal, ContainerBuilder, InvocationContextBuilder};
    use http::StatusCode;

    #[derive(Debug, PartialEq)]
    struct Greeting(String);

    fn services_with_greeting_binder() -> Arc<bindery_core::Container> {
        let mut registry = BinderRegistry::builder();
        registry
            .register::<i64, _>(FnBinder::new(
                |_: &InvocationContext, _: &ParameterDescriptor| -> Outcome<i64> {
                    Outcome::failure(StatusCode::UNPROCESSABLE_ENTITY, "i64 values are refused")
                },
            ))
            .unwrap();

        let mut services = ContainerBuilder::new();
        services.register(Arc::new(registry.build())).unwrap();
        services
            .register(Arc::new(Greeting("hello".to_string())))
            .unwrap();
        Arc::new(services.build())
    }

    #[tokio::test]
    async fn test_custom_binder_failure_status_propagates() {
        let ctx = InvocationContextBuilder::new()
            .uri("/n?n=5")
            .services(services_with_greeting_binder())
            .build();

        let err = Model::<i64>::bind(&ctx, &ParameterDescriptor::query("n"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message(), "Bad request");
        assert_eq!(err.short_type_name(), "BadRequestError");
        assert_eq!(
            err.as_bad_request().and_then(BadRequestError::reason),
            Some("i64 values are refused")
        );
    }

    #[tokio::test]
    async fn test_unregistered_type_uses_default() {
        let ctx = InvocationContextBuilder::new()
            .uri("/n?n=5")
            .services(services_with_greeting_binder())
            .build();

        let Model(n) = Model::<i32>::bind(&ctx, &ParameterDescriptor::query("n"))
            .await
            .unwrap();
        assert_eq!(n, 5);
    }

    #[tokio::test]
    async fn test_aborted_before_binding() {
        let (handle, signal) = AbortSignal::pair();
        handle.abort();

        let ctx = InvocationContextBuilder::new()
            .uri("/n?n=5")
            .abort(signal)
            .build();

        let err = Model::<i32>::bind(&ctx, &ParameterDescriptor::query("n"))
            .await
            .unwrap_err();
        assert!(err.is_aborted());
        assert_eq!(err.status().as_u16(), 499);
    }

    #[derive(Debug, PartialEq)]
    struct Badge(u32);

    #[tokio::test]
    async fn test_custom_uses_registered_binder_only() {
        let mut registry = BinderRegistry::builder();
        registry
            .register::<Badge, _>(FnBinder::new(
                |_: &InvocationContext, _: &ParameterDescriptor| Outcome::Success(Badge(7)),
            ))
            .unwrap();
        let mut services = ContainerBuilder::new();
        services.register(Arc::new(registry.build())).unwrap();

        let ctx = InvocationContextBuilder::new()
            .uri("/?badge=1")
            .services(Arc::new(services.build()))
            .build();

        let badge = Custom::<Badge>::bind(&ctx, &ParameterDescriptor::query("badge"))
            .await
            .unwrap();
        assert_eq!(*badge, Badge(7));
    }

    #[tokio::test]
    async fn test_custom_without_binder_is_500() {
        let ctx = InvocationContextBuilder::new().build();

        let err = Custom::<Badge>::bind(&ctx, &ParameterDescriptor::named("badge"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.short_type_name(), "MissingBinder");
    }

    #[tokio::test]
    async fn test_custom_failure_status_propagates() {
        let ctx = InvocationContextBuilder::new()
            .services(services_with_greeting_binder())
            .build();

        let err = Custom::<i64>::bind(&ctx, &ParameterDescriptor::named("n"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_required_binder() {
        assert!(Model::<i32>::required_binder().is_none());

        let required = Custom::<Badge>::required_binder().unwrap();
        assert!(required.type_name().ends_with("Badge"));
        assert!(!required.is_met(&BinderRegistry::new()));

        let mut registry = BinderRegistry::builder();
        registry
            .register::<Badge, _>(FnBinder::new(
                |_: &InvocationContext, _: &ParameterDescriptor| Outcome::Success(Badge(1)),
            ))
            .unwrap();
        assert!(required.is_met(&registry.build()));
    }

    #[tokio::test]
    async fn test_service_resolution() {
        let ctx = InvocationContextBuilder::new()
            .services(services_with_greeting_binder())
            .build();

        let greeting = Service::<Greeting>::from_invocation(&ctx, &ParameterDescriptor::named("g"))
            .await
            .unwrap();
        assert_eq!(greeting.0 .0, "hello");
    }

    #[tokio::test]
    async fn test_missing_service_is_500() {
        let ctx = InvocationContextBuilder::new().build();

        let err = Service::<Greeting>::from_invocation(&ctx, &ParameterDescriptor::named("g"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.short_type_name(), "MissingService");
    }
}
