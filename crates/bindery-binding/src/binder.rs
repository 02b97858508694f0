//! Custom parameter binders.

use async_trait::async_trait;
use bindery_core::InvocationContext;

use crate::descriptor::ParameterDescriptor;
use crate::outcome::Outcome;

/// Produces a `T` for a handler parameter from the current request.
///
/// Register an implementation with
/// [`BinderRegistryBuilder::register`](crate::BinderRegistryBuilder::register)
/// to take over binding of every `T` parameter; the default convention is
/// then never consulted for `T`.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use bindery_binding::{Outcome, ParameterBinder, ParameterDescriptor};
/// use bindery_core::InvocationContext;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Tenant(String);
///
/// struct TenantFromHost;
///
/// #[async_trait]
/// impl ParameterBinder<Tenant> for TenantFromHost {
///     async fn bind(&self, ctx: &InvocationContext, _: &ParameterDescriptor) -> Outcome<Tenant> {
///         match ctx.header("host") {
///             Some(host) => Outcome::Success(Tenant(host.to_string())),
///             None => Outcome::failure(http::StatusCode::BAD_REQUEST, "no host header"),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait ParameterBinder<T>: Send + Sync + 'static {
    /// Binds the parameter described by `parameter` for the request in `ctx`.
    async fn bind(&self, ctx: &InvocationContext, parameter: &ParameterDescriptor) -> Outcome<T>;
}

/// A binder backed by a synchronous closure.
///
/// ```rust
/// use bindery_binding::{FnBinder, Outcome, ParameterDescriptor};
/// use bindery_core::InvocationContext;
///
/// let binder = FnBinder::new(|_: &InvocationContext, _: &ParameterDescriptor| Outcome::Success(7_u8));
/// # let _ = binder;
/// ```
pub struct FnBinder<F> {
    func: F,
}

impl<F> FnBinder<F> {
    /// Wraps `func`.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<T, F> ParameterBinder<T> for FnBinder<F>
where
    T: Send + 'static,
    F: Fn(&InvocationContext, &ParameterDescriptor) -> Outcome<T> + Send + Sync + 'static,
{
    async fn bind(&self, ctx: &InvocationContext, parameter: &ParameterDescriptor) -> Outcome<T> {
        (self.func)(ctx, parameter)
    }
}
