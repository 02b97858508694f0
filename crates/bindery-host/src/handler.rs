//! Handler arity adapters.
//!
//! Any async function whose arguments implement
//! [`FromInvocation`](bindery_binding::FromInvocation) and whose output
//! implements [`IntoHandlerResponse`] is a [`Handler`]. Arguments are bound
//! one after another in declaration order, each against the parameter
//! descriptor at the same position. The first binding error short-circuits
//! the invocation and the handler body never runs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bindery_binding::{FromInvocation, ParameterDescriptor, RequiredBinder};
use bindery_core::{InvocationContext, RequestError};
use bindery_results::{IntoHandlerResponse, Response};
use thiserror::Error;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of invoking a handler.
pub type HandlerResult = Result<Response, RequestError>;

/// A type-erased handler as stored by an endpoint.
pub(crate) type ErasedHandler = Arc<
    dyn Fn(Arc<InvocationContext>, Arc<[ParameterDescriptor]>) -> BoxFuture<'static, HandlerResult>
        + Send
        + Sync,
>;

/// An async function usable as an endpoint handler.
///
/// Implemented for functions of up to six arguments. `Args` is the tuple of
/// argument types and only serves to keep the implementations apart.
pub trait Handler<Args>: Clone + Send + Sync + 'static {
    /// Target type names of the arguments, in declaration order.
    fn parameter_types() -> Vec<&'static str>;

    /// Custom binders the arguments cannot do without.
    fn required_binders() -> Vec<RequiredBinder>;

    /// Binds the arguments and runs the handler.
    fn call(
        &self,
        ctx: Arc<InvocationContext>,
        parameters: Arc<[ParameterDescriptor]>,
    ) -> BoxFuture<'static, HandlerResult>;
}

/// A handler argument had no descriptor at its position.
#[derive(Debug, Error)]
#[error("no parameter descriptor at position {position}")]
pub struct MissingDescriptor {
    /// Zero-based argument position.
    pub position: usize,
}

async fn bind_argument<A: FromInvocation>(
    ctx: &InvocationContext,
    parameters: &[ParameterDescriptor],
    position: usize,
) -> Result<A, RequestError> {
    let parameter = parameters
        .get(position)
        .ok_or(MissingDescriptor { position })?;
    A::from_invocation(ctx, parameter).await
}

pub(crate) fn erase<H, Args>(handler: H) -> ErasedHandler
where
    H: Handler<Args>,
    Args: 'static,
{
    Arc::new(move |ctx, parameters| handler.call(ctx, parameters))
}

macro_rules! impl_handler {
    ($($ty:ident $position:tt),*) => {
        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoHandlerResponse,
            $($ty: FromInvocation + 'static,)*
        {
            fn parameter_types() -> Vec<&'static str> {
                vec![$(<$ty as FromInvocation>::target_type_name()),*]
            }

            fn required_binders() -> Vec<RequiredBinder> {
                let required: Vec<Option<RequiredBinder>> =
                    vec![$(<$ty as FromInvocation>::required_binder()),*];
                required.into_iter().flatten().collect()
            }

            #[allow(non_snake_case, unused_variables)]
            fn call(
                &self,
                ctx: Arc<InvocationContext>,
                parameters: Arc<[ParameterDescriptor]>,
            ) -> BoxFuture<'static, HandlerResult> {
                let handler = self.clone();
                Box::pin(async move {
                    $(let $ty = bind_argument::<$ty>(&ctx, &parameters, $position).await?;)*
                    handler($($ty),*).await.into_handler_response(&ctx)
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(A1 0);
impl_handler!(A1 0, A2 1);
impl_handler!(A1 0, A2 1, A3 2);
impl_handler!(A1 0, A2 1, A3 2, A4 3);
impl_handler!(A1 0, A2 1, A3 2, A4 3, A5 4);
impl_handler!(A1 0, A2 1, A3 2, A4 3, A5 4, A6 5);
