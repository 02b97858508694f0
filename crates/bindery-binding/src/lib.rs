//! # Bindery Binding
//!
//! Pluggable parameter binding with default-value fallback.
//!
//! For every handler parameter, at request time:
//!
//! 1. the [`BinderRegistry`] is consulted for a custom [`ParameterBinder<T>`];
//! 2. if one is registered its [`Outcome`] is used as is;
//! 3. otherwise the type's [`DefaultBindable`] convention extracts the value
//!    from the route values, query string, headers or body.
//!
//! Exactly one of the two paths runs. A [`Outcome::Failure`] becomes a
//! [`RequestError`](bindery_core::RequestError) that keeps the failure's status
//! code, so the handler body never runs and the client sees e.g. a 400 rather
//! than a generic 500.
//!
//! ## Example
//!
//! ```rust
//! use bindery_binding::{Model, ParameterDescriptor};
//! use bindery_core::InvocationContextBuilder;
//!
//! # tokio_test_block_on(async {
//! let ctx = InvocationContextBuilder::new().uri("/items?id=42").build();
//! let id = Model::<i32>::bind(&ctx, &ParameterDescriptor::query("id")).await.unwrap();
//! assert_eq!(*id, 42);
//!
//! let ctx = InvocationContextBuilder::new().uri("/items?id=abc").build();
//! let err = Model::<i32>::bind(&ctx, &ParameterDescriptor::query("id")).await.unwrap_err();
//! assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/bindery-binding/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
pub mod default;
mod descriptor;
mod error;
mod json;
mod model;
mod outcome;
mod query;
mod registry;

pub use binder::{FnBinder, ParameterBinder};
pub use default::{extract_default, DefaultBindable};
pub use descriptor::{BindingSource, ParameterDescriptor};
pub use error::{ExtractionError, ExtractionSource, MissingBinder, MissingService};
pub use json::Json;
pub use model::{bind_parameter, Custom, FromInvocation, Model, RequiredBinder, Service};
pub use outcome::{BindingFailure, Outcome};
pub use query::Query;
pub use registry::{lookup_binder, BinderRegistry, BinderRegistryBuilder};

#[doc(hidden)]
pub mod __private {
    pub use bindery_core::InvocationContext;
}
