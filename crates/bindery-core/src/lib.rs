//! # Bindery Core
//!
//! Foundational types shared by every Bindery crate:
//!
//! - [`RequestId`] and [`RequestContext`] - per-request identity and timing
//! - [`InvocationContext`] - everything a binder may read about one request
//! - [`Params`] - route values captured by the router
//! - [`EndpointMetadata`] - the matched endpoint (name, pattern, order, methods)
//! - [`Container`] - startup-frozen service container
//! - [`AbortSignal`] - cooperative cancellation of in-flight binding
//! - [`RequestError`], [`BadRequestError`], [`StartupError`] - error taxonomy

#![doc(html_root_url = "https://docs.rs/bindery-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod abort;
mod context;
pub mod di;
mod endpoint;
mod error;
mod invocation;
mod params;

pub use abort::{AbortHandle, AbortSignal};
pub use context::{RequestContext, RequestId};
pub use di::{Container, ContainerBuilder};
pub use endpoint::EndpointMetadata;
pub use error::{short_type_name, BadRequestError, RequestError, StartupError};
pub use invocation::{InvocationContext, InvocationContextBuilder};
pub use params::Params;
