//! # Bindery Host
//!
//! Hosts handlers whose parameters are bound by Bindery.
//!
//! - [`ApplicationBuilder`] - services, parameter binders, exception filters
//!   and endpoints, validated and frozen by `build()`
//! - [`Application`] - routes a request, binds parameters, runs the handler
//!   and renders errors
//! - [`Server`] - hyper HTTP/1.1 accept loop with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use bindery_binding::{Model, ParameterDescriptor};
//! use bindery_host::{Application, Environment};
//! use bytes::Bytes;
//!
//! async fn get_item(id: Model<i32>) -> String {
//!     format!("item {}", *id)
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut builder = Application::builder();
//! builder.environment(Environment::Development);
//! builder
//!     .map_get("/items", get_item)
//!     .parameter(ParameterDescriptor::query("id"));
//! let app = builder.build().unwrap();
//!
//! let request = http::Request::get("/items?id=42").body(Bytes::new()).unwrap();
//! let response = app.handle(request).await;
//! assert_eq!(response.body().as_ref(), b"item 42");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/bindery-host/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod endpoint;
mod environment;
mod handler;
mod router;
mod server;
mod shutdown;

pub use app::{Application, ApplicationBuilder, REQUEST_ID_HEADER};
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use endpoint::EndpointBuilder;
pub use environment::{Environment, UnknownEnvironment};
pub use handler::{BoxFuture, Handler, HandlerResult, MissingDescriptor};
pub use server::{Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
