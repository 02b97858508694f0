//! # Bindery
//!
//! **Pluggable parameter binding with default-value fallback**
//!
//! Handlers declare what they need as typed parameters. For every parameter
//! Bindery asks the binder registry for a custom binder of that type; when
//! none is registered, the type's default convention reads the value from
//! the route, query string, headers or body. A failed binding ends the
//! request with its status code before the handler runs, and clients that
//! accept JSON get a problem-details document describing it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bindery::prelude::*;
//!
//! async fn get_item(id: Model<i32>) -> String {
//!     format!("item {}", *id)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut builder = Application::builder();
//!     builder.add_problem_details_exception_filter();
//!     builder
//!         .map_get("/items", get_item)
//!         .parameter(ParameterDescriptor::query("id"));
//!
//!     Server::new(builder.build()?, ServerConfig::default()).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`core`] | invocation context, request ids, service container, errors |
//! | [`binding`] | binder registry, default conventions, `Model<T>`, `Custom<T>` |
//! | [`results`] | response results, problem details, exception filters |
//! | [`host`] | application builder, router, HTTP server |
//! | [`config`] | layered configuration |
//! | [`telemetry`] | logging setup |

#![doc(html_root_url = "https://docs.rs/bindery/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use bindery_binding as binding;
pub use bindery_config as config;
pub use bindery_core as core;
pub use bindery_host as host;
pub use bindery_results as results;
pub use bindery_telemetry as telemetry;

pub mod playground;

/// Prelude module for convenient imports.
///
/// ```rust
/// use bindery::prelude::*;
/// ```
pub mod prelude {
    pub use bindery_core::{AbortSignal, InvocationContext, RequestError, RequestId, StartupError};

    // Binding
    pub use bindery_binding::{
        impl_default_bindable, Custom, DefaultBindable, FnBinder, Json, Model, Outcome,
        ParameterBinder, ParameterDescriptor, Query, Service,
    };

    // Results
    pub use bindery_results::{
        problem, CreatedWithContentType, ExceptionFilter, HtmlResult, IntoResponse, JsonResult,
        Next, ProblemDetails, ProblemResult, Response,
    };

    // Hosting
    pub use bindery_host::{Application, ApplicationBuilder, Environment, Server, ServerConfig};
}
