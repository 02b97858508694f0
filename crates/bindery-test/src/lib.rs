//! # Bindery Test
//!
//! Exercises a built [`Application`](bindery_host::Application) in memory:
//! requests go straight through routing, parameter binding, the handler and
//! exception filters, with no socket in between.
//!
//! - [`TestClient`] - request entry point, with default headers
//! - [`TestRequestBuilder`] - headers, query, JSON and form bodies
//! - [`TestResponse`] - status, headers, text and JSON accessors plus
//!   assertions

#![doc(html_root_url = "https://docs.rs/bindery-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
