//! # Bindery Results
//!
//! Typed handler results and the developer exception page.
//!
//! | Result | Content-Type | Status |
//! |--------|--------------|--------|
//! | [`JsonResult`] | `application/json` | 200 or custom |
//! | [`HtmlResult`] | `text/html` | 200 or custom |
//! | [`CreatedWithContentType`] | as given (`application/xml` renders XML) | 201 |
//! | [`ProblemResult`] / [`problem`] | `application/problem+json` | defaulted from the document |
//!
//! Unhandled request errors are rendered by a [`DeveloperExceptionPage`]:
//! a chain of [`ExceptionFilter`]s ending in an HTML page, with
//! [`ProblemDetailsExceptionFilter`] answering JSON clients.

#![doc(html_root_url = "https://docs.rs/bindery-results/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod created;
mod developer;
mod html;
mod json;
mod problem;
mod response;
mod xml;

pub use created::{CreatedWithContentType, APPLICATION_XML};
pub use developer::{
    accepts_json, unhandled_problem, DeveloperExceptionPage, ErrorContext, ExceptionFilter, Next,
    ProblemDetailsExceptionFilter, UNHANDLED_TITLE,
};
pub use html::{escape_html, HtmlResult, TEXT_HTML_UTF_8};
pub use json::{json_response, JsonResult, APPLICATION_JSON};
pub use problem::{
    problem, ProblemDefaults, ProblemDetails, ProblemResult, APPLICATION_PROBLEM_JSON,
    REQUEST_ID_EXTENSION, STANDARD_MEMBERS,
};
pub use response::{
    build_response, empty, IntoHandlerResponse, IntoResponse, Response, TEXT_PLAIN_UTF_8,
};
pub use xml::to_xml_string;
