//! Developer exception page.
//!
//! When a request ends in a [`RequestError`], the host hands it to a
//! [`DeveloperExceptionPage`], which runs the registered
//! [`ExceptionFilter`]s in order. Each filter either writes the response
//! itself or calls [`Next::run`] to defer to the rest of the chain. The end
//! of the chain renders an HTML page describing the error.
//!
//! [`ProblemDetailsExceptionFilter`] answers clients that accept JSON with a
//! problem details document instead.

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use bindery_core::{InvocationContext, RequestError};
use http::header::{HeaderValue, ACCEPT};
use http::{HeaderMap, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;

use crate::html::{escape_html, TEXT_HTML_UTF_8};
use crate::problem::{write_problem, ProblemDetails, REQUEST_ID_EXTENSION};
use crate::response::{build_response, Response};

/// Title of problem documents produced for unhandled errors.
pub const UNHANDLED_TITLE: &str = "An unhandled exception occurred while processing the request";

/// The error being handled and the request it ended.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    /// The failed request.
    pub invocation: &'a InvocationContext,
    /// The error that ended it.
    pub error: &'a RequestError,
}

/// One link in the exception filter chain.
#[async_trait]
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Renders a response for the error, or defers with `next.run(error)`.
    async fn handle(&self, error: ErrorContext<'_>, next: Next<'_>) -> Response;
}

/// The remainder of the filter chain.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    filters: &'a [Arc<dyn ExceptionFilter>],
}

impl Next<'_> {
    /// Runs the next filter, or renders the HTML page when none is left.
    pub async fn run(self, error: ErrorContext<'_>) -> Response {
        match self.filters.split_first() {
            Some((filter, rest)) => filter.handle(error, Next { filters: rest }).await,
            None => render_html_page(error),
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.filters.len())
            .finish()
    }
}

/// Runs exception filters for requests that failed with an error.
#[derive(Clone, Default)]
pub struct DeveloperExceptionPage {
    filters: Vec<Arc<dyn ExceptionFilter>>,
}

impl DeveloperExceptionPage {
    /// Creates a page that runs `filters` in order.
    #[must_use]
    pub fn new(filters: Vec<Arc<dyn ExceptionFilter>>) -> Self {
        Self { filters }
    }

    /// Number of registered filters.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Renders the response for a failed request.
    pub async fn render(&self, invocation: &InvocationContext, error: &RequestError) -> Response {
        Next {
            filters: &self.filters,
        }
        .run(ErrorContext { invocation, error })
        .await
    }
}

impl std::fmt::Debug for DeveloperExceptionPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeveloperExceptionPage")
            .field("filter_count", &self.filters.len())
            .finish()
    }
}

/// Formats errors as problem details for clients that accept JSON.
///
/// A client accepts JSON when any `Accept` entry is a range containing
/// `application/json`: `application/json`, `application/*` or `*/*`. Other
/// clients are passed to the next filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemDetailsExceptionFilter;

#[async_trait]
impl ExceptionFilter for ProblemDetailsExceptionFilter {
    async fn handle(&self, error: ErrorContext<'_>, next: Next<'_>) -> Response {
        if !accepts_json(error.invocation.headers()) {
            return next.run(error).await;
        }

        let details = unhandled_problem(error);
        tracing::debug!(
            status = details.status.unwrap_or_default(),
            exception = error.error.type_name(),
            "writing problem details for unhandled error"
        );
        write_problem(details)
    }
}

/// Returns `true` when an `Accept` entry covers `application/json`.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|entry| entry.trim().parse::<mime::Mime>().ok())
        .any(|range| {
            range.type_() == mime::STAR
                || (range.type_() == mime::APPLICATION
                    && (range.subtype() == mime::STAR || range.subtype() == mime::JSON))
        })
}

/// Builds the problem document describing an unhandled error.
pub fn unhandled_problem(ctx: ErrorContext<'_>) -> ProblemDetails {
    let ErrorContext { invocation, error } = ctx;
    let status = error
        .as_bad_request()
        .map_or(StatusCode::INTERNAL_SERVER_ERROR, |bad| bad.status());

    let mut details = ProblemDetails::new()
        .with_title(UNHANDLED_TITLE)
        .with_detail(error.to_string())
        .with_status(status)
        .with_extension("exception", error.type_name())
        .with_extension("stack", error.stack().map_or(Value::Null, Value::String))
        .with_extension("headers", string_map(joined_headers(invocation.headers())))
        .with_extension(
            "routeValues",
            serde_json::to_value(invocation.route_values()).unwrap_or(Value::Null),
        )
        .with_extension("query", string_map(joined_query(invocation)));

    if let Some(endpoint) = invocation.endpoint() {
        details = details.with_extension(
            "endpoint",
            serde_json::to_value(endpoint).unwrap_or(Value::Null),
        );
    }

    details.with_extension(REQUEST_ID_EXTENSION, invocation.request_id().to_string())
}

fn joined_headers(headers: &HeaderMap) -> IndexMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            (name.as_str().to_string(), values.join(","))
        })
        .collect()
}

fn joined_query(invocation: &InvocationContext) -> IndexMap<String, String> {
    let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
    for (name, value) in invocation.query_pairs() {
        grouped.entry(name).or_default().push(value);
    }
    grouped
        .into_iter()
        .map(|(name, values)| (name, values.join(",")))
        .collect()
}

fn string_map(map: IndexMap<String, String>) -> Value {
    map.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}

fn render_html_page(ctx: ErrorContext<'_>) -> Response {
    let ErrorContext { invocation, error } = ctx;
    let mut page = String::with_capacity(2048);

    let _ = write!(
        page,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\" />\
         <title>Internal Server Error</title></head><body>\
         <h1>{title}</h1><p><strong>{detail}</strong></p>",
        title = escape_html(UNHANDLED_TITLE),
        detail = escape_html(&error.to_string()),
    );

    let _ = write!(
        page,
        "<h2>Stack</h2><pre>{}</pre>",
        escape_html(error.stack().as_deref().unwrap_or("(backtrace not captured)"))
    );

    write_table(&mut page, "Query", joined_query(invocation));
    write_table(&mut page, "Headers", joined_headers(invocation.headers()));
    write_table(
        &mut page,
        "Route values",
        invocation
            .route_values()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );

    if let Some(endpoint) = invocation.endpoint() {
        let mut rows = IndexMap::new();
        rows.insert("Display name".to_string(), endpoint.display_name().to_string());
        rows.insert("Route pattern".to_string(), endpoint.route_pattern().to_string());
        rows.insert("Route order".to_string(), endpoint.order().to_string());
        rows.insert("HTTP methods".to_string(), endpoint.methods_display());
        write_table(&mut page, "Endpoint", rows);
    }

    let _ = write!(
        page,
        "<p>Request id: <code>{}</code></p></body></html>",
        invocation.request_id()
    );

    build_response(
        error.status(),
        Some(HeaderValue::from_static(TEXT_HTML_UTF_8)),
        page,
    )
}

fn write_table(page: &mut String, heading: &str, rows: IndexMap<String, String>) {
    let _ = write!(page, "<h2>{}</h2>", escape_html(heading));
    if rows.is_empty() {
        page.push_str("<p>None</p>");
        return;
    }

    page.push_str("<table><thead><tr><th>Name</th><th>Value</th></tr></thead><tbody>");
    for (name, value) in &rows {
        let _ = write!(
            page,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(name),
            escape_html(value)
        );
    }
    page.push_str("</tbody></table>");
}
