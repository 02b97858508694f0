//! Metadata describing the endpoint a request was routed to.

use http::Method;
use serde::Serialize;

/// Static description of a registered endpoint.
///
/// Built once when the application is built and shared by every request
/// routed to the endpoint. Serializes to the shape used by diagnostics:
/// `{ displayName, routePattern, routeOrder, httpMethods }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMetadata {
    display_name: String,
    route_pattern: String,
    order: i32,
    methods: Vec<Method>,
}

impl EndpointMetadata {
    /// Creates metadata for a pattern served for `methods`.
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        route_pattern: impl Into<String>,
        order: i32,
        methods: Vec<Method>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            route_pattern: route_pattern.into(),
            order,
            methods,
        }
    }

    /// Human readable endpoint name, e.g. `HTTP: GET /items`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The raw route pattern, e.g. `/todos/{id}`.
    #[must_use]
    pub fn route_pattern(&self) -> &str {
        &self.route_pattern
    }

    /// Ordering among endpoints matching the same path. Lower wins.
    #[must_use]
    pub const fn order(&self) -> i32 {
        self.order
    }

    /// HTTP methods served by the endpoint.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Methods joined with `", "`, e.g. `GET, HEAD`.
    #[must_use]
    pub fn methods_display(&self) -> String {
        self.methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Serialize for EndpointMetadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            display_name: &'a str,
            route_pattern: &'a str,
            route_order: i32,
            http_methods: String,
        }

        Wire {
            display_name: &self.display_name,
            route_pattern: &self.route_pattern,
            route_order: self.order,
            http_methods: self.methods_display(),
        }
        .serialize(serializer)
    }
}
