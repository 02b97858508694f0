//! Request routing and path matching.
//!
//! Patterns are split into literal segments and `{name}` parameter segments.
//! Routes are tried by `order`, then by registration order; the first route
//! whose segments and method match wins.
//!
//! Request path segments are percent-decoded before matching, so route
//! values carry the decoded text just like query values do.

use std::borrow::Cow;
use std::sync::OnceLock;

use bindery_core::{Params, StartupError};
use http::Method;
use percent_encoding::percent_decode_str;
use regex::Regex;

/// Outcome of matching a request against the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RouteMatch {
    /// A route matched; `endpoint` indexes the application's endpoints.
    Matched { endpoint: usize, params: Params },
    /// The path matched, but only for other methods.
    MethodNotAllowed { allowed: Vec<Method> },
    /// No pattern matched the path.
    NotFound,
    /// A path segment does not decode to UTF-8.
    InvalidPath { segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

impl PathSegment {
    /// Parameters match any value, so two routes clash whenever their
    /// literals agree position by position.
    fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Param(_), Self::Param(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    pattern: String,
    segments: Vec<PathSegment>,
    order: i32,
    endpoint: usize,
}

impl Route {
    fn match_path(&self, path_segments: &[Cow<'_, str>]) -> Option<Params> {
        if self.segments.len() != path_segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(path_segments) {
            match segment {
                PathSegment::Literal(literal) => {
                    if **literal != **value {
                        return None;
                    }
                }
                PathSegment::Param(name) => params.push(name.clone(), value.to_string()),
            }
        }
        Some(params)
    }

    fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.same_shape(b))
    }
}

fn param_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

fn invalid(pattern: &str, reason: impl Into<String>) -> StartupError {
    StartupError::InvalidRoutePattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

fn parse_segments(pattern: &str) -> Result<Vec<PathSegment>, StartupError> {
    if !pattern.starts_with('/') {
        return Err(invalid(pattern, "must start with '/'"));
    }

    let mut segments = Vec::new();
    for raw in pattern.split('/').filter(|s| !s.is_empty()) {
        let segment = if let Some(inner) = raw.strip_prefix('{') {
            let name = inner
                .strip_suffix('}')
                .ok_or_else(|| invalid(pattern, format!("unclosed parameter '{raw}'")))?;
            if !param_name_pattern().is_match(name) {
                return Err(invalid(pattern, format!("invalid parameter name '{name}'")));
            }
            if segments
                .iter()
                .any(|s| matches!(s, PathSegment::Param(existing) if existing == name))
            {
                return Err(invalid(pattern, format!("duplicate parameter '{name}'")));
            }
            PathSegment::Param(name.to_string())
        } else if raw.contains('{') || raw.contains('}') {
            return Err(invalid(pattern, format!("stray brace in '{raw}'")));
        } else {
            PathSegment::Literal(raw.to_string())
        };
        segments.push(segment);
    }
    Ok(segments)
}

/// The routing table.
#[derive(Debug, Default)]
pub(crate) struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a route for `endpoint`.
    pub(crate) fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        order: i32,
        endpoint: usize,
    ) -> Result<(), StartupError> {
        let route = Route {
            segments: parse_segments(pattern)?,
            method,
            pattern: pattern.to_string(),
            order,
            endpoint,
        };

        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.method == route.method && r.same_shape(&route))
        {
            return Err(StartupError::DuplicateRoute {
                method: route.method.to_string(),
                pattern: existing.pattern.clone(),
            });
        }

        // Stable, so equal orders keep registration order.
        let position = self.routes.partition_point(|r| r.order <= order);
        self.routes.insert(position, route);
        Ok(())
    }

    pub(crate) fn match_route(&self, method: &Method, path: &str) -> RouteMatch {
        let mut path_segments = Vec::new();
        for raw in path.split('/').filter(|s| !s.is_empty()) {
            match percent_decode_str(raw).decode_utf8() {
                Ok(segment) => path_segments.push(segment),
                Err(_) => {
                    return RouteMatch::InvalidPath {
                        segment: raw.to_string(),
                    }
                }
            }
        }

        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = route.match_path(&path_segments) else {
                continue;
            };
            if &route.method == method {
                return RouteMatch::Matched {
                    endpoint: route.endpoint,
                    params,
                };
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed { allowed }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.len()
    }
}
