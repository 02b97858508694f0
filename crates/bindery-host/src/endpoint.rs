//! Endpoint registration.

use std::sync::Arc;

use bindery_binding::{BinderRegistry, ParameterDescriptor, RequiredBinder};
use bindery_core::{EndpointMetadata, StartupError};
use http::Method;

use crate::handler::{erase, ErasedHandler, Handler};

/// Describes one endpoint while the application is being built.
///
/// Returned by the `map_*` methods of
/// [`ApplicationBuilder`](crate::ApplicationBuilder). Every handler argument
/// needs a [`ParameterDescriptor`], in declaration order.
///
/// # Example
///
/// ```rust
/// use bindery_binding::{Model, ParameterDescriptor};
/// use bindery_host::Application;
///
/// async fn get_item(id: Model<i32>) -> String {
///     format!("item {}", *id)
/// }
///
/// let mut builder = Application::builder();
/// builder
///     .map_get("/items", get_item)
///     .parameter(ParameterDescriptor::query("id"))
///     .with_display_name("Get item")
///     .with_order(1);
/// assert!(builder.build().is_ok());
/// ```
pub struct EndpointBuilder {
    methods: Vec<Method>,
    pattern: String,
    display_name: Option<String>,
    order: i32,
    parameters: Vec<ParameterDescriptor>,
    parameter_types: Vec<&'static str>,
    required_binders: Vec<RequiredBinder>,
    handler: ErasedHandler,
}

impl EndpointBuilder {
    pub(crate) fn new<H, Args>(methods: Vec<Method>, pattern: String, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        Self {
            methods,
            pattern,
            display_name: None,
            order: 0,
            parameters: Vec::new(),
            parameter_types: H::parameter_types(),
            required_binders: H::required_binders(),
            handler: erase(handler),
        }
    }

    /// Describes the next handler argument.
    pub fn parameter(&mut self, descriptor: ParameterDescriptor) -> &mut Self {
        self.parameters.push(descriptor);
        self
    }

    /// Describes several handler arguments at once.
    pub fn with_parameters(
        &mut self,
        descriptors: impl IntoIterator<Item = ParameterDescriptor>,
    ) -> &mut Self {
        self.parameters.extend(descriptors);
        self
    }

    /// Overrides the display name, which defaults to `HTTP: {methods} {pattern}`.
    pub fn with_display_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the route order. Lower orders are matched first.
    pub fn with_order(&mut self, order: i32) -> &mut Self {
        self.order = order;
        self
    }

    pub(crate) fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) const fn order(&self) -> i32 {
        self.order
    }

    fn default_display_name(&self) -> String {
        let methods = self
            .methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!("HTTP: {methods} {}", self.pattern)
    }

    /// Validates the descriptors and required binders against the handler
    /// and freezes the endpoint.
    pub(crate) fn build(self, binders: &BinderRegistry) -> Result<Endpoint, StartupError> {
        let display_name = self
            .display_name
            .clone()
            .unwrap_or_else(|| self.default_display_name());

        if self.parameters.len() != self.parameter_types.len() {
            return Err(StartupError::ParameterCountMismatch {
                endpoint: display_name,
                expected: self.parameter_types.len(),
                actual: self.parameters.len(),
            });
        }

        if let Some(missing) = self
            .required_binders
            .iter()
            .find(|required| !required.is_met(binders))
        {
            return Err(StartupError::MissingBinder {
                endpoint: display_name,
                type_name: missing.type_name(),
            });
        }

        let parameters: Arc<[ParameterDescriptor]> = self
            .parameters
            .into_iter()
            .zip(self.parameter_types)
            .enumerate()
            .map(|(position, (descriptor, type_name))| {
                descriptor
                    .with_position(position)
                    .with_type_name(type_name)
            })
            .collect();

        Ok(Endpoint {
            metadata: Arc::new(EndpointMetadata::new(
                display_name,
                self.pattern,
                self.order,
                self.methods,
            )),
            parameters,
            handler: self.handler,
        })
    }
}

impl std::fmt::Debug for EndpointBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("methods", &self.methods)
            .field("pattern", &self.pattern)
            .field("order", &self.order)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A frozen endpoint.
pub(crate) struct Endpoint {
    pub(crate) metadata: Arc<EndpointMetadata>,
    pub(crate) parameters: Arc<[ParameterDescriptor]>,
    pub(crate) handler: ErasedHandler,
}
