//! In-memory client.

use bindery_core::AbortSignal;
use bindery_host::Application;
use http::Method;
use serde::Serialize;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight to [`Application::handle`], without a socket.
///
/// ```
/// use bindery_binding::{Model, ParameterDescriptor};
/// use bindery_host::Application;
/// use bindery_test::TestClient;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut builder = Application::builder();
/// builder
///     .map_get("/items", |id: Model<i32>| async move { format!("item {}", *id) })
///     .parameter(ParameterDescriptor::query("id"));
/// let client = TestClient::new(builder.build().unwrap());
///
/// let response = client.get("/items").query(&[("id", "7")]).send().await;
/// assert_eq!(response.text().unwrap(), "item 7");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TestClient {
    app: Application,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps a built application.
    #[must_use]
    pub fn new(app: Application) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header to every request.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The wrapped application.
    #[must_use]
    pub fn app(&self) -> &Application {
        &self.app
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
            abort: AbortSignal::never(),
        }
    }
}

/// A request bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
    abort: AbortSignal,
}

impl TestClientRequest<'_> {
    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets `Accept`.
    pub fn accept(mut self, accept: impl AsRef<str>) -> Self {
        self.builder = self.builder.accept(accept);
        self
    }

    /// Sets `Content-Type`.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Appends query parameters.
    pub fn query<T: Serialize>(mut self, params: &T) -> Self {
        self.builder = self.builder.query(params);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets a form body.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Handles the request under `abort`.
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(error) => panic!("failed to build test request: {error}"),
        }
    }

    /// Sends the request, reporting build failures.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        let response = self.client.app.handle_with_abort(request, self.abort).await;
        Ok(TestResponse::from_http(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_binding::{Model, ParameterDescriptor};
    use http::StatusCode;

    fn client() -> TestClient {
        let mut builder = Application::builder();
        builder
            .map_get("/greet", |name: Model<String>| async move {
                format!("hello {}", name.into_inner())
            })
            .parameter(ParameterDescriptor::header("x-name"));
        TestClient::new(builder.build().unwrap())
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        let response = client()
            .with_default_header("x-name", "ada")
            .get("/greet")
            .send()
            .await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.text().unwrap(), "hello ada");
        assert!(response.request_id().is_some());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = client().delete("/greet").send().await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_try_send_reports_bad_request() {
        let result = client().get("/greet").header("x-name", "bad\nvalue").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_aborted_request() {
        let (handle, signal) = AbortSignal::pair();
        handle.abort();

        let response = client().get("/greet").with_abort(signal).send().await;
        assert_eq!(response.status_code(), 499);
        assert!(response.is_empty());
    }
}
