//! HTTP/1.1 server.
//!
//! The server accepts TCP connections and serves each on its own task with
//! hyper. Request bodies are collected in full (bounded by the request
//! timeout and by the body limit, answering `413` past it) and handed to the [`Application`] together with a per-request
//! abort signal that fires when shutdown begins.
//!
//! # Example
//!
//! ```rust,no_run
//! use bindery_host::{Application, Server, ServerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = Application::builder();
//! builder.map_get("/", || async { "hello" });
//!
//! let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//! Server::new(builder.build()?, config).run().await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;

use bindery_core::AbortSignal;
use bindery_results::{empty, Response};
use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::app::Application;
use crate::config::ServerConfig;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// Binding the listener failed.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// I/O failure.
        source: std::io::Error,
    },

    /// Reading the listener's local address failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves an [`Application`] over HTTP/1.1.
#[derive(Debug, Clone)]
pub struct Server {
    app: Application,
    config: ServerConfig,
}

impl Server {
    /// Creates a server for `app`.
    #[must_use]
    pub fn new(app: Application, config: ServerConfig) -> Self {
        Self { app, config }
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then waits up to the shutdown timeout for connections to close.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        tracing::info!(addr = %listener.local_addr()?, environment = %self.app.environment(), "server listening");

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let token = tracker.acquire();
                        let server = self.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(error) = server.serve_connection(stream, shutdown).await {
                                tracing::debug!(%remote_addr, %error, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(error) => tracing::error!(%error, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = self.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout_ms = u64::try_from(shutdown_timeout.as_millis()).unwrap_or(u64::MAX),
            "waiting for connections to close"
        );
        tokio::select! {
            () = tracker.wait_for_shutdown() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(active = tracker.active_connections(), "shutdown timeout reached");
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = self.clone();
        let request_shutdown = shutdown.clone();
        let service = service_fn(move |request: Request<Incoming>| {
            let server = server.clone();
            let shutdown = request_shutdown.clone();
            async move { Ok::<_, Infallible>(server.handle_request(request, shutdown).await) }
        });

        let connection = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    async fn handle_request(
        &self,
        request: Request<Incoming>,
        shutdown: ShutdownSignal,
    ) -> http::Response<Full<Bytes>> {
        let timeout = self.config.request_timeout();
        let (parts, body) = request.into_parts();

        let limit = self.config.max_body_bytes();
        let body = Limited::new(body, limit).collect();

        let body = match tokio::time::timeout(timeout, body).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(error)) if error.is::<LengthLimitError>() => {
                tracing::warn!(path = parts.uri.path(), limit, "request body too large");
                return into_http(empty(StatusCode::PAYLOAD_TOO_LARGE));
            }
            Ok(Err(error)) => {
                tracing::warn!(%error, "failed to read request body");
                return into_http(empty(StatusCode::BAD_REQUEST));
            }
            Err(_) => {
                tracing::warn!(path = parts.uri.path(), "request body timed out");
                return into_http(empty(StatusCode::REQUEST_TIMEOUT));
            }
        };

        let (abort, signal) = AbortSignal::pair();
        let handling = self
            .app
            .handle_with_abort(Request::from_parts(parts, body), signal);
        tokio::pin!(handling);

        let run = async {
            tokio::select! {
                response = &mut handling => response,
                () = shutdown.recv() => {
                    abort.abort();
                    (&mut handling).await
                }
            }
        };

        match tokio::time::timeout(timeout, run).await {
            Ok(response) => into_http(response),
            Err(_) => {
                tracing::warn!("handler timed out");
                into_http(empty(StatusCode::GATEWAY_TIMEOUT))
            }
        }
    }
}

fn into_http(response: Response) -> http::Response<Full<Bytes>> {
    response.map(Full::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::InvalidAddress {
            addr: "nope".to_string(),
            source: "nope".parse::<SocketAddr>().unwrap_err(),
        };
        assert!(err.to_string().starts_with("invalid address 'nope'"));
    }

    #[tokio::test]
    async fn test_invalid_address_is_reported() {
        let app = Application::builder().build().unwrap();
        let config = ServerConfig::builder().http_addr("localhost").build();

        let err = Server::new(app, config)
            .run_with_shutdown(ShutdownSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }
}
