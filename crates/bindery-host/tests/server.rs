//! End-to-end tests over a real TCP socket.

use std::time::Duration;

use bindery_binding::{Model, ParameterDescriptor};
use bindery_host::{Application, Environment, Server, ServerConfig, ShutdownSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn double(n: Model<i64>) -> String {
    (*n * 2).to_string()
}

fn app() -> Application {
    let mut builder = Application::builder();
    builder
        .environment(Environment::Development)
        .add_problem_details_exception_filter();
    builder
        .map_get("/double", double)
        .parameter(ParameterDescriptor::query("n"));
    builder
        .map_post("/echo", |body: Model<String>| async move { body.into_inner() })
        .parameter(ParameterDescriptor::body("body"));
    builder.build().unwrap()
}

async fn send(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_serves_requests_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();

    let config = ServerConfig::builder()
        .shutdown_timeout(Duration::from_secs(1))
        .build();
    let server = tokio::spawn(Server::new(app(), config).serve(listener, shutdown.clone()));

    let response = send(
        addr,
        "GET /double?n=21 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.to_ascii_lowercase().contains("x-request-id: "));
    assert!(response.ends_with("42"));

    let response = send(
        addr,
        "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    assert!(response.ends_with("hello"), "{response}");

    let response = send(
        addr,
        "GET /double?n=x HTTP/1.1\r\nHost: localhost\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request"), "{response}");
    assert!(response.contains("application/problem+json"));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();

    let config = ServerConfig::builder()
        .max_body_bytes(16)
        .shutdown_timeout(Duration::from_secs(1))
        .build();
    let server = tokio::spawn(Server::new(app(), config).serve(listener, shutdown.clone()));

    let body = "x".repeat(64);
    let response = send(
        addr,
        &format!(
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 413"), "{response}");

    let response = send(
        addr,
        "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 16\r\nConnection: close\r\n\r\nsixteen bytes ok",
    )
    .await;
    assert!(response.ends_with("sixteen bytes ok"), "{response}");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();
}
