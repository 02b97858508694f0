//! The playground application end to end, through the in-memory client.

use bindery::host::Environment;
use bindery::playground::{playground_app, Todo};
use bindery_test::TestClient;
use http::StatusCode;
use proptest::prelude::*;
use serde_json::{json, Value};

fn client(environment: Environment) -> TestClient {
    TestClient::new(playground_app(environment).unwrap())
}

#[tokio::test]
async fn test_malformed_integer_answers_problem_json() {
    let response = client(Environment::Development)
        .get("/items?id=abc")
        .accept("application/json")
        .send()
        .await;

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_header("content-type", "application/problem+json");

    let body = response.json_value().unwrap();
    assert_eq!(body["status"], 400);
    assert_eq!(body["requestId"].as_str(), response.request_id());
}

#[tokio::test]
async fn test_integer_binds_and_handler_runs() {
    let response = client(Environment::Development).get("/items?id=42").send().await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.text().unwrap(), "item 42");
}

#[tokio::test]
async fn test_custom_binder_wins_over_request_data() {
    let client = client(Environment::Development);

    for uri in ["/widget", "/widget?widget=gear"] {
        let response = client.get(uri).send().await;
        response.assert_status(StatusCode::OK);
        assert_eq!(
            response.json_value().unwrap(),
            json!({"name": "My Widget", "size": 12})
        );
    }
}

#[tokio::test]
async fn test_production_hides_error_details() {
    let response = client(Environment::Production)
        .get("/items?id=abc")
        .accept("application/json")
        .send()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.is_empty());
}

#[tokio::test]
async fn test_todos_round_trip() {
    let client = client(Environment::Development);

    let todos: Vec<Todo> = client.get("/todos").send().await.json().unwrap();
    assert_eq!(todos.len(), 3);

    let created = client
        .post("/todos")
        .json(&json!({"title": "Walk the dog"}))
        .send()
        .await;
    created
        .assert_status(StatusCode::CREATED)
        .assert_header("location", "/todos/4")
        .assert_header("content-type", "application/json");

    let todo: Todo = client.get("/todos/4").send().await.json().unwrap();
    assert_eq!(todo.title, "Walk the dog");
    assert!(!todo.is_complete);
}

#[tokio::test]
async fn test_xml_created_result() {
    let response = client(Environment::Development)
        .post("/todos/xml")
        .json(&json!({"title": "File taxes", "isComplete": true}))
        .send()
        .await;

    response
        .assert_status(StatusCode::CREATED)
        .assert_header("content-type", "application/xml");
    assert!(response
        .text()
        .unwrap()
        .ends_with("<Todo><id>4</id><title>File taxes</title><isComplete>true</isComplete></Todo>"));
}

#[tokio::test]
async fn test_missing_todo_is_problem() {
    let response = client(Environment::Production).get("/todos/99").send().await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.json_value().unwrap();
    assert_eq!(body["title"], "Not Found");
    assert_eq!(body["detail"], "Todo 99 does not exist");
}

#[tokio::test]
async fn test_route_values_are_percent_decoded() {
    let client = client(Environment::Development);

    let response = client.get("/todos/%31").send().await;
    response.assert_status(StatusCode::OK);
    let todo: Todo = response.json().unwrap();
    assert_eq!(todo.id, 1);
    assert_eq!(todo.title, "Wash the dishes");
}

#[tokio::test]
async fn test_todo_route_value_must_be_integer() {
    let response = client(Environment::Development)
        .get("/todos/first")
        .accept("application/json")
        .send()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json_value().unwrap()["status"], 400);
}

#[tokio::test]
async fn test_html_and_problem_endpoints() {
    let client = client(Environment::Development);

    let html = client.get("/html").send().await;
    html.assert_status(StatusCode::OK);
    assert!(html.content_type().unwrap().starts_with("text/html"));
    assert!(html.text().unwrap().contains("Hello from Bindery"));

    let problem = client.get("/problem").send().await;
    problem.assert_status(StatusCode::CONFLICT);
    let body = problem.json_value().unwrap();
    assert_eq!(body["hint"], "try /todos");
    assert_eq!(body["instance"], "/problem");
}

#[tokio::test]
async fn test_unhandled_error() {
    let client = client(Environment::Development);

    let response = client.get("/throw").accept("application/json").send().await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().unwrap();
    assert_eq!(body["status"], 500);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("this endpoint always fails"));

    let page = client.get("/throw").accept("text/html").send().await;
    page.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(page.content_type(), Some("application/problem+json"));
}

proptest! {
    #[test]
    fn prop_any_integer_binds(id in any::<i32>()) {
        let response = tokio_test::block_on(
            client(Environment::Production).get(format!("/items?id={id}")).send(),
        );
        prop_assert_eq!(response.status(), StatusCode::OK);
        prop_assert_eq!(response.text().unwrap(), format!("item {id}"));
    }
}
