//! Integration tests for binder selection and default fallback.

use std::cell::Cell;
use std::sync::Arc;

use async_trait::async_trait;
use bindery_binding::{
    bind_parameter, BinderRegistry, DefaultBindable, ExtractionError, ExtractionSource, Model,
    Outcome, ParameterBinder, ParameterDescriptor,
};
use bindery_core::{AbortSignal, Container, ContainerBuilder, InvocationContext, InvocationContextBuilder};
use http::StatusCode;
use proptest::prelude::*;

// Each test runs on its own thread with a current-thread runtime, so
// per-thread counters keep parallel tests from observing each other.
thread_local! {
    static DEFAULT_CALLS: Cell<usize> = const { Cell::new(0) };
    static CUSTOM_CALLS: Cell<usize> = const { Cell::new(0) };
}

fn bump(counter: &'static std::thread::LocalKey<Cell<usize>>) {
    counter.with(|c| c.set(c.get() + 1));
}

fn count(counter: &'static std::thread::LocalKey<Cell<usize>>) -> usize {
    counter.with(Cell::get)
}

#[derive(Debug, Clone, PartialEq)]
struct Widget {
    id: u32,
    source: &'static str,
}

impl DefaultBindable for Widget {
    fn bind_default(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, ExtractionError> {
        bump(&DEFAULT_CALLS);
        let raw = ctx
            .query_value(parameter.name())
            .ok_or_else(|| ExtractionError::missing(ExtractionSource::Query, parameter.name()))?;
        let id = raw
            .parse()
            .map_err(|_| ExtractionError::invalid_type(ExtractionSource::Query, parameter.name(), raw))?;
        Ok(Self {
            id,
            source: "default",
        })
    }
}

struct HeaderWidgetBinder;

#[async_trait]
impl ParameterBinder<Widget> for HeaderWidgetBinder {
    async fn bind(&self, ctx: &InvocationContext, _: &ParameterDescriptor) -> Outcome<Widget> {
        bump(&CUSTOM_CALLS);
        match ctx.header("x-widget").and_then(|v| v.parse().ok()) {
            Some(id) => Outcome::Success(Widget {
                id,
                source: "custom",
            }),
            None => Outcome::failure(StatusCode::UNPROCESSABLE_ENTITY, "x-widget header required"),
        }
    }
}

/// Echoes one query value back.
#[derive(Debug, Clone, PartialEq)]
struct Echo(String);

impl DefaultBindable for Echo {
    fn bind_default(
        ctx: &InvocationContext,
        parameter: &ParameterDescriptor,
    ) -> Result<Self, ExtractionError> {
        ctx.query_value(parameter.name())
            .map(Echo)
            .ok_or_else(|| ExtractionError::missing(ExtractionSource::Query, parameter.name()))
    }
}

fn services_with_widget_binder() -> Arc<Container> {
    let mut registry = BinderRegistry::builder();
    registry
        .register::<Widget, _>(HeaderWidgetBinder)
        .expect("first registration succeeds");

    let mut services = ContainerBuilder::new();
    services
        .register(Arc::new(registry.build()))
        .expect("registry registers once");
    Arc::new(services.build())
}

#[tokio::test]
async fn test_custom_binder_excludes_default() {
    let before = count(&DEFAULT_CALLS);

    let ctx = InvocationContextBuilder::new()
        .uri("/widgets?widget=1")
        .header("x-widget", "77")
        .services(services_with_widget_binder())
        .build();

    let Model(widget) = Model::<Widget>::bind(&ctx, &ParameterDescriptor::query("widget"))
        .await
        .expect("custom binder succeeds");

    assert_eq!(
        widget,
        Widget {
            id: 77,
            source: "custom"
        }
    );
    assert_eq!(count(&DEFAULT_CALLS), before);
}

#[tokio::test]
async fn test_custom_binder_failure_does_not_fall_back() {
    let before = count(&DEFAULT_CALLS);

    // The query would satisfy the default convention, but the custom binder
    // owns `Widget` and refuses.
    let ctx = InvocationContextBuilder::new()
        .uri("/widgets?widget=1")
        .services(services_with_widget_binder())
        .build();

    let err = Model::<Widget>::bind(&ctx, &ParameterDescriptor::query("widget"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(count(&DEFAULT_CALLS), before);
}

#[tokio::test]
async fn test_default_used_without_registration() {
    let ctx = InvocationContextBuilder::new()
        .uri("/widgets?widget=5")
        .build();

    let outcome = bind_parameter::<Widget>(&ctx, &ParameterDescriptor::query("widget")).await;
    assert_eq!(
        outcome,
        Outcome::Success(Widget {
            id: 5,
            source: "default"
        })
    );
}

#[tokio::test]
async fn test_integer_success_and_bad_request() {
    let ok = InvocationContextBuilder::new().uri("/items?id=42").build();
    let Model(id) = Model::<i32>::bind(&ok, &ParameterDescriptor::query("id"))
        .await
        .unwrap();
    assert_eq!(id, 42);

    let bad = InvocationContextBuilder::new().uri("/items?id=abc").build();
    let err = Model::<i32>::bind(&bad, &ParameterDescriptor::query("id"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "BadRequestError: Bad request");
}

#[tokio::test]
async fn test_concurrent_requests_are_isolated() {
    let services = services_with_widget_binder();

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let services = Arc::clone(&services);
            tokio::spawn(async move {
                let ctx = InvocationContextBuilder::new()
                    .uri(&format!("/echo?value=req-{i}"))
                    .header("x-widget", &i.to_string())
                    .services(services)
                    .build();

                tokio::task::yield_now().await;
                let echo = Model::<Echo>::bind(&ctx, &ParameterDescriptor::query("value"))
                    .await
                    .unwrap();
                let widget = Model::<Widget>::bind(&ctx, &ParameterDescriptor::query("w"))
                    .await
                    .unwrap();
                (i, echo.into_inner(), widget.into_inner())
            })
        })
        .collect();

    for task in tasks {
        let (i, echo, widget) = task.await.unwrap();
        assert_eq!(echo, Echo(format!("req-{i}")));
        assert_eq!(widget.id, i);
    }
}

#[tokio::test]
async fn test_abort_skips_binder() {
    let before = count(&CUSTOM_CALLS);
    let (handle, signal) = AbortSignal::pair();
    handle.abort();

    let ctx = InvocationContextBuilder::new()
        .header("x-widget", "1")
        .services(services_with_widget_binder())
        .abort(signal)
        .build();

    let err = Model::<Widget>::bind(&ctx, &ParameterDescriptor::query("widget"))
        .await
        .unwrap_err();

    assert!(err.is_aborted());
    assert_eq!(count(&CUSTOM_CALLS), before);
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_binding_is_repeatable(value in any::<i64>()) {
        let ctx = InvocationContextBuilder::new()
            .uri(&format!("/items?id={value}"))
            .build();
        let param = ParameterDescriptor::query("id");

        let first = block_on(bind_parameter::<i64>(&ctx, &param));
        let second = block_on(bind_parameter::<i64>(&ctx, &param));

        prop_assert_eq!(&first, &Outcome::Success(value));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_non_numeric_is_bad_request(raw in "[a-z]{1,12}") {
        let ctx = InvocationContextBuilder::new()
            .uri(&format!("/items?id={raw}"))
            .build();

        let outcome = block_on(bind_parameter::<i32>(&ctx, &ParameterDescriptor::query("id")));
        prop_assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
    }
}
