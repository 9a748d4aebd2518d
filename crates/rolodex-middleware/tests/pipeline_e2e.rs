//! End-to-end pipeline integration tests.
//!
//! These tests run requests through the standard stages together:
//!
//! 1. Request log - span and one record per request
//! 2. In-flight - gauge per operation
//! 3. Response metrics - duration histogram and counter per status
//! 4. Recovery - panics become 500 responses

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::Full;
use parking_lot::Mutex;
use rolodex_core::Operation;
use rolodex_middleware::{
    standard_pipeline, BoxFuture, InFlightMiddleware, MiddlewareContext, Pipeline,
    RecordSink, Recovered, RecoveryMiddleware, Request, RequestLogMiddleware, RequestRecord, Response,
    ResponseExt, ResponseMetricsMiddleware,
};
use rolodex_telemetry::{series, MetricsRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

/// Creates a test request.
fn make_request(method: Method, path: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Standard stage order with a recording log sink.
fn recording_pipeline(registry: &Arc<MetricsRegistry>) -> (Pipeline, Arc<Mutex<Vec<RequestRecord>>>) {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink_records = records.clone();
    let sink: RecordSink = Arc::new(move |r: &RequestRecord| sink_records.lock().push(r.clone()));

    let pipeline = Pipeline::builder()
        .with(RequestLogMiddleware::with_sink(sink))
        .with(InFlightMiddleware::new(registry.clone()))
        .with(ResponseMetricsMiddleware::new(registry.clone()))
        .with(RecoveryMiddleware::with_callback(Arc::new(
            |_: &MiddlewareContext, _: &Recovered| {},
        )))
        .build();

    (pipeline, records)
}

fn context(op: &Arc<Operation>) -> MiddlewareContext {
    MiddlewareContext::new().with_operation(op.clone())
}

fn teapot(_ctx: &mut MiddlewareContext, _req: Request) -> BoxFuture<'static, Response> {
    Box::pin(async { Response::empty(StatusCode::IM_A_TEAPOT) })
}

fn panicking(_ctx: &mut MiddlewareContext, _req: Request) -> BoxFuture<'static, Response> {
    panic!("panic argument")
}

fn in_flight(registry: &MetricsRegistry, method: &str, path: &str) -> i64 {
    registry
        .get_or_create_gauge(&series(
            "http_requests_in_flight",
            &[("method", method), ("path", path)],
        ))
        .get()
}

#[test]
fn test_standard_stage_order() {
    let pipeline = standard_pipeline(Arc::new(MetricsRegistry::new()));
    assert_eq!(
        pipeline.stage_names(),
        vec!["request_log", "in_flight", "response_metrics", "recovery"]
    );
    assert_eq!(pipeline.stage_count(), 4);
}

#[tokio::test]
async fn test_teapot_42_times() {
    let registry = Arc::new(MetricsRegistry::new());
    let pipeline = standard_pipeline(registry.clone());
    let op = Arc::new(Operation::new(Method::GET, "/teapot"));

    for _ in 0..42 {
        let response = pipeline
            .process(context(&op), make_request(Method::GET, "/teapot"), teapot)
            .await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    let text = registry.render();
    assert!(text.contains(
        "http_requests_total{method=\"GET\",path=\"/teapot\",status=\"418\"} 42\n"
    ));
    for le in ["0.001", "0.005", "0.025", "0.125", "0.625", "3.125", "+Inf"] {
        let line = format!(
            "http_request_duration_seconds_bucket{{method=\"GET\",path=\"/teapot\",status=\"418\",le=\"{le}\"}} 42\n"
        );
        assert!(text.contains(&line), "missing {line}");
    }
    assert!(text.contains(
        "http_request_duration_seconds_count{method=\"GET\",path=\"/teapot\",status=\"418\"} 42\n"
    ));
    assert!(text.contains("http_requests_in_flight{method=\"GET\",path=\"/teapot\"} 0\n"));
    assert!(text.contains("# TYPE http_request_duration_seconds histogram\n"));
    assert!(text.contains("# TYPE http_requests_total counter\n"));
    assert!(text.contains("# TYPE http_requests_in_flight gauge\n"));
}

#[tokio::test]
async fn test_render_is_idempotent() {
    let registry = Arc::new(MetricsRegistry::new());
    let pipeline = standard_pipeline(registry.clone());

    for path in ["/b", "/a", "/c"] {
        let op = Arc::new(Operation::new(Method::GET, path));
        pipeline
            .process(context(&op), make_request(Method::GET, path), teapot)
            .await;
    }

    let first = registry.render();
    let second = registry.render();
    assert_eq!(first, second);

    // series within a family are sorted by label set
    let a = first.find("path=\"/a\"").unwrap();
    let b = first.find("path=\"/b\"").unwrap();
    assert!(a < b);
}

#[tokio::test]
async fn test_panic_becomes_500_and_is_logged_and_counted() {
    let registry = Arc::new(MetricsRegistry::new());
    let (pipeline, records) = recording_pipeline(&registry);
    let op = Arc::new(Operation::new(Method::GET, "/api/panic"));

    let response = pipeline
        .process(context(&op), make_request(Method::GET, "/api/panic"), panicking)
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    {
        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    let total = registry.get_or_create_counter(&series(
        "http_requests_total",
        &[("method", "GET"), ("path", "/api/panic"), ("status", "500")],
    ));
    assert_eq!(total.get(), 1);
    assert_eq!(in_flight(&registry, "GET", "/api/panic"), 0);

    // the pipeline keeps serving
    let op = Arc::new(Operation::new(Method::GET, "/teapot"));
    let response = pipeline
        .process(context(&op), make_request(Method::GET, "/teapot"), teapot)
        .await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(records.lock().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_leave_in_flight_at_zero() {
    const REQUESTS: usize = 32;

    let registry = Arc::new(MetricsRegistry::new());
    let pipeline = Arc::new(standard_pipeline(registry.clone()));
    let op = Arc::new(Operation::new(Method::GET, "/api/contacts"));

    let entered = Arc::new(Barrier::new(REQUESTS + 1));
    let release = Arc::new(Barrier::new(REQUESTS + 1));

    let mut tasks = Vec::with_capacity(REQUESTS);
    for _ in 0..REQUESTS {
        let pipeline = pipeline.clone();
        let op = op.clone();
        let entered = entered.clone();
        let release = release.clone();
        tasks.push(tokio::spawn(async move {
            pipeline
                .process(
                    context(&op),
                    make_request(Method::GET, "/api/contacts"),
                    move |_ctx, _req| {
                        Box::pin(async move {
                            entered.wait().await;
                            release.wait().await;
                            Response::empty(StatusCode::OK)
                        })
                    },
                )
                .await
        }));
    }

    entered.wait().await;
    assert_eq!(
        in_flight(&registry, "GET", "/api/contacts"),
        REQUESTS as i64
    );
    release.wait().await;

    for task in tasks {
        assert_eq!(task.await.unwrap().status(), StatusCode::OK);
    }
    assert_eq!(in_flight(&registry, "GET", "/api/contacts"), 0);

    let total = registry.get_or_create_counter(&series(
        "http_requests_total",
        &[("method", "GET"), ("path", "/api/contacts"), ("status", "200")],
    ));
    assert_eq!(total.get(), REQUESTS as u64);
}

#[tokio::test]
async fn test_cancelled_request_releases_in_flight() {
    let registry = Arc::new(MetricsRegistry::new());
    let pipeline = standard_pipeline(registry.clone());
    let op = Arc::new(Operation::new(Method::GET, "/slow"));

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        pipeline.process(context(&op), make_request(Method::GET, "/slow"), |_ctx, _req| {
            Box::pin(std::future::pending::<Response>())
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(in_flight(&registry, "GET", "/slow"), 0);
}

#[tokio::test]
async fn test_handler_runs_inside_request_span() {
    let _subscriber = tracing::subscriber::set_default(tracing_subscriber::registry());

    let registry = Arc::new(MetricsRegistry::new());
    let pipeline = standard_pipeline(registry);
    let op = Arc::new(Operation::new(Method::GET, "/span"));

    let seen = Arc::new(Mutex::new(None));
    let seen_in_handler = seen.clone();
    pipeline
        .process(
            context(&op),
            make_request(Method::GET, "/span"),
            move |ctx, _req| {
                let stored = ctx.span().metadata().map(|m| m.name());
                let current = tracing::Span::current().metadata().map(|m| m.name());
                *seen_in_handler.lock() = Some((stored, current));
                Box::pin(async { Response::empty(StatusCode::OK) })
            },
        )
        .await;

    assert_eq!(*seen.lock(), Some((Some("request"), Some("request"))));
}
