//! Integration Tests for the LLM client
//!
//! Runs the OpenAI-compatible client against a local axum server standing
//! in for the upstream API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use clinic_llm_cache::{
    invoker::RetryableError,
    llm::{ChatProvider, ImageProvider, LlmError, OpenAiCompatClient},
    models::{ChatRequest, ChatResponse, ImageRequest, Message},
    InvokeOptions, RetryPolicy, RetryableInvoker, TtlCache,
};
use serde_json::{json, Value};

// == Fake Upstream ==

#[derive(Clone)]
struct Upstream {
    calls: Arc<AtomicU32>,
    /// Statuses returned for the first calls, in order
    failures: Arc<Vec<StatusCode>>,
    /// Last request body and authorization header seen
    last: Arc<tokio::sync::Mutex<Option<(Value, Option<String>)>>>,
    delay: Duration,
    /// Error message returned with each scripted failure
    message: &'static str,
}

impl Upstream {
    fn new(failures: Vec<StatusCode>) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures: Arc::new(failures),
            last: Arc::new(tokio::sync::Mutex::new(None)),
            delay: Duration::ZERO,
            message: "scripted failure",
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn completions(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = upstream.calls.fetch_add(1, Ordering::SeqCst) as usize;
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    *upstream.last.lock().await = Some((body, auth));

    if !upstream.delay.is_zero() {
        tokio::time::sleep(upstream.delay).await;
    }

    match upstream.failures.get(n) {
        Some(&status) => (status, Json(json!({"error": {"message": upstream.message}}))),
        None => (
            StatusCode::OK,
            Json(json!({
                "model": "fake-model",
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })),
        ),
    }
}

async fn generations(
    State(upstream): State<Upstream>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = upstream.calls.fetch_add(1, Ordering::SeqCst) as usize;
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    *upstream.last.lock().await = Some((body, None));

    match upstream.failures.get(n) {
        Some(&status) => (status, Json(json!({"error": {"message": upstream.message}}))),
        None => (
            StatusCode::OK,
            Json(json!({"data": [{"url": format!("https://cdn.test/{}.png", prompt)}]})),
        ),
    }
}

/// Serves `upstream` on an ephemeral port and returns its base URL.
async fn spawn_upstream(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .route("/v1/images/generations", post(generations))
        .with_state(upstream);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, timeout: Duration) -> OpenAiCompatClient {
    OpenAiCompatClient::new(base_url, Some("sk-test".to_string()), "fake-model", timeout).unwrap()
}

fn hello() -> ChatRequest {
    ChatRequest::new(vec![Message::user("hello")])
}

// == Client Tests ==

#[tokio::test]
async fn test_client_success() {
    let upstream = Upstream::new(vec![]);
    let base = spawn_upstream(upstream.clone()).await;

    let response = client(&base, Duration::from_secs(5))
        .complete(&hello())
        .await
        .unwrap();

    assert_eq!(response.text, "ok");
    assert_eq!(response.model.as_deref(), Some("fake-model"));

    let (body, auth) = upstream.last.lock().await.clone().unwrap();
    assert_eq!(body["model"], "fake-model");
    assert_eq!(body["messages"][0]["content"], "hello");
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
}

#[tokio::test]
async fn test_client_status_error_carries_reason() {
    let upstream = Upstream::new(vec![StatusCode::SERVICE_UNAVAILABLE]);
    let base = spawn_upstream(upstream).await;

    let err = client(&base, Duration::from_secs(5))
        .complete(&hello())
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Status { status: 503, .. }));
    let message = err.to_string();
    assert!(message.contains("503 Service Unavailable"), "{message}");
    assert!(message.contains("scripted failure"), "{message}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_client_timeout_is_retryable() {
    let mut upstream = Upstream::new(vec![]);
    upstream.delay = Duration::from_millis(500);
    let base = spawn_upstream(upstream).await;

    let err = client(&base, Duration::from_millis(50))
        .complete(&hello())
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Timeout(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_client_connection_refused_is_transport_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr), Duration::from_secs(5))
        .complete(&hello())
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Transport(_)));
}

#[tokio::test]
async fn test_client_generates_image() {
    let upstream = Upstream::new(vec![]);
    let base = spawn_upstream(upstream.clone()).await;

    let mut req = ImageRequest::new("lobby");
    req.size = Some("512x512".to_string());
    let url = client(&base, Duration::from_secs(5))
        .with_image_model("img-model")
        .generate_image(&req)
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.test/lobby.png");
    let (body, _) = upstream.last.lock().await.clone().unwrap();
    assert_eq!(body["model"], "img-model");
    assert_eq!(body["size"], "512x512");
}

// == End-to-End ==

#[tokio::test]
async fn test_invoker_over_real_client() {
    let upstream = Upstream::new(vec![StatusCode::SERVICE_UNAVAILABLE]);
    let base = spawn_upstream(upstream.clone()).await;
    let llm = client(&base, Duration::from_secs(5));

    let cache: Arc<TtlCache<ChatResponse>> = Arc::new(TtlCache::new(
        "responses",
        Duration::from_secs(60),
        Duration::from_secs(60),
    ));
    let invoker = RetryableInvoker::new(cache, RetryPolicy::default());
    let options = InvokeOptions::new()
        .with_max_retries(1)
        .with_retry_delay(Duration::from_millis(10));
    let req = hello();

    let first = invoker
        .invoke(&req, || llm.complete(&req), options.clone())
        .await
        .unwrap();
    assert_eq!(first.payload.text, "ok");
    assert!(!first.from_cache);
    assert_eq!(first.retry_count, 1);

    let second = invoker
        .invoke(&req, || llm.complete(&req), options)
        .await
        .unwrap();
    assert_eq!(second.payload.text, "ok");
    assert!(second.from_cache);
    assert_eq!(second.retry_count, 0);

    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_invoker_does_not_retry_client_errors() {
    let upstream = Upstream::new(vec![StatusCode::BAD_REQUEST]);
    let base = spawn_upstream(upstream.clone()).await;
    let llm = client(&base, Duration::from_secs(5));

    let invoker: RetryableInvoker<ChatResponse> = RetryableInvoker::new(
        Arc::new(TtlCache::without_sweep("responses", Duration::from_secs(60))),
        RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(1),
        },
    );
    let req = hello();

    let err = invoker
        .invoke(&req, || llm.complete(&req), InvokeOptions::new())
        .await
        .unwrap_err();

    let err = err.into_call().unwrap();
    assert!(matches!(err, LlmError::Status { status: 400, .. }));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_invoker_ignores_status_codes_in_error_body() {
    let mut upstream = Upstream::new(vec![StatusCode::BAD_REQUEST]);
    upstream.message = "messages: at most 500 items (request req_4291)";
    let base = spawn_upstream(upstream.clone()).await;
    let llm = client(&base, Duration::from_secs(5));

    let invoker: RetryableInvoker<ChatResponse> = RetryableInvoker::new(
        Arc::new(TtlCache::without_sweep("responses", Duration::from_secs(60))),
        RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(1),
        },
    );
    let req = hello();

    let err = invoker
        .invoke(&req, || llm.complete(&req), InvokeOptions::new())
        .await
        .unwrap_err()
        .into_call()
        .unwrap();

    assert!(err.to_string().contains("500 items"));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_invoker_retries_overloaded_status() {
    let overloaded = StatusCode::from_u16(529).unwrap();
    let upstream = Upstream::new(vec![overloaded, StatusCode::NOT_IMPLEMENTED]);
    let base = spawn_upstream(upstream.clone()).await;
    let llm = client(&base, Duration::from_secs(5));

    let invoker: RetryableInvoker<ChatResponse> = RetryableInvoker::new(
        Arc::new(TtlCache::without_sweep("responses", Duration::from_secs(60))),
        RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(1),
        },
    );
    let req = hello();

    let result = invoker
        .invoke(&req, || llm.complete(&req), InvokeOptions::new())
        .await
        .unwrap();

    assert_eq!(result.payload.text, "ok");
    assert_eq!(result.retry_count, 2);
    assert_eq!(upstream.calls(), 3);
}
