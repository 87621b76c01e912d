#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ws::Message;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::routing::get as get_route;
use axum::Router;
use http_body_util::BodyExt;
use imagine_api::config::ServerConfig;
use imagine_api::routes;
use imagine_api::state::AppState;
use imagine_core::payload::StatusSnapshot;
use imagine_provider::{AccountInfo, ImageProvider, ProviderApiError};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Semaphore};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub const CORS_ORIGIN: &str = "http://localhost:5000";

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

/// One scripted status response: a raw payload or an HTTP failure code.
pub type ScriptedStatus = Result<Value, u16>;

/// In-memory [`ImageProvider`] that replays scripted answers.
///
/// `imagine`/`button` hand out the queued job ids in order. `fetch_status`
/// pops the next scripted status of that job; once its script is exhausted
/// it keeps answering `PROCESSING`. When gated, every status call first takes a
/// permit from the gate so tests can release poll ticks one at a time.
pub struct FakeProvider {
    job_ids: Mutex<VecDeque<String>>,
    statuses: Mutex<HashMap<String, VecDeque<ScriptedStatus>>>,
    gate: Option<Arc<Semaphore>>,
    configured: bool,
    pub calls: Mutex<Vec<String>>,
    pub status_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            job_ids: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(HashMap::new()),
            gate: None,
            configured: true,
            calls: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_job_ids(self, ids: &[&str]) -> Self {
        self.job_ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_statuses(self, job_id: &str, statuses: Vec<ScriptedStatus>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .extend(statuses);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next_job_id(&self) -> Result<String, ProviderApiError> {
        if !self.configured {
            return Err(ProviderApiError::NotConfigured);
        }
        self.job_ids
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ProviderApiError::MissingJobId)
    }
}

#[async_trait]
impl ImageProvider for FakeProvider {
    async fn imagine(&self, prompt: &str) -> Result<String, ProviderApiError> {
        self.calls.lock().unwrap().push(format!("imagine:{prompt}"));
        self.next_job_id()
    }

    async fn button(&self, job_id: &str, action: &str) -> Result<String, ProviderApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("button:{job_id}:{action}"));
        self.next_job_id()
    }

    async fn fetch_status(&self, job_id: &str) -> Result<StatusSnapshot, ProviderApiError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(format!("status:{job_id}"));

        let next = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(raw)) => Ok(StatusSnapshot::from_payload(raw)),
            Some(Err(status)) => Err(ProviderApiError::ApiError {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(StatusSnapshot::from_payload(
                serde_json::json!({"status": "processing"}),
            )),
        }
    }

    async fn account_info(&self) -> Result<AccountInfo, ProviderApiError> {
        if !self.configured {
            return Err(ProviderApiError::NotConfigured);
        }
        Ok(AccountInfo {
            credits: Some(42.0),
            plan_type: Some("PRO".to_string()),
            ..AccountInfo::default()
        })
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Test `ServerConfig` writing into `output_dir` with a fast poll interval.
pub fn test_config(output_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![CORS_ORIGIN.to_string()],
        request_timeout_secs: 30,
        api_key: "test-key".to_string(),
        provider_base_url: "http://127.0.0.1:9".to_string(),
        output_dir: output_dir.to_string_lossy().into_owned(),
        static_dir: output_dir.join("static").to_string_lossy().into_owned(),
        poll_interval_ms: 10,
        max_poll_attempts: None,
        provider_timeout_secs: 5,
        download_timeout_secs: 5,
    }
}

pub fn build_state(config: ServerConfig, provider: Arc<FakeProvider>) -> AppState {
    AppState::new(config, provider)
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses.
pub fn build_test_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([CORS_ORIGIN.parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");
    let output_dir = state.config.output_dir.clone();

    Router::new()
        .merge(routes::app_routes())
        .nest_service("/output", ServeDir::new(output_dir))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::delete(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    app.oneshot(
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Event helpers
// ---------------------------------------------------------------------------

/// Next text frame queued for a subscriber, parsed as JSON.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Message>) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("channel closed");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip events until one of `kind` arrives.
pub async fn next_event_of(rx: &mut mpsc::UnboundedReceiver<Message>, kind: &str) -> Value {
    loop {
        let event = next_event(rx).await;
        if event["type"] == kind {
            return event;
        }
    }
}

/// Assert that nothing else is queued for the subscriber.
pub async fn assert_no_event(rx: &mut mpsc::UnboundedReceiver<Message>) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Ok(message) = rx.try_recv() {
        panic!("unexpected event: {message:?}");
    }
}

// ---------------------------------------------------------------------------
// Image server
// ---------------------------------------------------------------------------

/// Serve two small PNG payloads at `/1.png` and `/2.png`.
pub async fn spawn_image_server() -> String {
    let app = Router::new()
        .route("/1.png", get_route(|| async { b"fox-one".to_vec() }))
        .route("/2.png", get_route(|| async { b"fox-two".to_vec() }));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind image server");
    let address: SocketAddr = listener.local_addr().expect("image server addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("run image server");
    });
    format!("http://{address}")
}
