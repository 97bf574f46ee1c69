//! Mock generation backends for integration tests
//!
//! Serves a Replicate-style prediction API and a Segmind-style single-call
//! video endpoint from one listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub const IMAGE_TOKEN: &str = "r8_integration";
pub const VIDEO_KEY: &str = "sg_integration";
pub const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42";

/// How the mock job ends
#[derive(Clone)]
pub enum JobOutcome {
    /// Succeeds after `running_polls` non-terminal polls
    Succeed { running_polls: u32, output: Value },
    /// Fails on the first poll with the given error text
    Fail(Option<String>),
}

pub struct MockBackend {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    outcome: JobOutcome,
    submit_count: AtomicU32,
    poll_count: AtomicU32,
    video_count: AtomicU32,
    last_input: std::sync::Mutex<Option<Value>>,
}

impl MockBackend {
    pub async fn start(outcome: JobOutcome) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            outcome,
            submit_count: AtomicU32::new(0),
            poll_count: AtomicU32::new(0),
            video_count: AtomicU32::new(0),
            last_input: std::sync::Mutex::new(None),
        });

        let app = Router::new()
            .route("/predictions", routing::post(handle_submit))
            .route("/predictions/{id}", routing::get(handle_poll))
            .route("/veo-2", routing::post(handle_video))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Start a backend whose jobs succeed on the first poll
    pub async fn succeeding(output: Value) -> anyhow::Result<Self> {
        Self::start(JobOutcome::Succeed {
            running_polls: 0,
            output,
        })
        .await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn submit_count(&self) -> u32 {
        self.state.submit_count.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> u32 {
        self.state.poll_count.load(Ordering::SeqCst)
    }

    pub fn video_count(&self) -> u32 {
        self.state.video_count.load(Ordering::SeqCst)
    }

    /// Input object of the most recent submitted job
    pub fn last_input(&self) -> Option<Value> {
        self.state.last_input.lock().ok()?.clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn authorized(headers: &HeaderMap, name: header::HeaderName, expected: &str) -> bool {
    headers.get(name).and_then(|v| v.to_str().ok()) == Some(expected)
}

async fn handle_submit(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers, header::AUTHORIZATION, &format!("Token {IMAGE_TOKEN}")) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Unauthenticated" }))).into_response();
    }

    state.submit_count.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = state.last_input.lock() {
        *last = body.get("input").cloned();
    }

    (StatusCode::CREATED, Json(json!({ "id": "job-1", "status": "starting" }))).into_response()
}

async fn handle_poll(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    let polls = state.poll_count.fetch_add(1, Ordering::SeqCst) + 1;

    let body = match &state.outcome {
        JobOutcome::Succeed { running_polls, .. } if polls <= *running_polls => {
            json!({ "id": id, "status": "processing", "output": null })
        }
        JobOutcome::Succeed { output, .. } => json!({ "id": id, "status": "succeeded", "output": output }),
        JobOutcome::Fail(error) => json!({ "id": id, "status": "failed", "error": error }),
    };

    Json(body).into_response()
}

async fn handle_video(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers, header::HeaderName::from_static("x-api-key"), VIDEO_KEY) {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response();
    }

    state.video_count.fetch_add(1, Ordering::SeqCst);

    ([(header::CONTENT_TYPE, "video/mp4")], VIDEO_BYTES).into_response()
}
