//! Test utilities for tally-core
//!
//! This module provides testing infrastructure including a mock classification
//! server that can be used for development and integration tests.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::sync::oneshot;

use crate::remote::vendor_label_for;

#[derive(Debug, Default)]
struct ServerState {
    batch_sizes: Vec<usize>,
    fail_all: bool,
    fail_requests: HashSet<usize>,
    delays: HashMap<usize, Duration>,
    delay_all: Option<Duration>,
    truncate: bool,
    malformed: bool,
}

type SharedState = Arc<Mutex<ServerState>>;

/// Mock remote classifier for testing and development
///
/// Answers `POST /classify` with vendor-style labels, records the size of every
/// batch it receives and can be told to fail.
pub struct MockClassifierServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockClassifierServer {
    /// API key the server accepts
    pub const API_KEY: &'static str = "test-api-key";

    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state: SharedState = Arc::new(Mutex::new(ServerState::default()));

        let app = Router::new()
            .route("/classify", post(handle_classify))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full classification endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/classify", self.url())
    }

    /// Sizes of the batches received so far, in arrival order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().batch_sizes.clone()
    }

    /// Make every request fail with a 500
    pub fn fail_all(&self, fail: bool) {
        self.state.lock().unwrap().fail_all = fail;
    }

    /// Make the request with this 0-based index fail with a 500
    pub fn fail_request(&self, index: usize) {
        self.state.lock().unwrap().fail_requests.insert(index);
    }

    /// Answer with one label fewer than requested
    pub fn truncate_responses(&self, truncate: bool) {
        self.state.lock().unwrap().truncate = truncate;
    }

    /// Hold every response for `delay` before answering
    pub fn delay_responses(&self, delay: Duration) {
        self.state.lock().unwrap().delay_all = Some(delay);
    }

    /// Hold the response to the request with this 0-based index for `delay`
    pub fn delay_request(&self, index: usize, delay: Duration) {
        self.state.lock().unwrap().delays.insert(index, delay);
    }

    /// Answer 200 with a body that is not a JSON array
    pub fn malformed_responses(&self, malformed: bool) {
        self.state.lock().unwrap().malformed = malformed;
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockClassifierServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Classification endpoint
async fn handle_classify(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(descriptions): Json<Vec<String>>,
) -> Response {
    let authorized = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == MockClassifierServer::API_KEY);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let (fail, delay, truncate, malformed) = {
        let mut state = state.lock().unwrap();
        let index = state.batch_sizes.len();
        state.batch_sizes.push(descriptions.len());
        (
            state.fail_all || state.fail_requests.contains(&index),
            state.delays.get(&index).copied().or(state.delay_all),
            state.truncate,
            state.malformed,
        )
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if fail {
        return (StatusCode::INTERNAL_SERVER_ERROR, "classifier unavailable").into_response();
    }
    if malformed {
        return (StatusCode::OK, "{\"labels\": oops").into_response();
    }

    let mut labels: Vec<String> = descriptions
        .iter()
        .map(|d| vendor_label_for(d).to_string())
        .collect();
    if truncate {
        labels.pop();
    }

    Json(labels).into_response()
}
