// Axum request handlers: translate JSON requests into cache/scheduler operations.

use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::state::AppState;
use crate::config::{DEFAULT_PRIORITY, DEFAULT_TICKS};
use crate::engine::cache::{validate_reading_id, CacheLookup, CacheSnapshot, PutOutcome};
use crate::engine::scheduler::{RunReport, SchedulerSnapshot, Task};
use crate::error::EngineError;

pub struct LabServer {
    addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl LabServer {
    /// Bind `bind_addr` and serve the engines in a background task.
    pub async fn start(bind_addr: &str, state: AppState) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = router(state);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("server error: {}", e);
            }
        });

        info!("lab engine listening on {}", addr);
        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for a path on this server, e.g. `url("/api/cache")`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Signal shutdown without waiting for in-flight requests.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Signal shutdown and wait until the server task exits.
    pub async fn shutdown_and_wait(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
        info!("lab engine on {} stopped", self.addr);
    }
}

/// All routes of the service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ping", get(ping_handler))
        .route("/api/cache", get(cache_snapshot_handler))
        .route("/api/cache/get/{id}", get(cache_get_handler))
        .route("/api/cache/put", post(cache_put_handler))
        .route(
            "/api/scheduler",
            get(scheduler_snapshot_handler).post(scheduler_submit_handler),
        )
        .route("/api/scheduler/run", post(scheduler_run_handler))
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
}

/// Successful response: `{"ok": true, ...body}`.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    ok: bool,
    #[serde(flatten)]
    body: T,
}

impl<T> Success<T> {
    pub fn new(body: T) -> Json<Self> {
        Json(Self { ok: true, body })
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        error_response(status, &self)
    }
}

/// `{"ok": false, "kind": .., "error": ..}` with an explicit status.
fn error_response(status: StatusCode, err: &EngineError) -> Response {
    warn!("request failed status={} kind={} error={}", status, err.kind(), err);
    let body = json!({
        "ok": false,
        "kind": err.kind(),
        "error": err.to_string(),
    });
    (status, Json(body)).into_response()
}

/// Any path outside the routes above.
async fn route_not_found(method: Method, uri: Uri) -> Response {
    EngineError::NotFound(format!("no route for {} {}", method, uri.path())).into_response()
}

/// A known path hit with a method it does not serve.
async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    let err = EngineError::InvalidArgument(format!(
        "method {} not allowed on {}",
        method,
        uri.path()
    ));
    error_response(StatusCode::METHOD_NOT_ALLOWED, &err)
}

#[derive(Debug, Deserialize)]
pub struct CachePutRequest {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_ticks")]
    pub ticks: i64,
}

#[derive(Debug, Deserialize)]
pub struct RunParams {
    #[serde(default = "default_ticks")]
    pub ticks: i64,
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

fn default_ticks() -> i64 {
    DEFAULT_TICKS
}

#[derive(Debug, Serialize)]
struct Submitted {
    task: Task,
}

#[derive(Debug, Serialize)]
struct Pong {
    status: &'static str,
}

fn bad_request(e: impl std::fmt::Display) -> EngineError {
    EngineError::InvalidArgument(e.to_string())
}

/// GET /api/ping
async fn ping_handler() -> Json<Success<Pong>> {
    Success::new(Pong { status: "ok" })
}

/// GET /api/cache: capacity, counters and items, most recent first.
async fn cache_snapshot_handler(State(state): State<AppState>) -> Json<Success<CacheSnapshot>> {
    Success::new(state.cache.snapshot())
}

/// GET /api/cache/get/{id}: read-through lookup.
async fn cache_get_handler(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Success<CacheLookup>>, EngineError> {
    let Path(raw) = id.map_err(|e| bad_request(e.body_text()))?;
    let key = validate_reading_id(raw)?;
    let lookup = state.cache.get(key).await?;
    Ok(Success::new(lookup))
}

/// POST /api/cache/put: prime the cache with a reading.
async fn cache_put_handler(
    State(state): State<AppState>,
    body: Result<Json<CachePutRequest>, JsonRejection>,
) -> Result<Json<Success<PutOutcome>>, EngineError> {
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;
    let key = validate_reading_id(req.id)?;
    let outcome = state.cache.put(key).await?;
    Ok(Success::new(outcome))
}

/// GET /api/scheduler: pending queue and completion history.
async fn scheduler_snapshot_handler(
    State(state): State<AppState>,
) -> Json<Success<SchedulerSnapshot>> {
    Success::new(state.scheduler.snapshot())
}

/// POST /api/scheduler: submit a task.
async fn scheduler_submit_handler(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Success<Submitted>>), EngineError> {
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;
    let task = state.scheduler.submit(&req.name, req.priority, req.ticks)?;
    Ok((StatusCode::CREATED, Success::new(Submitted { task })))
}

/// POST /api/scheduler/run?ticks=n: advance the scheduler.
async fn scheduler_run_handler(
    State(state): State<AppState>,
    params: Result<Query<RunParams>, QueryRejection>,
) -> Result<Json<Success<RunReport>>, EngineError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    let report = state.scheduler.run_with_snapshot(params.ticks)?;
    Ok(Success::new(report))
}
