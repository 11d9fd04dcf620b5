//! HTTP trigger surface
//!
//! ```text
//! /
//! ├── /check-and-refresh-entries  - GET or POST runs one reconciliation pass
//! └── /healthz                    - liveness, never touches DNS
//! ```

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use cnamesync_core::{Error, ReconcileReport, SyncEngine};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Shared state behind every request
pub struct AppState {
    engine: SyncEngine,
    /// Held for the whole of a pass so two triggers never overlap
    pass_lock: Mutex<()>,
}

impl AppState {
    pub fn new(engine: SyncEngine) -> Self {
        Self {
            engine,
            pass_lock: Mutex::new(()),
        }
    }
}

/// Build the router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/check-and-refresh-entries",
            get(check_and_refresh_entries).post(check_and_refresh_entries),
        )
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Run one pass and render its outcome
pub async fn check_and_refresh_entries(State(state): State<Arc<AppState>>) -> Response {
    let _pass = state.pass_lock.lock().await;
    info!("Reconciliation triggered");
    render(state.engine.reconcile().await)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ReconcileReport>,
}

fn render(result: cnamesync_core::Result<ReconcileReport>) -> Response {
    match result {
        Ok(report) if report.has_failures() => {
            let failed: Vec<&str> = report.failures().map(|z| z.zone()).collect();
            warn!("Pass finished with failed zone(s): {}", failed.join(", "));
            let body = ErrorBody {
                error: "provider",
                message: format!("{} zone(s) failed: {}", failed.len(), failed.join(", ")),
                report: Some(&report),
            };
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
        Ok(report) => (StatusCode::OK, report.summary()).into_response(),
        Err(e) => {
            error!("Pass failed: {}", e);
            let body = ErrorBody {
                error: e.kind(),
                message: e.to_string(),
                report: None,
            };
            (status_for(&e), Json(body)).into_response()
        }
    }
}

/// HTTP status for a failed pass
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Resolution { .. } | Error::Provider { .. } | Error::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
