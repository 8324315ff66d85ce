//! Operator HTTP surface: progress, pending selection, and search.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::GateError;
use crate::gate::{OperatorDesk, SelectionTicket};
use crate::lookup::wire::SearchRequest;
use crate::lookup::{EnrichmentLookup, LookupReply};
use crate::orchestrator::ProgressWatch;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<OperatorDesk>,
    pub progress: ProgressWatch,
    /// Backs `/api/search`.
    pub lookup: Arc<dyn EnrichmentLookup>,
}

/// Build the operator router.
pub fn operator_routes(
    desk: Arc<OperatorDesk>,
    progress: ProgressWatch,
    lookup: Arc<dyn EnrichmentLookup>,
) -> Router {
    let state = AppState {
        desk,
        progress,
        lookup,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/progress", get(progress_snapshot))
        .route("/api/selection", get(pending_selection).post(select_candidate))
        .route("/api/selection/abandon", post(abandon_selection))
        .route("/api/search", post(search))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "contact-enrich"
    }))
}

async fn progress_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.progress.snapshot())
}

// ── Selection ───────────────────────────────────────────────────────────

async fn pending_selection(State(state): State<AppState>) -> Response {
    match state.desk.pending().await {
        Some(request) => Json(request).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[derive(Deserialize)]
struct SelectRequest {
    ticket: SelectionTicket,
    /// 0-based position in the presented candidate list.
    index: usize,
}

async fn select_candidate(
    State(state): State<AppState>,
    Json(body): Json<SelectRequest>,
) -> Response {
    match state.desk.select(body.ticket, body.index).await {
        Ok(candidate) => (StatusCode::OK, Json(serde_json::json!(candidate))).into_response(),
        Err(e) => gate_error_response(e),
    }
}

async fn abandon_selection(State(state): State<AppState>) -> Response {
    match state.desk.abandon().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "abandoned"})),
        )
            .into_response(),
        Err(e) => gate_error_response(e),
    }
}

fn gate_error_response(error: GateError) -> Response {
    let status = match &error {
        GateError::NoPendingSelection => StatusCode::NOT_FOUND,
        GateError::TicketMismatch | GateError::Busy => StatusCode::CONFLICT,
        GateError::InvalidChoice { .. } => StatusCode::BAD_REQUEST,
        GateError::Stale => StatusCode::GONE,
        GateError::Abandoned | GateError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(error = %error, status = status.as_u16(), "Selection request refused");
    (
        status,
        Json(serde_json::json!({"error": error.to_string()})),
    )
        .into_response()
}

// ── Search ──────────────────────────────────────────────────────────────

async fn search(State(state): State<AppState>, Json(body): Json<SearchRequest>) -> Response {
    let company = body.company.trim();
    if company.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Company is required"})),
        )
            .into_response();
    }

    let result = state.lookup.lookup(company).await;
    match &result {
        Ok(outcome) => info!(organization_key = %company, outcome = outcome.label(), "Search served"),
        Err(e) => warn!(organization_key = %company, error = %e, "Search failed"),
    }
    Json(LookupReply::from(result)).into_response()
}
