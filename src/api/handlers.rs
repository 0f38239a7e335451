//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CredentialRequest, ErrorResponse, SettingsResponse, StartRunRequest, StartRunResponse,
    SuccessResponse,
};
use super::AppState;
use crate::credential::CredentialError;
use crate::runtime::{RunError, RunSnapshot, SettingsError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Runs
        .route("/api/runs", post(start_run))
        .route("/api/runs/current", get(current_run))
        .route("/api/runs/stream", get(stream_run))
        // Settings
        .route("/api/settings", get(get_settings))
        .route(
            "/api/settings/credential",
            put(store_credential).delete(clear_credential),
        )
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Runs
// ============================================================

async fn start_run(
    State(state): State<AppState>,
    Json(req): Json<StartRunRequest>,
) -> Result<(StatusCode, Json<StartRunResponse>), AppError> {
    let run_id = state.runtime.start_run(&req.query).await?;
    Ok((StatusCode::ACCEPTED, Json(StartRunResponse { run_id })))
}

async fn current_run(State(state): State<AppState>) -> Json<RunSnapshot> {
    Json(state.runtime.snapshot().await)
}

async fn stream_run(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before taking the snapshot so no event falls in between
    let broadcast_rx = state.runtime.subscribe();
    let snapshot = state.runtime.snapshot().await;
    sse_stream(snapshot, broadcast_rx)
}

// ============================================================
// Settings
// ============================================================

async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        credential: state.runtime.credential_source(),
    })
}

async fn store_credential(
    State(state): State<AppState>,
    Json(req): Json<CredentialRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.runtime.store_credential(&req.api_key)?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn clear_credential(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    let removed = state.runtime.clear_credential()?;
    Ok(Json(SuccessResponse { success: removed }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("reasoning-flow ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<RunError> for AppError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::EmptyQuery => AppError::BadRequest(e.to_string()),
            RunError::Busy => AppError::Conflict(e.to_string()),
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::Busy => AppError::Conflict(e.to_string()),
            SettingsError::Credential(CredentialError::Blank) => {
                AppError::BadRequest(CredentialError::Blank.to_string())
            }
            SettingsError::Credential(CredentialError::Db(db)) => {
                tracing::error!(error = %db, "Settings write failed");
                AppError::Internal(db.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
