//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ErrorResponse, SessionResponse, TransactionListResponse, UpdateResponse};
use super::AppState;
use crate::catalog::CategoryCatalog;
use crate::runtime::{DispatchError, InboundEvent, Ledger, LedgerError, SessionStore, StoreError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Inbound chat updates
        .route("/api/updates", post(post_update))
        // Per-user outbound stream and read models
        .route("/api/users/:user_id/stream", get(stream_user))
        .route("/api/users/:user_id/session", get(get_session))
        .route("/api/users/:user_id/transactions", get(list_transactions))
        .route("/api/categories", get(list_categories))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Inbound Updates
// ============================================================

async fn post_update(
    State(state): State<AppState>,
    Json(update): Json<InboundEvent>,
) -> Result<Json<UpdateResponse>, AppError> {
    if update.user_id().trim().is_empty() {
        return Err(AppError::BadRequest("user_id must not be blank".to_string()));
    }

    // Run on its own task so a dropped connection cannot cancel the event
    // between effects
    let dispatcher = state.dispatcher.clone();
    let outcome = tokio::spawn(async move { dispatcher.dispatch(update).await })
        .await
        .map_err(|e| AppError::Internal(format!("Dispatch task failed: {e}")))??;

    Ok(Json(UpdateResponse {
        handled: outcome.is_handled(),
    }))
}

// ============================================================
// Outbound Stream
// ============================================================

async fn stream_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Subscribe before reading the session so nothing published in between
    // is missed
    let broadcast_rx = state.dispatcher.presenter().subscribe(&user_id).await;
    let session = state
        .dispatcher
        .store()
        .get(&user_id)
        .await?
        .unwrap_or_default();

    tracing::debug!(user_id = %user_id, session = session.name(), "Outbound stream opened");
    Ok(sse_stream(user_id, session, broadcast_rx))
}

// ============================================================
// Read Models
// ============================================================

async fn get_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state
        .dispatcher
        .store()
        .get(&user_id)
        .await?
        .unwrap_or_default();
    Ok(Json(SessionResponse { user_id, session }))
}

async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<TransactionListResponse>, AppError> {
    let transactions = state.dispatcher.ledger().list(&user_id).await?;
    Ok(Json(TransactionListResponse { transactions }))
}

async fn list_categories(State(state): State<AppState>) -> Json<CategoryCatalog> {
    Json(CategoryCatalog::clone(state.dispatcher.catalog()))
}

async fn get_version() -> &'static str {
    concat!("ledger-bot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    /// Store, ledger or presenter down; the client may retry
    Unavailable(String),
    Internal(String),
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        AppError::Unavailable(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Unavailable(e.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        AppError::Unavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
