//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/query/body parameters via axum extractors,
//! drives the dialogue engine, and returns JSON responses.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parley_core::types::{Feedback, Message, Session};
use parley_dialogue::{EngineError, TurnOutcome};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Omitted on first contact; the engine creates a session.
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// "positive" or "negative".
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
    pub message_id: String,
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub storage: &'static str,
    pub dialogue: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub components: ComponentStatus,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/session/create
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreatedResponse>), ApiError> {
    let session_id = state.engine.create_session()?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id,
            status: "created",
            timestamp: Utc::now(),
        }),
    ))
}

/// POST /api/message/send
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let outcome = state
        .engine
        .handle_message(req.session_id.as_deref(), &req.message)?;
    Ok(Json(outcome))
}

/// GET /api/conversation/history/{session_id}
pub async fn conversation_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(state.config.api.history_default_limit);
    let messages = state.engine.conversation_history(&session_id, limit)?;
    Ok(Json(HistoryResponse {
        session_id,
        count: messages.len(),
        messages,
    }))
}

/// GET /api/session/context/{session_id}
pub async fn session_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    let session = state.engine.session_context(&session_id)?;
    Ok(Json(session))
}

/// POST /api/message/{message_id}/feedback
pub async fn message_feedback(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let feedback = Feedback::parse(&req.feedback).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "feedback must be \"positive\" or \"negative\", got \"{}\"",
            req.feedback
        ))
    })?;
    state.engine.record_feedback(&message_id, feedback)?;
    Ok(Json(FeedbackResponse {
        status: "ok",
        message_id,
    }))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    // A lookup for a session that cannot exist proves the store is
    // reachable; anything other than NotFound means it is not.
    let storage = match state.engine.session_context("session_healthcheck") {
        Ok(_) | Err(EngineError::SessionNotFound(_)) => "ok",
        Err(_) => "degraded",
    };
    let status = if storage == "ok" { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status,
        service: "parley",
        version: env!("CARGO_PKG_VERSION"),
        components: ComponentStatus {
            storage,
            dialogue: "ok",
        },
    })
}
