//! services/api/src/web/cook.rs
//!
//! Axum handlers for the cooking session endpoints: start, action, stop and
//! status. Live updates are served separately by `sse` and `ws_handler`.

use crate::{
    cook::{ActionOutcome, CookAction},
    error::{ApiError, ErrorBody},
    web::state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use dinner_core::domain::{CookSession, SessionStatus, TimelineStep};
use dinner_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub recipe_id: Option<String>,
    pub user_id: Option<String>,
}

/// The response payload sent after a session is created.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub success: bool,
    pub session_id: Uuid,
    #[schema(value_type = Vec<Object>)]
    pub steps: Vec<TimelineStep>,
    pub current_step_index: usize,
    #[schema(value_type = String)]
    pub status: SessionStatus,
    /// Timer of the first step, in seconds.
    pub timer_seconds: u32,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionActionRequest {
    pub session_id: Option<String>,
    pub action: Option<String>,
    /// Seconds for `add_time` / `set_time`, as a number or a numeric string.
    #[schema(value_type = Object)]
    pub value: Option<serde_json::Value>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StopSessionRequest {
    pub session_id: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionActionResponse {
    pub success: bool,
    pub message: String,
    pub current_step_index: usize,
    #[schema(value_type = String)]
    pub status: SessionStatus,
    pub timer_remaining_seconds: u32,
}

impl From<ActionOutcome> for SessionActionResponse {
    fn from(outcome: ActionOutcome) -> Self {
        Self {
            success: true,
            message: outcome.message,
            current_step_index: outcome.current_step_index,
            status: outcome.status,
            timer_remaining_seconds: outcome.timer_remaining_seconds,
        }
    }
}

/// Full snapshot of a session, steps included.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub recipe_id: String,
    pub user_id: String,
    #[schema(value_type = Vec<Object>)]
    pub steps: Vec<TimelineStep>,
    pub current_step_index: usize,
    #[schema(value_type = String)]
    pub status: SessionStatus,
    pub timer_remaining_seconds: u32,
    pub timer_running: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionStatusResponse {
    fn new(session: CookSession, timer_running: bool) -> Self {
        Self {
            success: true,
            session_id: session.session_id(),
            recipe_id: session.recipe_id().to_string(),
            user_id: session.user_id().to_string(),
            steps: session.steps().to_vec(),
            current_step_index: session.current_step_index,
            status: session.status,
            timer_remaining_seconds: session.timer_remaining_seconds,
            timer_running,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

//=========================================================================================
// Request Helpers
//=========================================================================================

/// A missing id is a malformed request; an id that is not a UUID cannot name
/// any live session, so it is reported as not found.
pub(crate) fn parse_session_id(raw: Option<&str>) -> Result<Uuid, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::invalid_input("sessionId is required"))?;
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::Port(PortError::NotFound(format!("Session {} not found", raw))))
}

/// Normalises the loosely-typed `value` field into the string form the state
/// machine parses. Non-scalar values are passed through and fail parsing there.
pub(crate) fn value_to_string(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Start a cooking session for a recipe.
#[utoipa::path(
    post,
    path = "/cook/start",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session created", body = StartSessionResponse),
        (status = 400, description = "recipeId missing or malformed body", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Cooking"
)]
pub async fn start_session_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<StartSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StartSessionResponse>), ApiError> {
    let Json(request) = payload?;
    let recipe_id = request.recipe_id.unwrap_or_default();
    let user_id = request.user_id.unwrap_or_default();

    let session = app_state.cook.start_session(&recipe_id, &user_id).await?;
    info!(
        session_id = %session.session_id(),
        recipe_id = session.recipe_id(),
        steps = session.steps().len(),
        "Cooking session started."
    );

    let response = StartSessionResponse {
        success: true,
        session_id: session.session_id(),
        timer_seconds: session.timer_remaining_seconds,
        current_step_index: session.current_step_index,
        status: session.status,
        steps: session.steps().to_vec(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Apply an action (`start`, `next`, `prev`, `pause`, `resume`, `add_time`,
/// `set_time`, `repeat`, `stop`) to a session.
#[utoipa::path(
    post,
    path = "/cook/action",
    request_body = SessionActionRequest,
    responses(
        (status = 200, description = "Action applied", body = SessionActionResponse),
        (status = 400, description = "sessionId missing, action unrecognized or malformed body", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody)
    ),
    tag = "Cooking"
)]
pub async fn session_action_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SessionActionRequest>, JsonRejection>,
) -> Result<Json<SessionActionResponse>, ApiError> {
    let Json(request) = payload?;
    let session_id = parse_session_id(request.session_id.as_deref())?;
    let action = request
        .action
        .as_deref()
        .ok_or_else(|| ApiError::invalid_input("action is required"))?
        .parse::<CookAction>()?;
    let value = value_to_string(request.value);

    let outcome = app_state
        .cook
        .apply_action(session_id, action, value.as_deref())
        .await?;
    Ok(Json(outcome.into()))
}

/// Stop a session. It stays readable for a short grace period, then is removed.
#[utoipa::path(
    post,
    path = "/cook/stop",
    request_body = StopSessionRequest,
    responses(
        (status = 200, description = "Session stopped", body = SessionActionResponse),
        (status = 400, description = "sessionId missing or malformed body", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody)
    ),
    tag = "Cooking"
)]
pub async fn stop_session_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<StopSessionRequest>, JsonRejection>,
) -> Result<Json<SessionActionResponse>, ApiError> {
    let Json(request) = payload?;
    let session_id = parse_session_id(request.session_id.as_deref())?;
    let outcome = app_state.cook.stop_session(session_id).await?;
    Ok(Json(outcome.into()))
}

/// Read the full state of a session.
#[utoipa::path(
    get,
    path = "/cook/{session_id}",
    params(
        ("session_id" = String, Path, description = "The cooking session id.")
    ),
    responses(
        (status = 200, description = "Session snapshot", body = SessionStatusResponse),
        (status = 404, description = "Session not found", body = ErrorBody)
    ),
    tag = "Cooking"
)]
pub async fn session_status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let session_id = parse_session_id(Some(&session_id))?;
    let session = app_state.cook.snapshot(session_id).await?;
    let timer_running = app_state.cook.timer().is_running(session_id);
    Ok(Json(SessionStatusResponse::new(session, timer_running)))
}
