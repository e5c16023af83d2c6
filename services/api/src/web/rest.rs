//! services/api/src/web/rest.rs
//!
//! Contains the dinner suggestion and health handlers and the master
//! definition for the OpenAPI specification.

use crate::{
    error::{ApiError, ErrorBody},
    web::{cook, sse, state::AppState},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use chrono::Utc;
use dinner_core::{
    domain::{DinnerIntent, Leftover, SearchContext, SuggestionCard},
    intent::KeywordIntentParser,
    ranking,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        cook::start_session_handler,
        cook::session_action_handler,
        cook::stop_session_handler,
        cook::session_status_handler,
        sse::session_events_handler,
        suggest_dinner_handler,
        health_handler,
    ),
    components(
        schemas(
            cook::StartSessionRequest,
            cook::StartSessionResponse,
            cook::SessionActionRequest,
            cook::SessionActionResponse,
            cook::StopSessionRequest,
            cook::SessionStatusResponse,
            SuggestRequest,
            SuggestResponse,
            HealthResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "Cooking", description = "Guided cooking sessions with live timers."),
        (name = "Dinner", description = "Ranked dinner suggestions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A dinner request. Anything omitted falls back to the user's stored state.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestRequest {
    pub user_id: Option<String>,
    /// Free-text request, parsed into an intent when `intent` is absent.
    pub text: Option<String>,
    #[schema(value_type = Object)]
    pub intent: Option<DinnerIntent>,
    pub pantry: Option<Vec<String>>,
    #[schema(value_type = Vec<Object>)]
    pub leftovers: Option<Vec<Leftover>>,
    pub preferred_appliance: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SuggestResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub intent: DinnerIntent,
    #[schema(value_type = Vec<Object>)]
    pub candidates: Vec<SuggestionCard>,
    pub decision_time_ms: u64,
    /// True when the golden set stood in for an empty result.
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
    pub active_timers: usize,
}

//=========================================================================================
// Suggestion Flow
//=========================================================================================

/// Resolves the intent: an explicit intent wins, then the configured parser,
/// then the keyword parser if that one fails.
async fn resolve_intent(app_state: &AppState, request: &SuggestRequest) -> DinnerIntent {
    if let Some(intent) = &request.intent {
        return intent.clone();
    }
    let Some(text) = request.text.as_deref().filter(|t| !t.trim().is_empty()) else {
        return DinnerIntent::default();
    };
    match app_state.intent_parser.parse_intent(text).await {
        Ok(intent) => intent,
        Err(e) => {
            warn!("Intent parser failed ({}); using keyword parser.", e);
            KeywordIntentParser::new().parse(text)
        }
    }
}

async fn build_context(app_state: &AppState, request: SuggestRequest, user_id: &str) -> SearchContext {
    let pantry_snapshot = match request.pantry {
        Some(items) => items,
        None => app_state.catalog.pantry(user_id).await.unwrap_or_else(|e| {
            warn!(user_id, "Pantry lookup failed: {}", e);
            Vec::new()
        }),
    };
    let leftovers = match request.leftovers {
        Some(items) => items,
        None => app_state.catalog.leftovers(user_id).await.unwrap_or_else(|e| {
            warn!(user_id, "Leftover lookup failed: {}", e);
            Vec::new()
        }),
    };

    let now = Utc::now();
    SearchContext {
        pantry_snapshot,
        leftovers: leftovers.into_iter().filter(|l| l.is_safe_at(now)).collect(),
        preferred_appliance: request.preferred_appliance,
        limit: request.limit,
    }
}

/// Runs the whole suggestion flow. Collaborator failures degrade to an empty
/// result with `error` set; they never fail the request.
pub async fn suggest_dinner(app_state: &AppState, request: SuggestRequest) -> SuggestResponse {
    let intent = resolve_intent(app_state, &request).await;
    let user_id = request
        .user_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| "anonymous".to_string());
    let context = build_context(app_state, request, &user_id).await;

    let recipes = match app_state.catalog.list_recipes().await {
        Ok(recipes) => recipes,
        Err(e) => {
            warn!("Recipe lookup failed: {}", e);
            return SuggestResponse {
                success: false,
                intent,
                candidates: Vec::new(),
                decision_time_ms: 0,
                fallback: false,
                error: Some(e.to_string()),
            };
        }
    };

    let outcome = ranking::search(&recipes, &intent, &context);
    if !outcome.candidates.is_empty() {
        info!(user_id, count = outcome.candidates.len(), "Dinner suggestions ranked.");
        return SuggestResponse {
            success: true,
            intent,
            candidates: outcome.candidates,
            decision_time_ms: outcome.decision_time_ms,
            fallback: false,
            error: None,
        };
    }

    // Nothing survived the filters: rank the golden set, still honouring
    // allergies and dietary restrictions.
    let relaxed = DinnerIntent {
        avoid: intent.avoid.clone(),
        diet: intent.diet.clone(),
        ..DinnerIntent::default()
    };
    match app_state.catalog.golden_recipes().await {
        Ok(golden) => {
            let fallback = ranking::search(&golden, &relaxed, &context);
            info!(user_id, count = fallback.candidates.len(), "No matches; served golden set.");
            SuggestResponse {
                success: true,
                intent,
                candidates: fallback.candidates,
                decision_time_ms: outcome.decision_time_ms + fallback.decision_time_ms,
                fallback: true,
                error: None,
            }
        }
        Err(e) => {
            warn!("Golden recipe lookup failed: {}", e);
            SuggestResponse {
                success: false,
                intent,
                candidates: Vec::new(),
                decision_time_ms: outcome.decision_time_ms,
                fallback: false,
                error: Some(e.to_string()),
            }
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Suggest dinners ranked for the cook's intent, pantry and leftovers.
#[utoipa::path(
    post,
    path = "/dinner/suggest",
    request_body = SuggestRequest,
    responses(
        (status = 200, description = "Ranked suggestions", body = SuggestResponse),
        (status = 400, description = "Malformed body", body = ErrorBody)
    ),
    tag = "Dinner"
)]
pub async fn suggest_dinner_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(suggest_dinner(&app_state, request).await))
}

/// Liveness probe with a count of in-memory cooking sessions.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_sessions: app_state.cook.store().len().await,
        active_timers: app_state.cook.timer().active_count(),
    })
}
