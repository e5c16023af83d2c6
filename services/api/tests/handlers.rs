//! Calls the axum handlers directly, without a running server.

use std::sync::Arc;

use api_lib::adapters::InMemoryCatalog;
use api_lib::config::Config;
use api_lib::web::{
    cook::{
        session_action_handler, session_status_handler, start_session_handler,
        stop_session_handler, SessionActionRequest, StartSessionRequest, StopSessionRequest,
    },
    rest::{health_handler, suggest_dinner, suggest_dinner_handler, SuggestRequest},
    AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequest, Path, State},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    response::IntoResponse,
    Json,
};
use dinner_core::domain::{DinnerIntent, Leftover, Recipe, SessionStatus, TimelineStep};
use dinner_core::intent::KeywordIntentParser;
use dinner_core::ports::{PortError, PortResult, RecipeCatalog};
use serde_json::json;
use uuid::Uuid;

fn app_state_with(catalog: Arc<dyn RecipeCatalog>) -> Arc<AppState> {
    AppState::new(
        Arc::new(Config::default()),
        catalog,
        Arc::new(KeywordIntentParser::new()),
    )
}

fn seeded_state() -> Arc<AppState> {
    app_state_with(Arc::new(InMemoryCatalog::seeded()))
}

fn json_request(body: &'static str, content_type: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/");
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn error_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn start_sheet_pan(state: &Arc<AppState>) -> Uuid {
    let (status, Json(body)) = start_session_handler(
        State(state.clone()),
        Ok(Json(StartSessionRequest {
            recipe_id: Some("sheet-pan-chicken".to_string()),
            user_id: Some("cook-1".to_string()),
        })),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    body.session_id
}

//=========================================================================================
// Cooking Endpoints
//=========================================================================================

#[tokio::test(start_paused = true)]
async fn start_returns_idle_session_on_first_step() {
    let state = seeded_state();
    let (_, Json(body)) = start_session_handler(
        State(state.clone()),
        Ok(Json(StartSessionRequest {
            recipe_id: Some("sheet-pan-chicken".to_string()),
            user_id: None,
        })),
    )
    .await
    .unwrap();

    assert!(body.success);
    assert_eq!(body.current_step_index, 0);
    assert_eq!(body.status, SessionStatus::Idle);
    assert_eq!(body.steps.len(), 4);
    assert_eq!(body.timer_seconds, 0);

    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["status"], "idle");
    assert!(json.get("currentStepIndex").is_some());
}

#[tokio::test(start_paused = true)]
async fn start_without_recipe_is_bad_request() {
    let state = seeded_state();
    let err = start_session_handler(State(state), Ok(Json(StartSessionRequest::default())))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn action_validation_maps_to_status_codes() {
    let state = seeded_state();
    let id = start_sheet_pan(&state).await;

    let missing_id = session_action_handler(
        State(state.clone()),
        Ok(Json(SessionActionRequest {
            action: Some("next".to_string()),
            ..Default::default()
        })),
    )
    .await
    .unwrap_err();
    assert_eq!(missing_id.status_code(), StatusCode::BAD_REQUEST);

    let bad_action = session_action_handler(
        State(state.clone()),
        Ok(Json(SessionActionRequest {
            session_id: Some(id.to_string()),
            action: Some("flip".to_string()),
            value: None,
        })),
    )
    .await
    .unwrap_err();
    assert_eq!(bad_action.status_code(), StatusCode::BAD_REQUEST);

    for unknown in ["does-not-exist".to_string(), Uuid::new_v4().to_string()] {
        let err = session_action_handler(
            State(state.clone()),
            Ok(Json(SessionActionRequest {
                session_id: Some(unknown),
                action: Some("start".to_string()),
                value: None,
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test(start_paused = true)]
async fn action_accepts_numeric_and_string_values() {
    let state = seeded_state();
    let id = start_sheet_pan(&state).await;

    let Json(body) = session_action_handler(
        State(state.clone()),
        Ok(Json(SessionActionRequest {
            session_id: Some(id.to_string()),
            action: Some("set_time".to_string()),
            value: Some(json!(120)),
        })),
    )
    .await
    .unwrap();
    assert!(body.success);
    assert_eq!(body.timer_remaining_seconds, 120);

    let Json(body) = session_action_handler(
        State(state.clone()),
        Ok(Json(SessionActionRequest {
            session_id: Some(id.to_string()),
            action: Some("add_time".to_string()),
            value: Some(json!("30")),
        })),
    )
    .await
    .unwrap();
    assert_eq!(body.timer_remaining_seconds, 150);

    let Json(body) = session_action_handler(
        State(state.clone()),
        Ok(Json(SessionActionRequest {
            session_id: Some(id.to_string()),
            action: Some("set_time".to_string()),
            value: Some(json!("later")),
        })),
    )
    .await
    .unwrap();
    assert!(body.success);
    assert_eq!(body.timer_remaining_seconds, 150);
}

#[tokio::test(start_paused = true)]
async fn wrong_typed_session_id_is_bad_request_with_error_body() {
    let state = seeded_state();
    let payload = Json::<SessionActionRequest>::from_request(
        json_request(
            r#"{"sessionId":123,"action":"next"}"#,
            Some("application/json"),
        ),
        &(),
    )
    .await;
    assert!(payload.is_err());

    let err = session_action_handler(State(state), payload)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn malformed_bodies_are_bad_requests() {
    let state = seeded_state();

    let payload = Json::<StopSessionRequest>::from_request(
        json_request(r#"{"sessionId":"x"}"#, None),
        &(),
    )
    .await;
    let err = stop_session_handler(State(state.clone()), payload)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let payload =
        Json::<SuggestRequest>::from_request(json_request("{not json", Some("application/json")), &())
            .await;
    let response = suggest_dinner_handler(State(state), payload)
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await["success"], false);
}

#[tokio::test(start_paused = true)]
async fn status_reports_full_snapshot_until_removed() {
    let state = seeded_state();
    let id = start_sheet_pan(&state).await;

    let Json(status) = session_status_handler(State(state.clone()), Path(id.to_string()))
        .await
        .unwrap();
    assert_eq!(status.session_id, id);
    assert_eq!(status.recipe_id, "sheet-pan-chicken");
    assert_eq!(status.steps.len(), 4);
    assert!(!status.timer_running);

    let Json(stopped) = stop_session_handler(
        State(state.clone()),
        Ok(Json(StopSessionRequest {
            session_id: Some(id.to_string()),
        })),
    )
    .await
    .unwrap();
    assert_eq!(stopped.status, SessionStatus::Completed);

    tokio::time::sleep(std::time::Duration::from_secs(61)).await;
    let err = session_status_handler(State(state.clone()), Path(id.to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn health_counts_sessions() {
    let state = seeded_state();
    start_sheet_pan(&state).await;
    let Json(health) = health_handler(State(state)).await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.active_sessions, 1);
    assert_eq!(health.active_timers, 0);
}

//=========================================================================================
// Dinner Suggestions
//=========================================================================================

#[tokio::test]
async fn avoided_ingredients_never_rank() {
    let state = seeded_state();
    let response = suggest_dinner(
        &state,
        SuggestRequest {
            intent: Some(DinnerIntent {
                avoid: vec!["chicken".to_string()],
                ..DinnerIntent::default()
            }),
            ..SuggestRequest::default()
        },
    )
    .await;

    assert!(response.success);
    assert!(!response.fallback);
    assert!(!response.candidates.is_empty());
    assert!(response
        .candidates
        .iter()
        .all(|c| c.recipe_id != "sheet-pan-chicken"));
}

#[tokio::test]
async fn free_text_is_parsed_into_an_intent() {
    let state = seeded_state();
    let response = suggest_dinner(
        &state,
        SuggestRequest {
            text: Some("something quick, no soy sauce".to_string()),
            ..SuggestRequest::default()
        },
    )
    .await;

    assert_eq!(response.intent.max_time_minutes, Some(30));
    assert!(response
        .candidates
        .iter()
        .all(|c| c.total_time_minutes <= 30));
}

#[tokio::test]
async fn empty_pool_falls_back_to_golden_set_keeping_exclusions() {
    let state = seeded_state();
    let response = suggest_dinner(
        &state,
        SuggestRequest {
            intent: Some(DinnerIntent {
                max_time_minutes: Some(1),
                avoid: vec!["soy sauce".to_string()],
                ..DinnerIntent::default()
            }),
            ..SuggestRequest::default()
        },
    )
    .await;

    assert!(response.success);
    assert!(response.fallback);
    let ids: Vec<&str> = response
        .candidates
        .iter()
        .map(|c| c.recipe_id.as_str())
        .collect();
    assert!(ids.contains(&"sheet-pan-chicken"));
    assert!(ids.contains(&"one-pot-pasta"));
    assert!(!ids.contains(&"fried-rice"));
}

struct BrokenCatalog;

#[async_trait]
impl RecipeCatalog for BrokenCatalog {
    async fn list_recipes(&self) -> PortResult<Vec<Recipe>> {
        Err(PortError::Unexpected("connection refused".to_string()))
    }

    async fn timeline(&self, _recipe_id: &str) -> PortResult<Vec<TimelineStep>> {
        Err(PortError::Unexpected("connection refused".to_string()))
    }

    async fn pantry(&self, _user_id: &str) -> PortResult<Vec<String>> {
        Err(PortError::Unexpected("connection refused".to_string()))
    }

    async fn leftovers(&self, _user_id: &str) -> PortResult<Vec<Leftover>> {
        Err(PortError::Unexpected("connection refused".to_string()))
    }
}

#[tokio::test]
async fn catalog_failure_degrades_to_empty_result() {
    let state = app_state_with(Arc::new(BrokenCatalog));
    let response = suggest_dinner(&state, SuggestRequest::default()).await;

    assert!(!response.success);
    assert!(response.candidates.is_empty());
    assert!(response.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn broken_catalog_still_starts_a_placeholder_session() {
    let state = app_state_with(Arc::new(BrokenCatalog));
    let (status, Json(body)) = start_session_handler(
        State(state),
        Ok(Json(StartSessionRequest {
            recipe_id: Some("anything".to_string()),
            user_id: None,
        })),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body.steps.is_empty());
}
