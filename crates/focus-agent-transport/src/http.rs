//! HTTP handlers and router.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method},
    routing::{get, post},
};
use chrono::Utc;
use focus_agent_core::{Analyzer, AnalyzerError, BroadcastHub, StatusUpdate};
use focus_agent_session::SessionStore;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::ApiError,
    protocol::{
        AnalyzeRequest, AnalyzeResponse, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES, SessionInfo,
        SessionStartRequest, StatusResponse,
    },
    websocket::ws_handler,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub hub: Arc<BroadcastHub>,
    pub analyzer: Arc<dyn Analyzer>,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        hub: Arc<BroadcastHub>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        Self {
            store,
            hub,
            analyzer,
        }
    }
}

/// Build the router with every API route, CORS for `allowed_origins`, and
/// request tracing.
///
/// # Panics
/// Panics if `allowed_origins` contains `*`; credentialed CORS needs an
/// explicit list.
#[must_use]
pub fn create_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/ping", get(ping))
        .route("/analyze", post(analyze))
        .route(
            "/session",
            get(get_session).post(start_session).delete(end_session),
        )
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ping() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}

/// POST /analyze: run the analyzer once, outside any session.
async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload?;

    let analyzer = Arc::clone(&state.analyzer);
    let outcome =
        tokio::spawn(async move { analyzer.analyze(&request.task_description).await }).await;

    match outcome {
        Ok(Ok(result)) => Ok(Json(result.into())),
        Ok(Err(AnalyzerError::Capture(message))) => Err(ApiError::CaptureUnavailable(message)),
        Ok(Err(e)) => {
            tracing::warn!("One-shot analysis failed: {e}");
            Err(analysis_failed())
        }
        Err(e) => {
            tracing::warn!("One-shot analysis task failed: {e}");
            Err(analysis_failed())
        }
    }
}

fn analysis_failed() -> ApiError {
    ApiError::Internal("Failed to analyze the screen.".to_string())
}

/// POST /session: replace the active session and announce it.
async fn start_session(
    State(state): State<AppState>,
    payload: Result<Json<SessionStartRequest>, JsonRejection>,
) -> Result<Json<SessionInfo>, ApiError> {
    let Json(request) = payload?;

    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&request.duration_minutes) {
        return Err(duration_out_of_range());
    }
    let minutes = u32::try_from(request.duration_minutes).map_err(|_| duration_out_of_range())?;
    if request.task_description.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Task description cannot be empty.".to_string(),
        ));
    }

    let session = state.store.set(&request.task_description, minutes).await;
    state.hub.broadcast(&StatusUpdate::started(&session)).await;

    Ok(Json(SessionInfo::at(&session, Utc::now())))
}

fn duration_out_of_range() -> ApiError {
    ApiError::Validation(format!(
        "duration_minutes must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES}."
    ))
}

/// GET /session: current session; an expired one is cleared on read.
async fn get_session(State(state): State<AppState>) -> Result<Json<SessionInfo>, ApiError> {
    let now = Utc::now();
    match state.store.get().await {
        Some(session) if !session.is_expired_at(now) => Ok(Json(SessionInfo::at(&session, now))),
        _ => {
            state.store.take_if_expired(now).await;
            Err(ApiError::NotFound("No active session.".to_string()))
        }
    }
}

/// DELETE /session: end the session, always announcing it.
async fn end_session(State(state): State<AppState>) -> Json<StatusResponse> {
    state.store.clear().await;
    state.hub.broadcast(&StatusUpdate::ended()).await;
    Json(StatusResponse::new("ended"))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::Duration;
    use focus_agent_core::{AnalysisResult, FocusState};
    use serde_json::{Value, json};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use super::*;

    enum Behavior {
        Succeed,
        CaptureFails,
        ModelFails,
    }

    struct FakeAnalyzer(Behavior);

    #[async_trait]
    impl Analyzer for FakeAnalyzer {
        async fn analyze(&self, task: &str) -> Result<AnalysisResult, AnalyzerError> {
            match self.0 {
                Behavior::Succeed => {
                    let state = if task.is_empty() {
                        FocusState::OffTask
                    } else {
                        FocusState::OnTask
                    };
                    Ok(AnalysisResult::new(format!("checked '{task}'"), state))
                }
                Behavior::CaptureFails => Err(AnalyzerError::Capture("no display".into())),
                Behavior::ModelFails => Err(AnalyzerError::Model("HTTP 500".into())),
            }
        }
    }

    fn state_with(behavior: Behavior) -> AppState {
        AppState::new(
            Arc::new(SessionStore::new()),
            Arc::new(BroadcastHub::new()),
            Arc::new(FakeAnalyzer(behavior)),
        )
    }

    fn app(state: &AppState) -> Router {
        create_router(
            state.clone(),
            vec![HeaderValue::from_static("http://localhost:5173")],
        )
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_ping() {
        let state = state_with(Behavior::Succeed);
        let (status, body) = call(app(&state), "GET", "/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_start_then_get_session() {
        let state = state_with(Behavior::Succeed);
        let (status, body) = call(
            app(&state),
            "POST",
            "/session",
            Some(json!({"task_description": "write report", "duration_minutes": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_active"], true);

        let (status, body) = call(app(&state), "GET", "/session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task_description"], "write report");
        assert_eq!(body["session_active"], true);
        let remaining = body["seconds_remaining"].as_i64().unwrap();
        assert!((59..=60).contains(&remaining), "remaining = {remaining}");
    }

    #[tokio::test]
    async fn test_start_session_trims_and_announces() {
        let state = state_with(Behavior::Succeed);
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        state.hub.connect(Arc::new(tx)).await;

        let (_, body) = call(
            app(&state),
            "POST",
            "/session",
            Some(json!({"task_description": "  write report  ", "duration_minutes": 25})),
        )
        .await;
        assert_eq!(body["task_description"], "write report");

        let msg: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            msg,
            json!({"state": "on_task", "task": "write report", "session_active": true})
        );
    }

    #[tokio::test]
    async fn test_start_session_validation() {
        let state = state_with(Behavior::Succeed);

        for minutes in [0, -5, 481] {
            let (status, body) = call(
                app(&state),
                "POST",
                "/session",
                Some(json!({"task_description": "write", "duration_minutes": minutes})),
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{minutes}");
            assert!(body["detail"].is_string());
        }

        let (status, body) = call(
            app(&state),
            "POST",
            "/session",
            Some(json!({"task_description": "   ", "duration_minutes": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Task description cannot be empty.");

        let (status, _) = call(
            app(&state),
            "POST",
            "/session",
            Some(json!({"task_description": "write"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        assert!(state.store.get().await.is_none());
    }

    #[tokio::test]
    async fn test_duration_bounds_are_inclusive() {
        let state = state_with(Behavior::Succeed);
        for minutes in [1, 480] {
            let (status, body) = call(
                app(&state),
                "POST",
                "/session",
                Some(json!({"task_description": "write", "duration_minutes": minutes})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let remaining = body["seconds_remaining"].as_i64().unwrap();
            assert!(remaining > (minutes - 1) * 60);
        }
    }

    #[tokio::test]
    async fn test_get_session_without_session() {
        let state = state_with(Behavior::Succeed);
        let (status, body) = call(app(&state), "GET", "/session", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "No active session."}));
    }

    #[tokio::test]
    async fn test_get_expired_session_clears_it() {
        let state = state_with(Behavior::Succeed);
        state
            .store
            .set_until("write report", Utc::now() - Duration::seconds(1))
            .await;

        let (status, _) = call(app(&state), "GET", "/session", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(state.store.get().await.is_none());
    }

    #[tokio::test]
    async fn test_end_session_is_idempotent_and_announces() {
        let state = state_with(Behavior::Succeed);
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        state.hub.connect(Arc::new(tx)).await;
        state.store.set("write report", 10).await;

        for _ in 0..2 {
            let (status, body) = call(app(&state), "DELETE", "/session", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"status": "ended"}));
            assert_eq!(
                rx.recv().await.as_deref(),
                Some(r#"{"state":"on_task","session_active":false}"#)
            );
        }
        assert!(state.store.get().await.is_none());
    }

    #[tokio::test]
    async fn test_analyze_with_empty_task() {
        let state = state_with(Behavior::Succeed);
        let (status, body) = call(
            app(&state),
            "POST",
            "/analyze",
            Some(json!({"task_description": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let verdict = body["state"].as_str().unwrap();
        assert!(verdict == "on_task" || verdict == "off_task");

        let (status, _) = call(app(&state), "POST", "/analyze", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_does_not_touch_session() {
        let state = state_with(Behavior::Succeed);
        state.store.set("write report", 10).await;

        call(
            app(&state),
            "POST",
            "/analyze",
            Some(json!({"task_description": "other"})),
        )
        .await;
        assert!(state.store.get().await.unwrap().last_summary.is_none());
    }

    #[tokio::test]
    async fn test_analyze_capture_failure() {
        let state = state_with(Behavior::CaptureFails);
        let (status, body) = call(
            app(&state),
            "POST",
            "/analyze",
            Some(json!({"task_description": "write"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "no display");
    }

    #[tokio::test]
    async fn test_analyze_generic_failure() {
        let state = state_with(Behavior::ModelFails);
        let (status, body) = call(
            app(&state),
            "POST",
            "/analyze",
            Some(json!({"task_description": "write"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Failed to analyze the screen.");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let state = state_with(Behavior::Succeed);
        let req = Request::builder()
            .uri("/ping")
            .header("origin", "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let resp = app(&state).oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
    }
}
