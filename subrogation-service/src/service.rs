use axum::{
    Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use recovery_flow::{
    ALL_STATUSES, CaseRegistry, Completion, DeskRunner, FlowError, InMemorySessionStorage,
    ScreenView, render,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::config::Settings;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn status_for(e: &FlowError) -> StatusCode {
    match e {
        FlowError::SessionNotFound(_) | FlowError::CaseNotFound(_) => StatusCode::NOT_FOUND,
        FlowError::InvalidTransition { .. }
        | FlowError::AlreadyPending(_)
        | FlowError::OutOfContext { .. }
        | FlowError::NotReady
        | FlowError::DocumentAlreadyGenerated(_)
        | FlowError::NothingToApprove => StatusCode::CONFLICT,
        FlowError::MalformedPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FlowError::Gateway(_) => StatusCode::BAD_GATEWAY,
        FlowError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn flow_error(session_id: &str, e: FlowError) -> ApiError {
    let status = status_for(&e);
    if status.is_server_error() {
        error!(%session_id, error = %e, "Request failed");
    } else {
        warn!(%session_id, error = %e, "Request rejected");
    }
    (
        status,
        Json(json!({
            "error": e.to_string(),
            "session_id": session_id
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub runner: DeskRunner,
}

impl AppState {
    pub fn new(runner: DeskRunner) -> Self {
        Self { runner }
    }

    /// Wires the sample case queue, in-memory sessions and the configured agent backend.
    pub fn from_settings(settings: &Settings) -> Result<Self, FlowError> {
        let runner = DeskRunner::new(
            Arc::new(CaseRegistry::sample()),
            Arc::new(InMemorySessionStorage::new()),
            settings.gateway()?,
            Arc::new(settings.agents.clone()),
            settings.desk(),
        );
        Ok(Self::new(runner))
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/cases", get(list_cases))
        .route("/escalations", get(list_escalations))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/select", post(select_case))
        .route("/sessions/{id}/process", post(process_case))
        .route("/sessions/{id}/outlay", post(open_outlay))
        .route("/sessions/{id}/outlay/generate", post(generate_document))
        .route("/sessions/{id}/outlay/approve", post(approve_document))
        .route("/sessions/{id}/back", post(go_back))
        .route("/sessions/{id}/dashboard", post(go_dashboard))
        .route("/sessions/{id}/supervisor", post(open_supervisor))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Runs every request inside an `http_request` span carrying a fresh correlation id,
/// and echoes the id back in the response headers.
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();
    if let Some(value) = header.clone() {
        request.headers_mut().insert(CORRELATION_HEADER, value);
    }

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %request.method(),
        path = %request.uri().path()
    );
    let mut response = next.run(request).instrument(span).await;
    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub search: String,
    pub status: Option<String>,
}

impl FilterQuery {
    fn status(&self) -> &str {
        self.status.as_deref().unwrap_or(ALL_STATUSES)
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub claim_number: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,
    pub view: ScreenView,
}

async fn respond(
    state: &AppState,
    session_id: &str,
    completion: Option<Completion>,
) -> ApiResult<SessionResponse> {
    let view = state
        .runner
        .view(session_id, "", ALL_STATUSES)
        .await
        .map_err(|e| flow_error(session_id, e))?;
    Ok(Json(SessionResponse {
        session_id: session_id.to_string(),
        completion,
        view,
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Json<render::QueueView> {
    Json(render::queue(
        state.runner.registry(),
        &query.search,
        query.status(),
    ))
}

async fn list_escalations(State(state): State<AppState>) -> Json<render::EscalationView> {
    Json(render::escalations(state.runner.registry()))
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state
        .runner
        .open_session()
        .await
        .map_err(|e| flow_error("", e))?;
    let Json(body) = respond(&state, &session.id, None).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<SessionResponse> {
    let view = state
        .runner
        .view(&session_id, &query.search, query.status())
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    Ok(Json(SessionResponse {
        session_id,
        completion: None,
        view,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .runner
        .close_session(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn select_case(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<SessionResponse> {
    info!(%session_id, claim_number = %request.claim_number, "Selecting case");
    state
        .runner
        .select_case(&session_id, &request.claim_number)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    respond(&state, &session_id, None).await
}

async fn process_case(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let completion = state
        .runner
        .process(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    respond(&state, &session_id, Some(completion)).await
}

async fn open_outlay(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    state
        .runner
        .open_outlay(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    respond(&state, &session_id, None).await
}

async fn generate_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let completion = state
        .runner
        .generate_document(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    respond(&state, &session_id, Some(completion)).await
}

async fn approve_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let completion = state
        .runner
        .approve(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    respond(&state, &session_id, Some(completion)).await
}

async fn go_back(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    state
        .runner
        .back(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    respond(&state, &session_id, None).await
}

async fn go_dashboard(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    state
        .runner
        .go_dashboard(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    respond(&state, &session_id, None).await
}

async fn open_supervisor(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    state
        .runner
        .open_supervisor(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    respond(&state, &session_id, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use recovery_flow::{
        AgentCapability, AgentDirectory, DeskSettings, ScriptedGateway,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(gateway: Arc<ScriptedGateway>) -> Router {
        let runner = DeskRunner::new(
            Arc::new(CaseRegistry::sample()),
            Arc::new(InMemorySessionStorage::new()),
            gateway,
            Arc::new(AgentDirectory::default()),
            DeskSettings {
                approval_delay: Duration::from_millis(5),
                ..DeskSettings::default()
            },
        );
        build_router(AppState::new(runner))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_carries_correlation_id() {
        let app = app(Arc::new(ScriptedGateway::new()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(CORRELATION_HEADER));
    }

    #[tokio::test]
    async fn test_case_listing_filters() {
        let app = app(Arc::new(ScriptedGateway::new()));

        let (status, body) = send(&app, "GET", "/cases?status=flagged", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cases"].as_array().unwrap().len(), 2);
        assert_eq!(body["total_cases"], 5);

        let (_, body) = send(&app, "GET", "/cases?search=smith", None).await;
        assert_eq!(body["cases"][0]["claim_number"], "CLM-2024-78432");

        let (_, body) = send(&app, "GET", "/escalations", None).await;
        assert_eq!(body["escalations"], 2);
    }

    #[tokio::test]
    async fn test_desk_flow_over_http() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway
            .push_success(
                AgentCapability::SubrogationCoordinator,
                json!({"validation_status": {"validation_score": 88}, "ready_for_document_generation": true}),
            )
            .await;
        gateway
            .push_success(
                AgentCapability::OutlayDocument,
                json!({"document_status": "READY_FOR_APPROVAL"}),
            )
            .await;
        let app = app(gateway);

        let (status, body) = send(&app, "POST", "/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["view"]["screen"], "dashboard");
        let id = body["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/sessions/{id}/select"),
            Some(json!({"claim_number": "CLM-2024-78432"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"]["screen"], "processing");

        let (_, body) = send(&app, "POST", &format!("/sessions/{id}/process"), None).await;
        assert_eq!(body["completion"]["outcome"], "applied");
        assert_eq!(body["view"]["can_open_outlay"], true);
        assert_eq!(
            body["view"]["evaluation"]["validation_score"]["label"],
            "PASS (88%)"
        );

        let (_, body) = send(&app, "POST", &format!("/sessions/{id}/outlay"), None).await;
        assert_eq!(body["view"]["screen"], "outlay");

        let (_, body) = send(&app, "POST", &format!("/sessions/{id}/outlay/generate"), None).await;
        assert_eq!(body["view"]["can_approve"], true);

        let (status, _) =
            send(&app, "POST", &format!("/sessions/{id}/outlay/generate"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = send(&app, "POST", &format!("/sessions/{id}/outlay/approve"), None).await;
        assert_eq!(body["view"]["screen"], "dashboard");

        let (status, _) = send(&app, "DELETE", &format!("/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_agent_failure_is_inline_not_an_http_error() {
        let app = app(Arc::new(ScriptedGateway::new()));
        let (_, body) = send(&app, "POST", "/sessions", None).await;
        let id = body["session_id"].as_str().unwrap().to_string();
        send(
            &app,
            "POST",
            &format!("/sessions/{id}/select"),
            Some(json!({"claim_number": "CLM-2024-78419"})),
        )
        .await;

        // the scripted gateway has nothing queued, so the call fails in transport
        let (status, body) = send(&app, "POST", &format!("/sessions/{id}/process"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completion"]["outcome"], "failed");
        assert!(body["view"]["error"].as_str().is_some());

        let (status, body) = send(&app, "POST", &format!("/sessions/{id}/outlay"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("not ready"));
    }

    #[tokio::test]
    async fn test_unknown_case_is_not_found() {
        let app = app(Arc::new(ScriptedGateway::new()));
        let (_, body) = send(&app, "POST", "/sessions", None).await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "POST",
            &format!("/sessions/{id}/select"),
            Some(json!({"claim_number": "CLM-1999-00001"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", &format!("/sessions/{id}/back"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
