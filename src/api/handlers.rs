//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{
    AskRequest, AskResponse, ErrorResponse, HealthResponse, ToolInfo, ToolsResponse,
};
use super::AppState;
use crate::runtime::AgentError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the form page
        .route("/", get(serve_index))
        .route("/assets/*path", get(serve_static))
        .route("/api/ask", post(ask))
        .route("/api/tools", get(list_tools))
        .route("/api/health", get(health))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_index() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Ask
// ============================================================

async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("Please enter a question".to_string()));
    }

    let outcome = state.advisor.ask(query).await.map_err(|e| {
        tracing::error!(error = %e, "Advisor session failed");
        AppError::from(e)
    })?;

    if !outcome.is_complete() {
        tracing::warn!(
            messages = outcome.transcript.len(),
            "Session stopped at the message limit without a final answer"
        );
    }

    Ok(Json(AskResponse {
        answer: outcome.answer,
        complete: outcome.end_reason.is_complete(),
        end_reason: outcome.end_reason,
        messages: outcome.transcript,
    }))
}

// ============================================================
// Info
// ============================================================

async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    let tools = state
        .advisor
        .tools()
        .into_iter()
        .map(|t| ToolInfo {
            name: t.name,
            description: t.description,
        })
        .collect();
    Json(ToolsResponse { tools })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.advisor.model_id().to_string(),
    })
}

async fn get_version() -> &'static str {
    concat!("rx-advisor ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    /// The model or its configuration failed; details stay in the logs
    Upstream,
    Internal,
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Llm(_) => AppError::Upstream,
            AgentError::Transition(_) | AgentError::Transcript(_) | AgentError::Stalled => {
                AppError::Internal
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream => (
                StatusCode::BAD_GATEWAY,
                "The advisor could not reach the language model. Please try again later."
                    .to_string(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong while answering your question.".to_string(),
            ),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
