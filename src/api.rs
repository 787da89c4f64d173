//! REST API server for the market brief orchestrator
//!
//! `POST /query` runs the workflow once; `GET /` and `GET /health` are probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::graph::{GraphState, Workflow};

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    /// Full state of the run, for transparency and debugging.
    pub context_used: GraphState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub workflow: Arc<Workflow>,
}

/// =============================
/// Probe Endpoints
/// =============================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "API is running." }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Query Endpoint
/// =============================

async fn run_query(State(state): State<ApiState>, Json(req): Json<QueryRequest>) -> Response {
    let query = req.query.trim();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "query must not be empty");
    }

    info!(query = %query, "Received query");

    match state.workflow.run(query).await {
        Ok(outcome) => {
            info!(
                run_id = %outcome.run_id,
                elapsed_ms = outcome.elapsed_ms,
                "Query answered"
            );
            let response = outcome.response().to_string();
            (
                StatusCode::OK,
                Json(QueryResponse {
                    response,
                    context_used: outcome.state,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Workflow run failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(workflow: Arc<Workflow>) -> Router {
    let state = ApiState { workflow };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/query", post(run_query))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    workflow: Arc<Workflow>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(workflow);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
