//! Router, shared state and request handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::agent::{Agent, AgentError};
use crate::config::Config;
use crate::retrieval::{DocumentSource, InMemoryRetriever, Retriever};

use super::types::{AskRequest, AskResponse, ErrorResponse, HealthResponse, IngestResponse};

/// State shared by all handlers.
pub struct AppState {
    pub agent: Agent,
    pub retriever: Arc<dyn Retriever>,
    pub config: Config,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/:conversation_id/ask", post(ask))
        .route("/api/ask/ingest", post(ingest))
        .route("/api/tools", get(list_tools))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let retriever: Arc<dyn Retriever> = Arc::new(InMemoryRetriever::new());
    let agent = Agent::from_config(&config, Arc::clone(&retriever));
    let addr = format!("{}:{}", config.host, config.port);

    let state = Arc::new(AppState {
        agent,
        retriever,
        config,
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

/// Cancel `cancel` once `timeout` elapses. The task ends early when the token is
/// cancelled by anyone else.
fn spawn_deadline(cancel: CancellationToken, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                tracing::debug!(?timeout, "Request deadline reached");
                cancel.cancel();
            }
        }
    })
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Response {
    let question = req.question().trim();
    if question.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Question must not be empty".to_string());
    }

    // Cancelled on deadline, or when the client goes away and this future is dropped.
    let cancel = CancellationToken::new();
    let _disconnect_guard = cancel.clone().drop_guard();
    let _deadline = spawn_deadline(cancel.clone(), state.config.request_timeout);

    let result = state.agent.ask(conversation_id, question, &cancel).await;

    match result {
        Ok(answer) => Json(AskResponse { answer }).into_response(),
        Err(AgentError::Cancelled) => {
            tracing::warn!(%conversation_id, "Ask cancelled before completion");
            error_response(StatusCode::GATEWAY_TIMEOUT, AgentError::Cancelled.to_string())
        }
        Err(e) => {
            tracing::error!(%conversation_id, error = %e, "Ask failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(source): Json<DocumentSource>,
) -> Response {
    match state.retriever.ingest(source).await {
        Ok(chunks) => Json(IngestResponse { chunks }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Document ingestion failed");
            error_response(StatusCode::BAD_GATEWAY, format!("Ingestion failed: {}", e))
        }
    }
}

async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.agent.tools().list_tools())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
