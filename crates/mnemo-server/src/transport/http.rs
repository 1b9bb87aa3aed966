//! HTTP surface: insight ingestion and a health check.

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use mnemo_application::{InsightAdapter, InsightRejection};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct AppState {
    insight: Arc<InsightAdapter>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct AcceptedBody {
    accepted: bool,
    session_id: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct ErrorBody {
    accepted: bool,
    reason: String,
    message: String,
}

pub fn router(insight: Arc<InsightAdapter>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/insight", post(ingest))
        .with_state(AppState { insight })
}

pub async fn serve(
    listen: &str,
    insight: Arc<InsightAdapter>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("bind insight listener on {listen} failed"))?;
    tracing::info!("[Insight] Listening on http://{}", listen);

    axum::serve(listener, router(insight))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("insight server terminated with error")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status":"ok"}))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
}

async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AcceptedBody>, (StatusCode, Json<ErrorBody>)> {
    let session_id = state
        .insight
        .ingest(&body, bearer_token(&headers))
        .await
        .map_err(map_rejection)?;

    Ok(Json(AcceptedBody {
        accepted: true,
        session_id: session_id.to_string(),
    }))
}

fn map_rejection(rejection: InsightRejection) -> (StatusCode, Json<ErrorBody>) {
    let status = match rejection {
        InsightRejection::Unauthorized => StatusCode::UNAUTHORIZED,
        InsightRejection::Malformed(_) => StatusCode::BAD_REQUEST,
        InsightRejection::AnalysisFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        InsightRejection::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            accepted: false,
            reason: rejection.reason().to_string(),
            message: rejection.to_string(),
        }),
    )
}
