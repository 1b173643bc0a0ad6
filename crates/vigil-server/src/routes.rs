//! HTTP surface: ingestion, recent-alerts query, statistics, health, cleanup.
//!
//! The ingestion handler treats persistence and broadcast as independent
//! best-effort branches: a store failure never prevents fan-out, and a lack
//! of subscribers never prevents the persistence attempt.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use vigil_hub::PushEvent;
use vigil_ingest::normalize;
use vigil_store::{DailyCount, StoredWebhook};
use vigil_types::VigilError;

use crate::state::AppState;
use crate::ws;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/alerts", post(receive_webhook))
        .route("/api/webhooks", get(recent_webhooks))
        .route("/api/webhooks/cleanup", delete(cleanup_webhooks))
        .route("/api/stats", get(stats))
        .route("/health", get(health))
        .route("/ws", get(ws::upgrade))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Response body for the ingestion endpoint.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub message: String,
    pub timestamp: String,
    #[serde(rename = "savedToDatabase")]
    pub saved_to_database: bool,
    #[serde(rename = "databaseId", skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
    #[serde(rename = "clientsNotified")]
    pub clients_notified: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /webhook/alerts` -- normalize, suppress duplicates, persist
/// (best-effort), broadcast, and report what happened.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<IngestResponse>) {
    let timestamp = Utc::now().to_rfc3339();
    let alert = normalize(&payload);
    info!(
        alert_id = %alert.id,
        severity = alert.severity.as_str(),
        rule = %alert.rule.id,
        "webhook received"
    );

    if !state.recent_ids.lock().insert(&alert.id) {
        info!(alert_id = %alert.id, "duplicate alert ignored");
        return (
            StatusCode::OK,
            Json(IngestResponse {
                status: "ignored",
                message: "Duplicate alert".to_string(),
                timestamp,
                saved_to_database: false,
                database_id: None,
                clients_notified: 0,
                error: None,
            }),
        );
    }

    // Persistence and broadcast are independent: both always run, neither
    // outcome gates the other.
    let persisted = state.store.lock().await.append(&alert);
    let clients_notified = state.registry.broadcast(&PushEvent::alert(alert));
    debug!(clients_notified, "broadcast complete");

    ingest_outcome(timestamp, persisted, clients_notified)
}

fn ingest_outcome(
    timestamp: String,
    persisted: Result<StoredWebhook, VigilError>,
    clients_notified: usize,
) -> (StatusCode, Json<IngestResponse>) {
    match persisted {
        Ok(record) => (
            StatusCode::OK,
            Json(IngestResponse {
                status: "received",
                message: "Webhook saved and broadcasted successfully".to_string(),
                timestamp,
                saved_to_database: true,
                database_id: Some(record.id),
                clients_notified,
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "failed to persist webhook");
            (
                StatusCode::MULTI_STATUS,
                Json(IngestResponse {
                    status: "partial_success",
                    message: "Webhook broadcasted but failed to save to database".to_string(),
                    timestamp,
                    saved_to_database: false,
                    database_id: None,
                    clients_notified,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Queries and maintenance
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub status: &'static str,
    pub count: usize,
    pub webhooks: Vec<StoredWebhook>,
}

/// `GET /api/webhooks?limit=N` -- the last N records, most recent first.
pub async fn recent_webhooks(
    State(state): State<AppState>,
    Query(q): Query<RecentQuery>,
) -> Response {
    let limit = q.limit.unwrap_or(state.config.recent_limit);
    match state.store.lock().await.recent(limit) {
        Ok(webhooks) => Json(RecentResponse {
            status: "success",
            count: webhooks.len(),
            webhooks,
        })
        .into_response(),
        Err(e) => error_response("Failed to fetch webhooks", e),
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    #[serde(rename = "totalWebhooks")]
    pub total_webhooks: usize,
    #[serde(rename = "dailyStats")]
    pub daily_stats: Vec<DailyCount>,
    #[serde(rename = "connectedClients")]
    pub connected_clients: usize,
}

/// `GET /api/stats` -- totals and the trailing 7-day daily breakdown.
pub async fn stats(State(state): State<AppState>) -> Response {
    let (total, daily) = {
        let store = state.store.lock().await;
        match store.count().and_then(|t| store.daily_stats().map(|d| (t, d))) {
            Ok(pair) => pair,
            Err(e) => return error_response("Failed to fetch statistics", e),
        }
    };

    Json(StatsResponse {
        status: "success",
        total_webhooks: total,
        daily_stats: daily,
        connected_clients: state.registry.subscriber_count(),
    })
    .into_response()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(rename = "connectedClients")]
    pub connected_clients: usize,
    pub database: &'static str,
    pub timestamp: String,
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.store.lock().await.ping() {
        "connected"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: "ok",
        connected_clients: state.registry.subscriber_count(),
        database,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(rename = "deletedCount")]
    pub deleted_count: usize,
}

/// `DELETE /api/webhooks/cleanup?days=N` -- age-based pruning, on demand.
pub async fn cleanup_webhooks(
    State(state): State<AppState>,
    Query(q): Query<CleanupQuery>,
) -> Response {
    let days = q.days.unwrap_or(state.config.cleanup_days);
    match state.store.lock().await.prune(days) {
        Ok(deleted_count) => Json(CleanupResponse {
            status: "success",
            message: format!("Cleaned up webhooks older than {days} days"),
            deleted_count,
        })
        .into_response(),
        Err(e) => error_response("Failed to cleanup old webhooks", e),
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: &'static str,
    error: String,
}

fn error_response(message: &'static str, e: VigilError) -> Response {
    error!(error = %e, "{message}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            status: "error",
            message,
            error: e.to_string(),
        }),
    )
        .into_response()
}
