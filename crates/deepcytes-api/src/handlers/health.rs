//! Liveness and dependency health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ServicesHealth {
    pub server: &'static str,
    pub mongodb: &'static str,
    pub elasticsearch: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime: f64,
    pub services: ServicesHealth,
}

fn label(healthy: bool) -> &'static str {
    if healthy {
        "healthy"
    } else {
        "unhealthy"
    }
}

/// Report server and dependency health.
///
/// # Returns
/// - 200 OK when every service is healthy
/// - 503 Service Unavailable with the same body when any is not
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mongodb = state.mongodb.probe().await;
    let elasticsearch = state.elasticsearch.probe().await;
    let healthy = mongodb && elasticsearch;
    if !healthy {
        warn!(subsystem = "api", op = "health", mongodb, elasticsearch, "Degraded");
    }

    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.started_at.elapsed().as_secs_f64(),
        services: ServicesHealth {
            server: "healthy",
            mongodb: label(mongodb),
            elasticsearch: label(elasticsearch),
        },
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
