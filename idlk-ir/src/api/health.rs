//! Liveness and health endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when the database answers, "degraded" otherwise
    pub status: String,
    /// Module name ("idlk-ir")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Commit the binary was built from
    pub git_hash: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Database probe result ("ok" or "error")
    pub database: String,
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Server is running" }))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let database_ok = match sqlx::query("SELECT 1")
        .execute(state.resolver.store().pool())
        .await
    {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check database probe failed");
            false
        }
    };

    Json(HealthResponse {
        status: if database_ok { "ok" } else { "degraded" }.to_string(),
        module: "idlk-ir".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: crate::GIT_HASH.to_string(),
        uptime_seconds,
        database: if database_ok { "ok" } else { "error" }.to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
