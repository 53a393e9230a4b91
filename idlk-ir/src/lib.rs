//! idlk-ir library interface for testing
//!
//! Exposes the resolver, store and router for integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod resolver;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::resolver::IdentityResolver;

/// Short commit hash the binary was built from ("unknown" outside git)
pub const GIT_HASH: &str = env!("GIT_HASH");
/// Build time, RFC 3339 UTC
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
/// Cargo profile ("debug" or "release")
pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::identify_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
