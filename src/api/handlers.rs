//! API route handlers
//!
//! - `GET /health`: dependency status, always 200
//! - `GET /config`: resolved settings, only when the config endpoint is enabled

use axum::extract::State;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::debug;

use super::envelope::ApiErrorResponse;
use crate::config::Settings;
use crate::health::{HealthAggregator, HealthReport};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
pub struct AppState {
    pub settings: Arc<Settings>,
    pub health: HealthAggregator,
}

impl AppState {
    pub const fn new(settings: Arc<Settings>, health: HealthAggregator) -> Self {
        Self { settings, health }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// A degraded report is still a successful response.
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let report = state.health.check_health().await;
    debug!(status = ?report.status, "Health check complete");
    Json(report)
}

/// Full settings including credentials. Gated by `config_endpoint_enabled`.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Response {
    if !state.settings.config_endpoint_enabled() {
        return ApiErrorResponse::not_found("config endpoint is disabled");
    }
    Json(state.settings.as_ref()).into_response()
}

pub async fn not_found(uri: Uri) -> Response {
    ApiErrorResponse::not_found(format!("no route for {}", uri.path()))
}
