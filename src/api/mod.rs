//! REST API module using Axum
//!
//! Two read-only endpoints:
//! - `/health` reports per-store connectivity (healthy or degraded)
//! - `/config` echoes resolved settings in development deployments

pub mod envelope;
pub mod handlers;

pub use handlers::AppState;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Settings;

/// CORS restricted to `frontend_domain` when set, otherwise any origin.
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origin = match settings.app.frontend_domain.as_deref() {
        Some(domain) => match HeaderValue::from_str(domain) {
            Ok(value) => {
                tracing::info!(origin = %domain, "CORS: allowing configured frontend origin");
                AllowOrigin::exact(value)
            }
            Err(e) => {
                tracing::warn!(origin = %domain, error = %e, "CORS: invalid frontend origin, allowing any origin");
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/config", get(handlers::get_config))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
