//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! `/health` and `/config` using `tower::ServiceExt::oneshot()`.
//! Stores are in-memory fakes, so no datastore or network port is needed.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{test_settings, Behavior, Fixture};
use graphrag_api::stores::StoreKind;
use serde_json::Value;
use tower::ServiceExt;

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn assert_dependency_keys(json: &Value) {
    let deps = json["dependencies"].as_object().expect("dependencies object");
    let mut keys: Vec<_> = deps.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["cache", "graph", "vector"]);
}

// ============================================================================
// /health
// ============================================================================

#[tokio::test]
async fn health_all_connected_is_healthy() {
    let fx = Fixture::healthy();
    fx.lifecycle.start().await;

    let (status, json) = get_json(fx.app(test_settings()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_dependency_keys(&json);
    for kind in StoreKind::ALL {
        let dep = &json["dependencies"][kind.as_str()];
        assert_eq!(dep["status"], "connected", "{kind}");
        assert!(dep["latency_ms"].is_u64(), "{kind} latency missing");
    }
    assert_eq!(json["environment"], "development");
    assert_eq!(json["log_level"], "INFO");

    let checked_at = json["checked_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(checked_at).is_ok());
}

#[tokio::test]
async fn health_with_one_failed_store_is_degraded_but_ok() {
    let fx = Fixture::new(Behavior::Ok, Behavior::FailConnect, Behavior::Ok);
    fx.lifecycle.start().await;

    let (status, json) = get_json(fx.app(test_settings()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_dependency_keys(&json);
    assert_eq!(json["dependencies"]["vector"]["status"], "unreachable");
    assert_eq!(json["dependencies"]["vector"]["reason"], "not initialized");
    assert_eq!(json["dependencies"]["graph"]["status"], "connected");
    assert_eq!(json["dependencies"]["cache"]["status"], "connected");
}

#[tokio::test]
async fn health_before_start_reports_every_store_not_initialized() {
    let fx = Fixture::healthy();

    let (status, json) = get_json(fx.app(test_settings()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_dependency_keys(&json);
    for kind in StoreKind::ALL {
        assert_eq!(json["dependencies"][kind.as_str()]["reason"], "not initialized");
        assert_eq!(fx.store(kind).pings(), 0, "{kind} was probed");
    }
}

#[tokio::test]
async fn health_reports_store_that_went_down_after_start() {
    let fx = Fixture::healthy();
    fx.lifecycle.start().await;
    fx.cache.set_behavior(Behavior::FailPing);

    let (status, json) = get_json(fx.app(test_settings()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["dependencies"]["cache"]["status"], "unreachable");
    assert_eq!(json["dependencies"]["cache"]["reason"], "ping refused");
}

#[tokio::test]
async fn health_probe_timeout_only_affects_that_store() {
    let fx = Fixture::healthy();
    fx.lifecycle.start().await;
    fx.vector.set_behavior(Behavior::HangPing);

    let (status, json) = get_json(fx.app(test_settings()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["dependencies"]["vector"]["reason"], "timeout");
    assert_eq!(json["dependencies"]["graph"]["status"], "connected");
    assert_eq!(json["dependencies"]["cache"]["status"], "connected");
}

#[tokio::test]
async fn health_survives_panicking_probe() {
    let fx = Fixture::healthy();
    fx.lifecycle.start().await;
    fx.graph.set_behavior(Behavior::PanicPing);

    let (status, json) = get_json(fx.app(test_settings()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dependencies"]["graph"]["reason"], "probe panicked");
    assert_eq!(json["dependencies"]["vector"]["status"], "connected");
    assert_eq!(json["dependencies"]["cache"]["status"], "connected");
}

#[tokio::test]
async fn health_after_stop_reports_not_initialized() {
    let fx = Fixture::healthy();
    fx.lifecycle.start().await;
    fx.lifecycle.stop().await;

    let (status, json) = get_json(fx.app(test_settings()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    for kind in StoreKind::ALL {
        assert_eq!(json["dependencies"][kind.as_str()]["reason"], "not initialized");
    }
}

#[tokio::test]
async fn health_echoes_configured_environment() {
    let fx = Fixture::healthy();
    fx.lifecycle.start().await;

    let mut settings = test_settings();
    settings.app.environment = "staging".to_string();
    settings.app.log_level = "WARNING".to_string();

    let (_, json) = get_json(fx.app(settings), "/health").await;
    assert_eq!(json["environment"], "staging");
    assert_eq!(json["log_level"], "WARNING");
}

// ============================================================================
// /config
// ============================================================================

#[tokio::test]
async fn config_is_served_in_development() {
    let fx = Fixture::healthy();

    let (status, json) = get_json(fx.app(test_settings()), "/config").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["app"]["environment"], "development");
    assert_eq!(json["graph"]["url"], "neo4j://neo4j:7687");
    assert_eq!(json["graph"]["password"], "password");
    assert_eq!(json["vector"]["url"], "http://qdrant:6333");
    assert_eq!(json["cache"]["url"], "redis://redis:6379");
}

#[tokio::test]
async fn config_is_hidden_in_production() {
    let fx = Fixture::healthy();
    let mut settings = test_settings();
    settings.app.environment = "production".to_string();

    let (status, json) = get_json(fx.app(settings), "/config").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert!(json.get("graph").is_none());
}

#[tokio::test]
async fn config_can_be_opted_in_outside_development() {
    let fx = Fixture::healthy();
    let mut settings = test_settings();
    settings.app.environment = "production".to_string();
    settings.app.expose_config = Some(true);

    let (status, json) = get_json(fx.app(settings), "/config").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["app"]["environment"], "production");
}

#[tokio::test]
async fn config_can_be_opted_out_in_development() {
    let fx = Fixture::healthy();
    let mut settings = test_settings();
    settings.app.expose_config = Some(false);

    let (status, _) = get_json(fx.app(settings), "/config").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
