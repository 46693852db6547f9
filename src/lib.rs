//! graphrag-api: backend service skeleton for a GraphRAG application
//!
//! Owns connections to three external stores and reports their health.
//!
//! ## Architecture
//!
//! - **Stores**: Neo4j (graph), Qdrant (vector) and Redis (cache) clients
//!   behind the `StoreConnector` / `StoreHandle` traits
//! - **Lifecycle**: acquires every store once at startup, best-effort, and
//!   releases them on shutdown
//! - **Health**: concurrent per-store probes folded into a healthy/degraded
//!   report
//! - **API**: `GET /health` and `GET /config` over Axum

pub mod api;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod stores;
pub mod telemetry;

pub use config::{ConfigError, ConfigSources, Settings};
pub use health::{DependencyStatus, HealthAggregator, HealthReport, HealthStatus};
pub use lifecycle::{LifecycleError, LifecycleManager, ResourceState};
pub use stores::{StoreConnector, StoreConnectors, StoreError, StoreHandle, StoreKind};
