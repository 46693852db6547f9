//! Dependency health aggregation for `GET /health`.
//!
//! Every check probes the three stores concurrently, each on its own task
//! with its own timeout, and folds the results into a [`HealthReport`].
//! A store that is down (or was never connected) only degrades the report;
//! it never turns the check itself into an error.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::lifecycle::{LifecycleError, LifecycleManager};
use crate::stores::{StoreHandle, StoreKind};

pub const NOT_INITIALIZED: &str = "not initialized";
pub const PROBE_TIMEOUT: &str = "timeout";
pub const PROBE_PANICKED: &str = "probe panicked";

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Result of probing one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DependencyStatus {
    Connected { latency_ms: u64 },
    Unreachable { reason: String },
}

impl DependencyStatus {
    fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable {
            reason: reason.into(),
        }
    }

    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// Snapshot returned by `GET /health`. Built per request, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Always keyed by exactly `graph`, `vector`, `cache`.
    pub dependencies: BTreeMap<&'static str, DependencyStatus>,
    pub environment: String,
    pub log_level: String,
    pub checked_at: String,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    pub fn dependency(&self, kind: StoreKind) -> Option<&DependencyStatus> {
        self.dependencies.get(kind.as_str())
    }
}

// ============================================================================
// Aggregator
// ============================================================================

#[derive(Clone)]
pub struct HealthAggregator {
    lifecycle: Arc<LifecycleManager>,
    probe_timeout: Duration,
    environment: String,
    log_level: String,
}

impl HealthAggregator {
    pub fn new(lifecycle: Arc<LifecycleManager>, settings: &Settings) -> Self {
        Self {
            lifecycle,
            probe_timeout: settings.timeouts.probe(),
            environment: settings.app.environment.clone(),
            log_level: settings.app.log_level.clone(),
        }
    }

    pub async fn check_health(&self) -> HealthReport {
        let tasks: Vec<_> = StoreKind::ALL
            .iter()
            .map(|&kind| {
                let handle = self.lifecycle.handle(kind);
                (kind, tokio::spawn(probe(kind, handle, self.probe_timeout)))
            })
            .collect();

        let mut dependencies = BTreeMap::new();
        for (kind, task) in tasks {
            let status = match task.await {
                Ok(status) => status,
                Err(e) => {
                    warn!(store = %kind, error = %e, "Health probe task failed");
                    if e.is_panic() {
                        DependencyStatus::unreachable(PROBE_PANICKED)
                    } else {
                        DependencyStatus::unreachable(e.to_string())
                    }
                }
            };
            dependencies.insert(kind.as_str(), status);
        }

        let status = if dependencies.values().all(DependencyStatus::is_connected) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        HealthReport {
            status,
            dependencies,
            environment: self.environment.clone(),
            log_level: self.log_level.clone(),
            checked_at: Utc::now().to_rfc3339(),
        }
    }
}

async fn probe(
    kind: StoreKind,
    handle: Result<Arc<dyn StoreHandle>, LifecycleError>,
    timeout: Duration,
) -> DependencyStatus {
    let Ok(handle) = handle else {
        debug!(store = %kind, "Store not initialized, skipping probe");
        return DependencyStatus::unreachable(NOT_INITIALIZED);
    };

    let started = Instant::now();
    match tokio::time::timeout(timeout, handle.ping()).await {
        Ok(Ok(())) => DependencyStatus::Connected {
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        },
        Ok(Err(e)) => {
            warn!(store = %kind, error = %e, "Health probe failed");
            DependencyStatus::unreachable(e.to_string())
        }
        Err(_) => {
            warn!(store = %kind, timeout = ?timeout, "Health probe timed out");
            DependencyStatus::unreachable(PROBE_TIMEOUT)
        }
    }
}
