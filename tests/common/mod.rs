//! In-memory store fakes shared by the integration tests.
//!
//! Each `FakeStore` is both the connector and (through `FakeHandle`) the
//! live handle, with counters so tests can assert how often the lifecycle
//! manager connected, pinged and closed it.

#![allow(dead_code)]

use async_trait::async_trait;
use graphrag_api::api::{create_app, AppState};
use graphrag_api::config::Settings;
use graphrag_api::health::HealthAggregator;
use graphrag_api::lifecycle::LifecycleManager;
use graphrag_api::stores::{StoreConnector, StoreConnectors, StoreError, StoreHandle, StoreKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Ok,
    FailConnect,
    HangConnect,
    FailPing,
    HangPing,
    PanicPing,
    FailClose,
}

struct Inner {
    kind: StoreKind,
    behavior: Mutex<Behavior>,
    connects: AtomicUsize,
    pings: AtomicUsize,
    closes: AtomicUsize,
    close_log: Arc<Mutex<Vec<StoreKind>>>,
}

impl Inner {
    fn behavior(&self) -> Behavior {
        *self.behavior.lock().unwrap()
    }
}

#[derive(Clone)]
pub struct FakeStore {
    inner: Arc<Inner>,
}

impl FakeStore {
    pub fn new(kind: StoreKind, behavior: Behavior, close_log: Arc<Mutex<Vec<StoreKind>>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                behavior: Mutex::new(behavior),
                connects: AtomicUsize::new(0),
                pings: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                close_log,
            }),
        }
    }

    /// Change how later calls behave (e.g. a store going down after startup).
    pub fn set_behavior(&self, behavior: Behavior) {
        *self.inner.behavior.lock().unwrap() = behavior;
    }

    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.inner.pings.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for FakeStore {
    fn kind(&self) -> StoreKind {
        self.inner.kind
    }

    async fn connect(&self) -> Result<Arc<dyn StoreHandle>, StoreError> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        match self.inner.behavior() {
            Behavior::FailConnect => {
                Err(StoreError::Unavailable("connection refused".to_string()))
            }
            Behavior::HangConnect => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(StoreError::Unavailable("unreachable".to_string()))
            }
            _ => Ok(Arc::new(FakeHandle {
                inner: Arc::clone(&self.inner),
            })),
        }
    }
}

struct FakeHandle {
    inner: Arc<Inner>,
}

#[async_trait]
impl StoreHandle for FakeHandle {
    fn kind(&self) -> StoreKind {
        self.inner.kind
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.pings.fetch_add(1, Ordering::SeqCst);
        match self.inner.behavior() {
            Behavior::FailPing => Err(StoreError::Unavailable("ping refused".to_string())),
            Behavior::HangPing => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
            Behavior::PanicPing => panic!("fake store panicked during ping"),
            _ => Ok(()),
        }
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close_log.lock().unwrap().push(self.inner.kind);
        if self.inner.behavior() == Behavior::FailClose {
            return Err(StoreError::Unavailable("close failed".to_string()));
        }
        Ok(())
    }
}

/// Three fake stores wired into a lifecycle manager.
pub struct Fixture {
    pub graph: FakeStore,
    pub vector: FakeStore,
    pub cache: FakeStore,
    pub close_log: Arc<Mutex<Vec<StoreKind>>>,
    pub lifecycle: Arc<LifecycleManager>,
}

impl Fixture {
    pub fn new(graph: Behavior, vector: Behavior, cache: Behavior) -> Self {
        let close_log = Arc::new(Mutex::new(Vec::new()));
        let graph = FakeStore::new(StoreKind::Graph, graph, Arc::clone(&close_log));
        let vector = FakeStore::new(StoreKind::Vector, vector, Arc::clone(&close_log));
        let cache = FakeStore::new(StoreKind::Cache, cache, Arc::clone(&close_log));

        let connectors = StoreConnectors::new(
            Arc::new(graph.clone()),
            Arc::new(vector.clone()),
            Arc::new(cache.clone()),
        );
        let lifecycle = Arc::new(LifecycleManager::new(connectors, Duration::from_millis(200)));

        Self {
            graph,
            vector,
            cache,
            close_log,
            lifecycle,
        }
    }

    pub fn healthy() -> Self {
        Self::new(Behavior::Ok, Behavior::Ok, Behavior::Ok)
    }

    pub fn store(&self, kind: StoreKind) -> &FakeStore {
        match kind {
            StoreKind::Graph => &self.graph,
            StoreKind::Vector => &self.vector,
            StoreKind::Cache => &self.cache,
        }
    }

    pub fn closed_in_order(&self) -> Vec<StoreKind> {
        self.close_log.lock().unwrap().clone()
    }

    pub fn health(&self, settings: &Settings) -> HealthAggregator {
        HealthAggregator::new(Arc::clone(&self.lifecycle), settings)
    }

    pub fn app(&self, settings: Settings) -> axum::Router {
        let health = self.health(&settings);
        create_app(Arc::new(AppState::new(Arc::new(settings), health)))
    }
}

/// Default settings with the shortest probe timeout.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.timeouts.probe_secs = 1;
    settings
}
