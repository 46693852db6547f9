//! Store clients for the three external dependencies.
//!
//! Every dependency is reached through two traits:
//!
//! - [`StoreConnector`] builds a client from settings (no state of its own)
//! - [`StoreHandle`] is the live client: it can be pinged and closed
//!
//! The lifecycle manager only ever talks to these traits, so the production
//! clients below can be swapped for in-memory fakes in tests.
//!
//! | Kind   | Backend | Liveness call              |
//! |--------|---------|----------------------------|
//! | graph  | Neo4j   | `RETURN 1` over Bolt       |
//! | vector | Qdrant  | `GET /collections`         |
//! | cache  | Redis   | `PING`                     |

mod cache;
mod graph;
mod vector;

pub use cache::CacheConnector;
pub use graph::GraphConnector;
pub use vector::VectorConnector;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::Settings;

// ============================================================================
// Store Kind
// ============================================================================

/// The fixed set of dependencies this service wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Graph,
    Vector,
    Cache,
}

impl StoreKind {
    /// All kinds, in release order.
    pub const ALL: [Self; 3] = [Self::Graph, Self::Vector, Self::Cache];

    /// Name used in logs and in the `dependencies` map of a health report.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Vector => "vector",
            Self::Cache => "cache",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Graph => 0,
            Self::Vector => 1,
            Self::Cache => 2,
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while connecting to, probing, or closing a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("graph store error: {0}")]
    Graph(#[from] neo4rs::Error),
    #[error("vector store error: {0}")]
    Vector(#[from] reqwest::Error),
    #[error("cache store error: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("timeout")]
    Timeout,
    #[error("{0}")]
    Unavailable(String),
}

// ============================================================================
// Traits
// ============================================================================

/// A live client for one store.
///
/// Handles are shared as `Arc<dyn StoreHandle>` between the lifecycle
/// manager and concurrent health probes, so every method takes `&self`.
#[async_trait]
pub trait StoreHandle: Send + Sync + 'static {
    /// Which dependency this handle talks to.
    fn kind(&self) -> StoreKind;

    /// One round-trip proving the store can serve requests right now.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release pooled connections. Called at most once per handle.
    async fn close(&self) -> Result<(), StoreError>;
}

/// Builds a [`StoreHandle`] for one dependency.
#[async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    fn kind(&self) -> StoreKind;

    /// Construct the client. Implementations may or may not open a network
    /// connection here; the lifecycle manager always pings afterwards.
    async fn connect(&self) -> Result<Arc<dyn StoreHandle>, StoreError>;
}

// ============================================================================
// Connector Set
// ============================================================================

/// One connector per [`StoreKind`].
#[derive(Clone)]
pub struct StoreConnectors {
    graph: Arc<dyn StoreConnector>,
    vector: Arc<dyn StoreConnector>,
    cache: Arc<dyn StoreConnector>,
}

impl StoreConnectors {
    pub fn new(
        graph: Arc<dyn StoreConnector>,
        vector: Arc<dyn StoreConnector>,
        cache: Arc<dyn StoreConnector>,
    ) -> Self {
        Self {
            graph,
            vector,
            cache,
        }
    }

    /// Production connectors (Neo4j, Qdrant, Redis) built from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Arc::new(GraphConnector::new(settings.graph.clone())),
            Arc::new(VectorConnector::new(
                settings.vector.clone(),
                settings.timeouts.probe(),
            )),
            Arc::new(CacheConnector::new(settings.cache.clone())),
        )
    }

    pub fn get(&self, kind: StoreKind) -> &Arc<dyn StoreConnector> {
        match kind {
            StoreKind::Graph => &self.graph,
            StoreKind::Vector => &self.vector,
            StoreKind::Cache => &self.cache,
        }
    }
}
