//! Neo4j graph store over Bolt.

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::{StoreConnector, StoreError, StoreHandle, StoreKind};
use crate::config::defaults::GRAPH_MAX_CONNECTIONS;
use crate::config::GraphSettings;

pub struct GraphConnector {
    settings: GraphSettings,
}

impl GraphConnector {
    pub const fn new(settings: GraphSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl StoreConnector for GraphConnector {
    fn kind(&self) -> StoreKind {
        StoreKind::Graph
    }

    async fn connect(&self) -> Result<Arc<dyn StoreHandle>, StoreError> {
        let config = ConfigBuilder::default()
            .uri(self.settings.url.as_str())
            .user(self.settings.username.as_str())
            .password(self.settings.password.as_str())
            .max_connections(GRAPH_MAX_CONNECTIONS)
            .build()?;

        let graph = Graph::connect(config).await?;
        debug!(url = %self.settings.url, "Neo4j driver constructed");

        Ok(Arc::new(GraphHandle {
            graph: Mutex::new(Some(graph)),
        }))
    }
}

/// Pooled Bolt driver. `close` drops the pool; later pings fail.
pub struct GraphHandle {
    graph: Mutex<Option<Graph>>,
}

impl GraphHandle {
    fn graph(&self) -> Result<Graph, StoreError> {
        self.graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| StoreError::Unavailable("graph driver closed".to_string()))
    }
}

#[async_trait]
impl StoreHandle for GraphHandle {
    fn kind(&self) -> StoreKind {
        StoreKind::Graph
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let graph = self.graph()?;
        graph.run(query("RETURN 1")).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let graph = self
            .graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(graph);
        Ok(())
    }
}
