//! Redis cache store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::{StoreConnector, StoreError, StoreHandle, StoreKind};
use crate::config::CacheSettings;

pub struct CacheConnector {
    settings: CacheSettings,
}

impl CacheConnector {
    pub const fn new(settings: CacheSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl StoreConnector for CacheConnector {
    fn kind(&self) -> StoreKind {
        StoreKind::Cache
    }

    async fn connect(&self) -> Result<Arc<dyn StoreHandle>, StoreError> {
        let client = redis::Client::open(self.settings.url.as_str())?;

        // ConnectionManager reconnects on its own after the first connect
        let manager = ConnectionManager::new(client).await?;
        debug!("Redis connection manager established");

        Ok(Arc::new(CacheHandle {
            manager: Mutex::new(Some(manager)),
        }))
    }
}

pub struct CacheHandle {
    manager: Mutex<Option<ConnectionManager>>,
}

#[async_trait]
impl StoreHandle for CacheHandle {
    fn kind(&self) -> StoreKind {
        StoreKind::Cache
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .manager
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| StoreError::Unavailable("cache connection closed".to_string()))?;

        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        if reply != "PONG" {
            return Err(StoreError::UnexpectedReply(reply));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.manager
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
