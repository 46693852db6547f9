//! Qdrant vector store over its REST API.
//!
//! Liveness is `GET /collections`, the cheapest authenticated call Qdrant
//! offers: it proves reachability and that the API key (if any) is accepted.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{StoreConnector, StoreError, StoreHandle, StoreKind};
use crate::config::VectorSettings;

const API_KEY_HEADER: &str = "api-key";

pub struct VectorConnector {
    settings: VectorSettings,
    request_timeout: Duration,
}

impl VectorConnector {
    pub const fn new(settings: VectorSettings, request_timeout: Duration) -> Self {
        Self {
            settings,
            request_timeout,
        }
    }

    fn default_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.settings.api_key {
            let mut value = HeaderValue::from_str(key).map_err(|_| {
                StoreError::InvalidSettings(
                    "QDRANT_API_KEY contains invalid header characters".to_string(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl StoreConnector for VectorConnector {
    fn kind(&self) -> StoreKind {
        StoreKind::Vector
    }

    async fn connect(&self) -> Result<Arc<dyn StoreHandle>, StoreError> {
        reqwest::Url::parse(&self.settings.url)
            .map_err(|e| StoreError::InvalidSettings(format!("QDRANT_URL: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .default_headers(self.default_headers()?)
            .build()?;

        Ok(Arc::new(VectorHandle {
            http: Mutex::new(Some(http)),
            collections_url: format!("{}/collections", self.settings.url.trim_end_matches('/')),
        }))
    }
}

pub struct VectorHandle {
    http: Mutex<Option<reqwest::Client>>,
    collections_url: String,
}

#[async_trait]
impl StoreHandle for VectorHandle {
    fn kind(&self) -> StoreKind {
        StoreKind::Vector
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let http = self
            .http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| StoreError::Unavailable("vector client closed".to_string()))?;

        let resp = http.get(&self.collections_url).send().await?;
        if !resp.status().is_success() {
            return Err(StoreError::UnexpectedStatus(resp.status().as_u16()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
