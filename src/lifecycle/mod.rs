//! Connection lifecycle for the graph, vector and cache stores.
//!
//! [`LifecycleManager`] is the single owner of the three store handles:
//!
//! - `start()` acquires every handle once, best-effort. A store that cannot
//!   be reached is logged and marked `Failed`; the process keeps going.
//! - `handle()` hands out shared clones of `Ready` handles to request code.
//! - `stop()` releases `Ready` handles in `graph, vector, cache` order and
//!   is safe to call any number of times.
//!
//! Slot mutations only happen inside `start` and `stop`, which `main` runs
//! before the listener is bound and after the server has drained.

use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::stores::{StoreConnectors, StoreError, StoreHandle, StoreKind};

/// Failure reason recorded when a connector or its startup ping panics.
pub const CONNECT_PANICKED: &str = "connect panicked";

// ============================================================================
// State
// ============================================================================

/// Observable state of one store slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ResourceState {
    Uninitialized,
    Connecting,
    Ready,
    Failed { reason: String },
    Released,
}

enum Slot {
    Uninitialized,
    Connecting,
    Ready(Arc<dyn StoreHandle>),
    Failed(String),
    Released,
}

impl Slot {
    fn state(&self) -> ResourceState {
        match self {
            Self::Uninitialized => ResourceState::Uninitialized,
            Self::Connecting => ResourceState::Connecting,
            Self::Ready(_) => ResourceState::Ready,
            Self::Failed(reason) => ResourceState::Failed {
                reason: reason.clone(),
            },
            Self::Released => ResourceState::Released,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("{0} store not initialized")]
    NotInitialized(StoreKind),
}

// ============================================================================
// Manager
// ============================================================================

pub struct LifecycleManager {
    connectors: StoreConnectors,
    connect_timeout: Duration,
    slots: RwLock<[Slot; 3]>,
    started: AtomicBool,
}

impl LifecycleManager {
    pub fn new(connectors: StoreConnectors, connect_timeout: Duration) -> Self {
        Self {
            connectors,
            connect_timeout,
            slots: RwLock::new([Slot::Uninitialized, Slot::Uninitialized, Slot::Uninitialized]),
            started: AtomicBool::new(false),
        }
    }

    /// Acquire all three stores. Runs at most once; later calls only warn.
    ///
    /// Never fails: per-store errors end up in that store's `Failed` state.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            warn!("Lifecycle start called more than once, ignoring");
            return;
        }

        info!("Initializing store connections...");
        futures::future::join_all(StoreKind::ALL.map(|kind| self.acquire(kind))).await;

        let states = self.states();
        let ready = states
            .iter()
            .filter(|(_, s)| *s == ResourceState::Ready)
            .count();
        if ready == StoreKind::ALL.len() {
            info!("All stores connected");
        } else {
            warn!(
                ready,
                failed = StoreKind::ALL.len() - ready,
                "Started with unavailable stores, health checks will report degraded"
            );
        }
    }

    async fn acquire(&self, kind: StoreKind) {
        self.set_slot(kind, Slot::Connecting);

        // Panics are recorded as a failed slot, like any other error
        let attempt = AssertUnwindSafe(self.connect_and_verify(kind))
            .catch_unwind()
            .await;

        match attempt {
            Ok(Ok(handle)) => {
                info!(store = %kind, "Store connected");
                self.set_slot(kind, Slot::Ready(handle));
            }
            Ok(Err(e)) => {
                error!(store = %kind, error = %e, "Failed to initialize store connection");
                self.set_slot(kind, Slot::Failed(e.to_string()));
            }
            Err(_) => {
                error!(store = %kind, "Store connection attempt panicked");
                self.set_slot(kind, Slot::Failed(CONNECT_PANICKED.to_string()));
            }
        }
    }

    async fn connect_and_verify(&self, kind: StoreKind) -> Result<Arc<dyn StoreHandle>, StoreError> {
        let connector = self.connectors.get(kind);

        let handle = tokio::time::timeout(self.connect_timeout, connector.connect())
            .await
            .map_err(|_| StoreError::Timeout)??;

        let verified = tokio::time::timeout(self.connect_timeout, handle.ping())
            .await
            .map_err(|_| StoreError::Timeout)
            .and_then(|r| r);

        if let Err(e) = verified {
            // Constructed but unusable: release whatever it pooled
            if let Err(close_err) = handle.close().await {
                warn!(store = %kind, error = %close_err, "Failed to close unverified store handle");
            }
            return Err(e);
        }

        Ok(handle)
    }

    /// Release every `Ready` store. Idempotent.
    pub async fn stop(&self) {
        for kind in StoreKind::ALL {
            let Some(handle) = self.take_ready(kind) else {
                continue;
            };
            match handle.close().await {
                Ok(()) => info!(store = %kind, "Store connection closed"),
                Err(e) => warn!(store = %kind, error = %e, "Failed to close store connection"),
            }
        }
    }

    /// Shared handle for a `Ready` store.
    pub fn handle(&self, kind: StoreKind) -> Result<Arc<dyn StoreHandle>, LifecycleError> {
        match &self.read_slots()[kind.index()] {
            Slot::Ready(handle) => Ok(Arc::clone(handle)),
            _ => Err(LifecycleError::NotInitialized(kind)),
        }
    }

    pub fn state(&self, kind: StoreKind) -> ResourceState {
        self.read_slots()[kind.index()].state()
    }

    pub fn states(&self) -> Vec<(StoreKind, ResourceState)> {
        let slots = self.read_slots();
        StoreKind::ALL
            .iter()
            .map(|&kind| (kind, slots[kind.index()].state()))
            .collect()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn take_ready(&self, kind: StoreKind) -> Option<Arc<dyn StoreHandle>> {
        let mut slots = self.slots.write().unwrap_or_else(|e| {
            warn!("RwLock poisoned on lifecycle slots, recovering");
            e.into_inner()
        });
        let slot = &mut slots[kind.index()];
        if !matches!(slot, Slot::Ready(_)) {
            return None;
        }
        match std::mem::replace(slot, Slot::Released) {
            Slot::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    fn set_slot(&self, kind: StoreKind, slot: Slot) {
        let mut slots = self.slots.write().unwrap_or_else(|e| {
            warn!("RwLock poisoned on lifecycle slots, recovering");
            e.into_inner()
        });
        slots[kind.index()] = slot;
    }

    fn read_slots(&self) -> std::sync::RwLockReadGuard<'_, [Slot; 3]> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }
}
