//! Listing controller
//!
//! Wires the sync engine, role resolver, and action orchestrator together
//! for one listing and one session identity, and applies the re-sync rule:
//! after an action runs, the cache is refreshed from the gateway iff any
//! completion flag changed. The comparison is explicit so the ordering
//! (action completes, cache possibly stale, re-sync) stays observable.

use std::sync::Arc;

use homestead_gateway::EscrowGateway;
use homestead_types::{Address, EscrowError, ListingId, Result};

use crate::cache::{EscrowStateCache, ListingSnapshot};
use crate::orchestrator::ActionOrchestrator;
use crate::resolver::{available_action, ActionStatus};
use crate::sync::SyncEngine;

pub struct ListingController {
    cache: EscrowStateCache,
    sync: SyncEngine,
    orchestrator: ActionOrchestrator,
    identity: Address,
    listing: ListingId,
}

impl ListingController {
    pub fn new(gateway: Arc<dyn EscrowGateway>, listing: ListingId, identity: Address) -> Self {
        let cache = EscrowStateCache::new();
        Self {
            sync: SyncEngine::new(Arc::clone(&gateway), cache.clone(), listing),
            orchestrator: ActionOrchestrator::new(
                gateway,
                cache.clone(),
                listing,
                identity.clone(),
            ),
            cache,
            identity,
            listing,
        }
    }

    /// Run both refresh passes against the gateway.
    pub async fn sync(&self) {
        self.sync.refresh_details().await;
        self.sync.refresh_ownership().await;
    }

    /// Current view of the cached lifecycle state.
    pub async fn snapshot(&self) -> ListingSnapshot {
        self.cache.snapshot().await
    }

    /// The action this session may perform, gated for enablement; `None`
    /// once the listing has transferred.
    pub async fn available_action(&self) -> Option<ActionStatus> {
        let snapshot = self.cache.snapshot().await;
        let busy = self.cache.busy_flags().await;
        available_action(&self.identity, &snapshot, &busy)
    }

    /// Trigger the action this session resolves to.
    ///
    /// Refuses before any ledger call when the listing has transferred or
    /// the action is busy or already completed. Otherwise runs the flow and
    /// returns whether it completed; a failed flow is `Ok(false)`, observed
    /// through the flags exactly as a caller would see it.
    pub async fn trigger(&self) -> Result<bool> {
        let status = self
            .available_action()
            .await
            .ok_or(EscrowError::ListingTransferred {
                listing: self.listing,
            })?;
        if status.busy {
            return Err(EscrowError::ActionBusy {
                action: status.action,
            });
        }
        if status.completed {
            return Err(EscrowError::ActionCompleted {
                action: status.action,
            });
        }

        let before = self.cache.snapshot().await.flags();
        let completed = self.orchestrator.run(status.action).await;
        let after = self.cache.snapshot().await.flags();

        if before != after {
            self.sync().await;
        }
        Ok(completed)
    }
}
