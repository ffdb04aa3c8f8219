//! Action orchestrator
//!
//! Each action is a strict sequential pipeline of ledger writes: no step is
//! issued until the previous step's transaction has confirmed, because the
//! contract rejects out-of-order calls (approval must be durable before
//! finalize, the earnest deposit before the buyer's approval matters).
//!
//! A failure at any step abandons the remaining steps of that invocation.
//! The completion flag stays false, the busy flag is cleared on every exit
//! path, and the error is logged rather than re-raised; callers observe
//! only the flags and retry by triggering the action again. A mid-sequence
//! failure can leave on-ledger state partially advanced (approved but not
//! finalized); the retry picks up from the contract's current state.

use std::sync::Arc;

use tracing::{info, warn};

use homestead_gateway::EscrowGateway;
use homestead_types::{Address, EscrowAction, ListingId, Result};

use crate::cache::EscrowStateCache;

/// Gas allowance attached to the lender's direct value transfer
pub const LEND_TRANSFER_GAS_LIMIT: u64 = 100_000;

pub struct ActionOrchestrator {
    gateway: Arc<dyn EscrowGateway>,
    cache: EscrowStateCache,
    listing: ListingId,
    identity: Address,
}

impl ActionOrchestrator {
    pub fn new(
        gateway: Arc<dyn EscrowGateway>,
        cache: EscrowStateCache,
        listing: ListingId,
        identity: Address,
    ) -> Self {
        Self {
            gateway,
            cache,
            listing,
            identity,
        }
    }

    /// Run one action flow to completion or failure.
    ///
    /// Returns whether the action's completion flag is now set. Role gating
    /// happens in the resolver before this is invoked, not here.
    pub async fn run(&self, action: EscrowAction) -> bool {
        self.cache.set_busy(action, true).await;

        let outcome = match action {
            EscrowAction::Buy => self.buy().await,
            EscrowAction::Inspect => self.inspect().await,
            EscrowAction::Lend => self.lend().await,
            EscrowAction::Sell => self.sell().await,
        };

        let completed = match outcome {
            Ok(()) => {
                self.cache.set_flag(action, true).await;
                info!("Action {} completed for listing {}", action, self.listing);
                true
            }
            Err(e) => {
                warn!(
                    "Action {} did not complete for listing {}: {}",
                    action, self.listing, e
                );
                false
            }
        };

        self.cache.set_busy(action, false).await;
        completed
    }

    /// Deposit the earnest amount, then approve the sale.
    async fn buy(&self) -> Result<()> {
        let earnest = self.gateway.escrow_amount(self.listing).await?;
        self.gateway
            .deposit_earnest(self.listing, &self.identity, earnest)
            .await?
            .confirmed()
            .await?;
        self.gateway
            .approve_sale(self.listing, &self.identity)
            .await?
            .confirmed()
            .await?;
        Ok(())
    }

    /// Mark the inspection as passed.
    async fn inspect(&self) -> Result<()> {
        self.gateway
            .update_inspection_status(self.listing, &self.identity, true)
            .await?
            .confirmed()
            .await?;
        Ok(())
    }

    /// Approve the sale, then fund the remainder of the purchase price.
    async fn lend(&self) -> Result<()> {
        self.gateway
            .approve_sale(self.listing, &self.identity)
            .await?
            .confirmed()
            .await?;

        let price = self.gateway.purchase_price(self.listing).await?;
        let earnest = self.gateway.escrow_amount(self.listing).await?;
        // The gateway's listing validation guarantees price >= earnest
        let lend_amount = price.checked_sub(earnest)?;

        let contract = self.gateway.contract_address();
        self.gateway
            .transfer(&self.identity, &contract, lend_amount, LEND_TRANSFER_GAS_LIMIT)
            .await?
            .confirmed()
            .await?;
        Ok(())
    }

    /// Approve the sale, then finalize the transfer.
    async fn sell(&self) -> Result<()> {
        self.gateway
            .approve_sale(self.listing, &self.identity)
            .await?
            .confirmed()
            .await?;
        self.gateway
            .finalize_sale(self.listing, &self.identity)
            .await?
            .confirmed()
            .await?;
        Ok(())
    }
}
