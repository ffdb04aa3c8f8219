//! Sync engine
//!
//! Rebuilds the escrow state cache from the gateway. Queries run in a fixed
//! order and each result is written to the cache as it returns; a failed
//! query abandons the rest of the pass, leaving the remaining fields at
//! their previous values. Failures are logged and swallowed, never raised
//! to the caller, and nothing is retried.

use std::sync::Arc;

use tracing::warn;

use homestead_gateway::EscrowGateway;
use homestead_types::{EscrowAction, ListingId, Result, Role};

use crate::cache::EscrowStateCache;

pub struct SyncEngine {
    gateway: Arc<dyn EscrowGateway>,
    cache: EscrowStateCache,
    listing: ListingId,
}

impl SyncEngine {
    pub fn new(gateway: Arc<dyn EscrowGateway>, cache: EscrowStateCache, listing: ListingId) -> Self {
        Self {
            gateway,
            cache,
            listing,
        }
    }

    /// Refresh role holders and approval flags.
    pub async fn refresh_details(&self) {
        if let Err(e) = self.try_refresh_details().await {
            warn!("Detail refresh for listing {} abandoned: {}", self.listing, e);
        }
    }

    async fn try_refresh_details(&self) -> Result<()> {
        let buyer = self.gateway.buyer(self.listing).await?;
        self.cache.set_role(Role::Buyer, buyer.clone()).await;
        let has_bought = self.gateway.approval(self.listing, &buyer).await?;
        self.cache.set_flag(EscrowAction::Buy, has_bought).await;

        let seller = self.gateway.seller().await?;
        self.cache.set_role(Role::Seller, seller.clone()).await;
        let has_sold = self.gateway.approval(self.listing, &seller).await?;
        self.cache.set_flag(EscrowAction::Sell, has_sold).await;

        let lender = self.gateway.lender().await?;
        self.cache.set_role(Role::Lender, lender.clone()).await;
        let has_lended = self.gateway.approval(self.listing, &lender).await?;
        self.cache.set_flag(EscrowAction::Lend, has_lended).await;

        let inspector = self.gateway.inspector().await?;
        self.cache.set_role(Role::Inspector, inspector).await;
        let has_inspected = self.gateway.inspection_passed(self.listing).await?;
        self.cache.set_flag(EscrowAction::Inspect, has_inspected).await;

        Ok(())
    }

    /// Refresh the ownership status.
    ///
    /// Ownership is only meaningful after the listed-status check: querying
    /// the buyer of a still-listed entry does not signify a transfer.
    pub async fn refresh_ownership(&self) {
        if let Err(e) = self.try_refresh_ownership().await {
            warn!(
                "Ownership refresh for listing {} abandoned: {}",
                self.listing, e
            );
        }
    }

    async fn try_refresh_ownership(&self) -> Result<()> {
        if self.gateway.is_listed(self.listing).await? {
            self.cache.set_owner(None).await;
            return Ok(());
        }
        let owner = self.gateway.buyer(self.listing).await?;
        self.cache.set_owner(Some(owner)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_gateway::{GatewayOp, InMemoryEscrow};
    use homestead_types::{Address, Amount};

    fn addr(byte: u8) -> Address {
        Address::from_bytes(&[byte; 20])
    }

    async fn deployment() -> (InMemoryEscrow, SyncEngine, EscrowStateCache, ListingId) {
        let gateway = InMemoryEscrow::new(addr(2), addr(3), addr(4));
        let listing = ListingId(1);
        gateway
            .list(listing, addr(1), Amount::new(110), Amount::new(10))
            .await;
        let cache = EscrowStateCache::new();
        let engine = SyncEngine::new(Arc::new(gateway.clone()), cache.clone(), listing);
        (gateway, engine, cache, listing)
    }

    #[tokio::test]
    async fn details_mirror_gateway_responses() {
        let (gateway, engine, cache, listing) = deployment().await;

        gateway
            .approve_sale(listing, &addr(1))
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        gateway
            .update_inspection_status(listing, &addr(4), true)
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();

        engine.refresh_details().await;

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.buyer, Some(addr(1)));
        assert_eq!(snapshot.seller, Some(addr(2)));
        assert_eq!(snapshot.lender, Some(addr(3)));
        assert_eq!(snapshot.inspector, Some(addr(4)));
        assert!(snapshot.has_bought);
        assert!(!snapshot.has_sold);
        assert!(!snapshot.has_lended);
        assert!(snapshot.has_inspected);
    }

    #[tokio::test]
    async fn failed_query_leaves_earlier_fields_and_abandons_the_rest() {
        let (gateway, engine, cache, listing) = deployment().await;

        // Seed the cache with a full successful pass where everything is set
        gateway
            .approve_sale(listing, &addr(1))
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        engine.refresh_details().await;
        assert!(cache.snapshot().await.has_bought);

        // Approve as seller, then fail the seller-approval query on the next
        // pass (the second approval read): has_bought, fetched before the
        // failure, refreshes; has_sold and everything after stay unrefreshed
        gateway
            .approve_sale(listing, &addr(2))
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        gateway.fail_nth_read(GatewayOp::Approval, 1).await;
        engine.refresh_details().await;

        let snapshot = cache.snapshot().await;
        assert!(snapshot.has_bought);
        assert!(!snapshot.has_sold);
        assert!(!snapshot.has_lended);
        assert!(!snapshot.has_inspected);
    }

    #[tokio::test]
    async fn ownership_is_unset_while_listed() {
        let (_, engine, cache, _) = deployment().await;

        // Pretend a stale owner survived from an earlier view of the cache
        cache.set_owner(Some(addr(9))).await;
        engine.refresh_ownership().await;
        assert_eq!(cache.snapshot().await.owner, None);
    }

    #[tokio::test]
    async fn ownership_resolves_to_buyer_after_transfer() {
        let (gateway, engine, cache, listing) = deployment().await;

        // Drive the listing all the way to a finalized sale
        gateway
            .update_inspection_status(listing, &addr(4), true)
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        for party in [addr(1), addr(2), addr(3)] {
            gateway
                .approve_sale(listing, &party)
                .await
                .unwrap()
                .confirmed()
                .await
                .unwrap();
        }
        gateway
            .deposit_earnest(listing, &addr(1), Amount::new(10))
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        gateway
            .transfer(&addr(3), &gateway.contract_address(), Amount::new(100), 100_000)
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        gateway
            .finalize_sale(listing, &addr(2))
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();

        engine.refresh_ownership().await;
        assert_eq!(cache.snapshot().await.owner, Some(addr(1)));
    }

    #[tokio::test]
    async fn ownership_failure_keeps_previous_value() {
        let (gateway, engine, cache, _) = deployment().await;

        cache.set_owner(Some(addr(9))).await;
        gateway.fail_next_read(GatewayOp::IsListed).await;
        engine.refresh_ownership().await;

        // The failed pass leaves ownership untouched
        assert_eq!(cache.snapshot().await.owner, Some(addr(9)));
    }
}
