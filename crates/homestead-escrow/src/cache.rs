//! Escrow state cache
//!
//! One listing's lifecycle state, rebuilt from the gateway on demand. Every
//! field is overwritten individually under its own short lock acquisition,
//! so a refresh that fails partway degrades to a partial or stale cache
//! instead of tearing the whole snapshot, and readers always observe
//! fully-formed field values.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use homestead_types::{Address, EscrowAction, Role};

/// Readable view of the cached lifecycle state at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    /// Role holders, refreshed wholesale on every sync
    pub buyer: Option<Address>,
    pub seller: Option<Address>,
    pub lender: Option<Address>,
    pub inspector: Option<Address>,
    /// Approval flags, each mirroring one gateway response
    pub has_bought: bool,
    pub has_sold: bool,
    pub has_lended: bool,
    pub has_inspected: bool,
    /// Set once the listing has transferred; `None` while still listed
    pub owner: Option<Address>,
}

impl ListingSnapshot {
    /// The completion flag tracking `action`.
    pub fn flag(&self, action: EscrowAction) -> bool {
        match action {
            EscrowAction::Buy => self.has_bought,
            EscrowAction::Inspect => self.has_inspected,
            EscrowAction::Lend => self.has_lended,
            EscrowAction::Sell => self.has_sold,
        }
    }

    /// All four completion flags, for change detection across an action.
    pub fn flags(&self) -> [bool; 4] {
        [
            self.has_bought,
            self.has_inspected,
            self.has_lended,
            self.has_sold,
        ]
    }

    /// The holder of `role`, if the cache has resolved it.
    pub fn role_holder(&self, role: Role) -> Option<&Address> {
        match role {
            Role::Buyer => self.buyer.as_ref(),
            Role::Seller => self.seller.as_ref(),
            Role::Lender => self.lender.as_ref(),
            Role::Inspector => self.inspector.as_ref(),
        }
    }
}

/// Per-action in-flight markers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyFlags {
    buy: bool,
    inspect: bool,
    lend: bool,
    sell: bool,
}

impl BusyFlags {
    pub fn get(&self, action: EscrowAction) -> bool {
        match action {
            EscrowAction::Buy => self.buy,
            EscrowAction::Inspect => self.inspect,
            EscrowAction::Lend => self.lend,
            EscrowAction::Sell => self.sell,
        }
    }

    fn set(&mut self, action: EscrowAction, value: bool) {
        match action {
            EscrowAction::Buy => self.buy = value,
            EscrowAction::Inspect => self.inspect = value,
            EscrowAction::Lend => self.lend = value,
            EscrowAction::Sell => self.sell = value,
        }
    }
}

/// Shared cache of one listing's state.
///
/// Lifecycle fields are written only by the sync engine and the
/// orchestrator's completion path; busy flags only by the orchestrator.
#[derive(Clone, Default)]
pub struct EscrowStateCache {
    state: Arc<RwLock<ListingSnapshot>>,
    busy: Arc<RwLock<BusyFlags>>,
}

impl EscrowStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> ListingSnapshot {
        self.state.read().await.clone()
    }

    pub async fn busy_flags(&self) -> BusyFlags {
        *self.busy.read().await
    }

    pub(crate) async fn set_role(&self, role: Role, holder: Address) {
        let mut state = self.state.write().await;
        match role {
            Role::Buyer => state.buyer = Some(holder),
            Role::Seller => state.seller = Some(holder),
            Role::Lender => state.lender = Some(holder),
            Role::Inspector => state.inspector = Some(holder),
        }
    }

    pub(crate) async fn set_flag(&self, action: EscrowAction, value: bool) {
        let mut state = self.state.write().await;
        match action {
            EscrowAction::Buy => state.has_bought = value,
            EscrowAction::Inspect => state.has_inspected = value,
            EscrowAction::Lend => state.has_lended = value,
            EscrowAction::Sell => state.has_sold = value,
        }
    }

    pub(crate) async fn set_owner(&self, owner: Option<Address>) {
        self.state.write().await.owner = owner;
    }

    pub(crate) async fn set_busy(&self, action: EscrowAction, value: bool) {
        self.busy.write().await.set(action, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes(&[byte; 20])
    }

    #[tokio::test]
    async fn fields_are_independently_settable() {
        let cache = EscrowStateCache::new();

        cache.set_role(Role::Buyer, addr(1)).await;
        cache.set_flag(EscrowAction::Buy, true).await;

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.buyer, Some(addr(1)));
        assert!(snapshot.has_bought);
        // Untouched fields keep their previous values
        assert_eq!(snapshot.seller, None);
        assert!(!snapshot.has_sold);
    }

    #[tokio::test]
    async fn busy_flags_are_independent_per_action() {
        let cache = EscrowStateCache::new();

        cache.set_busy(EscrowAction::Lend, true).await;
        let busy = cache.busy_flags().await;
        assert!(busy.get(EscrowAction::Lend));
        for action in [EscrowAction::Buy, EscrowAction::Inspect, EscrowAction::Sell] {
            assert!(!busy.get(action));
        }

        cache.set_busy(EscrowAction::Lend, false).await;
        assert!(!cache.busy_flags().await.get(EscrowAction::Lend));
    }

    #[tokio::test]
    async fn snapshot_serde_roundtrip() {
        let cache = EscrowStateCache::new();
        cache.set_role(Role::Inspector, addr(4)).await;
        cache.set_flag(EscrowAction::Inspect, true).await;
        cache.set_owner(Some(addr(1))).await;

        let snapshot = cache.snapshot().await;
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ListingSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }
}
