//! Deterministic in-memory escrow gateway
//!
//! Holds one deployment's fixed roles and any number of listings. Used by
//! tests and by consumers that need a predictable ledger. Enforces the
//! contract's externally visible preconditions (buyer-only deposit with the
//! exact earnest value, inspector-only inspection updates, finalize gated on
//! inspection, approvals, and funding).
//!
//! Fault injection makes the client's failure policies observable: a read
//! fault rejects the next matching query, a write fault rejects the next
//! matching submission, and a confirm fault lets the submission through but
//! fails the returned handle, leaving ledger state advanced without an
//! observed confirmation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use homestead_types::{Address, Amount, EscrowError, ListingId, Result, TxId};

use crate::{EscrowGateway, PendingTx, TxRecord};

/// Deployment address of the in-memory contract
const CONTRACT_ADDRESS_BYTES: [u8; 20] = [0xec; 20];

/// Gateway operations, for targeting fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Buyer,
    Seller,
    Lender,
    Inspector,
    Approval,
    InspectionPassed,
    IsListed,
    EscrowAmount,
    PurchasePrice,
    DepositEarnest,
    ApproveSale,
    UpdateInspectionStatus,
    FinalizeSale,
    Transfer,
}

impl GatewayOp {
    fn name(&self) -> &'static str {
        match self {
            GatewayOp::Buyer => "buyer",
            GatewayOp::Seller => "seller",
            GatewayOp::Lender => "lender",
            GatewayOp::Inspector => "inspector",
            GatewayOp::Approval => "approval",
            GatewayOp::InspectionPassed => "inspectionPassed",
            GatewayOp::IsListed => "isListed",
            GatewayOp::EscrowAmount => "escrowAmount",
            GatewayOp::PurchasePrice => "purchasePrice",
            GatewayOp::DepositEarnest => "depositEarnest",
            GatewayOp::ApproveSale => "approveSale",
            GatewayOp::UpdateInspectionStatus => "updateInspectionStatus",
            GatewayOp::FinalizeSale => "finalizeSale",
            GatewayOp::Transfer => "transfer",
        }
    }
}

/// A raw value transfer received by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: Address,
    pub value: Amount,
    pub gas_limit: u64,
}

#[derive(Debug, Clone)]
struct ListingState {
    buyer: Address,
    purchase_price: Amount,
    escrow_amount: Amount,
    listed: bool,
    inspection_passed: bool,
    approvals: HashSet<Address>,
}

/// In-memory implementation of [`EscrowGateway`]
#[derive(Clone)]
pub struct InMemoryEscrow {
    contract: Address,
    seller: Address,
    lender: Address,
    inspector: Address,
    listings: Arc<RwLock<HashMap<ListingId, ListingState>>>,
    contract_balance: Arc<RwLock<Amount>>,
    transfers: Arc<RwLock<Vec<TransferRecord>>>,
    read_faults: Arc<RwLock<HashMap<GatewayOp, u32>>>,
    write_faults: Arc<RwLock<HashSet<GatewayOp>>>,
    confirm_faults: Arc<RwLock<HashSet<GatewayOp>>>,
}

impl InMemoryEscrow {
    /// Create a deployment with the three fixed role holders.
    pub fn new(seller: Address, lender: Address, inspector: Address) -> Self {
        Self {
            contract: Address::from_bytes(&CONTRACT_ADDRESS_BYTES),
            seller,
            lender,
            inspector,
            listings: Arc::new(RwLock::new(HashMap::new())),
            contract_balance: Arc::new(RwLock::new(Amount::ZERO)),
            transfers: Arc::new(RwLock::new(Vec::new())),
            read_faults: Arc::new(RwLock::new(HashMap::new())),
            write_faults: Arc::new(RwLock::new(HashSet::new())),
            confirm_faults: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Put a listing under escrow with its designated buyer and prices.
    pub async fn list(
        &self,
        listing: ListingId,
        buyer: Address,
        purchase_price: Amount,
        escrow_amount: Amount,
    ) {
        self.listings.write().await.insert(
            listing,
            ListingState {
                buyer,
                purchase_price,
                escrow_amount,
                listed: true,
                inspection_passed: false,
                approvals: HashSet::new(),
            },
        );
    }

    /// Reject the next read of `op`.
    pub async fn fail_next_read(&self, op: GatewayOp) {
        self.fail_nth_read(op, 0).await;
    }

    /// Let `skip` reads of `op` through, then reject the one after.
    pub async fn fail_nth_read(&self, op: GatewayOp, skip: u32) {
        self.read_faults.write().await.insert(op, skip);
    }

    /// Reject the next submission of `op`.
    pub async fn fail_next_write(&self, op: GatewayOp) {
        self.write_faults.write().await.insert(op);
    }

    /// Let the next submission of `op` through but fail its confirmation.
    pub async fn fail_next_confirm(&self, op: GatewayOp) {
        self.confirm_faults.write().await.insert(op);
    }

    /// Total value held by the contract account.
    pub async fn contract_balance(&self) -> Amount {
        *self.contract_balance.read().await
    }

    /// Raw transfers the contract has received.
    pub async fn transfers(&self) -> Vec<TransferRecord> {
        self.transfers.read().await.clone()
    }

    async fn check_read(&self, op: GatewayOp) -> Result<()> {
        let mut faults = self.read_faults.write().await;
        match faults.get_mut(&op) {
            Some(0) => {
                faults.remove(&op);
                Err(EscrowError::ReadFailed {
                    operation: op.name().to_string(),
                    reason: "injected fault".to_string(),
                })
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn check_write(&self, op: GatewayOp) -> Result<()> {
        if self.write_faults.write().await.remove(&op) {
            return Err(EscrowError::TxRejected {
                operation: op.name().to_string(),
                reason: "injected fault".to_string(),
            });
        }
        Ok(())
    }

    async fn handle_for(&self, op: GatewayOp) -> Box<dyn PendingTx> {
        let outcome = if self.confirm_faults.write().await.remove(&op) {
            Err(EscrowError::ConfirmationFailed {
                operation: op.name().to_string(),
                reason: "injected fault".to_string(),
            })
        } else {
            Ok(TxRecord {
                tx_id: TxId::new(),
                confirmed_at: Utc::now(),
            })
        };
        Box::new(MemoryTx {
            operation: op.name(),
            outcome,
        })
    }

    async fn listing_state(&self, listing: ListingId) -> Result<ListingState> {
        self.listings
            .read()
            .await
            .get(&listing)
            .cloned()
            .ok_or(EscrowError::UnknownListing { listing })
    }
}

struct MemoryTx {
    operation: &'static str,
    outcome: Result<TxRecord>,
}

#[async_trait]
impl PendingTx for MemoryTx {
    async fn confirmed(self: Box<Self>) -> Result<TxRecord> {
        if let Ok(ref record) = self.outcome {
            info!("Transaction {} confirmed: {}", self.operation, record.tx_id);
        }
        self.outcome
    }
}

#[async_trait]
impl EscrowGateway for InMemoryEscrow {
    async fn buyer(&self, listing: ListingId) -> Result<Address> {
        self.check_read(GatewayOp::Buyer).await?;
        Ok(self.listing_state(listing).await?.buyer)
    }

    async fn seller(&self) -> Result<Address> {
        self.check_read(GatewayOp::Seller).await?;
        Ok(self.seller.clone())
    }

    async fn lender(&self) -> Result<Address> {
        self.check_read(GatewayOp::Lender).await?;
        Ok(self.lender.clone())
    }

    async fn inspector(&self) -> Result<Address> {
        self.check_read(GatewayOp::Inspector).await?;
        Ok(self.inspector.clone())
    }

    async fn approval(&self, listing: ListingId, identity: &Address) -> Result<bool> {
        self.check_read(GatewayOp::Approval).await?;
        Ok(self.listing_state(listing).await?.approvals.contains(identity))
    }

    async fn inspection_passed(&self, listing: ListingId) -> Result<bool> {
        self.check_read(GatewayOp::InspectionPassed).await?;
        Ok(self.listing_state(listing).await?.inspection_passed)
    }

    async fn is_listed(&self, listing: ListingId) -> Result<bool> {
        self.check_read(GatewayOp::IsListed).await?;
        Ok(self.listing_state(listing).await?.listed)
    }

    async fn escrow_amount(&self, listing: ListingId) -> Result<Amount> {
        self.check_read(GatewayOp::EscrowAmount).await?;
        Ok(self.listing_state(listing).await?.escrow_amount)
    }

    async fn purchase_price(&self, listing: ListingId) -> Result<Amount> {
        self.check_read(GatewayOp::PurchasePrice).await?;
        Ok(self.listing_state(listing).await?.purchase_price)
    }

    async fn deposit_earnest(
        &self,
        listing: ListingId,
        from: &Address,
        value: Amount,
    ) -> Result<Box<dyn PendingTx>> {
        self.check_write(GatewayOp::DepositEarnest).await?;

        let mut listings = self.listings.write().await;
        let state = listings
            .get_mut(&listing)
            .ok_or(EscrowError::UnknownListing { listing })?;

        if from != &state.buyer {
            return Err(EscrowError::TxRejected {
                operation: GatewayOp::DepositEarnest.name().to_string(),
                reason: format!("caller {} is not the buyer", from),
            });
        }
        if value != state.escrow_amount {
            return Err(EscrowError::ValueMismatch {
                attached: value,
                required: state.escrow_amount,
            });
        }

        let mut balance = self.contract_balance.write().await;
        *balance = balance.checked_add(value)?;

        info!("Earnest {} deposited for listing {} by {}", value, listing, from);
        Ok(self.handle_for(GatewayOp::DepositEarnest).await)
    }

    async fn approve_sale(&self, listing: ListingId, from: &Address) -> Result<Box<dyn PendingTx>> {
        self.check_write(GatewayOp::ApproveSale).await?;

        let mut listings = self.listings.write().await;
        let state = listings
            .get_mut(&listing)
            .ok_or(EscrowError::UnknownListing { listing })?;
        state.approvals.insert(from.clone());

        info!("Sale of listing {} approved by {}", listing, from);
        Ok(self.handle_for(GatewayOp::ApproveSale).await)
    }

    async fn update_inspection_status(
        &self,
        listing: ListingId,
        from: &Address,
        passed: bool,
    ) -> Result<Box<dyn PendingTx>> {
        self.check_write(GatewayOp::UpdateInspectionStatus).await?;

        if from != &self.inspector {
            return Err(EscrowError::TxRejected {
                operation: GatewayOp::UpdateInspectionStatus.name().to_string(),
                reason: format!("caller {} is not the inspector", from),
            });
        }

        let mut listings = self.listings.write().await;
        let state = listings
            .get_mut(&listing)
            .ok_or(EscrowError::UnknownListing { listing })?;
        state.inspection_passed = passed;

        info!("Inspection of listing {} set to {}", listing, passed);
        Ok(self.handle_for(GatewayOp::UpdateInspectionStatus).await)
    }

    async fn finalize_sale(&self, listing: ListingId, from: &Address) -> Result<Box<dyn PendingTx>> {
        self.check_write(GatewayOp::FinalizeSale).await?;

        let mut listings = self.listings.write().await;
        let state = listings
            .get_mut(&listing)
            .ok_or(EscrowError::UnknownListing { listing })?;

        let reject = |reason: &str| EscrowError::TxRejected {
            operation: GatewayOp::FinalizeSale.name().to_string(),
            reason: reason.to_string(),
        };

        if !state.listed {
            return Err(reject("listing already transferred"));
        }
        if !state.inspection_passed {
            return Err(reject("inspection has not passed"));
        }
        for party in [&state.buyer, &self.seller, &self.lender] {
            if !state.approvals.contains(party) {
                return Err(reject(&format!("missing approval from {}", party)));
            }
        }

        let mut balance = self.contract_balance.write().await;
        if *balance < state.purchase_price {
            return Err(reject("contract is not fully funded"));
        }
        *balance = balance.checked_sub(state.purchase_price)?;
        state.listed = false;

        info!("Sale of listing {} finalized by {}", listing, from);
        Ok(self.handle_for(GatewayOp::FinalizeSale).await)
    }

    async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        value: Amount,
        gas_limit: u64,
    ) -> Result<Box<dyn PendingTx>> {
        self.check_write(GatewayOp::Transfer).await?;

        if to != &self.contract {
            return Err(EscrowError::TxRejected {
                operation: GatewayOp::Transfer.name().to_string(),
                reason: format!("{} is not the contract address", to),
            });
        }

        let mut balance = self.contract_balance.write().await;
        *balance = balance.checked_add(value)?;
        self.transfers.write().await.push(TransferRecord {
            from: from.clone(),
            value,
            gas_limit,
        });

        info!("Transfer of {} received from {}", value, from);
        Ok(self.handle_for(GatewayOp::Transfer).await)
    }

    fn contract_address(&self) -> Address {
        self.contract.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes(&[byte; 20])
    }

    fn deployment() -> (InMemoryEscrow, Address) {
        let gateway = InMemoryEscrow::new(addr(2), addr(3), addr(4));
        (gateway, addr(1)) // buyer
    }

    async fn listed(gateway: &InMemoryEscrow, buyer: &Address) -> ListingId {
        let listing = ListingId(1);
        gateway
            .list(listing, buyer.clone(), Amount::new(110), Amount::new(10))
            .await;
        listing
    }

    #[tokio::test]
    async fn deposit_requires_exact_escrow_value() {
        let (gateway, buyer) = deployment();
        let listing = listed(&gateway, &buyer).await;

        let short = gateway.deposit_earnest(listing, &buyer, Amount::new(9)).await;
        assert!(matches!(short, Err(EscrowError::ValueMismatch { .. })));

        gateway
            .deposit_earnest(listing, &buyer, Amount::new(10))
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        assert_eq!(gateway.contract_balance().await, Amount::new(10));
    }

    #[tokio::test]
    async fn deposit_is_buyer_only() {
        let (gateway, buyer) = deployment();
        let listing = listed(&gateway, &buyer).await;

        let result = gateway.deposit_earnest(listing, &addr(9), Amount::new(10)).await;
        assert!(matches!(result, Err(EscrowError::TxRejected { .. })));
    }

    #[tokio::test]
    async fn inspection_update_is_inspector_only() {
        let (gateway, buyer) = deployment();
        let listing = listed(&gateway, &buyer).await;

        let result = gateway
            .update_inspection_status(listing, &buyer, true)
            .await;
        assert!(matches!(result, Err(EscrowError::TxRejected { .. })));

        gateway
            .update_inspection_status(listing, &addr(4), true)
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        assert!(gateway.inspection_passed(listing).await.unwrap());
    }

    #[tokio::test]
    async fn finalize_is_gated_on_inspection_approvals_and_funding() {
        let (gateway, buyer) = deployment();
        let listing = listed(&gateway, &buyer).await;
        let seller = addr(2);
        let lender = addr(3);
        let inspector = addr(4);

        let early = gateway.finalize_sale(listing, &seller).await;
        assert!(matches!(early, Err(EscrowError::TxRejected { .. })));

        gateway
            .update_inspection_status(listing, &inspector, true)
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        for party in [&buyer, &seller, &lender] {
            gateway
                .approve_sale(listing, party)
                .await
                .unwrap()
                .confirmed()
                .await
                .unwrap();
        }

        // Approved and inspected but unfunded
        let unfunded = gateway.finalize_sale(listing, &seller).await;
        assert!(matches!(unfunded, Err(EscrowError::TxRejected { .. })));

        gateway
            .deposit_earnest(listing, &buyer, Amount::new(10))
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        gateway
            .transfer(&lender, &gateway.contract_address(), Amount::new(100), 100_000)
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();

        gateway
            .finalize_sale(listing, &seller)
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();
        assert!(!gateway.is_listed(listing).await.unwrap());
        assert_eq!(gateway.contract_balance().await, Amount::ZERO);
    }

    #[tokio::test]
    async fn transfers_record_value_and_gas() {
        let (gateway, _) = deployment();
        let lender = addr(3);

        gateway
            .transfer(&lender, &gateway.contract_address(), Amount::new(100), 100_000)
            .await
            .unwrap()
            .confirmed()
            .await
            .unwrap();

        let transfers = gateway.transfers().await;
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].value, Amount::new(100));
        assert_eq!(transfers[0].gas_limit, 100_000);
    }

    #[tokio::test]
    async fn transfer_to_a_non_contract_address_is_rejected() {
        let (gateway, _) = deployment();

        let result = gateway
            .transfer(&addr(3), &addr(9), Amount::new(100), 100_000)
            .await;
        assert!(matches!(result, Err(EscrowError::TxRejected { .. })));
        assert_eq!(gateway.contract_balance().await, Amount::ZERO);
    }

    #[tokio::test]
    async fn read_fault_rejects_exactly_one_query() {
        let (gateway, _) = deployment();

        gateway.fail_next_read(GatewayOp::Seller).await;
        assert!(gateway.seller().await.is_err());
        assert_eq!(gateway.seller().await.unwrap(), addr(2));
    }

    #[tokio::test]
    async fn nth_read_fault_skips_earlier_matching_queries() {
        let (gateway, buyer) = deployment();
        let listing = listed(&gateway, &buyer).await;

        gateway.fail_nth_read(GatewayOp::Approval, 1).await;
        assert!(gateway.approval(listing, &buyer).await.is_ok());
        assert!(gateway.approval(listing, &addr(2)).await.is_err());
        assert!(gateway.approval(listing, &addr(2)).await.is_ok());
    }

    #[tokio::test]
    async fn confirm_fault_advances_state_but_fails_the_handle() {
        let (gateway, buyer) = deployment();
        let listing = listed(&gateway, &buyer).await;

        gateway.fail_next_confirm(GatewayOp::ApproveSale).await;
        let handle = gateway.approve_sale(listing, &buyer).await.unwrap();
        assert!(handle.confirmed().await.is_err());

        // The approval is durable even though confirmation was not observed
        assert!(gateway.approval(listing, &buyer).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_listing_is_an_error() {
        let (gateway, buyer) = deployment();
        let result = gateway.buyer(ListingId(42)).await;
        assert!(matches!(result, Err(EscrowError::UnknownListing { .. })));
        let write = gateway.approve_sale(ListingId(42), &buyer).await;
        assert!(write.is_err());
    }
}
