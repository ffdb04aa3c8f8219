//! Homestead Gateway - the ledger contract boundary
//!
//! The escrow contract is the authoritative source of truth for a listing's
//! lifecycle. Everything the client holds is a cache of gateway responses,
//! and every state advance is a transaction submitted through this surface.
//!
//! Write operations return a [`PendingTx`]: an awaitable handle whose
//! `confirmed` suspends until the write is durable on the ledger. The
//! contract's correctness depends on prior state changes being durable
//! before the next call, so callers confirm each step before issuing the
//! next one.

pub mod memory;

pub use memory::{GatewayOp, InMemoryEscrow, TransferRecord};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use homestead_types::{Address, Amount, ListingId, Result, TxId};

/// Record of a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub tx_id: TxId,
    pub confirmed_at: DateTime<Utc>,
}

/// Awaitable handle to a submitted write
#[async_trait]
pub trait PendingTx: Send {
    /// Suspend until the write is durable on the ledger.
    async fn confirmed(self: Box<Self>) -> Result<TxRecord>;
}

/// The escrow contract surface consumed by the client.
///
/// Read operations report current authoritative state; write operations are
/// submitted as the acting identity `from` (the session's address) and are
/// validated ledger-side, not here.
#[async_trait]
pub trait EscrowGateway: Send + Sync {
    /// Current buyer role holder for a listing.
    async fn buyer(&self, listing: ListingId) -> Result<Address>;

    /// Fixed seller role holder for the deployment.
    async fn seller(&self) -> Result<Address>;

    /// Fixed lender role holder for the deployment.
    async fn lender(&self) -> Result<Address>;

    /// Fixed inspector role holder for the deployment.
    async fn inspector(&self) -> Result<Address>;

    /// Whether `identity` has approved the sale of `listing`.
    async fn approval(&self, listing: ListingId, identity: &Address) -> Result<bool>;

    /// Whether the listing's inspection has passed.
    async fn inspection_passed(&self, listing: ListingId) -> Result<bool>;

    /// Whether the listing is still listed (not yet transferred).
    async fn is_listed(&self, listing: ListingId) -> Result<bool>;

    /// Earnest amount the buyer must deposit.
    async fn escrow_amount(&self, listing: ListingId) -> Result<Amount>;

    /// Full purchase price of the listing.
    async fn purchase_price(&self, listing: ListingId) -> Result<Amount>;

    /// Deposit earnest money; requires attached value equal to the escrow
    /// amount, buyer-only by ledger-side enforcement.
    async fn deposit_earnest(
        &self,
        listing: ListingId,
        from: &Address,
        value: Amount,
    ) -> Result<Box<dyn PendingTx>>;

    /// Record the caller's approval of the sale.
    async fn approve_sale(&self, listing: ListingId, from: &Address) -> Result<Box<dyn PendingTx>>;

    /// Set the inspection status; inspector-only by ledger-side enforcement.
    async fn update_inspection_status(
        &self,
        listing: ListingId,
        from: &Address,
        passed: bool,
    ) -> Result<Box<dyn PendingTx>>;

    /// Complete the transfer once all approvals and funds are present.
    async fn finalize_sale(&self, listing: ListingId, from: &Address) -> Result<Box<dyn PendingTx>>;

    /// Raw value transfer with a gas allowance; the escrow flows only ever
    /// target the contract's own address.
    async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        value: Amount,
        gas_limit: u64,
    ) -> Result<Box<dyn PendingTx>>;

    /// The contract's own account address.
    fn contract_address(&self) -> Address;
}
