//! Error types for Homestead
//!
//! Failures are contained at the operation boundary that produced them: a
//! failed read degrades the cache to a partial or stale view, a failed write
//! leaves the action's completion flag unset. Nothing here is fatal to the
//! embedding process.

use thiserror::Error;

use crate::{Amount, EscrowAction, ListingId};

/// Result type for Homestead operations
pub type Result<T> = std::result::Result<T, EscrowError>;

/// Homestead error types
#[derive(Debug, Clone, Error)]
pub enum EscrowError {
    // ========================================================================
    // Gateway Errors
    // ========================================================================

    /// A gateway query was rejected or timed out
    #[error("gateway read {operation} failed: {reason}")]
    ReadFailed { operation: String, reason: String },

    /// A transaction was rejected by the ledger
    #[error("transaction {operation} rejected: {reason}")]
    TxRejected { operation: String, reason: String },

    /// A submitted transaction failed to confirm
    #[error("transaction {operation} failed to confirm: {reason}")]
    ConfirmationFailed { operation: String, reason: String },

    /// Listing is not known to the gateway
    #[error("listing {listing} is unknown to the gateway")]
    UnknownListing { listing: ListingId },

    /// Attached value does not match the required escrow amount
    #[error("attached value {attached} does not match required escrow amount {required}")]
    ValueMismatch { attached: Amount, required: Amount },

    // ========================================================================
    // Amount Errors
    // ========================================================================

    /// Amount overflow during arithmetic
    #[error("amount overflow during arithmetic operation")]
    AmountOverflow,

    /// Amount underflow during arithmetic
    #[error("amount underflow during arithmetic operation")]
    AmountUnderflow,

    // ========================================================================
    // Identity Errors
    // ========================================================================

    /// Malformed account address
    #[error("invalid account address: {input}")]
    InvalidAddress { input: String },

    // ========================================================================
    // Action Errors
    // ========================================================================

    /// The listing has transferred; no action is available
    #[error("listing {listing} has transferred, no action available")]
    ListingTransferred { listing: ListingId },

    /// The action's transaction sequence is already in flight
    #[error("action {action} is already in flight")]
    ActionBusy { action: EscrowAction },

    /// The action has already completed for this listing
    #[error("action {action} has already completed")]
    ActionCompleted { action: EscrowAction },
}
