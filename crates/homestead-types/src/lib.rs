//! Homestead Types - Canonical domain types for on-ledger real-estate escrow
//!
//! This crate contains the foundational types for Homestead with zero
//! dependencies on other homestead crates:
//!
//! - Identity types (Address, ListingId, TxId)
//! - Ledger-native amounts with checked integer arithmetic
//! - Role and action kinds for the escrow lifecycle
//! - The error taxonomy shared by every layer
//!
//! # Architectural Invariants
//!
//! 1. The ledger contract is the only source of truth; local state is a cache
//! 2. Approval flags are set strictly from gateway responses, never inferred
//! 3. Amount arithmetic is checked; underflow and overflow are explicit errors
//! 4. No error in the client is fatal; failures are contained where they occur

pub mod action;
pub mod amount;
pub mod error;
pub mod identity;

pub use action::*;
pub use amount::*;
pub use error::*;
pub use identity::*;
