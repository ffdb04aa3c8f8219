//! Homestead Escrow - client-side synchronization and action orchestration
//! for on-ledger real-estate sales
//!
//! The escrow contract is the authoritative source of truth; this crate
//! mirrors one listing's lifecycle into a local cache and exposes the
//! role-gated actions that advance it.
//!
//! # Flow
//!
//! ```text
//! SyncEngine ──→ EscrowStateCache ──→ resolver (who may do what)
//!                      ↑                      │
//!                      └── re-sync ←── ActionOrchestrator (buy/inspect/lend/sell)
//! ```
//!
//! # Invariants
//!
//! 1. Every approval flag equals a gateway response; nothing is inferred
//! 2. Ownership is only read after the listed-status check
//! 3. Write sequences are strictly sequential: each step is confirmed
//!    before the next is issued
//! 4. Busy flags are cleared on every exit path, success or failure
//! 5. Failures are logged and contained; retries are always user-triggered

pub mod cache;
pub mod controller;
pub mod orchestrator;
pub mod resolver;
pub mod sync;

pub use cache::{BusyFlags, EscrowStateCache, ListingSnapshot};
pub use controller::ListingController;
pub use orchestrator::{ActionOrchestrator, LEND_TRANSFER_GAS_LIMIT};
pub use resolver::{available_action, resolve_action, role_of, ActionStatus};
pub use sync::SyncEngine;
