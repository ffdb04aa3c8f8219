//! Role resolver
//!
//! Maps the active session identity to the single action it may perform, as
//! a single-pass precedence table: inspector wins over lender, lender over
//! seller, and buy is the fallback for every other identity, formal role or
//! not. Pure and synchronous; no ledger calls happen here, which is also
//! where mis-roled invocations are stopped before they reach the gateway.

use serde::{Deserialize, Serialize};

use homestead_types::{Address, EscrowAction, Role};

use crate::cache::{BusyFlags, ListingSnapshot};

/// Precedence order of the formal roles; first match wins
const PRECEDENCE: [Role; 4] = [Role::Inspector, Role::Lender, Role::Seller, Role::Buyer];

/// The formal role `identity` holds in `snapshot`, if any, honoring
/// precedence when one identity holds several roles.
pub fn role_of(identity: &Address, snapshot: &ListingSnapshot) -> Option<Role> {
    PRECEDENCE
        .into_iter()
        .find(|role| snapshot.role_holder(*role) == Some(identity))
}

/// Resolve the one action `identity` is eligible for. Total: identities
/// without a formal role fall back to `Buy`.
pub fn resolve_action(identity: &Address, snapshot: &ListingSnapshot) -> EscrowAction {
    role_of(identity, snapshot)
        .map(Role::action)
        .unwrap_or(EscrowAction::Buy)
}

/// Display/enablement state of the resolved action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatus {
    pub action: EscrowAction,
    /// Already completed; presented as done, not re-invokable
    pub completed: bool,
    /// Transaction sequence currently in flight
    pub busy: bool,
}

impl ActionStatus {
    pub fn invokable(&self) -> bool {
        !self.completed && !self.busy
    }
}

/// The action available to `identity`, gated for enablement.
///
/// `None` once the listing has transferred: a sold listing exposes no
/// action to anyone.
pub fn available_action(
    identity: &Address,
    snapshot: &ListingSnapshot,
    busy: &BusyFlags,
) -> Option<ActionStatus> {
    if snapshot.owner.is_some() {
        return None;
    }
    let action = resolve_action(identity, snapshot);
    Some(ActionStatus {
        action,
        completed: snapshot.flag(action),
        busy: busy.get(action),
    })
}
