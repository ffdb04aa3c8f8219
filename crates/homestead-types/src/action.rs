//! Role and action kinds for the escrow lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four parties to a listing's escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Buyer,
    Seller,
    Lender,
    Inspector,
}

impl Role {
    /// The action a holder of this role performs
    pub fn action(self) -> EscrowAction {
        match self {
            Role::Buyer => EscrowAction::Buy,
            Role::Seller => EscrowAction::Sell,
            Role::Lender => EscrowAction::Lend,
            Role::Inspector => EscrowAction::Inspect,
        }
    }
}

/// The four orchestrated action kinds
///
/// Exhaustive by construction: the role resolver always yields exactly one
/// of these for any session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowAction {
    Buy,
    Inspect,
    Lend,
    Sell,
}

impl EscrowAction {
    pub const ALL: [EscrowAction; 4] = [
        EscrowAction::Buy,
        EscrowAction::Inspect,
        EscrowAction::Lend,
        EscrowAction::Sell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowAction::Buy => "buy",
            EscrowAction::Inspect => "inspect",
            EscrowAction::Lend => "lend",
            EscrowAction::Sell => "sell",
        }
    }
}

impl fmt::Display for EscrowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
