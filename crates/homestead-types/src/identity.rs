//! Identity types for Homestead
//!
//! Identities on the ledger are opaque account addresses. Listing and
//! transaction ids are strongly typed wrappers so the different key spaces
//! cannot be mixed accidentally.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{EscrowError, Result};

/// A 20-byte ledger account address, hex-encoded with 0x prefix.
///
/// Stored lowercase so comparing two addresses is comparing identity. Role
/// holders, session identities, and listing owners are all `Address` values;
/// the client never interprets the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Parse from a hex string, with or without the 0x prefix.
    pub fn parse(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| EscrowError::InvalidAddress {
            input: s.to_string(),
        })?;
        if bytes.len() != 20 {
            return Err(EscrowError::InvalidAddress {
                input: s.to_string(),
            });
        }
        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    /// Build from raw address bytes.
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one escrow listing (the property token id on the ledger).
///
/// Owned by the caller of this crate and immutable for a controller's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub u64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a submitted ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub Uuid);

impl TxId {
    /// Create a new random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}
