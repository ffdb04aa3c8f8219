//! Ledger-native amounts
//!
//! Amounts are unsigned integers in the ledger's smallest unit. Everything
//! that feeds a transaction value is computed with checked integer
//! arithmetic; underflow and overflow are explicit errors, never wraps, and
//! no floating point is involved.

use crate::{EscrowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places of the ledger's native asset
pub const NATIVE_DECIMALS: u8 = 18;

/// A value in the ledger's smallest unit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from smallest units
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    /// Create an amount from a whole number of native tokens
    pub fn from_whole(tokens: u64) -> Self {
        Self(tokens as u128 * 10u128.pow(NATIVE_DECIMALS as u32))
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(EscrowError::AmountOverflow)
    }

    /// Checked subtraction; underflow is an error, not a wrap
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(EscrowError::AmountUnderflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_and_sub() {
        let a = Amount::new(110);
        let b = Amount::new(10);

        assert_eq!(a.checked_add(b).unwrap(), Amount::new(120));
        assert_eq!(a.checked_sub(b).unwrap(), Amount::new(100));
    }

    #[test]
    fn sub_underflow_is_an_error() {
        let result = Amount::new(10).checked_sub(Amount::new(110));
        assert!(matches!(result, Err(EscrowError::AmountUnderflow)));
    }

    #[test]
    fn add_overflow_is_an_error() {
        let result = Amount::new(u128::MAX).checked_add(Amount::new(1));
        assert!(matches!(result, Err(EscrowError::AmountOverflow)));
    }

    #[test]
    fn from_whole_scales_by_native_decimals() {
        assert_eq!(Amount::from_whole(1).value(), 10u128.pow(18));
        assert_eq!(Amount::from_whole(0), Amount::ZERO);
    }

    #[test]
    fn lend_amount_is_exact_for_all_valid_pairs() {
        // price >= escrow is enforced upstream; the difference must be exact
        for (price, escrow) in [(110u128, 10u128), (1, 0), (0, 0), (u128::MAX, 1)] {
            let diff = Amount::new(price).checked_sub(Amount::new(escrow)).unwrap();
            assert_eq!(diff.value(), price - escrow);
        }
    }
}
