//! Homestead Session — custodial signing identity for escrow actions.
//!
//! The session keyring holds a secp256k1 keypair and derives the ledger
//! address the rest of the client treats as the Active Session Identity
//! (keccak-256 of the uncompressed public key tail). The keyring never
//! exports raw private key bytes; callers receive the derived address and
//! hex-encoded signatures only.

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint as _;
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};
use thiserror::Error;

use homestead_types::{Address, Amount};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("seed does not encode a valid secp256k1 key")]
    InvalidSeed,
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

// ── Keyring ───────────────────────────────────────────────────────────────────

/// Custodial secp256k1 keyring backing one signing session.
///
/// Keys derived from a seed are deterministic so test and demo identities
/// are stable across runs. Production sessions should use `generate`.
pub struct SessionKeyring {
    /// ECDSA signing key (never exported)
    sk: SigningKey,
    /// Cached ledger address
    address: Address,
    /// Human-readable label
    pub label: String,
}

impl SessionKeyring {
    /// Create a keyring with a fresh random key.
    pub fn generate(label: impl Into<String>) -> Self {
        let sk = SigningKey::random(&mut OsRng);
        let address = derive_address(&sk);
        SessionKeyring {
            sk,
            address,
            label: label.into(),
        }
    }

    /// Create a keyring from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32], label: impl Into<String>) -> Result<Self, SessionError> {
        let sk = SigningKey::from_bytes(seed.into()).map_err(|_| SessionError::InvalidSeed)?;
        let address = derive_address(&sk);
        Ok(SessionKeyring {
            sk,
            address,
            label: label.into(),
        })
    }

    /// Deterministic keyring for a named party (test and demo identities).
    pub fn for_party(name: &str) -> Result<Self, SessionError> {
        let seed: [u8; 32] = Keccak256::digest(name.as_bytes()).into();
        Self::from_seed(&seed, name)
    }

    /// The ledger address this session signs as.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Sign a raw value transfer to `to` with the given gas allowance.
    /// Returns the hex-encoded signature over the canonical transfer digest.
    pub fn sign_transfer(
        &self,
        to: &Address,
        value: Amount,
        gas_limit: u64,
    ) -> Result<String, SessionError> {
        use k256::ecdsa::signature::DigestSigner;

        let mut message = Vec::new();
        message.extend_from_slice(to.as_str().as_bytes());
        message.extend_from_slice(&value.value().to_be_bytes());
        message.extend_from_slice(&gas_limit.to_be_bytes());

        let digest = Keccak256::new_with_prefix(&message);
        let (sig, _recovery): (k256::ecdsa::Signature, _) = self
            .sk
            .sign_digest_recoverable(digest)
            .map_err(|e| SessionError::SigningFailed(e.to_string()))?;
        Ok(hex::encode(sig.to_bytes()))
    }
}

/// Ledger address of a secp256k1 key: keccak-256 of the uncompressed public
/// key without its prefix byte, last 20 bytes.
fn derive_address(sk: &SigningKey) -> Address {
    let encoded = sk.verifying_key().to_encoded_point(false);
    // encoded.as_bytes()[0] == 0x04 (uncompressed prefix), skip it
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    let mut tail = [0u8; 20];
    tail.copy_from_slice(&hash[12..]);
    Address::from_bytes(&tail)
}
