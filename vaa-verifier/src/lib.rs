//! Verification of Wormhole VAAs on the receiving side.
//!
//! A VAA is an observation signed by a quorum of guardians. This crate turns untrusted wire bytes
//! into typed messages, recomputes their canonical hash, and decides whether a guardian set
//! endorses that hash. It includes:
//!
//! - Parsers for the single (v1), batch (v2) and headless (v3) wire formats.
//! - The Keccak256 double-hash used as the identity of every message.
//! - The guardian quorum rules and secp256k1 signer recovery.
//! - A verified-hash cache that lets repeat verifications skip signature recovery.
//!
//! Guardian set storage and rotation live outside this crate; callers plug them in through
//! [`GuardianSetSource`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod cache;
pub mod config;
mod cursor;
pub mod digest;
pub mod ecrecover;
pub mod error;
pub mod guardian;
pub mod quorum;
pub mod vaa;
pub mod verifier;

pub use cache::{InMemoryHashCache, VerifiedHashCache};
pub use config::VerifierConfig;
pub use digest::{digest, double_keccak, Digest};
pub use error::{Rejection, VaaError};
pub use guardian::{GuardianSet, GuardianSetSource, InMemoryGuardianSets};
pub use quorum::{verify_signatures, QuorumVerifier, Verdict};
pub use vaa::{Header, Message, MessageV1, MessageV2, MessageV3, Observation, Signature};
pub use verifier::{Clock, FixedClock, SystemClock, Verified, Verifier};

/// Guardians sign with secp256k1 keys and are identified by the Ethereum-style address of that
/// key: the last 20 bytes of the Keccak256 hash of the uncompressed public key.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct GuardianAddress(pub [u8; 20]);

impl fmt::Display for GuardianAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Wormhole specifies addresses as 32 bytes. Addresses that are shorter, for example 20 byte
/// Ethereum addresses, are left zero padded to 32.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Address(pub [u8; 32]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn address_display_is_lower_hex() {
        let mut raw = [0u8; 32];
        raw[31] = 0x04;
        raw[0] = 0xab;

        let s = Address(raw).to_string();
        assert_eq!(64, s.len());
        assert!(s.starts_with("ab00"));
        assert!(s.ends_with("0004"));
    }

    #[test]
    fn guardian_address_display() {
        let addr = GuardianAddress([0x11; 20]);
        assert_eq!("11".repeat(20), addr.to_string());
    }
}
