//! The canonical identity of a message is the Keccak256 hash of the Keccak256 hash of its body.
//!
//! The primitive is Keccak256 as used by Ethereum, not the standardized SHA3-256; swapping one for
//! the other silently breaks interoperability with every producer and consumer outside this
//! crate. The second round must never be dropped.

use sha3::{Digest as Sha3Digest, Keccak256};

/// Digest data for a message body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    /// Guardians don't sign the body directly, they hash it and sign the hash. This is the first
    /// round.
    pub hash: [u8; 32],

    /// The hash of `hash`. secp256k1 signing hashes its payload once more internally, so this is
    /// the value signatures are recovered against and the value every cache entry is keyed by.
    pub secp256k_hash: [u8; 32],
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut h = Keccak256::new();
    h.update(data);
    h.finalize().into()
}

/// Calculates the digest for `body`.
pub fn digest(body: &[u8]) -> Digest {
    let hash = keccak256(body);
    Digest {
        hash,
        secp256k_hash: keccak256(&hash),
    }
}

/// `H(H(body))`, the identity hash of a message.
#[inline]
pub fn double_keccak(body: &[u8]) -> [u8; 32] {
    digest(body).secp256k_hash
}
