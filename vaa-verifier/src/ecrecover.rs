//! secp256k1 signer recovery with Ethereum `ecrecover` semantics.
//!
//! Curve arithmetic comes from `k256`. The recovery value follows the Ethereum convention of
//! `v = 27 + recovery_id`.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::{digest::keccak256, GuardianAddress};

/// Offset added to the raw wire recovery byte before it is handed to recovery.
pub const RECOVERY_OFFSET: u8 = 27;

impl From<&VerifyingKey> for GuardianAddress {
    fn from(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);

        // Skip the 0x04 uncompressed tag.
        let hash = keccak256(&point.as_bytes()[1..]);

        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash[12..]);
        GuardianAddress(addr)
    }
}

/// Recover the address that produced `(r, s, v)` over the 32-byte prehash `hash`.
///
/// Returns `None` wherever `ecrecover` would return the zero address: `v` outside `{27, 28}`,
/// `r` or `s` out of range, or no point recoverable.
pub fn recover_address(hash: &[u8; 32], r: &[u8; 32], s: &[u8; 32], v: u8) -> Option<GuardianAddress> {
    let id = v
        .checked_sub(RECOVERY_OFFSET)
        .filter(|id| *id < 2)
        .and_then(RecoveryId::from_byte)?;

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(r);
    rs[32..].copy_from_slice(s);
    let sig = Signature::from_slice(&rs).ok()?;

    VerifyingKey::recover_from_prehash(hash, &sig, id)
        .ok()
        .map(|key| GuardianAddress::from(&key))
}

#[cfg(test)]
mod test {
    use k256::ecdsa::SigningKey;

    use super::*;
    use crate::digest::double_keccak;

    fn key() -> SigningKey {
        SigningKey::from_slice(&[
            93, 217, 189, 224, 168, 81, 157, 93, 238, 38, 143, 8, 182, 94, 69, 77, 232, 199, 238,
            206, 15, 135, 221, 58, 43, 74, 0, 129, 54, 198, 62, 226,
        ])
        .unwrap()
    }

    fn sign(key: &SigningKey, hash: &[u8; 32]) -> ([u8; 32], [u8; 32], u8) {
        let (sig, id) = key.sign_prehash_recoverable(hash).unwrap();
        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        (r, s, id.to_byte() + RECOVERY_OFFSET)
    }

    #[test]
    fn recovers_signer() {
        let k = key();
        let hash = double_keccak(b"hello");
        let (r, s, v) = sign(&k, &hash);

        let expected = GuardianAddress::from(k.verifying_key());
        assert_eq!(Some(expected), recover_address(&hash, &r, &s, v));
    }

    #[test]
    fn wrong_hash_recovers_other_address() {
        let k = key();
        let hash = double_keccak(b"hello");
        let (r, s, v) = sign(&k, &hash);

        let other = double_keccak(b"goodbye");
        assert_ne!(
            Some(GuardianAddress::from(k.verifying_key())),
            recover_address(&other, &r, &s, v)
        );
    }

    #[test]
    fn raw_recovery_byte_is_rejected() {
        let k = key();
        let hash = double_keccak(b"hello");
        let (r, s, v) = sign(&k, &hash);

        assert_eq!(None, recover_address(&hash, &r, &s, v - RECOVERY_OFFSET));
        assert_eq!(None, recover_address(&hash, &r, &s, 29));
    }

    #[test]
    fn zero_signature_recovers_nothing() {
        let hash = double_keccak(b"hello");
        assert_eq!(None, recover_address(&hash, &[0; 32], &[0; 32], 27));
    }
}
