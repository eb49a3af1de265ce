//! Guardian quorum rules.
//!
//! A hash is accepted when it was accepted before, or when a live guardian set produced at least
//! a quorum of signatures over it, listed in strictly ascending guardian order, every one of
//! which recovers to the guardian at its index.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::{
    cache::VerifiedHashCache,
    ecrecover::recover_address,
    error::{Rejection, VaaError},
    guardian::{GuardianSet, GuardianSetSource},
    vaa::Signature,
    GuardianAddress,
};

/// Outcome of a verification. A rejection is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Valid,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// Empty for a valid message, otherwise the rejection reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Verdict::Valid => "",
            Verdict::Rejected(r) => r.reason(),
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Verdict::Valid => None,
            Verdict::Rejected(r) => Some(*r),
        }
    }
}

impl From<Result<(), Rejection>> for Verdict {
    fn from(r: Result<(), Rejection>) -> Self {
        match r {
            Ok(()) => Verdict::Valid,
            Err(e) => Verdict::Rejected(e),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => f.write_str("valid"),
            Verdict::Rejected(r) => write!(f, "rejected: {r}"),
        }
    }
}

/// Checks that guardian indices are strictly ascending and within the guardian set.
pub fn check_signature_order(signatures: &[Signature], num_keys: usize) -> Result<(), Rejection> {
    let mut last: Option<u8> = None;
    for sig in signatures {
        if last.map_or(false, |l| sig.guardian_index <= l) {
            return Err(Rejection::BadSignatureOrder);
        }
        if usize::from(sig.guardian_index) >= num_keys {
            return Err(Rejection::SignatureIndexOutOfRange);
        }
        last = Some(sig.guardian_index);
    }
    Ok(())
}

/// Order check followed by signer recovery for each signature, with no quorum requirement.
///
/// An empty list passes. On its own this is not a trust decision; use [`QuorumVerifier::verify`].
pub fn verify_signatures(
    hash: &[u8; 32],
    signatures: &[Signature],
    keys: &[GuardianAddress],
) -> Result<(), Rejection> {
    check_signature_order(signatures, keys.len())?;

    for sig in signatures {
        let expected = &keys[usize::from(sig.guardian_index)];
        match recover_address(hash, &sig.r, &sig.s, sig.v()) {
            Some(recovered) if recovered == *expected => {}
            recovered => {
                debug!(
                    guardian_index = sig.guardian_index,
                    expected = %expected,
                    recovered = ?recovered.map(|a| a.to_string()),
                    "signature does not match guardian"
                );
                return Err(Rejection::InvalidSignature);
            }
        }
    }

    Ok(())
}

/// Full verification of a signed hash against the guardian registry, short-circuited by the
/// verified-hash cache.
pub struct QuorumVerifier<'a, G: ?Sized, C: ?Sized> {
    guardians: &'a G,
    cache: &'a C,
    now: u64,
}

impl<'a, G, C> QuorumVerifier<'a, G, C>
where
    G: GuardianSetSource + ?Sized,
    C: VerifiedHashCache + ?Sized,
{
    /// `now` is the time, in seconds since UNIX epoch, guardian set expiry is judged against.
    pub fn new(guardians: &'a G, cache: &'a C, now: u64) -> Self {
        QuorumVerifier {
            guardians,
            cache,
            now,
        }
    }

    pub fn verify(
        &self,
        hash: &[u8; 32],
        signatures: &[Signature],
        guardian_set_index: u32,
    ) -> Result<Verdict, VaaError> {
        if self.cache.is_verified(hash) {
            trace!(hash = %hex::encode(hash), "verified hash cached");
            return Ok(Verdict::Valid);
        }

        let guardian_set = self
            .guardians
            .guardian_set(guardian_set_index)
            .map_err(|e| {
                warn!(guardian_set_index, error = %e, "guardian set lookup failed");
                VaaError::Registry(e)
            })?
            .unwrap_or_default();

        let verdict = Verdict::from(self.check(hash, signatures, guardian_set_index, &guardian_set)?);
        if let Verdict::Rejected(r) = verdict {
            debug!(
                hash = %hex::encode(hash),
                guardian_set_index,
                signatures = signatures.len(),
                reason = r.reason(),
                "verification rejected"
            );
        }
        Ok(verdict)
    }

    fn check(
        &self,
        hash: &[u8; 32],
        signatures: &[Signature],
        guardian_set_index: u32,
        guardian_set: &GuardianSet,
    ) -> Result<Result<(), Rejection>, VaaError> {
        if guardian_set.keys.is_empty() {
            return Ok(Err(Rejection::InvalidGuardianSet));
        }

        // A superseded set stays usable until it expires.
        let current = self
            .guardians
            .current_guardian_set_index()
            .map_err(VaaError::Registry)?;
        if guardian_set_index != current && guardian_set.is_expired(self.now) {
            return Ok(Err(Rejection::GuardianSetExpired));
        }

        if signatures.len() < guardian_set.quorum()? {
            return Ok(Err(Rejection::NoQuorum));
        }

        Ok(verify_signatures(hash, signatures, &guardian_set.keys))
    }
}
