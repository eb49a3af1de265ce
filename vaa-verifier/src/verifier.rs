//! Entry points that take raw VAA bytes through parsing, hashing, quorum verification and the
//! verified-hash cache.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::{
    cache::{InMemoryHashCache, VerifiedHashCache},
    config::VerifierConfig,
    error::VaaError,
    guardian::GuardianSetSource,
    quorum::{QuorumVerifier, Verdict},
    vaa::{Message, MessageV1, MessageV2, MessageV3, Observation, Signature},
};

/// Source of the current time, in seconds since UNIX epoch, used to judge guardian set expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// A clock pinned to one instant, for tests and replaying historical messages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// A parsed value together with the verdict on it. The value is returned even when rejected so
/// callers can report on it, but it must not be trusted unless `valid()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    pub value: T,
    pub verdict: Verdict,
}

impl<T> Verified<T> {
    pub fn valid(&self) -> bool {
        self.verdict.is_valid()
    }

    pub fn reason(&self) -> &'static str {
        self.verdict.reason()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Verified<U> {
        Verified {
            value: f(self.value),
            verdict: self.verdict,
        }
    }
}

/// Verifies VAAs against a guardian registry, remembering what it has verified in `C`.
///
/// Every entry point takes `&self`; share one `Verifier` (or one cache behind an `Arc`) between
/// threads to share verified hashes.
pub struct Verifier<G, C = InMemoryHashCache> {
    guardians: G,
    cache: C,
    config: VerifierConfig,
    clock: Box<dyn Clock>,
}

impl<G> Verifier<G, InMemoryHashCache>
where
    G: GuardianSetSource,
{
    /// Verifier with a private in-memory cache.
    pub fn with_guardians(guardians: G) -> Self {
        Verifier::new(guardians, InMemoryHashCache::new())
    }
}

impl<G, C> Verifier<G, C>
where
    G: GuardianSetSource,
    C: VerifiedHashCache,
{
    pub fn new(guardians: G, cache: C) -> Self {
        Verifier {
            guardians,
            cache,
            config: VerifierConfig::default(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn guardians(&self) -> &G {
        &self.guardians
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn quorum(&self) -> QuorumVerifier<'_, G, C> {
        QuorumVerifier::new(&self.guardians, &self.cache, self.clock.now())
    }

    /// Verify `signatures` over `hash` by guardian set `guardian_set_index`. Does not record the
    /// result in the cache.
    pub fn verify(
        &self,
        hash: &[u8; 32],
        signatures: &[Signature],
        guardian_set_index: u32,
    ) -> Result<Verdict, VaaError> {
        self.quorum().verify(hash, signatures, guardian_set_index)
    }

    /// Parse and verify a single (v1) VAA. A valid message's hash is recorded as verified.
    pub fn parse_and_verify_vm(&self, data: &[u8]) -> Result<Verified<MessageV1>, VaaError> {
        self.verify_vm(MessageV1::parse(data)?)
    }

    fn verify_vm(&self, vm: MessageV1) -> Result<Verified<MessageV1>, VaaError> {
        let verdict = self.verify(&vm.hash, &vm.signatures, vm.guardian_set_index)?;

        if verdict.is_valid() && self.config.cache_verified {
            self.cache.mark_verified(vm.hash, true);
        }
        debug!(
            version = vm.version,
            hash = %hex::encode(vm.hash),
            emitter_chain = vm.observation.emitter_chain,
            sequence = vm.observation.sequence,
            %verdict,
            "parsed and verified VAA"
        );

        Ok(Verified { value: vm, verdict })
    }

    /// Parse and verify a batch (v2) VAA. When the batch is valid, every hash it lists is
    /// recorded as verified so its observations can later be submitted headless.
    pub fn parse_and_verify_batch(&self, data: &[u8]) -> Result<Verified<MessageV2>, VaaError> {
        self.verify_batch(MessageV2::parse(data)?)
    }

    fn verify_batch(&self, batch: MessageV2) -> Result<Verified<MessageV2>, VaaError> {
        let header = &batch.header;
        let verdict = self.verify(&header.hash, &header.signatures, header.guardian_set_index)?;

        if verdict.is_valid() {
            if self.config.cache_verified {
                self.cache.mark_verified(header.hash, true);
            }
            if self.config.cache_batch_hashes {
                for h in &batch.hashes {
                    self.cache.mark_verified(*h, true);
                }
            }
        }
        debug!(
            hash = %hex::encode(header.hash),
            hashes = batch.hashes.len(),
            observations = batch.observations.len(),
            %verdict,
            "parsed and verified batch"
        );

        Ok(Verified {
            value: batch,
            verdict,
        })
    }

    /// Parse and verify a headless (v3) VAA. It carries no signatures, so it is valid only if its
    /// hash was recorded as verified; otherwise it fails quorum against the current guardian set.
    pub fn parse_and_verify_headless(&self, data: &[u8]) -> Result<Verified<MessageV3>, VaaError> {
        self.verify_headless(MessageV3::parse(data)?)
    }

    fn verify_headless(&self, vm: MessageV3) -> Result<Verified<MessageV3>, VaaError> {
        let verdict = if self.cache.is_verified(&vm.hash) {
            Verdict::Valid
        } else {
            let current = self
                .guardians
                .current_guardian_set_index()
                .map_err(VaaError::Registry)?;
            self.verify(&vm.hash, &[], current)?
        };
        debug!(
            hash = %hex::encode(vm.hash),
            sequence = vm.observation.sequence,
            %verdict,
            "parsed and verified headless VAA"
        );

        Ok(Verified { value: vm, verdict })
    }

    /// Dispatch on the declared version.
    pub fn parse_and_verify_message(&self, data: &[u8]) -> Result<Verified<Message>, VaaError> {
        match Message::parse(data)? {
            Message::V1(vm) => self.verify_vm(vm).map(|v| v.map(Message::V1)),
            Message::V2(batch) => self.verify_batch(batch).map(|v| v.map(Message::V2)),
            Message::V3(vm) => self.verify_headless(vm).map(|v| v.map(Message::V3)),
        }
    }

    /// Any supported VAA, normalized to its observations: one for v1 and v3, one per carried
    /// observation for a batch.
    pub fn parse_and_verify(&self, data: &[u8]) -> Result<Verified<Vec<Observation>>, VaaError> {
        let verified = self.parse_and_verify_message(data)?;
        Ok(Verified {
            value: verified.value.observations()?,
            verdict: verified.verdict,
        })
    }

    /// Forget that `hashes` were verified, e.g. when the batch listing them is superseded.
    pub fn wipe_batch(&self, hashes: &[[u8; 32]]) {
        self.cache.wipe(hashes);
        info!(count = hashes.len(), "wiped verified hashes");
    }
}
