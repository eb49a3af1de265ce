#![allow(dead_code)]

use k256::ecdsa::SigningKey;
use wormhole_vaa_verifier::{
    Address, FixedClock, GuardianAddress, GuardianSet, InMemoryGuardianSets, MessageV1, MessageV2,
    Observation, Signature, Verifier,
};

pub const NOW: u64 = 1_700_000_000;

pub fn default_guardian_keys() -> [SigningKey; 7] {
    [
        SigningKey::from_slice(&[
            93, 217, 189, 224, 168, 81, 157, 93, 238, 38, 143, 8, 182, 94, 69, 77, 232, 199, 238,
            206, 15, 135, 221, 58, 43, 74, 0, 129, 54, 198, 62, 226,
        ])
        .unwrap(),
        SigningKey::from_slice(&[
            150, 48, 135, 223, 194, 186, 243, 139, 177, 8, 126, 32, 210, 57, 42, 28, 29, 102, 196,
            201, 106, 136, 40, 149, 218, 150, 240, 213, 192, 128, 161, 245,
        ])
        .unwrap(),
        SigningKey::from_slice(&[
            121, 51, 199, 93, 237, 227, 62, 220, 128, 129, 195, 4, 190, 163, 254, 12, 212, 224,
            188, 76, 141, 242, 229, 121, 192, 5, 161, 176, 136, 99, 83, 53,
        ])
        .unwrap(),
        SigningKey::from_slice(&[
            224, 180, 4, 114, 215, 161, 184, 12, 218, 96, 20, 141, 154, 242, 46, 230, 167, 165, 54,
            141, 108, 64, 146, 27, 193, 89, 251, 139, 234, 132, 124, 30,
        ])
        .unwrap(),
        SigningKey::from_slice(&[
            69, 1, 17, 179, 19, 47, 56, 47, 255, 219, 143, 89, 115, 54, 242, 209, 163, 131, 225,
            30, 59, 195, 217, 141, 167, 253, 6, 95, 252, 52, 7, 223,
        ])
        .unwrap(),
        SigningKey::from_slice(&[
            181, 3, 165, 125, 15, 200, 155, 56, 157, 204, 105, 221, 203, 149, 215, 175, 220, 228,
            200, 37, 169, 39, 68, 127, 132, 196, 203, 232, 155, 55, 67, 253,
        ])
        .unwrap(),
        SigningKey::from_slice(&[
            72, 81, 175, 107, 23, 108, 178, 66, 32, 53, 14, 117, 233, 33, 114, 102, 68, 89, 83,
            201, 129, 57, 56, 130, 214, 212, 172, 16, 23, 22, 234, 160,
        ])
        .unwrap(),
    ]
}

pub fn guardian_set(index: u32, keys: &[SigningKey], expiration_time: u64) -> GuardianSet {
    GuardianSet {
        index,
        keys: keys
            .iter()
            .map(|k| GuardianAddress::from(k.verifying_key()))
            .collect(),
        expiration_time,
    }
}

/// Signature by `key`, sitting at `guardian_index` in its guardian set, over `hash`.
pub fn sign(key: &SigningKey, guardian_index: u8, hash: &[u8; 32]) -> Signature {
    let (sig, id) = key.sign_prehash_recoverable(hash).unwrap();
    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    Signature {
        guardian_index,
        r,
        s,
        recovery_id: id.to_byte(),
    }
}

/// Signatures from every key, in guardian order.
pub fn sign_all(keys: &[SigningKey], hash: &[u8; 32]) -> Vec<Signature> {
    keys.iter()
        .enumerate()
        .map(|(i, k)| sign(k, i as u8, hash))
        .collect()
}

pub fn create_observation(i: u64) -> Observation {
    Observation {
        timestamp: i as u32,
        nonce: i as u32,
        emitter_chain: 2,
        emitter_address: Address([i as u8; 32]),
        sequence: i,
        consistency_level: 15,
        payload: format!("message {i}").into_bytes(),
    }
}

pub fn signed_vm(keys: &[SigningKey], guardian_set_index: u32, observation: Observation) -> MessageV1 {
    let mut vm = MessageV1::new(guardian_set_index, observation);
    vm.signatures = sign_all(keys, &vm.hash);
    vm
}

pub fn signed_batch(
    keys: &[SigningKey],
    guardian_set_index: u32,
    observations: &[Observation],
) -> MessageV2 {
    let mut batch = MessageV2::new(guardian_set_index, observations);
    batch.header.signatures = sign_all(keys, &batch.header.hash);
    batch
}

/// Verifier over the default guardians as set 0, clock pinned to `NOW`.
pub fn verifier() -> Verifier<InMemoryGuardianSets> {
    let keys = default_guardian_keys();
    Verifier::with_guardians(InMemoryGuardianSets::with_current(guardian_set(0, &keys, 0)))
        .with_clock(FixedClock(NOW))
}
