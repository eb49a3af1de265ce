//! Wire formats for the three coexisting VAA versions.
//!
//! All integers are big-endian. The layouts are:
//!
//! ```markdown
//! v1 (single):
//! 0   u8          version (0x01)
//! 1   u32         guardian set index
//! 5   u8          len signatures
//! 6   [66]u8 * n  signatures
//! ..  []u8        body (observation)
//!
//! v2 (batch):
//! 0   u8          version (0x02)
//! 1   u32         guardian set index
//! 5   u8          len signatures
//! 6   [66]u8 * n  signatures
//! ..  u8          len hashes
//! ..  [32]u8 * m  hashes
//! ..  u8          len observations
//! ..  (u32, []u8) length-prefixed observations
//!
//! v3 (headless):
//! 0   [3]u8       opaque prefix, not hashed
//! 3   u8          version (0x03)
//! 4   []u8        observation
//!
//! signature (length 66):
//! 0   u8          index of the signer (in guardian keys)
//! 1   [32]u8      r
//! 33  [32]u8      s
//! 65  u8          recovery id, without the +27 Ethereum offset
//!
//! observation:
//! 0   u32         timestamp (unix in seconds)
//! 4   u32         nonce
//! 8   u16         emitter_chain
//! 10  [32]u8      emitter_address
//! 42  u64         sequence
//! 50  u8          consistency_level
//! 51  []u8        payload
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    cursor::ByteCursor, digest::double_keccak, ecrecover::RECOVERY_OFFSET, error::VaaError,
    Address,
};

pub const VERSION_SINGLE: u8 = 1;
pub const VERSION_BATCH: u8 = 2;
pub const VERSION_HEADLESS: u8 = 3;

pub const SIGNATURE_LEN: usize = 66;

/// Leading bytes of a headless message that precede its version byte.
pub const HEADLESS_PREFIX_LEN: usize = 3;

/// A guardian's secp256k1 signature over a message hash, prefixed with the guardian's position in
/// the guardian set.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Signature {
    pub guardian_index: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Raw recovery byte as carried on the wire.
    pub recovery_id: u8,
}

impl Signature {
    /// The Ethereum-style recovery value, `recovery_id + 27`.
    pub fn v(&self) -> u8 {
        self.recovery_id.wrapping_add(RECOVERY_OFFSET)
    }

    fn parse(c: &mut ByteCursor<'_>) -> Result<Self, VaaError> {
        Ok(Signature {
            guardian_index: c.read_u8()?,
            r: c.read_array()?,
            s: c.read_array()?,
            recovery_id: c.read_u8()?,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.guardian_index);
        out.extend_from_slice(&self.r);
        out.extend_from_slice(&self.s);
        out.push(self.recovery_id);
    }
}

/// The semantic content every wire version eventually exposes.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Observation {
    /// Seconds since UNIX epoch.
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: u16,
    pub emitter_address: Address,
    pub sequence: u64,
    pub consistency_level: u8,
    #[serde(with = "serde_bytes")]
    #[cfg_attr(feature = "schemars", schemars(with = "Vec<u8>"))]
    pub payload: Vec<u8>,
}

impl Observation {
    /// Length of the fixed fields in front of the payload.
    pub const HEADER_LEN: usize = 51;

    pub fn parse(body: &[u8]) -> Result<Self, VaaError> {
        if body.len() < Self::HEADER_LEN {
            return Err(VaaError::short_observation());
        }

        let mut c = ByteCursor::new(body);
        Ok(Observation {
            timestamp: c.read_u32()?,
            nonce: c.read_u32()?,
            emitter_chain: c.read_u16()?,
            emitter_address: Address(c.read_array()?),
            sequence: c.read_u64()?,
            consistency_level: c.read_u8()?,
            payload: c.read_rest().to_vec(),
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.emitter_chain.to_be_bytes());
        out.extend_from_slice(&self.emitter_address.0);
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.push(self.consistency_level);
        out.extend_from_slice(&self.payload);
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::HEADER_LEN + self.payload.len());
        self.write(&mut out);
        out
    }

    /// Identity of a v1 message carrying this observation as its body.
    pub fn hash(&self) -> [u8; 32] {
        double_keccak(&self.serialize())
    }

    /// Identity of this observation once tagged as a headless (v3) message. This is the value a
    /// batch lists in its hashes.
    pub fn headless_hash(&self) -> [u8; 32] {
        double_keccak(&tag_headless(&self.serialize()))
    }
}

/// Signed header shared by the v1 and v2 formats.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Header {
    pub version: u8,
    pub guardian_set_index: u32,
    /// Ascending by guardian index, no duplicates.
    pub signatures: Vec<Signature>,
    /// The value the signatures were produced over.
    pub hash: [u8; 32],
}

impl Header {
    /// Reads version, guardian set index and the signature block. The version byte must match
    /// `expected`.
    fn parse_signed(c: &mut ByteCursor<'_>, expected: u8) -> Result<(u32, Vec<Signature>), VaaError> {
        let version = c.read_u8()?;
        if version != expected {
            return Err(VaaError::UnsupportedVersion(version));
        }

        let guardian_set_index = c.read_u32()?;
        let len_signers = usize::from(c.read_u8()?);

        // Check the whole signature block up front.
        let _ = c.peek_bytes(len_signers * SIGNATURE_LEN)?;
        let signatures = (0..len_signers)
            .map(|_| Signature::parse(c))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((guardian_set_index, signatures))
    }

    fn write_signed(&self, out: &mut Vec<u8>) -> Result<(), VaaError> {
        let len_signers = u8::try_from(self.signatures.len()).map_err(|_| {
            VaaError::MalformedMessage {
                reason: "too many signatures",
            }
        })?;

        out.push(self.version);
        out.extend_from_slice(&self.guardian_set_index.to_be_bytes());
        out.push(len_signers);
        for sig in &self.signatures {
            sig.write(out);
        }
        Ok(())
    }
}

/// A single observation signed directly by the guardians.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct MessageV1 {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<Signature>,
    /// Double hash of the body.
    pub hash: [u8; 32],
    pub observation: Observation,
}

impl MessageV1 {
    pub fn parse(data: &[u8]) -> Result<Self, VaaError> {
        let mut c = ByteCursor::new(data);
        let (guardian_set_index, signatures) = Header::parse_signed(&mut c, VERSION_SINGLE)?;

        let body = c.read_rest();
        let observation = Observation::parse(body)?;

        Ok(MessageV1 {
            version: VERSION_SINGLE,
            guardian_set_index,
            signatures,
            hash: double_keccak(body),
            observation,
        })
    }

    /// Build an unsigned-for-now message around `observation`, computing its hash.
    pub fn new(guardian_set_index: u32, observation: Observation) -> Self {
        MessageV1 {
            version: VERSION_SINGLE,
            guardian_set_index,
            signatures: Vec::new(),
            hash: observation.hash(),
            observation,
        }
    }

    pub fn header(&self) -> Header {
        Header {
            version: self.version,
            guardian_set_index: self.guardian_set_index,
            signatures: self.signatures.clone(),
            hash: self.hash,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, VaaError> {
        let mut out = Vec::with_capacity(
            6 + self.signatures.len() * SIGNATURE_LEN
                + Observation::HEADER_LEN
                + self.observation.payload.len(),
        );
        self.header().write_signed(&mut out)?;
        self.observation.write(&mut out);
        Ok(out)
    }
}

/// A batch: one set of signatures over a list of hashes, carrying the observations those hashes
/// identify.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct MessageV2 {
    /// `header.hash` is the double hash of the concatenated hash list.
    pub header: Header,
    pub hashes: Vec<[u8; 32]>,
    /// Carried observations, each tagged with a leading headless version byte.
    pub observations: Vec<Vec<u8>>,
}

impl MessageV2 {
    pub fn parse(data: &[u8]) -> Result<Self, VaaError> {
        let mut c = ByteCursor::new(data);
        let (guardian_set_index, signatures) = Header::parse_signed(&mut c, VERSION_BATCH)?;

        let len_hashes = usize::from(c.read_u8()?);
        let hash = double_keccak(c.peek_bytes(len_hashes * 32)?);
        let hashes = (0..len_hashes)
            .map(|_| c.read_array::<32>())
            .collect::<Result<Vec<_>, _>>()?;

        let len_observations = c.read_u8()?;
        let mut observations = Vec::with_capacity(usize::from(len_observations));
        for _ in 0..len_observations {
            let len = c.read_u32()?;
            let raw = c.read_bytes(len as usize)?;
            observations.push(tag_headless(raw));
        }

        if !c.remaining().is_empty() {
            return Err(VaaError::MalformedMessage {
                reason: "trailing bytes",
            });
        }

        // The signatures only cover the hash list, so every carried observation must be listed.
        if observations
            .iter()
            .any(|tagged| !hashes.contains(&double_keccak(tagged)))
        {
            return Err(VaaError::MalformedMessage {
                reason: "observation not listed in hashes",
            });
        }

        Ok(MessageV2 {
            header: Header {
                version: VERSION_BATCH,
                guardian_set_index,
                signatures,
                hash,
            },
            hashes,
            observations,
        })
    }

    /// Build a batch around `observations`, listing each one's headless hash.
    pub fn new(guardian_set_index: u32, observations: &[Observation]) -> Self {
        let hashes: Vec<[u8; 32]> = observations.iter().map(Observation::headless_hash).collect();
        MessageV2 {
            header: Header {
                version: VERSION_BATCH,
                guardian_set_index,
                signatures: Vec::new(),
                hash: double_keccak(&hashes.concat()),
            },
            hashes,
            observations: observations
                .iter()
                .map(|o| tag_headless(&o.serialize()))
                .collect(),
        }
    }

    /// Parse every carried observation.
    pub fn parsed_observations(&self) -> Result<Vec<Observation>, VaaError> {
        self.observations
            .iter()
            .map(|tagged| Observation::parse(untag(tagged)))
            .collect()
    }

    /// Parse the `i`th carried observation.
    pub fn observation(&self, i: usize) -> Option<Result<Observation, VaaError>> {
        self.observations
            .get(i)
            .map(|tagged| Observation::parse(untag(tagged)))
    }

    /// The v3 wire form of the `i`th carried observation, with a zeroed prefix.
    pub fn headless(&self, i: usize) -> Option<Vec<u8>> {
        self.observations.get(i).map(|tagged| {
            let mut out = Vec::with_capacity(HEADLESS_PREFIX_LEN + tagged.len());
            out.extend_from_slice(&[0; HEADLESS_PREFIX_LEN]);
            out.extend_from_slice(tagged);
            out
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>, VaaError> {
        let mut out = Vec::new();
        self.header.write_signed(&mut out)?;

        let len_hashes = u8::try_from(self.hashes.len()).map_err(|_| {
            VaaError::MalformedMessage {
                reason: "too many hashes",
            }
        })?;
        out.push(len_hashes);
        for h in &self.hashes {
            out.extend_from_slice(h);
        }

        let len_observations = u8::try_from(self.observations.len()).map_err(|_| {
            VaaError::MalformedMessage {
                reason: "too many observations",
            }
        })?;
        out.push(len_observations);
        for tagged in &self.observations {
            let raw = untag(tagged);
            let len = u32::try_from(raw.len()).map_err(|_| VaaError::MalformedMessage {
                reason: "observation too long",
            })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(raw);
        }

        Ok(out)
    }
}

/// An observation with no signatures of its own. It is valid only if its hash was recorded as
/// verified, typically by a batch that listed it.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct MessageV3 {
    pub prefix: [u8; HEADLESS_PREFIX_LEN],
    pub version: u8,
    pub observation: Observation,
    /// Double hash of everything from the version byte onwards.
    pub hash: [u8; 32],
}

impl MessageV3 {
    pub fn parse(data: &[u8]) -> Result<Self, VaaError> {
        let mut c = ByteCursor::at(data, HEADLESS_PREFIX_LEN)?;
        let version = c.read_u8()?;
        if version != VERSION_HEADLESS {
            return Err(VaaError::UnsupportedVersion(version));
        }

        let mut prefix = [0u8; HEADLESS_PREFIX_LEN];
        prefix.copy_from_slice(&data[..HEADLESS_PREFIX_LEN]);

        Ok(MessageV3 {
            prefix,
            version,
            hash: double_keccak(&data[HEADLESS_PREFIX_LEN..]),
            observation: Observation::parse(c.read_rest())?,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            HEADLESS_PREFIX_LEN + 1 + Observation::HEADER_LEN + self.observation.payload.len(),
        );
        out.extend_from_slice(&self.prefix);
        out.push(self.version);
        self.observation.write(&mut out);
        out
    }
}

/// Any supported VAA.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum Message {
    V1(MessageV1),
    V2(MessageV2),
    V3(MessageV3),
}

impl Message {
    /// Pick the parser from the declared version. Byte 0 declares v1 and v2; a headless message
    /// declares its version at byte 3, behind the opaque prefix.
    ///
    /// Byte 0 is checked first, so a headless message whose prefix starts with 0x01 or 0x02 is
    /// handed to the v1 or v2 parser. Producers of headless messages must not use those prefix
    /// bytes; [`MessageV3::parse`] accepts any prefix.
    pub fn parse(data: &[u8]) -> Result<Self, VaaError> {
        match data.first() {
            None => Err(VaaError::truncated()),
            Some(&VERSION_SINGLE) => MessageV1::parse(data).map(Message::V1),
            Some(&VERSION_BATCH) => MessageV2::parse(data).map(Message::V2),
            Some(&v) => match data.get(HEADLESS_PREFIX_LEN) {
                Some(&VERSION_HEADLESS) => MessageV3::parse(data).map(Message::V3),
                _ => Err(VaaError::UnsupportedVersion(v)),
            },
        }
    }

    pub fn version(&self) -> u8 {
        match self {
            Message::V1(m) => m.version,
            Message::V2(m) => m.header.version,
            Message::V3(m) => m.version,
        }
    }

    /// The identity hash. For a batch this is the hash of its hash list.
    pub fn hash(&self) -> [u8; 32] {
        match self {
            Message::V1(m) => m.hash,
            Message::V2(m) => m.header.hash,
            Message::V3(m) => m.hash,
        }
    }

    /// Normalized observations: one for v1 and v3, one per carried observation for a batch.
    pub fn observations(&self) -> Result<Vec<Observation>, VaaError> {
        match self {
            Message::V1(m) => Ok(vec![m.observation.clone()]),
            Message::V2(m) => m.parsed_observations(),
            Message::V3(m) => Ok(vec![m.observation.clone()]),
        }
    }
}

fn tag_headless(raw: &[u8]) -> Vec<u8> {
    let mut tagged = Vec::with_capacity(1 + raw.len());
    tagged.push(VERSION_HEADLESS);
    tagged.extend_from_slice(raw);
    tagged
}

fn untag(tagged: &[u8]) -> &[u8] {
    tagged.split_first().map(|(_, raw)| raw).unwrap_or_default()
}
