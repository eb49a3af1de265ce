use thiserror::Error;

/// Hard failures. A buffer that produces one of these is garbage or cannot be judged at all, as
/// opposed to a well-formed message that simply failed verification (see [`Rejection`]).
#[derive(Error, Debug)]
pub enum VaaError {
    /// Short buffer or a length field that does not fit the data.
    #[error("malformed message: {reason}")]
    MalformedMessage { reason: &'static str },

    /// The declared version byte does not match the parser, or no parser exists for it.
    #[error("unsupported VAA version: {0}")]
    UnsupportedVersion(u8),

    /// Guardian sets must have fewer than 256 keys so every guardian fits a u8 index.
    #[error("guardian set has {0} keys, at most 255 are supported")]
    TooManyGuardians(usize),

    /// The guardian registry could not answer.
    #[error("guardian registry lookup failed")]
    Registry(#[source] anyhow::Error),

    #[error("invalid verifier config")]
    Config(#[from] serde_json::Error),
}

impl VaaError {
    pub(crate) const fn truncated() -> Self {
        VaaError::MalformedMessage { reason: "truncated" }
    }

    pub(crate) const fn short_observation() -> Self {
        VaaError::MalformedMessage {
            reason: "insufficient observation length",
        }
    }
}

/// Why a well-formed message was not accepted. These are verification outcomes, never errors:
/// they surface to callers as a `(false, reason)` pair.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Guardian set with this index does not exist or has no keys
    #[error("invalid guardian set")]
    InvalidGuardianSet,

    /// Guardian set is not current and its expiration time has passed
    #[error("guardian set has expired")]
    GuardianSetExpired,

    /// Not enough signers on the VAA
    #[error("no quorum")]
    NoQuorum,

    /// Guardian indices must be strictly ascending
    #[error("signature indices must be ascending")]
    BadSignatureOrder,

    /// Guardian index points past the end of the guardian set
    #[error("guardian index out of bounds")]
    SignatureIndexOutOfRange,

    /// Recovered signer does not match the guardian address
    #[error("VM signature invalid")]
    InvalidSignature,
}

impl Rejection {
    /// The human-readable reason string reported alongside `valid == false`.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::InvalidGuardianSet => "invalid guardian set",
            Rejection::GuardianSetExpired => "guardian set has expired",
            Rejection::NoQuorum => "no quorum",
            Rejection::BadSignatureOrder => "signature indices must be ascending",
            Rejection::SignatureIndexOutOfRange => "guardian index out of bounds",
            Rejection::InvalidSignature => "VM signature invalid",
        }
    }
}
