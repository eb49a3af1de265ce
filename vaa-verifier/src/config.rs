use serde::{Deserialize, Serialize};

use crate::error::VaaError;

/// Verifier settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Record the hash of every message that passes a full quorum check, so repeat submissions
    /// are answered from the cache.
    pub cache_verified: bool,

    /// When a batch verifies, also record every hash it lists. Headless messages carrying those
    /// observations can only verify if this is on.
    pub cache_batch_hashes: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            cache_verified: true,
            cache_batch_hashes: true,
        }
    }
}

impl VerifierConfig {
    pub fn from_json(s: &str) -> Result<Self, VaaError> {
        serde_json::from_str(s).map_err(From::from)
    }
}
