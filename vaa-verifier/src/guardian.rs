use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{error::VaaError, GuardianAddress};

/// Guardian sets index keys with a u8, so a set can hold at most this many keys.
pub const MAX_GUARDIANS: usize = 255;

/// A `GuardianSet` is a versioned set of keys that can sign Wormhole messages.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct GuardianSet {
    pub index: u32,
    /// Guardian addresses, in guardian index order.
    pub keys: Vec<GuardianAddress>,
    /// Seconds since UNIX epoch after which a superseded set stops being accepted. Zero while the
    /// set is active and no expiry has been set.
    pub expiration_time: u64,
}

impl GuardianSet {
    /// `floor(len * 2 / 3) + 1` distinct signatures are needed to reach quorum.
    pub fn quorum(&self) -> Result<usize, VaaError> {
        quorum(self.keys.len())
    }

    /// A zero `expiration_time` never expires.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration_time != 0 && self.expiration_time < now
    }
}

pub fn quorum(num_guardians: usize) -> Result<usize, VaaError> {
    if num_guardians > MAX_GUARDIANS {
        return Err(VaaError::TooManyGuardians(num_guardians));
    }
    Ok((num_guardians * 2) / 3 + 1)
}

/// Read-only view of the guardian registry.
///
/// Lookups are treated as fast, already-resident reads. An implementation that has to reach
/// the network or disk should apply its own timeout and report failure through the error.
pub trait GuardianSetSource {
    /// `Ok(None)` if no guardian set with this index was ever registered.
    fn guardian_set(&self, index: u32) -> anyhow::Result<Option<GuardianSet>>;

    fn current_guardian_set_index(&self) -> anyhow::Result<u32>;
}

impl<T: GuardianSetSource + ?Sized> GuardianSetSource for &T {
    fn guardian_set(&self, index: u32) -> anyhow::Result<Option<GuardianSet>> {
        (**self).guardian_set(index)
    }

    fn current_guardian_set_index(&self) -> anyhow::Result<u32> {
        (**self).current_guardian_set_index()
    }
}

impl<T: GuardianSetSource + ?Sized> GuardianSetSource for Arc<T> {
    fn guardian_set(&self, index: u32) -> anyhow::Result<Option<GuardianSet>> {
        (**self).guardian_set(index)
    }

    fn current_guardian_set_index(&self) -> anyhow::Result<u32> {
        (**self).current_guardian_set_index()
    }
}

#[derive(Debug, Default)]
struct Inner {
    current: u32,
    sets: BTreeMap<u32, GuardianSet>,
}

/// Guardian sets held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryGuardianSets(RwLock<Inner>);

impl InMemoryGuardianSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `set` as its only and current guardian set.
    pub fn with_current(set: GuardianSet) -> Self {
        let this = Self::new();
        this.set_current(set.index);
        this.insert(set);
        this
    }

    /// Store `set`, replacing any set with the same index. Returns the replaced set.
    pub fn insert(&self, set: GuardianSet) -> Option<GuardianSet> {
        self.0.write().sets.insert(set.index, set)
    }

    pub fn set_current(&self, index: u32) {
        self.0.write().current = index;
    }
}

impl GuardianSetSource for InMemoryGuardianSets {
    fn guardian_set(&self, index: u32) -> anyhow::Result<Option<GuardianSet>> {
        Ok(self.0.read().sets.get(&index).cloned())
    }

    fn current_guardian_set_index(&self) -> anyhow::Result<u32> {
        Ok(self.0.read().current)
    }
}
