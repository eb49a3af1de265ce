use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

/// Record of message hashes that already passed a full quorum check.
///
/// A hit lets the verifier skip every other check, including guardian set expiry, so entries
/// must only ever be written after a successful verification. Implementations must be safe to
/// share between threads: lookups see a consistent value and `mark_verified` on one key is
/// atomic with respect to concurrent callers.
pub trait VerifiedHashCache: Send + Sync {
    fn is_verified(&self, hash: &[u8; 32]) -> bool;

    fn mark_verified(&self, hash: [u8; 32], verified: bool);

    /// Drop every entry in `hashes`, e.g. when the batch that listed them is superseded.
    fn wipe(&self, hashes: &[[u8; 32]]);
}

impl<T: VerifiedHashCache + ?Sized> VerifiedHashCache for Arc<T> {
    fn is_verified(&self, hash: &[u8; 32]) -> bool {
        (**self).is_verified(hash)
    }

    fn mark_verified(&self, hash: [u8; 32], verified: bool) {
        (**self).mark_verified(hash, verified)
    }

    fn wipe(&self, hashes: &[[u8; 32]]) {
        (**self).wipe(hashes)
    }
}

/// Process-local cache. Entries never expire; only [`VerifiedHashCache::wipe`] removes them.
#[derive(Debug, Default)]
pub struct InMemoryHashCache {
    entries: RwLock<HashMap<[u8; 32], bool>>,
}

impl InMemoryHashCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl VerifiedHashCache for InMemoryHashCache {
    fn is_verified(&self, hash: &[u8; 32]) -> bool {
        self.entries.read().get(hash).copied().unwrap_or(false)
    }

    fn mark_verified(&self, hash: [u8; 32], verified: bool) {
        let _ = self.entries.write().insert(hash, verified);
    }

    fn wipe(&self, hashes: &[[u8; 32]]) {
        let mut entries = self.entries.write();
        for h in hashes {
            let _ = entries.remove(h);
        }
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;

    #[test]
    fn mark_and_lookup() {
        let cache = InMemoryHashCache::new();
        let h = [7u8; 32];

        assert!(!cache.is_verified(&h));
        assert!(cache.is_empty());

        cache.mark_verified(h, true);
        assert!(cache.is_verified(&h));

        cache.mark_verified(h, false);
        assert!(!cache.is_verified(&h));
        assert_eq!(1, cache.len());
    }

    #[test]
    fn wipe_removes_only_listed() {
        let cache = InMemoryHashCache::new();
        let hashes = [[1u8; 32], [2u8; 32], [3u8; 32]];
        for h in hashes {
            cache.mark_verified(h, true);
        }

        cache.wipe(&hashes[..2]);

        assert!(!cache.is_verified(&hashes[0]));
        assert!(!cache.is_verified(&hashes[1]));
        assert!(cache.is_verified(&hashes[2]));
        assert_eq!(1, cache.len());

        // Wiping unknown hashes is a no-op.
        cache.wipe(&[[9u8; 32]]);
        assert_eq!(1, cache.len());
    }

    #[test]
    fn concurrent_marks_agree() {
        let cache = Arc::new(InMemoryHashCache::new());

        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..64u8 {
                        cache.mark_verified([i; 32], true);
                        assert!(cache.is_verified(&[i; 32]));
                        cache.mark_verified([t.wrapping_add(100); 32], true);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(64 + 8, cache.len());
        for i in 0..64u8 {
            assert!(cache.is_verified(&[i; 32]));
        }
    }
}
