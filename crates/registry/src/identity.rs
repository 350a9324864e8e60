//! Content identity: digest pair derivation and duplicate screening.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Mutex;

/// The content-derived key identifying a byte payload.
///
/// The fast digest (CRC32) exists purely for cheap duplicate screening;
/// the strong digest (BLAKE3, hex) is authoritative and is the only part
/// used as a registry key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentIdentity {
    pub fast: u32,
    pub strong: String,
}

impl ContentIdentity {
    /// The authoritative registry key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.strong
    }
}

impl Display for ContentIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.strong)
    }
}

/// Derive the identity of a byte payload.
///
/// Pure function of the bytes: no path, no metadata, no clock. Identical
/// content always produces an identical identity.
#[must_use]
pub fn identify(bytes: &[u8]) -> ContentIdentity {
    ContentIdentity { fast: crc32fast::hash(bytes), strong: blake3::hash(bytes).to_hex().to_string() }
}

/// Duplicate pre-screen that bounds strong-digest work on batches full of
/// exact duplicates.
///
/// The strong digest is computed once per distinct (fast digest, length)
/// bucket; later payloads landing in an occupied bucket reuse the stored
/// digest without re-hashing. Shared across workers: all hashing happens
/// outside the bucket lock, so two workers racing on the same new bucket
/// may both hash, and the first insert wins. Scoped to one batch run,
/// like the dedup it serves.
#[derive(Default)]
pub struct IdentityScreen {
    buckets: Mutex<HashMap<(u32, usize), String>>,
}

impl IdentityScreen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identify `bytes`, reusing the strong digest when the (fast, length)
    /// bucket has been seen before in this screen's lifetime.
    pub fn identify(&self, bytes: &[u8]) -> ContentIdentity {
        let fast = crc32fast::hash(bytes);
        let key = (fast, bytes.len());
        if let Some(strong) = self.cached(key) {
            return ContentIdentity { fast, strong };
        }
        let strong = blake3::hash(bytes).to_hex().to_string();
        self.store(key, strong.clone());
        ContentIdentity { fast, strong }
    }

    /// Number of distinct buckets seen so far.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.buckets.lock().map(|buckets| buckets.len()).unwrap_or(0)
    }

    // A poisoned lock degrades the screen to a plain hash, never an error:
    // the cache is an optimization, not a source of truth.
    fn cached(&self, key: (u32, usize)) -> Option<String> {
        self.buckets.lock().ok()?.get(&key).cloned()
    }

    fn store(&self, key: (u32, usize), strong: String) {
        if let Ok(mut buckets) = self.buckets.lock() {
            buckets.entry(key).or_insert(strong);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_deterministic_and_content_only() {
        let a = identify(b"same bytes");
        let b = identify(b"same bytes");
        assert_eq!(a, b);
        assert_eq!(a.strong.len(), 64);
    }

    #[test]
    fn different_content_different_identity() {
        assert_ne!(identify(b"one").strong, identify(b"two").strong);
    }

    #[test]
    fn screen_matches_direct_identify() {
        let screen = IdentityScreen::new();
        let direct = identify(b"payload");
        assert_eq!(screen.identify(b"payload"), direct);
        assert_eq!(screen.identify(b"payload"), direct);
        assert_eq!(screen.distinct(), 1);
    }

    #[test]
    fn screen_buckets_by_fast_digest_and_length() {
        let screen = IdentityScreen::new();
        screen.identify(b"aaaa");
        screen.identify(b"bbbb");
        screen.identify(b"aaaa");
        assert_eq!(screen.distinct(), 2);
    }

    #[test]
    fn screen_is_shared_across_threads_without_exclusive_access() {
        let screen = std::sync::Arc::new(IdentityScreen::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let screen = std::sync::Arc::clone(&screen);
                std::thread::spawn(move || screen.identify(b"shared payload"))
            })
            .collect();
        let identities: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
        assert!(identities.iter().all(|identity| identity == &identities[0]));
        assert_eq!(screen.distinct(), 1);
    }
}
