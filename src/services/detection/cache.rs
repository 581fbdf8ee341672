// Detection Cache
// Bounded LRU of pattern-matcher verdicts keyed by a normalized-text fingerprint.
// Owned by the caller and shared across runs; never authoritative.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::models::{Candidate, FragmentKind, TextFragment};

const PREFIX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentFingerprint {
    prefix: String,
    char_len: usize,
    kind: FragmentKind,
    checked: Option<bool>,
}

impl FragmentFingerprint {
    pub fn of(fragment: &TextFragment) -> Self {
        Self {
            prefix: fragment.text.chars().take(PREFIX_CHARS).collect::<String>().to_lowercase(),
            char_len: fragment.text.chars().count(),
            kind: fragment.kind,
            checked: fragment.checked,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    /// `None` records a miss.
    verdict: Option<Candidate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

pub struct DetectionCache {
    inner: Mutex<LruCache<FragmentFingerprint, CacheEntry>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DetectionCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached verdict for a fragment, re-keyed to its id.
    ///
    /// Outer `None` is a cache miss; `Some(None)` is a cached "no match".
    /// An entry whose stored text is not byte-identical to the fragment's
    /// (a fingerprint collision, or a case-only difference) counts as a miss.
    pub fn lookup(&self, fragment: &TextFragment) -> Option<Option<Candidate>> {
        let key = FragmentFingerprint::of(fragment);
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let found = cache
            .get(&key)
            .filter(|entry| entry.text == fragment.text)
            .map(|entry| {
                entry.verdict.clone().map(|mut candidate| {
                    candidate.fragment_id = fragment.id.clone();
                    candidate
                })
            });

        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Last writer wins; entries are pure functions of their key.
    pub fn insert(&self, fragment: &TextFragment, verdict: Option<&Candidate>) {
        let entry = CacheEntry {
            text: fragment.text.clone(),
            verdict: verdict.cloned(),
        };
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(FragmentFingerprint::of(fragment), entry);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: self.len(),
            capacity: self.capacity,
        }
    }
}

impl Default for DetectionCache {
    fn default() -> Self {
        Self::new(2048)
    }
}
