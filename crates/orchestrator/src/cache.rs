//! Bounded result cache with FIFO eviction
//!
//! Generic over the value type; one instance holds textual answers and a
//! second holds synthesized audio blobs. Eviction is strict FIFO on
//! insertion order: re-putting an existing key overwrites the value but
//! does NOT refresh its position, so a repeatedly requested key is still
//! evicted at its original age. This differs from LRU and is kept on
//! purpose; see `reput_does_not_refresh_insertion_order`.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use sahayak_core::types::normalize_query;
use sahayak_core::Language;

/// Values storable in a `ResultCache`. Empty values are refused at `put`
/// so a degenerate upstream result can never be served from cache.
pub trait CacheValue: Clone + Send {
    fn is_empty_value(&self) -> bool;
}

impl CacheValue for String {
    fn is_empty_value(&self) -> bool {
        self.trim().is_empty()
    }
}

impl CacheValue for Vec<u8> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

struct CacheInner<V> {
    entries: HashMap<String, V>,
    /// Keys in insertion order; each key appears exactly once
    order: VecDeque<String>,
}

/// Bounded key-value store with FIFO eviction
pub struct ResultCache<V> {
    inner: Mutex<CacheInner<V>>,
    capacity: usize,
}

impl<V: CacheValue> ResultCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// Insert a value. Silently refuses empty values. Overwriting an
    /// existing key keeps its original insertion order.
    pub fn put(&self, key: &str, value: V) {
        if value.is_empty_value() {
            tracing::debug!(key, "refusing to cache empty value");
            return;
        }

        let mut inner = self.inner.lock();

        if inner.entries.contains_key(key) {
            inner.entries.insert(key.to_string(), value);
            return;
        }

        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                    tracing::debug!(evicted = %oldest, "FIFO cache eviction");
                }
                None => break,
            }
        }

        inner.entries.insert(key.to_string(), value);
        inner.order.push_back(key.to_string());
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Stable cache key for a textual query: sha256 over the
/// case/whitespace-normalized text, so identical inputs collide to the
/// same key regardless of call site.
pub fn cache_key(query: &str) -> String {
    digest(&normalize_query(query))
}

/// Stable cache key for synthesized audio: text, language and speed all
/// participate so the same text at a different speed is a different entry.
pub fn audio_cache_key(text: &str, language: Language, speed: f32) -> String {
    digest(&format!(
        "{}|{}|{:.2}",
        normalize_query(text),
        language.code(),
        speed
    ))
}

fn digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = hasher.finalize();
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}
