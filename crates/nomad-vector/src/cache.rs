//! In-memory embedding cache keyed by `(encoder_id, blake3(text))`.
//!
//! Only catalog texts go through the cache; they never change after load, so
//! entries are never invalidated. A different encoder id is a different key
//! space.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    encoder_id: String,
    content_hash: String,
}

fn hash_content(s: &str) -> String { blake3::hash(s.as_bytes()).to_hex().to_string() }

#[derive(Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<CacheKey, Arc<[f32]>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, encoder_id: &str, text: &str) -> Option<Arc<[f32]>> {
        let key = CacheKey { encoder_id: encoder_id.to_string(), content_hash: hash_content(text) };
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&key).cloned()
    }

    pub fn put(&self, encoder_id: &str, text: &str, vector: Arc<[f32]>) {
        let key = CacheKey { encoder_id: encoder_id.to_string(), content_hash: hash_content(text) };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, vector);
    }

    pub fn len(&self) -> usize { self.entries.read().unwrap_or_else(|e| e.into_inner()).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
