//! nomad-vector
//!
//! Dense-vector side of scoring: cosine similarity, the catalog embedding
//! cache and batch encoding with per-item failure isolation.
use std::sync::Arc;
use tracing::{debug, warn};

use nomad_core::traits::TextEncoder;

pub mod cache;
pub mod similarity;

pub use cache::EmbeddingCache;
pub use similarity::{cosine, l2_norm};

/// Vectors for a batch of texts, aligned with the input. `None` marks a text
/// the encoder failed on.
#[derive(Debug, Default)]
pub struct EncodedTexts {
    pub vectors: Vec<Option<Arc<[f32]>>>,
    pub skipped: usize,
    pub cache_hits: usize,
}

/// Encode `texts`, consulting and filling `cache`. A failure or a malformed
/// vector (wrong dimension, non-finite values) drops only that text.
pub fn encode_with_cache(encoder: &dyn TextEncoder, cache: &EmbeddingCache, texts: &[String]) -> EncodedTexts {
    let mut out = EncodedTexts { vectors: Vec::with_capacity(texts.len()), ..Default::default() };
    for text in texts {
        if let Some(v) = cache.get(encoder.id(), text) {
            out.cache_hits += 1;
            out.vectors.push(Some(v));
            continue;
        }
        match encoder.embed_text(text) {
            Ok(v) if v.len() == encoder.dim() && v.iter().all(|x| x.is_finite()) => {
                let v: Arc<[f32]> = v.into();
                cache.put(encoder.id(), text, Arc::clone(&v));
                out.vectors.push(Some(v));
            }
            Ok(v) => {
                warn!(encoder = encoder.id(), len = v.len(), expected = encoder.dim(), "encoder returned a malformed vector, skipping");
                out.skipped += 1;
                out.vectors.push(None);
            }
            Err(e) => {
                warn!(encoder = encoder.id(), error = %format!("{:#}", e), "failed to encode candidate text, skipping");
                out.skipped += 1;
                out.vectors.push(None);
            }
        }
    }
    debug!(total = texts.len(), hits = out.cache_hits, skipped = out.skipped, "encoded batch");
    out
}
