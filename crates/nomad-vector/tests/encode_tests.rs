use std::sync::atomic::{AtomicUsize, Ordering};

use nomad_core::traits::TextEncoder;
use nomad_embed::HashingEncoder;
use nomad_vector::{cosine, encode_with_cache, EmbeddingCache};

/// Fails on any text containing "broken"; counts real encode calls.
struct Flaky {
    inner: HashingEncoder,
    calls: AtomicUsize,
}

impl TextEncoder for Flaky {
    fn id(&self) -> &str { "flaky" }
    fn dim(&self) -> usize { self.inner.dim() }
    fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("broken") { anyhow::bail!("cannot encode"); }
        self.inner.embed_text(text)
    }
}

#[test]
fn failing_text_is_skipped_not_fatal() {
    let enc = Flaky { inner: HashingEncoder::new(32), calls: AtomicUsize::new(0) };
    let cache = EmbeddingCache::new();
    let texts = vec!["temple culture".to_string(), "broken text".to_string(), "ramen food".to_string()];
    let out = encode_with_cache(&enc, &cache, &texts);
    assert_eq!(out.vectors.len(), 3);
    assert!(out.vectors[0].is_some() && out.vectors[1].is_none() && out.vectors[2].is_some());
    assert_eq!(out.skipped, 1);
}

#[test]
fn second_pass_is_served_from_cache() {
    let enc = Flaky { inner: HashingEncoder::new(32), calls: AtomicUsize::new(0) };
    let cache = EmbeddingCache::new();
    let texts = vec!["temple culture".to_string(), "ramen food".to_string()];
    let first = encode_with_cache(&enc, &cache, &texts);
    let second = encode_with_cache(&enc, &cache, &texts);
    assert_eq!(enc.calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.cache_hits, 2);
    let a = first.vectors[0].as_ref().unwrap();
    let b = second.vectors[0].as_ref().unwrap();
    assert!((cosine(a, b) - 1.0).abs() < 1e-6);
}

#[test]
fn wrong_dimension_is_skipped() {
    struct Short;
    impl TextEncoder for Short {
        fn id(&self) -> &str { "short" }
        fn dim(&self) -> usize { 4 }
        fn embed_text(&self, _: &str) -> anyhow::Result<Vec<f32>> { Ok(vec![1.0, 0.0]) }
    }
    let out = encode_with_cache(&Short, &EmbeddingCache::new(), &["x".to_string()]);
    assert_eq!(out.skipped, 1);
    assert!(out.vectors[0].is_none());
}
