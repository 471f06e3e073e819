//! nomad-embed
//!
//! Text encoders for the recommendation engine: a MiniLM-style BERT sentence
//! encoder running on candle, a deterministic hashing encoder for tests and
//! offline use, and the process-scoped [`EncoderHandle`].

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};
use twox_hash::XxHash64;

use nomad_core::config::EngineSettings;
use nomad_core::traits::TextEncoder;

pub mod device;
pub mod handle;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use handle::EncoderHandle;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

const MAX_LEN: usize = 256;
const DEFAULT_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";

/// Sentence encoder: BERT forward pass, masked mean pooling, L2 norm.
pub struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
}

impl SentenceEncoder {
    /// Load `tokenizer.json`, `config.json` and `model.safetensors` (or
    /// `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence encoder");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(
            &std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?,
        )?;
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        let dim = config.hidden_size;
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "bert".to_string());
        info!(model = %name, dim, "sentence encoder ready");
        Ok(Self { model, tokenizer, device, id: format!("bert:{}:d{}", name, dim), dim })
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&pickle).with_context(|| format!("reading {}", pickle.display()))?;
    weights
        .into_iter()
        .map(|(name, t)| Ok((name, t.to_device(device)?)))
        .collect()
}

impl TextEncoder for SentenceEncoder {
    fn id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, MAX_LEN, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        anyhow::ensure!(emb.len() == self.dim, "expected {} dims, got {}", self.dim, emb.len());
        if start.elapsed().as_millis() > 100 { debug!(ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

/// Bag-of-words feature hashing into `dim` buckets, L2-normalised.
///
/// Deterministic and model-free: texts sharing words get positive cosine
/// similarity. The empty string maps to the zero vector.
pub struct HashingEncoder {
    dim: usize,
    id: String,
}

impl HashingEncoder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1), id: format!("hashing:xxh64:d{}", dim.max(1)) } }
}

impl TextEncoder for HashingEncoder {
    fn id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        Ok(v)
    }
}

/// Build the lazily-loaded encoder handle described by `settings`.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` or `use_fake_embeddings = true` selects the
/// [`HashingEncoder`]; otherwise the sentence model is loaded from the first
/// model directory that exists.
pub fn encoder_from_settings(settings: &EngineSettings, base: &Path) -> EncoderHandle {
    let use_fake = settings.use_fake_embeddings || fake_requested_by_env();
    if use_fake {
        info!(dim = settings.fake_dim, "using hashing encoder");
        return EncoderHandle::ready(Arc::new(HashingEncoder::new(settings.fake_dim)));
    }
    let configured = settings.model_path(base);
    EncoderHandle::lazy(move || {
        let dir = resolve_model_dir(configured.as_deref())?;
        Ok(Arc::new(SentenceEncoder::load(&dir)?) as Arc<dyn TextEncoder>)
    })
}

fn fake_requested_by_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = configured {
        if p.exists() { return Ok(p.to_path_buf()); }
        warn!(dir = %p.display(), "configured model dir does not exist");
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() { debug!(%var, dir = %p.display(), "model dir from environment"); return Ok(p); }
        }
    }
    for candidate in [DEFAULT_MODEL_DIR.to_string(), format!("../{}", DEFAULT_MODEL_DIR)] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Ok(p); }
    }
    Err(anyhow!("Could not locate sentence encoder model directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

    #[test]
    fn hashing_encoder_is_case_insensitive() {
        let enc = HashingEncoder::new(64);
        let a = enc.embed_text("Temple Tokyo").unwrap();
        let b = enc.embed_text("temple tokyo").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn shared_words_raise_similarity() {
        let enc = HashingEncoder::new(256);
        let q = enc.embed_text("sushi restaurant").unwrap();
        let near = enc.embed_text("famous sushi restaurant ginza").unwrap();
        let far = enc.embed_text("observation tower views").unwrap();
        assert!(cosine(&q, &near) > cosine(&q, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let v = HashingEncoder::new(16).embed_text("").unwrap();
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn missing_model_dir_is_an_error() {
        assert!(SentenceEncoder::load(Path::new("/nonexistent/model")).is_err());
    }
}
