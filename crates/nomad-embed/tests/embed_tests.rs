use std::path::Path;

use nomad_core::config::EngineSettings;
use nomad_embed::encoder_from_settings;

#[test]
fn fake_encoder_shapes_and_determinism() {
    let settings = EngineSettings { use_fake_embeddings: true, fake_dim: 384, ..EngineSettings::default() };
    let handle = encoder_from_settings(&settings, Path::new("."));
    assert!(handle.is_initialised(), "hashing encoder needs no load step");
    let encoder = handle.get().expect("encoder");

    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = encoder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim follows fake_dim");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn missing_model_reports_unavailable() {
    let settings = EngineSettings { model_dir: Some("/nonexistent/minilm".into()), ..EngineSettings::default() };
    // Only meaningful when no model is installed next to the tests.
    if std::env::var("APP_MODEL_DIR").is_ok() || Path::new("models/all-MiniLM-L6-v2").exists() { return; }
    if std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok() { return; }
    let handle = encoder_from_settings(&settings, Path::new("."));
    assert!(matches!(handle.get(), Err(nomad_core::Error::EncoderUnavailable(_))));
}
