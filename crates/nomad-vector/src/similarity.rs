pub fn l2_norm(v: &[f32]) -> f32 { v.iter().map(|x| x * x).sum::<f32>().sqrt() }

/// Cosine similarity in `[-1, 1]`. Zero-norm inputs, length mismatches and
/// non-finite results score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() { return 0.0; }
    let na = l2_norm(a);
    let nb = l2_norm(b);
    if na == 0.0 || nb == 0.0 { return 0.0; }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let sim = dot / (na * nb);
    if sim.is_finite() { sim.clamp(-1.0, 1.0) } else { 0.0 }
}
