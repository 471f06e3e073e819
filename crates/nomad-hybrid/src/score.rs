//! Per-candidate scoring: similarity blended with preferred-tag overlap.

use nomad_core::config::ScoreWeights;
use nomad_core::types::{Query, ScoredCandidate};
use nomad_text::{LexicalScorer, TokenSet};
use nomad_vector::cosine;

use crate::filter::Admitted;

/// Fraction of the query's preferred tags the candidate carries, in [0, 1].
/// No preferred tags means no overlap.
pub fn tag_overlap(preferred: &[String], tags: &[String]) -> f32 {
    if preferred.is_empty() { return 0.0; }
    let hits = preferred.iter().filter(|p| tags.iter().any(|t| t == *p)).count();
    hits as f32 / preferred.len() as f32
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoreWeights,
}

impl Scorer {
    pub fn new(weights: ScoreWeights) -> Self { Self { weights } }

    pub fn combine(&self, similarity: f32, tag_overlap: f32) -> f32 {
        self.weights.semantic * similarity + self.weights.tags * tag_overlap
    }

    /// Score against precomputed query and candidate vectors.
    pub fn score(&self, admitted: &Admitted<'_>, query_vec: &[f32], item_vec: &[f32], query: &Query) -> ScoredCandidate {
        self.with_similarity(admitted, cosine(query_vec, item_vec), query)
    }

    /// Score by token overlap when no encoder is available.
    pub fn score_lexical(&self, admitted: &Admitted<'_>, query_tokens: &TokenSet, lexical: &LexicalScorer, query: &Query) -> ScoredCandidate {
        let candidate = lexical.tokens(&admitted.item.semantic_text());
        self.with_similarity(admitted, lexical.overlap(query_tokens, &candidate), query)
    }

    pub fn with_similarity(&self, admitted: &Admitted<'_>, similarity: f32, query: &Query) -> ScoredCandidate {
        let overlap = tag_overlap(&query.preferred_tags, &admitted.item.tags);
        ScoredCandidate {
            item: admitted.item.clone(),
            ordinal: admitted.ordinal,
            similarity,
            tag_overlap: overlap,
            combined_score: self.combine(similarity, overlap),
            effective_price: admitted.effective_price,
            passes_constraints: admitted.within_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_core::types::{CandidateItem, Category};
    use std::collections::BTreeMap;

    fn tags(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }

    fn activity(tag_list: &[&str]) -> CandidateItem {
        CandidateItem {
            id: "1".into(),
            category: Category::Activity,
            name: String::new(),
            description: "ancient temple".into(),
            tags: tags(tag_list),
            price: 0.0,
            location: "Tokyo".into(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn overlap_is_fraction_of_preferred() {
        assert_eq!(tag_overlap(&tags(&["culture", "history"]), &tags(&["culture", "food"])), 0.5);
        assert_eq!(tag_overlap(&tags(&["culture"]), &tags(&["culture", "history", "temple"])), 1.0);
        assert_eq!(tag_overlap(&[], &tags(&["culture"])), 0.0);
        assert_eq!(tag_overlap(&tags(&["culture"]), &[]), 0.0);
    }

    #[test]
    fn combined_uses_configured_weights() {
        let scorer = Scorer::default();
        assert!((scorer.combine(0.5, 1.0) - 0.65).abs() < 1e-6);
        let even = Scorer::new(ScoreWeights { semantic: 0.5, tags: 0.5 });
        assert!((even.combine(0.5, 1.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn semantic_score_carries_filter_verdict() {
        let item = activity(&["culture"]);
        let admitted = Admitted { ordinal: 4, item: &item, effective_price: 0.0, within_budget: true };
        let q = Query::new(10.0).unwrap().tags(["culture"]);
        let scored = Scorer::default().score(&admitted, &[1.0, 0.0], &[1.0, 0.0], &q);
        assert_eq!(scored.ordinal, 4);
        assert!(scored.passes_constraints);
        assert!((scored.similarity - 1.0).abs() < 1e-6);
        assert!((scored.combined_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn lexical_score_uses_token_overlap() {
        let item = activity(&["culture"]);
        let admitted = Admitted { ordinal: 0, item: &item, effective_price: 0.0, within_budget: true };
        let lexical = LexicalScorer::default();
        let q = Query::new(10.0).unwrap().text("temple garden");
        let scored = Scorer::default().score_lexical(&admitted, &lexical.tokens(&q.text), &lexical, &q);
        assert!((scored.similarity - 0.5).abs() < 1e-6);
        assert_eq!(scored.tag_overlap, 0.0);
    }
}
