//! Rank aggregation: a total, deterministic order and the top-K cut.

use std::cmp::Ordering;

use nomad_core::types::{BudgetUtilization, RankedResult, ScoredCandidate, ScoringMode};

/// Combined score descending, then cheaper first, then catalog order.
pub fn by_combined(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.combined_score
        .total_cmp(&a.combined_score)
        .then_with(|| a.price().total_cmp(&b.price()))
        .then_with(|| a.ordinal.cmp(&b.ordinal))
}

/// Similarity descending, then cheaper first, then category and catalog order.
pub fn by_similarity(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.price().total_cmp(&b.price()))
        .then_with(|| a.item.category.cmp(&b.item.category))
        .then_with(|| a.ordinal.cmp(&b.ordinal))
}

pub fn top_k(mut scored: Vec<ScoredCandidate>, k: usize) -> Vec<ScoredCandidate> {
    scored.sort_by(by_combined);
    scored.truncate(k);
    scored
}

/// Order `scored`, keep the best `k`, and attach the summary statistics.
/// `total_found` counts every constraint survivor, skipped ones included.
pub fn rank(scored: Vec<ScoredCandidate>, k: usize, skipped: usize, mode: ScoringMode, budget: f64) -> RankedResult {
    let total_found = scored.len() + skipped;
    let items = top_k(scored, k);
    let budget = BudgetUtilization::compute(&items, budget);
    RankedResult { items, total_found, skipped, mode, budget }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_core::types::{CandidateItem, Category};
    use std::collections::BTreeMap;

    fn scored(id: &str, ordinal: usize, combined: f32, price: f64) -> ScoredCandidate {
        ScoredCandidate {
            item: CandidateItem {
                id: id.into(),
                category: Category::Restaurant,
                name: String::new(),
                description: String::new(),
                tags: vec![],
                price,
                location: "Paris".into(),
                attributes: BTreeMap::new(),
            },
            ordinal,
            similarity: combined,
            tag_overlap: 0.0,
            combined_score: combined,
            effective_price: price,
            passes_constraints: true,
        }
    }

    #[test]
    fn ties_break_on_price_then_ordinal() {
        let input = vec![scored("a", 0, 0.5, 40.0), scored("b", 1, 0.5, 20.0), scored("c", 2, 0.9, 90.0), scored("d", 3, 0.5, 20.0)];
        let result = rank(input, 10, 0, ScoringMode::Semantic, 100.0);
        assert_eq!(result.ids(), vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn truncates_to_k_and_reports_total() {
        let input = (0..8).map(|i| scored(&i.to_string(), i, i as f32 / 10.0, 10.0)).collect();
        let result = rank(input, 3, 2, ScoringMode::Lexical, 100.0);
        assert_eq!(result.ids(), vec!["7", "6", "5"]);
        assert_eq!(result.total_found, 10);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.mode, ScoringMode::Lexical);
        assert!((result.budget.spent - 30.0).abs() < 1e-9);
        assert!((result.budget.ratio - 0.3).abs() < 1e-9);
    }

    #[test]
    fn input_order_does_not_change_output() {
        let forward = vec![scored("a", 0, 0.3, 5.0), scored("b", 1, 0.3, 5.0), scored("c", 2, 0.7, 5.0)];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(top_k(forward, 3), top_k(reversed, 3));
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let result = rank(Vec::new(), 5, 0, ScoringMode::Semantic, 50.0);
        assert!(result.is_empty());
        assert_eq!(result.budget.spent, 0.0);
    }
}
