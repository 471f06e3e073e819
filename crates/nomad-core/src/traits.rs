use crate::types::{CandidateItem, Category, Query};

/// Maps text to a fixed-dimension dense vector.
///
/// Implementations must be deterministic for a given `id()` and must return a
/// finite vector (possibly all zeros) for the empty string.
pub trait TextEncoder: Send + Sync {
    /// Stable identifier for the model/version, used as a cache key.
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

/// Source of candidate items for one category: mock data, files or a live API.
pub trait CandidateProvider: Send + Sync {
    fn name(&self) -> &str;
    /// Items in a stable order. An empty vector is a valid answer.
    fn load(&self, category: Category) -> anyhow::Result<Vec<CandidateItem>>;
}

/// Category-specific business rule that turns an item's listed price into the
/// amount compared against the query budget.
pub trait PriceAdjustmentPolicy: Send + Sync {
    fn effective_price(&self, item: &CandidateItem, query: &Query) -> f64;

    fn admits(&self, item: &CandidateItem, query: &Query) -> bool {
        self.effective_price(item, query) <= query.budget
    }
}
