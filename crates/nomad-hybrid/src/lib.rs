//! nomad-hybrid
//!
//! The recommendation façade. Per category it loads the catalog, applies the
//! hard constraints, scores survivors semantically (or lexically when the
//! encoder cannot answer in time) and keeps a deterministic top-K.
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use nomad_core::catalog::Catalog;
use nomad_core::config::{EngineSettings, TopK};
use nomad_core::error::{Error, Result};
use nomad_core::policy::PolicyTable;
use nomad_core::traits::PriceAdjustmentPolicy;
use nomad_core::types::{BudgetUtilization, Category, Query, QueryRequest, RankedResult, ScoredCandidate, ScoringMode, Selector};
use nomad_embed::EncoderHandle;
use nomad_text::LexicalScorer;
use nomad_vector::{encode_with_cache, EmbeddingCache, EncodedTexts};

pub mod filter;
pub mod plan;
pub mod rank;
pub mod score;

pub use filter::{Admitted, ConstraintFilter};
pub use plan::{TripPlan, TripSummary};
pub use score::{tag_overlap, Scorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Ranked,
    EmptyCatalog,
    NoneWithinConstraints,
}

/// Best location matches with the budget ignored. Never merged into the
/// constrained list; items here generally fail the budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelaxedResult {
    pub relaxed: &'static str,
    pub items: Vec<ScoredCandidate>,
    pub skipped: usize,
    pub mode: ScoringMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: Category,
    pub status: RecommendationStatus,
    pub ranked: RankedResult,
    pub fallback: Option<RelaxedResult>,
}

impl Recommendation {
    fn without_results(category: Category, status: RecommendationStatus, budget: f64, fallback: Option<RelaxedResult>) -> Self {
        let mode = fallback.as_ref().map_or(ScoringMode::Semantic, |f| f.mode);
        Self { category, status, ranked: RankedResult::empty(mode, budget), fallback }
    }
}

/// Cross-category text search. `hits` is the global top-N by similarity;
/// `by_category` regroups those same hits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchAll {
    pub hits: Vec<ScoredCandidate>,
    pub by_category: BTreeMap<Category, RankedResult>,
    pub total_considered: usize,
    pub skipped: usize,
    pub mode: ScoringMode,
}

/// Answer to a [`QueryRequest`], shaped by its category selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    Category(Recommendation),
    All(SearchAll),
}

struct Scored {
    items: Vec<ScoredCandidate>,
    skipped: usize,
    mode: ScoringMode,
}

/// Shared, read-only engine. Cheap to wrap in an `Arc` and call from many
/// tasks at once.
pub struct Recommender {
    catalog: Arc<Catalog>,
    encoder: Arc<EncoderHandle>,
    cache: Arc<EmbeddingCache>,
    lexical: LexicalScorer,
    filter: ConstraintFilter,
    scorer: Scorer,
    top_k: TopK,
    encoder_timeout: Duration,
}

impl Recommender {
    pub fn new(catalog: Arc<Catalog>, encoder: Arc<EncoderHandle>, settings: &EngineSettings) -> Self {
        Self {
            catalog,
            encoder,
            cache: Arc::new(EmbeddingCache::new()),
            lexical: LexicalScorer::new(),
            filter: ConstraintFilter::new(PolicyTable::from(&settings.policies)),
            scorer: Scorer::new(settings.weights.clone()),
            top_k: settings.top_k.clone(),
            encoder_timeout: Duration::from_millis(settings.encoder_timeout_ms),
        }
    }

    /// Replace the price rule for one category.
    pub fn with_policy(mut self, category: Category, policy: Arc<dyn PriceAdjustmentPolicy>) -> Self {
        self.filter.policies_mut().set(category, policy);
        self
    }

    /// Load the catalog and the encoder up front. An encoder that fails to
    /// load is not an error here; requests will score lexically.
    pub async fn warm_up(&self) -> Result<usize> {
        let items = self.catalog.preload()?;
        let encoder = Arc::clone(&self.encoder);
        match tokio::task::spawn_blocking(move || encoder.warm_up()).await {
            Ok(Ok(())) => info!(items, "engine ready"),
            Ok(Err(e)) => warn!(error = %e, items, "engine ready without encoder"),
            Err(e) => warn!(error = %e, "encoder warm-up task failed"),
        }
        Ok(items)
    }

    /// Validate a loose request and route it: one category goes through
    /// [`Recommender::recommend`], `all` through [`Recommender::search_all`].
    /// A budget is optional for `all` since that search applies no filters.
    pub async fn respond(&self, request: QueryRequest) -> Result<Response> {
        match request.selector()? {
            Selector::One(category) => {
                let query = Query::try_from(request)?;
                Ok(Response::Category(self.recommend(category, &query).await?))
            }
            Selector::All => {
                let query = if request.budget.is_some() {
                    Query::try_from(request)?
                } else {
                    Query::unbounded().text(request.text.unwrap_or_default()).tags(request.preferred_tags)
                };
                Ok(Response::All(self.search_all(&query).await?))
            }
        }
    }

    /// Rank one category's candidates for `query`.
    pub async fn recommend(&self, category: Category, query: &Query) -> Result<Recommendation> {
        let items = self.catalog.load(category)?;
        if items.is_empty() {
            debug!(%category, "catalog is empty");
            return Ok(Recommendation::without_results(category, RecommendationStatus::EmptyCatalog, query.budget, None));
        }
        let k = self.top_k.for_category(category);

        let admitted = self.filter.apply(category, &items, query);
        if !admitted.is_empty() {
            let scored = self.score_all(&admitted, query).await;
            let ranked = rank::rank(scored.items, k, scored.skipped, scored.mode, query.budget);
            info!(%category, found = ranked.total_found, returned = ranked.len(), skipped = ranked.skipped, mode = ?ranked.mode, "recommendation ranked");
            return Ok(Recommendation { category, status: RecommendationStatus::Ranked, ranked, fallback: None });
        }

        let relaxed = self.filter.relaxed(category, &items, query);
        let fallback = if relaxed.is_empty() {
            None
        } else {
            let scored = self.score_all(&relaxed, query).await;
            let items = rank::top_k(scored.items, k);
            (!items.is_empty()).then_some(RelaxedResult { relaxed: "budget", items, skipped: scored.skipped, mode: scored.mode })
        };
        info!(%category, budget = query.budget, fallback = fallback.as_ref().map_or(0, |f| f.items.len()), "nothing within constraints");
        Ok(Recommendation::without_results(category, RecommendationStatus::NoneWithinConstraints, query.budget, fallback))
    }

    /// Semantic search over every category with no constraints applied.
    pub async fn search_all(&self, query: &Query) -> Result<SearchAll> {
        let mut catalogs = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            catalogs.push((category, self.catalog.load(category)?));
        }
        let admitted: Vec<Admitted<'_>> = catalogs
            .iter()
            .flat_map(|(_, items)| {
                items.iter().enumerate().map(|(ordinal, item)| Admitted { ordinal, item, effective_price: item.price, within_budget: true })
            })
            .collect();
        let total_considered = admitted.len();
        let scored = self.score_all(&admitted, query).await;

        let mut scored_per_category: BTreeMap<Category, usize> = BTreeMap::new();
        for c in &scored.items {
            *scored_per_category.entry(c.item.category).or_default() += 1;
        }
        let mut hits = scored.items;
        hits.sort_by(rank::by_similarity);
        hits.truncate(self.top_k.search_all);

        let mut by_category = BTreeMap::new();
        for (category, items) in &catalogs {
            let scored_here = scored_per_category.get(category).copied().unwrap_or(0);
            let group: Vec<ScoredCandidate> = hits.iter().filter(|h| h.item.category == *category).cloned().collect();
            by_category.insert(
                *category,
                RankedResult {
                    budget: BudgetUtilization::compute(&group, query.budget),
                    items: group,
                    total_found: items.len(),
                    skipped: items.len() - scored_here,
                    mode: scored.mode,
                },
            );
        }
        info!(considered = total_considered, returned = hits.len(), skipped = scored.skipped, mode = ?scored.mode, "search across categories");
        Ok(SearchAll { hits, by_category, total_considered, skipped: scored.skipped, mode: scored.mode })
    }

    async fn score_all(&self, admitted: &[Admitted<'_>], query: &Query) -> Scored {
        if admitted.is_empty() {
            return Scored { items: Vec::new(), skipped: 0, mode: ScoringMode::Semantic };
        }
        let texts: Vec<String> = admitted.iter().map(|a| a.item.semantic_text()).collect();
        match self.encode(&query.text, texts).await {
            Ok((query_vec, encoded)) => {
                let items = admitted
                    .iter()
                    .zip(&encoded.vectors)
                    .filter_map(|(a, v)| v.as_ref().map(|v| self.scorer.score(a, &query_vec, v, query)))
                    .collect();
                Scored { items, skipped: encoded.skipped, mode: ScoringMode::Semantic }
            }
            Err(e) => {
                warn!(error = %e, candidates = admitted.len(), "falling back to lexical scoring");
                let query_tokens = self.lexical.tokens(&query.text);
                let items = admitted.iter().map(|a| self.scorer.score_lexical(a, &query_tokens, &self.lexical, query)).collect();
                Scored { items, skipped: 0, mode: ScoringMode::Lexical }
            }
        }
    }

    /// Query vector plus candidate vectors, computed off the async runtime
    /// and bounded by the encoder timeout.
    async fn encode(&self, text: &str, texts: Vec<String>) -> Result<(Vec<f32>, EncodedTexts)> {
        let encoder = Arc::clone(&self.encoder);
        let cache = Arc::clone(&self.cache);
        let text = text.to_string();
        let task = tokio::task::spawn_blocking(move || -> Result<(Vec<f32>, EncodedTexts)> {
            let encoder = encoder.get()?;
            let query_vec = encoder.embed_text(&text).map_err(|e| Error::EncoderUnavailable(format!("query: {:#}", e)))?;
            if query_vec.len() != encoder.dim() || !query_vec.iter().all(|x| x.is_finite()) {
                return Err(Error::EncoderUnavailable(format!("malformed query vector from {}", encoder.id())));
            }
            Ok((query_vec, encode_with_cache(encoder.as_ref(), &cache, &texts)))
        });
        match tokio::time::timeout(self.encoder_timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Err(Error::EncoderUnavailable(format!("encoder task failed: {}", e))),
            Err(_) => Err(Error::EncoderUnavailable(format!("timed out after {} ms", self.encoder_timeout.as_millis()))),
        }
    }
}
