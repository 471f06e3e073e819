//! Domain types shared by the catalog, the scorers and the façade.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The kind of travel item a candidate represents.
///
/// The derived ordering (flight < hotel < activity < restaurant) is the
/// category order used when results from several categories are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Flight,
    Hotel,
    Activity,
    Restaurant,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Flight, Category::Hotel, Category::Activity, Category::Restaurant];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Flight => "flight",
            Category::Hotel => "hotel",
            Category::Activity => "activity",
            Category::Restaurant => "restaurant",
        }
    }

    /// File stem used by directory-backed providers (`flights.json`, ...).
    pub fn plural(self) -> &'static str {
        match self {
            Category::Flight => "flights",
            Category::Hotel => "hotels",
            Category::Activity => "activities",
            Category::Restaurant => "restaurants",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Flight => 0,
            Category::Hotel => 1,
            Category::Activity => 2,
            Category::Restaurant => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lower || c.plural() == lower)
            .ok_or_else(|| Error::MalformedQuery(format!("unknown category '{}'", s)))
    }
}

/// Which part of the catalog a request targets: one category, or every
/// category at once through the unconstrained cross-category search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    One(Category),
    All,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::One(c) => c.fmt(f),
            Selector::All => f.write_str("all"),
        }
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") { return Ok(Selector::All); }
        s.parse().map(Selector::One)
    }
}

impl From<Category> for Selector {
    fn from(c: Category) -> Self { Selector::One(c) }
}

/// Hotel tier ladder: budget < mid-range < luxury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HotelTier {
    #[serde(rename = "budget")]
    Budget,
    #[serde(rename = "mid-range")]
    MidRange,
    #[serde(rename = "luxury")]
    Luxury,
}

impl FromStr for HotelTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Ok(HotelTier::Budget),
            "mid-range" | "midrange" | "mid" => Ok(HotelTier::MidRange),
            "luxury" => Ok(HotelTier::Luxury),
            other => Err(Error::MalformedQuery(format!("unknown hotel tier '{}'", other))),
        }
    }
}

/// A single recommendable item owned by the catalog.
///
/// - `id`: unique within its category
/// - `description` and `tags`: the text the encoder sees
/// - `price`: per person, per night or per activity depending on category
/// - `attributes`: category-specific fields (`cabin_class`, `tier`, `cuisine`)
///   carried through ranking untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,
    pub category: Category,
    #[serde(default)]
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: f64,
    pub location: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl CandidateItem {
    /// Text fed to the encoder: description followed by the space-joined tags.
    pub fn semantic_text(&self) -> String {
        format!("{} {}", self.description, self.tags.join(" "))
    }

    pub fn attribute(&self, key: &str) -> Option<&str> { self.attributes.get(key).map(String::as_str) }
}

/// Loose request shape as it arrives from callers. Every field is optional;
/// [`Query::try_from`] decides what is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub preferred_tags: Vec<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub people_count: Option<u32>,
    #[serde(default)]
    pub tier: Option<String>,
    /// `flight`, `hotel`, `activity`, `restaurant` or `all`.
    #[serde(default)]
    pub category: Option<String>,
}

impl QueryRequest {
    /// The category selector. Missing or blank is a malformed request.
    pub fn selector(&self) -> Result<Selector> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Err(Error::MalformedQuery("category is required".into())),
            Some(c) => c.parse(),
        }
    }
}

/// A validated recommendation query. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub text: String,
    pub preferred_tags: Vec<String>,
    pub budget: f64,
    pub location: Option<String>,
    pub people_count: u32,
    pub tier: Option<HotelTier>,
}

impl Query {
    /// Start a query from its one mandatory field.
    pub fn new(budget: f64) -> Result<Self> {
        validate_budget(budget)?;
        Ok(Self { text: String::new(), preferred_tags: Vec::new(), budget, location: None, people_count: 1, tier: None })
    }

    /// A query with no practical ceiling, for text-only searches.
    pub fn unbounded() -> Self {
        Self { text: String::new(), preferred_tags: Vec::new(), budget: f64::MAX, location: None, people_count: 1, tier: None }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.preferred_tags = normalize_tags(tags);
        self
    }

    pub fn location(mut self, location: impl AsRef<str>) -> Self {
        self.location = normalize_location(Some(location.as_ref()));
        self
    }

    pub fn people(mut self, people_count: u32) -> Result<Self> {
        if people_count == 0 { return Err(Error::MalformedQuery("people_count must be at least 1".into())); }
        self.people_count = people_count;
        Ok(self)
    }

    pub fn tier(mut self, tier: HotelTier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Same query with a different ceiling, used when one intent is fanned
    /// out over several category budgets.
    pub fn with_budget(&self, budget: f64) -> Result<Self> {
        validate_budget(budget)?;
        Ok(Self { budget, ..self.clone() })
    }
}

impl TryFrom<QueryRequest> for Query {
    type Error = Error;

    fn try_from(req: QueryRequest) -> Result<Self> {
        let budget = req.budget.ok_or_else(|| Error::MalformedQuery("budget is required".into()))?;
        let mut query = Query::new(budget)?
            .text(req.text.unwrap_or_default())
            .tags(req.preferred_tags);
        query.location = normalize_location(req.location.as_deref());
        if let Some(people) = req.people_count { query = query.people(people)?; }
        match req.tier.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(t) if t.eq_ignore_ascii_case("any") => {}
            Some(t) => query.tier = Some(t.parse()?),
        }
        Ok(query)
    }
}

fn validate_budget(budget: f64) -> Result<()> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(Error::MalformedQuery(format!("budget must be a positive number, got {}", budget)));
    }
    Ok(())
}

fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) { continue; }
        out.push(tag.to_string());
    }
    out
}

fn normalize_location(location: Option<&str>) -> Option<String> {
    match location.map(str::trim) {
        None | Some("") => None,
        Some(l) if l.eq_ignore_ascii_case("any") => None,
        Some(l) => Some(l.to_string()),
    }
}

/// Which similarity source produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    Semantic,
    Lexical,
}

/// A candidate with its per-request scores. Never cached across queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub item: CandidateItem,
    /// Position of the item in its category's catalog sequence.
    pub ordinal: usize,
    pub similarity: f32,
    pub tag_overlap: f32,
    pub combined_score: f32,
    pub effective_price: f64,
    pub passes_constraints: bool,
}

impl ScoredCandidate {
    pub fn price(&self) -> f64 { self.item.price }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetUtilization {
    pub budget: f64,
    pub spent: f64,
    pub ratio: f64,
}

impl BudgetUtilization {
    pub fn compute(items: &[ScoredCandidate], budget: f64) -> Self {
        let spent: f64 = items.iter().map(ScoredCandidate::price).sum();
        let ratio = if budget > 0.0 { spent / budget } else { 0.0 };
        Self { budget, spent, ratio }
    }
}

/// Ordered, truncated output of the rank aggregator plus summary statistics.
///
/// `total_found` counts candidates that survived filtering (before the top-K
/// cut); `skipped` counts candidates whose text could not be encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub items: Vec<ScoredCandidate>,
    pub total_found: usize,
    pub skipped: usize,
    pub mode: ScoringMode,
    pub budget: BudgetUtilization,
}

impl RankedResult {
    pub fn empty(mode: ScoringMode, budget: f64) -> Self {
        Self { items: Vec::new(), total_found: 0, skipped: 0, mode, budget: BudgetUtilization::compute(&[], budget) }
    }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn ids(&self) -> Vec<&str> { self.items.iter().map(|c| c.item.id.as_str()).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_singular_and_plural() {
        assert_eq!("Hotels".parse::<Category>().unwrap(), Category::Hotel);
        assert_eq!("activity".parse::<Category>().unwrap(), Category::Activity);
        assert!("cruise".parse::<Category>().is_err());
    }

    #[test]
    fn selector_parses_all_and_categories() {
        assert_eq!("all".parse::<Selector>().unwrap(), Selector::All);
        assert_eq!(" ALL ".parse::<Selector>().unwrap(), Selector::All);
        assert_eq!("hotels".parse::<Selector>().unwrap(), Selector::One(Category::Hotel));
        assert!("cruise".parse::<Selector>().is_err());
        assert_eq!(Selector::All.to_string(), "all");
    }

    #[test]
    fn missing_category_is_malformed() {
        let req = QueryRequest { budget: Some(100.0), ..Default::default() };
        assert!(matches!(req.selector(), Err(Error::MalformedQuery(_))));
        let blank = QueryRequest { category: Some("  ".into()), ..req.clone() };
        assert!(matches!(blank.selector(), Err(Error::MalformedQuery(_))));
        let hotel = QueryRequest { category: Some("hotel".into()), ..req };
        assert_eq!(hotel.selector().unwrap(), Selector::One(Category::Hotel));
    }

    #[test]
    fn any_tier_means_no_preference() {
        let req = QueryRequest { budget: Some(100.0), tier: Some("Any".into()), ..Default::default() };
        assert_eq!(Query::try_from(req).unwrap().tier, None);
        let lux = QueryRequest { budget: Some(100.0), tier: Some("luxury".into()), ..Default::default() };
        assert_eq!(Query::try_from(lux).unwrap().tier, Some(HotelTier::Luxury));
    }

    #[test]
    fn request_without_budget_is_malformed() {
        let err = Query::try_from(QueryRequest::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedQuery(_)));
    }

    #[test]
    fn request_defaults_tags_location_and_people() {
        let req = QueryRequest { budget: Some(100.0), location: Some("Any".into()), ..Default::default() };
        let q = Query::try_from(req).unwrap();
        assert!(q.preferred_tags.is_empty());
        assert_eq!(q.location, None);
        assert_eq!(q.people_count, 1);
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let q = Query::new(10.0).unwrap().tags([" food", "food", "", "culture"]);
        assert_eq!(q.preferred_tags, vec!["food".to_string(), "culture".to_string()]);
    }

    #[test]
    fn zero_people_and_negative_budget_rejected() {
        assert!(Query::new(-1.0).is_err());
        assert!(Query::new(f64::NAN).is_err());
        assert!(Query::new(10.0).unwrap().people(0).is_err());
    }

    #[test]
    fn semantic_text_joins_description_and_tags() {
        let item = CandidateItem {
            id: "1".into(),
            category: Category::Activity,
            name: "Senso-ji".into(),
            description: "temple".into(),
            tags: vec!["culture".into(), "history".into()],
            price: 0.0,
            location: "Tokyo".into(),
            attributes: BTreeMap::new(),
        };
        assert_eq!(item.semantic_text(), "temple culture history");
    }
}
