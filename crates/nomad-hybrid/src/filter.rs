//! Hard constraints: location, hotel tier, and the per-category price policy.

use nomad_core::catalog::location_matches;
use nomad_core::policy::PolicyTable;
use nomad_core::types::{CandidateItem, Category, HotelTier, Query};

/// A candidate that matched location and tier, with its budget verdict.
#[derive(Debug, Clone, Copy)]
pub struct Admitted<'a> {
    pub ordinal: usize,
    pub item: &'a CandidateItem,
    pub effective_price: f64,
    pub within_budget: bool,
}

#[derive(Clone, Default)]
pub struct ConstraintFilter {
    policies: PolicyTable,
}

impl ConstraintFilter {
    pub fn new(policies: PolicyTable) -> Self { Self { policies } }

    pub fn policies_mut(&mut self) -> &mut PolicyTable { &mut self.policies }

    /// Every candidate matching location and tier, in catalog order, each
    /// tagged with whether it fits the budget.
    pub fn screen<'a>(&self, category: Category, candidates: &'a [CandidateItem], query: &Query) -> Vec<Admitted<'a>> {
        let policy = self.policies.get(category);
        candidates
            .iter()
            .enumerate()
            .filter(|(_, item)| location_matches(&item.location, query.location.as_deref()))
            .filter(|(_, item)| tier_admits(category, item, query.tier))
            .map(|(ordinal, item)| {
                let effective_price = policy.effective_price(item, query);
                Admitted { ordinal, item, effective_price, within_budget: effective_price <= query.budget }
            })
            .collect()
    }

    /// Location-only screen used for the relaxed fallback list: tier and
    /// budget are not enforced, but the budget verdict is still recorded.
    pub fn relaxed<'a>(&self, category: Category, candidates: &'a [CandidateItem], query: &Query) -> Vec<Admitted<'a>> {
        let policy = self.policies.get(category);
        candidates
            .iter()
            .enumerate()
            .filter(|(_, item)| location_matches(&item.location, query.location.as_deref()))
            .map(|(ordinal, item)| {
                let effective_price = policy.effective_price(item, query);
                Admitted { ordinal, item, effective_price, within_budget: effective_price <= query.budget }
            })
            .collect()
    }

    /// Candidates satisfying every hard constraint.
    pub fn apply<'a>(&self, category: Category, candidates: &'a [CandidateItem], query: &Query) -> Vec<Admitted<'a>> {
        self.screen(category, candidates, query).into_iter().filter(|a| a.within_budget).collect()
    }
}

/// Hotels only: the item's `tier` attribute must equal the requested tier.
/// No preference admits every hotel; items without a recognisable tier pass.
fn tier_admits(category: Category, item: &CandidateItem, wanted: Option<HotelTier>) -> bool {
    let Some(wanted) = wanted else { return true };
    if category != Category::Hotel { return true; }
    match item.attribute("tier").and_then(|t| t.parse::<HotelTier>().ok()) {
        Some(tier) => tier == wanted,
        None => true,
    }
}
