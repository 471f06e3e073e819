//! Whole-trip planning: one recommendation per category under its share of
//! the trip budget.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use nomad_core::allocation::BudgetAllocation;
use nomad_core::error::Result;
use nomad_core::types::{Category, Query};

use crate::{Recommendation, Recommender};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSummary {
    pub found: BTreeMap<Category, usize>,
    pub returned: BTreeMap<Category, usize>,
    pub spent: f64,
    pub total_budget: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripPlan {
    pub allocation: BudgetAllocation,
    pub recommendations: BTreeMap<Category, Recommendation>,
    pub summary: TripSummary,
}

impl Recommender {
    /// Run [`Recommender::recommend`] for every category with a positive
    /// ceiling. The query's own budget is replaced by the category ceiling and
    /// its party size by the allocation's.
    pub async fn plan_trip(&self, query: &Query, allocation: &BudgetAllocation) -> Result<TripPlan> {
        let mut recommendations = BTreeMap::new();
        for category in Category::ALL {
            let ceiling = allocation.ceiling(category);
            if ceiling <= 0.0 {
                debug!(%category, "no budget allocated, skipping");
                continue;
            }
            let scoped = query.with_budget(ceiling)?.people(allocation.people)?;
            recommendations.insert(category, self.recommend(category, &scoped).await?);
        }
        let summary = summarize(&recommendations, allocation.total);
        info!(total = allocation.total, spent = summary.spent, utilization = summary.utilization, "trip planned");
        Ok(TripPlan { allocation: allocation.clone(), recommendations, summary })
    }
}

fn summarize(recommendations: &BTreeMap<Category, Recommendation>, total_budget: f64) -> TripSummary {
    let found = recommendations.iter().map(|(c, r)| (*c, r.ranked.total_found)).collect();
    let returned = recommendations.iter().map(|(c, r)| (*c, r.ranked.len())).collect();
    let spent: f64 = recommendations.values().map(|r| r.ranked.budget.spent).sum();
    let utilization = if total_budget > 0.0 { spent / total_budget } else { 0.0 };
    TripSummary { found, returned, spent, total_budget, utilization }
}
