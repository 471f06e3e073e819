//! Price adjustment rules per category.
//!
//! A [`PricePolicy`] folds the room-sharing premium, the per-person flight
//! total and the meals-per-day divisor into one effective price so a single
//! `effective_price <= budget` comparison covers every category.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::traits::PriceAdjustmentPolicy;
use crate::types::{CandidateItem, Category, Query};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePolicy {
    /// Applied when more than one person travels (shared room premium).
    #[serde(default = "one")]
    pub shared_multiplier: f64,
    /// Multiply the price by the party size.
    #[serde(default)]
    pub per_person: bool,
    /// The budget is spread over this many units (e.g. three meals a day).
    #[serde(default = "one")]
    pub budget_divisor: f64,
}

fn one() -> f64 { 1.0 }

impl PricePolicy {
    pub const DIRECT: PricePolicy = PricePolicy { shared_multiplier: 1.0, per_person: false, budget_divisor: 1.0 };

    pub fn validate(&self, category: Category) -> Result<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.shared_multiplier) || !ok(self.budget_divisor) {
            return Err(Error::InvalidConfig(format!(
                "{} policy: multiplier and divisor must be positive (got {} / {})",
                category, self.shared_multiplier, self.budget_divisor
            )));
        }
        Ok(())
    }
}

impl PriceAdjustmentPolicy for PricePolicy {
    fn effective_price(&self, item: &CandidateItem, query: &Query) -> f64 {
        let mut price = item.price;
        if query.people_count > 1 { price *= self.shared_multiplier; }
        if self.per_person { price *= f64::from(query.people_count); }
        price * self.budget_divisor
    }
}

/// Configured policy values for the four categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricePolicies {
    pub flight: PricePolicy,
    pub hotel: PricePolicy,
    pub activity: PricePolicy,
    pub restaurant: PricePolicy,
}

impl Default for PricePolicies {
    fn default() -> Self {
        Self {
            flight: PricePolicy { per_person: true, ..PricePolicy::DIRECT },
            hotel: PricePolicy { shared_multiplier: 1.5, ..PricePolicy::DIRECT },
            activity: PricePolicy::DIRECT,
            restaurant: PricePolicy { budget_divisor: 3.0, ..PricePolicy::DIRECT },
        }
    }
}

impl PricePolicies {
    pub fn get(&self, category: Category) -> &PricePolicy {
        match category {
            Category::Flight => &self.flight,
            Category::Hotel => &self.hotel,
            Category::Activity => &self.activity,
            Category::Restaurant => &self.restaurant,
        }
    }

    pub fn validate(&self) -> Result<()> {
        Category::ALL.iter().try_for_each(|c| self.get(*c).validate(*c))
    }
}

/// Pluggable policy per category. Starts from configured [`PricePolicy`]
/// values; any slot can be replaced with a custom implementation.
#[derive(Clone)]
pub struct PolicyTable {
    slots: [Arc<dyn PriceAdjustmentPolicy>; 4],
}

impl PolicyTable {
    pub fn set(&mut self, category: Category, policy: Arc<dyn PriceAdjustmentPolicy>) {
        self.slots[category.index()] = policy;
    }

    pub fn get(&self, category: Category) -> &dyn PriceAdjustmentPolicy { self.slots[category.index()].as_ref() }
}

impl From<&PricePolicies> for PolicyTable {
    fn from(p: &PricePolicies) -> Self {
        let slot = |policy: PricePolicy| -> Arc<dyn PriceAdjustmentPolicy> { Arc::new(policy) };
        Self { slots: [slot(p.flight), slot(p.hotel), slot(p.activity), slot(p.restaurant)] }
    }
}

impl Default for PolicyTable {
    fn default() -> Self { Self::from(&PricePolicies::default()) }
}
