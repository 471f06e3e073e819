//! Splitting a trip budget into per-category ceilings.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Category;

/// Fraction of the trip budget assigned to each category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationShares {
    pub flight: f64,
    pub hotel: f64,
    pub activity: f64,
    pub restaurant: f64,
    pub transport: f64,
}

impl Default for AllocationShares {
    fn default() -> Self { Self { flight: 0.40, hotel: 0.30, activity: 0.20, restaurant: 0.08, transport: 0.02 } }
}

impl AllocationShares {
    pub fn share(&self, category: Category) -> f64 {
        match category {
            Category::Flight => self.flight,
            Category::Hotel => self.hotel,
            Category::Activity => self.activity,
            Category::Restaurant => self.restaurant,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.flight, self.hotel, self.activity, self.restaurant, self.transport];
        if all.iter().any(|s| !s.is_finite() || !(0.0..=1.0).contains(s)) {
            return Err(Error::InvalidConfig("allocation shares must lie within [0, 1]".into()));
        }
        let total: f64 = all.iter().sum();
        if total > 1.0 + 1e-9 {
            return Err(Error::InvalidConfig(format!("allocation shares sum to {:.3}, more than 1", total)));
        }
        Ok(())
    }
}

/// Ceilings derived from a total trip budget.
///
/// Category amounts are group totals: the price policies already account for
/// party size (flight per-person pricing, shared hotel rooms).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAllocation {
    pub total: f64,
    pub people: u32,
    pub per_person: f64,
    pub flight: f64,
    pub hotel: f64,
    pub activity: f64,
    pub restaurant: f64,
    pub transport: f64,
}

impl BudgetAllocation {
    pub fn split(total: f64, people: u32, shares: &AllocationShares) -> Result<Self> {
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::MalformedQuery(format!("trip budget must be a positive number, got {}", total)));
        }
        if people == 0 { return Err(Error::MalformedQuery("people_count must be at least 1".into())); }
        shares.validate()?;
        Ok(Self {
            total,
            people,
            per_person: total / f64::from(people),
            flight: total * shares.flight,
            hotel: total * shares.hotel,
            activity: total * shares.activity,
            restaurant: total * shares.restaurant,
            transport: total * shares.transport,
        })
    }

    pub fn ceiling(&self, category: Category) -> f64 {
        match category {
            Category::Flight => self.flight,
            Category::Hotel => self.hotel,
            Category::Activity => self.activity,
            Category::Restaurant => self.restaurant,
        }
    }
}
