//! Immutable, load-once candidate catalog.
//!
//! Each category is read from the provider on first use, validated, and kept
//! for the lifetime of the catalog. Later calls hand out the same `Arc`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::info;

use crate::error::{Error, Result};
use crate::traits::CandidateProvider;
use crate::types::{CandidateItem, Category};

pub struct Catalog {
    provider: Box<dyn CandidateProvider>,
    slots: [OnceLock<Arc<[CandidateItem]>>; 4],
    loading: [Mutex<()>; 4],
}

impl Catalog {
    pub fn new<P: CandidateProvider + 'static>(provider: P) -> Self { Self::from_boxed(Box::new(provider)) }

    pub fn from_boxed(provider: Box<dyn CandidateProvider>) -> Self {
        Self { provider, slots: Default::default(), loading: Default::default() }
    }

    /// Items for `category` in provider order. Concurrent first calls wait on
    /// one provider read. A provider failure is not cached, so the next call
    /// tries again.
    pub fn load(&self, category: Category) -> Result<Arc<[CandidateItem]>> {
        let slot = &self.slots[category.index()];
        if let Some(items) = slot.get() { return Ok(Arc::clone(items)); }
        let _guard = self.loading[category.index()].lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(items) = slot.get() { return Ok(Arc::clone(items)); }
        let items = self.provider.load(category).map_err(|e| match e.downcast::<Error>() {
            Ok(err) => err,
            Err(other) => Error::Provider(format!("{:#}", other)),
        })?;
        validate(category, &items)?;
        info!(%category, count = items.len(), provider = self.provider.name(), "catalog loaded");
        Ok(Arc::clone(slot.get_or_init(|| items.into())))
    }

    /// Load every category up front. Returns the total item count.
    pub fn preload(&self) -> Result<usize> {
        Category::ALL.iter().try_fold(0, |acc, c| Ok(acc + self.load(*c)?.len()))
    }

    pub fn filter_by_location(&self, category: Category, location: Option<&str>) -> Result<Vec<CandidateItem>> {
        let items = self.load(category)?;
        Ok(filter_by_location(&items, location).into_iter().map(|(_, item)| item.clone()).collect())
    }
}

/// Case-insensitive prefix match; `None` matches every location.
pub fn location_matches(candidate: &str, wanted: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(w) => candidate.to_lowercase().starts_with(&w.to_lowercase()),
    }
}

/// Subsequence of `items` whose location matches, paired with each item's
/// catalog ordinal.
pub fn filter_by_location<'a>(items: &'a [CandidateItem], location: Option<&str>) -> Vec<(usize, &'a CandidateItem)> {
    items.iter().enumerate().filter(|(_, item)| location_matches(&item.location, location)).collect()
}

fn validate(category: Category, items: &[CandidateItem]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in items {
        if item.category != category {
            return Err(Error::InvalidCatalog(format!("item '{}' is a {}, expected {}", item.id, item.category, category)));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(Error::InvalidCatalog(format!("item '{}' has invalid price {}", item.id, item.price)));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(Error::InvalidCatalog(format!("duplicate {} id '{}'", category, item.id)));
        }
    }
    Ok(())
}
