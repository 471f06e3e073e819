//! Candidate providers: in-memory items and a directory of JSON files.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Error;
use crate::traits::CandidateProvider;
use crate::types::{CandidateItem, Category};

/// Serves a fixed list of items, preserving insertion order per category.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    items: Vec<CandidateItem>,
}

impl InMemoryProvider {
    pub fn new(items: Vec<CandidateItem>) -> Self { Self { items } }

    pub fn push(&mut self, item: CandidateItem) { self.items.push(item); }
}

impl CandidateProvider for InMemoryProvider {
    fn name(&self) -> &str { "memory" }

    fn load(&self, category: Category) -> Result<Vec<CandidateItem>> {
        Ok(self.items.iter().filter(|i| i.category == category).cloned().collect())
    }
}

/// Reads `<dir>/flights.json`, `<dir>/hotels.json`, ... Each file holds a
/// JSON array of items; the `category` field may be omitted.
#[derive(Debug, Clone)]
pub struct JsonDirProvider {
    dir: PathBuf,
}

#[derive(Deserialize)]
struct RawItem {
    id: String,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    name: String,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    price: f64,
    location: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl JsonDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn file_for(&self, category: Category) -> PathBuf { self.dir.join(format!("{}.json", category.plural())) }
}

impl CandidateProvider for JsonDirProvider {
    fn name(&self) -> &str { "json-dir" }

    fn load(&self, category: Category) -> Result<Vec<CandidateItem>> {
        let path = self.file_for(category);
        if !path.exists() {
            warn!(path = %path.display(), %category, "catalog file not found, category is empty");
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path).map_err(Error::from)?;
        let raw: Vec<RawItem> = serde_json::from_str(&content).map_err(Error::from)?;
        debug!(path = %path.display(), count = raw.len(), "read catalog file");
        raw.into_iter()
            .map(|r| {
                let declared = r.category.unwrap_or(category);
                if declared != category {
                    return Err(anyhow::Error::from(Error::InvalidCatalog(format!(
                        "item '{}' in {} is declared as {}",
                        r.id,
                        path.display(),
                        declared
                    ))));
                }
                Ok(CandidateItem {
                    id: r.id,
                    category,
                    name: r.name,
                    description: r.description,
                    tags: r.tags,
                    price: r.price,
                    location: r.location,
                    attributes: r.attributes,
                })
            })
            .collect()
    }
}
