//! nomad-core
//!
//! Data model, error taxonomy and capability traits shared by the
//! recommendation engine crates, plus the candidate catalog, the per-category
//! price policy table and the figment-based configuration loader.

pub mod allocation;
pub mod catalog;
pub mod config;
pub mod error;
pub mod policy;
pub mod provider;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use types::{CandidateItem, Category, Query, QueryRequest, RankedResult, ScoredCandidate, ScoringMode, Selector};
