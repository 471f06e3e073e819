//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_ENGINE__TOP_K__HOTEL=4`). Engine
//! settings live under the `engine` key and every field has a default.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::allocation::AllocationShares;
use crate::error::{Error, Result};
use crate::policy::PricePolicies;
use crate::types::Category;

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name: env_name.to_string() };
        config.validate_for_env()?;
        Ok(config)
    }

    /// Wrap an already assembled figment (tests, embedding callers).
    pub fn from_figment(figment: Figment, env_name: &str) -> Self { Self { figment, env_name: env_name.to_string() } }

    pub fn env_name(&self) -> &str { &self.env_name }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed engine settings; an absent `engine` table yields the defaults.
    pub fn engine(&self) -> Result<EngineSettings> {
        let settings: EngineSettings = if self.figment.contains("engine") {
            self.figment.extract_inner("engine").map_err(|e| Error::InvalidConfig(e.to_string()))?
        } else {
            EngineSettings::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self) -> anyhow::Result<()> {
        let settings = self.engine()?;
        match self.env_name.as_str() {
            "prod" | "production" if settings.use_fake_embeddings => {
                anyhow::bail!("engine.use_fake_embeddings must be false in production")
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub semantic: f32,
    pub tags: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self { Self { semantic: 0.7, tags: 0.3 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopK {
    pub flight: usize,
    pub hotel: usize,
    pub activity: usize,
    pub restaurant: usize,
    pub search_all: usize,
}

impl Default for TopK {
    fn default() -> Self { Self { flight: 3, hotel: 3, activity: 5, restaurant: 5, search_all: 10 } }
}

impl TopK {
    pub fn for_category(&self, category: Category) -> usize {
        match category {
            Category::Flight => self.flight,
            Category::Hotel => self.hotel,
            Category::Activity => self.activity,
            Category::Restaurant => self.restaurant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub weights: ScoreWeights,
    pub top_k: TopK,
    pub encoder_timeout_ms: u64,
    pub policies: PricePolicies,
    pub allocation: AllocationShares,
    pub data_dir: String,
    pub model_dir: Option<String>,
    pub use_fake_embeddings: bool,
    pub fake_dim: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            top_k: TopK::default(),
            encoder_timeout_ms: 5_000,
            policies: PricePolicies::default(),
            allocation: AllocationShares::default(),
            data_dir: "data".to_string(),
            model_dir: None,
            use_fake_embeddings: false,
            fake_dim: 384,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        if !(w.semantic.is_finite() && w.tags.is_finite()) || w.semantic < 0.0 || w.tags < 0.0 || w.semantic + w.tags <= 0.0 {
            return Err(Error::InvalidConfig(format!("weights must be non-negative and not both zero ({} / {})", w.semantic, w.tags)));
        }
        let k = &self.top_k;
        if [k.flight, k.hotel, k.activity, k.restaurant, k.search_all].contains(&0) {
            return Err(Error::InvalidConfig("every top_k value must be at least 1".into()));
        }
        if self.fake_dim == 0 { return Err(Error::InvalidConfig("fake_dim must be at least 1".into())); }
        self.policies.validate()?;
        self.allocation.validate()
    }

    pub fn data_path(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.data_dir) }

    pub fn model_path(&self, base: &Path) -> Option<PathBuf> { self.model_dir.as_ref().map(|d| resolve_with_base(base, d)) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(toml: &str, env_name: &str) -> Config {
        Config::from_figment(Figment::new().merge(Toml::string(toml)), env_name)
    }

    #[test]
    fn missing_engine_table_yields_defaults() {
        let settings = config_from("", "dev").engine().unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.top_k.for_category(Category::Activity), 5);
    }

    #[test]
    fn partial_engine_table_keeps_other_defaults() {
        let settings = config_from("[engine.top_k]\nhotel = 7\n[engine.weights]\nsemantic = 0.5\n", "dev").engine().unwrap();
        assert_eq!(settings.top_k.hotel, 7);
        assert_eq!(settings.top_k.flight, 3);
        assert_eq!(settings.weights.semantic, 0.5);
        assert_eq!(settings.weights.tags, 0.3);
        assert_eq!(settings.policies.hotel.shared_multiplier, 1.5);
    }

    #[test]
    fn zero_top_k_is_invalid() {
        let err = config_from("[engine.top_k]\nflight = 0\n", "dev").engine().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn fake_embeddings_rejected_in_prod() {
        let config = config_from("[engine]\nuse_fake_embeddings = true\n", "prod");
        assert!(config.validate_for_env().is_err());
        assert!(config_from("[engine]\nuse_fake_embeddings = true\n", "dev").validate_for_env().is_ok());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/nomad");
        assert_eq!(resolve_with_base(base, "data"), PathBuf::from("/srv/nomad/data"));
        assert_eq!(resolve_with_base(base, "/abs/data"), PathBuf::from("/abs/data"));
    }
}
