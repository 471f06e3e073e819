use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use nomad_core::catalog::Catalog;
use nomad_core::config::Config;
use nomad_core::policy::PolicyTable;
use nomad_core::provider::JsonDirProvider;
use nomad_core::types::{Category, HotelTier, Query, QueryRequest};
use nomad_core::Error;

fn sample_data_dir() -> PathBuf { PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data") }

#[test]
fn bundled_catalog_is_valid() {
    let catalog = Catalog::new(JsonDirProvider::new(sample_data_dir()));
    assert_eq!(catalog.preload().unwrap(), 40);
    for category in Category::ALL {
        let items = catalog.load(category).unwrap();
        assert_eq!(items.len(), 10, "{}", category);
        assert!(items.iter().all(|i| i.category == category));
    }
}

#[test]
fn bundled_tokyo_hotels_have_tiers() {
    let catalog = Catalog::new(JsonDirProvider::new(sample_data_dir()));
    let tokyo = catalog.filter_by_location(Category::Hotel, Some("tokyo")).unwrap();
    assert_eq!(tokyo.len(), 5);
    for hotel in &tokyo {
        let tier = hotel.attribute("tier").expect("tier attribute");
        assert!(tier.parse::<HotelTier>().is_ok());
    }
}

#[test]
fn bundled_restaurants_respect_meal_divisor() {
    let catalog = Catalog::new(JsonDirProvider::new(sample_data_dir()));
    let restaurants = catalog.load(Category::Restaurant).unwrap();
    let policies = PolicyTable::default();
    let q = Query::new(90.0).unwrap().location("Paris");
    let admitted: Vec<&str> = restaurants
        .iter()
        .filter(|r| r.location == "Paris" && policies.get(Category::Restaurant).admits(r, &q))
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(admitted, vec!["par-breizh", "par-fallafel"]);
}

#[test]
fn mismatched_category_in_file_is_invalid() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("flights.json"),
        r#"[{"id":"x","category":"hotel","description":"not a flight","price":10,"location":"Tokyo"}]"#,
    )
    .unwrap();
    let catalog = Catalog::new(JsonDirProvider::new(tmp.path()));
    assert!(matches!(catalog.load(Category::Flight), Err(Error::InvalidCatalog(_))));
}

#[test]
fn unreadable_json_is_reported() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("activities.json"), "{ not json").unwrap();
    let catalog = Catalog::new(JsonDirProvider::new(tmp.path()));
    assert!(matches!(catalog.load(Category::Activity), Err(Error::Json(_))));
}

#[test]
fn query_request_from_json() {
    let req: QueryRequest = serde_json::from_str(
        r#"{"text":"food, culture","preferred_tags":["food","culture"],"budget":300,"location":"Tokyo","people_count":2,"tier":"mid-range"}"#,
    )
    .unwrap();
    let q = Query::try_from(req).unwrap();
    assert_eq!(q.people_count, 2);
    assert_eq!(q.tier, Some(HotelTier::MidRange));
    assert_eq!(q.location.as_deref(), Some("Tokyo"));
}

#[test]
fn config_defaults_without_files() {
    let tmp = TempDir::new().unwrap();
    let prev = std::env::current_dir().unwrap();
    std::env::set_current_dir(tmp.path()).unwrap();
    let loaded = Config::load_for_env("test");
    std::env::set_current_dir(prev).unwrap();
    let settings = loaded.unwrap().engine().unwrap();
    assert_eq!(settings.top_k.search_all, 10);
    assert_eq!(settings.encoder_timeout_ms, 5_000);
}
