//! Office catalog validation, season dates and data-file loading.

use cursus_core::{
    config::{load_roster, ElectionSeasonConfig, PoliticsConfig},
    error::SimError,
    office::{Assembly, OfficeCatalog, OfficeDefinition},
};
use std::collections::BTreeSet;

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");

fn office(id: &str, seats: u32, term: u32, prereqs: &[&str]) -> OfficeDefinition {
    OfficeDefinition {
        id: id.into(),
        name: id.to_uppercase(),
        assembly: Assembly::Tribal,
        min_age: 30,
        term_length_years: term,
        seats,
        reelection_gap_years: 0,
        rank: 1,
        prerequisites_all: prereqs.iter().map(|p| p.to_string()).collect::<BTreeSet<_>>(),
    }
}

fn rejection(definitions: Vec<OfficeDefinition>) -> String {
    match OfficeCatalog::new(definitions) {
        Err(SimError::Validation { reason }) => reason,
        Err(other) => panic!("expected a validation error, got {other}"),
        Ok(_) => panic!("catalog should have been rejected"),
    }
}

#[test]
fn default_ladder_is_valid_and_ordered() {
    let catalog = PoliticsConfig::default_test().catalog().expect("catalog");
    let ids: Vec<&str> = catalog.definitions().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["quaestor", "tribune", "aedile", "praetor", "consul", "censor"]);
    assert_eq!(catalog.name_of("tribune"), Some("Tribune of the Plebs"));
    assert!(catalog.get("dictator").is_none());
}

#[test]
fn duplicate_ids_are_rejected() {
    let reason = rejection(vec![office("a", 1, 1, &[]), office("a", 2, 1, &[])]);
    assert!(reason.contains("duplicate"), "{reason}");
}

#[test]
fn zero_seats_and_zero_terms_are_rejected() {
    let reason = rejection(vec![office("a", 0, 1, &[])]);
    assert!(reason.contains("seat"), "{reason}");
    let reason = rejection(vec![office("a", 1, 0, &[])]);
    assert!(reason.contains("term"), "{reason}");
}

#[test]
fn blank_id_is_rejected() {
    let reason = rejection(vec![office("  ", 1, 1, &[])]);
    assert!(reason.contains("empty id"), "{reason}");
}

#[test]
fn prerequisites_must_name_other_known_offices() {
    let reason = rejection(vec![office("a", 1, 1, &["ghost"])]);
    assert!(reason.contains("unknown office 'ghost'"), "{reason}");
    let reason = rejection(vec![office("a", 1, 1, &["a"])]);
    assert!(reason.contains("itself"), "{reason}");
}

#[test]
fn prerequisite_order_in_the_list_does_not_matter() {
    let catalog = OfficeCatalog::new(vec![office("b", 1, 1, &["a"]), office("a", 1, 1, &[])]).expect("catalog");
    assert_eq!(catalog.len(), 2);
}

#[test]
fn season_dates_are_checked_against_the_calendar() {
    assert!(ElectionSeasonConfig::default().validate().is_ok());

    let outside = ElectionSeasonConfig { open_month: 13, ..ElectionSeasonConfig::default() };
    assert!(matches!(outside.validate(), Err(SimError::Validation { .. })));

    let day_31 = ElectionSeasonConfig { close_day: 31, ..ElectionSeasonConfig::default() };
    assert!(day_31.validate().is_err());

    let backwards = ElectionSeasonConfig {
        open_month: 7,
        close_month: 6,
        ..ElectionSeasonConfig::default()
    };
    assert!(backwards.validate().is_err());
}

#[test]
fn engine_refuses_an_invalid_season() {
    let mut config = PoliticsConfig::default_test();
    config.season.close_month = config.season.open_month;
    config.season.close_day = config.season.open_day;
    assert!(cursus_core::politics_subsystem::PoliticsSubsystem::new(&config, 300).is_err());
}

#[test]
fn json_defaults_fill_optional_fields() {
    let config: PoliticsConfig = serde_json::from_str(
        r#"{"offices": [{"id": "quaestor", "name": "Quaestor", "assembly": "tribal",
             "min_age": 28, "term_length_years": 1, "seats": 8, "rank": 1}]}"#,
    )
    .expect("parse");
    assert_eq!(config.master_seed, 42);
    assert_eq!(config.season, ElectionSeasonConfig::default());
    let def = &config.offices[0];
    assert_eq!(def.reelection_gap_years, 0);
    assert!(def.prerequisites_all.is_empty());
}

#[test]
fn shipped_data_files_load() {
    let config = PoliticsConfig::load(DATA_DIR).expect("politics.json");
    assert_eq!(config.catalog().expect("catalog").len(), 6);
    let roster = load_roster(&format!("{DATA_DIR}/characters.json")).expect("characters.json");
    assert!(roster.len() > 100);
    assert!(roster.iter().all(|c| c.alive));
    let ids: BTreeSet<u64> = roster.iter().map(|c| c.id).collect();
    assert_eq!(ids.len(), roster.len(), "roster ids must be unique");
}

#[test]
fn missing_data_dir_is_an_error() {
    let err = PoliticsConfig::load("/nonexistent/cursus").expect_err("no such dir");
    assert!(err.to_string().contains("Cannot read"), "{err}");
}
