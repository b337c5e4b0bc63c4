//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two engines, same seed, same roster, same days.
//! They must produce byte-identical event logs.
//! Any divergence is a blocker — do not merge until fixed.

use cursus_core::{
    character::InMemoryCharacterRepository,
    clock::{DAYS_PER_MONTH, MONTHS_PER_YEAR},
    config::{load_roster, PoliticsConfig},
    engine::SimEngine,
    store::SimStore,
    types::{CalendarDate, Year},
};

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");
const START_YEAR: Year = -248;

fn build_engine(seed: u64) -> (SimEngine, InMemoryCharacterRepository) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut config = PoliticsConfig::load(DATA_DIR).expect("config");
    config.master_seed = seed;
    let roster = load_roster(&format!("{DATA_DIR}/characters.json")).expect("roster");
    let characters = InMemoryCharacterRepository::new(roster, CalendarDate::new(START_YEAR, 1, 1));

    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let mut engine =
        SimEngine::build(format!("det-test-{seed}"), &config, START_YEAR, &characters).expect("engine");
    engine.attach_store(store).expect("attach store");
    (engine, characters)
}

fn collect_event_log(engine: &SimEngine, years: Year) -> Vec<String> {
    // Read back day by day; ids give delivery order within a day.
    let store = engine.store().expect("store");
    let mut payloads = Vec::new();
    for year in START_YEAR..START_YEAR + years {
        for month in 1..=MONTHS_PER_YEAR {
            for day in 1..=DAYS_PER_MONTH {
                let entries = store
                    .events_for_date(&engine.run_id, year, month, day)
                    .expect("read events");
                payloads.extend(entries.into_iter().map(|e| format!("{}|{}", e.subsystem, e.payload)));
            }
        }
    }
    payloads
}

#[test]
fn same_seed_produces_identical_event_logs() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let (mut engine_a, mut characters_a) = build_engine(SEED);
    let (mut engine_b, mut characters_b) = build_engine(SEED);

    let delivered_a = engine_a.run_days(720, &mut characters_a).expect("engine_a run");
    let delivered_b = engine_b.run_days(720, &mut characters_b).expect("engine_b run");
    assert_eq!(delivered_a, delivered_b, "delivered events differ");

    let log_a = collect_event_log(&engine_a, 2);
    let log_b = collect_event_log(&engine_b, 2);

    assert_eq!(
        log_a.len(), log_b.len(),
        "Event log lengths differ: {} vs {}",
        log_a.len(), log_b.len()
    );
    assert_eq!(log_a.len(), delivered_a.len(), "every delivered event is logged");

    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(
            a, b,
            "Event log diverged at entry {i}:\n  A: {a}\n  B: {b}"
        );
    }

    let state_a = engine_a.save_state().expect("save a");
    let state_b = engine_b.save_state().expect("save b");
    assert_eq!(state_a.streams, state_b.streams);
    assert_eq!(state_a.terms, state_b.terms);
}

#[test]
fn elections_actually_seat_people() {
    let (mut engine, mut characters) = build_engine(42);
    engine.run_days(360, &mut characters).expect("run");

    let store = engine.store().expect("store");
    assert_eq!(store.event_count(&engine.run_id, "election_season_opened").expect("count"), 1);
    assert_eq!(store.event_count(&engine.run_id, "election_season_completed").expect("count"), 1);
    let assigned = store.event_count(&engine.run_id, "office_assigned").expect("count");
    assert!(assigned > 0, "a full roster should fill at least one seat");
}

#[test]
fn different_seeds_produce_different_logs() {
    let (mut engine_a, mut characters_a) = build_engine(42);
    let (mut engine_b, mut characters_b) = build_engine(99);

    engine_a.run_days(360, &mut characters_a).expect("run a");
    engine_b.run_days(360, &mut characters_b).expect("run b");

    // Declarations and the campaign swing both draw from the seeded
    // streams, so the season's results must differ somewhere.
    let log_a = collect_event_log(&engine_a, 1);
    let log_b = collect_event_log(&engine_b, 1);

    let any_different = log_a.iter().zip(log_b.iter()).any(|(a, b)| a != b) || log_a.len() != log_b.len();
    assert!(any_different, "Different seeds produced identical logs — seed is not being used");
}
