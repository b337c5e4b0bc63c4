//! Seat assignment rules and the per-character term tracker.

use cursus_core::{
    config::PoliticsConfig,
    error::SimError,
    event::SimEvent,
    office::OfficeCatalog,
    office_state::OfficeStateService,
    term_tracker::PoliticsTermTracker,
};

fn setup() -> (OfficeCatalog, OfficeStateService) {
    let catalog = PoliticsConfig::default_test().catalog().expect("catalog");
    let mut state = OfficeStateService::new();
    state.ensure_seat_structures(&catalog);
    (catalog, state)
}

#[test]
fn seat_structures_match_definitions_and_are_idempotent() {
    let (catalog, mut state) = setup();
    state.ensure_seat_structures(&catalog);
    for def in catalog.definitions() {
        assert_eq!(state.seat_holders(&def.id).len(), def.seats as usize, "{}", def.id);
        assert!(state.seat_holders(&def.id).iter().all(Option::is_none));
    }
}

#[test]
fn assignment_fills_lowest_free_seat() {
    let (catalog, mut state) = setup();
    let a = state.assign_office("consul", 1, 300, true, &catalog).expect("first");
    let b = state.assign_office("consul", 2, 300, true, &catalog).expect("second");
    assert_eq!((a.seat_index, b.seat_index), (0, 1));
    assert_eq!(a.term_start_year, 301);
    assert_eq!(a.term_end_year, 302);
    assert_eq!(a.replaced, None);
}

#[test]
fn full_office_rejects_with_invariant_violation() {
    let (catalog, mut state) = setup();
    state.assign_office("consul", 1, 300, true, &catalog).expect("first");
    state.assign_office("consul", 2, 300, true, &catalog).expect("second");

    let err = state
        .assign_office("consul", 3, 300, true, &catalog)
        .expect_err("both seats are held");
    assert!(matches!(err, SimError::InvariantViolation { .. }), "{err}");
    assert!(state.current_holdings(3, 300).is_empty());
}

#[test]
fn unknown_office_is_an_invariant_violation() {
    let (catalog, mut state) = setup();
    let err = state
        .assign_office("dictator", 1, 300, true, &catalog)
        .expect_err("no such office");
    assert!(matches!(err, SimError::InvariantViolation { .. }));
    assert!(state.records().is_empty());
}

#[test]
fn sitting_holder_cannot_take_a_second_seat() {
    let (catalog, mut state) = setup();
    state.assign_office("quaestor", 1, 300, false, &catalog).expect("first");
    assert!(state.assign_office("quaestor", 1, 300, false, &catalog).is_err());
    assert_eq!(state.current_holdings(1, 300).len(), 1);
}

#[test]
fn expired_holder_is_displaced_and_their_term_closed() {
    let (catalog, mut state) = setup();
    state.assign_office("consul", 1, 300, true, &catalog).expect("year 300");
    state.assign_office("consul", 2, 300, true, &catalog).expect("year 300");

    // Terms 301..302 have run out for a term starting in 302.
    let next = state.assign_office("consul", 3, 301, true, &catalog).expect("year 301");
    assert_eq!(next.seat_index, 0);
    assert_eq!(next.replaced, Some(1));

    let old = state.history_for(1);
    assert_eq!(old.len(), 1);
    assert_eq!(old[0].end_year, Some(302));
    assert!(state.current_holdings(1, 301).is_empty());
    assert_eq!(state.current_holdings(2, 301).len(), 1);
}

#[test]
fn re_election_vacates_own_expired_seat() {
    let (catalog, mut state) = setup();
    state.assign_office("quaestor", 1, 300, false, &catalog).expect("seat 0");
    state.assign_office("quaestor", 2, 300, false, &catalog).expect("seat 1");
    // Lowest expired seat wins; the old seat 1 is closed out.
    let again = state.assign_office("quaestor", 2, 301, false, &catalog).expect("re-election");
    assert_eq!(again.seat_index, 0);
    assert_eq!(state.current_holdings(2, 301).len(), 1);
    assert_eq!(state.seat_holders("quaestor")[1], None);
    assert!(state.history_for(2).iter().filter(|r| r.end_year == Some(301)).count() == 1);
}

#[test]
fn history_seeds_skip_bad_records() {
    let (catalog, mut state) = setup();
    assert!(!state.add_history_seed(1, "dictator", 0, 290, Some(291), &catalog));
    assert!(!state.add_history_seed(1, "consul", 7, 290, None, &catalog));
    assert!(state.add_history_seed(1, "consul", 0, 299, None, &catalog));
    assert!(!state.add_history_seed(2, "consul", 0, 299, None, &catalog), "seat 0 is occupied");
    assert!(!state.add_history_seed(1, "consul", 0, 299, None, &catalog), "duplicate");
    assert_eq!(state.records().len(), 1);
    assert_eq!(state.occupancy().len(), 1);
}

#[test]
fn seats_available_counts_empty_and_expiring_seats() {
    let (catalog, mut state) = setup();
    let censor = catalog.get("censor").expect("censor").clone();
    assert_eq!(state.seats_available(&censor, 301), 2);

    // Five-year term from 301 is due to end in 306.
    state.assign_office("censor", 1, 300, true, &catalog).expect("censor");
    assert_eq!(state.seats_available(&censor, 302), 1);
    assert_eq!(state.seats_available(&censor, 306), 2);
}

fn assigned(character_id: u64, office_id: &str, start: i32, end: i32) -> SimEvent {
    SimEvent::OfficeAssigned {
        character_id,
        office_id: office_id.into(),
        office_name: office_id.to_uppercase(),
        seat_index: 0,
        term_start_year: start,
        term_end_year: end,
    }
}

#[test]
fn tracker_orders_by_start_year_then_office_id() {
    let mut tracker = PoliticsTermTracker::new();
    assert!(tracker.record_assignment(&assigned(1, "praetor", 305, 306)));
    assert!(tracker.record_assignment(&assigned(1, "quaestor", 300, 301)));
    assert!(tracker.record_assignment(&assigned(1, "aedile", 305, 306)));
    assert!(!tracker.record_assignment(&SimEvent::NewYear { year: 300 }));

    let order: Vec<(i32, &str)> = tracker
        .history(1)
        .iter()
        .map(|r| (r.start_year, r.office_id.as_str()))
        .collect();
    assert_eq!(order, vec![(300, "quaestor"), (305, "aedile"), (305, "praetor")]);
    assert!(tracker.history(2).is_empty());
}

#[test]
fn tracker_deduplicates_on_composite_key() {
    let mut tracker = PoliticsTermTracker::new();
    assert!(tracker.record_assignment(&assigned(1, "consul", 300, 301)));
    assert!(!tracker.record_assignment(&assigned(1, "consul", 300, 301)));
    // Same office and years for a different character is a different term.
    assert!(tracker.record_assignment(&assigned(2, "consul", 300, 301)));
    assert_eq!(tracker.term_count(), 2);
}

#[test]
fn rebuild_replaces_only_one_characters_history() {
    let (catalog, mut state) = setup();
    assert!(state.add_history_seed(1, "quaestor", 0, 290, Some(291), &catalog));
    assert!(state.add_history_seed(1, "praetor", 0, 300, None, &catalog));
    let resolver = |id: &str| catalog.name_of(id).map(str::to_string);

    let mut tracker = PoliticsTermTracker::new();
    assert!(tracker.record_assignment(&assigned(1, "tribune", 280, 281)));
    assert!(tracker.record_assignment(&assigned(2, "tribune", 280, 281)));

    let history = state.history_for(1);
    let holdings = state.current_holdings(1, 300);
    let rebuilt = tracker.rebuild_character_history(1, &history, &holdings, &resolver);
    assert_eq!(rebuilt, 2);

    let mine: Vec<(&str, i32)> = tracker
        .history(1)
        .iter()
        .map(|r| (r.office_name.as_str(), r.end_year))
        .collect();
    assert_eq!(mine, vec![("Quaestor", 291), ("Praetor", 301)]);
    assert_eq!(tracker.history(2).len(), 1);
}

#[test]
fn seeding_skips_unresolvable_offices() {
    let (catalog, mut state) = setup();
    assert!(state.add_history_seed(1, "quaestor", 0, 290, Some(291), &catalog));
    let only_praetor = |id: &str| (id == "praetor").then(|| "Praetor".to_string());

    let mut tracker = PoliticsTermTracker::new();
    let seeded = tracker.seed_from_history(1, state.history_for(1), &only_praetor);
    assert_eq!(seeded, 0);
    assert!(tracker.history(1).is_empty());
}

#[test]
fn live_and_rebuilt_trackers_agree_on_a_displaced_term() {
    let (catalog, mut state) = setup();
    let resolver = |id: &str| catalog.name_of(id).map(str::to_string);
    let mut live = PoliticsTermTracker::new();

    let first = state.assign_office("consul", 1, 300, true, &catalog).expect("year 300");
    live.record_assignment(&first.to_event());
    // Seat 0 is handed over in 306, four years after the term ran out.
    let next = state.assign_office("consul", 3, 305, true, &catalog).expect("year 305");
    assert_eq!(next.replaced, Some(1));
    live.record_assignment(&next.to_event());
    assert_eq!(state.history_for(1)[0].end_year, Some(306));

    let mut seeded = PoliticsTermTracker::new();
    assert_eq!(seeded.seed_from_history(1, state.history_for(1), &resolver), 1);

    let history = state.history_for(1);
    let holdings = state.current_holdings(1, 305);
    assert!(holdings.is_empty());
    let mut rebuilt = PoliticsTermTracker::new();
    assert_eq!(rebuilt.rebuild_character_history(1, &history, &holdings, &resolver), 1);

    let span = |t: &PoliticsTermTracker| -> Vec<(i32, i32)> {
        t.history(1).iter().map(|r| (r.start_year, r.end_year)).collect()
    };
    assert_eq!(span(&live), vec![(301, 302)]);
    assert_eq!(span(&seeded), span(&live));
    assert_eq!(span(&rebuilt), span(&live));
}
