//! Season phases, the eligibility cache and population hooks, driven
//! through the engine with the default office ladder.

use cursus_core::{
    character::{CharacterRecord, Gender, InMemoryCharacterRepository, SocialClass},
    clock::DAYS_PER_YEAR,
    config::PoliticsConfig,
    engine::SimEngine,
    event::{EventTag, SimEvent},
    politics_subsystem::CyclePhase,
    snapshot::TermRow,
    types::CalendarDate,
};

fn record(id: u64, birth_year: i32, birth_month: u8, birth_day: u8) -> CharacterRecord {
    CharacterRecord {
        id,
        name: format!("Citizen {id}"),
        gender: Gender::Male,
        social_class: if id % 2 == 0 { SocialClass::Plebeian } else { SocialClass::Patrician },
        birth_year,
        birth_month,
        birth_day,
        wealth: 200.0,
        influence: 5.0,
        traits: vec!["Ambitious".into()],
        alive: true,
    }
}

fn setup(records: Vec<CharacterRecord>) -> (SimEngine, InMemoryCharacterRepository) {
    let config = PoliticsConfig::default_test();
    let characters = InMemoryCharacterRepository::new(records, CalendarDate::new(300, 1, 1));
    let engine = SimEngine::build("cycle-test".into(), &config, 300, &characters).expect("engine");
    (engine, characters)
}

fn phase(engine: &SimEngine) -> CyclePhase {
    engine.current_election_cycle().expect("politics").phase
}

#[test]
fn first_day_announces_year_month_day_then_population() {
    let (mut engine, mut characters) = setup(vec![record(1, 260, 1, 1)]);
    let events = engine.advance_day(&mut characters).expect("day 1");
    let tags: Vec<EventTag> = events.iter().map(SimEvent::tag).collect();
    assert_eq!(
        tags,
        vec![EventTag::NewYear, EventTag::NewMonth, EventTag::NewDay, EventTag::PopulationTick]
    );
    assert_eq!(engine.calendar.today, CalendarDate::new(300, 1, 1));
}

#[test]
fn season_walks_through_every_phase_and_resets_on_new_year() {
    let roster = (1..=12).map(|id| record(id, 250 + id as i32, 1, 1)).collect();
    let (mut engine, mut characters) = setup(roster);

    engine.run_days(150, &mut characters).expect("to 30 May");
    assert_eq!(phase(&engine), CyclePhase::QuietPeriod);

    engine.run_days(1, &mut characters).expect("to 1 June");
    let open = engine.current_election_cycle().expect("politics");
    assert_eq!(open.phase, CyclePhase::ElectionSeasonOpen);
    assert_eq!(open.opened_on, Some(CalendarDate::new(300, 6, 1)));
    assert!(!open.offices.is_empty());
    assert!(open.offices.iter().all(|o| o.term_start_year == 301));
    assert!(
        open.offices.iter().all(|o| o.office_id != "consul" || o.seats_available == 2),
        "{:?}",
        open.offices
    );

    engine.run_days(30, &mut characters).expect("to 1 July");
    let done = engine.current_election_cycle().expect("politics");
    assert_eq!(done.phase, CyclePhase::ResultsPublished);
    assert_eq!(done.closed_on, Some(CalendarDate::new(300, 7, 1)));
    assert_eq!(done.results.len(), open.offices.len());
    assert!(engine.politics().expect("politics").declarations().is_empty());

    engine.run_days(180, &mut characters).expect("to new year");
    assert_eq!(engine.calendar.today, CalendarDate::new(301, 1, 1));
    let quiet = engine.current_election_cycle().expect("politics");
    assert_eq!(quiet.phase, CyclePhase::QuietPeriod);
    assert_eq!(quiet.year, 301);
    assert!(quiet.results.is_empty() && quiet.offices.is_empty());
}

#[test]
fn one_season_per_year() {
    let roster = (1..=20).map(|id| record(id, 250 + id as i32, 1, 1)).collect();
    let (mut engine, mut characters) = setup(roster);

    let events = engine.run_days(DAYS_PER_YEAR * 3, &mut characters).expect("three years");
    let opened = events.iter().filter(|e| e.tag() == EventTag::ElectionSeasonOpened).count();
    let completed: Vec<i32> = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::ElectionSeasonCompleted { election_year, .. } => Some(*election_year),
            _ => None,
        })
        .collect();
    assert_eq!(opened, 3);
    assert_eq!(completed, vec![300, 301, 302]);
}

#[test]
fn winners_hold_no_more_seats_than_offered() {
    let roster = (1..=40).map(|id| record(id, 240 + id as i32 / 2, 1, 1)).collect();
    let (mut engine, mut characters) = setup(roster);
    engine.run_days(181, &mut characters).expect("first season");

    let politics = engine.politics().expect("politics");
    for def in politics.catalog().definitions() {
        let held = politics
            .office_state()
            .seat_holders(&def.id)
            .iter()
            .filter(|s| s.is_some())
            .count();
        assert!(held <= def.seats as usize, "{} holds {held}", def.id);
    }
    let cycle = politics.current_election_cycle();
    for summary in &cycle.results {
        for winner in &summary.winners {
            let holds = politics.office_state().current_holdings(winner.character_id, cycle.year);
            assert!(
                holds.iter().any(|h| h.office_id == summary.office_id),
                "{} not seated in {}",
                winner.character_id,
                summary.office_id
            );
        }
    }
}

#[test]
fn eligibility_snapshot_reflects_age_and_prerequisites() {
    let (engine, _characters) = setup(vec![record(1, 260, 1, 1), record(2, 290, 1, 1)]);

    let veteran = engine.eligibility_snapshot(1).expect("politics");
    assert_eq!(veteran.year, 300);
    assert_eq!(veteran.office_ids, vec!["quaestor".to_string(), "tribune".to_string()]);

    assert!(engine.eligibility_snapshot(2).expect("politics").office_ids.is_empty());
    assert!(engine.eligibility_snapshot(99).expect("politics").office_ids.is_empty());
}

#[test]
fn birthday_refreshes_eligibility_on_the_day() {
    // 26 on 1 January, 27 on 12 March.
    let (mut engine, mut characters) = setup(vec![record(1, 273, 3, 12)]);

    engine.run_days(71, &mut characters).expect("to 11 March");
    assert_eq!(engine.calendar.today, CalendarDate::new(300, 3, 11));
    assert!(engine.eligibility_snapshot(1).expect("politics").office_ids.is_empty());

    engine.advance_day(&mut characters).expect("12 March");
    assert_eq!(
        engine.eligibility_snapshot(1).expect("politics").office_ids,
        vec!["tribune".to_string()]
    );
}

#[test]
fn births_join_the_eligibility_cache() {
    let (mut engine, mut characters) = setup(vec![record(1, 260, 1, 1)]);
    engine.advance_day(&mut characters).expect("day 1");

    let newcomer = characters.add(record(0, 265, 5, 5), &mut engine.context_mut().ids);
    assert_eq!(newcomer, 2);
    engine.publish(SimEvent::CharacterBorn { character_id: newcomer });
    engine.advance_day(&mut characters).expect("day 2");

    assert!(!engine.eligibility_snapshot(newcomer).expect("politics").office_ids.is_empty());
}

#[test]
fn death_clears_eligibility_and_keeps_history() {
    let (mut engine, mut characters) = setup(vec![record(1, 260, 1, 1)]);
    let restored = engine.politics_mut().expect("politics").restore_history(
        &[TermRow {
            office_id:    "quaestor".into(),
            character_id: 1,
            seat_index:   0,
            start_year:   298,
            end_year:     Some(299),
        }],
        &[],
    );
    assert_eq!(restored, 1);
    engine.advance_day(&mut characters).expect("day 1");
    assert!(engine
        .eligibility_snapshot(1)
        .expect("politics")
        .office_ids
        .contains(&"praetor".to_string()));

    assert!(characters.kill(1));
    engine.publish(SimEvent::CharacterDied { character_id: 1 });
    engine.advance_day(&mut characters).expect("day 2");

    assert!(engine.eligibility_snapshot(1).expect("politics").office_ids.is_empty());
    let history = engine.term_history(1);
    assert_eq!(history.len(), 1);
    assert_eq!((history[0].office_name.as_str(), history[0].end_year), ("Quaestor", 299));
}

#[test]
fn dead_characters_do_not_declare() {
    let (mut engine, mut characters) = setup(vec![record(1, 260, 1, 1), record(3, 262, 1, 1)]);
    engine.advance_day(&mut characters).expect("day 1");
    assert!(characters.kill(3));
    engine.publish(SimEvent::CharacterDied { character_id: 3 });

    engine.run_days(150, &mut characters).expect("to 1 June");
    let declared: Vec<u64> = engine
        .politics()
        .expect("politics")
        .declarations()
        .iter()
        .map(|d| d.character_id)
        .collect();
    assert!(!declared.contains(&3), "{declared:?}");
}

#[test]
fn stray_season_announcement_is_ignored_once_open() {
    let roster = (1..=6).map(|id| record(id, 255 + id as i32, 1, 1)).collect();
    let (mut engine, mut characters) = setup(roster);
    engine.run_days(151, &mut characters).expect("to 1 June");
    let before = engine.current_election_cycle().expect("politics");
    let declared = engine.politics().expect("politics").declarations().len();
    assert_eq!(before.phase, CyclePhase::ElectionSeasonOpen);

    engine.publish(SimEvent::ElectionSeasonOpened {
        election_year: 300,
        month:         6,
        day:           2,
        offices:       Vec::new(),
    });
    engine.flush(&characters).expect("flush");

    assert_eq!(engine.current_election_cycle().expect("politics"), before);
    assert_eq!(engine.politics().expect("politics").declarations().len(), declared);
}

#[test]
fn shutdown_releases_every_subscription_once() {
    let (mut engine, _characters) = setup(vec![record(1, 260, 1, 1)]);
    assert_eq!(engine.subscription_count(), 9);
    assert_eq!(engine.shutdown(), 9);
    assert_eq!(engine.subscription_count(), 0);
    assert_eq!(engine.shutdown(), 0);
}
