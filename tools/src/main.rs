//! sim-runner: headless runner for the cursus honorum simulation.
//!
//! Usage:
//!   sim-runner --years 10 --start-year -248 --data-dir ./data
//!   sim-runner --seed 12345 --years 25 --db run.db
//!   sim-runner --db run.db --resume <run_id> --years 5

use anyhow::Result;
use cursus_core::{
    character::{CharacterRepository, InMemoryCharacterRepository},
    clock::DAYS_PER_YEAR,
    config::{load_roster, PoliticsConfig},
    engine::SimEngine,
    event::SimEvent,
    store::SimStore,
    types::{CalendarDate, Year},
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let years = parse_arg(&args, "--years", 10u32);
    let start_year = parse_arg(&args, "--start-year", -248 as Year);
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let db = string_arg(&args, "--db");
    let resume = string_arg(&args, "--resume");

    let mut config = PoliticsConfig::load(data_dir)?;
    config.master_seed = parse_arg(&args, "--seed", config.master_seed);
    let roster = load_roster(&format!("{data_dir}/characters.json"))?;

    let store = match db {
        Some(path) => {
            let store = SimStore::open(path)?;
            store.migrate()?;
            Some(store)
        }
        None => None,
    };

    let run_id = match resume {
        Some(id) => id.to_string(),
        None => format!("run-{}-{}", config.master_seed, uuid::Uuid::new_v4()),
    };

    println!("Cursus Honorum — sim-runner");
    println!("  run_id:    {run_id}");
    println!("  seed:      {}", config.master_seed);
    println!("  years:     {years}");
    println!("  data_dir:  {data_dir}");
    println!("  db:        {}", db.unwrap_or("(none)"));
    println!("  roster:    {} character(s)", roster.len());
    println!();

    let mut characters = InMemoryCharacterRepository::new(roster, CalendarDate::new(start_year, 1, 1));

    // A resumed run continues from its saved state instead of start_year.
    let saved = match (&store, resume) {
        (Some(store), Some(id)) => {
            if let Some(seed) = store.run_seed(id)? {
                config.master_seed = seed;
            }
            let snapshot = store
                .load_politics_snapshot(id)?
                .ok_or_else(|| anyhow::anyhow!("run {id} has no saved state"))?;
            Some(snapshot)
        }
        (None, Some(_)) => anyhow::bail!("--resume requires --db"),
        _ => None,
    };

    let first_year = saved.as_ref().map(|s| s.date.year).unwrap_or(start_year);
    let mut engine = SimEngine::build(run_id.clone(), &config, first_year, &characters)?;
    if let Some(snapshot) = &saved {
        engine.load_state(snapshot, &mut characters)?;
    }
    if let Some(store) = store {
        engine.attach_store(store)?;
    }

    for _ in 0..years {
        let events = engine.run_days(DAYS_PER_YEAR, &mut characters)?;
        print_year(&engine, &events);
    }

    if engine.store().is_some() {
        let snapshot = engine.save_to_store()?;
        println!();
        println!(
            "Saved {} term record(s) at {} — resume with --resume {run_id}",
            snapshot.terms.len(),
            snapshot.date
        );
    }

    print_summary(&engine, &characters);
    Ok(())
}

fn print_year(engine: &SimEngine, events: &[SimEvent]) {
    for event in events {
        let SimEvent::ElectionSeasonCompleted { election_year, results, .. } = event else {
            continue;
        };
        println!("=== ELECTIONS OF {election_year} ===");
        for result in results {
            let winners: Vec<&str> = result
                .winners
                .iter()
                .map(|w| w.character_name.as_str())
                .collect();
            println!(
                "  {:<22} {:>2} candidate(s) | {}",
                result.office_name,
                result.tallies.len(),
                if winners.is_empty() { "(no winner)".to_string() } else { winners.join(", ") }
            );
        }
    }
    log::debug!("date={} year done", engine.calendar.today);
}

fn print_summary(engine: &SimEngine, characters: &InMemoryCharacterRepository) {
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  final date:   {}", engine.calendar.today);

    let mut careers: Vec<(String, usize)> = characters
        .all_living()
        .into_iter()
        .map(|c| (c.name, engine.term_history(c.id).len()))
        .filter(|(_, terms)| *terms > 0)
        .collect();
    careers.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    println!("  office holders: {}", careers.len());
    for (name, terms) in careers.iter().take(10) {
        println!("    {name:<32} {terms} term(s)");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
