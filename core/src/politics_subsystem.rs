//! Politics subsystem — the election season state machine.
//!
//! Phases per calendar year:
//!   QuietPeriod → ElectionSeasonOpen → ResultsPublished, reset on NewYear.
//!
//! On the configured open date the subsystem announces every office with a
//! seat to fill; declarations are drawn when that announcement is delivered.
//! On the close date each office's pool is scored, winners are seated and
//! the season summary is published.
//!
//! Also maintained here:
//!   - eligibility cache (character → eligible office ids), rebuilt on
//!     NewYear and refreshed per character on births, deaths, birthdays and
//!     election wins;
//!   - birthday index used to find whose age changed on a population tick;
//!   - pending deaths, whose term histories are rebuilt once per tick.

use crate::{
    candidate::{CandidateDeclaration, CandidateEvaluationService},
    character::CharacterRepository,
    config::{ElectionSeasonConfig, PoliticsConfig},
    election::{ElectionCandidate, ElectionResultService, ElectionVoteSimulator},
    eligibility::OfficeEligibilityService,
    error::SimResult,
    event::{ElectionResultSummary, EventTag, OfficeElectionInfo, SimEvent},
    office::OfficeCatalog,
    office_state::{OfficeStateService, SeatOccupancy},
    rng::SubsystemSlot,
    snapshot::TermRow,
    subsystem::{SimSubsystem, TickContext},
    term_tracker::{OfficeTermRecord, PoliticsTermTracker},
    types::{CalendarDate, CharacterId, OfficeId, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const SUBSCRIPTIONS: &[EventTag] = &[
    EventTag::NewYear,
    EventTag::NewMonth,
    EventTag::NewDay,
    EventTag::CharacterBorn,
    EventTag::CharacterDied,
    EventTag::PopulationTick,
    EventTag::ElectionSeasonOpened,
    EventTag::ElectionSeasonCompleted,
    EventTag::OfficeAssigned,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    QuietPeriod,
    ElectionSeasonOpen,
    ResultsPublished,
}

/// Read-only view of the current season, rebuilt on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionCycleSnapshot {
    pub year:      Year,
    pub phase:     CyclePhase,
    pub offices:   Vec<OfficeElectionInfo>,
    pub results:   Vec<ElectionResultSummary>,
    pub opened_on: Option<CalendarDate>,
    pub closed_on: Option<CalendarDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilitySnapshot {
    pub year:       Year,
    pub office_ids: Vec<OfficeId>,
}

#[derive(Debug, Clone)]
struct ElectionCycleState {
    year:         Year,
    phase:        CyclePhase,
    offices:      Vec<OfficeElectionInfo>,
    declarations: Vec<CandidateDeclaration>,
    results:      Vec<ElectionResultSummary>,
    opened_on:    Option<CalendarDate>,
    closed_on:    Option<CalendarDate>,
}

impl ElectionCycleState {
    fn quiet(year: Year) -> Self {
        Self {
            year,
            phase:        CyclePhase::QuietPeriod,
            offices:      Vec::new(),
            declarations: Vec::new(),
            results:      Vec::new(),
            opened_on:    None,
            closed_on:    None,
        }
    }
}

pub struct PoliticsSubsystem {
    catalog:         OfficeCatalog,
    season:          ElectionSeasonConfig,
    office_state:    OfficeStateService,
    term_tracker:    PoliticsTermTracker,
    vote_simulator:  ElectionVoteSimulator,
    result_service:  ElectionResultService,
    cycle:           ElectionCycleState,
    eligibility:     BTreeMap<CharacterId, Vec<OfficeId>>,
    birthdays:       BTreeMap<(u8, u8), BTreeSet<CharacterId>>,
    pending_deaths:  BTreeSet<CharacterId>,
}

impl PoliticsSubsystem {
    /// Fails if the office catalog or the season dates are invalid.
    pub fn new(config: &PoliticsConfig, start_year: Year) -> SimResult<Self> {
        config.season.validate()?;
        let catalog = config.catalog()?;
        let mut office_state = OfficeStateService::new();
        office_state.ensure_seat_structures(&catalog);
        log::info!(
            "politics: {} office(s) loaded, season {}/{}..{}/{}",
            catalog.len(),
            config.season.open_month,
            config.season.open_day,
            config.season.close_month,
            config.season.close_day
        );
        Ok(Self {
            catalog,
            season: config.season.clone(),
            office_state,
            term_tracker: PoliticsTermTracker::new(),
            vote_simulator: ElectionVoteSimulator::new(),
            result_service: ElectionResultService::new(),
            cycle: ElectionCycleState::quiet(start_year),
            eligibility: BTreeMap::new(),
            birthdays: BTreeMap::new(),
            pending_deaths: BTreeSet::new(),
        })
    }

    /// Build the birthday index and the eligibility cache from scratch.
    /// Called once before the first day and again after a load.
    pub fn bootstrap(&mut self, characters: &dyn CharacterRepository, year: Year) {
        self.cycle = ElectionCycleState::quiet(year);
        self.birthdays.clear();
        for character in characters.all_living() {
            self.birthdays
                .entry((character.birth_month, character.birth_day))
                .or_default()
                .insert(character.id);
        }
        self.rebuild_eligibility(characters);
        log::info!(
            "year={year} politics bootstrapped: {} living character(s), {} eligible",
            self.birthdays.values().map(BTreeSet::len).sum::<usize>(),
            self.eligibility.len()
        );
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn current_election_cycle(&self) -> ElectionCycleSnapshot {
        ElectionCycleSnapshot {
            year:      self.cycle.year,
            phase:     self.cycle.phase,
            offices:   self.cycle.offices.clone(),
            results:   self.cycle.results.clone(),
            opened_on: self.cycle.opened_on,
            closed_on: self.cycle.closed_on,
        }
    }

    /// Cached eligible offices; empty for unknown or dead characters.
    pub fn eligibility_snapshot(&self, character_id: CharacterId) -> EligibilitySnapshot {
        EligibilitySnapshot {
            year:       self.cycle.year,
            office_ids: self.eligibility.get(&character_id).cloned().unwrap_or_default(),
        }
    }

    pub fn term_history(&self, character_id: CharacterId) -> &[OfficeTermRecord] {
        self.term_tracker.history(character_id)
    }

    /// This season's declarations, in character id order.
    pub fn declarations(&self) -> &[CandidateDeclaration] {
        &self.cycle.declarations
    }

    pub fn office_state(&self) -> &OfficeStateService {
        &self.office_state
    }

    pub fn catalog(&self) -> &OfficeCatalog {
        &self.catalog
    }

    // ── Persistence ────────────────────────────────────────────

    pub fn seat_rows(&self) -> Vec<SeatOccupancy> {
        self.office_state.occupancy()
    }

    pub fn term_rows(&self) -> Vec<TermRow> {
        self.office_state.records().iter().map(TermRow::from).collect()
    }

    /// Rehydrate office state and term histories from persisted rows.
    /// Expects a freshly built subsystem. Returns the number of rows kept.
    pub fn restore_history(&mut self, terms: &[TermRow], seats: &[SeatOccupancy]) -> usize {
        let mut restored = 0;
        let mut characters = BTreeSet::new();
        for row in terms {
            if self.office_state.add_history_seed(
                row.character_id,
                &row.office_id,
                row.seat_index,
                row.start_year,
                row.end_year,
                &self.catalog,
            ) {
                restored += 1;
                characters.insert(row.character_id);
            }
        }

        for seat in seats {
            let holders = self.office_state.seat_holders(&seat.office_id);
            let held_by = holders
                .get(seat.seat_index as usize)
                .copied()
                .flatten()
                .map(|r| r.character_id);
            if held_by != Some(seat.character_id) {
                log::warn!(
                    "restore: '{}' seat {} recorded for character {} but term rows give {:?}",
                    seat.office_id,
                    seat.seat_index,
                    seat.character_id,
                    held_by
                );
            }
        }

        let catalog = &self.catalog;
        let resolver = |office_id: &str| catalog.name_of(office_id).map(str::to_string);
        for character_id in characters {
            let history = self.office_state.history_for(character_id);
            self.term_tracker
                .seed_from_history(character_id, history, &resolver);
        }
        log::info!(
            "restore: {restored}/{} term row(s) applied, {} term record(s) tracked",
            terms.len(),
            self.term_tracker.term_count()
        );
        restored
    }

    // ── Season ─────────────────────────────────────────────────

    /// Offices with at least one seat to fill for a term beginning in
    /// `term_start`, in catalog order.
    fn open_offices(&self, term_start: Year) -> Vec<OfficeElectionInfo> {
        self.catalog
            .definitions()
            .iter()
            .filter_map(|def| {
                let seats_available = self.office_state.seats_available(def, term_start);
                (seats_available > 0).then(|| OfficeElectionInfo {
                    office_id: def.id.clone(),
                    office_name: def.name.clone(),
                    assembly: def.assembly,
                    rank: def.rank,
                    seats_available,
                    term_start_year: term_start,
                })
            })
            .collect()
    }

    fn term_start_for(&self, year: Year) -> Year {
        if self.season.terms_begin_following_year {
            year + 1
        } else {
            year
        }
    }

    fn on_new_day(&mut self, year: Year, month: u8, day: u8, ctx: &mut TickContext<'_>) -> Vec<SimEvent> {
        if self.season.opens_on(month, day) && self.cycle.phase == CyclePhase::QuietPeriod {
            let offices = self.open_offices(self.term_start_for(year));
            if offices.is_empty() {
                log::info!("year={year} no office has a seat to fill; season skipped");
                return Vec::new();
            }
            return vec![SimEvent::ElectionSeasonOpened {
                election_year: year,
                month,
                day,
                offices,
            }];
        }
        if self.season.closes_on(month, day) && self.cycle.phase == CyclePhase::ElectionSeasonOpen {
            return self.resolve_season(year, month, day, ctx);
        }
        Vec::new()
    }

    fn on_season_opened(
        &mut self,
        year:    Year,
        date:    CalendarDate,
        offices: &[OfficeElectionInfo],
        ctx:     &mut TickContext<'_>,
    ) {
        if self.cycle.phase != CyclePhase::QuietPeriod {
            log::warn!("year={year} season opened while {:?}; ignored", self.cycle.phase);
            return;
        }

        let evaluator = CandidateEvaluationService::new(
            &self.catalog,
            OfficeEligibilityService::new(&self.office_state),
        );
        let rng = ctx.sim.rng(SubsystemSlot::Candidate);
        let declarations: Vec<CandidateDeclaration> = ctx
            .characters
            .all_living()
            .iter()
            .filter_map(|character| evaluator.try_create_declaration(character, offices, year, &mut *rng))
            .collect();

        log::info!(
            "year={year} election season open: {} office(s), {} declaration(s)",
            offices.len(),
            declarations.len()
        );
        self.cycle.year = year;
        self.cycle.phase = CyclePhase::ElectionSeasonOpen;
        self.cycle.offices = offices.to_vec();
        self.cycle.declarations = declarations;
        self.cycle.opened_on = Some(date);
    }

    /// Score, select and seat every open office, in the order announced.
    fn resolve_season(&mut self, year: Year, month: u8, day: u8, ctx: &mut TickContext<'_>) -> Vec<SimEvent> {
        let defer = self.season.terms_begin_following_year;
        let mut events = Vec::new();
        let mut summaries = Vec::with_capacity(self.cycle.offices.len());
        let mut seats_filled = 0;

        for info in &self.cycle.offices {
            let Some(def) = self.catalog.get(&info.office_id) else {
                log::warn!("year={year} open office '{}' no longer in catalog", info.office_id);
                continue;
            };

            let mut candidates: Vec<ElectionCandidate> = self
                .cycle
                .declarations
                .iter()
                .filter(|d| d.office_id == def.id)
                .filter_map(|d| {
                    let character = ctx.characters.get(d.character_id).filter(|c| c.alive)?;
                    Some(ElectionCandidate::new(d.clone(), character))
                })
                .collect();
            if candidates.is_empty() {
                log::info!("year={year} '{}': no candidates stood", def.id);
            }

            self.vote_simulator
                .score_candidates(def, &mut candidates, ctx.sim.rng(SubsystemSlot::Election));
            let winners = self.vote_simulator.select_winners(&candidates, info.seats_available);
            let total_score: f64 = candidates.iter().map(|c| c.final_score).sum();

            let outcome = self.result_service.apply_office_results(
                def,
                year,
                &candidates,
                &winners,
                total_score,
                defer,
                &mut self.office_state,
                &self.catalog,
            );
            log::debug!(
                "year={year} '{}': {} candidate(s), {} seated",
                def.id,
                candidates.len(),
                outcome.assignments.len()
            );
            seats_filled += outcome.assignments.len();
            events.extend(outcome.assignments.iter().map(|a| a.to_event()));
            summaries.push(outcome.summary);
        }

        events.push(
            self.result_service
                .publish_election_results(year, month, day, seats_filled, summaries),
        );
        events
    }

    fn on_season_completed(
        &mut self,
        year:       Year,
        date:       CalendarDate,
        results:    &[ElectionResultSummary],
        characters: &dyn CharacterRepository,
    ) {
        if self.cycle.phase != CyclePhase::ElectionSeasonOpen {
            log::warn!("year={year} season completed while {:?}", self.cycle.phase);
        }
        self.cycle.year = year;
        self.cycle.phase = CyclePhase::ResultsPublished;
        self.cycle.results = results.to_vec();
        self.cycle.closed_on = Some(date);
        self.cycle.declarations.clear();

        let winners: BTreeSet<CharacterId> = results
            .iter()
            .flat_map(|r| r.winners.iter().map(|w| w.character_id))
            .collect();
        for character_id in winners {
            self.refresh_eligibility(character_id, characters);
        }
    }

    // ── Caches ─────────────────────────────────────────────────

    fn rebuild_eligibility(&mut self, characters: &dyn CharacterRepository) {
        self.eligibility.clear();
        for character in characters.all_living() {
            self.refresh_eligibility(character.id, characters);
        }
    }

    fn refresh_eligibility(&mut self, character_id: CharacterId, characters: &dyn CharacterRepository) {
        let Some(character) = characters.get(character_id).filter(|c| c.alive) else {
            self.eligibility.remove(&character_id);
            return;
        };
        let offices: Vec<OfficeId> = OfficeEligibilityService::new(&self.office_state)
            .eligible_offices(&character, self.catalog.definitions(), self.cycle.year)
            .into_iter()
            .map(|def| def.id.clone())
            .collect();
        self.eligibility.insert(character_id, offices);
    }

    fn on_birth(&mut self, character_id: CharacterId, characters: &dyn CharacterRepository) {
        match characters.get(character_id) {
            Some(character) => {
                self.birthdays
                    .entry((character.birth_month, character.birth_day))
                    .or_default()
                    .insert(character_id);
                self.refresh_eligibility(character_id, characters);
            }
            None => log::warn!("birth of unknown character {character_id} ignored"),
        }
    }

    fn on_death(&mut self, character_id: CharacterId) {
        self.eligibility.remove(&character_id);
        for ids in self.birthdays.values_mut() {
            ids.remove(&character_id);
        }
        self.pending_deaths.insert(character_id);
    }

    fn on_population_tick(&mut self, month: u8, day: u8, characters: &dyn CharacterRepository) {
        let celebrating: Vec<CharacterId> = self
            .birthdays
            .get(&(month, day))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        for character_id in &celebrating {
            self.refresh_eligibility(*character_id, characters);
        }
        if !celebrating.is_empty() {
            log::debug!("{month}/{day}: eligibility refreshed for {} birthday(s)", celebrating.len());
        }
        self.flush_pending_deaths();
    }

    /// One history rebuild per character that died since the last tick.
    fn flush_pending_deaths(&mut self) {
        if self.pending_deaths.is_empty() {
            return;
        }
        let catalog = &self.catalog;
        let resolver = |office_id: &str| catalog.name_of(office_id).map(str::to_string);
        for character_id in std::mem::take(&mut self.pending_deaths) {
            let history = self.office_state.history_for(character_id);
            let holdings = self.office_state.current_holdings(character_id, self.cycle.year);
            self.term_tracker
                .rebuild_character_history(character_id, &history, &holdings, &resolver);
        }
    }
}

impl SimSubsystem for PoliticsSubsystem {
    fn name(&self) -> &'static str {
        "politics"
    }

    fn subscriptions(&self) -> &'static [EventTag] {
        SUBSCRIPTIONS
    }

    fn handle(&mut self, event: &SimEvent, ctx: &mut TickContext<'_>) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        match event {
            SimEvent::NewYear { year } => {
                self.cycle = ElectionCycleState::quiet(*year);
                self.rebuild_eligibility(ctx.characters);
                log::debug!("year={year} politics reset, {} eligible", self.eligibility.len());
            }
            SimEvent::NewMonth { year, month } => {
                log::debug!("year={year} month={month} phase={:?}", self.cycle.phase);
            }
            SimEvent::NewDay { year, month, day } => {
                out = self.on_new_day(*year, *month, *day, ctx);
            }
            SimEvent::CharacterBorn { character_id } => {
                self.on_birth(*character_id, ctx.characters);
            }
            SimEvent::CharacterDied { character_id } => {
                self.on_death(*character_id);
            }
            SimEvent::PopulationTick { month, day, .. } => {
                self.on_population_tick(*month, *day, ctx.characters);
            }
            SimEvent::ElectionSeasonOpened { election_year, month, day, offices } => {
                let date = CalendarDate::new(*election_year, *month, *day);
                self.on_season_opened(*election_year, date, offices, ctx);
            }
            SimEvent::ElectionSeasonCompleted { election_year, month, day, results } => {
                let date = CalendarDate::new(*election_year, *month, *day);
                self.on_season_completed(*election_year, date, results, ctx.characters);
            }
            SimEvent::OfficeAssigned { .. } => {
                self.term_tracker.record_assignment(event);
            }
        }
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
