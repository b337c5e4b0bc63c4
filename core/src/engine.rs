//! The simulation engine — drives the calendar and delivers events.
//!
//! DAILY ORDER (fixed, documented, never reordered):
//!   1. Calendar advances; NewYear / NewMonth / NewDay are queued.
//!   2. PopulationTick for the same date is queued.
//!   3. The bus is flushed: each event goes to its subscribers in
//!      subscription order; events they return are delivered on the next
//!      cycle, until nothing is pending.
//!
//! RULES:
//!   - Subsystems never call each other; they talk through events.
//!   - All randomness flows through the SimContext streams.
//!   - With a store attached, every delivered event is recorded in the
//!     event log.

use crate::{
    character::CharacterRepository,
    bus::{EventBus, SubscriptionSet},
    clock::SimCalendar,
    config::PoliticsConfig,
    context::{IdAllocator, SimContext},
    error::{SimError, SimResult},
    event::{EventLogEntry, EventTag, SimEvent},
    politics_subsystem::{ElectionCycleSnapshot, EligibilitySnapshot, PoliticsSubsystem},
    snapshot::PoliticsSnapshot,
    store::SimStore,
    subsystem::{SimSubsystem, TickContext},
    term_tracker::OfficeTermRecord,
    types::{CharacterId, RunId, Year},
};

/// Flush cycles allowed per day before the engine gives up on a feedback
/// loop between handlers.
pub const MAX_FLUSH_CYCLES: usize = 64;

pub struct SimEngine {
    pub run_id:    RunId,
    pub calendar:  SimCalendar,
    context:       SimContext,
    bus:           EventBus,
    subsystems:    Vec<Box<dyn SimSubsystem>>,
    subscriptions: Vec<SubscriptionSet>,
    store:         Option<SimStore>,
}

impl SimEngine {
    pub fn new(run_id: RunId, start_year: Year, context: SimContext) -> Self {
        Self {
            run_id,
            calendar:      SimCalendar::new(start_year),
            context,
            bus:           EventBus::new(),
            subsystems:    Vec::new(),
            subscriptions: Vec::new(),
            store:         None,
        }
    }

    /// Build a fully wired engine seeded from `config.master_seed`.
    pub fn build(
        run_id:     RunId,
        config:     &PoliticsConfig,
        start_year: Year,
        characters: &dyn CharacterRepository,
    ) -> SimResult<Self> {
        let context = SimContext::new(config.master_seed);
        Self::build_with_context(run_id, config, start_year, context, characters)
    }

    /// As `build`, with a caller-supplied context (e.g. overridden streams).
    pub fn build_with_context(
        run_id:     RunId,
        config:     &PoliticsConfig,
        start_year: Year,
        context:    SimContext,
        characters: &dyn CharacterRepository,
    ) -> SimResult<Self> {
        let mut politics = PoliticsSubsystem::new(config, start_year)?;
        politics.bootstrap(characters, start_year);

        let mut engine = SimEngine::new(run_id, start_year, context);
        if let Some(max_id) = characters.all_living().iter().map(|c| c.id).max() {
            engine.context.ids.ensure_above(max_id);
        }
        engine.register(Box::new(politics));
        Ok(engine)
    }

    /// Attach a migrated store; the run is registered and every event
    /// delivered from now on is logged.
    pub fn attach_store(&mut self, store: SimStore) -> SimResult<()> {
        store.insert_run(&self.run_id, self.context.master_seed(), env!("CARGO_PKG_VERSION"))?;
        self.store = Some(store);
        Ok(())
    }

    pub fn store(&self) -> Option<&SimStore> {
        self.store.as_ref()
    }

    /// Register a subsystem for the tags it declares. Delivery order among
    /// subscribers of one tag is registration order.
    pub fn register(&mut self, subsystem: Box<dyn SimSubsystem>) {
        let index = self.subsystems.len();
        let mut set = SubscriptionSet::new();
        for tag in subsystem.subscriptions() {
            set.push(self.bus.subscribe(*tag, index));
        }
        log::debug!("registered subsystem '{}' for {} tag(s)", subsystem.name(), set.len());
        self.subsystems.push(subsystem);
        self.subscriptions.push(set);
    }

    /// Queue an event for the next flush (e.g. a birth or death from the
    /// population collaborator).
    pub fn publish(&mut self, event: SimEvent) {
        self.bus.publish(event);
    }

    pub fn context(&self) -> &SimContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.context
    }

    /// Advance one day. Returns every event delivered, in delivery order.
    pub fn advance_day(&mut self, characters: &mut dyn CharacterRepository) -> SimResult<Vec<SimEvent>> {
        self.run_days(1, characters)
    }

    /// Run `n` days in a loop. Used by the runner and tests.
    pub fn run_days(
        &mut self,
        n:          u32,
        characters: &mut dyn CharacterRepository,
    ) -> SimResult<Vec<SimEvent>> {
        self.calendar.resume();
        let mut delivered = Vec::new();
        for _ in 0..n {
            match self.step_day(characters) {
                Ok(events) => delivered.extend(events),
                Err(e) => {
                    self.calendar.pause();
                    return Err(e);
                }
            }
        }
        self.calendar.pause();
        Ok(delivered)
    }

    fn step_day(&mut self, characters: &mut dyn CharacterRepository) -> SimResult<Vec<SimEvent>> {
        let boundary = self.calendar.advance();
        let today = self.calendar.today;
        characters.sync_date(today);

        for event in boundary {
            self.bus.publish(event);
        }
        self.bus.publish(SimEvent::PopulationTick {
            year:  today.year,
            month: today.month,
            day:   today.day,
        });
        self.flush(&*characters)
    }

    /// Deliver everything pending, cycle by cycle, until quiescent.
    pub fn flush(&mut self, characters: &dyn CharacterRepository) -> SimResult<Vec<SimEvent>> {
        let mut delivered = Vec::new();
        let mut cycles = 0;
        while self.bus.has_pending() {
            cycles += 1;
            if cycles > MAX_FLUSH_CYCLES {
                log::error!("date={} flush did not settle after {MAX_FLUSH_CYCLES} cycles", self.calendar.today);
                return Err(SimError::FlushOverrun { cycles: MAX_FLUSH_CYCLES });
            }

            let batch = self.bus.take_batch();
            for event in &batch {
                self.log_event(event)?;
                for index in self.bus.subscribers_of(event.tag()) {
                    let mut ctx = TickContext {
                        today: self.calendar.today,
                        characters,
                        sim: &mut self.context,
                    };
                    let emitted = self.subsystems[index].handle(event, &mut ctx)?;
                    for next in emitted {
                        self.bus.publish(next);
                    }
                }
            }
            delivered.extend(batch);
        }
        Ok(delivered)
    }

    fn log_event(&self, event: &SimEvent) -> SimResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let today = self.calendar.today;
        let entry = EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            year:       today.year,
            month:      today.month,
            day:        today.day,
            subsystem:  event_source(event.tag()).to_string(),
            event_type: event.tag().name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        store.append_event(&entry)
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn politics(&self) -> Option<&PoliticsSubsystem> {
        self.subsystems
            .iter()
            .find_map(|sub| sub.as_any().downcast_ref::<PoliticsSubsystem>())
    }

    pub fn politics_mut(&mut self) -> Option<&mut PoliticsSubsystem> {
        self.subsystems
            .iter_mut()
            .find_map(|sub| sub.as_any_mut().downcast_mut::<PoliticsSubsystem>())
    }

    pub fn current_election_cycle(&self) -> Option<ElectionCycleSnapshot> {
        self.politics().map(PoliticsSubsystem::current_election_cycle)
    }

    pub fn eligibility_snapshot(&self, character_id: CharacterId) -> Option<EligibilitySnapshot> {
        self.politics().map(|p| p.eligibility_snapshot(character_id))
    }

    pub fn term_history(&self, character_id: CharacterId) -> Vec<OfficeTermRecord> {
        self.politics()
            .map(|p| p.term_history(character_id).to_vec())
            .unwrap_or_default()
    }

    // ── Save / load ────────────────────────────────────────────

    /// Capture the persisted state. Declarations are transient, so a save
    /// taken while a season is open loses that season's candidates.
    pub fn save_state(&self) -> SimResult<PoliticsSnapshot> {
        let politics = self
            .politics()
            .ok_or_else(|| SimError::invariant("save_state: no politics subsystem registered"))?;
        if !politics.declarations().is_empty() {
            log::warn!(
                "date={} saving while an election season is open; declarations are not saved",
                self.calendar.today
            );
        }
        Ok(PoliticsSnapshot {
            run_id:            self.run_id.clone(),
            date:              self.calendar.today,
            streams:           self.context.stream_states(),
            seats:             politics.seat_rows(),
            terms:             politics.term_rows(),
            next_character_id: self.context.ids.peek(),
        })
    }

    /// Write the current state to the attached store.
    pub fn save_to_store(&self) -> SimResult<PoliticsSnapshot> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| SimError::invariant("save_to_store: no store attached"))?;
        let snapshot = self.save_state()?;
        store.save_politics_snapshot(&snapshot)?;
        Ok(snapshot)
    }

    /// Resume from `snapshot` on a freshly built engine. The next day
    /// simulated is the one after the snapshot's date.
    pub fn load_state(
        &mut self,
        snapshot:   &PoliticsSnapshot,
        characters: &mut dyn CharacterRepository,
    ) -> SimResult<()> {
        self.context.restore_streams(&snapshot.streams);
        self.context.ids = IdAllocator::starting_at(snapshot.next_character_id);
        self.calendar.restore_to(snapshot.date);
        characters.sync_date(snapshot.date);

        let politics = self
            .politics_mut()
            .ok_or_else(|| SimError::invariant("load_state: no politics subsystem registered"))?;
        politics.restore_history(&snapshot.terms, &snapshot.seats);
        politics.bootstrap(&*characters, snapshot.date.year);
        log::info!(
            "run {} resumed at {} ({} term row(s), {} stream(s))",
            self.run_id,
            snapshot.date,
            snapshot.terms.len(),
            snapshot.streams.len()
        );
        Ok(())
    }

    /// Release every subscription. Returns how many were still live.
    pub fn shutdown(&mut self) -> usize {
        let released: usize = self
            .subscriptions
            .iter_mut()
            .map(|set| set.release(&mut self.bus))
            .sum();
        if released > 0 {
            log::debug!("engine shutdown: {released} subscription(s) released");
        }
        released
    }

    pub fn subscription_count(&self) -> usize {
        self.bus.subscription_count()
    }
}

impl Drop for SimEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Which collaborator an event originates from, for the event_log
/// subsystem column.
fn event_source(tag: EventTag) -> &'static str {
    match tag {
        EventTag::NewDay | EventTag::NewMonth | EventTag::NewYear => "calendar",
        EventTag::CharacterBorn | EventTag::CharacterDied | EventTag::PopulationTick => "population",
        EventTag::ElectionSeasonOpened
        | EventTag::ElectionSeasonCompleted
        | EventTag::OfficeAssigned => "politics",
    }
}
