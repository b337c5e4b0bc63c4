//! Simulation context — the explicit home of every RNG stream and id counter.
//!
//! Constructed once per run and passed by `&mut` into whichever subsystem
//! needs it. There are no process-wide generators or counters.

use crate::{
    rng::{RandomSource, RngBank, RngStreamState, SubsystemRng, SubsystemSlot},
    types::CharacterId,
};
use std::collections::BTreeMap;

/// Hands out character ids for newly created characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: CharacterId,
}

impl IdAllocator {
    pub fn starting_at(next: CharacterId) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self) -> CharacterId {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> CharacterId {
        self.next
    }

    /// Never moves the counter backwards.
    pub fn ensure_above(&mut self, id: CharacterId) {
        if id >= self.next {
            self.next = id + 1;
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

pub struct SimContext {
    master_seed: u64,
    streams:     BTreeMap<SubsystemSlot, Box<dyn RandomSource>>,
    pub ids:     IdAllocator,
}

impl SimContext {
    pub fn new(master_seed: u64) -> Self {
        let bank = RngBank::new(master_seed);
        let streams = SubsystemSlot::ALL
            .into_iter()
            .map(|slot| (slot, Box::new(bank.for_subsystem(slot)) as Box<dyn RandomSource>))
            .collect();
        Self {
            master_seed,
            streams,
            ids: IdAllocator::default(),
        }
    }

    /// Replace one stream, e.g. with a constant source in tests.
    pub fn with_stream(mut self, slot: SubsystemSlot, source: Box<dyn RandomSource>) -> Self {
        self.streams.insert(slot, source);
        self
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn rng(&mut self, slot: SubsystemSlot) -> &mut dyn RandomSource {
        let master_seed = self.master_seed;
        let stream = self
            .streams
            .entry(slot)
            .or_insert_with(|| Box::new(RngBank::new(master_seed).for_subsystem(slot)));
        &mut **stream
    }

    /// Persistable positions of every stream that has one.
    pub fn stream_states(&self) -> Vec<RngStreamState> {
        self.streams.values().filter_map(|s| s.state()).collect()
    }

    pub fn restore_streams(&mut self, states: &[RngStreamState]) {
        for state in states {
            let Some(slot) = SubsystemSlot::from_name(&state.name) else {
                log::warn!("rng restore: unknown stream '{}' skipped", state.name);
                continue;
            };
            self.streams
                .insert(slot, Box::new(SubsystemRng::restore(slot.name(), state)));
        }
        log::debug!("rng restore: {} stream(s) replayed", states.len());
    }
}
