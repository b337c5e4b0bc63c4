//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the single master seed of the run.
//!
//! Each subsystem gets its own RNG stream, seeded deterministically
//! from (master_seed XOR subsystem_index). This means:
//!   - Adding a new subsystem never changes existing subsystems' streams.
//!   - Each subsystem's stream is fully reproducible in isolation.
//!   - A stream's position is fully described by (seed, draws_taken),
//!     which is what gets persisted.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// Replaying more draws than this on restore is treated as a corrupt
/// draw count: the stream is reseeded and replayed up to the cap.
pub const MAX_REPLAY_DRAWS: u64 = 50_000_000;

/// Anything the simulation can draw randomness from.
///
/// Production code always uses [`SubsystemRng`]; tests substitute
/// constant sources to pin outcomes.
pub trait RandomSource {
    /// Draw a raw u64 (full range). Every other draw is built on this.
    fn next_u64(&mut self) -> u64;

    /// Persistable position of this stream, if it has one.
    fn state(&self) -> Option<RngStreamState> {
        None
    }

    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64 {
        let bits = self.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a float in [min, max).
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }
}

/// Persisted position of one RNG stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngStreamState {
    pub name:        String,
    pub seed:        u64,
    pub draws_taken: u64,
}

/// A named, deterministic RNG for a single subsystem.
pub struct SubsystemRng {
    pub name:    &'static str,
    seed:        u64,
    draws_taken: u64,
    inner:       Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a subsystem RNG from the master seed and a stable
    /// subsystem index. The index must never change once assigned.
    pub fn new(master_seed: u64, subsystem_index: u64) -> Self {
        let derived_seed = master_seed ^ (subsystem_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self::from_seed("unnamed", derived_seed)
    }

    fn from_seed(name: &'static str, seed: u64) -> Self {
        Self {
            name,
            seed,
            draws_taken: 0,
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn draws_taken(&self) -> u64 {
        self.draws_taken
    }

    /// Rebuild a stream from its persisted (seed, draws_taken) pair.
    ///
    /// A draw count beyond [`MAX_REPLAY_DRAWS`] cannot be trusted; the
    /// stream is replayed as far as the cap allows and the run continues.
    pub fn restore(name: &'static str, state: &RngStreamState) -> Self {
        let mut rng = Self::from_seed(name, state.seed);
        let target = if state.draws_taken > MAX_REPLAY_DRAWS {
            log::warn!(
                "rng '{name}': persisted draw count {} exceeds replay limit {MAX_REPLAY_DRAWS}; \
                 reseeding and replaying best effort",
                state.draws_taken
            );
            MAX_REPLAY_DRAWS
        } else {
            state.draws_taken
        };
        for _ in 0..target {
            rng.next_u64();
        }
        rng
    }
}

impl RandomSource for SubsystemRng {
    fn next_u64(&mut self) -> u64 {
        self.draws_taken += 1;
        self.inner.next_u64()
    }

    fn state(&self) -> Option<RngStreamState> {
        Some(RngStreamState {
            name:        self.name.to_string(),
            seed:        self.seed,
            draws_taken: self.draws_taken,
        })
    }
}

/// Derives subsystem streams from one master seed.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_subsystem(&self, slot: SubsystemSlot) -> SubsystemRng {
        SubsystemRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable subsystem slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every subsystem's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u64)]
pub enum SubsystemSlot {
    Election = 0,
    Candidate = 1,
    Birth = 2,
    Marriage = 3,
    Population = 4,
    // Add new streams here — append only.
}

impl SubsystemSlot {
    pub const ALL: [SubsystemSlot; 5] = [
        Self::Election,
        Self::Candidate,
        Self::Birth,
        Self::Marriage,
        Self::Population,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Election => "election",
            Self::Candidate => "candidate",
            Self::Birth => "birth",
            Self::Marriage => "marriage",
            Self::Population => "population",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.name() == name)
    }
}
