//! The event bus vocabulary — all inter-component communication.
//!
//! RULE: Collaborators talk to the politics core ONLY through events
//! and the public queries on the engine.

use crate::{
    office::Assembly,
    types::{CharacterId, OfficeId, RunId, Year},
};
use serde::{Deserialize, Serialize};

/// Every event delivered through the bus.
/// Variants may be appended — never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Calendar collaborator ──────────────────────
    NewDay {
        year:  Year,
        month: u8,
        day:   u8,
    },
    NewMonth {
        year:  Year,
        month: u8,
    },
    NewYear {
        year: Year,
    },

    // ── Character collaborator ─────────────────────
    CharacterBorn {
        character_id: CharacterId,
    },
    CharacterDied {
        character_id: CharacterId,
    },
    PopulationTick {
        year:  Year,
        month: u8,
        day:   u8,
    },

    // ── Politics ───────────────────────────────────
    ElectionSeasonOpened {
        election_year: Year,
        month:         u8,
        day:           u8,
        offices:       Vec<OfficeElectionInfo>,
    },
    ElectionSeasonCompleted {
        election_year: Year,
        month:         u8,
        day:           u8,
        results:       Vec<ElectionResultSummary>,
    },
    OfficeAssigned {
        character_id:    CharacterId,
        office_id:       OfficeId,
        office_name:     String,
        seat_index:      u32,
        term_start_year: Year,
        term_end_year:   Year,
    },
}

/// Registry key for subscriptions — one per `SimEvent` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventTag {
    NewDay,
    NewMonth,
    NewYear,
    CharacterBorn,
    CharacterDied,
    PopulationTick,
    ElectionSeasonOpened,
    ElectionSeasonCompleted,
    OfficeAssigned,
}

impl EventTag {
    /// Stable string name, used for the event_type column in event_log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewDay                  => "new_day",
            Self::NewMonth                => "new_month",
            Self::NewYear                 => "new_year",
            Self::CharacterBorn           => "character_born",
            Self::CharacterDied           => "character_died",
            Self::PopulationTick          => "population_tick",
            Self::ElectionSeasonOpened    => "election_season_opened",
            Self::ElectionSeasonCompleted => "election_season_completed",
            Self::OfficeAssigned          => "office_assigned",
        }
    }
}

impl SimEvent {
    pub fn tag(&self) -> EventTag {
        match self {
            Self::NewDay { .. }                  => EventTag::NewDay,
            Self::NewMonth { .. }                => EventTag::NewMonth,
            Self::NewYear { .. }                 => EventTag::NewYear,
            Self::CharacterBorn { .. }           => EventTag::CharacterBorn,
            Self::CharacterDied { .. }           => EventTag::CharacterDied,
            Self::PopulationTick { .. }          => EventTag::PopulationTick,
            Self::ElectionSeasonOpened { .. }    => EventTag::ElectionSeasonOpened,
            Self::ElectionSeasonCompleted { .. } => EventTag::ElectionSeasonCompleted,
            Self::OfficeAssigned { .. }          => EventTag::OfficeAssigned,
        }
    }
}

/// One office put to the vote this season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeElectionInfo {
    pub office_id:       OfficeId,
    pub office_name:     String,
    pub assembly:        Assembly,
    pub rank:            u32,
    pub seats_available: u32,
    pub term_start_year: Year,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionWinner {
    pub character_id:   CharacterId,
    pub character_name: String,
    pub seat_index:     u32,
}

/// A candidate's final standing in one office's vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub character_id: CharacterId,
    pub score:        f64,
    /// `score / total score` of the office's candidate pool.
    pub share:        f64,
    pub elected:      bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResultSummary {
    pub office_id:   OfficeId,
    pub office_name: String,
    /// Winners in ranking order.
    pub winners:     Vec<ElectionWinner>,
    pub tallies:     Vec<CandidateTally>,
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub year:       Year,
    pub month:      u8,
    pub day:        u8,
    pub subsystem:  String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized SimEvent
}
