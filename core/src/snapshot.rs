//! Snapshot serialization — the persisted state of a politics run.
//!
//! A snapshot captures everything needed to resume from its date without
//! replaying history: RNG stream positions, seat occupancy, every raw term
//! record and the id counter. Caches are not stored; they are rebuilt on
//! load.

use crate::{
    office_state::{OfficeSeatAssignment, SeatOccupancy},
    rng::RngStreamState,
    types::{CalendarDate, CharacterId, OfficeId, RunId, Year},
};
use serde::{Deserialize, Serialize};

/// One raw term record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRow {
    pub office_id:    OfficeId,
    pub character_id: CharacterId,
    pub seat_index:   u32,
    pub start_year:   Year,
    pub end_year:     Option<Year>,
}

impl From<&OfficeSeatAssignment> for TermRow {
    fn from(record: &OfficeSeatAssignment) -> Self {
        Self {
            office_id:    record.office_id.clone(),
            character_id: record.character_id,
            seat_index:   record.seat_index,
            start_year:   record.start_year,
            end_year:     record.end_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliticsSnapshot {
    pub run_id:            RunId,
    pub date:              CalendarDate,
    pub streams:           Vec<RngStreamState>,
    pub seats:             Vec<SeatOccupancy>,
    /// In creation order; restore re-inserts them in this order.
    pub terms:             Vec<TermRow>,
    pub next_character_id: CharacterId,
}
