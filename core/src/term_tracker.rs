//! Per-character term history, ordered by start year then office id.
//!
//! Records are deduplicated on (character, office, start year, end year), so
//! replaying the same assignment or seeding it twice is harmless.
//!
//! A record's end year is always the term's scheduled end, whether it came
//! from a live `OfficeAssigned` event or from persisted seat records. The
//! year a seat was actually handed over lives only in OfficeStateService.

use crate::{
    event::SimEvent,
    office_state::OfficeSeatAssignment,
    types::{CharacterId, OfficeId, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeTermRecord {
    pub office_id:   OfficeId,
    pub office_name: String,
    pub seat_index:  u32,
    pub start_year:  Year,
    /// Scheduled end of the term.
    pub end_year:    Year,
}

type TermKey = (CharacterId, OfficeId, Year, Year);

#[derive(Debug, Clone, Default)]
pub struct PoliticsTermTracker {
    histories: BTreeMap<CharacterId, Vec<OfficeTermRecord>>,
    keys:      HashSet<TermKey>,
}

impl PoliticsTermTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the term described by an `OfficeAssigned` event.
    /// Returns false for other events and for duplicates.
    pub fn record_assignment(&mut self, event: &SimEvent) -> bool {
        let SimEvent::OfficeAssigned {
            character_id,
            office_id,
            office_name,
            seat_index,
            term_start_year,
            term_end_year,
        } = event
        else {
            return false;
        };
        self.insert(
            *character_id,
            OfficeTermRecord {
                office_id:   office_id.clone(),
                office_name: office_name.clone(),
                seat_index:  *seat_index,
                start_year:  *term_start_year,
                end_year:    *term_end_year,
            },
        )
    }

    /// Bootstrap from persisted records without re-checking any rule.
    /// Records whose office name cannot be resolved are skipped.
    pub fn seed_from_history<'r>(
        &mut self,
        character_id:  CharacterId,
        history:       impl IntoIterator<Item = &'r OfficeSeatAssignment>,
        name_resolver: &dyn Fn(&str) -> Option<String>,
    ) -> usize {
        let mut seeded = 0;
        for record in history {
            if self.seed_record(character_id, record, name_resolver) {
                seeded += 1;
            }
        }
        seeded
    }

    /// Bootstrap one still-running term.
    pub fn seed_active_assignment(
        &mut self,
        character_id:  CharacterId,
        record:        &OfficeSeatAssignment,
        name_resolver: &dyn Fn(&str) -> Option<String>,
    ) -> bool {
        self.seed_record(character_id, record, name_resolver)
    }

    /// Recompute one character's list from the raw records of the office
    /// state, leaving every other character untouched.
    ///
    /// `history` is every record of the character, ended or not; `holdings`
    /// only adds seats `history` is missing.
    pub fn rebuild_character_history(
        &mut self,
        character_id:  CharacterId,
        history:       &[&OfficeSeatAssignment],
        holdings:      &[&OfficeSeatAssignment],
        name_resolver: &dyn Fn(&str) -> Option<String>,
    ) -> usize {
        self.keys.retain(|key| key.0 != character_id);
        self.histories.remove(&character_id);

        let mut count = self.seed_from_history(character_id, history.iter().copied(), name_resolver);
        for record in holdings {
            if self.seed_active_assignment(character_id, record, name_resolver) {
                count += 1;
            }
        }
        log::debug!("term history rebuilt for character {character_id}: {count} term(s)");
        count
    }

    pub fn history(&self, character_id: CharacterId) -> &[OfficeTermRecord] {
        self.histories
            .get(&character_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn term_count(&self) -> usize {
        self.keys.len()
    }

    fn seed_record(
        &mut self,
        character_id:  CharacterId,
        record:        &OfficeSeatAssignment,
        name_resolver: &dyn Fn(&str) -> Option<String>,
    ) -> bool {
        let Some(office_name) = name_resolver(&record.office_id) else {
            log::warn!(
                "term seed skipped: character {character_id} references unknown office '{}'",
                record.office_id
            );
            return false;
        };
        self.insert(
            character_id,
            OfficeTermRecord {
                office_id: record.office_id.clone(),
                office_name,
                seat_index: record.seat_index,
                start_year: record.start_year,
                end_year: record.scheduled_end_year,
            },
        )
    }

    fn insert(&mut self, character_id: CharacterId, record: OfficeTermRecord) -> bool {
        let key = (
            character_id,
            record.office_id.clone(),
            record.start_year,
            record.end_year,
        );
        if !self.keys.insert(key) {
            return false;
        }
        let list = self.histories.entry(character_id).or_default();
        let pos = list.partition_point(|r| {
            (r.start_year, r.office_id.as_str()) <= (record.start_year, record.office_id.as_str())
        });
        list.insert(pos, record);
        true
    }
}
