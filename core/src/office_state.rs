//! Seat occupancy and raw term records.
//!
//! OfficeStateService is the only component that mutates seats. Live
//! changes go through `assign_office`; `add_history_seed` exists solely to
//! rehydrate persisted history.
//!
//! Invariants:
//!   - a seat index is held by at most one assignment, and only while that
//!     assignment's `end_year` is unset;
//!   - a character never holds two active seats of the same office.

use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    office::{OfficeCatalog, OfficeDefinition},
    types::{CharacterId, OfficeId, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One occupancy of one seat. Active while `end_year` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeSeatAssignment {
    pub office_id:          OfficeId,
    pub seat_index:         u32,
    pub character_id:       CharacterId,
    pub start_year:         Year,
    /// `start_year + term length`; when the term is due to run out.
    pub scheduled_end_year: Year,
    pub end_year:           Option<Year>,
}

impl OfficeSeatAssignment {
    pub fn is_active(&self) -> bool {
        self.end_year.is_none()
    }

    /// True if the term has run out by the time a term starting in
    /// `year` begins.
    pub fn expires_by(&self, year: Year) -> bool {
        self.scheduled_end_year <= year
    }

    /// Served out by `year`: handed over, or past its scheduled end even
    /// if nobody has taken the seat since.
    pub fn is_completed_by(&self, year: Year) -> bool {
        self.end_year.is_some() || self.expires_by(year)
    }

    /// The year the term ended, or is due to end if still running.
    pub fn effective_end_year(&self) -> Year {
        self.end_year.unwrap_or(self.scheduled_end_year)
    }
}

/// What `assign_office` did, in the shape the term tracker consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAssignmentDescriptor {
    pub office_id:       OfficeId,
    pub office_name:     String,
    pub seat_index:      u32,
    pub character_id:    CharacterId,
    pub term_start_year: Year,
    pub term_end_year:   Year,
    /// Previous holder whose term this assignment ended.
    pub replaced:        Option<CharacterId>,
}

impl SeatAssignmentDescriptor {
    pub fn to_event(&self) -> SimEvent {
        SimEvent::OfficeAssigned {
            character_id:    self.character_id,
            office_id:       self.office_id.clone(),
            office_name:     self.office_name.clone(),
            seat_index:      self.seat_index,
            term_start_year: self.term_start_year,
            term_end_year:   self.term_end_year,
        }
    }
}

/// Current holder of one seat, for the persisted occupancy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatOccupancy {
    pub office_id:    OfficeId,
    pub seat_index:   u32,
    pub character_id: CharacterId,
    pub start_year:   Year,
}

#[derive(Debug, Clone, Default)]
pub struct OfficeStateService {
    records:      Vec<OfficeSeatAssignment>,
    /// Per office, one slot per seat pointing into `records`.
    seats:        BTreeMap<OfficeId, Vec<Option<usize>>>,
    by_character: BTreeMap<CharacterId, Vec<usize>>,
}

impl OfficeStateService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a seat table for every office. Safe to call repeatedly;
    /// existing occupancy is kept.
    pub fn ensure_seat_structures(&mut self, catalog: &OfficeCatalog) {
        for def in catalog.definitions() {
            let table = self.seats.entry(def.id.clone()).or_default();
            let wanted = def.seats as usize;
            if table.len() < wanted {
                table.resize(wanted, None);
            } else if table.len() > wanted {
                log::warn!(
                    "office '{}': seat table has {} seats, definition declares {wanted}",
                    def.id,
                    table.len()
                );
            }
        }
    }

    /// Seat `character_id` in `office_id`, ending the displaced holder's term.
    ///
    /// With `defer` the term starts the year after `year`. Fails without
    /// touching any state if the office is unknown, if the character already
    /// holds an unexpired seat of this office, or if every seat is held by an
    /// unexpired holder.
    pub fn assign_office(
        &mut self,
        office_id:    &str,
        character_id: CharacterId,
        year:         Year,
        defer:        bool,
        catalog:      &OfficeCatalog,
    ) -> SimResult<SeatAssignmentDescriptor> {
        let Some(def) = catalog.get(office_id) else {
            return Err(reject(format!(
                "cannot assign character {character_id}: unknown office '{office_id}'"
            )));
        };
        let start_year = if defer { year + 1 } else { year };

        let Some(table) = self.seats.get(office_id) else {
            return Err(reject(format!(
                "seat structures for '{office_id}' were never allocated"
            )));
        };

        // Own seats in this office: unexpired is a conflict, expired is
        // closed out below.
        let mut own_expired = Vec::new();
        for (seat, slot) in table.iter().enumerate() {
            if let Some(idx) = *slot {
                let rec = &self.records[idx];
                if rec.character_id == character_id {
                    if !rec.expires_by(start_year) {
                        return Err(reject(format!(
                            "character {character_id} already holds '{office_id}' seat {seat} \
                             until {}",
                            rec.scheduled_end_year
                        )));
                    }
                    own_expired.push(seat);
                }
            }
        }

        let target = table.iter().position(|slot| match slot {
            None => true,
            Some(idx) => self.records[*idx].expires_by(start_year),
        });
        let Some(seat) = target else {
            return Err(reject(format!(
                "all {} seat(s) of '{office_id}' are held by unexpired holders in {start_year}",
                table.len()
            )));
        };

        let mut replaced = None;
        if let Some(idx) = table[seat] {
            self.records[idx].end_year = Some(start_year);
            replaced = Some(self.records[idx].character_id);
        }
        for &own in &own_expired {
            if own != seat {
                self.vacate(office_id, own, start_year);
            }
        }

        let record = OfficeSeatAssignment {
            office_id:          def.id.clone(),
            seat_index:         seat as u32,
            character_id,
            start_year,
            scheduled_end_year: start_year + def.term_length_years as Year,
            end_year:           None,
        };
        let descriptor = descriptor_for(def, &record, replaced);
        self.insert_active(record);

        log::debug!(
            "office '{office_id}' seat {seat}: character {character_id} for {start_year}..{}{}",
            descriptor.term_end_year,
            replaced.map(|r| format!(" (replacing {r})")).unwrap_or_default()
        );
        Ok(descriptor)
    }

    /// Inject a persisted record without business-rule validation.
    ///
    /// Active records (no `end_year`) reclaim their seat index. Records naming
    /// an unknown office, an out-of-range seat, or an occupied seat are
    /// skipped with a warning. Returns whether the record was stored.
    pub fn add_history_seed(
        &mut self,
        character_id: CharacterId,
        office_id:    &str,
        seat_index:   u32,
        start_year:   Year,
        end_year:     Option<Year>,
        catalog:      &OfficeCatalog,
    ) -> bool {
        let Some(def) = catalog.get(office_id) else {
            log::warn!(
                "history seed skipped: character {character_id} references unknown office '{office_id}'"
            );
            return false;
        };

        let duplicate = self.history_for(character_id).iter().any(|r| {
            r.office_id == office_id && r.start_year == start_year && r.end_year == end_year
        });
        if duplicate {
            log::debug!("history seed for character {character_id} in '{office_id}' already present");
            return false;
        }

        let record = OfficeSeatAssignment {
            office_id:          def.id.clone(),
            seat_index,
            character_id,
            start_year,
            scheduled_end_year: start_year + def.term_length_years as Year,
            end_year,
        };

        if end_year.is_some() {
            let idx = self.records.len();
            self.records.push(record);
            self.by_character.entry(character_id).or_default().push(idx);
            return true;
        }

        let table = self.seats.entry(def.id.clone()).or_default();
        if table.len() < def.seats as usize {
            table.resize(def.seats as usize, None);
        }
        match table.get(seat_index as usize) {
            None => {
                log::warn!(
                    "history seed skipped: '{office_id}' has no seat {seat_index} (character {character_id})"
                );
                false
            }
            Some(Some(_)) => {
                log::warn!(
                    "history seed skipped: '{office_id}' seat {seat_index} already occupied \
                     (character {character_id})"
                );
                false
            }
            Some(None) => {
                self.insert_active(record);
                true
            }
        }
    }

    /// Every seat `character_id` holds in `year`. A seat left unfilled after
    /// its holder's term ran out no longer counts.
    pub fn current_holdings(&self, character_id: CharacterId, year: Year) -> Vec<&OfficeSeatAssignment> {
        self.history_for(character_id)
            .into_iter()
            .filter(|r| !r.is_completed_by(year))
            .collect()
    }

    /// Every record for `character_id`, ended and active, in creation order.
    pub fn history_for(&self, character_id: CharacterId) -> Vec<&OfficeSeatAssignment> {
        self.by_character
            .get(&character_id)
            .map(|idxs| idxs.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Seat-by-seat view of one office. Empty if the office has no table.
    pub fn seat_holders(&self, office_id: &str) -> Vec<Option<&OfficeSeatAssignment>> {
        self.seats
            .get(office_id)
            .map(|table| {
                table
                    .iter()
                    .map(|slot| slot.map(|i| &self.records[i]))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Seats that are empty or whose holder's term runs out by `term_start`.
    pub fn seats_available(&self, def: &OfficeDefinition, term_start: Year) -> u32 {
        let held = self.seat_holders(&def.id);
        if held.is_empty() {
            return def.seats;
        }
        held.iter()
            .filter(|slot| slot.map_or(true, |r| r.expires_by(term_start)))
            .count() as u32
    }

    /// Every raw record, in creation order.
    pub fn records(&self) -> &[OfficeSeatAssignment] {
        &self.records
    }

    pub fn occupancy(&self) -> Vec<SeatOccupancy> {
        self.seats
            .iter()
            .flat_map(|(office_id, table)| {
                table.iter().enumerate().filter_map(move |(seat, slot)| {
                    slot.map(|i| (office_id, seat, i))
                })
            })
            .map(|(office_id, seat, i)| SeatOccupancy {
                office_id:    office_id.clone(),
                seat_index:   seat as u32,
                character_id: self.records[i].character_id,
                start_year:   self.records[i].start_year,
            })
            .collect()
    }

    fn insert_active(&mut self, record: OfficeSeatAssignment) {
        let idx = self.records.len();
        let character_id = record.character_id;
        if let Some(slot) = self
            .seats
            .get_mut(&record.office_id)
            .and_then(|t| t.get_mut(record.seat_index as usize))
        {
            *slot = Some(idx);
        }
        self.records.push(record);
        self.by_character.entry(character_id).or_default().push(idx);
    }

    fn vacate(&mut self, office_id: &str, seat: usize, end_year: Year) {
        if let Some(slot) = self.seats.get_mut(office_id).and_then(|t| t.get_mut(seat)) {
            if let Some(idx) = slot.take() {
                self.records[idx].end_year = Some(end_year);
            }
        }
    }
}

fn reject(reason: String) -> SimError {
    log::error!("assign_office rejected: {reason}");
    SimError::invariant(reason)
}

fn descriptor_for(
    def:      &OfficeDefinition,
    record:   &OfficeSeatAssignment,
    replaced: Option<CharacterId>,
) -> SeatAssignmentDescriptor {
    SeatAssignmentDescriptor {
        office_id:       def.id.clone(),
        office_name:     def.name.clone(),
        seat_index:      record.seat_index,
        character_id:    record.character_id,
        term_start_year: record.start_year,
        term_end_year:   record.scheduled_end_year,
        replaced,
    }
}
