//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};

/// A calendar year. Negative values are years before the common era.
pub type Year = i32;

/// A stable, unique identifier for a character.
pub type CharacterId = u64;

/// Stable string identifier of an office ("consul", "praetor", ...).
pub type OfficeId = String;

/// The canonical run identifier.
pub type RunId = String;

/// A single day on the simulation calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year:  Year,
    pub month: u8,
    pub day:   u8,
}

impl CalendarDate {
    pub fn new(year: Year, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}
