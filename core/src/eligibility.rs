//! Eligibility rules for standing for office.
//!
//! Rules are checked in a fixed order and the first failure wins:
//!   1. minimum age;
//!   2. every prerequisite office completed: handed over, or past its
//!      scheduled end;
//!   3. reelection cooldown for the same office. A still-running term
//!      counts as ending in its scheduled end year.

use crate::{
    character::Character,
    office::OfficeDefinition,
    office_state::OfficeStateService,
    types::Year,
};

/// Outcome of an eligibility check. A rejection is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible { reason: String },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Eligible => None,
            Self::Ineligible { reason } => Some(reason),
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self::Ineligible { reason: reason.into() }
    }
}

/// Pure rule evaluator over the office history held by OfficeStateService.
pub struct OfficeEligibilityService<'a> {
    state: &'a OfficeStateService,
}

impl<'a> OfficeEligibilityService<'a> {
    pub fn new(state: &'a OfficeStateService) -> Self {
        Self { state }
    }

    pub fn is_eligible(
        &self,
        character: &Character,
        office:    &OfficeDefinition,
        year:      Year,
    ) -> Eligibility {
        if character.age < office.min_age {
            return Eligibility::reject("Too young");
        }

        let history = self.state.history_for(character.id);

        for prereq in &office.prerequisites_all {
            let completed = history
                .iter()
                .any(|r| &r.office_id == prereq && r.is_completed_by(year));
            if !completed {
                return Eligibility::reject(format!("Requires prior service as {prereq}"));
            }
        }

        let last_end = history
            .iter()
            .filter(|r| r.office_id == office.id)
            .map(|r| r.effective_end_year())
            .max();
        if let Some(last_end) = last_end {
            let gap = office.reelection_gap_years as Year;
            let elapsed = year - last_end;
            if gap > 0 && elapsed < gap {
                return Eligibility::reject(format!("Must wait {} more years", gap - elapsed));
            }
        }

        Eligibility::Eligible
    }

    /// Offices `character` may stand for, in the order given.
    pub fn eligible_offices<'d>(
        &self,
        character:   &Character,
        definitions: &'d [OfficeDefinition],
        year:        Year,
    ) -> Vec<&'d OfficeDefinition> {
        definitions
            .iter()
            .filter(|def| self.is_eligible(character, def, year).is_eligible())
            .collect()
    }
}
