//! Simulation calendar — owns the current date, pause state, and the
//! day/month/year boundary events.
//!
//! The calendar is schematic: 12 months of 30 days each.

use crate::{
    event::SimEvent,
    types::{CalendarDate, Year},
};
use serde::{Deserialize, Serialize};

pub const MONTHS_PER_YEAR: u8 = 12;
pub const DAYS_PER_MONTH:  u8 = 30;
pub const DAYS_PER_YEAR:   u32 = MONTHS_PER_YEAR as u32 * DAYS_PER_MONTH as u32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimCalendar {
    pub today:  CalendarDate,
    pub paused: bool,
    started:    bool,
}

impl SimCalendar {
    /// A calendar positioned on 1 January of `start_year`. The first
    /// `advance()` announces that day rather than moving past it.
    pub fn new(start_year: Year) -> Self {
        Self {
            today:   CalendarDate::new(start_year, 1, 1),
            paused:  true,
            started: false,
        }
    }

    /// Advance one day. Returns the boundary events for the new day,
    /// coarsest first: NewYear, NewMonth, NewDay.
    /// Panics if called while paused — callers must check.
    pub fn advance(&mut self) -> Vec<SimEvent> {
        assert!(!self.paused, "advance() called on paused calendar");

        if self.started {
            self.today = next_day(self.today);
        } else {
            self.started = true;
        }

        let CalendarDate { year, month, day } = self.today;
        let mut events = Vec::with_capacity(3);
        if month == 1 && day == 1 {
            events.push(SimEvent::NewYear { year });
        }
        if day == 1 {
            events.push(SimEvent::NewMonth { year, month });
        }
        events.push(SimEvent::NewDay { year, month, day });
        events
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Reposition on a day already simulated, e.g. after a load. The next
    /// `advance()` moves to the following day.
    pub fn restore_to(&mut self, date: CalendarDate) {
        self.today = date;
        self.started = true;
    }
}

fn next_day(date: CalendarDate) -> CalendarDate {
    if date.day < DAYS_PER_MONTH {
        CalendarDate::new(date.year, date.month, date.day + 1)
    } else if date.month < MONTHS_PER_YEAR {
        CalendarDate::new(date.year, date.month + 1, 1)
    } else {
        CalendarDate::new(date.year + 1, 1, 1)
    }
}
