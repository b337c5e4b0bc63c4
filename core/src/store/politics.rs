//! Store methods for the persisted politics state.

use crate::{
    error::SimResult,
    office_state::SeatOccupancy,
    rng::RngStreamState,
    snapshot::{PoliticsSnapshot, TermRow},
    types::CalendarDate,
};
use rusqlite::params;

use super::SimStore;

const COUNTER_NEXT_CHARACTER_ID: &str = "next_character_id";
const COUNTER_YEAR:              &str = "saved_year";
const COUNTER_MONTH:             &str = "saved_month";
const COUNTER_DAY:               &str = "saved_day";

impl SimStore {
    /// Replace the run's saved state with `snapshot`, in one transaction.
    pub fn save_politics_snapshot(&self, snapshot: &PoliticsSnapshot) -> SimResult<()> {
        let run_id = snapshot.run_id.as_str();
        let tx = self.conn.unchecked_transaction()?;
        for table in ["rng_stream", "office_seat", "office_term", "sim_counter"] {
            tx.execute(&format!("DELETE FROM {table} WHERE run_id = ?1"), params![run_id])?;
        }

        for stream in &snapshot.streams {
            tx.execute(
                "INSERT INTO rng_stream (run_id, name, seed, draws_taken) VALUES (?1, ?2, ?3, ?4)",
                params![run_id, stream.name, stream.seed as i64, stream.draws_taken as i64],
            )?;
        }
        for seat in &snapshot.seats {
            tx.execute(
                "INSERT INTO office_seat (run_id, office_id, seat_index, character_id, start_year)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    run_id,
                    seat.office_id,
                    seat.seat_index,
                    seat.character_id as i64,
                    seat.start_year,
                ],
            )?;
        }
        for (seq, term) in snapshot.terms.iter().enumerate() {
            tx.execute(
                "INSERT INTO office_term
                    (run_id, seq, office_id, character_id, seat_index, start_year, end_year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    run_id,
                    seq as i64,
                    term.office_id,
                    term.character_id as i64,
                    term.seat_index,
                    term.start_year,
                    term.end_year,
                ],
            )?;
        }
        let counters = [
            (COUNTER_NEXT_CHARACTER_ID, snapshot.next_character_id as i64),
            (COUNTER_YEAR, snapshot.date.year as i64),
            (COUNTER_MONTH, snapshot.date.month as i64),
            (COUNTER_DAY, snapshot.date.day as i64),
        ];
        for (name, value) in counters {
            tx.execute(
                "INSERT INTO sim_counter (run_id, name, value) VALUES (?1, ?2, ?3)",
                params![run_id, name, value],
            )?;
        }
        tx.commit()?;

        log::debug!(
            "saved run {run_id} at {}: {} stream(s), {} seat(s), {} term(s)",
            snapshot.date,
            snapshot.streams.len(),
            snapshot.seats.len(),
            snapshot.terms.len()
        );
        Ok(())
    }

    /// The run's saved state, or None if it was never saved.
    pub fn load_politics_snapshot(&self, run_id: &str) -> SimResult<Option<PoliticsSnapshot>> {
        let counters = self.counters(run_id)?;
        let counter = |name: &str| counters.iter().find(|(n, _)| n == name).map(|(_, v)| *v);
        let (Some(next_id), Some(year), Some(month), Some(day)) = (
            counter(COUNTER_NEXT_CHARACTER_ID),
            counter(COUNTER_YEAR),
            counter(COUNTER_MONTH),
            counter(COUNTER_DAY),
        ) else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT name, seed, draws_taken FROM rng_stream WHERE run_id = ?1 ORDER BY name ASC",
        )?;
        let streams = stmt
            .query_map(params![run_id], |row| {
                Ok(RngStreamState {
                    name:        row.get(0)?,
                    seed:        row.get::<_, i64>(1)? as u64,
                    draws_taken: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT office_id, seat_index, character_id, start_year
             FROM office_seat WHERE run_id = ?1
             ORDER BY office_id ASC, seat_index ASC",
        )?;
        let seats = stmt
            .query_map(params![run_id], |row| {
                Ok(SeatOccupancy {
                    office_id:    row.get(0)?,
                    seat_index:   row.get(1)?,
                    character_id: row.get::<_, i64>(2)? as u64,
                    start_year:   row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT office_id, character_id, seat_index, start_year, end_year
             FROM office_term WHERE run_id = ?1 ORDER BY seq ASC",
        )?;
        let terms = stmt
            .query_map(params![run_id], |row| {
                Ok(TermRow {
                    office_id:    row.get(0)?,
                    character_id: row.get::<_, i64>(1)? as u64,
                    seat_index:   row.get(2)?,
                    start_year:   row.get(3)?,
                    end_year:     row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(PoliticsSnapshot {
            run_id: run_id.to_string(),
            date: CalendarDate::new(year as i32, month as u8, day as u8),
            streams,
            seats,
            terms,
            next_character_id: next_id as u64,
        }))
    }

    /// Number of persisted term rows for a run (for tests).
    pub fn term_row_count(&self, run_id: &str) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM office_term WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn counters(&self, run_id: &str) -> SimResult<Vec<(String, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM sim_counter WHERE run_id = ?1")?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
