//! Subsystem trait and the per-delivery context.
//!
//! RULE: Every subsystem implements SimSubsystem.
//! The engine delivers each flushed event to the subscribers of its tag,
//! in subscription order. Events a handler returns are published for the
//! next flush cycle.

use crate::{
    character::CharacterRepository,
    context::SimContext,
    error::SimResult,
    event::{EventTag, SimEvent},
    types::CalendarDate,
};
use std::any::Any;

/// Everything a handler may touch besides its own state.
pub struct TickContext<'a> {
    pub today:      CalendarDate,
    pub characters: &'a dyn CharacterRepository,
    pub sim:        &'a mut SimContext,
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Event tags this subsystem is registered for at engine build time.
    fn subscriptions(&self) -> &'static [EventTag];

    /// Called once per delivered event.
    ///
    /// Returns new events to publish; they are delivered on the next
    /// flush, never re-entrantly.
    fn handle(&mut self, event: &SimEvent, ctx: &mut TickContext<'_>) -> SimResult<Vec<SimEvent>>;

    /// For downcasting in queries, tests and tooling.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
