//! cursus-core — deterministic simulation of Roman magistracies:
//! who may stand for which office, who declares, who wins, and the term
//! histories that follow.

pub mod bus;
pub mod candidate;
pub mod character;
pub mod clock;
pub mod config;
pub mod context;
pub mod election;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod event;
pub mod office;
pub mod office_state;
pub mod politics_subsystem;
pub mod rng;
pub mod snapshot;
pub mod store;
pub mod subsystem;
pub mod term_tracker;
pub mod types;
