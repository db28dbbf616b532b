//! `schedule_core` — the dynamic part of a reservoir SCHEDULE section.
//!
//! ACTIONX condition language, user defined quantities and the per-step
//! schedule timeline. No IO: keywords arrive pre-parsed and randomness
//! comes from the UDQ function table owned by the caller.

pub mod action;
mod engine;
pub mod error;
mod keyword;
pub mod matcher;
pub mod schedule;
mod summary;
mod types;
pub mod udq;

pub use engine::{run_step, Simulation};
pub use error::{
    ErrorCategory, ErrorGuard, InputError, InputErrorAction, KeywordLocation, ParseContext,
    ScheduleError,
};
pub use keyword::{DeckKeyword, DeckRecord};
pub use schedule::{Schedule, ScheduleRestart, ScheduleState, SimulatorUpdate};
pub use summary::SummaryState;
pub use types::*;

pub(crate) fn emit(counters: &mut Counters, report_step: ReportStep, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope {
        id,
        report_step,
        event,
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

#[cfg(test)]
mod tests;
