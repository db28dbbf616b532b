//! The SCHEDULE section as a timeline of per-step snapshots.

mod events;
mod handlers;
mod state;
mod timeline;
mod well;

pub use events::{ScheduleEvent, ScheduleEvents, WellGroupEvents};
pub use handlers::SimulatorUpdate;
pub use state::ScheduleState;
pub use timeline::{RstActionRun, Schedule, ScheduleBlock, ScheduleRestart};
pub use well::{Group, Well, WellProduction, WellStatus};
