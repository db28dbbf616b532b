//! Shared type definitions for `schedule_core`.
//!
//! ID newtypes, simulated time, and the run events returned by the engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// Simulated time in whole seconds since the Unix epoch.
pub type SimTime = i64;

/// Index of a report step in the schedule timeline.
pub type ReportStep = usize;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(EventId);

// ---------------------------------------------------------------------------
// Run bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub report_step: ReportStep,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    UdqAssigned {
        keyword: String,
        defined: usize,
    },
    UdqDefined {
        keyword: String,
        defined: usize,
    },
    ActionEvaluated {
        name: String,
        id: usize,
        triggered: bool,
    },
    ActionTriggered {
        name: String,
        id: usize,
        run_count: usize,
        /// Matched wells, in canonical well order.
        wells: Vec<String>,
    },
    WellPiUpdated {
        action: String,
        wells: Vec<String>,
    },
}
