//! Per-step change flags, for the schedule as a whole and per well/group.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScheduleEvent {
    NewWell,
    WellStatusChange,
    ProductionUpdate,
    WellProductivityIndex,
    GroupChange,
    WellListChange,
    NewSegments,
    UdqChange,
    ActionxWellEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEvents {
    events: BTreeSet<ScheduleEvent>,
}

impl ScheduleEvents {
    pub fn add(&mut self, event: ScheduleEvent) {
        self.events.insert(event);
    }

    pub fn has(&self, event: ScheduleEvent) -> bool {
        self.events.contains(&event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn reset(&mut self) {
        self.events.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellGroupEvents {
    events: BTreeMap<String, ScheduleEvents>,
}

impl WellGroupEvents {
    pub fn add(&mut self, wgname: &str, event: ScheduleEvent) {
        self.events.entry(wgname.to_string()).or_default().add(event);
    }

    pub fn has(&self, wgname: &str, event: ScheduleEvent) -> bool {
        self.events.get(wgname).is_some_and(|events| events.has(event))
    }

    pub fn reset(&mut self) {
        self.events.clear();
    }
}
