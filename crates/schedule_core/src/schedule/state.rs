//! One snapshot of the schedule: everything in force during a report step.
//!
//! Snapshots share unchanged members through `Arc`; a handler that modifies
//! a member clones it first via the `*_mut` accessors.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::action::{ActionDims, Actions};
use crate::matcher::{NameOrder, WListManager, WellMatcher};
use crate::types::{ReportStep, SimTime};
use crate::udq::{UdaControl, UdaValue, UdqActive, UdqConfig, UdqError};

use super::events::{ScheduleEvents, WellGroupEvents};
use super::well::{Group, Well};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleState {
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    sim_step: ReportStep,
    month_num: u32,
    year_num: i32,
    first_in_month: bool,
    first_in_year: bool,

    pub events: ScheduleEvents,
    pub wellgroup_events: WellGroupEvents,

    wells: Arc<BTreeMap<String, Well>>,
    well_order: Arc<NameOrder>,
    groups: Arc<BTreeMap<String, Group>>,
    wlist_manager: Arc<WListManager>,
    segments: Arc<BTreeMap<String, Vec<usize>>>,
    actions: Arc<Actions>,
    action_dims: ActionDims,
    udq: Arc<UdqConfig>,
    udq_active: Arc<UdqActive>,
}

impl ScheduleState {
    pub fn new(start_time: NaiveDateTime, udq: UdqConfig, action_dims: ActionDims) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert("FIELD".to_string(), Group::field());
        Self {
            start_time,
            end_time: None,
            sim_step: 0,
            month_num: 0,
            year_num: 0,
            first_in_month: true,
            first_in_year: true,
            events: ScheduleEvents::default(),
            wellgroup_events: WellGroupEvents::default(),
            wells: Arc::default(),
            well_order: Arc::default(),
            groups: Arc::new(groups),
            wlist_manager: Arc::default(),
            segments: Arc::default(),
            actions: Arc::default(),
            action_dims,
            udq: Arc::new(udq),
            udq_active: Arc::default(),
        }
    }

    /// The snapshot for the following report step, starting at `start_time`.
    ///
    /// Month and year counters advance when the calendar month or year
    /// changes; change flags and pending UDQ assignments start empty.
    pub fn next(&self, start_time: NaiveDateTime) -> Self {
        let mut next = self.clone();
        next.start_time = start_time;
        next.end_time = None;
        next.sim_step = self.sim_step + 1;

        let new_month = start_time.month() != self.start_time.month()
            || start_time.year() != self.start_time.year();
        let new_year = start_time.year() != self.start_time.year();
        next.first_in_month = new_month;
        next.first_in_year = new_year;
        if new_month {
            next.month_num = self.month_num + 1;
        }
        if new_year {
            next.year_num = self.year_num + 1;
        }

        next.events.reset();
        next.wellgroup_events.reset();
        if !next.udq.pending_assignments().is_empty() {
            next.udq_mut().clear_pending_assignments();
        }
        next
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.end_time
    }

    pub fn set_end_time(&mut self, end_time: NaiveDateTime) {
        self.end_time = Some(end_time);
    }

    /// Start of the step as simulated time.
    pub fn sim_time(&self) -> SimTime {
        self.start_time.and_utc().timestamp()
    }

    pub fn sim_step(&self) -> ReportStep {
        self.sim_step
    }

    pub fn month_num(&self) -> u32 {
        self.month_num
    }

    pub fn year_num(&self) -> i32 {
        self.year_num
    }

    pub fn first_in_month(&self) -> bool {
        self.first_in_month
    }

    pub fn first_in_year(&self) -> bool {
        self.first_in_year
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    pub fn wells(&self) -> &BTreeMap<String, Well> {
        &self.wells
    }

    pub fn wells_mut(&mut self) -> &mut BTreeMap<String, Well> {
        Arc::make_mut(&mut self.wells)
    }

    pub fn well(&self, name: &str) -> Option<&Well> {
        self.wells.get(name)
    }

    pub fn well_order(&self) -> &NameOrder {
        &self.well_order
    }

    pub fn well_order_mut(&mut self) -> &mut NameOrder {
        Arc::make_mut(&mut self.well_order)
    }

    pub fn groups(&self) -> &BTreeMap<String, Group> {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut BTreeMap<String, Group> {
        Arc::make_mut(&mut self.groups)
    }

    /// Group names in insertion order.
    pub fn group_names(&self) -> Vec<String> {
        let mut groups: Vec<&Group> = self.groups.values().collect();
        groups.sort_by_key(|group| group.insert_index);
        groups.into_iter().map(|group| group.name.clone()).collect()
    }

    pub fn wlist_manager(&self) -> &WListManager {
        &self.wlist_manager
    }

    pub fn wlist_manager_mut(&mut self) -> &mut WListManager {
        Arc::make_mut(&mut self.wlist_manager)
    }

    pub fn segments(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut BTreeMap<String, Vec<usize>> {
        Arc::make_mut(&mut self.segments)
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut Actions {
        Arc::make_mut(&mut self.actions)
    }

    /// Share another snapshot's action registry.
    pub(crate) fn share_actions(&mut self, other: &ScheduleState) {
        self.actions = Arc::clone(&other.actions);
    }

    pub fn action_dims(&self) -> &ActionDims {
        &self.action_dims
    }

    pub fn udq(&self) -> &UdqConfig {
        &self.udq
    }

    pub fn udq_mut(&mut self) -> &mut UdqConfig {
        Arc::make_mut(&mut self.udq)
    }

    pub fn udq_active(&self) -> &UdqActive {
        &self.udq_active
    }

    pub fn udq_active_mut(&mut self) -> &mut UdqActive {
        Arc::make_mut(&mut self.udq_active)
    }

    /// Track `value` as the argument of `wgname`'s `control`. The shared
    /// UDA table is only replaced when it changes.
    pub fn update_uda(&mut self, value: &UdaValue, wgname: &str, control: UdaControl) -> Result<bool, UdqError> {
        let mut active = (*self.udq_active).clone();
        let changed = active.update(&self.udq, value, wgname, control)?;
        if changed {
            self.udq_active = Arc::new(active);
        }
        Ok(changed)
    }

    /// Matcher over the wells defined so far, in canonical order.
    pub fn well_matcher(&self) -> WellMatcher {
        WellMatcher::with_lists((*self.well_order).clone(), (*self.wlist_manager).clone())
    }

    /// Whether two snapshots share the same well table.
    pub fn shares_wells(&self, other: &ScheduleState) -> bool {
        Arc::ptr_eq(&self.wells, &other.wells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn month_and_year_counters() {
        let s0 = ScheduleState::new(date(2020, 1, 1), UdqConfig::default(), ActionDims::default());
        let s1 = s0.next(date(2020, 1, 15));
        assert_eq!(s1.sim_step(), 1);
        assert!(!s1.first_in_month());
        assert_eq!(s1.month_num(), 0);

        let s2 = s1.next(date(2020, 2, 1));
        assert!(s2.first_in_month());
        assert!(!s2.first_in_year());
        assert_eq!(s2.month_num(), 1);

        let s3 = s2.next(date(2021, 1, 1));
        assert!(s3.first_in_year());
        assert_eq!(s3.year_num(), 1);
        assert_eq!(s3.month_num(), 2);
    }

    #[test]
    fn members_are_shared_until_written() {
        let s0 = ScheduleState::new(date(2020, 1, 1), UdqConfig::default(), ActionDims::default());
        let mut s1 = s0.next(date(2020, 2, 1));
        assert!(s1.shares_wells(&s0));
        s1.wells_mut().insert("P1".into(), Well::new("P1", "FIELD", 0));
        assert!(!s1.shares_wells(&s0));
        assert!(s0.wells().is_empty());
    }
}
