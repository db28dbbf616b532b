//! Run-time view used while evaluating UDQs at one report step.

use std::collections::BTreeMap;

use crate::action::context::MONTHS;
use crate::matcher::WellMatcher;
use crate::summary::SummaryState;
use crate::types::ReportStep;

use super::enums::is_udq;
use super::function::UdqFunctionTable;
use super::params::UdqParams;
use super::set::UdqSet;
use super::state::UdqState;
use super::UdqError;

/// Simulator performance vectors a UDQ may name before the simulator has
/// produced them.
const PERFORMANCE_KEYS: [&str; 4] = ["MSUMLINS", "MSUMNEWT", "NEWTON", "TCPU"];

pub struct UdqContext<'a> {
    table: &'a mut UdqFunctionTable,
    matcher: &'a WellMatcher,
    groups: Vec<String>,
    segments: Vec<(String, usize)>,
    summary: &'a mut SummaryState,
    udq_state: &'a mut UdqState,
    values: BTreeMap<String, f64>,
}

impl<'a> UdqContext<'a> {
    pub fn new(
        table: &'a mut UdqFunctionTable,
        matcher: &'a WellMatcher,
        summary: &'a mut SummaryState,
        udq_state: &'a mut UdqState,
    ) -> Self {
        let mut values = BTreeMap::new();
        for (index, month) in MONTHS.iter().enumerate() {
            values.insert((*month).to_string(), (index + 1) as f64);
        }
        for key in PERFORMANCE_KEYS {
            values.insert(key.to_string(), 0.0);
        }
        Self {
            table,
            matcher,
            groups: Vec::new(),
            segments: Vec::new(),
            summary,
            udq_state,
            values,
        }
    }

    /// Groups known to the schedule. `FIELD` is never a group member of a
    /// group set.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups
            .into_iter()
            .map(Into::into)
            .filter(|group| group != "FIELD")
            .collect();
        self
    }

    /// Segment numbers per multi-segment well.
    pub fn with_segments(mut self, segments: &BTreeMap<String, Vec<usize>>) -> Self {
        self.segments = segments
            .iter()
            .flat_map(|(well, numbers)| numbers.iter().map(move |num| (well.clone(), *num)))
            .collect();
        self
    }

    pub fn add(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Scalar value of `key`: a UDQ from the state, a local value or a
    /// summary vector. Missing values are undefined, not errors.
    pub fn get(&self, key: &str) -> Option<f64> {
        if is_udq(key) {
            return self.udq_state.scalar(key);
        }
        self.values
            .get(key)
            .copied()
            .or_else(|| self.summary.get(key))
    }

    pub fn get_well_var(&self, well: &str, var: &str) -> Result<Option<f64>, UdqError> {
        if is_udq(var) {
            return Ok(self.udq_state.well_value(well, var));
        }
        if self.summary.has_well_var(var) {
            return Ok(self.summary.get_well_var(well, var));
        }
        Err(UdqError::UnregisteredWellVar(var.to_string()))
    }

    pub fn get_group_var(&self, group: &str, var: &str) -> Result<Option<f64>, UdqError> {
        if is_udq(var) {
            return Ok(self.udq_state.group_value(group, var));
        }
        if self.summary.has_group_var(var) {
            return Ok(self.summary.get_group_var(group, var));
        }
        Err(UdqError::UnregisteredGroupVar(var.to_string()))
    }

    pub fn wells(&self) -> &[String] {
        self.matcher.wells()
    }

    pub fn wells_matching(&self, pattern: &str) -> Vec<String> {
        self.matcher.wells_matching(pattern)
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn segment_items(&self) -> Vec<(String, usize)> {
        self.segments.clone()
    }

    pub fn function_table(&mut self) -> &mut UdqFunctionTable {
        self.table
    }

    pub fn params(&self) -> &UdqParams {
        self.table.params()
    }

    pub fn udq_state(&self) -> &UdqState {
        self.udq_state
    }

    // -----------------------------------------------------------------------
    // Publishing results
    // -----------------------------------------------------------------------

    pub fn update_assign(&mut self, report_step: ReportStep, keyword: &str, result: &UdqSet) -> Result<(), UdqError> {
        self.udq_state.add_assign(report_step, keyword, result)?;
        self.summary.update_udq(result, self.table.params().undefined_value);
        Ok(())
    }

    pub fn update_define(&mut self, report_step: ReportStep, keyword: &str, result: &UdqSet) -> Result<(), UdqError> {
        self.udq_state.add_define(report_step, keyword, result)?;
        self.summary.update_udq(result, self.table.params().undefined_value);
        Ok(())
    }
}
