//! UDQ values carried from one report step to the next.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::summary::SummaryState;
use crate::types::ReportStep;

use super::enums::{is_udq, UdqUpdate, UdqVarType};
use super::rst::RstUdq;
use super::set::UdqSet;
use super::UdqError;

/// Latest defined value of every UDQ, plus when each was last evaluated.
///
/// Undefined elements are never stored: writing an undefined element erases
/// the previous value for that entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqState {
    undefined_value: f64,
    scalar_values: BTreeMap<String, f64>,
    well_values: BTreeMap<String, BTreeMap<String, f64>>,
    group_values: BTreeMap<String, BTreeMap<String, f64>>,
    segment_values: BTreeMap<String, BTreeMap<String, BTreeMap<usize, f64>>>,
    /// Last report step each DEFINE was evaluated.
    defines: BTreeMap<String, ReportStep>,
    /// Last report step each ASSIGN was applied.
    assignments: BTreeMap<String, ReportStep>,
}

impl Default for UdqState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl UdqState {
    pub fn new(undefined_value: f64) -> Self {
        Self {
            undefined_value,
            scalar_values: BTreeMap::new(),
            well_values: BTreeMap::new(),
            group_values: BTreeMap::new(),
            segment_values: BTreeMap::new(),
            defines: BTreeMap::new(),
            assignments: BTreeMap::new(),
        }
    }

    pub fn undefined_value(&self) -> f64 {
        self.undefined_value
    }

    // -----------------------------------------------------------------------
    // Evaluation gating
    // -----------------------------------------------------------------------

    /// Whether a DEFINE with update `status` should be evaluated now.
    pub fn define(&self, keyword: &str, status: (UdqUpdate, ReportStep)) -> bool {
        match status.0 {
            UdqUpdate::On => true,
            UdqUpdate::Off => false,
            UdqUpdate::Next => self.defines.get(keyword).map_or(true, |last| *last < status.1),
        }
    }

    /// Whether an ASSIGN last changed at `report_step` still has to be
    /// applied.
    pub fn assign(&self, keyword: &str, report_step: ReportStep) -> bool {
        self.assignments
            .get(keyword)
            .map_or(true, |last| *last < report_step)
    }

    // -----------------------------------------------------------------------
    // Storage
    // -----------------------------------------------------------------------

    pub fn add_define(&mut self, report_step: ReportStep, keyword: &str, result: &UdqSet) -> Result<(), UdqError> {
        self.add(keyword, result)?;
        self.defines.insert(keyword.to_string(), report_step);
        Ok(())
    }

    pub fn add_assign(&mut self, report_step: ReportStep, keyword: &str, result: &UdqSet) -> Result<(), UdqError> {
        self.add(keyword, result)?;
        self.assignments.insert(keyword.to_string(), report_step);
        Ok(())
    }

    fn add(&mut self, keyword: &str, result: &UdqSet) -> Result<(), UdqError> {
        if !is_udq(keyword) {
            return Err(UdqError::NotUdqVariable(keyword.to_string()));
        }
        match result.var_type() {
            UdqVarType::WellVar => {
                store_named(self.well_values.entry(keyword.to_string()).or_default(), result);
            }
            UdqVarType::GroupVar => {
                store_named(self.group_values.entry(keyword.to_string()).or_default(), result);
            }
            UdqVarType::SegmentVar => {
                let wells = self.segment_values.entry(keyword.to_string()).or_default();
                for elem in result {
                    let (Some(well), Some(num)) = (elem.wgname(), elem.number()) else {
                        continue;
                    };
                    let segments = wells.entry(well.to_string()).or_default();
                    match elem.value() {
                        Some(value) => {
                            segments.insert(num, value);
                        }
                        None => {
                            segments.remove(&num);
                        }
                    }
                }
            }
            _ => match result.scalar_value() {
                Some(value) => {
                    self.scalar_values.insert(keyword.to_string(), value);
                }
                None => {
                    self.scalar_values.remove(keyword);
                }
            },
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn has(&self, keyword: &str) -> bool {
        self.scalar_values.contains_key(keyword)
            || self.well_values.contains_key(keyword)
            || self.group_values.contains_key(keyword)
            || self.segment_values.contains_key(keyword)
    }

    pub fn has_well_var(&self, well: &str, keyword: &str) -> bool {
        self.well_value(well, keyword).is_some()
    }

    pub fn has_group_var(&self, group: &str, keyword: &str) -> bool {
        self.group_value(group, keyword).is_some()
    }

    /// Stored scalar, if defined.
    pub fn scalar(&self, keyword: &str) -> Option<f64> {
        self.scalar_values.get(keyword).copied()
    }

    pub fn well_value(&self, well: &str, keyword: &str) -> Option<f64> {
        self.well_values.get(keyword)?.get(well).copied()
    }

    pub fn group_value(&self, group: &str, keyword: &str) -> Option<f64> {
        self.group_values.get(keyword)?.get(group).copied()
    }

    /// Scalar value. A UDQ never set, or last set undefined, is an error.
    pub fn get(&self, keyword: &str) -> Result<f64, UdqError> {
        if !is_udq(keyword) {
            return Err(UdqError::NotUdqVariable(keyword.to_string()));
        }
        self.scalar(keyword)
            .ok_or_else(|| UdqError::NoSuchUdq(keyword.to_string()))
    }

    pub fn get_well_var(&self, well: &str, keyword: &str) -> Result<f64, UdqError> {
        get_wg(&self.well_values, well, keyword, self.undefined_value)
    }

    pub fn get_group_var(&self, group: &str, keyword: &str) -> Result<f64, UdqError> {
        get_wg(&self.group_values, group, keyword, self.undefined_value)
    }

    pub fn get_segment_var(&self, well: &str, keyword: &str, segment: usize) -> Result<f64, UdqError> {
        if !is_udq(keyword) {
            return Err(UdqError::NotUdqVariable(keyword.to_string()));
        }
        let wells = self
            .segment_values
            .get(keyword)
            .ok_or_else(|| UdqError::NoSuchUdq(keyword.to_string()))?;
        wells
            .get(well)
            .and_then(|segments| segments.get(&segment))
            .copied()
            .ok_or_else(|| UdqError::NoSuchSegment {
                keyword: keyword.to_string(),
                well: well.to_string(),
                segment,
            })
    }

    /// Wells with a defined value of `keyword`, sorted by name.
    pub fn wells(&self, keyword: &str) -> Vec<(String, f64)> {
        collect_named(&self.well_values, keyword)
    }

    pub fn groups(&self, keyword: &str) -> Vec<(String, f64)> {
        collect_named(&self.group_values, keyword)
    }

    /// `(well, segment number, value)` triples of `keyword`.
    pub fn segments(&self, keyword: &str) -> Vec<(String, usize, f64)> {
        self.segment_values
            .get(keyword)
            .map(|wells| {
                wells
                    .iter()
                    .flat_map(|(well, segments)| {
                        segments.iter().map(move |(num, value)| (well.clone(), *num, *value))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Restart
    // -----------------------------------------------------------------------

    /// Write every stored value into `summary`, as evaluation would have.
    /// Used after a restart, where ASSIGNs already applied are not re-run.
    pub fn publish(&self, summary: &mut SummaryState) {
        for (keyword, value) in &self.scalar_values {
            summary.update(keyword, *value);
        }
        for (keyword, wells) in &self.well_values {
            for (well, value) in wells {
                summary.update_well_var(well, keyword, *value);
            }
        }
        for (keyword, groups) in &self.group_values {
            for (group, value) in groups {
                summary.update_group_var(group, keyword, *value);
            }
        }
    }

    /// Seed the state from restart records written at `report_step`.
    pub fn load_rst(&mut self, records: &[RstUdq], report_step: ReportStep) -> Result<(), UdqError> {
        for record in records {
            let keyword = record.name.as_str();
            if !is_udq(keyword) {
                return Err(UdqError::NotUdqVariable(keyword.to_string()));
            }
            match record.var_type() {
                UdqVarType::WellVar | UdqVarType::GroupVar => {
                    let map = if record.var_type() == UdqVarType::WellVar {
                        &mut self.well_values
                    } else {
                        &mut self.group_values
                    };
                    let values = map.entry(keyword.to_string()).or_default();
                    for entity in &record.entities {
                        if let Some((_, value)) = entity.values.first() {
                            values.insert(entity.name.clone(), *value);
                        }
                    }
                }
                UdqVarType::SegmentVar => {
                    let wells = self.segment_values.entry(keyword.to_string()).or_default();
                    for entity in &record.entities {
                        let segments = wells.entry(entity.name.clone()).or_default();
                        for (index, value) in &entity.values {
                            segments.insert(index + 1, *value);
                        }
                    }
                }
                _ => {
                    if let Some(value) = record.scalar {
                        self.scalar_values.insert(keyword.to_string(), value);
                    }
                }
            }

            if record.is_define() {
                self.defines.insert(keyword.to_string(), report_step);
            } else {
                self.assignments.insert(keyword.to_string(), report_step);
            }
        }
        Ok(())
    }
}

fn store_named(values: &mut BTreeMap<String, f64>, result: &UdqSet) {
    for elem in result {
        let Some(name) = elem.wgname() else {
            continue;
        };
        match elem.value() {
            Some(value) => {
                values.insert(name.to_string(), value);
            }
            None => {
                values.remove(name);
            }
        }
    }
}

fn get_wg(
    values: &BTreeMap<String, BTreeMap<String, f64>>,
    wgname: &str,
    keyword: &str,
    undefined_value: f64,
) -> Result<f64, UdqError> {
    if !is_udq(keyword) {
        return Err(UdqError::NotUdqVariable(keyword.to_string()));
    }
    let entities = values
        .get(keyword)
        .ok_or_else(|| UdqError::NoSuchUdq(keyword.to_string()))?;
    Ok(entities.get(wgname).copied().unwrap_or(undefined_value))
}

fn collect_named(values: &BTreeMap<String, BTreeMap<String, f64>>, keyword: &str) -> Vec<(String, f64)> {
    values
        .get(keyword)
        .map(|entities| entities.iter().map(|(name, value)| (name.clone(), *value)).collect())
        .unwrap_or_default()
}
