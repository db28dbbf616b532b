//! The UDQ registry: every DEFINE, ASSIGN, UNITS and UPDATE seen so far.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorGuard, KeywordLocation, ParseContext, ScheduleError};
use crate::keyword::DeckRecord;
use crate::types::ReportStep;

use super::assign::{AssignSelector, UdqAssign};
use super::context::UdqContext;
use super::define::UdqDefine;
use super::enums::{var_type, UdqAction, UdqUpdate, UdqVarType};
use super::params::UdqParams;
use super::rst::{RstUdq, RstUdqEntity};
use super::set::UdqSet;
use super::state::UdqState;
use super::UdqError;

/// Position of a UDQ in input order, overall and among UDQs of its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdqIndex {
    pub insert_index: usize,
    pub typed_insert_index: usize,
    pub action: UdqAction,
    pub var_type: UdqVarType,
}

/// A registered UDQ, either computed or assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UdqInput<'a> {
    Define(&'a UdqDefine),
    Assign(&'a UdqAssign),
}

impl UdqInput<'_> {
    pub fn keyword(&self) -> &str {
        match self {
            UdqInput::Define(define) => define.keyword(),
            UdqInput::Assign(assign) => assign.keyword(),
        }
    }

    pub fn var_type(&self) -> UdqVarType {
        match self {
            UdqInput::Define(define) => define.var_type(),
            UdqInput::Assign(assign) => assign.var_type(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UdqConfig {
    params: UdqParams,
    units: BTreeMap<String, String>,
    defines: BTreeMap<String, UdqDefine>,
    assignments: BTreeMap<String, UdqAssign>,
    input_index: BTreeMap<String, UdqIndex>,
    type_count: BTreeMap<UdqVarType, usize>,
    /// ASSIGNs seen in the current report step.
    pending_assignments: BTreeSet<String>,
}

impl UdqConfig {
    pub fn new(params: UdqParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &UdqParams {
        &self.params
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Add one record of the UDQ keyword. DEFINE expression errors go through
    /// `parse_context`; other malformed records fail.
    pub fn add_record(
        &mut self,
        record: &DeckRecord,
        location: &KeywordLocation,
        report_step: ReportStep,
        parse_context: &ParseContext,
        guard: &mut ErrorGuard,
    ) -> Result<(), ScheduleError> {
        let missing = |item: usize| ScheduleError::MissingItem {
            keyword: "UDQ".to_string(),
            item,
            location: location.clone(),
        };
        let action: UdqAction = record.first().ok_or_else(|| missing(1))?.parse()?;
        let keyword = record.get(1).ok_or_else(|| missing(2))?;
        var_type(keyword)?;
        let data = &record[2..];

        match action {
            UdqAction::Units => {
                let unit = data.first().ok_or_else(|| missing(3))?;
                self.add_unit(keyword, unit)?;
            }
            UdqAction::Update => {
                let status = data.first().ok_or(UdqError::MissingUpdateStatus(keyword.clone()))?;
                self.add_update(keyword, report_step, status.parse()?)?;
            }
            UdqAction::Assign => {
                let (value, selector) = data.split_last().ok_or_else(|| missing(3))?;
                let value = value
                    .parse::<f64>()
                    .map_err(|_| UdqError::InvalidItem(value.clone()))?;
                let selector: Vec<String> = selector
                    .iter()
                    .map(|item| item.trim_matches('\'').to_string())
                    .collect();
                self.add_assign(keyword, &selector, value, report_step)?;
            }
            UdqAction::Define => {
                let define = UdqDefine::new(
                    keyword,
                    data,
                    location.clone(),
                    report_step,
                    self.params.undefined_value,
                    parse_context,
                    guard,
                );
                self.add_define(define);
            }
        }
        Ok(())
    }

    pub fn add_unit(&mut self, keyword: &str, unit: &str) -> Result<(), UdqError> {
        match self.units.get(keyword) {
            Some(existing) if existing != unit => Err(UdqError::UnitChange(keyword.to_string())),
            Some(_) => Ok(()),
            None => {
                self.units.insert(keyword.to_string(), unit.to_string());
                Ok(())
            }
        }
    }

    pub fn add_update(&mut self, keyword: &str, report_step: ReportStep, update: UdqUpdate) -> Result<(), UdqError> {
        if let Some(define) = self.defines.get_mut(keyword) {
            define.update_status(update, report_step);
            return Ok(());
        }
        if self.assignments.contains_key(keyword) {
            tracing::warn!(udq = %keyword, "UPDATE ignored for assigned UDQ");
            return Ok(());
        }
        Err(UdqError::UpdateBeforeDefine(keyword.to_string()))
    }

    pub fn add_assign(
        &mut self,
        keyword: &str,
        selector: &[String],
        value: f64,
        report_step: ReportStep,
    ) -> Result<(), UdqError> {
        let kind = var_type(keyword)?;
        let selector = AssignSelector::from_items(kind, selector)?;
        self.add_node(keyword, UdqAction::Assign);
        self.pending_assignments.insert(keyword.to_string());
        self.assignments
            .entry(keyword.to_string())
            .or_insert_with(|| UdqAssign::new(keyword))
            .add_record(selector, value, report_step);
        Ok(())
    }

    pub fn add_define(&mut self, define: UdqDefine) {
        let keyword = define.keyword().to_string();
        self.add_node(&keyword, UdqAction::Define);
        self.defines.insert(keyword, define);
    }

    /// Register `keyword` in input order. A UDQ keeps its first index when it
    /// is redefined; switching between ASSIGN and DEFINE updates the action.
    fn add_node(&mut self, keyword: &str, action: UdqAction) {
        if let Some(index) = self.input_index.get_mut(keyword) {
            index.action = action;
            return;
        }
        let kind = super::enums::target_type(keyword);
        let typed = self.type_count.entry(kind).or_insert(0);
        let index = UdqIndex {
            insert_index: self.input_index.len(),
            typed_insert_index: *typed,
            action,
            var_type: kind,
        };
        *typed += 1;
        self.input_index.insert(keyword.to_string(), index);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.defines.contains_key(keyword) || self.assignments.contains_key(keyword)
    }

    pub fn has_unit(&self, keyword: &str) -> bool {
        self.units.contains_key(keyword)
    }

    pub fn unit(&self, keyword: &str) -> Result<&str, UdqError> {
        self.units
            .get(keyword)
            .map(String::as_str)
            .ok_or_else(|| UdqError::UnknownQuantity(keyword.to_string()))
    }

    pub fn define(&self, keyword: &str) -> Option<&UdqDefine> {
        self.defines.get(keyword)
    }

    pub fn assign(&self, keyword: &str) -> Option<&UdqAssign> {
        self.assignments.get(keyword)
    }

    pub fn index(&self, keyword: &str) -> Option<&UdqIndex> {
        self.input_index.get(keyword)
    }

    /// The active input behind `keyword`.
    pub fn get(&self, keyword: &str) -> Result<UdqInput<'_>, UdqError> {
        let index = self
            .input_index
            .get(keyword)
            .ok_or_else(|| UdqError::UnknownQuantity(keyword.to_string()))?;
        let found = match index.action {
            UdqAction::Define => self.defines.get(keyword).map(UdqInput::Define),
            _ => self.assignments.get(keyword).map(UdqInput::Assign),
        };
        found.ok_or_else(|| UdqError::UnknownQuantity(keyword.to_string()))
    }

    /// Every registered UDQ in input order.
    pub fn input(&self) -> Vec<UdqInput<'_>> {
        let mut keys: Vec<(&String, &UdqIndex)> = self.input_index.iter().collect();
        keys.sort_by_key(|(_, index)| index.insert_index);
        keys.into_iter()
            .filter_map(|(keyword, _)| self.get(keyword).ok())
            .collect()
    }

    /// Every DEFINE in input order.
    pub fn definitions(&self) -> Vec<&UdqDefine> {
        self.input()
            .into_iter()
            .filter_map(|input| match input {
                UdqInput::Define(define) => Some(define),
                UdqInput::Assign(_) => None,
            })
            .collect()
    }

    pub fn definitions_of(&self, kind: UdqVarType) -> Vec<&UdqDefine> {
        self.definitions()
            .into_iter()
            .filter(|define| define.var_type() == kind)
            .collect()
    }

    pub fn size(&self) -> usize {
        self.input_index.len()
    }

    pub fn type_count(&self, kind: UdqVarType) -> usize {
        self.type_count.get(&kind).copied().unwrap_or(0)
    }

    pub fn pending_assignments(&self) -> &BTreeSet<String> {
        &self.pending_assignments
    }

    pub fn clear_pending_assignments(&mut self) {
        self.pending_assignments.clear();
    }

    /// Summary vectors the DEFINE expressions read.
    pub fn required_summary(&self, keys: &mut BTreeSet<String>) {
        for define in self.defines.values() {
            define.required_summary(keys);
        }
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Apply ASSIGNs not yet applied since they last changed. Returns the
    /// sets written.
    pub fn eval_assign(&self, report_step: ReportStep, ctx: &mut UdqContext<'_>) -> Result<Vec<UdqSet>, UdqError> {
        let mut written = Vec::new();
        for (keyword, assign) in &self.assignments {
            if self.input_index.get(keyword).map(|index| index.action) != Some(UdqAction::Assign) {
                continue;
            }
            if !ctx.udq_state().assign(keyword, assign.report_step()) {
                continue;
            }
            let result = assign.eval(ctx)?;
            ctx.update_assign(report_step, keyword, &result)?;
            written.push(result);
        }
        Ok(written)
    }

    /// Evaluate DEFINEs in input order, so a definition sees the values of
    /// those defined before it.
    pub fn eval_define(&self, report_step: ReportStep, ctx: &mut UdqContext<'_>) -> Result<Vec<UdqSet>, UdqError> {
        let mut written = Vec::new();
        for define in self.definitions() {
            if !ctx.udq_state().define(define.keyword(), define.status()) {
                continue;
            }
            let result = define.eval(ctx)?;
            ctx.update_define(report_step, define.keyword(), &result)?;
            written.push(result);
        }
        Ok(written)
    }

    /// ASSIGNs first, then DEFINEs.
    pub fn eval(&self, report_step: ReportStep, ctx: &mut UdqContext<'_>) -> Result<(Vec<UdqSet>, Vec<UdqSet>), UdqError> {
        let assigned = self.eval_assign(report_step, ctx)?;
        let defined = self.eval_define(report_step, ctx)?;
        Ok((assigned, defined))
    }

    // -----------------------------------------------------------------------
    // Restart
    // -----------------------------------------------------------------------

    pub fn from_restart(params: UdqParams, records: &[RstUdq], report_step: ReportStep) -> Result<Self, UdqError> {
        let mut config = Self::new(params);
        for record in records {
            if let Some(definition) = &record.definition {
                let mut define = UdqDefine::parse(&record.name, definition, report_step)?;
                define.update_status(record.update, report_step);
                config.add_define(define);
            } else {
                let assign = UdqAssign::from_restart(&record.name, record.scalar, &record.entities, report_step);
                config.add_node(&record.name, UdqAction::Assign);
                config.assignments.insert(record.name.clone(), assign);
            }
            if !record.unit.is_empty() {
                config.add_unit(&record.name, &record.unit)?;
            }
        }
        Ok(config)
    }

    /// Restart records for every UDQ, with current values from `state`.
    pub fn to_restart(&self, state: &UdqState) -> Vec<RstUdq> {
        self.input()
            .into_iter()
            .map(|input| {
                let name = input.keyword();
                let unit = self.units.get(name).cloned().unwrap_or_default();
                let mut record = match input {
                    UdqInput::Define(define) => {
                        RstUdq::defined(name, unit, define.input_tokens().to_vec(), define.status().0)
                    }
                    UdqInput::Assign(_) => RstUdq::assigned(name, unit),
                };
                match input.var_type() {
                    UdqVarType::WellVar => {
                        record.entities = state
                            .wells(name)
                            .into_iter()
                            .map(|(well, value)| RstUdqEntity::single(well, value))
                            .collect();
                    }
                    UdqVarType::GroupVar => {
                        record.entities = state
                            .groups(name)
                            .into_iter()
                            .map(|(group, value)| RstUdqEntity::single(group, value))
                            .collect();
                    }
                    UdqVarType::SegmentVar => record.entities = segment_entities(state.segments(name)),
                    _ => record.scalar = state.scalar(name),
                }
                record
            })
            .collect()
    }
}

fn segment_entities(values: Vec<(String, usize, f64)>) -> Vec<RstUdqEntity> {
    let mut entities: Vec<RstUdqEntity> = Vec::new();
    for (well, segment, value) in values {
        let item = (segment.saturating_sub(1), value);
        match entities.last_mut() {
            Some(entity) if entity.name == well => entity.values.push(item),
            _ => entities.push(RstUdqEntity {
                name: well,
                values: vec![item],
            }),
        }
    }
    entities
}
