//! ASSIGN records: constant values for a UDQ.

use serde::{Deserialize, Serialize};

use crate::matcher::shmatch;
use crate::types::ReportStep;

use super::context::UdqContext;
use super::enums::{target_type, UdqVarType};
use super::rst::RstUdqEntity;
use super::set::UdqSet;
use super::UdqError;

/// Which elements of the target set an [`AssignRecord`] touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignSelector {
    /// Every element.
    All,
    /// Wells or groups by name, pattern or well list. Matching happens when
    /// the record is evaluated.
    Names(Vec<String>),
    /// Segments of wells matching `well`; every segment when `segment` is
    /// `None`.
    Segment { well: String, segment: Option<usize> },
    /// Explicit `(well, segment number)` pairs, segment numbers one-based.
    Items(Vec<(String, usize)>),
}

impl AssignSelector {
    /// Selector from the items between the UDQ name and the value of an
    /// ASSIGN record.
    pub fn from_items(var_type: UdqVarType, items: &[String]) -> Result<Self, UdqError> {
        let Some(first) = items.first() else {
            return Ok(AssignSelector::All);
        };
        if var_type != UdqVarType::SegmentVar {
            if items.len() == 1 && first == "*" {
                return Ok(AssignSelector::All);
            }
            return Ok(AssignSelector::Names(items.to_vec()));
        }
        let segment = match items.get(1).map(String::as_str) {
            None | Some("*") => None,
            Some(raw) => Some(
                raw.parse::<usize>()
                    .map_err(|_| UdqError::InvalidItem(raw.to_string()))?,
            ),
        };
        Ok(AssignSelector::Segment {
            well: first.clone(),
            segment,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignRecord {
    pub selector: AssignSelector,
    pub value: f64,
    pub report_step: ReportStep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqAssign {
    keyword: String,
    var_type: UdqVarType,
    records: Vec<AssignRecord>,
}

impl UdqAssign {
    pub fn new(keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        Self {
            var_type: target_type(&keyword),
            keyword,
            records: Vec::new(),
        }
    }

    /// Rebuild the records of an assigned UDQ from per-entity restart
    /// values. Entities sharing one value collapse into a single record;
    /// otherwise every entity gets its own.
    pub fn from_restart(
        keyword: impl Into<String>,
        scalar: Option<f64>,
        entities: &[RstUdqEntity],
        report_step: ReportStep,
    ) -> Self {
        let mut assign = Self::new(keyword);
        match assign.var_type {
            UdqVarType::WellVar | UdqVarType::GroupVar => {
                assign.add_well_or_group_records(entities, report_step);
            }
            UdqVarType::SegmentVar => assign.add_segment_records(entities, report_step),
            _ => {
                if let Some(value) = scalar {
                    assign.add_record(AssignSelector::All, value, report_step);
                }
            }
        }
        assign
    }

    pub fn add_record(&mut self, selector: AssignSelector, value: f64, report_step: ReportStep) {
        self.records.push(AssignRecord {
            selector,
            value,
            report_step,
        });
    }

    pub fn add_well_or_group_records(&mut self, entities: &[RstUdqEntity], report_step: ReportStep) {
        let values: Vec<(&str, f64)> = entities
            .iter()
            .filter_map(|entity| entity.values.first().map(|(_, value)| (entity.name.as_str(), *value)))
            .collect();
        let Some((_, first)) = values.first() else {
            return;
        };

        if values.iter().all(|(_, value)| (value - first).abs() < f64::EPSILON) {
            let names = values.iter().map(|(name, _)| (*name).to_string()).collect();
            self.add_record(AssignSelector::Names(names), *first, report_step);
            return;
        }
        for (name, value) in values {
            self.add_record(AssignSelector::Names(vec![name.to_string()]), value, report_step);
        }
    }

    /// Restart segment indices are zero-based.
    pub fn add_segment_records(&mut self, entities: &[RstUdqEntity], report_step: ReportStep) {
        let items: Vec<((String, usize), f64)> = entities
            .iter()
            .flat_map(|entity| {
                entity
                    .values
                    .iter()
                    .map(|(index, value)| ((entity.name.clone(), index + 1), *value))
            })
            .collect();
        let Some((_, first)) = items.first() else {
            return;
        };
        let first = *first;

        if items.iter().all(|(_, value)| (value - first).abs() < f64::EPSILON) {
            let pairs = items.into_iter().map(|(item, _)| item).collect();
            self.add_record(AssignSelector::Items(pairs), first, report_step);
            return;
        }
        for (item, value) in items {
            self.add_record(AssignSelector::Items(vec![item]), value, report_step);
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn var_type(&self) -> UdqVarType {
        self.var_type
    }

    pub fn records(&self) -> &[AssignRecord] {
        &self.records
    }

    /// Step of the most recent record.
    pub fn report_step(&self) -> ReportStep {
        self.records.last().map_or(0, |record| record.report_step)
    }

    /// Apply every record in order; later records win.
    pub fn eval(&self, ctx: &UdqContext<'_>) -> Result<UdqSet, UdqError> {
        match self.var_type {
            UdqVarType::WellVar => Ok(self.eval_wells(ctx)),
            UdqVarType::GroupVar => Ok(self.eval_groups(ctx.groups())),
            UdqVarType::SegmentVar => Ok(self.eval_segments(&ctx.segment_items())),
            UdqVarType::FieldVar => Ok(UdqSet::field(&self.keyword, self.last_value())),
            UdqVarType::Scalar => Ok(UdqSet::scalar(&self.keyword, self.last_value())),
            other => Err(UdqError::UnsupportedTarget {
                expr: format!("ASSIGN {}", self.keyword),
                target: other.name(),
            }),
        }
    }

    /// Names are matched through the context's well matcher, so patterns
    /// and well lists work. A name matching no well assigns nothing.
    pub fn eval_wells(&self, ctx: &UdqContext<'_>) -> UdqSet {
        let mut set = UdqSet::wells(&self.keyword, ctx.wells(), None);
        for record in &self.records {
            match &record.selector {
                AssignSelector::All => set.assign_all(Some(record.value)),
                AssignSelector::Names(names) => {
                    for name in names {
                        for well in ctx.wells_matching(name) {
                            assign_matching(&mut set, &well, record.value);
                        }
                    }
                }
                AssignSelector::Segment { .. } | AssignSelector::Items(_) => {}
            }
        }
        set
    }

    pub fn eval_groups(&self, groups: &[String]) -> UdqSet {
        let mut set = UdqSet::groups(&self.keyword, groups, None);
        for record in &self.records {
            match &record.selector {
                AssignSelector::All => set.assign_all(Some(record.value)),
                AssignSelector::Names(names) => {
                    for name in names {
                        assign_matching(&mut set, name, record.value);
                    }
                }
                AssignSelector::Segment { .. } | AssignSelector::Items(_) => {}
            }
        }
        set
    }

    pub fn eval_segments(&self, items: &[(String, usize)]) -> UdqSet {
        let mut set = UdqSet::segments(&self.keyword, items, None);
        for record in &self.records {
            for index in 0..set.len() {
                let Some(elem) = set.get(index) else {
                    continue;
                };
                let (Some(well), Some(num)) = (elem.wgname(), elem.number()) else {
                    continue;
                };
                let selected = match &record.selector {
                    AssignSelector::All => true,
                    AssignSelector::Segment { well: pattern, segment } => {
                        shmatch(pattern, well) && segment.map_or(true, |seg| seg == num)
                    }
                    AssignSelector::Items(pairs) => pairs.iter().any(|(w, n)| w == well && *n == num),
                    AssignSelector::Names(names) => names.iter().any(|pattern| shmatch(pattern, well)),
                };
                if selected {
                    set.assign_index(index, record.value);
                }
            }
        }
        set
    }

    fn last_value(&self) -> Option<f64> {
        self.records.last().map(|record| record.value)
    }
}

fn assign_matching(set: &mut UdqSet, pattern: &str, value: f64) {
    for index in 0..set.len() {
        if set
            .get(index)
            .and_then(|elem| elem.wgname())
            .is_some_and(|name| shmatch(pattern, name))
        {
            set.assign_index(index, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn selector_from_record_items() {
        assert_eq!(
            AssignSelector::from_items(UdqVarType::WellVar, &[]).unwrap(),
            AssignSelector::All
        );
        assert_eq!(
            AssignSelector::from_items(UdqVarType::WellVar, &names(&["*"])).unwrap(),
            AssignSelector::All
        );
        assert_eq!(
            AssignSelector::from_items(UdqVarType::SegmentVar, &names(&["P1", "3"])).unwrap(),
            AssignSelector::Segment {
                well: "P1".into(),
                segment: Some(3)
            }
        );
        assert!(AssignSelector::from_items(UdqVarType::SegmentVar, &names(&["P1", "x"])).is_err());
    }

    #[test]
    fn group_records_apply_in_order() {
        let mut assign = UdqAssign::new("GUX");
        assign.add_record(AssignSelector::All, 1.0, 1);
        assign.add_record(AssignSelector::Names(names(&["G2"])), 5.0, 1);
        let set = assign.eval_groups(&names(&["G1", "G2", "G3"]));
        assert_eq!(set.get_named("G1").unwrap().value(), Some(1.0));
        assert_eq!(set.get_named("G2").unwrap().value(), Some(5.0));
        assert_eq!(assign.report_step(), 1);
    }

    #[test]
    fn uniform_restart_values_collapse_into_one_record() {
        let entities = vec![RstUdqEntity::single("P1", 2.0), RstUdqEntity::single("P2", 2.0)];
        let assign = UdqAssign::from_restart("WUX", None, &entities, 3);
        assert_eq!(assign.records().len(), 1);
        assert_eq!(assign.records()[0].selector, AssignSelector::Names(names(&["P1", "P2"])));
    }

    #[test]
    fn varying_restart_values_round_trip_per_well() {
        use crate::matcher::{NameOrder, WellMatcher};
        use crate::summary::SummaryState;
        use crate::udq::{UdqFunctionTable, UdqState};

        let table_values = [("OP1", 1.0), ("OP2", 2.0), ("OP3", 1.0)];
        let entities: Vec<RstUdqEntity> = table_values
            .iter()
            .map(|(well, value)| RstUdqEntity::single(*well, *value))
            .collect();
        let assign = UdqAssign::from_restart("WUX", None, &entities, 3);
        assert_eq!(assign.records().len(), 3);

        let matcher = WellMatcher::new(["OP1", "OP2", "OP3"].into_iter().collect::<NameOrder>());
        let mut table = UdqFunctionTable::default();
        let mut summary = SummaryState::default();
        let mut state = UdqState::default();
        let ctx = UdqContext::new(&mut table, &matcher, &mut summary, &mut state);
        let set = assign.eval(&ctx).unwrap();

        assert_eq!(set.len(), 3);
        for (well, value) in table_values {
            assert_eq!(set.get_named(well).unwrap().value(), Some(value), "{well}");
        }
    }

    #[test]
    fn varying_restart_values_round_trip_per_group() {
        let entities = vec![RstUdqEntity::single("G1", 4.0), RstUdqEntity::single("G2", 8.0)];
        let assign = UdqAssign::from_restart("GUX", None, &entities, 0);
        let set = assign.eval_groups(&names(&["G1", "G2", "G3"]));
        assert_eq!(set.get_named("G1").unwrap().value(), Some(4.0));
        assert_eq!(set.get_named("G2").unwrap().value(), Some(8.0));
        assert_eq!(set.get_named("G3").unwrap().value(), None);
    }

    #[test]
    fn segment_restart_indices_are_zero_based() {
        let entities = vec![RstUdqEntity {
            name: "MSW".into(),
            values: vec![(0, 1.0), (2, 3.0)],
        }];
        let assign = UdqAssign::from_restart("SUX", None, &entities, 0);
        let set = assign.eval_segments(&[("MSW".into(), 1), ("MSW".into(), 2), ("MSW".into(), 3)]);
        assert_eq!(set.get_segment("MSW", 1).unwrap().value(), Some(1.0));
        assert_eq!(set.get_segment("MSW", 2).unwrap().value(), None);
        assert_eq!(set.get_segment("MSW", 3).unwrap().value(), Some(3.0));
    }

    #[test]
    fn scalar_assign_uses_last_record() {
        let mut assign = UdqAssign::from_restart("FUX", Some(7.0), &[], 0);
        assign.add_record(AssignSelector::All, 9.0, 2);
        assert_eq!(assign.last_value(), Some(9.0));
    }
}
