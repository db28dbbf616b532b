//! Dynamic summary values read by ACTIONX conditions and UDQ expressions.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::udq::UdqSet;

/// Current values of field/misc vectors and per-well and per-group vectors.
///
/// Well and group values are keyed by variable first, so the wells carrying a
/// given variable can be listed without scanning every well.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryState {
    #[serde(default)]
    values: AHashMap<String, f64>,
    #[serde(default)]
    well_values: AHashMap<String, AHashMap<String, f64>>,
    #[serde(default)]
    group_values: AHashMap<String, AHashMap<String, f64>>,
}

impl SummaryState {
    pub fn update(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn update_well_var(&mut self, well: &str, var: &str, value: f64) {
        self.well_values
            .entry(var.to_string())
            .or_default()
            .insert(well.to_string(), value);
    }

    pub fn get_well_var(&self, well: &str, var: &str) -> Option<f64> {
        self.well_values.get(var)?.get(well).copied()
    }

    pub fn has_well_var(&self, var: &str) -> bool {
        self.well_values.contains_key(var)
    }

    /// Wells with a value for `var`, sorted by name.
    pub fn wells(&self, var: &str) -> Vec<String> {
        let mut wells: Vec<String> = self
            .well_values
            .get(var)
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default();
        wells.sort();
        wells
    }

    pub fn update_group_var(&mut self, group: &str, var: &str, value: f64) {
        self.group_values
            .entry(var.to_string())
            .or_default()
            .insert(group.to_string(), value);
    }

    pub fn get_group_var(&self, group: &str, var: &str) -> Option<f64> {
        self.group_values.get(var)?.get(group).copied()
    }

    pub fn has_group_var(&self, var: &str) -> bool {
        self.group_values.contains_key(var)
    }

    /// Groups with a value for any variable, sorted by name.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self
            .group_values
            .values()
            .flat_map(|values| values.keys().cloned())
            .collect();
        groups.sort();
        groups.dedup();
        groups
    }

    /// Publish a UDQ result so later summary and ACTIONX lookups can see it.
    /// Undefined elements are written as `undefined_value`.
    pub fn update_udq(&mut self, set: &UdqSet, undefined_value: f64) {
        use crate::udq::UdqVarType;

        match set.var_type() {
            UdqVarType::WellVar => {
                for elem in set.iter() {
                    if let Some(well) = elem.wgname() {
                        let value = elem.value().unwrap_or(undefined_value);
                        self.update_well_var(well, set.name(), value);
                    }
                }
            }
            UdqVarType::GroupVar => {
                for elem in set.iter() {
                    if let Some(group) = elem.wgname() {
                        let value = elem.value().unwrap_or(undefined_value);
                        self.update_group_var(group, set.name(), value);
                    }
                }
            }
            UdqVarType::Scalar | UdqVarType::FieldVar => {
                let value = set
                    .iter()
                    .next()
                    .and_then(|elem| elem.value())
                    .unwrap_or(undefined_value);
                self.update(set.name(), value);
            }
            _ => {}
        }
    }
}
