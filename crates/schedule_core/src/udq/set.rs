//! Evaluated UDQ values: one possibly undefined number per entity.

use serde::{Deserialize, Serialize};

use crate::matcher::shmatch;

use super::enums::UdqVarType;
use super::UdqError;

/// One element of a [`UdqSet`]. Non-finite values are stored as undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqScalar {
    value: Option<f64>,
    wgname: Option<String>,
    num: Option<usize>,
}

impl UdqScalar {
    pub fn new(value: Option<f64>) -> Self {
        Self {
            value: value.filter(|v| v.is_finite()),
            wgname: None,
            num: None,
        }
    }

    fn named(wgname: &str, num: Option<usize>, value: Option<f64>) -> Self {
        Self {
            wgname: Some(wgname.to_string()),
            num,
            ..Self::new(value)
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }

    pub fn assign(&mut self, value: Option<f64>) {
        self.value = value.filter(|v| v.is_finite());
    }

    /// Well or group the value belongs to.
    pub fn wgname(&self) -> Option<&str> {
        self.wgname.as_deref()
    }

    /// One-based segment number for segment sets.
    pub fn number(&self) -> Option<usize> {
        self.num
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqSet {
    name: String,
    var_type: UdqVarType,
    values: Vec<UdqScalar>,
}

impl UdqSet {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    pub fn scalar(name: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            name: name.into(),
            var_type: UdqVarType::Scalar,
            values: vec![UdqScalar::new(value)],
        }
    }

    pub fn field(name: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            var_type: UdqVarType::FieldVar,
            ..Self::scalar(name, value)
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type: UdqVarType::None,
            values: Vec::new(),
        }
    }

    pub fn wells(name: impl Into<String>, wells: &[String], value: Option<f64>) -> Self {
        Self::named_set(name, UdqVarType::WellVar, wells, value)
    }

    pub fn groups(name: impl Into<String>, groups: &[String], value: Option<f64>) -> Self {
        Self::named_set(name, UdqVarType::GroupVar, groups, value)
    }

    /// One element per `(well, segment number)` pair.
    pub fn segments(name: impl Into<String>, items: &[(String, usize)], value: Option<f64>) -> Self {
        Self {
            name: name.into(),
            var_type: UdqVarType::SegmentVar,
            values: items
                .iter()
                .map(|(well, num)| UdqScalar::named(well, Some(*num), value))
                .collect(),
        }
    }

    fn named_set(
        name: impl Into<String>,
        var_type: UdqVarType,
        names: &[String],
        value: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            var_type,
            values: names
                .iter()
                .map(|wgname| UdqScalar::named(wgname, None, value))
                .collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn var_type(&self) -> UdqVarType {
        self.var_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UdqScalar> {
        self.values.iter()
    }

    pub fn get(&self, index: usize) -> Option<&UdqScalar> {
        self.values.get(index)
    }

    pub fn get_named(&self, wgname: &str) -> Option<&UdqScalar> {
        self.values.iter().find(|elem| elem.wgname() == Some(wgname))
    }

    pub fn get_segment(&self, well: &str, segment: usize) -> Option<&UdqScalar> {
        self.values
            .iter()
            .find(|elem| elem.wgname() == Some(well) && elem.number() == Some(segment))
    }

    /// Value of a single-element set.
    pub fn scalar_value(&self) -> Option<f64> {
        match self.values.as_slice() {
            [only] => only.value(),
            _ => None,
        }
    }

    pub fn wgnames(&self) -> Vec<&str> {
        self.values.iter().filter_map(UdqScalar::wgname).collect()
    }

    pub fn defined_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(UdqScalar::value).collect()
    }

    pub fn defined_size(&self) -> usize {
        self.values.iter().filter(|elem| elem.is_defined()).count()
    }

    // -----------------------------------------------------------------------
    // Assignment
    // -----------------------------------------------------------------------

    pub fn assign_index(&mut self, index: usize, value: f64) {
        self.assign_value(index, Some(value));
    }

    pub fn assign_value(&mut self, index: usize, value: Option<f64>) {
        if let Some(elem) = self.values.get_mut(index) {
            elem.assign(value);
        }
    }

    pub fn assign_all(&mut self, value: Option<f64>) {
        for elem in &mut self.values {
            elem.assign(value);
        }
    }

    /// Assign `value` to every element whose name matches `pattern`.
    pub fn assign(&mut self, pattern: &str, value: f64) -> Result<(), UdqError> {
        let mut matched = false;
        for elem in &mut self.values {
            if elem.wgname().is_some_and(|name| shmatch(pattern, name)) {
                elem.assign(Some(value));
                matched = true;
            }
        }
        if matched {
            Ok(())
        } else {
            Err(UdqError::NoMatch(pattern.to_string()))
        }
    }

    pub fn assign_segment(&mut self, well: &str, segment: usize, value: f64) -> Result<(), UdqError> {
        let elem = self
            .values
            .iter_mut()
            .find(|elem| elem.wgname() == Some(well) && elem.number() == Some(segment))
            .ok_or_else(|| UdqError::NoSuchSegment {
                keyword: self.name.clone(),
                well: well.to_string(),
                segment,
            })?;
        elem.assign(Some(value));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Element-wise combination
    // -----------------------------------------------------------------------

    /// Apply `f` to every defined element.
    pub fn map_defined(&self, f: impl Fn(f64) -> f64) -> UdqSet {
        let mut result = self.clone();
        for elem in &mut result.values {
            if let Some(value) = elem.value {
                elem.assign(Some(f(value)));
            }
        }
        result
    }

    /// Combine with `rhs` element by element. A single scalar-like value on
    /// either side is broadcast over the other side; otherwise both sides
    /// must have the same shape. `f` sees undefined elements as `None`.
    pub fn zip_with(
        &self,
        rhs: &UdqSet,
        f: impl Fn(Option<f64>, Option<f64>) -> Option<f64>,
    ) -> Result<UdqSet, UdqError> {
        let same_shape = self.len() == rhs.len()
            && (self.var_type == rhs.var_type
                || (self.var_type.is_scalar_like() && rhs.var_type.is_scalar_like()));

        if same_shape {
            let mut result = self.clone();
            for (elem, other) in result.values.iter_mut().zip(&rhs.values) {
                elem.assign(f(elem.value, other.value));
            }
            return Ok(result);
        }
        if rhs.is_broadcast() {
            let other = rhs.values[0].value;
            let mut result = self.clone();
            for elem in &mut result.values {
                elem.assign(f(elem.value, other));
            }
            return Ok(result);
        }
        if self.is_broadcast() {
            let own = self.values[0].value;
            let mut result = rhs.clone();
            result.name.clone_from(&self.name);
            for elem in &mut result.values {
                elem.assign(f(own, elem.value));
            }
            return Ok(result);
        }
        Err(UdqError::SizeMismatch {
            lhs: self.name.clone(),
            lhs_size: self.len(),
            rhs: rhs.name.clone(),
            rhs_size: rhs.len(),
        })
    }

    /// Arithmetic on defined pairs; any undefined side gives undefined.
    pub fn arith(&self, rhs: &UdqSet, f: impl Fn(f64, f64) -> f64) -> Result<UdqSet, UdqError> {
        self.zip_with(rhs, |x, y| Some(f(x?, y?)))
    }

    fn is_broadcast(&self) -> bool {
        self.values.len() == 1 && self.var_type.is_scalar_like()
    }
}

impl<'a> IntoIterator for &'a UdqSet {
    type Item = &'a UdqScalar;
    type IntoIter = std::slice::Iter<'a, UdqScalar>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn non_finite_values_are_undefined() {
        let mut set = UdqSet::scalar("FUX", Some(f64::NAN));
        assert!(!set.get(0).unwrap().is_defined());
        set.assign_index(0, f64::INFINITY);
        assert_eq!(set.defined_size(), 0);
        set.assign_index(0, 2.0);
        assert_eq!(set.scalar_value(), Some(2.0));
    }

    #[test]
    fn assign_by_pattern() {
        let mut set = UdqSet::wells("WUX", &names(&["OP1", "OP2", "WI1"]), None);
        set.assign("OP*", 1.0).unwrap();
        assert_eq!(set.defined_values(), vec![1.0, 1.0]);
        assert!(set.get_named("WI1").is_some_and(|elem| !elem.is_defined()));
        assert_eq!(set.assign("XX*", 1.0), Err(UdqError::NoMatch("XX*".into())));
    }

    #[test]
    fn segment_assignment() {
        let items = vec![("MSW".to_string(), 1), ("MSW".to_string(), 2)];
        let mut set = UdqSet::segments("SUX", &items, None);
        set.assign_segment("MSW", 2, 5.0).unwrap();
        assert_eq!(set.get_segment("MSW", 2).and_then(UdqScalar::value), Some(5.0));
        assert!(set.assign_segment("MSW", 3, 1.0).is_err());
    }

    #[test]
    fn scalar_broadcasts_over_wells() {
        let mut wells = UdqSet::wells("WOPR", &names(&["P1", "P2"]), Some(10.0));
        wells.assign_value(1, None);
        let two = UdqSet::scalar("2", Some(2.0));

        let right = wells.arith(&two, |x, y| x * y).unwrap();
        assert_eq!(right.var_type(), UdqVarType::WellVar);
        assert_eq!(right.defined_values(), vec![20.0]);

        let left = two.arith(&wells, |x, y| x - y).unwrap();
        assert_eq!(left.wgnames(), vec!["P1", "P2"]);
        assert_eq!(left.defined_values(), vec![-8.0]);
    }

    #[test]
    fn mismatched_sets_fail() {
        let a = UdqSet::wells("A", &names(&["P1", "P2"]), Some(1.0));
        let b = UdqSet::wells("B", &names(&["P1"]), Some(1.0));
        assert!(matches!(a.arith(&b, |x, y| x + y), Err(UdqError::SizeMismatch { .. })));
    }

    #[test]
    fn division_by_zero_is_undefined() {
        let a = UdqSet::scalar("A", Some(1.0));
        let zero = UdqSet::scalar("B", Some(0.0));
        assert_eq!(a.arith(&zero, |x, y| x / y).unwrap().scalar_value(), None);
    }
}
