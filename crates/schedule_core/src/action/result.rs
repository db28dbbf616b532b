//! Outcome of evaluating an ACTIONX condition.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Entities for which a condition held.
///
/// `None` means the condition was not entity-qualified at all; it is the
/// neutral element for both combinations. An existing but empty set is a
/// real answer ("no well matched") and does take part in intersections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingEntities {
    wells: Option<BTreeSet<String>>,
}

impl MatchingEntities {
    pub fn from_wells<I, S>(wells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wells: Some(wells.into_iter().map(Into::into).collect()),
        }
    }

    pub fn has_well(&self, well: &str) -> bool {
        self.wells.as_ref().is_some_and(|wells| wells.contains(well))
    }

    /// Matched wells in name order; empty when not entity-qualified.
    pub fn wells(&self) -> Vec<String> {
        self.wells
            .as_ref()
            .map(|wells| wells.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_qualified(&self) -> bool {
        self.wells.is_some()
    }

    /// Drop every match. A qualified set stays qualified, only emptied.
    pub fn clear(&mut self) {
        if let Some(wells) = &mut self.wells {
            wells.clear();
        }
    }

    pub fn intersect(&mut self, rhs: &MatchingEntities) {
        let Some(rhs_wells) = &rhs.wells else {
            return;
        };
        match &mut self.wells {
            None => self.wells = Some(rhs_wells.clone()),
            Some(wells) => wells.retain(|well| rhs_wells.contains(well)),
        }
    }

    pub fn union(&mut self, rhs: &MatchingEntities) {
        let Some(rhs_wells) = &rhs.wells else {
            return;
        };
        self.wells
            .get_or_insert_with(BTreeSet::new)
            .extend(rhs_wells.iter().cloned());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    result: bool,
    matches: MatchingEntities,
}

impl ActionResult {
    pub fn new(result: bool) -> Self {
        Self {
            result,
            matches: MatchingEntities::default(),
        }
    }

    pub fn with_wells<I, S>(result: bool, wells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            result,
            matches: MatchingEntities::from_wells(wells),
        }
    }

    pub fn condition_satisfied(&self) -> bool {
        self.result
    }

    pub fn matches(&self) -> &MatchingEntities {
        &self.matches
    }

    /// OR: the boolean disjunction; matches are the union. A false outcome
    /// carries no matches.
    pub fn make_set_union(&mut self, rhs: &ActionResult) {
        self.result = self.result || rhs.result;
        if self.result {
            self.matches.union(&rhs.matches);
        } else {
            self.matches.clear();
        }
    }

    /// AND: the boolean conjunction; matches are the intersection, where an
    /// unqualified side leaves the other side's set untouched.
    pub fn make_set_intersection(&mut self, rhs: &ActionResult) {
        self.result = self.result && rhs.result;
        if self.result {
            self.matches.intersect(&rhs.matches);
        } else {
            self.matches.clear();
        }
    }
}
