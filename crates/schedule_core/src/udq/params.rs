//! `UDQPARAM`: numeric settings shared by every UDQ evaluation.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::keyword::DeckKeyword;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqParams {
    /// Restart the reproducible random stream from `rand_seed` at every
    /// report step.
    #[serde(default)]
    pub reseed: bool,
    #[serde(default = "default_rand_seed")]
    pub rand_seed: u64,
    /// Values with a larger magnitude are treated as undefined.
    #[serde(default = "default_range")]
    pub range: f64,
    /// Written to the summary for undefined UDQ elements.
    #[serde(default)]
    pub undefined_value: f64,
    /// Relative tolerance of the comparison operators.
    #[serde(default = "default_cmp_epsilon")]
    pub cmp_epsilon: f64,
}

fn default_rand_seed() -> u64 {
    1
}

fn default_range() -> f64 {
    1e20
}

fn default_cmp_epsilon() -> f64 {
    1e-4
}

impl Default for UdqParams {
    fn default() -> Self {
        Self {
            reseed: false,
            rand_seed: default_rand_seed(),
            range: default_range(),
            undefined_value: 0.0,
            cmp_epsilon: default_cmp_epsilon(),
        }
    }
}

impl UdqParams {
    /// Read `UDQPARAM`: seed, range, undefined value, comparison epsilon.
    /// Defaulted items keep the values already in `self`.
    pub fn apply_keyword(&mut self, keyword: &DeckKeyword) -> Result<(), ScheduleError> {
        let Some(record) = keyword.records.first() else {
            return Ok(());
        };
        if let Some(seed) = keyword.parse_item::<u64>(record, 0)? {
            self.rand_seed = seed;
        }
        if let Some(range) = keyword.parse_item::<f64>(record, 1)? {
            self.range = range;
        }
        if let Some(undefined_value) = keyword.parse_item::<f64>(record, 2)? {
            self.undefined_value = undefined_value;
        }
        if let Some(eps) = keyword.parse_item::<f64>(record, 3)? {
            self.cmp_epsilon = eps;
        }
        Ok(())
    }
}
