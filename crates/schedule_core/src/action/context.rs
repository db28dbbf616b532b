use crate::matcher::{shmatch, WListManager};
use crate::summary::SummaryState;

use super::token::{func_type, FuncType};
use super::ActionError;

pub(crate) const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

pub(crate) fn month_number(name: &str) -> Option<f64> {
    MONTHS
        .iter()
        .position(|month| *month == name)
        .map(|index| (index + 1) as f64)
}

/// Read-only view of the dynamic state an ACTIONX condition is evaluated
/// against.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    summary: &'a SummaryState,
    wlm: &'a WListManager,
}

impl<'a> ActionContext<'a> {
    pub fn new(summary: &'a SummaryState, wlm: &'a WListManager) -> Self {
        Self { summary, wlm }
    }

    /// Value of an unqualified quantity. Month names resolve to 1..=12.
    pub fn get(&self, func: &str) -> Result<f64, ActionError> {
        if let Some(month) = month_number(func) {
            return Ok(month);
        }
        self.summary
            .get(func)
            .ok_or_else(|| ActionError::UnknownKey(func.to_string()))
    }

    /// Value of `func` for one entity. Well and group quantities look up
    /// the entity directly, anything else uses the `FUNC:ARG` key.
    pub fn get_entity(&self, func: &str, arg: &str) -> Result<f64, ActionError> {
        let value = match func_type(func) {
            FuncType::Well => self.summary.get_well_var(arg, func),
            FuncType::Group => self.summary.get_group_var(arg, func),
            _ => self.summary.get(&format!("{func}:{arg}")),
        };
        value.ok_or_else(|| ActionError::UnknownKey(format!("{func}:{arg}")))
    }

    /// Wells that have a value for `func`.
    pub fn wells(&self, func: &str) -> Vec<String> {
        self.summary.wells(func)
    }

    /// Wells with a value for `func` whose names match `pattern`.
    pub fn wells_matching(&self, func: &str, pattern: &str) -> Vec<String> {
        self.summary
            .wells(func)
            .into_iter()
            .filter(|well| shmatch(pattern, well))
            .collect()
    }

    pub fn groups(&self) -> Vec<String> {
        self.summary.groups()
    }

    pub fn wlist_manager(&self) -> &WListManager {
        self.wlm
    }
}
