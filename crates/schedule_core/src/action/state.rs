//! Run bookkeeping for actions, kept per (name, id) so a redefined action
//! starts from a clean slate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::SimTime;

use super::actionx::Action;
use super::result::ActionResult;
use super::ActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub run_count: usize,
    pub last_run: SimTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    runs: BTreeMap<String, BTreeMap<usize, RunState>>,
    last_results: BTreeMap<String, ActionResult>,
}

impl ActionState {
    pub fn run_count(&self, action: &Action) -> usize {
        self.run_state(action).map_or(0, |run| run.run_count)
    }

    pub fn run_time(&self, action: &Action) -> Result<SimTime, ActionError> {
        self.run_state(action)
            .map(|run| run.last_run)
            .ok_or_else(|| ActionError::NeverRun(action.name().to_string()))
    }

    /// Record a successful evaluation at `sim_time`.
    pub fn add_run(&mut self, action: &Action, sim_time: SimTime, result: ActionResult) {
        let run = self
            .runs
            .entry(action.name().to_string())
            .or_default()
            .entry(action.id())
            .or_insert(RunState {
                run_count: 0,
                last_run: sim_time,
            });
        run.run_count += 1;
        run.last_run = sim_time;
        self.last_results.insert(action.name().to_string(), result);
    }

    /// Result of the most recent successful run of `name`, any id.
    pub fn result(&self, name: &str) -> Option<&ActionResult> {
        self.last_results.get(name)
    }

    /// Restore run bookkeeping from restart data: `(name, id, run_count,
    /// last_run)` per action.
    pub fn load_rst<'a, I>(&mut self, runs: I)
    where
        I: IntoIterator<Item = (&'a str, usize, usize, SimTime)>,
    {
        for (name, id, run_count, last_run) in runs {
            if run_count == 0 {
                continue;
            }
            self.runs
                .entry(name.to_string())
                .or_default()
                .insert(id, RunState { run_count, last_run });
        }
    }

    fn run_state(&self, action: &Action) -> Option<&RunState> {
        self.runs.get(action.name())?.get(&action.id())
    }
}
