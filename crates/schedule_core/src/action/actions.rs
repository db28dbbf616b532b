//! Registry of the actions in force at one report step.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::SimTime;

use super::actionx::Action;
use super::state::ActionState;

/// Actions in definition order. Names are unique; redefining a name
/// replaces the old action in place with the next id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actions {
    actions: Vec<Action>,
}

impl Actions {
    pub fn add(&mut self, mut action: Action) {
        match self.actions.iter_mut().find(|a| a.name() == action.name()) {
            Some(existing) => {
                action.set_id(existing.id() + 1);
                *existing = action;
            }
            None => self.actions.push(action),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|action| action.name() == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Whether any action could run at `sim_time`.
    pub fn ready(&self, state: &ActionState, sim_time: SimTime) -> bool {
        self.actions.iter().any(|action| action.ready(state, sim_time))
    }

    /// Actions ready to be evaluated at `sim_time`, in definition order.
    pub fn pending(&self, state: &ActionState, sim_time: SimTime) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|action| action.ready(state, sim_time))
            .collect()
    }

    /// Longest deferred block, in deck lines including the terminator.
    pub fn max_input_lines(&self) -> usize {
        self.actions
            .iter()
            .map(|action| action.keyword_strings().len())
            .max()
            .unwrap_or(0)
    }

    pub fn required_summary(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        for action in &self.actions {
            action.required_summary(&mut keys);
        }
        keys
    }
}

impl<'a> IntoIterator for &'a Actions {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionResult;

    #[test]
    fn redefinition_bumps_id_and_keeps_position() {
        let mut actions = Actions::default();
        actions.add(Action::new("A", 1, 0, 0));
        actions.add(Action::new("B", 1, 0, 0));
        actions.add(Action::new("A", 3, 0, 100));
        actions.add(Action::new("A", 3, 0, 200));

        assert_eq!(actions.len(), 2);
        let names: Vec<&str> = actions.iter().map(Action::name).collect();
        assert_eq!(names, vec!["A", "B"]);
        let a = actions.get("A").unwrap();
        assert_eq!(a.id(), 2);
        assert_eq!(a.start_time(), 200);
    }

    #[test]
    fn redefined_action_has_independent_run_state() {
        let mut state = ActionState::default();
        let mut actions = Actions::default();
        actions.add(Action::new("A", 1, 0, 0));
        let first = actions.get("A").unwrap().clone();
        state.add_run(&first, 10, ActionResult::new(true));
        assert!(!actions.ready(&state, 20));

        actions.add(Action::new("A", 1, 0, 0));
        let second = actions.get("A").unwrap();
        assert!(second.id() > first.id());
        assert_eq!(state.run_count(second), 0);
        assert_eq!(actions.pending(&state, 20).len(), 1);
    }
}
