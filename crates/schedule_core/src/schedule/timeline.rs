//! The schedule timeline: one [`ScheduleState`] per report step, built from
//! the SCHEDULE keywords in deck order.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::action::{parse_actionx, Action, ActionDims, ActionResult, ActionState, Actions, RstAction};
use crate::error::{ErrorCategory, ErrorGuard, InputError, ParseContext, ScheduleError};
use crate::keyword::{DeckKeyword, DeckRecord};
use crate::types::{ReportStep, SimTime};
use crate::udq::{RstUdq, UdqActive, UdqConfig, UdqParams, UdqState};

use super::events::ScheduleEvent;
use super::handlers::{handle_keyword, HandlerContext, SimulatorUpdate};
use super::state::ScheduleState;

const MONTH_ALIASES: [(&str, u32); 1] = [("JLY", 7)];

/// Keywords between two report dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub start: NaiveDateTime,
    pub keywords: Vec<DeckKeyword>,
}

/// Run bookkeeping of one action in a restart file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RstActionRun {
    pub name: String,
    pub run_count: usize,
    pub last_run: SimTime,
}

/// Everything needed to resume a run at a report step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRestart {
    pub report_step: ReportStep,
    pub actions: Vec<RstAction>,
    pub action_runs: Vec<RstActionRun>,
    pub udqs: Vec<RstUdq>,
    pub udq_state: UdqState,
    pub udq_active: UdqActive,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    start: NaiveDateTime,
    blocks: Vec<ScheduleBlock>,
    snapshots: Vec<ScheduleState>,
    parse_context: ParseContext,
}

impl Schedule {
    /// Build the timeline. `DATES` records and `TSTEP` items start new
    /// report steps; every other keyword applies to the step it falls in.
    /// Recoverable input problems are collected in `guard`.
    pub fn new(
        start: NaiveDateTime,
        keywords: &[DeckKeyword],
        params: UdqParams,
        dims: ActionDims,
        parse_context: &ParseContext,
        guard: &mut ErrorGuard,
    ) -> Result<Self, ScheduleError> {
        let blocks = split_blocks(start, keywords)?;
        let mut snapshots: Vec<ScheduleState> = Vec::with_capacity(blocks.len());

        for (step, block) in blocks.iter().enumerate() {
            let mut state = match snapshots.last_mut() {
                None => ScheduleState::new(block.start, UdqConfig::new(params.clone()), dims),
                Some(prev) => {
                    prev.set_end_time(block.start);
                    prev.next(block.start)
                }
            };
            build_step(&mut state, block, step, parse_context, guard, false)?;
            snapshots.push(state);
        }

        tracing::debug!(steps = snapshots.len(), "schedule built");
        Ok(Self {
            start,
            blocks,
            snapshots,
            parse_context: parse_context.clone(),
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, report_step: ReportStep) -> Result<&ScheduleState, ScheduleError> {
        self.snapshots
            .get(report_step)
            .ok_or(ScheduleError::NoSuchStep(report_step))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleState> {
        self.snapshots.iter()
    }

    pub fn blocks(&self) -> &[ScheduleBlock] {
        &self.blocks
    }

    pub fn sim_time(&self, report_step: ReportStep) -> Result<SimTime, ScheduleError> {
        self.get(report_step).map(ScheduleState::sim_time)
    }

    /// Apply the deferred block of a fired action at `report_step`.
    ///
    /// The block is applied to the snapshot of that step; every later
    /// snapshot is then rebuilt from its own deck keywords on top of the
    /// changed state, keeping the actions it already had.
    pub fn apply_action(
        &mut self,
        report_step: ReportStep,
        action: &Action,
        result: &ActionResult,
    ) -> Result<SimulatorUpdate, ScheduleError> {
        let state = self
            .snapshots
            .get_mut(report_step)
            .ok_or(ScheduleError::NoSuchStep(report_step))?;
        let mut guard = ErrorGuard::default();
        let mut update = SimulatorUpdate::default();

        for keyword in action.keywords() {
            let mut ctx = HandlerContext {
                keyword,
                report_step,
                matches: Some(result.matches()),
                parse_context: &self.parse_context,
                guard: &mut guard,
                update: &mut update,
            };
            handle_keyword(state, &mut ctx)?;
        }
        for well in &update.affected_wells {
            state.wellgroup_events.add(well, ScheduleEvent::ActionxWellEvent);
        }
        if !update.affected_wells.is_empty() {
            state.events.add(ScheduleEvent::ActionxWellEvent);
        }
        update.welpi_wells = action.wellpi_wells(&state.well_matcher(), result.matches());
        guard.finish()?;

        self.rebuild_from(report_step + 1, true)?;
        Ok(update)
    }

    /// Rebuild snapshots from `first` on. With `keep_actions` the action
    /// registry of each old snapshot is carried over instead of re-reading
    /// its ACTIONX blocks, so action ids stay stable.
    fn rebuild_from(&mut self, first: ReportStep, keep_actions: bool) -> Result<(), ScheduleError> {
        let mut guard = ErrorGuard::default();
        for step in first..self.snapshots.len() {
            let block = &self.blocks[step];
            let mut state = self.snapshots[step - 1].next(block.start);
            if keep_actions {
                state.share_actions(&self.snapshots[step]);
            }
            if let Some(end) = self.snapshots[step].end_time() {
                state.set_end_time(end);
            }
            build_step(&mut state, block, step, &self.parse_context, &mut guard, keep_actions)?;
            self.snapshots[step] = state;
        }
        guard.finish().map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Restart
    // -----------------------------------------------------------------------

    /// Restart data for resuming after `report_step`.
    pub fn restart_data(
        &self,
        report_step: ReportStep,
        action_state: &ActionState,
        udq_state: &UdqState,
    ) -> Result<ScheduleRestart, ScheduleError> {
        let state = self.get(report_step)?;
        let mut action_runs = Vec::new();
        for action in state.actions() {
            let run_count = action_state.run_count(action);
            if run_count == 0 {
                continue;
            }
            action_runs.push(RstActionRun {
                name: action.name().to_string(),
                run_count,
                last_run: action_state.run_time(action)?,
            });
        }
        Ok(ScheduleRestart {
            report_step,
            actions: state.actions().iter().map(Action::to_restart).collect(),
            action_runs,
            udqs: state.udq().to_restart(udq_state),
            udq_state: udq_state.clone(),
            udq_active: state.udq_active().clone(),
        })
    }

    /// Replace the actions and UDQs in force at the restart step with the
    /// restart content and rebuild the later steps. Returns the run state
    /// to continue from.
    pub fn load_restart(&mut self, rst: &ScheduleRestart) -> Result<(ActionState, UdqState), ScheduleError> {
        let step = rst.report_step;
        let state = self
            .snapshots
            .get_mut(step)
            .ok_or(ScheduleError::NoSuchStep(step))?;

        let mut actions = Actions::default();
        for rst_action in &rst.actions {
            actions.add(Action::from_restart(rst_action)?);
        }
        let params = state.udq().params().clone();
        *state.udq_mut() = UdqConfig::from_restart(params, &rst.udqs, step)?;
        *state.udq_active_mut() = rst.udq_active.clone();

        let mut action_state = ActionState::default();
        action_state.load_rst(rst.action_runs.iter().filter_map(|run| {
            let action = actions.get(&run.name)?;
            Some((run.name.as_str(), action.id(), run.run_count, run.last_run))
        }));
        *state.actions_mut() = actions;

        let mut udq_state = rst.udq_state.clone();
        udq_state.load_rst(&rst.udqs, step)?;

        tracing::info!(step, actions = rst.actions.len(), udqs = rst.udqs.len(), "restart loaded");
        self.rebuild_from(step + 1, false)?;
        Ok((action_state, udq_state))
    }
}

/// Apply the keywords of one block. ACTIONX .. ENDACTIO sections register an
/// action, or are skipped when `skip_actions` is set.
fn build_step(
    state: &mut ScheduleState,
    block: &ScheduleBlock,
    step: ReportStep,
    parse_context: &ParseContext,
    guard: &mut ErrorGuard,
    skip_actions: bool,
) -> Result<(), ScheduleError> {
    let mut update = SimulatorUpdate::default();
    let mut index = 0;
    while index < block.keywords.len() {
        let keyword = &block.keywords[index];
        if keyword.name == "ACTIONX" {
            let end = block.keywords[index + 1..]
                .iter()
                .position(|kw| kw.name == "ENDACTIO")
                .map(|offset| index + 1 + offset)
                .ok_or_else(|| ScheduleError::UnterminatedAction {
                    name: keyword.records.first().and_then(|r| r.first()).cloned().unwrap_or_default(),
                    location: keyword.location.clone(),
                })?;
            if !skip_actions {
                let action = read_action(state, keyword, &block.keywords[index + 1..end], parse_context, guard)?;
                state.actions_mut().add(action);
            }
            index = end + 1;
            continue;
        }

        let mut ctx = HandlerContext {
            keyword,
            report_step: step,
            matches: None,
            parse_context,
            guard: &mut *guard,
            update: &mut update,
        };
        handle_keyword(state, &mut ctx)?;
        index += 1;
    }
    Ok(())
}

fn read_action(
    state: &ScheduleState,
    header: &DeckKeyword,
    body: &[DeckKeyword],
    parse_context: &ParseContext,
    guard: &mut ErrorGuard,
) -> Result<Action, ScheduleError> {
    let (mut action, errors) = parse_actionx(header, state.action_dims(), state.sim_time())?;
    for error in errors {
        parse_context.handle(error, guard);
    }
    for keyword in body {
        if let Err(err) = action.add_keyword(keyword.clone()) {
            let error = InputError {
                category: ErrorCategory::ActionxIllegalKeyword,
                message: err.to_string(),
                location: keyword.location.clone(),
            };
            parse_context.handle(error, guard);
        }
    }
    tracing::debug!(action = %action.name(), keywords = action.keywords().len(), "ACTIONX read");
    Ok(action)
}

// ---------------------------------------------------------------------------
// Report dates
// ---------------------------------------------------------------------------

fn split_blocks(start: NaiveDateTime, keywords: &[DeckKeyword]) -> Result<Vec<ScheduleBlock>, ScheduleError> {
    let mut blocks = vec![ScheduleBlock {
        start,
        keywords: Vec::new(),
    }];

    for keyword in keywords {
        let starts: Vec<NaiveDateTime> = match keyword.name.as_str() {
            "DATES" => keyword
                .records
                .iter()
                .map(|record| parse_date(keyword, record))
                .collect::<Result<_, _>>()?,
            "TSTEP" => {
                let mut current = blocks.last().map_or(start, |block| block.start);
                let mut starts = Vec::new();
                for item in keyword.records.iter().flatten() {
                    current += step_length(keyword, item)?;
                    starts.push(current);
                }
                starts
            }
            _ => {
                if let Some(block) = blocks.last_mut() {
                    block.keywords.push(keyword.clone());
                }
                continue;
            }
        };

        for next in starts {
            let previous = blocks.last().map_or(start, |block| block.start);
            if next <= previous {
                return Err(ScheduleError::NonMonotonicTime { step: blocks.len() });
            }
            blocks.push(ScheduleBlock {
                start: next,
                keywords: Vec::new(),
            });
        }
    }
    Ok(blocks)
}

fn invalid(keyword: &DeckKeyword, value: &str) -> ScheduleError {
    ScheduleError::InvalidItem {
        keyword: keyword.name.clone(),
        value: value.to_string(),
        location: keyword.location.clone(),
    }
}

/// A `DATES` record: day, month name, year and optional `HH:MM:SS`.
pub(crate) fn parse_date(keyword: &DeckKeyword, record: &DeckRecord) -> Result<NaiveDateTime, ScheduleError> {
    let day: u32 = keyword
        .parse_item(record, 0)?
        .ok_or_else(|| invalid(keyword, "*"))?;
    let month_name = keyword.required_item(record, 1)?.trim_matches('\'').to_ascii_uppercase();
    let year: i32 = keyword
        .parse_item(record, 2)?
        .ok_or_else(|| invalid(keyword, "*"))?;

    let month = crate::action::context::MONTHS
        .iter()
        .position(|name| *name == month_name)
        .and_then(|index| u32::try_from(index + 1).ok())
        .or_else(|| {
            MONTH_ALIASES
                .iter()
                .find(|(alias, _)| *alias == month_name)
                .map(|(_, month)| *month)
        })
        .ok_or_else(|| invalid(keyword, &month_name))?;

    let time = match keyword.item(record, 3) {
        None => NaiveTime::MIN,
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M:%S").map_err(|_| invalid(keyword, raw))?,
    };
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.and_time(time))
        .ok_or_else(|| invalid(keyword, &format!("{day} {month_name} {year}")))
}

// Sub-second step lengths are not representable.
#[allow(clippy::cast_possible_truncation)]
fn step_length(keyword: &DeckKeyword, item: &str) -> Result<TimeDelta, ScheduleError> {
    let days: f64 = item.parse().map_err(|_| invalid(keyword, item))?;
    if days <= 0.0 {
        return Err(invalid(keyword, item));
    }
    TimeDelta::try_seconds((days * 86_400.0).round() as i64).ok_or_else(|| invalid(keyword, item))
}
