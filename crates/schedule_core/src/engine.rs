use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionContext, ActionResult, ActionState};
use crate::error::ScheduleError;
use crate::schedule::{Schedule, ScheduleRestart};
use crate::summary::SummaryState;
use crate::types::{Counters, Event, EventEnvelope, ReportStep};
use crate::udq::{UdqContext, UdqFunctionTable, UdqState};
use crate::emit;

/// Dynamic state carried from one report step to the next.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Simulation {
    pub summary: SummaryState,
    pub udq_state: UdqState,
    pub action_state: ActionState,
    pub counters: Counters,
}

impl Simulation {
    pub fn new(undefined_value: f64) -> Self {
        Self {
            udq_state: UdqState::new(undefined_value),
            ..Self::default()
        }
    }

    /// Resume after the restart step. `summary` holds the dynamic values;
    /// the restored UDQ values are published on top of it, so ASSIGNs that
    /// will not be applied again are still visible.
    pub fn restart(
        schedule: &mut Schedule,
        rst: &ScheduleRestart,
        mut summary: SummaryState,
    ) -> Result<Self, ScheduleError> {
        let (action_state, udq_state) = schedule.load_restart(rst)?;
        udq_state.publish(&mut summary);
        Ok(Self {
            summary,
            udq_state,
            action_state,
            counters: Counters::default(),
        })
    }
}

/// Evaluate one report step.
///
/// Order of operations:
/// 1. Apply UDQ ASSIGN records, then evaluate DEFINE expressions; results
///    go to the UDQ state and the summary.
/// 2. Evaluate every ready action against the summary.
/// 3. Apply the keyword blocks of the actions that fired, in definition order.
///
/// Returns all events produced this step.
pub fn run_step(
    schedule: &mut Schedule,
    sim: &mut Simulation,
    report_step: ReportStep,
    table: &mut UdqFunctionTable,
) -> Result<Vec<EventEnvelope>, ScheduleError> {
    let mut events = Vec::new();

    evaluate_udqs(schedule, sim, report_step, table, &mut events)?;
    let fired = evaluate_actions(schedule, sim, report_step, &mut events)?;
    apply_actions(schedule, sim, report_step, fired, &mut events)?;

    Ok(events)
}

fn evaluate_udqs(
    schedule: &Schedule,
    sim: &mut Simulation,
    report_step: ReportStep,
    table: &mut UdqFunctionTable,
    events: &mut Vec<EventEnvelope>,
) -> Result<(), ScheduleError> {
    let state = schedule.get(report_step)?;
    if table.params().reseed {
        let seed = table.params().rand_seed;
        table.reseed(seed);
    }

    let matcher = state.well_matcher();
    let mut ctx = UdqContext::new(table, &matcher, &mut sim.summary, &mut sim.udq_state)
        .with_groups(state.group_names())
        .with_segments(state.segments());
    let (assigned, defined) = state.udq().eval(report_step, &mut ctx)?;

    for set in assigned {
        let event = Event::UdqAssigned {
            keyword: set.name().to_string(),
            defined: set.defined_size(),
        };
        events.push(emit(&mut sim.counters, report_step, event));
    }
    for set in defined {
        let event = Event::UdqDefined {
            keyword: set.name().to_string(),
            defined: set.defined_size(),
        };
        events.push(emit(&mut sim.counters, report_step, event));
    }
    Ok(())
}

fn evaluate_actions(
    schedule: &Schedule,
    sim: &mut Simulation,
    report_step: ReportStep,
    events: &mut Vec<EventEnvelope>,
) -> Result<Vec<(Action, ActionResult)>, ScheduleError> {
    let state = schedule.get(report_step)?;
    let sim_time = state.sim_time();
    let ctx = ActionContext::new(&sim.summary, state.wlist_manager());

    let pending: Vec<Action> = state
        .actions()
        .pending(&sim.action_state, sim_time)
        .into_iter()
        .cloned()
        .collect();

    let mut fired = Vec::new();
    for action in pending {
        let result = action.eval(&ctx)?;
        let triggered = result.condition_satisfied();
        tracing::debug!(action = %action.name(), id = action.id(), triggered, "action evaluated");
        events.push(emit(
            &mut sim.counters,
            report_step,
            Event::ActionEvaluated {
                name: action.name().to_string(),
                id: action.id(),
                triggered,
            },
        ));
        if triggered {
            sim.action_state.add_run(&action, sim_time, result.clone());
            fired.push((action, result));
        }
    }
    Ok(fired)
}

fn apply_actions(
    schedule: &mut Schedule,
    sim: &mut Simulation,
    report_step: ReportStep,
    fired: Vec<(Action, ActionResult)>,
    events: &mut Vec<EventEnvelope>,
) -> Result<(), ScheduleError> {
    for (action, result) in fired {
        let update = schedule.apply_action(report_step, &action, &result)?;
        let matcher = schedule.get(report_step)?.well_matcher();
        let mut wells = matcher.sort(result.matches().wells());
        wells.dedup();
        let run_count = sim.action_state.run_count(&action);

        tracing::info!(
            action = %action.name(),
            step = report_step,
            run_count,
            wells = wells.len(),
            welpi = update.welpi_wells.len(),
            "action triggered"
        );
        events.push(emit(
            &mut sim.counters,
            report_step,
            Event::ActionTriggered {
                name: action.name().to_string(),
                id: action.id(),
                run_count,
                wells,
            },
        ));
        if !update.welpi_wells.is_empty() {
            events.push(emit(
                &mut sim.counters,
                report_step,
                Event::WellPiUpdated {
                    action: action.name().to_string(),
                    wells: update.welpi_wells,
                },
            ));
        }
    }
    Ok(())
}
