use super::*;
use crate::udq::{UdqUpdate, UdqVarType};

fn run_until(step: usize) -> (Schedule, Simulation, UdqFunctionTable) {
    let mut schedule = sample_schedule();
    let mut sim = base_simulation();
    let mut table = make_table();
    for s in 0..=step {
        run_step(&mut schedule, &mut sim, s, &mut table).unwrap();
    }
    (schedule, sim, table)
}

fn kinds(events: &[EventEnvelope]) -> Vec<std::mem::Discriminant<Event>> {
    events.iter().map(|env| std::mem::discriminant(&env.event)).collect()
}

#[test]
fn restart_data_lists_actions_runs_and_udqs() {
    let (schedule, sim, _) = run_until(1);
    let rst = schedule.restart_data(1, &sim.action_state, &sim.udq_state).unwrap();

    assert_eq!(rst.actions.len(), 1);
    assert_eq!(rst.actions[0].name, "WPI");
    assert_eq!(rst.actions[0].conditions, vec![vec!["WWCT", "'OP*'", ">", "0.5"]]);
    assert_eq!(rst.action_runs.len(), 1);
    assert_eq!(rst.action_runs[0].run_count, 2);
    assert_eq!(rst.action_runs[0].last_run, schedule.sim_time(1).unwrap());

    let names: Vec<&str> = rst.udqs.iter().map(|udq| udq.name.as_str()).collect();
    assert_eq!(names, ["FUX", "FUOPR", "WUWCT2"]);
    assert!(!rst.udqs[0].is_define());
    assert_eq!(rst.udqs[0].scalar, Some(1.0));
    assert_eq!(rst.udqs[1].unit, "SM3/DAY");
    assert_eq!(rst.udqs[1].update, UdqUpdate::On);
    assert_eq!(rst.udqs[2].var_type(), UdqVarType::WellVar);
    assert_eq!(rst.udqs[2].entities.len(), 3);
}

#[test]
fn restart_survives_serialization() {
    let (schedule, sim, _) = run_until(1);
    let rst = schedule.restart_data(1, &sim.action_state, &sim.udq_state).unwrap();
    let json = serde_json::to_string(&rst).unwrap();
    let back: ScheduleRestart = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rst);
}

#[test]
fn resumed_run_matches_continuous_run() {
    let (mut continuous, mut sim, mut table) = run_until(1);
    let rst = continuous
        .restart_data(1, &sim.action_state, &sim.udq_state)
        .unwrap();

    let mut resumed = sample_schedule();
    let mut resumed_sim = Simulation::restart(&mut resumed, &rst, base_summary()).unwrap();
    assert_close(resumed_sim.summary.get("FUX"), 1.0);
    let mut resumed_table = make_table();

    for step in 2..continuous.len() {
        let expected = run_step(&mut continuous, &mut sim, step, &mut table).unwrap();
        let actual = run_step(&mut resumed, &mut resumed_sim, step, &mut resumed_table).unwrap();
        assert_eq!(kinds(&actual), kinds(&expected), "step {step}");
    }

    let action = resumed.get(3).unwrap().actions().get("WPI").unwrap();
    assert_eq!(resumed_sim.action_state.run_count(action), 4);
    assert_close(resumed_sim.summary.get("FUOPR"), 600.0);
    assert_close(resumed_sim.summary.get("FUX"), 1.0);
}

#[test]
fn restart_rebuilds_the_udq_config() {
    let (schedule, sim, _) = run_until(0);
    let rst = schedule.restart_data(0, &sim.action_state, &sim.udq_state).unwrap();

    let mut resumed = sample_schedule();
    let (_, udq_state) = resumed.load_restart(&rst).unwrap();
    let config = resumed.get(3).unwrap().udq();
    assert_eq!(config.size(), 3);
    assert_eq!(config.unit("FUOPR"), Ok("SM3/DAY"));
    assert_eq!(
        config.define("WUWCT2").unwrap().input_string(),
        "WWCT * 2"
    );
    assert!(udq_state.has("FUX"));
    assert!(!udq_state.assign("FUX", 0));
}

#[test]
fn restart_at_unknown_step_fails() {
    let (schedule, sim, _) = run_until(0);
    assert!(matches!(
        schedule.restart_data(7, &sim.action_state, &sim.udq_state),
        Err(ScheduleError::NoSuchStep(7))
    ));
}
