use super::*;

fn names(events: &[EventEnvelope]) -> Vec<&'static str> {
    events
        .iter()
        .map(|env| match &env.event {
            Event::UdqAssigned { .. } => "assigned",
            Event::UdqDefined { .. } => "defined",
            Event::ActionEvaluated { .. } => "evaluated",
            Event::ActionTriggered { .. } => "triggered",
            Event::WellPiUpdated { .. } => "welpi",
        })
        .collect()
}

fn single_action_deck(header: &str) -> Vec<DeckKeyword> {
    vec![
        keyword("WELSPECS", &["OP1 G1", "OP2 G1", "OP3 G2"]),
        keyword("ACTIONX", &[header, "FOPR > 100"]),
        keyword("WELOPEN", &["OP2 OPEN"]),
        keyword("ENDACTIO", &[]),
        keyword("DATES", &["1 FEB 2020", "1 MAR 2020", "1 APR 2020"]),
    ]
}

fn evaluated_steps(schedule: &mut Schedule) -> Vec<usize> {
    let mut sim = base_simulation();
    let mut table = make_table();
    let mut steps = Vec::new();
    for step in 0..schedule.len() {
        let events = run_step(schedule, &mut sim, step, &mut table).unwrap();
        if events.iter().any(|env| matches!(env.event, Event::ActionTriggered { .. })) {
            steps.push(step);
        }
    }
    steps
}

#[test]
fn first_step_event_sequence() {
    let mut schedule = sample_schedule();
    let mut sim = base_simulation();
    let mut table = make_table();
    let events = run_step(&mut schedule, &mut sim, 0, &mut table).unwrap();

    assert_eq!(
        names(&events),
        ["assigned", "defined", "defined", "evaluated", "triggered", "welpi"]
    );
    assert_eq!(events[0].id, EventId("evt_000000".into()));
    assert_eq!(events[5].id, EventId("evt_000005".into()));
    assert_eq!(sim.counters.next_event_id, 6);

    let Event::ActionTriggered { name, run_count, wells, .. } = &events[4].event else {
        panic!("expected ActionTriggered, got {:?}", events[4].event);
    };
    assert_eq!(name, "WPI");
    assert_eq!(*run_count, 1);
    assert_eq!(wells, &["OP1", "OP3"]);
}

#[test]
fn udq_results_reach_the_summary() {
    let mut schedule = sample_schedule();
    let mut sim = base_simulation();
    let mut table = make_table();
    run_step(&mut schedule, &mut sim, 0, &mut table).unwrap();

    assert_close(sim.summary.get("FUX"), 1.0);
    assert_close(sim.summary.get("FUOPR"), 600.0);
    assert_close(sim.summary.get_well_var("OP3", "WUWCT2"), 1.8);
    assert_close(sim.udq_state.well_value("OP1", "WUWCT2"), 1.4);
}

#[test]
fn assignments_apply_once() {
    let mut schedule = sample_schedule();
    let mut sim = base_simulation();
    let mut table = make_table();
    run_step(&mut schedule, &mut sim, 0, &mut table).unwrap();
    let events = run_step(&mut schedule, &mut sim, 1, &mut table).unwrap();
    assert_eq!(names(&events)[..2], ["defined", "defined"]);
}

#[test]
fn fired_action_changes_this_and_later_steps() {
    let mut schedule = sample_schedule();
    let mut sim = base_simulation();
    let mut table = make_table();
    let id_before = schedule.get(3).unwrap().actions().get("WPI").unwrap().id();
    run_step(&mut schedule, &mut sim, 0, &mut table).unwrap();

    for step in 0..schedule.len() {
        let state = schedule.get(step).unwrap();
        assert_eq!(state.well("OP1").unwrap().productivity_index, Some(200.0));
        assert_eq!(state.well("OP2").unwrap().productivity_index, None);
        assert_eq!(state.actions().get("WPI").unwrap().id(), id_before);
    }
    assert!(schedule
        .get(0)
        .unwrap()
        .wellgroup_events
        .has("OP3", crate::schedule::ScheduleEvent::ActionxWellEvent));
    // Deck keywords of later steps still apply on top of the action.
    assert_eq!(
        schedule.get(2).unwrap().well("OP3").unwrap().status,
        crate::schedule::WellStatus::Shut
    );
}

#[test]
fn no_matching_wells_means_no_trigger() {
    let mut schedule = sample_schedule();
    let mut sim = base_simulation();
    for well in ["OP1", "OP2", "OP3"] {
        sim.summary.update_well_var(well, "WWCT", 0.1);
    }
    let mut table = make_table();
    let events = run_step(&mut schedule, &mut sim, 0, &mut table).unwrap();
    assert_eq!(names(&events), ["assigned", "defined", "defined", "evaluated"]);
    assert_eq!(sim.action_state.run_count(schedule.get(0).unwrap().actions().get("WPI").unwrap()), 0);
}

#[test]
fn max_run_limits_triggers() {
    let (mut schedule, _) = build(&single_action_deck("A1 2")).unwrap();
    assert_eq!(evaluated_steps(&mut schedule), [0, 1]);

    let (mut schedule, _) = build(&single_action_deck("A1 0")).unwrap();
    assert_eq!(evaluated_steps(&mut schedule), [0, 1, 2, 3]);
}

#[test]
fn min_wait_spaces_triggers() {
    // Fifty days: the action may run again on the third step.
    let (mut schedule, _) = build(&single_action_deck("A1 10 4320000")).unwrap();
    assert_eq!(evaluated_steps(&mut schedule), [0, 2]);
}

#[test]
fn action_opens_a_well_for_the_rest_of_the_run() {
    let (mut schedule, _) = build(&single_action_deck("A1 1")).unwrap();
    assert_eq!(evaluated_steps(&mut schedule), [0]);
    assert!(schedule.iter().all(|state| state.well("OP2").unwrap().is_open()));
    assert!(!schedule.get(3).unwrap().well("OP1").unwrap().is_open());
}

#[test]
fn unknown_step_is_an_error() {
    let mut schedule = sample_schedule();
    let mut sim = base_simulation();
    let mut table = make_table();
    assert!(matches!(
        run_step(&mut schedule, &mut sim, 9, &mut table),
        Err(ScheduleError::NoSuchStep(9))
    ));
}
