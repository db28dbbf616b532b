use super::*;
use crate::schedule::{ScheduleEvent, WellStatus};
use crate::test_fixtures::date;

#[test]
fn sample_deck_report_steps() {
    let schedule = sample_schedule();
    assert_eq!(schedule.len(), 4);
    let starts: Vec<_> = schedule.iter().map(ScheduleState::start_time).collect();
    assert_eq!(
        starts,
        vec![date(2020, 1, 1), date(2020, 2, 1), date(2020, 3, 1), date(2020, 3, 31)]
    );
    assert_eq!(schedule.get(0).unwrap().end_time(), Some(date(2020, 2, 1)));
    assert_eq!(schedule.get(3).unwrap().end_time(), None);
    assert!(matches!(schedule.get(4), Err(ScheduleError::NoSuchStep(4))));
}

#[test]
fn keywords_apply_from_their_step_on() {
    let schedule = sample_schedule();
    assert_eq!(schedule.get(1).unwrap().well("OP3").unwrap().status, WellStatus::Open);
    let step2 = schedule.get(2).unwrap();
    assert_eq!(step2.well("OP3").unwrap().status, WellStatus::Shut);
    assert!(step2.events.has(ScheduleEvent::WellStatusChange));
    assert!(step2.wellgroup_events.has("OP3", ScheduleEvent::WellStatusChange));
    assert!(!schedule.get(3).unwrap().events.has(ScheduleEvent::WellStatusChange));
    assert_eq!(schedule.get(3).unwrap().well("OP3").unwrap().status, WellStatus::Shut);
}

#[test]
fn unchanged_members_are_shared_between_steps() {
    let schedule = sample_schedule();
    let step1 = schedule.get(1).unwrap();
    assert!(step1.shares_wells(schedule.get(0).unwrap()));
    assert!(!schedule.get(2).unwrap().shares_wells(step1));
}

#[test]
fn wells_keep_insertion_order_and_groups_are_created() {
    let schedule = sample_schedule();
    let state = schedule.get(0).unwrap();
    assert_eq!(state.well_order().names(), ["OP1", "OP2", "OP3"]);
    assert_eq!(state.group_names(), ["FIELD", "G1", "G2"]);
    assert_eq!(state.well("OP2").unwrap().group, "G1");
}

#[test]
fn action_block_is_deferred() {
    let schedule = sample_schedule();
    let state = schedule.get(0).unwrap();
    assert_eq!(state.actions().len(), 1);
    let action = state.actions().get("WPI").unwrap();
    assert_eq!(action.max_run(), 10);
    assert_eq!(action.keywords().len(), 1);
    assert_eq!(state.well("OP1").unwrap().productivity_index, None);
    assert_eq!(schedule.get(3).unwrap().actions().len(), 1);
}

#[test]
fn tstep_lengths_are_days_and_jly_is_july() {
    let deck = vec![
        keyword("TSTEP", &["10 0.5"]),
        keyword("DATES", &["1 JLY 2020 12:30:00"]),
    ];
    let (schedule, _) = build(&deck).unwrap();
    let starts: Vec<_> = schedule.iter().map(ScheduleState::start_time).collect();
    assert_eq!(starts[1], date(2020, 1, 11));
    assert_eq!(starts[2], date(2020, 1, 11) + chrono::TimeDelta::hours(12));
    assert_eq!(
        starts[3],
        date(2020, 7, 1) + chrono::TimeDelta::minutes(12 * 60 + 30)
    );
}

#[test]
fn dates_must_increase() {
    let deck = vec![keyword("DATES", &["1 MAR 2020", "1 FEB 2020"])];
    assert!(matches!(build(&deck), Err(ScheduleError::NonMonotonicTime { step: 2 })));

    let deck = vec![keyword("DATES", &["1 FOO 2020"])];
    assert!(matches!(build(&deck), Err(ScheduleError::InvalidItem { .. })));
}

#[test]
fn actionx_without_endactio_fails() {
    let deck = vec![
        keyword("ACTIONX", &["A1", "FOPR > 1"]),
        keyword("WELOPEN", &["OP1 SHUT"]),
    ];
    assert!(matches!(
        build(&deck),
        Err(ScheduleError::UnterminatedAction { name, .. }) if name == "A1"
    ));
}

#[test]
fn illegal_action_keyword_follows_the_parse_context() {
    let deck = vec![
        keyword("ACTIONX", &["A1", "FOPR > 1"]),
        keyword("WELOPEN", &["OP1 SHUT"]),
        keyword("RPTSCHED", &["FIP"]),
        keyword("ENDACTIO", &[]),
    ];
    let (schedule, guard) = build(&deck).unwrap();
    assert_eq!(guard.errors().len(), 1);
    assert_eq!(guard.errors()[0].category, ErrorCategory::ActionxIllegalKeyword);
    assert_eq!(schedule.get(0).unwrap().actions().get("A1").unwrap().keywords().len(), 1);

    let context = ParseContext::default().with(ErrorCategory::ActionxIllegalKeyword, InputErrorAction::Ignore);
    let mut guard = ErrorGuard::default();
    Schedule::new(
        sample_start(),
        &deck,
        UdqParams::default(),
        ActionDims::default(),
        &context,
        &mut guard,
    )
    .unwrap();
    assert!(!guard.has_errors());
    assert!(guard.warnings().is_empty());
}

#[test]
fn broken_udq_define_is_an_input_error() {
    let deck = vec![keyword("UDQ", &["DEFINE FUX WOPR 'OP1' + GOPR 'G1'"])];
    let (schedule, guard) = build(&deck).unwrap();
    assert_eq!(guard.errors().len(), 1);
    assert!(schedule.get(0).unwrap().udq().has_keyword("FUX"));
}

#[test]
fn wlist_and_welopen_on_a_list() {
    let deck = vec![
        keyword("WELSPECS", &["OP1 G1", "OP2 G1", "OP3 G1"]),
        keyword("WLIST", &["*WET NEW OP1 OP3"]),
        keyword("WELOPEN", &["*WET STOP"]),
    ];
    let (schedule, _) = build(&deck).unwrap();
    let state = schedule.get(0).unwrap();
    assert_eq!(state.wlist_manager().wells("*WET").unwrap(), ["OP1", "OP3"]);
    assert_eq!(state.well("OP1").unwrap().status, WellStatus::Stop);
    assert_eq!(state.well("OP2").unwrap().status, WellStatus::Shut);
}

#[test]
fn welsegs_registers_segment_numbers() {
    let deck = vec![
        keyword("WELSPECS", &["MSW G1"]),
        keyword("WELSEGS", &["MSW 1000", "2 4", "6"]),
    ];
    let (schedule, _) = build(&deck).unwrap();
    assert_eq!(schedule.get(0).unwrap().segments()["MSW"], vec![1, 2, 3, 4, 6]);

    let deck = vec![keyword("WELSEGS", &["NOWELL 1000"])];
    assert!(build(&deck).is_err());
}

#[test]
fn wconprod_tracks_udq_limits() {
    let deck = vec![
        keyword("WELSPECS", &["OP1 G1", "OP2 G1"]),
        keyword("UDQ", &["DEFINE WUORAT WOPR * 0.9"]),
        keyword("WCONPROD", &["OP* OPEN ORAT WUORAT * * * * 100"]),
    ];
    let (schedule, _) = build(&deck).unwrap();
    let state = schedule.get(0).unwrap();
    let production = state.well("OP2").unwrap().production.as_ref().unwrap();
    assert!(production.limits.iter().any(|(_, value)| value.is_udq()));
    assert_eq!(state.udq_active().input().len(), 2);
}
