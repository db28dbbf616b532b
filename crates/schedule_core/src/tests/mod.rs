use crate::action::ActionDims;
use crate::matcher::{NameOrder, WellMatcher};
use crate::test_fixtures::{base_simulation, base_summary, keyword, make_table, sample_schedule, sample_start};
use crate::udq::{UdqContext, UdqDefine, UdqFunctionTable, UdqParams, UdqSet, UdqState};
use crate::*;

mod engine;
mod restart;
mod schedule_build;
mod udq_eval;

// --- Shared test helpers ------------------------------------------------

fn items(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn sample_matcher() -> WellMatcher {
    WellMatcher::new(["OP1", "OP2", "OP3"].into_iter().collect::<NameOrder>())
}

/// Parse and evaluate one DEFINE against the sample summary.
fn try_eval_define(table: &mut UdqFunctionTable, name: &str, expr: &str) -> Result<UdqSet, udq::UdqError> {
    let define = UdqDefine::parse(name, &items(expr), 0)?;
    let matcher = sample_matcher();
    let mut summary = base_summary();
    summary.update_group_var("G1", "GOPR", 300.0);
    summary.update_group_var("G2", "GOPR", 300.0);
    let mut state = UdqState::new(0.0);
    let mut ctx = UdqContext::new(table, &matcher, &mut summary, &mut state).with_groups(["FIELD", "G1", "G2"]);
    define.eval(&mut ctx)
}

fn eval_define(table: &mut UdqFunctionTable, name: &str, expr: &str) -> UdqSet {
    try_eval_define(table, name, expr).unwrap()
}

fn build(deck: &[DeckKeyword]) -> Result<(Schedule, ErrorGuard), ScheduleError> {
    let mut guard = ErrorGuard::default();
    let schedule = Schedule::new(
        sample_start(),
        deck,
        UdqParams::default(),
        ActionDims::default(),
        &ParseContext::default(),
        &mut guard,
    )?;
    Ok((schedule, guard))
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap_or(f64::NAN);
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}
