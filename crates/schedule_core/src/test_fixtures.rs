//! Shared test fixtures for schedule_core and downstream crates.
//!
//! `sample_deck()` is a small three-well field with UDQs, one ACTIONX that
//! raises the productivity index of wet wells, and four report steps.
//! `base_summary()` gives those wells production values.

use chrono::{NaiveDate, NaiveDateTime};

use crate::action::ActionDims;
use crate::udq::{UdqFunctionTable, UdqParams};
use crate::{DeckKeyword, DeckRecord, ErrorGuard, ParseContext, Schedule, Simulation, SummaryState};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid fixture date")
}

/// One record per line, items split on whitespace.
pub fn records(lines: &[&str]) -> Vec<DeckRecord> {
    lines
        .iter()
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}

pub fn keyword(name: &str, lines: &[&str]) -> DeckKeyword {
    DeckKeyword::new(name, records(lines))
}

pub fn sample_start() -> NaiveDateTime {
    date(2020, 1, 1)
}

/// Report steps start 1 JAN, 1 FEB, 1 MAR and 31 MAR 2020.
pub fn sample_deck() -> Vec<DeckKeyword> {
    vec![
        keyword(
            "WELSPECS",
            &["OP1 G1 1 1 1000 OIL", "OP2 G1 2 1 1000 OIL", "OP3 G2 3 1 1000 OIL"],
        ),
        keyword("WELOPEN", &["OP*"]),
        keyword(
            "UDQ",
            &[
                "ASSIGN FUX 1",
                "DEFINE FUOPR SUM(WOPR 'OP*')",
                "DEFINE WUWCT2 WWCT * 2",
                "UNITS FUOPR SM3/DAY",
            ],
        ),
        keyword("ACTIONX", &["WPI 10 0", "WWCT 'OP*' > 0.5"]),
        keyword("WELPI", &["? 200"]),
        keyword("ENDACTIO", &[]),
        keyword("DATES", &["1 FEB 2020", "1 MAR 2020"]),
        keyword("WELOPEN", &["OP3 SHUT"]),
        keyword("TSTEP", &["30"]),
    ]
}

pub fn sample_schedule() -> Schedule {
    let mut guard = ErrorGuard::default();
    let schedule = Schedule::new(
        sample_start(),
        &sample_deck(),
        UdqParams::default(),
        ActionDims::default(),
        &ParseContext::default(),
        &mut guard,
    )
    .expect("sample deck builds");
    assert!(!guard.has_errors(), "sample deck has input errors");
    schedule
}

/// Well rates and water cuts for the sample wells: OP1 and OP3 are wet.
pub fn base_summary() -> SummaryState {
    let mut summary = SummaryState::default();
    for (well, wopr, wwct) in [("OP1", 100.0, 0.7), ("OP2", 200.0, 0.2), ("OP3", 300.0, 0.9)] {
        summary.update_well_var(well, "WOPR", wopr);
        summary.update_well_var(well, "WWCT", wwct);
    }
    summary.update("FOPR", 600.0);
    summary
}

pub fn base_simulation() -> Simulation {
    Simulation {
        summary: base_summary(),
        ..Simulation::new(0.0)
    }
}

pub fn make_table() -> UdqFunctionTable {
    UdqFunctionTable::new(UdqParams {
        rand_seed: 42,
        ..UdqParams::default()
    })
}
