//! Deck loading shared between the CLI subcommands.
//!
//! A deck file is JSON: the simulation start, an optional error policy and
//! the keywords in deck order with their records already split into items.
//! `UDQPARAM` and `ACTDIMS` are consumed here; everything else goes to the
//! schedule.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDateTime;
use schedule_core::action::ActionDims;
use schedule_core::matcher::{has_wildcard, WListManager};
use schedule_core::udq::UdqParams;
use schedule_core::{
    DeckKeyword, ErrorGuard, InputError, KeywordLocation, ParseContext, Schedule, SummaryState,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct DeckFile {
    start: NaiveDateTime,
    #[serde(default)]
    parse_context: ParseContext,
    keywords: Vec<DeckKeyword>,
}

/// A built schedule together with the settings it was built with and the
/// input problems collected on the way.
#[derive(Debug)]
pub struct LoadedDeck {
    pub schedule: Schedule,
    pub params: UdqParams,
    pub dims: ActionDims,
    pub errors: Vec<InputError>,
    pub warnings: Vec<InputError>,
}

impl LoadedDeck {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Dynamic summary values for one report step. Well and group values are
/// keyed by variable, then by well or group name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryFrame {
    #[serde(default)]
    pub field: BTreeMap<String, f64>,
    #[serde(default)]
    pub wells: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub groups: BTreeMap<String, BTreeMap<String, f64>>,
}

impl SummaryFrame {
    pub fn apply(&self, summary: &mut SummaryState) {
        for (key, value) in &self.field {
            summary.update(key, *value);
        }
        for (var, values) in &self.wells {
            for (well, value) in values {
                summary.update_well_var(well, var, *value);
            }
        }
        for (var, values) in &self.groups {
            for (group, value) in values {
                summary.update_group_var(group, var, *value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn load_deck(path: &Path) -> Result<LoadedDeck> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading deck file: {}", path.display()))?;
    let deck: DeckFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing deck file: {}", path.display()))?;
    let file = path.display().to_string();

    let mut params = UdqParams::default();
    let mut dims = ActionDims::default();
    let mut keywords = Vec::with_capacity(deck.keywords.len());
    for (index, mut keyword) in deck.keywords.into_iter().enumerate() {
        if keyword.location.file.is_empty() {
            keyword.location = KeywordLocation::new(keyword.name.clone(), file.clone(), index + 1);
        }
        match keyword.name.as_str() {
            "UDQPARAM" => params
                .apply_keyword(&keyword)
                .with_context(|| format!("reading {}", keyword.location))?,
            "ACTDIMS" => dims = action_dims(&keyword)?,
            _ => keywords.push(keyword),
        }
    }

    validate_deck(&keywords)?;

    let mut guard = ErrorGuard::default();
    let schedule = Schedule::new(
        deck.start,
        &keywords,
        params.clone(),
        dims,
        &deck.parse_context,
        &mut guard,
    )
    .with_context(|| format!("building schedule from {}", path.display()))?;
    tracing::debug!(
        steps = schedule.len(),
        errors = guard.errors().len(),
        warnings = guard.warnings().len(),
        "deck loaded"
    );

    Ok(LoadedDeck {
        schedule,
        params,
        dims,
        errors: guard.errors().to_vec(),
        warnings: guard.warnings().to_vec(),
    })
}

/// Per-step summary values, one frame per report step. A run longer than
/// the file keeps using the last frame.
pub fn load_summaries(path: &Path) -> Result<Vec<SummaryFrame>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading summary file: {}", path.display()))?;
    let frames: Vec<SummaryFrame> = serde_json::from_str(&text)
        .with_context(|| format!("parsing summary file: {}", path.display()))?;
    ensure!(!frames.is_empty(), "summary file {} has no frames", path.display());
    Ok(frames)
}

/// `ACTDIMS`: max actions, max lines per action, max characters per line,
/// max conditions per action. Defaulted items keep their defaults.
pub fn action_dims(keyword: &DeckKeyword) -> Result<ActionDims> {
    let mut dims = ActionDims::default();
    let Some(record) = keyword.records.first() else {
        return Ok(dims);
    };
    let targets = [
        &mut dims.max_actions,
        &mut dims.max_lines,
        &mut dims.max_line_chars,
        &mut dims.max_conditions,
    ];
    for (index, target) in targets.into_iter().enumerate() {
        if let Some(value) = keyword
            .parse_item::<usize>(record, index)
            .with_context(|| format!("reading {}", keyword.location))?
        {
            *target = value;
        }
    }
    Ok(dims)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Items naming wells: `(keyword, first record only, item index)`.
const WELL_ITEMS: [(&str, bool, usize); 4] = [
    ("WELOPEN", false, 0),
    ("WCONPROD", false, 0),
    ("WELPI", false, 0),
    ("WELSEGS", true, 0),
];

/// Check cross references the schedule builder does not: every well named
/// explicitly is introduced by an earlier `WELSPECS`, `ENDACTIO` closes an
/// open `ACTIONX`, and report dates never appear inside an action block.
pub fn validate_deck(keywords: &[DeckKeyword]) -> Result<()> {
    let mut wells: BTreeSet<&str> = BTreeSet::new();
    let mut open_action: Option<&DeckKeyword> = None;

    for keyword in keywords {
        match keyword.name.as_str() {
            "ACTIONX" => {
                if let Some(open) = open_action {
                    bail!("ACTIONX at {} opened inside the action at {}", keyword.location, open.location);
                }
                open_action = Some(keyword);
            }
            "ENDACTIO" => {
                ensure!(open_action.is_some(), "ENDACTIO at {} without ACTIONX", keyword.location);
                open_action = None;
            }
            "DATES" | "TSTEP" => {
                if let Some(open) = open_action {
                    bail!("{} inside the ACTIONX block at {}", keyword.location, open.location);
                }
            }
            "WELSPECS" => {
                wells.extend(keyword.records.iter().filter_map(|record| record.first().map(String::as_str)));
            }
            "WLIST" => {
                for record in &keyword.records {
                    for well in record.iter().skip(2) {
                        check_well(&wells, keyword, well)?;
                    }
                }
            }
            _ => {}
        }

        for (name, first_only, item) in WELL_ITEMS {
            if keyword.name != name {
                continue;
            }
            let records = if first_only {
                &keyword.records[..keyword.records.len().min(1)]
            } else {
                &keyword.records[..]
            };
            for well in records.iter().filter_map(|record| record.get(item)) {
                check_well(&wells, keyword, well)?;
            }
        }
    }
    Ok(())
}

fn check_well(wells: &BTreeSet<&str>, keyword: &DeckKeyword, name: &str) -> Result<()> {
    if name == "?" || has_wildcard(name) || WListManager::is_list_name(name) {
        return Ok(());
    }
    ensure!(
        wells.contains(name),
        "{} names well '{}' before it is defined by WELSPECS",
        keyword.location,
        name
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedule_core::test_fixtures::keyword;

    #[test]
    fn action_dims_keep_defaults() {
        let dims = action_dims(&keyword("ACTDIMS", &["5 * * 6"])).unwrap();
        assert_eq!(dims.max_actions, 5);
        assert_eq!(dims.max_lines, ActionDims::default().max_lines);
        assert_eq!(dims.max_conditions, 6);
        assert!(action_dims(&keyword("ACTDIMS", &["x"])).is_err());
    }

    #[test]
    fn unknown_well_is_rejected() {
        let deck = vec![
            keyword("WELSPECS", &["OP1 G1"]),
            keyword("WELOPEN", &["OP2 SHUT"]),
        ];
        let err = validate_deck(&deck).unwrap_err();
        assert!(err.to_string().contains("'OP2'"));
    }

    #[test]
    fn patterns_lists_and_matches_are_not_checked() {
        let deck = vec![
            keyword("WELSPECS", &["OP1 G1"]),
            keyword("WELOPEN", &["OP* SHUT", "*LIST OPEN"]),
            keyword("ACTIONX", &["A", "FOPR > 1"]),
            keyword("WELPI", &["? 100"]),
            keyword("ENDACTIO", &[]),
        ];
        validate_deck(&deck).unwrap();
    }

    #[test]
    fn action_blocks_must_be_well_formed() {
        let stray = vec![keyword("ENDACTIO", &[])];
        assert!(validate_deck(&stray).is_err());

        let nested = vec![
            keyword("ACTIONX", &["A", "FOPR > 1"]),
            keyword("ACTIONX", &["B", "FOPR > 1"]),
        ];
        assert!(validate_deck(&nested).is_err());

        let dated = vec![
            keyword("ACTIONX", &["A", "FOPR > 1"]),
            keyword("DATES", &["1 JAN 2021"]),
            keyword("ENDACTIO", &[]),
        ];
        let err = validate_deck(&dated).unwrap_err();
        assert!(err.to_string().contains("inside the ACTIONX block"));
    }

    #[test]
    fn summary_frame_fills_the_summary() {
        let frame: SummaryFrame = serde_json::from_str(
            r#"{"field": {"FOPR": 10.0}, "wells": {"WWCT": {"OP1": 0.25}}}"#,
        )
        .unwrap();
        let mut summary = SummaryState::default();
        frame.apply(&mut summary);
        assert_eq!(summary.get("FOPR"), Some(10.0));
        assert_eq!(summary.get_well_var("OP1", "WWCT"), Some(0.25));
        assert!(summary.groups().is_empty());
    }
}
