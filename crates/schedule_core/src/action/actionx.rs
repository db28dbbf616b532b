//! A single ACTIONX definition: trigger condition, run policy and the
//! deferred keyword block.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, InputError};
use crate::keyword::DeckKeyword;
use crate::matcher::WellMatcher;
use crate::types::SimTime;

use super::ast::AstNode;
use super::condition::Condition;
use super::context::ActionContext;
use super::parser::parse_condition;
use super::result::{ActionResult, MatchingEntities};
use super::state::ActionState;
use super::ActionError;

const ALLOWED_KEYWORDS: &[&str] = &[
    "BOX", "COMPLUMP", "COMPDAT", "COMPSEGS", "ENDBOX", "EXIT", "GCONINJE", "GCONPROD",
    "GCONSUMP", "GEFAC", "GLIFTOPT", "GRUPTREE", "MULTX", "MULTX-", "MULTY", "MULTY-", "MULTZ",
    "MULTZ-", "NEXT", "NEXTSTEP", "UDQ", "WCONHIST", "WCONINJH", "WCONINJE", "WCONPROD", "WECON",
    "WEFAC", "WELOPEN", "WELPI", "WELSEGS", "WELSPECS", "WELTARG", "WGRUPCON", "WLIST", "WPIMULT",
    "WSEGVALV", "WTEST", "WTMULT",
];

/// Action table dimensions (`ACTDIMS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionDims {
    pub max_actions: usize,
    pub max_lines: usize,
    pub max_line_chars: usize,
    pub max_conditions: usize,
}

impl Default for ActionDims {
    fn default() -> Self {
        Self {
            max_actions: 2,
            max_lines: 50,
            max_line_chars: 80,
            max_conditions: 3,
        }
    }
}

/// First record of an ACTIONX keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionxHeader {
    pub name: String,
    pub max_run: usize,
    pub min_wait: SimTime,
}

impl ActionxHeader {
    pub fn from_keyword(keyword: &DeckKeyword) -> Result<Self, ActionError> {
        let record = keyword.records.first().map(Vec::as_slice).unwrap_or_default();
        let name = record
            .first()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ActionError::InvalidHeader {
                name: keyword.name.clone(),
                value: String::new(),
            })?;

        let item = |index: usize| {
            record
                .get(index)
                .map(String::as_str)
                .filter(|item| !item.is_empty() && *item != "*")
        };
        let invalid = |value: &str| ActionError::InvalidHeader {
            name: name.clone(),
            value: value.to_string(),
        };

        let max_run = match item(1) {
            None => 1,
            Some(raw) => raw.parse::<usize>().map_err(|_| invalid(raw))?,
        };
        let min_wait = match item(2) {
            None => 0,
            Some(raw) => whole_seconds(raw.parse::<f64>().map_err(|_| invalid(raw))?),
        };
        Ok(Self {
            name,
            max_run,
            min_wait,
        })
    }
}

// Fractional waits are not representable in SimTime.
#[allow(clippy::cast_possible_truncation)]
fn whole_seconds(seconds: f64) -> SimTime {
    seconds.round() as SimTime
}

/// Restart representation of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RstAction {
    pub name: String,
    pub max_run: usize,
    pub min_wait: SimTime,
    pub start_time: SimTime,
    /// Condition lines, one token list per line.
    pub conditions: Vec<Vec<String>>,
    pub keywords: Vec<DeckKeyword>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    name: String,
    max_run: usize,
    min_wait: SimTime,
    start_time: SimTime,
    id: usize,
    tokens: Vec<String>,
    ast: Option<AstNode>,
    conditions: Vec<Condition>,
    keywords: Vec<DeckKeyword>,
}

impl Action {
    /// An action without a condition. It never evaluates true.
    pub fn new(name: impl Into<String>, max_run: usize, min_wait: SimTime, start_time: SimTime) -> Self {
        Self {
            name: name.into(),
            max_run,
            min_wait,
            start_time,
            id: 0,
            tokens: Vec::new(),
            ast: None,
            conditions: Vec::new(),
            keywords: Vec::new(),
        }
    }

    /// Attach a condition given as token lines. Quoted tokens are unquoted
    /// before parsing; each line is also kept as a [`Condition`].
    pub fn with_condition(mut self, lines: &[Vec<String>]) -> Result<Self, ActionError> {
        let mut tokens = Vec::new();
        for line in lines {
            for token in line {
                tokens.push(dequote(token)?);
            }
        }
        self.ast = Some(parse_condition(&tokens)?);
        self.conditions = lines.iter().filter_map(|line| Condition::from_tokens(line)).collect();
        self.tokens = tokens;
        Ok(self)
    }

    pub fn from_restart(rst: &RstAction) -> Result<Self, ActionError> {
        let mut action = Action::new(rst.name.clone(), rst.max_run, rst.min_wait, rst.start_time)
            .with_condition(&rst.conditions)?;
        for keyword in &rst.keywords {
            action.keywords.push(keyword.clone());
        }
        Ok(action)
    }

    pub fn to_restart(&self) -> RstAction {
        RstAction {
            name: self.name.clone(),
            max_run: self.max_run,
            min_wait: self.min_wait,
            start_time: self.start_time,
            conditions: self.conditions.iter().map(Condition::tokens).collect(),
            keywords: self.keywords.clone(),
        }
    }

    pub fn valid_keyword(keyword: &str) -> bool {
        ALLOWED_KEYWORDS.contains(&keyword)
    }

    /// Append a keyword to the deferred block.
    pub fn add_keyword(&mut self, keyword: DeckKeyword) -> Result<(), ActionError> {
        if !Self::valid_keyword(&keyword.name) {
            return Err(ActionError::IllegalKeyword {
                action: self.name.clone(),
                keyword: keyword.name,
            });
        }
        self.keywords.push(keyword);
        Ok(())
    }

    /// Run policy: not exhausted, not before creation, and the minimum wait
    /// since the last run has elapsed. A `max_run` of zero never exhausts.
    pub fn ready(&self, state: &ActionState, sim_time: SimTime) -> bool {
        let run_count = state.run_count(self);
        let exhausted = self.max_run > 0 && run_count >= self.max_run;
        if exhausted || sim_time < self.start_time {
            return false;
        }
        if run_count == 0 || self.min_wait <= 0 {
            return true;
        }
        match state.run_time(self) {
            Ok(last_run) => sim_time - last_run >= self.min_wait,
            Err(_) => true,
        }
    }

    pub fn eval(&self, ctx: &ActionContext<'_>) -> Result<ActionResult, ActionError> {
        match &self.ast {
            Some(ast) => ast.eval(ctx),
            None => Ok(ActionResult::new(false)),
        }
    }

    /// Wells named by the `WELPI` keywords in the block. A `?` well name
    /// stands for the matched wells of the triggering evaluation. The
    /// result is in canonical well order without duplicates.
    pub fn wellpi_wells(&self, matcher: &WellMatcher, matches: &MatchingEntities) -> Vec<String> {
        let mut wells = Vec::new();
        for keyword in self.keywords.iter().filter(|kw| kw.name == "WELPI") {
            for record in &keyword.records {
                let Some(pattern) = record.first().map(|well| well.trim()) else {
                    continue;
                };
                if pattern == "?" {
                    wells.extend(matches.wells());
                } else {
                    wells.extend(matcher.wells_matching(pattern));
                }
            }
        }
        let mut wells = matcher.sort(wells);
        wells.dedup();
        wells
    }

    pub fn required_summary(&self, keys: &mut BTreeSet<String>) {
        if let Some(ast) = &self.ast {
            ast.required_summary(keys);
        }
    }

    /// The deferred block as deck text, terminated by `ENDACTIO`.
    pub fn keyword_strings(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.keywords.iter().flat_map(DeckKeyword::to_lines).collect();
        lines.push("ENDACTIO".to_string());
        lines
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub fn max_run(&self) -> usize {
        self.max_run
    }

    pub fn min_wait(&self) -> SimTime {
        self.min_wait
    }

    pub fn start_time(&self) -> SimTime {
        self.start_time
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn keywords(&self) -> &[DeckKeyword] {
        &self.keywords
    }

    pub fn has_condition(&self) -> bool {
        self.ast.is_some()
    }
}

/// Strip one level of single quotes.
fn dequote(token: &str) -> Result<String, ActionError> {
    let Some(inner) = token.strip_prefix('\'') else {
        return Ok(token.to_string());
    };
    inner
        .strip_suffix('\'')
        .map(str::to_string)
        .ok_or_else(|| ActionError::UnbalancedQuote(token.to_string()))
}

/// Build an action from an `ACTIONX` keyword: the header record followed by
/// one record per condition line.
///
/// Condition problems do not abort construction; they are returned as input
/// errors and the action is built without a condition. A malformed header
/// is a hard error.
pub fn parse_actionx(
    keyword: &DeckKeyword,
    dims: &ActionDims,
    start_time: SimTime,
) -> Result<(Action, Vec<InputError>), ActionError> {
    let header = ActionxHeader::from_keyword(keyword)?;
    let lines: Vec<Vec<String>> = keyword.records.iter().skip(1).cloned().collect();
    let input_error = |category: ErrorCategory, message: String| InputError {
        category,
        message,
        location: keyword.location.clone(),
    };

    let mut errors = Vec::new();
    if lines.is_empty() {
        errors.push(input_error(
            ErrorCategory::ActionxNoCondition,
            format!("Action {} does not have a condition.", header.name),
        ));
    }
    if lines.len() > dims.max_conditions {
        errors.push(input_error(
            ErrorCategory::ActionxConditionError,
            format!(
                "Action {} has too many conditions - adjust item 4 of ACTDIMS to at least {}.",
                header.name,
                lines.len()
            ),
        ));
    }

    let action = Action::new(header.name.clone(), header.max_run, header.min_wait, start_time);
    if lines.is_empty() {
        return Ok((action, errors));
    }
    match action.clone().with_condition(&lines) {
        Ok(action) => Ok((action, errors)),
        Err(err) => {
            errors.push(input_error(
                ErrorCategory::ActionxConditionError,
                format!("condition of action {} has the following error: {err}", header.name),
            ));
            Ok((action, errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionResult, ActionState};
    use crate::matcher::{NameOrder, WListManager};
    use crate::summary::SummaryState;

    fn line(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn actionx(header: &[&str], lines: &[&str]) -> DeckKeyword {
        let mut records = vec![header.iter().map(|s| (*s).to_string()).collect()];
        records.extend(lines.iter().map(|l| line(l)));
        DeckKeyword::new("ACTIONX", records)
    }

    #[test]
    fn min_wait_is_measured_from_the_last_run() {
        let action = Action::new("WAIT", 0, 10, 0);
        let mut state = ActionState::default();
        assert!(action.ready(&state, 100));

        state.add_run(&action, 100, ActionResult::new(true));
        assert!(!action.ready(&state, 105));
        assert!(!action.ready(&state, 109));
        assert!(action.ready(&state, 110));
    }

    #[test]
    fn single_run_action_is_exhausted_after_one_run() {
        let action = Action::new("ONCE", 1, 0, 0);
        let mut state = ActionState::default();
        assert!(action.ready(&state, 0));

        state.add_run(&action, 0, ActionResult::new(true));
        assert_eq!(state.run_count(&action), 1);
        assert!(!action.ready(&state, 1_000_000));
    }

    #[test]
    fn not_ready_before_the_action_exists() {
        let action = Action::new("LATE", 1, 0, 500);
        assert!(!action.ready(&ActionState::default(), 499));
        assert!(action.ready(&ActionState::default(), 500));
    }

    #[test]
    fn header_defaults() {
        let kw = actionx(&["ACT1"], &["FOPR > 100"]);
        let (action, errors) = parse_actionx(&kw, &ActionDims::default(), 0).unwrap();
        assert!(errors.is_empty());
        assert_eq!(action.name(), "ACT1");
        assert_eq!(action.max_run(), 1);
        assert_eq!(action.min_wait(), 0);
        assert!(action.has_condition());
        assert_eq!(action.conditions().len(), 1);
    }

    #[test]
    fn missing_condition_is_reported() {
        let kw = actionx(&["ACT1", "10"], &[]);
        let (action, errors) = parse_actionx(&kw, &ActionDims::default(), 0).unwrap();
        assert!(!action.has_condition());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, ErrorCategory::ActionxNoCondition);
        assert_eq!(errors[0].message, "Action ACT1 does not have a condition.");
    }

    #[test]
    fn too_many_conditions_is_reported() {
        let dims = ActionDims {
            max_conditions: 1,
            ..ActionDims::default()
        };
        let kw = actionx(&["ACT1"], &["FOPR > 100 AND", "FWCT < 0.5"]);
        let (action, errors) = parse_actionx(&kw, &dims, 0).unwrap();
        assert!(action.has_condition());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least 2"));
    }

    #[test]
    fn broken_condition_is_reported_with_action_name() {
        let kw = actionx(&["ACT1"], &["FOPR > 100 AND"]);
        let (action, errors) = parse_actionx(&kw, &ActionDims::default(), 0).unwrap();
        assert!(!action.has_condition());
        assert_eq!(errors[0].category, ErrorCategory::ActionxConditionError);
        assert!(errors[0]
            .message
            .starts_with("condition of action ACT1 has the following error"));
    }

    #[test]
    fn quoted_tokens_are_dequoted() {
        let kw = actionx(&["ACT1"], &["WWCT 'OP1' > 0.5"]);
        let (action, _) = parse_actionx(&kw, &ActionDims::default(), 0).unwrap();
        assert_eq!(action.tokens(), &line("WWCT OP1 > 0.5")[..]);

        let kw = actionx(&["ACT1"], &["WWCT 'OP1 > 0.5"]);
        let (_, errors) = parse_actionx(&kw, &ActionDims::default(), 0).unwrap();
        assert!(errors[0].message.contains("Unbalanced quote"));
    }

    #[test]
    fn illegal_keywords_are_rejected_when_added() {
        let mut action = Action::new("A", 1, 0, 0);
        assert!(action.add_keyword(DeckKeyword::new("WELOPEN", vec![])).is_ok());
        let err = action.add_keyword(DeckKeyword::new("DATES", vec![])).unwrap_err();
        assert_eq!(
            err,
            ActionError::IllegalKeyword {
                action: "A".into(),
                keyword: "DATES".into()
            }
        );
        assert_eq!(action.keywords().len(), 1);
    }

    #[test]
    fn keyword_strings_end_with_terminator() {
        let mut action = Action::new("A", 1, 0, 0);
        action
            .add_keyword(DeckKeyword::new("WELOPEN", vec![line("OP1 SHUT")]))
            .unwrap();
        assert_eq!(
            action.keyword_strings(),
            vec!["WELOPEN", "'OP1' 'SHUT' /", "/", "ENDACTIO"]
        );
    }

    #[test]
    fn restart_round_trip_preserves_the_action() {
        let kw = actionx(&["ACT1", "3", "3600"], &["( WWCT OP1 > 0.5 ) OR", "FOPR < 10"]);
        let (mut action, errors) = parse_actionx(&kw, &ActionDims::default(), 86_400).unwrap();
        assert!(errors.is_empty());
        action
            .add_keyword(DeckKeyword::new("WELPI", vec![line("? 100")]))
            .unwrap();

        let rebuilt = Action::from_restart(&action.to_restart()).unwrap();
        assert_eq!(rebuilt, action);
    }

    #[test]
    fn wellpi_substitutes_matches_sorted_and_deduplicated() {
        let mut action = Action::new("A", 1, 0, 0);
        action
            .add_keyword(DeckKeyword::new(
                "WELPI",
                vec![line("? 100"), line("OP3 50"), line("? 25")],
            ))
            .unwrap();
        let order: NameOrder = ["OP3", "OP1", "OP2"].into_iter().collect();
        let matcher = WellMatcher::new(order);
        let matches = MatchingEntities::from_wells(["OP1", "OP3"]);
        assert_eq!(action.wellpi_wells(&matcher, &matches), vec!["OP3", "OP1"]);
    }

    #[test]
    fn eval_without_condition_is_false() {
        let action = Action::new("A", 1, 0, 0);
        let st = SummaryState::default();
        let wlm = WListManager::default();
        let res = action.eval(&ActionContext::new(&st, &wlm)).unwrap();
        assert!(!res.condition_satisfied());
    }
}
