//! Input error collection and the top-level schedule error.
//!
//! Syntax and type errors found while reading a deck are not fatal on the
//! spot: they are recorded in an [`ErrorGuard`] together with the location of
//! the offending keyword, and the [`ParseContext`] decides per category
//! whether they abort the load, produce a warning, or are dropped.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::ActionError;
use crate::udq::UdqError;

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordLocation {
    pub keyword: String,
    pub file: String,
    pub line: usize,
}

impl KeywordLocation {
    pub fn new(keyword: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        Self {
            keyword: keyword.into(),
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for KeywordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {} line {}", self.keyword, self.file, self.line)
    }
}

// ---------------------------------------------------------------------------
// Categories and policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    ActionxNoCondition,
    ActionxConditionError,
    ActionxIllegalKeyword,
    UdqParseError,
    UdqTypeError,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::ActionxNoCondition => "ACTIONX_NO_CONDITION",
            ErrorCategory::ActionxConditionError => "ACTIONX_CONDITION_ERROR",
            ErrorCategory::ActionxIllegalKeyword => "ACTIONX_ILLEGAL_KEYWORD",
            ErrorCategory::UdqParseError => "UDQ_PARSE_ERROR",
            ErrorCategory::UdqTypeError => "UDQ_TYPE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputErrorAction {
    Throw,
    Warn,
    Ignore,
}

/// Per-category handling of collected input errors. Unlisted categories throw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseContext {
    #[serde(default)]
    pub actions: BTreeMap<ErrorCategory, InputErrorAction>,
}

impl ParseContext {
    pub fn with(mut self, category: ErrorCategory, action: InputErrorAction) -> Self {
        self.actions.insert(category, action);
        self
    }

    pub fn action(&self, category: ErrorCategory) -> InputErrorAction {
        self.actions
            .get(&category)
            .copied()
            .unwrap_or(InputErrorAction::Throw)
    }

    /// Route an input error through the configured policy.
    pub fn handle(&self, error: InputError, guard: &mut ErrorGuard) {
        match self.action(error.category) {
            InputErrorAction::Throw => guard.add(error),
            InputErrorAction::Warn => {
                tracing::warn!(
                    category = %error.category,
                    location = %error.location,
                    "{}",
                    error.message
                );
                guard.add_warning(error);
            }
            InputErrorAction::Ignore => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Collected errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputError {
    pub category: ErrorCategory,
    pub message: String,
    pub location: KeywordLocation,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.location, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorGuard {
    errors: Vec<InputError>,
    warnings: Vec<InputError>,
}

impl ErrorGuard {
    pub fn add(&mut self, error: InputError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, error: InputError) {
        self.warnings.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[InputError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[InputError] {
        &self.warnings
    }

    /// Fail with every collected error if any category was configured to throw.
    pub fn finish(self) -> Result<Vec<InputError>, ScheduleError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(ScheduleError::Input(self.errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{} input error(s) while loading the schedule", .0.len())]
    Input(Vec<InputError>),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Udq(#[from] UdqError),

    #[error("no such report step: {0}")]
    NoSuchStep(usize),

    #[error("keyword {keyword} is missing record item {item} at {location}")]
    MissingItem {
        keyword: String,
        item: usize,
        location: KeywordLocation,
    },

    #[error("invalid value '{value}' for keyword {keyword} at {location}")]
    InvalidItem {
        keyword: String,
        value: String,
        location: KeywordLocation,
    },

    #[error("ACTIONX block {name} at {location} is not terminated by ENDACTIO")]
    UnterminatedAction {
        name: String,
        location: KeywordLocation,
    },

    #[error("report step {step} starts before the previous step")]
    NonMonotonicTime { step: usize },
}
