//! ACTIONX: conditionally triggered keyword blocks.
//!
//! A condition is tokenized and parsed once into an [`AstNode`], then
//! evaluated at every report step against an [`ActionContext`]. The outcome
//! is an [`ActionResult`]: a boolean plus the set of wells that satisfied it.

mod actions;
mod actionx;
mod ast;
mod condition;
pub(crate) mod context;
mod parser;
mod result;
mod state;
mod token;
mod value;

pub use actions::Actions;
pub use actionx::{parse_actionx, Action, ActionDims, ActionxHeader, RstAction};
pub use ast::{AstNode, Operand};
pub use condition::{Comparator, Condition, Logical, Quantity};
pub use context::ActionContext;
pub use parser::parse_condition;
pub use result::{ActionResult, MatchingEntities};
pub use state::{ActionState, RunState};
pub use token::{func_type, token_type, FuncType, ParseNode, TokenType, Tokenizer};
pub use value::ActionValue;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("ACTIONX condition is empty")]
    NoCondition,

    #[error("{reason}, but got token[{index}] = '{token}' instead")]
    UnexpectedToken {
        index: usize,
        token: String,
        reason: &'static str,
    },

    #[error("Extra unhandled data starting with token[{index}] = {token} in ACTIONX condition")]
    ExtraData { index: usize, token: String },

    #[error("Values on the right hand side of a comparison must be scalars")]
    NonScalarRhs,

    #[error("Summary vector {0} is not available for ACTIONX evaluation")]
    UnknownKey(String),

    #[error("Group matching with wildcard '{pattern}' is not yet supported in ACTIONX ({func})")]
    GroupWildcard { func: String, pattern: String },

    #[error("The keyword {keyword} is not supported in the ACTIONX block {action}")]
    IllegalKeyword { action: String, keyword: String },

    #[error("Unbalanced quote in ACTIONX item: {0}")]
    UnbalancedQuote(String),

    #[error("Action {0} has never run")]
    NeverRun(String),

    #[error("Invalid ACTIONX header item '{value}' for action {name}")]
    InvalidHeader { name: String, value: String },
}
