//! User defined quantities.
//!
//! A UDQ is a named derived value. `DEFINE` records carry an arithmetic
//! expression that is parsed once into a [`UdqAstNode`] and re-evaluated at
//! each report step; `ASSIGN` records set constant values. Results are
//! [`UdqSet`]s written into the [`UdqState`] and published to the summary.

mod active;
mod assign;
mod ast;
mod config;
mod context;
mod define;
mod enums;
mod function;
mod params;
mod parser;
mod rst;
mod set;
mod state;
mod token;

pub use active::{UdaControl, UdaValue, UdqActive, UdqActiveInput, UdqActiveOutput};
pub use assign::{AssignRecord, AssignSelector, UdqAssign};
pub use ast::UdqAstNode;
pub use config::{UdqConfig, UdqIndex, UdqInput};
pub use context::UdqContext;
pub use define::UdqDefine;
pub use enums::{
    coerce, is_udq, target_type, target_type_with_selector, var_type, BinaryFunc, ElementalFunc,
    ScalarFunc, UdqAction, UdqTokenType, UdqUpdate, UdqVarType,
};
pub use function::UdqFunctionTable;
pub use params::UdqParams;
pub use parser::parse_udq;
pub use rst::{RstUdq, RstUdqEntity};
pub use set::{UdqScalar, UdqSet};
pub use state::UdqState;
pub use token::{tokenize, UdqToken};

use thiserror::Error;

use crate::error::ErrorCategory;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UdqError {
    // -- parse -------------------------------------------------------------
    #[error("Problem parsing UDQ {keyword}. Extra unhandled data starting with item {item}")]
    ExtraData { keyword: String, item: String },

    #[error("Failed to parse UDQ {keyword} at '{token}'")]
    ParseFailed { keyword: String, token: String },

    #[error("Function {0} must be followed by '('")]
    MissingCallParen(String),

    #[error("Unknown UDQ function: {0}")]
    UnknownFunction(String),

    // -- types -------------------------------------------------------------
    #[error("Cannot coerce between {0} and {1}")]
    CannotCoerce(&'static str, &'static str),

    #[error("Invalid type conversion detected in UDQ expression expected: {expected}, got: {got}")]
    InvalidConversion {
        expected: &'static str,
        got: &'static str,
    },

    #[error("Could not determine expression type for UDQ {0}")]
    UndeterminedType(String),

    #[error("UDQ variable of type: {0} not yet supported in flow")]
    UnsupportedLeafType(&'static str),

    #[error("Keyword: '{0}' is not of UDQ type")]
    NotUdqType(String),

    // -- lookup ------------------------------------------------------------
    #[error("Key is not a UDQ variable: {0}")]
    NotUdqVariable(String),

    #[error("No such UDQ variable: {0}")]
    NoSuchUdq(String),

    #[error("No such variable: {0}")]
    NoSuchVariable(String),

    #[error("Summary well variable: {0} not registered")]
    UnregisteredWellVar(String),

    #[error("Summary group variable: {0} not registered")]
    UnregisteredGroupVar(String),

    #[error("No segment {segment} in well '{well}' for UDQ {keyword}")]
    NoSuchSegment {
        keyword: String,
        well: String,
        segment: usize,
    },

    // -- sets --------------------------------------------------------------
    #[error("Type/size mismatch when combining UDQs {lhs} ({lhs_size}) and {rhs} ({rhs_size})")]
    SizeMismatch {
        lhs: String,
        lhs_size: usize,
        rhs: String,
        rhs_size: usize,
    },

    #[error("No well/group matching: {0}")]
    NoMatch(String),

    // -- functions ---------------------------------------------------------
    #[error("Argument: {value} invalid for function {func}")]
    InvalidArgument { func: &'static str, value: f64 },

    #[error("Function AVEG must have only positive arguments")]
    NonPositiveAveg,

    #[error("Table lookup function {0} is not supported")]
    TableLookup(String),

    #[error("Group names with wildcards is not yet supported: {0}")]
    GroupWildcard(String),

    #[error("Evaluation of {expr} as {target} is not supported")]
    UnsupportedTarget {
        expr: String,
        target: &'static str,
    },

    // -- configuration -------------------------------------------------------
    #[error("Illegal to change unit of UDQ keyword {0} runtime")]
    UnitChange(String),

    #[error("UDQ: Keyword {0} must be defined before UPDATE")]
    UpdateBeforeDefine(String),

    #[error("UDQ: UPDATE for {0} is missing the update status")]
    MissingUpdateStatus(String),

    #[error("Keyword: '{0}' not recognized as ASSIGN/DEFINE UDQ")]
    UnknownQuantity(String),

    #[error("Invalid UDQ record item '{0}'")]
    InvalidItem(String),

    #[error("User defined quantity {udq} is not known and cannot be used as a user defined argument in {control} for {wgname}")]
    UnknownUda {
        udq: String,
        control: &'static str,
        wgname: String,
    },
}

impl UdqError {
    /// Input error category used when the error is found while loading a
    /// deck.
    pub fn category(&self) -> ErrorCategory {
        match self {
            UdqError::CannotCoerce(..)
            | UdqError::InvalidConversion { .. }
            | UdqError::UndeterminedType(_)
            | UdqError::UnsupportedLeafType(_)
            | UdqError::NotUdqType(_) => ErrorCategory::UdqTypeError,
            _ => ErrorCategory::UdqParseError,
        }
    }
}
