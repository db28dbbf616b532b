//! Per-line view of an ACTIONX condition, as stored in restart data.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::token::{token_type, TokenType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Equal,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    NotEqual,
}

impl Comparator {
    pub fn from_token(kind: TokenType) -> Option<Self> {
        match kind {
            TokenType::OpEq => Some(Comparator::Equal),
            TokenType::OpGt => Some(Comparator::Greater),
            TokenType::OpLt => Some(Comparator::Less),
            TokenType::OpGe => Some(Comparator::GreaterEqual),
            TokenType::OpLe => Some(Comparator::LessEqual),
            TokenType::OpNe => Some(Comparator::NotEqual),
            _ => None,
        }
    }

    /// Exact comparison; NaN compares false except under `NotEqual`.
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        let ord = lhs.partial_cmp(&rhs);
        match self {
            Comparator::Equal => ord == Some(Ordering::Equal),
            Comparator::NotEqual => ord != Some(Ordering::Equal),
            Comparator::Greater => ord == Some(Ordering::Greater),
            Comparator::Less => ord == Some(Ordering::Less),
            Comparator::GreaterEqual => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
            Comparator::LessEqual => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Equal => "=",
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::GreaterEqual => ">=",
            Comparator::LessEqual => "<=",
            Comparator::NotEqual => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Logical {
    And,
    Or,
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub quantity: String,
    pub args: Vec<String>,
}

impl Quantity {
    pub fn new(quantity: impl Into<String>) -> Self {
        Self {
            quantity: quantity.into(),
            args: Vec::new(),
        }
    }

    pub fn add_arg(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }
}

/// One condition line: `[(] lhs args.. cmp rhs args.. [)] [AND|OR]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub lhs: Quantity,
    pub rhs: Quantity,
    pub logic: Logical,
    pub cmp: Comparator,
    pub cmp_string: String,
    pub left_paren: bool,
    pub right_paren: bool,
}

impl Condition {
    /// Split a condition line into its parts. Returns `None` when the line
    /// has no comparator.
    pub fn from_tokens(tokens: &[String]) -> Option<Self> {
        let mut iter = tokens.iter().peekable();
        let left_paren = iter.next_if(|tok| tok.as_str() == "(").is_some();

        let mut lhs = Quantity::new(iter.next()?.as_str());
        let (cmp, cmp_string) = loop {
            let token = iter.next()?;
            if let Some(cmp) = Comparator::from_token(token_type(token)) {
                break (cmp, token.clone());
            }
            lhs.add_arg(token.as_str());
        };

        let mut rhs = Quantity::new(iter.next()?.as_str());
        let mut right_paren = false;
        let mut logic = Logical::End;
        for token in iter {
            match token_type(token) {
                TokenType::CloseParen => right_paren = true,
                TokenType::OpAnd => logic = Logical::And,
                TokenType::OpOr => logic = Logical::Or,
                _ => rhs.add_arg(token.as_str()),
            }
        }

        Some(Self {
            lhs,
            rhs,
            logic,
            cmp,
            cmp_string,
            left_paren,
            right_paren,
        })
    }

    /// The condition line as tokens again.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        if self.left_paren {
            tokens.push("(".to_string());
        }
        tokens.push(self.lhs.quantity.clone());
        tokens.extend(self.lhs.args.iter().cloned());
        tokens.push(self.cmp_string.clone());
        tokens.push(self.rhs.quantity.clone());
        tokens.extend(self.rhs.args.iter().cloned());
        if self.right_paren {
            tokens.push(")".to_string());
        }
        match self.logic {
            Logical::And => tokens.push("AND".to_string()),
            Logical::Or => tokens.push("OR".to_string()),
            Logical::End => {}
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn simple_line() {
        let cond = Condition::from_tokens(&toks("WWCT OPX > 0.75 AND")).unwrap();
        assert_eq!(cond.lhs.quantity, "WWCT");
        assert_eq!(cond.lhs.args, vec!["OPX"]);
        assert_eq!(cond.cmp, Comparator::Greater);
        assert_eq!(cond.rhs.quantity, "0.75");
        assert_eq!(cond.logic, Logical::And);
        assert!(!cond.left_paren && !cond.right_paren);
    }

    #[test]
    fn parenthesised_line() {
        let cond = Condition::from_tokens(&toks("( FOPR .GE. 100 ) OR")).unwrap();
        assert!(cond.left_paren);
        assert!(cond.right_paren);
        assert_eq!(cond.cmp_string, ".GE.");
        assert_eq!(cond.logic, Logical::Or);
        assert_eq!(cond.tokens(), toks("( FOPR .GE. 100 ) OR"));
    }

    #[test]
    fn line_without_comparator() {
        assert!(Condition::from_tokens(&toks("WWCT OPX")).is_none());
    }

    #[test]
    fn comparator_semantics() {
        assert!(Comparator::GreaterEqual.apply(1.0, 1.0));
        assert!(!Comparator::Greater.apply(1.0, 1.0));
        assert!(Comparator::NotEqual.apply(1.0, 2.0));
        assert!(!Comparator::Equal.apply(f64::NAN, f64::NAN));
    }
}
