//! Recursive-descent parser for ACTIONX conditions.
//!
//! ```text
//! or-expr  := and-expr (OR and-expr)*
//! and-expr := cmp-expr (AND cmp-expr)*
//! cmp-expr := '(' or-expr ')' | left comparator right
//! left     := SYMBOL (SYMBOL | NUMBER)*
//! right    := NUMBER | SYMBOL (SYMBOL | NUMBER)*
//! ```

use smallvec::SmallVec;

use super::ast::{AstNode, Operand};
use super::condition::Comparator;
use super::token::{func_type, FuncType, TokenType, Tokenizer};
use super::ActionError;

/// Parse a pre-split condition into a tree.
pub fn parse_condition(tokens: &[String]) -> Result<AstNode, ActionError> {
    if tokens.is_empty() {
        return Err(ActionError::NoCondition);
    }

    let mut parser = Parser {
        cursor: Tokenizer::new(tokens),
    };
    let tree = parser.parse_or()?;

    let rest = parser.cursor.current();
    if rest.kind != TokenType::End {
        return Err(ActionError::ExtraData {
            index: parser.cursor.pos(),
            token: rest.value,
        });
    }
    Ok(tree)
}

struct Parser<'a> {
    cursor: Tokenizer<'a>,
}

impl Parser<'_> {
    fn unexpected(&self, reason: &'static str) -> ActionError {
        ActionError::UnexpectedToken {
            index: self.cursor.pos(),
            token: self.cursor.current().value,
            reason,
        }
    }

    fn parse_or(&mut self) -> Result<AstNode, ActionError> {
        let first = self.parse_and()?;
        if self.cursor.current().kind != TokenType::OpOr {
            return Ok(first);
        }
        let mut children = vec![first];
        while self.cursor.current().kind == TokenType::OpOr {
            self.cursor.advance();
            children.push(self.parse_and()?);
        }
        Ok(AstNode::Or(children))
    }

    fn parse_and(&mut self) -> Result<AstNode, ActionError> {
        let first = self.parse_cmp()?;
        if self.cursor.current().kind != TokenType::OpAnd {
            return Ok(first);
        }
        let mut children = vec![first];
        while self.cursor.current().kind == TokenType::OpAnd {
            self.cursor.advance();
            children.push(self.parse_cmp()?);
        }
        Ok(AstNode::And(children))
    }

    fn parse_cmp(&mut self) -> Result<AstNode, ActionError> {
        if self.cursor.current().kind == TokenType::OpenParen {
            self.cursor.advance();
            let inner = self.parse_or()?;
            if self.cursor.current().kind != TokenType::CloseParen {
                return Err(self.unexpected("Expected ')' to close parenthesised condition"));
            }
            self.cursor.advance();
            return Ok(inner);
        }

        let left = self.parse_left()?;
        let op = self.parse_op()?;
        let right = self.parse_right()?;
        Ok(AstNode::Compare { op, left, right })
    }

    fn parse_left(&mut self) -> Result<Operand, ActionError> {
        let curr = self.cursor.current();
        if curr.kind != TokenType::EclExpr {
            return Err(self.unexpected("Expected expression as left hand side of comparison"));
        }
        self.cursor.advance();
        let args = self.parse_args();
        Ok(Operand::Quantity {
            func_type: func_type(&curr.value),
            func: curr.value,
            args,
        })
    }

    fn parse_op(&mut self) -> Result<Comparator, ActionError> {
        let curr = self.cursor.current();
        let Some(op) = Comparator::from_token(curr.kind) else {
            return Err(self.unexpected("Expected comparison operator"));
        };
        self.cursor.advance();
        Ok(op)
    }

    fn parse_right(&mut self) -> Result<Operand, ActionError> {
        let curr = self.cursor.current();
        match curr.kind {
            TokenType::Number => {
                self.cursor.advance();
                let value = curr
                    .value
                    .parse::<f64>()
                    .map_err(|_| self.unexpected("Expected numeric right hand side"))?;
                Ok(Operand::Number(value))
            }
            TokenType::EclExpr => {
                self.cursor.advance();
                let args = self.parse_args();
                Ok(Operand::Quantity {
                    func: curr.value,
                    func_type: FuncType::None,
                    args,
                })
            }
            _ => Err(self.unexpected("Expected number or expression as right hand side of comparison")),
        }
    }

    fn parse_args(&mut self) -> SmallVec<[String; 2]> {
        let mut args = SmallVec::new();
        loop {
            let curr = self.cursor.current();
            if !matches!(curr.kind, TokenType::EclExpr | TokenType::Number) {
                return args;
            }
            args.push(curr.value);
            self.cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn single_comparison() {
        let tree = parse_condition(&toks("WWCT OPX > 0.50")).unwrap();
        let AstNode::Compare { op, left, right } = tree else {
            panic!("expected a comparison, got {tree:?}");
        };
        assert_eq!(op, Comparator::Greater);
        assert_eq!(left, Operand::quantity("WWCT", FuncType::Well, ["OPX"]));
        assert_eq!(right, Operand::Number(0.50));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let tree = parse_condition(&toks("FOPR > 1 OR FWCT < 0.5 AND FGOR > 100")).unwrap();
        let AstNode::Or(children) = tree else {
            panic!("expected OR at the root");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], AstNode::Compare { .. }));
        assert!(matches!(&children[1], AstNode::And(inner) if inner.len() == 2));
    }

    #[test]
    fn parentheses_group() {
        let tree = parse_condition(&toks("( FOPR > 1 OR FWCT < 0.5 ) AND FGOR > 100")).unwrap();
        let AstNode::And(children) = tree else {
            panic!("expected AND at the root");
        };
        assert!(matches!(&children[0], AstNode::Or(inner) if inner.len() == 2));
    }

    #[test]
    fn symbolic_right_hand_side() {
        let tree = parse_condition(&toks("MNTH .EQ. JUN")).unwrap();
        let AstNode::Compare { left, right, .. } = tree else {
            panic!("expected a comparison");
        };
        assert_eq!(left, Operand::quantity("MNTH", FuncType::TimeMonth, Vec::<String>::new()));
        assert_eq!(right, Operand::quantity("JUN", FuncType::None, Vec::<String>::new()));
    }

    #[test]
    fn empty_condition_fails() {
        assert_eq!(parse_condition(&[]), Err(ActionError::NoCondition));
    }

    #[test]
    fn trailing_tokens_are_reported_with_index() {
        let err = parse_condition(&toks("FOPR > 1 )")).unwrap_err();
        assert_eq!(
            err,
            ActionError::ExtraData {
                index: 3,
                token: ")".into()
            }
        );
        assert!(err.to_string().contains("token[3] = )"));
    }

    #[test]
    fn syntax_errors() {
        assert!(parse_condition(&toks("( FOPR > 1")).is_err());
        assert!(parse_condition(&toks("FOPR > 1 AND")).is_err());
        assert!(parse_condition(&toks("FOPR 1")).is_err());
        assert!(parse_condition(&toks("> 1")).is_err());
        let err = parse_condition(&toks("FOPR > AND")).unwrap_err();
        assert!(matches!(err, ActionError::UnexpectedToken { index: 2, .. }));
    }
}
