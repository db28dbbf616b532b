//! Recursive-descent parser for UDQ DEFINE expressions.
//!
//! ```text
//! set    := cmp (UNION set)?
//! cmp    := add (COMPARE cmp)?
//! add    := mul (('+' | '-') mul)*
//! mul    := pow (('*' | '/') pow)*
//! pow    := factor ('^' mul)?
//! factor := ('+' | '-')? ( '(' set ')' | FUNC '(' set ')' | NUMBER | QUANTITY )
//! ```

use super::ast::UdqAstNode;
use super::enums::{target_type, BinaryFunc, UdqTokenType, UdqVarType};
use super::token::UdqToken;
use super::UdqError;

/// Parse the tokens of `keyword`'s DEFINE and check that the expression
/// type can be stored in `keyword`.
pub fn parse_udq(keyword: &str, tokens: &[UdqToken]) -> Result<UdqAstNode, UdqError> {
    let mut parser = Parser {
        keyword,
        tokens,
        pos: 0,
    };
    let tree = parser.parse_set()?;

    if let Some(rest) = parser.current() {
        return Err(UdqError::ExtraData {
            keyword: keyword.to_string(),
            item: rest.to_text(),
        });
    }

    let expr_type = tree.var_type();
    if expr_type == UdqVarType::None {
        return Err(UdqError::UndeterminedType(keyword.to_string()));
    }
    let target = target_type(keyword);
    if !static_type_check(target, expr_type) {
        return Err(UdqError::InvalidConversion {
            expected: target.name(),
            got: expr_type.name(),
        });
    }
    Ok(tree)
}

/// Whether a value of type `rhs` may be stored in a quantity of type `lhs`.
fn static_type_check(lhs: UdqVarType, rhs: UdqVarType) -> bool {
    lhs == rhs || rhs == UdqVarType::Scalar
}

/// Tokens that may legally follow a complete sum.
fn ends_sum(kind: UdqTokenType) -> bool {
    matches!(kind, UdqTokenType::End | UdqTokenType::CloseParen) || kind.is_cmp() || kind.is_union()
}

struct Parser<'a> {
    keyword: &'a str,
    tokens: &'a [UdqToken],
    pos: usize,
}

impl Parser<'_> {
    fn current(&self) -> Option<&UdqToken> {
        self.tokens.get(self.pos)
    }

    fn kind(&self) -> UdqTokenType {
        self.current().map_or(UdqTokenType::End, |tok| tok.kind)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn failed(&self) -> UdqError {
        UdqError::ParseFailed {
            keyword: self.keyword.to_string(),
            token: self
                .current()
                .map_or_else(|| "end of expression".to_string(), UdqToken::to_text),
        }
    }

    fn expect_close(&mut self) -> Result<(), UdqError> {
        if self.kind() != UdqTokenType::CloseParen {
            return Err(self.failed());
        }
        self.advance();
        Ok(())
    }

    fn parse_set(&mut self) -> Result<UdqAstNode, UdqError> {
        let left = self.parse_cmp()?;
        match self.kind() {
            UdqTokenType::Binary(func) if func.is_union() => {
                self.advance();
                let right = self.parse_set()?;
                UdqAstNode::binary(func, left, right)
            }
            _ => Ok(left),
        }
    }

    fn parse_cmp(&mut self) -> Result<UdqAstNode, UdqError> {
        let left = self.parse_add()?;
        match self.kind() {
            UdqTokenType::Binary(func) if func.is_cmp() => {
                self.advance();
                let right = self.parse_cmp()?;
                UdqAstNode::binary(func, left, right)
            }
            _ => Ok(left),
        }
    }

    fn parse_add(&mut self) -> Result<UdqAstNode, UdqError> {
        let mut left = self.parse_mul()?;
        loop {
            let func = match self.kind() {
                UdqTokenType::Binary(func @ (BinaryFunc::Add | BinaryFunc::Sub)) => func,
                kind if ends_sum(kind) => return Ok(left),
                _ => return Err(self.failed()),
            };
            self.advance();
            let right = self.parse_mul()?;
            left = UdqAstNode::binary(func, left, right)?;
        }
    }

    fn parse_mul(&mut self) -> Result<UdqAstNode, UdqError> {
        let mut left = self.parse_pow()?;
        while let UdqTokenType::Binary(func @ (BinaryFunc::Mul | BinaryFunc::Div)) = self.kind() {
            self.advance();
            let right = self.parse_pow()?;
            left = UdqAstNode::binary(func, left, right)?;
        }
        Ok(left)
    }

    fn parse_pow(&mut self) -> Result<UdqAstNode, UdqError> {
        let base = self.parse_factor()?;
        if self.kind() != UdqTokenType::Binary(BinaryFunc::Pow) {
            return Ok(base);
        }
        self.advance();
        let exponent = self.parse_mul()?;
        UdqAstNode::binary(BinaryFunc::Pow, base, exponent)
    }

    fn parse_factor(&mut self) -> Result<UdqAstNode, UdqError> {
        let negate = match self.kind() {
            UdqTokenType::Binary(BinaryFunc::Sub) => {
                self.advance();
                true
            }
            UdqTokenType::Binary(BinaryFunc::Add) => {
                self.advance();
                false
            }
            _ => false,
        };

        let node = self.parse_operand()?;
        Ok(if negate { node.negated() } else { node })
    }

    fn parse_operand(&mut self) -> Result<UdqAstNode, UdqError> {
        let Some(token) = self.current().cloned() else {
            return Err(self.failed());
        };
        match token.kind {
            UdqTokenType::OpenParen => {
                self.advance();
                let inner = self.parse_set()?;
                self.expect_close()?;
                Ok(inner)
            }
            UdqTokenType::Elemental(_) | UdqTokenType::Scalar(_) | UdqTokenType::TableLookup => {
                self.advance();
                if self.kind() != UdqTokenType::OpenParen {
                    return Err(UdqError::MissingCallParen(token.value));
                }
                self.advance();
                let arg = self.parse_set()?;
                self.expect_close()?;
                Ok(match token.kind {
                    UdqTokenType::Elemental(func) => UdqAstNode::elemental(func, arg),
                    UdqTokenType::Scalar(func) => UdqAstNode::scalar_func(func, arg),
                    _ => UdqAstNode::table_lookup(token.value, arg),
                })
            }
            UdqTokenType::Number => {
                let value = token.value.parse::<f64>().map_err(|_| self.failed())?;
                self.advance();
                Ok(UdqAstNode::number(value))
            }
            UdqTokenType::EclExpr => {
                self.advance();
                UdqAstNode::quantity(token.value, token.selector)
            }
            _ => Err(self.failed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udq::token::tokenize;

    fn parse(keyword: &str, line: &str) -> Result<UdqAstNode, UdqError> {
        let items: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        parse_udq(keyword, &tokenize(&items))
    }

    #[test]
    fn well_expression_types() {
        let tree = parse("WUOPRL", "(WOPR PROD1 - 150) * 0.90").unwrap();
        assert_eq!(tree.var_type(), UdqVarType::Scalar);
        let tree = parse("WUX", "WOPR * 2 + WWPR").unwrap();
        assert_eq!(tree.var_type(), UdqVarType::WellVar);
    }

    #[test]
    fn precedence_of_power_and_product() {
        let tree = parse("FUX", "2 * 3 ^ 2").unwrap();
        assert_eq!(tree.size(), 5);
    }

    #[test]
    fn mixed_well_and_group_fails() {
        let err = parse("FUX", "WOPR 'P1' + GOPR 'G1'").unwrap_err();
        assert!(matches!(err, UdqError::CannotCoerce(..)));
        assert_eq!(err.category(), crate::error::ErrorCategory::UdqTypeError);
    }

    #[test]
    fn well_result_into_field_quantity_fails() {
        let err = parse("FUX", "WOPR").unwrap_err();
        assert_eq!(
            err,
            UdqError::InvalidConversion {
                expected: "FIELD_VAR",
                got: "WELL_VAR"
            }
        );
        assert!(parse("FUX", "SUM(WOPR)").is_ok());
    }

    #[test]
    fn syntax_errors() {
        let extra = parse("FUX", "FOPR )").unwrap_err();
        assert!(matches!(extra, UdqError::ExtraData { .. }));
        assert_eq!(extra.category(), crate::error::ErrorCategory::UdqParseError);
        assert!(matches!(parse("FUX", "SUM WOPR"), Err(UdqError::MissingCallParen(_))));
        assert!(matches!(parse("FUX", "(FOPR + 1"), Err(UdqError::ParseFailed { .. })));
        assert!(matches!(parse("FUX", ""), Err(UdqError::ParseFailed { .. })));
        assert!(matches!(parse("FUX", "TIME"), Err(UdqError::UndeterminedType(_))));
    }

    #[test]
    fn comparison_and_union_levels() {
        let tree = parse("WUX", "WOPR > 100 UADD WWCT").unwrap();
        assert_eq!(tree.var_type(), UdqVarType::WellVar);
        assert_eq!(tree.size(), 5);
    }
}
