//! DEFINE records: a UDQ computed from an expression.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorGuard, InputError, KeywordLocation, ParseContext};
use crate::types::ReportStep;

use super::ast::UdqAstNode;
use super::context::UdqContext;
use super::enums::{target_type, UdqUpdate, UdqVarType};
use super::parser::parse_udq;
use super::set::UdqSet;
use super::token::tokenize;
use super::UdqError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqDefine {
    keyword: String,
    var_type: UdqVarType,
    ast: UdqAstNode,
    input: Vec<String>,
    location: KeywordLocation,
    update: (UdqUpdate, ReportStep),
}

impl UdqDefine {
    /// Parse a DEFINE, failing on the first syntax or type error.
    pub fn parse(keyword: &str, items: &[String], report_step: ReportStep) -> Result<Self, UdqError> {
        let ast = parse_udq(keyword, &tokenize(items))?;
        Ok(Self::with_ast(keyword, items, ast, report_step))
    }

    /// Parse a DEFINE read from a deck. Errors are routed through
    /// `parse_context`; a broken expression evaluates to `undefined_value`.
    pub fn new(
        keyword: &str,
        items: &[String],
        location: KeywordLocation,
        report_step: ReportStep,
        undefined_value: f64,
        parse_context: &ParseContext,
        guard: &mut ErrorGuard,
    ) -> Self {
        let ast = match parse_udq(keyword, &tokenize(items)) {
            Ok(ast) => ast,
            Err(err) => {
                let error = InputError {
                    category: err.category(),
                    message: format!("UDQ {keyword}: {err}"),
                    location: location.clone(),
                };
                parse_context.handle(error, guard);
                UdqAstNode::number(undefined_value)
            }
        };
        let mut define = Self::with_ast(keyword, items, ast, report_step);
        define.location = location;
        define
    }

    fn with_ast(keyword: &str, items: &[String], ast: UdqAstNode, report_step: ReportStep) -> Self {
        Self {
            keyword: keyword.to_string(),
            var_type: target_type(keyword),
            ast,
            input: items.to_vec(),
            location: KeywordLocation::new("UDQ", "<restart>", 0),
            update: (UdqUpdate::On, report_step),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn var_type(&self) -> UdqVarType {
        self.var_type
    }

    pub fn ast(&self) -> &UdqAstNode {
        &self.ast
    }

    pub fn location(&self) -> &KeywordLocation {
        &self.location
    }

    pub fn input_tokens(&self) -> &[String] {
        &self.input
    }

    /// The expression as written in the deck.
    pub fn input_string(&self) -> String {
        self.input.join(" ")
    }

    pub fn status(&self) -> (UdqUpdate, ReportStep) {
        self.update
    }

    pub fn update_status(&mut self, update: UdqUpdate, report_step: ReportStep) {
        self.update = (update, report_step);
    }

    pub fn required_summary(&self, keys: &mut BTreeSet<String>) {
        self.ast.required_summary(keys);
    }

    /// Evaluate and shape the result as this quantity: a scalar result is
    /// broadcast to every well, group or segment. Values outside the
    /// configured range are undefined.
    pub fn eval(&self, ctx: &mut UdqContext<'_>) -> Result<UdqSet, UdqError> {
        let raw = self.ast.eval(self.var_type, ctx)?;
        let keyword = self.keyword.as_str();
        let broadcast = raw.scalar_value();

        let mut result = match self.var_type {
            UdqVarType::WellVar if raw.var_type() != UdqVarType::WellVar => {
                UdqSet::wells(keyword, ctx.wells(), broadcast)
            }
            UdqVarType::GroupVar if raw.var_type() != UdqVarType::GroupVar => {
                UdqSet::groups(keyword, ctx.groups(), broadcast)
            }
            UdqVarType::SegmentVar if raw.var_type() != UdqVarType::SegmentVar => {
                UdqSet::segments(keyword, &ctx.segment_items(), broadcast)
            }
            UdqVarType::WellVar | UdqVarType::GroupVar | UdqVarType::SegmentVar => raw,
            UdqVarType::FieldVar => UdqSet::field(keyword, broadcast),
            UdqVarType::Scalar => UdqSet::scalar(keyword, broadcast),
            other => {
                return Err(UdqError::UnsupportedTarget {
                    expr: self.input_string(),
                    target: other.name(),
                })
            }
        };
        result.set_name(keyword);

        let range = ctx.params().range;
        for index in 0..result.len() {
            if result
                .get(index)
                .and_then(|elem| elem.value())
                .is_some_and(|value| value.abs() > range)
            {
                result.assign_value(index, None);
            }
        }

        tracing::debug!(
            udq = %keyword,
            defined = result.defined_size(),
            "UDQ evaluated"
        );
        Ok(result)
    }
}
