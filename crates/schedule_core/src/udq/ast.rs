//! UDQ expression trees with static type inference.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::matcher::has_wildcard;

use super::context::UdqContext;
use super::enums::{
    coerce, is_udq, target_type, target_type_with_selector, BinaryFunc, ElementalFunc, ScalarFunc,
    UdqVarType,
};
use super::set::UdqSet;
use super::UdqError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum NodeKind {
    Number(f64),
    Quantity {
        keyword: String,
        selector: Vec<String>,
    },
    Elemental {
        func: ElementalFunc,
        arg: Box<UdqAstNode>,
    },
    Scalar {
        func: ScalarFunc,
        arg: Box<UdqAstNode>,
    },
    Binary {
        func: BinaryFunc,
        left: Box<UdqAstNode>,
        right: Box<UdqAstNode>,
    },
    TableLookup {
        table: String,
        arg: Box<UdqAstNode>,
    },
}

/// One node of a parsed DEFINE expression.
///
/// `var_type` is the shape of the node's value: a well quantity qualified by
/// a single well name is a scalar. `origin_type` tracks which kind of entity
/// the value came from regardless of selectors, so well and group values can
/// never be mixed even when both are reduced to single numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqAstNode {
    kind: NodeKind,
    sign: f64,
    var_type: UdqVarType,
    origin_type: UdqVarType,
}

impl UdqAstNode {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    pub fn number(value: f64) -> Self {
        Self {
            kind: NodeKind::Number(value),
            sign: 1.0,
            var_type: UdqVarType::Scalar,
            origin_type: UdqVarType::Scalar,
        }
    }

    /// A summary or UDQ quantity leaf.
    pub fn quantity(keyword: impl Into<String>, selector: Vec<String>) -> Result<Self, UdqError> {
        let keyword = keyword.into();
        let origin_type = target_type(&keyword);
        if matches!(
            origin_type,
            UdqVarType::ConnectionVar
                | UdqVarType::RegionVar
                | UdqVarType::SegmentVar
                | UdqVarType::AquiferVar
                | UdqVarType::BlockVar
        ) {
            return Err(UdqError::UnsupportedLeafType(origin_type.name()));
        }
        let var_type = target_type_with_selector(&keyword, &selector);
        Ok(Self {
            kind: NodeKind::Quantity { keyword, selector },
            sign: 1.0,
            var_type,
            origin_type,
        })
    }

    pub fn elemental(func: ElementalFunc, arg: UdqAstNode) -> Self {
        Self {
            var_type: arg.var_type,
            origin_type: arg.origin_type,
            kind: NodeKind::Elemental {
                func,
                arg: Box::new(arg),
            },
            sign: 1.0,
        }
    }

    pub fn scalar_func(func: ScalarFunc, arg: UdqAstNode) -> Self {
        Self {
            kind: NodeKind::Scalar {
                func,
                arg: Box::new(arg),
            },
            sign: 1.0,
            var_type: UdqVarType::Scalar,
            origin_type: UdqVarType::Scalar,
        }
    }

    pub fn table_lookup(table: impl Into<String>, arg: UdqAstNode) -> Self {
        Self {
            var_type: arg.var_type,
            origin_type: arg.origin_type,
            kind: NodeKind::TableLookup {
                table: table.into(),
                arg: Box::new(arg),
            },
            sign: 1.0,
        }
    }

    /// Combine two operands. Fails when the operands come from different
    /// kinds of entities, e.g. a well quantity and a group quantity.
    pub fn binary(func: BinaryFunc, left: UdqAstNode, right: UdqAstNode) -> Result<Self, UdqError> {
        let origin_type = coerce(left.origin_type, right.origin_type)?;
        let var_type = coerce(left.var_type, right.var_type)?;

        if func == BinaryFunc::Mul {
            if left.is_minus_one() {
                return Ok(right.negated());
            }
            if right.is_minus_one() {
                return Ok(left.negated());
            }
        }

        Ok(Self {
            kind: NodeKind::Binary {
                func,
                left: Box::new(left),
                right: Box::new(right),
            },
            sign: 1.0,
            var_type,
            origin_type,
        })
    }

    /// Flip the sign multiplier; repeated negation never grows the tree.
    pub fn negated(mut self) -> Self {
        self.sign = -self.sign;
        self
    }

    fn is_minus_one(&self) -> bool {
        match self.kind {
            NodeKind::Number(value) => (value * self.sign + 1.0).abs() < f64::EPSILON,
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn var_type(&self) -> UdqVarType {
        self.var_type
    }

    pub fn origin_type(&self) -> UdqVarType {
        self.origin_type
    }

    pub fn sign(&self) -> f64 {
        self.sign
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        1 + self.children().map(UdqAstNode::size).sum::<usize>()
    }

    fn children(&self) -> impl Iterator<Item = &UdqAstNode> {
        let (first, second) = match &self.kind {
            NodeKind::Number(_) | NodeKind::Quantity { .. } => (None, None),
            NodeKind::Elemental { arg, .. }
            | NodeKind::Scalar { arg, .. }
            | NodeKind::TableLookup { arg, .. } => (Some(arg.as_ref()), None),
            NodeKind::Binary { left, right, .. } => (Some(left.as_ref()), Some(right.as_ref())),
        };
        first.into_iter().chain(second)
    }

    /// Summary vectors the expression reads. UDQs are not included.
    pub fn required_summary(&self, keys: &mut BTreeSet<String>) {
        if let NodeKind::Quantity { keyword, .. } = &self.kind {
            if !is_udq(keyword) {
                keys.insert(keyword.clone());
            }
        }
        for child in self.children() {
            child.required_summary(keys);
        }
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Evaluate against `ctx`. Number leaves take the shape of `target`.
    pub fn eval(&self, target: UdqVarType, ctx: &mut UdqContext<'_>) -> Result<UdqSet, UdqError> {
        let result = match &self.kind {
            NodeKind::Number(value) => eval_number(target, ctx, *value)?,
            NodeKind::Quantity { keyword, selector } => eval_quantity(keyword, selector, ctx)?,
            NodeKind::Elemental { func, arg } => {
                let arg = arg.eval(target, ctx)?;
                ctx.function_table().eval_elemental(*func, &arg)?
            }
            NodeKind::Scalar { func, arg } => {
                let arg = arg.eval(target, ctx)?;
                ctx.function_table().eval_scalar(*func, &arg)?
            }
            NodeKind::Binary { func, left, right } => {
                let lhs = left.eval(target, ctx)?;
                let rhs = right.eval(target, ctx)?;
                ctx.function_table().eval_binary(*func, &lhs, &rhs)?
            }
            NodeKind::TableLookup { table, .. } => return Err(UdqError::TableLookup(table.clone())),
        };

        if self.sign < 0.0 {
            Ok(result.map_defined(|x| -x))
        } else {
            Ok(result)
        }
    }
}

fn eval_number(target: UdqVarType, ctx: &UdqContext<'_>, value: f64) -> Result<UdqSet, UdqError> {
    let name = value.to_string();
    match target {
        UdqVarType::WellVar => Ok(UdqSet::wells(name, ctx.wells(), Some(value))),
        UdqVarType::GroupVar => Ok(UdqSet::groups(name, ctx.groups(), Some(value))),
        UdqVarType::SegmentVar => Ok(UdqSet::segments(name, &ctx.segment_items(), Some(value))),
        UdqVarType::Scalar => Ok(UdqSet::scalar(name, Some(value))),
        UdqVarType::FieldVar => Ok(UdqSet::field(name, Some(value))),
        other => Err(UdqError::UnsupportedTarget {
            expr: name,
            target: other.name(),
        }),
    }
}

fn eval_quantity(keyword: &str, selector: &[String], ctx: &UdqContext<'_>) -> Result<UdqSet, UdqError> {
    match target_type(keyword) {
        UdqVarType::WellVar => eval_well_quantity(keyword, selector, ctx),
        UdqVarType::GroupVar => eval_group_quantity(keyword, selector, ctx),
        UdqVarType::FieldVar => Ok(UdqSet::field(keyword, ctx.get(keyword))),
        _ => ctx
            .get(keyword)
            .map(|value| UdqSet::scalar(keyword, Some(value)))
            .ok_or_else(|| UdqError::NoSuchVariable(keyword.to_string())),
    }
}

/// All wells; a named well gives a scalar; a pattern leaves non-matching
/// wells undefined.
fn eval_well_quantity(keyword: &str, selector: &[String], ctx: &UdqContext<'_>) -> Result<UdqSet, UdqError> {
    let wells = ctx.wells();
    let pattern = match selector.first() {
        None => None,
        Some(well) if !has_wildcard(well) => {
            return Ok(UdqSet::scalar(keyword, ctx.get_well_var(well, keyword)?));
        }
        Some(pattern) => Some(pattern.as_str()),
    };

    let mut result = UdqSet::wells(keyword, wells, None);
    let selected = match pattern {
        Some(pattern) => ctx.wells_matching(pattern),
        None => wells.to_vec(),
    };
    for (index, well) in wells.iter().enumerate() {
        if selected.contains(well) {
            result.assign_value(index, ctx.get_well_var(well, keyword)?);
        }
    }
    Ok(result)
}

fn eval_group_quantity(keyword: &str, selector: &[String], ctx: &UdqContext<'_>) -> Result<UdqSet, UdqError> {
    match selector.first() {
        None => {
            let groups = ctx.groups();
            let mut result = UdqSet::groups(keyword, groups, None);
            for (index, group) in groups.iter().enumerate() {
                result.assign_value(index, ctx.get_group_var(group, keyword)?);
            }
            Ok(result)
        }
        Some(pattern) if has_wildcard(pattern) => Err(UdqError::GroupWildcard(pattern.clone())),
        Some(group) => Ok(UdqSet::scalar(keyword, ctx.get_group_var(group, keyword)?)),
    }
}
