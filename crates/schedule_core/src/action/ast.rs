//! Parsed ACTIONX condition tree.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::matcher::{has_wildcard, WListManager};

use super::condition::Comparator;
use super::context::ActionContext;
use super::result::ActionResult;
use super::token::FuncType;
use super::value::ActionValue;
use super::ActionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Quantity {
        func: String,
        func_type: FuncType,
        args: SmallVec<[String; 2]>,
    },
    Number(f64),
}

impl Operand {
    pub fn quantity<I, S>(func: impl Into<String>, func_type: FuncType, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operand::Quantity {
            func: func.into(),
            func_type,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve the operand against `ctx`.
    ///
    /// A well quantity resolves to a well set: a `*NAME` argument names a
    /// well list, anything else is a pattern over the wells that carry the
    /// quantity. Every other qualified quantity resolves to a scalar keyed
    /// by its arguments.
    pub fn value(&self, ctx: &ActionContext<'_>) -> Result<ActionValue, ActionError> {
        let (func, func_type, args) = match self {
            Operand::Number(value) => return Ok(ActionValue::Scalar(*value)),
            Operand::Quantity {
                func,
                func_type,
                args,
            } => (func, *func_type, args),
        };

        let Some(first) = args.first() else {
            return ctx.get(func).map(ActionValue::Scalar);
        };

        match func_type {
            FuncType::Well => {
                let wells = if WListManager::is_list_name(first) {
                    ctx.wlist_manager()
                        .wells(first)
                        .map(<[String]>::to_vec)
                        .unwrap_or_default()
                } else {
                    ctx.wells_matching(func, first)
                };
                let mut values = Vec::with_capacity(wells.len());
                for well in wells {
                    let value = ctx.get_entity(func, &well)?;
                    values.push((well, value));
                }
                Ok(ActionValue::Wells(values))
            }
            FuncType::Group if has_wildcard(first) => Err(ActionError::GroupWildcard {
                func: func.clone(),
                pattern: first.clone(),
            }),
            _ => ctx.get_entity(func, &args.join(":")).map(ActionValue::Scalar),
        }
    }

    /// Summary key this operand needs, if any.
    pub fn summary_key(&self) -> Option<&str> {
        match self {
            Operand::Quantity { func, .. } => Some(func.as_str()),
            Operand::Number(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstNode {
    Compare {
        op: Comparator,
        left: Operand,
        right: Operand,
    },
    And(Vec<AstNode>),
    Or(Vec<AstNode>),
}

impl AstNode {
    /// Evaluate the tree. Every child of an AND/OR node is evaluated so the
    /// matching sets are complete.
    pub fn eval(&self, ctx: &ActionContext<'_>) -> Result<ActionResult, ActionError> {
        match self {
            AstNode::Compare { op, left, right } => {
                let lhs = left.value(ctx)?;
                let rhs = right.value(ctx)?;
                lhs.eval_cmp(*op, &rhs)
            }
            AstNode::And(children) => {
                let mut result = ActionResult::new(true);
                for child in children {
                    result.make_set_intersection(&child.eval(ctx)?);
                }
                Ok(result)
            }
            AstNode::Or(children) => {
                let mut result = ActionResult::new(false);
                for child in children {
                    result.make_set_union(&child.eval(ctx)?);
                }
                Ok(result)
            }
        }
    }

    /// Summary keys the condition reads. Month names are not summary keys.
    pub fn required_summary(&self, keys: &mut std::collections::BTreeSet<String>) {
        match self {
            AstNode::Compare { left, right, .. } => {
                for operand in [left, right] {
                    if let Some(key) = operand.summary_key() {
                        if super::context::month_number(key).is_none() {
                            keys.insert(key.to_string());
                        }
                    }
                }
            }
            AstNode::And(children) | AstNode::Or(children) => {
                for child in children {
                    child.required_summary(keys);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::matcher::WListOp;
    use crate::summary::SummaryState;

    fn well_cmp(func: &str, arg: &str, op: Comparator, rhs: f64) -> AstNode {
        AstNode::Compare {
            op,
            left: Operand::quantity(func, FuncType::Well, [arg]),
            right: Operand::Number(rhs),
        }
    }

    fn summary() -> SummaryState {
        let mut st = SummaryState::default();
        st.update_well_var("OP1", "WOPR", 100.0);
        st.update_well_var("OP2", "WOPR", 50.0);
        st.update_well_var("OP3", "WOPR", 10.0);
        st.update_well_var("WI1", "WOPR", 0.0);
        st.update("FOPR", 160.0);
        st
    }

    #[test]
    fn wildcard_well_leaf_yields_matching_set() {
        let st = summary();
        let wlm = WListManager::default();
        let ctx = ActionContext::new(&st, &wlm);
        let res = well_cmp("WOPR", "OP*", Comparator::Greater, 20.0)
            .eval(&ctx)
            .unwrap();
        assert!(res.condition_satisfied());
        assert_eq!(res.matches().wells(), vec!["OP1", "OP2"]);
    }

    #[test]
    fn named_well_leaf_matches_that_well() {
        let st = summary();
        let wlm = WListManager::default();
        let ctx = ActionContext::new(&st, &wlm);
        let res = well_cmp("WOPR", "OP3", Comparator::Less, 20.0)
            .eval(&ctx)
            .unwrap();
        assert!(res.condition_satisfied());
        assert_eq!(res.matches().wells(), vec!["OP3"]);
    }

    #[test]
    fn well_list_argument_resolves_through_manager() {
        let st = summary();
        let mut wlm = WListManager::default();
        wlm.apply(WListOp::New, "*PROD", &["OP2".to_string(), "OP3".to_string()]);
        let ctx = ActionContext::new(&st, &wlm);
        let res = well_cmp("WOPR", "*PROD", Comparator::Greater, 0.0)
            .eval(&ctx)
            .unwrap();
        assert_eq!(res.matches().wells(), vec!["OP2", "OP3"]);
    }

    #[test]
    fn and_of_field_and_well_keeps_well_matches() {
        let st = summary();
        let wlm = WListManager::default();
        let ctx = ActionContext::new(&st, &wlm);
        let tree = AstNode::And(vec![
            AstNode::Compare {
                op: Comparator::Greater,
                left: Operand::quantity("FOPR", FuncType::Field, Vec::<String>::new()),
                right: Operand::Number(100.0),
            },
            well_cmp("WOPR", "*", Comparator::Greater, 40.0),
        ]);
        let res = tree.eval(&ctx).unwrap();
        assert!(res.condition_satisfied());
        assert_eq!(res.matches().wells(), vec!["OP1", "OP2"]);
    }

    #[test]
    fn group_wildcard_is_rejected() {
        let st = summary();
        let wlm = WListManager::default();
        let ctx = ActionContext::new(&st, &wlm);
        let tree = AstNode::Compare {
            op: Comparator::Greater,
            left: Operand::quantity("GOPR", FuncType::Group, ["G*"]),
            right: Operand::Number(1.0),
        };
        assert!(matches!(
            tree.eval(&ctx),
            Err(ActionError::GroupWildcard { .. })
        ));
    }

    #[test]
    fn required_summary_skips_months() {
        let tree = AstNode::Or(vec![
            well_cmp("WWCT", "OP1", Comparator::Greater, 0.5),
            AstNode::Compare {
                op: Comparator::Equal,
                left: Operand::quantity("MNTH", FuncType::TimeMonth, Vec::<String>::new()),
                right: Operand::quantity("JUN", FuncType::None, Vec::<String>::new()),
            },
        ]);
        let mut keys = BTreeSet::new();
        tree.required_summary(&mut keys);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["MNTH", "WWCT"]);
    }
}
