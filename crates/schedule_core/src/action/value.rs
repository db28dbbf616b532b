use super::condition::Comparator;
use super::result::ActionResult;
use super::ActionError;

/// Operand of an ACTIONX comparison: a scalar, or one value per well.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionValue {
    Scalar(f64),
    Wells(Vec<(String, f64)>),
}

impl ActionValue {
    pub fn is_scalar(&self) -> bool {
        matches!(self, ActionValue::Scalar(_))
    }

    pub fn scalar(&self) -> Option<f64> {
        match self {
            ActionValue::Scalar(value) => Some(*value),
            ActionValue::Wells(_) => None,
        }
    }

    /// Compare against a scalar right-hand side. For a well set the outcome
    /// is true if any well satisfies the comparison, and the satisfying
    /// wells become the matching set.
    pub fn eval_cmp(&self, op: Comparator, rhs: &ActionValue) -> Result<ActionResult, ActionError> {
        let Some(rhs) = rhs.scalar() else {
            return Err(ActionError::NonScalarRhs);
        };
        Ok(match self {
            ActionValue::Scalar(lhs) => ActionResult::new(op.apply(*lhs, rhs)),
            ActionValue::Wells(values) => {
                let matching: Vec<&str> = values
                    .iter()
                    .filter(|(_, value)| op.apply(*value, rhs))
                    .map(|(well, _)| well.as_str())
                    .collect();
                ActionResult::with_wells(!matching.is_empty(), matching)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_comparison_has_no_matches() {
        let res = ActionValue::Scalar(5.0)
            .eval_cmp(Comparator::Greater, &ActionValue::Scalar(1.0))
            .unwrap();
        assert!(res.condition_satisfied());
        assert!(!res.matches().is_qualified());
    }

    #[test]
    fn well_set_comparison_collects_matching_wells() {
        let lhs = ActionValue::Wells(vec![
            ("OPX".into(), 0.1),
            ("OPY".into(), 2.0),
            ("OPZ".into(), 3.0),
        ]);
        let res = lhs
            .eval_cmp(Comparator::Greater, &ActionValue::Scalar(1.0))
            .unwrap();
        assert!(res.condition_satisfied());
        assert_eq!(res.matches().wells(), vec!["OPY", "OPZ"]);

        let res = lhs
            .eval_cmp(Comparator::Greater, &ActionValue::Scalar(10.0))
            .unwrap();
        assert!(!res.condition_satisfied());
    }

    #[test]
    fn set_valued_rhs_is_rejected() {
        let rhs = ActionValue::Wells(vec![("P1".into(), 1.0)]);
        let err = ActionValue::Scalar(1.0)
            .eval_cmp(Comparator::Equal, &rhs)
            .unwrap_err();
        assert_eq!(err, ActionError::NonScalarRhs);
    }
}
