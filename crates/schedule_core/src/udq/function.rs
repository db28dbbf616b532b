//! The UDQ function table: reductions, element-wise functions and binary
//! operators.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::enums::{BinaryFunc, ElementalFunc, ScalarFunc};
use super::params::UdqParams;
use super::set::UdqSet;
use super::UdqError;

/// Dispatches UDQ functions by kind.
///
/// Owns the random streams: `RANDN`/`RANDU` draw from a stream seeded with
/// `UDQPARAM` item 1 so runs are reproducible, `RRNDN`/`RRNDU` from a stream
/// seeded from OS entropy.
#[derive(Debug, Clone)]
pub struct UdqFunctionTable {
    params: UdqParams,
    sim_rng: ChaCha8Rng,
    true_rng: ChaCha8Rng,
}

impl Default for UdqFunctionTable {
    fn default() -> Self {
        Self::new(UdqParams::default())
    }
}

impl UdqFunctionTable {
    pub fn new(params: UdqParams) -> Self {
        let sim_rng = ChaCha8Rng::seed_from_u64(params.rand_seed);
        Self {
            params,
            sim_rng,
            true_rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn params(&self) -> &UdqParams {
        &self.params
    }

    /// Restart the reproducible stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.sim_rng = ChaCha8Rng::seed_from_u64(seed);
    }

    // -----------------------------------------------------------------------
    // Scalar functions
    // -----------------------------------------------------------------------

    /// Reduce the defined elements of `arg` to one value. No defined
    /// elements gives an undefined scalar.
    pub fn eval_scalar(&self, func: ScalarFunc, arg: &UdqSet) -> Result<UdqSet, UdqError> {
        let values = arg.defined_values();
        let name = func.as_str();
        if values.is_empty() {
            return Ok(UdqSet::scalar(name, None));
        }
        let n = values.len() as f64;
        let value = match func {
            ScalarFunc::Sum => values.iter().sum(),
            ScalarFunc::AveA => values.iter().sum::<f64>() / n,
            ScalarFunc::AveG => {
                if values.iter().any(|&x| x <= 0.0) {
                    return Err(UdqError::NonPositiveAveg);
                }
                (values.iter().map(|x| x.ln()).sum::<f64>() / n).exp()
            }
            ScalarFunc::AveH => n / values.iter().map(|x| 1.0 / x).sum::<f64>(),
            ScalarFunc::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            ScalarFunc::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            ScalarFunc::Norm1 => values.iter().map(|x| x.abs()).sum(),
            ScalarFunc::Norm2 => values.iter().map(|x| x * x).sum::<f64>().sqrt(),
            ScalarFunc::NormI => values.iter().map(|x| x.abs()).fold(0.0, f64::max),
            ScalarFunc::Prod => values.iter().product(),
        };
        Ok(UdqSet::scalar(name, Some(value)))
    }

    // -----------------------------------------------------------------------
    // Elemental functions
    // -----------------------------------------------------------------------

    pub fn eval_elemental(&mut self, func: ElementalFunc, arg: &UdqSet) -> Result<UdqSet, UdqError> {
        let result = match func {
            ElementalFunc::Abs => arg.map_defined(f64::abs),
            ElementalFunc::Def => arg.map_defined(|_| 1.0),
            ElementalFunc::Exp => arg.map_defined(f64::exp),
            ElementalFunc::Nint => arg.map_defined(f64::round),
            ElementalFunc::Idv => {
                let mut result = arg.clone();
                for (index, elem) in arg.iter().enumerate() {
                    result.assign_index(index, if elem.is_defined() { 1.0 } else { 0.0 });
                }
                result
            }
            ElementalFunc::Undef => {
                let mut result = arg.clone();
                for (index, elem) in arg.iter().enumerate() {
                    result.assign_value(index, (!elem.is_defined()).then_some(1.0));
                }
                result
            }
            ElementalFunc::Ln => log_elements(arg, "LN", f64::ln)?,
            ElementalFunc::Log => log_elements(arg, "LOG", f64::log10)?,
            ElementalFunc::SortA => sort_rank(arg, true),
            ElementalFunc::SortD => sort_rank(arg, false),
            ElementalFunc::RandN => random_elements(arg, &mut self.sim_rng, normal_sample),
            ElementalFunc::RandU => random_elements(arg, &mut self.sim_rng, uniform_sample),
            ElementalFunc::RrndN => random_elements(arg, &mut self.true_rng, normal_sample),
            ElementalFunc::RrndU => random_elements(arg, &mut self.true_rng, uniform_sample),
        };
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Binary functions
    // -----------------------------------------------------------------------

    pub fn eval_binary(&self, func: BinaryFunc, lhs: &UdqSet, rhs: &UdqSet) -> Result<UdqSet, UdqError> {
        let eps = self.params.cmp_epsilon;
        match func {
            BinaryFunc::Add => lhs.arith(rhs, |x, y| x + y),
            BinaryFunc::Sub => lhs.arith(rhs, |x, y| x - y),
            BinaryFunc::Mul => lhs.arith(rhs, |x, y| x * y),
            BinaryFunc::Div => lhs.arith(rhs, |x, y| x / y),
            BinaryFunc::Pow => lhs.arith(rhs, f64::powf),
            BinaryFunc::Eq => lhs.arith(rhs, |x, y| indicator(approx_eq(eps, x, y))),
            BinaryFunc::Ne => lhs.arith(rhs, |x, y| indicator(!approx_eq(eps, x, y))),
            BinaryFunc::Le => lhs.arith(rhs, |x, y| {
                indicator(x.total_cmp(&y).is_eq() || y + eps * x.abs().max(y.abs()) >= x)
            }),
            BinaryFunc::Ge => lhs.arith(rhs, |x, y| {
                indicator(x.total_cmp(&y).is_eq() || x >= y - eps * x.abs().max(y.abs()))
            }),
            BinaryFunc::Lt => lhs.arith(rhs, |x, y| indicator(x - y < 0.0)),
            BinaryFunc::Gt => lhs.arith(rhs, |x, y| indicator(x - y > 0.0)),
            BinaryFunc::UAdd => union(lhs, rhs, |x, y| x + y),
            BinaryFunc::UMul => union(lhs, rhs, |x, y| x * y),
            BinaryFunc::UMin => union(lhs, rhs, f64::min),
            BinaryFunc::UMax => union(lhs, rhs, f64::max),
        }
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Relative equality: `|x - y| <= eps * max(|x|, |y|)`.
fn approx_eq(eps: f64, x: f64, y: f64) -> bool {
    (x - y).abs() <= eps * x.abs().max(y.abs())
}

fn log_elements(arg: &UdqSet, func: &'static str, f: fn(f64) -> f64) -> Result<UdqSet, UdqError> {
    if let Some(value) = arg.defined_values().into_iter().find(|&x| x <= 0.0) {
        return Err(UdqError::InvalidArgument { func, value });
    }
    Ok(arg.map_defined(f))
}

/// Replace each defined value by its 1-based rank.
fn sort_rank(arg: &UdqSet, ascending: bool) -> UdqSet {
    let mut order: Vec<(usize, f64)> = arg
        .iter()
        .enumerate()
        .filter_map(|(index, elem)| elem.value().map(|value| (index, value)))
        .collect();
    order.sort_by(|a, b| {
        if ascending {
            a.1.total_cmp(&b.1)
        } else {
            b.1.total_cmp(&a.1)
        }
    });

    let mut result = arg.clone();
    for (rank, (index, _)) in order.into_iter().enumerate() {
        result.assign_index(index, (rank + 1) as f64);
    }
    result
}

fn random_elements(arg: &UdqSet, rng: &mut ChaCha8Rng, sample: fn(&mut ChaCha8Rng) -> f64) -> UdqSet {
    let mut result = arg.clone();
    for (index, elem) in arg.iter().enumerate() {
        if elem.is_defined() {
            result.assign_index(index, sample(rng));
        }
    }
    result
}

/// Standard normal sample by the Box-Muller transform.
fn normal_sample(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn uniform_sample(rng: &mut ChaCha8Rng) -> f64 {
    rng.gen_range(-1.0..1.0)
}

/// Union functions: where only one side is defined that side wins.
fn union(lhs: &UdqSet, rhs: &UdqSet, f: impl Fn(f64, f64) -> f64) -> Result<UdqSet, UdqError> {
    if lhs.len() != rhs.len() {
        return Err(UdqError::SizeMismatch {
            lhs: lhs.name().to_string(),
            lhs_size: lhs.len(),
            rhs: rhs.name().to_string(),
            rhs_size: rhs.len(),
        });
    }
    lhs.zip_with(rhs, |x, y| match (x, y) {
        (Some(x), Some(y)) => Some(f(x, y)),
        (x, y) => x.or(y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wells(values: &[Option<f64>]) -> UdqSet {
        let names: Vec<String> = (1..=values.len()).map(|i| format!("P{i}")).collect();
        let mut set = UdqSet::wells("WOPR", &names, None);
        for (index, value) in values.iter().enumerate() {
            set.assign_value(index, *value);
        }
        set
    }

    #[test]
    fn reductions_skip_undefined() {
        let table = UdqFunctionTable::default();
        let arg = wells(&[Some(1.0), None, Some(4.0)]);
        let sum = table.eval_scalar(ScalarFunc::Sum, &arg).unwrap();
        assert_eq!(sum.scalar_value(), Some(5.0));
        let avea = table.eval_scalar(ScalarFunc::AveA, &arg).unwrap();
        assert!((avea.scalar_value().unwrap() - 2.5).abs() < 1e-12);
        let aveg = table.eval_scalar(ScalarFunc::AveG, &arg).unwrap();
        assert!((aveg.scalar_value().unwrap() - 2.0).abs() < 1e-12);
        let aveh = table.eval_scalar(ScalarFunc::AveH, &arg).unwrap();
        assert!((aveh.scalar_value().unwrap() - 1.6).abs() < 1e-12);
        let normi = table.eval_scalar(ScalarFunc::NormI, &wells(&[Some(-7.0), Some(3.0)])).unwrap();
        assert_eq!(normi.scalar_value(), Some(7.0));
    }

    #[test]
    fn reduction_of_nothing_is_undefined() {
        let table = UdqFunctionTable::default();
        let res = table.eval_scalar(ScalarFunc::Max, &wells(&[None, None])).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res.scalar_value(), None);
    }

    #[test]
    fn aveg_rejects_non_positive() {
        let table = UdqFunctionTable::default();
        let res = table.eval_scalar(ScalarFunc::AveG, &wells(&[Some(1.0), Some(0.0)]));
        assert_eq!(res, Err(UdqError::NonPositiveAveg));
    }

    #[test]
    fn elemental_definedness() {
        let mut table = UdqFunctionTable::default();
        let arg = wells(&[Some(-2.0), None]);
        let idv = table.eval_elemental(ElementalFunc::Idv, &arg).unwrap();
        assert_eq!(idv.defined_values(), vec![1.0, 0.0]);
        let undef = table.eval_elemental(ElementalFunc::Undef, &arg).unwrap();
        assert_eq!(undef.defined_values(), vec![1.0]);
        assert!(undef.get(1).unwrap().is_defined());
        let abs = table.eval_elemental(ElementalFunc::Abs, &arg).unwrap();
        assert_eq!(abs.defined_values(), vec![2.0]);
        assert!(table.eval_elemental(ElementalFunc::Ln, &arg).is_err());
    }

    #[test]
    fn sort_ranks_defined_values() {
        let mut table = UdqFunctionTable::default();
        let arg = wells(&[Some(30.0), None, Some(10.0), Some(20.0)]);
        let asc = table.eval_elemental(ElementalFunc::SortA, &arg).unwrap();
        assert_eq!(asc.defined_values(), vec![3.0, 1.0, 2.0]);
        let desc = table.eval_elemental(ElementalFunc::SortD, &arg).unwrap();
        assert_eq!(desc.defined_values(), vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn seeded_random_streams_repeat() {
        let arg = wells(&[Some(0.0), Some(0.0), None]);
        let mut a = UdqFunctionTable::default();
        let mut b = UdqFunctionTable::default();
        let ra = a.eval_elemental(ElementalFunc::RandU, &arg).unwrap();
        let rb = b.eval_elemental(ElementalFunc::RandU, &arg).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra.defined_size(), 2);
        assert!(ra.defined_values().iter().all(|x| (-1.0..1.0).contains(x)));
    }

    #[test]
    fn comparisons_use_relative_epsilon() {
        let table = UdqFunctionTable::default();
        let x = UdqSet::scalar("X", Some(100.0));
        let y = UdqSet::scalar("Y", Some(100.005));
        let eq = table.eval_binary(BinaryFunc::Eq, &x, &y).unwrap();
        assert_eq!(eq.scalar_value(), Some(1.0));
        let ne = table.eval_binary(BinaryFunc::Ne, &x, &y).unwrap();
        assert_eq!(ne.scalar_value(), Some(0.0));
        let lt = table.eval_binary(BinaryFunc::Lt, &x, &y).unwrap();
        assert_eq!(lt.scalar_value(), Some(1.0));
        let ge = table.eval_binary(BinaryFunc::Ge, &x, &y).unwrap();
        assert_eq!(ge.scalar_value(), Some(1.0));
    }

    #[test]
    fn union_takes_the_defined_side() {
        let table = UdqFunctionTable::default();
        let lhs = wells(&[Some(1.0), None, None]);
        let rhs = wells(&[Some(2.0), Some(5.0), None]);
        let res = table.eval_binary(BinaryFunc::UAdd, &lhs, &rhs).unwrap();
        assert_eq!(res.defined_values(), vec![3.0, 5.0]);
        assert!(!res.get(2).unwrap().is_defined());
        let short = wells(&[Some(1.0)]);
        assert!(table.eval_binary(BinaryFunc::UMax, &lhs, &short).is_err());
    }
}
