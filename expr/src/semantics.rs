// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Evaluate expressions under a valuation of their variables.
//!
//! Arithmetic follows SMT-LIB integer semantics: `/` and `%` are Euclidean,
//! so the remainder is never negative. Evaluation is checked, so overflow and
//! division by zero are errors rather than panics.

use crate::syntax::*;
use itertools::Itertools;
use std::{collections::HashMap, iter, ops::RangeInclusive};
use thiserror::Error;

/// A valuation maps variable names to values.
pub type Valuation = HashMap<String, Value>;

/// An error from evaluating an expression.
#[allow(missing_docs)]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("variable {0} has no value")]
    Unassigned(String),
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch { expected: &'static str, found: Value },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("cannot evaluate {0}")]
    Unsupported(&'static str),
}

fn as_int(v: Value) -> Result<i64, EvalError> {
    match v {
        Value::Int(i) => Ok(i),
        found => Err(EvalError::TypeMismatch {
            expected: "integer",
            found,
        }),
    }
}

fn as_bool(v: Value) -> Result<bool, EvalError> {
    match v {
        Value::Bool(b) => Ok(b),
        found => Err(EvalError::TypeMismatch {
            expected: "boolean",
            found,
        }),
    }
}

impl Expression {
    /// Evaluate this expression under `valuation`.
    pub fn eval(&self, valuation: &Valuation) -> Result<Value, EvalError> {
        match self {
            Expression::Variable(v) => valuation
                .get(&v.name)
                .cloned()
                .ok_or_else(|| EvalError::Unassigned(v.name.clone())),
            Expression::Constant(c) => Ok(c.clone()),
            Expression::Negation(e) => Ok(Value::Bool(!e.holds(valuation)?)),
            Expression::NumericComparison { left, cmp, right } => {
                let (l, r) = (left.eval(valuation)?, right.eval(valuation)?);
                let b = match cmp {
                    NumericComparator::Eq => l == r,
                    NumericComparator::Ne => l != r,
                    _ => {
                        let (l, r) = (as_int(l)?, as_int(r)?);
                        match cmp {
                            NumericComparator::Ge => l >= r,
                            NumericComparator::Gt => l > r,
                            NumericComparator::Le => l <= r,
                            _ => l < r,
                        }
                    }
                };
                Ok(Value::Bool(b))
            }
            Expression::NumericCompound { left, op, right } => {
                let l = as_int(left.eval(valuation)?)?;
                let r = as_int(right.eval(valuation)?)?;
                let v = match op {
                    NumericOperator::Plus => l.checked_add(r),
                    NumericOperator::Minus => l.checked_sub(r),
                    NumericOperator::Mul => l.checked_mul(r),
                    NumericOperator::Div | NumericOperator::Rem if r == 0 => {
                        return Err(EvalError::DivisionByZero)
                    }
                    NumericOperator::Div => l.checked_div_euclid(r),
                    NumericOperator::Rem => l.checked_rem_euclid(r),
                };
                v.map(Value::Int).ok_or(EvalError::Overflow)
            }
            Expression::PropositionalCompound { left, op, right } => {
                let l = left.holds(valuation)?;
                let r = right.holds(valuation)?;
                let b = match op {
                    LogicalOperator::And => l && r,
                    LogicalOperator::Or => l || r,
                    LogicalOperator::Equiv => l == r,
                    LogicalOperator::Implies => !l || r,
                    LogicalOperator::Xor => l != r,
                };
                Ok(Value::Bool(b))
            }
            Expression::UnaryMinus(e) => as_int(e.eval(valuation)?)?
                .checked_neg()
                .map(Value::Int)
                .ok_or(EvalError::Overflow),
            Expression::Cast { .. } => Err(EvalError::Unsupported("cast")),
            Expression::Quantified { .. } => Err(EvalError::Unsupported("quantifier")),
            Expression::Bitvector { .. } | Expression::BitvectorNegation(_) => {
                Err(EvalError::Unsupported("bitvector operation"))
            }
        }
    }

    /// Evaluate a boolean expression.
    pub fn holds(&self, valuation: &Valuation) -> Result<bool, EvalError> {
        as_bool(self.eval(valuation)?)
    }
}

fn domain(ty: Type, ints: &RangeInclusive<i64>) -> Vec<Value> {
    match ty {
        Type::Bool => vec![Value::Bool(false), Value::Bool(true)],
        Type::Int(bounds) => ints
            .clone()
            .filter(|&i| bounds.contains(i))
            .map(Value::Int)
            .collect(),
        Type::BitVector { .. } => vec![],
    }
}

/// Enumerate every valuation of `vars` in which each integer variable takes a
/// value in `ints` (and within its own bounds) and each boolean is either
/// value.
///
/// With no variables there is exactly one (empty) valuation.
pub fn valuations<'a>(
    vars: &'a [Variable],
    ints: RangeInclusive<i64>,
) -> Box<dyn Iterator<Item = Valuation> + 'a> {
    if vars.is_empty() {
        return Box::new(iter::once(Valuation::new()));
    }
    Box::new(
        vars.iter()
            .map(|v| domain(v.ty, &ints))
            .multi_cartesian_product()
            .map(move |values| {
                vars.iter()
                    .map(|v| v.name.clone())
                    .zip(values)
                    .collect::<Valuation>()
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn eval(s: &str, assignment: &[(&str, Value)]) -> Result<Value, EvalError> {
        let vars = registry(assignment.iter().map(|(name, v)| Variable::new(name, v.ty())));
        let e = parse_expression(s, &vars).unwrap();
        let valuation = assignment
            .iter()
            .map(|(name, v)| (name.to_string(), v.clone()))
            .collect();
        e.eval(&valuation)
    }

    #[test]
    fn test_euclidean_division() {
        let x = [("x", Value::Int(-7))];
        assert_eq!(eval("x / 2", &x), Ok(Value::Int(-4)));
        assert_eq!(eval("x % 2", &x), Ok(Value::Int(1)));
        assert_eq!(eval("x / -2", &x), Ok(Value::Int(4)));
        assert_eq!(eval("x % -2", &x), Ok(Value::Int(1)));
        assert_eq!(eval("x / 0", &x), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_logic() {
        let a = [("p", Value::Bool(true)), ("q", Value::Bool(false))];
        assert_eq!(eval("p -> q", &a), Ok(Value::Bool(false)));
        assert_eq!(eval("q -> p", &a), Ok(Value::Bool(true)));
        assert_eq!(eval("p ^ q <-> true", &a), Ok(Value::Bool(true)));
        assert_eq!(eval("p = !q", &a), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_errors() {
        let x = [("x", Value::Int(i64::MAX)), ("p", Value::Bool(true))];
        assert_eq!(eval("x + 1", &x), Err(EvalError::Overflow));
        assert!(matches!(
            eval("x & p", &x),
            Err(EvalError::TypeMismatch { .. })
        ));
        let y = Expression::from(Variable::int("y"));
        assert_eq!(
            y.eval(&Valuation::new()),
            Err(EvalError::Unassigned("y".to_string()))
        );
    }

    #[test]
    fn test_valuations() {
        let vars = [
            Variable::bool("p"),
            Variable::new("x", Type::bounded_int(Some(0), None)),
        ];
        assert_eq!(valuations(&vars, -2..=2).count(), 2 * 3);
        assert!(valuations(&vars, -2..=2).all(|v| v["x"] != Value::Int(-1)));
        assert_eq!(valuations(&[], 0..=10).count(), 1);
    }
}
