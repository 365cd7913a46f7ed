// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The expression AST: types, variables and expressions.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Inclusive bounds on an integer type. Either side may be absent.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Default, Serialize)]
pub struct IntBounds {
    /// Smallest allowed value
    pub min: Option<i64>,
    /// Largest allowed value
    pub max: Option<i64>,
}

impl IntBounds {
    /// Whether `value` lies within the bounds.
    pub fn contains(&self, value: i64) -> bool {
        self.min.map_or(true, |min| min <= value) && self.max.map_or(true, |max| value <= max)
    }
}

/// The type of an expression.
///
/// Only booleans and (possibly bounded) integers can be sent to the solver;
/// bitvectors exist so that bitvector expressions can be represented and
/// rejected.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize)]
pub enum Type {
    /// Boolean type
    Bool,
    /// Mathematical integers, optionally restricted to a range
    Int(IntBounds),
    /// Fixed-width bitvectors
    #[allow(missing_docs)]
    BitVector { width: u32 },
}

impl Type {
    /// Unbounded integers.
    pub fn int() -> Self {
        Self::Int(IntBounds::default())
    }

    /// Integers restricted to `min..=max`, where either bound may be absent.
    pub fn bounded_int(min: Option<i64>, max: Option<i64>) -> Self {
        Self::Int(IntBounds { min, max })
    }

    /// Signed 32-bit integers, as integers bounded to the `i32` range.
    pub fn sint32() -> Self {
        Self::bounded_int(Some(i32::MIN.into()), Some(i32::MAX.into()))
    }

    /// Whether this is the boolean type.
    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    /// Whether this is an integer type (bounded or not).
    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int(IntBounds {
                min: None,
                max: None,
            }) => write!(f, "int"),
            Type::Int(IntBounds { min, max }) => {
                let side = |b: &Option<i64>| b.map(|b| b.to_string()).unwrap_or_default();
                write!(f, "int[{}..{}]", side(min), side(max))
            }
            Type::BitVector { width } => write!(f, "bv{width}"),
        }
    }
}

/// A constant value.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize)]
pub enum Value {
    /// A boolean
    Bool(bool),
    /// An integer
    Int(i64),
    /// A bitvector of the given width
    #[allow(missing_docs)]
    BitVector { value: u64, width: u32 },
}

impl Value {
    /// The type of this value. Integers are unbounded.
    pub fn ty(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::int(),
            Value::BitVector { width, .. } => Type::BitVector { width: *width },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::BitVector { value, width } => write!(f, "{value}bv{width}"),
        }
    }
}

/// A named, typed variable.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize)]
pub struct Variable {
    /// The name, unique within an encoding session
    pub name: String,
    /// The variable's type
    pub ty: Type,
}

impl Variable {
    /// Smart constructor that takes the name by reference.
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }

    /// An unbounded integer variable.
    pub fn int(name: &str) -> Self {
        Self::new(name, Type::int())
    }

    /// A boolean variable.
    pub fn bool(name: &str) -> Self {
        Self::new(name, Type::Bool)
    }
}

/// Maps variable names to the declared variable.
pub type VariableRegistry = HashMap<String, Variable>;

/// Build a registry from some variables, keyed by name.
pub fn registry<I>(vars: I) -> VariableRegistry
where
    I: IntoIterator<Item = Variable>,
{
    vars.into_iter().map(|v| (v.name.clone(), v)).collect()
}

/// Comparisons between two integers
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize)]
pub enum NumericComparator {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

/// Binary integer arithmetic
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize)]
pub enum NumericOperator {
    Plus,
    Minus,
    Mul,
    /// Integer division, rounding so that the remainder is non-negative
    Div,
    /// Remainder of [`NumericOperator::Div`], always non-negative
    Rem,
}

/// Binary logical connectives
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize)]
pub enum LogicalOperator {
    And,
    Or,
    Equiv,
    Implies,
    Xor,
}

/// A kind of quantifier (forall or exists)
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize)]
pub enum Quantifier {
    Forall,
    Exists,
}

/// Binary bitvector operations
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize)]
pub enum BitvectorOperator {
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

/// A typed expression.
///
/// Integer and boolean expressions are the supported fragment. Casts,
/// quantifiers and bitvector operations are part of the language but cannot
/// be handed to the solver.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize)]
pub enum Expression {
    /// A reference to a variable
    Variable(Variable),
    /// A constant value
    Constant(Value),
    /// Boolean negation
    Negation(Box<Expression>),
    /// Comparison of two integers
    #[allow(missing_docs)]
    NumericComparison {
        left: Box<Expression>,
        cmp: NumericComparator,
        right: Box<Expression>,
    },
    /// Arithmetic on two integers
    #[allow(missing_docs)]
    NumericCompound {
        left: Box<Expression>,
        op: NumericOperator,
        right: Box<Expression>,
    },
    /// A logical connective applied to two booleans
    #[allow(missing_docs)]
    PropositionalCompound {
        left: Box<Expression>,
        op: LogicalOperator,
        right: Box<Expression>,
    },
    /// Arithmetic negation
    UnaryMinus(Box<Expression>),
    /// Conversion of `casted` to the type `to`
    #[allow(missing_docs)]
    Cast { casted: Box<Expression>, to: Type },
    /// A quantifier over the `bound` variables
    #[allow(missing_docs)]
    Quantified {
        quantifier: Quantifier,
        bound: Vec<Variable>,
        body: Box<Expression>,
    },
    /// A binary bitvector operation
    #[allow(missing_docs)]
    Bitvector {
        left: Box<Expression>,
        op: BitvectorOperator,
        right: Box<Expression>,
    },
    /// Bitwise complement
    BitvectorNegation(Box<Expression>),
}

impl From<Variable> for Expression {
    fn from(value: Variable) -> Self {
        Self::Variable(value)
    }
}

impl From<&Variable> for Expression {
    fn from(value: &Variable) -> Self {
        Self::Variable(value.clone())
    }
}

impl From<&Expression> for Expression {
    /// This is mostly for the smart constructors, making it possible to pass
    /// either Expression or &Expression with an automatic clone if needed
    fn from(value: &Self) -> Self {
        value.clone()
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Self::int(value)
    }
}

impl From<bool> for Expression {
    fn from(value: bool) -> Self {
        Self::literal(value)
    }
}

/// Smart constructors for Expression. These take anything convertible to an
/// Expression, so variables, constants and references can be mixed freely.
impl Expression {
    /// The constant true
    pub const TRUE: Expression = Expression::Constant(Value::Bool(true));

    /// The constant false
    pub const FALSE: Expression = Expression::Constant(Value::Bool(false));

    /// Boolean constant
    pub fn literal(value: bool) -> Self {
        Self::Constant(Value::Bool(value))
    }

    /// Integer constant
    pub fn int(value: i64) -> Self {
        Self::Constant(Value::Int(value))
    }

    /// Boolean negation
    pub fn not<T: Into<Expression>>(e: T) -> Self {
        Self::Negation(Box::new(e.into()))
    }

    /// Arithmetic negation
    pub fn neg<T: Into<Expression>>(e: T) -> Self {
        Self::UnaryMinus(Box::new(e.into()))
    }

    /// Comparison `left cmp right`
    pub fn cmp<T1, T2>(left: T1, cmp: NumericComparator, right: T2) -> Self
    where
        T1: Into<Expression>,
        T2: Into<Expression>,
    {
        Self::NumericComparison {
            left: Box::new(left.into()),
            cmp,
            right: Box::new(right.into()),
        }
    }

    /// Arithmetic `left op right`
    pub fn num<T1, T2>(left: T1, op: NumericOperator, right: T2) -> Self
    where
        T1: Into<Expression>,
        T2: Into<Expression>,
    {
        Self::NumericCompound {
            left: Box::new(left.into()),
            op,
            right: Box::new(right.into()),
        }
    }

    /// Connective `left op right`
    pub fn prop<T1, T2>(left: T1, op: LogicalOperator, right: T2) -> Self
    where
        T1: Into<Expression>,
        T2: Into<Expression>,
    {
        Self::PropositionalCompound {
            left: Box::new(left.into()),
            op,
            right: Box::new(right.into()),
        }
    }

    fn fold_left<I>(es: I, op: LogicalOperator, empty: Expression) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expression>,
    {
        es.into_iter()
            .map(Into::into)
            .reduce(|acc, e| Self::prop(acc, op, e))
            .unwrap_or(empty)
    }

    /// Conjunction of any number of expressions, nested to the left:
    /// `and([a, b, c])` is `(a & b) & c`. The empty conjunction is true.
    pub fn and<I>(es: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expression>,
    {
        Self::fold_left(es, LogicalOperator::And, Self::TRUE)
    }

    /// Disjunction of any number of expressions, nested to the left. The empty
    /// disjunction is false.
    pub fn or<I>(es: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expression>,
    {
        Self::fold_left(es, LogicalOperator::Or, Self::FALSE)
    }

    /// The result type of this expression.
    pub fn ty(&self) -> Type {
        match self {
            Expression::Variable(v) => v.ty,
            Expression::Constant(c) => c.ty(),
            Expression::Negation(_)
            | Expression::NumericComparison { .. }
            | Expression::PropositionalCompound { .. }
            | Expression::Quantified { .. } => Type::Bool,
            Expression::NumericCompound { left, .. } | Expression::Bitvector { left, .. } => {
                left.ty()
            }
            Expression::UnaryMinus(e) | Expression::BitvectorNegation(e) => e.ty(),
            Expression::Cast { to, .. } => *to,
        }
    }

    /// Names of the variables occurring free in this expression.
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_free(&mut names);
        names
    }

    fn collect_free(&self, names: &mut BTreeSet<String>) {
        match self {
            Expression::Variable(v) => {
                names.insert(v.name.clone());
            }
            Expression::Constant(_) => {}
            Expression::Negation(e)
            | Expression::UnaryMinus(e)
            | Expression::BitvectorNegation(e)
            | Expression::Cast { casted: e, .. } => e.collect_free(names),
            Expression::NumericComparison { left, right, .. }
            | Expression::NumericCompound { left, right, .. }
            | Expression::PropositionalCompound { left, right, .. }
            | Expression::Bitvector { left, right, .. } => {
                left.collect_free(names);
                right.collect_free(names);
            }
            Expression::Quantified { bound, body, .. } => {
                let mut inner = body.free_variables();
                for v in bound {
                    inner.remove(&v.name);
                }
                names.extend(inner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LogicalOperator::*;
    use NumericComparator::*;

    #[test]
    fn test_and_or_nesting() {
        let (p, q, r) = (Variable::bool("p"), Variable::bool("q"), Variable::bool("r"));
        assert_eq!(
            Expression::and([&p, &q, &r]),
            Expression::prop(Expression::prop(&p, And, &q), And, &r)
        );
        assert_eq!(Expression::or([&p]), Expression::from(&p));
        assert_eq!(Expression::and(Vec::<Expression>::new()), Expression::TRUE);
        assert_eq!(Expression::or(Vec::<Expression>::new()), Expression::FALSE);
    }

    #[test]
    fn test_types() {
        let x = Variable::new("x", Type::sint32());
        let e = Expression::num(&x, NumericOperator::Plus, Expression::int(1));
        assert_eq!(e.ty(), Type::sint32());
        assert!(Expression::cmp(e, Le, Expression::int(3)).ty().is_bool());
        assert!(Expression::neg(Expression::int(2)).ty().is_int());
        assert_eq!(Type::sint32().to_string(), "int[-2147483648..2147483647]");
        assert_eq!(Type::bounded_int(Some(0), None).to_string(), "int[0..]");
    }

    #[test]
    fn test_free_variables() {
        let (x, y) = (Variable::int("x"), Variable::int("y"));
        let e = Expression::prop(
            Expression::cmp(&x, Gt, Expression::int(0)),
            Or,
            Expression::Quantified {
                quantifier: Quantifier::Exists,
                bound: vec![x.clone()],
                body: Box::new(Expression::cmp(&x, Eq, &y)),
            },
        );
        assert_eq!(
            e.free_variables().into_iter().collect::<Vec<_>>(),
            vec!["x".to_string(), "y".to_string()]
        );
    }

    #[test]
    fn test_bounds() {
        let b = IntBounds {
            min: Some(-1),
            max: None,
        };
        assert!(b.contains(-1) && b.contains(i64::MAX));
        assert!(!b.contains(-2));
    }
}
