// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Encode expressions as SMT-LIB terms.
//!
//! Encoding has a side effect: every variable is declared on the session's
//! [`Script`] the first time it is referenced, followed by assertions for its
//! bounds. The encoder remembers the declared variables so that the solver's
//! answers can be decoded in terms of them.

use expr::syntax::*;
use smtlib::sexp::{app, atom_i, atom_s, Sexp};
use thiserror::Error;

use crate::backends::Script;

/// An expression that cannot be sent to the solver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Casts, quantifiers and bitvector operations
    #[error("cannot encode {0}")]
    UnsupportedConstruct(String),
    /// A logical connective with no encoding
    #[error("unsupported operator {0}")]
    UnsupportedOperator(String),
    /// A variable or constant whose type has no SMT sort here
    #[error("{what} has unsupported type {ty}")]
    #[allow(missing_docs)]
    UnsupportedType { what: String, ty: Type },
    /// A variable name used with two different types in one session
    #[error("variable {name} is declared as {declared} but used as {used}")]
    #[allow(missing_docs)]
    ConflictingType {
        name: String,
        declared: Type,
        used: Type,
    },
    /// A top-level formula that is not boolean
    #[error("cannot assert non-boolean {0}")]
    NonBooleanAssertion(String),
}

/// Encode an integer, with negative numbers as `(- n)` since SMT-LIB has no
/// negative numerals.
fn int_term(i: i64) -> Sexp {
    if i < 0 {
        app("-", [atom_i(i.unsigned_abs())])
    } else {
        atom_i(i.unsigned_abs())
    }
}

fn construct_name(e: &Expression) -> &'static str {
    match e {
        Expression::Cast { .. } => "cast",
        Expression::Quantified { .. } => "quantifier",
        Expression::Bitvector { .. } | Expression::BitvectorNegation(_) => "bitvector operation",
        _ => "expression",
    }
}

/// Encodes expressions for one solver session.
#[derive(Debug)]
pub struct ExpressionEncoder<S> {
    script: S,
    variables: VariableRegistry,
}

impl<S: Script> ExpressionEncoder<S> {
    /// Start encoding into `script`, with no variables declared yet.
    pub fn new(script: S) -> Self {
        Self {
            script,
            variables: VariableRegistry::new(),
        }
    }

    /// The variables declared so far.
    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    /// Access the underlying session, for sending other commands.
    pub fn script_mut(&mut self) -> &mut S {
        &mut self.script
    }

    /// Finish encoding, returning the session and the declared variables.
    pub fn into_parts(self) -> (S, VariableRegistry) {
        (self.script, self.variables)
    }

    fn declare(&mut self, v: &Variable) -> Result<(), EncodeError> {
        if let Some(declared) = self.variables.get(&v.name) {
            if declared.ty == v.ty {
                return Ok(());
            }
            return Err(EncodeError::ConflictingType {
                name: v.name.clone(),
                declared: declared.ty,
                used: v.ty,
            });
        }
        let sort = match v.ty {
            Type::Bool => "Bool",
            Type::Int(_) => "Int",
            ty => {
                return Err(EncodeError::UnsupportedType {
                    what: format!("variable {}", v.name),
                    ty,
                })
            }
        };
        log::debug!("declaring {}: {}", v.name, v.ty);
        self.script.declare_fun(&v.name, sort);
        if let Type::Int(IntBounds { min, max }) = v.ty {
            if let Some(min) = min {
                self.script
                    .assert(app(">=", [atom_s(&v.name), int_term(min)]));
            }
            if let Some(max) = max {
                self.script
                    .assert(app("<=", [atom_s(&v.name), int_term(max)]));
            }
        }
        self.variables.insert(v.name.clone(), v.clone());
        Ok(())
    }

    fn binary(
        &mut self,
        op: &str,
        left: &Expression,
        right: &Expression,
    ) -> Result<Sexp, EncodeError> {
        let left = self.encode(left)?;
        let right = self.encode(right)?;
        Ok(app(op, [left, right]))
    }

    /// Encode an expression as an SMT-LIB term, declaring any variables not
    /// seen before.
    ///
    /// On error, the variables reached before the unsupported node stay
    /// declared.
    pub fn encode(&mut self, e: &Expression) -> Result<Sexp, EncodeError> {
        match e {
            Expression::Variable(v) => {
                self.declare(v)?;
                Ok(atom_s(&v.name))
            }
            Expression::Constant(c) => match c {
                Value::Bool(b) => Ok(atom_s(if *b { "true" } else { "false" })),
                Value::Int(i) => Ok(int_term(*i)),
                Value::BitVector { .. } => Err(EncodeError::UnsupportedType {
                    what: format!("constant {c}"),
                    ty: c.ty(),
                }),
            },
            Expression::Negation(e) => Ok(app("not", [self.encode(e)?])),
            Expression::NumericComparison { left, cmp, right } => {
                let op = match cmp {
                    NumericComparator::Ne => {
                        let eq =
                            Expression::cmp(left.as_ref(), NumericComparator::Eq, right.as_ref());
                        return self.encode(&Expression::not(eq));
                    }
                    NumericComparator::Eq => "=",
                    NumericComparator::Ge => ">=",
                    NumericComparator::Gt => ">",
                    NumericComparator::Le => "<=",
                    NumericComparator::Lt => "<",
                };
                self.binary(op, left, right)
            }
            Expression::NumericCompound { left, op, right } => {
                let op = match op {
                    NumericOperator::Plus => "+",
                    NumericOperator::Minus => "-",
                    NumericOperator::Mul => "*",
                    NumericOperator::Div => "div",
                    NumericOperator::Rem => "mod",
                };
                self.binary(op, left, right)
            }
            Expression::PropositionalCompound { left, op, right } => {
                let op = match op {
                    LogicalOperator::And => "and",
                    LogicalOperator::Or => "or",
                    LogicalOperator::Equiv => "=",
                    LogicalOperator::Implies => {
                        return Err(EncodeError::UnsupportedOperator("->".to_string()))
                    }
                    LogicalOperator::Xor => {
                        return Err(EncodeError::UnsupportedOperator("^".to_string()))
                    }
                };
                self.binary(op, left, right)
            }
            Expression::UnaryMinus(e) => Ok(app("-", [self.encode(e)?])),
            Expression::Cast { .. }
            | Expression::Quantified { .. }
            | Expression::Bitvector { .. }
            | Expression::BitvectorNegation(_) => Err(EncodeError::UnsupportedConstruct(format!(
                "{} `{e}`",
                construct_name(e)
            ))),
        }
    }

    /// Encode a formula to be asserted, which must be boolean.
    pub fn encode_assertion(&mut self, e: &Expression) -> Result<Sexp, EncodeError> {
        if !e.ty().is_bool() {
            return Err(EncodeError::NonBooleanAssertion(e.to_string()));
        }
        self.encode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::scripted::ScriptedSolver;
    use expr::parser::parse_expression;

    fn vars() -> VariableRegistry {
        registry([
            Variable::int("x"),
            Variable::new("y", Type::bounded_int(Some(-5), Some(10))),
            Variable::new("n", Type::bounded_int(Some(0), None)),
            Variable::bool("p"),
        ])
    }

    fn encoder() -> ExpressionEncoder<ScriptedSolver> {
        ExpressionEncoder::new(ScriptedSolver::default())
    }

    fn encode(s: &str) -> String {
        let e = parse_expression(s, &vars()).unwrap();
        encoder().encode(&e).unwrap().to_string()
    }

    #[test]
    fn test_encode_terms() {
        insta::assert_snapshot!(encode("x + 1 <= 3"), @"(<= (+ x 1) 3)");
        insta::assert_snapshot!(encode("x != 2"), @"(not (= x 2))");
        insta::assert_snapshot!(
            encode("x / 2 * 3 > x % 4 - 1"),
            @"(> (* (div x 2) 3) (- (mod x 4) 1))"
        );
        insta::assert_snapshot!(encode("-x < 0 | !p"), @"(or (< (- x) 0) (not p))");
        insta::assert_snapshot!(encode("p <-> true & false"), @"(= p (and true false))");
        let c = Expression::cmp(
            Expression::int(-3),
            NumericComparator::Ge,
            Expression::int(i64::MIN),
        );
        insta::assert_snapshot!(
            encoder().encode(&c).unwrap(),
            @"(>= (- 3) (- 9223372036854775808))"
        );
    }

    #[test]
    fn test_declarations_once() {
        let mut enc = encoder();
        let e = parse_expression("y + y * x >= y & n = x & y < n", &vars()).unwrap();
        enc.encode(&e).unwrap();
        enc.encode(&e).unwrap();
        let (script, variables) = enc.into_parts();
        assert_eq!(variables.len(), 3);
        insta::assert_snapshot!(script.transcript().join("\n"), @r###"
        (declare-fun y () Int)
        (assert (>= y (- 5)))
        (assert (<= y 10))
        (declare-fun x () Int)
        (declare-fun n () Int)
        (assert (>= n 0))
        "###);
    }

    #[test]
    fn test_conflicting_type() {
        let mut enc = encoder();
        enc.encode(&Expression::from(Variable::int("x"))).unwrap();
        let e = Expression::not(Variable::bool("x"));
        assert!(matches!(
            enc.encode(&e),
            Err(EncodeError::ConflictingType { .. })
        ));
        assert_eq!(enc.variables()["x"].ty, Type::int());
    }

    #[test]
    fn test_unsupported() {
        let x = Variable::int("x");
        let y = Variable::int("y");
        let quantified = Expression::Quantified {
            quantifier: Quantifier::Exists,
            bound: vec![y.clone()],
            body: Box::new(Expression::cmp(&y, NumericComparator::Gt, &x)),
        };
        // the left sibling is declared, nothing inside the quantifier is
        let e = Expression::and([
            Expression::cmp(&x, NumericComparator::Gt, Expression::int(0)),
            quantified,
        ]);
        let mut enc = encoder();
        assert!(matches!(
            enc.encode(&e),
            Err(EncodeError::UnsupportedConstruct(_))
        ));
        let (script, variables) = enc.into_parts();
        assert_eq!(variables.keys().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(script.transcript(), vec!["(declare-fun x () Int)"]);

        let byte = |name: &str| Variable::new(name, Type::BitVector { width: 8 });
        let bv = Expression::Bitvector {
            left: Box::new(Expression::from(byte("b"))),
            op: BitvectorOperator::And,
            right: Box::new(Expression::from(byte("c"))),
        };
        let mut enc = encoder();
        assert!(matches!(
            enc.encode(&bv),
            Err(EncodeError::UnsupportedConstruct(_))
        ));
        assert!(enc.variables().is_empty());

        // operands of an unsupported connective are never visited
        let p = Variable::bool("p");
        let implies = Expression::prop(&p, LogicalOperator::Implies, &p);
        assert_eq!(
            enc.encode(&implies),
            Err(EncodeError::UnsupportedOperator("->".to_string()))
        );
        assert!(enc.variables().is_empty());

        let bv_var = Expression::from(byte("b"));
        assert!(matches!(
            enc.encode(&bv_var),
            Err(EncodeError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_non_boolean_assertion() {
        let mut enc = encoder();
        let e = Expression::num(
            Variable::int("x"),
            NumericOperator::Plus,
            Expression::int(1),
        );
        assert_eq!(
            enc.encode_assertion(&e),
            Err(EncodeError::NonBooleanAssertion("x + 1".to_string()))
        );
        assert!(enc.variables().is_empty());
    }
}
