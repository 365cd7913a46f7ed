// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Print expressions in the infix syntax [`crate::parser`] reads, with only
//! the parentheses precedence requires. Quantifiers and casts are printed
//! too, but do not parse back.

use std::fmt;

use crate::syntax::*;

fn precedence(e: &Expression) -> usize {
    use crate::syntax::{Expression::*, LogicalOperator::*, NumericOperator::*};

    match e {
        Quantified { .. } => 0,
        PropositionalCompound {
            op: Equiv | Implies | Xor,
            ..
        } => 10,
        PropositionalCompound { op: Or, .. } => 40,
        PropositionalCompound { op: And, .. } => 50,
        NumericComparison { .. } => 60,
        Negation(_) => 70,
        NumericCompound {
            op: Plus | Minus, ..
        } => 80,
        Bitvector { .. } => 85,
        NumericCompound {
            op: Mul | Div | Rem,
            ..
        } => 90,
        UnaryMinus(_) | BitvectorNegation(_) | Cast { .. } => 100,
        Constant(Value::Int(i)) if *i < 0 => 100,
        Variable(_) | Constant(_) => 1000,
    }
}

fn parens(add_parens: bool, s: String) -> String {
    if add_parens {
        format!("({s})")
    } else {
        s
    }
}

fn binary_operator(e: &Expression) -> Option<&'static str> {
    let op = match e {
        Expression::NumericComparison { cmp, .. } => match cmp {
            NumericComparator::Eq => "=",
            NumericComparator::Ne => "!=",
            NumericComparator::Ge => ">=",
            NumericComparator::Gt => ">",
            NumericComparator::Le => "<=",
            NumericComparator::Lt => "<",
        },
        Expression::NumericCompound { op, .. } => match op {
            NumericOperator::Plus => "+",
            NumericOperator::Minus => "-",
            NumericOperator::Mul => "*",
            NumericOperator::Div => "/",
            NumericOperator::Rem => "%",
        },
        Expression::PropositionalCompound { op, .. } => match op {
            LogicalOperator::And => "&",
            LogicalOperator::Or => "|",
            LogicalOperator::Equiv => "<->",
            LogicalOperator::Implies => "->",
            LogicalOperator::Xor => "^",
        },
        Expression::Bitvector { op, .. } => match op {
            BitvectorOperator::And => "&bv",
            BitvectorOperator::Or => "|bv",
            BitvectorOperator::Xor => "^bv",
            BitvectorOperator::Shl => "<<",
            BitvectorOperator::Shr => ">>",
        },
        _ => return None,
    };
    Some(op)
}

fn right_associative(op: &str) -> bool {
    op == "->"
}

fn left_associative(op: &str) -> bool {
    !right_associative(op) && !matches!(op, "=" | "!=" | ">=" | ">" | "<=" | "<")
}

/// Whether `child` needs parentheses as an operand of the binary `parent`.
/// Operators that share a precedence level only chain without parentheses
/// when they are the same operator, in the direction it associates.
fn operand_parens(parent: &Expression, child: &Expression, left_side: bool) -> bool {
    let (p, c) = (precedence(parent), precedence(child));
    if p != c {
        return p > c;
    }
    match (binary_operator(parent), binary_operator(child)) {
        (Some(op), Some(child_op)) if op == child_op => {
            if left_side {
                !left_associative(op)
            } else {
                !right_associative(op)
            }
        }
        _ => true,
    }
}

fn binder(v: &Variable) -> String {
    format!("{}:{}", v.name, v.ty)
}

/// Print an expression in infix syntax with as few parentheses as needed to
/// parse back the same tree.
pub fn expression(e: &Expression) -> String {
    match e {
        Expression::Variable(v) => v.name.clone(),
        Expression::Constant(c) => c.to_string(),
        Expression::Negation(arg) => {
            let arg = parens(precedence(e) > precedence(arg), expression(arg));
            format!("!{arg}")
        }
        Expression::UnaryMinus(arg) => {
            let arg = parens(precedence(e) >= precedence(arg), expression(arg));
            format!("-{arg}")
        }
        Expression::BitvectorNegation(arg) => {
            let arg = parens(precedence(e) >= precedence(arg), expression(arg));
            format!("~{arg}")
        }
        Expression::Cast { casted, to } => {
            let casted = parens(precedence(e) > precedence(casted), expression(casted));
            format!("({to}) {casted}")
        }
        Expression::NumericComparison { left, right, .. }
        | Expression::NumericCompound { left, right, .. }
        | Expression::PropositionalCompound { left, right, .. }
        | Expression::Bitvector { left, right, .. } => {
            let op = binary_operator(e).unwrap_or_default();
            let l = parens(operand_parens(e, left, true), expression(left));
            let r = parens(operand_parens(e, right, false), expression(right));
            format!("{l} {op} {r}")
        }
        Expression::Quantified {
            quantifier,
            bound,
            body,
        } => {
            let quantifier = match quantifier {
                Quantifier::Forall => "forall",
                Quantifier::Exists => "exists",
            };
            let bound = bound.iter().map(binder).collect::<Vec<_>>().join(", ");
            format!("{quantifier} {bound}. {}", expression(body))
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", expression(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn vars() -> VariableRegistry {
        registry([
            Variable::int("x"),
            Variable::int("y"),
            Variable::bool("p"),
            Variable::bool("q"),
            Variable::bool("r"),
        ])
    }

    fn reprint(s: &str) -> String {
        let e = parse_expression(s, &vars()).unwrap();
        expression(&e)
    }

    #[test]
    fn test_reprint_minimal_parens() {
        assert_eq!(reprint("x + y + 1 <= 3"), "x + y + 1 <= 3");
        assert_eq!(reprint("x - (y - 1) = 0"), "x - (y - 1) = 0");
        assert_eq!(reprint("(x + y) * 2 > 0"), "(x + y) * 2 > 0");
        assert_eq!(reprint("(p & q) | r"), "p & q | r");
        assert_eq!(reprint("p & (q | r)"), "p & (q | r)");
        assert_eq!(reprint("!(p & q)"), "!(p & q)");
        assert_eq!(reprint("p -> q -> r"), "p -> q -> r");
        assert_eq!(reprint("(p -> q) -> r"), "(p -> q) -> r");
        assert_eq!(reprint("(p -> q) <-> r"), "(p -> q) <-> r");
        assert_eq!(reprint("-(x + 1) < y"), "-(x + 1) < y");
    }

    #[test]
    fn test_print_constructed() {
        let (x, y) = (Variable::int("x"), Variable::int("y"));
        let e = Expression::and([
            Expression::cmp(&x, NumericComparator::Ge, Expression::int(-2)),
            Expression::cmp(
                Expression::num(&y, NumericOperator::Rem, Expression::int(2)),
                NumericComparator::Ne,
                Expression::neg(&x),
            ),
        ]);
        insta::assert_snapshot!(e, @"x >= -2 & y % 2 != -x");
        let q = Expression::Quantified {
            quantifier: Quantifier::Forall,
            bound: vec![x.clone()],
            body: Box::new(Expression::cmp(&x, NumericComparator::Eq, &x)),
        };
        insta::assert_snapshot!(q, @"forall x:int. x = x");
    }
}
