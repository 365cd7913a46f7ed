// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Parser for infix integer and boolean expressions.
//!
//! Identifiers are resolved against a registry of declared variables, so the
//! result is fully typed. This is the inverse of [`crate::printer`] for the
//! integer and boolean fragment.

use crate::syntax::*;
use peg::{error::ParseError, str::LineCol};

peg::parser! {

grammar parser(vars: &VariableRegistry) for str {
    use LogicalOperator::*;
    use NumericComparator as Cmp;
    use NumericOperator::*;

    rule ident_start() = ['a'..='z' | 'A'..='Z' | '_']
    rule ident_char() = ident_start() / ['0'..='9' | '.' | '\'']
    rule ident() -> &'input str
    = s:$(quiet!{ident_start() ident_char()*} / expected!("identifier")) { s }

    rule whitespace() = quiet!{ [' ' | '\t' | '\n' | '\r'] }
    rule _ = whitespace()*

    rule numeral() -> i64
    = n:$(['0'..='9']+) {? n.parse().or(Err("integer that fits in 64 bits")) }

    // a constant or a declared variable
    rule leaf() -> Expression
    = s:ident() {? match s {
        "true" => Ok(Expression::TRUE),
        "false" => Ok(Expression::FALSE),
        _ => vars.get(s).map(Expression::from).ok_or("declared variable"),
    } }

    pub(super) rule expression() -> Expression = precedence!{
        x:@ _ "->" _ y:(@) { Expression::prop(x, Implies, y) }
        x:(@) _ "<->" _ y:@ { Expression::prop(x, Equiv, y) }
        x:(@) _ "^" _ y:@ { Expression::prop(x, Xor, y) }
        --
        x:(@) _ "|" _ y:@ { Expression::prop(x, Or, y) }
        --
        x:(@) _ "&" _ y:@ { Expression::prop(x, And, y) }
        --
        x:(@) _ "=" _ y:@ { Expression::cmp(x, Cmp::Eq, y) }
        x:(@) _ "!=" _ y:@ { Expression::cmp(x, Cmp::Ne, y) }
        x:(@) _ "<=" _ y:@ { Expression::cmp(x, Cmp::Le, y) }
        x:(@) _ "<" !"->" _ y:@ { Expression::cmp(x, Cmp::Lt, y) }
        x:(@) _ ">=" _ y:@ { Expression::cmp(x, Cmp::Ge, y) }
        x:(@) _ ">" _ y:@ { Expression::cmp(x, Cmp::Gt, y) }
        --
        "!" _ x:@ { Expression::not(x) }
        --
        x:(@) _ "+" _ y:@ { Expression::num(x, Plus, y) }
        x:(@) _ "-" !">" _ y:@ { Expression::num(x, Minus, y) }
        --
        x:(@) _ "*" _ y:@ { Expression::num(x, Mul, y) }
        x:(@) _ "/" _ y:@ { Expression::num(x, Div, y) }
        x:(@) _ "%" _ y:@ { Expression::num(x, Rem, y) }
        --
        "-" _ x:@ { Expression::neg(x) }
        --
        n:numeral() { Expression::int(n) }
        e:leaf() { e }
        "(" _ e:expression() _ ")" { e }
    }

    pub(super) rule expression_whitespace() -> Expression
    = _ e:expression() _ { e }
}
}

/// Parse an expression whose variables are declared in `vars`.
///
/// Surrounding whitespace is allowed. Undeclared identifiers are a parse
/// error.
pub fn parse_expression(
    s: &str,
    vars: &VariableRegistry,
) -> Result<Expression, ParseError<LineCol>> {
    parser::expression_whitespace(s, vars)
}
