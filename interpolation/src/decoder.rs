// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Decode the solver's printed terms back into expressions.
//!
//! Interpolants come back as text in SMT-LIB prefix notation, often with
//! `let` blocks that name common subterms:
//!
//! ```text
//! (let ((.cse0 (- x))) (<= (+ y .cse0) (- 1)))
//! ```
//!
//! Decoding runs in two passes. First every `let` block is decoded on its own
//! (bindings in the enclosing scope, body in the extended scope) and replaced
//! in the text by a placeholder token standing for the decoded body. Then the
//! remaining let-free term is parsed, resolving leaves to constants, bound
//! names, placeholders and finally the variables declared by the encoder.

use std::collections::HashMap;

use expr::syntax::*;
use itertools::Itertools;
use thiserror::Error;

/// An error from decoding a solver term.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The text is not a well-formed term
    #[error("malformed term: {0}")]
    Malformed(String),
    /// An operator this decoder does not understand
    #[error("unknown operator {0}")]
    UnknownOperator(String),
    /// An operator applied to the wrong number of operands
    #[error("{op} expects {expected} operands but got {found}")]
    #[allow(missing_docs)]
    Arity {
        op: String,
        expected: &'static str,
        found: usize,
    },
    /// A name that is neither bound by a `let` nor a declared variable
    #[error("unknown variable {0}")]
    UnknownVariable(String),
}

type Result<T> = std::result::Result<T, DecodeError>;

/// Names bound by enclosing `let` blocks.
type Scope = im::HashMap<String, Expression>;

/// A position in the text of a term.
struct Cursor<'t> {
    text: &'t str,
    pos: usize,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

impl<'t> Cursor<'t> {
    fn new(text: &'t str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.malformed(&format!("expected `{c}`")))
        }
    }

    /// Read a token, which runs up to the next whitespace or parenthesis. A
    /// `|quoted|` symbol runs to its closing `|` and keeps the pipes.
    fn token(&mut self) -> Result<&'t str> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = if let Some(quoted) = rest.strip_prefix('|') {
            match quoted.find('|') {
                Some(close) => close + 2,
                None => return Err(self.malformed("unterminated `|`")),
            }
        } else {
            rest.find(is_delimiter).unwrap_or(rest.len())
        };
        if len == 0 {
            return Err(self.malformed("expected a symbol"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    /// Skip over one term, which is either a token or a parenthesized span.
    /// Returns the term's text.
    fn skip_term(&mut self) -> Result<&'t str> {
        self.skip_whitespace();
        let start = self.pos;
        if self.peek() == Some('(') {
            self.pos = matching_paren(self.text, start)? + 1;
        } else {
            self.token()?;
        }
        Ok(&self.text[start..self.pos])
    }

    fn malformed(&self, msg: &str) -> DecodeError {
        if self.pos >= self.text.len() {
            DecodeError::Malformed(format!("{msg} at end of `{}`", self.text))
        } else {
            DecodeError::Malformed(format!("{msg} at `{}`", self.rest()))
        }
    }
}

/// Find the `)` closing the `(` at `start`. Parentheses inside `|quoted|`
/// symbols do not count.
fn matching_paren(text: &str, start: usize) -> Result<usize> {
    let mut depth = 0;
    let mut quoted = false;
    for (i, c) in text[start..].char_indices() {
        match c {
            '|' => quoted = !quoted,
            _ if quoted => {}
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(start + i);
                }
            }
            _ => {}
        }
    }
    Err(DecodeError::Malformed(format!(
        "unbalanced parentheses in `{}`",
        &text[start..]
    )))
}

/// Find the first `(let` that opens a let block.
fn find_let(text: &str) -> Option<usize> {
    text.match_indices("(let").map(|(i, _)| i).find(|&i| {
        text[i + "(let".len()..]
            .chars()
            .next()
            .map_or(false, |c| c.is_whitespace() || c == '(')
    })
}

/// The symbol a token names, without `|quotes|`.
fn unquote(token: &str) -> &str {
    token
        .strip_prefix('|')
        .and_then(|t| t.strip_suffix('|'))
        .unwrap_or(token)
}

fn exactly<const N: usize>(op: &str, args: Vec<Expression>) -> Result<[Expression; N]> {
    args.try_into().map_err(|args: Vec<Expression>| DecodeError::Arity {
        op: op.to_string(),
        expected: match N {
            1 => "1",
            2 => "2",
            _ => "a fixed number of",
        },
        found: args.len(),
    })
}

fn at_least(op: &str, args: &[Expression], min: usize) -> Result<()> {
    if args.len() >= min {
        return Ok(());
    }
    Err(DecodeError::Arity {
        op: op.to_string(),
        expected: if min == 1 { "at least 1" } else { "at least 2" },
        found: args.len(),
    })
}

fn equal(l: Expression, r: Expression) -> Expression {
    if l.ty().is_bool() && r.ty().is_bool() {
        Expression::prop(l, LogicalOperator::Equiv, r)
    } else {
        Expression::cmp(l, NumericComparator::Eq, r)
    }
}

fn differ(l: Expression, r: Expression) -> Expression {
    if l.ty().is_bool() && r.ty().is_bool() {
        Expression::not(Expression::prop(l, LogicalOperator::Equiv, r))
    } else {
        Expression::cmp(l, NumericComparator::Ne, r)
    }
}

/// Nest operands to the left, as in `(+ a b c)` = `(a + b) + c`.
fn fold_left<F>(args: Vec<Expression>, f: F) -> Expression
where
    F: Fn(Expression, Expression) -> Expression,
{
    let mut args = args.into_iter();
    match args.next() {
        Some(first) => args.fold(first, f),
        None => Expression::TRUE,
    }
}

/// Parses terms printed by the solver into expressions over the variables the
/// encoder declared.
pub struct TermParser<'a> {
    variables: &'a VariableRegistry,
    // decoded let blocks, by placeholder token
    blocks: HashMap<String, Expression>,
}

impl<'a> TermParser<'a> {
    /// Create a parser resolving free names against `variables`.
    pub fn new(variables: &'a VariableRegistry) -> Self {
        Self {
            variables,
            blocks: HashMap::new(),
        }
    }

    /// Parse one term.
    pub fn parse(&mut self, term: &str) -> Result<Expression> {
        self.decode(term, &Scope::new())
    }

    fn decode(&mut self, text: &str, scope: &Scope) -> Result<Expression> {
        let text = self.resolve_lets(text, scope)?;
        let mut cursor = Cursor::new(&text);
        let e = self.term(&mut cursor, scope)?;
        cursor.skip_whitespace();
        if !cursor.rest().is_empty() {
            return Err(cursor.malformed("unexpected text after term"));
        }
        Ok(e)
    }

    /// Replace every let block in `text` with a placeholder for its decoded
    /// body.
    fn resolve_lets(&mut self, text: &str, scope: &Scope) -> Result<String> {
        let mut text = text.to_string();
        while let Some(start) = find_let(&text) {
            let end = matching_paren(&text, start)?;
            let body = self.decode_let_block(&text[start..=end], scope)?;
            // `#` cannot start an SMT-LIB symbol, so placeholders never clash
            let placeholder = format!("#let{}", self.blocks.len());
            text = format!("{}{placeholder}{}", &text[..start], &text[end + 1..]);
            self.blocks.insert(placeholder, body);
        }
        Ok(text)
    }

    /// Decode `(let ((name term)...) body)`. Bindings are parallel: each bound
    /// term is decoded in `scope`, and only the body sees the new names.
    fn decode_let_block(&mut self, block: &str, scope: &Scope) -> Result<Expression> {
        let mut cursor = Cursor::new(block);
        cursor.expect('(')?;
        cursor.token()?;
        cursor.expect('(')?;
        let mut inner = scope.clone();
        while !cursor.eat(')') {
            cursor.expect('(')?;
            let name = unquote(cursor.token()?);
            let bound = cursor.skip_term()?;
            let value = self.decode(bound, scope)?;
            cursor.expect(')')?;
            log::trace!("let {name} = {value}");
            inner.insert(name.to_string(), value);
        }
        // the block ends with its own closing paren
        let body = cursor
            .rest()
            .strip_suffix(')')
            .ok_or_else(|| cursor.malformed("expected a let body"))?;
        self.decode(body, &inner)
    }

    fn term(&self, cursor: &mut Cursor<'_>, scope: &Scope) -> Result<Expression> {
        cursor.skip_whitespace();
        match cursor.peek() {
            None => Err(cursor.malformed("expected a term")),
            Some(')') => Err(cursor.malformed("unexpected `)`")),
            Some('(') => {
                cursor.expect('(')?;
                let op = cursor.token()?;
                if op == "-" {
                    if let Some(n) = Self::min_numeral(cursor) {
                        return Ok(Expression::int(n));
                    }
                }
                let mut args = vec![];
                while !cursor.eat(')') {
                    if cursor.peek().is_none() {
                        return Err(cursor.malformed("unclosed `(`"));
                    }
                    args.push(self.term(cursor, scope)?);
                }
                self.apply(op, args)
            }
            Some(_) => {
                let token = cursor.token()?;
                self.simple(token, scope)
            }
        }
    }

    /// `(- 9223372036854775808)` is `i64::MIN`, whose magnitude is not an
    /// `i64` numeral. Consumes the rest of the term only in that case.
    fn min_numeral(cursor: &mut Cursor<'_>) -> Option<i64> {
        let start = cursor.pos;
        let n = cursor
            .token()
            .ok()
            .filter(|t| t.bytes().all(|b| b.is_ascii_digit()) && t.parse::<i64>().is_err())
            .and_then(|t| t.parse::<u64>().ok())
            .and_then(|n| i64::try_from(-i128::from(n)).ok());
        match n {
            Some(n) if cursor.eat(')') => Some(n),
            _ => {
                cursor.pos = start;
                None
            }
        }
    }

    fn simple(&self, token: &str, scope: &Scope) -> Result<Expression> {
        match token {
            "true" => return Ok(Expression::TRUE),
            "false" => return Ok(Expression::FALSE),
            _ => {}
        }
        if token.bytes().all(|b| b.is_ascii_digit()) {
            return token
                .parse()
                .map(Expression::int)
                .map_err(|_| DecodeError::Malformed(format!("numeral {token} is out of range")));
        }
        let name = unquote(token);
        if let Some(e) = scope.get(name).or_else(|| self.blocks.get(name)) {
            return Ok(e.clone());
        }
        self.variables
            .get(name)
            .map(Expression::from)
            .ok_or_else(|| DecodeError::UnknownVariable(name.to_string()))
    }

    fn apply(&self, op: &str, args: Vec<Expression>) -> Result<Expression> {
        use LogicalOperator::*;
        use NumericComparator::*;
        use NumericOperator::*;

        let e = match op {
            "=" if args.len() == 2 => {
                let [l, r] = exactly::<2>(op, args)?;
                equal(l, r)
            }
            // chained equality holds when neighbors are equal
            "=" => {
                at_least(op, &args, 2)?;
                Expression::and(
                    args.iter()
                        .tuple_windows()
                        .map(|(l, r)| equal(l.clone(), r.clone())),
                )
            }
            "distinct" => {
                at_least(op, &args, 2)?;
                Expression::and(
                    args.iter()
                        .tuple_combinations()
                        .map(|(l, r)| differ(l.clone(), r.clone())),
                )
            }
            ">=" | "<=" | ">" | "<" => {
                let cmp = match op {
                    ">=" => Ge,
                    "<=" => Le,
                    ">" => Gt,
                    _ => Lt,
                };
                let [l, r] = exactly::<2>(op, args)?;
                Expression::cmp(l, cmp, r)
            }
            "-" if args.len() == 1 => {
                let [e] = exactly::<1>(op, args)?;
                Expression::neg(e)
            }
            "-" | "+" | "*" => {
                at_least(op, &args, 2)?;
                let num = match op {
                    "-" => Minus,
                    "+" => Plus,
                    _ => Mul,
                };
                fold_left(args, |l, r| Expression::num(l, num, r))
            }
            "div" | "mod" => {
                let num = if op == "div" { Div } else { Rem };
                let [l, r] = exactly::<2>(op, args)?;
                Expression::num(l, num, r)
            }
            "and" | "or" => {
                at_least(op, &args, 1)?;
                if op == "and" {
                    Expression::and(args)
                } else {
                    Expression::or(args)
                }
            }
            "not" => {
                let [e] = exactly::<1>(op, args)?;
                Expression::not(e)
            }
            _ => return Err(DecodeError::UnknownOperator(op.to_string())),
        };
        Ok(e)
    }
}

/// Decode one solver term over the given variables.
pub fn decode(term: &str, variables: &VariableRegistry) -> Result<Expression> {
    TermParser::new(variables).parse(term)
}
