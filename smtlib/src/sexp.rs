// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! S-expressions, the syntax of everything exchanged with the solver.
//!
//! Commands sent to the solver are built as [`Sexp`]s, and its replies are
//! parsed back into them. Comments are part of the grammar so that transcripts
//! can be annotated.

use peg::str::LineCol;
use serde::Serialize;
use std::fmt;

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, PartialOrd, Ord)]
pub enum Atom {
    I(u64),
    S(String),
}

/// An s-expression. Comments only appear in transcripts.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, PartialOrd, Ord)]
pub enum Sexp {
    Atom(Atom),
    Comment(String),
    List(Vec<Sexp>),
}

/// A string atom.
pub fn atom_s<S: AsRef<str>>(s: S) -> Sexp {
    Sexp::Atom(Atom::S(s.as_ref().to_owned()))
}

/// A numeral atom.
pub fn atom_i(i: u64) -> Sexp {
    Sexp::Atom(Atom::I(i))
}

/// A list of the given elements.
pub fn sexp_l(elements: impl IntoIterator<Item = Sexp>) -> Sexp {
    Sexp::List(elements.into_iter().collect())
}

/// The application `(head args..)`, which is how every solver command and
/// most terms are shaped.
pub fn app(head: &str, args: impl IntoIterator<Item = Sexp>) -> Sexp {
    sexp_l(std::iter::once(atom_s(head)).chain(args))
}

/// Attach the `:named` annotation to a term, as in `(! term :named name)`.
pub fn named(term: Sexp, name: &str) -> Sexp {
    app("!", [term, atom_s(":named"), atom_s(name)])
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::I(i) => write!(f, "{i}"),
            // symbols that would not survive reparsing get quoted
            Atom::S(s) if s.contains([' ', '"', '\'', '(', ')']) => write!(f, "|{s}|"),
            Atom::S(s) if s.contains('|') => write!(f, "\"{s}\""),
            Atom::S(s) => f.write_str(s),
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(a) => write!(f, "{a}"),
            Sexp::Comment(c) => write!(f, ";{c}"),
            Sexp::List(elements) => {
                f.write_str("(")?;
                let mut sep = "";
                for e in elements {
                    if let Sexp::Comment(c) = e {
                        // a comment runs to the end of its line
                        write!(f, "\n;{c}\n")?;
                        sep = "";
                    } else {
                        write!(f, "{sep}{e}")?;
                        sep = " ";
                    }
                }
                f.write_str(")")
            }
        }
    }
}

impl Sexp {
    /// The elements of a list, or `None` for atoms and comments.
    pub fn list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// The symbol of a string atom.
    pub fn atom_s(&self) -> Option<&str> {
        match self {
            Sexp::Atom(Atom::S(s)) => Some(s),
            _ => None,
        }
    }

    /// Split an application `(head args..)` into its head symbol and arguments.
    pub fn app(&self) -> Option<(&str, &[Sexp])> {
        let (head, args) = self.list()?.split_first()?;
        Some((head.atom_s()?, args))
    }
}

peg::parser! {
grammar parser() for str {
  // SMT-LIB simple symbols, including the `.cse0`-style names solvers use
  // for let-bound subterms
  rule symbol_start() = ['a'..='z' | 'A'..='Z' | '_' | '\'' | '<' | '>' | ':' | '=' | '$'
                         | '@' | '+' | '-' | '*' | '/' | '.' | '~' | '!' | '?' | '%' | '^' | '&']
  rule symbol() = quiet! { symbol_start() (symbol_start() / ['0'..='9' | '#'])* }
                / expected!("symbol")

  rule _ = [' ' | '\t' | '\n' | '\r']*

  rule atom() -> Atom
  = "\"" s:$([^'"']*) "\"" { Atom::S(s.to_owned()) }
  / "|" s:$([^'|']*) "|" { Atom::S(s.to_owned()) }
  / s:$(symbol()) { Atom::S(s.to_owned()) }
  / n:$(['0'..='9']+) {? n.parse().map(Atom::I).or(Err("numeral")) }

  rule sexp() -> Sexp
  = a:atom() { Sexp::Atom(a) }
  / ";" c:$([^'\n']*) "\n" { Sexp::Comment(c.to_owned()) }
  / "(" _ elements:(sexp() ** _) _ ")" { Sexp::List(elements) }

  pub(super) rule padded() -> Sexp
  = _ s:sexp() _ { s }

  pub(super) rule padded_many() -> Vec<Sexp>
  = _ ss:(sexp() ** _) _ { ss }
}
}

/// Parse a single s-expression, ignoring surrounding whitespace.
pub fn parse(s: &str) -> Result<Sexp, peg::error::ParseError<LineCol>> {
    parser::padded(s)
}

/// Parse whitespace-separated s-expressions, as in a multi-line reply.
pub fn parse_many(s: &str) -> Result<Vec<Sexp>, peg::error::ParseError<LineCol>> {
    parser::padded_many(s)
}

#[cfg(test)]
mod tests {
    use super::{app, atom_i, atom_s, named, parse, parse_many, sexp_l, Sexp};

    #[test]
    fn test_parsing() {
        assert_eq!(
            parse("(<=  x (+ y 1))"),
            Ok(app(
                "<=",
                [atom_s("x"), app("+", [atom_s("y"), atom_i(1)])]
            ))
        );
        assert_eq!(parse("()"), Ok(sexp_l([])));
        assert!(parse("(= x").is_err());
    }

    #[test]
    fn test_named_assertion() {
        let e = app("assert", [named(app(">", [atom_s("x"), atom_s("y")]), "phi_1")]);
        insta::assert_snapshot!(&e, @"(assert (! (> x y) :named phi_1))");
        assert_eq!(parse(&e.to_string()), Ok(e));
    }

    #[test]
    fn test_interpolant_response() {
        // multi-line replies are normalized to single-space printing
        let resp = parse(
            "((<= y (- 1))
              (let ((.cse0 (- x)))
                (<= (+ y .cse0) (- 1))))",
        )
        .unwrap();
        let printed: Vec<String> = resp.list().unwrap().iter().map(|s| s.to_string()).collect();
        insta::assert_snapshot!(printed.join("\n"), @r###"
        (<= y (- 1))
        (let ((.cse0 (- x))) (<= (+ y .cse0) (- 1)))
        "###);
    }

    #[test]
    fn test_error_reply() {
        // a failed check-sat prints the error and then an answer
        let sexps = parse_many("(error \"line 3: undeclared x\")\nunsat").unwrap();
        assert_eq!(sexps.len(), 2);
        assert_eq!(
            sexps[0].app(),
            Some(("error", &[atom_s("line 3: undeclared x")][..]))
        );
        assert_eq!(sexps[1], atom_s("unsat"));
    }

    #[test]
    fn test_solver_symbols() {
        // symbols SMTInterpol prints in interpolants and status replies
        let replies = [
            "(<= (+ y .cse0) (- 1))",
            "(! (> x y) :named phi_1)",
            "\n<<DONE>>\n",
            "(:reason-unknown \"timeout\")",
            "(x@1 ~y)",
        ];
        let reprinted = replies
            .iter()
            .map(|r| parse(r).unwrap().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        insta::assert_snapshot!(reprinted, @r###"
        (<= (+ y .cse0) (- 1))
        (! (> x y) :named phi_1)
        <<DONE>>
        (:reason-unknown timeout)
        (x@1 ~y)
        "###);
    }

    #[test]
    fn test_quoted_symbols() {
        for (input, printed) in [
            ("|tee file|", "|tee file|"),
            ("\"line 3: undeclared x\"", "|line 3: undeclared x|"),
            ("|\"x\"|", "|\"x\"|"),
            ("\"a|b\"", "\"a|b\""),
        ] {
            let sexp = parse(input).unwrap();
            assert_eq!(sexp.to_string(), printed);
            assert_eq!(parse(printed), Ok(sexp), "`{input}` does not reparse");
        }
    }

    #[test]
    fn test_comment_in_list() {
        let sexp = sexp_l([atom_s("a"), Sexp::Comment(" note".to_string()), atom_s("b")]);
        assert_eq!(sexp.to_string(), "(a\n; note\nb)");
        assert_eq!(parse(&sexp.to_string()), Ok(sexp));
    }
}
