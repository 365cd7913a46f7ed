// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Interpolation against a real SMTInterpol. These tests are skipped when the
//! jar cannot be found (set `SMTINTERPOL_JAR` or put it in `solvers/`).

use eyre::WrapErr;
use expr::{
    parser::parse_expression,
    semantics::valuations,
    syntax::{registry, Expression, Quantifier, Type, Variable, VariableRegistry},
};
use interpolation::{conf::SolverConf, encoder::EncodeError, solver::InterpolationError};

fn conf() -> Option<SolverConf> {
    let _ = pretty_env_logger::try_init();
    let conf = SolverConf::find();
    if conf.is_none() {
        eprintln!("could not find SMTInterpol, skipping test");
    }
    conf
}

fn vars() -> VariableRegistry {
    registry([Variable::int("x"), Variable::int("y")])
}

fn formulas(ss: &[&str]) -> Vec<Expression> {
    formulas_over(&vars(), ss)
}

fn formulas_over(vars: &VariableRegistry, ss: &[&str]) -> Vec<Expression> {
    ss.iter().map(|s| parse_expression(s, vars).unwrap()).collect()
}

/// Check the interpolant conditions by brute force over a small range: each
/// interpolant follows from the formulas before it (and the previous
/// interpolant), is inconsistent with the formula after it, and mentions only
/// variables shared by both sides.
fn check_interpolants(formulas: &[Expression], interpolants: &[Expression]) {
    assert_eq!(interpolants.len(), formulas.len() - 1);
    let vars: Vec<Variable> = vars().into_values().collect();
    for (i, interpolant) in interpolants.iter().enumerate() {
        let before = formulas[..=i]
            .iter()
            .flat_map(|f| f.free_variables())
            .collect::<std::collections::BTreeSet<_>>();
        let after = formulas[i + 1..]
            .iter()
            .flat_map(|f| f.free_variables())
            .collect::<std::collections::BTreeSet<_>>();
        for name in interpolant.free_variables() {
            assert!(
                before.contains(&name) && after.contains(&name),
                "interpolant {interpolant} mentions {name}, which is not shared"
            );
        }
        let previous = if i == 0 {
            Expression::TRUE
        } else {
            interpolants[i - 1].clone()
        };
        for v in valuations(&vars, -4..=4) {
            let holds = |e: &Expression| e.holds(&v).unwrap();
            if holds(&previous) && holds(&formulas[i]) {
                assert!(holds(interpolant), "{interpolant} does not follow at {v:?}");
            }
            if i + 1 == interpolants.len() {
                assert!(
                    !(holds(interpolant) && holds(&formulas[i + 1])),
                    "{interpolant} is consistent with the last formula at {v:?}"
                );
            }
        }
    }
}

#[test]
fn test_triad() {
    let Some(conf) = conf() else {
        return;
    };
    let formulas = formulas(&["x > y", "x = 0", "y > 0"]);
    let interpolants = conf
        .solver()
        .get_interpolants(&formulas)
        .wrap_err("could not get interpolants")
        .unwrap()
        .expect("triad is unsatisfiable");
    for i in &interpolants {
        eprintln!("{i}");
    }
    check_interpolants(&formulas, &interpolants);
}

#[test]
fn test_bounded_triad() {
    let Some(conf) = conf() else {
        return;
    };
    // the range assertions for x and y go in unnamed, ahead of phi_1
    let vars = registry([
        Variable::new("x", Type::sint32()),
        Variable::new("y", Type::sint32()),
    ]);
    let formulas = formulas_over(&vars, &["x > y", "x = 0", "y > 0"]);
    let interpolants = conf
        .solver()
        .get_interpolants(&formulas)
        .wrap_err("could not get interpolants")
        .unwrap()
        .expect("bounded triad is unsatisfiable");
    check_interpolants(&formulas, &interpolants);
}

#[test]
fn test_satisfiable() {
    let Some(conf) = conf() else {
        return;
    };
    let formulas = formulas(&["x > 0", "y > 0"]);
    let r = conf
        .solver()
        .get_interpolants(&formulas)
        .wrap_err("could not run query")
        .unwrap();
    assert!(r.is_none());
}

#[test]
fn test_unsupported_construct() {
    let Some(conf) = conf() else {
        return;
    };
    let formulas = vec![
        parse_expression("x > 0", &vars()).unwrap(),
        Expression::Quantified {
            quantifier: Quantifier::Forall,
            bound: vec![Variable::int("y")],
            body: Box::new(parse_expression("y >= x", &vars()).unwrap()),
        },
    ];
    assert!(matches!(
        conf.solver().get_interpolants(&formulas),
        Err(InterpolationError::Encode(EncodeError::UnsupportedConstruct(_)))
    ));
}
