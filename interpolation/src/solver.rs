// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Compute sequence interpolants for a list of formulas.

use std::path::{Path, PathBuf};

use expr::syntax::Expression;
use smtlib::proc::{SatResp, SolverError};
use thiserror::Error;

use crate::{
    backends::{Backend, Script},
    decoder::{DecodeError, TermParser},
    encoder::{EncodeError, ExpressionEncoder},
};

/// An error from computing interpolants.
#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// The SMT logic used unless configured otherwise.
pub const DEFAULT_LOGIC: &str = "QF_LIA";

/// Computes interpolants, launching one solver session from `B` per query.
#[derive(Debug, Clone)]
pub struct InterpolationSolver<B> {
    backend: B,
    tee: Option<PathBuf>,
    logic: String,
}

/// The name of the `i`th (0-based) formula in a query.
fn assertion_name(i: usize) -> String {
    format!("phi_{}", i + 1)
}

impl<B: Backend> InterpolationSolver<B> {
    /// Create a solver that launches sessions from `backend`, optionally
    /// recording each session's input under `tee`.
    pub fn new(backend: B, tee: Option<&Path>) -> Self {
        Self {
            backend,
            tee: tee.map(|p| p.to_path_buf()),
            logic: DEFAULT_LOGIC.to_string(),
        }
    }

    /// Set the SMT logic for later queries.
    pub fn logic(&mut self, logic: &str) -> &mut Self {
        self.logic = logic.to_string();
        return self;
    }

    /// Compute a sequence interpolant for `formulas`.
    ///
    /// If the conjunction of the formulas is unsatisfiable, returns one
    /// interpolant per boundary between consecutive formulas, in order: the
    /// `i`th interpolant follows from the first `i + 1` formulas, is
    /// unsatisfiable together with the rest, and only mentions variables
    /// shared by both sides. If the conjunction is satisfiable, or the solver
    /// cannot decide, returns `None`.
    pub fn get_interpolants(
        &self,
        formulas: &[Expression],
    ) -> Result<Option<Vec<Expression>>, InterpolationError> {
        let mut script = self.backend.launch(self.tee.as_deref())?;
        script.set_option("produce-interpolants", "true");
        script.set_logic(&self.logic);

        let mut encoder = ExpressionEncoder::new(script);
        let mut names = vec![];
        for (i, formula) in formulas.iter().enumerate() {
            let name = assertion_name(i);
            let term = encoder.encode_assertion(formula)?;
            log::debug!("asserting {name}: {formula}");
            let script = encoder.script_mut();
            script.comment(&format!("{name}: {formula}"));
            script.assert_named(term, &name);
            names.push(name);
        }
        let (mut script, variables) = encoder.into_parts();

        match script.check_sat()? {
            SatResp::Unsat => {}
            SatResp::Sat => {
                log::info!("{} formulas are satisfiable, no interpolants", formulas.len());
                return Ok(None);
            }
            SatResp::Unknown(reason) => {
                log::info!("solver returned unknown ({reason}), no interpolants");
                return Ok(None);
            }
        }

        let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let terms = script.get_interpolants(&names)?;
        let mut parser = TermParser::new(&variables);
        let interpolants = terms
            .iter()
            .map(|term| {
                log::debug!("raw interpolant: {term}");
                parser.parse(term)
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "found {} interpolants for {} formulas",
            interpolants.len(),
            formulas.len()
        );
        Ok(Some(interpolants))
    }
}
