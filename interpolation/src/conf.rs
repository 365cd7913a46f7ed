// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Holds the configuration needed to launch interpolating solvers.

use std::path::PathBuf;

use smtlib::path::log_dir;

use crate::{backends::SmtInterpolBackend, solver::InterpolationSolver};

/// Wrapper around the configuration needed to launch a solver.
#[derive(Debug, Clone)]
pub struct SolverConf {
    /// Which backend to use for launched solvers.
    pub backend: SmtInterpolBackend,
    /// The optional path to tee SMT output to.
    pub tee: Option<PathBuf>,
}

impl SolverConf {
    /// Configuration for `backend`, without a transcript.
    pub fn new(backend: SmtInterpolBackend) -> Self {
        Self { backend, tee: None }
    }

    /// Configuration for an SMTInterpol found on this machine, if any.
    pub fn find() -> Option<Self> {
        SmtInterpolBackend::find().map(Self::new)
    }

    /// Record solver input for `query_name` in the repo's log directory.
    pub fn tee(&mut self, query_name: &str) -> &mut Self {
        self.tee = Some(log_dir(query_name));
        return self;
    }

    /// Create an interpolation solver with the given configuration.
    pub fn solver(&self) -> InterpolationSolver<&SmtInterpolBackend> {
        InterpolationSolver::new(&self.backend, self.tee.as_deref())
    }
}
