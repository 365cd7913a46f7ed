// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The seam between interpolation and a running solver.
//!
//! A [`Script`] is one solver session that accepts SMT-LIB commands, and a
//! [`Backend`] launches fresh sessions. The only real backend is
//! [`SmtInterpolBackend`], which runs SMTInterpol as a process.

use std::path::{Path, PathBuf};

use smtlib::{
    conf::{SmtInterpolConf, SolverCmd},
    path::{smtinterpol_jar, solver_path},
    proc::{SatResp, SmtProc, SolverError},
    sexp::{app, atom_s, named, sexp_l, Sexp},
};

/// A solver session that SMT-LIB commands can be sent to.
///
/// Only the commands that produce a reply can fail. Failures to deliver the
/// other commands surface at the next reply.
pub trait Script {
    /// Send a command that has no reply.
    fn send(&mut self, cmd: &Sexp);

    /// Run `(check-sat)`.
    fn check_sat(&mut self) -> Result<SatResp, SolverError>;

    /// Run `(get-interpolants names...)` after an unsat answer. Returns the
    /// printed interpolant terms in solver order.
    fn get_interpolants(&mut self, names: &[&str]) -> Result<Vec<String>, SolverError>;

    /// Annotate the session's transcript, if it keeps one.
    fn comment(&mut self, _comment: &str) {}

    /// `(set-option :option value)`
    fn set_option(&mut self, option: &str, value: &str) {
        self.send(&app(
            "set-option",
            [atom_s(format!(":{option}")), atom_s(value)],
        ));
    }

    /// `(set-logic logic)`
    fn set_logic(&mut self, logic: &str) {
        self.send(&app("set-logic", [atom_s(logic)]));
    }

    /// Declare a constant, as `(declare-fun name () sort)`.
    fn declare_fun(&mut self, name: &str, sort: &str) {
        self.send(&app("declare-fun", [atom_s(name), sexp_l([]), atom_s(sort)]));
    }

    /// `(assert term)`
    fn assert(&mut self, term: Sexp) {
        self.send(&app("assert", [term]));
    }

    /// `(assert (! term :named name))`
    fn assert_named(&mut self, term: Sexp, name: &str) {
        self.send(&app("assert", [named(term, name)]));
    }
}

impl Script for SmtProc {
    fn send(&mut self, cmd: &Sexp) {
        SmtProc::send(self, cmd)
    }

    fn check_sat(&mut self) -> Result<SatResp, SolverError> {
        SmtProc::check_sat(self)
    }

    fn get_interpolants(&mut self, names: &[&str]) -> Result<Vec<String>, SolverError> {
        let terms = SmtProc::get_interpolants(self, names)?;
        Ok(terms.iter().map(|t| t.to_string()).collect())
    }

    fn comment(&mut self, comment: &str) {
        self.comment_with(|| comment.to_string())
    }
}

/// Launches solver sessions.
pub trait Backend {
    /// The session type this backend launches.
    type Script: Script;

    /// Start a fresh session. With `tee`, everything sent to the session is
    /// recorded for replay in that directory.
    fn launch(&self, tee: Option<&Path>) -> Result<Self::Script, SolverError>;
}

impl<B: Backend> Backend for &B {
    type Script = B::Script;

    fn launch(&self, tee: Option<&Path>) -> Result<Self::Script, SolverError> {
        B::launch(self, tee)
    }
}

#[derive(Debug, Clone, Default)]
struct SmtInterpolOptions {
    timeout_ms: Option<usize>,
    seed: usize,
}

/// A Backend for launching SMTInterpol from its jar.
#[derive(Debug, Clone)]
pub struct SmtInterpolBackend {
    java: String,
    jar: PathBuf,
    opts: SmtInterpolOptions,
}

impl SmtInterpolBackend {
    /// Create a Backend that runs `jar` with the given `java` binary.
    pub fn new(java: &str, jar: &Path) -> Self {
        Self {
            java: java.to_string(),
            jar: jar.to_path_buf(),
            opts: Default::default(),
        }
    }

    /// Locate java and the SMTInterpol jar (see [`smtlib::path`]). Returns
    /// None if the jar cannot be found.
    pub fn find() -> Option<Self> {
        smtinterpol_jar().map(|jar| Self::new(&solver_path("java"), &jar))
    }

    /// Set the solver timeout. None disables the timeout.
    pub fn timeout_ms(&mut self, timeout_ms: Option<usize>) -> &mut Self {
        self.opts.timeout_ms = timeout_ms;
        return self;
    }

    /// Set the solver's random seed.
    pub fn seed(&mut self, seed: usize) -> &mut Self {
        self.opts.seed = seed;
        return self;
    }

    /// Get a [`SolverCmd`] with all the info to launch SMTInterpol.
    pub fn get_cmd(&self) -> SolverCmd {
        let mut conf = SmtInterpolConf::new(&self.java, &self.jar.to_string_lossy());
        conf.timeout_ms(self.opts.timeout_ms);
        conf.seed(self.opts.seed);
        conf.done()
    }
}

impl Backend for SmtInterpolBackend {
    type Script = SmtProc;

    fn launch(&self, tee: Option<&Path>) -> Result<SmtProc, SolverError> {
        SmtProc::new(self.get_cmd(), tee)
    }
}


#[cfg(test)]
mod tests {
    use super::{scripted::ScriptedSolver, Script, SmtInterpolBackend};
    use smtlib::sexp::{app, atom_i, atom_s};
    use std::path::Path;

    #[test]
    fn test_smtinterpol_cmd() {
        let mut backend = SmtInterpolBackend::new("java", Path::new("solvers/smtinterpol.jar"));
        backend.timeout_ms(Some(2000)).seed(7);
        let cmd = backend.get_cmd();
        assert_eq!(cmd.cmdline(), "java -jar solvers/smtinterpol.jar -q");
        let options: Vec<String> = cmd
            .options
            .iter()
            .map(|(option, val)| format!("{option}={val}"))
            .collect();
        assert_eq!(
            options,
            vec!["print-success=false", "timeout=2000", "random-seed=7"]
        );
    }

    #[test]
    fn test_script_commands() {
        let mut script = ScriptedSolver::default();
        script.set_option("produce-interpolants", "true");
        script.set_logic("QF_LIA");
        script.declare_fun("x", "Int");
        script.assert(app(">=", [atom_s("x"), atom_i(0)]));
        script.assert_named(app("<", [atom_s("x"), atom_i(3)]), "phi_1");
        script.comment("not recorded");
        insta::assert_snapshot!(script.transcript().join("\n"), @r###"
        (set-option :produce-interpolants true)
        (set-logic QF_LIA)
        (declare-fun x () Int)
        (assert (>= x 0))
        (assert (! (< x 3) :named phi_1))
        "###);
    }
}
