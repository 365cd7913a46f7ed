// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Construct launch and option configurations for SMTInterpol.

/// The full invocation of a solver binary.
#[derive(Debug, Clone)]
pub struct SolverCmd {
    /// Binary to launch
    pub cmd: String,
    /// Arguments to pass
    pub args: Vec<String>,
    /// SMT options to send on startup, in order
    pub options: Vec<(String, String)>,
}

impl SolverCmd {
    /// A command with no arguments and no startup options.
    pub fn new(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
            args: vec![],
            options: vec![],
        }
    }

    /// Append command-line arguments.
    pub fn args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
    }

    /// Set an option. Options are sent in the order they were set, so a later
    /// value for the same option wins.
    pub fn option<S: AsRef<str>>(&mut self, name: &str, val: S) {
        self.options
            .push((name.to_string(), val.as_ref().to_string()));
    }

    /// Build the command line string, for printing purposes.
    pub fn cmdline(&self) -> String {
        let args: Vec<_> = self
            .args
            .iter()
            .map(|a| {
                if a.contains(' ') {
                    format!("\"{a}\"")
                } else {
                    a.clone()
                }
            })
            .collect();
        format!("{} {}", &self.cmd, args.join(" "))
    }
}

/// Builder for an SMTInterpol [`SolverCmd`].
///
/// SMTInterpol is distributed as a jar, so the launched binary is `java` and
/// the jar is passed with `-jar`.
#[derive(Debug, Clone)]
pub struct SmtInterpolConf(SolverCmd);

impl SmtInterpolConf {
    /// Create an SMTInterpolConf with some default options, running `jar` with
    /// the `java` binary.
    pub fn new(java: &str, jar: &str) -> Self {
        let mut cmd = SolverCmd::new(java);
        cmd.args(["-jar", jar, "-q"]);
        // responses are read by framing them with echo, so the `success`
        // acknowledgements would be mistaken for replies
        cmd.option("print-success", "false");
        Self(cmd)
    }

    /// Set the per-query timeout. None leaves SMTInterpol's default (no
    /// timeout).
    pub fn timeout_ms(&mut self, ms: Option<usize>) {
        if let Some(ms) = ms {
            self.0.option("timeout", format!("{ms}"));
        }
    }

    /// Set the random seed.
    pub fn seed(&mut self, seed: usize) {
        self.0.option("random-seed", format!("{seed}"));
    }

    /// Get the final command to run the solver.
    pub fn done(self) -> SolverCmd {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::SmtInterpolConf;

    #[test]
    fn test_smtinterpol_cmdline() {
        let mut conf = SmtInterpolConf::new("java", "/opt/smt interpol.jar");
        conf.timeout_ms(Some(500));
        conf.timeout_ms(None);
        let cmd = conf.done();
        assert_eq!(cmd.cmdline(), "java -jar \"/opt/smt interpol.jar\" -q");
        assert_eq!(
            cmd.options,
            vec![
                ("print-success".to_string(), "false".to_string()),
                ("timeout".to_string(), "500".to_string()),
            ]
        );
    }
}
