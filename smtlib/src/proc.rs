// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! A solver session running as a child process.
//!
//! Commands are written to the solver's stdin one s-expression per line.
//! Replies are read back up to an echoed marker, so commands that print
//! nothing never block. The process is stopped when the [`SmtProc`] is dropped.

use crate::conf::SolverCmd;
use crate::sexp::{self, app, atom_s, Sexp};
use crate::tee::Tee;
use std::{
    io::{self, BufRead, BufReader, ErrorKind, Write},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};
use thiserror::Error;

/// One running solver and the pipes to talk to it.
#[derive(Debug)]
pub struct SmtProc {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    tee: Option<Tee>,
    // a failed write is reported by the next command that reads a response
    write_error: Option<io::Error>,
}

/// The outcome of `(check-sat)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatResp {
    /// The assertions have a model.
    Sat,
    /// The assertions are contradictory.
    Unsat,
    /// The solver gave up, for the reason reported by
    /// `(get-info :reason-unknown)`.
    Unknown(String),
}

/// Failure to get an answer out of the solver.
#[derive(Error, Debug)]
pub enum SolverError {
    /// Reading from or writing to the process failed.
    #[error("solver I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The solver reported an `(error ..)` or stopped responding.
    #[error("solver returned an error:\n{0}")]
    UnexpectedClose(String),
    /// The reply did not have the shape the command calls for.
    #[error("could not understand solver response:\n{0}")]
    BadResponse(String),
}

type Result<T> = std::result::Result<T, SolverError>;

/// Echoed after every command that expects a reply.
const DONE: &str = "<<DONE>>";

impl Drop for SmtProc {
    fn drop(&mut self) {
        self.kill();
    }
}

impl SmtProc {
    /// Spawn the solver described by `cmd` and apply its options.
    ///
    /// With `tee`, every command sent is also recorded in an `.smt2` file at
    /// that path, which can be replayed against the solver by hand.
    pub fn new(cmd: SolverCmd, tee: Option<&Path>) -> Result<Self> {
        let cmdline = cmd.cmdline();
        let mut child = Command::new(&cmd.cmd)
            .args(&cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(SolverError::UnexpectedClose(
                "solver process has no stdio pipes".to_string(),
            ));
        };
        let tee = tee.map(Tee::new).map(|mut tee| {
            tee.append(Sexp::Comment(cmdline.clone()));
            tee
        });
        log::debug!("launched solver: {cmdline}");
        let mut proc = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            tee,
            write_error: None,
        };
        for (option, value) in &cmd.options {
            let option = atom_s(format!(":{option}"));
            proc.send(&app("set-option", [option, atom_s(value)]));
        }
        Ok(proc)
    }

    /// Send a command that produces no reply.
    pub fn send(&mut self, data: &Sexp) {
        if let Some(tee) = &mut self.tee {
            tee.append(data.clone());
        }
        if self.write_error.is_none() {
            if let Err(err) = writeln!(self.stdin, "{data}") {
                log::warn!("failed to send to solver: {err}");
                self.write_error = Some(err);
            }
        }
    }

    fn request_marker(&mut self) -> io::Result<()> {
        if let Some(err) = self.write_error.take() {
            return Err(err);
        }
        writeln!(self.stdin, r#"(echo "{DONE}")"#)?;
        self.stdin.flush()
    }

    /// Read everything the solver prints up to the marker. Must follow each
    /// command that has a reply.
    fn get_response(&mut self) -> Result<String> {
        self.request_marker().map_err(|err| match err.kind() {
            ErrorKind::BrokenPipe => {
                SolverError::UnexpectedClose("solver closed its input".to_string())
            }
            _ => SolverError::Io(err),
        })?;
        let mut lines: Vec<String> = vec![];
        loop {
            let mut line = String::new();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(SolverError::UnexpectedClose(Self::parse_error(
                    &lines.join("\n"),
                )));
            }
            let line = line.trim_end();
            // SMT-LIB quotes echoed strings, but not every solver does
            if line == DONE || line.strip_prefix('"').and_then(|l| l.strip_suffix('"')) == Some(DONE)
            {
                break;
            }
            // acknowledgements from before print-success took effect
            if line.trim() != "success" {
                lines.push(line.to_string());
            }
        }
        Ok(lines.join("\n").trim_end().to_string())
    }

    /// Send a command whose response is a single s-expression.
    fn send_with_reply(&mut self, data: &Sexp) -> Result<Sexp> {
        self.send(data);
        let resp = self.get_response()?;
        let sexps =
            sexp::parse_many(&resp).map_err(|_| SolverError::BadResponse(resp.clone()))?;
        if let Some(msg) = Self::error_message(&sexps) {
            return Err(SolverError::UnexpectedClose(msg.to_string()));
        }
        match <[Sexp; 1]>::try_from(sexps) {
            Ok([reply]) => Ok(reply),
            Err(_) => Err(SolverError::BadResponse(resp)),
        }
    }

    fn kill(&mut self) {
        _ = writeln!(self.stdin, "(exit)");
        _ = self.stdin.flush();
        _ = self.child.kill();
        _ = self.child.wait();
    }

    /// The message of the first `(error "msg")` among `sexps`.
    fn error_message(sexps: &[Sexp]) -> Option<&str> {
        sexps.iter().find_map(|s| match s.app()? {
            ("error", [msg]) => msg.atom_s(),
            _ => None,
        })
    }

    /// Extract the solver's error message from a raw response.
    ///
    /// A failing `(check-sat)` can print the error and then an answer anyway:
    ///
    /// ```text
    /// (error "msg")
    /// sat
    /// ```
    ///
    /// Responses without a recognizable error are returned whole.
    fn parse_error(resp: &str) -> String {
        sexp::parse_many(resp)
            .ok()
            .and_then(|sexps| Self::error_message(&sexps).map(str::to_string))
            .unwrap_or_else(|| resp.to_string())
    }

    fn parse_sat(&mut self, resp: &str) -> Result<SatResp> {
        match resp {
            "unsat" => Ok(SatResp::Unsat),
            "sat" => Ok(SatResp::Sat),
            "unknown" => {
                let reason = self.get_info(":reason-unknown")?;
                Ok(SatResp::Unknown(reason.to_string()))
            }
            _ => Err(SolverError::UnexpectedClose(Self::parse_error(resp))),
        }
    }

    /// Query `(get-info attribute)` and return the attribute's value.
    pub fn get_info(&mut self, attribute: &str) -> Result<Sexp> {
        let resp = self.send_with_reply(&app("get-info", [atom_s(attribute)]))?;
        match resp.list() {
            Some([key, value]) if key.atom_s() == Some(attribute) => Ok(value.clone()),
            _ => Err(SolverError::BadResponse(resp.to_string())),
        }
    }

    /// Check satisfiability of the current assertions. An unknown answer
    /// comes with the solver's reason, and the transcript is saved.
    pub fn check_sat(&mut self) -> Result<SatResp> {
        self.send(&app("check-sat", []));
        let resp = self.get_response()?;
        let sat = self.parse_sat(&resp)?;
        if matches!(sat, SatResp::Unknown(_)) {
            if let Some(name) = self.save_tee() {
                log::warn!("unknown response to {}", name.display());
            }
        }
        Ok(sat)
    }

    /// Run `(get-interpolants ...)` following an unsat response, with the
    /// names of the asserted formulas in the order they partition the
    /// assertions.
    ///
    /// Returns one term per boundary between consecutive names, in order.
    pub fn get_interpolants(&mut self, names: &[&str]) -> Result<Vec<Sexp>> {
        let resp = self.send_with_reply(&app("get-interpolants", names.iter().map(atom_s)))?;
        match resp {
            Sexp::List(interpolants) => Ok(interpolants),
            _ => Err(SolverError::BadResponse(resp.to_string())),
        }
    }

    /// Write out the transcript so far, returning its path. Without a tee, or
    /// if writing fails, returns `None`.
    pub fn save_tee(&self) -> Option<PathBuf> {
        let tee = self.tee.as_ref()?;
        tee.save()
            .map_err(|err| log::warn!("failed to save tee: {err}"))
            .ok()
    }

    /// Annotate the transcript. `comment` is only evaluated when there is one.
    pub fn comment_with(&mut self, comment: impl FnOnce() -> String) {
        if let Some(tee) = &mut self.tee {
            tee.append(Sexp::Comment(String::new()));
            tee.append(Sexp::Comment(comment()));
        }
    }
}
