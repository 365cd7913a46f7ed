// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Record the SMT-LIB sent to a solver so a query can be replayed by hand.

use std::{
    collections::hash_map::DefaultHasher,
    fs,
    hash::{Hash, Hasher},
    io,
    path::{Path, PathBuf},
};

use crate::sexp::Sexp;

/// Commands sent to one solver session, saved on request under `dir`.
#[derive(Debug)]
pub struct Tee {
    dir: PathBuf,
    contents: Vec<Sexp>,
}

fn content_hash(contents: &str) -> String {
    let mut hash_state = DefaultHasher::new();
    contents.hash(&mut hash_state);
    format!("{:016x}", hash_state.finish())[..8].to_string()
}

impl Tee {
    /// Create a new empty transcript that will be saved to `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            contents: vec![],
        }
    }

    /// Append a command (or comment) sent to the solver.
    pub fn append(&mut self, s: Sexp) {
        self.contents.push(s)
    }

    fn render(&self) -> String {
        self.contents
            .iter()
            .map(|s| match s {
                Sexp::Comment(c) if c.is_empty() => String::new(),
                Sexp::Comment(c) => format!(";; {c}"),
                _ => s.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the transcript to `query-<hash>.smt2` and return the file name
    /// (relative to the transcript directory).
    pub fn save(&self) -> io::Result<PathBuf> {
        let contents = self.render();
        let fname = PathBuf::from(format!("query-{}.smt2", content_hash(&contents)));
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(&fname), contents + "\n")?;
        Ok(fname)
    }
}
