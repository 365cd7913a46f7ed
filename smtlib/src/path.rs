// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Utilities for finding SMT-related things in the filesystem.

use std::{
    env,
    path::{Path, PathBuf},
};

#[allow(non_snake_case)]
fn REPO_ROOT_PATH() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or_else(|| Path::new("."))
}

fn solvers_dir() -> PathBuf {
    REPO_ROOT_PATH().join("solvers")
}

/// Get the right invocation of the binary `bin` (used for `java`).
///
/// First checks if the environment variable is set (eg, JAVA_BIN), which takes
/// first priority. Then checks if the binary is in the `solvers` directory of
/// the repo. Finally falls back to just using bin as-is (that is, relying on
/// $PATH).
pub fn solver_path(bin: &str) -> String {
    let var = bin.to_uppercase() + "_BIN";
    if let Some(val) = env::var_os(var) {
        return val.to_string_lossy().into();
    }
    let bin = if env::consts::OS == "windows" && !bin.ends_with(".exe") {
        bin.to_owned() + ".exe"
    } else {
        bin.to_owned()
    };
    let src_bin_path = solvers_dir().join(&bin);
    if src_bin_path.exists() {
        return src_bin_path.to_string_lossy().into();
    }
    bin
}

/// Find the SMTInterpol jar.
///
/// `SMTINTERPOL_JAR` takes priority, then `solvers/smtinterpol.jar` in the
/// repo. Returns None if neither exists.
pub fn smtinterpol_jar() -> Option<PathBuf> {
    if let Some(val) = env::var_os("SMTINTERPOL_JAR") {
        let path = PathBuf::from(val);
        return path.exists().then_some(path);
    }
    let path = solvers_dir().join("smtinterpol.jar");
    path.exists().then_some(path)
}

/// Get the directory that transcripts for a named query are saved to.
pub fn log_dir(query_name: &str) -> PathBuf {
    REPO_ROOT_PATH()
        .join(".interpolation-log")
        .join(Path::new(query_name).with_extension(""))
}
