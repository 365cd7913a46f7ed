// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Craig interpolation over integer/boolean expressions, computed by an
//! interpolating SMT solver (SMTInterpol).
//!
//! [`encoder`] translates [`expr::syntax::Expression`]s into SMT-LIB terms,
//! declaring their variables as it goes, [`decoder`] reads the solver's
//! interpolants back into expressions over the same variables, and
//! [`solver::InterpolationSolver`] drives one solver session per query.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::upper_case_acronyms)]
#![deny(clippy::uninlined_format_args)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backends;
pub mod conf;
pub mod decoder;
pub mod encoder;
pub mod solver;
