// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! Pauli-operator data model: a dense packed string type, a weighted sum type, and their dense
//! realizations.
//!
//! Strings are phase-free, with `Y` on a site meaning exactly the Pauli Y matrix; multiplication
//! phases are reported as explicit powers of `i`.  Qubit 0 is always the rightmost character of a
//! string label and the least-significant bit of packed words and basis-state indices.

use std::env;

pub mod matrix;
pub mod pauli;
pub mod sum;
pub mod util;

pub use matrix::MatrixError;
pub use pauli::{ArithmeticError, LabelError, Pauli, PauliFromU8Error, PauliString};
pub use sum::{CoherenceError, PauliSum, PauliTermView};

/// Whether rayon-backed paths should spawn worker threads.
///
/// `Z2TAPER_IN_PARALLEL=TRUE` marks an outer harness that already owns the process's
/// parallelism, in which case nested threading is skipped unless `Z2TAPER_FORCE_THREADS=TRUE`
/// overrides it.
#[inline]
pub fn getenv_use_multiple_threads() -> bool {
    let parallel_context = env::var("Z2TAPER_IN_PARALLEL")
        .unwrap_or_else(|_| "FALSE".to_string())
        .to_uppercase()
        == "TRUE";
    let force_threads = env::var("Z2TAPER_FORCE_THREADS")
        .unwrap_or_else(|_| "FALSE".to_string())
        .to_uppercase()
        == "TRUE";
    !parallel_context || force_threads
}
