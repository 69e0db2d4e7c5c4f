// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use ndarray::{Array2, ArrayViewMut1, Axis};
use num_complex::Complex64;
use num_traits::Zero;
use rayon::prelude::*;
use thiserror::Error;

use crate::getenv_use_multiple_threads;
use crate::sum::PauliSum;

/// Size threshold, in qubits, above which statevector walks go through rayon.
const PARALLEL_THRESHOLD: usize = 19;
/// Matrix rows are much heavier than statevector entries, so the dense build parallelizes
/// earlier.
const MATRIX_PARALLEL_THRESHOLD: usize = 10;

/// Errors from realizing an operator against a concrete Hilbert-space dimension.
#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("the value for num_qubits, {num_qubits}, is too large and would overflow")]
    TooManyQubits { num_qubits: u32 },
    #[error("statevector has dimension {dim}, but a {num_qubits}-qubit operator needs {expected}")]
    MismatchedDimension {
        dim: usize,
        num_qubits: u32,
        expected: usize,
    },
}

/// One term reduced to single-word masks with the Y-count phase folded into the coefficient.
///
/// Writing a string as `i^(z.x) X^x Z^z`, the only nonzero entry of row `r` is column `r ^ x`,
/// with value `coeff * (-i)^(popcount(z & x) % 4) * (-1)^(popcount(r & z))`.
#[derive(Clone, Copy)]
struct MaskedTerm {
    coeff: Complex64,
    z: u64,
    x: u64,
}

impl PauliSum {
    fn masked_terms(&self) -> Vec<MaskedTerm> {
        self.iter()
            .filter_map(|term| {
                let coeff = term.coeff();
                if coeff.is_zero() {
                    return None;
                }
                let z = term.z_words().first().copied().unwrap_or(0);
                let x = term.x_words().first().copied().unwrap_or(0);
                let coeff = match (z & x).count_ones() % 4 {
                    0 => coeff,
                    1 => Complex64::new(coeff.im, -coeff.re),
                    2 => -coeff,
                    3 => Complex64::new(-coeff.im, coeff.re),
                    _ => unreachable!("popcount modulo 4"),
                };
                Some(MaskedTerm { coeff, z, x })
            })
            .collect()
    }

    /// Realize the operator as a dense matrix over the computational basis, qubit 0 least
    /// significant in the basis-state index.
    pub fn to_matrix(&self) -> Result<Array2<Complex64>, MatrixError> {
        // The element count is dim * dim, so the usable range is half the index width.
        if self.num_qubits() >= u64::BITS / 2 {
            return Err(MatrixError::TooManyQubits {
                num_qubits: self.num_qubits(),
            });
        }
        let dim = 1usize << self.num_qubits();
        let terms = self.masked_terms();
        let fill = |row_index: usize, row: &mut ArrayViewMut1<Complex64>| {
            let row_index = row_index as u64;
            for term in &terms {
                let value = if (row_index & term.z).count_ones() & 1 == 1 {
                    -term.coeff
                } else {
                    term.coeff
                };
                row[(row_index ^ term.x) as usize] += value;
            }
        };
        let mut out = Array2::zeros((dim, dim));
        let run_in_parallel = getenv_use_multiple_threads();
        if (self.num_qubits() as usize) < MATRIX_PARALLEL_THRESHOLD || !run_in_parallel {
            for (row_index, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
                fill(row_index, &mut row);
            }
        } else {
            out.axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(row_index, mut row)| fill(row_index, &mut row));
        }
        Ok(out)
    }

    /// Compute `<state| self |state>` without materializing the matrix.
    pub fn expectation_value(&self, state: &[Complex64]) -> Result<Complex64, MatrixError> {
        if self.num_qubits() >= usize::BITS {
            return Err(MatrixError::TooManyQubits {
                num_qubits: self.num_qubits(),
            });
        }
        let size = 1usize << self.num_qubits();
        if state.len() != size {
            return Err(MatrixError::MismatchedDimension {
                dim: state.len(),
                num_qubits: self.num_qubits(),
                expected: size,
            });
        }
        let terms = self.masked_terms();
        let map_fn = |i: usize| -> Complex64 {
            let row_index = i as u64;
            let mut element = Complex64::zero();
            for term in &terms {
                let value = if (row_index & term.z).count_ones() & 1 == 1 {
                    -term.coeff
                } else {
                    term.coeff
                };
                element += value * state[(row_index ^ term.x) as usize];
            }
            state[i].conj() * element
        };
        let run_in_parallel = getenv_use_multiple_threads();
        if (self.num_qubits() as usize) < PARALLEL_THRESHOLD || !run_in_parallel {
            Ok((0..size).map(map_fn).sum())
        } else {
            Ok((0..size).into_par_iter().map(map_fn).sum())
        }
    }
}
