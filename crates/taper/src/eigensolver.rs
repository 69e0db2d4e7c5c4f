// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! Dense exact diagonalization, for validation-scale operators.
//!
//! Production sector searches plug a variational or iterative solver into
//! [crate::sector::MinimumEigensolver]; this module provides the reference implementation that
//! builds the full `2^n` matrix and diagonalizes it, which is what the spectrum-level tests in
//! this crate run against.

use nalgebra::DMatrix;
use num_complex::Complex64;
use thiserror::Error;

use z2taper_pauli::{MatrixError, PauliSum};

use crate::sector::MinimumEigensolver;

#[derive(Error, Debug)]
pub enum EigensolverError {
    /// The operator has a coefficient with a non-negligible imaginary part after merging, so
    /// its spectrum is not real.
    #[error("operator is not Hermitian: term {label} has coefficient {coeff}")]
    NonHermitian { label: String, coeff: Complex64 },
    #[error("dense realization failed: {0}")]
    Matrix(#[from] MatrixError),
}

/// A [MinimumEigensolver] that diagonalizes the dense matrix of the operator.
#[derive(Clone, Copy, Debug)]
pub struct ExactEigensolver {
    hermiticity_tol: f64,
}

impl ExactEigensolver {
    /// A solver with the default Hermiticity tolerance of `1e-8`.
    pub fn new() -> Self {
        Self {
            hermiticity_tol: 1e-8,
        }
    }

    /// A solver accepting imaginary coefficient parts up to `tol` in magnitude.
    pub fn with_tolerance(tol: f64) -> Self {
        Self {
            hermiticity_tol: tol,
        }
    }

    /// The full eigenvalue spectrum of the operator, in ascending order.
    ///
    /// The operator is canonicalized first, so pairs of anti-Hermitian terms that cancel do not
    /// trip the Hermiticity check.
    pub fn eigenvalues(&self, operator: &PauliSum) -> Result<Vec<f64>, EigensolverError> {
        let canonical = operator.canonicalize(0.0);
        for term in canonical.iter() {
            if term.coeff().im.abs() > self.hermiticity_tol {
                return Err(EigensolverError::NonHermitian {
                    label: term.to_pauli_string().to_label(),
                    coeff: term.coeff(),
                });
            }
        }
        let matrix = canonical.to_matrix()?;
        let dim = matrix.nrows();
        let dense = DMatrix::from_fn(dim, dim, |row, col| matrix[[row, col]]);
        let mut eigenvalues: Vec<f64> = dense.symmetric_eigenvalues().iter().copied().collect();
        eigenvalues.sort_by(f64::total_cmp);
        Ok(eigenvalues)
    }
}

impl Default for ExactEigensolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MinimumEigensolver for ExactEigensolver {
    type Error = EigensolverError;

    fn minimum_eigenvalue(&self, operator: &PauliSum) -> Result<f64, EigensolverError> {
        Ok(self
            .eigenvalues(operator)?
            .into_iter()
            .fold(f64::INFINITY, f64::min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use z2taper_pauli::util::c64;

    use crate::sector::minimum_sector;
    use crate::symmetry::Z2Symmetries;
    use crate::test::h2_sto3g;

    fn op(labels: &[(&str, f64)]) -> PauliSum {
        PauliSum::from_labels(labels.iter().map(|&(label, re)| (label, c64(re, 0)))).unwrap()
    }

    #[test]
    fn single_qubit_spectra() {
        let solver = ExactEigensolver::new();
        for label in ["X", "Y", "Z"] {
            let spectrum = solver.eigenvalues(&op(&[(label, 1.0)])).unwrap();
            assert_eq!(spectrum.len(), 2);
            assert_abs_diff_eq!(spectrum[0], -1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(spectrum[1], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn mixed_field_spectrum() {
        let spectrum = ExactEigensolver::new()
            .eigenvalues(&op(&[("X", 1.0), ("Z", 1.0)]))
            .unwrap();
        assert_abs_diff_eq!(spectrum[0], -std::f64::consts::SQRT_2, epsilon = 1e-12);
        assert_abs_diff_eq!(spectrum[1], std::f64::consts::SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn non_hermitian_operators_are_rejected() {
        let mut operator = PauliSum::zero(1);
        operator.add_label("X", c64(0, 0.5)).unwrap();
        assert!(matches!(
            ExactEigensolver::new().eigenvalues(&operator),
            Err(EigensolverError::NonHermitian { .. })
        ));
        // A loose tolerance admits the same operator.
        assert!(ExactEigensolver::with_tolerance(0.6).eigenvalues(&operator).is_ok());
    }

    #[test]
    fn anti_hermitian_parts_may_cancel() {
        let mut operator = PauliSum::zero(1);
        operator.add_label("X", c64(0, 1)).unwrap();
        operator.add_label("X", c64(0, -1)).unwrap();
        operator.add_label("Z", c64(2, 0)).unwrap();
        let spectrum = ExactEigensolver::new().eigenvalues(&operator).unwrap();
        assert_abs_diff_eq!(spectrum[0], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(spectrum[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn tapering_preserves_the_molecular_spectrum() {
        let operator = h2_sto3g();
        let solver = ExactEigensolver::new();
        let full_spectrum = solver.eigenvalues(&operator).unwrap();
        let symmetries = Z2Symmetries::find(&operator).unwrap();
        let tapered = symmetries.taper_all(&operator).unwrap();
        assert_eq!(tapered.len(), 8);

        // The rotated operator block-diagonalizes over the sectors, so the sector spectra
        // together are exactly the full spectrum.
        let mut union: Vec<f64> = Vec::with_capacity(full_spectrum.len());
        for entry in &tapered {
            union.extend(solver.eigenvalues(entry.operator()).unwrap());
        }
        union.sort_by(f64::total_cmp);
        assert_eq!(union.len(), full_spectrum.len());
        for (&sector_value, &full_value) in union.iter().zip(&full_spectrum) {
            assert_abs_diff_eq!(sector_value, full_value, epsilon = 1e-8);
        }

        // The winning sector attains the untapered ground energy.
        let winner = minimum_sector(&tapered, &solver).unwrap().unwrap();
        assert_abs_diff_eq!(winner.eigenvalue, full_spectrum[0], epsilon = 1e-8);
        assert_eq!(tapered[winner.index].num_qubits(), 1);
    }
}
