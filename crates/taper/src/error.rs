// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use thiserror::Error;

use z2taper_pauli::ArithmeticError;

/// Errors raised by the symmetry-tapering pipeline.
#[derive(Error, Debug)]
pub enum TaperError {
    /// The operator being transformed acts on a different register than the one the symmetries
    /// were discovered on.
    #[error("operator acts on {operator} qubits, but the symmetries were found on {expected}")]
    MismatchedQubits { operator: u32, expected: u32 },
    /// Symmetry discovery was asked to run on an operator with no terms.  Every Pauli string
    /// commutes with an empty sum, so there is no meaningful generating set to return.
    #[error("cannot discover symmetries of an operator with no terms")]
    EmptyOperator,
    /// A sector assignment has the wrong number of entries.
    #[error("sector has {len} entries, but {expected} symmetries were found")]
    SectorLength { len: usize, expected: usize },
    /// A sector entry is not one of the two eigenvalues of a Pauli operator.
    #[error("sector values must be +1 or -1, got {value} at position {index}")]
    SectorValue { value: i8, index: usize },
    /// A rotation was requested around a qubit where its generator has no Z component, so the
    /// two halves of the rotation do not anticommute.
    #[error("generator {label} does not anticommute with X on qubit {qubit}")]
    IncompatibleRotation { label: String, qubit: u32 },
    /// Two generators were forced onto the same designated qubit.  The reduction of the
    /// generator set makes this impossible, so seeing it means the discovery step produced a
    /// dependent basis; it is surfaced rather than silently recovered.
    #[error("no designated qubit could be assigned to symmetry generator {index} ({label})")]
    AssignmentInfeasible { index: usize, label: String },
    /// A designated qubit still carried a Z or Y component at substitution time.  The Clifford
    /// step guarantees this cannot happen for operators the symmetries were discovered on, so
    /// seeing it means an internal invariant was violated; it is surfaced rather than silently
    /// recovered.
    #[error("qubit {qubit} of term {label} is not in the X/I subspace after the rotations")]
    NonDiagonalResidual { qubit: u32, label: String },
    /// A width mismatch detected by the operator layer.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}
