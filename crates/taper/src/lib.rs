// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! Z2-symmetry tapering of Pauli-sum operators.
//!
//! A qubit operator that commutes with a set of independent Pauli-string symmetries only mixes
//! states within fixed symmetry sectors, so each symmetry can be traded for one qubit of the
//! register.  [Z2Symmetries::find] discovers the symmetries as the GF(2) kernel of the
//! operator's commutation constraints and assigns each generator a designated qubit; a
//! [CliffordRotation] per generator exchanges it with a single-qubit X; tapering then fixes each
//! X to a chosen ±1 eigenvalue and deletes the designated qubits, leaving one operator on
//! `n - k` qubits per sector.  [minimum_sector] and [minimum_sector_parallel] locate the sector
//! holding the global ground state through the [MinimumEigensolver] seam, with
//! [ExactEigensolver] as the dense reference implementation.

pub mod clifford;
pub mod eigensolver;
pub mod error;
pub mod gf2;
pub mod sector;
pub mod symmetry;
pub mod taper;


pub use clifford::CliffordRotation;
pub use eigensolver::{EigensolverError, ExactEigensolver};
pub use error::TaperError;
pub use sector::{minimum_sector, minimum_sector_parallel, MinimumEigensolver, SectorMinimum};
pub use symmetry::{MolecularMetadata, Z2Symmetries};
pub use taper::TaperedOperator;

pub use z2taper_pauli::{
    getenv_use_multiple_threads, ArithmeticError, CoherenceError, LabelError, MatrixError, Pauli,
    PauliString, PauliSum, PauliTermView,
};
