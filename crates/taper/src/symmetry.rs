// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! Discovery of the Z2 symmetries of a Pauli-sum operator.
//!
//! A Z2 symmetry is a Pauli string that commutes with every term of the operator.  In the
//! symplectic picture each term is a row of a GF(2) constraint matrix, and the strings commuting
//! with all of them are exactly the kernel of that matrix.  The kernel basis is then reduced so
//! that each generator owns one "designated" qubit where it alone carries a Z component, which
//! pins down the Clifford rotation that converts the generator into a single-qubit X.

use hashbrown::HashSet;
use itertools::izip;

use z2taper_pauli::pauli::words_for;
use z2taper_pauli::{PauliString, PauliSum};

use crate::clifford::CliffordRotation;
use crate::error::TaperError;
use crate::gf2::BinaryMatrix;

/// Fermionic problem data carried opaquely through the tapering.
///
/// The engine never interprets these values; they exist so that callers which discovered the
/// symmetries on a molecular Hamiltonian can recover the particle-number bookkeeping from a
/// [crate::taper::TaperedOperator] without holding the original problem alongside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MolecularMetadata {
    pub num_spatial_orbitals: u32,
    pub num_alpha: u32,
    pub num_beta: u32,
}

/// The Z2 symmetries of an operator, with their designated qubits and Clifford rotations.
///
/// Construct with [Z2Symmetries::find]; all fields are immutable afterwards.  The generator
/// list, the designated-qubit list and the rotation list are index-aligned, and sectors passed
/// to the tapering operations use the same order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Z2Symmetries {
    num_qubits: u32,
    generators: Vec<PauliString>,
    sq_qubits: Vec<u32>,
    cliffords: Vec<CliffordRotation>,
    metadata: Option<MolecularMetadata>,
}

impl Z2Symmetries {
    /// Find the Z2 symmetries of an operator.
    ///
    /// The returned generator set is a deterministic function of the operator's term list: the
    /// GF(2) kernel basis is taken in the reduced-echelon order of [BinaryMatrix::null_space]
    /// and then reduced again so that generator `i` is the only one with a Z component on
    /// `sq_qubits()[i]`.
    ///
    /// Symmetries with no Z component anywhere (such as a global spin flip built purely from X)
    /// cannot anticommute with any single-qubit X and are not returned; the count of symmetries
    /// is the GF(2) rank of the kernel's Z halves.
    ///
    /// An operator with no terms is rejected: every string commutes with an empty sum, so there
    /// is no meaningful generating set for it.
    pub fn find(operator: &PauliSum) -> Result<Self, TaperError> {
        if operator.is_empty() {
            return Err(TaperError::EmptyOperator);
        }
        let num_qubits = operator.num_qubits();
        let n = num_qubits as usize;
        // One GF(2) row per term: X bits in the low columns, Z bits in the high ones.  A kernel
        // vector `v` then satisfies `t.x . v[..n] + t.z . v[n..] = 0` for every term `t`, which
        // is the symplectic commutation condition for the string with `z = v[..n]` and
        // `x = v[n..]`.
        let mut constraints = BinaryMatrix::new(2 * n);
        for term in operator.iter() {
            let row = constraints.push_empty_row();
            for qubit in 0..num_qubits {
                if term.x_bit(qubit) {
                    constraints.set(row, qubit as usize);
                }
                if term.z_bit(qubit) {
                    constraints.set(row, n + qubit as usize);
                }
            }
        }
        let words = words_for(num_qubits);
        let mut generators: Vec<PauliString> = Vec::new();
        for vector in constraints.null_space() {
            let mut z = vec![0u64; words];
            let mut x = vec![0u64; words];
            for qubit in 0..n {
                if packed_bit(&vector, qubit) {
                    z[qubit / 64] |= 1 << (qubit % 64);
                }
                if packed_bit(&vector, n + qubit) {
                    x[qubit / 64] |= 1 << (qubit % 64);
                }
            }
            // Both halves only have bits below the register width.
            let candidate = PauliString::from_bits(num_qubits, z, x).unwrap();
            // The kernel commutes with every term, but for degenerate inputs (terms imposing
            // few constraints) it need not be abelian; keep the first maximal abelian subset.
            let mut keep = true;
            for kept in &generators {
                if !candidate.commutes_with(kept)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                generators.push(candidate);
            }
        }
        if cfg!(debug_assertions) {
            for generator in &generators {
                for term in operator.iter() {
                    debug_assert!(
                        generator.commutes_with(&term.to_pauli_string())?,
                        "kernel vector {} does not commute with every term",
                        generator.to_label(),
                    );
                }
            }
        }
        let (generators, sq_qubits) = assign_single_qubits(generators)?;
        let mut cliffords = Vec::with_capacity(generators.len());
        for (generator, &qubit) in izip!(&generators, &sq_qubits) {
            cliffords.push(CliffordRotation::new(generator.clone(), qubit)?);
        }
        Ok(Self {
            num_qubits,
            generators,
            sq_qubits,
            cliffords,
            metadata: None,
        })
    }

    /// Attach problem-level metadata, to be carried into every tapered operator.
    pub fn with_metadata(mut self, metadata: MolecularMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The register width the symmetries were discovered on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The number of independent symmetries, equal to the number of qubits tapering removes.
    #[inline]
    pub fn num_symmetries(&self) -> usize {
        self.generators.len()
    }

    /// Whether no symmetries were found, in which case tapering is a no-op.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// The symmetry generators, after the designated-qubit reduction.
    #[inline]
    pub fn generators(&self) -> &[PauliString] {
        &self.generators
    }

    /// The designated qubit of each generator, index-aligned with [Z2Symmetries::generators].
    #[inline]
    pub fn sq_qubits(&self) -> &[u32] {
        &self.sq_qubits
    }

    /// The single-qubit X partner of each generator, as full-width strings.
    pub fn sq_paulis(&self) -> Vec<PauliString> {
        self.cliffords.iter().map(CliffordRotation::sq_pauli).collect()
    }

    /// The Clifford rotations pairing each generator with its partner.
    #[inline]
    pub fn cliffords(&self) -> &[CliffordRotation] {
        &self.cliffords
    }

    /// The attached problem metadata, if any.
    #[inline]
    pub fn metadata(&self) -> Option<&MolecularMetadata> {
        self.metadata.as_ref()
    }
}

#[inline]
fn packed_bit(words: &[u64], index: usize) -> bool {
    (words[index / 64] >> (index % 64)) & 1 == 1
}

/// Reduce a commuting generator set until each generator has a designated qubit: a column of
/// the Z-half matrix where it alone carries a bit.
///
/// This is Gauss-Jordan elimination over the generators' Z halves, with every row operation
/// mirrored onto the full strings as a sign-free product.  Generators whose Z half vanishes
/// under the reduction are X-only symmetries with no valid designated qubit; they are dropped,
/// so the returned count is the GF(2) rank of the Z halves.
fn assign_single_qubits(
    mut generators: Vec<PauliString>,
) -> Result<(Vec<PauliString>, Vec<u32>), TaperError> {
    let num_qubits = generators.first().map_or(0, PauliString::num_qubits);
    let mut pivots: Vec<u32> = Vec::new();
    for qubit in 0..num_qubits {
        let rank = pivots.len();
        if rank == generators.len() {
            break;
        }
        let Some(pivot_row) = (rank..generators.len()).find(|&row| generators[row].z_bit(qubit))
        else {
            continue;
        };
        generators.swap(rank, pivot_row);
        let pivot = generators[rank].clone();
        for (row, generator) in generators.iter_mut().enumerate() {
            if row != rank && generator.z_bit(qubit) {
                generator.xor_with(&pivot)?;
            }
        }
        pivots.push(qubit);
    }
    generators.truncate(pivots.len());
    // Full elimination leaves each pivot column set in its own row only.  A conflict here means
    // the kernel basis was not independent, which discovery rules out; it is surfaced rather
    // than recovered from.
    let mut claimed = HashSet::with_capacity(pivots.len());
    for (index, &qubit) in pivots.iter().enumerate() {
        let conflict = !claimed.insert(qubit)
            || generators
                .iter()
                .enumerate()
                .any(|(row, generator)| (row == index) != generator.z_bit(qubit));
        if conflict {
            return Err(TaperError::AssignmentInfeasible {
                index,
                label: generators[index].to_label(),
            });
        }
    }
    Ok((generators, pivots))
}
