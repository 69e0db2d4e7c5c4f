// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! Removal of the designated qubits once the Clifford rotations have made them classical.
//!
//! After conjugation every designated qubit of a symmetric operator carries only `I` or `X`
//! components.  Fixing the symmetry sector replaces each `X` with its chosen eigenvalue, at
//! which point the qubit carries no operator content at all and is deleted from every term,
//! leaving an operator on `n - k` qubits.

use itertools::izip;

use z2taper_pauli::pauli::words_for;
use z2taper_pauli::PauliSum;

use crate::error::TaperError;
use crate::symmetry::{MolecularMetadata, Z2Symmetries};

/// An operator tapered into one symmetry sector.
///
/// The sector records the ±1 eigenvalue chosen for each symmetry generator, in discovery order;
/// its length is the number of qubits removed from the original register.
#[derive(Clone, Debug, PartialEq)]
pub struct TaperedOperator {
    operator: PauliSum,
    sector: Vec<i8>,
    metadata: Option<MolecularMetadata>,
}

impl TaperedOperator {
    /// Bundle an already-reduced operator with its sector.
    pub fn new(operator: PauliSum, sector: Vec<i8>) -> Self {
        Self {
            operator,
            sector,
            metadata: None,
        }
    }

    /// The reduced operator.
    #[inline]
    pub fn operator(&self) -> &PauliSum {
        &self.operator
    }

    /// Take ownership of the reduced operator, discarding the sector bookkeeping.
    pub fn into_operator(self) -> PauliSum {
        self.operator
    }

    /// The ±1 eigenvalue chosen for each symmetry generator.
    #[inline]
    pub fn sector(&self) -> &[i8] {
        &self.sector
    }

    /// The number of qubits of the reduced operator.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.operator.num_qubits()
    }

    /// Problem metadata inherited from the symmetries that produced this operator.
    #[inline]
    pub fn metadata(&self) -> Option<&MolecularMetadata> {
        self.metadata.as_ref()
    }
}

impl Z2Symmetries {
    fn check_width(&self, operator: &PauliSum) -> Result<(), TaperError> {
        if operator.num_qubits() != self.num_qubits() {
            return Err(TaperError::MismatchedQubits {
                operator: operator.num_qubits(),
                expected: self.num_qubits(),
            });
        }
        Ok(())
    }

    fn validate_sector(&self, sector: &[i8]) -> Result<(), TaperError> {
        if sector.len() != self.num_symmetries() {
            return Err(TaperError::SectorLength {
                len: sector.len(),
                expected: self.num_symmetries(),
            });
        }
        for (index, &value) in sector.iter().enumerate() {
            if value != 1 && value != -1 {
                return Err(TaperError::SectorValue { value, index });
            }
        }
        Ok(())
    }

    /// Conjugate an operator by every Clifford rotation, in discovery order.
    ///
    /// For an operator that commutes with all the symmetries this leaves every designated qubit
    /// with only `I` and `X` components.  The operator does not have to be symmetric, though:
    /// the same rotations can be applied to observables or states that are being carried along
    /// with the tapered problem.
    pub fn apply_cliffords(&self, operator: &PauliSum) -> Result<PauliSum, TaperError> {
        self.check_width(operator)?;
        let mut rotated = operator.canonicalize(0.0);
        for clifford in self.cliffords() {
            rotated = clifford.conjugate(&rotated)?;
        }
        Ok(rotated)
    }

    /// Taper an operator into the given symmetry sector.
    ///
    /// The sector must assign ±1 to every symmetry, in the [Z2Symmetries::generators] order.
    pub fn taper(&self, operator: &PauliSum, sector: &[i8]) -> Result<TaperedOperator, TaperError> {
        self.validate_sector(sector)?;
        let rotated = self.apply_cliffords(operator)?;
        self.substitute(&rotated, sector)
    }

    /// Taper an operator into every one of the `2^k` symmetry sectors.
    ///
    /// The Clifford rotations are applied once and shared across the sector substitutions.  The
    /// output is ordered lexicographically with `+1` before `-1`, so the first entry is the
    /// all-`+1` sector and the last the all-`-1` one.  With no symmetries the output is a single
    /// entry holding the empty sector and a canonicalized copy of the operator.
    pub fn taper_all(&self, operator: &PauliSum) -> Result<Vec<TaperedOperator>, TaperError> {
        let rotated = self.apply_cliffords(operator)?;
        let k = self.num_symmetries();
        let mut out = Vec::with_capacity(1 << k);
        for index in 0..1usize << k {
            let sector: Vec<i8> = (0..k)
                .map(|j| if (index >> (k - 1 - j)) & 1 == 0 { 1 } else { -1 })
                .collect();
            out.push(self.substitute(&rotated, &sector)?);
        }
        Ok(out)
    }

    /// Fix the sector eigenvalues and delete the designated qubits from a rotated operator.
    fn substitute(&self, rotated: &PauliSum, sector: &[i8]) -> Result<TaperedOperator, TaperError> {
        let num_qubits = self.num_qubits();
        let sq_qubits = self.sq_qubits();
        let reduced_qubits = num_qubits - sq_qubits.len() as u32;
        let mut symmetry_of: Vec<Option<usize>> = vec![None; num_qubits as usize];
        for (i, &qubit) in sq_qubits.iter().enumerate() {
            symmetry_of[qubit as usize] = Some(i);
        }
        // Surviving qubits keep their relative order in the reduced register.
        let keep: Vec<u32> = (0..num_qubits)
            .filter(|&qubit| symmetry_of[qubit as usize].is_none())
            .collect();
        let stride = words_for(reduced_qubits);
        let mut coeffs = Vec::with_capacity(rotated.num_terms());
        let mut z = Vec::with_capacity(rotated.num_terms() * stride);
        let mut x = Vec::with_capacity(rotated.num_terms() * stride);
        for term in rotated.iter() {
            let mut coeff = term.coeff();
            for (&qubit, &eigenvalue) in izip!(sq_qubits, sector) {
                if term.z_bit(qubit) {
                    return Err(TaperError::NonDiagonalResidual {
                        qubit,
                        label: term.to_pauli_string().to_label(),
                    });
                }
                if term.x_bit(qubit) {
                    coeff *= f64::from(eigenvalue);
                }
            }
            let mut term_z = vec![0u64; stride];
            let mut term_x = vec![0u64; stride];
            for (new, &old) in keep.iter().enumerate() {
                if term.z_bit(old) {
                    term_z[new / 64] |= 1 << (new % 64);
                }
                if term.x_bit(old) {
                    term_x[new / 64] |= 1 << (new % 64);
                }
            }
            coeffs.push(coeff);
            z.extend_from_slice(&term_z);
            x.extend_from_slice(&term_x);
        }
        // SAFETY: every term contributed exactly `stride` words, and bits were only set at
        // positions below the reduced register width.
        let reduced = unsafe { PauliSum::new_unchecked(reduced_qubits, coeffs, z, x) };
        Ok(TaperedOperator {
            operator: reduced.canonicalize(0.0),
            sector: sector.to_vec(),
            metadata: self.metadata().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z2taper_pauli::util::{c64, ONE};

    use crate::test::{h2_sto3g, transverse_field_ising, two_qubit_parity_model};

    fn labeled(tapered: &TaperedOperator) -> Vec<(String, f64)> {
        tapered
            .operator()
            .iter()
            .map(|term| (term.to_pauli_string().to_label(), term.coeff().re))
            .collect()
    }

    #[test]
    fn parity_model_sectors() {
        // H = 0.5 Z0 + 0.25 Z1 + 0.3 Z0Z1 + 0.7 X0X1 with the symmetry Z0Z1 on qubit 0.
        // Rotating and substituting qubit 0 by the eigenvalue e leaves
        // (0.5 e + 0.25) Z + 0.3 e I + 0.7 e X on the surviving qubit.
        let operator = two_qubit_parity_model();
        let symmetries = Z2Symmetries::find(&operator).unwrap();
        let plus = symmetries.taper(&operator, &[1]).unwrap();
        assert_eq!(plus.num_qubits(), 1);
        assert_eq!(plus.sector(), &[1]);
        assert_eq!(
            labeled(&plus),
            [
                ("I".to_owned(), 0.3),
                ("X".to_owned(), 0.7),
                ("Z".to_owned(), 0.75),
            ]
        );
        let minus = symmetries.taper(&operator, &[-1]).unwrap();
        assert_eq!(
            labeled(&minus),
            [
                ("I".to_owned(), -0.3),
                ("X".to_owned(), -0.7),
                ("Z".to_owned(), -0.25),
            ]
        );
    }

    #[test]
    fn cliffords_map_each_generator_to_its_partner() {
        // Generator i commutes with both halves of every other rotation, so the full sequence
        // reduces it to exactly its own partner, with no residual phase.
        let symmetries = Z2Symmetries::find(&h2_sto3g()).unwrap();
        let partners = symmetries.sq_paulis();
        for (index, generator) in symmetries.generators().iter().enumerate() {
            let mut single = PauliSum::zero(symmetries.num_qubits());
            single.add_term(generator, ONE).unwrap();
            let rotated = symmetries.apply_cliffords(&single).unwrap();
            assert_eq!(rotated.num_terms(), 1);
            assert_eq!(rotated.term(0).to_pauli_string(), partners[index]);
            assert_eq!(rotated.term(0).coeff(), ONE);
        }
    }

    #[test]
    fn bulk_tapering_orders_sectors_lexicographically() {
        let operator = h2_sto3g();
        let symmetries = Z2Symmetries::find(&operator).unwrap();
        let tapered = symmetries.taper_all(&operator).unwrap();
        assert_eq!(tapered.len(), 8);
        assert_eq!(tapered[0].sector(), &[1, 1, 1]);
        assert_eq!(tapered[3].sector(), &[1, -1, -1]);
        assert_eq!(tapered[7].sector(), &[-1, -1, -1]);
        for entry in &tapered {
            assert_eq!(entry.num_qubits(), 1);
        }
    }

    #[test]
    fn bulk_tapering_matches_single_sector_calls() {
        let operator = h2_sto3g();
        let symmetries = Z2Symmetries::find(&operator).unwrap();
        let tapered = symmetries.taper_all(&operator).unwrap();
        for entry in &tapered {
            let single = symmetries.taper(&operator, entry.sector()).unwrap();
            assert_eq!(&single, entry);
        }
    }

    #[test]
    fn sectors_are_validated_before_any_work() {
        let operator = two_qubit_parity_model();
        let symmetries = Z2Symmetries::find(&operator).unwrap();
        assert!(matches!(
            symmetries.taper(&operator, &[1, 1]),
            Err(TaperError::SectorLength { len: 2, expected: 1 })
        ));
        assert!(matches!(
            symmetries.taper(&operator, &[0]),
            Err(TaperError::SectorValue { value: 0, index: 0 })
        ));
    }

    #[test]
    fn width_mismatches_are_rejected() {
        let symmetries = Z2Symmetries::find(&h2_sto3g()).unwrap();
        assert!(matches!(
            symmetries.taper_all(&two_qubit_parity_model()),
            Err(TaperError::MismatchedQubits { operator: 2, expected: 4 })
        ));
    }

    #[test]
    fn asymmetric_terms_surface_the_residual() {
        // Y0 anticommutes with both halves of the rotation, so conjugation leaves its Z
        // component on the designated qubit in place.
        let symmetries = Z2Symmetries::find(&two_qubit_parity_model()).unwrap();
        let mut stray = PauliSum::zero(2);
        stray.add_label("IY", c64(1, 0)).unwrap();
        assert!(matches!(
            symmetries.taper(&stray, &[1]),
            Err(TaperError::NonDiagonalResidual { qubit: 0, .. })
        ));
    }

    #[test]
    fn no_symmetries_means_tapering_is_a_copy() {
        let operator = transverse_field_ising();
        let symmetries = Z2Symmetries::find(&operator).unwrap();
        let tapered = symmetries.taper_all(&operator).unwrap();
        assert_eq!(tapered.len(), 1);
        assert!(tapered[0].sector().is_empty());
        assert_eq!(tapered[0].num_qubits(), 3);
        assert_eq!(*tapered[0].operator(), operator.canonicalize(0.0));
    }

    #[test]
    fn metadata_flows_into_tapered_operators() {
        let operator = h2_sto3g();
        let metadata = MolecularMetadata {
            num_spatial_orbitals: 2,
            num_alpha: 1,
            num_beta: 1,
        };
        let symmetries = Z2Symmetries::find(&operator)
            .unwrap()
            .with_metadata(metadata.clone());
        let tapered = symmetries.taper(&operator, &[1, -1, 1]).unwrap();
        assert_eq!(tapered.metadata(), Some(&metadata));
        let bare = TaperedOperator::new(PauliSum::identity(1), vec![1]);
        assert_eq!(bare.metadata(), None);
        assert_eq!(bare.sector(), &[1]);
        assert_eq!(bare.into_operator(), PauliSum::identity(1));
    }
}
