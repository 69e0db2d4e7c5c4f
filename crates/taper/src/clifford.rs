// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use std::f64::consts::FRAC_1_SQRT_2;

use z2taper_pauli::util::{c64, POWERS_OF_I};
use z2taper_pauli::{Pauli, PauliString, PauliSum};

use crate::error::TaperError;

/// The Clifford rotation pairing a symmetry generator with its designated qubit.
///
/// The rotation is the Hermitian unitary $U = (g + X_q) / \sqrt 2$, where $g$ is the generator
/// and $q$ the designated qubit.  It is well defined whenever $g$ anticommutes with $X_q$, which
/// holds exactly when $g$ has a Z component on $q$; the constructor rejects anything else.
/// Conjugating by $U$ exchanges $g$ and $X_q$, turning a symmetry of an operator into a purely
/// local degree of freedom on $q$.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliffordRotation {
    generator: PauliString,
    qubit: u32,
}

impl CliffordRotation {
    /// Pair a generator with its designated qubit.
    pub fn new(generator: PauliString, qubit: u32) -> Result<Self, TaperError> {
        if qubit >= generator.num_qubits() || !generator.z_bit(qubit) {
            return Err(TaperError::IncompatibleRotation {
                label: generator.to_label(),
                qubit,
            });
        }
        Ok(Self { generator, qubit })
    }

    /// The symmetry generator half of the rotation.
    #[inline]
    pub fn generator(&self) -> &PauliString {
        &self.generator
    }

    /// The designated qubit.
    #[inline]
    pub fn qubit(&self) -> u32 {
        self.qubit
    }

    /// The single-qubit X operator that the generator is exchanged with.
    pub fn sq_pauli(&self) -> PauliString {
        // The constructor checked the qubit index against the register width.
        PauliString::single(self.generator.num_qubits(), self.qubit, Pauli::X).unwrap()
    }

    /// The rotation as a two-term operator, $(g + X_q) / \sqrt 2$.
    pub fn to_operator(&self) -> PauliSum {
        let mut out = PauliSum::with_capacity(self.generator.num_qubits(), 2);
        let coeff = c64(FRAC_1_SQRT_2, 0);
        // Both terms share the generator's register width.
        out.add_term(&self.generator, coeff).unwrap();
        out.add_term(&self.sq_pauli(), coeff).unwrap();
        out
    }

    /// Conjugate an operator by the rotation, term by term.
    ///
    /// Writing $U = (g + s)/\sqrt 2$ with $s = X_q$, the expansion of $U P U$ collapses to one
    /// output string per input term, keyed on whether $P$ anticommutes with each half:
    ///
    /// * commutes with both: $P$ is untouched;
    /// * anticommutes with both: $P$ flips sign;
    /// * anticommutes with exactly one: the string becomes $P g s$, negated when the
    ///   anticommuting half is $g$.
    ///
    /// The result is returned in canonical form.
    pub fn conjugate(&self, operator: &PauliSum) -> Result<PauliSum, TaperError> {
        let num_qubits = self.generator.num_qubits();
        if operator.num_qubits() != num_qubits {
            return Err(TaperError::MismatchedQubits {
                operator: operator.num_qubits(),
                expected: num_qubits,
            });
        }
        let partner = self.sq_pauli();
        let mut out = PauliSum::with_capacity(num_qubits, operator.num_terms());
        for term in operator.iter() {
            let string = term.to_pauli_string();
            let anti_generator = !string.commutes_with(&self.generator)?;
            // X on the designated qubit anticommutes with exactly the terms that have a Z
            // component there.
            let anti_partner = term.z_bit(self.qubit);
            if anti_generator == anti_partner {
                let coeff = if anti_generator {
                    -term.coeff()
                } else {
                    term.coeff()
                };
                out.add_term(&string, coeff)?;
                continue;
            }
            let (with_generator, phase_left) = string.compose(&self.generator)?;
            let (product, phase_right) = with_generator.compose(&partner)?;
            let mut coeff = term.coeff() * POWERS_OF_I[((phase_left + phase_right) & 3) as usize];
            if anti_generator {
                coeff = -coeff;
            }
            out.add_term(&product, coeff)?;
        }
        Ok(out.canonicalize(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;
    use z2taper_pauli::util::ONE;

    fn rotation(label: &str, qubit: u32) -> CliffordRotation {
        CliffordRotation::new(PauliString::from_label(label).unwrap(), qubit).unwrap()
    }

    fn op(labels: &[(&str, f64)]) -> PauliSum {
        PauliSum::from_labels(labels.iter().map(|&(label, re)| (label, c64(re, 0)))).unwrap()
    }

    #[test]
    fn constructor_needs_a_z_component() {
        assert!(CliffordRotation::new(PauliString::from_label("ZZ").unwrap(), 0).is_ok());
        assert!(matches!(
            CliffordRotation::new(PauliString::from_label("ZX").unwrap(), 0),
            Err(TaperError::IncompatibleRotation { qubit: 0, .. })
        ));
        assert!(matches!(
            CliffordRotation::new(PauliString::from_label("ZZ").unwrap(), 5),
            Err(TaperError::IncompatibleRotation { qubit: 5, .. })
        ));
    }

    #[test]
    fn rotation_operator_has_two_terms() {
        let rotation = rotation("ZZ", 0);
        let operator = rotation.to_operator();
        assert_eq!(operator.num_terms(), 2);
        assert_eq!(rotation.sq_pauli().to_label(), "IX");
        assert_abs_diff_eq!(operator.coefficient_norm_sqr(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn conjugation_exchanges_generator_and_partner() {
        let rotation = rotation("ZZ", 0);
        let as_generator = rotation.conjugate(&op(&[("ZZ", 1.0)])).unwrap();
        assert_eq!(as_generator.num_terms(), 1);
        assert_eq!(as_generator.term(0).to_pauli_string().to_label(), "IX");
        assert_eq!(as_generator.term(0).coeff(), ONE);
        let as_partner = rotation.conjugate(&op(&[("IX", 1.0)])).unwrap();
        assert_eq!(as_partner.num_terms(), 1);
        assert_eq!(as_partner.term(0).to_pauli_string().to_label(), "ZZ");
        assert_eq!(as_partner.term(0).coeff(), ONE);
    }

    #[test]
    fn conjugation_of_an_ising_style_sum() {
        // Z0, Z1, Z0Z1 and X0X1 all commute with the symmetry Z0Z1.  Conjugation leaves the
        // terms that also commute with X0 alone and strips the Z component off qubit 0 of the
        // rest, moving it into an X component.
        let rotation = rotation("ZZ", 0);
        let transformed = rotation
            .conjugate(&op(&[("IZ", 0.5), ("ZI", 0.25), ("ZZ", 0.3), ("XX", 0.7)]))
            .unwrap();
        let expected: Vec<(String, f64)> = vec![
            ("IX".to_owned(), 0.3),
            ("XX".to_owned(), 0.7),
            ("ZI".to_owned(), 0.25),
            ("ZX".to_owned(), 0.5),
        ];
        let seen: Vec<(String, f64)> = transformed
            .iter()
            .map(|term| (term.to_pauli_string().to_label(), term.coeff().re))
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn doubly_anticommuting_terms_flip_sign() {
        let rotation = rotation("ZZ", 0);
        let flipped = rotation.conjugate(&op(&[("IY", 1.0)])).unwrap();
        assert_eq!(flipped.term(0).to_pauli_string().to_label(), "IY");
        assert_eq!(flipped.term(0).coeff(), -ONE);
    }

    #[test]
    fn conjugation_is_an_involution() {
        let rotation = rotation("ZZY", 0);
        let operator = op(&[
            ("IIZ", 0.5),
            ("ZIZ", 0.25),
            ("XYZ", -0.75),
            ("IYI", 1.5),
            ("YXX", 0.125),
        ]);
        let once = rotation.conjugate(&operator).unwrap();
        let twice = rotation.conjugate(&once).unwrap();
        assert_eq!(twice, operator.canonicalize(0.0));
    }

    #[test]
    fn conjugation_preserves_the_coefficient_norm() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let alphabet = ['I', 'X', 'Y', 'Z'];
        let mut operator = PauliSum::with_capacity(4, 20);
        for _ in 0..20 {
            let label: String = (0..4).map(|_| alphabet[rng.gen_range(0..4)]).collect();
            operator
                .add_label(&label, c64(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
                .unwrap();
        }
        let operator = operator.canonicalize(0.0);
        let rotated = rotation("IZZY", 1).conjugate(&operator).unwrap();
        assert_abs_diff_eq!(
            rotated.coefficient_norm_sqr(),
            operator.coefficient_norm_sqr(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn conjugation_checks_the_register_width() {
        assert!(matches!(
            rotation("ZZ", 0).conjugate(&op(&[("ZZZ", 1.0)])),
            Err(TaperError::MismatchedQubits { operator: 3, expected: 2 })
        ));
    }
}
