// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use std::collections::btree_map;

use num_complex::Complex64;
use thiserror::Error;

use crate::pauli::{tail_mask, words_for, ArithmeticError, LabelError, Pauli, PauliString};
use crate::util::ONE;

/// Error cases stemming from data coherence at the point of entry into [PauliSum] from
/// user-provided arrays.
///
/// These most typically appear during [PauliSum::new], but can also be introduced by remapping
/// arithmetic that rebuilds the packed words.
#[derive(Error, Debug)]
pub enum CoherenceError {
    #[error("`z` ({z}) and `x` ({x}) must be the same length")]
    MismatchedWordCount { z: usize, x: usize },
    #[error("bit words of length {words} do not divide into terms of {stride} words")]
    UnalignedWords { words: usize, stride: usize },
    #[error("`coeffs` ({coeffs}) must match the number of terms in the bit words ({terms})")]
    MismatchedTermCount { coeffs: usize, terms: usize },
    #[error("bit words have set bits at or above the number of qubits")]
    BitIndexTooHigh,
}

/// A sum of weighted multi-qubit Pauli strings.
///
/// # Representation
///
/// Terms are stored in a struct-of-arrays layout: one complex coefficient per term in `coeffs`,
/// and the packed `(z, x)` component words of all terms flattened into `z` and `x`, a fixed
/// stride of `ceil(num_qubits / 64)` words per term.  Within one term the words follow the
/// [PauliString] packing, bit `q` of word `q / 64` being qubit `q`.
///
/// The sum is not automatically kept in any canonical form; terms appear in insertion order and
/// equal strings may repeat.  [PauliSum::canonicalize] produces the deterministic sorted-and-
/// merged form.
///
/// # Data coherence
///
/// * `z` and `x` have equal lengths, a multiple of the term stride;
/// * the number of strides equals `coeffs.len()`;
/// * no term has set bits at or above `num_qubits`.
#[derive(Clone, Debug, PartialEq)]
pub struct PauliSum {
    /// The number of qubits the operator acts on.  This is not inferable from any other shape or
    /// values, since identity sites are not stored explicitly.
    num_qubits: u32,
    /// The coefficient of each term.
    coeffs: Vec<Complex64>,
    /// Flattened packed Z-component words of every term.
    z: Vec<u64>,
    /// Flattened packed X-component words of every term.
    x: Vec<u64>,
}

/// A view object onto a single term of a [PauliSum].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PauliTermView<'a> {
    num_qubits: u32,
    coeff: Complex64,
    z: &'a [u64],
    x: &'a [u64],
}

impl PauliTermView<'_> {
    /// The number of qubits the term is defined on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The coefficient of the term.
    #[inline]
    pub fn coeff(&self) -> Complex64 {
        self.coeff
    }

    /// The packed Z-component words of the term.
    #[inline]
    pub fn z_words(&self) -> &[u64] {
        self.z
    }

    /// The packed X-component words of the term.
    #[inline]
    pub fn x_words(&self) -> &[u64] {
        self.x
    }

    /// Is the Z component set on the given qubit?
    #[inline]
    pub fn z_bit(&self, qubit: u32) -> bool {
        debug_assert!(qubit < self.num_qubits);
        (self.z[(qubit / 64) as usize] >> (qubit % 64)) & 1 == 1
    }

    /// Is the X component set on the given qubit?
    #[inline]
    pub fn x_bit(&self, qubit: u32) -> bool {
        debug_assert!(qubit < self.num_qubits);
        (self.x[(qubit / 64) as usize] >> (qubit % 64)) & 1 == 1
    }

    /// The single-qubit term on the given qubit, or `None` for the identity.
    pub fn pauli(&self, qubit: u32) -> Option<Pauli> {
        let bits = ((self.x_bit(qubit) as u8) << 1) | (self.z_bit(qubit) as u8);
        ::bytemuck::checked::try_cast(bits).ok()
    }

    /// Copy the string content of the view into an owned phase-free [PauliString], discarding
    /// the coefficient.
    pub fn to_pauli_string(&self) -> PauliString {
        // The view borrows from a coherent sum, so the words are coherent too.
        PauliString::from_bits(self.num_qubits, self.z.to_vec(), self.x.to_vec()).unwrap()
    }
}

impl PauliSum {
    /// Create a new Pauli sum from the raw components that make it up.
    ///
    /// This checks the input values for data coherence on entry.  If you are certain you have the
    /// correct values, you can call [PauliSum::new_unchecked] instead.
    pub fn new(
        num_qubits: u32,
        coeffs: Vec<Complex64>,
        z: Vec<u64>,
        x: Vec<u64>,
    ) -> Result<Self, CoherenceError> {
        if z.len() != x.len() {
            return Err(CoherenceError::MismatchedWordCount {
                z: z.len(),
                x: x.len(),
            });
        }
        let stride = words_for(num_qubits);
        if stride == 0 {
            // A zero-qubit operator is a scalar; terms carry no words at all.
            if !z.is_empty() {
                return Err(CoherenceError::UnalignedWords {
                    words: z.len(),
                    stride,
                });
            }
        } else {
            if z.len() % stride != 0 {
                return Err(CoherenceError::UnalignedWords {
                    words: z.len(),
                    stride,
                });
            }
            if z.len() / stride != coeffs.len() {
                return Err(CoherenceError::MismatchedTermCount {
                    coeffs: coeffs.len(),
                    terms: z.len() / stride,
                });
            }
            let mask = tail_mask(num_qubits);
            for words in [&z, &x] {
                for term in words.chunks_exact(stride) {
                    if term[stride - 1] & !mask != 0 {
                        return Err(CoherenceError::BitIndexTooHigh);
                    }
                }
            }
        }
        // SAFETY: we've just done the coherence checks.
        Ok(unsafe { Self::new_unchecked(num_qubits, coeffs, z, x) })
    }

    /// Create a new [PauliSum] from the raw components without checking data coherence.
    ///
    /// # Safety
    ///
    /// It is up to the caller to ensure that the data-coherence requirements, as enumerated in
    /// the struct-level documentation, have been upheld.
    #[inline(always)]
    pub unsafe fn new_unchecked(
        num_qubits: u32,
        coeffs: Vec<Complex64>,
        z: Vec<u64>,
        x: Vec<u64>,
    ) -> Self {
        Self {
            num_qubits,
            coeffs,
            z,
            x,
        }
    }

    /// Get the zero operator on the given number of qubits.
    pub fn zero(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            coeffs: vec![],
            z: vec![],
            x: vec![],
        }
    }

    /// Get the identity operator on the given number of qubits.
    pub fn identity(num_qubits: u32) -> Self {
        let words = words_for(num_qubits);
        Self {
            num_qubits,
            coeffs: vec![ONE],
            z: vec![0; words],
            x: vec![0; words],
        }
    }

    /// Create a zero operator with pre-allocated space for the given number of terms.
    #[inline]
    pub fn with_capacity(num_qubits: u32, num_terms: usize) -> Self {
        let words = words_for(num_qubits);
        Self {
            num_qubits,
            coeffs: Vec::with_capacity(num_terms),
            z: Vec::with_capacity(num_terms * words),
            x: Vec::with_capacity(num_terms * words),
        }
    }

    /// The number of qubits the operator acts on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The number of terms in the sum.
    #[inline]
    pub fn num_terms(&self) -> usize {
        self.coeffs.len()
    }

    /// Whether the sum contains no terms.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// The coefficients of the terms, in insertion order.
    #[inline]
    pub fn coeffs(&self) -> &[Complex64] {
        &self.coeffs
    }

    #[inline]
    fn stride(&self) -> usize {
        words_for(self.num_qubits)
    }

    /// Get a view onto the term at `index`.
    ///
    /// Panics if the index is out of range.
    pub fn term(&self, index: usize) -> PauliTermView<'_> {
        let stride = self.stride();
        PauliTermView {
            num_qubits: self.num_qubits,
            coeff: self.coeffs[index],
            z: &self.z[index * stride..(index + 1) * stride],
            x: &self.x[index * stride..(index + 1) * stride],
        }
    }

    /// Get an iterator over the individual terms of the sum.
    pub fn iter(&'_ self) -> impl ExactSizeIterator<Item = PauliTermView<'_>> + '_ {
        (0..self.coeffs.len()).map(|index| self.term(index))
    }

    /// Add a weighted string to the sum.
    pub fn add_term(
        &mut self,
        string: &PauliString,
        coeff: Complex64,
    ) -> Result<(), ArithmeticError> {
        if string.num_qubits() != self.num_qubits {
            return Err(ArithmeticError::MismatchedQubits {
                left: self.num_qubits,
                right: string.num_qubits(),
            });
        }
        self.coeffs.push(coeff);
        self.z.extend_from_slice(string.z_words());
        self.x.extend_from_slice(string.x_words());
        Ok(())
    }

    /// Add a term from a dense string label.
    ///
    /// The label must be exactly as long as the number of qubits; qubit 0 is the rightmost
    /// character.
    pub fn add_label(&mut self, label: &str, coeff: Complex64) -> Result<(), LabelError> {
        if label.len() != self.num_qubits as usize {
            return Err(LabelError::WrongLengthDense {
                num_qubits: self.num_qubits,
                label: label.len(),
            });
        }
        let string = PauliString::from_label(label)?;
        self.coeffs.push(coeff);
        self.z.extend_from_slice(string.z_words());
        self.x.extend_from_slice(string.x_words());
        Ok(())
    }

    /// Build a sum from `(label, coefficient)` pairs.  The first label fixes the number of
    /// qubits; an empty iterator produces the zero operator on zero qubits.
    pub fn from_labels<'a, I>(iter: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = (&'a str, Complex64)>,
    {
        let mut iter = iter.into_iter();
        let Some((first, coeff)) = iter.next() else {
            return Ok(Self::zero(0));
        };
        let mut out = Self::with_capacity(first.len() as u32, iter.size_hint().0 + 1);
        out.add_label(first, coeff)?;
        for (label, coeff) in iter {
            out.add_label(label, coeff)?;
        }
        Ok(out)
    }

    /// Reduce the sum to its canonical form.
    ///
    /// This sums duplicate strings, removes resulting terms whose absolute value of the
    /// coefficient is at most `tol`, and returns the surviving terms sorted by their packed bit
    /// patterns.  The output order is a deterministic function of the term set alone.
    pub fn canonicalize(&self, tol: f64) -> PauliSum {
        let stride = self.stride();
        let mut terms = btree_map::BTreeMap::new();
        for index in 0..self.coeffs.len() {
            let z = &self.z[index * stride..(index + 1) * stride];
            let x = &self.x[index * stride..(index + 1) * stride];
            terms
                .entry((z, x))
                .and_modify(|c| *c += self.coeffs[index])
                .or_insert(self.coeffs[index]);
        }
        let mut out = PauliSum::zero(self.num_qubits);
        for ((z, x), coeff) in terms {
            if coeff.norm_sqr() <= tol * tol {
                continue;
            }
            out.coeffs.push(coeff);
            out.z.extend_from_slice(z);
            out.x.extend_from_slice(x);
        }
        out
    }

    /// The sum of `self` and `other` as a new operator.
    ///
    /// Terms are concatenated without merging; use [PauliSum::canonicalize] to combine
    /// duplicates.
    pub fn checked_add(&self, other: &PauliSum) -> Result<PauliSum, ArithmeticError> {
        if self.num_qubits != other.num_qubits {
            return Err(ArithmeticError::MismatchedQubits {
                left: self.num_qubits,
                right: other.num_qubits,
            });
        }
        let mut out = self.clone();
        out.coeffs.extend_from_slice(&other.coeffs);
        out.z.extend_from_slice(&other.z);
        out.x.extend_from_slice(&other.x);
        Ok(out)
    }

    /// Multiply every coefficient by a scalar.
    pub fn scale(&self, factor: Complex64) -> PauliSum {
        let mut out = self.clone();
        for coeff in out.coeffs.iter_mut() {
            *coeff *= factor;
        }
        out
    }

    /// The adjoint of the operator.
    ///
    /// Pauli strings are Hermitian, so this conjugates the coefficients and leaves the strings
    /// alone.
    pub fn adjoint(&self) -> PauliSum {
        let mut out = self.clone();
        for coeff in out.coeffs.iter_mut() {
            *coeff = coeff.conj();
        }
        out
    }

    /// The sum of the squared moduli of the coefficients.
    ///
    /// For a canonicalized operator this is the squared Frobenius norm divided by the Hilbert
    /// space dimension, and is invariant under unitary conjugation.
    pub fn coefficient_norm_sqr(&self) -> f64 {
        self.coeffs.iter().map(|coeff| coeff.norm_sqr()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::c64;

    fn op(labels: &[(&str, f64)]) -> PauliSum {
        PauliSum::from_labels(labels.iter().map(|&(label, re)| (label, c64(re, 0))))
            .unwrap()
    }

    #[test]
    fn new_checks_coherence() {
        assert!(PauliSum::new(2, vec![ONE], vec![0b01], vec![0b10]).is_ok());
        assert!(matches!(
            PauliSum::new(2, vec![ONE], vec![0b01], vec![]),
            Err(CoherenceError::MismatchedWordCount { z: 1, x: 0 })
        ));
        assert!(matches!(
            PauliSum::new(2, vec![ONE, ONE], vec![0b01], vec![0b10]),
            Err(CoherenceError::MismatchedTermCount { coeffs: 2, terms: 1 })
        ));
        assert!(matches!(
            PauliSum::new(2, vec![ONE], vec![0b100], vec![0]),
            Err(CoherenceError::BitIndexTooHigh)
        ));
        // Zero-qubit scalars have no words at all.
        assert!(PauliSum::new(0, vec![ONE, ONE], vec![], vec![]).is_ok());
        assert!(matches!(
            PauliSum::new(0, vec![ONE], vec![0], vec![0]),
            Err(CoherenceError::UnalignedWords { words: 1, stride: 0 })
        ));
    }

    #[test]
    fn zero_and_identity() {
        let zero = PauliSum::zero(3);
        assert_eq!(zero.num_terms(), 0);
        assert!(zero.is_empty());
        let identity = PauliSum::identity(3);
        assert_eq!(identity.num_terms(), 1);
        assert_eq!(identity.coeffs(), &[ONE]);
        assert!(identity.term(0).to_pauli_string().is_identity());
    }

    #[test]
    fn add_label_validates() {
        let mut sum = PauliSum::zero(3);
        sum.add_label("IXZ", c64(0.5, 0)).unwrap();
        assert!(matches!(
            sum.add_label("IX", ONE),
            Err(LabelError::WrongLengthDense { num_qubits: 3, label: 2 })
        ));
        assert!(matches!(
            sum.add_label("IXQ", ONE),
            Err(LabelError::OutsideAlphabet)
        ));
        assert_eq!(sum.num_terms(), 1);
        let term = sum.term(0);
        assert_eq!(term.coeff(), c64(0.5, 0));
        assert_eq!(term.pauli(0), Some(Pauli::Z));
        assert_eq!(term.pauli(1), Some(Pauli::X));
        assert_eq!(term.pauli(2), None);
    }

    #[test]
    fn iter_views_match_terms() {
        let sum = op(&[("XX", 1.0), ("ZI", -0.5)]);
        let views: Vec<_> = sum.iter().collect();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].to_pauli_string().to_label(), "XX");
        assert_eq!(views[1].to_pauli_string().to_label(), "ZI");
        assert_eq!(views[1].coeff(), c64(-0.5, 0));
    }

    #[test]
    fn canonicalize_merges_and_sorts() {
        let sum = op(&[("XI", 1.0), ("IX", 2.0), ("XI", 3.0)]);
        let canonical = sum.canonicalize(0.0);
        assert_eq!(canonical.num_terms(), 2);
        // Sorted by packed bit patterns, which puts IX (x bit 0) before XI (x bit 1).
        assert_eq!(canonical.term(0).to_pauli_string().to_label(), "IX");
        assert_eq!(canonical.term(0).coeff(), c64(2, 0));
        assert_eq!(canonical.term(1).to_pauli_string().to_label(), "XI");
        assert_eq!(canonical.term(1).coeff(), c64(4, 0));
    }

    #[test]
    fn canonicalize_drops_cancellations() {
        let sum = op(&[("XY", 1.0), ("XY", -1.0), ("ZZ", 1e-12)]);
        assert_eq!(sum.canonicalize(0.0).num_terms(), 1);
        assert_eq!(sum.canonicalize(1e-9).num_terms(), 0);
    }

    #[test]
    fn canonicalize_is_deterministic() {
        let forward = op(&[("XZ", 0.25), ("ZX", 0.5), ("YY", 0.75)]);
        let backward = op(&[("YY", 0.75), ("ZX", 0.5), ("XZ", 0.25)]);
        assert_eq!(forward.canonicalize(0.0), backward.canonicalize(0.0));
    }

    #[test]
    fn checked_add_concatenates() {
        let left = op(&[("XX", 1.0)]);
        let right = op(&[("ZZ", 2.0)]);
        let total = left.checked_add(&right).unwrap();
        assert_eq!(total.num_terms(), 2);
        assert!(matches!(
            left.checked_add(&op(&[("X", 1.0)])),
            Err(ArithmeticError::MismatchedQubits { left: 2, right: 1 })
        ));
    }

    #[test]
    fn scale_and_adjoint() {
        let sum = op(&[("XY", 2.0)]);
        assert_eq!(sum.scale(c64(0, 1)).coeffs()[0], c64(0, 2));
        let complex = sum.scale(c64(1, 1));
        assert_eq!(complex.adjoint().coeffs()[0], c64(2, -2));
        assert_eq!(complex.coefficient_norm_sqr(), 8.0);
    }

    #[test]
    fn zero_qubit_scalars() {
        let sum = PauliSum::new(0, vec![c64(1, 0), c64(2, 0)], vec![], vec![]).unwrap();
        assert_eq!(sum.num_terms(), 2);
        let canonical = sum.canonicalize(0.0);
        assert_eq!(canonical.num_terms(), 1);
        assert_eq!(canonical.coeffs()[0], c64(3, 0));
    }
}
