// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use itertools::izip;
use thiserror::Error;

/// Named handle to the alphabet of single-qubit Pauli terms.
///
/// # Representation
///
/// The `u8` representation and the exact numerical values of these are part of the public API.
/// The two bits are the symplectic representation of the Pauli operator, with the associations
/// `0b10` <-> `X`, `0b01` <-> `Z`, `0b11` <-> `Y`.  The `0b00` representation thus ends up being
/// the natural representation of the `I` operator, but this is never stored, and is not named in
/// the enumeration.
///
/// This type does not store phase terms of $-i$.  [Pauli::Y] has `(1, 1)` as its `(z, x)`
/// representation, and represents exactly the Pauli Y operator.  Additional phases, if needed,
/// must be stored elsewhere.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pauli {
    /// Pauli X operator.
    X = 0b10,
    /// Pauli Y operator.
    Y = 0b11,
    /// Pauli Z operator.
    Z = 0b01,
}
impl From<Pauli> for u8 {
    fn from(value: Pauli) -> u8 {
        value as u8
    }
}
unsafe impl ::bytemuck::CheckedBitPattern for Pauli {
    type Bits = u8;

    #[inline(always)]
    fn is_valid_bit_pattern(bits: &Self::Bits) -> bool {
        *bits <= 0b11 && *bits != 0
    }
}
unsafe impl ::bytemuck::NoUninit for Pauli {}

impl Pauli {
    /// Get the single-letter label of this `Pauli`.
    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }

    /// Attempt to convert a `u8` into `Pauli`.
    ///
    /// Unlike the implementation of `TryFrom<u8>`, this allows `b'I'` as an alphabet letter,
    /// returning `Ok(None)` for it.  All other letters outside the alphabet return the complete
    /// error condition.
    #[inline]
    pub fn try_from_u8(value: u8) -> Result<Option<Self>, PauliFromU8Error> {
        match value {
            b'I' => Ok(None),
            b'X' => Ok(Some(Pauli::X)),
            b'Y' => Ok(Some(Pauli::Y)),
            b'Z' => Ok(Some(Pauli::Z)),
            _ => Err(PauliFromU8Error(value)),
        }
    }

    /// Does this term include an X component in its ZX representation?
    ///
    /// This is true for X and Y.
    pub fn has_x_component(&self) -> bool {
        ((*self as u8) & (Self::X as u8)) != 0
    }

    /// Does this term include a Z component in its ZX representation?
    ///
    /// This is true for Y and Z.
    pub fn has_z_component(&self) -> bool {
        ((*self as u8) & (Self::Z as u8)) != 0
    }
}

/// The error type for a failed conversion into `Pauli`.
#[derive(Error, Debug)]
#[error("{0} is not a valid letter of the single-qubit alphabet")]
pub struct PauliFromU8Error(pub u8);

// `Pauli` allows safe `as` casting into `u8`.  This is the reverse, which is fallible, because
// `Pauli` is a value-wise subtype of `u8`.
impl ::std::convert::TryFrom<u8> for Pauli {
    type Error = PauliFromU8Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ::bytemuck::checked::try_cast(value).map_err(|_| PauliFromU8Error(value))
    }
}

/// An error related to processing of a string label.
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("label with length {label} cannot be added to a {num_qubits}-qubit operator")]
    WrongLengthDense { num_qubits: u32, label: usize },
    #[error("index {index} is out of range for a {num_qubits}-qubit operator")]
    BadIndex { index: u32, num_qubits: u32 },
    #[error("labels must only contain letters from the alphabet 'IXYZ'")]
    OutsideAlphabet,
}

/// Error cases stemming from data coherence at the point of entry into [PauliString] from raw
/// bit words.
#[derive(Error, Debug)]
pub enum CoherenceError {
    #[error("bit words have {words} entries, but {num_qubits} qubits need {expected}")]
    WrongNumberOfWords {
        words: usize,
        num_qubits: u32,
        expected: usize,
    },
    #[error("bit words have set bits at or above the number of qubits")]
    BitIndexTooHigh,
}

#[derive(Error, Debug)]
pub enum ArithmeticError {
    #[error("mismatched numbers of qubits: {left}, {right}")]
    MismatchedQubits { left: u32, right: u32 },
}

/// Number of `u64` words needed to hold one bit per qubit.
///
/// This is the per-term stride of every packed word vector in the crate.
#[inline]
pub const fn words_for(num_qubits: u32) -> usize {
    (num_qubits as usize).div_ceil(u64::BITS as usize)
}

/// Mask of the valid bits in the final word of a packed bit vector, or all ones if the count is a
/// multiple of the word size.
#[inline]
pub(crate) const fn tail_mask(num_qubits: u32) -> u64 {
    let rem = (num_qubits as usize) % (u64::BITS as usize);
    if rem == 0 {
        u64::MAX
    } else {
        (1u64 << rem) - 1
    }
}

/// A dense multi-qubit Pauli string in packed ZX form.
///
/// Bit `q` of the `z` and `x` words is the corresponding component of the operator on qubit `q`
/// (word `q / 64`, offset `q % 64`), using the same `(z, x)` associations as [Pauli].  The string
/// is phase-free: `Y` on a site means exactly the Pauli Y matrix, and any scalar prefactor from
/// multiplication is reported separately by [PauliString::compose].
///
/// # Data coherence
///
/// Both word vectors have exactly `ceil(num_qubits / 64)` entries and carry no set bits at or
/// above `num_qubits`.  All constructors and arithmetic preserve this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PauliString {
    num_qubits: u32,
    z: Vec<u64>,
    x: Vec<u64>,
}

impl PauliString {
    /// The identity operator on the given number of qubits.
    pub fn identity(num_qubits: u32) -> Self {
        let words = words_for(num_qubits);
        Self {
            num_qubits,
            z: vec![0; words],
            x: vec![0; words],
        }
    }

    /// A single-qubit Pauli operator embedded in a register of `num_qubits`.
    pub fn single(num_qubits: u32, qubit: u32, pauli: Pauli) -> Result<Self, LabelError> {
        if qubit >= num_qubits {
            return Err(LabelError::BadIndex {
                index: qubit,
                num_qubits,
            });
        }
        let mut out = Self::identity(num_qubits);
        let (word, offset) = ((qubit / 64) as usize, qubit % 64);
        if pauli.has_z_component() {
            out.z[word] |= 1 << offset;
        }
        if pauli.has_x_component() {
            out.x[word] |= 1 << offset;
        }
        Ok(out)
    }

    /// Parse a dense string label over the alphabet `IXYZ`.
    ///
    /// Qubit 0 is the rightmost character of the label.
    pub fn from_label(label: &str) -> Result<Self, LabelError> {
        let label: &[u8] = label.as_ref();
        let num_qubits = label.len() as u32;
        let mut out = Self::identity(num_qubits);
        // The only valid characters in the alphabet are ASCII, so if we see something other than
        // ASCII, we're already in the failure path.
        for (i, letter) in label.iter().rev().enumerate() {
            match Pauli::try_from_u8(*letter) {
                Ok(Some(term)) => {
                    let (word, offset) = (i / 64, i % 64);
                    if term.has_z_component() {
                        out.z[word] |= 1 << offset;
                    }
                    if term.has_x_component() {
                        out.x[word] |= 1 << offset;
                    }
                }
                Ok(None) => (),
                Err(_) => {
                    return Err(LabelError::OutsideAlphabet);
                }
            }
        }
        Ok(out)
    }

    /// Create a string from raw packed words.
    ///
    /// This checks the input values for data coherence on entry.
    pub fn from_bits(num_qubits: u32, z: Vec<u64>, x: Vec<u64>) -> Result<Self, CoherenceError> {
        let expected = words_for(num_qubits);
        for words in [&z, &x] {
            if words.len() != expected {
                return Err(CoherenceError::WrongNumberOfWords {
                    words: words.len(),
                    num_qubits,
                    expected,
                });
            }
            if let Some(&last) = words.last() {
                if last & !tail_mask(num_qubits) != 0 {
                    return Err(CoherenceError::BitIndexTooHigh);
                }
            }
        }
        Ok(Self { num_qubits, z, x })
    }

    /// The number of qubits the operator acts on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The packed Z-component words.
    #[inline]
    pub fn z_words(&self) -> &[u64] {
        &self.z
    }

    /// The packed X-component words.
    #[inline]
    pub fn x_words(&self) -> &[u64] {
        &self.x
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

    /// Whether every site is the identity.
    pub fn is_identity(&self) -> bool {
        self.z.iter().all(|&word| word == 0) && self.x.iter().all(|&word| word == 0)
    }

    /// The number of non-identity sites.
    pub fn weight(&self) -> usize {
        izip!(&self.z, &self.x)
            .map(|(z, x)| (z | x).count_ones() as usize)
            .sum()
    }

    /// Render the dense string label, qubit 0 rightmost.
    pub fn to_label(&self) -> String {
        let mut out = String::with_capacity(self.num_qubits as usize);
        for qubit in (0..self.num_qubits).rev() {
            match self.pauli(qubit) {
                None => out.push('I'),
                Some(term) => out.push_str(term.label()),
            }
        }
        out
    }

    #[inline]
    fn check_same_qubits(&self, other: &Self) -> Result<(), ArithmeticError> {
        if self.num_qubits != other.num_qubits {
            return Err(ArithmeticError::MismatchedQubits {
                left: self.num_qubits,
                right: other.num_qubits,
            });
        }
        Ok(())
    }

    /// Whether the two operators commute, by the parity of the symplectic product.
    pub fn commutes_with(&self, other: &Self) -> Result<bool, ArithmeticError> {
        self.check_same_qubits(other)?;
        let mut anti = 0u32;
        for (z1, x1, z2, x2) in izip!(&self.z, &self.x, &other.z, &other.x) {
            anti += (z1 & x2).count_ones() + (x1 & z2).count_ones();
        }
        Ok(anti & 1 == 0)
    }

    /// The operator product `self * other` as a phase-free string and a phase exponent `k`, with
    /// `self * other == i^k * string`.
    ///
    /// The exponent follows from writing each string as `i^(z.x) X^x Z^z`: the Y-count correction
    /// terms account for the per-site phases absorbed into `Y`, and the cross term counts the
    /// `Z X -> i Y` reorderings needed to bring the product back to canonical form.
    pub fn compose(&self, other: &Self) -> Result<(Self, u8), ArithmeticError> {
        self.check_same_qubits(other)?;
        let words = self.z.len();
        let mut z = Vec::with_capacity(words);
        let mut x = Vec::with_capacity(words);
        let mut y_left = 0u32;
        let mut y_right = 0u32;
        let mut y_out = 0u32;
        let mut cross = 0u32;
        for (z1, x1, z2, x2) in izip!(&self.z, &self.x, &other.z, &other.x) {
            let z3 = z1 ^ z2;
            let x3 = x1 ^ x2;
            y_left += (z1 & x1).count_ones();
            y_right += (z2 & x2).count_ones();
            y_out += (z3 & x3).count_ones();
            cross += (z1 & x2).count_ones();
            z.push(z3);
            x.push(x3);
        }
        let phase = (y_left as i64 + y_right as i64 - y_out as i64 + 2 * cross as i64)
            .rem_euclid(4) as u8;
        Ok((
            Self {
                num_qubits: self.num_qubits,
                z,
                x,
            },
            phase,
        ))
    }

    /// Replace `self` with the sign-free product of `self` and `other`, the bitwise XOR of both
    /// component vectors.
    ///
    /// This is the GF(2) row operation used when treating strings as symplectic vectors; the
    /// phase that [PauliString::compose] would report is discarded.
    pub fn xor_with(&mut self, other: &Self) -> Result<(), ArithmeticError> {
        self.check_same_qubits(other)?;
        for (word, &src) in self.z.iter_mut().zip(&other.z) {
            *word ^= src;
        }
        for (word, &src) in self.x.iter_mut().zip(&other.x) {
            *word ^= src;
        }
        Ok(())
    }
}
