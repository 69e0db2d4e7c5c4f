// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use num_complex::{Complex, Complex64};

/// Create a new [`Complex<f64>`] with arguments that can convert [`Into<f64>`].
///
/// This allows calls like `c64(half_theta.cos(), 0)` that mix `f64` and integer arguments.
#[inline]
pub fn c64<T: Into<f64>, V: Into<f64>>(re: T, im: V) -> Complex64 {
    Complex::new(re.into(), im.into())
}

pub const ZERO: Complex64 = Complex64::new(0., 0.);
pub const ONE: Complex64 = Complex64::new(1., 0.);
pub const M_ONE: Complex64 = Complex64::new(-1., 0.);
pub const IM: Complex64 = Complex64::new(0., 1.);
pub const M_IM: Complex64 = Complex64::new(0., -1.);

/// The powers of the imaginary unit, indexed by exponent modulo 4.
///
/// Multiplying by `POWERS_OF_I[k & 3]` applies the phase `i^k` reported by
/// [crate::PauliString::compose].
pub const POWERS_OF_I: [Complex64; 4] = [ONE, IM, M_ONE, M_IM];
