// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! Dense GF(2) linear algebra on bit-packed rows.

/// A binary matrix stored as flat `u64` words, one fixed stride of words per row, bit `c % 64` of
/// word `c / 64` being column `c`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMatrix {
    ncols: usize,
    nrows: usize,
    stride: usize,
    rows: Vec<u64>,
}

impl BinaryMatrix {
    /// An empty matrix with the given number of columns.
    pub fn new(ncols: usize) -> Self {
        Self {
            ncols,
            nrows: 0,
            stride: ncols.div_ceil(u64::BITS as usize),
            rows: Vec::new(),
        }
    }

    /// The number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// The number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Append an all-zero row, returning its index.
    pub fn push_empty_row(&mut self) -> usize {
        self.rows.resize(self.rows.len() + self.stride, 0);
        self.nrows += 1;
        self.nrows - 1
    }

    #[inline]
    fn word_bit(col: usize) -> (usize, u32) {
        (col / u64::BITS as usize, (col % u64::BITS as usize) as u32)
    }

    /// Read the bit at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        debug_assert!(col < self.ncols);
        let (word, bit) = Self::word_bit(col);
        (self.rows[row * self.stride + word] >> bit) & 1 == 1
    }

    /// Set the bit at `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize) {
        debug_assert!(col < self.ncols);
        let (word, bit) = Self::word_bit(col);
        self.rows[row * self.stride + word] |= 1 << bit;
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for word in 0..self.stride {
            self.rows.swap(a * self.stride + word, b * self.stride + word);
        }
    }

    fn xor_rows(&mut self, src: usize, dst: usize) {
        debug_assert_ne!(src, dst);
        for word in 0..self.stride {
            let value = self.rows[src * self.stride + word];
            self.rows[dst * self.stride + word] ^= value;
        }
    }

    /// Gauss elimination in place.
    ///
    /// With `full_elim` the pivot columns are cleared above the pivot rows too, leaving the
    /// reduced row echelon form.  Returns the pivot columns in pivot-row order; their count is
    /// the rank.
    pub fn row_reduce(&mut self, full_elim: bool) -> Vec<usize> {
        let nrows = self.nrows();
        let mut pivots = Vec::new();
        let mut rank = 0;
        for col in 0..self.ncols {
            if rank == nrows {
                break;
            }
            let Some(pivot_row) = (rank..nrows).find(|&row| self.get(row, col)) else {
                continue;
            };
            self.swap_rows(rank, pivot_row);
            for row in 0..nrows {
                if row != rank && self.get(row, col) && (full_elim || row > rank) {
                    self.xor_rows(rank, row);
                }
            }
            pivots.push(col);
            rank += 1;
        }
        pivots
    }

    /// The rank of the matrix.
    pub fn rank(&self) -> usize {
        self.clone().row_reduce(false).len()
    }

    /// A basis of the right null space, as packed rows of the same stride as the matrix.
    ///
    /// The basis is a deterministic function of the matrix: one vector per free column of the
    /// reduced row echelon form, in ascending column order, each with a 1 in its free column and
    /// the matching pivot-column entries read off the reduced rows.
    pub fn null_space(&self) -> Vec<Vec<u64>> {
        let mut reduced = self.clone();
        let pivots = reduced.row_reduce(true);
        let mut is_pivot = vec![false; self.ncols];
        for &col in &pivots {
            is_pivot[col] = true;
        }
        let mut basis = Vec::with_capacity(self.ncols - pivots.len());
        for free in 0..self.ncols {
            if is_pivot[free] {
                continue;
            }
            let mut vector = vec![0u64; self.stride];
            let (word, bit) = Self::word_bit(free);
            vector[word] |= 1 << bit;
            for (row, &pivot_col) in pivots.iter().enumerate() {
                if reduced.get(row, free) {
                    let (word, bit) = Self::word_bit(pivot_col);
                    vector[word] |= 1 << bit;
                }
            }
            basis.push(vector);
        }
        basis
    }
}
