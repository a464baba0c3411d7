//! Bit‑packed boolean matrices.
//!
//! Entry `(i, j)` set means output bit `j` may depend on input bit `i`.
//! Every entry is 0 or 1 by construction: sums are ORs and products are
//! computed in the boolean semiring, so a product is already saturated
//! when it is produced and path counts never appear.

use core::fmt;
use core::ops::{Mul, Range};

use crate::error::{ConfigError, Result};

const WORD: usize = 64;

/// Row‑major boolean matrix, each row packed into `u64` words.
///
/// Bits past `cols` in the last word of a row are always zero.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    stride: usize,
    words: Vec<u64>,
}

impl BitMatrix {
    /// All‑zero `rows × cols` matrix.
    pub fn zero(rows: usize, cols: usize) -> Self {
        let stride = (cols + WORD - 1) / WORD;
        Self {
            rows,
            cols,
            stride,
            words: vec![0; rows * stride],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut m = Self::zero(size, size);
        for i in 0..size {
            m.set(i, i, true);
        }
        m
    }

    /// All‑ones `rows × cols` matrix.
    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |_, _| true)
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut m = Self::zero(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                if f(i, j) {
                    m.set(i, j, true);
                }
            }
        }
        m
    }

    /// Saturating import of a row‑major matrix of non‑negative counts:
    /// every positive entry becomes 1. Fails unless there are exactly
    /// `rows * cols` entries.
    pub fn saturate(rows: usize, cols: usize, entries: &[u64]) -> Result<Self> {
        if rows.checked_mul(cols) != Some(entries.len()) {
            return Err(ConfigError::EntryCount {
                rows,
                cols,
                entries: entries.len(),
            }
            .into());
        }
        Ok(Self::from_fn(rows, cols, |i, j| entries[i * cols + j] > 0))
    }

    /// Row‑major 0/1 entries.
    pub fn entries(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.push(self.get(i, j) as u64);
            }
        }
        out
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        (self.words[i * self.stride + j / WORD] >> (j % WORD)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        let word = &mut self.words[i * self.stride + j / WORD];
        let bit = 1u64 << (j % WORD);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    #[inline]
    fn row(&self, i: usize) -> &[u64] {
        &self.words[i * self.stride..(i + 1) * self.stride]
    }

    /// Number of set entries.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// `true` iff no entry is zero.
    pub fn is_all_ones(&self) -> bool {
        self.columns_all_ones(0..self.cols)
    }

    /// `true` iff every row is set across `cols`.
    ///
    /// # Panics
    /// If the range ends past the last column.
    pub fn columns_all_ones(&self, cols: Range<usize>) -> bool {
        assert!(cols.end <= self.cols, "column range {cols:?} out of bounds");
        if cols.is_empty() {
            return true;
        }
        let first = cols.start / WORD;
        let last = (cols.end - 1) / WORD;
        let mut masks = Vec::with_capacity(last - first + 1);
        for w in first..=last {
            let lo = if w == first { cols.start % WORD } else { 0 };
            let hi = if w == last { (cols.end - 1) % WORD } else { WORD - 1 };
            let span = hi - lo + 1;
            let mask = if span == WORD { u64::MAX } else { ((1u64 << span) - 1) << lo };
            masks.push((w, mask));
        }
        (0..self.rows).all(|i| {
            let row = self.row(i);
            masks.iter().all(|&(w, mask)| row[w] & mask == mask)
        })
    }

    /// Entry‑wise OR.
    ///
    /// # Panics
    /// If the shapes differ.
    pub fn or(&self, rhs: &Self) -> Self {
        assert_eq!((self.rows, self.cols), (rhs.rows, rhs.cols), "shape mismatch");
        let mut out = self.clone();
        for (a, b) in out.words.iter_mut().zip(&rhs.words) {
            *a |= b;
        }
        out
    }

    /// Column `j` becomes column `cols - 1 - j`.
    pub fn reverse_columns(&self) -> Self {
        let cols = self.cols;
        Self::from_fn(self.rows, cols, |i, j| self.get(i, cols - 1 - j))
    }

    /// Copy of the `rows × cols` block whose top-left corner is `(row, col)`.
    pub fn block(&self, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |i, j| self.get(row + i, col + j))
    }

    /// Overwrites the block at `(row, col)` with `block`.
    ///
    /// # Panics
    /// If `block` does not fit.
    pub fn put_block(&mut self, row: usize, col: usize, block: &Self) {
        assert!(
            row + block.rows <= self.rows && col + block.cols <= self.cols,
            "block does not fit at ({row}, {col})"
        );
        for i in 0..block.rows {
            for j in 0..block.cols {
                self.set(row + i, col + j, block.get(i, j));
            }
        }
    }

    /// Boolean product `self · rhs`.
    ///
    /// # Panics
    /// If `self.cols() != rhs.rows()`.
    pub fn boolean_mul(&self, rhs: &Self) -> Self {
        assert_eq!(self.cols, rhs.rows, "inner dimensions differ");
        let mut out = Self::zero(self.rows, rhs.cols);
        for i in 0..self.rows {
            let dst = i * out.stride;
            for k in 0..self.cols {
                if !self.get(i, k) {
                    continue;
                }
                for (d, s) in out.words[dst..dst + out.stride].iter_mut().zip(rhs.row(k)) {
                    *d |= s;
                }
            }
        }
        out
    }
}

impl Mul for &BitMatrix {
    type Output = BitMatrix;

    fn mul(self, rhs: &BitMatrix) -> BitMatrix {
        self.boolean_mul(rhs)
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                if j > 0 {
                    f.write_str(" ")?;
                }
                f.write_str(if self.get(i, j) { "1" } else { "0" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitMatrix {}x{}\n{}", self.rows, self.cols, self)
    }
}
