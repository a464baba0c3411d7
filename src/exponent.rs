//! Diffusion exponents: the least power of a mixing matrix with no zero
//! entry, globally or within a column range.

use core::ops::Range;

use tracing::{debug, trace};

use crate::error::{ConfigError, Error, Result};
use crate::matrix::BitMatrix;

/// Endless iterator over `M, M², M³, …`, each power already saturated.
///
/// Every call to [`powers_of`] starts a fresh sequence.
#[derive(Clone, Debug)]
pub struct Powers {
    base: BitMatrix,
    current: Option<BitMatrix>,
}

/// Powers of `matrix`, starting with the first. `matrix` must be square.
pub fn powers_of(matrix: &BitMatrix) -> Result<Powers> {
    if !matrix.is_square() {
        return Err(Error::NotSquare {
            rows: matrix.rows(),
            cols: matrix.cols(),
        });
    }
    Ok(Powers {
        base: matrix.clone(),
        current: None,
    })
}

impl Iterator for Powers {
    type Item = BitMatrix;

    fn next(&mut self) -> Option<BitMatrix> {
        let next = match &self.current {
            None => self.base.clone(),
            Some(prev) => prev * &self.base,
        };
        self.current = Some(next.clone());
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Every output bit depends on every input bit.
pub fn full_mixing(matrix: &BitMatrix) -> bool {
    matrix.is_all_ones()
}

/// Every output bit in `cols` depends on every input bit.
pub fn local_full_mixing(matrix: &BitMatrix, cols: Range<usize>) -> Result<bool> {
    check_columns(matrix, &cols)?;
    Ok(matrix.columns_all_ones(cols))
}

/// 1‑based index of the first power of `matrix` with full mixing, looking
/// at powers `1..=max_rounds`. `None` if there is none.
pub fn exponent(matrix: &BitMatrix, max_rounds: usize) -> Result<Option<usize>> {
    search(matrix, max_rounds, full_mixing)
}

/// As [`exponent`], with full mixing required only across `cols`.
pub fn local_exponent(
    matrix: &BitMatrix,
    max_rounds: usize,
    cols: Range<usize>,
) -> Result<Option<usize>> {
    check_columns(matrix, &cols)?;
    search(matrix, max_rounds, |m| m.columns_all_ones(cols.clone()))
}

fn check_columns(matrix: &BitMatrix, cols: &Range<usize>) -> Result<()> {
    if cols.start > cols.end || cols.end > matrix.cols() {
        return Err(ConfigError::ColumnRange {
            start: cols.start,
            end: cols.end,
            cols: matrix.cols(),
        }
        .into());
    }
    Ok(())
}

fn search(
    matrix: &BitMatrix,
    max_rounds: usize,
    mixed: impl Fn(&BitMatrix) -> bool,
) -> Result<Option<usize>> {
    for (round, power) in (1..=max_rounds).zip(powers_of(matrix)?) {
        trace!(round, ones = power.count_ones(), "matrix power");
        if mixed(&power) {
            debug!(round, size = matrix.rows(), "full mixing reached");
            return Ok(Some(round));
        }
    }
    debug!(max_rounds, size = matrix.rows(), "no full mixing within bound");
    Ok(None)
}
