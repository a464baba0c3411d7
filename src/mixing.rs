//! Mixing matrices of one register round and of reduced‑round Speck.
//!
//! Rows index input bits, columns index output bits. A register matrix is
//! laid out cell by cell, cell 0 first, `r` bits per cell.
//!
//! The Speck matrix is assembled from four half‑block submatrices and then
//! has its column order reversed; the bottom blocks are formed with the
//! same reversal applied around the product, so every combination below
//! happens in one consistent column convention.

use tracing::trace;

use crate::cipher::{Speck, BLOCK_SIZES};
use crate::error::{ConfigError, Error, Result};
use crate::matrix::BitMatrix;
use crate::register::RegisterShape;

// ---------------------------------------------------------------------------
// Register round
// ---------------------------------------------------------------------------

/// Mixing matrix of one cycle of a register with the given shape, whose
/// modifying transform has the `r × r` matrix `transform`.
///
/// Cell `i + 1` feeds cell `i` through an identity block, and every tap
/// feeds the new top cell through `transform`.
pub fn register_round_matrix(shape: &RegisterShape, transform: &BitMatrix) -> Result<BitMatrix> {
    let (r, n) = (shape.r(), shape.n());
    if transform.rows() != r || transform.cols() != r {
        return Err(Error::DomainMismatch {
            expected: r,
            actual: transform.rows().max(transform.cols()),
        });
    }
    let mut m = BitMatrix::zero(n * r, n * r);
    let shift = BitMatrix::identity(r);
    for i in 0..n - 1 {
        m.put_block((i + 1) * r, i * r, &shift);
    }
    let top = (n - 1) * r;
    for &tap in shape.taps() {
        m.put_block(tap * r, top, transform);
    }
    Ok(m)
}

// ---------------------------------------------------------------------------
// Speck round
// ---------------------------------------------------------------------------

/// Mixing matrix of one unkeyed Speck round on a `block_size`‑bit block.
pub fn cipher_round_matrix(block_size: usize) -> Result<BitMatrix> {
    if !BLOCK_SIZES.contains(&block_size) {
        return Err(ConfigError::BlockSize(block_size).into());
    }
    Ok(speck_round_matrix(&Speck::with_block_size(block_size)?))
}

/// Mixing matrix of `power` unkeyed Speck rounds, `power >= 1`.
pub fn cipher_power_matrix(power: usize, block_size: usize) -> Result<BitMatrix> {
    if power < 1 {
        return Err(ConfigError::Power(power).into());
    }
    Ok(speck_power_matrix(&Speck::with_block_size(block_size)?, power))
}

pub(crate) fn speck_power_matrix(cipher: &Speck, power: usize) -> BitMatrix {
    let round = speck_round_matrix(cipher);
    let mut acc = round.clone();
    for p in 1..power {
        acc = &acc * &round;
        trace!(power = p + 1, ones = acc.count_ones(), "speck matrix power");
    }
    acc
}

pub(crate) fn speck_round_matrix(cipher: &Speck) -> BitMatrix {
    let h = cipher.word_size() as usize;
    let (alpha, beta) = (cipher.alpha() as usize, cipher.beta() as usize);

    // modular addition: bit i of the sum may depend on bits 0..=i of each
    // addend, written with reversed columns
    let carry = BitMatrix::from_fn(h, h, |i, j| j < h - i);
    let rot_beta = BitMatrix::from_fn(h, h, |i, j| j == (2 * h - 1 - i - beta) % h);
    let rot_alpha = BitMatrix::from_fn(h, h, |i, j| j == (2 * h - 1 - i + alpha) % h);

    let top_left = carry.clone();
    let top_right = rot_beta.or(&carry);
    let bottom = (&rot_alpha.reverse_columns() * &carry.reverse_columns()).reverse_columns();

    let mut m = BitMatrix::zero(2 * h, 2 * h);
    m.put_block(0, 0, &top_left);
    m.put_block(0, h, &top_right);
    m.put_block(h, 0, &bottom);
    m.put_block(h, h, &bottom);
    m.reverse_columns()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exponent::exponent;

    const SPECK32_ROWS: [&str; 4] = [
        "11111111111111111111111111111111",
        "01111111111111110111111111111111",
        "10000000000000110000000000000011",
        "01000000000000010000000000000001",
    ];

    fn row_string(m: &BitMatrix, i: usize) -> String {
        (0..m.cols()).map(|j| if m.get(i, j) { '1' } else { '0' }).collect()
    }

    #[test]
    fn single_cell_identity_round_trips() {
        let shape = RegisterShape::new(5, 1, vec![0]).unwrap();
        let m = register_round_matrix(&shape, &BitMatrix::identity(5)).unwrap();
        assert_eq!(m, BitMatrix::identity(5));
    }

    #[test]
    fn register_blocks() {
        let shape = RegisterShape::new(2, 3, vec![0, 2]).unwrap();
        let t = BitMatrix::ones(2, 2);
        let m = register_round_matrix(&shape, &t).unwrap();
        assert_eq!(m.block(2, 0, 2, 2), BitMatrix::identity(2));
        assert_eq!(m.block(4, 2, 2, 2), BitMatrix::identity(2));
        assert_eq!(m.block(0, 4, 2, 2), t);
        assert_eq!(m.block(4, 4, 2, 2), t);
        assert_eq!(m.block(2, 4, 2, 2), BitMatrix::zero(2, 2));
        assert_eq!(m.count_ones(), 2 + 2 + 4 + 4);
    }

    #[test]
    fn transform_width_must_match_cells() {
        let shape = RegisterShape::new(4, 3, vec![0]).unwrap();
        let err = register_round_matrix(&shape, &BitMatrix::identity(5)).unwrap_err();
        assert!(matches!(err, Error::DomainMismatch { expected: 4, actual: 5 }));
    }

    #[test]
    fn speck32_round_structure() {
        let m = cipher_round_matrix(32).unwrap();
        assert_eq!(m.rows(), 32);
        assert_eq!(m.count_ones(), 546);
        assert_eq!(row_string(&m, 0), SPECK32_ROWS[0]);
        assert_eq!(row_string(&m, 1), SPECK32_ROWS[1]);
        assert_eq!(row_string(&m, 14), SPECK32_ROWS[2]);
        assert_eq!(row_string(&m, 15), SPECK32_ROWS[3]);
        assert_eq!(row_string(&m, 23), SPECK32_ROWS[0]);
    }

    #[test]
    fn wider_speck_rounds() {
        assert_eq!(cipher_round_matrix(48).unwrap().count_ones(), 1203);
        assert_eq!(cipher_round_matrix(64).unwrap().count_ones(), 2115);
        assert!(matches!(
            cipher_round_matrix(40),
            Err(Error::Configuration(ConfigError::BlockSize(40)))
        ));
    }

    #[test]
    fn speck32_powers_fill_up() {
        let counts: Vec<usize> = (1..=5)
            .map(|p| cipher_power_matrix(p, 32).unwrap().count_ones())
            .collect();
        assert_eq!(counts, vec![546, 933, 1023, 1024, 1024]);
        assert!(matches!(
            cipher_power_matrix(0, 32),
            Err(Error::Configuration(ConfigError::Power(0)))
        ));
    }

    #[test]
    fn speck_round_exponent() {
        for size in [32, 48, 64] {
            let m = cipher_round_matrix(size).unwrap();
            assert_eq!(exponent(&m, 20).unwrap(), Some(4), "block {size}");
        }
    }
}
