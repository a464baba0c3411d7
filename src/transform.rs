//! Modifying transforms applied to the combined tap value.
//!
//! A transform has two faces. [`Transform::apply`] is the bit‑exact value
//! map used when simulating a register; [`MixingStructure::mixing_matrix`]
//! is the `r × r` dependency matrix used on the structural path. Plain
//! closures implement [`Transform`] only.

use crate::cipher::Speck;
use crate::error::{ConfigError, Error, Result};
use crate::matrix::BitMatrix;
use crate::mixing::speck_power_matrix;

/// Value map on `r`‑bit cells. Bits above `r` in the result are discarded
/// by the register.
pub trait Transform {
    fn apply(&self, value: u128) -> u128;

    /// Width in bits the transform is defined on, if it has a fixed one.
    /// Registers refuse transforms whose width differs from their cells.
    fn width(&self) -> Option<usize> {
        None
    }
}

/// `DomainMismatch` unless `transform` is unsized or exactly `r` bits wide.
pub(crate) fn check_width<T: Transform + ?Sized>(transform: &T, r: usize) -> Result<()> {
    match transform.width() {
        Some(width) if width != r => Err(Error::DomainMismatch {
            expected: r,
            actual: width,
        }),
        _ => Ok(()),
    }
}

/// Boolean dependency matrix of a transform: entry `(i, j)` set iff output
/// bit `j` may depend on input bit `i`.
pub trait MixingStructure {
    fn mixing_matrix(&self) -> BitMatrix;
}

/// A transform usable on both the simulation and the structural path.
pub trait StructuredTransform: Transform + MixingStructure + Send + Sync {}

impl<T: Transform + MixingStructure + Send + Sync> StructuredTransform for T {}

impl<F: Fn(u128) -> u128> Transform for F {
    fn apply(&self, value: u128) -> u128 {
        self(value)
    }
}

/// Passes the combined value through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    width: usize,
}

impl Identity {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl Transform for Identity {
    fn apply(&self, value: u128) -> u128 {
        value
    }

    fn width(&self) -> Option<usize> {
        Some(self.width)
    }
}

impl MixingStructure for Identity {
    fn mixing_matrix(&self) -> BitMatrix {
        BitMatrix::identity(self.width)
    }
}

/// PRESENT 4‑bit S‑box.
pub const PRESENT_SBOX: [u8; 16] = [
    0xC, 0x5, 0x6, 0xB, 0x9, 0x0, 0xA, 0xD, 0x3, 0xE, 0xF, 0x8, 0x4, 0x7, 0x1, 0x2,
];

/// Lookup‑table substitution on `width`‑bit values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstitutionTable {
    width: usize,
    table: Vec<u128>,
}

impl SubstitutionTable {
    /// `table.len()` must be `2^width` for some `width` in `1..=16`, and
    /// every entry must fit in `width` bits.
    pub fn new(table: Vec<u128>) -> Result<Self> {
        let len = table.len();
        if len < 2 || !len.is_power_of_two() || len > 1 << 16 {
            return Err(ConfigError::SubstitutionTable("length must be 2^w with 1 <= w <= 16").into());
        }
        let width = len.trailing_zeros() as usize;
        if table.iter().any(|&v| v >= len as u128) {
            return Err(ConfigError::SubstitutionTable("entry wider than the table index").into());
        }
        Ok(Self { width, table })
    }

    pub fn present() -> Self {
        Self {
            width: 4,
            table: PRESENT_SBOX.iter().map(|&v| v as u128).collect(),
        }
    }

    /// `true` iff the table is a permutation.
    pub fn is_bijective(&self) -> bool {
        let mut seen = vec![false; self.table.len()];
        self.table
            .iter()
            .all(|&v| !std::mem::replace(&mut seen[v as usize], true))
    }
}

impl Transform for SubstitutionTable {
    fn apply(&self, value: u128) -> u128 {
        self.table[(value & (self.table.len() as u128 - 1)) as usize]
    }

    fn width(&self) -> Option<usize> {
        Some(self.width)
    }
}

impl MixingStructure for SubstitutionTable {
    /// Exhaustive: input bit `i` reaches output bit `j` iff flipping `i`
    /// changes `j` for at least one input.
    fn mixing_matrix(&self) -> BitMatrix {
        let mut m = BitMatrix::zero(self.width, self.width);
        for i in 0..self.width {
            let flip = 1usize << i;
            let changed = (0..self.table.len())
                .map(|x| self.table[x] ^ self.table[x ^ flip])
                .fold(0u128, |acc, d| acc | d);
            for j in 0..self.width {
                if (changed >> j) & 1 == 1 {
                    m.set(i, j, true);
                }
            }
        }
        m
    }
}

/// Reduced‑round unkeyed Speck as the modifying transform of a register
/// whose cells are one Speck block wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeckFeedback {
    cipher: Speck,
    rounds: usize,
}

impl SpeckFeedback {
    pub fn new(block_size: usize, rounds: usize) -> Result<Self> {
        let cipher = Speck::with_block_size(block_size)?;
        if rounds < 1 {
            return Err(ConfigError::Rounds(rounds).into());
        }
        Ok(Self { cipher, rounds })
    }

    pub fn cipher(&self) -> &Speck {
        &self.cipher
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

impl Transform for SpeckFeedback {
    fn apply(&self, value: u128) -> u128 {
        self.cipher.encrypt_rounds_unchecked(value, self.rounds)
    }

    fn width(&self) -> Option<usize> {
        Some(self.cipher.block_size())
    }
}

impl MixingStructure for SpeckFeedback {
    fn mixing_matrix(&self) -> BitMatrix {
        speck_power_matrix(&self.cipher, self.rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_is_a_full_mixing_permutation() {
        let sbox = SubstitutionTable::present();
        assert!(sbox.is_bijective());
        assert_eq!(sbox.mixing_matrix(), BitMatrix::ones(4, 4));
        assert_eq!(sbox.apply(0), 0xC);
        assert_eq!(sbox.apply(0xF), 0x2);
    }

    #[test]
    fn bit_permutation_table_has_permutation_matrix() {
        // swap bits 0 and 1 of a 2-bit value
        let swap = SubstitutionTable::new(vec![0b00, 0b10, 0b01, 0b11]).unwrap();
        let m = swap.mixing_matrix();
        assert!(m.get(0, 1) && m.get(1, 0));
        assert!(!m.get(0, 0) && !m.get(1, 1));
    }

    #[test]
    fn table_validation() {
        assert!(SubstitutionTable::new(vec![0, 1, 2]).is_err());
        assert!(SubstitutionTable::new(vec![0, 4, 1, 2]).is_err());
        assert!(!SubstitutionTable::new(vec![0, 0, 1, 2]).unwrap().is_bijective());
    }

    #[test]
    fn closures_are_transforms() {
        let double = |x: u128| x << 1;
        assert_eq!(double.apply(3), 6);
        assert_eq!(double.width(), None);
        assert!(check_width(&double, 77).is_ok());
    }

    #[test]
    fn widths_are_checked_against_cells() {
        assert_eq!(SubstitutionTable::present().width(), Some(4));
        assert_eq!(SpeckFeedback::new(48, 2).unwrap().width(), Some(48));
        assert!(check_width(&Identity::new(8), 8).is_ok());
        assert!(matches!(
            check_width(&SubstitutionTable::present(), 8),
            Err(Error::DomainMismatch { expected: 8, actual: 4 })
        ));
    }

    #[test]
    fn speck_feedback_agrees_with_cipher() {
        let fb = SpeckFeedback::new(32, 1).unwrap();
        assert_eq!(fb.apply(0x6574694c), 0x5216f727);
        assert_eq!(fb.mixing_matrix().rows(), 32);
        assert!(SpeckFeedback::new(32, 0).is_err());
    }
}
