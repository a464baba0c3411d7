//! Speck family of add‑rotate‑xor block ciphers.
//!
//! One round over the word pair `(x, y)` of `w`‑bit words:
//!
//! ```text
//! x' = ((x >>> α) + y) mod 2^w  ^ k
//! y' = (y <<< β) ^ x'
//! ```
//!
//! The block is `x' ‖ y'` with `x` in the high half. The unkeyed form
//! (`k = 0`) is what the feedback registers use as their modifying
//! transform; the keyed form with the full key schedule is kept so the
//! implementation can be checked against the published vectors.

use crate::error::{ConfigError, Result};

/// Block sizes for which Speck is defined.
pub const BLOCK_SIZES: [usize; 5] = [32, 48, 64, 96, 128];

/// Speck parameter set: word size and the two rotation amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Speck {
    word_size: u32,
    alpha: u32,
    beta: u32,
}

impl Speck {
    /// Custom parameter set. Words are 2..=64 bits, rotations lie in `1..word_size`.
    pub fn new(word_size: u32, alpha: u32, beta: u32) -> Result<Self> {
        if !(2..=64).contains(&word_size) {
            return Err(ConfigError::WordSize(word_size).into());
        }
        for amount in [alpha, beta] {
            if amount == 0 || amount >= word_size {
                return Err(ConfigError::Rotation { amount, word_size }.into());
            }
        }
        Ok(Self {
            word_size,
            alpha,
            beta,
        })
    }

    /// Standard parameters for a block of `block_size` bits:
    /// α = 7, β = 2 for Speck32, α = 8, β = 3 otherwise.
    pub fn with_block_size(block_size: usize) -> Result<Self> {
        if !BLOCK_SIZES.contains(&block_size) {
            return Err(ConfigError::BlockSize(block_size).into());
        }
        let word_size = (block_size / 2) as u32;
        let (alpha, beta) = if block_size == 32 { (7, 2) } else { (8, 3) };
        Ok(Self {
            word_size,
            alpha,
            beta,
        })
    }

    pub fn word_size(&self) -> u32 {
        self.word_size
    }

    pub fn block_size(&self) -> usize {
        2 * self.word_size as usize
    }

    pub fn alpha(&self) -> u32 {
        self.alpha
    }

    pub fn beta(&self) -> u32 {
        self.beta
    }

    #[inline(always)]
    fn word_mask(&self) -> u64 {
        u64::MAX >> (64 - self.word_size)
    }

    #[inline(always)]
    fn block_mask(&self) -> u128 {
        u128::MAX >> (128 - self.block_size())
    }

    #[inline(always)]
    fn rotr(&self, v: u64, by: u32) -> u64 {
        ((v >> by) | (v << (self.word_size - by))) & self.word_mask()
    }

    #[inline(always)]
    fn rotl(&self, v: u64, by: u32) -> u64 {
        ((v << by) | (v >> (self.word_size - by))) & self.word_mask()
    }

    #[inline(always)]
    fn split(&self, block: u128) -> (u64, u64) {
        let mask = self.word_mask() as u128;
        (
            ((block >> self.word_size) & mask) as u64,
            (block & mask) as u64,
        )
    }

    #[inline(always)]
    fn join(&self, x: u64, y: u64) -> u128 {
        ((x as u128) << self.word_size) | y as u128
    }

    #[inline(always)]
    fn round(&self, x: u64, y: u64, k: u64) -> (u64, u64) {
        let x = (self.rotr(x, self.alpha).wrapping_add(y) & self.word_mask()) ^ k;
        let y = self.rotl(y, self.beta) ^ x;
        (x, y)
    }

    #[inline(always)]
    fn round_inv(&self, x: u64, y: u64, k: u64) -> (u64, u64) {
        let y = self.rotr(y ^ x, self.beta);
        let x = self.rotl(((x ^ k).wrapping_sub(y)) & self.word_mask(), self.alpha);
        (x, y)
    }

    /// `rounds` unkeyed rounds. Bits of `plaintext` above the block are ignored.
    pub fn encrypt_rounds(&self, plaintext: u128, rounds: usize) -> Result<u128> {
        if rounds < 1 {
            return Err(ConfigError::Rounds(rounds).into());
        }
        Ok(self.encrypt_rounds_unchecked(plaintext, rounds))
    }

    pub(crate) fn encrypt_rounds_unchecked(&self, plaintext: u128, rounds: usize) -> u128 {
        let (mut x, mut y) = self.split(plaintext & self.block_mask());
        for _ in 0..rounds {
            (x, y) = self.round(x, y, 0);
        }
        self.join(x, y)
    }

    /// A single round with `subkey` mixed into the left word.
    pub fn one_round_keyed(&self, plaintext: u128, subkey: u64) -> u128 {
        let (x, y) = self.split(plaintext & self.block_mask());
        let (x, y) = self.round(x, y, subkey & self.word_mask());
        self.join(x, y)
    }

    /// Standard round count for `key_words` key words, if that variant exists.
    pub fn standard_rounds(&self, key_words: usize) -> Option<usize> {
        match (self.block_size(), key_words) {
            (32, 4) => Some(22),
            (48, 3) => Some(22),
            (48, 4) => Some(23),
            (64, 3) => Some(26),
            (64, 4) => Some(27),
            (96, 2) => Some(28),
            (96, 3) => Some(29),
            (128, 2) => Some(32),
            (128, 3) => Some(33),
            (128, 4) => Some(34),
            _ => None,
        }
    }

    /// Expands `key` into `rounds` subkeys.
    ///
    /// `key` is written most significant word first, as in the published
    /// vectors: `[l_{m-2}, …, l_0, k_0]`.
    pub fn expand_key(&self, key: &[u64], rounds: usize) -> Result<Vec<u64>> {
        if key.len() < 2 {
            return Err(ConfigError::KeyLength {
                block_size: self.block_size(),
                key_words: key.len(),
            }
            .into());
        }
        if rounds < 1 {
            return Err(ConfigError::Rounds(rounds).into());
        }
        let mask = self.word_mask();
        let mut l: Vec<u64> = key[..key.len() - 1].iter().rev().map(|w| w & mask).collect();
        let mut k = key[key.len() - 1] & mask;
        let mut subkeys = Vec::with_capacity(rounds);
        subkeys.push(k);
        // (l_{i+m-1}, k_{i+1}) = R_i(l_i, k_i): the round function keyed by the index
        for i in 0..rounds - 1 {
            let (li, ki) = self.round(l[i], k, i as u64);
            l.push(li);
            k = ki;
            subkeys.push(k);
        }
        Ok(subkeys)
    }

    /// Full keyed encryption with the standard round count for `key`.
    pub fn encrypt(&self, plaintext: u128, key: &[u64]) -> Result<u128> {
        let rounds = self.rounds_for(key)?;
        let subkeys = self.expand_key(key, rounds)?;
        let (mut x, mut y) = self.split(plaintext & self.block_mask());
        for &k in &subkeys {
            (x, y) = self.round(x, y, k);
        }
        Ok(self.join(x, y))
    }

    /// Inverse of [`Speck::encrypt`].
    pub fn decrypt(&self, ciphertext: u128, key: &[u64]) -> Result<u128> {
        let rounds = self.rounds_for(key)?;
        let subkeys = self.expand_key(key, rounds)?;
        let (mut x, mut y) = self.split(ciphertext & self.block_mask());
        for &k in subkeys.iter().rev() {
            (x, y) = self.round_inv(x, y, k);
        }
        Ok(self.join(x, y))
    }

    fn rounds_for(&self, key: &[u64]) -> Result<usize> {
        self.standard_rounds(key.len()).ok_or_else(|| {
            ConfigError::KeyLength {
                block_size: self.block_size(),
                key_words: key.len(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn single_unkeyed_round() {
        let speck = Speck::with_block_size(32).unwrap();
        assert_eq!(speck.encrypt_rounds(0x6574694c, 1).unwrap(), 0x5216f727);
        assert_eq!(speck.encrypt_rounds(0x6574694c, 2).unwrap(), 0x23cbff54);
    }

    #[test]
    fn keyed_round_xors_subkey_into_left_word() {
        let speck = Speck::with_block_size(32).unwrap();
        assert_eq!(speck.one_round_keyed(0x6574694c, 0), 0x5216f727);
        assert_eq!(speck.one_round_keyed(0x6574694c, 0x0100), 0x5316f627);
    }

    #[test]
    fn zero_rounds_rejected() {
        let speck = Speck::with_block_size(32).unwrap();
        assert!(matches!(
            speck.encrypt_rounds(1, 0),
            Err(Error::Configuration(ConfigError::Rounds(0)))
        ));
    }

    #[test]
    fn speck32_64_published_vector() {
        let speck = Speck::with_block_size(32).unwrap();
        let key = [0x1918, 0x1110, 0x0908, 0x0100];
        let ct = speck.encrypt(0x6574694c, &key).unwrap();
        assert_eq!(ct, 0xa86842f2);
        assert_eq!(speck.decrypt(ct, &key).unwrap(), 0x6574694c);
    }

    #[test]
    fn speck64_128_published_vector() {
        let speck = Speck::with_block_size(64).unwrap();
        let key = [0x1b1a1918, 0x13121110, 0x0b0a0908, 0x03020100];
        let ct = speck.encrypt(0x3b7265747475432d, &key).unwrap();
        assert_eq!(ct, 0x8c6fa548454e028b);
    }

    #[test]
    fn speck128_128_published_vector() {
        let speck = Speck::with_block_size(128).unwrap();
        let key = [0x0f0e0d0c0b0a0908, 0x0706050403020100];
        let pt = 0x6c617669757165207469206564616d20u128;
        let ct = speck.encrypt(pt, &key).unwrap();
        assert_eq!(ct, 0xa65d9851797832657860fedf5c570d18);
        assert_eq!(speck.decrypt(ct, &key).unwrap(), pt);
    }

    #[test]
    fn parameter_validation() {
        assert!(Speck::with_block_size(40).is_err());
        assert!(Speck::new(16, 0, 2).is_err());
        assert!(Speck::new(16, 7, 16).is_err());
        assert!(Speck::new(65, 7, 2).is_err());
        let speck = Speck::new(16, 7, 2).unwrap();
        assert_eq!(speck, Speck::with_block_size(32).unwrap());
        assert!(speck.encrypt(0, &[1, 2, 3]).is_err());
    }
}
