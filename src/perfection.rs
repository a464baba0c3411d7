//! Empirical avalanche ("perfection") testing of feedback registers.
//!
//! For every input bit `i` and every random sample `s`, two registers are
//! started from the neighbours `s | 2^i` and `s & !2^i` and run side by
//! side. After each round the state differences of all pairs for bit `i`
//! are OR‑ed together; input bit `i` is *saturated* once that union covers
//! the whole output width. The perfection power is the first round at
//! which every input bit is saturated.
//!
//! This is a Monte‑Carlo estimate of the strict avalanche criterion.
//! With few samples a dependency that exists may go unobserved, so the
//! reported round can be later than the true one (or `None`). That is a
//! property of the method, not an error; raise `samples` for confidence.
//! It never reports a round earlier than the true one.
//!
//! Perfection is avalanche *between* cells: a one‑cell register has no
//! other cell to carry a difference into, so it is never reported perfect,
//! whatever its width (a one‑bit, one‑cell register included).

use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bitfield::unpack;
use crate::error::{ConfigError, Result};
use crate::register::{Combiner, FeedbackRegister, RegisterShape};
use crate::transform::{check_width, Transform};

/// What must change for an input bit to count as saturated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Every one of the `n * r` state bits.
    #[default]
    Bit,
    /// Every one of the `n` cells, in any of its bits. Needs `n >= 2`
    /// like the bit test; for `r = 1` the two coincide.
    Cell,
}

/// Parameters of one perfection test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfectionParams {
    /// Number of random base points.
    pub samples: usize,
    /// Last round examined.
    pub max_rounds: usize,
    #[serde(default)]
    pub combiner: Combiner,
    #[serde(default)]
    pub granularity: Granularity,
}

impl PerfectionParams {
    pub fn new(samples: usize, max_rounds: usize) -> Self {
        Self {
            samples,
            max_rounds,
            combiner: Combiner::Xor,
            granularity: Granularity::Bit,
        }
    }

    pub fn combiner(mut self, combiner: Combiner) -> Self {
        self.combiner = combiner;
        self
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

/// `count` uniform integers in `[0, 2^bits)`.
pub fn random_samples<R: Rng + ?Sized>(bits: usize, count: usize, rng: &mut R) -> Vec<BigUint> {
    (0..count).map(|_| rng.gen_biguint(bits as u64)).collect()
}

/// The two values that agree with `x` everywhere except bit `i`:
/// first with bit `i` set, second with it clear.
pub fn neighbors(x: &BigUint, i: usize) -> (BigUint, BigUint) {
    let mut first = x.clone();
    first.set_bit(i as u64, true);
    let mut second = first.clone();
    second.set_bit(i as u64, false);
    (first, second)
}

/// Least round in `1..=max_rounds` at which sampling shows every input
/// bit affecting the whole output, or `None`.
///
/// Randomness comes only from `rng`; a seeded generator makes the result
/// reproducible. Fails with `DomainMismatch` if `transform` has a fixed
/// width other than the cell width.
pub fn perfection_power<T, R>(
    shape: &RegisterShape,
    transform: &T,
    params: &PerfectionParams,
    rng: &mut R,
) -> Result<Option<usize>>
where
    T: Transform + ?Sized,
    R: Rng + ?Sized,
{
    if params.samples == 0 {
        return Err(ConfigError::Samples.into());
    }
    check_width(transform, shape.r())?;
    if shape.n() < 2 {
        debug!(r = shape.r(), "one-cell register, no inter-cell avalanche");
        return Ok(None);
    }
    let bits = shape.bits();
    let samples = random_samples(bits, params.samples, rng);

    // pairs[i][s]: the two registers started from the neighbours of sample s along bit i
    let mut pairs = Vec::with_capacity(bits);
    for i in 0..bits {
        let mut row = Vec::with_capacity(samples.len());
        for s in &samples {
            let (hi, lo) = neighbors(s, i);
            row.push((
                FeedbackRegister::new(shape.clone(), params.combiner, transform, hi)?,
                FeedbackRegister::new(shape.clone(), params.combiner, transform, lo)?,
            ));
        }
        pairs.push(row);
    }

    let target = full_width(shape, params.granularity);
    for round in 1..=params.max_rounds {
        for (a, b) in pairs.iter_mut().flatten() {
            a.advance();
            b.advance();
        }
        let saturated = pairs
            .iter()
            .take_while(|row| {
                let changed = row
                    .iter()
                    .fold(BigUint::zero(), |acc, (a, b)| acc | (a.state() ^ b.state()));
                coverage(&changed, shape, params.granularity) == target
            })
            .count();
        trace!(round, saturated, inputs = bits, "perfection round");
        if saturated == bits {
            debug!(round, samples = params.samples, "all input bits saturated");
            return Ok(Some(round));
        }
    }
    debug!(max_rounds = params.max_rounds, "perfection not reached");
    Ok(None)
}

/// All-ones value over the output width.
fn full_width(shape: &RegisterShape, granularity: Granularity) -> BigUint {
    let width = match granularity {
        Granularity::Bit => shape.bits(),
        Granularity::Cell => shape.n(),
    };
    (BigUint::from(1u8) << width) - 1u8
}

/// Projects a union of state differences onto the output width.
fn coverage(changed: &BigUint, shape: &RegisterShape, granularity: Granularity) -> BigUint {
    match granularity {
        Granularity::Bit => changed.clone(),
        Granularity::Cell => {
            let mut cells = BigUint::zero();
            for (c, v) in unpack(changed, shape.r(), shape.n()).into_iter().enumerate() {
                if v != 0 {
                    cells.set_bit(c as u64, true);
                }
            }
            cells
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Identity, SubstitutionTable};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn shape(r: usize, n: usize, taps: &[usize]) -> RegisterShape {
        RegisterShape::new(r, n, taps.to_vec()).unwrap()
    }

    #[test]
    fn neighbours_differ_in_one_bit() {
        let x = BigUint::from(0b1010u32);
        assert_eq!(neighbors(&x, 0), (BigUint::from(0b1011u32), BigUint::from(0b1010u32)));
        assert_eq!(neighbors(&x, 1), (BigUint::from(0b1010u32), BigUint::from(0b1000u32)));
        assert_eq!(neighbors(&x, 70).0.bits(), 71);
    }

    #[test]
    fn samples_fit_width() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let s = random_samples(12, 200, &mut rng);
        assert_eq!(s.len(), 200);
        assert!(s.iter().all(|v| v.bits() <= 12));
    }

    #[test]
    fn single_cell_copy_never_avalanches_at_any_granularity() {
        for r in [1, 4, 9] {
            let id = Identity::new(r);
            for granularity in [Granularity::Bit, Granularity::Cell] {
                let params = PerfectionParams::new(16, 50).granularity(granularity);
                let mut rng = ChaCha8Rng::seed_from_u64(7);
                let p = perfection_power(&shape(r, 1, &[0]), &id, &params, &mut rng).unwrap();
                assert_eq!(p, None, "r = {r}, {granularity:?}");
            }
        }
    }

    #[test]
    fn cell_granularity_counts_cells_not_bits() {
        // output bit 0 is input bit 0, so low bits never spread to the
        // rest of a cell; every flip still reaches both cells by round 2
        let table = SubstitutionTable::new(vec![6, 13, 12, 7, 0, 11, 10, 1, 14, 5, 2, 9, 4, 15, 8, 3])
            .unwrap();
        let s = shape(4, 2, &[0, 1]);
        let bit = PerfectionParams::new(32, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(perfection_power(&s, &table, &bit, &mut rng).unwrap(), None);
        let cell = bit.granularity(Granularity::Cell);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(perfection_power(&s, &table, &cell, &mut rng).unwrap(), Some(2));
    }

    #[test]
    fn transform_width_must_match_cells() {
        let sbox = SubstitutionTable::present();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let res = perfection_power(&shape(8, 3, &[0, 1]), &sbox, &PerfectionParams::new(4, 5), &mut rng);
        assert!(matches!(res, Err(crate::Error::DomainMismatch { expected: 8, actual: 4 })));
    }

    #[test]
    fn sbox_register_both_granularities() {
        let sbox = SubstitutionTable::present();
        let s = shape(4, 3, &[0, 1, 2]);
        for combiner in [Combiner::Xor, Combiner::Add] {
            for granularity in [Granularity::Bit, Granularity::Cell] {
                let params = PerfectionParams::new(64, 12)
                    .combiner(combiner)
                    .granularity(granularity);
                let mut rng = ChaCha8Rng::seed_from_u64(2024);
                let p = perfection_power(&s, &sbox, &params, &mut rng).unwrap();
                assert_eq!(p, Some(3), "{combiner:?}/{granularity:?}");
            }
        }
    }

    #[test]
    fn zero_samples_rejected() {
        let id = Identity::new(4);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let res = perfection_power(&shape(4, 2, &[0]), &id, &PerfectionParams::new(0, 5), &mut rng);
        assert!(res.is_err());
    }
}
