//! Feedback shift registers with a modifying transform in the feedback path.
//!
//! The register holds `n` cells of `r` bits packed into one integer, cell 0
//! in the low bits. One cycle:
//!
//! 1. read the tapped cells,
//! 2. combine them (XOR, or addition mod 2^r),
//! 3. run the combined value through the modifying transform,
//! 4. shift the whole register one cell towards cell 0 and write the
//!    transformed value into cell `n - 1`.
//!
//! The XOR variant is the modified multidimensional linear register, the
//! additive variant the modified additive generator.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::bitfield::{self, cell_mask};
use crate::error::{ConfigError, Result};
use crate::transform::{check_width, Transform};

/// Widest supported cell.
pub const MAX_CELL_WIDTH: usize = 128;

/// How the tapped cells are combined before the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combiner {
    /// Bitwise XOR of the tapped cells.
    #[default]
    Xor,
    /// Sum of the tapped cells modulo `2^r`.
    Add,
}

impl Combiner {
    #[inline]
    pub fn combine(self, values: &[u128], r: usize) -> u128 {
        let mask = cell_mask(r);
        match self {
            Combiner::Xor => values.iter().fold(0u128, |acc, &v| acc ^ v),
            Combiner::Add => values.iter().fold(0u128, |acc, &v| acc.wrapping_add(v)) & mask,
        }
    }
}

/// Validated register geometry: cell width, cell count and tap positions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RegisterShape {
    r: usize,
    n: usize,
    taps: Vec<usize>,
}

impl RegisterShape {
    /// Fails unless `1 <= r <= 128`, `n >= 1`, and `taps` is a non-empty
    /// set of distinct indices in `0..n` containing 0.
    pub fn new(r: usize, n: usize, taps: impl Into<Vec<usize>>) -> Result<Self> {
        let taps = taps.into();
        if r == 0 || r > MAX_CELL_WIDTH {
            return Err(ConfigError::CellWidth(r).into());
        }
        if n == 0 {
            return Err(ConfigError::CellCount.into());
        }
        if taps.is_empty() {
            return Err(ConfigError::EmptyTaps.into());
        }
        if taps.len() > n {
            return Err(ConfigError::TooManyTaps {
                taps: taps.len(),
                cells: n,
            }
            .into());
        }
        let mut seen = vec![false; n];
        for &tap in &taps {
            if tap >= n {
                return Err(ConfigError::TapOutOfRange { tap, cells: n }.into());
            }
            if std::mem::replace(&mut seen[tap], true) {
                return Err(ConfigError::DuplicateTap(tap).into());
            }
        }
        if !seen[0] {
            return Err(ConfigError::MissingNewestTap.into());
        }
        Ok(Self { r, n, taps })
    }

    /// Cell width in bits.
    pub fn r(&self) -> usize {
        self.r
    }

    /// Number of cells.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn taps(&self) -> &[usize] {
        &self.taps
    }

    /// Total state width `n * r` in bits.
    pub fn bits(&self) -> usize {
        self.n * self.r
    }
}

/// One generator output: the new cell 0 and the full state after the cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub output: u128,
    pub state: BigUint,
}

/// A feedback shift register driving a borrowed modifying transform.
pub struct FeedbackRegister<'t, T: Transform + ?Sized> {
    shape: RegisterShape,
    combiner: Combiner,
    transform: &'t T,
    state: BigUint,
}

impl<'t, T: Transform + ?Sized> FeedbackRegister<'t, T> {
    /// Fails if `state` needs more than `n * r` bits, or if `transform`
    /// has a fixed width other than `r`.
    pub fn new(
        shape: RegisterShape,
        combiner: Combiner,
        transform: &'t T,
        state: BigUint,
    ) -> Result<Self> {
        check_width(transform, shape.r)?;
        let capacity = shape.bits() as u64;
        if state.bits() > capacity {
            return Err(ConfigError::StateTooWide {
                bits: state.bits(),
                capacity,
            }
            .into());
        }
        Ok(Self {
            shape,
            combiner,
            transform,
            state,
        })
    }

    /// XOR‑combining register starting from the all‑zero state.
    pub fn xor(shape: RegisterShape, transform: &'t T) -> Result<Self> {
        Self::new(shape, Combiner::Xor, transform, BigUint::zero())
    }

    /// Additive register starting from the all‑zero state.
    pub fn additive(shape: RegisterShape, transform: &'t T) -> Result<Self> {
        Self::new(shape, Combiner::Add, transform, BigUint::zero())
    }

    pub fn shape(&self) -> &RegisterShape {
        &self.shape
    }

    pub fn combiner(&self) -> Combiner {
        self.combiner
    }

    /// Values of the cells at `positions`. Positions past the last cell read as 0.
    pub fn cell_values(&self, positions: &[usize]) -> Vec<u128> {
        bitfield::cell_values(&self.state, self.shape.r, positions)
    }

    /// Runs one cycle.
    pub fn advance(&mut self) {
        let r = self.shape.r;
        let tapped = self.cell_values(&self.shape.taps);
        let combined = self.combiner.combine(&tapped, r);
        let fed = self.transform.apply(combined) & cell_mask(r);
        self.state >>= r;
        self.state |= BigUint::from(fed) << (r * (self.shape.n - 1));
    }

    /// Cell 0, the generator's output symbol.
    pub fn output(&self) -> u128 {
        bitfield::cell_value(&self.state, self.shape.r, 0)
    }

    /// The packed state.
    pub fn state(&self) -> &BigUint {
        &self.state
    }

    /// All cells, cell 0 first.
    pub fn cells(&self) -> Vec<u128> {
        bitfield::unpack(&self.state, self.shape.r, self.shape.n)
    }

    /// Advances `n` times, discarding the outputs.
    pub fn idle(&mut self) {
        self.idle_rounds(self.shape.n);
    }

    /// Advances `rounds` times, discarding the outputs.
    pub fn idle_rounds(&mut self, rounds: usize) {
        for _ in 0..rounds {
            self.advance();
        }
    }

    /// Endless stream of steps; each `next` runs one cycle.
    ///
    /// The stream cannot be rewound: build a new register from a saved
    /// state to replay.
    pub fn steps(&mut self) -> Steps<'_, 't, T> {
        Steps { register: self }
    }
}

/// Iterator returned by [`FeedbackRegister::steps`]. Never ends.
pub struct Steps<'r, 't, T: Transform + ?Sized> {
    register: &'r mut FeedbackRegister<'t, T>,
}

impl<T: Transform + ?Sized> Iterator for Steps<'_, '_, T> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        self.register.advance();
        Some(Step {
            output: self.register.output(),
            state: self.register.state.clone(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
