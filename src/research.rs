//! Tap-configuration sweeps.
//!
//! Each configuration is an independent experiment: it owns its matrices,
//! registers and random generator, and returns an [`ExperimentRecord`].
//! Nothing is shared between configurations, so the sweeps parallelise
//! trivially behind the `parallel` feature.

use itertools::Itertools;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;
use crate::exponent::exponent;
use crate::matrix::BitMatrix;
use crate::mixing::register_round_matrix;
use crate::perfection::{perfection_power, PerfectionParams};
use crate::register::RegisterShape;
use crate::transform::Transform;

// ---------------------------------------------------------------------------
// Tap enumeration
// ---------------------------------------------------------------------------

/// Every tap set `[0, t_1, …, t_extra]` with `0 < t_1 < … < t_extra < n`,
/// in lexicographic order. Cell 0 is always tapped.
pub fn tap_subsets(n: usize, extra: usize) -> impl Iterator<Item = Vec<usize>> {
    (1..n).combinations(extra).map(|rest| {
        let mut taps = Vec::with_capacity(rest.len() + 1);
        taps.push(0);
        taps.extend(rest);
        taps
    })
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Outcome of one experiment: the tap set and the round count found, if any.
///
/// Serialised with `-1` standing for "not found within the bound".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub taps: Vec<usize>,
    #[serde(serialize_with = "rounds_to_sentinel", deserialize_with = "rounds_from_sentinel")]
    pub rounds: Option<usize>,
}

fn rounds_to_sentinel<S: Serializer>(rounds: &Option<usize>, s: S) -> core::result::Result<S::Ok, S::Error> {
    match rounds {
        Some(r) => s.serialize_i64(*r as i64),
        None => s.serialize_i64(-1),
    }
}

fn rounds_from_sentinel<'de, D: Deserializer<'de>>(d: D) -> core::result::Result<Option<usize>, D::Error> {
    let v = i64::deserialize(d)?;
    Ok(usize::try_from(v).ok())
}

/// Found rounds ascending, then not-found; ties by tap set.
pub fn sort_records(records: &mut [ExperimentRecord]) {
    records.sort_by(|a, b| {
        let key = |r: &ExperimentRecord| (r.rounds.is_none(), r.rounds);
        key(a).cmp(&key(b)).then_with(|| a.taps.cmp(&b.taps))
    });
}

// ---------------------------------------------------------------------------
// Sweeps
// ---------------------------------------------------------------------------

/// Diffusion exponent of every register with `extra + 1` taps, cells `r`
/// bits wide, `n` cells long, transform matrix `transform`.
pub fn exponent_sweep(
    r: usize,
    n: usize,
    extra: usize,
    transform: &BitMatrix,
    max_rounds: usize,
) -> Result<Vec<ExperimentRecord>> {
    info!(r, n, taps = extra + 1, max_rounds, "exponent sweep");
    let mut records = tap_subsets(n, extra)
        .map(|taps| exponent_record(r, n, taps, transform, max_rounds))
        .collect::<Result<Vec<_>>>()?;
    sort_records(&mut records);
    Ok(records)
}

fn exponent_record(
    r: usize,
    n: usize,
    taps: Vec<usize>,
    transform: &BitMatrix,
    max_rounds: usize,
) -> Result<ExperimentRecord> {
    let shape = RegisterShape::new(r, n, taps)?;
    let matrix = register_round_matrix(&shape, transform)?;
    let rounds = exponent(&matrix, max_rounds)?;
    Ok(ExperimentRecord {
        taps: shape.taps().to_vec(),
        rounds,
    })
}

/// Perfection power of every register with `extra + 1` taps.
///
/// Configuration `k` (in [`tap_subsets`] order) samples from its own
/// generator seeded with `seed + k`, so results do not depend on the order
/// in which configurations run.
pub fn perfection_sweep<T: Transform + ?Sized>(
    r: usize,
    n: usize,
    extra: usize,
    transform: &T,
    params: &PerfectionParams,
    seed: u64,
) -> Result<Vec<ExperimentRecord>> {
    info!(r, n, taps = extra + 1, samples = params.samples, "perfection sweep");
    let mut records = tap_subsets(n, extra)
        .enumerate()
        .map(|(k, taps)| perfection_record(r, n, taps, transform, params, seed.wrapping_add(k as u64)))
        .collect::<Result<Vec<_>>>()?;
    sort_records(&mut records);
    Ok(records)
}

fn perfection_record<T: Transform + ?Sized>(
    r: usize,
    n: usize,
    taps: Vec<usize>,
    transform: &T,
    params: &PerfectionParams,
    seed: u64,
) -> Result<ExperimentRecord> {
    let shape = RegisterShape::new(r, n, taps)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rounds = perfection_power(&shape, transform, params, &mut rng)?;
    Ok(ExperimentRecord {
        taps: shape.taps().to_vec(),
        rounds,
    })
}

/// [`exponent_sweep`] with one rayon task per tap set (feature `parallel`).
#[cfg(feature = "parallel")]
pub fn exponent_sweep_par(
    r: usize,
    n: usize,
    extra: usize,
    transform: &BitMatrix,
    max_rounds: usize,
) -> Result<Vec<ExperimentRecord>> {
    let configs: Vec<Vec<usize>> = tap_subsets(n, extra).collect();
    let mut records = configs
        .into_par_iter()
        .map(|taps| exponent_record(r, n, taps, transform, max_rounds))
        .collect::<Result<Vec<_>>>()?;
    sort_records(&mut records);
    Ok(records)
}

/// [`perfection_sweep`] with one rayon task per tap set (feature `parallel`).
/// Same seeds, same results as the sequential sweep.
#[cfg(feature = "parallel")]
pub fn perfection_sweep_par<T: Transform + Sync + ?Sized>(
    r: usize,
    n: usize,
    extra: usize,
    transform: &T,
    params: &PerfectionParams,
    seed: u64,
) -> Result<Vec<ExperimentRecord>> {
    let configs: Vec<Vec<usize>> = tap_subsets(n, extra).collect();
    let mut records = configs
        .into_par_iter()
        .enumerate()
        .map(|(k, taps)| perfection_record(r, n, taps, transform, params, seed.wrapping_add(k as u64)))
        .collect::<Result<Vec<_>>>()?;
    sort_records(&mut records);
    Ok(records)
}
