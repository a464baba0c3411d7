//! Experiment descriptions.
//!
//! An [`ExperimentConfig`] is plain data, usually parsed from JSON. The
//! parser checks only the JSON shape: register geometry, transform and
//! column range are validated by the core constructors when the
//! experiment is built or run, so errors name the violated precondition.
//!
//! ```json
//! {
//!   "cell_width": 32, "cells": 4, "taps": [0, 3],
//!   "combiner": "xor",
//!   "transform": { "kind": "speck", "block_size": 32, "rounds": 1 },
//!   "max_rounds": 30, "samples": 64, "seed": 7
//! }
//! ```

use core::ops::Range;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize, Serializer};
use tracing::info;

use crate::error::Result;
use crate::exponent::{exponent, local_exponent};
use crate::mixing::register_round_matrix;
use crate::perfection::{perfection_power, Granularity, PerfectionParams};
use crate::register::{Combiner, RegisterShape};
use crate::transform::{Identity, SpeckFeedback, StructuredTransform, SubstitutionTable};

fn default_samples() -> usize {
    64
}

/// Which modifying transform the register uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransformSpec {
    /// No modification; as wide as the cells.
    Identity,
    /// The PRESENT 4-bit S-box.
    Present,
    /// Arbitrary substitution table of length `2^w`.
    Table { table: Vec<u64> },
    /// `rounds` unkeyed rounds of Speck on `block_size`-bit cells.
    Speck { block_size: usize, rounds: usize },
}

/// One experiment: a register, its transform and the search bounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub cell_width: usize,
    pub cells: usize,
    pub taps: Vec<usize>,
    #[serde(default)]
    pub combiner: Combiner,
    pub transform: TransformSpec,
    pub max_rounds: usize,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default)]
    pub granularity: Granularity,
    /// Seed of the perfection sampler; drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Output columns for a local exponent, `{"start": a, "end": b}`.
    #[serde(default)]
    pub local_columns: Option<Range<usize>>,
}

impl ExperimentConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn shape(&self) -> Result<RegisterShape> {
        RegisterShape::new(self.cell_width, self.cells, self.taps.clone())
    }

    pub fn transform(&self) -> Result<Box<dyn StructuredTransform>> {
        Ok(match &self.transform {
            TransformSpec::Identity => Box::new(Identity::new(self.cell_width)),
            TransformSpec::Present => Box::new(SubstitutionTable::present()),
            TransformSpec::Table { table } => Box::new(SubstitutionTable::new(
                table.iter().map(|&v| v as u128).collect(),
            )?),
            TransformSpec::Speck { block_size, rounds } => {
                Box::new(SpeckFeedback::new(*block_size, *rounds)?)
            }
        })
    }

    pub fn perfection_params(&self) -> PerfectionParams {
        PerfectionParams::new(self.samples, self.max_rounds)
            .combiner(self.combiner)
            .granularity(self.granularity)
    }

    /// Builds the register, then computes its exponent, local exponent (if
    /// requested) and perfection power.
    pub fn run(&self) -> Result<ExperimentReport> {
        let shape = self.shape()?;
        let transform = self.transform()?;
        let matrix = register_round_matrix(&shape, &transform.mixing_matrix())?;
        info!(taps = ?shape.taps(), r = shape.r(), n = shape.n(), "running experiment");

        let exponent = exponent(&matrix, self.max_rounds)?;
        let local_exponent = match &self.local_columns {
            Some(cols) => Some(local_exponent(&matrix, self.max_rounds, cols.clone())?),
            None => None,
        };
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let perfection = perfection_power(&shape, &*transform, &self.perfection_params(), &mut rng)?;

        Ok(ExperimentReport {
            taps: shape.taps().to_vec(),
            exponent,
            local_exponent,
            perfection,
        })
    }
}

/// Results of [`ExperimentConfig::run`]. Rounds not found serialise as `-1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExperimentReport {
    pub taps: Vec<usize>,
    #[serde(serialize_with = "sentinel")]
    pub exponent: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "nested_sentinel")]
    pub local_exponent: Option<Option<usize>>,
    #[serde(serialize_with = "sentinel")]
    pub perfection: Option<usize>,
}

fn sentinel<S: Serializer>(rounds: &Option<usize>, s: S) -> core::result::Result<S::Ok, S::Error> {
    s.serialize_i64(rounds.map_or(-1, |r| r as i64))
}

fn nested_sentinel<S: Serializer>(
    rounds: &Option<Option<usize>>,
    s: S,
) -> core::result::Result<S::Ok, S::Error> {
    sentinel(&rounds.flatten(), s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};

    const SBOX_REGISTER: &str = r#"{
        "cell_width": 4, "cells": 3, "taps": [0, 1, 2],
        "transform": { "kind": "present" },
        "max_rounds": 12, "seed": 11,
        "local_columns": { "start": 8, "end": 12 }
    }"#;

    #[test]
    fn parses_with_defaults() {
        let cfg = ExperimentConfig::from_json(SBOX_REGISTER).unwrap();
        assert_eq!(cfg.combiner, Combiner::Xor);
        assert_eq!(cfg.granularity, Granularity::Bit);
        assert_eq!(cfg.samples, 64);
        assert_eq!(cfg.local_columns, Some(8..12));
        assert_eq!(cfg.transform, TransformSpec::Present);
    }

    #[test]
    fn runs_sbox_register() {
        let report = ExperimentConfig::from_json(SBOX_REGISTER).unwrap().run().unwrap();
        assert_eq!(report.exponent, Some(3));
        assert_eq!(report.local_exponent, Some(Some(1)));
        assert_eq!(report.perfection, Some(3));
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"taps":[0,1,2],"exponent":3,"local_exponent":1,"perfection":3}"#);
    }

    #[test]
    fn unreached_rounds_serialise_as_minus_one() {
        let cfg = ExperimentConfig::from_json(
            r#"{ "cell_width": 4, "cells": 3, "taps": [0],
                 "transform": { "kind": "present" },
                 "max_rounds": 6, "samples": 8, "seed": 1 }"#,
        )
        .unwrap();
        let json = serde_json::to_string(&cfg.run().unwrap()).unwrap();
        assert_eq!(json, r#"{"taps":[0],"exponent":-1,"perfection":-1}"#);
    }

    #[test]
    fn validation_happens_in_core() {
        let mut cfg = ExperimentConfig::from_json(SBOX_REGISTER).unwrap();
        cfg.taps = vec![1, 2];
        assert!(matches!(
            cfg.run(),
            Err(Error::Configuration(ConfigError::MissingNewestTap))
        ));
        cfg.taps = vec![0];
        cfg.cell_width = 5;
        assert!(matches!(
            cfg.run(),
            Err(Error::DomainMismatch { expected: 5, actual: 4 })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ExperimentConfig::from_json(r#"{ "cell_width": "four" }"#),
            Err(Error::Parse(_))
        ));
    }
}
