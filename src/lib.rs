//! shiftmix — Diffusion of Cipher‑Modified Feedback Registers
//! ==========================================================
//! Tools for measuring how fast a **feedback shift register with a cipher in
//! its feedback path** spreads every input bit across its whole state.
//!
//! ## Registers
//! * `n` cells of `r` bits (`1 ≤ r ≤ 128`), packed into one big integer
//! * tapped cells combined by XOR (modified linear register) or by addition
//!   mod `2^r` (modified additive generator)
//! * the combined value passes through a modifying transform: identity, a
//!   substitution table such as the PRESENT S‑box, or reduced‑round Speck
//!
//! ## Two measures
//! * **Diffusion exponent** — the least `k` such that the `k`‑th boolean power
//!   of the register's mixing matrix has no zero entry (optionally only over
//!   a column range). Structural: an upper bound on what any input can reach.
//! * **Perfection power** — the least round at which random neighbouring
//!   states are observed to differ in every output bit. Empirical and seeded.
//!
//! ## Around the core
//! * [`cipher`]: Speck with its key schedule, for keyed and unkeyed rounds.
//! * [`research`]: sweeps over all tap sets of a given size, sequential or
//!   **Rayon parallel** (feature `parallel`).
//! * [`config`]: JSON experiment descriptions via `serde`.
//! * Diagnostics are emitted through `tracing`; install any subscriber to
//!   see matrix powers and sampling progress.
//!
//! ---
//! **Security NOTE:** a small exponent or perfection power is a *necessary*
//! property of a good mixing register, never a proof of security.

pub mod bitfield;
pub mod cipher;
pub mod config;
pub mod error;
pub mod exponent;
pub mod matrix;
pub mod mixing;
pub mod perfection;
pub mod register;
pub mod research;
pub mod transform;

pub use cipher::Speck;
pub use config::{ExperimentConfig, ExperimentReport, TransformSpec};
pub use error::{ConfigError, Error, Result};
pub use exponent::{exponent, full_mixing, local_exponent, local_full_mixing, powers_of, Powers};
pub use matrix::BitMatrix;
pub use mixing::{cipher_power_matrix, cipher_round_matrix, register_round_matrix};
pub use perfection::{neighbors, perfection_power, random_samples, Granularity, PerfectionParams};
pub use register::{Combiner, FeedbackRegister, RegisterShape, Step, Steps};
pub use research::{exponent_sweep, perfection_sweep, sort_records, tap_subsets, ExperimentRecord};
#[cfg(feature = "parallel")]
pub use research::{exponent_sweep_par, perfection_sweep_par};
pub use transform::{Identity, MixingStructure, SpeckFeedback, StructuredTransform, SubstitutionTable, Transform};
