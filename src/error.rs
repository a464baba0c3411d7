//! Error types shared by every component.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Top-level error.
#[derive(Debug, Error)]
pub enum Error {
    /// A constructor or operation was handed parameters it cannot accept.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The transform (or its mixing matrix) does not match the register cell width.
    #[error("transform is {actual} bits wide but register cells are {expected} bits wide")]
    DomainMismatch { expected: usize, actual: usize },

    /// Powers were requested of a matrix that is not square.
    #[error("matrix is {rows}x{cols}, powers need a square matrix")]
    NotSquare { rows: usize, cols: usize },

    /// An experiment description could not be parsed.
    #[error("malformed experiment configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The precondition that a configuration violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cell width r = {0} must lie in 1..=128")]
    CellWidth(usize),

    #[error("cell count n must be positive")]
    CellCount,

    #[error("tap set is empty")]
    EmptyTaps,

    #[error("{taps} taps requested for a register of {cells} cells")]
    TooManyTaps { taps: usize, cells: usize },

    #[error("tap {tap} is outside the register cells 0..{cells}")]
    TapOutOfRange { tap: usize, cells: usize },

    #[error("taps must include cell 0")]
    MissingNewestTap,

    #[error("tap {0} is listed more than once")]
    DuplicateTap(usize),

    #[error("initial state needs {bits} bits but the register holds {capacity}")]
    StateTooWide { bits: u64, capacity: u64 },

    #[error("matrix power must be at least 1, got {0}")]
    Power(usize),

    #[error("round count must be at least 1, got {0}")]
    Rounds(usize),

    #[error("unsupported cipher block size {0} (expected 32, 48, 64, 96 or 128)")]
    BlockSize(usize),

    #[error("cipher word size {0} must lie in 2..=64")]
    WordSize(u32),

    #[error("rotation amount {amount} must lie in 1..{word_size}")]
    Rotation { amount: u32, word_size: u32 },

    #[error("no standard Speck variant with a {block_size}-bit block and {key_words} key words")]
    KeyLength { block_size: usize, key_words: usize },

    #[error("{entries} entries cannot fill a {rows}x{cols} matrix")]
    EntryCount { rows: usize, cols: usize, entries: usize },

    #[error("sample count must be positive")]
    Samples,

    #[error("column range {start}..{end} does not fit a matrix with {cols} columns")]
    ColumnRange { start: usize, end: usize, cols: usize },

    #[error("substitution table: {0}")]
    SubstitutionTable(&'static str),
}
