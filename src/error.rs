use thiserror::Error;

/// Errors surfaced by this crate to its caller.
///
/// Invariant violations (bad CU geometry, a full HMVP table asked to grow,
/// an out-of-range merge index) are not represented here: those are bugs in
/// the caller or in this crate and are reported via `panic!`/`assert!`,
/// treating malformed input from an internal caller as unrecoverable.
/// This enum only covers failures that originate outside this crate's
/// control.
#[derive(Error, Debug)]
pub enum Error {
  #[error("CABAC sink I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid encoder configuration: {0}")]
  Config(#[from] ConfigError),
}

/// Configuration inconsistencies detected by [`crate::config::EncoderConfig::validate`].
///
/// Unlike internal invariants, these are caller mistakes that can be
/// detected before any encoding work starts, so they are returned rather
/// than panicked.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
  #[error("max_merge must be in 1..={max}, got {got}")]
  MaxMergeOutOfRange { got: u8, max: u8 },

  #[error("log2_parallel_merge_level {got} exceeds log2 CTU size {max}")]
  ParallelMergeLevelTooLarge { got: u8, max: u8 },

  #[error("max_qp_delta_depth {got} exceeds max coding-tree depth {max}")]
  QpDeltaDepthTooLarge { got: u8, max: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;
