// The parameter surface CTES, MVCE and IPR read directly. Parsing these
// values in from a CLI or a config file is out of scope for this crate;
// callers construct an `EncoderConfig` however suits them and hand it in.

use crate::consts::{LOG2_LCU_SIZE, MAX_CODING_TREE_DEPTH, MRG_MAX_NUM_CANDS};
use crate::enums::{ChromaFormat, MtsMode};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct EncoderConfig {
  pub mts: MtsMode,
  pub tmvp_enable: bool,
  pub log2_parallel_merge_level: u8,
  pub max_merge: u8,
  pub wpp: bool,
  pub bipred: bool,
  pub lossless: bool,
  pub max_qp_delta_depth: u8,
  pub chroma_format: ChromaFormat,
  pub amp_enable: bool
}

impl Default for EncoderConfig {
  fn default() -> Self {
    Self {
      mts: MtsMode::Off,
      tmvp_enable: true,
      log2_parallel_merge_level: 2,
      max_merge: 5,
      wpp: false,
      bipred: true,
      lossless: false,
      max_qp_delta_depth: 0,
      chroma_format: ChromaFormat::Yuv420,
      amp_enable: false
    }
  }
}

impl EncoderConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.max_merge < 1 || self.max_merge as usize > MRG_MAX_NUM_CANDS {
      return Err(ConfigError::MaxMergeOutOfRange {
        got: self.max_merge,
        max: MRG_MAX_NUM_CANDS as u8
      });
    }

    if self.log2_parallel_merge_level as u32 > LOG2_LCU_SIZE {
      return Err(ConfigError::ParallelMergeLevelTooLarge {
        got: self.log2_parallel_merge_level,
        max: LOG2_LCU_SIZE as u8
      });
    }

    if self.max_qp_delta_depth > MAX_CODING_TREE_DEPTH {
      return Err(ConfigError::QpDeltaDepthTooLarge {
        got: self.max_qp_delta_depth,
        max: MAX_CODING_TREE_DEPTH
      });
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_is_valid() {
    assert!(EncoderConfig::default().validate().is_ok());
  }

  #[test]
  fn max_merge_out_of_range_is_rejected() {
    let mut cfg = EncoderConfig::default();
    cfg.max_merge = 0;
    assert!(cfg.validate().is_err());

    cfg.max_merge = (MRG_MAX_NUM_CANDS + 1) as u8;
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn parallel_merge_level_too_large_is_rejected() {
    let mut cfg = EncoderConfig::default();
    cfg.log2_parallel_merge_level = (LOG2_LCU_SIZE + 1) as u8;
    assert!(matches!(cfg.validate(), Err(ConfigError::ParallelMergeLevelTooLarge { .. })));
  }
}
