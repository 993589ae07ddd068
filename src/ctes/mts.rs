// Multiple Transform Selection index emission. Grounded on `is_mts_allowed`
// and `encode_mts_idx` in `encode_coding_tree.c`.

use crate::cabac::{CabacCtx, CabacEncoder};
use crate::cu::Cu;
use crate::enums::{CuType, MtsMode};

/// Whether this CU's transform unit is even eligible to carry an MTS index:
/// MTS must be enabled for this CU's prediction kind, the block must be
/// within the core-only transform size range, and it must not already be
/// using the transform-skip path (lossless / transquant-bypass).
pub fn is_mts_allowed(mts: MtsMode, cu: &Cu, tu_width: usize, tu_height: usize, lossless: bool) -> bool {
  if lossless {
    return false;
  }
  let enabled_for_kind = match mts {
    MtsMode::Off => false,
    MtsMode::Intra => cu.is_intra(),
    MtsMode::Inter => !cu.is_intra(),
    MtsMode::Both => true
  };
  if !enabled_for_kind {
    return false;
  }
  (4..=32).contains(&tu_width) && (4..=32).contains(&tu_height)
}

/// Truncated-unary MTS index in `0..=3`, context-coded, no bypass bits:
/// matches `encode_mts_idx`'s three-bin unary code.
pub fn encode_mts_idx(cabac: &mut CabacEncoder, ctx: &mut [CabacCtx; 3], mts_idx: u8) {
  cabac.write_unary_max_symbol(ctx, mts_idx as u32, 3);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mts_off_is_never_allowed() {
    let cu = Cu { cu_type: Some(CuType::Intra), ..Default::default() };
    assert!(!is_mts_allowed(MtsMode::Off, &cu, 8, 8, false));
  }

  #[test]
  fn mts_intra_only_excludes_inter_cus() {
    let cu = Cu { cu_type: Some(CuType::Inter), ..Default::default() };
    assert!(!is_mts_allowed(MtsMode::Intra, &cu, 8, 8, false));
  }

  #[test]
  fn mts_inter_only_excludes_intra_cus() {
    let cu = Cu { cu_type: Some(CuType::Intra), ..Default::default() };
    assert!(!is_mts_allowed(MtsMode::Inter, &cu, 8, 8, false));
  }

  #[test]
  fn mts_both_allows_inter_cus_within_size_range() {
    let cu = Cu { cu_type: Some(CuType::Inter), ..Default::default() };
    assert!(is_mts_allowed(MtsMode::Both, &cu, 8, 8, false));
  }

  #[test]
  fn lossless_disables_mts_unconditionally() {
    let cu = Cu { cu_type: Some(CuType::Intra), ..Default::default() };
    assert!(!is_mts_allowed(MtsMode::Both, &cu, 8, 8, true));
  }
}
