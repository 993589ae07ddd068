// Intra coding-unit emission: per-PU most-probable-mode derivation and
// luma mode signalling, plus chroma mode. Grounded on
// `encode_intra_coding_unit` in `encode_coding_tree.c`; the MPM candidate
// list itself follows the general shape of `kvz_intra_get_dir_luma_predictor`
// (equal/unequal-neighbour cases, offset-derived extra candidates, a
// directional-mode default set) since that helper's body is not part of
// the traced source kept alongside `encode_coding_tree.c`, making it a
// faithful reimplementation of the general HEVC MPM shape rather than a
// line-for-line trace.

use crate::cabac::{CabacCtx, CabacEncoder};
use crate::consts::{INTRA_MODE_COUNT, INTRA_MPM_COUNT};
use crate::enums::PartSize;

pub struct IntraCtx {
  pub prev_intra_luma_pred_flag: CabacCtx,
  pub mpm_idx_luma_planar: [CabacCtx; 2],
  pub chroma_derived_mode: CabacCtx
}

impl IntraCtx {
  pub fn new() -> Self {
    Self {
      prev_intra_luma_pred_flag: CabacCtx::new(),
      mpm_idx_luma_planar: [CabacCtx::new(); 2],
      chroma_derived_mode: CabacCtx::new()
    }
  }
}

impl Default for IntraCtx {
  fn default() -> Self {
    Self::new()
  }
}

pub const PLANAR_MODE: u8 = 0;
pub const DC_MODE: u8 = 1;

/// Default directional fan used to pad the MPM list once the two
/// neighbour-derived candidates (or their offset siblings) run out, in the
/// same spirit as the fixed fallback set `kvz_intra_get_dir_luma_predictor`
/// reaches for when the neighbourhood alone can't fill six entries.
const DEFAULT_FAN: [u8; 3] = [50, 18, 34]; // vertical, horizontal, diagonal

/// Build the six-entry most-probable-mode shortlist for one PU from its
/// left and above neighbours' luma intra modes, each already `None` if
/// unavailable (off-picture, or an inter/PCM neighbour) or clipped across
/// the LCU boundary (the `above_pu` caller-side rule in
/// `encode_intra_coding_unit`: the above neighbour is not read once it
/// would cross into a different LCU row).
pub fn derive_mpm_list(left: Option<u8>, above: Option<u8>) -> [u8; INTRA_MPM_COUNT] {
  let cand_a = left.unwrap_or(DC_MODE);
  let cand_b = above.unwrap_or(DC_MODE);

  let mut list = [0u8; INTRA_MPM_COUNT];
  let mut n = 0;
  let mut push = |list: &mut [u8; INTRA_MPM_COUNT], n: &mut usize, mode: u8| {
    if *n < INTRA_MPM_COUNT && !list[..*n].contains(&mode) {
      list[*n] = mode;
      *n += 1;
    }
  };

  if cand_a == cand_b {
    if cand_a < 2 {
      // Both neighbours non-directional: seed with planar/DC then the
      // default directional fan.
      push(&mut list, &mut n, PLANAR_MODE);
      push(&mut list, &mut n, DC_MODE);
      for &m in &DEFAULT_FAN {
        push(&mut list, &mut n, m);
      }
    } else {
      // Both neighbours share one directional mode: that mode plus its two
      // immediate angular neighbours, then planar/DC, then a fallback.
      push(&mut list, &mut n, cand_a);
      push(&mut list, &mut n, 2 + (cand_a as u32 + 61) as u8 % 65);
      push(&mut list, &mut n, 2 + (cand_a as u32 - 2 + 1) as u8 % 65);
      push(&mut list, &mut n, PLANAR_MODE);
      push(&mut list, &mut n, DC_MODE);
      push(&mut list, &mut n, 34);
    }
  } else {
    push(&mut list, &mut n, cand_a);
    push(&mut list, &mut n, cand_b);
    if cand_a != PLANAR_MODE && cand_b != PLANAR_MODE {
      push(&mut list, &mut n, PLANAR_MODE);
    } else if cand_a != DC_MODE && cand_b != DC_MODE {
      push(&mut list, &mut n, DC_MODE);
    } else {
      push(&mut list, &mut n, 34);
    }
    for &m in &DEFAULT_FAN {
      push(&mut list, &mut n, m);
    }
  }

  list
}

/// `prev_intra_luma_pred_flag` plus, if set, `mpm_idx`: a context-coded
/// "index > 0" bin then 0-4 bypass bins comparing the index to a rising
/// threshold (`encode_intra_coding_unit`'s MPM-index binarisation).
/// Returns whether the mode was found in the MPM list (mirroring the
/// caller-visible `flag[j]` in the original).
pub fn encode_luma_mode(cabac: &mut CabacEncoder, ctx: &mut IntraCtx, mode: u8, mpm: &[u8; INTRA_MPM_COUNT]) -> bool {
  let mpm_idx = mpm.iter().position(|&m| m == mode);
  let in_mpm = mpm_idx.is_some();
  cabac.encode_bin(&mut ctx.prev_intra_luma_pred_flag, in_mpm as u32);

  if let Some(idx) = mpm_idx {
    cabac.encode_bin(&mut ctx.mpm_idx_luma_planar[0], (idx > 0) as u32);
    // Cascading bypass bins: each compares the index to the next
    // threshold, but only while the previous comparison was still true
    // (`encode_intra_coding_unit`'s chain of `if (mpm_preds[j] > k)`).
    let mut still_greater = idx > 0;
    for threshold in 1..INTRA_MPM_COUNT - 1 {
      if !still_greater {
        break;
      }
      still_greater = idx > threshold;
      cabac.encode_bin_ep(still_greater as u32);
    }
  } else {
    encode_rem_intra_luma_pred_mode(cabac, mode, mpm);
  }

  in_mpm
}

/// The "mode not in MPM" branch: sort the six MPM candidates as two
/// 3-long runs then merge them, subtract one from the target mode for
/// every MPM candidate below it (so the remaining code never collides
/// with an already-signalled MPM entry), then emit the reduced value as a
/// truncated-binary code over the remaining `67 - INTRA_MPM_COUNT` symbols
/// (`encode_intra_coding_unit`'s improvised-merge-sort block).
fn encode_rem_intra_luma_pred_mode(cabac: &mut CabacEncoder, mode: u8, mpm: &[u8; INTRA_MPM_COUNT]) {
  let mut sorted = *mpm;
  sorted.sort_unstable();

  let mut tmp_pred = mode;
  for &m in sorted.iter().rev() {
    if tmp_pred > m {
      tmp_pred -= 1;
    }
  }

  cabac.encode_trunc_bin(tmp_pred as u32, (INTRA_MODE_COUNT - INTRA_MPM_COUNT) as u32);
}

/// Chroma prediction mode: only the "derived" path is live in the traced
/// source (the non-derived binarisation is commented out and incomplete
/// there); this module emits exactly that one context-coded bin and infers
/// the chroma mode from luma, rather than guessing a binarisation for the
/// dead branch.
pub fn encode_chroma_mode(cabac: &mut CabacEncoder, ctx: &mut IntraCtx) {
  cabac.encode_bin(&mut ctx.chroma_derived_mode, 0);
}

/// Number of PUs an intra CU's partition shape decomposes into: `2Nx2N`
/// and `NxN` are the only two partition shapes valid for intra CUs.
pub fn num_intra_pred_units(part_size: PartSize) -> usize {
  part_size.num_parts()
}

/// Position (within the CU) of PU `idx` for a given partition shape and CU
/// size, following `PU_GET_X`/`PU_GET_Y`: `2Nx2N` has one PU at the CU's
/// own origin; `NxN` quarters the CU into a 2x2 grid.
pub fn pu_offset(part_size: PartSize, cu_width: usize, idx: usize) -> (usize, usize) {
  match part_size {
    PartSize::SizeNxN => {
      let half = cu_width / 2;
      (half * (idx % 2), half * (idx / 2))
    }
    _ => (0, 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equal_nondirectional_neighbours_seed_planar_and_dc_first() {
    let mpm = derive_mpm_list(Some(DC_MODE), Some(DC_MODE));
    assert_eq!(mpm[0], PLANAR_MODE);
    assert_eq!(mpm[1], DC_MODE);
  }

  #[test]
  fn mpm_list_has_no_duplicates() {
    let mpm = derive_mpm_list(Some(12), Some(40));
    for i in 0..mpm.len() {
      for j in (i + 1)..mpm.len() {
        assert_ne!(mpm[i], mpm[j]);
      }
    }
  }

  #[test]
  fn mode_in_mpm_at_index_zero_codes_without_suffix_bins() {
    let mut cabac = CabacEncoder::new();
    let mut ctx = IntraCtx::new();
    let mpm = derive_mpm_list(None, None);
    let found = encode_luma_mode(&mut cabac, &mut ctx, mpm[0], &mpm);
    assert!(found);
  }

  #[test]
  fn nxn_partition_covers_cu_in_a_2x2_grid() {
    assert_eq!(pu_offset(PartSize::SizeNxN, 16, 0), (0, 0));
    assert_eq!(pu_offset(PartSize::SizeNxN, 16, 1), (8, 0));
    assert_eq!(pu_offset(PartSize::SizeNxN, 16, 2), (0, 8));
    assert_eq!(pu_offset(PartSize::SizeNxN, 16, 3), (8, 8));
  }

  #[test]
  fn two_nx_two_n_is_a_single_pu_at_the_origin() {
    assert_eq!(num_intra_pred_units(PartSize::Size2Nx2N), 1);
    assert_eq!(pu_offset(PartSize::Size2Nx2N, 16, 0), (0, 0));
  }
}
