// Temporal merge/AMVP candidate derivation: the collocated picture's H and
// C3 positions, and POC-based motion-vector scaling. Grounded on
// `get_temporal_merge_candidates`, `get_scaled_mv`,
// `apply_mv_scaling_pocs` and `apply_mv_scaling` in `inter.c`.

use crate::consts::LCU_SIZE;
use crate::cu::{CuArray, InterInfo};
use crate::mv::Mv;
use crate::mvce::CuGeometry;

/// The two positions within/around the collocated CU that are tried for a
/// temporal candidate: the bottom-right "H" position if available, falling
/// back to the centre "C3" position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalPos {
  H,
  C3
}

impl TemporalPos {
  pub fn position(self, cu: &CuGeometry) -> (i32, i32) {
    match self {
      TemporalPos::H => (cu.right() as i32, cu.bottom() as i32),
      TemporalPos::C3 => ((cu.x + cu.width / 2) as i32, (cu.y + cu.height / 2) as i32)
    }
  }
}

/// Scale a collocated-picture motion vector from the distance between its
/// own reference and the collocated picture (`poc_cur_to_col_ref`) onto the
/// distance between the current picture and the target reference
/// (`poc_cur_to_cur_ref`), per `apply_mv_scaling`/`apply_mv_scaling_pocs`.
///
/// When the two distances are equal the scale factor is exactly 1 and the
/// motion vector is returned unchanged, which is both the common case and
/// the numerically exact one (no rounding error introduced).
pub fn get_scaled_mv(mv: Mv, poc_cur_to_cur_ref: i64, poc_col_to_col_ref: i64) -> Mv {
  if poc_cur_to_cur_ref == poc_col_to_col_ref || poc_col_to_col_ref == 0 {
    return mv;
  }

  // POC distances are clipped to signed-8-bit range before computing `tx`,
  // but the resulting scale factor is clipped to a wider signed-13-bit
  // range: two distinct clamps, not one shared shift (`apply_mv_scaling`).
  const POC_DIST_CLIP: i64 = 128;
  const SCALE_FACTOR_CLIP: i64 = 1 << 12;

  let td = poc_col_to_col_ref.clamp(-POC_DIST_CLIP, POC_DIST_CLIP - 1);
  let tb = poc_cur_to_cur_ref.clamp(-POC_DIST_CLIP, POC_DIST_CLIP - 1);

  let tx = (16384 + (td.abs() >> 1)) / td;
  let scale_factor = ((tb * tx + 32) >> 6).clamp(-SCALE_FACTOR_CLIP, SCALE_FACTOR_CLIP - 1);

  let scale = |c: i32| -> i16 {
    let v = (scale_factor * c as i64 + 127 + if scale_factor * (c as i64) < 0 { 1 } else { 0 }) >> 8;
    v.clamp(-32768, 32767) as i16
  };

  [scale(mv[0]), scale(mv[1])]
}

/// Try to derive a temporal candidate from the collocated picture's CU
/// array at the H position, falling back to C3. `col_poc`/`col_ref_poc` are
/// the collocated picture's own POC and the POC of the reference it used
/// for the given list, needed to compute the scaling distances.
pub fn get_temporal_candidate(
  col_cu_array: &CuArray,
  cu: &CuGeometry,
  list: usize,
  cur_poc: i64,
  cur_ref_poc: i64,
  col_poc: i64,
  col_ref_poc: i64
) -> Option<InterInfo> {
  for pos in [TemporalPos::H, TemporalPos::C3] {
    let (x, y) = pos.position(cu);
    if !col_cu_array.is_inside(x, y) {
      continue;
    }
    // H sits one row of CTUs below the current block; in a
    // parallel-reconstruction pipeline that row's CUs aren't guaranteed to
    // be available yet, so H is forbidden whenever it would cross a CTU
    // row boundary (`get_temporal_merge_candidates`'s `yBr % LCU_WIDTH`
    // check).
    if pos == TemporalPos::H && (y as usize) % LCU_SIZE == 0 {
      continue;
    }

    let col_cu = col_cu_array.get(x as usize, y as usize);
    if !col_cu.is_inter() {
      continue;
    }

    // Prefer the collocated CU's own list-0 motion; fall back to list 1.
    for src_list in [0usize, 1usize] {
      if col_cu.inter.mv_ref[src_list] < 0 {
        continue;
      }
      let scaled = get_scaled_mv(
        col_cu.inter.mv[src_list],
        cur_poc - cur_ref_poc,
        col_poc - col_ref_poc
      );
      let mut info = InterInfo::default();
      info.mv[list] = scaled;
      info.mv_ref[list] = 0;
      return Some(info);
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equal_distance_is_a_no_op() {
    let mv = [10, -4];
    assert_eq!(get_scaled_mv(mv, 4, 4), mv);
  }

  #[test]
  fn doubled_distance_roughly_doubles_the_vector() {
    let mv = [10, -4];
    let scaled = get_scaled_mv(mv, 8, 4);
    assert!(scaled[0] > 18 && scaled[0] < 22);
    assert!(scaled[1] < -6 && scaled[1] > -10);
  }
}
