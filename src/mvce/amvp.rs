// AMVP (advanced motion vector prediction) list construction: always
// exactly two predictors. Grounded on `kvz_inter_get_mv_cand` /
// `kvz_inter_get_mv_cand_cua` and `add_mvp_candidate` in `inter.c`.

use crate::consts::{AMVP_MAX_NUM_CANDS, INTERNAL_MV_PREC};
use crate::cu::{CuArray, HmvpTable};
use crate::mv::{round_precision_mv, Mv};
use crate::mvce::spatial::{is_available, SpatialPos};
use crate::mvce::temporal::get_temporal_candidate;
use crate::mvce::CuGeometry;

/// Quarter-pel, the precision candidates are advertised at externally
/// (§4.2.3's final rounding step).
const QUARTER_PEL_PREC: u32 = 2;

/// HMVP-fill gives each of the table's first four entries (newest first) a
/// chance, matching the merge list's own HMVP pass in spirit but capped to
/// four entries per `kvz_inter_get_mv_cand`'s HMVP loop bound.
const HMVP_FILL_LIMIT: usize = 4;

/// First group checked: the below-left, then left neighbour (A0, A1).
const LEFT_GROUP: [SpatialPos; 2] = [SpatialPos::A0, SpatialPos::A1];
/// Second group checked: above-right, above, above-left (B0, B1, B2).
const ABOVE_GROUP: [SpatialPos; 3] = [SpatialPos::B0, SpatialPos::B1, SpatialPos::B2];

/// Within one neighbour group, the first candidate whose reference index
/// and list match the target exactly is used; failing that, the first one
/// pointing at a reference with the same POC (scaled) is used.
/// `add_mvp_candidate` applies this same "exact match first, scaled match
/// second" rule per group.
fn pick_from_group(
  cu_array: &CuArray,
  cu: &CuGeometry,
  group: &[SpatialPos],
  list: usize,
  target_ref_poc: i64,
  cur_poc: i64,
  lcu_size: usize,
  poc_of_ref: impl Fn(usize, i8) -> i64
) -> Option<Mv> {
  // First pass: exact reference match.
  for &pos in group {
    if !is_available(cu_array, cu, pos, lcu_size) {
      continue;
    }
    let (nx, ny) = pos.position(cu);
    let ncu = cu_array.get(nx as usize, ny as usize);
    if !ncu.is_inter() {
      continue;
    }
    for src_list in [list, 1 - list] {
      let ref_idx = ncu.inter.mv_ref[src_list];
      if ref_idx < 0 {
        continue;
      }
      if poc_of_ref(src_list, ref_idx) == target_ref_poc {
        return Some(ncu.inter.mv[src_list]);
      }
    }
  }

  // Second pass: scale whatever's available onto the target distance.
  for &pos in group {
    if !is_available(cu_array, cu, pos, lcu_size) {
      continue;
    }
    let (nx, ny) = pos.position(cu);
    let ncu = cu_array.get(nx as usize, ny as usize);
    if !ncu.is_inter() {
      continue;
    }
    for src_list in [list, 1 - list] {
      let ref_idx = ncu.inter.mv_ref[src_list];
      if ref_idx < 0 {
        continue;
      }
      let src_ref_poc = poc_of_ref(src_list, ref_idx);
      let scaled = crate::mvce::temporal::get_scaled_mv(
        ncu.inter.mv[src_list],
        cur_poc - target_ref_poc,
        cur_poc - src_ref_poc
      );
      return Some(scaled);
    }
  }

  None
}

/// Build the two-entry AMVP predictor list for one reference list of the CU
/// at `cu`. `poc_of_ref(list, ref_idx)` resolves a neighbour's reference
/// index back to a POC so candidates can be compared/scaled against the
/// target reference; `col_candidate` is the (already scaled, if available)
/// temporal candidate to fall back on.
pub fn build_amvp_list(
  cu_array: &CuArray,
  cu: &CuGeometry,
  list: usize,
  target_ref_poc: i64,
  cur_poc: i64,
  lcu_size: usize,
  tmvp_enable: bool,
  col_cu_array: Option<&CuArray>,
  col_poc: i64,
  col_ref_poc: i64,
  hmvp: &HmvpTable,
  poc_of_ref: impl Fn(usize, i8) -> i64
) -> [Mv; AMVP_MAX_NUM_CANDS] {
  let mut cands: Vec<Mv> = Vec::with_capacity(AMVP_MAX_NUM_CANDS);

  if let Some(mv) = pick_from_group(cu_array, cu, &LEFT_GROUP, list, target_ref_poc, cur_poc, lcu_size, &poc_of_ref) {
    cands.push(mv);
  }
  if let Some(mv) = pick_from_group(cu_array, cu, &ABOVE_GROUP, list, target_ref_poc, cur_poc, lcu_size, &poc_of_ref) {
    if !cands.contains(&mv) {
      cands.push(mv);
    }
  }

  if cands.len() < AMVP_MAX_NUM_CANDS && tmvp_enable {
    if let Some(col_array) = col_cu_array {
      if let Some(temporal) = get_temporal_candidate(col_array, cu, list, cur_poc, target_ref_poc, col_poc, col_ref_poc) {
        let mv = temporal.mv[list];
        if !cands.contains(&mv) {
          cands.push(mv);
        }
      }
    }
  }

  // HMVP fill: walk the first four history entries (newest first), trying
  // both lists in same-then-cross order, accepting only an exact
  // reference match (`kvz_inter_get_mv_cand`'s HMVP loop).
  if cands.len() < AMVP_MAX_NUM_CANDS {
    for entry in hmvp.iter().take(HMVP_FILL_LIMIT) {
      if cands.len() >= AMVP_MAX_NUM_CANDS {
        break;
      }
      for src_list in [list, 1 - list] {
        let ref_idx = entry.mv_ref[src_list];
        if ref_idx < 0 {
          continue;
        }
        if poc_of_ref(src_list, ref_idx) == target_ref_poc {
          let mv = entry.mv[src_list];
          if !cands.contains(&mv) {
            cands.push(mv);
          }
          break;
        }
      }
    }
  }

  while cands.len() < AMVP_MAX_NUM_CANDS {
    cands.push([0, 0]);
  }
  cands.truncate(AMVP_MAX_NUM_CANDS);

  // Final rounding to the externally advertised quarter-pel precision.
  [
    round_precision_mv(cands[0], INTERNAL_MV_PREC, QUARTER_PEL_PREC),
    round_precision_mv(cands[1], INTERNAL_MV_PREC, QUARTER_PEL_PREC)
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cu::Cu;
  use crate::enums::{CuType, PredDirection};

  fn geom(x: usize, y: usize, w: usize, h: usize) -> CuGeometry {
    CuGeometry { x, y, width: w, height: h }
  }

  #[test]
  fn empty_neighbourhood_fills_with_zero_candidates() {
    let cu_array = CuArray::new(64, 64);
    let cu = geom(0, 0, 8, 8);
    let hmvp = HmvpTable::new();
    let cands = build_amvp_list(&cu_array, &cu, 0, 0, 0, 64, false, None, 0, 0, &hmvp, |_, _| 0);
    assert_eq!(cands, [[0, 0], [0, 0]]);
  }

  #[test]
  fn left_neighbour_with_matching_reference_is_used_exactly() {
    let mut cu_array = CuArray::new(64, 64);
    let mut left = Cu::default();
    left.cu_type = Some(CuType::Inter);
    left.inter.mv[0] = [8, -4];
    left.inter.mv_ref[0] = 0;
    left.inter.mv_dir = PredDirection::List0;
    cu_array.fill_cu(0, 0, 4, 8, left);

    let cu = geom(4, 0, 8, 8);
    let hmvp = HmvpTable::new();
    let cands = build_amvp_list(&cu_array, &cu, 0, 100, 200, 64, false, None, 0, 0, &hmvp, |_, _| 100);
    assert_eq!(cands[0], [8, -4]);
  }

  #[test]
  fn hmvp_fill_matches_on_exact_reference_poc() {
    let cu_array = CuArray::new(64, 64);
    let cu = geom(0, 0, 8, 8);
    let mut hmvp = HmvpTable::new();
    let mut entry = crate::cu::InterInfo::default();
    entry.mv[0] = [16, 16];
    entry.mv_ref[0] = 0;
    entry.mv_dir = PredDirection::List0;
    hmvp.add(entry, 0, 0, 8, 8, 2);

    let cands = build_amvp_list(&cu_array, &cu, 0, 50, 200, 64, false, None, 0, 0, &hmvp, |_, _| 50);
    assert_eq!(cands[0], [16, 16]);
    assert_eq!(cands[1], [0, 0]);
  }
}

