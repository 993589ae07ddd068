// Merge candidate list construction: spatial neighbours, temporal
// candidate, HMVP history, a synthesized pairwise-average candidate, and
// zero-motion fill, in that order, capped at the slice's configured
// `max_merge`. Grounded on `kvz_inter_get_merge_cand` in `inter.c`.

use crate::cu::{CuArray, HmvpTable, InterInfo};
use crate::enums::{CandSource, PredDirection};
use crate::mv::round_avg_mv;
use crate::mvce::spatial::{different_mer, is_available, SpatialPos};
use crate::mvce::temporal::get_temporal_candidate;
use crate::mvce::{Candidate, CuGeometry};

/// Spatial positions tried, in the exact order `kvz_inter_get_merge_cand`
/// tries them. B2 is conditional (only tried while the list still has room
/// for a 5th entry after A0).
const SPATIAL_ORDER: [SpatialPos; 5] = [
  SpatialPos::B1,
  SpatialPos::A1,
  SpatialPos::B0,
  SpatialPos::A0,
  SpatialPos::B2
];

fn same_motion(a: &InterInfo, b: &InterInfo) -> bool {
  a.mv_dir as u8 == b.mv_dir as u8 && a.mv_ref == b.mv_ref && a.mv == b.mv
}

fn is_duplicate(list: &[Candidate], info: &InterInfo) -> bool {
  list.iter().any(|c| same_motion(&c.info, info))
}

#[allow(clippy::too_many_arguments)]
pub fn build_merge_list(
  cu_array: &CuArray,
  cu: &CuGeometry,
  max_num_cands: usize,
  log2_parallel_merge_level: u8,
  lcu_size: usize,
  tmvp_enable: bool,
  col_cu_array: Option<&CuArray>,
  cur_poc: i64,
  cur_ref_poc_l0: i64,
  cur_ref_poc_l1: i64,
  col_poc: i64,
  col_ref_poc: i64,
  hmvp: &HmvpTable,
  is_b_slice: bool,
  num_refs: usize
) -> Vec<Candidate> {
  let mut list: Vec<Candidate> = Vec::with_capacity(max_num_cands);
  let mut a1_info: Option<InterInfo> = None;
  let mut b1_info: Option<InterInfo> = None;

  // Step 1-5: spatial neighbours, B2 only considered once the other four
  // have had their chance and the list isn't already full.
  for (i, &pos) in SPATIAL_ORDER.iter().enumerate() {
    if list.len() >= max_num_cands {
      break;
    }
    if pos == SpatialPos::B2 && list.len() >= 4 {
      continue;
    }
    if !is_available(cu_array, cu, pos, lcu_size) {
      continue;
    }
    let (dx, dy) = pos.mer_offset();
    if !different_mer(cu, dx, dy, log2_parallel_merge_level) {
      continue;
    }
    let (nx, ny) = pos.position(cu);
    let ncu = cu_array.get(nx as usize, ny as usize);
    if !ncu.is_inter() {
      continue;
    }
    let source = match i {
      0 => CandSource::B1,
      1 => CandSource::A1,
      2 => CandSource::B0,
      3 => CandSource::A0,
      _ => CandSource::B2
    };
    // Each position de-duplicates only against its own designated
    // predecessor(s), not the whole list so far: A1/B0 against B1, A0
    // against A1, B2 against both A1 and B1; B1 itself is never a
    // duplicate of anything already in the list.
    let duplicate = match source {
      CandSource::A1 | CandSource::B0 => b1_info.is_some_and(|b1| same_motion(&b1, &ncu.inter)),
      CandSource::A0 => a1_info.is_some_and(|a1| same_motion(&a1, &ncu.inter)),
      CandSource::B2 => {
        a1_info.is_some_and(|a1| same_motion(&a1, &ncu.inter)) || b1_info.is_some_and(|b1| same_motion(&b1, &ncu.inter))
      }
      _ => false
    };
    if duplicate {
      continue;
    }
    if source == CandSource::A1 {
      a1_info = Some(ncu.inter);
    } else if source == CandSource::B1 {
      b1_info = Some(ncu.inter);
    }
    list.push(Candidate { source, info: ncu.inter });
  }

  // Step 6: temporal candidate, derived independently for each list so a
  // bi-predictive CU's merge candidate can carry both.
  if tmvp_enable && list.len() < max_num_cands {
    if let Some(col_array) = col_cu_array {
      let l0 = get_temporal_candidate(col_array, cu, 0, cur_poc, cur_ref_poc_l0, col_poc, col_ref_poc);
      let l1 = get_temporal_candidate(col_array, cu, 1, cur_poc, cur_ref_poc_l1, col_poc, col_ref_poc);

      if l0.is_some() || l1.is_some() {
        let mut info = InterInfo::default();
        if let Some(c) = l0 {
          info.mv[0] = c.mv[0];
          info.mv_ref[0] = 0;
        }
        if let Some(c) = l1 {
          info.mv[1] = c.mv[1];
          info.mv_ref[1] = 0;
        }
        info.mv_dir = match (info.mv_ref[0] >= 0, info.mv_ref[1] >= 0) {
          (true, true) => PredDirection::Bi,
          (true, false) => PredDirection::List0,
          _ => PredDirection::List1
        };
        if !is_duplicate(&list, &info) {
          list.push(Candidate { source: CandSource::Temporal, info });
        }
      }
    }
  }

  // Step 7: history-based candidates, newest first (index 0 of the table
  // is always the most recently inserted entry). Only the first two
  // entries are gated against duplicating A1/B1 specifically; entries
  // beyond that are accepted unconditionally rather than deduplicating
  // every HMVP entry against the whole list-so-far.
  if list.len() < max_num_cands {
    for (i, entry) in hmvp.iter().enumerate() {
      if list.len() >= max_num_cands {
        break;
      }
      if i < 2 {
        let dups_a1 = a1_info.is_some_and(|a1| is_duplicate(&[Candidate { source: CandSource::A1, info: a1 }], entry));
        let dups_b1 = b1_info.is_some_and(|b1| is_duplicate(&[Candidate { source: CandSource::B1, info: b1 }], entry));
        if dups_a1 || dups_b1 {
          continue;
        }
      }
      list.push(Candidate { source: CandSource::Hmvp, info: *entry });
    }
  }

  // Step 8: pairwise-average candidate synthesized from the first two
  // candidates currently in the list, one component average per list that
  // both candidates actually reference.
  if list.len() < max_num_cands && list.len() >= 2 {
    let a = list[0].info;
    let b = list[1].info;
    let mut info = InterInfo::default();
    for l in 0..2 {
      match (a.mv_ref[l] >= 0, b.mv_ref[l] >= 0) {
        (true, true) => {
          info.mv[l] = round_avg_mv(a.mv[l], b.mv[l]);
          info.mv_ref[l] = 0;
        }
        (true, false) => {
          info.mv[l] = a.mv[l];
          info.mv_ref[l] = a.mv_ref[l];
        }
        (false, true) => {
          info.mv[l] = b.mv[l];
          info.mv_ref[l] = b.mv_ref[l];
        }
        (false, false) => {}
      }
    }
    if info.mv_ref[0] >= 0 || info.mv_ref[1] >= 0 {
      info.mv_dir = match (info.mv_ref[0] >= 0, info.mv_ref[1] >= 0) {
        (true, true) => PredDirection::Bi,
        (true, false) => PredDirection::List0,
        _ => PredDirection::List1
      };
      list.push(Candidate { source: CandSource::PairwiseAvg, info });
    }
  }

  // Step 9: zero-motion fill. Direction is List0 for P-slices, Bi for
  // B-slices; the reference index cycles 0, 1, ... until it reaches
  // `num_refs`, then sticks at the last value reached.
  let mut zero_ref_idx: i8 = 0;
  while list.len() < max_num_cands {
    let mut info = InterInfo::default();
    info.mv[0] = [0, 0];
    info.mv_ref[0] = zero_ref_idx;
    if is_b_slice {
      info.mv[1] = [0, 0];
      info.mv_ref[1] = zero_ref_idx;
      info.mv_dir = PredDirection::Bi;
    } else {
      info.mv_dir = PredDirection::List0;
    }
    list.push(Candidate { source: CandSource::Zero, info });
    if ((zero_ref_idx as usize) + 1) < num_refs.max(1) {
      zero_ref_idx += 1;
    }
  }

  list.truncate(max_num_cands);
  list
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cu::Cu;
  use crate::enums::CuType;

  fn geom(x: usize, y: usize, w: usize, h: usize) -> CuGeometry {
    CuGeometry { x, y, width: w, height: h }
  }

  #[test]
  fn empty_neighbourhood_fills_with_zero_candidates() {
    let cu_array = CuArray::new(64, 64);
    let cu = geom(0, 0, 8, 8);
    let hmvp = HmvpTable::new();
    let list = build_merge_list(&cu_array, &cu, 5, 2, 64, false, None, 0, 0, 0, 0, 0, &hmvp, false, 1);
    assert_eq!(list.len(), 5);
    assert!(list.iter().all(|c| matches!(c.source, CandSource::Zero)));
  }

  #[test]
  fn left_neighbour_is_picked_up_as_a1() {
    let mut cu_array = CuArray::new(64, 64);
    let mut left = Cu::default();
    left.cu_type = Some(CuType::Inter);
    left.inter.mv[0] = [4, -2];
    left.inter.mv_ref[0] = 0;
    left.inter.mv_dir = PredDirection::List0;
    cu_array.fill_cu(0, 0, 4, 8, left);

    let cu = geom(4, 0, 8, 8);
    let hmvp = HmvpTable::new();
    let list = build_merge_list(&cu_array, &cu, 5, 2, 64, false, None, 0, 0, 0, 0, 0, &hmvp, false, 1);
    assert!(matches!(list[0].source, CandSource::A1));
    assert_eq!(list[0].info.mv[0], [4, -2]);
  }
}
