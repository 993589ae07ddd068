// Spatial merge/AMVP candidate derivation: the five neighbour positions
// A0, A1, B0, B1, B2 and the coding-order availability checks that gate
// them. Grounded on `get_spatial_merge_candidates`,
// `get_spatial_merge_candidates_cua`, `is_a0_cand_coded` and
// `is_b0_cand_coded` in `inter.c`.

use crate::cu::CuArray;
use crate::mvce::CuGeometry;

/// The five canonical spatial neighbour positions relative to a CU, named
/// the way the reference algorithm names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialPos {
  A0,
  A1,
  B0,
  B1,
  B2
}

impl SpatialPos {
  /// Luma pixel position of this neighbour, which may fall outside the
  /// picture or in an SCU that hasn't been coded yet.
  pub fn position(self, cu: &CuGeometry) -> (i32, i32) {
    match self {
      // Below-left of the CU.
      SpatialPos::A0 => (cu.x as i32 - 1, cu.bottom() as i32),
      // Directly left of the CU.
      SpatialPos::A1 => (cu.x as i32 - 1, cu.bottom() as i32 - 1),
      // Above-right of the CU.
      SpatialPos::B0 => (cu.right() as i32, cu.y as i32 - 1),
      // Directly above the CU.
      SpatialPos::B1 => (cu.right() as i32 - 1, cu.y as i32 - 1),
      // Above-left of the CU.
      SpatialPos::B2 => (cu.x as i32 - 1, cu.y as i32 - 1)
    }
  }

  /// Fixed unit offset from the CU's own origin `(x, y)` used by the MER
  /// gate (`different_mer`), as distinct from [`position`](Self::position)'s
  /// actual addressed neighbour sample: spec.md §4.2.4 names each position's
  /// MER check against a fixed offset of the CU origin (`B1=MER(0,-1)`,
  /// `A1=MER(-1,0)`, `B0=MER(+1,-1)`, `A0=MER(-1,+1)`, `B2=MER(-1,-1)`),
  /// independent of the CU's width/height, rather than against the
  /// width/height-dependent neighbour pixel itself.
  pub fn mer_offset(self) -> (i32, i32) {
    match self {
      SpatialPos::A0 => (-1, 1),
      SpatialPos::A1 => (-1, 0),
      SpatialPos::B0 => (1, -1),
      SpatialPos::B1 => (0, -1),
      SpatialPos::B2 => (-1, -1)
    }
  }
}

/// Whether the A0 (below-left) neighbour has actually been coded yet, as
/// distinct from merely lying inside the picture: in Z-scan coding order a
/// CU's below-left neighbour can still be in the future relative to it, so
/// in-bounds alone is not sufficient (`is_a0_cand_coded`).
pub fn is_a0_cand_coded(cu: &CuGeometry, lcu_size: usize) -> bool {
  // A0 is only ever coded already if it lies in an LCU row/column that has
  // already been fully processed, i.e. the below-left pixel is inside an
  // LCU strictly above-or-left of the one the bottom-right of this CU sits
  // in along the diagonal coding order.
  let cu_lcu_x = cu.x / lcu_size;
  let cu_lcu_y = cu.y / lcu_size;
  let a0_lcu_x = (cu.x.wrapping_sub(1)) / lcu_size;
  let a0_lcu_y = cu.bottom() / lcu_size;

  if a0_lcu_y == cu_lcu_y {
    // Same LCU row: A0 is coded only if it's within the same LCU and above
    // the current CU's own bottom edge, i.e. strictly within already-coded
    // Z-order.
    cu.bottom() % lcu_size != 0
  } else {
    // A0 falls in the LCU row below the current one; only coded already if
    // that row has already been processed, which in raster LCU order never
    // happens before the current row finishes.
    a0_lcu_y < cu_lcu_y || a0_lcu_x < cu_lcu_x
  }
}

/// Whether the B0 (above-right) neighbour has been coded yet
/// (`is_b0_cand_coded`): true unless it falls in an LCU to the right of the
/// current one that hasn't been reached in raster LCU scan order yet.
pub fn is_b0_cand_coded(cu: &CuGeometry, lcu_size: usize) -> bool {
  let cu_lcu_x = cu.x / lcu_size;
  let cu_lcu_y = cu.y / lcu_size;
  let b0_lcu_x = cu.right() / lcu_size;
  let b0_lcu_y = (cu.y.wrapping_sub(1)) / lcu_size;

  b0_lcu_y < cu_lcu_y || (b0_lcu_y == cu_lcu_y && b0_lcu_x <= cu_lcu_x)
}

/// Returns `true` if the given spatial neighbour is available: inside the
/// picture, already coded in scan order, and (for inter candidates) not
/// itself an intra CU.
pub fn is_available(cu_array: &CuArray, cu: &CuGeometry, pos: SpatialPos, lcu_size: usize) -> bool {
  let (nx, ny) = pos.position(cu);
  if !cu_array.is_inside(nx, ny) {
    return false;
  }

  match pos {
    SpatialPos::A0 => is_a0_cand_coded(cu, lcu_size),
    SpatialPos::B0 => is_b0_cand_coded(cu, lcu_size),
    // A1, B1, B2 are always either already coded or not applicable; no
    // extra coding-order gate beyond being inside the picture.
    _ => true
  }
}

/// Motion-estimation-region index a pixel position falls in, used to keep
/// merge candidate derivation parallel-decodable: two positions in the same
/// MER must not reference each other.
fn mer_index(x: usize, y: usize, log2_parallel_merge_level: u8) -> (usize, usize) {
  (x >> log2_parallel_merge_level, y >> log2_parallel_merge_level)
}

/// Whether `cu` and the fixed unit offset `(dx, dy)` of its own origin
/// (see [`SpatialPos::mer_offset`]) fall in different motion estimation
/// regions (`different_mer`). Candidates in the same MER as the current CU
/// are excluded from the merge list.
pub fn different_mer(cu: &CuGeometry, dx: i32, dy: i32, log2_parallel_merge_level: u8) -> bool {
  let nx = cu.x as i32 + dx;
  let ny = cu.y as i32 + dy;
  if nx < 0 || ny < 0 {
    return true;
  }
  let a = mer_index(cu.x, cu.y, log2_parallel_merge_level);
  let b = mer_index(nx as usize, ny as usize, log2_parallel_merge_level);
  a != b
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cu(x: usize, y: usize, w: usize, h: usize) -> CuGeometry {
    CuGeometry { x, y, width: w, height: h }
  }

  #[test]
  fn b0_is_not_coded_when_in_a_future_lcu_column() {
    // CU at the top-right corner of an LCU: B0 falls in the LCU to the
    // right, which raster scan hasn't reached yet.
    let c = cu(60, 0, 4, 4);
    assert!(!is_b0_cand_coded(&c, 64));
  }

  #[test]
  fn b0_is_coded_when_in_the_same_or_earlier_lcu() {
    let c = cu(8, 8, 4, 4);
    assert!(is_b0_cand_coded(&c, 64));
  }

  #[test]
  fn different_mer_flags_region_crossing() {
    let c = cu(8, 8, 8, 8);
    // B2's fixed offset (-1,-1): (7,7) is in 4x4-quantised MER (1,1), the
    // CU's own origin (8,8) is in MER (2,2): different regions.
    assert!(different_mer(&c, -1, -1, 2));
  }

  #[test]
  fn same_mer_is_excluded_regardless_of_cu_size() {
    // CU not aligned to the MER grid: B1's fixed offset (0,-1) from (9,9)
    // lands at (9,8), still MER (2,2) same as the CU's own origin — unlike
    // the real neighbour sample, the gate doesn't depend on CU width/height.
    let c = cu(9, 9, 16, 16);
    assert!(!different_mer(&c, 0, -1, 2));
  }
}
