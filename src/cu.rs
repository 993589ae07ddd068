// The coding-unit descriptor and the dense array it lives in.
//
// Grounded on the `cu_info_t` structure implied throughout
// `encode_coding_tree.c` and `inter.c` (fields read by
// `encode_inter_prediction_unit`, `encode_intra_coding_unit`,
// `kvz_inter_get_merge_cand` and friends) and on the spatial/temporal
// candidate lookups in `inter.c`, which all address CUs as
// `(x, y) -> index -> descriptor` on an SCU grid rather than walking a tree.

use bytemuck::Zeroable;

use crate::array2d::Array2D;
use crate::consts::{MAX_NUM_HMVP_CANDS, SCU_SIZE};
use crate::enums::{CuType, PartSize, PredDirection};

/// Coded block flags for one colour component, one bit per transform-tree
/// depth (depth 0 = the CU's own top-level transform block).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Zeroable)]
pub struct CbfFlags {
  pub luma: u8,
  pub cb: u8,
  pub cr: u8
}

impl CbfFlags {
  pub fn get(&self, component: usize, depth: u8) -> bool {
    let word = match component {
      0 => self.luma,
      1 => self.cb,
      2 => self.cr,
      _ => panic!("invalid colour component {}", component)
    };
    (word >> depth) & 1 != 0
  }

  pub fn set(&mut self, component: usize, depth: u8, value: bool) {
    let word = match component {
      0 => &mut self.luma,
      1 => &mut self.cb,
      2 => &mut self.cr,
      _ => panic!("invalid colour component {}", component)
    };
    if value {
      *word |= 1 << depth;
    } else {
      *word &= !(1 << depth);
    }
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntraInfo {
  pub mode: u8,
  pub mode_chroma: u8,
  pub multi_ref_idx: u8
}

#[derive(Debug, Clone, Copy)]
pub struct InterInfo {
  /// [list][component], component 0 = x, 1 = y, stored at INTERNAL_MV_PREC.
  pub mv: [[i16; 2]; 2],
  pub mv_ref: [i8; 2],
  pub mv_dir: PredDirection,
  /// Which AMVP/merge candidate slot each list's motion vector was derived
  /// from, kept for diagnostics and for HMVP/merge bookkeeping.
  pub mv_cand: [u8; 2],
  /// [list][component]: `mv` minus the AMVP predictor named by `mv_cand`,
  /// already computed by mode decision. Meaningless (and not emitted) for
  /// a merged PU or an inactive list; CTES's `emit_mvd` takes these values
  /// directly rather than re-deriving them, matching how `split_data`/`cbf`
  /// are likewise already-decided values this serializer only emits.
  pub mvd: [[i16; 2]; 2]
}

impl Default for InterInfo {
  fn default() -> Self {
    Self {
      mv: [[0; 2]; 2],
      mv_ref: [-1; 2],
      mv_dir: PredDirection::List0,
      mv_cand: [0; 2],
      mvd: [[0; 2]; 2]
    }
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Cu {
  pub cu_type: Option<CuType>,
  pub part_size: Option<PartSize>,
  pub depth: u8,
  /// Bit `d` set means the node at coding-tree depth `d` was split.
  pub split_data: u8,
  pub cbf: CbfFlags,
  pub qp: i8,
  pub skipped: bool,
  pub merged: bool,
  pub merge_idx: u8,
  pub intra: IntraInfo,
  pub inter: InterInfo,
  pub mts_last_scan_pos: bool,
  pub violates_mts_coeff_constraint: bool
}

unsafe impl Zeroable for Cu {}

impl Cu {
  pub fn is_intra(&self) -> bool {
    matches!(self.cu_type, Some(CuType::Intra))
  }

  pub fn is_inter(&self) -> bool {
    matches!(self.cu_type, Some(CuType::Inter))
  }
}

/// Dense grid of CU descriptors addressed in SCU (smallest coding unit)
/// units: `cu_array[y / SCU_SIZE][x / SCU_SIZE]`. Every SCU covered by a
/// larger CU stores a copy of the same descriptor, mirroring how spatial
/// candidate derivation in `inter.c` looks a neighbour up by pixel position
/// without needing to know the enclosing CU's size first.
pub struct CuArray {
  width_in_scu: usize,
  height_in_scu: usize,
  cells: Array2D<Cu>
}

impl CuArray {
  pub fn new(width: usize, height: usize) -> Self {
    let width_in_scu = (width + SCU_SIZE - 1) / SCU_SIZE;
    let height_in_scu = (height + SCU_SIZE - 1) / SCU_SIZE;
    Self {
      width_in_scu,
      height_in_scu,
      cells: Array2D::zeroed(height_in_scu, width_in_scu)
    }
  }

  pub fn width_in_scu(&self) -> usize {
    self.width_in_scu
  }

  pub fn height_in_scu(&self) -> usize {
    self.height_in_scu
  }

  pub fn is_inside(&self, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && (x as usize) < self.width_in_scu * SCU_SIZE && (y as usize) < self.height_in_scu * SCU_SIZE
  }

  pub fn get(&self, x: usize, y: usize) -> &Cu {
    &self.cells[y / SCU_SIZE][x / SCU_SIZE]
  }

  pub fn get_mut(&mut self, x: usize, y: usize) -> &mut Cu {
    &mut self.cells[y / SCU_SIZE][x / SCU_SIZE]
  }

  /// Write the same descriptor into every SCU a CU of the given pixel
  /// geometry covers.
  pub fn fill_cu(&mut self, x: usize, y: usize, width: usize, height: usize, cu: Cu) {
    let row_start = y / SCU_SIZE;
    let col_start = x / SCU_SIZE;
    let rows = height / SCU_SIZE;
    let cols = width / SCU_SIZE;
    self.cells.fill_region(row_start, col_start, rows, cols, &cu);
  }
}

/// Fixed-size history-based motion vector predictor table, maintained with
/// shift-based LRU eviction (`hmvp_shift_lut`/`hmvp_push_lut_item` /
/// `kvz_hmvp_add_mv` in `inter.c`) rather than a linked list: a real-size
/// table beats pointer-chasing for something this small and accessed this
/// often. Index 0 is always the youngest entry; higher indices are older,
/// matching how both the AMVP and merge candidate derivations iterate it
/// "newest first" by just walking the table front to back.
#[derive(Debug, Clone)]
pub struct HmvpTable {
  entries: Vec<InterInfo>
}

impl HmvpTable {
  pub fn new() -> Self {
    Self { entries: Vec::with_capacity(MAX_NUM_HMVP_CANDS) }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn get(&self, idx: usize) -> &InterInfo {
    &self.entries[idx]
  }

  pub fn iter(&self) -> impl Iterator<Item = &InterInfo> {
    self.entries.iter()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  fn find_duplicate(&self, cand: &InterInfo) -> Option<usize> {
    self.entries.iter().position(|e| {
      e.mv_dir as u8 == cand.mv_dir as u8 && e.mv_ref == cand.mv_ref && e.mv == cand.mv
    })
  }

  /// Insert a newly-coded inter CU's motion info at slot 0, shifting every
  /// other entry one slot older. If `cand` duplicates an existing entry,
  /// that entry is dropped first instead of the oldest one, so the table's
  /// length only grows until it first reaches capacity
  /// (`kvz_hmvp_add_mv`'s "shift entries before the duplicate, then
  /// overwrite slot 0" policy, here expressed as remove-then-insert-front).
  ///
  /// `(x, y, width, height)` is the CU's own geometry: the insert only
  /// happens if the CU's bottom-right corner falls in a different
  /// motion-estimation region than its top-left corner, i.e.
  /// `(xBr>>L) > (x>>L) && (yBr>>L) > (y>>L)` for `L =
  /// log2_parallel_merge_level`. A CU wholly inside a single MER never
  /// contributes its own motion to the table (`kvz_hmvp_add_mv`'s gate in
  /// `inter.c`).
  pub fn add(&mut self, cand: InterInfo, x: usize, y: usize, width: usize, height: usize, log2_parallel_merge_level: u8) {
    let l = log2_parallel_merge_level;
    let x_br = x + width;
    let y_br = y + height;
    if !((x_br >> l) > (x >> l) && (y_br >> l) > (y >> l)) {
      return;
    }

    if let Some(dup_idx) = self.find_duplicate(&cand) {
      self.entries.remove(dup_idx);
    } else if self.entries.len() >= MAX_NUM_HMVP_CANDS {
      self.entries.pop();
    }
    self.entries.insert(0, cand);
  }
}
