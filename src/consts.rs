// Geometry, candidate-list-size and residual-scan constants shared across
// the coding-tree, motion-vector-candidate and reconstruction modules.

// Largest coding unit (CTU) size, in luma samples, and the corresponding
// log2 value used throughout the coding-tree recursion.
pub const LOG2_LCU_SIZE: u32 = 6; // 64x64
pub const LCU_SIZE: usize = 1 << LOG2_LCU_SIZE;

// Smallest coding unit: the grid the CuArray is addressed on.
pub const LOG2_SCU_SIZE: u32 = 2; // 4x4
pub const SCU_SIZE: usize = 1 << LOG2_SCU_SIZE;

// Maximum coding-tree recursion depth below the LCU (64 -> 32 -> 16 -> 8).
pub const MAX_CODING_TREE_DEPTH: u8 = (LOG2_LCU_SIZE - LOG2_SCU_SIZE) as u8;

// AMVP always produces exactly two predictors.
pub const AMVP_MAX_NUM_CANDS: usize = 2;

// Upper bound on the number of merge candidates a slice can request.
pub const MRG_MAX_NUM_CANDS: usize = 5;

// Size of the history-based MVP table.
pub const MAX_NUM_HMVP_CANDS: usize = 5;

// Internal motion-vector storage precision, in fractional-pel bits, used
// when scaling candidates sourced from a different picture's precision.
pub const INTERNAL_MV_PREC: u32 = 2;

// Total number of directional+planar+DC intra prediction modes, and the
// length of the most-probable-mode shortlist built from the above/left
// neighbours (`encode_intra_coding_unit`'s MPM derivation).
pub const INTRA_MODE_COUNT: usize = 67;
pub const INTRA_MPM_COUNT: usize = 6;

// Group-index table for last-significant-coefficient prefix coding: maps a
// coordinate (clamped to the transform block's valid range) to the group it
// falls in. Standard deterministic lookup, not a CABAC probability table.
const GROUP_IDX: [u8; 32] = [
  0, 1, 2, 3, 4, 4, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7,
  8, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 9, 9, 9
];

const MIN_IN_GROUP: [u8; 10] = [0, 1, 2, 3, 4, 6, 8, 12, 16, 24];

pub fn group_idx(pos: usize) -> usize {
  GROUP_IDX[pos.min(31)] as usize
}

pub fn min_in_group(group: usize) -> usize {
  MIN_IN_GROUP[group] as usize
}
