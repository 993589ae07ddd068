// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Motion-Vector Candidate Engine: builds the AMVP and Merge predictor lists
// that CTES's inter path references. Grounded throughout on `inter.c`'s
// `kvz_inter_get_mv_cand` / `kvz_inter_get_merge_cand` family of functions.

pub mod spatial;
pub mod temporal;
pub mod amvp;
pub mod merge;

use crate::cu::InterInfo;
use crate::enums::CandSource;

/// One candidate produced while walking spatial/temporal/HMVP sources,
/// tagged with where it came from (diagnostics, and merge's pairwise-average
/// step needs to see the first two candidates regardless of source).
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
  pub source: CandSource,
  pub info: InterInfo
}

/// Position of a coding unit on the SCU grid, in luma pixels, plus its size.
/// MVCE takes this rather than a `&Cu` directly so it isn't coupled to how
/// the caller stores the CU currently being coded.
#[derive(Debug, Clone, Copy)]
pub struct CuGeometry {
  pub x: usize,
  pub y: usize,
  pub width: usize,
  pub height: usize
}

impl CuGeometry {
  pub fn right(&self) -> usize {
    self.x + self.width
  }

  pub fn bottom(&self) -> usize {
    self.y + self.height
  }
}

