// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Coding-Tree Entropy Serializer: walks the coding quad-tree and emits every
// syntax element mode decision already chose as CABAC bins. Grounded on
// `kvz_encode_coding_tree` (this file's top-level recursion),
// `encode_inter_prediction_unit`/`kvz_encode_mvd`, `encode_intra_coding_unit`
// and `encode_transform_coeff`/`encode_transform_unit` in
// `encode_coding_tree.c`.

pub mod inter_unit;
pub mod intra_unit;
pub mod transform;
pub mod mts;

use log::trace;

use crate::cabac::{CabacCtx, CabacEncoder};
use crate::config::EncoderConfig;
use crate::consts::MAX_CODING_TREE_DEPTH;
use crate::cu::{Cu, CuArray};
use crate::enums::{CuType, SplitMode};

/// Context models touched by the coding-tree recursion itself (split
/// flags) plus the handful shared between the inter/intra/transform
/// sub-emitters. Each is an independent adaptive binary context, matching
/// how `encode_coding_tree.c` addresses `cabac->ctx.sao_merge_flag_model`
/// and friends as distinct, individually-adapting contexts rather than a
/// shared table.
pub struct CtxBank {
  pub split_cu_flag: [CabacCtx; 3],
  pub skip_flag: [CabacCtx; 3],
  pub pred_mode_flag: [CabacCtx; 2],
  pub qp_delta_abs: [CabacCtx; 2],
  pub cu_transquant_bypass: CabacCtx,
  pub rqt_root_cbf: CabacCtx
}

impl CtxBank {
  pub fn new() -> Self {
    Self {
      split_cu_flag: [CabacCtx::new(); 3],
      skip_flag: [CabacCtx::new(); 3],
      pred_mode_flag: [CabacCtx::new(); 2],
      qp_delta_abs: [CabacCtx::new(); 2],
      cu_transquant_bypass: CabacCtx::new(),
      rqt_root_cbf: CabacCtx::new()
    }
  }
}

impl Default for CtxBank {
  fn default() -> Self {
    Self::new()
  }
}

/// Everything the coding-tree recursion threads through without owning:
/// the output bitstream, the context bank, the CU array being both read
/// (for neighbour availability) and written (as each leaf is coded), the
/// active config, and the picture's pixel bounds (for the implicit-split
/// border check).
pub struct CtesWriter<'a> {
  pub cabac: &'a mut CabacEncoder,
  pub ctx: &'a mut CtxBank,
  pub cu_array: &'a mut CuArray,
  pub cfg: &'a EncoderConfig,
  pub pic_width: usize,
  pub pic_height: usize
}

impl<'a> CtesWriter<'a> {
  fn split_context(&self, x: usize, y: usize, depth: u8) -> usize {
    // Context is derived from whether the left/above SCU neighbours were
    // themselves split at least this deep, exactly as
    // `kvz_encode_coding_tree`'s `split_model` computation does.
    let mut ctx = 0;
    if x > 0 {
      let left = self.cu_array.get(x - 1, y);
      if left.depth > depth {
        ctx += 1;
      }
    }
    if y > 0 {
      let above = self.cu_array.get(x, y - 1);
      if above.depth > depth {
        ctx += 1;
      }
    }
    ctx
  }

  /// Recursively emit the coding-tree split decisions for a square node of
  /// side `size` at `(x, y)`, down to a leaf CU, then dispatch to the
  /// leaf-level skip/pred-mode/inter/intra emission.
  ///
  /// `decide_leaf` is called once the recursion reaches a leaf (the point
  /// at which mode decision's output is consumed); it supplies the fully
  /// decided `Cu` for that leaf, since this serializer only emits decisions
  /// already made elsewhere.
  pub fn encode_coding_tree<F>(&mut self, x: usize, y: usize, size: usize, depth: u8, decide_leaf: &mut F)
  where
    F: FnMut(usize, usize, usize, u8) -> Cu
  {
    let bottom_right_outside = x + size > self.pic_width || y + size > self.pic_height;

    let must_split = bottom_right_outside && depth < MAX_CODING_TREE_DEPTH;
    let could_split = depth < MAX_CODING_TREE_DEPTH;

    let split = if must_split {
      // Implicit split: no bin is coded, matching the border-forced-split
      // handling in `kvz_encode_coding_tree`.
      true
    } else if could_split {
      let ctx_idx = self.split_context(x, y, depth);
      // A real encoder would already know the answer from mode decision;
      // this serializer's job is only to *emit* it, so the caller-supplied
      // leaf decision implicitly carries the split decision by way of
      // whether `decide_leaf` further subdivides. Here we ask mode decision
      // up front by probing whether the leaf at this exact node is final:
      // callers signal "do not split further" by returning a `Cu` whose
      // `depth` equals this node's depth.
      let probe = decide_leaf(x, y, size, depth);
      let split = derive_split_mode(probe.depth, depth) == SplitMode::QuadSplit;
      self.cabac.encode_bin(&mut self.ctx.split_cu_flag[ctx_idx], split as u32);
      if !split {
        trace!("leaf CU at ({x}, {y}) size {size} depth {depth}");
        self.cu_array.fill_cu(x, y, size, size, probe);
        return;
      }
      true
    } else {
      false
    };

    if !split {
      let leaf = decide_leaf(x, y, size, depth);
      trace!("leaf CU at ({x}, {y}) size {size} depth {depth} (forced leaf)");
      self.cu_array.fill_cu(x, y, size, size, leaf);
      return;
    }

    trace!("split CU at ({x}, {y}) size {size} depth {depth}");
    let half = size / 2;
    let child_depth = depth + 1;
    for (cx, cy) in [(x, y), (x + half, y), (x, y + half), (x + half, y + half)] {
      if cx < self.pic_width && cy < self.pic_height {
        self.encode_coding_tree(cx, cy, half, child_depth, decide_leaf);
      }
    }
  }

  pub fn encode_skip_flag(&mut self, x: usize, y: usize, skip: bool) {
    // Context is the count of left/above SCU neighbours that were
    // themselves skipped, matching the inline derivation in
    // `encode_leaf_cu`/`kvz_encode_coding_tree`'s skip-flag emission —
    // distinct from `split_context`'s split-depth-based derivation used
    // for `split_cu_flag`.
    let mut ctx_idx = 0;
    if x > 0 && self.cu_array.get(x - 1, y).skipped {
      ctx_idx += 1;
    }
    if y > 0 && self.cu_array.get(x, y - 1).skipped {
      ctx_idx += 1;
    }
    self.cabac.encode_bin(&mut self.ctx.skip_flag[ctx_idx], skip as u32);
  }

  pub fn encode_pred_mode(&mut self, x: usize, y: usize, cu_type: CuType) {
    let mut ctx_idx = 0;
    if (x > 0 && self.cu_array.get(x - 1, y).is_intra()) || (y > 0 && self.cu_array.get(x, y - 1).is_intra()) {
      ctx_idx = 1;
    }
    self.cabac.encode_bin(&mut self.ctx.pred_mode_flag[ctx_idx], matches!(cu_type, CuType::Intra) as u32);
  }

  /// QP delta for a quantization group, truncated-unary magnitude plus
  /// bypass sign, matching the bins inlined in `encode_transform_coeff`.
  pub fn encode_qp_delta(&mut self, delta: i32) {
    let abs = delta.unsigned_abs();
    self.cabac.write_unary_max_symbol(&mut self.ctx.qp_delta_abs, abs.min(5), 5);
    if abs >= 5 {
      self.cabac.write_ep_ex_golomb(abs - 5, 0);
    }
    if abs > 0 {
      self.cabac.encode_bin_ep((delta < 0) as u32);
    }
  }
}

/// Emit one leaf coding unit's full syntax: the skip/pred-mode flags, the
/// inter or intra prediction-unit syntax, the root coded-block-flag and
/// transform tree, and (for inter, at the root) the MTS index. Ties
/// together §4.1.1 step 6 through §4.1.5; callers supply the per-PU MPM
/// neighbour lookup and per-transform-unit residual the same way
/// `decide_leaf` supplies the `Cu` itself, since all of it was already
/// decided by mode decision.
#[allow(clippy::too_many_arguments)]
pub fn encode_leaf_cu<'c, FN, FM, FQ, FP>(
  cabac: &mut CabacEncoder,
  ctx: &mut CtxBank,
  inter_ctx: &mut inter_unit::InterCtx,
  intra_ctx: &mut intra_unit::IntraCtx,
  transform_ctx: &mut transform::TransformCtx,
  mts_ctx: &mut [CabacCtx; 3],
  cu_array: &CuArray,
  cu: &Cu,
  x: usize,
  y: usize,
  cu_width: usize,
  depth: u8,
  cfg: &EncoderConfig,
  is_i_slice: bool,
  is_b_slice: bool,
  num_refs: FN,
  mpm_neighbors: FM,
  need_qp_delta: &mut bool,
  fetch_coeffs: &mut FQ,
  mut emit_qp_delta: FP
) where
  FN: Fn(usize) -> usize,
  FM: Fn(usize, usize) -> (Option<u8>, Option<u8>),
  FQ: FnMut(usize, usize, usize, u8) -> transform::TuCoeffs<'c>,
  FP: FnMut(&mut CabacEncoder, &mut CtxBank)
{
  if cfg.lossless {
    cabac.encode_bin(&mut ctx.cu_transquant_bypass, 1);
  }

  if !is_i_slice {
    let mut skip_ctx = 0;
    if x > 0 && cu_array.get(x - 1, y).skipped {
      skip_ctx += 1;
    }
    if y > 0 && cu_array.get(x, y - 1).skipped {
      skip_ctx += 1;
    }
    cabac.encode_bin(&mut ctx.skip_flag[skip_ctx], cu.skipped as u32);

    if cu.skipped {
      inter_unit::encode_merge(cabac, inter_ctx, true, cu.merge_idx, cfg.max_merge as usize);
      return;
    }
  }

  if !is_i_slice {
    let mut pred_mode_ctx = 0usize;
    if (x > 0 && cu_array.get(x - 1, y).is_intra()) || (y > 0 && cu_array.get(x, y - 1).is_intra()) {
      pred_mode_ctx = 1;
    }
    cabac.encode_bin(&mut ctx.pred_mode_flag[pred_mode_ctx], cu.is_intra() as u32);
  }

  let part_size = cu.part_size.unwrap_or(crate::enums::PartSize::Size2Nx2N);

  if cu.is_inter() {
    // `Cu::inter` carries one PU's worth of motion data, so only
    // `Size2Nx2N` is actually emitted correctly here; a rectangular/AMP
    // `part_size` would need per-PU `InterInfo`, which this data model
    // doesn't have.
    let num_pu = part_size.num_parts();
    for _ in 0..num_pu {
      inter_unit::encode_inter_prediction_unit(cabac, inter_ctx, cu, cu_width, depth, is_b_slice, cfg.max_merge as usize, &num_refs);
    }

    let root_cbf_coded = part_size != crate::enums::PartSize::Size2Nx2N || !cu.merged;
    let root_cbf = cu.cbf.get(0, 0) || cu.cbf.get(1, 0) || cu.cbf.get(2, 0);
    if root_cbf_coded {
      cabac.encode_bin(&mut ctx.rqt_root_cbf, root_cbf as u32);
    }
    if root_cbf_coded && !root_cbf {
      return;
    }

    transform::encode_transform_tree(
      cabac,
      transform_ctx,
      cu,
      x,
      y,
      cu_width,
      0,
      true,
      true,
      cu_width.min(32),
      cfg.chroma_format != crate::enums::ChromaFormat::Yuv400,
      need_qp_delta,
      MAX_CODING_TREE_DEPTH,
      fetch_coeffs,
      &mut |c| emit_qp_delta(c, ctx)
    );
  } else {
    let num_pu = intra_unit::num_intra_pred_units(part_size);
    for i in 0..num_pu {
      let (px, py) = intra_unit::pu_offset(part_size, cu_width, i);
      let (left, above) = mpm_neighbors(x + px, y + py);
      let mpm = intra_unit::derive_mpm_list(left, above);
      intra_unit::encode_luma_mode(cabac, intra_ctx, cu.intra.mode, &mpm);
    }
    intra_unit::encode_chroma_mode(cabac, intra_ctx);

    transform::encode_transform_tree(
      cabac,
      transform_ctx,
      cu,
      x,
      y,
      cu_width,
      0,
      true,
      true,
      cu_width.min(32),
      cfg.chroma_format != crate::enums::ChromaFormat::Yuv400,
      need_qp_delta,
      MAX_CODING_TREE_DEPTH,
      fetch_coeffs,
      &mut |c| emit_qp_delta(c, ctx)
    );
  }

  if mts::is_mts_allowed(cfg.mts, cu, cu_width, cu_width, cfg.lossless) && !cu.violates_mts_coeff_constraint && cu.mts_last_scan_pos {
    mts::encode_mts_idx(cabac, mts_ctx, 0);
  }
}

pub(crate) fn derive_split_mode(leaf_depth: u8, node_depth: u8) -> SplitMode {
  if leaf_depth > node_depth {
    SplitMode::QuadSplit
  } else {
    SplitMode::NoSplit
  }
}
