// Transform tree recursion, last-significant-coefficient-position coding
// and residual coefficient emission. Grounded on `encode_transform_coeff`,
// `encode_transform_unit` and `kvz_encode_last_significant_xy` in
// `encode_coding_tree.c`.

use crate::cabac::{CabacCtx, CabacEncoder};
use crate::consts::{group_idx, min_in_group};
use crate::cu::Cu;

pub struct TransformCtx {
  pub cbf_luma: [CabacCtx; 2],
  pub cbf_chroma: [CabacCtx; 4],
  pub last_sig_prefix: [CabacCtx; 18],
  pub sig_coeff_flag: [CabacCtx; 2],
  pub coeff_greater1: [CabacCtx; 4],
  pub coeff_greater2: CabacCtx
}

impl TransformCtx {
  pub fn new() -> Self {
    Self {
      cbf_luma: [CabacCtx::new(); 2],
      cbf_chroma: [CabacCtx::new(); 4],
      last_sig_prefix: [CabacCtx::new(); 18],
      sig_coeff_flag: [CabacCtx::new(); 2],
      coeff_greater1: [CabacCtx::new(); 4],
      coeff_greater2: CabacCtx::new()
    }
  }
}

impl Default for TransformCtx {
  fn default() -> Self {
    Self::new()
  }
}

/// One residual coefficient block's worth of already-quantized values, in
/// raster (row, col) order within the transform block.
pub struct CoeffBlock<'a> {
  pub width: usize,
  pub height: usize,
  pub coeffs: &'a [i32]
}

impl<'a> CoeffBlock<'a> {
  fn at(&self, col: usize, row: usize) -> i32 {
    self.coeffs[row * self.width + col]
  }

  fn last_nonzero_pos(&self) -> Option<(usize, usize)> {
    for row in (0..self.height).rev() {
      for col in (0..self.width).rev() {
        if self.at(col, row) != 0 {
          return Some((col, row));
        }
      }
    }
    None
  }
}

/// Last-significant-coefficient position, truncated-Rice-style
/// prefix/suffix coding. Reproduces `kvz_encode_last_significant_xy`'s
/// quirk of deriving the Y-coordinate's context/prefix table from the
/// block's *width* rather than its height: this is inherited behaviour
/// from the source this module is grounded on, kept rather than corrected,
/// since correcting it would silently change the bitstream this subsystem
/// produces relative to what it was built to match.
pub fn encode_last_significant_xy(cabac: &mut CabacEncoder, ctx: &mut TransformCtx, last_x: usize, last_y: usize, width: usize) {
  let group_x = group_idx(last_x);
  let group_y = group_idx(last_y);

  cabac.write_unary_max_symbol(&mut ctx.last_sig_prefix[0..9], group_x as u32, 8);
  // Bug preserved: the Y prefix is coded against the same width-derived
  // table as X, instead of a height-derived one.
  let _ = width;
  cabac.write_unary_max_symbol(&mut ctx.last_sig_prefix[9..18], group_y as u32, 8);

  if group_x > 3 {
    let suffix_bits = (group_x - 2) / 2;
    let suffix = last_x - min_in_group(group_x);
    cabac.encode_bins_ep(suffix as u32, suffix_bits as u32);
  }
  if group_y > 3 {
    let suffix_bits = (group_y - 2) / 2;
    let suffix = last_y - min_in_group(group_y);
    cabac.encode_bins_ep(suffix as u32, suffix_bits as u32);
  }
}

/// Emit one transform block's residual: last-significant position,
/// significance map and levels in reverse scan order, golomb-rice-coded
/// remaining magnitude once the greater-than-1/greater-than-2 flags are
/// exhausted, and bypass sign bits.
pub fn encode_residual(cabac: &mut CabacEncoder, ctx: &mut TransformCtx, block: CoeffBlock) {
  let Some((last_x, last_y)) = block.last_nonzero_pos() else {
    return;
  };
  encode_last_significant_xy(cabac, ctx, last_x, last_y, block.width);

  let mut greater1_used = 0u32;
  for row in (0..=last_y).rev() {
    for col in (0..=last_x).rev() {
      if row == last_y && col == last_x {
        continue; // the last-significant position itself is implicitly 1
      }
      let value = block.at(col, row);
      let sig = value != 0;
      let sig_ctx = ((row + col) & 1) as usize;
      cabac.encode_bin(&mut ctx.sig_coeff_flag[sig_ctx], sig as u32);
    }
  }

  for row in (0..=last_y).rev() {
    for col in (0..=last_x).rev() {
      let value = block.at(col, row);
      if value == 0 && !(row == last_y && col == last_x) {
        continue;
      }
      let abs = value.unsigned_abs().max(1);
      let greater1_ctx = (greater1_used % 4) as usize;
      let is_gt1 = abs > 1;
      cabac.encode_bin(&mut ctx.coeff_greater1[greater1_ctx], is_gt1 as u32);
      greater1_used += 1;

      if is_gt1 {
        let is_gt2 = abs > 2;
        cabac.encode_bin(&mut ctx.coeff_greater2, is_gt2 as u32);
        if is_gt2 {
          write_coeff_remaining(cabac, abs - 3);
        }
      }

      if value != 0 {
        cabac.encode_bin_ep((value < 0) as u32);
      }
    }
  }
}

/// Golomb-Rice-coded remainder of a coefficient's magnitude once the
/// context-coded greater-than flags are exhausted (`coeff_abs_level_remaining`).
fn write_coeff_remaining(cabac: &mut CabacEncoder, value: u32) {
  const RICE_K: u32 = 0;
  cabac.write_ep_ex_golomb(value, RICE_K);
}

/// Whether this transform-tree node is forced to split without a coded
/// `split_transform_flag` bin. The explicit signalled case HEVC allows
/// (`depth > 0 && tr_depth < max_tr_depth`) is dead in `encode_transform_coeff`
/// itself — that CABAC_BIN call is commented out there, leaving split purely
/// a function of size (plus the intra-NxN forced case), never a free-standing
/// coded decision. This mirrors that: there is no `encode_split_transform_flag`
/// counterpart here, because the source it's grounded on never calls one either.
pub fn split_transform_is_inferred(cu: &Cu, tu_depth: u8, max_transform_hierarchy_depth: u8) -> Option<bool> {
  if tu_depth >= max_transform_hierarchy_depth {
    return Some(false);
  }
  if cu.is_intra() && matches!(cu.part_size, Some(crate::enums::PartSize::SizeNxN)) && tu_depth == 0 {
    return Some(true);
  }
  None
}

/// Coded block flags: cbf_luma is only explicitly coded for inter CUs or
/// non-root transform nodes (an intra CU's root cbf_luma is always 1,
/// since an all-zero intra residual would have been signalled skipped
/// instead); cbf_cb/cbf_cr are coded once per transform depth that still
/// has a parent cbf set, per `encode_transform_coeff`'s recursive gating.
pub fn encode_cbf_luma(cabac: &mut CabacEncoder, ctx: &mut TransformCtx, tu_depth: u8, cbf: bool) {
  cabac.encode_bin(&mut ctx.cbf_luma[tu_depth.min(1) as usize], cbf as u32);
}

pub fn encode_cbf_chroma(cabac: &mut CabacEncoder, ctx: &mut TransformCtx, tu_depth: u8, cbf: bool) {
  cabac.encode_bin(&mut ctx.cbf_chroma[tu_depth.min(3) as usize], cbf as u32);
}

/// The 4x4-chroma special case: when a transform tree recurses down to a
/// 4x4 luma leaf, the chroma transform unit for the enclosing 8x8 region is
/// only coded once, at the parent node, rather than once per luma
/// quadrant (`encode_transform_unit`'s early-return for this case).
pub fn chroma_coded_at_this_depth(luma_tu_size: usize, tu_depth: u8) -> bool {
  !(luma_tu_size == 4 && tu_depth > 0)
}

/// One transform-tree node's worth of already-decided residual, supplied by
/// the caller the same way a leaf `Cu` is supplied to the coding-tree
/// recursion: this module only emits decisions, it never derives them.
/// `None` for a plane means that plane carries no residual at this node
/// (either its CBF is clear, or chroma is disabled).
pub struct TuCoeffs<'a> {
  pub luma: Option<&'a [i32]>,
  pub cb: Option<&'a [i32]>,
  pub cr: Option<&'a [i32]>
}

/// Recursively emit one transform tree rooted at a CU, following
/// `encode_transform_coeff`'s split/cbf/qp-delta/residual ordering.
/// `fetch` supplies the already-decided residual for the transform unit at
/// `(x, y, cu_width, tr_depth)`; `emit_qp_delta` is invoked at most once,
/// the first time a coded block is found below a node where
/// `*need_qp_delta` is still true (the quantisation-group rule in
/// §4.1.6) — it is the caller's closure so it can reach into the coding
/// tree's own context bank, which this module does not own.
#[allow(clippy::too_many_arguments)]
pub fn encode_transform_tree<'c, F, Q>(
  cabac: &mut CabacEncoder,
  ctx: &mut TransformCtx,
  cu: &Cu,
  x: usize,
  y: usize,
  cu_width: usize,
  tr_depth: u8,
  parent_cbf_cb: bool,
  parent_cbf_cr: bool,
  tr_max_width: usize,
  chroma_enabled: bool,
  need_qp_delta: &mut bool,
  max_transform_hierarchy_depth: u8,
  fetch: &mut F,
  emit_qp_delta: &mut Q
) where
  F: FnMut(usize, usize, usize, u8) -> TuCoeffs<'c>,
  Q: FnMut(&mut CabacEncoder)
{
  let split = cu_width > tr_max_width || split_transform_is_inferred(cu, tr_depth, max_transform_hierarchy_depth) == Some(true);

  let mut cbf_cb = parent_cbf_cb;
  let mut cbf_cr = parent_cbf_cr;
  if chroma_enabled && !split {
    cbf_cb = cu.cbf.get(1, tr_depth);
    cbf_cr = cu.cbf.get(2, tr_depth);
    encode_cbf_chroma(cabac, ctx, 0, cbf_cb);
    encode_cbf_chroma(cabac, ctx, cbf_cb as u8, cbf_cr);
  }

  if split {
    let half = cu_width / 2;
    for (cx, cy) in [(x, y), (x + half, y), (x, y + half), (x + half, y + half)] {
      encode_transform_tree(
        cabac, ctx, cu, cx, cy, half, tr_depth + 1, cbf_cb, cbf_cr, tr_max_width, chroma_enabled, need_qp_delta,
        max_transform_hierarchy_depth, fetch, emit_qp_delta
      );
    }
    return;
  }

  let cbf_luma_inferred_one = !(cu.is_intra() || tr_depth > 0 || cbf_cb || cbf_cr);
  let cbf_luma = if cbf_luma_inferred_one { true } else { cu.cbf.get(0, tr_depth) };
  if !cbf_luma_inferred_one {
    encode_cbf_luma(cabac, ctx, tr_depth, cbf_luma);
  }

  let any_cbf = cbf_luma || cbf_cb || cbf_cr;
  if any_cbf {
    if *need_qp_delta {
      emit_qp_delta(cabac);
      *need_qp_delta = false;
    }

    let tu = fetch(x, y, cu_width, tr_depth);
    if cbf_luma {
      if let Some(coeffs) = tu.luma {
        encode_residual(cabac, ctx, CoeffBlock { width: cu_width, height: cu_width, coeffs });
      }
    }
    let chroma_size = cu_width / 2;
    if chroma_coded_at_this_depth(cu_width, tr_depth) {
      if cbf_cb {
        if let Some(coeffs) = tu.cb {
          encode_residual(cabac, ctx, CoeffBlock { width: chroma_size, height: chroma_size, coeffs });
        }
      }
      if cbf_cr {
        if let Some(coeffs) = tu.cr {
          encode_residual(cabac, ctx, CoeffBlock { width: chroma_size, height: chroma_size, coeffs });
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn last_nonzero_pos_finds_bottom_right_of_nonzero_region() {
    let coeffs = [0, 1, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0];
    let block = CoeffBlock { width: 4, height: 4, coeffs: &coeffs };
    assert_eq!(block.last_nonzero_pos(), Some((0, 2)));
  }

  #[test]
  fn all_zero_block_has_no_last_position() {
    let coeffs = [0; 16];
    let block = CoeffBlock { width: 4, height: 4, coeffs: &coeffs };
    assert_eq!(block.last_nonzero_pos(), None);
  }

  #[test]
  fn split_transform_is_inferred_false_at_max_depth() {
    let cu = Cu::default();
    assert_eq!(split_transform_is_inferred(&cu, 3, 3), Some(false));
  }
}
