// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Inter-Prediction Reconstruction: synthesizes predicted pixels for an
// inter CU from one or two reference pictures, at integer or fractional
// sample positions, including edge extrapolation for motion that points
// outside the reference picture. Grounded on `inter_recon_unipred`,
// `inter_recon_frac_luma`, `inter_recon_frac_chroma` and
// `inter_cp_with_ext_border` in `inter.c`. Border handling here is
// collapsed into a single clamped-read path (`Plane::get_clamped`) rather
// than the original's separate fast/slow dispatch on whether the block is
// entirely inside the picture: the two are output-equivalent, and the
// dispatch in `inter.c` exists purely as a performance optimisation this
// crate doesn't need to reproduce to implement the same reconstruction.

use crate::enums::ChromaFormat;
use crate::frame::Plane;
use crate::mv::Mv;

// Quarter-pel luma interpolation filter, one row per fractional phase.
// Phase 0 is the identity (no filtering, straight copy).
const LUMA_FILTER: [[i32; 8]; 4] = [
  [0, 0, 0, 64, 0, 0, 0, 0],
  [-1, 4, -10, 58, 17, -5, 1, 0],
  [-1, 4, -11, 40, 40, -11, 4, -1],
  [0, 1, -5, 17, 58, -10, 4, -1]
];

// Eighth-pel chroma interpolation filter (4:2:0), one row per phase.
const CHROMA_FILTER: [[i32; 4]; 8] = [
  [0, 64, 0, 0],
  [-2, 58, 10, -2],
  [-4, 54, 16, -2],
  [-6, 46, 28, -4],
  [-4, 36, 36, -4],
  [-4, 28, 46, -6],
  [-2, 16, 54, -4],
  [-2, 10, 58, -2]
];

fn clamp_pixel(v: i32) -> u8 {
  v.clamp(0, 255) as u8
}

/// Separable fractional-pel interpolation at a given luma/chroma sample
/// position, with `frac_x`/`frac_y` in eighths-of-a-sample for chroma and
/// quarters-of-a-sample for luma (selected by the filter table passed in).
fn interpolate<const TAPS: usize>(
  plane: &Plane,
  x: i32,
  y: i32,
  frac_x: usize,
  frac_y: usize,
  filter: &[[i32; TAPS]],
  half_taps: i32
) -> i32 {
  let mut intermediate = [0i32; 16];
  let v_filter = &filter[frac_y];
  let h_filter = &filter[frac_x];

  for (row_idx, row) in intermediate.iter_mut().enumerate().take(TAPS) {
    let sy = y + row_idx as i32 - (half_taps - 1);
    let mut acc = 0i32;
    for (tap, &coeff) in h_filter.iter().enumerate() {
      let sx = x + tap as i32 - (half_taps - 1);
      acc += coeff * plane.get_clamped(sx, sy) as i32;
    }
    *row = acc >> 6;
  }

  let mut acc = 0i32;
  for (tap, &coeff) in v_filter.iter().enumerate() {
    acc += coeff * intermediate[tap];
  }
  acc >> 6
}

fn interpolate_luma(plane: &Plane, x: i32, y: i32, frac_x: usize, frac_y: usize) -> i32 {
  interpolate(plane, x, y, frac_x, frac_y, &LUMA_FILTER, 4)
}

fn interpolate_chroma(plane: &Plane, x: i32, y: i32, frac_x: usize, frac_y: usize) -> i32 {
  interpolate(plane, x, y, frac_x, frac_y, &CHROMA_FILTER, 2)
}

/// Geometry of the block being reconstructed, in the sample grid of the
/// plane being written (luma or chroma): destination position/size plus the
/// reference-picture motion vector, already converted to this plane's
/// fractional-pel precision (quarter-pel luma, eighth-pel chroma).
#[derive(Debug, Clone, Copy)]
pub struct PredBlock {
  pub dst_x: usize,
  pub dst_y: usize,
  pub width: usize,
  pub height: usize,
  pub mv: Mv
}

fn is_luma_integer(mv: Mv) -> bool {
  mv[0] & 3 == 0 && mv[1] & 3 == 0
}

fn is_chroma_integer(mv: Mv) -> bool {
  mv[0] & 7 == 0 && mv[1] & 7 == 0
}

/// Uni-predictive reconstruction of one plane: dispatches between an
/// integer-sample copy and fractional interpolation depending on the low
/// bits of the motion vector (`inter_recon_unipred`'s dispatch).
pub fn reconstruct_uni_luma(dst: &mut Plane, reference: &Plane, block: PredBlock) {
  let src_x0 = block.dst_x as i32 + (block.mv[0] >> 2) as i32;
  let src_y0 = block.dst_y as i32 + (block.mv[1] >> 2) as i32;

  if is_luma_integer(block.mv) {
    for row in 0..block.height {
      for col in 0..block.width {
        let v = reference.get_clamped(src_x0 + col as i32, src_y0 + row as i32);
        dst.data[(block.dst_y + row) * dst.stride + block.dst_x + col] = v;
      }
    }
    return;
  }

  let frac_x = (block.mv[0] & 3) as usize;
  let frac_y = (block.mv[1] & 3) as usize;
  for row in 0..block.height {
    for col in 0..block.width {
      let v = interpolate_luma(reference, src_x0 + col as i32, src_y0 + row as i32, frac_x, frac_y);
      dst.data[(block.dst_y + row) * dst.stride + block.dst_x + col] = clamp_pixel(v);
    }
  }
}

pub fn reconstruct_uni_chroma(dst: &mut Plane, reference: &Plane, block: PredBlock, format: ChromaFormat) {
  let shift_x = format.chroma_shift_x();
  let shift_y = format.chroma_shift_y();
  // Chroma MV precision is luma's plus the chroma subsampling shift
  // (quarter-pel luma -> eighth-pel chroma for 4:2:0).
  let mv_x = block.mv[0] as i32;
  let mv_y = block.mv[1] as i32;

  let src_x0 = block.dst_x as i32 + (mv_x >> (2 + shift_x));
  let src_y0 = block.dst_y as i32 + (mv_y >> (2 + shift_y));

  if is_chroma_integer(block.mv) {
    for row in 0..block.height {
      for col in 0..block.width {
        let v = reference.get_clamped(src_x0 + col as i32, src_y0 + row as i32);
        dst.data[(block.dst_y + row) * dst.stride + block.dst_x + col] = v;
      }
    }
    return;
  }

  let frac_x = ((mv_x << shift_x) & 7) as usize;
  let frac_y = ((mv_y << shift_y) & 7) as usize;
  for row in 0..block.height {
    for col in 0..block.width {
      let v = interpolate_chroma(reference, src_x0 + col as i32, src_y0 + row as i32, frac_x, frac_y);
      dst.data[(block.dst_y + row) * dst.stride + block.dst_x + col] = clamp_pixel(v);
    }
  }
}

/// Bi-predictive blend: average two single-list predictions sample-wise
/// with round-to-nearest. The original blend callee
/// (`kvz_inter_recon_bipred_blend`) isn't part of the traced source; this
/// follows the prose description of accumulating both predictions at
/// higher-than-output precision and averaging once both are available.
///
/// `high_precision` selects between the two paths spec.md §4.3 describes:
/// when true (the `cfg.bipred` path, taken whenever either side is
/// fractional), both predictions are kept at `hi_prec_buf_t`-style
/// unclamped intermediate precision before the final average; when false,
/// each side is rounded down to an 8-bit sample first (as if one had been
/// written to the LCU buffer and read back) and the average loses whatever
/// fractional bits the interpolation filter produced.
pub fn reconstruct_bi_luma(dst: &mut Plane, ref0: &Plane, mv0: Mv, ref1: &Plane, mv1: Mv, block: PredBlock, high_precision: bool) {
  let mut tmp0 = vec![0i32; block.width * block.height];
  let mut tmp1 = vec![0i32; block.width * block.height];

  fill_luma_prediction(&mut tmp0, ref0, PredBlock { mv: mv0, ..block });
  fill_luma_prediction(&mut tmp1, ref1, PredBlock { mv: mv1, ..block });

  for row in 0..block.height {
    for col in 0..block.width {
      let idx = row * block.width + col;
      let (a, b) = if high_precision {
        (tmp0[idx], tmp1[idx])
      } else {
        (clamp_pixel(tmp0[idx]) as i32, clamp_pixel(tmp1[idx]) as i32)
      };
      let avg = (a + b + 1) >> 1;
      dst.data[(block.dst_y + row) * dst.stride + block.dst_x + col] = clamp_pixel(avg);
    }
  }
}

fn fill_luma_prediction(out: &mut [i32], reference: &Plane, block: PredBlock) {
  let src_x0 = block.dst_x as i32 + (block.mv[0] >> 2) as i32;
  let src_y0 = block.dst_y as i32 + (block.mv[1] >> 2) as i32;

  if is_luma_integer(block.mv) {
    for row in 0..block.height {
      for col in 0..block.width {
        out[row * block.width + col] = reference.get_clamped(src_x0 + col as i32, src_y0 + row as i32) as i32;
      }
    }
    return;
  }

  let frac_x = (block.mv[0] & 3) as usize;
  let frac_y = (block.mv[1] & 3) as usize;
  for row in 0..block.height {
    for col in 0..block.width {
      out[row * block.width + col] = interpolate_luma(reference, src_x0 + col as i32, src_y0 + row as i32, frac_x, frac_y);
    }
  }
}

/// Chroma counterpart of [`reconstruct_bi_luma`]: same accumulate-then-average
/// blend, driven by the chroma-subsampled motion vector precision instead of
/// luma's quarter-pel one. See [`reconstruct_bi_luma`] for `high_precision`.
pub fn reconstruct_bi_chroma(
  dst: &mut Plane,
  ref0: &Plane,
  mv0: Mv,
  ref1: &Plane,
  mv1: Mv,
  block: PredBlock,
  format: ChromaFormat,
  high_precision: bool
) {
  let mut tmp0 = vec![0i32; block.width * block.height];
  let mut tmp1 = vec![0i32; block.width * block.height];

  fill_chroma_prediction(&mut tmp0, ref0, PredBlock { mv: mv0, ..block }, format);
  fill_chroma_prediction(&mut tmp1, ref1, PredBlock { mv: mv1, ..block }, format);

  for row in 0..block.height {
    for col in 0..block.width {
      let idx = row * block.width + col;
      let (a, b) = if high_precision {
        (tmp0[idx], tmp1[idx])
      } else {
        (clamp_pixel(tmp0[idx]) as i32, clamp_pixel(tmp1[idx]) as i32)
      };
      let avg = (a + b + 1) >> 1;
      dst.data[(block.dst_y + row) * dst.stride + block.dst_x + col] = clamp_pixel(avg);
    }
  }
}

fn fill_chroma_prediction(out: &mut [i32], reference: &Plane, block: PredBlock, format: ChromaFormat) {
  let shift_x = format.chroma_shift_x();
  let shift_y = format.chroma_shift_y();
  let mv_x = block.mv[0] as i32;
  let mv_y = block.mv[1] as i32;

  let src_x0 = block.dst_x as i32 + (mv_x >> (2 + shift_x));
  let src_y0 = block.dst_y as i32 + (mv_y >> (2 + shift_y));

  if is_chroma_integer(block.mv) {
    for row in 0..block.height {
      for col in 0..block.width {
        out[row * block.width + col] = reference.get_clamped(src_x0 + col as i32, src_y0 + row as i32) as i32;
      }
    }
    return;
  }

  let frac_x = ((mv_x << shift_x) & 7) as usize;
  let frac_y = ((mv_y << shift_y) & 7) as usize;
  for row in 0..block.height {
    for col in 0..block.width {
      out[row * block.width + col] = interpolate_chroma(reference, src_x0 + col as i32, src_y0 + row as i32, frac_x, frac_y);
    }
  }
}

/// One prediction unit's motion description, as stored on a `Cu`/`InterInfo`:
/// which list(s) are active and the (already-derived) MV for each.
#[derive(Debug, Clone, Copy)]
pub struct PuMotion {
  pub dir: crate::enums::PredDirection,
  pub mv: [Mv; 2]
}

/// Top-level per-plane reconstruction dispatcher: picks uni- vs bi-prediction
/// from the PU's `PredDirection`, and honours the `predict_luma`/
/// `predict_chroma` toggles and the `bipred` high-precision switch spec.md
/// §4.3 calls out, leaving a plane untouched when its toggle is off (the
/// caller is expected to already hold reconstructed pixels there, e.g. from
/// an earlier call with the other toggle set for the same PU).
#[allow(clippy::too_many_arguments)]
pub fn reconstruct_pu(
  luma_dst: &mut Plane,
  chroma_dsts: Option<(&mut Plane, &mut Plane)>,
  ref0: Option<(&Plane, Option<(&Plane, &Plane)>)>,
  ref1: Option<(&Plane, Option<(&Plane, &Plane)>)>,
  motion: PuMotion,
  luma_block: PredBlock,
  chroma_block: Option<PredBlock>,
  format: ChromaFormat,
  predict_luma: bool,
  predict_chroma: bool,
  bipred_high_precision: bool
) {
  use crate::enums::PredDirection;

  let l0_active = matches!(motion.dir, PredDirection::List0 | PredDirection::Bi);
  let l1_active = matches!(motion.dir, PredDirection::List1 | PredDirection::Bi);

  if predict_luma {
    match (l0_active, l1_active, ref0, ref1) {
      (true, true, Some((r0, _)), Some((r1, _))) => {
        let any_fractional = !is_luma_integer(motion.mv[0]) || !is_luma_integer(motion.mv[1]);
        reconstruct_bi_luma(luma_dst, r0, motion.mv[0], r1, motion.mv[1], luma_block, bipred_high_precision && any_fractional);
      }
      (true, false, Some((r0, _)), _) => reconstruct_uni_luma(luma_dst, r0, PredBlock { mv: motion.mv[0], ..luma_block }),
      (false, true, _, Some((r1, _))) => reconstruct_uni_luma(luma_dst, r1, PredBlock { mv: motion.mv[1], ..luma_block }),
      _ => {}
    }
  }

  if predict_chroma {
    if let (Some((cb_dst, cr_dst)), Some(cb_block)) = (chroma_dsts, chroma_block) {
      let r0_chroma = ref0.and_then(|(_, c)| c);
      let r1_chroma = ref1.and_then(|(_, c)| c);
      match (l0_active, l1_active, r0_chroma, r1_chroma) {
        (true, true, Some((cb0, cr0)), Some((cb1, cr1))) => {
          let any_fractional = !is_chroma_integer(motion.mv[0]) || !is_chroma_integer(motion.mv[1]);
          let hp = bipred_high_precision && any_fractional;
          reconstruct_bi_chroma(cb_dst, cb0, motion.mv[0], cb1, motion.mv[1], cb_block, format, hp);
          reconstruct_bi_chroma(cr_dst, cr0, motion.mv[0], cr1, motion.mv[1], cb_block, format, hp);
        }
        (true, false, Some((cb0, cr0)), _) => {
          reconstruct_uni_chroma(cb_dst, cb0, PredBlock { mv: motion.mv[0], ..cb_block }, format);
          reconstruct_uni_chroma(cr_dst, cr0, PredBlock { mv: motion.mv[0], ..cb_block }, format);
        }
        (false, true, _, Some((cb1, cr1))) => {
          reconstruct_uni_chroma(cb_dst, cb1, PredBlock { mv: motion.mv[1], ..cb_block }, format);
          reconstruct_uni_chroma(cr_dst, cr1, PredBlock { mv: motion.mv[1], ..cb_block }, format);
        }
        _ => {}
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn integer_mv_copies_samples_unchanged() {
    let mut reference = Plane::new(16, 16);
    for (i, b) in reference.data.iter_mut().enumerate() {
      *b = (i % 251) as u8;
    }
    let mut dst = Plane::new(16, 16);
    let block = PredBlock { dst_x: 0, dst_y: 0, width: 4, height: 4, mv: [4, -8] };
    reconstruct_uni_luma(&mut dst, &reference, block);
    for row in 0..4 {
      for col in 0..4 {
        let expected = reference.get_clamped(col as i32 + 1, row as i32 - 2);
        assert_eq!(dst.data[row * dst.stride + col], expected);
      }
    }
  }

  #[test]
  fn out_of_frame_motion_extrapolates_via_border_clamp() {
    let mut reference = Plane::new(8, 8);
    for b in reference.data.iter_mut() {
      *b = 200;
    }
    let mut dst = Plane::new(8, 8);
    // A large negative MV pushes the source block entirely off the
    // top-left corner of the reference picture.
    let block = PredBlock { dst_x: 0, dst_y: 0, width: 2, height: 2, mv: [-400, -400] };
    reconstruct_uni_luma(&mut dst, &reference, block);
    assert_eq!(dst.data[0], 200);
  }

  #[test]
  fn bipred_blend_averages_the_two_predictions() {
    let mut ref0 = Plane::new(8, 8);
    let mut ref1 = Plane::new(8, 8);
    for b in ref0.data.iter_mut() {
      *b = 100;
    }
    for b in ref1.data.iter_mut() {
      *b = 200;
    }
    let mut dst = Plane::new(8, 8);
    let block = PredBlock { dst_x: 0, dst_y: 0, width: 2, height: 2, mv: [0, 0] };
    reconstruct_bi_luma(&mut dst, &ref0, [0, 0], &ref1, [0, 0], block, true);
    assert_eq!(dst.data[0], 150);
  }

  #[test]
  fn bipred_chroma_blend_averages_the_two_predictions() {
    let mut ref0 = Plane::new(8, 8);
    let mut ref1 = Plane::new(8, 8);
    for b in ref0.data.iter_mut() {
      *b = 60;
    }
    for b in ref1.data.iter_mut() {
      *b = 20;
    }
    let mut dst = Plane::new(8, 8);
    let block = PredBlock { dst_x: 0, dst_y: 0, width: 2, height: 2, mv: [0, 0] };
    reconstruct_bi_chroma(&mut dst, &ref0, [0, 0], &ref1, [0, 0], block, ChromaFormat::Yuv420, true);
    assert_eq!(dst.data[0], 40);
  }

  #[test]
  fn reconstruct_pu_skips_chroma_when_toggled_off() {
    let mut ref0 = Plane::new(8, 8);
    for b in ref0.data.iter_mut() {
      *b = 77;
    }
    let mut luma_dst = Plane::new(8, 8);
    let mut cb_dst = Plane::new(4, 4);
    let mut cr_dst = Plane::new(4, 4);
    for b in cb_dst.data.iter_mut() {
      *b = 9;
    }
    for b in cr_dst.data.iter_mut() {
      *b = 9;
    }
    let luma_block = PredBlock { dst_x: 0, dst_y: 0, width: 2, height: 2, mv: [0, 0] };
    let motion = PuMotion { dir: crate::enums::PredDirection::List0, mv: [[0, 0], [0, 0]] };
    reconstruct_pu(
      &mut luma_dst,
      Some((&mut cb_dst, &mut cr_dst)),
      Some((&ref0, None)),
      None,
      motion,
      luma_block,
      None,
      ChromaFormat::Yuv420,
      true,
      false,
      true
    );
    assert_eq!(luma_dst.data[0], 77);
    // Chroma toggle was off: destination planes are untouched.
    assert_eq!(cb_dst.data[0], 9);
    assert_eq!(cr_dst.data[0], 9);
  }

  #[test]
  fn reconstruct_pu_bi_prediction_blends_both_lists() {
    let mut ref0 = Plane::new(8, 8);
    let mut ref1 = Plane::new(8, 8);
    for b in ref0.data.iter_mut() {
      *b = 100;
    }
    for b in ref1.data.iter_mut() {
      *b = 200;
    }
    let mut luma_dst = Plane::new(8, 8);
    let luma_block = PredBlock { dst_x: 0, dst_y: 0, width: 2, height: 2, mv: [0, 0] };
    let motion = PuMotion { dir: crate::enums::PredDirection::Bi, mv: [[0, 0], [0, 0]] };
    reconstruct_pu(
      &mut luma_dst,
      None,
      Some((&ref0, None)),
      Some((&ref1, None)),
      motion,
      luma_block,
      None,
      ChromaFormat::Yuv420,
      true,
      false,
      true
    );
    assert_eq!(luma_dst.data[0], 150);
  }
}
