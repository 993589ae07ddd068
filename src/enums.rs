// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuType {
  Intra,
  Inter
}

// Partition shape of a coding unit, as signalled by part_mode / AMP splitting.
// 2Nx2N and NxN are square; the rest are the symmetric/asymmetric rectangular
// splits used by inter CUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartSize {
  Size2Nx2N,
  SizeNxN,
  Size2NxN,
  SizeNx2N,
  Size2NxnU,
  Size2NxnD,
  SizenLx2N,
  SizenRx2N
}

impl PartSize {
  // Number of prediction units this partition shape decomposes a CU into
  pub fn num_parts(self) -> usize {
    match self {
      PartSize::Size2Nx2N => 1,
      PartSize::SizeNxN => 4,
      _ => 2
    }
  }

  pub fn is_rectangular(self) -> bool {
    !matches!(self, PartSize::Size2Nx2N | PartSize::SizeNxN)
  }
}

// Split decision at one coding-tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
  NoSplit,
  QuadSplit
}

// Which reference picture list(s) a PU predicts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredDirection {
  List0,
  List1,
  Bi
}

// Multiple Transform Selection mode for the residual of a TU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtsMode {
  Off,
  // MTS signalled per-TU, implicitly for intra CUs only
  Intra,
  // MTS signalled per-TU, implicitly for inter CUs only
  Inter,
  // MTS signalled per-TU for both intra and inter CUs
  Both
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaFormat {
  Yuv400,
  Yuv420,
  Yuv422,
  Yuv444
}

impl ChromaFormat {
  pub fn chroma_shift_x(self) -> u32 {
    match self {
      ChromaFormat::Yuv400 => 0,
      ChromaFormat::Yuv420 | ChromaFormat::Yuv422 => 1,
      ChromaFormat::Yuv444 => 0
    }
  }

  pub fn chroma_shift_y(self) -> u32 {
    match self {
      ChromaFormat::Yuv400 => 0,
      ChromaFormat::Yuv420 => 1,
      ChromaFormat::Yuv422 | ChromaFormat::Yuv444 => 0
    }
  }
}

// Which spatial/temporal slot a merge or AMVP candidate came from. Kept
// around so diagnostics and tests can name a candidate the way the
// originating algorithm does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandSource {
  A0,
  A1,
  B0,
  B1,
  B2,
  Temporal,
  Hmvp,
  PairwiseAvg,
  Zero
}
