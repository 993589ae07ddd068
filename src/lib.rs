// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Bitstream emission and motion-vector prediction for an HEVC/VVC-style
//! block-based video encoder.
//!
//! Three collaborating pieces, assembled around a shared per-SCU [`cu::CuArray`]:
//! - [`ctes`]: the Coding-Tree Entropy Serializer, walking the coding
//!   quad-tree and emitting CABAC bins for every syntax element a mode
//!   decision subsystem has already chosen.
//! - [`mvce`]: the Motion-Vector Candidate Engine, deriving AMVP and merge
//!   candidate lists from the spatial/temporal/history neighbourhood.
//! - [`ipr`]: Inter-Prediction Reconstruction, synthesising predicted pixels
//!   from a motion vector and a reference picture.
//!
//! Mode decision, rate-distortion optimisation, residual transform/quant,
//! and bitstream container/header emission are all external to this crate:
//! each of the three modules above only emits or derives from decisions an
//! external caller has already made.

pub mod array2d;
pub mod cabac;
pub mod config;
pub mod consts;
pub mod ctes;
pub mod cu;
pub mod enums;
pub mod error;
pub mod frame;
pub mod ipr;
pub mod mv;
pub mod mvce;

pub use error::{Error, Result};
