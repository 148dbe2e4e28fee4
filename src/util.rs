// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Pixel traits and integer helpers shared by the classifier and kernels.

pub use v_frame::math::*;
pub use v_frame::pixel::*;

/// Clips a neighbour difference to `[-bound, bound]`.
///
/// A `bound` of zero cancels the difference entirely.
#[inline(always)]
pub fn clip_diff(diff: i32, bound: i32) -> i32 {
  diff.min(bound).max(-bound)
}

/// Absolute value of a second-order difference `2 * c - a - b`.
#[inline(always)]
pub fn laplacian(c: i32, a: i32, b: i32) -> u32 {
  (2 * c - a - b).unsigned_abs()
}

/// Largest sample value representable with `bit_depth` bits.
#[inline(always)]
pub const fn max_sample(bit_depth: usize) -> i32 {
  (1 << bit_depth) - 1
}
