// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use crate::util::*;

use rayon::prelude::*;
use std::ops::Range;

pub use v_frame::plane::*;

/// Reads of the picture area of a plane.
///
/// Coordinates outside the picture are clamped to it, so the outermost
/// rows and columns repeat indefinitely whatever the state of the
/// allocated border.
pub trait PlaneSamples<T: Pixel> {
  /// Row `y` of the picture, `y` clamped to `0..height`.
  fn row_clamped(&self, y: isize) -> &[T];

  /// Sample at (`x`, `y`), both coordinates clamped to the picture.
  fn sample(&self, x: isize, y: isize) -> i32;
}

impl<T: Pixel> PlaneSamples<T> for Plane<T> {
  #[inline(always)]
  fn row_clamped(&self, y: isize) -> &[T] {
    let PlaneConfig { stride, width, height, xorigin, yorigin, .. } =
      self.cfg;
    let y = y.clamp(0, height as isize - 1) as usize;
    let base = (yorigin + y) * stride + xorigin;
    &self.data[base..base + width]
  }

  #[inline(always)]
  fn sample(&self, x: isize, y: isize) -> i32 {
    let row = self.row_clamped(y);
    let x = x.clamp(0, row.len() as isize - 1) as usize;
    i32::cast_from(row[x])
  }
}

/// Mutable band of consecutive picture rows of a plane.
///
/// Bands returned by [`stripes_mut`] never overlap, which lets every band
/// be written by a different worker.
#[derive(Debug)]
pub struct PlaneStripeMut<'a, T: Pixel> {
  // starts at column xorigin of picture row `y`
  data: &'a mut [T],
  stride: usize,
  width: usize,
  y: usize,
  rows: usize,
}

impl<'a, T: Pixel> PlaneStripeMut<'a, T> {
  /// Band covering every picture row of `plane`.
  pub fn new(plane: &'a mut Plane<T>) -> Self {
    let PlaneConfig { stride, width, height, xorigin, yorigin, .. } =
      plane.cfg;
    let origin = yorigin * stride + xorigin;
    PlaneStripeMut {
      data: &mut plane.data[origin..],
      stride,
      width,
      y: 0,
      rows: height,
    }
  }

  /// Picture rows covered by this band.
  #[inline(always)]
  pub fn rows(&self) -> Range<usize> {
    self.y..self.y + self.rows
  }

  /// Picture row `y`, which must lie inside the band.
  ///
  /// # Panics
  ///
  /// - If `y` is not covered by the band.
  #[inline(always)]
  pub fn row_mut(&mut self, y: usize) -> &mut [T] {
    assert!(self.rows().contains(&y), "row {y} outside {:?}", self.rows());
    let base = (y - self.y) * self.stride;
    &mut self.data[base..base + self.width]
  }

  /// Read-only view of picture row `y`.
  ///
  /// # Panics
  ///
  /// - If `y` is not covered by the band.
  #[inline(always)]
  pub fn row(&self, y: usize) -> &[T] {
    assert!(self.rows().contains(&y), "row {y} outside {:?}", self.rows());
    let base = (y - self.y) * self.stride;
    &self.data[base..base + self.width]
  }
}

/// Splits the picture rows of `plane` into bands of `rows` rows.
///
/// The last band is shorter when the height is not a multiple of `rows`.
///
/// # Panics
///
/// - If `rows` is zero.
pub fn stripes_mut<T: Pixel>(
  plane: &mut Plane<T>, rows: usize,
) -> impl ParallelIterator<Item = PlaneStripeMut<'_, T>> {
  assert!(rows > 0);
  let PlaneConfig { stride, width, height, xorigin, yorigin, .. } =
    plane.cfg;
  let origin = yorigin * stride + xorigin;
  plane.data[origin..]
    .par_chunks_mut(stride * rows)
    .enumerate()
    .map(move |(i, data)| {
      let y = i * rows;
      let rows = rows.min(height.saturating_sub(y));
      PlaneStripeMut { data, stride, width, y, rows }
    })
    .filter(|stripe| stripe.rows > 0)
}
