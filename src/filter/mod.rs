// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Diamond filter kernels.
//!
//! Both kernels evaluate
//! `cur + ((64 + sum(c[k] * (clip(a_k - cur) + clip(b_k - cur)))) >> 7)`
//! where `a_k` and `b_k` are the two samples of the k-th symmetric tap
//! pair, then clamp the result to the sample range. The rows and columns
//! of `a_k` and `b_k` come from the unit's [`BoundaryModel`].

use crate::boundary::BoundaryModel;
use crate::frame::*;
use crate::util::*;

pub mod chroma;
pub mod luma;

pub use chroma::filter_chroma;
pub use luma::filter_luma;

/// Precision of the filter coefficients.
pub const ALF_NUM_BITS: u32 = 8;
const ALF_SHIFT: u32 = ALF_NUM_BITS - 1;
const ALF_ROUND: i32 = 1 << (ALF_SHIFT - 1);

/// Rows processed per kernel step.
pub const STEP_Y: usize = 4;
/// Columns processed per luma kernel step.
pub const LUMA_STEP_X: usize = 8;
/// Columns processed per chroma kernel step.
pub const CHROMA_STEP_X: usize = 4;

/// Offsets `(dy, dx)` of one sample of each symmetric tap pair; the other
/// sample sits at `(-dy, -dx)`.
pub(crate) type TapOffsets = [(isize, isize)];

/// Area of one component filtered with one boundary configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilterUnit {
  pub plane: PlaneType,
  /// Area in samples of `plane`.
  pub area: Rect,
  pub model: BoundaryModel,
}

impl FilterUnit {
  pub const fn new(
    plane: PlaneType, area: Rect, model: BoundaryModel,
  ) -> Self {
    FilterUnit { plane, area, model }
  }
}

/// Valid output sample values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampleRange {
  pub min: i32,
  pub max: i32,
}

impl SampleRange {
  /// Full range of `bit_depth` bit samples.
  pub const fn new(bit_depth: usize) -> Self {
    SampleRange { min: 0, max: max_sample(bit_depth) }
  }

  #[inline(always)]
  pub fn clamp(&self, v: i32) -> i32 {
    v.max(self.min).min(self.max)
  }
}

/// Samples excluded from filtering, at 2x2 granularity.
///
/// Flagged samples keep their unfiltered value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BypassMask {
  cols: usize,
  rows: usize,
  flags: Vec<bool>,
}

impl BypassMask {
  /// Empty mask for a plane of `width` by `height` samples.
  pub fn new(width: usize, height: usize) -> Self {
    let cols = (width + 1) >> 1;
    let rows = (height + 1) >> 1;
    BypassMask { cols, rows, flags: vec![false; cols * rows] }
  }

  /// Mask sized for `plane`.
  pub fn for_plane<T: Pixel>(plane: &Plane<T>) -> Self {
    Self::new(plane.cfg.width, plane.cfg.height)
  }

  /// Plane size the mask was created for, rounded up to even values.
  pub const fn dimensions(&self) -> (usize, usize) {
    (self.cols << 1, self.rows << 1)
  }

  /// Flags every 2x2 block touched by `rect`.
  ///
  /// # Panics
  ///
  /// - If `rect` extends past the mask.
  pub fn mark(&mut self, rect: Rect) {
    if rect.is_empty() {
      return;
    }
    let (x0, y0) = (rect.x >> 1, rect.y >> 1);
    let (x1, y1) = ((rect.right() + 1) >> 1, (rect.bottom() + 1) >> 1);
    assert!(x1 <= self.cols && y1 <= self.rows, "{rect:?} outside mask");
    for y in y0..y1 {
      self.flags[y * self.cols + x0..y * self.cols + x1].fill(true);
    }
  }

  #[inline(always)]
  pub fn is_set(&self, x: usize, y: usize) -> bool {
    self.flags[(y >> 1) * self.cols + (x >> 1)]
  }
}

/// Checks the geometry shared by both kernels.
fn check_unit<T: Pixel>(
  src: &Plane<T>, dst: &PlaneStripeMut<'_, T>, unit: &FilterUnit,
  step_x: usize, bypass: Option<&BypassMask>,
) {
  let area = unit.area;
  assert!(
    area.x % LUMA_STEP_X == 0
      && area.y % STEP_Y == 0
      && area.width % step_x == 0
      && area.height % STEP_Y == 0,
    "{:?} unit {area:?} is not aligned to the kernel steps",
    unit.plane
  );
  assert!(
    area.right() <= src.cfg.width && area.bottom() <= src.cfg.height,
    "unit {area:?} outside the {}x{} plane",
    src.cfg.width,
    src.cfg.height
  );
  let rows = dst.rows();
  assert!(
    area.is_empty() || (rows.start <= area.y && area.bottom() <= rows.end),
    "destination rows {rows:?} do not cover unit {area:?}"
  );
  if let Some(mask) = bypass {
    let (w, h) = mask.dimensions();
    assert!(area.right() <= w && area.bottom() <= h);
  }
}

/// Filters the rows of `unit` with the coefficients returned by `taps`.
///
/// `taps(x, y)` is asked once per kernel step of `group` columns and
/// returns the coefficients and clipping bounds of every tap pair.
#[inline(always)]
fn filter_unit<T: Pixel, const N: usize>(
  src: &Plane<T>, dst: &mut PlaneStripeMut<'_, T>, unit: &FilterUnit,
  offsets: &TapOffsets, group: usize, range: SampleRange,
  bypass: Option<&BypassMask>,
  mut taps: impl FnMut(usize, usize) -> ([i16; N], [i16; N]),
) {
  let area = unit.area;
  let model = &unit.model;
  let last_col = src.cfg.width as isize - 1;

  for y in area.y..area.bottom() {
    let rows = model.tap_rows(y as isize).map(|r| src.row_clamped(r));
    let out = dst.row_mut(y);
    for x0 in (area.x..area.right()).step_by(group) {
      let (coeffs, clips) = taps(x0, y);
      for x in x0..x0 + group {
        if bypass.map_or(false, |mask| mask.is_set(x, y)) {
          out[x] = rows[3][x];
          continue;
        }
        let cols = model.tap_cols(x as isize).map(|c| c.clamp(0, last_col));
        out[x] = diamond(&rows, &cols, offsets, &coeffs, &clips, range);
      }
    }
  }
}

/// Evaluates one diamond at the centre of `rows` and `cols`.
///
/// `rows` and `cols` hold the substituted positions for offsets
/// `-3..=3`; `coeffs` and `clips` may carry a trailing centre entry,
/// which is not used.
#[inline(always)]
fn diamond<T: Pixel>(
  rows: &[&[T]; 7], cols: &[isize; 7], offsets: &TapOffsets, coeffs: &[i16],
  clips: &[i16], range: SampleRange,
) -> T {
  let at = |dy: isize, dx: isize| {
    i32::cast_from(rows[(3 + dy) as usize][cols[(3 + dx) as usize] as usize])
  };
  let cur = at(0, 0);
  let mut sum = ALF_ROUND;
  for ((&(dy, dx), &coeff), &clip) in offsets.iter().zip(coeffs).zip(clips) {
    let bound = clip as i32;
    let pair = clip_diff(at(dy, dx) - cur, bound)
      + clip_diff(at(-dy, -dx) - cur, bound);
    sum += coeff as i32 * pair;
  }
  T::cast_from(range.clamp(cur + (sum >> ALF_SHIFT)))
}
