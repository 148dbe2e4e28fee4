// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Gradient based classification of 4x4 luma blocks.
//!
//! Each block looks at an 8x8 window (the block plus a two sample halo)
//! split into 2x2 sub-blocks. Only the top-left and bottom-right sample
//! of every sub-block contribute Laplacians in four directions. The
//! summed activity selects one of five strengths, the ratios between
//! directions select one of five direction classes, and the dominant
//! orientation is kept as a transpose index for the filter.

use crate::boundary::BoundaryModel;
use crate::filter::FilterUnit;
use crate::frame::*;
use crate::util::*;

use itertools::iproduct;
use std::ops::AddAssign;

pub const CLASS_BLOCK_SIZE_LOG2: usize = 2;
pub const CLASS_BLOCK_SIZE: usize = 1 << CLASS_BLOCK_SIZE_LOG2;

pub const NUM_CLASSES: usize = 25;
pub const NUM_TRANSPOSES: usize = 4;

/// Base class strength for each quantised activity.
const ACTIVITY_CLASS: [u8; 16] =
  [0, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3, 4];

/// Largest quantised activity.
const MAX_ACTIVITY: u32 = 15;

/// Class and geometric transform selected for one 4x4 luma block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClassEntry {
  /// Filter set, `0..25`.
  pub class_idx: u8,
  /// Tap ordering, `0..4`: identity, transpose, horizontal flip,
  /// rotation.
  pub transpose_idx: u8,
}

impl ClassEntry {
  /// Marker for blocks that have not been classified yet.
  pub const UNSET: ClassEntry =
    ClassEntry { class_idx: u8::MAX, transpose_idx: u8::MAX };

  #[inline(always)]
  pub const fn new(class_idx: u8, transpose_idx: u8) -> Self {
    ClassEntry { class_idx, transpose_idx }
  }

  #[inline(always)]
  pub const fn is_valid(&self) -> bool {
    (self.class_idx as usize) < NUM_CLASSES
      && (self.transpose_idx as usize) < NUM_TRANSPOSES
  }
}

/// Directional Laplacian sums.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Gradients {
  pub ver: u32,
  pub hor: u32,
  pub diag0: u32,
  pub diag1: u32,
}

impl AddAssign for Gradients {
  #[inline(always)]
  fn add_assign(&mut self, rhs: Self) {
    self.ver += rhs.ver;
    self.hor += rhs.hor;
    self.diag0 += rhs.diag0;
    self.diag1 += rhs.diag1;
  }
}

impl Gradients {
  /// Class of a window with these sums.
  ///
  /// `scale` normalises the activity for the window area; a full 8x8
  /// window uses 64.
  pub fn class(&self, bit_depth: usize, scale: u32) -> ClassEntry {
    let shift = bit_depth + 4;
    let activity =
      (((self.ver + self.hor) * scale) >> shift).min(MAX_ACTIVITY);
    let mut class_idx = ACTIVITY_CLASS[activity as usize];

    let (hv1, hv0, dir_hv) = if self.ver > self.hor {
      (self.ver, self.hor, 0)
    } else {
      (self.hor, self.ver, 1)
    };
    let (d1, d0, dir_d) = if self.diag0 > self.diag1 {
      (self.diag0, self.diag1, 0)
    } else {
      (self.diag1, self.diag0, 1)
    };

    // products are compared as unsigned 32-bit values
    let (hvd1, hvd0, dir_idx) =
      if d1.wrapping_mul(hv0) > hv1.wrapping_mul(d0) {
        (d1, d0, 0)
      } else {
        (hv1, hv0, 2)
      };

    if hvd1 * 2 > 9 * hvd0 {
      class_idx += (dir_idx + 2) * 5;
    } else if hvd1 > 2 * hvd0 {
      class_idx += (dir_idx + 1) * 5;
    }

    ClassEntry { class_idx, transpose_idx: 2 * dir_d + dir_hv }
  }
}

/// Gradient sums of the available part of one classification window.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassWindow {
  pub sums: Gradients,
  /// Available rows, in samples.
  pub rows: usize,
  /// Available columns, in samples.
  pub cols: usize,
}

impl ClassWindow {
  #[inline]
  pub fn class(&self, bit_depth: usize, model: &BoundaryModel) -> ClassEntry {
    self.sums.class(bit_depth, model.activity_scale(self.rows, self.cols))
  }
}

/// Laplacians of the 2x2 sub-block whose top-left sample is (`c`, `r`).
pub fn subblock_gradients<T: Pixel>(
  src: &Plane<T>, c: isize, r: isize, model: &BoundaryModel,
) -> Gradients {
  let rows = [-1, 0, 1, 2].map(|dy| model.gradient_row(r, dy));
  let cols = [-1, 0, 1, 2].map(|dx| model.gradient_col(c + dx));
  let p = |i: usize, j: usize| src.sample(cols[i], rows[j]);

  let (a, b) = (p(1, 1), p(2, 2));
  Gradients {
    ver: laplacian(a, p(1, 0), p(1, 2)) + laplacian(b, p(2, 1), p(2, 3)),
    hor: laplacian(a, p(2, 1), p(0, 1)) + laplacian(b, p(3, 2), p(1, 2)),
    diag0: laplacian(a, p(0, 0), p(2, 2)) + laplacian(b, p(1, 1), p(3, 3)),
    diag1: laplacian(a, p(0, 2), p(2, 0)) + laplacian(b, p(1, 3), p(3, 1)),
  }
}

/// Sums the sub-blocks of the window of block (`bx`, `by`) that the
/// boundary model leaves available.
#[inline]
fn gather_window(
  bx: isize, by: isize, model: &BoundaryModel,
  mut subblock: impl FnMut(isize, isize) -> Gradients,
) -> ClassWindow {
  let row_ok: [bool; 4] = std::array::from_fn(|k| {
    model.row_pair_available(by, by - 2 + 2 * k as isize)
  });
  let col_ok: [bool; 4] =
    std::array::from_fn(|m| model.col_pair_available(bx - 2 + 2 * m as isize));

  let mut window = ClassWindow {
    rows: 2 * row_ok.iter().filter(|&&ok| ok).count(),
    cols: 2 * col_ok.iter().filter(|&&ok| ok).count(),
    ..Default::default()
  };
  for (k, m) in iproduct!(0..4, 0..4) {
    if row_ok[k] && col_ok[m] {
      let r = by - 2 + 2 * k as isize;
      let c = bx - 2 + 2 * m as isize;
      window.sums += subblock(c, r);
    }
  }
  window
}

/// Classification window of the 4x4 block whose top-left sample is
/// (`bx`, `by`).
pub fn block_window<T: Pixel>(
  src: &Plane<T>, bx: usize, by: usize, model: &BoundaryModel,
) -> ClassWindow {
  gather_window(bx as isize, by as isize, model, |c, r| {
    subblock_gradients(src, c, r, model)
  })
}

/// Classifies a single 4x4 block.
pub fn classify_block<T: Pixel>(
  src: &Plane<T>, bx: usize, by: usize, bit_depth: usize,
  model: &BoundaryModel,
) -> ClassEntry {
  block_window(src, bx, by, model).class(bit_depth, model)
}

/// Per-block classes of one rectangular luma area.
#[derive(Clone, Debug, Default)]
pub struct ClassMap {
  area: Rect,
  cols: usize,
  entries: Vec<ClassEntry>,
}

impl ClassMap {
  /// Map covering `area`, every entry unset.
  pub fn new(area: Rect) -> Self {
    let mut map = ClassMap::default();
    map.reset(area);
    map
  }

  /// Re-targets the map at `area`, keeping its allocation.
  ///
  /// # Panics
  ///
  /// - If `area` is not aligned to 4x4 blocks.
  pub fn reset(&mut self, area: Rect) {
    assert!(
      area.x % CLASS_BLOCK_SIZE == 0
        && area.y % CLASS_BLOCK_SIZE == 0
        && area.width % CLASS_BLOCK_SIZE == 0
        && area.height % CLASS_BLOCK_SIZE == 0,
      "class map area {area:?} is not 4x4 aligned"
    );
    self.area = area;
    self.cols = area.width >> CLASS_BLOCK_SIZE_LOG2;
    let rows = area.height >> CLASS_BLOCK_SIZE_LOG2;
    self.entries.clear();
    self.entries.resize(self.cols * rows, ClassEntry::UNSET);
  }

  #[inline(always)]
  pub const fn area(&self) -> Rect {
    self.area
  }

  #[inline(always)]
  fn index(&self, x: usize, y: usize) -> usize {
    assert!(
      (self.area.x..self.area.right()).contains(&x)
        && (self.area.y..self.area.bottom()).contains(&y),
      "({x}, {y}) outside class map area {:?}",
      self.area
    );
    ((y - self.area.y) >> CLASS_BLOCK_SIZE_LOG2) * self.cols
      + ((x - self.area.x) >> CLASS_BLOCK_SIZE_LOG2)
  }

  /// Entry of the block containing sample (`x`, `y`).
  ///
  /// # Panics
  ///
  /// - If the sample lies outside the map.
  #[inline(always)]
  pub fn get(&self, x: usize, y: usize) -> ClassEntry {
    self.entries[self.index(x, y)]
  }

  /// Sets the entry of the block containing sample (`x`, `y`).
  ///
  /// # Panics
  ///
  /// - If the sample lies outside the map.
  #[inline(always)]
  pub fn set(&mut self, x: usize, y: usize, entry: ClassEntry) {
    let i = self.index(x, y);
    self.entries[i] = entry;
  }

  /// Sets every entry to `entry`.
  pub fn fill(&mut self, entry: ClassEntry) {
    self.entries.fill(entry);
  }
}

/// Classifies every 4x4 block of the unit's area into `map`.
///
/// The Laplacians of each 2x2 sub-block are computed once and shared by
/// all the windows that contain it.
///
/// # Panics
///
/// - If the unit is not a luma unit or its area is not 4x4 aligned.
pub fn classify<T: Pixel>(
  src: &Plane<T>, unit: &FilterUnit, bit_depth: usize, map: &mut ClassMap,
) {
  assert!(unit.plane.is_luma(), "cannot classify a {:?} unit", unit.plane);
  let area = unit.area;
  map.reset(area);
  if area.is_empty() {
    return;
  }
  let model = &unit.model;

  // sub-block grid spanning the windows of every block in the area
  let gx0 = area.x as isize - 2;
  let gy0 = area.y as isize - 2;
  let gw = area.width / 2 + 2;
  let gh = area.height / 2 + 2;
  let grid: Vec<Gradients> = iproduct!(0..gh, 0..gw)
    .map(|(j, i)| {
      let (c, r) = (gx0 + 2 * i as isize, gy0 + 2 * j as isize);
      subblock_gradients(src, c, r, model)
    })
    .collect();

  let step = CLASS_BLOCK_SIZE;
  for by in (area.y..area.bottom()).step_by(step) {
    for bx in (area.x..area.right()).step_by(step) {
      let window = gather_window(bx as isize, by as isize, model, |c, r| {
        let i = ((c - gx0) >> 1) as usize;
        let j = ((r - gy0) >> 1) as usize;
        grid[j * gw + i]
      });
      map.set(bx, by, window.class(bit_depth, model));
    }
  }
}
