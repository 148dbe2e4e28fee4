// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Picture partitioning into CTUs, tiles and rectangular slices.

use crate::api::InvalidConfig;
use crate::boundary::*;
use crate::frame::Rect;

use itertools::{iproduct, Itertools};

pub const MIN_CTU_SIZE: usize = 16;
pub const MAX_CTU_SIZE: usize = 256;

/// Rectangle of CTUs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CtuRect {
  pub x: usize,
  pub y: usize,
  pub width: usize,
  pub height: usize,
}

impl CtuRect {
  pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
    CtuRect { x, y, width, height }
  }

  #[inline(always)]
  pub const fn contains(&self, cx: usize, cy: usize) -> bool {
    cx >= self.x
      && cx < self.x + self.width
      && cy >= self.y
      && cy < self.y + self.height
  }
}

/// CTU grid of a picture together with its tiles and slices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PictureLayout {
  width: usize,
  height: usize,
  ctu_size_log2: usize,
  cols: usize,
  rows: usize,
  /// First CTU column of every tile column.
  tile_cols: Vec<usize>,
  /// First CTU row of every tile row.
  tile_rows: Vec<usize>,
  /// Slice of every CTU, in raster order.
  slice_map: Vec<usize>,
  filter_across_tiles: bool,
  filter_across_slices: bool,
}

fn check_starts(starts: &[usize], count: usize) -> bool {
  starts.first() == Some(&0)
    && starts.windows(2).all(|w| w[0] < w[1])
    && starts.iter().all(|&s| s < count)
}

impl PictureLayout {
  /// Picture of `width` by `height` luma samples made of a single tile and
  /// a single slice.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidConfig` if a dimension is zero or `ctu_size` is
  ///   not a power of two in `16..=256`.
  pub fn new(
    width: usize, height: usize, ctu_size: usize,
  ) -> Result<Self, InvalidConfig> {
    if width == 0 {
      return Err(InvalidConfig::InvalidWidth(width));
    }
    if height == 0 {
      return Err(InvalidConfig::InvalidHeight(height));
    }
    if !ctu_size.is_power_of_two()
      || !(MIN_CTU_SIZE..=MAX_CTU_SIZE).contains(&ctu_size)
    {
      return Err(InvalidConfig::InvalidCtuSize(ctu_size));
    }
    let ctu_size_log2 = ctu_size.trailing_zeros() as usize;
    let cols = (width + ctu_size - 1) >> ctu_size_log2;
    let rows = (height + ctu_size - 1) >> ctu_size_log2;
    Ok(PictureLayout {
      width,
      height,
      ctu_size_log2,
      cols,
      rows,
      tile_cols: vec![0],
      tile_rows: vec![0],
      slice_map: vec![0; cols * rows],
      filter_across_tiles: true,
      filter_across_slices: true,
    })
  }

  /// Splits the picture into tiles starting at the given CTU columns and
  /// rows.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidConfig::InvalidTileLayout` unless both lists start
  ///   at 0, increase strictly and stay inside the picture.
  pub fn with_tiles(
    mut self, col_starts: Vec<usize>, row_starts: Vec<usize>,
  ) -> Result<Self, InvalidConfig> {
    if !check_starts(&col_starts, self.cols)
      || !check_starts(&row_starts, self.rows)
    {
      return Err(InvalidConfig::InvalidTileLayout);
    }
    self.tile_cols = col_starts;
    self.tile_rows = row_starts;
    Ok(self)
  }

  /// Splits the picture into `tile_cols` by `tile_rows` tiles of nearly
  /// equal size.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidConfig::InvalidTileLayout` if there are more tiles
  ///   than CTUs in a direction, or no tile at all.
  pub fn with_uniform_tiles(
    self, tile_cols: usize, tile_rows: usize,
  ) -> Result<Self, InvalidConfig> {
    if tile_cols == 0
      || tile_rows == 0
      || tile_cols > self.cols
      || tile_rows > self.rows
    {
      return Err(InvalidConfig::InvalidTileLayout);
    }
    let cols = (0..tile_cols).map(|i| i * self.cols / tile_cols).collect();
    let rows = (0..tile_rows).map(|i| i * self.rows / tile_rows).collect();
    self.with_tiles(cols, rows)
  }

  /// Splits the picture into rectangular slices.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidConfig::InvalidSliceLayout` with the first CTU not
  ///   covered by exactly one slice.
  pub fn with_slices(
    mut self, slices: &[CtuRect],
  ) -> Result<Self, InvalidConfig> {
    for (cy, cx) in iproduct!(0..self.rows, 0..self.cols) {
      let mut owners = slices.iter().positions(|s| s.contains(cx, cy));
      match (owners.next(), owners.next()) {
        (Some(slice), None) => self.slice_map[cy * self.cols + cx] = slice,
        _ => return Err(InvalidConfig::InvalidSliceLayout { x: cx, y: cy }),
      }
    }
    Ok(self)
  }

  /// Whether filtering may read across tile boundaries.
  pub fn with_filter_across_tiles(mut self, enabled: bool) -> Self {
    self.filter_across_tiles = enabled;
    self
  }

  /// Whether filtering may read across slice boundaries.
  pub fn with_filter_across_slices(mut self, enabled: bool) -> Self {
    self.filter_across_slices = enabled;
    self
  }

  #[inline(always)]
  pub const fn ctu_size(&self) -> usize {
    1 << self.ctu_size_log2
  }

  /// CTU columns.
  #[inline(always)]
  pub const fn cols(&self) -> usize {
    self.cols
  }

  /// CTU rows.
  #[inline(always)]
  pub const fn rows(&self) -> usize {
    self.rows
  }

  #[inline(always)]
  pub const fn ctu_count(&self) -> usize {
    self.cols * self.rows
  }

  /// Luma dimensions of the picture.
  #[inline(always)]
  pub const fn dimensions(&self) -> (usize, usize) {
    (self.width, self.height)
  }

  /// Luma samples of CTU (`cx`, `cy`), cropped to the picture.
  pub fn ctu_rect(&self, cx: usize, cy: usize) -> Rect {
    let x = cx << self.ctu_size_log2;
    let y = cy << self.ctu_size_log2;
    Rect {
      x,
      y,
      width: self.ctu_size().min(self.width - x),
      height: self.ctu_size().min(self.height - y),
    }
  }

  /// Raster index of the tile holding CTU (`cx`, `cy`).
  pub fn tile_index(&self, cx: usize, cy: usize) -> usize {
    let col = self.tile_cols.iter().rposition(|&s| s <= cx).unwrap_or(0);
    let row = self.tile_rows.iter().rposition(|&s| s <= cy).unwrap_or(0);
    row * self.tile_cols.len() + col
  }

  /// Index of the slice holding CTU (`cx`, `cy`).
  #[inline]
  pub fn slice_index(&self, cx: usize, cy: usize) -> usize {
    self.slice_map[cy * self.cols + cx]
  }

  /// Whether samples of CTU `b` may be read while filtering CTU `a`.
  fn connected(&self, a: (usize, usize), b: (usize, usize)) -> bool {
    (self.filter_across_tiles
      || self.tile_index(a.0, a.1) == self.tile_index(b.0, b.1))
      && (self.filter_across_slices
        || self.slice_index(a.0, a.1) == self.slice_index(b.0, b.1))
  }

  /// Edges of CTU (`cx`, `cy`) that filtering must not cross, in luma
  /// samples.
  ///
  /// Picture borders are not reported.
  pub fn edges(&self, cx: usize, cy: usize) -> Edges {
    let r = self.ctu_rect(cx, cy);
    let here = (cx, cy);
    let cut = |there: (usize, usize), at: usize| {
      (!self.connected(here, there)).then_some(at as isize)
    };
    Edges {
      top: if cy > 0 { cut((cx, cy - 1), r.y) } else { None },
      bottom: if cy + 1 < self.rows {
        cut((cx, cy + 1), r.bottom())
      } else {
        None
      },
      left: if cx > 0 { cut((cx - 1, cy), r.x) } else { None },
      right: if cx + 1 < self.cols {
        cut((cx + 1, cy), r.right())
      } else {
        None
      },
    }
  }

  /// Luma boundary descriptor of CTU (`cx`, `cy`).
  ///
  /// With `vb_offset` set, a virtual boundary lies that many rows above
  /// the bottom of every CTU row except the last one of the picture.
  pub fn boundary_descriptor(
    &self, cx: usize, cy: usize, vb_offset: Option<usize>,
  ) -> BoundaryDescriptor {
    let last_row = ((cy + 1) << self.ctu_size_log2) >= self.height;
    let virtual_boundary = vb_offset
      .filter(|_| !last_row)
      .map(|offset| {
        VirtualBoundary::above_ctu_bottom(self.ctu_size(), offset)
      });
    BoundaryDescriptor::new(virtual_boundary, self.edges(cx, cy))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn ctu_grid() {
    let layout = PictureLayout::new(200, 72, 64).unwrap();
    assert_eq!((layout.cols(), layout.rows()), (4, 2));
    assert_eq!(layout.ctu_rect(3, 1), Rect::new(192, 64, 8, 8));
    assert_eq!(layout.ctu_rect(1, 0), Rect::new(64, 0, 64, 64));
    assert_eq!(layout.edges(1, 1), Edges::NONE);
  }

  #[test]
  fn invalid_layouts() {
    assert_eq!(
      PictureLayout::new(64, 64, 48),
      Err(InvalidConfig::InvalidCtuSize(48))
    );
    assert_eq!(
      PictureLayout::new(0, 64, 64),
      Err(InvalidConfig::InvalidWidth(0))
    );
    let layout = PictureLayout::new(256, 256, 64).unwrap();
    assert_eq!(
      layout.clone().with_tiles(vec![1, 2], vec![0]),
      Err(InvalidConfig::InvalidTileLayout)
    );
    assert_eq!(
      layout.clone().with_uniform_tiles(5, 1),
      Err(InvalidConfig::InvalidTileLayout)
    );
    assert_eq!(
      layout.clone().with_slices(&[CtuRect::new(0, 0, 4, 3)]),
      Err(InvalidConfig::InvalidSliceLayout { x: 0, y: 3 })
    );
    assert_eq!(
      layout
        .with_slices(&[CtuRect::new(0, 0, 4, 4), CtuRect::new(1, 1, 1, 1)]),
      Err(InvalidConfig::InvalidSliceLayout { x: 1, y: 1 })
    );
  }

  #[test]
  fn tile_edges_follow_the_across_flag() {
    let layout = PictureLayout::new(256, 256, 64)
      .unwrap()
      .with_uniform_tiles(2, 2)
      .unwrap();
    assert_eq!(layout.tile_index(1, 1), 0);
    assert_eq!(layout.tile_index(2, 1), 1);
    assert_eq!(layout.tile_index(3, 3), 3);
    assert_eq!(layout.edges(1, 1), Edges::NONE);

    let layout = layout.with_filter_across_tiles(false);
    assert_eq!(
      layout.edges(1, 1),
      Edges { top: None, bottom: Some(128), left: None, right: Some(128) }
    );
    assert_eq!(
      layout.edges(2, 2),
      Edges { top: Some(128), bottom: None, left: Some(128), right: None }
    );
    assert_eq!(layout.edges(0, 0), Edges::NONE);
  }

  #[test]
  fn slice_edges_follow_the_across_flag() {
    let slices = [CtuRect::new(0, 0, 3, 2), CtuRect::new(0, 2, 3, 1)];
    let layout = PictureLayout::new(192, 192, 64)
      .unwrap()
      .with_slices(&slices)
      .unwrap()
      .with_filter_across_slices(false);
    assert_eq!(layout.slice_index(2, 2), 1);
    assert_eq!(layout.edges(1, 1).bottom, Some(128));
    assert_eq!(layout.edges(1, 2).top, Some(128));
    assert_eq!(layout.edges(1, 0), Edges::NONE);
  }

  #[test]
  fn virtual_boundary_skips_last_ctu_row() {
    let layout = PictureLayout::new(128, 200, 64).unwrap();
    let vb = |cx, cy, offset| {
      layout.boundary_descriptor(cx, cy, offset).virtual_boundary
    };
    assert_eq!(vb(0, 0, Some(4)), Some(VirtualBoundary::new(64, 60)));
    assert_eq!(vb(0, 2, Some(4)), Some(VirtualBoundary::new(64, 60)));
    assert_eq!(vb(1, 3, Some(4)), None);
    assert_eq!(vb(0, 0, None), None);
  }
}
