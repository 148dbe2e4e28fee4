// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Sample availability around a filtering unit.
//!
//! A [`BoundaryModel`] answers, for the classifier and for both diamond
//! kernels, which row or column a neighbour fetch really reads. Two kinds
//! of cuts exist:
//!
//! - the virtual boundary, a horizontal line `pos` rows into every CTU
//!   row. Filter taps are limited symmetrically around it: when one side
//!   of the diamond would cross, the mirrored tap is pulled in by the same
//!   amount. Gradients only repeat the last row on their own side.
//! - real edges of the slice or tile, given as absolute coordinates.
//!   Fetches past them repeat the edge-adjacent sample by default.
//!
//! All coordinates are in samples of the plane being processed; use
//! [`BoundaryDescriptor::decimated`] to map a luma descriptor onto a
//! subsampled chroma plane.

/// Activity normalisation for each remaining classification window area,
/// indexed by `(area + 4) >> 3`.
const WINDOW_AREA_SCALE: [u32; 9] = [65, 65, 65, 192, 128, 112, 96, 65, 64];

/// Activity normalisation of a full 8x8 classification window.
pub const FULL_WINDOW_SCALE: u32 = 64;
/// Activity normalisation of a window cut by the virtual boundary.
pub const REDUCED_WINDOW_SCALE: u32 = 96;

/// Horizontal virtual boundary repeated in every CTU row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VirtualBoundary {
  /// Height of a CTU row. Must be a power of two.
  pub ctu_height: usize,
  /// Offset of the boundary inside the CTU row. The boundary lies between
  /// rows `pos - 1` and `pos`.
  pub pos: usize,
}

impl VirtualBoundary {
  /// # Panics
  ///
  /// - If `ctu_height` is not a power of two or `pos` lies outside the CTU.
  pub fn new(ctu_height: usize, pos: usize) -> Self {
    let vb = VirtualBoundary { ctu_height, pos };
    vb.check();
    vb
  }

  /// Boundary placed `offset` rows above the bottom of every CTU row.
  pub fn above_ctu_bottom(ctu_height: usize, offset: usize) -> Self {
    Self::new(ctu_height, ctu_height - offset)
  }

  #[inline(always)]
  fn check(&self) {
    assert!(
      self.ctu_height.is_power_of_two(),
      "CTU height {} is not a power of two",
      self.ctu_height
    );
    assert!(self.pos > 0 && self.pos < self.ctu_height);
  }

  /// Maps the boundary onto a plane subsampled vertically by `ydec`.
  #[inline(always)]
  pub const fn decimated(self, ydec: usize) -> Self {
    VirtualBoundary {
      ctu_height: self.ctu_height >> ydec,
      pos: self.pos >> ydec,
    }
  }

  /// Position of row `y` inside its CTU row.
  #[inline(always)]
  const fn offset(&self, y: isize) -> isize {
    y & (self.ctu_height as isize - 1)
  }

  /// Signed distance of row `y` from the boundary of its CTU row.
  ///
  /// Rows above the line get negative values, counting from -1; rows
  /// below count from 0.
  #[inline(always)]
  pub const fn distance(&self, y: isize) -> isize {
    self.offset(y) - self.pos as isize
  }
}

/// Slice, tile or subpicture edges of a filtering unit.
///
/// `top` and `left` are the first available row and column, `bottom`
/// and `right` the first unavailable ones. `None` means the unit is not
/// cut on that side.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Edges {
  pub top: Option<isize>,
  pub bottom: Option<isize>,
  pub left: Option<isize>,
  pub right: Option<isize>,
}

impl Edges {
  pub const NONE: Edges =
    Edges { top: None, bottom: None, left: None, right: None };

  #[inline(always)]
  pub const fn is_none(&self) -> bool {
    self.top.is_none()
      && self.bottom.is_none()
      && self.left.is_none()
      && self.right.is_none()
  }

  /// Maps luma edges onto a plane subsampled by `xdec`/`ydec`.
  pub fn decimated(self, xdec: usize, ydec: usize) -> Self {
    Edges {
      top: self.top.map(|v| v >> ydec),
      bottom: self.bottom.map(|v| v >> ydec),
      left: self.left.map(|v| v >> xdec),
      right: self.right.map(|v| v >> xdec),
    }
  }
}

/// Boundaries of one filtering unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BoundaryDescriptor {
  pub virtual_boundary: Option<VirtualBoundary>,
  pub edges: Edges,
}

impl BoundaryDescriptor {
  /// A unit with no boundary at all.
  pub const NONE: BoundaryDescriptor =
    BoundaryDescriptor { virtual_boundary: None, edges: Edges::NONE };

  pub const fn new(
    virtual_boundary: Option<VirtualBoundary>, edges: Edges,
  ) -> Self {
    BoundaryDescriptor { virtual_boundary, edges }
  }

  /// Maps a luma descriptor onto a plane subsampled by `xdec`/`ydec`.
  pub fn decimated(self, xdec: usize, ydec: usize) -> Self {
    BoundaryDescriptor {
      virtual_boundary: self.virtual_boundary.map(|vb| vb.decimated(ydec)),
      edges: self.edges.decimated(xdec, ydec),
    }
  }
}

/// Which boundaries take part in filtering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryStrategy {
  /// Only the virtual boundary is honoured. Windows cut by it are
  /// normalised with a fixed scale of 96.
  VirtualOnly,
  /// Virtual boundary and real edges are honoured. Cut windows are
  /// normalised by their remaining area.
  #[default]
  EdgeAware,
}

/// Substitution used by filter taps crossing a real edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgePadding {
  /// Clamp the fetch to the edge-adjacent row or column.
  #[default]
  Repeat,
  /// Limit the tap distance on both sides of the diamond, as the virtual
  /// boundary does.
  Mirror,
}

/// Substitution policy shared by the classifier and the filter kernels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundaryModel {
  descriptor: BoundaryDescriptor,
  strategy: BoundaryStrategy,
  padding: EdgePadding,
}

impl BoundaryModel {
  /// # Panics
  ///
  /// - If the virtual boundary has a CTU height that is not a power of two.
  pub fn new(
    descriptor: BoundaryDescriptor, strategy: BoundaryStrategy,
    padding: EdgePadding,
  ) -> Self {
    if let Some(vb) = descriptor.virtual_boundary {
      vb.check();
    }
    BoundaryModel { descriptor, strategy, padding }
  }

  /// Model ignoring every boundary.
  pub fn unbounded() -> Self {
    Self::new(
      BoundaryDescriptor::NONE,
      BoundaryStrategy::EdgeAware,
      EdgePadding::Repeat,
    )
  }

  #[inline(always)]
  pub const fn descriptor(&self) -> &BoundaryDescriptor {
    &self.descriptor
  }

  #[inline(always)]
  pub const fn strategy(&self) -> BoundaryStrategy {
    self.strategy
  }

  #[inline(always)]
  pub const fn padding(&self) -> EdgePadding {
    self.padding
  }

  /// Edges in effect under the configured strategy.
  #[inline(always)]
  pub const fn edges(&self) -> Edges {
    match self.strategy {
      BoundaryStrategy::VirtualOnly => Edges::NONE,
      BoundaryStrategy::EdgeAware => self.descriptor.edges,
    }
  }

  /// How far a symmetric vertical tap centred on row `y` may reach.
  #[inline(always)]
  fn vertical_reach(&self, y: isize) -> isize {
    let mut reach = isize::MAX;
    if let Some(vb) = self.descriptor.virtual_boundary {
      let d = vb.distance(y);
      reach = if d < 0 { -d - 1 } else { d };
    }
    if self.padding == EdgePadding::Mirror {
      let edges = self.edges();
      if let Some(top) = edges.top {
        reach = reach.min((y - top).max(0));
      }
      if let Some(bottom) = edges.bottom {
        reach = reach.min((bottom - 1 - y).max(0));
      }
    }
    reach
  }

  #[inline(always)]
  fn horizontal_reach(&self, x: isize) -> isize {
    let mut reach = isize::MAX;
    if self.padding == EdgePadding::Mirror {
      let edges = self.edges();
      if let Some(left) = edges.left {
        reach = reach.min((x - left).max(0));
      }
      if let Some(right) = edges.right {
        reach = reach.min((right - 1 - x).max(0));
      }
    }
    reach
  }

  #[inline(always)]
  fn clamp_row(&self, y: isize) -> isize {
    let edges = self.edges();
    if edges.is_none() {
      return y;
    }
    let y = edges.top.map_or(y, |top| y.max(top));
    edges.bottom.map_or(y, |bottom| y.min(bottom - 1))
  }

  #[inline(always)]
  fn clamp_col(&self, x: isize) -> isize {
    let edges = self.edges();
    if edges.is_none() {
      return x;
    }
    let x = edges.left.map_or(x, |left| x.max(left));
    edges.right.map_or(x, |right| x.min(right - 1))
  }

  /// Rows read by the filter taps of row `y`, indexed by `dy + 3` for
  /// `dy` in `-3..=3`.
  ///
  /// The 5x5 diamond uses the inner five entries; the substitution of a
  /// given offset does not depend on the diamond size.
  #[inline]
  pub fn tap_rows(&self, y: isize) -> [isize; 7] {
    let reach = self.vertical_reach(y);
    let mut rows = [0; 7];
    for (i, row) in rows.iter_mut().enumerate() {
      let dy = (i as isize - 3).clamp(-reach, reach);
      *row = self.clamp_row(y + dy);
    }
    rows
  }

  /// Columns read by the filter taps of column `x`, indexed by `dx + 3`.
  #[inline]
  pub fn tap_cols(&self, x: isize) -> [isize; 7] {
    let reach = self.horizontal_reach(x);
    let mut cols = [0; 7];
    for (i, col) in cols.iter_mut().enumerate() {
      let dx = (i as isize - 3).clamp(-reach, reach);
      *col = self.clamp_col(x + dx);
    }
    cols
  }

  /// Row read when a gradient of the 2x2 sub-block starting at row `r`
  /// asks for row `r + dy`.
  ///
  /// A row across the virtual boundary repeats the last row on the
  /// sub-block's side; a row across a real edge repeats the edge row.
  #[inline]
  pub fn gradient_row(&self, r: isize, dy: isize) -> isize {
    let mut dy = dy;
    if let Some(vb) = self.descriptor.virtual_boundary {
      let d = vb.distance(r);
      if r > 0 {
        if d < 0 {
          dy = dy.min(-d - 1);
        } else {
          dy = dy.max(-d);
        }
      }
    }
    self.clamp_row(r + dy)
  }

  /// Column read when a gradient asks for column `x`.
  #[inline(always)]
  pub fn gradient_col(&self, x: isize) -> isize {
    self.clamp_col(x)
  }

  /// Whether the sub-block row pair starting at `r` belongs to the
  /// classification window of the 4x4 block starting at row `by`.
  #[inline]
  pub fn row_pair_available(&self, by: isize, r: isize) -> bool {
    if let Some(vb) = self.descriptor.virtual_boundary {
      let d = vb.distance(by);
      let crosses = if d < 0 { d + (r - by) >= 0 } else { d + (r - by) < 0 };
      if crosses {
        return false;
      }
    }
    let edges = self.edges();
    edges.top.map_or(true, |top| r >= top)
      && edges.bottom.map_or(true, |bottom| r + 1 < bottom)
  }

  /// Whether the sub-block column pair starting at `c` is available.
  #[inline]
  pub fn col_pair_available(&self, c: isize) -> bool {
    let edges = self.edges();
    edges.left.map_or(true, |left| c >= left)
      && edges.right.map_or(true, |right| c + 1 < right)
  }

  /// Activity normalisation for a classification window of `rows` by
  /// `cols` available samples.
  ///
  /// # Panics
  ///
  /// - If the window is empty or larger than 8x8.
  #[inline]
  pub fn activity_scale(&self, rows: usize, cols: usize) -> u32 {
    let area = rows * cols;
    assert!(area > 0 && area <= 64, "invalid window {rows}x{cols}");
    match self.strategy {
      BoundaryStrategy::VirtualOnly => {
        if area < 64 {
          REDUCED_WINDOW_SCALE
        } else {
          FULL_WINDOW_SCALE
        }
      }
      BoundaryStrategy::EdgeAware => WINDOW_AREA_SCALE[(area + 4) >> 3],
    }
  }
}
