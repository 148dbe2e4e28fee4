// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Frames, planes and plane geometry.

use crate::util::*;

mod plane;
pub use plane::*;

/// Border allocated around every plane, in luma samples.
///
/// Sample reads are clamped to the picture and never reach into it.
pub const FRAME_MARGIN: usize = 8;

/// Colour component carried by a plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlaneType {
  /// Luma.
  Y,
  /// First chroma component.
  U,
  /// Second chroma component.
  V,
}

impl PlaneType {
  /// All components, in plane order.
  pub const ALL: [PlaneType; 3] = [PlaneType::Y, PlaneType::U, PlaneType::V];

  /// Index of the plane holding this component.
  #[inline(always)]
  pub const fn index(self) -> usize {
    self as usize
  }

  #[inline(always)]
  pub const fn is_luma(self) -> bool {
    matches!(self, PlaneType::Y)
  }

  #[inline(always)]
  pub const fn is_chroma(self) -> bool {
    !self.is_luma()
  }
}

/// Rectangle in plane coordinates.
///
/// Coordinates are relative to the plane origin `(xorigin, yorigin)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
  pub x: usize,
  pub y: usize,
  pub width: usize,
  pub height: usize,
}

impl Rect {
  #[inline(always)]
  pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
    Rect { x, y, width, height }
  }

  /// First column past the rectangle.
  #[inline(always)]
  pub const fn right(&self) -> usize {
    self.x + self.width
  }

  /// First row past the rectangle.
  #[inline(always)]
  pub const fn bottom(&self) -> usize {
    self.y + self.height
  }

  #[inline(always)]
  pub const fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  /// Maps a luma rectangle onto a plane subsampled by `xdec`/`ydec`.
  #[inline(always)]
  pub const fn decimated(&self, xdec: usize, ydec: usize) -> Self {
    Rect {
      x: self.x >> xdec,
      y: self.y >> ydec,
      width: self.width >> xdec,
      height: self.height >> ydec,
    }
  }
}

/// One video frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame<T: Pixel> {
  /// Planes constituting the frame.
  pub planes: [Plane<T>; 3],
}

impl<T: Pixel> Frame<T> {
  /// Creates a new frame with the given parameters.
  ///
  /// Allocates data for the planes. Dimensions are rounded up to a
  /// multiple of 8 luma samples. With `Cs400` both chroma planes are
  /// empty.
  pub fn new(
    width: usize, height: usize, chroma_sampling: ChromaSampling,
  ) -> Self {
    let luma_width = width.align_power_of_two(3);
    let luma_height = height.align_power_of_two(3);

    let (chroma_decimation_x, chroma_decimation_y) =
      chroma_sampling.get_decimation().unwrap_or((0, 0));
    let (chroma_width, chroma_height) =
      chroma_sampling.get_chroma_dimensions(luma_width, luma_height);
    let chroma_padding_x = FRAME_MARGIN >> chroma_decimation_x;
    let chroma_padding_y = FRAME_MARGIN >> chroma_decimation_y;

    let chroma_plane = || {
      Plane::new(
        chroma_width,
        chroma_height,
        chroma_decimation_x,
        chroma_decimation_y,
        chroma_padding_x,
        chroma_padding_y,
      )
    };

    Frame {
      planes: [
        Plane::new(luma_width, luma_height, 0, 0, FRAME_MARGIN, FRAME_MARGIN),
        chroma_plane(),
        chroma_plane(),
      ],
    }
  }

  /// Luma width in samples.
  #[inline(always)]
  pub fn width(&self) -> usize {
    self.planes[0].cfg.width
  }

  /// Luma height in samples.
  #[inline(always)]
  pub fn height(&self) -> usize {
    self.planes[0].cfg.height
  }
}
