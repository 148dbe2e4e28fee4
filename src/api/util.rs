// Copyright (c) 2018-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.
#![deny(missing_docs)]

use crate::filter::BypassMask;
use crate::frame::PlaneType;
use crate::params::*;

use thiserror::*;

/// Filter selection of one CTU.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CtuParams {
  /// Index into [`FrameParams::luma_sets`], `None` leaves luma unfiltered.
  pub luma: Option<usize>,
  /// Index into [`FrameParams::chroma_sets`] for Cb and Cr.
  pub chroma: [Option<usize>; 2],
}

impl CtuParams {
  /// Every component off.
  pub const DISABLED: CtuParams = CtuParams { luma: None, chroma: [None; 2] };

  /// Every component on, using the first filter of each list.
  pub const FIRST: CtuParams =
    CtuParams { luma: Some(0), chroma: [Some(0); 2] };

  /// Whether any component of the CTU is filtered.
  pub const fn is_enabled(&self) -> bool {
    self.luma.is_some() || self.chroma[0].is_some() || self.chroma[1].is_some()
  }
}

/// Filters and per-CTU selection for one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameParams {
  /// Luma filter sets the CTUs pick from.
  pub luma_sets: Vec<LumaFilterSet>,
  /// Chroma alternatives of the Cb and Cr planes.
  pub chroma_sets: [Vec<ChromaFilterSet>; 2],
  /// Selection of every CTU, in raster order.
  pub ctus: Vec<CtuParams>,
  /// Samples of each plane kept unfiltered when PCM bypass is enabled.
  pub bypass: [Option<BypassMask>; 3],
}

impl FrameParams {
  /// Parameters leaving all of `ctu_count` CTUs unfiltered.
  pub fn disabled(ctu_count: usize) -> Self {
    FrameParams {
      ctus: vec![CtuParams::DISABLED; ctu_count],
      ..Default::default()
    }
  }

  /// Parameters filtering every CTU with the same filters.
  ///
  /// `chroma` is used for both chroma planes.
  pub fn uniform(
    ctu_count: usize, luma: LumaFilterSet, chroma: ChromaFilterSet,
  ) -> Self {
    FrameParams {
      luma_sets: vec![luma],
      chroma_sets: [vec![chroma], vec![chroma]],
      ctus: vec![CtuParams::FIRST; ctu_count],
      bypass: Default::default(),
    }
  }

  /// Checks every filter and every CTU selection.
  ///
  /// # Errors
  ///
  /// - Returns `FilterError` for the first invalid coefficient or clip,
  ///   or for a CTU selecting a filter that does not exist.
  pub fn validate(&self) -> Result<(), FilterError> {
    use FilterError::*;

    for set in &self.luma_sets {
      set.validate()?;
    }
    for set in self.chroma_sets.iter().flatten() {
      set.validate()?;
    }
    for (ctu, params) in self.ctus.iter().enumerate() {
      if let Some(index) = params.luma {
        if index >= self.luma_sets.len() {
          return Err(MissingLumaSet { ctu, index });
        }
      }
      for (sets, (selected, plane)) in self
        .chroma_sets
        .iter()
        .zip(params.chroma.iter().zip([PlaneType::U, PlaneType::V]))
      {
        if let Some(index) = *selected {
          if index >= sets.len() {
            return Err(MissingChromaSet { ctu, plane, index });
          }
        }
      }
    }
    Ok(())
  }
}

/// Invalid frame or filter parameters.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum FilterError {
  /// A coefficient is outside `-128..=127`.
  #[error("invalid coefficient {value} at tap {tap} of class {class:?}")]
  InvalidCoefficient {
    /// Luma class, `None` for chroma filters.
    class: Option<usize>,
    /// Tap index.
    tap: usize,
    /// Actual value.
    value: i16,
  },
  /// A clipping bound is negative.
  #[error("invalid clip {value} at tap {tap} of class {class:?}")]
  InvalidClip {
    /// Luma class, `None` for chroma filters.
    class: Option<usize>,
    /// Tap index.
    tap: usize,
    /// Actual value.
    value: i16,
  },
  /// A clip index is not below 4.
  #[error("invalid clip index {index} at tap {tap} of class {class:?}")]
  InvalidClipIndex {
    /// Luma class, `None` for chroma filters.
    class: Option<usize>,
    /// Tap index.
    tap: usize,
    /// Actual index.
    index: u8,
  },
  /// A plane does not match the configured frame geometry.
  #[error("{plane:?} plane is {found:?}, expected {expected:?}")]
  FrameSizeMismatch {
    /// Offending plane.
    plane: PlaneType,
    /// Configured width and height.
    expected: (usize, usize),
    /// Actual width and height.
    found: (usize, usize),
  },
  /// The CTU table does not cover the picture.
  #[error("{found} CTU parameters for {expected} CTUs")]
  CtuCountMismatch {
    /// CTUs in the picture.
    expected: usize,
    /// Entries in the table.
    found: usize,
  },
  /// A CTU selects a luma filter set that does not exist.
  #[error("CTU {ctu} selects missing luma filter set {index}")]
  MissingLumaSet {
    /// Raster index of the CTU.
    ctu: usize,
    /// Selected set.
    index: usize,
  },
  /// A CTU selects a chroma alternative that does not exist.
  #[error("CTU {ctu} selects missing {plane:?} chroma filter {index}")]
  MissingChromaSet {
    /// Raster index of the CTU.
    ctu: usize,
    /// Chroma plane.
    plane: PlaneType,
    /// Selected alternative.
    index: usize,
  },
  /// A CTU enables chroma filtering on a luma-only picture.
  #[error("CTU {ctu} enables chroma filtering without chroma planes")]
  NoChromaPlanes {
    /// Raster index of the CTU.
    ctu: usize,
  },
  /// A bypass mask is smaller than its plane.
  #[error("bypass mask of the {0:?} plane does not cover it")]
  BypassMaskMismatch(PlaneType),
}
