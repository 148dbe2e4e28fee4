// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Filter coefficients and clipping bounds.

use crate::api::FilterError;
use crate::classify::NUM_CLASSES;

/// Coefficients of the 7x7 luma diamond, the last one being the centre.
pub const NUM_LUMA_COEFFS: usize = 13;
/// Coefficients of the 5x5 chroma diamond, the last one being the centre.
pub const NUM_CHROMA_COEFFS: usize = 7;

pub const NUM_CLIP_VALUES: usize = 4;
const CLIP_SHIFT: [usize; NUM_CLIP_VALUES] = [0, 3, 5, 7];

pub const COEFF_MIN: i16 = -128;
pub const COEFF_MAX: i16 = 127;

/// Clipping bound signalled by `clip_idx` at `bit_depth`.
///
/// # Panics
///
/// - If `clip_idx` is not below [`NUM_CLIP_VALUES`].
#[inline]
pub fn clip_value(bit_depth: usize, clip_idx: usize) -> i16 {
  (1i32 << (bit_depth - CLIP_SHIFT[clip_idx])) as i16
}

fn check_taps(
  class: Option<usize>, coeffs: &[i16], clips: &[i16],
) -> Result<(), FilterError> {
  for (tap, (&value, &clip)) in coeffs.iter().zip(clips).enumerate() {
    if !(COEFF_MIN..=COEFF_MAX).contains(&value) {
      return Err(FilterError::InvalidCoefficient { class, tap, value });
    }
    if clip < 0 {
      return Err(FilterError::InvalidClip { class, tap, value: clip });
    }
  }
  Ok(())
}

fn clips_from_indices<const N: usize>(
  class: Option<usize>, indices: &[u8; N], bit_depth: usize,
) -> Result<[i16; N], FilterError> {
  let mut clips = [0; N];
  for (tap, (clip, &index)) in clips.iter_mut().zip(indices).enumerate() {
    if index as usize >= NUM_CLIP_VALUES {
      return Err(FilterError::InvalidClipIndex { class, tap, index });
    }
    *clip = clip_value(bit_depth, index as usize);
  }
  Ok(clips)
}

/// Per-class luma filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LumaFilterSet {
  pub coeffs: [[i16; NUM_LUMA_COEFFS]; NUM_CLASSES],
  pub clips: [[i16; NUM_LUMA_COEFFS]; NUM_CLASSES],
}

impl LumaFilterSet {
  pub const fn new(
    coeffs: [[i16; NUM_LUMA_COEFFS]; NUM_CLASSES],
    clips: [[i16; NUM_LUMA_COEFFS]; NUM_CLASSES],
  ) -> Self {
    LumaFilterSet { coeffs, clips }
  }

  /// Same filter for every class.
  pub const fn uniform(
    coeffs: [i16; NUM_LUMA_COEFFS], clips: [i16; NUM_LUMA_COEFFS],
  ) -> Self {
    LumaFilterSet {
      coeffs: [coeffs; NUM_CLASSES],
      clips: [clips; NUM_CLASSES],
    }
  }

  /// Builds the clip table from signalled clip indices.
  ///
  /// # Errors
  ///
  /// - Returns `FilterError` if a clip index or a coefficient is out of
  ///   range.
  pub fn from_indices(
    coeffs: [[i16; NUM_LUMA_COEFFS]; NUM_CLASSES],
    clip_indices: &[[u8; NUM_LUMA_COEFFS]; NUM_CLASSES], bit_depth: usize,
  ) -> Result<Self, FilterError> {
    let mut clips = [[0; NUM_LUMA_COEFFS]; NUM_CLASSES];
    for (class, (clip, indices)) in
      clips.iter_mut().zip(clip_indices).enumerate()
    {
      *clip = clips_from_indices(Some(class), indices, bit_depth)?;
    }
    let set = LumaFilterSet { coeffs, clips };
    set.validate()?;
    Ok(set)
  }

  /// Checks coefficient and clip ranges.
  ///
  /// # Errors
  ///
  /// - Returns `FilterError` naming the first offending class and tap.
  pub fn validate(&self) -> Result<(), FilterError> {
    for (class, (coeffs, clips)) in
      self.coeffs.iter().zip(&self.clips).enumerate()
    {
      check_taps(Some(class), coeffs, clips)?;
    }
    Ok(())
  }
}

/// The single chroma filter of one alternative.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChromaFilterSet {
  pub coeffs: [i16; NUM_CHROMA_COEFFS],
  pub clips: [i16; NUM_CHROMA_COEFFS],
}

impl ChromaFilterSet {
  pub const fn new(
    coeffs: [i16; NUM_CHROMA_COEFFS], clips: [i16; NUM_CHROMA_COEFFS],
  ) -> Self {
    ChromaFilterSet { coeffs, clips }
  }

  /// Builds the clip table from signalled clip indices.
  ///
  /// # Errors
  ///
  /// - Returns `FilterError` if a clip index or a coefficient is out of
  ///   range.
  pub fn from_indices(
    coeffs: [i16; NUM_CHROMA_COEFFS],
    clip_indices: &[u8; NUM_CHROMA_COEFFS], bit_depth: usize,
  ) -> Result<Self, FilterError> {
    let clips = clips_from_indices(None, clip_indices, bit_depth)?;
    let set = ChromaFilterSet { coeffs, clips };
    set.validate()?;
    Ok(set)
  }

  /// # Errors
  ///
  /// - Returns `FilterError` naming the first offending tap.
  pub fn validate(&self) -> Result<(), FilterError> {
    check_taps(None, &self.coeffs, &self.clips)
  }
}
