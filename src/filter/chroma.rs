// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use super::*;
use crate::params::{ChromaFilterSet, NUM_CHROMA_COEFFS};

/// Tap pairs of the 5x5 diamond, in coefficient order.
pub(crate) const CHROMA_OFFSETS: [(isize, isize); NUM_CHROMA_COEFFS - 1] =
  [(2, 0), (1, 1), (1, 0), (1, -1), (0, 2), (0, 1)];

/// Filters the chroma samples of `unit` into `dst` with a single filter.
///
/// # Panics
///
/// - If the unit is not a chroma unit.
/// - If the unit area is not a multiple of 4 columns by 4 rows, starts off
///   an 8 column boundary, or does not fit the plane or `dst`.
pub fn filter_chroma<T: Pixel>(
  src: &Plane<T>, dst: &mut PlaneStripeMut<'_, T>, unit: &FilterUnit,
  filter: &ChromaFilterSet, range: SampleRange, bypass: Option<&BypassMask>,
) {
  assert!(
    unit.plane.is_chroma(),
    "chroma kernel invoked on a {:?} unit",
    unit.plane
  );
  check_unit(src, dst, unit, CHROMA_STEP_X, bypass);

  filter_unit(
    src,
    dst,
    unit,
    &CHROMA_OFFSETS,
    CHROMA_STEP_X,
    range,
    bypass,
    |_, _| (filter.coeffs, filter.clips),
  );
}
