// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use super::*;
use crate::classify::{ClassEntry, ClassMap, CLASS_BLOCK_SIZE};
use crate::params::{LumaFilterSet, NUM_LUMA_COEFFS};

/// Tap pairs of the 7x7 diamond, in coefficient order.
pub(crate) const LUMA_OFFSETS: [(isize, isize); NUM_LUMA_COEFFS - 1] = [
  (3, 0),
  (2, 1),
  (2, 0),
  (2, -1),
  (1, 2),
  (1, 1),
  (1, 0),
  (1, -1),
  (1, -2),
  (0, 3),
  (0, 2),
  (0, 1),
];

/// Coefficient used at each tap for every transpose index.
///
/// 1 swaps rows and columns, 2 mirrors horizontally and 3 rotates by a
/// quarter turn.
pub const LUMA_TRANSPOSE: [[usize; NUM_LUMA_COEFFS]; 4] = [
  [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
  [9, 4, 10, 8, 1, 5, 11, 7, 3, 0, 2, 6, 12],
  [0, 3, 2, 1, 8, 7, 6, 5, 4, 9, 10, 11, 12],
  [9, 8, 10, 4, 3, 7, 11, 5, 1, 0, 2, 6, 12],
];

/// Coefficients and clipping bounds of `entry`, reordered for its
/// transpose index.
///
/// # Panics
///
/// - If `entry` is not a valid class.
#[inline]
pub fn transposed_taps(
  filters: &LumaFilterSet, entry: ClassEntry,
) -> ([i16; NUM_LUMA_COEFFS], [i16; NUM_LUMA_COEFFS]) {
  assert!(entry.is_valid(), "corrupted class map entry {entry:?}");
  let class = entry.class_idx as usize;
  let order = &LUMA_TRANSPOSE[entry.transpose_idx as usize];
  let coeffs = order.map(|k| filters.coeffs[class][k]);
  let clips = order.map(|k| filters.clips[class][k]);
  (coeffs, clips)
}

/// Filters the luma samples of `unit` into `dst`.
///
/// Each 4x4 block uses the filter of its class in `classes`, reordered
/// for its transpose index. Samples flagged in `bypass` are copied
/// unfiltered.
///
/// # Panics
///
/// - If the unit is not a luma unit.
/// - If the unit area is not a multiple of 8 columns by 4 rows, or does
///   not fit the plane or `dst`.
/// - If `classes` does not cover the area or holds an invalid entry.
pub fn filter_luma<T: Pixel>(
  src: &Plane<T>, dst: &mut PlaneStripeMut<'_, T>, unit: &FilterUnit,
  classes: &ClassMap, filters: &LumaFilterSet, range: SampleRange,
  bypass: Option<&BypassMask>,
) {
  assert!(
    unit.plane.is_luma(),
    "luma kernel invoked on a {:?} unit",
    unit.plane
  );
  check_unit(src, dst, unit, LUMA_STEP_X, bypass);

  filter_unit(
    src,
    dst,
    unit,
    &LUMA_OFFSETS,
    CLASS_BLOCK_SIZE,
    range,
    bypass,
    |x, y| transposed_taps(filters, classes.get(x, y)),
  );
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::boundary::*;
  use crate::classify::classify;
  use interpolate_name::interpolate_test;
  use pretty_assertions::assert_eq;
  use rand::{Rng, SeedableRng};
  use rand_chacha::ChaChaRng;

  const COEFFS: [i16; 13] = [-3, 5, 11, -7, 2, 17, 23, 9, -1, 4, -6, 30, 0];

  fn plane_from_fn(
    w: usize, h: usize, f: impl Fn(usize, usize) -> u16,
  ) -> Plane<u16> {
    let mut plane = Plane::new(w, h, 0, 0, 8, 8);
    let stride = plane.cfg.stride;
    let origin = plane.cfg.yorigin * stride + plane.cfg.xorigin;
    for y in 0..h {
      for x in 0..w {
        plane.data[origin + y * stride + x] = f(x, y);
      }
    }
    plane
  }

  fn random_plane(
    w: usize, h: usize, bit_depth: usize, seed: u8,
  ) -> Plane<u16> {
    let mut ra = ChaChaRng::from_seed([seed; 32]);
    let samples: Vec<u16> =
      (0..w * h).map(|_| ra.gen_range(0..1u16 << bit_depth)).collect();
    plane_from_fn(w, h, |x, y| samples[y * w + x])
  }

  fn run(
    src: &Plane<u16>, area: Rect, model: BoundaryModel, classes: &ClassMap,
    filters: &LumaFilterSet, bit_depth: usize, bypass: Option<&BypassMask>,
  ) -> Plane<u16> {
    let mut out = src.clone();
    let unit = FilterUnit::new(PlaneType::Y, area, model);
    filter_luma(
      src,
      &mut PlaneStripeMut::new(&mut out),
      &unit,
      classes,
      filters,
      SampleRange::new(bit_depth),
      bypass,
    );
    out
  }

  fn uniform_map(area: Rect, transpose_idx: u8) -> ClassMap {
    let mut map = ClassMap::new(area);
    map.fill(ClassEntry::new(0, transpose_idx));
    map
  }

  /// Unclipped FIR with plain picture clamping.
  fn linear_reference(
    src: &Plane<u16>, x: usize, y: usize, coeffs: &[i16; 13], max: i32,
  ) -> i32 {
    let (x, y) = (x as isize, y as isize);
    let cur = src.sample(x, y);
    let mut sum = 64;
    for (k, &(dy, dx)) in LUMA_OFFSETS.iter().enumerate() {
      let a = src.sample(x + dx, y + dy);
      let b = src.sample(x - dx, y - dy);
      sum += coeffs[k] as i32 * (a - cur + b - cur);
    }
    (cur + (sum >> 7)).clamp(0, max)
  }

  #[interpolate_test(8, 8)]
  #[interpolate_test(10, 10)]
  fn flat_plane_is_invariant(bit_depth: usize) {
    let mid = 1 << (bit_depth - 1);
    let src = plane_from_fn(32, 32, |_, _| mid);
    let area = Rect::new(0, 0, 32, 32);
    let model = BoundaryModel::unbounded();
    let mut classes = ClassMap::default();
    let unit = FilterUnit::new(PlaneType::Y, area, model);
    classify(&src, &unit, bit_depth, &mut classes);
    let filters = LumaFilterSet::uniform(COEFFS, [1 << bit_depth; 13]);
    let out = run(&src, area, model, &classes, &filters, bit_depth, None);
    assert_eq!(out, src);
  }

  #[test]
  fn zero_clip_cancels_taps() {
    let src = random_plane(32, 32, 8, 1);
    let area = Rect::new(0, 0, 32, 32);
    let filters = LumaFilterSet::uniform(COEFFS, [0; 13]);
    let out = run(
      &src,
      area,
      BoundaryModel::unbounded(),
      &uniform_map(area, 0),
      &filters,
      8,
      None,
    );
    assert_eq!(out, src);
  }

  #[test]
  fn large_clip_is_linear() {
    let src = random_plane(32, 32, 10, 2);
    let area = Rect::new(0, 0, 32, 32);
    let filters = LumaFilterSet::uniform(COEFFS, [1024; 13]);
    let out = run(
      &src,
      area,
      BoundaryModel::unbounded(),
      &uniform_map(area, 0),
      &filters,
      10,
      None,
    );
    for y in 0..32 {
      for x in 0..32 {
        assert_eq!(
          out.sample(x as isize, y as isize),
          linear_reference(&src, x, y, &COEFFS, 1023),
          "at ({x}, {y})"
        );
      }
    }
  }

  #[test]
  fn output_stays_in_range() {
    let alternating: [i16; 13] =
      std::array::from_fn(|k| if k % 2 == 0 { -128 } else { 127 });
    for (seed, coeffs) in [[127; 13], alternating].iter().enumerate() {
      let src = random_plane(32, 32, 10, seed as u8);
      let area = Rect::new(0, 0, 32, 32);
      let filters = LumaFilterSet::uniform(*coeffs, [1024; 13]);
      for t in 0..4 {
        let out = run(
          &src,
          area,
          BoundaryModel::unbounded(),
          &uniform_map(area, t),
          &filters,
          10,
          None,
        );
        for y in 0..32 {
          for x in 0..32 {
            assert!((0..=1023).contains(&out.sample(x, y)));
          }
        }
      }
    }
  }

  #[test]
  fn transpose_matches_transformed_input() {
    const N: usize = 32;
    let src = random_plane(N, N, 8, 3);
    let area = Rect::new(0, 0, N, N);
    let clips = [32, 8, 256, 2, 32, 256, 8, 32, 2, 256, 8, 32, 0];
    let filters = LumaFilterSet::uniform(COEFFS, clips);
    let model = BoundaryModel::unbounded();
    let identity = uniform_map(area, 0);

    // maps a position of the source onto the transformed image
    let transforms: [fn(usize, usize) -> (usize, usize); 4] = [
      |x, y| (x, y),
      |x, y| (y, x),
      |x, y| (N - 1 - x, y),
      |x, y| (N - 1 - y, x),
    ];
    for (t, map_pos) in transforms.iter().enumerate() {
      let mut moved = src.clone();
      let stride = moved.cfg.stride;
      let origin = moved.cfg.yorigin * stride + moved.cfg.xorigin;
      for y in 0..N {
        for x in 0..N {
          let (mx, my) = map_pos(x, y);
          moved.data[origin + my * stride + mx] =
            src.sample(x as isize, y as isize) as u16;
        }
      }

      let classes = uniform_map(area, t as u8);
      let direct = run(&src, area, model, &classes, &filters, 8, None);
      let reference = run(&moved, area, model, &identity, &filters, 8, None);
      for y in 8..24 {
        for x in 8..24 {
          let (mx, my) = map_pos(x, y);
          assert_eq!(
            direct.sample(x as isize, y as isize),
            reference.sample(mx as isize, my as isize),
            "transpose {t} at ({x}, {y})"
          );
        }
      }
    }
  }

  #[test]
  fn virtual_boundary_mirrors_taps() {
    let src = random_plane(32, 32, 8, 4);
    let area = Rect::new(0, 0, 32, 32);
    let filters = LumaFilterSet::uniform(COEFFS, [255; 13]);
    let classes = uniform_map(area, 0);
    let vb = VirtualBoundary::new(16, 12);
    let model = BoundaryModel::new(
      BoundaryDescriptor::new(Some(vb), Edges::NONE),
      BoundaryStrategy::VirtualOnly,
      EdgePadding::Repeat,
    );
    let out = run(&src, area, model, &classes, &filters, 8, None);

    // explicit mirrored buffer: rows past the boundary are replaced by the
    // row at the same distance on the near side, on both sides of the tap
    for y in 8..16isize {
      let limit = if y < 12 { 11 - y } else { y - 12 };
      for x in 4..28isize {
        let cur = src.sample(x, y);
        let mut sum = 64;
        for (k, &(dy, dx)) in LUMA_OFFSETS.iter().enumerate() {
          let dy = dy.min(limit);
          let a = src.sample(x + dx, y + dy);
          let b = src.sample(x - dx, y - dy);
          sum += COEFFS[k] as i32 * (a - cur + b - cur);
        }
        let expected = (cur + (sum >> 7)).clamp(0, 255);
        assert_eq!(out.sample(x, y), expected, "at ({x}, {y})");
      }
    }

    // rows well away from the boundary are unaffected
    let free = run(
      &src,
      area,
      BoundaryModel::unbounded(),
      &classes,
      &filters,
      8,
      None,
    );
    for x in 0..32 {
      assert_eq!(out.sample(x, 4), free.sample(x, 4));
      assert_eq!(out.sample(x, 20), free.sample(x, 20));
    }
  }

  #[test]
  fn boundary_model_is_inert_in_the_interior() {
    let src = random_plane(64, 64, 10, 5);
    let filters = LumaFilterSet::uniform(COEFFS, [64; 13]);
    let area = Rect::new(16, 16, 32, 32);
    let classes = uniform_map(area, 2);
    let bounded = BoundaryModel::new(
      BoundaryDescriptor::new(
        Some(VirtualBoundary::new(64, 60)),
        Edges {
          top: Some(8),
          bottom: Some(56),
          left: Some(8),
          right: Some(56),
        },
      ),
      BoundaryStrategy::EdgeAware,
      EdgePadding::Mirror,
    );
    let a = run(&src, area, bounded, &classes, &filters, 10, None);
    let free = BoundaryModel::unbounded();
    let b = run(&src, area, free, &classes, &filters, 10, None);
    assert_eq!(a, b);
  }

  #[test]
  fn bypassed_samples_are_copied() {
    let src = random_plane(16, 16, 8, 6);
    let area = Rect::new(0, 0, 16, 16);
    let filters = LumaFilterSet::uniform(COEFFS, [255; 13]);
    let mut mask = BypassMask::for_plane(&src);
    mask.mark(Rect::new(4, 4, 4, 2));
    let classes = uniform_map(area, 0);
    let model = BoundaryModel::unbounded();
    let out = run(&src, area, model, &classes, &filters, 8, Some(&mask));
    let free = run(&src, area, model, &classes, &filters, 8, None);
    for y in 0..16 {
      for x in 0..16 {
        let expected = if (4..8).contains(&x) && (4..6).contains(&y) {
          src.sample(x, y)
        } else {
          free.sample(x, y)
        };
        assert_eq!(out.sample(x, y), expected);
      }
    }
  }

  #[test]
  fn only_the_unit_area_is_written() {
    let src = random_plane(32, 32, 8, 7);
    let area = Rect::new(8, 4, 16, 8);
    let filters = LumaFilterSet::uniform(COEFFS, [255; 13]);
    let out = run(
      &src,
      area,
      BoundaryModel::unbounded(),
      &uniform_map(area, 1),
      &filters,
      8,
      None,
    );
    for y in 0..32 {
      for x in 0..32 {
        if !(8..24).contains(&x) || !(4..12).contains(&y) {
          assert_eq!(out.sample(x, y), src.sample(x, y));
        }
      }
    }
  }

  #[test]
  #[should_panic]
  fn chroma_unit_is_rejected() {
    let src = random_plane(16, 16, 8, 0);
    let mut dst = src.clone();
    let area = Rect::new(0, 0, 16, 16);
    let unit = FilterUnit::new(PlaneType::U, area, BoundaryModel::unbounded());
    filter_luma(
      &src,
      &mut PlaneStripeMut::new(&mut dst),
      &unit,
      &uniform_map(area, 0),
      &LumaFilterSet::default(),
      SampleRange::new(8),
      None,
    );
  }

  #[test]
  #[should_panic]
  fn misaligned_unit_is_rejected() {
    let src = random_plane(16, 16, 8, 0);
    let area = Rect::new(0, 0, 12, 16);
    run(
      &src,
      area,
      BoundaryModel::unbounded(),
      &uniform_map(area, 0),
      &LumaFilterSet::default(),
      8,
      None,
    );
  }

  #[test]
  #[should_panic]
  fn unset_class_is_rejected() {
    let src = random_plane(16, 16, 8, 0);
    let area = Rect::new(0, 0, 16, 16);
    run(
      &src,
      area,
      BoundaryModel::unbounded(),
      &ClassMap::new(area),
      &LumaFilterSet::default(),
      8,
      None,
    );
  }
}
