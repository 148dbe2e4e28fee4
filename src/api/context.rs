// Copyright (c) 2018-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.
#![deny(missing_docs)]

use crate::api::config::*;
use crate::api::util::*;
use crate::boundary::BoundaryModel;
use crate::classify::{classify, ClassMap};
use crate::filter::*;
use crate::frame::*;
use crate::layout::PictureLayout;
use crate::util::Pixel;

use log::{debug, trace, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

use std::marker::PhantomData;
use std::sync::Arc;

/// The filtering context.
///
/// Holds the validated configuration and the worker pool.
#[derive(Debug)]
pub struct Context<T: Pixel> {
  pub(crate) config: FilterConfig,
  pub(crate) layout: PictureLayout,
  pub(crate) pool: Option<Arc<ThreadPool>>,
  pub(crate) _pixel: PhantomData<T>,
}

impl<T: Pixel> Context<T> {
  /// Allocates and returns a new frame.
  ///
  /// # Examples
  ///
  /// ```
  /// use alf::prelude::*;
  ///
  /// # fn main() -> Result<(), InvalidConfig> {
  /// let cfg = Config::default();
  /// let ctx: Context<u8> = cfg.new_context()?;
  /// let frame = ctx.new_frame();
  /// # Ok(())
  /// # }
  /// ```
  #[inline]
  pub fn new_frame(&self) -> Frame<T> {
    Frame::new(
      self.config.width,
      self.config.height,
      self.config.chroma_sampling,
    )
  }

  /// Number of CTUs in a frame, the length of [`FrameParams::ctus`].
  #[inline]
  pub fn ctu_count(&self) -> usize {
    self.layout.ctu_count()
  }

  /// The CTU grid, tiles and slices of the frames.
  #[inline]
  pub const fn layout(&self) -> &PictureLayout {
    &self.layout
  }

  /// The configuration the context was created with.
  #[inline]
  pub const fn config(&self) -> &FilterConfig {
    &self.config
  }

  fn has_chroma(&self) -> bool {
    self.config.chroma_sampling.get_decimation().is_some()
  }

  /// Checks `src` and `params` against the configuration.
  fn check(
    &self, src: &Frame<T>, params: &FrameParams,
  ) -> Result<(), FilterError> {
    use FilterError::*;

    let planes = if self.has_chroma() { 3 } else { 1 };
    let reference = self.new_frame();
    for (pli, (p, r)) in
      src.planes.iter().zip(&reference.planes).enumerate().take(planes)
    {
      let found = (p.cfg.width, p.cfg.height);
      let expected = (r.cfg.width, r.cfg.height);
      let dec = |c: &PlaneConfig| (c.xdec, c.ydec);
      if found != expected || dec(&p.cfg) != dec(&r.cfg) {
        return Err(FrameSizeMismatch {
          plane: PlaneType::ALL[pli],
          expected,
          found,
        });
      }
    }

    if params.ctus.len() != self.ctu_count() {
      return Err(CtuCountMismatch {
        expected: self.ctu_count(),
        found: params.ctus.len(),
      });
    }
    params.validate()?;
    if !self.has_chroma() {
      if let Some(ctu) =
        params.ctus.iter().position(|c| c.chroma.iter().any(Option::is_some))
      {
        return Err(NoChromaPlanes { ctu });
      }
    }

    if self.config.pcm_bypass {
      for (pli, mask) in params.bypass.iter().enumerate().take(planes) {
        if let Some(mask) = mask {
          let (w, h) = mask.dimensions();
          let cfg = &src.planes[pli].cfg;
          if w < cfg.width || h < cfg.height {
            return Err(BypassMaskMismatch(PlaneType::ALL[pli]));
          }
        }
      }
    } else if params.bypass.iter().any(Option::is_some) {
      warn!("PCM bypass is disabled, ignoring bypass masks");
    }
    Ok(())
  }

  /// Filters `src` and returns the result.
  ///
  /// Every CTU is filtered with the filters it selects in `params`;
  /// unselected components of a CTU are copied unchanged.
  ///
  /// # Errors
  ///
  /// - Returns `FilterError` if `src` does not match the configured
  ///   geometry, or if `params` is invalid or does not cover the frame.
  ///
  /// # Examples
  ///
  /// ```
  /// use alf::prelude::*;
  ///
  /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
  /// let cfg = Config::new().with_dimensions(128, 64);
  /// let ctx: Context<u8> = cfg.new_context()?;
  /// let frame = ctx.new_frame();
  /// let luma = LumaFilterSet::uniform([0; 13], [0; 13]);
  /// let chroma = ChromaFilterSet::default();
  /// let params = FrameParams::uniform(ctx.ctu_count(), luma, chroma);
  /// let filtered = ctx.apply(&frame, &params)?;
  /// assert_eq!(filtered, frame);
  /// # Ok(())
  /// # }
  /// ```
  pub fn apply(
    &self, src: &Frame<T>, params: &FrameParams,
  ) -> Result<Frame<T>, FilterError> {
    self.check(src, params)?;

    debug!(
      "filtering {}x{} frame, {} CTUs, {} threads",
      src.width(),
      src.height(),
      self.ctu_count(),
      self.pool.as_ref().map_or_else(
        rayon::current_num_threads,
        |pool| pool.current_num_threads()
      )
    );

    let mut dst = src.clone();
    if let Some(ref pool) = self.pool {
      pool.install(|| self.filter_frame(src, &mut dst, params));
    } else {
      self.filter_frame(src, &mut dst, params);
    }
    Ok(dst)
  }

  fn filter_frame(
    &self, src: &Frame<T>, dst: &mut Frame<T>, params: &FrameParams,
  ) {
    let planes = if self.has_chroma() { 3 } else { 1 };
    for (pli, plane) in dst.planes.iter_mut().enumerate().take(planes) {
      let src = &src.planes[pli];
      let band = self.layout.ctu_size() >> src.cfg.ydec;
      let bypass =
        params.bypass[pli].as_ref().filter(|_| self.config.pcm_bypass);
      let plane_type = PlaneType::ALL[pli];
      stripes_mut(plane, band).for_each(|mut stripe| {
        let cy = stripe.rows().start / band;
        self.filter_ctu_row(src, &mut stripe, plane_type, cy, params, bypass);
      });
    }
  }

  fn filter_ctu_row(
    &self, src: &Plane<T>, dst: &mut PlaneStripeMut<'_, T>, plane: PlaneType,
    cy: usize, params: &FrameParams, bypass: Option<&BypassMask>,
  ) {
    let PlaneConfig { xdec, ydec, .. } = src.cfg;
    let range = SampleRange::new(self.config.bit_depth);
    let mut classes = ClassMap::new(Rect::default());

    for cx in 0..self.layout.cols() {
      let ctu = &params.ctus[cy * self.layout.cols() + cx];
      let selected = match plane {
        PlaneType::Y => ctu.luma,
        PlaneType::U => ctu.chroma[0],
        PlaneType::V => ctu.chroma[1],
      };
      let Some(index) = selected else {
        continue;
      };

      let desc = self
        .layout
        .boundary_descriptor(cx, cy, self.config.virtual_boundary())
        .decimated(xdec, ydec);
      let area = self.layout.ctu_rect(cx, cy).decimated(xdec, ydec);
      trace!("CTU ({cx}, {cy}) {plane:?} {area:?} filter {index} {desc:?}");

      let model = BoundaryModel::new(
        desc,
        self.config.strategy,
        self.config.edge_padding,
      );
      let unit = FilterUnit::new(plane, area, model);
      if plane.is_luma() {
        classify(src, &unit, self.config.bit_depth, &mut classes);
        filter_luma(
          src,
          dst,
          &unit,
          &classes,
          &params.luma_sets[index],
          range,
          bypass,
        );
      } else {
        let sets = &params.chroma_sets[plane.index() - 1];
        filter_chroma(src, dst, &unit, &sets[index], range, bypass);
      }
    }
  }
}
