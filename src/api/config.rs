// Copyright (c) 2020-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.
#![deny(missing_docs)]

use crate::api::Context;
use crate::boundary::{BoundaryStrategy, EdgePadding};
use crate::layout::{PictureLayout, MAX_CTU_SIZE, MIN_CTU_SIZE};
use crate::util::{ChromaSampling, Pixel};

use log::warn;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

use std::marker::PhantomData;
use std::sync::Arc;

/// Default CTU size, in luma samples.
pub const DEFAULT_CTU_SIZE: usize = 128;
/// Default distance of the virtual boundary from the bottom of a CTU row.
pub const DEFAULT_VB_OFFSET: usize = 4;

/// Enumeration of possible invalid configuration errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum InvalidConfig {
  /// The width is invalid.
  #[error("invalid width {0} (expected >= 8, <= 65535, multiple of 8)")]
  InvalidWidth(usize),
  /// The height is invalid.
  #[error("invalid height {0} (expected >= 8, <= 65535, multiple of 8)")]
  InvalidHeight(usize),
  /// The bit depth is invalid.
  #[error("invalid bit depth {0} (expected >= 8, <= 12)")]
  InvalidBitDepth(usize),
  /// The CTU size is invalid.
  #[error("invalid CTU size {0} (expected power of 2, >= 16, <= 256)")]
  InvalidCtuSize(usize),
  /// The virtual boundary offset is invalid.
  #[error(
    "invalid virtual boundary offset {offset} (expected multiple of 4, <= {max})"
  )]
  InvalidVirtualBoundary {
    /// Actual value.
    offset: usize,
    /// Maximum allowed value.
    max: usize,
  },
  /// The tile boundaries are invalid.
  #[error("invalid tile layout")]
  InvalidTileLayout,
  /// The slices do not partition the picture.
  #[error("CTU ({x}, {y}) is not covered by exactly one slice")]
  InvalidSliceLayout {
    /// CTU column.
    x: usize,
    /// CTU row.
    y: usize,
  },
  /// The picture layout disagrees with the frame size or CTU size.
  #[error("picture layout does not match the configuration")]
  LayoutMismatch,
}

/// Settings which impact the filtered output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterConfig {
  /// Width of the frames in pixels.
  pub width: usize,
  /// Height of the frames in pixels.
  pub height: usize,
  /// Bit depth.
  pub bit_depth: usize,
  /// Chroma subsampling.
  pub chroma_sampling: ChromaSampling,
  /// CTU size in luma samples.
  pub ctu_size: usize,
  /// Luma rows between the virtual boundary and the bottom of each CTU
  /// row. 0 disables virtual boundaries.
  pub vb_offset: usize,
  /// Boundaries taking part in filtering.
  pub strategy: BoundaryStrategy,
  /// Substitution of taps crossing a slice or tile edge.
  pub edge_padding: EdgePadding,
  /// Honour the bypass masks of [`FrameParams`](crate::FrameParams).
  pub pcm_bypass: bool,
  /// Tiles and slices, a single tile and slice when `None`.
  pub layout: Option<PictureLayout>,
}

impl Default for FilterConfig {
  fn default() -> Self {
    FilterConfig {
      width: 640,
      height: 480,
      bit_depth: 8,
      chroma_sampling: ChromaSampling::Cs420,
      ctu_size: DEFAULT_CTU_SIZE,
      vb_offset: DEFAULT_VB_OFFSET,
      strategy: BoundaryStrategy::default(),
      edge_padding: EdgePadding::default(),
      pcm_bypass: false,
      layout: None,
    }
  }
}

impl FilterConfig {
  /// Virtual boundary offset, `None` when disabled.
  #[inline]
  pub const fn virtual_boundary(&self) -> Option<usize> {
    if self.vb_offset == 0 {
      None
    } else {
      Some(self.vb_offset)
    }
  }

  /// The configured layout, or a single tile and slice covering the frame.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidConfig` if the CTU size is invalid.
  pub fn picture_layout(&self) -> Result<PictureLayout, InvalidConfig> {
    match self.layout {
      Some(ref layout) => Ok(layout.clone()),
      None => PictureLayout::new(self.width, self.height, self.ctu_size),
    }
  }
}

/// Contains the filter configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
  /// Settings which impact the filtered output.
  pub(crate) filter: FilterConfig,
  /// The number of threads in the threadpool.
  pub(crate) threads: usize,
  /// Shared thread pool
  pub(crate) pool: Option<Arc<ThreadPool>>,
}

impl Config {
  /// Create a default configuration
  ///
  /// same as `Default::default()`
  pub fn new() -> Self {
    Config::default()
  }

  /// Set the filter configuration
  pub fn with_filter_config(mut self, filter: FilterConfig) -> Self {
    self.filter = filter;
    self
  }

  /// Set the frame dimensions in luma samples
  pub const fn with_dimensions(mut self, width: usize, height: usize) -> Self {
    self.filter.width = width;
    self.filter.height = height;
    self
  }

  /// Set the bit depth of the samples
  pub const fn with_bit_depth(mut self, bit_depth: usize) -> Self {
    self.filter.bit_depth = bit_depth;
    self
  }

  /// Set the chroma subsampling
  pub const fn with_chroma_sampling(
    mut self, chroma_sampling: ChromaSampling,
  ) -> Self {
    self.filter.chroma_sampling = chroma_sampling;
    self
  }

  /// Set the CTU size in luma samples
  pub const fn with_ctu_size(mut self, ctu_size: usize) -> Self {
    self.filter.ctu_size = ctu_size;
    self
  }

  /// Set the distance of the virtual boundary from the bottom of each
  /// CTU row, 0 to disable it
  pub const fn with_vb_offset(mut self, vb_offset: usize) -> Self {
    self.filter.vb_offset = vb_offset;
    self
  }

  /// Set which boundaries take part in filtering
  pub const fn with_strategy(mut self, strategy: BoundaryStrategy) -> Self {
    self.filter.strategy = strategy;
    self
  }

  /// Set the substitution of taps crossing a slice or tile edge
  pub const fn with_edge_padding(mut self, edge_padding: EdgePadding) -> Self {
    self.filter.edge_padding = edge_padding;
    self
  }

  /// Honour the bypass masks of [`FrameParams`](crate::FrameParams)
  ///
  /// Off by default.
  pub const fn with_pcm_bypass(mut self, pcm_bypass: bool) -> Self {
    self.filter.pcm_bypass = pcm_bypass;
    self
  }

  /// Set the tiles and slices of the picture
  pub fn with_layout(mut self, layout: PictureLayout) -> Self {
    self.filter.layout = Some(layout);
    self
  }

  /// Set the number of workers in the threadpool
  ///
  /// If it is left unset, the filter will use the default global
  /// threadpool provided by Rayon instead.
  pub const fn with_threads(mut self, threads: usize) -> Self {
    self.threads = threads;
    self
  }

  /// Use the provided threadpool
  ///
  /// It takes priority over `with_threads()`
  pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
    self.pool = Some(pool);
    self
  }

  /// The filter configuration.
  pub const fn filter_config(&self) -> &FilterConfig {
    &self.filter
  }

  /// Create a new threadpool with this configuration if set,
  /// or return `None` if global threadpool should be used instead.
  pub(crate) fn new_thread_pool(&self) -> Option<Arc<ThreadPool>> {
    if let Some(ref p) = self.pool {
      Some(p.clone())
    } else if self.threads != 0 {
      match ThreadPoolBuilder::new().num_threads(self.threads).build() {
        Ok(pool) => Some(Arc::new(pool)),
        Err(e) => {
          warn!("using the global thread pool: {e}");
          None
        }
      }
    } else {
      None
    }
  }

  /// Creates a [`Context`] with this configuration.
  ///
  /// # Errors
  ///
  /// Returns `InvalidConfig` if the config is invalid.
  ///
  /// # Panics
  ///
  /// - If `T` is narrower than the configured bit depth.
  ///
  /// # Examples
  ///
  /// ```
  /// use alf::prelude::*;
  ///
  /// # fn main() -> Result<(), InvalidConfig> {
  /// let cfg = Config::new().with_bit_depth(10);
  /// let ctx: Context<u16> = cfg.new_context()?;
  /// # Ok(())
  /// # }
  /// ```
  pub fn new_context<T: Pixel>(&self) -> Result<Context<T>, InvalidConfig> {
    assert!(
      8 * std::mem::size_of::<T>() >= self.filter.bit_depth,
      "The Pixel u{} does not match the Config bit_depth {}",
      8 * std::mem::size_of::<T>(),
      self.filter.bit_depth
    );

    self.validate()?;

    let config = self.filter.clone();
    let layout = config.picture_layout()?;
    let pool = self.new_thread_pool();

    Ok(Context { config, layout, pool, _pixel: PhantomData })
  }

  /// Validates the configuration.
  ///
  /// # Errors
  ///
  /// - Returns `InvalidConfig` naming the first invalid setting.
  pub fn validate(&self) -> Result<(), InvalidConfig> {
    use InvalidConfig::*;

    let config = &self.filter;

    let valid_size =
      |v: usize| (8..=u16::MAX as usize).contains(&v) && v % 8 == 0;
    if !valid_size(config.width) {
      return Err(InvalidWidth(config.width));
    }
    if !valid_size(config.height) {
      return Err(InvalidHeight(config.height));
    }
    if !(8..=12).contains(&config.bit_depth) {
      return Err(InvalidBitDepth(config.bit_depth));
    }
    if !config.ctu_size.is_power_of_two()
      || !(MIN_CTU_SIZE..=MAX_CTU_SIZE).contains(&config.ctu_size)
    {
      return Err(InvalidCtuSize(config.ctu_size));
    }
    let max = config.ctu_size / 2;
    if config.vb_offset % 4 != 0 || config.vb_offset > max {
      return Err(InvalidVirtualBoundary { offset: config.vb_offset, max });
    }
    if let Some(ref layout) = config.layout {
      if layout.dimensions() != (config.width, config.height)
        || layout.ctu_size() != config.ctu_size
      {
        return Err(LayoutMismatch);
      }
    }

    Ok(())
  }
}
