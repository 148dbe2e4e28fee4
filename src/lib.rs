// Copyright (c) 2019-2024, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Adaptive loop filter for block-based video codecs.
//!
//! The crate implements the reconstruction side of the filter: every
//! 4x4 luma block is classified by the strength and direction of its local
//! gradients, then luma samples are filtered with a 7x7 diamond whose
//! coefficients are picked by that class, and chroma samples with a single
//! 5x5 diamond. Sample fetches that would cross a virtual boundary or a
//! slice/tile edge are substituted by one shared [`BoundaryModel`].
//!
//! Most users only need [`Config`] and [`Context`]:
//!
//! ```
//! use alf::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = Config::new().with_dimensions(64, 64);
//! let ctx: Context<u8> = cfg.new_context()?;
//! let frame = ctx.new_frame();
//! let params = FrameParams::disabled(ctx.ctu_count());
//! let filtered = ctx.apply(&frame, &params)?;
//! assert_eq!(filtered, frame);
//! # Ok(())
//! # }
//! ```
//!
//! [`BoundaryModel`]: boundary::BoundaryModel

#![deny(bare_trait_objects)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_ptr_alignment)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]
#![warn(clippy::expl_impl_clone_on_copy)]
#![warn(clippy::linkedlist)]
#![warn(clippy::map_flatten)]
#![warn(clippy::mem_forget)]
#![warn(clippy::mut_mut)]
#![warn(clippy::nonminimal_bool)]
#![warn(clippy::path_buf_push_overwrite)]
#![warn(clippy::range_plus_one)]
#![warn(clippy::unused_self)]

pub mod boundary;
pub mod classify;
pub mod filter;
pub mod frame;
pub mod layout;
pub mod params;
pub mod util;

mod api;

pub use crate::api::*;

/// Commonly used types and traits.
pub mod prelude {
  pub use crate::api::*;
  pub use crate::boundary::*;
  pub use crate::frame::{Frame, Plane, PlaneType, Rect};
  pub use crate::layout::*;
  pub use crate::params::*;
  pub use crate::util::{CastFromPrimitive, ChromaSampling, Pixel};
}
