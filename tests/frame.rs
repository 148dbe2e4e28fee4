use alf::prelude::*;
use quickcheck::quickcheck;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

fn fill<T: Pixel>(frame: &mut Frame<T>, mut value: impl FnMut() -> i32) {
  for plane in frame.planes.iter_mut() {
    let stride = plane.cfg.stride;
    let origin = plane.cfg.yorigin * stride + plane.cfg.xorigin;
    for y in 0..plane.cfg.height {
      let base = origin + y * stride;
      for v in &mut plane.data[base..base + plane.cfg.width] {
        *v = T::cast_from(value());
      }
    }
  }
}

fn random_params(
  ctu_count: usize, bit_depth: usize, seed: u64,
) -> FrameParams {
  let mut ra = ChaChaRng::seed_from_u64(seed);
  let mut luma = LumaFilterSet::default();
  for (coeffs, clips) in luma.coeffs.iter_mut().zip(luma.clips.iter_mut()) {
    for (c, l) in coeffs.iter_mut().zip(clips.iter_mut()) {
      *c = ra.gen_range(COEFF_MIN..=COEFF_MAX);
      *l = clip_value(bit_depth, ra.gen_range(0..NUM_CLIP_VALUES));
    }
  }
  let mut chroma = ChromaFilterSet::default();
  for (c, l) in chroma.coeffs.iter_mut().zip(chroma.clips.iter_mut()) {
    *c = ra.gen_range(COEFF_MIN..=COEFF_MAX);
    *l = clip_value(bit_depth, ra.gen_range(0..NUM_CLIP_VALUES));
  }
  FrameParams::uniform(ctu_count, luma, chroma)
}

fn tiled_context<T: Pixel>(bit_depth: usize, across: bool) -> Context<T> {
  let layout = PictureLayout::new(96, 64, 32)
    .unwrap()
    .with_uniform_tiles(2, 1)
    .unwrap()
    .with_filter_across_tiles(across);
  Config::new()
    .with_filter_config(FilterConfig {
      width: 96,
      height: 64,
      bit_depth,
      ctu_size: 32,
      layout: Some(layout),
      ..Default::default()
    })
    .new_context()
    .unwrap()
}

quickcheck! {
  fn flat_frames_stay_flat(value: u8, seed: u64, across: bool) -> bool {
    let ctx = tiled_context::<u8>(8, across);
    let mut src = ctx.new_frame();
    fill(&mut src, || value as i32);
    let params = random_params(ctx.ctu_count(), 8, seed);
    ctx.apply(&src, &params).unwrap() == src
  }

  fn zero_clips_are_identity(seed: u64) -> bool {
    let ctx = tiled_context::<u16>(10, true);
    let mut ra = ChaChaRng::seed_from_u64(seed);
    let mut src = ctx.new_frame();
    fill(&mut src, || ra.gen_range(0..1024));
    let mut params = random_params(ctx.ctu_count(), 10, seed);
    for clips in params.luma_sets[0].clips.iter_mut() {
      clips.fill(0);
    }
    for sets in params.chroma_sets.iter_mut() {
      sets[0].clips.fill(0);
    }
    ctx.apply(&src, &params).unwrap() == src
  }
}

#[test]
fn output_stays_in_range() {
  for strategy in [BoundaryStrategy::VirtualOnly, BoundaryStrategy::EdgeAware]
  {
    for edge_padding in [EdgePadding::Repeat, EdgePadding::Mirror] {
      let ctx: Context<u16> = Config::new()
        .with_filter_config(FilterConfig {
          width: 64,
          height: 64,
          bit_depth: 10,
          ctu_size: 32,
          strategy,
          edge_padding,
          ..Default::default()
        })
        .new_context()
        .unwrap();
      let mut ra = ChaChaRng::from_seed([7; 32]);
      let mut src = ctx.new_frame();
      fill(&mut src, || if ra.gen() { 1023 } else { 0 });
      let params = FrameParams::uniform(
        ctx.ctu_count(),
        LumaFilterSet::uniform([COEFF_MAX; 13], [1024; 13]),
        ChromaFilterSet::new([COEFF_MIN; 7], [1024; 7]),
      );
      let out = ctx.apply(&src, &params).unwrap();
      assert_ne!(out, src);
      for plane in &out.planes {
        assert!(plane.data.iter().all(|&v| v <= 1023));
      }
    }
  }
}

#[test]
fn every_chroma_sampling_is_filtered() {
  use ChromaSampling::*;
  for cs in [Cs420, Cs422, Cs444] {
    let ctx: Context<u8> = Config::new()
      .with_dimensions(80, 48)
      .with_chroma_sampling(cs)
      .new_context()
      .unwrap();
    let mut ra = ChaChaRng::from_seed([9; 32]);
    let mut src = ctx.new_frame();
    fill(&mut src, || ra.gen_range(0..256));
    let params = random_params(ctx.ctu_count(), 8, 11);
    let out = ctx.apply(&src, &params).unwrap();
    for pli in 0..3 {
      assert_ne!(out.planes[pli], src.planes[pli], "{cs:?} plane {pli}");
    }
  }
}

#[test]
fn frames_can_be_filtered_repeatedly() {
  let ctx = tiled_context::<u8>(8, false);
  let mut ra = ChaChaRng::from_seed([3; 32]);
  let mut src = ctx.new_frame();
  fill(&mut src, || ra.gen_range(0..256));
  let params = random_params(ctx.ctu_count(), 8, 5);
  let first = ctx.apply(&src, &params).unwrap();
  assert_eq!(ctx.apply(&src, &params).unwrap(), first);
  let second = ctx.apply(&first, &params).unwrap();
  assert_eq!(second.width(), 96);
  assert_eq!(second.height(), 64);
}
