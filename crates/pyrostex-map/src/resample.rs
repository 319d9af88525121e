//! Building one representation by sampling another.
//!
//! Every destination pixel is independent: its direction comes from the
//! destination's projection, its value from the source. Rows are written in
//! parallel with rayon.

use std::time::Instant;

use glam::{DVec2, DVec3};
use rayon::prelude::*;
use tracing::info;

use crate::cube_atlas::CubeAtlas;
use crate::cube_face::CubeFace;
use crate::error::Result;
use crate::geodetic::GeodeticGrid;
use crate::region_tile::RegionTile;
use crate::surface::{Projection, SurfaceMap};
use crate::texel::Texel;

/// Overwrite every pixel of `dest` with `f(direction, current)`.
///
/// `direction` is the unit direction through the pixel and `current` the
/// value stored there before the call. On error some rows may already have
/// been written.
pub fn update_from_fn<D, F>(dest: &mut D, f: F) -> Result<()>
where
    D: SurfaceMap,
    F: Fn(DVec3, f64) -> Result<f64> + Sync,
{
    let (projection, grid) = dest.parts_mut();
    let width = grid.width();
    grid.as_mut_slice()
        .par_chunks_mut(width)
        .enumerate()
        .try_for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let dir = projection
                    .local_xy_to_direction(x as f64, y as f64)?
                    .normalize();
                *cell = D::Texel::from_f64(f(dir, cell.to_f64())?);
            }
            Ok(())
        })
}

/// Overwrite every pixel of `dest` with `f(direction)`.
pub fn fill_from_fn<D, F>(dest: &mut D, f: F) -> Result<()>
where
    D: SurfaceMap,
    F: Fn(DVec3) -> Result<f64> + Sync,
{
    update_from_fn(dest, |dir, _| f(dir))
}

/// Overwrite every pixel of `dest` with `src` sampled at the pixel's
/// direction, cast to the destination's storage type.
pub fn resample_into<D, S>(dest: &mut D, src: &S) -> Result<()>
where
    D: SurfaceMap,
    S: SurfaceMap + Sync,
{
    let start = Instant::now();
    fill_from_fn(dest, |dir| Ok(src.sample_by_direction(dir)?.value.to_f64()))?;
    let (width, height) = dest.dimensions();
    info!(
        width,
        height,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "resampling pass finished"
    );
    Ok(())
}

/// Builds new representations from one source map.
///
/// Only borrows the source, so it is `Copy` whatever the source type is.
#[derive(Debug)]
pub struct Resampler<'a, S> {
    source: &'a S,
}

impl<S> Clone for Resampler<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Resampler<'_, S> {}

impl<'a, S: SurfaceMap + Sync> Resampler<'a, S> {
    /// Resampler reading from `source`.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// A new `width × height` latitude/longitude grid.
    pub fn to_geodetic<T: Texel>(self, width: usize, height: usize) -> Result<GeodeticGrid<T>> {
        GeodeticGrid::from_prototype(width, height, self.source)
    }

    /// A new `width × height` cube atlas; the shape rules of
    /// [`CubeAtlas::new`] apply.
    pub fn to_cube_atlas<T: Texel>(self, width: usize, height: usize) -> Result<CubeAtlas<T>> {
        CubeAtlas::from_prototype(width, height, self.source)
    }

    /// A new `width × height` tile over `[lo, hi]` of `face`.
    pub fn to_region_tile<T: Texel>(
        self,
        face: CubeFace,
        lo: DVec2,
        hi: DVec2,
        width: usize,
        height: usize,
    ) -> Result<RegionTile<T>> {
        RegionTile::from_prototype(face, lo, hi, width, height, self.source)
    }

    /// Resample into an existing destination.
    pub fn into_map<D: SurfaceMap>(self, dest: &mut D) -> Result<()> {
        resample_into(dest, self.source)
    }
}
