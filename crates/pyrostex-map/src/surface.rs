//! The query surface shared by every map representation.

use glam::DVec3;

use crate::error::Result;
use crate::geo::{check_direction, direction_from_geo};
use crate::grid::SurfaceGrid;
use crate::texel::Texel;

/// A value read from a map together with the direction that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampledValue<T> {
    /// Interpolated value, cast to the grid's storage type.
    pub value: T,
    /// Unit direction of the sampled point.
    pub direction: DVec3,
}

/// Geometry of a representation: how its pixel grid lies on the sphere.
///
/// Implementations hold no cell data, so a projection can be shared with
/// worker threads while the grid it describes is being written.
pub trait Projection: Sync {
    /// `(width, height)` of the pixel grid this projection describes.
    fn dimensions(&self) -> (usize, usize);

    /// Direction (not necessarily unit length) through local pixel `(x, y)`.
    fn local_xy_to_direction(&self, x: f64, y: f64) -> Result<DVec3>;

    /// Local pixel coordinates of the point `dir` points at.
    fn direction_to_local_xy(&self, dir: DVec3) -> Result<(f64, f64)>;

    /// Local pixel coordinates of a latitude/longitude pair.
    fn geo_to_local_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64)> {
        self.direction_to_local_xy(direction_from_geo(lat, lon)?)
    }
}

/// A sampled surface: a [`SurfaceGrid`] plus the [`Projection`] that places
/// it on the sphere.
///
/// The three `sample_by_*` entry points all end in the grid's bilinear
/// sampling, so a value means the same thing whichever coordinate system it
/// was requested in.
pub trait SurfaceMap {
    /// Storage type of the grid.
    type Texel: Texel;
    /// Geometry type.
    type Projection: Projection;

    /// The cell data.
    fn grid(&self) -> &SurfaceGrid<Self::Texel>;

    /// The geometry.
    fn projection(&self) -> &Self::Projection;

    /// Geometry and cell data at once, for writers that need both.
    fn parts_mut(&mut self) -> (&Self::Projection, &mut SurfaceGrid<Self::Texel>);

    /// Mutable cell data. Values are written by index only.
    fn grid_mut(&mut self) -> &mut SurfaceGrid<Self::Texel> {
        self.parts_mut().1
    }

    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (usize, usize) {
        self.grid().dimensions()
    }

    /// Sample at fractional local pixel coordinates.
    fn sample_by_local_xy(&self, x: f64, y: f64) -> Result<SampledValue<Self::Texel>> {
        let value = self.grid().bilinear(x, y)?;
        let direction = self.projection().local_xy_to_direction(x, y)?.normalize();
        Ok(SampledValue {
            value: Self::Texel::from_f64(value),
            direction,
        })
    }

    /// Sample the point a direction points at.
    fn sample_by_direction(&self, dir: DVec3) -> Result<SampledValue<Self::Texel>> {
        check_direction(dir)?;
        let (x, y) = self.projection().direction_to_local_xy(dir)?;
        let value = self.grid().bilinear(x, y)?;
        Ok(SampledValue {
            value: Self::Texel::from_f64(value),
            direction: dir.normalize(),
        })
    }

    /// Sample at a latitude/longitude pair.
    fn sample_by_geo(&self, lat: f64, lon: f64) -> Result<SampledValue<Self::Texel>> {
        let (x, y) = self.projection().geo_to_local_xy(lat, lon)?;
        let value = self.grid().bilinear(x, y)?;
        Ok(SampledValue {
            value: Self::Texel::from_f64(value),
            direction: direction_from_geo(lat, lon)?,
        })
    }
}
