//! Latitude/longitude grids.

use std::f64::consts::{PI, TAU};

use glam::DVec3;

use crate::error::{MapError, Result};
use crate::geo::{MIN_LAT, MIN_LON, check_geo, direction_from_geo, geo_from_direction};
use crate::grid::{SurfaceGrid, snap};
use crate::surface::{Projection, SurfaceMap};
use crate::texel::Texel;

/// Linear latitude/longitude layout.
///
/// Column `0` is longitude `-π` and column `W-1` is `+π`; row `0` is latitude
/// `-π/2` and row `H-1` is `+π/2`. A one-pixel axis sits at its midpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeodeticProjection {
    width: usize,
    height: usize,
}

impl GeodeticProjection {
    /// Latitude/longitude of local pixel `(x, y)`.
    pub fn local_xy_to_geo(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !(0.0..=(self.width - 1) as f64).contains(&x) {
            return Err(MapError::out_of_range("pixel x", x));
        }
        if !(0.0..=(self.height - 1) as f64).contains(&y) {
            return Err(MapError::out_of_range("pixel y", y));
        }
        let lon = MIN_LON + axis_fraction(x, self.width) * TAU;
        let lat = MIN_LAT + axis_fraction(y, self.height) * PI;
        Ok((lat, lon))
    }
}

fn axis_fraction(v: f64, len: usize) -> f64 {
    if len == 1 { 0.5 } else { v / (len - 1) as f64 }
}

fn axis_position(fraction: f64, len: usize) -> f64 {
    snap(fraction * (len - 1) as f64)
}

impl Projection for GeodeticProjection {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn local_xy_to_direction(&self, x: f64, y: f64) -> Result<DVec3> {
        let (lat, lon) = self.local_xy_to_geo(x, y)?;
        direction_from_geo(lat, lon)
    }

    fn direction_to_local_xy(&self, dir: DVec3) -> Result<(f64, f64)> {
        let (lat, lon) = geo_from_direction(dir);
        self.geo_to_local_xy(lat, lon)
    }

    /// `(π/2, π)` maps to `(W-1, H-1)` and `(-π/2, -π)` to `(0, 0)` exactly.
    fn geo_to_local_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64)> {
        check_geo(lat, lon)?;
        let x = axis_position((lon - MIN_LON) / TAU, self.width);
        let y = axis_position((lat - MIN_LAT) / PI, self.height);
        Ok((x, y))
    }
}

/// A [`SurfaceGrid`] indexed directly by longitude (x) and latitude (y).
#[derive(Clone, Debug, PartialEq)]
pub struct GeodeticGrid<T> {
    grid: SurfaceGrid<T>,
    projection: GeodeticProjection,
}

impl<T: Texel> GeodeticGrid<T> {
    /// An empty (default-valued) grid.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::from_grid(SurfaceGrid::new(width, height)?)
    }

    /// Interpret existing cell data as a latitude/longitude grid.
    pub fn from_grid(grid: SurfaceGrid<T>) -> Result<Self> {
        let (width, height) = grid.dimensions();
        Ok(Self {
            grid,
            projection: GeodeticProjection { width, height },
        })
    }

    /// Build by sampling `source` at every pixel's direction.
    pub fn from_prototype<S>(width: usize, height: usize, source: &S) -> Result<Self>
    where
        S: SurfaceMap + Sync,
    {
        let mut map = Self::new(width, height)?;
        crate::resample::resample_into(&mut map, source)?;
        Ok(map)
    }

    /// Local pixel coordinates of a latitude/longitude pair.
    pub fn geo_to_local_xy(&self, lat: f64, lon: f64) -> Result<(f64, f64)> {
        self.projection.geo_to_local_xy(lat, lon)
    }

    /// Latitude/longitude of a local pixel coordinate.
    pub fn local_xy_to_geo(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        self.projection.local_xy_to_geo(x, y)
    }

    /// Give up the geometry and keep the cells.
    #[must_use]
    pub fn into_grid(self) -> SurfaceGrid<T> {
        self.grid
    }
}

impl<T: Texel> SurfaceMap for GeodeticGrid<T> {
    type Texel = T;
    type Projection = GeodeticProjection;

    fn grid(&self) -> &SurfaceGrid<T> {
        &self.grid
    }

    fn projection(&self) -> &GeodeticProjection {
        &self.projection
    }

    fn parts_mut(&mut self) -> (&GeodeticProjection, &mut SurfaceGrid<T>) {
        (&self.projection, &mut self.grid)
    }
}
