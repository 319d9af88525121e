//! Sub-rectangles of a single cube face.

use glam::{DVec2, DVec3};
use tracing::debug;

use crate::cube_atlas::EMBED_MAGNITUDE_BOUND;
use crate::cube_face::CubeFace;
use crate::error::{MapError, Result};
use crate::grid::{SurfaceGrid, snap};
use crate::surface::{Projection, SurfaceMap};
use crate::texel::Texel;
use crate::tile_tree::{TileId, TileKey};

/// Slack when testing whether a re-projected point lies on the tile, so a
/// direction built from the tile's own edge pixel is not rejected.
const EDGE_TOLERANCE: f64 = 1e-12;

/// Order the components of two corners, then check them against the face.
fn ordered_corners(
    p1: DVec2,
    p2: DVec2,
    invalid: fn(String) -> MapError,
) -> Result<(DVec2, DVec2)> {
    if !p1.is_finite() || !p2.is_finite() {
        return Err(invalid(format!("corners {p1} and {p2} must be finite")));
    }
    let lo = p1.min(p2);
    let hi = p1.max(p2);
    if lo.cmplt(DVec2::NEG_ONE).any() || hi.cmpgt(DVec2::ONE).any() {
        return Err(invalid(format!(
            "corners {lo} and {hi} leave the face square [-1, 1]²"
        )));
    }
    if lo.x == hi.x || lo.y == hi.y {
        return Err(invalid(format!("corners {lo} and {hi} span no area")));
    }
    Ok((lo, hi))
}

/// Geometry of a tile: pixel `(i, j)` sits at relative position
/// `(i / W, j / H)` inside the face-local rectangle `[lo, hi]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileProjection {
    width: usize,
    height: usize,
    face: CubeFace,
    lo: DVec2,
    hi: DVec2,
}

impl TileProjection {
    /// Validate the tile rectangle. Corners may be given in any order.
    pub fn new(face: CubeFace, p1: DVec2, p2: DVec2, width: usize, height: usize) -> Result<Self> {
        let (lo, hi) = ordered_corners(p1, p2, MapError::InvalidGeometry)?;
        if width == 0 || height == 0 {
            return Err(MapError::InvalidGeometry(format!(
                "tile dimensions must be at least 1x1, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            face,
            lo,
            hi,
        })
    }

    /// Face-local `(a, b)` of fractional pixel `(x, y)`.
    pub fn local_xy_to_face(&self, x: f64, y: f64) -> Result<DVec2> {
        if !(0.0..=(self.width - 1) as f64).contains(&x) {
            return Err(MapError::out_of_range("pixel x", x));
        }
        if !(0.0..=(self.height - 1) as f64).contains(&y) {
            return Err(MapError::out_of_range("pixel y", y));
        }
        let rel = DVec2::new(x / self.width as f64, y / self.height as f64);
        Ok(self.lo + rel * (self.hi - self.lo))
    }

    /// Fractional pixel of face-local `(a, b)`; fails off the tile.
    pub fn face_to_local_xy(&self, ab: DVec2) -> Result<(f64, f64)> {
        let lo = self.lo - EDGE_TOLERANCE;
        let hi = self.hi + EDGE_TOLERANCE;
        if !(lo.x..=hi.x).contains(&ab.x) {
            return Err(MapError::out_of_range("face-local a", ab.x));
        }
        if !(lo.y..=hi.y).contains(&ab.y) {
            return Err(MapError::out_of_range("face-local b", ab.y));
        }
        let rel = (ab - self.lo) / (self.hi - self.lo);
        let x = snap(rel.x * self.width as f64).clamp(0.0, (self.width - 1) as f64);
        let y = snap(rel.y * self.height as f64).clamp(0.0, (self.height - 1) as f64);
        Ok((x, y))
    }
}

impl Projection for TileProjection {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn local_xy_to_direction(&self, x: f64, y: f64) -> Result<DVec3> {
        let ab = self.local_xy_to_face(x, y)?;
        let dir = self.face.embed(ab.x, ab.y);
        let length = dir.length();
        if length >= EMBED_MAGNITUDE_BOUND {
            return Err(MapError::out_of_range("embedded length", length));
        }
        Ok(dir)
    }

    fn direction_to_local_xy(&self, dir: DVec3) -> Result<(f64, f64)> {
        let (a, b) = self
            .face
            .unembed(dir)
            .ok_or_else(|| MapError::out_of_range("face depth", dir.dot(self.face.normal())))?;
        self.face_to_local_xy(DVec2::new(a, b))
    }
}

/// A [`SurfaceGrid`] spread over the rectangle `[lo, hi]` of one cube face.
///
/// A full-face tile has corners `(-1, -1)` and `(1, 1)`. Tiles are refined
/// by [`RegionTile::refine`] into children that cover a sub-rectangle at the
/// same pixel resolution; a child names its parent only through the
/// [`TileTree`](crate::TileTree) arena.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionTile<T> {
    grid: SurfaceGrid<T>,
    projection: TileProjection,
    parent: Option<TileId>,
}

impl<T: Texel> RegionTile<T> {
    /// An empty tile.
    pub fn new(face: CubeFace, p1: DVec2, p2: DVec2, width: usize, height: usize) -> Result<Self> {
        let projection = TileProjection::new(face, p1, p2, width, height)?;
        Ok(Self {
            grid: SurfaceGrid::new(width, height)?,
            projection,
            parent: None,
        })
    }

    /// An empty tile covering all of `face`.
    pub fn full_face(face: CubeFace, width: usize, height: usize) -> Result<Self> {
        Self::new(face, DVec2::NEG_ONE, DVec2::ONE, width, height)
    }

    /// Interpret existing cell data as a tile.
    pub fn from_grid(face: CubeFace, p1: DVec2, p2: DVec2, grid: SurfaceGrid<T>) -> Result<Self> {
        let (width, height) = grid.dimensions();
        let projection = TileProjection::new(face, p1, p2, width, height)?;
        Ok(Self {
            grid,
            projection,
            parent: None,
        })
    }

    /// Build by sampling `source` at every pixel's direction.
    pub fn from_prototype<S>(
        face: CubeFace,
        p1: DVec2,
        p2: DVec2,
        width: usize,
        height: usize,
        source: &S,
    ) -> Result<Self>
    where
        S: SurfaceMap + Sync,
    {
        let mut tile = Self::new(face, p1, p2, width, height)?;
        crate::resample::resample_into(&mut tile, source)?;
        Ok(tile)
    }

    /// Cube face the tile lies on.
    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.projection.face
    }

    /// Component-wise lower face-local corner.
    #[must_use]
    pub fn corner_lo(&self) -> DVec2 {
        self.projection.lo
    }

    /// Component-wise upper face-local corner.
    #[must_use]
    pub fn corner_hi(&self) -> DVec2 {
        self.projection.hi
    }

    /// Arena handle of the tile this one was refined from.
    #[must_use]
    pub fn parent(&self) -> Option<TileId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: TileId) {
        self.parent = Some(parent);
    }

    /// Cache key: face plus corners.
    #[must_use]
    pub fn key(&self) -> TileKey {
        TileKey::new(self.face(), self.corner_lo(), self.corner_hi())
    }

    /// Whether `dir` points into this tile's rectangle.
    #[must_use]
    pub fn contains_direction(&self, dir: DVec3) -> bool {
        self.projection.direction_to_local_xy(dir).is_ok()
    }

    /// Absolute face-local corners of a sub-rectangle given in this tile's
    /// own `[-1, 1]²` frame: `abs = lo + (sub + 1) / 2 · (hi - lo)`.
    pub fn refine_corners(&self, sub_lo: DVec2, sub_hi: DVec2) -> Result<(DVec2, DVec2)> {
        let (sub_lo, sub_hi) = ordered_corners(sub_lo, sub_hi, MapError::InvalidRegion)?;
        let (lo, hi) = (self.corner_lo(), self.corner_hi());
        let span = hi - lo;
        let abs_lo = lo + (sub_lo + 1.0) * 0.5 * span;
        let abs_hi = lo + (sub_hi + 1.0) * 0.5 * span;
        if abs_lo.x == abs_hi.x || abs_lo.y == abs_hi.y {
            return Err(MapError::InvalidRegion(format!(
                "refinement {sub_lo}..{sub_hi} of {lo}..{hi} collapses to zero area"
            )));
        }
        Ok((abs_lo, abs_hi))
    }

    /// An empty child tile over a sub-rectangle, at this tile's resolution.
    ///
    /// The child's parent link is left unset; [`TileTree::refine`](crate::TileTree::refine)
    /// fills it in when the child joins an arena.
    pub fn refine(&self, sub_lo: DVec2, sub_hi: DVec2) -> Result<Self> {
        let (lo, hi) = self.refine_corners(sub_lo, sub_hi)?;
        let (width, height) = self.dimensions();
        debug!(face = ?self.face(), %lo, %hi, "refining region tile");
        Self::new(self.face(), lo, hi, width, height).map_err(|e| match e {
            MapError::InvalidGeometry(msg) => MapError::InvalidRegion(msg),
            other => other,
        })
    }

    /// Give up the geometry and keep the cells.
    #[must_use]
    pub fn into_grid(self) -> SurfaceGrid<T> {
        self.grid
    }
}

impl<T: Texel> SurfaceMap for RegionTile<T> {
    type Texel = T;
    type Projection = TileProjection;

    fn grid(&self) -> &SurfaceGrid<T> {
        &self.grid
    }

    fn projection(&self) -> &TileProjection {
        &self.projection
    }

    fn parts_mut(&mut self) -> (&TileProjection, &mut SurfaceGrid<T>) {
        (&self.projection, &mut self.grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn test_corners_are_ordered() {
        let tile = RegionTile::<u8>::new(CubeFace::PosZ, v(0.5, -0.5), v(-0.5, 0.25), 8, 8).unwrap();
        assert_eq!(tile.corner_lo(), v(-0.5, -0.5));
        assert_eq!(tile.corner_hi(), v(0.5, 0.25));
        assert_eq!(tile.parent(), None);
    }

    #[test]
    fn test_invalid_corners_rejected() {
        let cases = [
            (v(-1.5, 0.0), v(0.0, 1.0)),
            (v(0.0, 0.0), v(0.0, 1.0)),
            (v(f64::NAN, 0.0), v(1.0, 1.0)),
        ];
        for (p1, p2) in cases {
            assert!(
                matches!(
                    RegionTile::<u8>::new(CubeFace::PosX, p1, p2, 4, 4),
                    Err(MapError::InvalidGeometry(_))
                ),
                "{p1} {p2}"
            );
        }
    }

    #[test]
    fn test_pixel_mapping_uses_width_denominator() {
        let tile = RegionTile::<u8>::full_face(CubeFace::PosX, 4, 4).unwrap();
        let ab = tile.projection().local_xy_to_face(0.0, 2.0).unwrap();
        assert_eq!(ab, v(-1.0, 0.0));
        let ab = tile.projection().local_xy_to_face(3.0, 3.0).unwrap();
        assert_eq!(ab, v(0.5, 0.5));
    }

    #[test]
    fn test_full_face_centre_is_face_normal() {
        let tile = RegionTile::<u8>::full_face(CubeFace::NegY, 64, 64).unwrap();
        let sample = tile.sample_by_local_xy(32.0, 32.0).unwrap();
        assert!((sample.direction - DVec3::NEG_Y).length() < EPSILON);
    }

    #[test]
    fn test_direction_roundtrip() {
        let tile = RegionTile::<u8>::new(CubeFace::NegZ, v(-0.3, 0.1), v(0.6, 0.9), 50, 40).unwrap();
        for &(x, y) in &[(0.0, 0.0), (12.0, 7.0), (49.0, 39.0), (20.5, 10.25)] {
            let dir = tile.projection().local_xy_to_direction(x, y).unwrap();
            let (x2, y2) = tile.projection().direction_to_local_xy(dir.normalize()).unwrap();
            assert!((x - x2).abs() < 1e-9, "x {x} -> {x2}");
            assert!((y - y2).abs() < 1e-9, "y {y} -> {y2}");
        }
    }

    #[test]
    fn test_direction_outside_tile_rejected() {
        let tile = RegionTile::<u8>::new(CubeFace::PosX, v(0.0, 0.0), v(1.0, 1.0), 8, 8).unwrap();
        assert!(tile.sample_by_direction(DVec3::new(1.0, -0.5, 0.5)).is_err());
        assert!(tile.sample_by_direction(DVec3::NEG_X).is_err());
        assert!(tile.contains_direction(DVec3::new(1.0, 0.5, 0.5)));
        assert!(!tile.contains_direction(DVec3::new(1.0, 0.5, -0.5)));
    }

    #[test]
    fn test_refine_maps_affinely() {
        let tile = RegionTile::<u8>::new(CubeFace::PosY, v(-1.0, -1.0), v(0.0, 0.0), 8, 8).unwrap();
        let child = tile.refine(v(-1.0, -1.0), v(0.0, 1.0)).unwrap();
        assert_eq!(child.corner_lo(), v(-1.0, -1.0));
        assert_eq!(child.corner_hi(), v(-0.5, 0.0));
        assert_eq!(child.face(), CubeFace::PosY);
        assert_eq!(child.dimensions(), (8, 8));
    }

    #[test]
    fn test_refine_twice_equals_composed_corners() {
        let root = RegionTile::<u8>::full_face(CubeFace::PosX, 16, 16).unwrap();
        let twice = root
            .refine(v(0.0, -1.0), v(1.0, 0.0))
            .unwrap()
            .refine(v(-1.0, 0.0), v(0.0, 1.0))
            .unwrap();
        // The first step covers [0, 1] x [-1, 0]; its upper-left quadrant
        // is [0, 0.5] x [-0.5, 0].
        let direct = RegionTile::<u8>::new(CubeFace::PosX, v(0.0, -0.5), v(0.5, 0.0), 16, 16).unwrap();
        assert_eq!(twice.corner_lo(), direct.corner_lo());
        assert_eq!(twice.corner_hi(), direct.corner_hi());
        assert_eq!(twice.key(), direct.key());
    }

    #[test]
    fn test_refine_rejects_bad_regions() {
        let tile = RegionTile::<u8>::full_face(CubeFace::PosZ, 4, 4).unwrap();
        for (lo, hi) in [
            (v(-1.0, -1.0), v(1.5, 1.0)),
            (v(0.2, -1.0), v(0.2, 1.0)),
            (v(f64::INFINITY, 0.0), v(1.0, 1.0)),
        ] {
            assert!(matches!(
                tile.refine(lo, hi),
                Err(MapError::InvalidRegion(_))
            ));
        }
    }

    #[test]
    fn test_last_pixel_inverse_clamps() {
        let tile = RegionTile::<u8>::full_face(CubeFace::PosX, 4, 4).unwrap();
        let (x, y) = tile.projection().face_to_local_xy(v(1.0, 1.0)).unwrap();
        assert_eq!((x, y), (3.0, 3.0));
    }
}
