//! Six-face cube maps packed into one 3×2 atlas.

use glam::DVec3;
use tracing::debug;

use crate::cube_face::CubeFace;
use crate::error::{MapError, Result};
use crate::geo::{check_direction, check_geo};
use crate::grid::{SurfaceGrid, snap};
use crate::surface::{Projection, SurfaceMap};
use crate::texel::Texel;

/// Upper bound on the un-normalized length of an embedded face point.
pub(crate) const EMBED_MAGNITUDE_BOUND: f64 = 2.0;

/// Layout of a 3×2 cube atlas.
///
/// ```text
/// +------+------+------+
/// | 0 +X | 1 -Y | 2 -X |
/// +------+------+------+
/// | 3 +Y | 4 +Z | 5 -Z |
/// +------+------+------+
/// ```
///
/// Inside a face block of size `s`, pixel column `i` has face-local
/// `a = 2·i/s - 1` and row `j` has `b = 2·j/s - 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasProjection {
    width: usize,
    height: usize,
    face_size: usize,
}

impl AtlasProjection {
    /// Validate an atlas shape: three equal square faces per row, two rows.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 || width % 3 != 0 || height % 2 != 0 {
            return Err(MapError::InvalidGeometry(format!(
                "cube atlas {width}x{height} does not divide into 3x2 faces"
            )));
        }
        let face_size = width / 3;
        if face_size != height / 2 {
            return Err(MapError::InvalidGeometry(format!(
                "cube atlas {width}x{height} faces are not square"
            )));
        }
        Ok(Self {
            width,
            height,
            face_size,
        })
    }

    /// Edge length of one face block in pixels.
    #[must_use]
    pub fn face_size(&self) -> usize {
        self.face_size
    }

    /// Top-left atlas pixel of a face's block.
    #[must_use]
    pub fn reference_offset(&self, face: CubeFace) -> (usize, usize) {
        let i = face.index();
        ((i % 3) * self.face_size, (i / 3) * self.face_size)
    }

    /// Face whose block contains atlas pixel `(x, y)`.
    pub fn face_for_xy(&self, x: f64, y: f64) -> Result<CubeFace> {
        if !(0.0..self.width as f64).contains(&x) {
            return Err(MapError::out_of_range("pixel x", x));
        }
        if !(0.0..self.height as f64).contains(&y) {
            return Err(MapError::out_of_range("pixel y", y));
        }
        let column = x as usize / self.face_size;
        let row = y as usize / self.face_size;
        CubeFace::from_index(row * 3 + column)
    }

    /// Atlas pixel of face-local `(a, b)` on `face`.
    ///
    /// `a = 1` (and `b = 1`) has no pixel of its own and clamps to the
    /// block's last column (row), so lookups never cross into the next face.
    fn face_local_to_xy(&self, face: CubeFace, a: f64, b: f64) -> (f64, f64) {
        let (ox, oy) = self.reference_offset(face);
        let s = self.face_size as f64;
        let last = s - 1.0;
        let x = snap((a + 1.0) * 0.5 * s).clamp(0.0, last);
        let y = snap((b + 1.0) * 0.5 * s).clamp(0.0, last);
        (ox as f64 + x, oy as f64 + y)
    }
}

impl Projection for AtlasProjection {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn local_xy_to_direction(&self, x: f64, y: f64) -> Result<DVec3> {
        let face = self.face_for_xy(x, y)?;
        let (ox, oy) = self.reference_offset(face);
        let s = self.face_size as f64;
        let a = 2.0 * (x - ox as f64) / s - 1.0;
        let b = 2.0 * (y - oy as f64) / s - 1.0;
        let dir = face.embed(a, b);
        debug_assert!(dir.length() < EMBED_MAGNITUDE_BOUND, "{dir:?}");
        Ok(dir)
    }

    /// Resolves the face by dominant axis, so `(a, b)` is always on the face.
    fn direction_to_local_xy(&self, dir: DVec3) -> Result<(f64, f64)> {
        let face = CubeFace::from_direction(dir);
        let (a, b) = face
            .unembed(dir)
            .ok_or_else(|| MapError::out_of_range("direction length", dir.length()))?;
        Ok(self.face_local_to_xy(face, a, b))
    }
}

/// A [`SurfaceGrid`] holding all six cube faces in a 3×2 atlas.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeAtlas<T> {
    grid: SurfaceGrid<T>,
    projection: AtlasProjection,
}

impl<T: Texel> CubeAtlas<T> {
    /// An empty atlas. `width` must be `3·s` and `height` `2·s`.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let projection = AtlasProjection::new(width, height)?;
        Ok(Self {
            grid: SurfaceGrid::new(width, height)?,
            projection,
        })
    }

    /// Interpret existing cell data as an atlas.
    pub fn from_grid(grid: SurfaceGrid<T>) -> Result<Self> {
        let (width, height) = grid.dimensions();
        let projection = AtlasProjection::new(width, height)?;
        Ok(Self { grid, projection })
    }

    /// Build by sampling `source` at every pixel's direction.
    pub fn from_prototype<S>(width: usize, height: usize, source: &S) -> Result<Self>
    where
        S: SurfaceMap + Sync,
    {
        let mut atlas = Self::new(width, height)?;
        debug!(
            width,
            height,
            face_size = atlas.face_size(),
            "resampling cube atlas from prototype"
        );
        crate::resample::resample_into(&mut atlas, source)?;
        Ok(atlas)
    }

    /// Edge length of one face in pixels.
    #[must_use]
    pub fn face_size(&self) -> usize {
        self.projection.face_size
    }

    /// Top-left atlas pixel of `face`, for callers composing debug images.
    #[must_use]
    pub fn reference_offset(&self, face: CubeFace) -> (usize, usize) {
        self.projection.reference_offset(face)
    }

    /// Face whose block contains atlas pixel `(x, y)`.
    pub fn face_for_xy(&self, x: f64, y: f64) -> Result<CubeFace> {
        self.projection.face_for_xy(x, y)
    }

    /// Geographic face classification; see [`CubeFace::from_geo`].
    pub fn face_for_geo(&self, lat: f64, lon: f64) -> Result<CubeFace> {
        check_geo(lat, lon)?;
        Ok(CubeFace::from_geo(lat, lon))
    }

    /// Dominant-axis face of `dir`; the face sampling reads from.
    pub fn face_for_direction(&self, dir: DVec3) -> Result<CubeFace> {
        check_direction(dir)?;
        Ok(CubeFace::from_direction(dir))
    }

    /// Direction through atlas pixel `(x, y)`, not normalized.
    pub fn local_xy_to_direction(&self, x: f64, y: f64) -> Result<DVec3> {
        self.projection.local_xy_to_direction(x, y)
    }

    /// Copy of one face's block.
    pub fn crop_face(&self, face: CubeFace) -> Result<SurfaceGrid<T>> {
        let (ox, oy) = self.reference_offset(face);
        let s = self.face_size();
        self.grid.crop(ox, oy, s, s)
    }

    /// Give up the geometry and keep the cells.
    #[must_use]
    pub fn into_grid(self) -> SurfaceGrid<T> {
        self.grid
    }
}

impl<T: Texel> SurfaceMap for CubeAtlas<T> {
    type Texel = T;
    type Projection = AtlasProjection;

    fn grid(&self) -> &SurfaceGrid<T> {
        &self.grid
    }

    fn projection(&self) -> &AtlasProjection {
        &self.projection
    }

    fn parts_mut(&mut self) -> (&AtlasProjection, &mut SurfaceGrid<T>) {
        (&self.projection, &mut self.grid)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::geo::{direction_from_geo, geo_from_direction};

    fn atlas() -> CubeAtlas<u8> {
        CubeAtlas::new(1536, 1024).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let m = atlas();
        assert_eq!(m.dimensions(), (1536, 1024));
        assert_eq!(m.face_size(), 512);
    }

    #[test]
    fn test_bad_dimensions_fail_to_construct() {
        for (w, h) in [(1535, 1024), (1536, 1023), (1536, 512), (0, 0)] {
            assert!(
                matches!(
                    CubeAtlas::<u8>::new(w, h),
                    Err(MapError::InvalidGeometry(_))
                ),
                "{w}x{h} should be rejected"
            );
        }
    }

    #[test]
    fn test_face_for_xy() {
        let m = atlas();
        assert_eq!(m.face_for_xy(0.0, 0.0).unwrap(), CubeFace::PosX);
        assert_eq!(m.face_for_xy(512.0, 0.0).unwrap(), CubeFace::NegY);
        assert_eq!(m.face_for_xy(511.9, 511.9).unwrap(), CubeFace::PosX);
        assert_eq!(m.face_for_xy(1024.0, 0.0).unwrap(), CubeFace::NegX);
        assert_eq!(m.face_for_xy(0.0, 512.0).unwrap(), CubeFace::PosY);
        assert_eq!(m.face_for_xy(768.0, 768.0).unwrap(), CubeFace::PosZ);
        assert_eq!(m.face_for_xy(1535.0, 1023.0).unwrap(), CubeFace::NegZ);
        assert!(m.face_for_xy(1536.0, 0.0).is_err());
        assert!(m.face_for_xy(0.0, -1.0).is_err());
    }

    #[test]
    fn test_reference_offsets() {
        let m = atlas();
        let expected = [(0, 0), (512, 0), (1024, 0), (0, 512), (512, 512), (1024, 512)];
        for (face, offset) in CubeFace::ALL.iter().zip(expected) {
            assert_eq!(m.reference_offset(*face), offset, "{face:?}");
        }
    }

    #[test]
    fn test_face_centres_point_along_face_axis() {
        let m = atlas();
        let centres = [
            ((256.0, 256.0), DVec3::X),
            ((768.0, 256.0), DVec3::NEG_Y),
            ((1280.0, 256.0), DVec3::NEG_X),
            ((256.0, 768.0), DVec3::Y),
            ((768.0, 768.0), DVec3::Z),
            ((1280.0, 768.0), DVec3::NEG_Z),
        ];
        for ((x, y), axis) in centres {
            let dir = m.sample_by_local_xy(x, y).unwrap().direction;
            assert!(dir.dot(axis) > 0.99, "({x}, {y}) -> {dir:?}");
            let off_axis = dir - axis * dir.dot(axis);
            assert!(off_axis.x.abs() < 0.01);
            assert!(off_axis.y.abs() < 0.01);
            assert!(off_axis.z.abs() < 0.01);
        }
    }

    #[test]
    fn test_face_for_xy_agrees_with_face_for_geo_at_centres() {
        let m = atlas();
        for face in CubeFace::ALL {
            let (ox, oy) = m.reference_offset(face);
            let half = (m.face_size() / 2) as f64;
            let (x, y) = (ox as f64 + half, oy as f64 + half);
            let xy_face = m.face_for_xy(x, y).unwrap();
            let dir = m.local_xy_to_direction(x, y).unwrap();
            let (lat, lon) = geo_from_direction(dir);
            assert_eq!(xy_face, face);
            assert_eq!(m.face_for_geo(lat, lon).unwrap(), face);
            assert_eq!(m.face_for_direction(dir).unwrap(), face);
        }
    }

    #[test]
    fn test_face_for_geo_validates_domain() {
        let m = atlas();
        assert!(m.face_for_geo(1.7, 0.0).is_err());
        assert!(m.face_for_geo(0.0, -4.0).is_err());
        assert!(m.face_for_direction(DVec3::ZERO).is_err());
    }

    #[test]
    fn test_geo_partition_differs_from_cube_near_corners() {
        let m = atlas();
        let (lat, lon) = (40f64.to_radians(), (-50f64).to_radians());
        let dir = direction_from_geo(lat, lon).unwrap();
        assert_eq!(m.face_for_geo(lat, lon).unwrap(), CubeFace::NegY);
        assert_eq!(m.face_for_direction(dir).unwrap(), CubeFace::PosZ);
        // Sampling follows the cube partition.
        assert!(m.sample_by_geo(lat, lon).is_ok());
    }

    #[test]
    fn test_pixel_direction_roundtrip() {
        let m = CubeAtlas::<u8>::new(96, 64).unwrap();
        for face in CubeFace::ALL {
            let (ox, oy) = m.reference_offset(face);
            for &(i, j) in &[(1, 1), (5, 17), (31, 31), (16, 3)] {
                let (x, y) = ((ox + i) as f64, (oy + j) as f64);
                let dir = m.local_xy_to_direction(x, y).unwrap();
                let (x2, y2) = m.projection().direction_to_local_xy(dir * 0.3).unwrap();
                assert_eq!((x2, y2), (x, y), "{face:?} pixel ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_low_edge_pixels_sample_their_own_face() {
        let mut m = CubeAtlas::<u8>::new(96, 64).unwrap();
        for face in CubeFace::ALL {
            let (ox, oy) = m.reference_offset(face);
            for y in 0..32 {
                for x in 0..32 {
                    m.grid_mut().set(ox + x, oy + y, face.index() as u8 + 1).unwrap();
                }
            }
        }

        // Column 0 of -Y lies on the edge shared with -X.
        let dir = m.local_xy_to_direction(32.0, 5.0).unwrap();
        assert_eq!(m.sample_by_direction(dir).unwrap().value, 2);

        // +X, -Y and +Z share none of their pixels with another face.
        for face in [CubeFace::PosX, CubeFace::NegY, CubeFace::PosZ] {
            let (ox, oy) = m.reference_offset(face);
            for y in 0..32 {
                for x in 0..32 {
                    let (px, py) = ((ox + x) as f64, (oy + y) as f64);
                    let dir = m.local_xy_to_direction(px, py).unwrap().normalize();
                    assert_eq!(
                        m.sample_by_direction(dir).unwrap().value,
                        face.index() as u8 + 1,
                        "{face:?} pixel ({x}, {y})"
                    );
                    let back = m.projection().direction_to_local_xy(dir).unwrap();
                    assert_eq!(back, (px, py), "{face:?} pixel ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_far_edge_clamps_to_face_block() {
        let m = CubeAtlas::<u8>::new(96, 64).unwrap();
        // a = b = 1 on +X lies on the cube edge shared with +Y and +Z.
        let (x, y) = m
            .projection()
            .direction_to_local_xy(DVec3::new(1.0, 0.999_999, 0.5))
            .unwrap();
        assert!(x <= 31.0 && y < 32.0, "({x}, {y})");
    }

    #[test]
    fn test_sample_by_direction_reads_face_cell() {
        let mut m = CubeAtlas::<u16>::new(96, 64).unwrap();
        for face in CubeFace::ALL {
            let (ox, oy) = m.reference_offset(face);
            m.grid_mut()
                .set(ox + 16, oy + 16, 100 + face.index() as u16)
                .unwrap();
        }
        for face in CubeFace::ALL {
            let sample = m.sample_by_direction(face.normal()).unwrap();
            assert_eq!(sample.value, 100 + face.index() as u16, "{face:?}");
        }
    }

    #[test]
    fn test_sample_by_geo_everywhere_in_range() {
        let m = CubeAtlas::<u8>::new(96, 64).unwrap();
        for lat_deg in (-90..=90).step_by(10) {
            for lon_deg in (-180..=180).step_by(10) {
                let lat = f64::from(lat_deg).to_radians().clamp(-FRAC_PI_2, FRAC_PI_2);
                let lon = f64::from(lon_deg).to_radians().clamp(-PI, PI);
                let sample = m.sample_by_geo(lat, lon).unwrap();
                let expected = direction_from_geo(lat, lon).unwrap();
                assert!((sample.direction - expected).length() < 1e-12);
            }
        }
    }
}
