//! The six cube faces, their fixed axis assignment, and the embedding of
//! face-local `(a, b)` coordinates into 3-space.

use std::f64::consts::FRAC_PI_4;

use glam::DVec3;

use crate::error::{MapError, Result};

/// The six faces of the cube circumscribing the sphere.
///
/// The discriminant is the face index used by the atlas layout: faces 0–2
/// fill the top row of a [`CubeAtlas`](crate::CubeAtlas), faces 3–5 the
/// bottom row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// +X face (meridian).
    PosX = 0,
    /// −Y face.
    NegY = 1,
    /// −X face (antimeridian).
    NegX = 2,
    /// +Y face.
    PosY = 3,
    /// +Z face (north pole).
    PosZ = 4,
    /// −Z face (south pole).
    NegZ = 5,
}

/// Axis assignment of one face: which component carries the face normal and
/// which carry the local `a` and `b` coordinates, each with a sign.
#[derive(Clone, Copy, Debug)]
struct FaceAxes {
    normal: (usize, f64),
    a: (usize, f64),
    b: (usize, f64),
}

/// Indexed by face. Every row is a right-handed frame: `a × b = normal`.
#[rustfmt::skip]
const FACE_AXES: [FaceAxes; 6] = [
    // +X: ( 1,  a,  b)
    FaceAxes { normal: (0, 1.0), a: (1, 1.0), b: (2, 1.0) },
    // −Y: ( a, -1,  b)
    FaceAxes { normal: (1, -1.0), a: (0, 1.0), b: (2, 1.0) },
    // −X: (-1, -a,  b)
    FaceAxes { normal: (0, -1.0), a: (1, -1.0), b: (2, 1.0) },
    // +Y: (-a,  1,  b)
    FaceAxes { normal: (1, 1.0), a: (0, -1.0), b: (2, 1.0) },
    // +Z: ( a,  b,  1)
    FaceAxes { normal: (2, 1.0), a: (0, 1.0), b: (1, 1.0) },
    // −Z: ( a, -b, -1)
    FaceAxes { normal: (2, -1.0), a: (0, 1.0), b: (1, -1.0) },
];

impl CubeFace {
    /// All six faces in index order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegY,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Face for an index in `0..6`.
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| MapError::InvalidGeometry(format!("unsupported face index {index}")))
    }

    /// Index in `0..6`.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The opposite face (e.g. `PosX` → `NegX`).
    #[must_use]
    pub fn opposite(self) -> CubeFace {
        match self {
            CubeFace::PosX => CubeFace::NegX,
            CubeFace::NegX => CubeFace::PosX,
            CubeFace::PosY => CubeFace::NegY,
            CubeFace::NegY => CubeFace::PosY,
            CubeFace::PosZ => CubeFace::NegZ,
            CubeFace::NegZ => CubeFace::PosZ,
        }
    }

    fn axes(self) -> &'static FaceAxes {
        &FACE_AXES[self.index()]
    }

    /// Outward unit normal.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        self.embed(0.0, 0.0)
    }

    /// Direction of increasing `a` on this face.
    #[must_use]
    pub fn tangent(self) -> DVec3 {
        axis_vector(self.axes().a)
    }

    /// Direction of increasing `b` on this face.
    #[must_use]
    pub fn bitangent(self) -> DVec3 {
        axis_vector(self.axes().b)
    }

    /// Point on the `[-1, 1]` cube for face-local `(a, b)`.
    ///
    /// The result is not normalized; its length is `sqrt(1 + a² + b²)`.
    #[must_use]
    pub fn embed(self, a: f64, b: f64) -> DVec3 {
        let axes = self.axes();
        let mut v = [0.0; 3];
        v[axes.normal.0] = axes.normal.1;
        v[axes.a.0] = axes.a.1 * a;
        v[axes.b.0] = axes.b.1 * b;
        DVec3::from_array(v)
    }

    /// Face-local `(a, b)` of the ray through `dir`, or `None` if the ray does
    /// not cross this face's plane (it points into the opposite hemisphere).
    ///
    /// The result is inside `[-1, 1]²` exactly when this face is the
    /// direction's dominant-axis face (up to ties).
    #[must_use]
    pub fn unembed(self, dir: DVec3) -> Option<(f64, f64)> {
        let axes = self.axes();
        let v = dir.to_array();
        let depth = v[axes.normal.0] * axes.normal.1;
        if depth <= 0.0 || !depth.is_finite() {
            return None;
        }
        let a = v[axes.a.0] * axes.a.1 / depth;
        let b = v[axes.b.0] * axes.b.1 / depth;
        Some((a, b))
    }

    /// Face whose axis carries the largest component of `dir`.
    ///
    /// On a cube edge or corner several faces tie. Pixels sit at
    /// `a, b = 2i/s - 1`, so a face owns its `-1` edges but not its `+1`
    /// edges; among tied faces the one with the smallest `a + b` wins, which
    /// is the face holding a pixel there. Remaining ties go to the lower face
    /// index. A zero or non-finite vector maps to [`CubeFace::PosX`].
    #[must_use]
    pub fn from_direction(dir: DVec3) -> CubeFace {
        let largest = dir.abs().max_element();
        let mut best = None;
        for face in Self::ALL {
            let axes = face.axes();
            if dir[axes.normal.0] * axes.normal.1 != largest {
                continue;
            }
            if let Some((a, b)) = face.unembed(dir) {
                match best {
                    Some((_, lowest)) if lowest <= a + b => {}
                    _ => best = Some((face, a + b)),
                }
            }
        }
        best.map_or(CubeFace::PosX, |(face, _)| face)
    }

    /// Geographic face partition.
    ///
    /// Branches are tried in order and every comparison is strict, so a
    /// coordinate lying exactly on a threshold falls through to the next
    /// branch that admits it:
    ///
    /// 1. `lat > 45°` → [`PosZ`](CubeFace::PosZ)
    /// 2. `lat < -45°` → [`NegZ`](CubeFace::NegZ)
    /// 3. `-45° < lon < 45°` → [`PosX`](CubeFace::PosX)
    /// 4. `-135° < lon < 0°` → [`NegY`](CubeFace::NegY)
    /// 5. `0° < lon < 135°` → [`PosY`](CubeFace::PosY)
    /// 6. otherwise → [`NegX`](CubeFace::NegX)
    ///
    /// Branches 4 and 5 only see longitudes the meridian branch rejected, so
    /// `lon = ∓45°` lands on the side faces and `lon = ±135°` on the far side.
    ///
    /// This is a latitude/longitude partition, not the cube partition: near
    /// face corners it can disagree with [`CubeFace::from_direction`]. The two
    /// agree at every face centre.
    #[must_use]
    pub fn from_geo(lat: f64, lon: f64) -> CubeFace {
        const SIDE: f64 = 3.0 * FRAC_PI_4;
        match (lat, lon) {
            (lat, _) if lat > FRAC_PI_4 => CubeFace::PosZ,
            (lat, _) if lat < -FRAC_PI_4 => CubeFace::NegZ,
            (_, lon) if -FRAC_PI_4 < lon && lon < FRAC_PI_4 => CubeFace::PosX,
            (_, lon) if -SIDE < lon && lon < 0.0 => CubeFace::NegY,
            (_, lon) if 0.0 < lon && lon < SIDE => CubeFace::PosY,
            _ => CubeFace::NegX,
        }
    }
}

fn axis_vector((axis, sign): (usize, f64)) -> DVec3 {
    let mut v = [0.0; 3];
    v[axis] = sign;
    DVec3::from_array(v)
}
