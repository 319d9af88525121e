//! Sphere surface maps: latitude/longitude grids, six-face cube atlases and
//! cube-face region tiles, with bilinear sampling by geographic coordinate,
//! direction or pixel, and resampling between representations.

mod cube_atlas;
mod cube_face;
mod error;
mod geo;
mod geodetic;
mod grid;
mod persist;
mod region_tile;
mod resample;
mod surface;
mod texel;
mod tile_tree;

pub use cube_atlas::{AtlasProjection, CubeAtlas};
pub use cube_face::CubeFace;
pub use error::{MapError, Result};
pub use geo::{
    MAX_LAT, MAX_LON, MIN_LAT, MIN_LON, check_direction, check_geo, direction_from_geo,
    geo_from_direction,
};
pub use geodetic::{GeodeticGrid, GeodeticProjection};
pub use grid::SurfaceGrid;
pub use persist::GridIoError;
pub use region_tile::{RegionTile, TileProjection};
pub use resample::{Resampler, fill_from_fn, resample_into, update_from_fn};
pub use surface::{Projection, SampledValue, SurfaceMap};
pub use texel::{Texel, TexelKind};
pub use tile_tree::{TileId, TileKey, TileTree};

pub use glam::{DVec2, DVec3};
