//! Height map assembly: base height field to tectonic cube atlas, and cube
//! atlas to detailed atlases and region tiles.

use std::time::Instant;

use pyrostex_config::{Config, ConfigError};
use pyrostex_map::{CubeAtlas, CubeFace, DVec2, MapError, Resampler, TileId, TileTree};
use tracing::info;

use crate::detail::{DetailSampler, apply_detail};
use crate::heightfield::{HeightField, HeightFieldError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    HeightField(#[from] HeightFieldError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("height field is {found_cols}x{found_rows}, base map allows {cols}x{rows}")]
    BaseShape {
        cols: usize,
        rows: usize,
        found_cols: usize,
        found_rows: usize,
    },
}

/// Resample a synthesizer height field into a cube atlas at the configured
/// tectonic resolution.
///
/// The field must be exactly `base_width` values wide. Its filled rows may be
/// fewer than `base_height`, never more.
pub fn build_tectonic_atlas(
    field: &HeightField,
    config: &Config,
) -> Result<CubeAtlas<f32>, PipelineError> {
    config.validate()?;
    let maps = &config.maps;
    if field.n_cols() != maps.base_width || field.n_rows() > maps.base_height {
        return Err(PipelineError::BaseShape {
            cols: maps.base_width,
            rows: maps.base_height,
            found_cols: field.n_cols(),
            found_rows: field.n_rows(),
        });
    }

    let start = Instant::now();
    let geodetic = field.to_geodetic_grid()?;
    let atlas = Resampler::new(&geodetic).to_cube_atlas(maps.tectonic_width, maps.tectonic_height)?;
    info!(
        rows = field.n_rows(),
        cols = field.n_cols(),
        width = maps.tectonic_width,
        height = maps.tectonic_height,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "tectonic atlas built"
    );
    Ok(atlas)
}

/// Whole-planet height atlas at the configured detail resolution: `source`
/// resampled, then given detail noise.
pub fn build_detail_atlas(
    source: &CubeAtlas<f32>,
    config: &Config,
) -> Result<CubeAtlas<f32>, PipelineError> {
    config.validate()?;
    let start = Instant::now();
    let maps = &config.maps;
    let mut atlas: CubeAtlas<f32> =
        Resampler::new(source).to_cube_atlas(maps.detail_width, maps.detail_height)?;
    apply_detail(&mut atlas, &DetailSampler::new(config.detail.clone().into()))?;
    info!(
        width = maps.detail_width,
        height = maps.detail_height,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "detail atlas built"
    );
    Ok(atlas)
}

/// Height tile over `[lo, hi]` of `face`: resampled from `atlas`, then
/// given detail noise.
///
/// The tile is added to `tree` under the face's root tile, at the configured
/// tile size. A tile that was already built is returned untouched.
pub fn build_tile_height(
    tree: &mut TileTree<f32>,
    atlas: &CubeAtlas<f32>,
    face: CubeFace,
    lo: DVec2,
    hi: DVec2,
    config: &Config,
) -> Result<TileId, PipelineError> {
    config.validate()?;
    let size = config.maps.tile_size;
    let root = tree.root(face, size, size)?;
    let id = tree.refine(root, lo, hi)?;
    if tree.is_filled(id) {
        return Ok(id);
    }

    let tile = tree
        .get_mut(id)
        .ok_or_else(|| MapError::InvalidRegion("refined tile missing from tree".into()))?;
    Resampler::new(atlas).into_map(tile)?;
    apply_detail(tile, &DetailSampler::new(config.detail.clone().into()))?;
    tree.mark_filled(id)?;
    info!(face = ?face, %lo, %hi, size, "tile height built");
    Ok(id)
}
