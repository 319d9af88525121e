//! Greyscale PNG export of any grid, for eyeballing generated maps.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pyrostex_map::{SurfaceGrid, Texel};
use tracing::debug;

/// Errors that can occur during PNG export.
#[derive(Debug, thiserror::Error)]
pub enum DebugImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),
    #[error("grid {width}x{height} is too large for a PNG")]
    TooLarge { width: usize, height: usize },
}

/// Which values map to black and white.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GreyRange {
    /// The smallest and largest value present in the grid.
    #[default]
    Data,
    /// The full range of the storage type, so a `u16` grid is divided down
    /// by 257. Float grids have no such range and fall back to [`GreyRange::Data`].
    Storage,
}

fn bounds<T: Texel>(grid: &SurfaceGrid<T>, range: GreyRange) -> (f64, f64) {
    match range {
        GreyRange::Storage => T::KIND
            .natural_range()
            .unwrap_or_else(|| grid.value_range()),
        GreyRange::Data => grid.value_range(),
    }
}

/// Rescale `range` linearly onto `0..=255`, row-major.
///
/// An empty range maps everything to black.
pub fn greyscale_pixels<T: Texel>(grid: &SurfaceGrid<T>, range: GreyRange) -> Vec<u8> {
    let (lo, hi) = bounds(grid, range);
    let span = hi - lo;
    grid.as_slice()
        .iter()
        .map(|v| {
            if span > 0.0 {
                ((v.to_f64() - lo) / span * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect()
}

/// Encode the grid as an 8-bit greyscale PNG into `writer`.
pub fn write_png<T: Texel, W: Write>(
    grid: &SurfaceGrid<T>,
    range: GreyRange,
    writer: W,
) -> Result<(), DebugImageError> {
    let (width, height) = grid.dimensions();
    let too_large = || DebugImageError::TooLarge { width, height };
    let png_width = u32::try_from(width).map_err(|_| too_large())?;
    let png_height = u32::try_from(height).map_err(|_| too_large())?;

    let mut encoder = png::Encoder::new(writer, png_width, png_height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&greyscale_pixels(grid, range))?;
    png_writer.finish()?;
    Ok(())
}

/// Write the grid to `path` as a greyscale PNG.
pub fn save_png<T: Texel>(
    grid: &SurfaceGrid<T>,
    range: GreyRange,
    path: &Path,
) -> Result<(), DebugImageError> {
    let file = File::create(path)?;
    write_png(grid, range, BufWriter::new(file))?;
    debug!(path = %path.display(), ?range, "debug image written");
    Ok(())
}
