//! Binary persistence for [`SurfaceGrid`].
//!
//! The PTXG format stores one grid, cells only; geometry is reattached by
//! the caller (`GeodeticGrid::from_grid`, `CubeAtlas::from_grid`, ...).
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Magic bytes `"PTXG"` |
//! | 4 | 1 | Format version (`u8`, currently 1) |
//! | 5 | 1 | Texel kind tag (`u8`, see [`TexelKind`]) |
//! | 6 | 4 | Width (`u32`, little-endian) |
//! | 10 | 4 | Height (`u32`, little-endian) |
//! | 14 | W×H×S | Cells, row-major, little-endian |

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::MapError;
use crate::grid::SurfaceGrid;
use crate::texel::{Texel, TexelKind};

const MAGIC: [u8; 4] = *b"PTXG";

const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 14;

/// Errors from reading or writing a persisted grid.
#[derive(Debug, thiserror::Error)]
pub enum GridIoError {
    #[error("grid file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid magic bytes")]
    InvalidMagic,
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),
    #[error("unknown texel kind tag: {0}")]
    UnknownKind(u8),
    #[error("texel kind mismatch: expected {expected:?}, found {found:?}")]
    KindMismatch {
        expected: TexelKind,
        found: TexelKind,
    },
    /// The data is shorter or longer than its header says.
    #[error("cell data has wrong length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error(transparent)]
    Geometry(#[from] MapError),
}

impl<T: Texel> SurfaceGrid<T> {
    /// Encode in the PTXG format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GridIoError> {
        let width = dimension_u32(self.width())?;
        let height = dimension_u32(self.height())?;
        let mut buf = Vec::with_capacity(HEADER_LEN + self.as_slice().len() * T::SIZE);
        buf.extend_from_slice(&MAGIC);
        buf.push(FORMAT_VERSION);
        buf.push(T::KIND.tag());
        buf.extend_from_slice(&width.to_le_bytes());
        buf.extend_from_slice(&height.to_le_bytes());
        for &cell in self.as_slice() {
            cell.write_le(&mut buf);
        }
        Ok(buf)
    }

    /// Decode a PTXG buffer whose kind tag matches `T`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, GridIoError> {
        if data.len() < 4 || data[0..4] != MAGIC {
            return Err(GridIoError::InvalidMagic);
        }
        if data.len() < HEADER_LEN {
            return Err(GridIoError::Length {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        let version = data[4];
        if version != FORMAT_VERSION {
            return Err(GridIoError::UnsupportedVersion(version));
        }
        let found = TexelKind::from_tag(data[5]).ok_or(GridIoError::UnknownKind(data[5]))?;
        if found != T::KIND {
            return Err(GridIoError::KindMismatch {
                expected: T::KIND,
                found,
            });
        }
        let width = u32::from_le_bytes([data[6], data[7], data[8], data[9]]) as usize;
        let height = u32::from_le_bytes([data[10], data[11], data[12], data[13]]) as usize;

        let body = &data[HEADER_LEN..];
        let expected = width
            .checked_mul(height)
            .and_then(|cells| cells.checked_mul(T::SIZE))
            .ok_or_else(|| {
                MapError::InvalidGeometry(format!("{width}x{height} grid overflows"))
            })?;
        if body.len() != expected {
            return Err(GridIoError::Length {
                expected,
                actual: body.len(),
            });
        }
        let cells = body.chunks_exact(T::SIZE).map(T::read_le).collect();
        Ok(Self::from_vec(width, height, cells)?)
    }

    /// Write the PTXG encoding to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), GridIoError> {
        writer.write_all(&self.to_bytes()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a PTXG encoding from `reader` to its end.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, GridIoError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Write to a file, replacing it if it exists.
    pub fn save(&self, path: &Path) -> Result<(), GridIoError> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        debug!(path = %path.display(), width = self.width(), height = self.height(), "grid saved");
        Ok(())
    }

    /// Read a grid previously written by [`SurfaceGrid::save`].
    pub fn load(path: &Path) -> Result<Self, GridIoError> {
        let grid = Self::read_from(BufReader::new(File::open(path)?))?;
        debug!(path = %path.display(), width = grid.width(), height = grid.height(), "grid loaded");
        Ok(grid)
    }
}

fn dimension_u32(value: usize) -> Result<u32, GridIoError> {
    u32::try_from(value).map_err(|_| {
        GridIoError::Geometry(MapError::InvalidGeometry(format!(
            "dimension {value} does not fit the grid file header"
        )))
    })
}
