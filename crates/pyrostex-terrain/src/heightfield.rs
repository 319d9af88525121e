//! Plain-text height fields written by the external terrain synthesizer.
//!
//! The file is a grid of whitespace-separated integers, one map row per
//! line. Rows at the top and bottom that are entirely zero are padding and
//! are skipped; everything from the first to the last row holding a
//! non-zero value (inclusive) is the filled range.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::num::ParseIntError;
use std::ops::Range;
use std::path::{Path, PathBuf};

use pyrostex_map::{GeodeticGrid, MapError, SurfaceGrid};
use tracing::{debug, warn};

/// Errors from reading a height field file.
#[derive(Debug, thiserror::Error)]
pub enum HeightFieldError {
    #[error("failed to read height field {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid height value: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseIntError,
    },
    /// A row's length differs from the first row's.
    #[error("line {line}: expected {expected} values, found {found}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Map(#[from] MapError),
}

fn parse_row(text: &str, line: usize) -> Result<Vec<i32>, HeightFieldError> {
    text.split_whitespace()
        .map(|v| v.parse().map_err(|source| HeightFieldError::Parse { line, source }))
        .collect()
}

/// A height field file, scanned once for its shape.
///
/// Row data is not kept in memory; [`HeightField::filled_rows`] re-reads
/// the file lazily.
#[derive(Debug, Clone)]
pub struct HeightField {
    path: PathBuf,
    n_cols: usize,
    filled: Range<usize>,
}

impl HeightField {
    /// Scan `path`, validating every row and locating the filled range.
    ///
    /// Lines holding only whitespace are ignored and do not count as rows.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HeightFieldError> {
        let path = path.into();
        let mut n_cols = None;
        let mut first = None;
        let mut last = None;
        let mut row = 0;

        for (line_no, text) in read_lines(&path)?.enumerate() {
            let text = text.map_err(|source| HeightFieldError::Io {
                path: path.clone(),
                source,
            })?;
            if text.trim().is_empty() {
                continue;
            }
            let values = parse_row(&text, line_no + 1)?;
            let expected = *n_cols.get_or_insert(values.len());
            if values.len() != expected {
                return Err(HeightFieldError::Ragged {
                    line: line_no + 1,
                    expected,
                    found: values.len(),
                });
            }
            if values.iter().any(|&v| v != 0) {
                first.get_or_insert(row);
                last = Some(row);
            }
            row += 1;
        }

        let filled = match (first, last) {
            (Some(first), Some(last)) => first..last + 1,
            _ => {
                warn!(path = %path.display(), rows = row, "height field holds no data");
                0..0
            }
        };
        debug!(
            path = %path.display(),
            rows = row,
            filled_start = filled.start,
            filled_end = filled.end,
            "height field scanned"
        );
        Ok(Self {
            path,
            n_cols: n_cols.unwrap_or(0),
            filled,
        })
    }

    /// Number of rows in the filled range.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.filled.len()
    }

    /// Values per row.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Row indices (among non-empty lines) of the filled range.
    #[must_use]
    pub fn filled_range(&self) -> Range<usize> {
        self.filled.clone()
    }

    /// Lazily re-read the filled rows, top to bottom.
    pub fn filled_rows(&self) -> Result<FilledRows, HeightFieldError> {
        Ok(FilledRows {
            path: self.path.clone(),
            lines: read_lines(&self.path)?,
            line_no: 0,
            row: 0,
            filled: self.filled.clone(),
        })
    }

    /// The filled rows as a latitude/longitude grid, first row at `y = 0`.
    pub fn to_geodetic_grid(&self) -> Result<GeodeticGrid<f32>, HeightFieldError> {
        let mut data = Vec::with_capacity(self.n_rows() * self.n_cols);
        for row in self.filled_rows()? {
            data.extend(row?.into_iter().map(|v| v as f32));
        }
        let grid = SurfaceGrid::from_vec(self.n_cols, self.n_rows(), data)?;
        Ok(GeodeticGrid::from_grid(grid)?)
    }
}

fn read_lines(path: &Path) -> Result<Lines<BufReader<File>>, HeightFieldError> {
    let file = File::open(path).map_err(|source| HeightFieldError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file).lines())
}

/// Iterator over the filled rows of a [`HeightField`].
pub struct FilledRows {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    row: usize,
    filled: Range<usize>,
}

impl Iterator for FilledRows {
    type Item = Result<Vec<i32>, HeightFieldError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.row < self.filled.end {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(source) => {
                    return Some(Err(HeightFieldError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line_no += 1;
            if text.trim().is_empty() {
                continue;
            }
            let row = self.row;
            self.row += 1;
            if row >= self.filled.start {
                return Some(parse_row(&text, self.line_no));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrostex_map::SurfaceMap;
    use std::io::Write;

    fn write_field(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_filled_range_is_inclusive() {
        let (_dir, path) = write_field("0 0 0\n0 0 0\n1 0 2\n0 0 0\n3 4 5\n0 0 0\n");
        let field = HeightField::open(&path).unwrap();
        assert_eq!(field.filled_range(), 2..5);
        assert_eq!(field.n_rows(), 3);
        assert_eq!(field.n_cols(), 3);

        let rows: Vec<Vec<i32>> = field.filled_rows().unwrap().map(Result::unwrap).collect();
        assert_eq!(rows, vec![vec![1, 0, 2], vec![0, 0, 0], vec![3, 4, 5]]);
    }

    #[test]
    fn test_full_file_without_padding() {
        let (_dir, path) = write_field("1 2\n3 4");
        let field = HeightField::open(&path).unwrap();
        assert_eq!(field.n_rows(), 2);
        let rows: Vec<Vec<i32>> = field.filled_rows().unwrap().map(Result::unwrap).collect();
        assert_eq!(rows.last().unwrap(), &vec![3, 4]);
    }

    #[test]
    fn test_all_blank_file_has_no_rows() {
        let (_dir, path) = write_field("0 0\n0 0\n");
        let field = HeightField::open(&path).unwrap();
        assert_eq!(field.n_rows(), 0);
        assert_eq!(field.filled_rows().unwrap().count(), 0);
        assert!(matches!(
            field.to_geodetic_grid(),
            Err(HeightFieldError::Map(MapError::InvalidGeometry(_)))
        ));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let (_dir, path) = write_field("1 2 3\n4 5\n");
        assert!(matches!(
            HeightField::open(&path),
            Err(HeightFieldError::Ragged {
                line: 2,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_non_integer_rejected() {
        let (_dir, path) = write_field("1 2\n3 x\n");
        assert!(matches!(
            HeightField::open(&path),
            Err(HeightFieldError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            HeightField::open(dir.path().join("nope.txt")),
            Err(HeightFieldError::Io { .. })
        ));
    }

    #[test]
    fn test_to_geodetic_grid_keeps_row_order() {
        let (_dir, path) = write_field("0 0 0\n-5 0 7\n1 2 3\n0 0 0\n");
        let grid = HeightField::open(&path).unwrap().to_geodetic_grid().unwrap();
        assert_eq!(grid.dimensions(), (3, 2));
        assert_eq!(grid.grid().row(0).unwrap(), &[-5.0, 0.0, 7.0]);
        assert_eq!(grid.grid().row(1).unwrap(), &[1.0, 2.0, 3.0]);
    }
}
