//! Dense 2D grid storage and bilinear sampling.

use crate::error::{MapError, Result};
use crate::texel::Texel;

/// A row-major `width × height` array of one scalar type.
///
/// Dimensions are fixed at construction and are always at least `1 × 1`.
/// Cells are addressed by pixel index; `(0, 0)` is the first element.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceGrid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Texel> SurfaceGrid<T> {
    /// A grid filled with `T::default()`.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::filled(width, height, T::default())
    }

    /// A grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Result<Self> {
        let len = checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; len],
        })
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        let len = checked_len(width, height)?;
        if data.len() != len {
            return Err(MapError::InvalidGeometry(format!(
                "buffer of {} cells does not fit a {width}x{height} grid",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Read-only view of the row-major cells.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable view of the row-major cells. The length cannot change.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// One row of cells.
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&[T]> {
        (y < self.height).then(|| &self.data[y * self.width..(y + 1) * self.width])
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Overwrite the cell at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<()> {
        if x >= self.width {
            return Err(MapError::out_of_range("pixel x", x as f64));
        }
        if y >= self.height {
            return Err(MapError::out_of_range("pixel y", y as f64));
        }
        self.data[y * self.width + x] = value;
        Ok(())
    }

    /// Smallest and largest stored values, widened to `f64`.
    #[must_use]
    pub fn value_range(&self) -> (f64, f64) {
        self.data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            let v = v.to_f64();
            (lo.min(v), hi.max(v))
        })
    }

    /// Copy out the `width × height` block whose top-left cell is `(x0, y0)`.
    pub fn crop(&self, x0: usize, y0: usize, width: usize, height: usize) -> Result<Self> {
        if x0 + width > self.width || y0 + height > self.height {
            return Err(MapError::InvalidGeometry(format!(
                "crop {width}x{height} at ({x0}, {y0}) exceeds {}x{} grid",
                self.width, self.height
            )));
        }
        let mut data = Vec::with_capacity(checked_len(width, height)?);
        for y in y0..y0 + height {
            let start = y * self.width + x0;
            data.extend_from_slice(&self.data[start..start + width]);
        }
        Self::from_vec(width, height, data)
    }

    /// Reject fractional pixel coordinates outside `[0, W-1] × [0, H-1]`.
    pub fn check_local(&self, x: f64, y: f64) -> Result<()> {
        if !(0.0..=(self.width - 1) as f64).contains(&x) {
            return Err(MapError::out_of_range("pixel x", x));
        }
        if !(0.0..=(self.height - 1) as f64).contains(&y) {
            return Err(MapError::out_of_range("pixel y", y));
        }
        Ok(())
    }

    /// Bilinear interpolation at fractional pixel coordinates.
    ///
    /// An axis whose fractional part is exactly zero reads a single
    /// column/row, so a coordinate on the last index never touches the cell
    /// past it. Both zero is a plain lookup, one zero a linear blend, neither
    /// a blend of four cells weighted by the fractional parts.
    pub fn bilinear(&self, x: f64, y: f64) -> Result<f64> {
        self.check_local(x, y)?;

        let (x0, fx) = split_axis(x);
        let (y0, fy) = split_axis(y);
        let at = |cx: usize, cy: usize| self.data[cy * self.width + cx].to_f64();

        let value = match (fx == 0.0, fy == 0.0) {
            (true, true) => at(x0, y0),
            (true, false) => lerp(at(x0, y0), at(x0, y0 + 1), fy),
            (false, true) => lerp(at(x0, y0), at(x0 + 1, y0), fx),
            (false, false) => {
                let upper = lerp(at(x0, y0), at(x0 + 1, y0), fx);
                let lower = lerp(at(x0, y0 + 1), at(x0 + 1, y0 + 1), fx);
                lerp(upper, lower, fy)
            }
        };
        Ok(value)
    }
}

fn checked_len(width: usize, height: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(MapError::InvalidGeometry(format!(
            "grid dimensions must be at least 1x1, got {width}x{height}"
        )));
    }
    width
        .checked_mul(height)
        .ok_or_else(|| MapError::InvalidGeometry(format!("{width}x{height} grid overflows")))
}

#[inline]
fn split_axis(v: f64) -> (usize, f64) {
    let floor = v.floor();
    (floor as usize, v - floor)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Snap a transformed pixel coordinate to the nearest integer when it is
/// within `1e-9` of it.
///
/// Trigonometric round-trips turn exact cell hits into `255.9999999999`;
/// left alone, the tiny weight on the neighbour would survive the
/// truncating texel cast as an off-by-one.
#[inline]
pub(crate) fn snap(v: f64) -> f64 {
    let rounded = v.round();
    if (v - rounded).abs() < 1e-9 { rounded } else { v }
}
