//! Error type shared by every map representation.

/// Errors reported by coordinate transforms, grid construction and sampling.
///
/// All variants describe a caller or configuration mistake; none of them is
/// transient, so nothing in this crate retries on error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    /// A coordinate lies outside the domain of the transform or grid that
    /// received it (latitude/longitude bounds, pixel bounds, cube-local
    /// `[-1, 1]` bounds, or a degenerate direction vector).
    #[error("{what} out of range: {value}")]
    OutOfRange {
        /// Which coordinate was rejected.
        what: &'static str,
        /// The offending value.
        value: f64,
    },

    /// A grid or tile cannot be built with the requested shape.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A tile refinement request is degenerate or leaves the parent tile.
    #[error("invalid region: {0}")]
    InvalidRegion(String),
}

impl MapError {
    pub(crate) fn out_of_range(what: &'static str, value: f64) -> Self {
        Self::OutOfRange { what, value }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MapError>;
