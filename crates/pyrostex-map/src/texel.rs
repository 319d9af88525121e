//! Storage scalar types for surface grids.

use std::fmt::Debug;

/// Identifies the storage type of a grid on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TexelKind {
    /// `u8`
    U8 = 1,
    /// `u16`
    U16 = 2,
    /// `u32`
    U32 = 3,
    /// `i16`
    I16 = 4,
    /// `i32`
    I32 = 5,
    /// `f32`
    F32 = 6,
    /// `f64`
    F64 = 7,
}

impl TexelKind {
    /// Decode a kind from its on-disk tag.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::U8),
            2 => Some(Self::U16),
            3 => Some(Self::U32),
            4 => Some(Self::I16),
            5 => Some(Self::I32),
            6 => Some(Self::F32),
            7 => Some(Self::F64),
            _ => None,
        }
    }

    /// The on-disk tag for this kind.
    #[must_use]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Full representable range for integer kinds; `None` for floats, whose
    /// useful range depends on the data.
    #[must_use]
    pub fn natural_range(self) -> Option<(f64, f64)> {
        match self {
            Self::U8 => Some((0.0, f64::from(u8::MAX))),
            Self::U16 => Some((0.0, f64::from(u16::MAX))),
            Self::U32 => Some((0.0, f64::from(u32::MAX))),
            Self::I16 => Some((f64::from(i16::MIN), f64::from(i16::MAX))),
            Self::I32 => Some((f64::from(i32::MIN), f64::from(i32::MAX))),
            Self::F32 | Self::F64 => None,
        }
    }
}

/// A scalar that can be stored in a [`SurfaceGrid`](crate::SurfaceGrid).
///
/// Interpolation always happens in `f64`. Writing the result back into the
/// grid goes through [`Texel::from_f64`], which is an explicit `as` cast:
/// fractional parts are truncated toward zero, values outside the type's
/// range saturate, and NaN becomes zero. This loss is intended.
pub trait Texel: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Tag written by the grid persistence format.
    const KIND: TexelKind;
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Widen to `f64` for interpolation.
    fn to_f64(self) -> f64;

    /// Truncating, saturating conversion from `f64`.
    fn from_f64(value: f64) -> Self;

    /// Append the little-endian encoding to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly [`Texel::SIZE`] little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_texel {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Texel for $ty {
                const KIND: TexelKind = TexelKind::$kind;
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_texel! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    i16 => I16,
    i32 => I32,
    f32 => F32,
    f64 => F64,
}
