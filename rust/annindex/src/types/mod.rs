//! Core type definitions for the index engine.
//!
//! - `LabelType`: External label for vectors (caller-provided identifier)
//! - `IdType`: Compact internal vector identifier
//! - `VectorElement`: Trait for storable vector element types (f32, f64)

use num_traits::{Float, NumCast, ToPrimitive};
use std::fmt::Debug;
use std::io::{self, Read, Write};

/// External label type for vectors (caller-provided identifier).
pub type LabelType = u64;

/// Internal vector identifier.
pub type IdType = u32;

/// Invalid/sentinel value for internal IDs.
pub const INVALID_ID: IdType = IdType::MAX;

/// Trait for types that can be stored as vector components.
///
/// Distances are always accumulated in `f64` and narrowed back to the
/// element type, so `f32` indices do not lose precision on long vectors.
pub trait VectorElement: Float + Debug + Default + Send + Sync + 'static {
    /// Size of one encoded element in bytes.
    const ENCODED_SIZE: usize;

    /// Serialization tag for this element type.
    const DATA_TYPE_ID: u8;

    /// Write this value in little-endian order.
    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()>;

    /// Read a value written by [`VectorElement::write_le`].
    fn read_le<R: Read>(reader: &mut R) -> io::Result<Self>;

    #[inline(always)]
    fn as_f64(self) -> f64 {
        ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
    }

    #[inline(always)]
    fn from_f64_lossy(v: f64) -> Self {
        <Self as NumCast>::from(v).unwrap_or_else(Self::nan)
    }
}

impl VectorElement for f32 {
    const ENCODED_SIZE: usize = 4;
    const DATA_TYPE_ID: u8 = 1;

    #[inline]
    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }

    #[inline]
    fn read_le<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }
}

impl VectorElement for f64 {
    const ENCODED_SIZE: usize = 8;
    const DATA_TYPE_ID: u8 = 2;

    #[inline]
    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }

    #[inline]
    fn read_le<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }
}
