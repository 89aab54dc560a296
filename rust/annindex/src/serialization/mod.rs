//! Binary snapshot encoding for indices.
//!
//! Every snapshot starts with an [`IndexHeader`]; the index type then writes
//! its own body. All integers are little-endian, sizes are written as u64.

mod version;

pub use version::{SerializationVersion, CURRENT_VERSION};

use crate::distance::Metric;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Magic number for snapshot files ("ANNI").
pub const MAGIC_NUMBER: u32 = 0x414E_4E49;

/// Errors that can occur during serialization.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid magic number: expected {expected:#x}, got {got:#x}")]
    InvalidMagicNumber { expected: u32, got: u32 },

    #[error("Unsupported version: {0:#x}")]
    UnsupportedVersion(u32),

    #[error("Index type mismatch: expected {expected}, got {got}")]
    IndexTypeMismatch { expected: String, got: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Metric mismatch: expected {expected:?}, got {got:?}")]
    MetricMismatch { expected: Metric, got: Metric },

    #[error("Data corruption: {0}")]
    DataCorruption(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for serialization operations.
pub type SerializationResult<T> = Result<T, SerializationError>;

/// Index type identifier for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IndexTypeId {
    Hnsw = 1,
}

impl IndexTypeId {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(IndexTypeId::Hnsw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexTypeId::Hnsw => "Hnsw",
        }
    }
}

/// Header for serialized index files.
#[derive(Debug, Clone)]
pub struct IndexHeader {
    pub magic: u32,
    pub version: u32,
    pub index_type: IndexTypeId,
    pub data_type: u8,
    pub metric: Metric,
    pub dimension: usize,
    pub count: usize,
}

impl IndexHeader {
    pub fn new(
        index_type: IndexTypeId,
        data_type: u8,
        metric: Metric,
        dimension: usize,
        count: usize,
    ) -> Self {
        Self {
            magic: MAGIC_NUMBER,
            version: CURRENT_VERSION,
            index_type,
            data_type,
            metric,
            dimension,
            count,
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> SerializationResult<()> {
        write_u32(writer, self.magic)?;
        write_u32(writer, self.version)?;
        write_u8(writer, self.index_type as u8)?;
        write_u8(writer, self.data_type)?;
        write_u8(writer, self.metric.to_u8())?;
        write_usize(writer, self.dimension)?;
        write_usize(writer, self.count)?;
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut R) -> SerializationResult<Self> {
        let magic = read_u32(reader)?;
        if magic != MAGIC_NUMBER {
            return Err(SerializationError::InvalidMagicNumber {
                expected: MAGIC_NUMBER,
                got: magic,
            });
        }

        let version = read_u32(reader)?;
        if !SerializationVersion::current().is_compatible(SerializationVersion::from_u32(version))
            || version > CURRENT_VERSION
        {
            return Err(SerializationError::UnsupportedVersion(version));
        }

        let index_type = IndexTypeId::from_u8(read_u8(reader)?)
            .ok_or_else(|| SerializationError::InvalidData("Invalid index type".to_string()))?;
        let data_type = read_u8(reader)?;
        let metric = Metric::from_u8(read_u8(reader)?)
            .ok_or_else(|| SerializationError::InvalidData("Invalid metric".to_string()))?;
        let dimension = read_usize(reader)?;
        let count = read_usize(reader)?;

        Ok(Self {
            magic,
            version,
            index_type,
            data_type,
            metric,
            dimension,
            count,
        })
    }
}

// Helper functions for binary I/O

#[inline]
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

#[inline]
pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

#[inline]
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

#[inline]
pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

#[inline]
pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

#[inline]
pub fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[inline]
pub fn write_usize<W: Write>(writer: &mut W, value: usize) -> io::Result<()> {
    write_u64(writer, value as u64)
}

#[inline]
pub fn read_usize<R: Read>(reader: &mut R) -> io::Result<usize> {
    Ok(read_u64(reader)? as usize)
}
