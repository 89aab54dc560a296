//! Snapshot save/load for [`HnswIndex`].
//!
//! Body layout after the [`IndexHeader`]:
//! parameters, entry point and top level, then one record per element
//! (label, level, tombstone, neighbor lists), then the raw vectors.

use super::{ElementGraphData, HnswIndex, HnswParams};
use crate::distance::Space;
use crate::serialization::*;
use crate::types::{IdType, VectorElement, INVALID_ID};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Smallest element record: label, level, tombstone and the level-0 link count.
const MIN_RECORD_BYTES: usize = 8 + 1 + 1 + 4;

impl<T: VectorElement> HnswIndex<T> {
    /// Write a snapshot of the index.
    pub fn save<W: Write>(&self, writer: &mut W) -> SerializationResult<()> {
        let count = self.graph.len();
        IndexHeader::new(
            IndexTypeId::Hnsw,
            T::DATA_TYPE_ID,
            self.params.metric,
            self.params.dim,
            count,
        )
        .write(writer)?;

        write_usize(writer, self.params.max_elements)?;
        write_usize(writer, self.params.m)?;
        write_usize(writer, self.params.m_max_0)?;
        write_usize(writer, self.params.ef_construction)?;
        write_usize(writer, self.params.ef_runtime)?;
        write_u64(writer, self.params.seed)?;
        write_u8(writer, self.params.allow_replace_deleted as u8)?;
        write_u32(writer, self.entry_point)?;
        write_usize(writer, self.max_level)?;

        for element in &self.graph {
            write_u64(writer, element.meta.label)?;
            write_u8(writer, element.meta.level)?;
            write_u8(writer, element.meta.deleted as u8)?;
            for level in 0..element.num_levels() {
                let neighbors = element.neighbors(level);
                write_u32(writer, neighbors.len() as u32)?;
                for &n in neighbors {
                    write_u32(writer, n)?;
                }
            }
        }

        for &v in &self.data {
            v.write_le(writer)?;
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SerializationResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.save(&mut writer)?;
        writer.flush()?;
        tracing::debug!(path = %path.as_ref().display(), count = self.graph.len(), "saved index");
        Ok(())
    }

    /// Read a snapshot written by [`HnswIndex::save`].
    ///
    /// `space` must match the stored metric and dimension. The loaded index
    /// can hold at least `max_elements` elements, and never fewer than it
    /// already contains.
    pub fn load<R: Read>(
        reader: &mut R,
        space: Space<T>,
        max_elements: usize,
    ) -> SerializationResult<Self> {
        Self::load_bounded(reader, space, max_elements, None)
    }

    /// [`HnswIndex::load`] with the snapshot's total size, when known, used to
    /// reject headers claiming more elements than the input can hold.
    fn load_bounded<R: Read>(
        reader: &mut R,
        space: Space<T>,
        max_elements: usize,
        input_len: Option<u64>,
    ) -> SerializationResult<Self> {
        let header = IndexHeader::read(reader)?;
        if header.index_type != IndexTypeId::Hnsw {
            return Err(SerializationError::IndexTypeMismatch {
                expected: IndexTypeId::Hnsw.as_str().to_string(),
                got: header.index_type.as_str().to_string(),
            });
        }
        if header.data_type != T::DATA_TYPE_ID {
            return Err(SerializationError::InvalidData(format!(
                "element type tag {} does not match {}",
                header.data_type,
                T::DATA_TYPE_ID
            )));
        }
        if header.metric != space.metric() {
            return Err(SerializationError::MetricMismatch {
                expected: space.metric(),
                got: header.metric,
            });
        }
        if header.dimension != space.dim() {
            return Err(SerializationError::DimensionMismatch {
                expected: space.dim(),
                got: header.dimension,
            });
        }

        let count = header.count;
        if let Some(len) = input_len {
            let per_element = (MIN_RECORD_BYTES + header.dimension * std::mem::size_of::<T>()) as u64;
            if (count as u64).saturating_mul(per_element) > len {
                return Err(SerializationError::DataCorruption(format!(
                    "header claims {count} elements but the snapshot is {len} bytes"
                )));
            }
        }
        let _stored_max_elements = read_usize(reader)?;
        let m = read_usize(reader)?;
        let m_max_0 = read_usize(reader)?;
        let ef_construction = read_usize(reader)?;
        let ef_runtime = read_usize(reader)?;
        let seed = read_u64(reader)?;
        let allow_replace_deleted = read_u8(reader)? != 0;
        let entry_point = read_u32(reader)?;
        let max_level = read_usize(reader)?;

        let params = HnswParams {
            dim: header.dimension,
            metric: header.metric,
            max_elements: max_elements.max(count),
            m,
            m_max_0,
            ef_construction,
            ef_runtime,
            seed,
            allow_replace_deleted,
        };
        let mut index =
            Self::new(space, params).map_err(|e| SerializationError::InvalidData(e.to_string()))?;

        if (count == 0) != (entry_point == INVALID_ID) || (count > 0 && entry_point as usize >= count) {
            return Err(SerializationError::DataCorruption(format!(
                "entry point {entry_point} invalid for {count} elements"
            )));
        }

        for id in 0..count {
            let label = read_u64(reader)?;
            let level = read_u8(reader)?;
            let deleted = read_u8(reader)? != 0;

            let mut element = ElementGraphData::new(label, level, m_max_0, m);
            element.meta.deleted = deleted;
            for l in 0..element.num_levels() {
                let len = read_u32(reader)? as usize;
                if len > count {
                    return Err(SerializationError::DataCorruption(format!(
                        "element {id} has {len} links at level {l}"
                    )));
                }
                let mut neighbors = Vec::with_capacity(len);
                for _ in 0..len {
                    let n = read_u32(reader)?;
                    if n as usize >= count {
                        return Err(SerializationError::DataCorruption(format!(
                            "element {id} links to {n} at level {l}"
                        )));
                    }
                    neighbors.push(n);
                }
                element.set_neighbors(l, &neighbors);
            }

            let id = id as IdType;
            if index.label_lookup.insert(label, id).is_some() {
                return Err(SerializationError::DataCorruption(format!(
                    "label {label} stored twice"
                )));
            }
            if deleted {
                index.num_deleted += 1;
                if allow_replace_deleted {
                    index.deleted_slots.insert(id);
                }
            }
            index.graph.push(element);
        }

        for _ in 0..count * header.dimension {
            index.data.push(T::read_le(reader)?);
        }

        if count > 0 && index.graph[entry_point as usize].meta.level as usize != max_level {
            return Err(SerializationError::DataCorruption(format!(
                "entry point level does not match top level {max_level}"
            )));
        }
        index.entry_point = entry_point;
        index.max_level = max_level;

        Ok(index)
    }

    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        space: Space<T>,
        max_elements: usize,
    ) -> SerializationResult<Self> {
        let file = File::open(path.as_ref())?;
        let input_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let index = Self::load_bounded(&mut reader, space, max_elements, Some(input_len))?;
        tracing::debug!(
            path = %path.as_ref().display(),
            count = index.current_count(),
            max_elements = index.max_elements(),
            "loaded index"
        );
        Ok(index)
    }
}
