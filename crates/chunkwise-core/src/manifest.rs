//! The manifest: the ordered, checksummed description of one split file.
//!
//! On disk a manifest is a JSON array of records:
//!
//! ```json
//! [
//!   {
//!     "chunk_file_name": "game.zip_chunk_00000",
//!     "sequence_index": 0,
//!     "size": 104857600,
//!     "checksum_sha256": "…64 lowercase hex chars…",
//!     "version": "0.28"
//!   }
//! ]
//! ```
//!
//! `sequence_index` and `version` are optional on input. Array order carries no
//! meaning: producers differ in whether they pre-sort, so the order is always
//! re-derived from the explicit index, or from the name's numeric suffix when
//! the index is absent. A loaded [`Manifest`] is held sorted by index.

use std::collections::HashSet;
use std::path::Path;

use chunkwise_fs::AtomicWriteOptions;
use chunkwise_verify::Checksum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::name::parse_chunk_name;

/// One chunk of the original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Artifact name, on disk and remotely.
    pub name:           String,
    /// 0-based position of the chunk in the original byte stream.
    pub sequence_index: u64,
    /// Exact payload length in bytes.
    pub size:           u64,
    /// SHA-256 of the payload.
    pub checksum:       Checksum,
    /// Batch tag shared by every record of a split.
    pub version:        Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawRecord {
    chunk_file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sequence_index:  Option<u64>,
    size:            u64,
    checksum_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version:         Option<String>,
}

impl RawRecord {
    fn into_record(self, position: usize) -> Result<ChunkRecord> {
        let malformed = |what: String| Error::ManifestFormat(format!("record {position}: {what}"));

        let name = self.chunk_file_name;
        validate_name(&name).map_err(|what| malformed(what.to_string()))?;

        let parsed = parse_chunk_name(&name).map(|(_, index)| index);
        let sequence_index = match (self.sequence_index, parsed) {
            (Some(explicit), Some(parsed)) if explicit != parsed => {
                return Err(malformed(format!(
                    "sequence_index {explicit} disagrees with name {name:?}"
                )));
            }
            (Some(explicit), _) => explicit,
            (None, Some(parsed)) => parsed,
            (None, None) => {
                return Err(malformed(format!(
                    "no sequence_index and no index suffix in name {name:?}"
                )));
            }
        };

        let checksum = self
            .checksum_sha256
            .parse()
            .map_err(|_| malformed(format!("bad checksum_sha256 {:?}", self.checksum_sha256)))?;

        Ok(ChunkRecord {
            name,
            sequence_index,
            size: self.size,
            checksum,
            version: self.version,
        })
    }
}

impl From<&ChunkRecord> for RawRecord {
    fn from(record: &ChunkRecord) -> Self {
        Self {
            chunk_file_name: record.name.clone(),
            sequence_index:  Some(record.sequence_index),
            size:            record.size,
            checksum_sha256: record.checksum.to_hex(),
            version:         record.version.clone(),
        }
    }
}

/// Names are joined onto directories and URLs, so they must be a single
/// plain path component.
fn validate_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty chunk_file_name");
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) || name.contains('\0') {
        return Err("chunk_file_name must be a plain file name");
    }
    Ok(())
}

/// Ordered collection of [`ChunkRecord`]s describing one logical file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<ChunkRecord>,
    total:   u64,
}

impl Manifest {
    /// Build a manifest, sorting by sequence index and checking that names
    /// and indices are unique, that indices run `0..len` without gaps and
    /// that the sizes add up to something a `u64` can hold.
    pub fn new(mut records: Vec<ChunkRecord>) -> Result<Self> {
        records.sort_by_key(|r| r.sequence_index);

        let mut names = HashSet::with_capacity(records.len());
        let mut total = 0u64;
        for (expected, record) in records.iter().enumerate() {
            if !names.insert(record.name.as_str()) {
                return Err(Error::ManifestFormat(format!(
                    "duplicate chunk_file_name {:?}",
                    record.name
                )));
            }
            if record.sequence_index != expected as u64 {
                return Err(Error::ManifestFormat(if record.sequence_index < expected as u64 {
                    format!("duplicate sequence index {}", record.sequence_index)
                } else {
                    format!("missing chunk with sequence index {expected}")
                }));
            }
            total = total
                .checked_add(record.size)
                .ok_or_else(|| Error::ManifestFormat("total size overflows".into()))?;
        }

        Ok(Self { records, total })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let raw: Vec<RawRecord> =
            serde_json::from_slice(bytes).map_err(|e| Error::ManifestFormat(e.to_string()))?;
        let records = raw
            .into_iter()
            .enumerate()
            .map(|(position, raw)| raw.into_record(position))
            .collect::<Result<Vec<_>>>()?;
        Self::new(records)
    }

    pub fn to_json(&self) -> Result<String> {
        let raw: Vec<RawRecord> = self.records.iter().map(RawRecord::from).collect();
        serde_json::to_string_pretty(&raw).map_err(|e| Error::ManifestFormat(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = chunkwise_fs::atomic_read(path)?;
        Self::from_json(&bytes)
    }

    /// Write the manifest atomically: a reader never sees a half-written file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        chunkwise_fs::atomic_write(path, json.as_bytes(), AtomicWriteOptions::new())?;
        Ok(())
    }

    /// Records in sequence order.
    pub fn records(&self) -> &[ChunkRecord] { &self.records }

    pub fn iter(&self) -> std::slice::Iter<'_, ChunkRecord> { self.records.iter() }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn get(&self, sequence_index: u64) -> Option<&ChunkRecord> {
        usize::try_from(sequence_index).ok().and_then(|i| self.records.get(i))
    }

    pub fn find(&self, name: &str) -> Option<&ChunkRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Size of the original file.
    pub fn total_size(&self) -> u64 { self.total }

    pub fn version(&self) -> Option<&str> {
        self.records.iter().find_map(|r| r.version.as_deref())
    }

    /// Base name of the original file, recovered from the chunk names.
    pub fn original_name(&self) -> Option<&str> {
        self.records
            .first()
            .and_then(|r| parse_chunk_name(&r.name))
            .map(|(base, _)| base)
            .filter(|base| !base.is_empty())
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ChunkRecord;
    type IntoIter = std::slice::Iter<'a, ChunkRecord>;

    fn into_iter(self) -> Self::IntoIter { self.records.iter() }
}

/// File name the splitter gives a manifest: `manifest_{version}.json`.
pub fn manifest_file_name(version: Option<&str>) -> String {
    match version {
        Some(version) if !version.is_empty() => format!("manifest_{version}.json"),
        _ => "manifest.json".to_string(),
    }
}
