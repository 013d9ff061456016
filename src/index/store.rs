//! Index Store
//!
//! Loads and validates the index sidecar. A store is either fully valid or
//! never constructed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bincode::Options;
use byteorder::{ByteOrder, LittleEndian};

use crate::decode::ByteOrderKind;
use crate::error::{Result, StManError};

use super::{
    body_options, BlockRef, IndexBody, IndexEntry, IndexSummary, IndexWriter, END_TAG,
    FOOTER_SIZE, HEADER_SIZE, START_TAG, UNCHECKED_ENTRY, VERSION,
};

/// Immutable in-memory copy of the index sidecar
#[derive(Debug, Clone)]
pub struct IndexStore {
    /// Source file (kept for diagnostics)
    path: PathBuf,
    version: u32,
    big_endian: bool,
    file_names: Vec<String>,
    entries: Vec<IndexEntry>,
    /// Bytes to read per entry; entries sharing a block share the largest extent
    block_lens: Vec<u64>,
}

impl IndexStore {
    /// Load an index file
    ///
    /// Opens no BDF file. Fails with `CorruptIndex` on any framing, checksum
    /// or invariant problem and with `UnsupportedVersion` on newer formats.
    pub fn load(path: &Path, verify_checksum: bool) -> Result<Self> {
        let data = fs::read(path).map_err(|source| StManError::FileIo {
            path: path.to_path_buf(),
            source,
        })?;

        if data.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(StManError::corrupt(
                path,
                format!("file too small ({} bytes)", data.len()),
            ));
        }
        if &data[0..8] != START_TAG {
            return Err(StManError::corrupt(path, "missing ASDMIDX start tag"));
        }

        let version = LittleEndian::read_u32(&data[8..12]);
        if version > VERSION {
            return Err(StManError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: version,
                supported: VERSION,
            });
        }

        let body_len = LittleEndian::read_u64(&data[12..20]);
        let expected = (HEADER_SIZE + FOOTER_SIZE) as u64 + body_len;
        if expected != data.len() as u64 {
            return Err(StManError::corrupt(
                path,
                format!(
                    "body length {} does not match file size {}",
                    body_len,
                    data.len()
                ),
            ));
        }

        let body_end = HEADER_SIZE + body_len as usize;
        let body = &data[HEADER_SIZE..body_end];
        let footer = &data[body_end..];

        if &footer[4..12] != END_TAG {
            return Err(StManError::corrupt(path, "missing ASDMEND end tag"));
        }
        if verify_checksum {
            let stored = LittleEndian::read_u32(&footer[0..4]);
            let actual = crc32fast::hash(body);
            if stored != actual {
                return Err(StManError::corrupt(
                    path,
                    format!("body checksum mismatch: stored {:#010x}, computed {:#010x}", stored, actual),
                ));
            }
        }

        let body: IndexBody = body_options()
            .with_limit(body_len)
            .deserialize(body)
            .map_err(|e| StManError::corrupt(path, format!("undecodable body: {}", e)))?;

        let entries = body
            .entries
            .into_iter()
            .map(IndexEntry::try_from)
            .collect::<Result<Vec<_>>>()?;

        let store = Self::build(path, version, body.big_endian, body.file_names, entries)?;

        tracing::debug!(
            path = %path.display(),
            version,
            entries = store.entries.len(),
            files = store.file_names.len(),
            rows = store.total_rows(),
            "loaded index"
        );
        Ok(store)
    }

    /// Build a store from already decoded parts (validated like a loaded file)
    pub fn from_parts(
        big_endian: bool,
        file_names: Vec<String>,
        entries: Vec<IndexEntry>,
    ) -> Result<Self> {
        Self::build(Path::new(UNCHECKED_ENTRY), VERSION, big_endian, file_names, entries)
    }

    fn build(
        path: &Path,
        version: u32,
        big_endian: bool,
        file_names: Vec<String>,
        entries: Vec<IndexEntry>,
    ) -> Result<Self> {
        validate_entries(path, &entries, file_names.len())?;
        let block_lens = block_lengths(&entries);
        Ok(Self {
            path: path.to_path_buf(),
            version,
            big_endian,
            file_names,
            entries,
            block_lens,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Byte order the BDF samples were written with
    pub fn big_endian(&self) -> bool {
        self.big_endian
    }

    pub fn byte_order(&self) -> ByteOrderKind {
        ByteOrderKind::from_big_endian(self.big_endian)
    }

    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn entry(&self, pos: usize) -> &IndexEntry {
        &self.entries[pos]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows covered by the index (end row of the last entry)
    pub fn total_rows(&self) -> u64 {
        self.entries.last().map(IndexEntry::row_end).unwrap_or(0)
    }

    /// Raw block holding the entry at `pos`
    pub fn block_ref(&self, pos: usize) -> BlockRef {
        let entry = &self.entries[pos];
        BlockRef {
            file_index: entry.file_index,
            file_offset: entry.file_offset,
            len: self.block_lens[pos],
        }
    }

    /// Largest raw block any entry needs
    pub fn max_block_len(&self) -> u64 {
        self.block_lens.iter().copied().max().unwrap_or(0)
    }

    /// Replace the backing file names, e.g. after the BDF files were moved
    ///
    /// The count must match; file indices in the entries stay as they are.
    pub fn set_file_names(&mut self, names: Vec<String>) -> Result<()> {
        if names.len() != self.file_names.len() {
            return Err(StManError::InvalidState(format!(
                "index lists {} BDF files, got {} replacement names",
                self.file_names.len(),
                names.len()
            )));
        }
        self.file_names = names;
        Ok(())
    }

    /// Write this index (same entries and byte order) to `path`
    pub fn write_to(&self, path: &Path) -> Result<IndexSummary> {
        let mut writer = IndexWriter::create(path).big_endian(self.big_endian);
        for name in &self.file_names {
            writer.add_file(name.as_str());
        }
        for entry in &self.entries {
            writer.add_entry(entry.clone())?;
        }
        writer.finish()
    }

    /// Number of distinct physical blocks
    pub fn distinct_blocks(&self) -> usize {
        let mut seen: Vec<(u32, u64)> = self
            .entries
            .iter()
            .map(|e| (e.file_index, e.file_offset))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }
}

/// Check every entry and the ordering between neighbours
pub(crate) fn validate_entries(path: &Path, entries: &[IndexEntry], n_files: usize) -> Result<()> {
    for entry in entries {
        entry
            .check(n_files)
            .map_err(|reason| StManError::corrupt(path, reason))?;
    }
    for pair in entries.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.row_start <= prev.row_start {
            return Err(StManError::corrupt(
                path,
                format!(
                    "row starts not strictly increasing ({} then {})",
                    prev.row_start, next.row_start
                ),
            ));
        }
        if next.row_start < prev.row_end() {
            return Err(StManError::corrupt(
                path,
                format!(
                    "entry at row {} overlaps entry ending at row {}",
                    next.row_start,
                    prev.row_end()
                ),
            ));
        }
    }
    Ok(())
}

/// Largest extent needed per (file, offset) block, assigned to each entry
fn block_lengths(entries: &[IndexEntry]) -> Vec<u64> {
    let mut extents: HashMap<(u32, u64), u64> = HashMap::new();
    for entry in entries {
        let len = extents
            .entry((entry.file_index, entry.file_offset))
            .or_insert(0);
        *len = (*len).max(entry.extent_bytes());
    }
    entries
        .iter()
        .map(|e| extents[&(e.file_index, e.file_offset)])
        .collect()
}
